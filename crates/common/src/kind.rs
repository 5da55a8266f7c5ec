use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ground classification of a tile. Fixed for the tile's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum TerrainKind {
    #[default]
    Grass,
}

impl TerrainKind {
    pub const ALL: [TerrainKind; 1] = [TerrainKind::Grass];

    pub fn id(self) -> &'static str {
        match self {
            Self::Grass => "grass",
        }
    }
}

/// Development stage of a building. Tiers are ordered; `Tier3` is the cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuildingTier {
    Tier1,
    Tier2,
    Tier3,
}

impl BuildingTier {
    pub const ALL: [BuildingTier; 3] = [Self::Tier1, Self::Tier2, Self::Tier3];

    /// The tier a building grows into, or `None` at the cap.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Tier1 => Some(Self::Tier2),
            Self::Tier2 => Some(Self::Tier3),
            Self::Tier3 => None,
        }
    }

    /// 1-based level, useful for display and histograms.
    pub fn level(self) -> u8 {
        match self {
            Self::Tier1 => 1,
            Self::Tier2 => 2,
            Self::Tier3 => 3,
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::Tier1 => "building-1",
            Self::Tier2 => "building-2",
            Self::Tier3 => "building-3",
        }
    }
}

impl fmt::Display for BuildingTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tier-{}", self.level())
    }
}

/// What a visual depicts: a tile's terrain or the building standing on it.
///
/// Serialized as its asset id string (`"grass"`, `"building-2"`, ...) so it
/// can key JSON maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum VisualKind {
    Terrain(TerrainKind),
    Building(BuildingTier),
}

impl VisualKind {
    /// Every kind the engine can ask a factory for.
    pub fn all() -> impl Iterator<Item = VisualKind> {
        TerrainKind::ALL
            .into_iter()
            .map(VisualKind::Terrain)
            .chain(BuildingTier::ALL.into_iter().map(VisualKind::Building))
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::Terrain(t) => t.id(),
            Self::Building(b) => b.id(),
        }
    }
}

impl From<TerrainKind> for VisualKind {
    fn from(t: TerrainKind) -> Self {
        Self::Terrain(t)
    }
}

impl From<BuildingTier> for VisualKind {
    fn from(b: BuildingTier) -> Self {
        Self::Building(b)
    }
}

impl fmt::Display for VisualKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown visual kind id: {0:?}")]
pub struct ParseKindError(pub String);

impl FromStr for VisualKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VisualKind::all()
            .find(|k| k.id() == s)
            .ok_or_else(|| ParseKindError(s.to_string()))
    }
}

impl TryFrom<String> for VisualKind {
    type Error = ParseKindError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<VisualKind> for String {
    fn from(k: VisualKind) -> Self {
        k.id().to_string()
    }
}
