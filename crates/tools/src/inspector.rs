use citygrid_common::{BuildingTier, TerrainKind, TileCoord};
use citygrid_kernel::{City, CityEvent, CitySnapshot};
use std::fmt;
use std::ops::AddAssign;

/// City inspector for developer tooling.
///
/// Provides read-only queries against the city state for debugging and CLI
/// output.
pub struct CityInspector;

impl CityInspector {
    /// Produce a summary of the city state.
    pub fn summary(city: &City) -> CitySummary {
        let snap = city.snapshot();
        CitySummary {
            tick: city.tick_count(),
            seed: city.seed(),
            size: city.size(),
            tiles: city.tile_count(),
            tiers: Self::tier_counts(&snap),
            pending_events: city.events().len(),
        }
    }

    /// Tiles at each tier, indexed by `level - 1`.
    pub fn tier_counts(snapshot: &CitySnapshot) -> [usize; 3] {
        BuildingTier::ALL.map(|tier| snapshot.count_tier(tier))
    }

    /// State of a single tile.
    pub fn inspect_tile(city: &City, coord: TileCoord) -> Option<TileInfo> {
        city.tile(coord).map(|tile| TileInfo {
            coord: tile.coord,
            terrain: tile.terrain,
            building: tile.building,
        })
    }

    /// Count events by kind.
    pub fn tally_events(events: &[CityEvent]) -> EventTally {
        let mut tally = EventTally::default();
        for event in events {
            match event {
                CityEvent::Created { .. } => {}
                CityEvent::TierAdvanced { .. } => tally.advances += 1,
                CityEvent::Demolished { .. } => tally.demolitions += 1,
                CityEvent::Ticked { .. } => tally.ticks += 1,
            }
        }
        tally
    }
}

/// Summary of city state for the inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitySummary {
    pub tick: u64,
    pub seed: u64,
    pub size: u32,
    pub tiles: usize,
    pub tiers: [usize; 3],
    pub pending_events: usize,
}

impl CitySummary {
    /// Tiles with any building.
    pub fn built(&self) -> usize {
        self.tiers.iter().sum()
    }
}

impl fmt::Display for CitySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "City: tick={} seed={} size={}x{} built={}/{} tiers=[{}, {}, {}] pending_events={}",
            self.tick,
            self.seed,
            self.size,
            self.size,
            self.built(),
            self.tiles,
            self.tiers[0],
            self.tiers[1],
            self.tiers[2],
            self.pending_events
        )
    }
}

/// Detailed info about a single tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileInfo {
    pub coord: TileCoord,
    pub terrain: TerrainKind,
    pub building: Option<BuildingTier>,
}

impl fmt::Display for TileInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.building {
            Some(tier) => write!(f, "Tile {} {} {}", self.coord, self.terrain.id(), tier),
            None => write!(f, "Tile {} {} empty", self.coord, self.terrain.id()),
        }
    }
}

/// Event counts by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventTally {
    pub ticks: usize,
    pub advances: usize,
    pub demolitions: usize,
}

impl AddAssign for EventTally {
    fn add_assign(&mut self, other: Self) {
        self.ticks += other.ticks;
        self.advances += other.advances;
        self.demolitions += other.demolitions;
    }
}
