use citygrid_common::{BuildingTier, TerrainKind, TileCoord, Transform, VisualId, VisualKind};
use citygrid_scene::{SceneNode, VisualError, VisualFactory};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

use crate::store::{AssetError, AssetId, AssetStore, BoxMesh, Material, digest_prefix};

/// How to draw one visual kind: a unit box stretched to `height`, centred at
/// `elevation`, painted `color` (`0xRRGGBB`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssetRecipe {
    pub color: u32,
    pub height: f32,
    pub elevation: f32,
}

impl AssetRecipe {
    /// A building of `height` standing on the ground plane.
    pub fn standing(color: u32, height: f32) -> Self {
        Self {
            color,
            height,
            elevation: height / 2.0,
        }
    }
}

/// A placed visual for one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Visual {
    pub id: VisualId,
    pub kind: VisualKind,
    pub coord: TileCoord,
    pub transform: Transform,
    pub mesh: AssetId,
    pub material: AssetId,
}

impl SceneNode for Visual {
    fn visual_id(&self) -> VisualId {
        self.id
    }
}

#[derive(Debug, Clone)]
struct Resolved {
    recipe: AssetRecipe,
    mesh: AssetId,
    material: AssetId,
}

#[derive(Serialize, Deserialize)]
struct CatalogFile {
    assets: BTreeMap<VisualKind, AssetRecipe>,
}

/// Maps visual kinds to registered meshes and materials.
///
/// Implements [`VisualFactory`]: `create` looks the kind up and places its
/// box over the tile. Kinds without a recipe fail with
/// [`VisualError::UnknownKind`].
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    entries: BTreeMap<VisualKind, Resolved>,
    store: AssetStore,
}

impl AssetCatalog {
    /// Catalog with no recipes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grass plus the three building tiers, one to three units tall.
    pub fn city_defaults() -> Self {
        let mut catalog = Self::new();
        catalog.insert(
            TerrainKind::Grass.into(),
            AssetRecipe {
                color: 0x00ff00,
                height: 1.0,
                elevation: -0.5,
            },
        );
        catalog.insert(
            BuildingTier::Tier1.into(),
            AssetRecipe::standing(0xf00666, 1.0),
        );
        catalog.insert(
            BuildingTier::Tier2.into(),
            AssetRecipe::standing(0x00feaa, 2.0),
        );
        catalog.insert(
            BuildingTier::Tier3.into(),
            AssetRecipe::standing(0x777777, 3.0),
        );
        catalog
    }

    /// Register assets for `kind`, replacing any previous recipe.
    pub fn insert(&mut self, kind: VisualKind, recipe: AssetRecipe) {
        let mesh = self.store.register_mesh(BoxMesh {
            name: kind.id().to_string(),
            extents: [1.0, recipe.height, 1.0],
        });
        let material = self
            .store
            .register_material(Material::from_rgb(kind.id(), recipe.color));
        self.entries.insert(
            kind,
            Resolved {
                recipe,
                mesh,
                material,
            },
        );
    }

    /// Drop the recipe for `kind`. Registered assets stay in the store.
    pub fn remove(&mut self, kind: VisualKind) -> Option<AssetRecipe> {
        self.entries.remove(&kind).map(|r| r.recipe)
    }

    pub fn recipe(&self, kind: VisualKind) -> Option<&AssetRecipe> {
        self.entries.get(&kind).map(|r| &r.recipe)
    }

    pub fn contains(&self, kind: VisualKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Kinds with a recipe.
    pub fn kinds(&self) -> impl Iterator<Item = VisualKind> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registry backing the catalog's visuals.
    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    /// Save the recipes to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let file = std::fs::File::create(path)?;
        let contents = CatalogFile {
            assets: self
                .entries
                .iter()
                .map(|(kind, r)| (*kind, r.recipe))
                .collect(),
        };
        serde_json::to_writer_pretty(file, &contents)?;
        Ok(())
    }

    /// Load recipes from a JSON file.
    ///
    /// Kinds the file leaves out are simply absent from the catalog.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let file = std::fs::File::open(path.as_ref())?;
        let contents: CatalogFile = serde_json::from_reader(file)?;
        let mut catalog = Self::new();
        for (kind, recipe) in contents.assets {
            catalog.insert(kind, recipe);
        }
        tracing::debug!(
            path = %path.as_ref().display(),
            kinds = catalog.len(),
            "asset catalog loaded"
        );
        Ok(catalog)
    }
}

impl VisualFactory for AssetCatalog {
    type Handle = Visual;

    fn create(&self, kind: VisualKind, coord: TileCoord) -> Result<Visual, VisualError> {
        let resolved = self
            .entries
            .get(&kind)
            .ok_or(VisualError::UnknownKind(kind))?;
        Ok(Visual {
            id: visual_id(kind, coord),
            kind,
            coord,
            transform: Transform::for_tile(
                coord,
                resolved.recipe.height,
                resolved.recipe.elevation,
            ),
            mesh: resolved.mesh,
            material: resolved.material,
        })
    }
}

fn visual_id(kind: VisualKind, coord: TileCoord) -> VisualId {
    let mut hasher = Sha256::new();
    hasher.update(kind.id().as_bytes());
    hasher.update(coord.x.to_le_bytes());
    hasher.update(coord.y.to_le_bytes());
    VisualId(digest_prefix(hasher))
}
