//! Tile assets: content-addressed registry and the catalog that turns tile
//! kinds into placed visuals.
//!
//! Visuals reference meshes and materials by content hash, never by name, so
//! two catalogs built from the same recipes agree on every id.

mod catalog;
mod store;

pub use catalog::{AssetCatalog, AssetRecipe, Visual};
pub use store::{Asset, AssetError, AssetId, AssetStore, BoxMesh, Material};
