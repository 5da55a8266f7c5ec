//! Shared types for the citygrid engine.
//!
//! Everything here is plain data: coordinates, the terrain and building tier
//! enumerations, and the keys the scene layer uses to ask for visuals.

mod kind;
mod types;

pub use kind::{BuildingTier, ParseKindError, TerrainKind, VisualKind};
pub use types::{TileCoord, Transform, VisualId};
