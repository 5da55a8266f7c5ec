//! Developer Tooling: read-only city inspection for the CLI and debugging.
//!
//! # Invariants
//! - Tools never mutate the city.

mod inspector;

pub use inspector::{CityInspector, CitySummary, EventTally, TileInfo};
