//! City Kernel: authoritative tile state, tier growth stepping, deterministic replay hooks.
//!
//! # Invariants
//! - Every coordinate in `size × size` holds exactly one tile, created once.
//! - Under `tick()` a tile's tier only moves forward one step at a time.
//! - Snapshots are owned copies; later ticks never change them.

pub mod city;
pub mod config;
pub mod growth;
pub mod snapshot;

pub use city::{City, CityError, CityEvent, CityId, Tile};
pub use config::{CityConfig, ConfigError};
pub use growth::{DEFAULT_GROWTH_PROBABILITY, advance};
pub use snapshot::CitySnapshot;
