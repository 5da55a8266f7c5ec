//! Rendering Adapter: renderer-agnostic interface over the scene graph.
//!
//! # Invariants
//! - Renderers read the scene graph; they never mutate it or the city.
//! - Render output derives only from the visuals currently placed.

mod renderer;

pub use renderer::{DebugTextRenderer, Renderer};
