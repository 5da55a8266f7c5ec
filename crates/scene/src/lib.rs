//! Scene Adapter: keeps presentation objects in step with the city kernel.
//!
//! # Invariants
//! - At most one terrain and one building visual is bound per tile.
//! - Only handles the reconciler bound are ever removed from a host.
//! - Re-syncing an unchanged snapshot issues no host operations.
//! - The binding table belongs to the reconciler; the kernel never sees it.

mod factory;
mod graph;
mod reconciler;

pub use factory::{FailureSink, SceneHost, TracingSink, VisualError, VisualFactory, VisualFailure};
pub use graph::{SceneGraph, SceneNode};
pub use reconciler::{ReconcileReport, SceneError, SceneReconciler, VisualBinding};
