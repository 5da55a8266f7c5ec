use citygrid_common::VisualId;
use std::collections::BTreeMap;

use crate::factory::SceneHost;

/// A visual that a [`SceneGraph`] can index.
pub trait SceneNode {
    fn visual_id(&self) -> VisualId;
}

/// In-memory scene host: the set of visuals currently placed.
///
/// Keyed by visual id in a BTreeMap so iteration is deterministic. Adding an
/// id twice or removing an id that is not present leaves the graph consistent
/// and is logged, since either means a caller lost track of its handles.
#[derive(Debug, Clone)]
pub struct SceneGraph<H> {
    nodes: BTreeMap<VisualId, H>,
    adds: u64,
    removes: u64,
}

impl<H> Default for SceneGraph<H> {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            adds: 0,
            removes: 0,
        }
    }
}

impl<H: SceneNode + Clone> SceneGraph<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of visuals currently placed.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: VisualId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn get(&self, id: VisualId) -> Option<&H> {
        self.nodes.get(&id)
    }

    /// Placed visuals in id order.
    pub fn iter(&self) -> impl Iterator<Item = &H> {
        self.nodes.values()
    }

    /// Total `add` calls received.
    pub fn add_count(&self) -> u64 {
        self.adds
    }

    /// Total `remove` calls received.
    pub fn remove_count(&self) -> u64 {
        self.removes
    }
}

impl<H: SceneNode + Clone> SceneHost<H> for SceneGraph<H> {
    fn add(&mut self, handle: &H) {
        self.adds += 1;
        let id = handle.visual_id();
        if self.nodes.insert(id, handle.clone()).is_some() {
            tracing::warn!(?id, "visual added twice; keeping one copy");
        }
    }

    fn remove(&mut self, handle: &H) {
        self.removes += 1;
        let id = handle.visual_id();
        if self.nodes.remove(&id).is_none() {
            tracing::warn!(?id, "removed visual was not in the scene");
        }
    }
}
