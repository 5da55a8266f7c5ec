use citygrid_common::{TileCoord, VisualKind};

/// Errors a visual factory can report for a single request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VisualError {
    #[error("no visual registered for kind {0}")]
    UnknownKind(VisualKind),
}

/// Produces presentation objects for tile kinds.
///
/// `create` must depend only on its arguments: the same kind and coordinate
/// always describe the same visual.
pub trait VisualFactory {
    /// Opaque handle to one renderable object.
    type Handle;

    fn create(&self, kind: VisualKind, coord: TileCoord) -> Result<Self::Handle, VisualError>;
}

/// Places and unplaces visuals in whatever scene is being presented.
pub trait SceneHost<H> {
    fn add(&mut self, handle: &H);

    /// Only ever called with a handle previously passed to `add`.
    fn remove(&mut self, handle: &H);
}

/// A visual that could not be produced during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualFailure {
    pub coord: TileCoord,
    pub kind: VisualKind,
    pub error: VisualError,
}

/// Receives per-tile visual failures. Reporting never aborts a sync.
pub trait FailureSink {
    fn report(&mut self, failure: VisualFailure);
}

/// Collects failures for later inspection.
impl FailureSink for Vec<VisualFailure> {
    fn report(&mut self, failure: VisualFailure) {
        self.push(failure);
    }
}

/// Logs failures as warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl FailureSink for TracingSink {
    fn report(&mut self, failure: VisualFailure) {
        tracing::warn!(
            coord = %failure.coord,
            kind = %failure.kind,
            "visual unavailable: {}",
            failure.error
        );
    }
}
