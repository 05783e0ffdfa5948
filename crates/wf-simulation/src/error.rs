use wf_core::{CoreError, RouteId};

/// Result alias for simulation operations.
pub type SimResult<T> = Result<T, SimError>;

/// Errors raised by the simulation crate.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A configuration, identifier, or enumeration error from `wf-core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Crime severity must be within `1..=5`.
    #[error("crime severity must be within 1..=5, got {0}")]
    InvalidSeverity(u8),

    /// Time deltas must be finite, non-negative, and fit in the sub-tick limit.
    #[error("time delta must be finite, non-negative, and within the sub-tick limit, got {0}")]
    InvalidDelta(f64),

    /// A route was registered without waypoints.
    #[error("route {0} has no waypoints")]
    EmptyRoute(RouteId),

    /// A snapshot could not be encoded or decoded.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// A snapshot was written by an incompatible version.
    #[error("unsupported snapshot version {found}, expected {expected}")]
    UnsupportedSnapshotVersion {
        /// Version tag found in the document.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },
}
