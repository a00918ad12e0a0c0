//! Engine-level error type.

use vidova_core::collab::CollabError;
use vidova_core::error::CoreError;

/// Failure inside a pipeline run, the dispatcher, or the reconciler.
///
/// Pipeline callers convert these into a terminal `failed` write on the
/// job; they never escape past the dispatch boundary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] CoreError),

    #[error(transparent)]
    Collaborator(#[from] CollabError),

    /// A memoized step result could not be re-encoded or decoded. Only
    /// reachable when a step's result type changes between deploys.
    #[error("Step \"{step}\" has an undecodable result: {source}")]
    StepDecode {
        step: String,
        source: serde_json::Error,
    },
}
