use thiserror::Error;

use futures::task::SpawnError;

use crate::scope::ScopeId;

/// Unified result type for the signpost crate.
pub type Result<T> = std::result::Result<T, RouterError>;

/// Errors surfaced by the navigation engine.
///
/// Anything routable that simply fails to match is not an error: a fragment
/// without a route flushes the scope's not-found content, a malformed query
/// string parses to an empty view, and an ancestor-prefix mismatch skips the
/// scope for the pass. The variants below are boundary failures the caller
/// must hear about.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("outlet `{0}` not found")]
    OutletNotFound(String),
    #[error("redirect cycle detected at `{0}`")]
    RedirectCycle(String),
    #[error("routing scope `{0}` not found")]
    ScopeNotFound(ScopeId),
    #[error("deferred flush could not be spawned: {0}")]
    FlushSpawn(#[from] SpawnError),
}
