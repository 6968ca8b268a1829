use pkg_state::StoreError;
use thiserror::Error;

/// Errors that abort a reconciliation pass. Every variant is returned to
/// the trigger, which retries the whole pass later.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Legacy daemon pods were still present when the drain budget ran out.
    #[error("legacy daemon pods still present after {attempts} checks ({remaining} remaining)")]
    BackoffExhausted { attempts: u32, remaining: usize },

    #[error("malformed label selector: {0}")]
    MalformedSelector(String),

    #[error("mutation changed the identity of {kind} {namespace}/{name}")]
    IdentityChanged {
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("failed to render {what}: {message}")]
    Render { what: String, message: String },
}
