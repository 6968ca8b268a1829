use thiserror::Error;

/// Errors returned by the state store.
///
/// `NotFound` and `Gone` both mean the object is absent; callers that treat
/// absence as success should use [`StoreError::is_not_found`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("{kind} {namespace}/{name} is gone")]
    Gone {
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("{kind} {namespace}/{name} already exists")]
    AlreadyExists {
        kind: String,
        namespace: String,
        name: String,
    },

    /// The write was based on a stale copy of the object.
    #[error(
        "conflict writing {kind} {namespace}/{name}: expected resource version {expected}, found {found}"
    )]
    Conflict {
        kind: String,
        namespace: String,
        name: String,
        expected: u64,
        found: u64,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("state backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. } | StoreError::Gone { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}
