//! Error types shared across the quiz engine.
//!
//! Defined in `quizwall-core` so pool sources, the progress store, and the
//! CLI can all classify failures without string matching.

use thiserror::Error;

/// Errors that prevent a question pool from being used for an attempt.
#[derive(Debug, Error)]
pub enum PoolLoadError {
    /// No pool exists for the requested module.
    #[error("pool not found for module {0}")]
    NotFound(String),

    /// The pool source answered with a non-success HTTP status.
    #[error("pool request for module {module_id} failed (HTTP {status})")]
    HttpStatus { module_id: String, status: u16 },

    /// The pool could not be fetched (network or file system failure).
    #[error("failed to fetch pool for module {module_id}: {message}")]
    Fetch { module_id: String, message: String },

    /// The pool document is not valid JSON of the expected shape.
    #[error("malformed pool for module {module_id}: {message}")]
    Malformed { module_id: String, message: String },

    /// The pool parsed but breaks a structural rule (duplicate id, bad answer index, ...).
    #[error("invalid pool for module {module_id}: {message}")]
    Invalid { module_id: String, message: String },
}

impl PoolLoadError {
    /// Returns the module id this error refers to.
    pub fn module_id(&self) -> &str {
        match self {
            PoolLoadError::NotFound(id) => id,
            PoolLoadError::HttpStatus { module_id, .. }
            | PoolLoadError::Fetch { module_id, .. }
            | PoolLoadError::Malformed { module_id, .. }
            | PoolLoadError::Invalid { module_id, .. } => module_id,
        }
    }
}

/// Errors raised when an imported snapshot is structurally unusable.
///
/// The current store is never touched when one of these is returned.
#[derive(Debug, Error)]
pub enum ImportValidationError {
    /// The payload is not parseable JSON.
    #[error("import is not valid JSON: {0}")]
    InvalidJson(String),

    /// The payload parsed, but the top-level value is not an object.
    #[error("import must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    /// The object does not match the progress record shape.
    #[error("import does not match the progress format: {0}")]
    Shape(String),

    /// Writing the imported snapshot failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from the persistence backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend failed to read, write, or remove a record.
    #[error("storage backend error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be serialized.
    #[error("failed to serialize progress: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(key: &str, source: std::io::Error) -> Self {
        StoreError::Io {
            key: key.to_string(),
            source,
        }
    }
}
