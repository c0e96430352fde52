//! Error types used throughout the publishing pipeline.
//!
//! Every pipeline operation resolves to [`Result`]; nothing panics past a
//! component boundary. The variants distinguish the three failure classes
//! the store has to tell apart: intentional cancellation, transient remote
//! failures, and input rejected before it ever reaches a record.

/// Pipeline error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The operation was intentionally superseded (record reset or removed).
    /// Never surfaced as a user-visible record error.
    #[error("operation cancelled")]
    Cancelled,

    /// A transient remote failure during stash, publish or finalize.
    /// `info` carries the service's nested detail message when present.
    #[error("remote error: {code}")]
    Remote {
        /// Machine-readable error code reported by the remote service.
        code: String,
        /// Human-readable detail, when the service provided one.
        info: Option<String>,
    },

    /// Input rejected before entering the pipeline (empty word, illegal
    /// transition, missing media).
    #[error("validation error: {0}")]
    Validation(String),

    /// No record is registered under the given word.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The request queue worker has shut down.
    #[error("request queue is closed")]
    QueueClosed,
}

impl Error {
    /// Create a new Remote error from a bare error code.
    pub fn remote<S: Into<String>>(code: S) -> Self {
        Self::Remote {
            code: code.into(),
            info: None,
        }
    }

    /// Create a new Remote error with a nested detail message.
    pub fn remote_with_info<S: Into<String>, I: Into<String>>(code: S, info: I) -> Self {
        Self::Remote {
            code: code.into(),
            info: Some(info.into()),
        }
    }

    /// Create a new Validation error.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(word: S) -> Self {
        Self::NotFound(word.into())
    }

    /// Whether this failure marks an operation that was deliberately
    /// abandoned rather than one that went wrong.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Text recorded against a record when the operation fails: the nested
    /// detail when the service sent one, otherwise the bare code.
    pub fn user_message(&self) -> String {
        match self {
            Self::Remote {
                info: Some(info), ..
            } => info.clone(),
            Self::Remote { code, .. } => code.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias using the pipeline Error type.
pub type Result<T> = std::result::Result<T, Error>;
