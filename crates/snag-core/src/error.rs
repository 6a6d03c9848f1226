//! # Error Taxonomy
//!
//! The single error type shared by every crate in the workspace. All
//! failures are typed and caller-visible; nothing is downgraded to a
//! generic success or silently swallowed. The only permitted local
//! recovery elsewhere in the workspace is defaulting of optional
//! pagination/sort parameters and role-shape normalization, never
//! auto-correction of a business-rule violation.

use thiserror::Error;

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The workspace-wide error taxonomy.
///
/// Each variant carries a human-readable reason. Internal details (SQL,
/// driver messages, file paths) are confined to `Storage` and are replaced
/// with a generic message before leaving the HTTP boundary.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input, rejected before any side effect.
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or unresolvable credential.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated caller with insufficient role or ownership.
    /// The message names the action and, where helpful, the roles that
    /// would suffice.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Referenced entity absent.
    #[error("{0} not found")]
    NotFound(String),

    /// Structurally disallowed status change, independent of role.
    /// Reports both the current and the requested status.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// The defect's current status.
        from: String,
        /// The requested target status, verbatim as supplied.
        to: String,
    },

    /// Concurrent write detected: the record changed between the
    /// validation read and the conditional write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Persistence or blob-store failure. Internal only.
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Shorthand for a `Validation` error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Shorthand for a `Forbidden` error.
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Shorthand for a `NotFound` error naming the missing entity.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// The stable machine-readable kind for this error, used by the HTTP
    /// boundary and asserted by tests.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Conflict(_) => "conflict",
            Self::Storage(_) => "storage",
        }
    }
}
