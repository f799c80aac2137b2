//! Unified error types for the Mirage workspace.

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum MirageError {
    /// A resource with the same identifier is already registered.
    #[error("{kind} already exists: {id}")]
    AlreadyExists {
        /// Type of the conflicting resource.
        kind: &'static str,
        /// Identifier that is already taken.
        id: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// No async runtime is available to host a simulated process.
    #[error("runtime unavailable: {message}")]
    Runtime {
        /// Description of the runtime failure.
        message: String,
    },

    /// A process lifecycle task ended without publishing an exit status.
    #[error("process {id} lost its lifecycle task before exiting")]
    ProcessLost {
        /// Identifier of the abandoned process.
        id: String,
    },

    /// A lock guarding shared state was poisoned by a panicking holder.
    #[error("{resource} lock poisoned")]
    LockPoisoned {
        /// Name of the guarded resource.
        resource: &'static str,
    },

    /// Deserialization of a structured payload failed.
    #[error("decode error: {source}")]
    Decode {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl MirageError {
    /// Shorthand for a [`MirageError::NotFound`] of the given kind.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Returns whether this error reports a missing resource.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns whether this error reports a duplicate resource.
    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, MirageError>;
