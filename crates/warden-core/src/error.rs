//! Error types for warden-core.
//!
//! The same `Error` flows through every Warden crate so that a per-path
//! failure raised by a storage backend can be carried, unchanged, into the
//! `Failed` partition of a [`BulkResult`](crate::BulkResult).

use std::path::Path;

/// Result type alias for Warden operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving catalog permissions.
///
/// Marked `#[non_exhaustive]` so new backends can grow the taxonomy
/// without breaking downstream matches.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The request itself is malformed (e.g. an empty path).
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the input
        message: String,
    },

    /// The operation name is not part of the catalog taxonomy.
    #[error("Operation type not known: {operation}")]
    InvalidOperation {
        /// The rejected operation name
        operation: String,
    },

    /// The path does not exist in the catalog.
    #[error("No such file or directory: {path}")]
    NotFound {
        /// Path that was looked up
        path: String,
    },

    /// Storage or transport failure that is not a missing entry.
    #[error("Backend error: {message}")]
    Backend {
        /// Human-readable error message
        message: String,
        /// Source error if available
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Domain metadata attached to a path could not be interpreted.
    #[error("Invalid metadata for {path}: {message}")]
    Metadata {
        /// Path whose metadata is malformed
        path: String,
        /// What went wrong
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// I/O error while reading configuration or fixtures.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// File that could not be read
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Creates a new invalid input error.
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Error::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a new invalid operation error.
    pub fn invalid_operation<S: Into<String>>(operation: S) -> Self {
        Error::InvalidOperation {
            operation: operation.into(),
        }
    }

    /// Creates a new not-found error for `path`.
    pub fn not_found<S: Into<String>>(path: S) -> Self {
        Error::NotFound { path: path.into() }
    }

    /// Creates a new backend error with a message.
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Error::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new backend error with a message and source error.
    pub fn backend_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Backend {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new metadata error.
    pub fn metadata<P, M>(path: P, message: M) -> Self
    where
        P: Into<String>,
        M: Into<String>,
    {
        Error::Metadata {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Wraps an I/O error with the path that produced it.
    pub fn io_with_path(source: std::io::Error, path: &Path) -> Self {
        Error::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// Returns `true` if the error means the entry does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Returns whether this error aborts a whole bulk call.
    ///
    /// Everything else is recorded against the single path that raised it.
    pub fn aborts_call(&self) -> bool {
        match self {
            Error::InvalidInput { .. } => true,
            Error::InvalidOperation { .. } => true,
            Error::Config { .. } => true,
            Error::NotFound { .. } => false,
            Error::Backend { .. } => false,
            Error::Metadata { .. } => false,
            Error::Io { .. } => false,
            Error::Json(_) => false,
        }
    }
}
