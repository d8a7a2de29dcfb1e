//! Error types for the sem-core library.
//!
//! Structured error types that preserve context and propagate cleanly
//! through the extraction, matching, and storage layers, per the
//! propagation policy in spec §7: parse failures are swallowed locally by
//! the orchestrator, every other error surfaces to the caller as a tagged
//! [`SemError`] rather than a panic or a raw downstream error type.

use std::io;

use thiserror::Error;

/// Main result type for sem-core operations.
pub type Result<T> = std::result::Result<T, SemError>;

/// Comprehensive error type for all sem-core operations.
#[derive(Error, Debug)]
pub enum SemError {
    /// I/O related errors (file operations, working tree reads).
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message.
        message: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Configuration errors.
    #[error("Configuration error: {message}")]
    Config {
        /// Error description.
        message: String,
        /// Configuration field that caused the error.
        field: Option<String>,
    },

    /// Parsing and entity-extraction errors.
    #[error("Parse error in {plugin}: {message}")]
    Parse {
        /// Plugin id that raised the error.
        plugin: String,
        /// Error description.
        message: String,
        /// File path where the error occurred.
        file_path: Option<String>,
    },

    /// VCS bridge errors (no repository, bad revision, blob read failure).
    #[error("VCS error: {message}")]
    Vcs {
        /// Error description.
        message: String,
    },

    /// Store initialisation/transaction errors.
    #[error("Store error: {message}")]
    Store {
        /// Error description.
        message: String,
        /// Underlying rusqlite error, when applicable.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A caller-supplied SQL query was rejected by the store.
    #[error("Invalid query: {message}")]
    InvalidQuery {
        /// Error text forwarded verbatim from the store.
        message: String,
    },

    /// Operation cancelled via a caller-supplied cancellation token.
    #[error("Operation cancelled")]
    Cancelled,

    /// Serialisation/deserialisation errors.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description.
        message: String,
        /// Underlying serialisation error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Unsupported operation or file type.
    #[error("Unsupported: {message}")]
    Unsupported {
        /// Error description.
        message: String,
    },

    /// Generic internal errors.
    #[error("Internal error: {message}")]
    Internal {
        /// Error description.
        message: String,
        /// Additional context.
        context: Option<String>,
    },
}

impl SemError {
    /// Create a new I/O error with context.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context.
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new parse error.
    pub fn parse(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            plugin: plugin.into(),
            message: message.into(),
            file_path: None,
        }
    }

    /// Create a new parse error with file context.
    pub fn parse_with_path(
        plugin: impl Into<String>,
        message: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        Self::Parse {
            plugin: plugin.into(),
            message: message.into(),
            file_path: Some(file_path.into()),
        }
    }

    /// Create a new VCS bridge error.
    pub fn vcs(message: impl Into<String>) -> Self {
        Self::Vcs {
            message: message.into(),
        }
    }

    /// Create a new store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new invalid-query error.
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Create a new unsupported-operation error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }

    /// Add context to an existing error.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        if let Self::Internal { context: ctx, .. } = &mut self {
            *ctx = Some(context.into());
        }
        self
    }
}

impl From<io::Error> for SemError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for SemError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for SemError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

impl From<toml::de::Error> for SemError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse {
            plugin: "toml".to_string(),
            message: err.to_string(),
            file_path: None,
        }
    }
}

impl From<rusqlite::Error> for SemError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store {
            message: format!("SQLite operation failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

impl From<git2::Error> for SemError {
    fn from(err: git2::Error) -> Self {
        Self::Vcs {
            message: format!("git operation failed: {err}"),
        }
    }
}

/// Result extension trait for adding context to errors.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<SemError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SemError::config("bad config");
        assert!(matches!(err, SemError::Config { .. }));

        let err = SemError::parse("json", "unexpected token");
        assert!(matches!(err, SemError::Parse { .. }));
    }

    #[test]
    fn test_error_with_context() {
        let err = SemError::internal("boom").with_context("during matching");
        if let SemError::Internal { context, .. } = err {
            assert_eq!(context, Some("during matching".to_string()));
        } else {
            panic!("expected Internal error");
        }
    }

    #[test]
    fn test_result_extension() {
        let result: std::result::Result<i32, io::Error> =
            Err(io::Error::new(io::ErrorKind::NotFound, "missing"));
        let sem_result = result.with_context(|| "reading config".to_string());
        assert!(sem_result.is_err());
    }
}
