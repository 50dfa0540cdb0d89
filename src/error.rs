//! Structured error types for the archive data-access layer.
//!
//! Backend errors are classified into this taxonomy at the storage boundary;
//! nothing below it leaks raw driver errors to callers. Consumers map the
//! variants onto their own surface (an HTTP layer maps `NotFound` to 404,
//! `MissingParent`/`InvalidInput` to 400, `Conflict` to 409, the rest to 500).

use thiserror::Error;

use crate::models::{EntityId, EntityKind};

/// Result type alias for archive operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Main error type for the archive repository and its backends
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Required connection configuration absent or malformed. Fatal at startup.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// Backend unreachable. Retryable by the caller with backoff; the
    /// repository never retries internally.
    #[error("backend unreachable: {source}")]
    Connect {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No record at the requested key.
    #[error("not found: {kind} '{id}'")]
    NotFound { kind: EntityKind, id: String },

    /// A child operation referenced a parent that does not exist.
    #[error("missing parent for {kind}: '{parent}'")]
    MissingParent { kind: EntityKind, parent: String },

    /// An explicit id on create collided with an existing record.
    #[error("conflict: {kind} '{id}' already exists")]
    Conflict { kind: EntityKind, id: String },

    /// A stored record does not decode into the expected shape. Indicates
    /// data corruption or a version mismatch; never silently coerced.
    #[error("schema mismatch at field '{field}': expected {expected}")]
    Schema {
        field: String,
        expected: &'static str,
    },

    /// Malformed caller-supplied data (bad segment range, wrong payload kind).
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The selected backend does not store this entity kind.
    #[error("{kind} is not supported by the {backend} backend")]
    UnsupportedKind {
        kind: EntityKind,
        backend: &'static str,
    },

    /// Any other backend failure, already known not to be a reachability
    /// or constraint problem.
    #[error("backend error: {source}")]
    Backend {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ArchiveError {
    /// Create a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(kind: EntityKind, id: &EntityId) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Create a missing-parent error
    pub fn missing_parent(kind: EntityKind, parent: Option<&EntityId>) -> Self {
        Self::MissingParent {
            kind,
            parent: parent
                .map(|p| p.to_string())
                .unwrap_or_else(|| "(none)".to_owned()),
        }
    }

    /// Create a conflict error
    pub fn conflict(kind: EntityKind, id: &EntityId) -> Self {
        Self::Conflict {
            kind,
            id: id.to_string(),
        }
    }

    /// Create a schema error
    pub fn schema(field: impl Into<String>, expected: &'static str) -> Self {
        Self::Schema {
            field: field.into(),
            expected,
        }
    }

    /// Create an invalid-input error
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Create an unsupported-kind error
    pub fn unsupported(kind: EntityKind, backend: &'static str) -> Self {
        Self::UnsupportedKind { kind, backend }
    }

    /// True when retrying the operation later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }
}

impl From<sqlx::Error> for ArchiveError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(source) => Self::Config {
                reason: source.to_string(),
            },
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => Self::Connect {
                source: Box::new(err),
            },
            other => Self::Backend {
                source: Box::new(other),
            },
        }
    }
}

impl From<rusqlite::Error> for ArchiveError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::CannotOpen =>
            {
                Self::Connect {
                    source: Box::new(err),
                }
            }
            _ => Self::Backend {
                source: Box::new(err),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_key() {
        let err = ArchiveError::not_found(EntityKind::Recording, &EntityId::from("audio_abc"));
        assert_eq!(err.to_string(), "not found: recording 'audio_abc'");

        let err = ArchiveError::missing_parent(EntityKind::Segment, None);
        assert!(err.to_string().contains("(none)"));
    }

    #[test]
    fn retryable_classification() {
        assert!(ArchiveError::from(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(!ArchiveError::config("missing DATABASE_URL").is_retryable());
    }
}
