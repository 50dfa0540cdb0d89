//! Archive configuration loaded from the environment
//!
//! The backend strategy is selected here, at process start; call sites only
//! ever see the repository contract and never branch on backend type.

use std::env;
use std::path::PathBuf;

use crate::error::{ArchiveError, Result};

/// Default maximum connections for the Postgres pool.
/// Kept low for single-service tooling.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Default SQLite file for the document backend when none is configured
const DEFAULT_DOCUMENT_PATH: &str = "qa-archive.sqlite";

/// Which storage strategy backs the repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Three foreign-key-linked tables behind a pooled Postgres connection
    Relational,
    /// Hierarchical document store: JSON documents in nested collections
    Document,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Relational => write!(f, "relational"),
            BackendKind::Document => write!(f, "document"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "relational" | "postgres" => Ok(BackendKind::Relational),
            "document" | "sqlite" => Ok(BackendKind::Document),
            other => Err(ArchiveError::config(format!(
                "unknown backend '{}' (expected 'relational' or 'document')",
                other
            ))),
        }
    }
}

/// Archive configuration
///
/// Environment variables:
/// - `ARCHIVE_BACKEND`: `relational` or `document` (default `document`)
/// - `DATABASE_URL`: Postgres connection string, required for `relational`
/// - `ARCHIVE_DB_PATH`: SQLite file for the document backend
/// - `ARCHIVE_MAX_CONNECTIONS`: pool size for the relational backend
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub backend: BackendKind,
    pub database_url: Option<String>,
    pub document_path: Option<PathBuf>,
    pub max_connections: u32,
}

impl ArchiveConfig {
    /// Load configuration from the process environment (reads `.env` first)
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend = match lookup("ARCHIVE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => BackendKind::Document,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        let document_path = lookup("ARCHIVE_DB_PATH").map(PathBuf::from);

        let max_connections = match lookup("ARCHIVE_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().map_err(|_| {
                ArchiveError::config(format!(
                    "ARCHIVE_MAX_CONNECTIONS must be a positive integer, got '{}'",
                    raw
                ))
            })?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let config = Self {
            backend,
            database_url,
            document_path,
            max_connections,
        };

        // Fail fast at startup rather than at first use
        if config.backend == BackendKind::Relational {
            config.database_url()?;
        }

        Ok(config)
    }

    /// Connection string for the relational backend
    pub fn database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ArchiveError::config("DATABASE_URL is required for the relational backend"))
    }

    /// SQLite file backing the document store
    pub fn document_path(&self) -> PathBuf {
        self.document_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCUMENT_PATH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |key| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn defaults_to_document_backend() {
        let config = ArchiveConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.backend, BackendKind::Document);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.document_path(), PathBuf::from(DEFAULT_DOCUMENT_PATH));
    }

    #[test]
    fn relational_requires_database_url() {
        let err = ArchiveConfig::from_lookup(lookup(&[("ARCHIVE_BACKEND", "postgres")]))
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Config { .. }));

        let config = ArchiveConfig::from_lookup(lookup(&[
            ("ARCHIVE_BACKEND", "relational"),
            ("DATABASE_URL", "postgres://localhost/archive"),
        ]))
        .unwrap();
        assert_eq!(config.backend, BackendKind::Relational);
    }

    #[test]
    fn rejects_malformed_values() {
        let err =
            ArchiveConfig::from_lookup(lookup(&[("ARCHIVE_BACKEND", "mongodb")])).unwrap_err();
        assert!(err.to_string().contains("unknown backend"));

        let err = ArchiveConfig::from_lookup(lookup(&[("ARCHIVE_MAX_CONNECTIONS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Config { .. }));
    }
}
