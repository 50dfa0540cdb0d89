//! qa-archive: storage backend for a question-and-answer audio archive
//!
//! Recordings are split into segments, and segments carry published Q&A
//! posts. The crate stores that hierarchy behind a single repository
//! contract with two interchangeable backends:
//!
//! - a hierarchical document store (embedded SQLite holding JSON documents
//!   in path-style collections)
//! - a relational store (pooled Postgres with foreign-key-linked tables)
//!
//! ```no_run
//! use qa_archive::{open_archive, ArchiveConfig, EntityKind, Recording};
//!
//! # async fn run() -> qa_archive::Result<()> {
//! let config = ArchiveConfig::from_env()?;
//! let repo = open_archive(&config).await?;
//!
//! let id = repo
//!     .create(
//!         EntityKind::Recording,
//!         None,
//!         None,
//!         Recording::new("Friday Lecture", "archive", "/audio/friday.mp3", 3600).into(),
//!     )
//!     .await?;
//! let hits = repo
//!     .search_by_title_prefix(EntityKind::Recording, None, "fri")
//!     .await?;
//! # let _ = (id, hits);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use config::{ArchiveConfig, BackendKind};
pub use db::{
    open_archive, ArchiveRepo, ConnectionManager, DocumentStore, EntityStream, RelationalStore,
};
pub use error::{ArchiveError, Result};
pub use models::{Entity, EntityId, EntityKind, GenericDocument, QaPost, Recording, Segment};
