//! Hierarchical document store backend
//!
//! Stores entities as flat JSON records in nested collections, SQLite-backed
//! behind a mutexed connection. Collections encode the hierarchy:
//! `recordings`, `recordings/<id>/segments`, `documents`, and
//! `documents/<id>/documents`. The caller's kind discriminator plus the
//! parent reference decide where a record is filed; nothing stored inside
//! the payload does.
//!
//! Policy decisions relative to the relational backend:
//! - `update` is a merge-write that creates the record when absent
//! - deleting a parent removes its nested sub-collection
//! - `QaPost` is not stored here; question/answer content lives inline in
//!   the flattened document shape

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};

use crate::config::ArchiveConfig;
use crate::db::codec;
use crate::db::search::{fold, prefix_range};
use crate::error::{ArchiveError, Result};
use crate::models::{Entity, EntityId, EntityKind};

use super::{child_id, document_id, recording_id, ArchiveRepo, EntityStream};

const BACKEND_NAME: &str = "document";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection  TEXT NOT NULL,
    id          TEXT NOT NULL,
    title_key   TEXT NOT NULL DEFAULT '',
    doc         TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS idx_documents_title
    ON documents (collection, title_key);
"#;

/// Thread-safe hierarchical document store
#[derive(Clone)]
pub struct DocumentStore {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl DocumentStore {
    /// Open the store at the configured path
    pub fn open(config: &ArchiveConfig) -> Result<Self> {
        Self::open_at(config.document_path())
    }

    /// Open or create the store at the given path
    pub fn open_at(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| ArchiveError::Connect {
                    source: Box::new(e),
                })?;
            }
        }

        let conn = Connection::open(&path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        };
        store.run_migrations()?;
        tracing::info!(path = %store.path.display(), "document store opened");
        Ok(store)
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            path: PathBuf::from(":memory:"),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }
}

/// Collection path for a kind, validating the parent reference shape
fn collection_for(kind: EntityKind, parent: Option<&EntityId>) -> Result<String> {
    match (kind, parent) {
        (EntityKind::Recording, None) => Ok("recordings".to_owned()),
        (EntityKind::Recording, Some(_)) => Err(ArchiveError::invalid_input(
            "recording takes no parent reference",
        )),
        (EntityKind::Segment, Some(p)) => Ok(format!("recordings/{}/segments", p)),
        (EntityKind::Segment, None) => Err(ArchiveError::missing_parent(kind, None)),
        (EntityKind::Document, None) => Ok("documents".to_owned()),
        (EntityKind::Document, Some(p)) => Ok(format!("documents/{}/documents", p)),
        (EntityKind::QaPost, _) => Err(ArchiveError::unsupported(kind, BACKEND_NAME)),
    }
}

/// Collection the parent must exist in before a child write, if any
fn parent_key(kind: EntityKind, parent: Option<&EntityId>) -> Option<(&'static str, &EntityId)> {
    match (kind, parent) {
        (EntityKind::Segment, Some(p)) => Some(("recordings", p)),
        (EntityKind::Document, Some(p)) => Some(("documents", p)),
        _ => None,
    }
}

/// Sub-collection removed when a parent record is deleted
fn nested_collection(kind: EntityKind, id: &EntityId) -> Option<String> {
    match kind {
        EntityKind::Recording => Some(format!("recordings/{}/segments", id)),
        EntityKind::Document => Some(format!("documents/{}/documents", id)),
        EntityKind::Segment | EntityKind::QaPost => None,
    }
}

fn generated_id(kind: EntityKind, parent: Option<&EntityId>) -> EntityId {
    match (kind, parent) {
        (EntityKind::Segment, Some(p)) | (EntityKind::Document, Some(p)) => child_id(p),
        (EntityKind::Document, None) => document_id(),
        _ => recording_id(),
    }
}

fn doc_exists(conn: &Connection, collection: &str, id: &EntityId) -> Result<bool> {
    let found: Option<i32> = conn
        .query_row(
            "SELECT 1 FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

fn fetch_doc(conn: &Connection, collection: &str, id: &EntityId) -> Result<Option<Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT doc FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    match raw {
        None => Ok(None),
        Some(raw) => {
            let value = serde_json::from_str(&raw)
                .map_err(|_| ArchiveError::schema("$", "JSON object"))?;
            Ok(Some(value))
        }
    }
}

fn parse_object(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ArchiveError::schema("$", "JSON object")),
    }
}

fn title_key_of(doc: &Map<String, Value>) -> String {
    doc.get("title")
        .and_then(Value::as_str)
        .map(fold)
        .unwrap_or_default()
}

#[async_trait]
impl ArchiveRepo for DocumentStore {
    async fn create(
        &self,
        kind: EntityKind,
        parent: Option<&EntityId>,
        supplied_id: Option<EntityId>,
        mut entity: Entity,
    ) -> Result<EntityId> {
        let collection = collection_for(kind, parent)?;
        let conn = self.conn.lock().unwrap();

        // The repository never silently creates missing parents
        if let Some((parent_collection, parent_id)) = parent_key(kind, parent) {
            if !doc_exists(&conn, parent_collection, parent_id)? {
                return Err(ArchiveError::missing_parent(kind, parent));
            }
        }

        let id = match supplied_id {
            Some(id) => {
                if doc_exists(&conn, &collection, &id)? {
                    return Err(ArchiveError::conflict(kind, &id));
                }
                id
            }
            None => generated_id(kind, parent),
        };

        entity.set_id(id.clone());
        if let Some(p) = parent {
            entity.set_parent(p);
        }
        entity.stamp_created(Utc::now());

        let doc = codec::encode(kind, &entity)?;
        conn.execute(
            "INSERT INTO documents (collection, id, title_key, doc) VALUES (?1, ?2, ?3, ?4)",
            params![
                collection,
                id.to_string(),
                title_key_of(&doc),
                Value::Object(doc).to_string()
            ],
        )?;

        tracing::debug!(%kind, %id, collection, "document created");
        Ok(id)
    }

    async fn get(
        &self,
        kind: EntityKind,
        parent: Option<&EntityId>,
        id: &EntityId,
    ) -> Result<Entity> {
        let collection = collection_for(kind, parent)?;
        let conn = self.conn.lock().unwrap();

        match fetch_doc(&conn, &collection, id)? {
            None => Err(ArchiveError::not_found(kind, id)),
            Some(value) => codec::decode(kind, id.clone(), &value),
        }
    }

    async fn update(
        &self,
        kind: EntityKind,
        parent: Option<&EntityId>,
        id: &EntityId,
        mut entity: Entity,
    ) -> Result<()> {
        let collection = collection_for(kind, parent)?;
        let conn = self.conn.lock().unwrap();

        if let Some((parent_collection, parent_id)) = parent_key(kind, parent) {
            if !doc_exists(&conn, parent_collection, parent_id)? {
                return Err(ArchiveError::missing_parent(kind, parent));
            }
        }

        entity.set_id(id.clone());
        if let Some(p) = parent {
            entity.set_parent(p);
        }
        entity.stamp_updated(Utc::now());
        let patch = codec::encode(kind, &entity)?;

        // Merge-write: fields the caller set overwrite the stored values,
        // null (unset) fields leave them alone, and an absent record is
        // created outright.
        let merged = match fetch_doc(&conn, &collection, id)? {
            Some(stored) => {
                let mut base = parse_object(stored)?;
                for (field, value) in patch {
                    if !value.is_null() {
                        base.insert(field, value);
                    }
                }
                base
            }
            None => patch,
        };

        conn.execute(
            "INSERT OR REPLACE INTO documents (collection, id, title_key, doc) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                collection,
                id.to_string(),
                title_key_of(&merged),
                Value::Object(merged).to_string()
            ],
        )?;

        tracing::debug!(%kind, %id, collection, "document merged");
        Ok(())
    }

    async fn delete(
        &self,
        kind: EntityKind,
        parent: Option<&EntityId>,
        id: &EntityId,
    ) -> Result<()> {
        let collection = collection_for(kind, parent)?;
        let conn = self.conn.lock().unwrap();

        let removed = conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id.to_string()],
        )?;

        // Parent delete takes the nested sub-collection with it
        if let Some(nested) = nested_collection(kind, id) {
            conn.execute("DELETE FROM documents WHERE collection = ?1", [nested])?;
        }

        tracing::debug!(%kind, %id, collection, removed, "document deleted");
        Ok(())
    }

    async fn list<'a>(
        &'a self,
        kind: EntityKind,
        parent: Option<&'a EntityId>,
    ) -> Result<EntityStream<'a>> {
        let collection = collection_for(kind, parent)?;
        let rows = {
            let conn = self.conn.lock().unwrap();
            let mut stmt = conn.prepare(
                "SELECT id, doc FROM documents WHERE collection = ?1 ORDER BY rowid",
            )?;
            let rows = stmt
                .query_map([collection.as_str()], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows
        };

        // Rows are fetched eagerly under the connection lock; only decoding
        // is deferred, so dropping the stream skips the remaining decodes.
        let stream = stream::iter(rows).map(move |(id, raw)| {
            let value: Value = serde_json::from_str(&raw)
                .map_err(|_| ArchiveError::schema("$", "JSON object"))?;
            codec::decode(kind, EntityId::Text(id), &value)
        });

        Ok(stream.boxed())
    }

    async fn search_by_title_prefix(
        &self,
        kind: EntityKind,
        parent: Option<&EntityId>,
        prefix: &str,
    ) -> Result<Vec<Entity>> {
        if !kind.has_title() {
            return Err(ArchiveError::unsupported(kind, BACKEND_NAME));
        }
        let collection = collection_for(kind, parent)?;
        let range = prefix_range(prefix);

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, doc FROM documents \
             WHERE collection = ?1 AND title_key >= ?2 AND title_key < ?3 \
             ORDER BY title_key ASC",
        )?;
        let rows = stmt
            .query_map(params![collection, range.lower, range.upper], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, raw)| {
                let value: Value = serde_json::from_str(&raw)
                    .map_err(|_| ArchiveError::schema("$", "JSON object"))?;
                codec::decode(kind, EntityId::Text(id), &value)
            })
            .collect()
    }

    async fn close(&self) {
        // Writes commit eagerly; nothing to flush on shutdown
        tracing::debug!(path = %self.path.display(), "document store closed");
    }
}
