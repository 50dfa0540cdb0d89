//! Repository implementations for the two storage strategies
//!
//! Both backends satisfy the same [`ArchiveRepo`] contract:
//! - explicit [`EntityKind`] discriminator on every call
//! - hierarchy integrity enforced at write time (no silent parent creation)
//! - idempotent delete, lazy list cursor, prefix search over titles
//!
//! The backend is chosen once at startup via [`open_archive`]; call sites
//! never branch on backend type.

pub mod document;
pub mod relational;

use async_trait::async_trait;
use futures::stream::BoxStream;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::config::{ArchiveConfig, BackendKind};
use crate::error::Result;
use crate::models::{Entity, EntityId, EntityKind};

pub use document::DocumentStore;
pub use relational::RelationalStore;

/// Finite, non-restartable entity cursor. Dropping the stream early stops
/// remaining work: the relational backend releases its database cursor,
/// while the document backend fetches rows up front and only skips decoding
/// them.
pub type EntityStream<'a> = BoxStream<'a, Result<Entity>>;

/// CRUD + search contract shared by both storage strategies
#[async_trait]
pub trait ArchiveRepo: Send + Sync {
    /// Persist a new entity, returning its identifier.
    ///
    /// When `supplied_id` is absent an identifier is generated (opaque
    /// random string or backend-assigned serial, depending on backend).
    /// A supplied id that already exists fails with `Conflict`; a child
    /// kind without a resolvable parent fails with `MissingParent`.
    async fn create(
        &self,
        kind: EntityKind,
        parent: Option<&EntityId>,
        supplied_id: Option<EntityId>,
        entity: Entity,
    ) -> Result<EntityId>;

    /// Fetch one entity by composite key
    async fn get(
        &self,
        kind: EntityKind,
        parent: Option<&EntityId>,
        id: &EntityId,
    ) -> Result<Entity>;

    /// Field-level merge of `entity` onto the stored record. Identity never
    /// changes. The document backend upserts when the record is absent; the
    /// relational backend requires existence.
    async fn update(
        &self,
        kind: EntityKind,
        parent: Option<&EntityId>,
        id: &EntityId,
        entity: Entity,
    ) -> Result<()>;

    /// Delete by composite key. Idempotent: deleting an absent id succeeds.
    async fn delete(
        &self,
        kind: EntityKind,
        parent: Option<&EntityId>,
        id: &EntityId,
    ) -> Result<()>;

    /// All records of `kind` under `parent` (or all top-level records of
    /// `kind` when the kind takes no parent), in backend-native order
    async fn list<'a>(
        &'a self,
        kind: EntityKind,
        parent: Option<&'a EntityId>,
    ) -> Result<EntityStream<'a>>;

    /// Case-insensitive starts-with search over titles, ascending by title.
    /// Only title-bearing kinds are searchable. An empty result is not an
    /// error.
    async fn search_by_title_prefix(
        &self,
        kind: EntityKind,
        parent: Option<&EntityId>,
        prefix: &str,
    ) -> Result<Vec<Entity>>;

    /// Release the backend connection. Idempotent.
    async fn close(&self);
}

/// Open the repository selected by configuration
pub async fn open_archive(config: &ArchiveConfig) -> Result<Box<dyn ArchiveRepo>> {
    match config.backend {
        BackendKind::Relational => Ok(Box::new(RelationalStore::connect(config).await?)),
        BackendKind::Document => Ok(Box::new(DocumentStore::open(config)?)),
    }
}

/// Length of the random suffix on generated string ids. 62^8 keys make
/// collisions between concurrent creates negligible.
const ID_SUFFIX_LEN: usize = 8;

/// Length of standalone generated document ids
const DOCUMENT_ID_LEN: usize = 16;

pub(crate) fn random_suffix(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Generated recording id: `audio_<suffix>`
pub(crate) fn recording_id() -> EntityId {
    EntityId::Text(format!("audio_{}", random_suffix(ID_SUFFIX_LEN)))
}

/// Generated child document id: `<parentId>-<suffix>`
pub(crate) fn child_id(parent: &EntityId) -> EntityId {
    EntityId::Text(format!("{}-{}", parent, random_suffix(ID_SUFFIX_LEN)))
}

/// Generated standalone document id
pub(crate) fn document_id() -> EntityId {
    EntityId::Text(random_suffix(DOCUMENT_ID_LEN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_ids_carry_expected_shapes() {
        let rec = recording_id().to_string();
        assert!(rec.starts_with("audio_"));
        assert_eq!(rec.len(), "audio_".len() + ID_SUFFIX_LEN);

        let child = child_id(&"audio_ab12cd34".into()).to_string();
        assert!(child.starts_with("audio_ab12cd34-"));
    }

    #[test]
    fn suffixes_do_not_collide_in_bulk() {
        let ids: HashSet<String> = (0..10_000).map(|_| random_suffix(8)).collect();
        assert_eq!(ids.len(), 10_000);
    }
}
