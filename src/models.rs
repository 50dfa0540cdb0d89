//! Entity models for the question/answer audio archive
//!
//! The archive hierarchy is Recording -> Segment -> QaPost, plus the
//! flattened GenericDocument shape used by the document backend. Every
//! repository and codec call carries an explicit [`EntityKind`]
//! discriminator; nothing in this crate infers a kind from record shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ArchiveError, Result};

// ============================================================================
// Discriminator
// ============================================================================

/// Entity kind, threaded explicitly through every repository and codec call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Recording,
    Segment,
    QaPost,
    Document,
}

impl EntityKind {
    /// Kinds that cannot exist without a parent reference
    pub fn requires_parent(self) -> bool {
        matches!(self, EntityKind::Segment | EntityKind::QaPost)
    }

    /// Kinds that carry a title and therefore support prefix search
    pub fn has_title(self) -> bool {
        matches!(self, EntityKind::Recording | EntityKind::Document)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Recording => write!(f, "recording"),
            EntityKind::Segment => write!(f, "segment"),
            EntityKind::QaPost => write!(f, "qa_post"),
            EntityKind::Document => write!(f, "document"),
        }
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recording" => Ok(EntityKind::Recording),
            "segment" => Ok(EntityKind::Segment),
            "qa_post" | "qapost" => Ok(EntityKind::QaPost),
            "document" => Ok(EntityKind::Document),
            _ => Err(format!("Unknown entity kind: {}", s)),
        }
    }
}

// ============================================================================
// Identifiers
// ============================================================================

/// Record identifier, immutable once assigned.
///
/// The document backend uses opaque strings (`audio_<suffix>`,
/// `<parentId>-<suffix>`); the relational backend lets Postgres assign
/// integer ids to segments and posts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Serial(i64),
    Text(String),
}

impl EntityId {
    pub fn as_serial(&self) -> Option<i64> {
        match self {
            EntityId::Serial(n) => Some(*n),
            EntityId::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            EntityId::Serial(_) => None,
            EntityId::Text(s) => Some(s.as_str()),
        }
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityId::Serial(n) => write!(f, "{}", n),
            EntityId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for EntityId {
    fn from(n: i64) -> Self {
        EntityId::Serial(n)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        EntityId::Text(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId::Text(s.to_owned())
    }
}

// ============================================================================
// Entities
// ============================================================================

/// A full audio item, parent of zero or more segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    pub id: Option<EntityId>,
    pub title: String,
    pub author: String,
    pub file_path: String,
    /// Duration in seconds
    pub duration: i64,
    pub upload_time: Option<DateTime<Utc>>,
    /// Asserted by the caller, not recomputed from segment state
    pub complete: bool,
}

impl Recording {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        file_path: impl Into<String>,
        duration: i64,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            author: author.into(),
            file_path: file_path.into(),
            duration,
            upload_time: None,
            complete: false,
        }
    }
}

/// A time-bounded unit of a recording, optionally transcribed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: Option<EntityId>,
    /// Owning recording; never absent once persisted
    pub full_audio_id: EntityId,
    pub start_time: i64,
    pub end_time: i64,
    pub transcription: String,
    pub processed: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Segment {
    /// Build a segment, enforcing `0 <= start_time < end_time`.
    pub fn new(
        full_audio_id: EntityId,
        start_time: i64,
        end_time: i64,
        transcription: impl Into<String>,
    ) -> Result<Self> {
        if start_time < 0 || start_time >= end_time {
            return Err(ArchiveError::invalid_input(format!(
                "segment range [{}, {}) must satisfy 0 <= start < end",
                start_time, end_time
            )));
        }
        Ok(Self {
            id: None,
            full_audio_id,
            start_time,
            end_time,
            transcription: transcription.into(),
            processed: false,
            created_at: None,
            updated_at: None,
        })
    }
}

/// A question/answer item attached to a segment. Relational backend only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaPost {
    pub id: Option<EntityId>,
    pub audio_segment_id: EntityId,
    pub question: String,
    pub answer: String,
    pub post_time: Option<DateTime<Utc>>,
}

impl QaPost {
    pub fn new(
        audio_segment_id: EntityId,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            audio_segment_id,
            question: question.into(),
            answer: answer.into(),
            post_time: None,
        }
    }
}

/// Flattened question/answer record used by the document backend.
///
/// Filed top-level or as a child of another document depending on the
/// parent reference passed alongside it, never on anything stored inside
/// the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericDocument {
    pub id: Option<EntityId>,
    /// Storage locator for the source audio
    pub audio: String,
    pub title: String,
    pub topic: String,
    pub author: String,
    pub question: String,
    pub answer: String,
    pub complete: bool,
}

// ============================================================================
// Tagged union
// ============================================================================

/// A strongly-typed entity payload, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Recording(Recording),
    Segment(Segment),
    QaPost(QaPost),
    Document(GenericDocument),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Recording(_) => EntityKind::Recording,
            Entity::Segment(_) => EntityKind::Segment,
            Entity::QaPost(_) => EntityKind::QaPost,
            Entity::Document(_) => EntityKind::Document,
        }
    }

    pub fn id(&self) -> Option<&EntityId> {
        match self {
            Entity::Recording(r) => r.id.as_ref(),
            Entity::Segment(s) => s.id.as_ref(),
            Entity::QaPost(q) => q.id.as_ref(),
            Entity::Document(d) => d.id.as_ref(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            Entity::Recording(r) => Some(r.title.as_str()),
            Entity::Document(d) => Some(d.title.as_str()),
            Entity::Segment(_) | Entity::QaPost(_) => None,
        }
    }

    pub(crate) fn set_id(&mut self, id: EntityId) {
        match self {
            Entity::Recording(r) => r.id = Some(id),
            Entity::Segment(s) => s.id = Some(id),
            Entity::QaPost(q) => q.id = Some(id),
            Entity::Document(d) => d.id = Some(id),
        }
    }

    /// Overwrite the child's back-reference with the authoritative parent
    /// passed to the repository call. No-op for kinds without one.
    pub(crate) fn set_parent(&mut self, parent: &EntityId) {
        match self {
            Entity::Segment(s) => s.full_audio_id = parent.clone(),
            Entity::QaPost(q) => q.audio_segment_id = parent.clone(),
            Entity::Recording(_) | Entity::Document(_) => {}
        }
    }

    /// Stamp creation-side timestamps
    pub(crate) fn stamp_created(&mut self, now: DateTime<Utc>) {
        match self {
            Entity::Recording(r) => r.upload_time = Some(now),
            Entity::Segment(s) => {
                s.created_at = Some(now);
                s.updated_at = Some(now);
            }
            Entity::QaPost(q) => q.post_time = Some(now),
            Entity::Document(_) => {}
        }
    }

    /// Stamp the update-side timestamp where the entity defines one
    pub(crate) fn stamp_updated(&mut self, now: DateTime<Utc>) {
        if let Entity::Segment(s) = self {
            s.updated_at = Some(now);
        }
    }

    pub fn into_recording(self) -> Result<Recording> {
        match self {
            Entity::Recording(r) => Ok(r),
            other => Err(payload_mismatch(EntityKind::Recording, other.kind())),
        }
    }

    pub fn into_segment(self) -> Result<Segment> {
        match self {
            Entity::Segment(s) => Ok(s),
            other => Err(payload_mismatch(EntityKind::Segment, other.kind())),
        }
    }

    pub fn into_qa_post(self) -> Result<QaPost> {
        match self {
            Entity::QaPost(q) => Ok(q),
            other => Err(payload_mismatch(EntityKind::QaPost, other.kind())),
        }
    }

    pub fn into_document(self) -> Result<GenericDocument> {
        match self {
            Entity::Document(d) => Ok(d),
            other => Err(payload_mismatch(EntityKind::Document, other.kind())),
        }
    }
}

fn payload_mismatch(expected: EntityKind, got: EntityKind) -> ArchiveError {
    ArchiveError::invalid_input(format!("expected {} payload, got {}", expected, got))
}

impl From<Recording> for Entity {
    fn from(r: Recording) -> Self {
        Entity::Recording(r)
    }
}

impl From<Segment> for Entity {
    fn from(s: Segment) -> Self {
        Entity::Segment(s)
    }
}

impl From<QaPost> for Entity {
    fn from(q: QaPost) -> Self {
        Entity::QaPost(q)
    }
}

impl From<GenericDocument> for Entity {
    fn from(d: GenericDocument) -> Self {
        Entity::Document(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in [
            EntityKind::Recording,
            EntityKind::Segment,
            EntityKind::QaPost,
            EntityKind::Document,
        ] {
            assert_eq!(kind.to_string().parse::<EntityKind>().unwrap(), kind);
        }
        assert!("mixtape".parse::<EntityKind>().is_err());
    }

    #[test]
    fn entity_id_serde_is_untagged() {
        let serial: EntityId = serde_json::from_str("42").unwrap();
        assert_eq!(serial, EntityId::Serial(42));

        let text: EntityId = serde_json::from_str("\"audio_ab12cd34\"").unwrap();
        assert_eq!(text, EntityId::Text("audio_ab12cd34".to_owned()));

        assert_eq!(serde_json::to_string(&serial).unwrap(), "42");
        assert_eq!(
            serde_json::to_string(&text).unwrap(),
            "\"audio_ab12cd34\""
        );
    }

    #[test]
    fn segment_rejects_bad_range() {
        assert!(Segment::new("audio_x".into(), 10, 5, "").is_err());
        assert!(Segment::new("audio_x".into(), -1, 5, "").is_err());
        assert!(Segment::new("audio_x".into(), 5, 5, "").is_err());
        assert!(Segment::new("audio_x".into(), 0, 5, "").is_ok());
    }

    #[test]
    fn segment_json_uses_wire_names() {
        let mut seg = Segment::new("audio_x".into(), 0, 10, "bismillah").unwrap();
        seg.id = Some(EntityId::Serial(7));
        let json = serde_json::to_value(&seg).unwrap();
        assert_eq!(json["fullAudioId"], "audio_x");
        assert_eq!(json["startTime"], 0);
        assert_eq!(json["endTime"], 10);
        assert_eq!(json["processed"], false);
    }

    #[test]
    fn parent_stamping_only_touches_children() {
        let parent = EntityId::from("audio_p");
        let mut entity: Entity = Recording::new("t", "a", "/f", 1).into();
        entity.set_parent(&parent);
        assert_eq!(entity.clone().into_recording().unwrap().id, None);

        let mut seg: Entity = Segment::new("other".into(), 0, 1, "").unwrap().into();
        seg.set_parent(&parent);
        assert_eq!(seg.into_segment().unwrap().full_audio_id, parent);
    }
}
