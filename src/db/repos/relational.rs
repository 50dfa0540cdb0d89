//! Relational store backend
//!
//! Three foreign-key-linked tables behind a pooled Postgres connection:
//! `full_audios`, `audio_segments`, `qa_posts`. Hierarchy integrity is the
//! database's job: children reference parents with `ON DELETE CASCADE`
//! foreign keys, and a missing parent surfaces as the FK violation rather
//! than a check-then-insert race.
//!
//! Policy decisions relative to the document backend:
//! - `update` requires the record to exist (`NotFound` on zero rows)
//! - `GenericDocument` is not stored here; its content maps onto the
//!   recording/segment/post rows instead

use async_trait::async_trait;
use futures::stream::StreamExt;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::config::ArchiveConfig;
use crate::db::pool::ConnectionManager;
use crate::db::search::prefix_range;
use crate::error::{ArchiveError, Result};
use crate::models::{Entity, EntityId, EntityKind, QaPost, Recording, Segment};

use super::{recording_id, ArchiveRepo, EntityStream};

const BACKEND_NAME: &str = "relational";

/// Schema statements, executed one by one and idempotent
const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS full_audios (
        id          TEXT PRIMARY KEY,
        title       TEXT NOT NULL,
        author      TEXT NOT NULL,
        file_path   TEXT NOT NULL,
        duration    BIGINT NOT NULL DEFAULT 0,
        upload_time TIMESTAMPTZ NOT NULL DEFAULT now(),
        complete    BOOLEAN NOT NULL DEFAULT FALSE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS audio_segments (
        id            BIGSERIAL PRIMARY KEY,
        full_audio_id TEXT NOT NULL REFERENCES full_audios(id) ON DELETE CASCADE,
        start_time    BIGINT NOT NULL,
        end_time      BIGINT NOT NULL,
        transcription TEXT NOT NULL DEFAULT '',
        processed     BOOLEAN NOT NULL DEFAULT FALSE,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at    TIMESTAMPTZ NOT NULL DEFAULT now(),
        CHECK (start_time >= 0 AND start_time < end_time)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS qa_posts (
        id               BIGSERIAL PRIMARY KEY,
        audio_segment_id BIGINT NOT NULL REFERENCES audio_segments(id) ON DELETE CASCADE,
        question         TEXT NOT NULL DEFAULT '',
        answer           TEXT NOT NULL DEFAULT '',
        post_time        TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    // Byte-order collation keeps the index aligned with the half-open
    // prefix range scan
    r#"
    CREATE INDEX IF NOT EXISTS idx_full_audios_title
        ON full_audios ((lower(title) COLLATE "C"))
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_audio_segments_parent
        ON audio_segments (full_audio_id)
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_qa_posts_parent
        ON qa_posts (audio_segment_id)
    "#,
];

/// Repository over the pooled Postgres connection
pub struct RelationalStore {
    manager: ConnectionManager<PgPool>,
}

impl RelationalStore {
    /// Connect using configuration and bring the schema up to date
    pub async fn connect(config: &ArchiveConfig) -> Result<Self> {
        let store = Self {
            manager: ConnectionManager::postgres(config)?,
        };
        run_migrations(store.pool().await?).await?;
        Ok(store)
    }

    /// Wrap an externally-constructed manager (for tests and embedding).
    /// The caller is responsible for running migrations.
    pub fn with_manager(manager: ConnectionManager<PgPool>) -> Self {
        Self { manager }
    }

    async fn pool(&self) -> Result<&PgPool> {
        self.manager.acquire().await
    }
}

/// Create tables and indexes if they do not exist
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    for statement in MIGRATIONS {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("relational schema migrated");
    Ok(())
}

/// Map a driver error onto the archive taxonomy where the SQLSTATE is
/// unambiguous: FK violation means the parent is gone, unique violation
/// means the explicit id is taken, check violation means bad caller data.
fn classify(
    err: sqlx::Error,
    kind: EntityKind,
    parent: Option<&EntityId>,
    id: Option<&EntityId>,
) -> ArchiveError {
    if let sqlx::Error::Database(db) = &err {
        match db.code().as_deref() {
            Some("23503") => return ArchiveError::missing_parent(kind, parent),
            Some("23505") => {
                if let Some(id) = id {
                    return ArchiveError::conflict(kind, id);
                }
            }
            Some("23514") => {
                return ArchiveError::invalid_input(format!(
                    "constraint violated: {}",
                    db.message()
                ))
            }
            _ => {}
        }
    }
    err.into()
}

fn serial(kind: EntityKind, id: &EntityId) -> Result<i64> {
    id.as_serial().ok_or_else(|| {
        ArchiveError::invalid_input(format!("{} id must be numeric, got '{}'", kind, id))
    })
}

fn text_id(kind: EntityKind, id: &EntityId) -> Result<&str> {
    id.as_text().ok_or_else(|| {
        ArchiveError::invalid_input(format!("{} id must be a string, got '{}'", kind, id))
    })
}

fn no_parent(kind: EntityKind, parent: Option<&EntityId>) -> Result<()> {
    if parent.is_some() {
        return Err(ArchiveError::invalid_input(format!(
            "{} takes no parent reference",
            kind
        )));
    }
    Ok(())
}

fn recording_from_row(row: &PgRow) -> Result<Recording> {
    Ok(Recording {
        id: Some(EntityId::Text(row.try_get("id")?)),
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        file_path: row.try_get("file_path")?,
        duration: row.try_get("duration")?,
        upload_time: Some(row.try_get("upload_time")?),
        complete: row.try_get("complete")?,
    })
}

fn segment_from_row(row: &PgRow) -> Result<Segment> {
    Ok(Segment {
        id: Some(EntityId::Serial(row.try_get("id")?)),
        full_audio_id: EntityId::Text(row.try_get("full_audio_id")?),
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        transcription: row.try_get("transcription")?,
        processed: row.try_get("processed")?,
        created_at: Some(row.try_get("created_at")?),
        updated_at: Some(row.try_get("updated_at")?),
    })
}

fn qa_from_row(row: &PgRow) -> Result<QaPost> {
    Ok(QaPost {
        id: Some(EntityId::Serial(row.try_get("id")?)),
        audio_segment_id: EntityId::Serial(row.try_get("audio_segment_id")?),
        question: row.try_get("question")?,
        answer: row.try_get("answer")?,
        post_time: Some(row.try_get("post_time")?),
    })
}

#[async_trait]
impl ArchiveRepo for RelationalStore {
    async fn create(
        &self,
        kind: EntityKind,
        parent: Option<&EntityId>,
        supplied_id: Option<EntityId>,
        entity: Entity,
    ) -> Result<EntityId> {
        let pool = self.pool().await?;

        match kind {
            EntityKind::Recording => {
                no_parent(kind, parent)?;
                let rec = entity.into_recording()?;
                let id = supplied_id.unwrap_or_else(recording_id);
                let result = sqlx::query(
                    r#"
                    INSERT INTO full_audios (id, title, author, file_path, duration, complete)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ON CONFLICT (id) DO NOTHING
                    "#,
                )
                .bind(text_id(kind, &id)?)
                .bind(&rec.title)
                .bind(&rec.author)
                .bind(&rec.file_path)
                .bind(rec.duration)
                .bind(rec.complete)
                .execute(pool)
                .await
                .map_err(|e| classify(e, kind, parent, Some(&id)))?;

                if result.rows_affected() == 0 {
                    return Err(ArchiveError::conflict(kind, &id));
                }
                tracing::debug!(%kind, %id, "record created");
                Ok(id)
            }

            EntityKind::Segment => {
                let parent_id = parent.ok_or_else(|| ArchiveError::missing_parent(kind, None))?;
                let seg = entity.into_segment()?;

                match supplied_id {
                    Some(id) => {
                        let result = sqlx::query(
                            r#"
                            INSERT INTO audio_segments
                                (id, full_audio_id, start_time, end_time, transcription, processed)
                            VALUES ($1, $2, $3, $4, $5, $6)
                            ON CONFLICT (id) DO NOTHING
                            "#,
                        )
                        .bind(serial(kind, &id)?)
                        .bind(parent_id.to_string())
                        .bind(seg.start_time)
                        .bind(seg.end_time)
                        .bind(&seg.transcription)
                        .bind(seg.processed)
                        .execute(pool)
                        .await
                        .map_err(|e| classify(e, kind, parent, Some(&id)))?;

                        if result.rows_affected() == 0 {
                            return Err(ArchiveError::conflict(kind, &id));
                        }
                        Ok(id)
                    }
                    None => {
                        let row = sqlx::query(
                            r#"
                            INSERT INTO audio_segments
                                (full_audio_id, start_time, end_time, transcription, processed)
                            VALUES ($1, $2, $3, $4, $5)
                            RETURNING id
                            "#,
                        )
                        .bind(parent_id.to_string())
                        .bind(seg.start_time)
                        .bind(seg.end_time)
                        .bind(&seg.transcription)
                        .bind(seg.processed)
                        .fetch_one(pool)
                        .await
                        .map_err(|e| classify(e, kind, parent, None))?;

                        let id = EntityId::Serial(row.try_get("id")?);
                        tracing::debug!(%kind, %id, parent = %parent_id, "record created");
                        Ok(id)
                    }
                }
            }

            EntityKind::QaPost => {
                let parent_id = parent.ok_or_else(|| ArchiveError::missing_parent(kind, None))?;
                let post = entity.into_qa_post()?;

                match supplied_id {
                    Some(id) => {
                        let result = sqlx::query(
                            r#"
                            INSERT INTO qa_posts (id, audio_segment_id, question, answer)
                            VALUES ($1, $2, $3, $4)
                            ON CONFLICT (id) DO NOTHING
                            "#,
                        )
                        .bind(serial(kind, &id)?)
                        .bind(serial(kind, parent_id)?)
                        .bind(&post.question)
                        .bind(&post.answer)
                        .execute(pool)
                        .await
                        .map_err(|e| classify(e, kind, parent, Some(&id)))?;

                        if result.rows_affected() == 0 {
                            return Err(ArchiveError::conflict(kind, &id));
                        }
                        Ok(id)
                    }
                    None => {
                        let row = sqlx::query(
                            r#"
                            INSERT INTO qa_posts (audio_segment_id, question, answer)
                            VALUES ($1, $2, $3)
                            RETURNING id
                            "#,
                        )
                        .bind(serial(kind, parent_id)?)
                        .bind(&post.question)
                        .bind(&post.answer)
                        .fetch_one(pool)
                        .await
                        .map_err(|e| classify(e, kind, parent, None))?;

                        Ok(EntityId::Serial(row.try_get("id")?))
                    }
                }
            }

            EntityKind::Document => Err(ArchiveError::unsupported(kind, BACKEND_NAME)),
        }
    }

    async fn get(
        &self,
        kind: EntityKind,
        parent: Option<&EntityId>,
        id: &EntityId,
    ) -> Result<Entity> {
        let pool = self.pool().await?;

        match kind {
            EntityKind::Recording => {
                no_parent(kind, parent)?;
                let row = sqlx::query(
                    r#"
                    SELECT id, title, author, file_path, duration, upload_time, complete
                    FROM full_audios
                    WHERE id = $1
                    "#,
                )
                .bind(text_id(kind, id)?)
                .fetch_optional(pool)
                .await?
                .ok_or_else(|| ArchiveError::not_found(kind, id))?;

                Ok(Entity::Recording(recording_from_row(&row)?))
            }

            EntityKind::Segment => {
                let query = match parent {
                    Some(p) => sqlx::query(
                        r#"
                        SELECT id, full_audio_id, start_time, end_time,
                               transcription, processed, created_at, updated_at
                        FROM audio_segments
                        WHERE id = $1 AND full_audio_id = $2
                        "#,
                    )
                    .bind(serial(kind, id)?)
                    .bind(p.to_string()),
                    None => sqlx::query(
                        r#"
                        SELECT id, full_audio_id, start_time, end_time,
                               transcription, processed, created_at, updated_at
                        FROM audio_segments
                        WHERE id = $1
                        "#,
                    )
                    .bind(serial(kind, id)?),
                };

                let row = query
                    .fetch_optional(pool)
                    .await?
                    .ok_or_else(|| ArchiveError::not_found(kind, id))?;
                Ok(Entity::Segment(segment_from_row(&row)?))
            }

            EntityKind::QaPost => {
                let query = match parent {
                    Some(p) => sqlx::query(
                        r#"
                        SELECT id, audio_segment_id, question, answer, post_time
                        FROM qa_posts
                        WHERE id = $1 AND audio_segment_id = $2
                        "#,
                    )
                    .bind(serial(kind, id)?)
                    .bind(serial(kind, p)?),
                    None => sqlx::query(
                        r#"
                        SELECT id, audio_segment_id, question, answer, post_time
                        FROM qa_posts
                        WHERE id = $1
                        "#,
                    )
                    .bind(serial(kind, id)?),
                };

                let row = query
                    .fetch_optional(pool)
                    .await?
                    .ok_or_else(|| ArchiveError::not_found(kind, id))?;
                Ok(Entity::QaPost(qa_from_row(&row)?))
            }

            EntityKind::Document => Err(ArchiveError::unsupported(kind, BACKEND_NAME)),
        }
    }

    async fn update(
        &self,
        kind: EntityKind,
        parent: Option<&EntityId>,
        id: &EntityId,
        entity: Entity,
    ) -> Result<()> {
        let pool = self.pool().await?;

        let result = match kind {
            EntityKind::Recording => {
                no_parent(kind, parent)?;
                let rec = entity.into_recording()?;
                sqlx::query(
                    r#"
                    UPDATE full_audios
                    SET title = $2, author = $3, file_path = $4, duration = $5, complete = $6
                    WHERE id = $1
                    "#,
                )
                .bind(text_id(kind, id)?)
                .bind(&rec.title)
                .bind(&rec.author)
                .bind(&rec.file_path)
                .bind(rec.duration)
                .bind(rec.complete)
                .execute(pool)
                .await
                .map_err(|e| classify(e, kind, parent, Some(id)))?
            }

            EntityKind::Segment => {
                let seg = entity.into_segment()?;
                let query = match parent {
                    Some(p) => sqlx::query(
                        r#"
                        UPDATE audio_segments
                        SET start_time = $2, end_time = $3, transcription = $4,
                            processed = $5, updated_at = now()
                        WHERE id = $1 AND full_audio_id = $6
                        "#,
                    )
                    .bind(serial(kind, id)?)
                    .bind(seg.start_time)
                    .bind(seg.end_time)
                    .bind(&seg.transcription)
                    .bind(seg.processed)
                    .bind(p.to_string()),
                    None => sqlx::query(
                        r#"
                        UPDATE audio_segments
                        SET start_time = $2, end_time = $3, transcription = $4,
                            processed = $5, updated_at = now()
                        WHERE id = $1
                        "#,
                    )
                    .bind(serial(kind, id)?)
                    .bind(seg.start_time)
                    .bind(seg.end_time)
                    .bind(&seg.transcription)
                    .bind(seg.processed),
                };
                query
                    .execute(pool)
                    .await
                    .map_err(|e| classify(e, kind, parent, Some(id)))?
            }

            EntityKind::QaPost => {
                let post = entity.into_qa_post()?;
                let query = match parent {
                    Some(p) => sqlx::query(
                        r#"
                        UPDATE qa_posts
                        SET question = $2, answer = $3
                        WHERE id = $1 AND audio_segment_id = $4
                        "#,
                    )
                    .bind(serial(kind, id)?)
                    .bind(&post.question)
                    .bind(&post.answer)
                    .bind(serial(kind, p)?),
                    None => sqlx::query(
                        r#"
                        UPDATE qa_posts
                        SET question = $2, answer = $3
                        WHERE id = $1
                        "#,
                    )
                    .bind(serial(kind, id)?)
                    .bind(&post.question)
                    .bind(&post.answer),
                };
                query
                    .execute(pool)
                    .await
                    .map_err(|e| classify(e, kind, parent, Some(id)))?
            }

            EntityKind::Document => return Err(ArchiveError::unsupported(kind, BACKEND_NAME)),
        };

        // Strict CRUD here: a merge onto nothing is an error
        if result.rows_affected() == 0 {
            return Err(ArchiveError::not_found(kind, id));
        }
        Ok(())
    }

    async fn delete(
        &self,
        kind: EntityKind,
        parent: Option<&EntityId>,
        id: &EntityId,
    ) -> Result<()> {
        let pool = self.pool().await?;

        // Idempotent by contract; cascades handle the children
        let result = match kind {
            EntityKind::Recording => {
                no_parent(kind, parent)?;
                sqlx::query("DELETE FROM full_audios WHERE id = $1")
                    .bind(text_id(kind, id)?)
                    .execute(pool)
                    .await?
            }
            EntityKind::Segment => {
                let query = match parent {
                    Some(p) => sqlx::query(
                        "DELETE FROM audio_segments WHERE id = $1 AND full_audio_id = $2",
                    )
                    .bind(serial(kind, id)?)
                    .bind(p.to_string()),
                    None => sqlx::query("DELETE FROM audio_segments WHERE id = $1")
                        .bind(serial(kind, id)?),
                };
                query.execute(pool).await?
            }
            EntityKind::QaPost => {
                let query = match parent {
                    Some(p) => sqlx::query(
                        "DELETE FROM qa_posts WHERE id = $1 AND audio_segment_id = $2",
                    )
                    .bind(serial(kind, id)?)
                    .bind(serial(kind, p)?),
                    None => {
                        sqlx::query("DELETE FROM qa_posts WHERE id = $1").bind(serial(kind, id)?)
                    }
                };
                query.execute(pool).await?
            }
            EntityKind::Document => return Err(ArchiveError::unsupported(kind, BACKEND_NAME)),
        };

        tracing::debug!(%kind, %id, removed = result.rows_affected(), "record deleted");
        Ok(())
    }

    async fn list<'a>(
        &'a self,
        kind: EntityKind,
        parent: Option<&'a EntityId>,
    ) -> Result<EntityStream<'a>> {
        let pool = self.pool().await?;

        match kind {
            EntityKind::Recording => {
                no_parent(kind, parent)?;
                let stream = sqlx::query(
                    r#"
                    SELECT id, title, author, file_path, duration, upload_time, complete
                    FROM full_audios
                    ORDER BY id
                    "#,
                )
                .fetch(pool)
                .map(|res| {
                    res.map_err(ArchiveError::from)
                        .and_then(|row| recording_from_row(&row).map(Entity::Recording))
                });
                Ok(stream.boxed())
            }

            EntityKind::Segment => {
                let parent_id = parent.ok_or_else(|| ArchiveError::missing_parent(kind, None))?;
                let stream = sqlx::query(
                    r#"
                    SELECT id, full_audio_id, start_time, end_time,
                           transcription, processed, created_at, updated_at
                    FROM audio_segments
                    WHERE full_audio_id = $1
                    ORDER BY id
                    "#,
                )
                .bind(parent_id.to_string())
                .fetch(pool)
                .map(|res| {
                    res.map_err(ArchiveError::from)
                        .and_then(|row| segment_from_row(&row).map(Entity::Segment))
                });
                Ok(stream.boxed())
            }

            EntityKind::QaPost => {
                let parent_id = parent.ok_or_else(|| ArchiveError::missing_parent(kind, None))?;
                let stream = sqlx::query(
                    r#"
                    SELECT id, audio_segment_id, question, answer, post_time
                    FROM qa_posts
                    WHERE audio_segment_id = $1
                    ORDER BY id
                    "#,
                )
                .bind(serial(kind, parent_id)?)
                .fetch(pool)
                .map(|res| {
                    res.map_err(ArchiveError::from)
                        .and_then(|row| qa_from_row(&row).map(Entity::QaPost))
                });
                Ok(stream.boxed())
            }

            EntityKind::Document => Err(ArchiveError::unsupported(kind, BACKEND_NAME)),
        }
    }

    async fn search_by_title_prefix(
        &self,
        kind: EntityKind,
        parent: Option<&EntityId>,
        prefix: &str,
    ) -> Result<Vec<Entity>> {
        if kind != EntityKind::Recording {
            return Err(ArchiveError::unsupported(kind, BACKEND_NAME));
        }
        no_parent(kind, parent)?;

        let pool = self.pool().await?;
        let range = prefix_range(prefix);

        let rows = sqlx::query(
            r#"
            SELECT id, title, author, file_path, duration, upload_time, complete
            FROM full_audios
            WHERE lower(title) COLLATE "C" >= $1
              AND lower(title) COLLATE "C" < $2
            ORDER BY lower(title) COLLATE "C" ASC
            "#,
        )
        .bind(&range.lower)
        .bind(&range.upper)
        .fetch_all(pool)
        .await?;

        rows.iter()
            .map(|row| recording_from_row(row).map(Entity::Recording))
            .collect()
    }

    async fn close(&self) {
        self.manager.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendKind;
    use futures::TryStreamExt;

    // Integration tests require a real database.
    // Run with: DATABASE_URL=postgres://... cargo test -- --ignored

    async fn connect() -> RelationalStore {
        let config = ArchiveConfig {
            backend: BackendKind::Relational,
            database_url: Some(std::env::var("DATABASE_URL").expect("DATABASE_URL required")),
            document_path: None,
            max_connections: 2,
        };
        RelationalStore::connect(&config).await.expect("connect failed")
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn create_get_round_trip() {
        let store = connect().await;
        let rec = Recording::new("Integration Lecture", "tester", "/tmp/a.mp3", 120);
        let id = store
            .create(EntityKind::Recording, None, None, rec.clone().into())
            .await
            .unwrap();

        let fetched = store
            .get(EntityKind::Recording, None, &id)
            .await
            .unwrap()
            .into_recording()
            .unwrap();
        assert_eq!(fetched.title, rec.title);
        assert!(fetched.upload_time.is_some());

        store.delete(EntityKind::Recording, None, &id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn fk_violation_classifies_as_missing_parent() {
        let store = connect().await;
        let ghost = EntityId::from("audio_does_not_exist");
        let seg = Segment::new(ghost.clone(), 0, 10, "").unwrap();

        let err = store
            .create(EntityKind::Segment, Some(&ghost), None, seg.into())
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::MissingParent { .. }));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn delete_is_idempotent_and_cascades_to_children() {
        let store = connect().await;
        let parent = store
            .create(
                EntityKind::Recording,
                None,
                None,
                Recording::new("cascade test", "t", "/f", 1).into(),
            )
            .await
            .unwrap();
        let seg_id = store
            .create(
                EntityKind::Segment,
                Some(&parent),
                None,
                Segment::new(parent.clone(), 0, 10, "").unwrap().into(),
            )
            .await
            .unwrap();

        store.delete(EntityKind::Recording, None, &parent).await.unwrap();
        store.delete(EntityKind::Recording, None, &parent).await.unwrap();

        let err = store
            .get(EntityKind::Segment, Some(&parent), &seg_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::NotFound { .. }));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn update_requires_existing_record() {
        let store = connect().await;
        let err = store
            .update(
                EntityKind::Recording,
                None,
                &EntityId::from("audio_never_created"),
                Recording::new("x", "y", "/z", 1).into(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ArchiveError::NotFound { .. }));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn list_streams_children_in_id_order() {
        let store = connect().await;
        let parent = store
            .create(
                EntityKind::Recording,
                None,
                None,
                Recording::new("ordered", "t", "/f", 1).into(),
            )
            .await
            .unwrap();
        for i in 0..3i64 {
            store
                .create(
                    EntityKind::Segment,
                    Some(&parent),
                    None,
                    Segment::new(parent.clone(), i * 10, i * 10 + 5, "").unwrap().into(),
                )
                .await
                .unwrap();
        }

        let segments: Vec<Entity> = store
            .list(EntityKind::Segment, Some(&parent))
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(segments.len(), 3);

        store.delete(EntityKind::Recording, None, &parent).await.unwrap();
    }
}
