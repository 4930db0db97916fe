//! Note repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use trellis_core::{Error, NoteRepository, NoteWithTags, Result};

/// PostgreSQL implementation of NoteRepository.
pub struct PgNoteRepository {
    pool: PgPool,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_note(row: sqlx::postgres::PgRow) -> NoteWithTags {
    NoteWithTags {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        created_at_utc: row.get("created_at_utc"),
        updated_at_utc: row.get("updated_at_utc"),
        tags: row.get("tags"),
    }
}

/// Shared select list: notes joined with their tag names aggregated into a
/// text array (empty array when untagged).
const NOTE_WITH_TAGS_SELECT: &str = r#"
    SELECT
        n.id,
        n.title,
        n.content,
        n.created_at_utc,
        n.updated_at_utc,
        COALESCE(
            array_agg(t.name ORDER BY t.name) FILTER (WHERE t.name IS NOT NULL),
            '{}'
        ) AS tags
    FROM notes n
    LEFT JOIN note_tags nt ON n.id = nt.note_id
    LEFT JOIN tags t ON nt.tag_id = t.id
"#;

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, title: &str, content: &str) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO notes (id, title, content, created_at_utc, updated_at_utc)
             VALUES ($1, $2, $3, $4, $4)",
        )
        .bind(id)
        .bind(title)
        .bind(content)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn list_with_tags(&self) -> Result<Vec<NoteWithTags>> {
        let query = format!(
            "{} GROUP BY n.id ORDER BY n.updated_at_utc DESC",
            NOTE_WITH_TAGS_SELECT
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.into_iter().map(row_to_note).collect())
    }

    async fn find_by_tag(&self, tag_name: &str) -> Result<Vec<NoteWithTags>> {
        let query = format!(
            "{} WHERE n.id IN (
                 SELECT nt2.note_id
                 FROM note_tags nt2
                 JOIN tags t2 ON nt2.tag_id = t2.id
                 WHERE t2.name = $1
             )
             GROUP BY n.id
             ORDER BY n.updated_at_utc DESC",
            NOTE_WITH_TAGS_SELECT
        );
        let rows = sqlx::query(&query)
            .bind(tag_name)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.into_iter().map(row_to_note).collect())
    }
}
