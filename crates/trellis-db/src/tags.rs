//! Tag repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use trellis_core::{Error, Result, Tag, TagRepository};

/// Validate a tag name.
///
/// Rules:
/// - Not empty and not all whitespace
/// - At most 100 characters
///
/// Tag names come from an LLM and may contain spaces, so only length and
/// emptiness are enforced.
pub fn validate_tag_name(tag: &str) -> std::result::Result<(), String> {
    if tag.trim().is_empty() {
        return Err("Tag name cannot be empty".to_string());
    }
    if tag.len() > 100 {
        return Err("Tag name must be 100 characters or less".to_string());
    }
    Ok(())
}

/// PostgreSQL implementation of TagRepository.
pub struct PgTagRepository {
    pool: PgPool,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_tag(row: sqlx::postgres::PgRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
        created_at_utc: row.get("created_at_utc"),
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn ensure(&self, name: &str) -> Result<Tag> {
        validate_tag_name(name).map_err(Error::InvalidInput)?;

        let now = Utc::now();

        // Insert-if-missing, then read back whichever row won the name.
        sqlx::query(
            "INSERT INTO tags (id, name, created_at_utc) VALUES ($1, $2, $3)
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        let row = sqlx::query("SELECT id, name, created_at_utc FROM tags WHERE name = $1")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row_to_tag(row))
    }

    async fn list(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query("SELECT id, name, created_at_utc FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.into_iter().map(row_to_tag).collect())
    }

    async fn add_to_note(&self, note_id: Uuid, tag_name: &str) -> Result<()> {
        let tag = self.ensure(tag_name).await?;

        sqlx::query(
            "INSERT INTO note_tags (note_id, tag_id) VALUES ($1, $2)
             ON CONFLICT (note_id, tag_id) DO NOTHING",
        )
        .bind(note_id)
        .bind(tag.id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    }

    async fn get_for_note(&self, note_id: Uuid) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT t.name
             FROM note_tags nt
             JOIN tags t ON nt.tag_id = t.id
             WHERE nt.note_id = $1
             ORDER BY t.name",
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(|row| row.get("name")).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_plain_names() {
        assert!(validate_tag_name("cooking").is_ok());
        assert!(validate_tag_name("machine learning").is_ok());
        assert!(validate_tag_name("c++").is_ok());
    }

    #[test]
    fn test_validate_rejects_empty() {
        assert!(validate_tag_name("").is_err());
        assert!(validate_tag_name("   ").is_err());
    }

    #[test]
    fn test_validate_rejects_overlong() {
        let long = "a".repeat(101);
        assert!(validate_tag_name(&long).is_err());
        let max = "a".repeat(100);
        assert!(validate_tag_name(&max).is_ok());
    }
}
