//! Relationship edge repository implementation.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use trellis_core::{
    Error, RelationshipEdge, RelationshipRepository, Result, TagRelationship,
};

/// PostgreSQL implementation of RelationshipRepository.
///
/// The primary key on (tag1_id, tag2_id) plus canonical edge ordering
/// guarantees at most one stored row per unordered pair.
pub struct PgRelationshipRepository {
    pool: PgPool,
}

impl PgRelationshipRepository {
    /// Create a new PgRelationshipRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RelationshipRepository for PgRelationshipRepository {
    async fn upsert(&self, edge: &RelationshipEdge) -> Result<()> {
        sqlx::query(
            "INSERT INTO tag_relationships (tag1_id, tag2_id, similarity)
             VALUES ($1, $2, $3)
             ON CONFLICT (tag1_id, tag2_id) DO UPDATE SET similarity = EXCLUDED.similarity",
        )
        .bind(edge.tag1_id)
        .bind(edge.tag2_id)
        .bind(edge.similarity)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    }

    async fn list(&self, min_similarity: f32) -> Result<Vec<TagRelationship>> {
        let rows = sqlx::query(
            "SELECT t1.name AS tag1, t2.name AS tag2, tr.similarity
             FROM tag_relationships tr
             JOIN tags t1 ON tr.tag1_id = t1.id
             JOIN tags t2 ON tr.tag2_id = t2.id
             WHERE tr.similarity > $1
             ORDER BY tr.similarity DESC",
        )
        .bind(min_similarity)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| TagRelationship {
                tag1: row.get("tag1"),
                tag2: row.get("tag2"),
                similarity: row.get("similarity"),
            })
            .collect())
    }
}
