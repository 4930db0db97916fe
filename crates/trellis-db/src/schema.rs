//! Idempotent schema bootstrap.
//!
//! Creates the four tables on startup if they do not exist. Link rows and
//! relationship edges are removed by the database itself when either
//! endpoint goes away (ON DELETE CASCADE).

use sqlx::PgPool;
use tracing::info;

use trellis_core::{Error, Result};

const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS notes (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at_utc TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at_utc TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tags (
        id UUID PRIMARY KEY,
        name TEXT UNIQUE NOT NULL,
        created_at_utc TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS note_tags (
        note_id UUID NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
        tag_id UUID NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        PRIMARY KEY (note_id, tag_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS tag_relationships (
        tag1_id UUID NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        tag2_id UUID NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
        similarity REAL NOT NULL,
        PRIMARY KEY (tag1_id, tag2_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_notes_updated_at ON notes (updated_at_utc DESC)",
    "CREATE INDEX IF NOT EXISTS idx_note_tags_tag ON note_tags (tag_id)",
];

/// Create any missing tables and indexes.
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    for statement in STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(Error::Database)?;
    }

    info!(
        subsystem = "database",
        component = "schema",
        op = "init",
        "Schema bootstrap complete"
    );
    Ok(())
}
