//! # trellis-db
//!
//! PostgreSQL database layer for trellis.
//!
//! This crate provides:
//! - Connection pool management
//! - Idempotent schema bootstrap
//! - Repository implementations for notes, tags, and relationship edges
//!
//! The store is a narrow collaborator: the similarity engine only reads tag
//! and note snapshots and writes relationship edges through the traits
//! defined in trellis-core.
//!
//! ## Example
//!
//! ```rust,ignore
//! use trellis_db::Database;
//! use trellis_core::NoteRepository;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/trellis").await?;
//!     db.init_schema().await?;
//!
//!     let note_id = db.notes.insert("Title", "Body text").await?;
//!     println!("Created note: {}", note_id);
//!     Ok(())
//! }
//! ```

pub mod notes;
pub mod pool;
pub mod relationships;
pub mod schema;
pub mod tags;

// Re-export core types
pub use trellis_core::*;

pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use relationships::PgRelationshipRepository;
pub use tags::{validate_tag_name, PgTagRepository};

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Note repository.
    pub notes: PgNoteRepository,
    /// Tag repository.
    pub tags: PgTagRepository,
    /// Relationship edge repository.
    pub relationships: PgRelationshipRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            relationships: PgRelationshipRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Create any missing tables and indexes.
    pub async fn init_schema(&self) -> Result<()> {
        schema::init_schema(&self.pool).await
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
