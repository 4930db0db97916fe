//! In-memory repository fakes shared by the engine integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use trellis_core::{
    Error, RelationshipEdge, RelationshipRepository, Result, Tag, TagRelationship, TagRepository,
};

pub fn tag(name: &str) -> Tag {
    Tag {
        id: Uuid::new_v4(),
        name: name.to_string(),
        created_at_utc: Utc::now(),
    }
}

/// Tag store backed by a Vec, with optional read-failure injection.
#[derive(Clone)]
pub struct InMemoryTagRepository {
    tags: Arc<Mutex<Vec<Tag>>>,
    fail_reads: bool,
}

impl InMemoryTagRepository {
    pub fn new(tags: Vec<Tag>) -> Self {
        Self {
            tags: Arc::new(Mutex::new(tags)),
            fail_reads: false,
        }
    }

    /// A store whose `list` always fails, for aggregate-failure tests.
    pub fn failing() -> Self {
        Self {
            tags: Arc::new(Mutex::new(Vec::new())),
            fail_reads: true,
        }
    }
}

#[async_trait]
impl TagRepository for InMemoryTagRepository {
    async fn ensure(&self, name: &str) -> Result<Tag> {
        let mut tags = self.tags.lock().unwrap();
        if let Some(existing) = tags.iter().find(|t| t.name == name) {
            return Ok(existing.clone());
        }
        let created = tag(name);
        tags.push(created.clone());
        Ok(created)
    }

    async fn list(&self) -> Result<Vec<Tag>> {
        if self.fail_reads {
            return Err(Error::Internal("simulated store read failure".to_string()));
        }
        Ok(self.tags.lock().unwrap().clone())
    }

    async fn add_to_note(&self, _note_id: Uuid, tag_name: &str) -> Result<()> {
        self.ensure(tag_name).await?;
        Ok(())
    }

    async fn get_for_note(&self, _note_id: Uuid) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Edge store keyed by the canonical pair, mirroring the database's
/// insert-or-replace semantics.
#[derive(Clone)]
pub struct InMemoryRelationshipRepository {
    edges: Arc<Mutex<HashMap<(Uuid, Uuid), f32>>>,
    tag_names: Arc<Mutex<HashMap<Uuid, String>>>,
}

impl InMemoryRelationshipRepository {
    pub fn new(tags: &[Tag]) -> Self {
        Self {
            edges: Arc::new(Mutex::new(HashMap::new())),
            tag_names: Arc::new(Mutex::new(
                tags.iter().map(|t| (t.id, t.name.clone())).collect(),
            )),
        }
    }

    pub fn edge_count(&self) -> usize {
        self.edges.lock().unwrap().len()
    }

    pub fn stored(&self) -> HashMap<(Uuid, Uuid), f32> {
        self.edges.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelationshipRepository for InMemoryRelationshipRepository {
    async fn upsert(&self, edge: &RelationshipEdge) -> Result<()> {
        self.edges
            .lock()
            .unwrap()
            .insert((edge.tag1_id, edge.tag2_id), edge.similarity);
        Ok(())
    }

    async fn list(&self, min_similarity: f32) -> Result<Vec<TagRelationship>> {
        let names = self.tag_names.lock().unwrap();
        let mut rows: Vec<TagRelationship> = self
            .edges
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, similarity)| **similarity > min_similarity)
            .map(|((tag1_id, tag2_id), similarity)| TagRelationship {
                tag1: names.get(tag1_id).cloned().unwrap_or_default(),
                tag2: names.get(tag2_id).cloned().unwrap_or_default(),
                similarity: *similarity,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(rows)
    }
}
