//! End-to-end tests for relationship recomputation: store reads, the two
//! calculation paths, and insert-or-replace edge persistence.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{tag, InMemoryRelationshipRepository, InMemoryTagRepository};
use trellis_engine::{
    ExactPathConfig, FastPathConfig, RelationshipService, Tag,
};
use trellis_inference::mock::{MockEmbeddingBackend, MockJudge};

fn service(
    tags: Vec<Tag>,
    judge: MockJudge,
    embedder: MockEmbeddingBackend,
) -> (RelationshipService, InMemoryRelationshipRepository) {
    let tag_repo = InMemoryTagRepository::new(tags.clone());
    let edge_repo = InMemoryRelationshipRepository::new(&tags);
    let service = RelationshipService::with_configs(
        Arc::new(tag_repo),
        Arc::new(edge_repo.clone()),
        Arc::new(judge),
        Arc::new(embedder),
        ExactPathConfig::default().with_pair_delay(Duration::ZERO),
        FastPathConfig::default(),
    );
    (service, edge_repo)
}

fn clustered_embedder() -> MockEmbeddingBackend {
    MockEmbeddingBackend::new()
        .with_dimension(3)
        .with_vector("cooking", vec![1.0, 0.0, 0.0])
        .with_vector("baking", vec![0.9, 0.1, 0.0])
        .with_vector("finance", vec![0.0, 0.0, 1.0])
}

#[tokio::test]
async fn exact_path_stores_judged_edges() {
    let tags = vec![tag("cooking"), tag("baking"), tag("finance")];
    let judge = MockJudge::new()
        .with_score("cooking", "baking", 0.8)
        .with_score("cooking", "finance", 0.05)
        .with_score("baking", "finance", 0.05);
    let (service, edges) = service(tags, judge, MockEmbeddingBackend::new());

    let summary = service.recompute_exact().await.unwrap();

    assert_eq!(summary.count, 1);
    assert_eq!(edges.edge_count(), 1);
    let stored: Vec<f32> = edges.stored().values().copied().collect();
    assert!((stored[0] - 0.8).abs() < 1e-6);
}

#[tokio::test]
async fn fast_path_stores_neighbor_edges() {
    let tags = vec![tag("cooking"), tag("baking"), tag("finance")];
    let (service, edges) = service(tags, MockJudge::new(), clustered_embedder());

    let summary = service.recompute_fast().await.unwrap();

    assert_eq!(summary.count, 1);
    assert_eq!(edges.edge_count(), 1);
    assert!(summary.edges[0].similarity > 0.3);
}

#[tokio::test]
async fn both_paths_write_to_the_same_store() {
    let tags = vec![tag("cooking"), tag("baking"), tag("finance")];
    let judge = MockJudge::new().with_score("cooking", "finance", 0.4);
    let (service, edges) = service(tags, judge, clustered_embedder());

    service.recompute_exact().await.unwrap();
    service.recompute_fast().await.unwrap();

    // Exact found cooking/finance, fast found cooking/baking.
    assert_eq!(edges.edge_count(), 2);
}

#[tokio::test]
async fn recomputation_replaces_edges_per_pair() {
    let tags = vec![tag("a"), tag("b")];

    let tag_repo = InMemoryTagRepository::new(tags.clone());
    let edge_repo = InMemoryRelationshipRepository::new(&tags);

    let first = RelationshipService::with_configs(
        Arc::new(tag_repo.clone()),
        Arc::new(edge_repo.clone()),
        Arc::new(MockJudge::new().with_score("a", "b", 0.9)),
        Arc::new(MockEmbeddingBackend::new()),
        ExactPathConfig::default().with_pair_delay(Duration::ZERO),
        FastPathConfig::default(),
    );
    first.recompute_exact().await.unwrap();

    let second = RelationshipService::with_configs(
        Arc::new(tag_repo),
        Arc::new(edge_repo.clone()),
        Arc::new(MockJudge::new().with_score("a", "b", 0.5)),
        Arc::new(MockEmbeddingBackend::new()),
        ExactPathConfig::default().with_pair_delay(Duration::ZERO),
        FastPathConfig::default(),
    );
    second.recompute_exact().await.unwrap();

    // Still one edge for the pair, now carrying the newer similarity.
    assert_eq!(edge_repo.edge_count(), 1);
    let stored: Vec<f32> = edge_repo.stored().values().copied().collect();
    assert!((stored[0] - 0.5).abs() < 1e-6);
}

#[tokio::test]
async fn fast_path_recomputation_is_idempotent() {
    let tags = vec![tag("cooking"), tag("baking"), tag("finance")];
    let (service, edges) = service(tags, MockJudge::new(), clustered_embedder());

    service.recompute_fast().await.unwrap();
    let first = edges.stored();
    service.recompute_fast().await.unwrap();
    let second = edges.stored();

    assert_eq!(first, second);
}

#[tokio::test]
async fn empty_tag_set_stores_nothing_and_calls_no_provider() {
    let judge = MockJudge::new();
    let embedder = MockEmbeddingBackend::new();
    let (service, edges) = service(vec![], judge.clone(), embedder.clone());

    assert_eq!(service.recompute_exact().await.unwrap().count, 0);
    assert_eq!(service.recompute_fast().await.unwrap().count, 0);
    assert_eq!(edges.edge_count(), 0);
    assert_eq!(judge.call_count(), 0);
    assert_eq!(embedder.batch_count(), 0);
}

#[tokio::test]
async fn singleton_tag_set_stores_nothing_and_calls_no_provider() {
    let judge = MockJudge::new();
    let embedder = MockEmbeddingBackend::new();
    let (service, edges) = service(vec![tag("solo")], judge.clone(), embedder.clone());

    assert_eq!(service.recompute_exact().await.unwrap().count, 0);
    assert_eq!(service.recompute_fast().await.unwrap().count, 0);
    assert_eq!(edges.edge_count(), 0);
    assert_eq!(judge.call_count(), 0);
    assert_eq!(embedder.batch_count(), 0);
}

#[tokio::test]
async fn tag_list_read_failure_is_fatal() {
    let edge_repo = InMemoryRelationshipRepository::new(&[]);
    let service = RelationshipService::with_configs(
        Arc::new(InMemoryTagRepository::failing()),
        Arc::new(edge_repo),
        Arc::new(MockJudge::new()),
        Arc::new(MockEmbeddingBackend::new()),
        ExactPathConfig::default().with_pair_delay(Duration::ZERO),
        FastPathConfig::default(),
    );

    assert!(service.recompute_exact().await.is_err());
    assert!(service.recompute_fast().await.is_err());
}

#[tokio::test]
async fn stored_edges_are_listed_above_floor_strongest_first() {
    let tags = vec![tag("a"), tag("b"), tag("c")];
    let judge = MockJudge::new()
        .with_score("a", "b", 0.9)
        .with_score("a", "c", 0.5)
        .with_score("b", "c", 0.2);
    let (service, edges) = service(tags, judge, MockEmbeddingBackend::new());

    service.recompute_exact().await.unwrap();

    use trellis_engine::RelationshipRepository;
    let listed = edges.list(0.3).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!((listed[0].similarity - 0.9).abs() < 1e-6);
    assert!((listed[1].similarity - 0.5).abs() < 1e-6);
}
