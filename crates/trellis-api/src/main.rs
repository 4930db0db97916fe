//! trellis-api - HTTP API server for trellis

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use utoipa::OpenApi;
use uuid::Uuid;

use trellis_core::{
    defaults, EmbeddingBackend, GenerationBackend, NoteRepository, NoteWithTags,
    RelationshipRepository, ScoredNote, Tag, TagRelationship, TagRepository,
};
use trellis_db::{Database, PgRelationshipRepository, PgTagRepository};
use trellis_engine::{RelationshipService, SemanticNoteSearch};
use trellis_inference::{LlmSimilarityJudge, OpenAiBackend, TagExtractor};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically — useful for
/// log correlation and debugging.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    db: Database,
    relationships: Arc<RelationshipService>,
    search: Arc<SemanticNoteSearch>,
    tagger: Arc<TagExtractor>,
}

/// OpenAPI documentation metadata.
#[allow(dead_code)]
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Trellis API",
        version = "0.4.0",
        description = "Notes with LLM auto-tagging, embedding-based tag relationships, and semantic search"
    ),
    tags(
        (name = "Notes", description = "Note creation and listing"),
        (name = "Tags", description = "Tags and tag relationship discovery"),
        (name = "Search", description = "Semantic note search"),
        (name = "System", description = "Health checks")
    )
)]
struct ApiDoc;

// =============================================================================
// REQUEST / RESPONSE TYPES
// =============================================================================

#[derive(Debug, Deserialize, utoipa::ToSchema)]
struct CreateNoteRequest {
    title: String,
    content: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
struct CreateNoteResponse {
    id: Uuid,
    title: String,
    content: String,
    tags: Vec<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
struct SearchNotesRequest {
    query: String,
}

#[derive(Debug, Deserialize)]
struct RelationshipsQuery {
    min_similarity: Option<f32>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
struct RecomputeResponse {
    message: String,
    count: usize,
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_notes(State(state): State<AppState>) -> Result<Json<Vec<NoteWithTags>>, ApiError> {
    let notes = state.db.notes.list_with_tags().await?;
    Ok(Json(notes))
}

async fn create_note(
    State(state): State<AppState>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Content is required".to_string()));
    }

    // Best-effort auto-tagging; a tagging failure yields an untagged note.
    let tags = state.tagger.extract_tags(&req.content).await;

    let note_id = state.db.notes.insert(&req.title, &req.content).await?;
    for tag_name in &tags {
        state.db.tags.add_to_note(note_id, tag_name).await?;
    }

    info!(note_id = %note_id, tag_count = tags.len(), "Note created");

    Ok((
        StatusCode::CREATED,
        Json(CreateNoteResponse {
            id: note_id,
            title: req.title,
            content: req.content,
            tags,
        }),
    ))
}

async fn search_notes(
    State(state): State<AppState>,
    Json(req): Json<SearchNotesRequest>,
) -> Result<Json<Vec<ScoredNote>>, ApiError> {
    let notes = state.db.notes.list_with_tags().await?;
    let results = state.search.search(&req.query, &notes).await?;
    Ok(Json(results))
}

async fn notes_by_tag(
    State(state): State<AppState>,
    Path(tag_name): Path<String>,
) -> Result<Json<Vec<NoteWithTags>>, ApiError> {
    let notes = state.db.notes.find_by_tag(&tag_name).await?;
    Ok(Json(notes))
}

async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, ApiError> {
    let tags = state.db.tags.list().await?;
    Ok(Json(tags))
}

async fn list_relationships(
    State(state): State<AppState>,
    Query(query): Query<RelationshipsQuery>,
) -> Result<Json<Vec<TagRelationship>>, ApiError> {
    let floor = query
        .min_similarity
        .unwrap_or(defaults::RELATIONSHIP_READ_FLOOR);
    let relationships = state.db.relationships.list(floor).await?;
    Ok(Json(relationships))
}

async fn calculate_relationships(
    State(state): State<AppState>,
) -> Result<Json<RecomputeResponse>, ApiError> {
    let summary = state.relationships.recompute_exact().await?;
    Ok(Json(RecomputeResponse {
        message: "Relationships calculated successfully".to_string(),
        count: summary.count,
    }))
}

async fn calculate_relationships_fast(
    State(state): State<AppState>,
) -> Result<Json<RecomputeResponse>, ApiError> {
    let summary = state.relationships.recompute_fast().await?;
    Ok(Json(RecomputeResponse {
        message: "Relationships calculated successfully".to_string(),
        count: summary.count,
    }))
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[derive(Debug)]
enum ApiError {
    Internal(trellis_core::Error),
    NotFound(String),
    BadRequest(String),
}

impl From<trellis_core::Error> for ApiError {
    fn from(err: trellis_core::Error) -> Self {
        match &err {
            trellis_core::Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            trellis_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            // Validation errors carry their specific, actionable message.
            trellis_core::Error::TooManyTags { .. } | trellis_core::Error::EmptyQuery => {
                ApiError::BadRequest(err.to_string())
            }
            _ => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            // Provider and store failures return a generic body; the details
            // go to the error log, never to the client.
            ApiError::Internal(err) => {
                error!(error = %err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

// =============================================================================
// SERVER SETUP
// =============================================================================

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/notes", get(list_notes).post(create_note))
        .route("/api/notes/search", post(search_notes))
        .route("/api/notes/by-tag/:tag_name", get(notes_by_tag))
        .route("/api/tags", get(list_tags))
        .route("/api/tags/relationships", get(list_relationships))
        .route(
            "/api/tags/calculate-relationships",
            post(calculate_relationships),
        )
        .route(
            "/api/tags/calculate-relationships-fast",
            post(calculate_relationships_fast),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,trellis=debug".into()),
        )
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let db = Database::connect(&database_url).await?;
    db.init_schema().await?;

    let backend = Arc::new(OpenAiBackend::from_env()?);
    let embedder: Arc<dyn EmbeddingBackend> = backend.clone();
    let generator: Arc<dyn GenerationBackend> = backend;

    let judge = Arc::new(LlmSimilarityJudge::new(generator.clone()));
    let tagger = Arc::new(TagExtractor::new(generator));

    let relationships = Arc::new(RelationshipService::new(
        Arc::new(PgTagRepository::new(db.pool.clone())),
        Arc::new(PgRelationshipRepository::new(db.pool.clone())),
        judge,
        embedder.clone(),
    ));
    let search = Arc::new(SemanticNoteSearch::new(embedder));

    let state = AppState {
        db,
        relationships,
        search,
        tagger,
    };

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(defaults::SERVER_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "Starting trellis API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, build_router(state)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_many_tags_maps_to_bad_request_with_message() {
        let err = trellis_core::Error::TooManyTags {
            count: 51,
            limit: 50,
        };
        match ApiError::from(err) {
            ApiError::BadRequest(msg) => {
                assert!(msg.contains("51"));
                assert!(msg.contains("50"));
            }
            other => panic!("Expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_query_maps_to_bad_request() {
        match ApiError::from(trellis_core::Error::EmptyQuery) {
            ApiError::BadRequest(msg) => assert!(msg.contains("must not be empty")),
            other => panic!("Expected BadRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_provider_failure_maps_to_internal() {
        let err = trellis_core::Error::Embedding("upstream exploded".to_string());
        assert!(matches!(ApiError::from(err), ApiError::Internal(_)));
    }

    #[test]
    fn test_not_found_maps_through() {
        let err = trellis_core::Error::NotFound("nope".to_string());
        assert!(matches!(ApiError::from(err), ApiError::NotFound(_)));
    }

    #[test]
    fn test_create_note_request_deserialization() {
        let req: CreateNoteRequest =
            serde_json::from_str(r#"{"title": "T", "content": "C"}"#).unwrap();
        assert_eq!(req.title, "T");
        assert_eq!(req.content, "C");
    }

    #[test]
    fn test_relationships_query_defaults() {
        let query: RelationshipsQuery = serde_json::from_str("{}").unwrap();
        assert!(query.min_similarity.is_none());
    }
}
