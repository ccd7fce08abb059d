use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use docsearch_core::config::{ChunkingConfig, DEFAULT_K};
use docsearch_core::{extract_text, Chunker, ExtractionError, FileType, IndexStats, SearchHit, SharedIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub chunking: ChunkingConfig,
    pub default_k: usize,
    pub max_k: usize,
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { chunking: ChunkingConfig::default(), default_k: DEFAULT_K, max_k: 100, max_upload_bytes: 10 * 1024 * 1024 }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub index: SharedIndex,
    pub chunker: Chunker,
    pub default_k: usize,
    pub max_k: usize,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub k: Option<usize>,
}

#[derive(Deserialize)]
pub struct SearchForm {
    pub query: String,
    pub k: Option<usize>,
}

#[derive(Deserialize)]
pub struct UploadParams {
    pub filename: Option<String>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<ResultItem>,
}

#[derive(Serialize)]
pub struct ResultItem {
    pub document_id: String,
    pub filename: String,
    pub chunk_text: String,
    pub score: f64,
    pub snippet: Option<String>,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub document_id: String,
    pub chunks: usize,
}

#[derive(Serialize)]
pub struct DocumentResponse {
    pub document_id: String,
    pub filename: String,
    pub chunks: Vec<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

type ApiError = (StatusCode, Json<MessageResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(MessageResponse { message: message.into() }))
}

fn internal_error(e: tokio::task::JoinError) -> ApiError {
    tracing::error!(error = %e, "index task failed");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

/// Build the router over `index`. Fails if the chunking parameters are invalid.
pub fn build_app(index: SharedIndex, config: &ServerConfig) -> Result<Router> {
    let chunker = Chunker::new(config.chunking)?;
    let app_state = AppState { index, chunker, default_k: config.default_k, max_k: config.max_k };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/upload", post(upload_handler))
        .route("/search", get(search_handler).post(search_form_handler))
        .route("/documents/:document_id", get(document_handler))
        .route("/stats", get(stats_handler))
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors);
    Ok(app)
}

pub async fn upload_handler(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Json<UploadResponse>, ApiError> {
    let filename = match params.filename.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err(api_error(StatusCode::BAD_REQUEST, "missing filename query parameter")),
    };

    let file_type = FileType::detect(&filename, &body);
    let text = extract_text(file_type, &body).map_err(|e| {
        tracing::warn!(%filename, %file_type, error = %e, "extraction failed");
        let status = match &e {
            ExtractionError::Unsupported(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ExtractionError::Decode(_) | ExtractionError::Empty => StatusCode::UNPROCESSABLE_ENTITY,
        };
        api_error(status, format!("Error uploading file: {e}"))
    })?;

    let document_id = uuid::Uuid::new_v4().to_string();
    let chunks = {
        let (index, chunker) = (state.index.clone(), state.chunker);
        let (id, name) = (document_id.clone(), filename.clone());
        tokio::task::spawn_blocking(move || index.ingest_text(&id, &name, &text, &chunker))
            .await
            .map_err(internal_error)?
    };
    tracing::info!(%document_id, %filename, chunks, "document indexed");

    Ok(Json(UploadResponse {
        message: format!("File '{filename}' uploaded and processed successfully"),
        document_id,
        chunks,
    }))
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    run_search(&state, params.q, params.k).await.map(Json)
}

pub async fn search_form_handler(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> Result<Json<SearchResponse>, ApiError> {
    run_search(&state, form.query, form.k).await.map(Json)
}

async fn run_search(state: &AppState, query: String, k: Option<usize>) -> Result<SearchResponse, ApiError> {
    let start = std::time::Instant::now();
    let k = k.unwrap_or(state.default_k).min(state.max_k);
    // scoring touches every chunk; keep it off the async workers
    let hits = {
        let (index, q) = (state.index.clone(), query.clone());
        tokio::task::spawn_blocking(move || index.search(&q, k)).await.map_err(internal_error)?
    };
    let terms = highlight_terms(&query);
    let results: Vec<ResultItem> = hits.into_iter().map(|hit| result_item(hit, &terms)).collect();
    let elapsed = start.elapsed();
    Ok(SearchResponse { query, took_s: elapsed.as_secs_f64(), total_hits: results.len(), results })
}

fn result_item(hit: SearchHit, terms: &[String]) -> ResultItem {
    let snippet = highlight(&hit.chunk_text, terms);
    ResultItem { document_id: hit.document_id, filename: hit.filename, chunk_text: hit.chunk_text, score: hit.score, snippet }
}

pub async fn document_handler(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let chunks = state.index.document_chunks(&document_id);
    let Some(first) = chunks.first() else {
        return Err(api_error(StatusCode::NOT_FOUND, "not found"));
    };
    let filename = first.filename.clone();
    Ok(Json(DocumentResponse { document_id, filename, chunks: chunks.into_iter().map(|c| c.text).collect() }))
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<IndexStats> {
    Json(state.index.stats())
}

/// Query words worth highlighting: longer than two characters, distinct
/// ignoring case, longest first.
fn highlight_terms(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut terms: Vec<String> = query
        .split_whitespace()
        .filter(|t| t.chars().count() > 2)
        .filter(|t| seen.insert(t.to_lowercase()))
        .map(|t| t.to_string())
        .collect();
    terms.sort_by(|a, b| b.len().cmp(&a.len()));
    terms
}

/// Wrap case-insensitive occurrences of `terms` in `<mark>`. `None` when nothing matches.
fn highlight(text: &str, terms: &[String]) -> Option<String> {
    if terms.is_empty() {
        return None;
    }
    let alternation = terms.iter().map(|t| regex::escape(t)).collect::<Vec<_>>().join("|");
    let pat = regex::RegexBuilder::new(&alternation).case_insensitive(true).build().ok()?;
    if !pat.is_match(text) {
        return None;
    }
    Some(pat.replace_all(text, |caps: &regex::Captures| format!("<mark>{}</mark>", &caps[0])).into_owned())
}
