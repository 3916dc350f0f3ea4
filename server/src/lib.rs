use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use opsrank_core::loader::load_runbooks;
use opsrank_core::tokenizer::tokenize;
use opsrank_core::{Bm25Params, DocId, Metadata, Retriever, RetrieverHandle, SearchError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;
const SNIPPET_BEFORE: usize = 100;
const SNIPPET_AFTER: usize = 200;

type ApiError = (StatusCode, String);

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 5 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_docs: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub score: f64,
    pub title: Option<String>,
    pub metadata: Metadata,
    pub snippet: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub runbooks_dir: PathBuf,
    pub params: Bm25Params,
    pub retriever: Arc<RetrieverHandle>,
    pub admin_token: Option<String>,
    /// Held for a whole reload so rebuilds publish in request order.
    pub reload_lock: Arc<tokio::sync::Mutex<()>>,
}

impl AppState {
    /// State with nothing indexed yet.
    pub fn new(runbooks_dir: impl Into<PathBuf>, params: Bm25Params, admin_token: Option<String>) -> Self {
        Self { runbooks_dir: runbooks_dir.into(), params, retriever: Arc::new(RetrieverHandle::new()), admin_token, reload_lock: Arc::default() }
    }

    /// Load the runbook directory and publish a fresh retriever. Returns the document count.
    pub fn reload(&self) -> Result<usize> {
        let docs = load_runbooks(&self.runbooks_dir)?;
        let retriever = Retriever::build(docs, self.params)?;
        let doc_count = retriever.doc_count();
        self.retriever.publish(retriever);
        Ok(doc_count)
    }
}

pub fn build_app(runbooks_dir: PathBuf, params: Bm25Params) -> Result<Router> {
    params.validate()?;
    let admin_token = std::env::var("ADMIN_TOKEN").ok();
    let state = AppState::new(runbooks_dir, params, admin_token);
    // Start even without a corpus; /search answers 503 until a reload succeeds.
    match state.reload() {
        Ok(doc_count) => tracing::info!(doc_count, "initial index published"),
        Err(err) => tracing::warn!(error = %err, dir = %state.runbooks_dir.display(), "initial runbook load failed"),
    }

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

    Ok(router(state).layer(cors))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .route("/admin/reload", post(reload_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let retriever = state.retriever.current().map_err(search_error)?;
    let k = params.k.min(MAX_K);
    let raw_terms = tokenize(&params.q);

    let results: Vec<SearchHit> = retriever
        .search(&params.q, k)
        .into_iter()
        .map(|hit| SearchHit {
            doc_id: hit.doc_id,
            score: hit.score,
            title: hit.title().map(str::to_owned),
            metadata: hit.metadata.clone(),
            snippet: snippet_from_text(hit.text, &raw_terms),
        })
        .collect();

    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query: params.q, took_s: elapsed.as_secs_f64(), total_docs: retriever.doc_count(), results }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<DocId>) -> Result<Json<serde_json::Value>, ApiError> {
    let retriever = state.retriever.current().map_err(search_error)?;
    match retriever.doc(doc_id) {
        Some(doc) => Ok(Json(serde_json::json!({
            "doc_id": doc_id,
            "metadata": doc.metadata,
            "text": doc.text,
        }))),
        None => Err((StatusCode::NOT_FOUND, format!("document {doc_id} not found"))),
    }
}

async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let _reloading = state.reload_lock.lock().await;
    let reload_state = state.clone();
    let outcome = tokio::task::spawn_blocking(move || reload_state.reload())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    match outcome {
        Ok(doc_count) => {
            tracing::info!(doc_count, "index republished");
            Ok(Json(serde_json::json!({ "doc_count": doc_count })))
        }
        Err(err) => {
            tracing::error!(error = %err, "reload failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, format!("reload failed: {err:#}")))
        }
    }
}

fn search_error(err: SearchError) -> ApiError {
    match err {
        SearchError::IndexNotBuilt => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}

/// Window of text around the first query term hit, with every term highlighted.
fn snippet_from_text(text: &str, raw_terms: &[String]) -> Option<String> {
    if text.is_empty() { return None; }
    let pattern = terms_pattern(raw_terms);
    let first_idx = pattern.as_ref().and_then(|re| re.find(text)).map(|m| m.start());
    let snippet = match first_idx {
        Some(idx) => {
            let start = floor_char_boundary(text, idx.saturating_sub(SNIPPET_BEFORE));
            let end = floor_char_boundary(text, (idx + SNIPPET_AFTER).min(text.len()));
            &text[start..end]
        }
        None => &text[..floor_char_boundary(text, SNIPPET_AFTER.min(text.len()))],
    };
    Some(match &pattern {
        Some(re) => re.replace_all(snippet, |caps: &regex::Captures| format!("<em>{}</em>", &caps[0])).into_owned(),
        None => snippet.to_owned(),
    })
}

fn terms_pattern(terms: &[String]) -> Option<regex::Regex> {
    let alternation: Vec<String> = terms.iter().filter(|t| !t.is_empty()).map(|t| regex::escape(t)).collect();
    if alternation.is_empty() { return None; }
    regex::RegexBuilder::new(&alternation.join("|"))
        .case_insensitive(true)
        .build()
        .ok()
}

fn floor_char_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) { idx -= 1; }
    idx
}
