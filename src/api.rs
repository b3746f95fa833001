// src/api.rs
//! Thin HTTP surface over the retriever.
//!
//! - `GET /health`
//! - `GET /api/news/search?query=`       (empty query → `[]`)
//! - `GET /api/reddit/search?subreddit=` (default `stocks`)

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use shuttle_axum::axum::{
    extract::{Query, State},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::channel::DEFAULT_CHANNEL;
use crate::error::Error;
use crate::model::EnrichedDocument;
use crate::retrieval::Retriever;

#[derive(Clone)]
pub struct AppState {
    pub retriever: Arc<Retriever>,
}

impl AppState {
    pub fn new(retriever: Arc<Retriever>) -> Self {
        Self { retriever }
    }
}

/// HTTP rendering of library errors.
#[derive(Debug)]
pub enum ApiError {
    UnsupportedChannel,
    Internal,
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::UnsupportedChannel(_) => ApiError::UnsupportedChannel,
            other => {
                tracing::error!(target: "api", error = %other, "retrieval failed");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            ApiError::UnsupportedChannel => (StatusCode::BAD_REQUEST, "Unsupported subreddit"),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed during final processing",
            ),
        };
        (status, Json(json!({ "error": msg }))).into_response()
    }
}

/// CORS limited to the frontend origin: other origins get no
/// `Access-Control-Allow-Origin` header. An unparseable origin allows none.
pub fn cors_layer(frontend_url: &str) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers(Any);
    match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(origin) => base.allow_origin(AllowOrigin::list([origin])),
        Err(e) => {
            tracing::warn!(target: "api", frontend_url, error = %e, "invalid frontend origin");
            base
        }
    }
}

pub fn router(state: AppState, frontend_url: &str) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/news/search", get(search_news))
        .route("/api/reddit/search", get(search_reddit))
        .layer(cors_layer(frontend_url))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct NewsParams {
    #[serde(default)]
    query: String,
}

async fn search_news(
    State(st): State<AppState>,
    Query(p): Query<NewsParams>,
) -> Result<Json<Value>, ApiError> {
    if p.query.trim().is_empty() {
        return Ok(Json(Value::Array(Vec::new())));
    }
    Ok(Json(to_wire(&st.retriever.search_news(&p.query).await?)?))
}

#[derive(Debug, Deserialize)]
struct RedditParams {
    subreddit: Option<String>,
}

async fn search_reddit(
    State(st): State<AppState>,
    Query(p): Query<RedditParams>,
) -> Result<Json<Value>, ApiError> {
    let channel = p
        .subreddit
        .unwrap_or_else(|| DEFAULT_CHANNEL.canonical().to_string());
    Ok(Json(to_wire(&st.retriever.search_social(&channel).await?)?))
}

/// Render the final list in the wire format.
fn to_wire(docs: &[EnrichedDocument]) -> Result<Value, Error> {
    serde_json::to_value(docs).map_err(|e| Error::RetrievalFailure(e.to_string()))
}
