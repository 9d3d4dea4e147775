//! HTTP API server.
//!
//! Exposes the book catalog and login-token store as a JSON API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/book` | Create a book (embeds the description) |
//! | `GET`  | `/api/book/vector/query` | Semantic search (`?query=`) |
//! | `GET`  | `/api/book/fuzzy/query` | Fuzzy text search (`?query=`) |
//! | `POST` | `/api/login/token` | Create a login token |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "validation", "message": "name is required" } }
//! ```
//!
//! Codes: `validation` (400), `upstream` (502, embedding provider failure),
//! `internal` (500, storage failure). Internal error detail is logged, never
//! returned to the client.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::catalog;
use crate::config::Config;
use crate::db;
use crate::embedding;
use crate::migrate;
use crate::models::{Book, FuzzyHit, LoginToken, NewBook, SemanticHit};
use crate::tokens;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: SqlitePool,
}

/// Starts the HTTP server.
///
/// Connects the pool, runs migrations, verifies the embedding provider
/// configuration, spawns the token TTL sweeper, and serves until the
/// process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let pool = db::connect(config).await?;
    migrate::run_migrations(&pool).await?;

    // Fail on misconfigured providers before accepting requests.
    if config.embedding.is_enabled() {
        let provider = embedding::create_provider(&config.embedding)?;
        tracing::info!(
            model = provider.model_name(),
            dims = provider.dims(),
            "embedding provider ready"
        );
    } else {
        tracing::warn!("embedding provider disabled; book creation and semantic search will fail");
    }

    let ttl = Duration::from_secs(config.tokens.ttl_secs);
    let sweep_interval = Duration::from_secs(config.tokens.sweep_interval_secs);
    tokio::spawn(tokens::run_sweeper(pool.clone(), ttl, sweep_interval));

    let state = AppState {
        config: Arc::new(config.clone()),
        pool,
    };

    let app = router(state);

    tracing::info!(addr = %bind_addr, "listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router. Separated from [`run_server`] so tests can drive the
/// API in-process.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/book", post(handle_create_book))
        .route("/api/book/vector/query", get(handle_vector_query))
        .route("/api/book/fuzzy/query", get(handle_fuzzy_query))
        .route("/api/login/token", post(handle_create_token))
        .route("/health", get(handle_health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code: `validation`, `upstream`, or `internal`.
    code: String,
    /// Human-readable error message. Safe to show to clients.
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// 400 — the request itself is at fault.
fn validation_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "validation".to_string(),
        message: message.into(),
    }
}

/// 502 — the embedding provider failed. Detail goes to the log only.
fn upstream_error(err: anyhow::Error) -> AppError {
    tracing::error!(error = %err, "embedding provider failure");
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "upstream".to_string(),
        message: "embedding provider request failed".to_string(),
    }
}

/// 500 — a store read or write failed. Detail goes to the log only.
fn internal_error(err: anyhow::Error) -> AppError {
    tracing::error!(error = %err, "storage failure");
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: "storage operation failed".to_string(),
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/book ============

/// Request body for book creation. Every field is optional at the wire
/// level so missing fields surface as validation errors in the shared
/// error schema rather than a deserializer rejection.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct CreateBookRequest {
    name: Option<String>,
    author: Option<String>,
    price: Option<f64>,
    copies_sold: Option<i64>,
    description: Option<String>,
}

impl CreateBookRequest {
    /// The validation boundary: required-field presence, non-empty text,
    /// non-negative numbers.
    fn validate(self) -> Result<NewBook, AppError> {
        let name = require_text(self.name, "name")?;
        let author = require_text(self.author, "author")?;
        let description = require_text(self.description, "description")?;

        let price = self
            .price
            .ok_or_else(|| validation_error("price is required"))?;
        if !price.is_finite() || price < 0.0 {
            return Err(validation_error("price must be a non-negative number"));
        }

        if let Some(copies) = self.copies_sold {
            if copies < 0 {
                return Err(validation_error("copiesSold must be non-negative"));
            }
        }

        Ok(NewBook {
            name,
            author,
            price,
            copies_sold: self.copies_sold,
            description,
        })
    }
}

fn require_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value {
        Some(s) if !s.trim().is_empty() => Ok(s),
        Some(_) => Err(validation_error(format!("{} must not be empty", field))),
        None => Err(validation_error(format!("{} is required", field))),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BookResponse {
    id: String,
    name: String,
    author: String,
    price: f64,
    copies_sold: Option<i64>,
    description: String,
    embedding: Vec<f32>,
    created_at: String,
    updated_at: String,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            name: book.name,
            author: book.author,
            price: book.price,
            copies_sold: book.copies_sold,
            description: book.description,
            embedding: book.embedding,
            created_at: format_ts_iso(book.created_at),
            updated_at: format_ts_iso(book.updated_at),
        }
    }
}

async fn handle_create_book(
    State(state): State<AppState>,
    Json(request): Json<CreateBookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), AppError> {
    let new_book = request.validate()?;

    let embedding = embedding::embed_query(&state.config.embedding, &new_book.description)
        .await
        .map_err(upstream_error)?;

    let saved = catalog::insert_book(
        &state.pool,
        &new_book,
        &embedding,
        &state.config.search.vector,
    )
    .await
    .map_err(internal_error)?;

    Ok((StatusCode::CREATED, Json(saved.into())))
}

// ============ GET /api/book/vector/query ============

#[derive(Deserialize)]
struct SearchParams {
    query: Option<String>,
}

impl SearchParams {
    fn require_query(self) -> Result<String, AppError> {
        match self.query {
            Some(q) if !q.trim().is_empty() => Ok(q),
            _ => Err(validation_error("query must not be empty")),
        }
    }
}

#[derive(Serialize)]
struct SemanticHitResponse {
    id: String,
    description: String,
    score: f64,
}

impl From<SemanticHit> for SemanticHitResponse {
    fn from(hit: SemanticHit) -> Self {
        Self {
            id: hit.id,
            description: hit.description,
            score: hit.score,
        }
    }
}

async fn handle_vector_query(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SemanticHitResponse>>, AppError> {
    let query = params.require_query()?;

    let query_vec = embedding::embed_query(&state.config.embedding, &query)
        .await
        .map_err(upstream_error)?;

    let hits = catalog::semantic_search(&state.pool, &query_vec, &state.config.search.vector)
        .await
        .map_err(internal_error)?;

    Ok(Json(hits.into_iter().map(Into::into).collect()))
}

// ============ GET /api/book/fuzzy/query ============

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FuzzyHitResponse {
    id: String,
    name: String,
    author: String,
    price: f64,
    copies_sold: Option<i64>,
    description: String,
    score: f64,
    created_at: String,
    updated_at: String,
}

impl From<FuzzyHit> for FuzzyHitResponse {
    fn from(hit: FuzzyHit) -> Self {
        Self {
            id: hit.id,
            name: hit.name,
            author: hit.author,
            price: hit.price,
            copies_sold: hit.copies_sold,
            description: hit.description,
            score: hit.score,
            created_at: format_ts_iso(hit.created_at),
            updated_at: format_ts_iso(hit.updated_at),
        }
    }
}

async fn handle_fuzzy_query(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<FuzzyHitResponse>>, AppError> {
    let query = params.require_query()?;

    let hits = catalog::fuzzy_search(&state.pool, &query, &state.config.search.fuzzy)
        .await
        .map_err(internal_error)?;

    Ok(Json(hits.into_iter().map(Into::into).collect()))
}

// ============ POST /api/login/token ============

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct CreateTokenRequest {
    token: Option<String>,
    user_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id: String,
    token: String,
    user_id: String,
    created_at: String,
}

impl From<LoginToken> for TokenResponse {
    fn from(record: LoginToken) -> Self {
        Self {
            id: record.id,
            token: record.token,
            user_id: record.user_id,
            created_at: format_ts_iso(record.created_at),
        }
    }
}

async fn handle_create_token(
    State(state): State<AppState>,
    Json(request): Json<CreateTokenRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    let token = require_text(request.token, "token")?;
    let user_id = require_text(request.user_id, "userId")?;

    let saved = tokens::create_token(&state.pool, &token, &user_id)
        .await
        .map_err(internal_error)?;

    Ok((StatusCode::CREATED, Json(saved.into())))
}
