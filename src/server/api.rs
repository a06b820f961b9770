//! REST API handlers for the operator console
//!
//! All mutating actions return an acknowledgement envelope with the
//! resulting count or snapshot; failures return a descriptive error body
//! and leave the previously published views untouched.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::engine::{AutoRefreshSettings, LoadSummary, RefreshStatus};
use crate::error::Error;
use crate::models::{DisplayMode, PublicView, ResultSet};
use crate::source::SourceRef;

use super::AppState;

// ============================================================================
// API Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Simple error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

/// Map an action failure to its response status
fn error_status(error: &Error) -> StatusCode {
    match error {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Source(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_body(error: &Error) -> (StatusCode, Json<ErrorResponse>) {
    (error_status(error), Json(ErrorResponse::new(error.to_string())))
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

// ============================================================================
// Request Types
// ============================================================================

/// Source selector for `load`: a URL, a local path, or neither to use
/// the configured default
#[derive(Debug, Default, Deserialize)]
pub struct LoadRequest {
    pub url: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub category_complete: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: String,
}

#[derive(Debug, Deserialize)]
pub struct BackgroundRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct AutoRefreshRequest {
    pub enabled: Option<bool>,
    pub interval_secs: Option<u64>,
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/api/health", get(health_check))
        // Snapshots
        .route("/api/state/live", get(get_live))
        .route("/api/state/public", get(get_public))
        // Result actions
        .route("/api/results/load", post(load_results))
        .route("/api/results/refresh", post(refresh_results))
        .route("/api/results/complete", post(mark_complete))
        // Public display actions
        .route("/api/public/publish", post(publish))
        .route("/api/public/message", post(display_message))
        .route("/api/public/mode", post(switch_display_mode))
        .route("/api/background", post(set_background))
        // Auto-refresh
        .route("/api/auto-refresh", get(get_auto_refresh).post(set_auto_refresh))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    }))
}

async fn get_live(State(state): State<AppState>) -> Json<ApiResponse<ResultSet>> {
    Json(ApiResponse::success(state.engine.live()))
}

async fn get_public(State(state): State<AppState>) -> Json<ApiResponse<PublicView>> {
    Json(ApiResponse::success(state.engine.public()))
}

async fn load_results(
    State(state): State<AppState>,
    Json(request): Json<LoadRequest>,
) -> axum::response::Response {
    let source = match parse_source(&request) {
        Ok(source) => source,
        Err(e) => return error_body(&e).into_response(),
    };

    match state.engine.load(source).await {
        Ok(summary) => Json(ApiResponse::success(summary)).into_response(),
        Err(e) => error_body(&e).into_response(),
    }
}

fn parse_source(request: &LoadRequest) -> Result<Option<SourceRef>, Error> {
    let raw = request.url.as_deref().or(request.path.as_deref());
    match raw {
        Some(raw) => SourceRef::parse(raw)
            .map(Some)
            .map_err(|e| Error::validation(e.to_string())),
        None => Ok(None),
    }
}

async fn refresh_results(State(state): State<AppState>) -> axum::response::Response {
    match state.engine.refresh().await {
        Ok(summary) => {
            Json(ApiResponse::<LoadSummary>::success(summary)).into_response()
        }
        Err(e) => error_body(&e).into_response(),
    }
}

async fn mark_complete(
    State(state): State<AppState>,
    Json(request): Json<CompleteRequest>,
) -> impl IntoResponse {
    let complete = request.category_complete.unwrap_or(true);
    let live = state.engine.mark_complete(complete);
    Json(ApiResponse::success(live))
}

async fn publish(
    State(state): State<AppState>,
    Json(request): Json<PublishRequest>,
) -> axum::response::Response {
    match state.engine.publish(request.limit) {
        Ok(view) => {
            #[derive(Serialize)]
            struct PublishResponse {
                published_count: usize,
                display_mode: DisplayMode,
            }
            Json(ApiResponse::success(PublishResponse {
                published_count: view.competitors.len(),
                display_mode: view.display_mode,
            }))
            .into_response()
        }
        Err(e) => error_body(&e).into_response(),
    }
}

async fn display_message(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> impl IntoResponse {
    let view = state.engine.display_message(request.message);
    Json(ApiResponse::success(view))
}

async fn switch_display_mode(
    State(state): State<AppState>,
    Json(request): Json<ModeRequest>,
) -> axum::response::Response {
    match state.engine.switch_display_mode(&request.mode) {
        Ok(view) => Json(ApiResponse::success(view)).into_response(),
        Err(e) => error_body(&e).into_response(),
    }
}

async fn set_background(
    State(state): State<AppState>,
    Json(request): Json<BackgroundRequest>,
) -> impl IntoResponse {
    #[derive(Serialize)]
    struct BackgroundResponse {
        background_url: String,
    }
    let url = state.engine.set_background(request.url);
    Json(ApiResponse::success(BackgroundResponse {
        background_url: url,
    }))
}

async fn get_auto_refresh(State(state): State<AppState>) -> Json<ApiResponse<RefreshStatus>> {
    Json(ApiResponse::success(state.engine.refresh_status()))
}

async fn set_auto_refresh(
    State(state): State<AppState>,
    Json(request): Json<AutoRefreshRequest>,
) -> axum::response::Response {
    match state
        .engine
        .set_auto_refresh(request.enabled, request.interval_secs)
    {
        Ok(settings) => {
            Json(ApiResponse::<AutoRefreshSettings>::success(settings)).into_response()
        }
        Err(e) => error_body(&e).into_response(),
    }
}

// ============================================================================
// Tests
// ============================================================================
