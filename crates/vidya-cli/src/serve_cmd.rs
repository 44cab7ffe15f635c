use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use vidya_core::plan::PlanResponse;
use vidya_core::{Pipeline, PipelineError};

use crate::config::ServerConfig;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let status = match err {
            PipelineError::Cancelled => StatusCode::GATEWAY_TIMEOUT,
            PipelineError::Configuration(_) | PipelineError::Synthesis(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message, "kind": self.kind });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TeacherHelpRequest {
    pub prompt: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<Pipeline>,
    request_timeout: Duration,
}

pub fn build_router(pipeline: Arc<Pipeline>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/teacher_help", post(teacher_help))
        .layer(CorsLayer::permissive())
        .with_state(AppState {
            pipeline,
            request_timeout,
        })
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(pipeline: Pipeline, server: &ServerConfig) -> Result<()> {
    let app = build_router(Arc::new(pipeline), server.request_timeout);
    let addr: SocketAddr = format!("{}:{}", server.bind, server.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", server.bind, server.port))?;
    tracing::info!("vidya serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("vidya serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Generate a plan. The request token is cancelled when the timeout fires
/// or the client goes away and this future is dropped.
async fn teacher_help(
    State(state): State<AppState>,
    Json(request): Json<TeacherHelpRequest>,
) -> Result<Json<PlanResponse>, AppError> {
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let work = state.pipeline.create_teaching_plan(&request.prompt, &cancel);
    match tokio::time::timeout(state.request_timeout, work).await {
        Ok(result) => Ok(Json(result?)),
        Err(_) => {
            tracing::warn!(
                timeout_secs = state.request_timeout.as_secs(),
                "teacher_help request timed out"
            );
            cancel.cancel();
            Err(PipelineError::Cancelled.into())
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
