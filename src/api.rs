use crate::config::ApiConfig;
use crate::error::PipelineError;
use crate::events::FrameEventBatch;
use crate::handler::FrameEventHandler;
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<FrameEventHandler>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/invocations", post(invoke))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the invocation API server
pub async fn start_api_server(state: AppState, config: &ApiConfig) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind API listener on {}", addr))?;

    info!(addr = %addr, "Invocation API listening");

    axum::serve(listener, create_router(state))
        .await
        .context("API server error")?;

    Ok(())
}

/// One invocation: process a frame event batch.
///
/// Success returns the fixed acknowledgment. An unrecovered error maps to 500
/// so the external trigger's redelivery policy takes over; there is no
/// partial-failure report.
async fn invoke(
    State(state): State<AppState>,
    Json(batch): Json<FrameEventBatch>,
) -> impl IntoResponse {
    match state.handler.handle(batch).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => {
            error!(error = %e, code = e.code(), "Invocation aborted");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(error_response(&e)),
            )
                .into_response()
        }
    }
}

fn error_response(error: &PipelineError) -> ErrorResponse {
    ErrorResponse {
        error: error.to_string(),
        code: error.code().to_string(),
    }
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn readiness_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ready" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_shape() {
        let err = PipelineError::Persistence {
            frame_id: "b/img.jpg".to_string(),
            message: "throttled".to_string(),
        };

        let response = error_response(&err);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["code"], "PERSISTENCE_ERROR");
        assert!(json["error"].as_str().unwrap().contains("b/img.jpg"));
    }

    #[tokio::test]
    async fn test_health_endpoints_respond() {
        let health = health_check().await.into_response();
        assert_eq!(health.status(), StatusCode::OK);

        let ready = readiness_check().await.into_response();
        assert_eq!(ready.status(), StatusCode::OK);
    }
}
