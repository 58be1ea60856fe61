//! HTTP API surface
//!
//! Exposes the turn pipeline over REST:
//!
//! - POST /chat: run one turn for a session and return the reply
//! - GET /health: liveness endpoint for load balancers
//!
//! Transport concerns only; all decision logic lives in the agent core.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::agent::AgentCore;

/// Shared state for request handlers
#[derive(Clone)]
pub struct AppState {
    agent: Arc<AgentCore>,
}

/// Chat request body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,

    #[serde(default = "default_session_id")]
    pub session_id: String,
}

fn default_session_id() -> String {
    "default_session".to_string()
}

/// Chat response body
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Build the application router
pub fn app(agent: Arc<AgentCore>) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { agent })
}

/// Bind and serve until ctrl-c
pub async fn serve(addr: SocketAddr, agent: Arc<AgentCore>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app(agent))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down gracefully");
        })
        .await?;

    Ok(())
}

/// Run one turn for the caller's session
async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, Response> {
    if request.session_id.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "session_id must not be empty"})),
        )
            .into_response());
    }

    match state
        .agent
        .process_turn(&request.session_id, &request.message)
        .await
    {
        Ok(outcome) => Ok(Json(ChatResponse {
            response: outcome.reply,
        })),
        Err(e) => {
            tracing::error!(session_id = %request.session_id, error = %e, "Turn failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response())
        }
    }
}

/// Health check endpoint for load balancers and orchestrators
async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "wayfarer",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
