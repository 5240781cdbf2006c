//! HTTP API server.
//!
//! `POST /chat` is the boundary where the formatting agent's payload is
//! validated. Whatever the responder returns is normalized into a
//! [`ResponseEnvelope`](crate::envelope::ResponseEnvelope) before it is
//! serialized, and every failure becomes the same `{"error"}` body.

use crate::agent::Responder;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::envelope::normalize;
use crate::orchestrator::Orchestrator;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, instrument, warn};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub responder: Arc<dyn Responder>,
}

impl AppState {
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        Self { responder }
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/chat", post(chat))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&e.to_string());
        return Err(e.into());
    }

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let orchestrator = Orchestrator::new(settings)?;
    let state = AppState::new(Arc::new(orchestrator.tutor()?));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Study Mode API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Home", "GET  /");
    Output::kv("Health", "GET  /health");
    Output::kv("Chat", "POST /chat?query=...&session_id=...");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    info!("Serving on {}", addr);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

#[derive(Debug, Deserialize)]
struct ChatParams {
    query: String,
    session_id: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(message: String) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorResponse { error: message })).into_response()
}

async fn home() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "Welcome to Study Mode" }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[instrument(skip_all)]
async fn chat(State(state): State<AppState>, Query(params): Query<ChatParams>) -> Response {
    info!("Chat request for session {}", params.session_id);

    let result = state
        .responder
        .respond(&params.query, &params.session_id)
        .await
        .and_then(|raw| normalize(&raw));

    match result {
        Ok(envelope) => Json(envelope).into_response(),
        Err(e) if e.is_validation() => {
            warn!("Rejected response payload: {}", e);
            error_response(e.to_string())
        }
        Err(e) => {
            error!("Responder failed: {}", e);
            error_response(e.to_string())
        }
    }
}
