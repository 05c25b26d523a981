//! HTTP boundary for dialogwire.
//!
//! Receives webhook requests from the dialog platform, hands the raw body
//! to the [`Agent`] and returns its response document. Exposes a health
//! endpoint for monitoring.
//!
//! Built on Axum. Request handling itself is synchronous and never holds
//! a lock: the agent is immutable once the server starts.

pub mod auth;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use dialogwire_agent::Agent;
use dialogwire_config::{AppConfig, GatewayConfig};
use dialogwire_core::Error;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub agent: Arc<Agent>,
    pub webhook_path: String,
    pub max_body_bytes: usize,
    pub auth_token: Option<String>,
    pub signing_secret: Option<String>,
}

impl GatewayState {
    pub fn new(config: &GatewayConfig, agent: Arc<Agent>) -> Self {
        Self {
            agent,
            webhook_path: config.webhook_path.clone(),
            max_body_bytes: config.max_body_bytes,
            auth_token: config.auth_token.clone().filter(|t| !t.is_empty()),
            signing_secret: config.signing_secret.clone().filter(|s| !s.is_empty()),
        }
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with the health and webhook routes.
pub fn build_router(state: SharedState) -> Router {
    let webhook_path = state.webhook_path.clone();
    let max_body_bytes = state.max_body_bytes;

    Router::new()
        .route("/health", get(health_handler))
        .route(&webhook_path, post(webhook_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: &AppConfig, agent: Arc<Agent>) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let state = Arc::new(GatewayState::new(&config.gateway, agent));

    info!(
        addr = %addr,
        webhook_path = %state.webhook_path,
        auth = state.auth_token.is_some(),
        signed = state.signing_secret.is_some(),
        "Gateway starting"
    );
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    intents: usize,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        intents: state.agent.list_handlers().len(),
    })
}

async fn webhook_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(token) = &state.auth_token {
        if !auth::check_bearer(&headers, token) {
            warn!("Rejected webhook request: missing or invalid bearer token");
            return error_response(StatusCode::UNAUTHORIZED, "unauthorized", None);
        }
    }

    if let Some(secret) = &state.signing_secret {
        if !auth::check_signature(&headers, secret, &body) {
            warn!("Rejected webhook request: missing or invalid signature");
            return error_response(StatusCode::UNAUTHORIZED, "unauthorized", None);
        }
    }

    match state.agent.handle_json(&body) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => into_error_response(e),
    }
}

fn into_error_response(err: Error) -> Response {
    match err {
        Error::MalformedRequest(_) => {
            warn!(error = %err, "Malformed webhook request");
            error_response(StatusCode::BAD_REQUEST, err.kind(), Some(err.to_string()))
        }
        other => {
            error!(error = %other, kind = other.kind(), "Webhook turn failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, other.kind(), None)
        }
    }
}

fn error_response(status: StatusCode, kind: &str, message: Option<String>) -> Response {
    let body = match message {
        Some(message) => json!({"error": {"kind": kind, "message": message}}),
        None => json!({"error": {"kind": kind}}),
    };
    (status, Json(body)).into_response()
}
