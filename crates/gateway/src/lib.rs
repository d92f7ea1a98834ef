//! HTTP adapter for Parley.
//!
//! Exposes the chat engine to browser clients:
//! - `POST /api/chat` answers one message, tracking the session by cookie
//! - `POST /clear` forgets the session's turn history
//! - `GET /health` for liveness checks
//!
//! Built on Axum. Upstream failures never reach the client as errors; they
//! are logged and replaced by an apology.

pub mod session;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use parley_agent::ChatEngine;
use parley_config::AppConfig;
use parley_core::message::ChatReply;
use parley_security::sanitize_output;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

pub use session::{MAX_TURNS, SessionHistories};

/// Name of the cookie carrying the session id.
pub const SESSION_COOKIE: &str = "session_id";

/// Request body limit for every route.
pub const BODY_LIMIT_BYTES: usize = 64 * 1024;

/// Shown when the engine fails upstream.
pub const FALLBACK_MESSAGE: &str =
    "Sorry, something went wrong on our side. Please try again in a moment.";

const MAX_SESSION_ID_LEN: usize = 128;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub engine: Arc<ChatEngine>,
    pub histories: SessionHistories,
}

impl GatewayState {
    pub fn new(engine: Arc<ChatEngine>, max_sessions: usize) -> Self {
        Self {
            engine,
            histories: SessionHistories::new(MAX_TURNS, max_sessions),
        }
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/chat", post(chat_handler))
        .route("/clear", post(clear_handler))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the engine from config and serve until the process exits.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let engine = Arc::new(parley_agent::build_engine(&config).await?);
    let state = Arc::new(GatewayState::new(engine, config.safety.max_tracked_sessions));
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Session id from the request's `Cookie` header, if present and sane.
fn session_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .map(str::trim)
        .find(|id| {
            !id.is_empty()
                && id.len() <= MAX_SESSION_ID_LEN
                && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        })
        .map(str::to_string)
}

fn session_cookie(session_id: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax"
    ))
    .ok()
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

async fn chat_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(payload): Json<ChatRequest>,
) -> Response {
    let (session_id, minted) = match session_from(&headers) {
        Some(id) => (id, false),
        None => (uuid::Uuid::new_v4().to_string(), true),
    };

    info!(
        session_id = %session_id,
        message_len = payload.message.len(),
        "Chat message received"
    );

    let history = state.histories.snapshot(&session_id);
    let reply = match state
        .engine
        .chat_reply(&payload.message, &history, &session_id)
        .await
    {
        Ok(reply) => {
            state
                .histories
                .record(&session_id, &payload.message, &reply.response);
            reply
        }
        Err(e) => {
            error!(session_id = %session_id, error = %e, "Chat failed upstream");
            ChatReply::text(sanitize_output(FALLBACK_MESSAGE))
        }
    };

    let mut response = Json(reply).into_response();
    if minted {
        if let Some(cookie) = session_cookie(&session_id) {
            response.headers_mut().insert(header::SET_COOKIE, cookie);
        }
    }
    response
}

#[derive(Serialize)]
struct ClearResponse {
    status: &'static str,
    message: &'static str,
}

async fn clear_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Json<ClearResponse> {
    if let Some(session_id) = session_from(&headers) {
        let cleared = state.histories.clear(&session_id);
        info!(session_id = %session_id, cleared, "Chat history cleared");
    }
    Json(ClearResponse {
        status: "success",
        message: "Clear chat history",
    })
}
