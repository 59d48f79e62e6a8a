use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::ApiError;
use crate::{
    domain::{
        models::{ConversationTurn, Part},
        search::{Degradation, RankedResult},
    },
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(chat))
        .route("/health", get(chat_health))
}

#[derive(Debug, Clone, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default, alias = "conversation_history")]
    history: Vec<ConversationTurn>,
    #[serde(default = "default_include_products")]
    include_products: bool,
}

fn default_include_products() -> bool {
    true
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    products: Option<Vec<RankedResult>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    suggestions: Vec<Part>,
    history: Vec<ConversationTurn>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    degraded: Vec<Degradation>,
    response_time_ms: u64,
}

#[instrument(name = "POST /chat", skip(app_state, payload))]
async fn chat(
    State(app_state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let started = Instant::now();
    let Json(request) = payload?;
    if request.message.trim().is_empty() {
        return Err(ApiError::bad_request("message must not be empty"));
    }

    let outcome = app_state
        .search
        .chat(&request.message, &request.history, request.include_products)
        .await?;

    let response_time_ms = started.elapsed().as_millis() as u64;
    tracing::info!(
        products = outcome.products.len(),
        history = outcome.history.len(),
        degraded = ?outcome.degraded,
        response_time_ms,
        "Chat completed"
    );

    Ok(Json(ChatResponse {
        response: outcome.response,
        products: request.include_products.then_some(outcome.products),
        suggestions: outcome.suggestions,
        history: outcome.history,
        degraded: outcome.degraded,
        response_time_ms,
    }))
}

#[derive(Debug, Serialize)]
struct ChatHealth {
    status: &'static str,
    message: &'static str,
    embeddings_loaded: usize,
    llm_configured: bool,
}

#[instrument(name = "GET /chat/health", skip(app_state))]
async fn chat_health(State(app_state): State<AppState>) -> Json<ChatHealth> {
    let embeddings_loaded = app_state.search.indexed_embeddings();
    let ready = app_state.llm_configured && embeddings_loaded > 0;

    Json(ChatHealth {
        status: if ready { "healthy" } else { "degraded" },
        message: if ready {
            "Chat system is ready"
        } else {
            "Chat answers fall back to templated responses"
        },
        embeddings_loaded,
        llm_configured: app_state.llm_configured,
    })
}
