use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::instrument;

use crate::{repositories::CatalogRepository, AppState};

const APP_NAME: &str = "Parts Desk API";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
}

fn timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default()
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    database: String,
    embeddings: String,
    llm_api: &'static str,
    timestamp: String,
}

#[instrument(name = "GET /health", skip(app_state))]
async fn health(State(app_state): State<AppState>) -> Json<HealthResponse> {
    let mut healthy = app_state.llm_configured;
    let (database, embeddings) = match app_state.catalog.counts().await {
        Ok(counts) => {
            let embeddings = app_state.search.indexed_embeddings();
            if embeddings == 0 {
                healthy = false;
            }
            (
                format!("connected ({} products)", counts.parts),
                if embeddings > 0 {
                    format!("loaded ({embeddings} products)")
                } else {
                    "not generated".to_string()
                },
            )
        }
        Err(err) => {
            tracing::error!("Health check failed to reach the database: {}", err);
            healthy = false;
            (format!("error: {err}"), "unknown".to_string())
        }
    };

    Json(HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        database,
        embeddings,
        llm_api: if app_state.llm_configured {
            "configured"
        } else {
            "not configured"
        },
        timestamp: timestamp(),
    })
}

#[instrument(name = "GET /info")]
async fn info() -> Json<Value> {
    Json(json!({
        "app": APP_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "search": "/api/search",
            "chat": "/api/chat",
            "compare": "/api/compare",
            "products": "/api/products",
            "analytics": "/api/analytics/overview",
            "categories": "/api/categories",
            "brands": "/api/brands",
            "health": "/api/health",
        },
    }))
}

#[instrument(name = "GET /")]
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": APP_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "description": "AI-assisted search and analytics for appliance parts",
        "status": "running",
        "timestamp": timestamp(),
    }))
}
