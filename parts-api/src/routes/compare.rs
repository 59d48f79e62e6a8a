use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::ApiError;
use crate::{
    domain::{models::Part, search::Degradation},
    AppState,
};

const MAX_COMPARED: usize = 5;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(compare))
}

#[derive(Debug, Clone, Deserialize)]
struct CompareRequest {
    skus: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CompareResponse {
    comparison: String,
    products: Vec<Part>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    degraded: Vec<Degradation>,
}

#[instrument(name = "POST /compare", skip(app_state, payload))]
async fn compare(
    State(app_state): State<AppState>,
    payload: Result<Json<CompareRequest>, JsonRejection>,
) -> Result<Json<CompareResponse>, ApiError> {
    let Json(request) = payload?;
    let skus: Vec<String> = request
        .skus
        .iter()
        .map(|sku| sku.trim().to_string())
        .filter(|sku| !sku.is_empty())
        .collect();
    if skus.is_empty() || skus.len() > MAX_COMPARED {
        return Err(ApiError::bad_request(format!(
            "between 1 and {MAX_COMPARED} skus are required"
        )));
    }

    let outcome = app_state.search.compare(&skus).await?;
    if outcome.products.is_empty() {
        return Err(ApiError::not_found("none of the requested products exist"));
    }

    Ok(Json(CompareResponse {
        comparison: outcome.comparison,
        products: outcome.products,
        degraded: outcome.degraded,
    }))
}
