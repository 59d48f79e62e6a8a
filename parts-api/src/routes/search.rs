use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::ApiError;
use crate::{
    domain::{
        models::Part,
        search::{Degradation, QueryIntent, RankedResult, SearchFilters},
    },
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(search))
}

#[derive(Debug, Clone, Deserialize)]
struct SearchRequest {
    query: String,
    top_k: Option<usize>,
    #[serde(default)]
    filters: SearchFilters,
    #[serde(default)]
    include_summary: bool,
}

impl SearchRequest {
    fn validate(&self, max_top_k: usize) -> Result<(), ApiError> {
        if self.query.trim().is_empty() {
            return Err(ApiError::bad_request("query must not be empty"));
        }
        if let Some(top_k) = self.top_k {
            if top_k == 0 || top_k > max_top_k {
                return Err(ApiError::bad_request(format!(
                    "top_k must be between 1 and {max_top_k}"
                )));
            }
        }
        let negative = |price: Option<f64>| price.is_some_and(|p| p < 0.0);
        if negative(self.filters.min_price) || negative(self.filters.max_price) {
            return Err(ApiError::bad_request("prices must not be negative"));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parsed_query: Option<QueryIntent>,
    results: Vec<RankedResult>,
    total_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    suggestions: Vec<Part>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    degraded: Vec<Degradation>,
    response_time_ms: u64,
}

#[instrument(name = "POST /search", skip(app_state, payload))]
async fn search(
    State(app_state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let started = Instant::now();
    let Json(request) = payload?;
    request.validate(app_state.search.max_top_k())?;

    let outcome = app_state
        .search
        .search(
            &request.query,
            request.top_k,
            &request.filters,
            request.include_summary,
        )
        .await?;

    let response_time_ms = started.elapsed().as_millis() as u64;
    tracing::info!(
        query = %request.query,
        results = outcome.results.len(),
        degraded = ?outcome.degraded,
        response_time_ms,
        "Search completed"
    );

    Ok(Json(SearchResponse {
        query: request.query,
        parsed_query: outcome.intent,
        total_results: outcome.results.len(),
        results: outcome.results,
        summary: outcome.summary,
        suggestions: outcome.suggestions,
        degraded: outcome.degraded,
        response_time_ms,
    }))
}
