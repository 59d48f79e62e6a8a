use std::str::FromStr;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::ApiError;
use crate::{
    domain::models::Part,
    repositories::{BrandCount, CatalogOverview, CatalogRepository, PriceBucket, TopSort},
    AppState,
};

const DEFAULT_TOP_LIMIT: u32 = 10;
const MAX_TOP_LIMIT: u32 = 50;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/overview", get(overview))
        .route("/top-products", get(top_products))
        .route("/brand-distribution", get(brand_distribution))
        .route("/price-distribution", get(price_distribution))
}

/// Listing endpoints mounted next to the analytics ones.
pub fn catalog_router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(categories))
        .route("/brands", get(brands))
}

#[instrument(name = "GET /analytics/overview", skip(app_state))]
async fn overview(State(app_state): State<AppState>) -> Result<Json<CatalogOverview>, ApiError> {
    let overview = app_state.catalog.overview().await?;
    Ok(Json(overview))
}

#[derive(Debug, Clone, Deserialize)]
struct TopProductsQuery {
    limit: Option<u32>,
    sort_by: Option<String>,
}

#[derive(Debug, Serialize)]
struct TopProductsResponse {
    top_products: Vec<Part>,
    sort_by: String,
}

#[instrument(name = "GET /analytics/top-products", skip(app_state, query))]
async fn top_products(
    State(app_state): State<AppState>,
    query: Result<Query<TopProductsQuery>, QueryRejection>,
) -> Result<Json<TopProductsResponse>, ApiError> {
    let Query(query) = query?;
    let limit = query.limit.unwrap_or(DEFAULT_TOP_LIMIT);
    if !(1..=MAX_TOP_LIMIT).contains(&limit) {
        return Err(ApiError::bad_request(format!(
            "limit must be between 1 and {MAX_TOP_LIMIT}"
        )));
    }
    let sort = match query.sort_by.as_deref() {
        Some(sort_by) => TopSort::from_str(sort_by).map_err(|_| {
            ApiError::bad_request("sort_by must be one of price, discount, category")
        })?,
        None => TopSort::default(),
    };

    let top_products = app_state.catalog.top_parts(sort, limit).await?;

    Ok(Json(TopProductsResponse {
        top_products,
        sort_by: sort.to_string(),
    }))
}

#[derive(Debug, Serialize)]
struct BrandDistributionResponse {
    brand_distribution: Vec<BrandCount>,
}

#[instrument(name = "GET /analytics/brand-distribution", skip(app_state))]
async fn brand_distribution(
    State(app_state): State<AppState>,
) -> Result<Json<BrandDistributionResponse>, ApiError> {
    let brand_distribution = app_state.catalog.brand_distribution().await?;
    Ok(Json(BrandDistributionResponse { brand_distribution }))
}

#[derive(Debug, Serialize)]
struct PriceDistributionResponse {
    price_distribution: Vec<PriceBucket>,
}

#[instrument(name = "GET /analytics/price-distribution", skip(app_state))]
async fn price_distribution(
    State(app_state): State<AppState>,
) -> Result<Json<PriceDistributionResponse>, ApiError> {
    let price_distribution = app_state.catalog.price_distribution().await?;
    Ok(Json(PriceDistributionResponse { price_distribution }))
}

#[derive(Debug, Serialize)]
struct CategoriesResponse {
    categories: Vec<String>,
}

#[instrument(name = "GET /categories", skip(app_state))]
async fn categories(State(app_state): State<AppState>) -> Result<Json<CategoriesResponse>, ApiError> {
    let categories = app_state.catalog.categories().await?;
    Ok(Json(CategoriesResponse { categories }))
}

#[derive(Debug, Serialize)]
struct BrandsResponse {
    brands: Vec<String>,
}

#[instrument(name = "GET /brands", skip(app_state))]
async fn brands(State(app_state): State<AppState>) -> Result<Json<BrandsResponse>, ApiError> {
    let brands = app_state.catalog.brands().await?;
    Ok(Json(BrandsResponse { brands }))
}
