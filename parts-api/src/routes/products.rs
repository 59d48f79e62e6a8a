use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::ApiError;
use crate::{
    domain::{
        models::Part,
        search::{PartFilter, QueryIntent},
    },
    repositories::{CatalogQuery, CatalogRepository},
    AppState,
};

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;
const DEFAULT_GROUP_LIMIT: u32 = 50;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/:sku", get(get_product))
        .route("/category/:category", get(products_by_category))
        .route("/brand/:brand", get(products_by_brand))
}

fn check_limit(limit: u32) -> Result<u32, ApiError> {
    if (1..=MAX_PAGE_SIZE).contains(&limit) {
        Ok(limit)
    } else {
        Err(ApiError::bad_request(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ListProductsQuery {
    page: Option<u32>,
    limit: Option<u32>,
    brand: Option<String>,
    category: Option<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    in_stock: Option<bool>,
    search: Option<String>,
}

impl ListProductsQuery {
    fn to_catalog_query(&self) -> CatalogQuery {
        let intent = QueryIntent {
            brand: self.brand.clone(),
            category: self.category.clone(),
            price_min: self.min_price,
            price_max: self.max_price,
            in_stock: self.in_stock,
            ..QueryIntent::default()
        };

        CatalogQuery {
            filter: PartFilter::from_intent(&intent).unwrap_or_default(),
            search: self.search.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Pagination {
    page: u32,
    limit: u32,
    total_pages: i64,
    total_products: i64,
}

#[derive(Debug, Serialize)]
struct ProductListResponse {
    products: Vec<Part>,
    pagination: Pagination,
}

#[instrument(name = "GET /products", skip(app_state, query))]
async fn list_products(
    State(app_state): State<AppState>,
    query: Result<Query<ListProductsQuery>, QueryRejection>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let Query(query) = query?;
    let page = query.page.unwrap_or(1);
    if page == 0 {
        return Err(ApiError::bad_request("page must be at least 1"));
    }
    let limit = check_limit(query.limit.unwrap_or(DEFAULT_PAGE_SIZE))?;
    let negative = |price: Option<f64>| price.is_some_and(|p| p < 0.0);
    if negative(query.min_price) || negative(query.max_price) {
        return Err(ApiError::bad_request("prices must not be negative"));
    }

    let (products, total_products) = app_state
        .catalog
        .list_parts(&query.to_catalog_query(), page, limit)
        .await?;
    let limit_i64 = i64::from(limit);

    Ok(Json(ProductListResponse {
        products,
        pagination: Pagination {
            page,
            limit,
            total_pages: (total_products + limit_i64 - 1) / limit_i64,
            total_products,
        },
    }))
}

#[derive(Debug, Serialize)]
struct ProductResponse {
    product: Part,
}

#[instrument(name = "GET /products/:sku", skip(app_state))]
async fn get_product(
    State(app_state): State<AppState>,
    sku: Result<Path<String>, PathRejection>,
) -> Result<Json<ProductResponse>, ApiError> {
    let Path(sku) = sku?;
    let product = app_state.catalog.get_part(&sku).await?;

    Ok(Json(ProductResponse { product }))
}

#[derive(Debug, Clone, Deserialize)]
struct GroupQuery {
    limit: Option<u32>,
}

#[derive(Debug, Serialize)]
struct CategoryProductsResponse {
    category: String,
    count: usize,
    products: Vec<Part>,
}

#[instrument(name = "GET /products/category/:category", skip(app_state))]
async fn products_by_category(
    State(app_state): State<AppState>,
    Path(category): Path<String>,
    query: Result<Query<GroupQuery>, QueryRejection>,
) -> Result<Json<CategoryProductsResponse>, ApiError> {
    let Query(query) = query?;
    let limit = check_limit(query.limit.unwrap_or(DEFAULT_GROUP_LIMIT))?;

    let products = app_state.catalog.parts_by_category(&category, limit).await?;

    Ok(Json(CategoryProductsResponse {
        category,
        count: products.len(),
        products,
    }))
}

#[derive(Debug, Serialize)]
struct BrandProductsResponse {
    brand: String,
    count: usize,
    products: Vec<Part>,
}

#[instrument(name = "GET /products/brand/:brand", skip(app_state))]
async fn products_by_brand(
    State(app_state): State<AppState>,
    Path(brand): Path<String>,
    query: Result<Query<GroupQuery>, QueryRejection>,
) -> Result<Json<BrandProductsResponse>, ApiError> {
    let Query(query) = query?;
    let limit = check_limit(query.limit.unwrap_or(DEFAULT_GROUP_LIMIT))?;

    let products = app_state.catalog.parts_by_brand(&brand, limit).await?;

    Ok(Json(BrandProductsResponse {
        brand,
        count: products.len(),
        products,
    }))
}
