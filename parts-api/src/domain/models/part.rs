//! Catalog part model and its SQLite row mapping.

use std::collections::BTreeSet;

use serde::Serialize;
use sqlx::FromRow;

/// Column list shared by every query that hydrates a [`PartRow`].
pub const PART_COLUMNS: &str = "sku, name, brand, category, subcategory, regular_price, \
     sale_price, in_stock, stock_status, description, compatible_models, specifications, \
     product_url, main_image_url, scraped_at";

/// A sellable part as exposed by the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Part {
    pub sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub regular_price: Option<f64>,
    pub sale_price: Option<f64>,
    /// Derived from the two prices, never stored.
    pub discount_percent: Option<f64>,
    pub in_stock: bool,
    pub stock_status: Option<String>,
    pub description: Option<String>,
    pub compatible_models: BTreeSet<String>,
    pub specifications: Option<String>,
    pub product_url: Option<String>,
    pub main_image_url: Option<String>,
    pub scraped_at: Option<String>,
}

impl Part {
    /// Price a customer pays today: the sale price when present.
    pub fn effective_price(&self) -> Option<f64> {
        self.sale_price.or(self.regular_price)
    }

    pub fn stock_label(&self) -> &str {
        match (&self.stock_status, self.in_stock) {
            (Some(status), _) if !status.trim().is_empty() => status,
            (_, true) => "In Stock",
            (_, false) => "Out of Stock",
        }
    }
}

/// Raw `parts` row as stored in SQLite.
#[derive(Debug, Clone, FromRow)]
pub struct PartRow {
    pub sku: String,
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub regular_price: Option<f64>,
    pub sale_price: Option<f64>,
    pub in_stock: bool,
    pub stock_status: Option<String>,
    pub description: Option<String>,
    pub compatible_models: Option<String>,
    pub specifications: Option<String>,
    pub product_url: Option<String>,
    pub main_image_url: Option<String>,
    pub scraped_at: Option<String>,
}

impl From<PartRow> for Part {
    fn from(row: PartRow) -> Self {
        Self {
            discount_percent: discount_percent(row.regular_price, row.sale_price),
            compatible_models: row
                .compatible_models
                .as_deref()
                .map(parse_compatible_models)
                .unwrap_or_default(),
            sku: row.sku,
            name: row.name,
            brand: row.brand,
            category: row.category,
            subcategory: row.subcategory,
            regular_price: row.regular_price,
            sale_price: row.sale_price,
            in_stock: row.in_stock,
            stock_status: row.stock_status,
            description: row.description,
            specifications: row.specifications,
            product_url: row.product_url,
            main_image_url: row.main_image_url,
            scraped_at: row.scraped_at,
        }
    }
}

/// `(regular - sale) / regular` as a percentage rounded to one decimal.
pub fn discount_percent(regular: Option<f64>, sale: Option<f64>) -> Option<f64> {
    match (regular, sale) {
        (Some(regular), Some(sale)) if regular > 0.0 && sale <= regular => {
            Some(((regular - sale) / regular * 1000.0).round() / 10.0)
        }
        _ => None,
    }
}

/// Compatible models are stored as one delimited string.
pub fn parse_compatible_models(raw: &str) -> BTreeSet<String> {
    raw.split([',', ';', '\n'])
        .map(str::trim)
        .filter(|model| !model.is_empty())
        .map(str::to_string)
        .collect()
}

/// Decode a little-endian `f32` embedding blob. Returns `None` for blobs
/// whose length is not a multiple of four.
pub fn decode_embedding(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.is_empty() || blob.len() % 4 != 0 {
        return None;
    }

    Some(
        blob.chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}

pub fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|value| value.to_le_bytes()).collect()
}
