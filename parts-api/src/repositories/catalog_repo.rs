use async_trait::async_trait;
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use strum::{Display, EnumString};

use crate::domain::{
    models::{Part, PartRow, PART_COLUMNS},
    search::{repository::push_filter_predicates, PartFilter},
};

use super::repo_error::RepositoryError;

/// Filters for browsing the catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    pub filter: PartFilter,
    /// Substring of the name or description.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TopSort {
    #[default]
    Price,
    Discount,
    Category,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandCount {
    pub brand: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBucket {
    pub price_range: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogOverview {
    pub total_products: i64,
    pub total_brands: i64,
    pub total_categories: i64,
    pub in_stock_count: i64,
    pub in_stock_percentage: f64,
    pub avg_price: f64,
    pub price_range: PriceRange,
    pub category_distribution: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogCounts {
    pub parts: i64,
    pub embeddings: i64,
}

pub const PRICE_BUCKETS: [&str; 5] = ["Under $25", "$25-$50", "$50-$100", "$100-$200", "Over $200"];

#[async_trait]
pub trait CatalogRepository {
    async fn list_parts(
        &self,
        query: &CatalogQuery,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Part>, i64), RepositoryError>;
    async fn get_part(&self, sku: &str) -> Result<Part, RepositoryError>;
    async fn parts_by_category(&self, category: &str, limit: u32) -> Result<Vec<Part>, RepositoryError>;
    async fn parts_by_brand(&self, brand: &str, limit: u32) -> Result<Vec<Part>, RepositoryError>;
    async fn overview(&self) -> Result<CatalogOverview, RepositoryError>;
    async fn top_parts(&self, sort: TopSort, limit: u32) -> Result<Vec<Part>, RepositoryError>;
    async fn categories(&self) -> Result<Vec<String>, RepositoryError>;
    async fn brands(&self) -> Result<Vec<String>, RepositoryError>;
    async fn brand_distribution(&self) -> Result<Vec<BrandCount>, RepositoryError>;
    async fn price_distribution(&self) -> Result<Vec<PriceBucket>, RepositoryError>;
    async fn counts(&self) -> Result<CatalogCounts, RepositoryError>;
}

pub struct CatalogRepositoryImpl {
    pool: SqlitePool,
}

impl CatalogRepositoryImpl {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn push_catalog_predicates<'a>(qb: &mut QueryBuilder<'a, Sqlite>, query: &'a CatalogQuery) {
    push_filter_predicates(qb, &query.filter);
    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let search = search.to_lowercase();
        qb.push(" AND (instr(LOWER(name), ")
            .push_bind(search.clone())
            .push(") > 0 OR instr(LOWER(COALESCE(description, '')), ")
            .push_bind(search)
            .push(") > 0)");
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[async_trait]
impl CatalogRepository for CatalogRepositoryImpl {
    async fn list_parts(
        &self,
        query: &CatalogQuery,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Part>, i64), RepositoryError> {
        if query.filter.is_contradictory() {
            return Ok((vec![], 0));
        }

        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM parts WHERE 1 = 1");
        push_catalog_predicates(&mut count_qb, query);
        let (total,): (i64,) = count_qb.build_query_as().fetch_one(&self.pool).await?;

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {PART_COLUMNS} FROM parts WHERE 1 = 1"));
        push_catalog_predicates(&mut qb, query);
        let offset = i64::from(page.saturating_sub(1)) * i64::from(limit);
        qb.push(" ORDER BY name ASC, sku ASC LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(offset);

        let rows: Vec<PartRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok((rows.into_iter().map(Part::from).collect(), total))
    }

    async fn get_part(&self, sku: &str) -> Result<Part, RepositoryError> {
        let sql = format!("SELECT {PART_COLUMNS} FROM parts WHERE sku = ? COLLATE NOCASE LIMIT 1");
        let row: Option<PartRow> = sqlx::query_as(&sql)
            .bind(sku.trim())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Part::from)
            .ok_or_else(|| RepositoryError::NotFound(format!("product {sku}")))
    }

    async fn parts_by_category(&self, category: &str, limit: u32) -> Result<Vec<Part>, RepositoryError> {
        let sql = format!(
            "SELECT {PART_COLUMNS} FROM parts WHERE LOWER(category) = LOWER(?) ORDER BY name ASC, sku ASC LIMIT ?"
        );
        let rows: Vec<PartRow> = sqlx::query_as(&sql)
            .bind(category.trim())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Part::from).collect())
    }

    async fn parts_by_brand(&self, brand: &str, limit: u32) -> Result<Vec<Part>, RepositoryError> {
        let sql = format!(
            "SELECT {PART_COLUMNS} FROM parts WHERE LOWER(brand) = LOWER(?) ORDER BY name ASC, sku ASC LIMIT ?"
        );
        let rows: Vec<PartRow> = sqlx::query_as(&sql)
            .bind(brand.trim())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Part::from).collect())
    }

    async fn overview(&self) -> Result<CatalogOverview, RepositoryError> {
        let (total_products, in_stock_count, total_brands, total_categories): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(in_stock), 0),
                    COUNT(DISTINCT brand),
                    COUNT(DISTINCT category)
                FROM parts
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        let (avg_price, min_price, max_price): (Option<f64>, Option<f64>, Option<f64>) =
            sqlx::query_as(
                r#"
                SELECT AVG(price), MIN(price), MAX(price)
                FROM (SELECT COALESCE(sale_price, regular_price) AS price FROM parts)
                WHERE price IS NOT NULL AND price > 0
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        let category_distribution: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT category, COUNT(*) AS count
            FROM parts
            WHERE category IS NOT NULL
            GROUP BY category
            ORDER BY count DESC, category ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let in_stock_percentage = if total_products > 0 {
            round_to(in_stock_count as f64 / total_products as f64 * 100.0, 1)
        } else {
            0.0
        };

        Ok(CatalogOverview {
            total_products,
            total_brands,
            total_categories,
            in_stock_count,
            in_stock_percentage,
            avg_price: round_to(avg_price.unwrap_or_default(), 2),
            price_range: PriceRange {
                min: min_price.unwrap_or_default(),
                max: max_price.unwrap_or_default(),
            },
            category_distribution: category_distribution
                .into_iter()
                .map(|(category, count)| CategoryCount { category, count })
                .collect(),
        })
    }

    async fn top_parts(&self, sort: TopSort, limit: u32) -> Result<Vec<Part>, RepositoryError> {
        let (predicate, order) = match sort {
            TopSort::Price => (
                "COALESCE(sale_price, regular_price) IS NOT NULL",
                "COALESCE(sale_price, regular_price) DESC",
            ),
            TopSort::Discount => (
                "regular_price > 0 AND sale_price IS NOT NULL AND sale_price < regular_price",
                "(regular_price - sale_price) / regular_price DESC",
            ),
            TopSort::Category => ("category IS NOT NULL", "category ASC, name ASC"),
        };

        let sql = format!(
            "SELECT {PART_COLUMNS} FROM parts WHERE {predicate} ORDER BY {order}, sku ASC LIMIT ?"
        );
        let rows: Vec<PartRow> = sqlx::query_as(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Part::from).collect())
    }

    async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT category FROM parts WHERE category IS NOT NULL ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(category,)| category).collect())
    }

    async fn brands(&self) -> Result<Vec<String>, RepositoryError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT brand FROM parts WHERE brand IS NOT NULL ORDER BY brand")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(brand,)| brand).collect())
    }

    async fn brand_distribution(&self) -> Result<Vec<BrandCount>, RepositoryError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT brand, COUNT(*) AS count
            FROM parts
            WHERE brand IS NOT NULL
            GROUP BY brand
            ORDER BY count DESC, brand ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(brand, count)| BrandCount { brand, count })
            .collect())
    }

    async fn price_distribution(&self) -> Result<Vec<PriceBucket>, RepositoryError> {
        let counts: (i64, i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN price < 25 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN price >= 25 AND price < 50 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN price >= 50 AND price < 100 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN price >= 100 AND price < 200 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN price >= 200 THEN 1 ELSE 0 END), 0)
            FROM (SELECT COALESCE(sale_price, regular_price) AS price FROM parts)
            WHERE price IS NOT NULL
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let (a, b, c, d, e) = counts;
        Ok(PRICE_BUCKETS
            .iter()
            .zip([a, b, c, d, e])
            .map(|(label, count)| PriceBucket {
                price_range: label.to_string(),
                count,
            })
            .collect())
    }

    async fn counts(&self) -> Result<CatalogCounts, RepositoryError> {
        let (parts, embeddings): (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COUNT(embedding) FROM parts")
                .fetch_one(&self.pool)
                .await?;

        Ok(CatalogCounts { parts, embeddings })
    }
}
