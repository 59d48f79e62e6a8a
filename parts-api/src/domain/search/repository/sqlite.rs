//! SQLite-backed part repository.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::domain::models::{decode_embedding, Part, PartRow, PART_COLUMNS};
use crate::domain::search::traits::{PartRepository, Result};
use crate::domain::search::types::PartFilter;

/// Reads the `parts` table with runtime-checked queries.
#[derive(Clone)]
pub struct SqlitePartRepository {
    pool: SqlitePool,
}

impl SqlitePartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn select_parts<'a>() -> QueryBuilder<'a, Sqlite> {
    QueryBuilder::new(format!("SELECT {PART_COLUMNS} FROM parts WHERE 1 = 1"))
}

/// Appends the filter's predicates as `AND` clauses.
pub(crate) fn push_filter_predicates<'a>(qb: &mut QueryBuilder<'a, Sqlite>, filter: &'a PartFilter) {
    if let Some(brand) = &filter.brand {
        qb.push(" AND LOWER(brand) = ").push_bind(brand.as_str());
    }
    if let Some(category) = &filter.category {
        qb.push(" AND LOWER(TRIM(category)) IN (")
            .push_bind(category.as_str())
            .push(", ")
            .push_bind(format!("{category} parts"))
            .push(")");
    }
    for term in &filter.name_terms {
        qb.push(" AND instr(LOWER(name), ")
            .push_bind(term.as_str())
            .push(") > 0");
    }
    if let Some(model) = &filter.model_number {
        qb.push(" AND instr(UPPER(REPLACE(COALESCE(compatible_models, ''), ' ', '')), ")
            .push_bind(model.as_str())
            .push(") > 0");
    }
    if let Some(min) = filter.price_min {
        qb.push(" AND COALESCE(sale_price, regular_price) >= ")
            .push_bind(min);
    }
    if let Some(max) = filter.price_max {
        qb.push(" AND COALESCE(sale_price, regular_price) <= ")
            .push_bind(max);
    }
    if let Some(in_stock) = filter.in_stock {
        qb.push(" AND in_stock = ").push_bind(in_stock);
    }
}

#[async_trait]
impl PartRepository for SqlitePartRepository {
    async fn filter_parts(&self, filter: &PartFilter, limit: usize) -> Result<Vec<Part>> {
        if filter.is_contradictory() {
            return Ok(vec![]);
        }

        let mut qb = select_parts();
        push_filter_predicates(&mut qb, filter);
        qb.push(" ORDER BY sku ASC LIMIT ").push_bind(limit as i64);

        let rows: Vec<PartRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Part::from).collect())
    }

    async fn search_phrase(&self, phrase: &str, limit: usize) -> Result<Vec<Part>> {
        let phrase = phrase.trim().to_lowercase();
        if phrase.is_empty() {
            return Ok(vec![]);
        }

        let sql = format!(
            r#"
            SELECT {PART_COLUMNS}
            FROM parts
            WHERE instr(LOWER(sku), ?) > 0
               OR instr(LOWER(name), ?) > 0
               OR instr(LOWER(COALESCE(description, '')), ?) > 0
            ORDER BY
                CASE
                    WHEN LOWER(sku) = ? THEN 0
                    WHEN instr(LOWER(name), ?) > 0 THEN 1
                    ELSE 2
                END,
                name ASC,
                sku ASC
            LIMIT ?
            "#
        );

        let rows: Vec<PartRow> = sqlx::query_as(&sql)
            .bind(&phrase)
            .bind(&phrase)
            .bind(&phrase)
            .bind(&phrase)
            .bind(&phrase)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Part::from).collect())
    }

    async fn search_terms(&self, terms: &[String], limit: usize) -> Result<Vec<Part>> {
        let terms: Vec<String> = terms
            .iter()
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return Ok(vec![]);
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {PART_COLUMNS} FROM (SELECT *, ("
        ));
        let mut hits = qb.separated(" + ");
        for term in &terms {
            hits.push("(instr(LOWER(sku || ' ' || name || ' ' || COALESCE(description, '')), ")
                .push_bind_unseparated(term.clone())
                .push_unseparated(") > 0)");
        }
        qb.push(") AS hits FROM parts) WHERE hits > 0 ORDER BY hits DESC, name ASC, sku ASC LIMIT ")
            .push_bind(limit as i64);

        let rows: Vec<PartRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Part::from).collect())
    }

    async fn get_by_sku(&self, sku: &str) -> Result<Option<Part>> {
        let sql = format!("SELECT {PART_COLUMNS} FROM parts WHERE sku = ? COLLATE NOCASE LIMIT 1");
        let row: Option<PartRow> = sqlx::query_as(&sql)
            .bind(sku.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Part::from))
    }

    async fn get_by_skus(&self, skus: &[String]) -> Result<Vec<Part>> {
        if skus.is_empty() {
            return Ok(vec![]);
        }

        let mut qb = select_parts();
        qb.push(" AND UPPER(sku) IN (");
        let mut list = qb.separated(", ");
        for sku in skus {
            list.push_bind(sku.trim().to_uppercase());
        }
        qb.push(")");

        let rows: Vec<PartRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        let mut by_sku: HashMap<String, Part> = rows
            .into_iter()
            .map(|row| (row.sku.to_uppercase(), Part::from(row)))
            .collect();

        Ok(skus
            .iter()
            .filter_map(|sku| by_sku.remove(&sku.trim().to_uppercase()))
            .collect())
    }

    async fn load_embeddings(&self) -> Result<Vec<(String, Vec<f32>)>> {
        let rows: Vec<(String, Vec<u8>)> = sqlx::query_as(
            "SELECT sku, embedding FROM parts WHERE embedding IS NOT NULL ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(sku, blob)| match decode_embedding(&blob) {
                Some(vector) => Some((sku, vector)),
                None => {
                    tracing::warn!(sku = %sku, bytes = blob.len(), "Skipping undecodable embedding");
                    None
                }
            })
            .collect())
    }

    async fn find_upsells(
        &self,
        brand: &str,
        exclude: &[String],
        limit: usize,
    ) -> Result<Vec<Part>> {
        let mut qb = select_parts();
        qb.push(" AND LOWER(brand) = ")
            .push_bind(brand.trim().to_lowercase())
            .push(" AND in_stock = 1");
        if !exclude.is_empty() {
            qb.push(" AND sku NOT IN (");
            let mut list = qb.separated(", ");
            for sku in exclude {
                list.push_bind(sku.clone());
            }
            qb.push(")");
        }
        qb.push(" ORDER BY sku ASC LIMIT ").push_bind(limit as i64);

        let rows: Vec<PartRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Part::from).collect())
    }

    async fn categories(&self) -> Result<Vec<String>> {
        let categories: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT category FROM parts WHERE category IS NOT NULL AND category != '' ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories.into_iter().map(|(c,)| c).collect())
    }
}
