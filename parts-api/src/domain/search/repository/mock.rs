//! Mock repository implementation for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::domain::models::Part;
use crate::domain::search::traits::{PartRepository, Result, SearchError};
use crate::domain::search::types::PartFilter;

/// Mock part repository backed by an in-memory list.
///
/// Parts keep insertion order, which stands in for the table's scan order.
#[derive(Clone, Default)]
pub struct MockPartRepository {
    parts: Arc<RwLock<Vec<Part>>>,
    embeddings: Arc<RwLock<Vec<(String, Vec<f32>)>>>,
    unavailable: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockPartRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parts(self, parts: Vec<Part>) -> Self {
        self.parts.write().unwrap().extend(parts);
        self
    }

    pub fn with_embeddings(self, embeddings: Vec<(&str, Vec<f32>)>) -> Self {
        self.embeddings
            .write()
            .unwrap()
            .extend(embeddings.into_iter().map(|(sku, v)| (sku.to_string(), v)));
        self
    }

    /// Make every subsequent call fail with `StoreUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SearchError::StoreUnavailable("mock store is down".into()));
        }
        Ok(())
    }

    fn collect(&self, keep: impl Fn(&Part) -> bool) -> Vec<Part> {
        self.parts
            .read()
            .unwrap()
            .iter()
            .filter(|p| keep(p))
            .cloned()
            .collect()
    }
}

fn text_of(part: &Part) -> String {
    format!(
        "{} {} {}",
        part.sku,
        part.name,
        part.description.as_deref().unwrap_or_default()
    )
    .to_lowercase()
}

#[async_trait]
impl PartRepository for MockPartRepository {
    async fn filter_parts(&self, filter: &PartFilter, limit: usize) -> Result<Vec<Part>> {
        self.check()?;
        let mut parts = self.collect(|p| filter.matches(p));
        parts.sort_by(|a, b| a.sku.cmp(&b.sku));
        parts.truncate(limit);
        Ok(parts)
    }

    async fn search_phrase(&self, phrase: &str, limit: usize) -> Result<Vec<Part>> {
        self.check()?;
        let phrase = phrase.trim().to_lowercase();
        if phrase.is_empty() {
            return Ok(vec![]);
        }
        let mut parts = self.collect(|p| text_of(p).contains(&phrase));
        parts.sort_by_key(|p| {
            let rank = if p.sku.to_lowercase() == phrase {
                0
            } else if p.name.to_lowercase().contains(&phrase) {
                1
            } else {
                2
            };
            (rank, p.name.clone(), p.sku.clone())
        });
        parts.truncate(limit);
        Ok(parts)
    }

    async fn search_terms(&self, terms: &[String], limit: usize) -> Result<Vec<Part>> {
        self.check()?;
        let terms: Vec<String> = terms.iter().map(|t| t.to_lowercase()).collect();
        let mut scored: Vec<(usize, Part)> = self
            .collect(|_| true)
            .into_iter()
            .map(|p| {
                let text = text_of(&p);
                (terms.iter().filter(|t| text.contains(t.as_str())).count(), p)
            })
            .filter(|(hits, _)| *hits > 0)
            .collect();
        scored.sort_by(|(ha, a), (hb, b)| hb.cmp(ha).then(a.name.cmp(&b.name)));
        Ok(scored.into_iter().take(limit).map(|(_, p)| p).collect())
    }

    async fn get_by_sku(&self, sku: &str) -> Result<Option<Part>> {
        self.check()?;
        Ok(self
            .collect(|p| p.sku.eq_ignore_ascii_case(sku.trim()))
            .into_iter()
            .next())
    }

    async fn get_by_skus(&self, skus: &[String]) -> Result<Vec<Part>> {
        self.check()?;
        let parts = self.parts.read().unwrap();
        Ok(skus
            .iter()
            .filter_map(|sku| parts.iter().find(|p| p.sku.eq_ignore_ascii_case(sku)).cloned())
            .collect())
    }

    async fn load_embeddings(&self) -> Result<Vec<(String, Vec<f32>)>> {
        self.check()?;
        Ok(self.embeddings.read().unwrap().clone())
    }

    async fn find_upsells(
        &self,
        brand: &str,
        exclude: &[String],
        limit: usize,
    ) -> Result<Vec<Part>> {
        self.check()?;
        let mut parts = self.collect(|p| {
            p.in_stock
                && p.brand.as_deref().is_some_and(|b| b.eq_ignore_ascii_case(brand))
                && !exclude.contains(&p.sku)
        });
        parts.sort_by(|a, b| a.sku.cmp(&b.sku));
        parts.truncate(limit);
        Ok(parts)
    }

    async fn categories(&self) -> Result<Vec<String>> {
        self.check()?;
        let mut categories: Vec<String> = self
            .collect(|p| p.category.is_some())
            .into_iter()
            .filter_map(|p| p.category)
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }
}
