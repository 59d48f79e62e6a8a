//! Trait definitions for search domain abstractions.
//!
//! These traits enable dependency injection and easy testing through mocking.

use async_trait::async_trait;

use super::types::{CompletionRequest, PartFilter};
use crate::domain::models::Part;

/// Error type for search operations.
///
/// Only [`SearchError::StoreUnavailable`] is allowed to fail a request, the
/// other variants are recovered inside the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Product store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("Query intent unavailable: {0}")]
    IntentUnavailable(String),

    #[error("Response composition unavailable: {0}")]
    CompositionUnavailable(String),
}

impl From<sqlx::Error> for SearchError {
    fn from(e: sqlx::Error) -> Self {
        SearchError::StoreUnavailable(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;

/// Failure of a chat-completion provider.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompletionError {
    /// Worth one more attempt (timeouts, connection resets, 5xx, 429).
    #[error("transient completion failure: {0}")]
    Transient(String),

    #[error("completion failed: {0}")]
    Failed(String),
}

impl CompletionError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CompletionError::Transient(_))
    }
}

/// Trait for text embedding generation.
///
/// Abstracts the embedding provider (OpenAI, mocks) for easy testing.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for a single text.
    ///
    /// Fails with [`SearchError::EmbeddingUnavailable`].
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Dimensions the provider is expected to produce, used to sanity check
    /// the index at startup.
    fn dimensions(&self) -> usize;
}

/// Trait for chat-completion providers.
#[async_trait]
pub trait ChatCompleter: Send + Sync {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> std::result::Result<String, CompletionError>;
}

/// Read access to the parts table used by the search pipeline.
///
/// All failures surface as [`SearchError::StoreUnavailable`].
#[async_trait]
pub trait PartRepository: Send + Sync {
    /// Parts matching every predicate of `filter`, ordered by SKU.
    async fn filter_parts(&self, filter: &PartFilter, limit: usize) -> Result<Vec<Part>>;

    /// Parts whose SKU, name or description contains `phrase` (case-insensitive).
    ///
    /// Exact SKU matches come first, then name matches, then description-only
    /// matches, each group ordered by name.
    async fn search_phrase(&self, phrase: &str, limit: usize) -> Result<Vec<Part>>;

    /// Parts containing at least one of `terms`, most matched terms first.
    async fn search_terms(&self, terms: &[String], limit: usize) -> Result<Vec<Part>>;

    /// Case-insensitive lookup by SKU.
    async fn get_by_sku(&self, sku: &str) -> Result<Option<Part>>;

    /// Parts for the given SKUs, in the order of `skus`. Unknown SKUs are skipped.
    async fn get_by_skus(&self, skus: &[String]) -> Result<Vec<Part>>;

    /// Every stored `(sku, embedding)` pair in table scan order.
    async fn load_embeddings(&self) -> Result<Vec<(String, Vec<f32>)>>;

    /// In-stock parts of `brand`, excluding `exclude`.
    async fn find_upsells(
        &self,
        brand: &str,
        exclude: &[String],
        limit: usize,
    ) -> Result<Vec<Part>>;

    /// Distinct category names, alphabetical.
    async fn categories(&self) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Verify traits are object-safe (can be used as trait objects)
    fn _assert_embedder_object_safe(_: &dyn Embedder) {}
    fn _assert_completer_object_safe(_: &dyn ChatCompleter) {}
    fn _assert_repository_object_safe(_: &dyn PartRepository) {}

    #[test]
    fn sqlx_errors_are_store_failures() {
        let err: SearchError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, SearchError::StoreUnavailable(_)));
    }

    #[test]
    fn only_transient_completion_errors_are_retryable() {
        assert!(CompletionError::Transient("timeout".into()).is_transient());
        assert!(!CompletionError::Failed("401".into()).is_transient());
    }
}
