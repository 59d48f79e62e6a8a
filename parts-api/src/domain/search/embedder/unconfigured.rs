use async_trait::async_trait;

use crate::domain::search::traits::{Embedder, Result, SearchError};

/// Stand-in used when no API key is configured. Every call fails, so the
/// ranker falls back to filters and keywords.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredEmbedder {
    dimensions: usize,
}

impl UnconfiguredEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl Embedder for UnconfiguredEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(SearchError::EmbeddingUnavailable(
            "no embedding provider configured".into(),
        ))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
