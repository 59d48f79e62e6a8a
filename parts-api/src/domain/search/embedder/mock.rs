//! Mock embedder implementation for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::search::traits::{Embedder, Result, SearchError};

/// Mock embedder that returns a configurable vector, fails, or stalls.
///
/// # Examples
///
/// ```ignore
/// let embedder = MockEmbedder::returning(vec![1.0, 0.0, 0.0, 0.0]);
/// let broken = MockEmbedder::failing(4);
/// let slow = MockEmbedder::returning(vec![1.0; 4]).with_delay(Duration::from_secs(5));
/// ```
#[derive(Clone)]
pub struct MockEmbedder {
    response: Option<Vec<f32>>,
    delay: Option<Duration>,
    call_count: Arc<AtomicUsize>,
    dimensions: usize,
}

impl MockEmbedder {
    /// Create a mock that always returns the same vector.
    pub fn returning(vector: Vec<f32>) -> Self {
        let dims = vector.len();
        Self {
            response: Some(vector),
            delay: None,
            call_count: Arc::new(AtomicUsize::new(0)),
            dimensions: dims,
        }
    }

    /// Create a mock whose every call fails.
    pub fn failing(dimensions: usize) -> Self {
        Self {
            response: None,
            delay: None,
            call_count: Arc::new(AtomicUsize::new(0)),
            dimensions,
        }
    }

    /// Sleep before answering, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Get the number of times `embed` was called.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response
            .clone()
            .ok_or_else(|| SearchError::EmbeddingUnavailable("mock failure".into()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_returns_fixed_vector() {
        let embedder = MockEmbedder::returning(vec![1.0, 2.0, 3.0]);

        assert_eq!(embedder.embed("test").await.unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(embedder.embed("another").await.unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(embedder.dimensions(), 3);
    }

    #[tokio::test]
    async fn mock_tracks_call_count_on_failure() {
        let embedder = MockEmbedder::failing(4);

        assert!(embedder.embed("a").await.is_err());
        assert!(embedder.embed("b").await.is_err());
        assert_eq!(embedder.call_count(), 2);
    }
}
