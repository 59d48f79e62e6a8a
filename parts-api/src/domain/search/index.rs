//! In-memory nearest-neighbour index over precomputed part embeddings.

use std::collections::HashSet;

use super::traits::{Result, SearchError};

/// Cosine similarity of two vectors, clamped to `[-1, 1]`.
///
/// Mismatched lengths and zero-magnitude vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    cosine_with_norms(a, norm(a), b, norm(b))
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn cosine_with_norms(a: &[f32], norm_a: f32, b: &[f32], norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let score = dot / (norm_a * norm_b);
    if score.is_finite() {
        score.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone)]
struct IndexEntry {
    sku: String,
    vector: Vec<f32>,
    norm: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityHit {
    pub sku: String,
    pub score: f32,
}

/// Immutable list of `(sku, vector)` pairs, scored by linear scan.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
}

impl EmbeddingIndex {
    /// Build from store rows in scan order. The first row fixes the
    /// dimension, rows of any other length are skipped.
    pub fn build(rows: Vec<(String, Vec<f32>)>) -> Self {
        let dimensions = rows.first().map(|(_, v)| v.len()).unwrap_or(0);
        let mut entries = Vec::with_capacity(rows.len());

        for (sku, vector) in rows {
            if vector.len() != dimensions {
                tracing::warn!(
                    sku = %sku,
                    expected = dimensions,
                    actual = vector.len(),
                    "Skipping embedding with unexpected dimensions"
                );
                continue;
            }
            let norm = norm(&vector);
            entries.push(IndexEntry { sku, vector, norm });
        }

        Self {
            entries,
            dimensions,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Top `k` entries by cosine similarity to `query`, best first.
    ///
    /// Equal scores keep insertion order. When `eligible` is given only those
    /// SKUs are scored.
    pub fn top_k(
        &self,
        query: &[f32],
        k: usize,
        eligible: Option<&HashSet<String>>,
    ) -> Result<Vec<SimilarityHit>> {
        if query.len() != self.dimensions {
            return Err(SearchError::EmbeddingUnavailable(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let query_norm = norm(query);
        let mut hits: Vec<SimilarityHit> = self
            .entries
            .iter()
            .filter(|entry| eligible.map_or(true, |skus| skus.contains(&entry.sku)))
            .map(|entry| SimilarityHit {
                sku: entry.sku.clone(),
                score: cosine_with_norms(query, query_norm, &entry.vector, entry.norm),
            })
            .collect();

        // sort_by is stable
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }
}
