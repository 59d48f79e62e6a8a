//! Hybrid ranking: structured filters from the intent merged with
//! embedding similarity for the raw query.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use super::index::{EmbeddingIndex, SimilarityHit};
use super::traits::{Embedder, PartRepository, Result, SearchError};
use super::types::{MatchReason, PartFilter, QueryIntent, RankedResult};
use crate::domain::models::Part;

#[derive(Debug, Clone)]
pub struct RankerConfig {
    /// Upper bound on rows pulled from the store by the structured filter.
    pub max_filter_rows: usize,
    pub embedding_timeout: Duration,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            max_filter_rows: 500,
            embedding_timeout: Duration::from_millis(600),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ranking {
    pub results: Vec<RankedResult>,
    /// The similarity stage could not run.
    pub embedding_degraded: bool,
}

pub struct HybridRanker {
    repository: Arc<dyn PartRepository>,
    embedder: Arc<dyn Embedder>,
    index: Arc<EmbeddingIndex>,
    config: RankerConfig,
}

impl HybridRanker {
    pub fn new(
        repository: Arc<dyn PartRepository>,
        embedder: Arc<dyn Embedder>,
        index: Arc<EmbeddingIndex>,
        config: RankerConfig,
    ) -> Self {
        Self {
            repository,
            embedder,
            index,
            config,
        }
    }

    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    /// Rank parts for `intent`, returning at most `top_k` results.
    ///
    /// Only store failures are returned as errors.
    pub async fn rank(&self, intent: &QueryIntent, top_k: usize) -> Result<Ranking> {
        let query = intent.raw_query.trim();
        if query.is_empty() || top_k == 0 {
            return Ok(Ranking {
                results: vec![],
                embedding_degraded: false,
            });
        }

        let pinned = self.repository.get_by_sku(query).await?;
        let filter = PartFilter::from_intent(intent);
        let filtered = match &filter {
            Some(filter) => {
                self.repository
                    .filter_parts(filter, self.config.max_filter_rows)
                    .await?
            }
            None => vec![],
        };

        let mut structured: Vec<Part> = Vec::with_capacity(filtered.len() + 1);
        structured.extend(pinned.clone());
        structured.extend(
            filtered
                .into_iter()
                .filter(|p| pinned.as_ref().map_or(true, |pin| pin.sku != p.sku)),
        );

        let eligible: Option<HashSet<String>> = filter
            .is_some()
            .then(|| structured.iter().map(|p| p.sku.clone()).collect());

        let (hits, embedding_degraded) = match &eligible {
            // constrained query with no candidates, nothing to score
            Some(eligible) if eligible.is_empty() => (vec![], false),
            _ => match self.similarity(query, top_k, eligible.as_ref()).await {
                Ok(hits) => (hits, false),
                Err(e) => {
                    tracing::warn!(error = %e, query, "Similarity stage unavailable, using filters only");
                    (vec![], true)
                }
            },
        };

        let mut results = self
            .merge(pinned.map(|p| p.sku), structured, hits)
            .await?;

        if results.is_empty() && filter.is_none() && embedding_degraded {
            results = self.keyword_fallback(query, top_k).await?;
        }

        results.truncate(top_k);
        Ok(Ranking {
            results,
            embedding_degraded,
        })
    }

    async fn similarity(
        &self,
        query: &str,
        top_k: usize,
        eligible: Option<&HashSet<String>>,
    ) -> Result<Vec<SimilarityHit>> {
        if self.index.is_empty() {
            return Err(SearchError::EmbeddingUnavailable(
                "embedding index is empty".into(),
            ));
        }

        let vector = tokio::time::timeout(self.config.embedding_timeout, self.embedder.embed(query))
            .await
            .map_err(|_| SearchError::EmbeddingUnavailable("embedding timed out".into()))??;

        self.index.top_k(&vector, top_k, eligible)
    }

    /// Combine structured matches with similarity hits and order them:
    /// pinned SKU, `both`, `similarity`, then `filter` by SKU.
    async fn merge(
        &self,
        pinned: Option<String>,
        structured: Vec<Part>,
        hits: Vec<SimilarityHit>,
    ) -> Result<Vec<RankedResult>> {
        let scores: HashMap<&str, f32> = hits.iter().map(|h| (h.sku.as_str(), h.score)).collect();
        let hit_rank: HashMap<&str, usize> = hits
            .iter()
            .enumerate()
            .map(|(rank, h)| (h.sku.as_str(), rank))
            .collect();
        let structured_skus: HashSet<&str> = structured.iter().map(|p| p.sku.as_str()).collect();

        let similarity_only: Vec<String> = hits
            .iter()
            .filter(|h| !structured_skus.contains(h.sku.as_str()))
            .map(|h| h.sku.clone())
            .collect();
        let similarity_parts = self.repository.get_by_skus(&similarity_only).await?;

        let mut results: Vec<RankedResult> = structured
            .iter()
            .map(|part| {
                let similarity = scores.get(part.sku.as_str()).copied();
                RankedResult {
                    part: part.clone(),
                    similarity,
                    match_reason: if similarity.is_some() {
                        MatchReason::Both
                    } else {
                        MatchReason::Filter
                    },
                }
            })
            .chain(similarity_parts.into_iter().map(|part| RankedResult {
                similarity: scores.get(part.sku.as_str()).copied(),
                part,
                match_reason: MatchReason::Similarity,
            }))
            .collect();

        let is_pinned = |r: &RankedResult| pinned.as_deref() == Some(r.part.sku.as_str());
        results.sort_by(|a, b| {
            let group = |r: &RankedResult| match (is_pinned(r), r.match_reason) {
                (true, _) => 0,
                (false, MatchReason::Both) => 1,
                (false, MatchReason::Similarity) => 2,
                (false, MatchReason::Filter) => 3,
            };
            group(a).cmp(&group(b)).then_with(|| match (a.similarity, b.similarity) {
                (Some(sa), Some(sb)) => sb
                    .total_cmp(&sa)
                    .then_with(|| hit_rank[a.part.sku.as_str()].cmp(&hit_rank[b.part.sku.as_str()])),
                _ => a.part.sku.cmp(&b.part.sku),
            })
        });

        Ok(results)
    }

    /// Substring match over SKU, name and description: whole phrase first,
    /// then individual tokens.
    async fn keyword_fallback(&self, query: &str, limit: usize) -> Result<Vec<RankedResult>> {
        let mut parts = self.repository.search_phrase(query, limit).await?;
        if parts.is_empty() {
            let tokens: Vec<String> = query
                .split_whitespace()
                .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
                .filter(|t| t.len() >= 2)
                .collect();
            parts = self.repository.search_terms(&tokens, limit).await?;
        }

        tracing::debug!(query, matches = parts.len(), "Keyword fallback");
        Ok(parts
            .into_iter()
            .map(|part| RankedResult {
                part,
                similarity: None,
                match_reason: MatchReason::Filter,
            })
            .collect())
    }
}
