//! Natural-language responses over ranked results, with a templated
//! fallback whenever the language model is unavailable.

use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::prompts::{
    format_parts, format_price, format_results, format_upsells, COMPARISON_SYSTEM_PROMPT,
    NO_RESULTS_SYSTEM_PROMPT, RESPONSE_SYSTEM_PROMPT,
};
use super::traits::{ChatCompleter, CompletionError, PartRepository, SearchError};
use super::types::{CompletionRequest, Composition, RankedResult};
use crate::domain::models::{ConversationTurn, Part};

/// Result lines included in the templated summary.
const FALLBACK_RESULT_LINES: usize = 3;

#[derive(Debug, Clone)]
pub struct ComposerConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Applies to each attempt separately, cut short by the request deadline.
    pub timeout: Duration,
    /// Extra attempts after a transient failure.
    pub max_retries: u32,
    pub upsell_count: usize,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 500,
            timeout: Duration::from_millis(1200),
            max_retries: 1,
            upsell_count: 2,
        }
    }
}

pub struct ResponseComposer {
    completer: Arc<dyn ChatCompleter>,
    repository: Arc<dyn PartRepository>,
    config: ComposerConfig,
}

impl ResponseComposer {
    pub fn new(
        completer: Arc<dyn ChatCompleter>,
        repository: Arc<dyn PartRepository>,
        config: ComposerConfig,
    ) -> Self {
        Self {
            completer,
            repository,
            config,
        }
    }

    /// Summarize `results` for `query`. Never fails: when the model is
    /// unavailable, or `deadline` passes first, the templated summary is
    /// returned with `degraded` set.
    pub async fn compose(
        &self,
        query: &str,
        results: &[RankedResult],
        history: &[ConversationTurn],
        deadline: Instant,
    ) -> Composition {
        let suggestions = self.upsells(results).await;

        let system_prompt = if results.is_empty() {
            NO_RESULTS_SYSTEM_PROMPT
        } else {
            RESPONSE_SYSTEM_PROMPT
        };
        let context = format!(
            "Customer query: {query}\n\nProducts found:\n{}\nSuggested add-ons:\n{}",
            format_results(results),
            format_upsells(&suggestions)
        );
        let mut messages = history.to_vec();
        messages.push(ConversationTurn::user(context));

        let request = CompletionRequest {
            system_prompt: system_prompt.to_string(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        match self.complete_with_retry(&request, deadline).await {
            Ok(text) => Composition {
                text,
                suggestions,
                degraded: false,
            },
            Err(e) => {
                tracing::warn!(error = %e, query, "Response composition unavailable, using template");
                Composition {
                    text: templated_summary(query, results, &suggestions),
                    suggestions,
                    degraded: true,
                }
            }
        }
    }

    /// Side-by-side comparison of `parts`.
    pub async fn compare(&self, parts: &[Part], deadline: Instant) -> Composition {
        let request = CompletionRequest {
            system_prompt: COMPARISON_SYSTEM_PROMPT.to_string(),
            messages: vec![ConversationTurn::user(format!(
                "Compare these products:\n{}",
                format_parts(parts)
            ))],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        match self.complete_with_retry(&request, deadline).await {
            Ok(text) => Composition {
                text,
                suggestions: vec![],
                degraded: false,
            },
            Err(e) => {
                tracing::warn!(error = %e, parts = parts.len(), "Comparison unavailable, using template");
                Composition {
                    text: templated_comparison(parts),
                    suggestions: vec![],
                    degraded: true,
                }
            }
        }
    }

    async fn complete_with_retry(
        &self,
        request: &CompletionRequest,
        deadline: Instant,
    ) -> Result<String, SearchError> {
        let mut attempt = 0;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(SearchError::CompositionUnavailable(
                    "request deadline reached".into(),
                ));
            }

            let outcome = tokio::time::timeout(
                remaining.min(self.config.timeout),
                self.completer.complete(request),
            )
            .await
            .unwrap_or_else(|_| Err(CompletionError::Transient("completion timed out".into())));

            match outcome {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::debug!(error = %e, attempt, "Retrying completion");
                }
                Err(e) => return Err(SearchError::CompositionUnavailable(e.to_string())),
            }
        }
    }

    /// In-stock parts of the top result's brand that are not already listed.
    async fn upsells(&self, results: &[RankedResult]) -> Vec<Part> {
        let Some(brand) = results.first().and_then(|r| r.part.brand.as_deref()) else {
            return vec![];
        };
        if self.config.upsell_count == 0 {
            return vec![];
        }

        let exclude: Vec<String> = results.iter().map(|r| r.part.sku.clone()).collect();
        match self
            .repository
            .find_upsells(brand, &exclude, self.config.upsell_count)
            .await
        {
            Ok(parts) => parts,
            Err(e) => {
                tracing::warn!(error = %e, brand, "Upsell lookup failed");
                vec![]
            }
        }
    }
}

fn result_line(part: &Part) -> String {
    format!(
        "- {} ({}) - {} - {}",
        part.name,
        part.sku,
        format_price(part),
        part.stock_label()
    )
}

/// `Found N results for '<query>'.` followed by the top result lines and
/// any suggestions.
pub fn templated_summary(query: &str, results: &[RankedResult], suggestions: &[Part]) -> String {
    let mut text = format!("Found {} results for '{}'.", results.len(), query);
    for result in results.iter().take(FALLBACK_RESULT_LINES) {
        let _ = write!(text, "\n{}", result_line(&result.part));
    }
    if !suggestions.is_empty() {
        text.push_str("\n\nCustomers also purchased:");
        for part in suggestions {
            let _ = write!(text, "\n- {} ({}) {}", part.name, part.sku, format_price(part));
        }
    }
    text
}

pub fn templated_comparison(parts: &[Part]) -> String {
    let mut text = format!("Comparing {} products:", parts.len());
    for part in parts {
        let _ = write!(
            text,
            "\n- {} ({}): {}, {}, {}",
            part.name,
            part.sku,
            format_price(part),
            part.brand.as_deref().unwrap_or("Unknown brand"),
            part.stock_label()
        );
    }

    let cheapest = parts
        .iter()
        .filter_map(|p| p.effective_price().map(|price| (p, price)))
        .min_by(|(_, a), (_, b)| a.total_cmp(b));
    if let Some((part, _)) = cheapest {
        let _ = write!(text, "\n\nLowest price: {} ({}).", part.name, part.sku);
    }
    text
}
