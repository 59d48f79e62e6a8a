//! Turns free-text queries into a [`QueryIntent`] with the language model.

use std::{sync::Arc, time::Duration};

use serde::Deserialize;
use serde_json::Value;

use super::prompts::{intent_system_prompt, INTENT_FIELDS};
use super::traits::{ChatCompleter, Result, SearchError};
use super::types::{CompletionRequest, IntentParse, QueryIntent};
use crate::domain::models::ConversationTurn;

#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 300,
            timeout: Duration::from_millis(900),
        }
    }
}

pub struct QueryInterpreter {
    completer: Arc<dyn ChatCompleter>,
    system_prompt: String,
    config: InterpreterConfig,
}

impl QueryInterpreter {
    /// `categories` are the store's category names, offered to the model as
    /// its vocabulary.
    pub fn new(
        completer: Arc<dyn ChatCompleter>,
        categories: &[String],
        config: InterpreterConfig,
    ) -> Self {
        Self {
            completer,
            system_prompt: intent_system_prompt(categories),
            config,
        }
    }

    /// Fails with [`SearchError::IntentUnavailable`] when the model cannot
    /// be reached in time.
    pub async fn interpret(&self, raw_query: &str) -> Result<IntentParse> {
        let request = CompletionRequest {
            system_prompt: self.system_prompt.clone(),
            messages: vec![ConversationTurn::user(raw_query)],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let text = tokio::time::timeout(self.config.timeout, self.completer.complete(&request))
            .await
            .map_err(|_| SearchError::IntentUnavailable("interpreter timed out".into()))?
            .map_err(|e| SearchError::IntentUnavailable(e.to_string()))?;

        let parsed = parse_intent(raw_query, &text);
        match &parsed {
            IntentParse::Intent(intent) => tracing::debug!(?intent, "Parsed query intent"),
            IntentParse::Unstructured(answer) => tracing::warn!(
                query = raw_query,
                answer = %answer,
                "Interpreter answered without a JSON intent"
            ),
        }
        Ok(parsed)
    }
}

#[derive(Debug, Deserialize)]
struct RawIntent {
    part_type: Option<String>,
    brand: Option<String>,
    model_number: Option<String>,
    category: Option<String>,
    price_min: Option<RawPrice>,
    price_max: Option<RawPrice>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(f64),
    Text(String),
}

impl RawPrice {
    fn value(self) -> Option<f64> {
        let value = match self {
            RawPrice::Number(n) => n,
            RawPrice::Text(text) => text.trim().trim_start_matches('$').parse().ok()?,
        };
        (value.is_finite() && value >= 0.0).then_some(value)
    }
}

/// Strict parse of the model's answer.
///
/// Accepts one JSON object, optionally wrapped in a single fenced code block,
/// whose keys all belong to [`INTENT_FIELDS`].
pub fn parse_intent(raw_query: &str, text: &str) -> IntentParse {
    let unstructured = || IntentParse::Unstructured(text.to_string());

    let Some(body) = strip_code_fence(text) else {
        return unstructured();
    };
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return unstructured();
    };
    if map.keys().any(|key| !INTENT_FIELDS.contains(&key.as_str())) {
        return unstructured();
    }
    let Ok(raw) = serde_json::from_value::<RawIntent>(Value::Object(map)) else {
        return unstructured();
    };

    IntentParse::Intent(QueryIntent {
        raw_query: raw_query.to_string(),
        part_type: clean(raw.part_type),
        brand: clean(raw.brand),
        model_number: clean(raw.model_number),
        category: clean(raw.category),
        price_min: raw.price_min.and_then(RawPrice::value),
        price_max: raw.price_max.and_then(RawPrice::value),
        in_stock: None,
    })
}

fn strip_code_fence(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return Some(trimmed);
    };
    // drop the info string, e.g. ```json
    let (_, body) = rest.split_once('\n')?;
    let body = body.trim_end().strip_suffix("```")?;
    (!body.contains("```")).then_some(body.trim())
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
}
