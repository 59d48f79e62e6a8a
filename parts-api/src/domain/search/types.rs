//! Core types for the search domain.

use serde::{Deserialize, Serialize};

use crate::domain::models::{ConversationTurn, Part};

/// Filters supplied explicitly by the caller of `/search`.
///
/// They override whatever the interpreter extracted from the query text.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SearchFilters {
    pub brand: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub in_stock: Option<bool>,
}

/// Structured interpretation of a free-text query.
///
/// Every field except `raw_query` is optional, absence means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryIntent {
    pub raw_query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
}

impl QueryIntent {
    /// Intent carrying only the query text.
    pub fn bare(raw_query: impl Into<String>) -> Self {
        Self {
            raw_query: raw_query.into(),
            ..Default::default()
        }
    }

    /// Overlay caller-supplied filters. Blank strings are ignored.
    pub fn with_filters(mut self, filters: &SearchFilters) -> Self {
        if let Some(brand) = non_blank(filters.brand.as_deref()) {
            self.brand = Some(brand);
        }
        if let Some(category) = non_blank(filters.category.as_deref()) {
            self.category = Some(category);
        }
        if filters.min_price.is_some() {
            self.price_min = filters.min_price;
        }
        if filters.max_price.is_some() {
            self.price_max = filters.max_price;
        }
        if filters.in_stock.is_some() {
            self.in_stock = filters.in_stock;
        }
        self
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Outcome of interpreting a query with the language model.
#[derive(Debug, Clone, PartialEq)]
pub enum IntentParse {
    Intent(QueryIntent),
    /// The model answered, but not with the expected JSON object.
    Unstructured(String),
}

/// Normalized store predicates derived from a [`QueryIntent`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartFilter {
    /// Lowercased brand, compared for equality.
    pub brand: Option<String>,
    /// Lowercased category with any trailing " parts" removed.
    pub category: Option<String>,
    /// Every term must appear in the part name.
    pub name_terms: Vec<String>,
    /// Uppercased, whitespace-free model number, matched as a substring.
    pub model_number: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub in_stock: Option<bool>,
}

impl PartFilter {
    /// Returns `None` when the intent has no predicates at all.
    pub fn from_intent(intent: &QueryIntent) -> Option<Self> {
        let filter = Self {
            brand: non_blank(intent.brand.as_deref()).map(|b| b.to_lowercase()),
            category: intent.category.as_deref().and_then(normalize_category),
            name_terms: intent
                .part_type
                .as_deref()
                .map(part_type_terms)
                .unwrap_or_default(),
            model_number: intent.model_number.as_deref().and_then(normalize_model_number),
            price_min: intent.price_min,
            price_max: intent.price_max,
            in_stock: intent.in_stock,
        };

        (filter != Self::default()).then_some(filter)
    }

    /// A price range that cannot match anything.
    pub fn is_contradictory(&self) -> bool {
        matches!((self.price_min, self.price_max), (Some(min), Some(max)) if min > max)
    }

    /// In-memory evaluation of the same predicates the store applies.
    #[cfg(test)]
    pub fn matches(&self, part: &Part) -> bool {
        if self.is_contradictory() {
            return false;
        }
        if let Some(brand) = &self.brand {
            if part.brand.as_deref().map(str::to_lowercase).as_ref() != Some(brand) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if part.category.as_deref().and_then(normalize_category).as_ref() != Some(category) {
                return false;
            }
        }
        let name = part.name.to_lowercase();
        if !self.name_terms.iter().all(|term| name.contains(term.as_str())) {
            return false;
        }
        if let Some(model) = &self.model_number {
            let fits = part
                .compatible_models
                .iter()
                .filter_map(|m| normalize_model_number(m))
                .any(|m| m.contains(model.as_str()));
            if !fits {
                return false;
            }
        }
        let price = part.effective_price();
        if let Some(min) = self.price_min {
            if !price.is_some_and(|p| p >= min) {
                return false;
            }
        }
        if let Some(max) = self.price_max {
            if !price.is_some_and(|p| p <= max) {
                return false;
            }
        }
        if let Some(in_stock) = self.in_stock {
            if part.in_stock != in_stock {
                return false;
            }
        }
        true
    }
}

/// "Refrigerator Parts" and "refrigerator" name the same category.
pub fn normalize_category(category: &str) -> Option<String> {
    let lowered = category.trim().to_lowercase();
    let stem = match lowered.strip_suffix("parts") {
        Some(rest) if rest.is_empty() || rest.ends_with(char::is_whitespace) => rest.trim_end(),
        _ => lowered.as_str(),
    };
    (!stem.is_empty()).then(|| stem.to_string())
}

/// Split a part type into name keywords, folding simple plurals.
pub fn part_type_terms(part_type: &str) -> Vec<String> {
    part_type
        .split_whitespace()
        .map(|word| {
            let word = word.to_lowercase();
            match word.strip_suffix('s') {
                Some(stem) if word.len() > 3 && !stem.ends_with('s') => stem.to_string(),
                _ => word,
            }
        })
        .collect()
}

pub fn normalize_model_number(model: &str) -> Option<String> {
    let normalized: String = model
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .flat_map(char::to_uppercase)
        .collect();
    (!normalized.is_empty()).then_some(normalized)
}

/// Why a part made it into the ranked list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchReason {
    Filter,
    Similarity,
    Both,
}

/// A part with its ranking metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    #[serde(flatten)]
    pub part: Part,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
    pub match_reason: MatchReason,
}

/// AI stage that could not contribute to a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Degradation {
    Intent,
    Embedding,
    Composition,
}

/// Input for a chat-completion provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub messages: Vec<ConversationTurn>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Prose written about a ranked list, plus suggested extras.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub text: String,
    pub suggestions: Vec<Part>,
    /// `true` when the templated fallback was used.
    pub degraded: bool,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Present when the interpreter returned a structured intent.
    pub intent: Option<QueryIntent>,
    pub results: Vec<RankedResult>,
    pub summary: Option<String>,
    pub suggestions: Vec<Part>,
    pub degraded: Vec<Degradation>,
}

#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub response: String,
    pub products: Vec<RankedResult>,
    pub suggestions: Vec<Part>,
    /// Prior turns followed by this exchange.
    pub history: Vec<ConversationTurn>,
    pub degraded: Vec<Degradation>,
}

#[derive(Debug, Clone)]
pub struct CompareOutcome {
    pub comparison: String,
    pub products: Vec<Part>,
    pub degraded: Vec<Degradation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::test_parts::part;

    #[test]
    fn empty_intent_has_no_filter() {
        assert_eq!(PartFilter::from_intent(&QueryIntent::bare("filter")), None);

        let blank_brand = QueryIntent {
            brand: Some("  ".into()),
            ..QueryIntent::bare("filter")
        };
        assert_eq!(PartFilter::from_intent(&blank_brand), None);
    }

    #[test]
    fn explicit_filters_override_interpreted_fields() {
        let intent = QueryIntent {
            brand: Some("GE".into()),
            price_max: Some(80.0),
            ..QueryIntent::bare("ge filter")
        };
        let merged = intent.with_filters(&SearchFilters {
            brand: Some("Whirlpool".into()),
            category: Some(" ".into()),
            in_stock: Some(true),
            ..Default::default()
        });

        assert_eq!(merged.brand.as_deref(), Some("Whirlpool"));
        assert_eq!(merged.category, None);
        assert_eq!(merged.price_max, Some(80.0));
        assert_eq!(merged.in_stock, Some(true));
    }

    #[test]
    fn part_type_terms_fold_plurals() {
        assert_eq!(part_type_terms("Water Filters"), vec!["water", "filter"]);
        assert_eq!(part_type_terms("glass shelf"), vec!["glass", "shelf"]);
        assert_eq!(part_type_terms("gas"), vec!["gas"]);
    }

    #[test]
    fn categories_normalize_with_or_without_suffix() {
        assert_eq!(
            normalize_category("Refrigerator Parts").as_deref(),
            Some("refrigerator")
        );
        assert_eq!(normalize_category("refrigerator").as_deref(), Some("refrigerator"));
        assert_eq!(normalize_category(" parts"), None);
        assert_eq!(normalize_category("Parts"), None);
        assert_eq!(normalize_category("Autoparts").as_deref(), Some("autoparts"));
    }

    #[test]
    fn filter_matches_on_every_predicate() {
        let intent = QueryIntent {
            brand: Some("whirlpool".into()),
            part_type: Some("water filter".into()),
            category: Some("Refrigerator".into()),
            model_number: Some("wrf535 smbm00".into()),
            price_max: Some(60.0),
            ..QueryIntent::bare("whirlpool water filter")
        };
        let filter = PartFilter::from_intent(&intent).unwrap();

        let mut candidate = part("EDR1RXD1", "Whirlpool Refrigerator Water Filter 1", "Whirlpool");
        candidate.category = Some("Refrigerator Parts".into());
        candidate.compatible_models = ["WRF535SMBM00".to_string()].into();
        candidate.sale_price = Some(49.99);
        assert!(filter.matches(&candidate));

        candidate.sale_price = Some(64.99);
        assert!(!filter.matches(&candidate));

        let drum = part("W10", "Whirlpool Washer Drum", "Whirlpool");
        assert!(!filter.matches(&drum));
    }

    #[test]
    fn inverted_price_range_matches_nothing() {
        let intent = QueryIntent {
            price_min: Some(100.0),
            price_max: Some(10.0),
            ..QueryIntent::bare("cheap")
        };
        let filter = PartFilter::from_intent(&intent).unwrap();
        assert!(filter.is_contradictory());
        assert!(!filter.matches(&part("XWFE", "GE Water Filter", "GE")));
    }

    #[test]
    fn ranked_result_flattens_part_and_omits_missing_similarity() {
        let result = RankedResult {
            part: part("XWFE", "GE Water Filter", "GE"),
            similarity: None,
            match_reason: MatchReason::Filter,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["sku"], "XWFE");
        assert_eq!(json["match_reason"], "filter");
        assert!(json.get("similarity").is_none());
    }
}
