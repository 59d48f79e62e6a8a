//! Prompt templates and context formatting for the language model.

use std::fmt::Write;

use itertools::Itertools;

use super::types::RankedResult;
use crate::domain::models::Part;

/// Keys the interpreter may answer with. Anything else is unstructured.
pub const INTENT_FIELDS: &[&str] = &[
    "intent",
    "part_type",
    "brand",
    "model_number",
    "category",
    "price_min",
    "price_max",
    "keywords",
    "price_sensitivity",
    "urgency",
];

pub fn intent_system_prompt(categories: &[String]) -> String {
    let categories = if categories.is_empty() {
        "refrigerator, dishwasher, washer, dryer, oven".to_string()
    } else {
        categories.iter().join(", ")
    };

    format!(
        r#"You parse customer queries for an appliance parts distributor.

Return ONLY a JSON object with these keys, using null for anything not mentioned:
- intent: "find_part" | "check_price" | "check_compatibility" | "general_question"
- part_type: the kind of part, e.g. "water filter", "ice maker", "door gasket", "drum"
- brand: appliance brand, e.g. "Whirlpool", "GE", "Samsung", "LG", "Frigidaire", "Bosch"
- model_number: appliance model number
- category: one of [{categories}]
- price_min: lowest acceptable price in dollars
- price_max: highest acceptable price in dollars
- keywords: list of key search terms

Query: "I need a water filter for a Whirlpool fridge"
{{"intent": "find_part", "part_type": "water filter", "brand": "Whirlpool", "model_number": null, "category": "refrigerator", "price_min": null, "price_max": null, "keywords": ["water", "filter", "whirlpool"]}}

Query: "ice maker for GE model GSS25GSHSS under $100"
{{"intent": "find_part", "part_type": "ice maker", "brand": "GE", "model_number": "GSS25GSHSS", "category": "refrigerator", "price_min": null, "price_max": 100, "keywords": ["ice", "maker", "ge"]}}"#
    )
}

pub const RESPONSE_SYSTEM_PROMPT: &str = "You are a helpful sales assistant for an appliance \
parts company. Recommend the listed products clearly and concisely.

Guidelines:
- Keep responses under 150 words
- Use bullet points with product name and SKU, price (show the discount if any) and stock status
- Highlight compatibility with the customer's model when they mention one
- Mention the suggested add-on products briefly if they fit
- Only recommend products from the list you are given";

pub const NO_RESULTS_SYSTEM_PROMPT: &str = "You are a helpful sales assistant for an appliance \
parts company. No exact matches were found for the customer's request. Apologise briefly, \
suggest how they could refine the search (model number, brand, part type) and keep it under \
80 words. Do not invent products.";

pub const COMPARISON_SYSTEM_PROMPT: &str = "You compare appliance parts for a sales team. \
Write a short side-by-side comparison of the listed products covering price, discount, \
brand, stock and compatibility, then recommend the best value. Keep it under 200 words and \
only use the facts given.";

pub fn format_price(part: &Part) -> String {
    match (part.regular_price, part.sale_price, part.discount_percent) {
        (Some(regular), Some(sale), Some(discount)) if sale < regular => {
            format!("${sale:.2} (was ${regular:.2}, {discount:.0}% off)")
        }
        _ => part
            .effective_price()
            .map(|price| format!("${price:.2}"))
            .unwrap_or_else(|| "price on request".to_string()),
    }
}

/// Numbered product context for the response prompt.
pub fn format_results(results: &[RankedResult]) -> String {
    format_products(results.iter().map(|r| (&r.part, r.similarity)))
}

/// Numbered product context for the comparison prompt.
pub fn format_parts(parts: &[Part]) -> String {
    format_products(parts.iter().map(|p| (p, None)))
}

fn format_products<'a>(products: impl Iterator<Item = (&'a Part, Option<f32>)>) -> String {
    let mut out = String::new();
    for (i, (part, score)) in products.enumerate() {
        let _ = writeln!(out, "Product {}:", i + 1);
        let _ = writeln!(out, "- Name: {}", part.name);
        let _ = writeln!(out, "- SKU: {}", part.sku);
        if let Some(brand) = &part.brand {
            let _ = writeln!(out, "- Brand: {brand}");
        }
        let _ = writeln!(out, "- Price: {}", format_price(part));
        let _ = writeln!(out, "- Stock: {}", part.stock_label());
        if !part.compatible_models.is_empty() {
            let models: String = part.compatible_models.iter().join(", ");
            let _ = writeln!(out, "- Compatible Models: {}", truncate(&models, 200));
        }
        if let Some(description) = &part.description {
            let _ = writeln!(out, "- Description: {}", truncate(description, 150));
        }
        if let Some(score) = score {
            let _ = writeln!(out, "- Match Score: {score:.2}/1.00");
        }
        out.push('\n');
    }

    if out.is_empty() {
        "No products found matching the criteria.".to_string()
    } else {
        out
    }
}

pub fn format_upsells(upsells: &[Part]) -> String {
    if upsells.is_empty() {
        return "No add-on suggestions available.".to_string();
    }
    upsells
        .iter()
        .map(|part| format!("- {} ({}) {}", part.name, part.sku, format_price(part)))
        .join("\n")
}

/// Truncate on a character boundary.
fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::test_parts::part;
    use crate::domain::search::types::MatchReason;

    #[test]
    fn intent_prompt_lists_store_categories() {
        let prompt = intent_system_prompt(&["Dishwasher Parts".into(), "Refrigerator Parts".into()]);
        assert!(prompt.contains("one of [Dishwasher Parts, Refrigerator Parts]"));
    }

    #[test]
    fn price_shows_discount_when_on_sale() {
        let mut filter = part("XWFE", "GE Water Filter", "GE");
        filter.regular_price = Some(64.02);
        filter.sale_price = Some(57.62);
        filter.discount_percent = Some(10.0);
        assert_eq!(format_price(&filter), "$57.62 (was $64.02, 10% off)");

        filter.sale_price = None;
        filter.discount_percent = None;
        assert_eq!(format_price(&filter), "$64.02");
    }

    #[test]
    fn results_context_includes_scores_and_truncates_descriptions() {
        let mut filter = part("XWFE", "GE Water Filter", "GE");
        filter.description = Some("é".repeat(300));
        let text = format_results(&[RankedResult {
            part: filter,
            similarity: Some(0.876),
            match_reason: MatchReason::Both,
        }]);
        assert!(text.contains("- SKU: XWFE"));
        assert!(text.contains("- Match Score: 0.88/1.00"));
        assert!(text.contains(&format!("{}...", "é".repeat(150))));
    }
}
