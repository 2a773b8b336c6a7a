//! Free text → structured transaction proposal.
//!
//! Two interchangeable strategies behind one contract: an AI strategy (when
//! a text backend is configured) and a deterministic keyword heuristic. Any
//! AI failure falls back to the heuristic, so extraction degrades instead of
//! going dark when the backend is flaky.

use std::sync::Arc;

use regex::Regex;
use serde_json::Value;

use crate::{
    domain::{TransactionKind, TransactionProposal},
    errors::ExtractionError,
    ports::TextGenerator,
};

const EXPENSE_KEYWORDS: &[&str] = &["spent", "bought", "paid"];
const INCOME_KEYWORDS: &[&str] = &["received", "salary", "income"];

// Keyword → category table. Catch-all defaults apply when nothing matches;
// e.g. "lunch" is deliberately not listed, so "spent 50000 on lunch" lands
// in "general".
const EXPENSE_CATEGORIES: &[(&str, &[&str])] = &[
    ("food", &["food", "meal", "groceries", "makan"]),
    ("transport", &["transport", "fuel", "taxi", "bus", "train"]),
    ("bills", &["bill", "electricity", "internet", "rent"]),
];
const INCOME_CATEGORIES: &[(&str, &[&str])] = &[
    ("salary", &["salary", "wage", "gaji"]),
    ("bonus", &["bonus"]),
];

const DEFAULT_EXPENSE_CATEGORY: &str = "general";
const DEFAULT_INCOME_CATEGORY: &str = "other income";

pub struct TextExtractor {
    generator: Option<Arc<dyn TextGenerator>>,
}

impl TextExtractor {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>) -> Self {
        Self { generator }
    }

    /// Turn a free-text message into a proposal, or fail with a
    /// user-recoverable reason. Never returns a partially-filled proposal.
    pub async fn extract(
        &self,
        message: &str,
    ) -> std::result::Result<TransactionProposal, ExtractionError> {
        if let Some(generator) = &self.generator {
            match ai_extract(generator.as_ref(), message).await {
                Ok(proposal) => return Ok(proposal),
                Err(err) => {
                    tracing::warn!(%err, "AI extraction failed; falling back to heuristic");
                }
            }
        }
        heuristic_extract(message)
    }
}

async fn ai_extract(
    generator: &dyn TextGenerator,
    message: &str,
) -> std::result::Result<TransactionProposal, ExtractionError> {
    let reply = generator
        .generate(&extraction_prompt(message))
        .await
        .map_err(|e| ExtractionError::Backend(e.to_string()))?;

    let candidate = first_json_object(&reply)
        .ok_or_else(|| ExtractionError::BadShape("no JSON object in reply".to_string()))?;
    let value: Value = serde_json::from_str(candidate)
        .map_err(|e| ExtractionError::BadShape(format!("unparseable JSON object: {e}")))?;

    proposal_from_json(&value)
}

fn extraction_prompt(message: &str) -> String {
    format!(
        "You are a financial transaction parser. Analyze the message below and \
respond with ONLY a JSON object in exactly this shape:\n\
{{\"type\": \"income\" or \"expense\", \"amount\": <positive number>, \
\"category\": \"<short lowercase label>\", \"description\": \"<what the money was for>\"}}\n\
If the message does not describe a financial transaction, respond with the word NONE.\n\n\
Message: {message}"
    )
}

/// First balanced `{...}` substring, string-literal aware.
fn first_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut start = None;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' if start.is_some() => in_string = true,
            b'{' => {
                if start.is_none() {
                    start = Some(i);
                }
                depth += 1;
            }
            b'}' if start.is_some() => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start?..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn proposal_from_json(value: &Value) -> std::result::Result<TransactionProposal, ExtractionError> {
    let bad = |what: &str| ExtractionError::BadShape(format!("missing or invalid {what}"));

    let kind = match value.get("type").and_then(Value::as_str) {
        Some(k) if k.eq_ignore_ascii_case("income") => TransactionKind::Income,
        Some(k) if k.eq_ignore_ascii_case("expense") => TransactionKind::Expense,
        _ => return Err(bad("type")),
    };

    // Backends occasionally quote numbers; accept both.
    let amount = match value.get("amount") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|a| *a > 0.0 && a.is_finite())
    .ok_or_else(|| bad("amount"))?;

    let category = value
        .get("category")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| bad("category"))?;

    let description = value
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| bad("description"))?;

    Ok(TransactionProposal {
        kind,
        amount,
        category: category.to_string(),
        description: description.to_string(),
    })
}

/// Deterministic fallback strategy.
///
/// A message with financial intent but no integer-like amount is a hard
/// failure; amounts are never invented on the user's behalf.
pub fn heuristic_extract(
    message: &str,
) -> std::result::Result<TransactionProposal, ExtractionError> {
    let lower = message.to_lowercase();

    let kind = if EXPENSE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        TransactionKind::Expense
    } else if INCOME_KEYWORDS.iter().any(|k| lower.contains(k)) {
        TransactionKind::Income
    } else {
        return Err(ExtractionError::NoFinancialIntent);
    };

    let amount = first_amount(&lower).ok_or(ExtractionError::NoAmount)?;

    let (table, fallback) = match kind {
        TransactionKind::Expense => (EXPENSE_CATEGORIES, DEFAULT_EXPENSE_CATEGORY),
        TransactionKind::Income => (INCOME_CATEGORIES, DEFAULT_INCOME_CATEGORY),
    };
    let category = table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map_or(fallback, |(category, _)| category);

    Ok(TransactionProposal {
        kind,
        amount,
        category: category.to_string(),
        description: message.to_string(),
    })
}

fn first_amount(text: &str) -> Option<f64> {
    let re = Regex::new(r"\d+").expect("valid regex");
    let value = re.find(text)?.as_str().parse::<f64>().ok()?;
    (value > 0.0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_expense_example() {
        let p = heuristic_extract("spent 50000 on lunch").unwrap();
        assert_eq!(p.kind, TransactionKind::Expense);
        assert_eq!(p.amount, 50_000.0);
        // "lunch" is not in the keyword table, so the catch-all applies.
        assert_eq!(p.category, "general");
        assert_eq!(p.description, "spent 50000 on lunch");
    }

    #[test]
    fn heuristic_income_example() {
        let p = heuristic_extract("received 1000000 salary").unwrap();
        assert_eq!(p.kind, TransactionKind::Income);
        assert_eq!(p.amount, 1_000_000.0);
        assert_eq!(p.category, "salary");
        assert_eq!(p.description, "received 1000000 salary");
    }

    #[test]
    fn heuristic_keyword_categories() {
        let p = heuristic_extract("paid 150000 for the internet bill").unwrap();
        assert_eq!(p.category, "bills");
        let p = heuristic_extract("Bought 20000 of fuel").unwrap();
        assert_eq!(p.category, "transport");
    }

    #[test]
    fn heuristic_failures() {
        assert_eq!(
            heuristic_extract("what's the weather like"),
            Err(ExtractionError::NoFinancialIntent)
        );
        assert_eq!(
            heuristic_extract("spent some money on lunch"),
            Err(ExtractionError::NoAmount)
        );
        assert_eq!(heuristic_extract("spent 0 on lunch"), Err(ExtractionError::NoAmount));
    }

    #[test]
    fn finds_first_json_object_in_noise() {
        let reply = "Sure! Here you go:\n```json\n{\"type\": \"expense\", \"amount\": 5000, \
\"category\": \"food\", \"description\": \"snacks {and} drinks\"}\n```";
        let obj = first_json_object(reply).unwrap();
        let p = proposal_from_json(&serde_json::from_str(obj).unwrap()).unwrap();
        assert_eq!(p.kind, TransactionKind::Expense);
        assert_eq!(p.amount, 5_000.0);
        assert_eq!(p.description, "snacks {and} drinks");
    }

    #[test]
    fn no_json_object_is_rejected() {
        assert!(first_json_object("NONE").is_none());
    }

    #[test]
    fn quoted_amounts_are_accepted_but_invalid_shapes_fail() {
        let v: Value =
            serde_json::from_str(r#"{"type":"income","amount":"250000","category":"salary","description":"pay"}"#)
                .unwrap();
        assert_eq!(proposal_from_json(&v).unwrap().amount, 250_000.0);

        for bad in [
            r#"{"type":"loan","amount":1,"category":"c","description":"d"}"#,
            r#"{"type":"income","amount":0,"category":"c","description":"d"}"#,
            r#"{"type":"income","amount":1,"category":"","description":"d"}"#,
            r#"{"type":"income","amount":1,"category":"c","description":"  "}"#,
        ] {
            let v: Value = serde_json::from_str(bad).unwrap();
            assert!(proposal_from_json(&v).is_err(), "expected failure for {bad}");
        }
    }
}
