//! Two-tier classification cascade: deterministic rules first, the oracle
//! only for the remainder.

use anyhow::Result;
use serde::Deserialize;
use tracing::debug;

use kakeibo_core::{CategorySet, Classification, Dictionaries, Provenance, Salvage, salvage_json};

use crate::oracle::{Oracle, OracleRequest};
use crate::rules::rule_classify;

/// Confidence reported when the oracle response had to be replaced or its
/// confidence field was unusable.
const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Classifies one line item at a time against the injected tables.
pub struct Classifier<'a> {
    dicts: &'a Dictionaries,
    categories: &'a CategorySet,
    oracle: &'a dyn Oracle,
}

/// Whatever the oracle claims about an item. Every field is optional; the
/// response is untrusted.
#[derive(Debug, Default, Deserialize)]
struct OracleLabel {
    category: Option<String>,
    confidence: Option<serde_json::Value>,
}

impl<'a> Classifier<'a> {
    pub fn new(dicts: &'a Dictionaries, categories: &'a CategorySet, oracle: &'a dyn Oracle) -> Self {
        Self {
            dicts,
            categories,
            oracle,
        }
    }

    /// Classify an item. The rule tier always outranks the oracle tier; the
    /// oracle is consulted only when no rule matched.
    pub fn classify(
        &self,
        store_name: &str,
        item_name: &str,
        price: Option<f64>,
    ) -> Result<Classification> {
        if let Some(hit) = rule_classify(store_name, item_name, self.dicts, self.categories) {
            return Ok(hit);
        }
        self.ai_classify(store_name, item_name, price)
    }

    fn ai_classify(
        &self,
        store_name: &str,
        item_name: &str,
        price: Option<f64>,
    ) -> Result<Classification> {
        let request = OracleRequest::new(self.prompt(store_name, item_name, price), 0.2, 128);
        let text = self.oracle.generate(&request)?;

        let label = match salvage_json::<OracleLabel>(&text) {
            Salvage::Direct(v) | Salvage::Extracted(v) => v,
            Salvage::Failed => {
                debug!("unparseable oracle label for {item_name:?}, using fallback");
                OracleLabel::default()
            }
        };

        let category = self
            .categories
            .coerce(label.category.as_deref().unwrap_or_default())
            .to_string();
        let confidence = coerce_confidence(label.confidence.as_ref());

        Ok(Classification {
            category,
            confidence,
            provenance: Provenance::Ai,
        })
    }

    fn prompt(&self, store_name: &str, item_name: &str, price: Option<f64>) -> String {
        let price_text = price.map(|p| p.to_string()).unwrap_or_default();
        format!(
            "あなたは家計簿のカテゴリ分類器です。次のカテゴリのいずれか1つだけを返してください。\n\
             カテゴリ一覧: {}\n\n\
             JSONのみを返し、余計な文章は書かないでください。\n\
             出力例: {{\"category\":\"食費\",\"confidence\":0.82,\"reason\":\"コンビニの食品名\"}}\n\
             注意: JSON以外の文字やコードブロックを含めないでください。\n\n\
             入力:\n店名: {}\n品目名: {}\n金額: {}\n",
            self.categories.labels().join(", "),
            store_name,
            item_name,
            price_text
        )
    }
}

/// The oracle may return a number, a numeric string, or garbage. Anything
/// unusable becomes the fallback, and the result is clamped into [0, 1].
fn coerce_confidence(value: Option<&serde_json::Value>) -> f64 {
    let raw = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    raw.unwrap_or(FALLBACK_CONFIDENCE).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::cell::Cell;

    struct FnOracle<F: Fn(&OracleRequest) -> Result<String>>(F);

    impl<F: Fn(&OracleRequest) -> Result<String>> Oracle for FnOracle<F> {
        fn generate(&self, request: &OracleRequest) -> Result<String> {
            (self.0)(request)
        }
    }

    fn fixtures() -> (Dictionaries, CategorySet) {
        (Dictionaries::default_ja(), CategorySet::default_ja())
    }

    #[test]
    fn test_rule_tier_outranks_oracle() {
        let (dicts, cats) = fixtures();
        let calls = Cell::new(0);
        let oracle = FnOracle(|_req| {
            calls.set(calls.get() + 1);
            Ok(r#"{"category":"医療","confidence":0.99}"#.to_string())
        });
        let classifier = Classifier::new(&dicts, &cats, &oracle);

        let hit = classifier.classify("ローソン梅田店", "適当な品目", None).unwrap();
        assert_eq!(hit.provenance, Provenance::Rule);
        assert_eq!(hit.confidence, 1.0);
        assert_eq!(hit.category, "食費");
        assert_eq!(calls.get(), 0, "the oracle must not be consulted");
    }

    #[test]
    fn test_oracle_label_accepted() {
        let (dicts, cats) = fixtures();
        let oracle = FnOracle(|_req| Ok(r#"{"category":"医療","confidence":0.8,"reason":"薬っぽい"}"#.to_string()));
        let classifier = Classifier::new(&dicts, &cats, &oracle);

        let hit = classifier.classify("謎の店", "謎の品", Some(480.0)).unwrap();
        assert_eq!(hit.provenance, Provenance::Ai);
        assert_eq!(hit.category, "医療");
        assert_eq!(hit.confidence, 0.8);
    }

    #[test]
    fn test_unknown_category_coerced_to_fallback() {
        let (dicts, cats) = fixtures();
        let oracle = FnOracle(|_req| Ok(r#"{"category":"Groceries","confidence":0.9}"#.to_string()));
        let classifier = Classifier::new(&dicts, &cats, &oracle);

        let hit = classifier.classify("謎の店", "謎の品", None).unwrap();
        assert_eq!(hit.category, "その他");
    }

    #[test]
    fn test_confidence_clamped_and_defaulted() {
        assert_eq!(coerce_confidence(Some(&serde_json::json!(5.0))), 1.0);
        assert_eq!(coerce_confidence(Some(&serde_json::json!(-0.3))), 0.0);
        assert_eq!(coerce_confidence(Some(&serde_json::json!("0.7"))), 0.7);
        assert_eq!(coerce_confidence(Some(&serde_json::json!("high"))), 0.5);
        assert_eq!(coerce_confidence(Some(&serde_json::json!(null))), 0.5);
        assert_eq!(coerce_confidence(None), 0.5);
    }

    #[test]
    fn test_garbage_response_degrades_to_fallback_object() {
        let (dicts, cats) = fixtures();
        let oracle = FnOracle(|_req| Ok("たぶん食費だと思います".to_string()));
        let classifier = Classifier::new(&dicts, &cats, &oracle);

        let hit = classifier.classify("謎の店", "謎の品", None).unwrap();
        assert_eq!(hit.category, "その他");
        assert_eq!(hit.confidence, 0.5);
        assert_eq!(hit.provenance, Provenance::Ai);
    }

    #[test]
    fn test_oracle_transport_error_propagates() {
        let (dicts, cats) = fixtures();
        let oracle = FnOracle(|_req| bail!("oracle unreachable"));
        let classifier = Classifier::new(&dicts, &cats, &oracle);

        assert!(classifier.classify("謎の店", "謎の品", None).is_err());
    }
}
