//! Best-effort JSON decoding for untrusted oracle output.
//!
//! The generative oracle is asked for bare JSON but routinely wraps it in
//! prose or fences anyway. Every oracle-calling component goes through this
//! one decode path: strict parse first, then the first `{...}` span, then a
//! tagged failure the caller replaces with its fixed fallback object.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;

static EMBEDDED_OBJECT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").unwrap());

/// Outcome of a salvage attempt. Tests and callers can tell a confident
/// parse from one that needed the embedded-object fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum Salvage<T> {
    /// The whole response was valid JSON.
    Direct(T),
    /// JSON recovered from the first `{...}` span inside surrounding prose.
    Extracted(T),
    /// Nothing decodable.
    Failed,
}

impl<T> Salvage<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Salvage::Direct(v) | Salvage::Extracted(v) => Some(v),
            Salvage::Failed => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Salvage::Failed)
    }
}

pub fn salvage_json<T: DeserializeOwned>(text: &str) -> Salvage<T> {
    let trimmed = text.trim();
    if let Ok(v) = serde_json::from_str::<T>(trimmed) {
        return Salvage::Direct(v);
    }
    if let Some(span) = EMBEDDED_OBJECT.find(trimmed) {
        if let Ok(v) = serde_json::from_str::<T>(span.as_str()) {
            return Salvage::Extracted(v);
        }
    }
    Salvage::Failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Label {
        category: String,
        confidence: f64,
    }

    #[test]
    fn test_direct_parse() {
        let got: Salvage<Label> = salvage_json(r#"{"category":"食費","confidence":0.82}"#);
        assert_eq!(
            got,
            Salvage::Direct(Label {
                category: "食費".to_string(),
                confidence: 0.82
            })
        );
    }

    #[test]
    fn test_extracted_from_prose_and_fences() {
        let text = "分類結果は以下です。\n```json\n{\"category\":\"交通\",\"confidence\":0.7}\n```";
        let got: Salvage<Label> = salvage_json(text);
        assert_eq!(
            got,
            Salvage::Extracted(Label {
                category: "交通".to_string(),
                confidence: 0.7
            })
        );
    }

    #[test]
    fn test_total_failure_is_tagged() {
        let got: Salvage<Label> = salvage_json("カテゴリ: 食費");
        assert!(got.is_failed());
        assert_eq!(got.into_option(), None);
    }
}
