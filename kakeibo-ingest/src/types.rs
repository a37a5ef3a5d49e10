use serde::{Deserialize, Serialize};

/// One `name, price` row as emitted by the parsing stage, before numeric
/// coercion. The price field is raw text on purpose: coercion happens
/// downstream and degrades to a missing price, not a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemCandidate {
    pub raw_name: String,
    pub raw_price_text: String,
}

impl LineItemCandidate {
    pub fn new(raw_name: impl Into<String>, raw_price_text: impl Into<String>) -> Self {
        Self {
            raw_name: raw_name.into(),
            raw_price_text: raw_price_text.into(),
        }
    }
}
