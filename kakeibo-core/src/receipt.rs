//! Receipt value types shared across the workspace.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The (store, date) pair describing a receipt as a whole.
///
/// Built once per receipt by header resolution and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptHeader {
    /// Normalized store name. Empty means "unknown", never absent.
    pub store_name: String,
    /// Always a real calendar date once resolution completes.
    pub purchase_date: NaiveDate,
}

impl ReceiptHeader {
    pub fn new(store_name: impl Into<String>, purchase_date: NaiveDate) -> Self {
        Self {
            store_name: store_name.into(),
            purchase_date,
        }
    }

    /// ISO-8601 form used in identities and persistence payloads.
    pub fn iso_date(&self) -> String {
        self.purchase_date.format("%Y-%m-%d").to_string()
    }

    /// Human-readable label, e.g. `2025-09-28｜セブン-イレブン`.
    pub fn label(&self) -> String {
        let store = if self.store_name.is_empty() {
            "店名不明"
        } else {
            self.store_name.as_str()
        };
        format!("{}｜{}", self.iso_date(), store)
    }
}

/// Which tier produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    #[serde(rename = "rule")]
    Rule,
    #[serde(rename = "ai")]
    Ai,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Rule => "rule",
            Provenance::Ai => "ai",
        }
    }
}

/// A category assignment before it is attached to a line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Always a member of the injected category set.
    pub category: String,
    /// Clamped to [0, 1].
    pub confidence: f64,
    pub provenance: Provenance,
}

/// A fully labeled line item ready for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedItem {
    pub name: String,
    /// None when the raw price text did not coerce to a number.
    pub price: Option<f64>,
    pub category: String,
    pub confidence: f64,
    pub provenance: Provenance,
}

impl ClassifiedItem {
    /// Item names longer than this are truncated for persistence.
    pub const MAX_NAME_CHARS: usize = 200;

    /// Below this the item counts toward the low-confidence tally.
    pub const LOW_CONFIDENCE: f64 = 0.6;

    pub fn new(name: &str, price: Option<f64>, classification: Classification) -> Self {
        Self {
            name: name.chars().take(Self::MAX_NAME_CHARS).collect(),
            price,
            category: classification.category,
            confidence: classification.confidence,
            provenance: classification.provenance,
        }
    }

    pub fn is_low_confidence(&self) -> bool {
        self.confidence < Self::LOW_CONFIDENCE
    }
}
