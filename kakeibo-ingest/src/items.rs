//! Parse the oracle's CSV-ish `商品名, 価格` listing into candidate rows.
//!
//! The oracle is told to skip fences and headers but does not always comply;
//! both are tolerated here rather than trusted away.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::LineItemCandidate;

static FENCE_OPEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```[a-zA-Z]*\n?").unwrap());

/// Header-row markers: a first field naming the item column and a second
/// field naming the price column (substring check, case-sensitive).
const HEADER_ITEM_WORD: &str = "商品";
const HEADER_PRICE_WORD: &str = "価格";

/// Strip fenced-block markup the oracle was asked not to emit.
fn strip_code_fences(text: &str) -> String {
    FENCE_OPEN.replace_all(text, "").replace("```", "")
}

/// Parse comma-delimited rows into ordered candidates.
///
/// Rows with fewer than two fields and header-ish rows are discarded;
/// unreadable records are skipped. A non-numeric price field is retained —
/// coercion happens downstream.
pub fn parse_items(text: &str) -> Vec<LineItemCandidate> {
    let cleaned = strip_code_fences(text);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(cleaned.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let Ok(record) = record else { continue };
        let (Some(name), Some(price)) = (record.get(0), record.get(1)) else {
            continue;
        };
        if name.contains(HEADER_ITEM_WORD) && price.contains(HEADER_PRICE_WORD) {
            continue;
        }
        rows.push(LineItemCandidate::new(name.trim(), price.trim()));
    }
    rows
}
