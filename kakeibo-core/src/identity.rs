//! Deterministic receipt identity: the dedup key for header upserts.
//!
//! At-least-once delivery from the messaging channel means the same receipt
//! can arrive twice; identical inputs must map to the identical key.

use chrono::NaiveDate;
use sha2::{Digest, Sha256};

/// Raw OCR text beyond this many characters does not influence the identity.
const TEXT_CAP_CHARS: usize = 5000;

/// Hex digits of the digest kept in the key.
const DIGEST_CHARS: usize = 12;

/// Build the `{date}_{store}_{digest12}` identity from the resolved header,
/// the raw OCR text, and the upstream message id.
///
/// Pure and deterministic: same inputs, byte-identical output.
pub fn build_identity(
    purchase_date: NaiveDate,
    store_name: &str,
    raw_text: &str,
    message_id: &str,
) -> String {
    let date = purchase_date.format("%Y-%m-%d").to_string();
    let capped: String = raw_text.chars().take(TEXT_CAP_CHARS).collect();
    let base = format!("{date}::{store_name}::{message_id}::{capped}");

    let mut hasher = Sha256::new();
    hasher.update(base.as_bytes());
    let digest = format!("{:x}", hasher.finalize());

    format!("{}_{}_{}", date, store_name.trim(), &digest[..DIGEST_CHARS])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 28).unwrap()
    }

    #[test]
    fn test_deterministic_across_calls() {
        let a = build_identity(date(), "ローソン", "おにぎり 128", "msg-1");
        let b = build_identity(date(), "ローソン", "おにぎり 128", "msg-1");
        assert_eq!(a, b);
        assert!(a.starts_with("2025-09-28_ローソン_"));
        assert_eq!(a.split('_').next_back().unwrap().len(), 12);
    }

    #[test]
    fn test_any_input_change_changes_identity() {
        let base = build_identity(date(), "ローソン", "text", "msg-1");
        assert_ne!(base, build_identity(date(), "ローソン", "text", "msg-2"));
        assert_ne!(base, build_identity(date(), "ローソン", "text2", "msg-1"));
        assert_ne!(base, build_identity(date(), "セブン", "text", "msg-1"));
        let other_date = NaiveDate::from_ymd_opt(2025, 9, 29).unwrap();
        assert_ne!(base, build_identity(other_date, "ローソン", "text", "msg-1"));
    }

    #[test]
    fn test_text_beyond_cap_is_ignored() {
        let body = "領収 ".repeat(3000);
        let mut extended = body.clone();
        extended.push_str("末尾");
        // Both exceed 5000 chars; the differing tail is outside the cap.
        let a = build_identity(date(), "店", &body, "m");
        let b = build_identity(date(), "店", &extended, "m");
        assert_eq!(a, b);
    }

    #[test]
    fn test_store_trimmed_in_prefix_only() {
        let id = build_identity(date(), " ローソン ", "text", "m");
        assert!(id.starts_with("2025-09-28_ローソン_"));
    }
}
