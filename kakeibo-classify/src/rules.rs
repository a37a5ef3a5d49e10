//! Deterministic classification rules.
//!
//! Priority order: merchant dictionary (exact/substring on the store name),
//! store-name token groups, then item keyword groups over store + item text.
//! First match wins; no stacking. Covers the bulk of receipts without a
//! single network call.

use kakeibo_core::{CategorySet, Classification, Dictionaries, FallbackChain, Provenance};

/// Confidence for the item-keyword tier. The merchant tier is always 1.0
/// and the store-token tier carries a per-group value.
const KEYWORD_CONFIDENCE: f64 = 0.9;

/// Run the rule tiers. `None` means "no rule matched" and the caller may
/// consult the oracle.
pub fn rule_classify(
    store_name: &str,
    item_name: &str,
    dicts: &Dictionaries,
    categories: &CategorySet,
) -> Option<Classification> {
    let hit = FallbackChain::new()
        .step("merchant-map", || merchant_match(store_name, dicts))
        .step("store-tokens", || store_token_match(store_name, dicts))
        .step("item-keywords", || keyword_match(store_name, item_name, dicts))
        .resolve()?;

    let (category, confidence) = hit.value;
    Some(Classification {
        category: categories.coerce(&category).to_string(),
        confidence,
        provenance: Provenance::Rule,
    })
}

fn merchant_match(store_name: &str, dicts: &Dictionaries) -> Option<(String, f64)> {
    if store_name.is_empty() {
        return None;
    }
    let trimmed = store_name.trim();
    dicts
        .merchants
        .iter()
        .find(|rule| {
            !rule.name.is_empty()
                && (trimmed.starts_with(rule.name.as_str()) || store_name.contains(rule.name.as_str()))
        })
        .map(|rule| (rule.category.clone(), 1.0))
}

fn store_token_match(store_name: &str, dicts: &Dictionaries) -> Option<(String, f64)> {
    if store_name.is_empty() {
        return None;
    }
    dicts
        .store_groups
        .iter()
        .find(|group| group.tokens.iter().any(|t| !t.is_empty() && store_name.contains(t.as_str())))
        .map(|group| (group.category.clone(), group.confidence))
}

fn keyword_match(store_name: &str, item_name: &str, dicts: &Dictionaries) -> Option<(String, f64)> {
    let text = format!("{store_name} {item_name}").to_lowercase();
    dicts
        .keyword_groups
        .iter()
        .find(|group| {
            group
                .words
                .iter()
                .any(|w| !w.is_empty() && text.contains(&w.to_lowercase()))
        })
        .map(|group| (group.category.clone(), KEYWORD_CONFIDENCE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> (Dictionaries, CategorySet) {
        (Dictionaries::default_ja(), CategorySet::default_ja())
    }

    #[test]
    fn test_merchant_match_is_absolute() {
        let (dicts, cats) = fixtures();
        let hit = rule_classify("セブン-イレブン大阪梅田店", "シャンプー", &dicts, &cats).unwrap();
        // Dictionary store wins over the item keyword (シャンプー → 日用品).
        assert_eq!(hit.category, "食費");
        assert_eq!(hit.confidence, 1.0);
        assert_eq!(hit.provenance, Provenance::Rule);
    }

    #[test]
    fn test_store_token_groups_in_order() {
        let (dicts, cats) = fixtures();
        let drug = rule_classify("まちのくすり ドラッグストア", "", &dicts, &cats).unwrap();
        assert_eq!(drug.category, "日用品（スーパー・ドラッグストア）");
        assert_eq!(drug.confidence, 0.85);

        let rail = rule_classify("北急行バス", "", &dicts, &cats).unwrap();
        assert_eq!(rail.category, "交通");
        assert_eq!(rail.confidence, 0.9);
    }

    #[test]
    fn test_keywords_cover_store_and_item_text() {
        let (dicts, cats) = fixtures();
        let hit = rule_classify("", "トイレットペーパー 12ロール", &dicts, &cats).unwrap();
        assert_eq!(hit.category, "日用品（スーパー・ドラッグストア）");
        assert_eq!(hit.confidence, 0.9);
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let (dicts, cats) = fixtures();
        let hit = rule_classify("", "NETFLIX 月額", &dicts, &cats).unwrap();
        assert_eq!(hit.category, "サブスク（Netflix, Spotify など）");
    }

    #[test]
    fn test_no_rule_matches() {
        let (dicts, cats) = fixtures();
        assert!(rule_classify("謎の店", "ガムテープ", &dicts, &cats).is_none());
        assert!(rule_classify("", "", &dicts, &cats).is_none());
    }
}
