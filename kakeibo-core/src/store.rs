//! Store-name extraction from receipt headings.
//!
//! OCR output for a receipt usually carries the store name somewhere in the
//! first few lines, buried between boilerplate (合計, TEL, 日付 …). Known
//! merchants are matched first; a heading scan is the last local resort.

use std::sync::LazyLock;

use regex::Regex;

use crate::chain::FallbackChain;
use crate::config::Dictionaries;

/// Everything that does not count as "real text" when deciding whether a
/// heading line is mostly punctuation or digits.
static NON_TEXTUAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w一-龠ぁ-んァ-ヶー・\-\s]").unwrap());

static BRANCH_STYLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"店|本店|支店").unwrap());

static BRAND_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"スーパー|ドラッグ|マート|コーヒー|カフェ|電鉄|百貨店|ショッピング|モール").unwrap()
});

static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Lines scanned by the heading heuristic.
const HEADING_LINES: usize = 20;

/// Store names are capped at this many characters.
const MAX_STORE_CHARS: usize = 50;

/// Strip corporate-entity tokens, unify whitespace (full-width included),
/// and cap the length.
pub fn normalize_store_name(raw: &str, dicts: &Dictionaries) -> String {
    let mut name = raw.trim().to_string();
    for token in &dicts.corporate_tokens {
        if !token.is_empty() {
            name = name.replace(token.as_str(), "");
        }
    }
    let name = name.replace('　', " ");
    let name = WHITESPACE_RUN.replace_all(&name, " ");
    name.trim().chars().take(MAX_STORE_CHARS).collect()
}

/// Extract a normalized store name, or empty when nothing plausible is found.
pub fn extract_store_name(text: &str, dicts: &Dictionaries) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    FallbackChain::new()
        .step("merchant-dictionary", || merchant_line(text, dicts))
        .step("latin-brand", || latin_brand(text, dicts))
        .step("heading", || heading_store_name(text, dicts))
        .resolve()
        .map(|hit| hit.value)
        .unwrap_or_default()
}

/// Prepend an externally detected brand (logo recognition) unless the
/// extracted name already carries it.
pub fn apply_brand_hint(name: &str, hint: &str, dicts: &Dictionaries) -> String {
    if hint.is_empty() || name.contains(hint) {
        return name.to_string();
    }
    normalize_store_name(&format!("{hint} {name}"), dicts)
}

/// Dictionary scan: for the first known merchant appearing anywhere in the
/// text, take the longest line containing it (more context = better
/// candidate).
fn merchant_line(text: &str, dicts: &Dictionaries) -> Option<String> {
    for rule in &dicts.merchants {
        if rule.name.is_empty() || !text.contains(rule.name.as_str()) {
            continue;
        }
        let line = text
            .lines()
            .filter(|l| l.contains(rule.name.as_str()))
            .max_by_key(|l| l.chars().count())?;
        return non_empty(normalize_store_name(line, dicts));
    }
    None
}

fn latin_brand(text: &str, dicts: &Dictionaries) -> Option<String> {
    let lower = text.to_lowercase();
    let brand = dicts
        .latin_brands
        .iter()
        .find(|b| !b.is_empty() && lower.contains(&b.to_lowercase()))?;
    non_empty(normalize_store_name(brand, dicts))
}

/// Heading heuristic over the first lines of the receipt: skip boilerplate,
/// pair up a branch-style line (…店/本店/支店) with a brand-style line
/// (スーパー/カフェ/…), and fall back to the very first usable line.
///
/// Exposed on its own because header resolution re-invokes it as a last
/// resort when the oracle fails to produce a store name.
pub fn heading_store_name(text: &str, dicts: &Dictionaries) -> Option<String> {
    let head: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(HEADING_LINES)
        .collect();

    let mut branch_line = "";
    let mut brand_line = "";
    for &line in &head {
        if dicts
            .heading_ban_words
            .iter()
            .any(|b| !b.is_empty() && line.contains(b.as_str()))
        {
            continue;
        }
        if NON_TEXTUAL.replace_all(line, "").chars().count() < 2 {
            continue;
        }
        if BRANCH_STYLE.is_match(line) {
            branch_line = line;
        }
        if BRAND_STYLE.is_match(line) {
            brand_line = line;
        }
        if !branch_line.is_empty() && !brand_line.is_empty() {
            let combined = if branch_line == brand_line {
                branch_line.to_string()
            } else if brand_line.chars().count() >= branch_line.chars().count() {
                format!("{brand_line} {branch_line}")
            } else {
                format!("{branch_line} {brand_line}")
            };
            return non_empty(normalize_store_name(&combined, dicts));
        }
    }

    head.first()
        .map(|l| normalize_store_name(l, dicts))
        .and_then(non_empty)
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dicts() -> Dictionaries {
        Dictionaries::default_ja()
    }

    #[test]
    fn test_normalize_strips_corporate_tokens_and_width() {
        let d = dicts();
        assert_eq!(normalize_store_name("株式会社ドトール", &d), "ドトール");
        assert_eq!(normalize_store_name("  セブン　 イレブン  ", &d), "セブン イレブン");
        assert_eq!(normalize_store_name("㈱スギ薬局 梅田店", &d), "スギ薬局 梅田店");
    }

    #[test]
    fn test_normalize_caps_at_fifty_chars() {
        let d = dicts();
        let long = "あ".repeat(80);
        assert_eq!(normalize_store_name(&long, &d).chars().count(), 50);
    }

    #[test]
    fn test_merchant_scan_prefers_longest_line() {
        let d = dicts();
        let text = "ローソン\n株式会社ローソン 神戸三宮店\n2025/9/28";
        assert_eq!(extract_store_name(text, &d), "ローソン 神戸三宮店");
    }

    #[test]
    fn test_latin_brand_is_case_insensitive() {
        let d = dicts();
        let text = "lawson kobe\n2025/9/28\n合計 500";
        assert_eq!(extract_store_name(text, &d), "LAWSON");
    }

    #[test]
    fn test_heading_combines_brand_and_branch() {
        let d = dicts();
        let text = "領収書\n玉出スーパーマーケット\n梅田支店\n合計 1,234";
        // Longer line is the base, the other is appended.
        assert_eq!(extract_store_name(text, &d), "玉出スーパーマーケット 梅田支店");
    }

    #[test]
    fn test_heading_skips_boilerplate_and_falls_back_to_first_line() {
        let d = dicts();
        let text = "お買上ありがとうございます\nやまだ商店\nTEL 06-1234-5678";
        // No brand/branch pair found: first non-blank heading line wins.
        assert_eq!(extract_store_name(text, &d), "お買上ありがとうございます".to_string());
    }

    #[test]
    fn test_empty_input_yields_empty() {
        let d = dicts();
        assert_eq!(extract_store_name("", &d), "");
        assert_eq!(extract_store_name("   \n  ", &d), "");
    }

    #[test]
    fn test_brand_hint_prepended_once() {
        let d = dicts();
        assert_eq!(apply_brand_hint("梅田店", "LAWSON", &d), "LAWSON 梅田店");
        assert_eq!(apply_brand_hint("LAWSON 梅田店", "LAWSON", &d), "LAWSON 梅田店");
        assert_eq!(apply_brand_hint("梅田店", "", &d), "梅田店");
    }
}
