//! Purchase-date extraction from noisy receipt OCR text.
//!
//! Japanese receipts mix Gregorian and era notations: `2025/9/28`,
//! `2025年9月28日`, `令和7年9月28日`, `R7.9.28`, `R7年9月28日`. Tiers are
//! tried in that order; every tier calendar-validates its own match and a
//! failed validation falls through to the next tier.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::chain::FallbackChain;

static GREGORIAN_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(20\d{2}|19\d{2})[/\-\.](\d{1,2})[/\-\.](\d{1,2})").unwrap());

static GREGORIAN_GLYPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(20\d{2}|19\d{2})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日").unwrap()
});

static ERA_GLYPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(令和|平成|昭和)\s*(\d{1,2})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日").unwrap()
});

static ERA_LETTER_NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([RrHhSs])(\d{1,2})[\./\-](\d{1,2})[\./\-](\d{1,2})").unwrap());

static ERA_LETTER_GLYPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([RrHhSs])\s*(\d{1,2})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日").unwrap()
});

/// Convert an era year to Gregorian: `gregorian = epoch_offset + era_year`.
///
/// Reiwa year 1 = 2019, Heisei year 1 = 1989, Shōwa year 1 = 1926. Unknown
/// eras map to year 0, which never survives calendar validation.
fn era_to_gregorian(era: &str, era_year: i32) -> i32 {
    match era.trim() {
        "令和" | "R" | "r" => 2018 + era_year,
        "平成" | "H" | "h" => 1988 + era_year,
        "昭和" | "S" | "s" => 1925 + era_year,
        _ => 0,
    }
}

/// Calendar validation. chrono's proleptic calendar accepts year 0, so the
/// unknown-era fallthrough has to be rejected here explicitly.
fn to_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    if year < 1 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

fn gregorian_numeric(text: &str) -> Option<NaiveDate> {
    let caps = GREGORIAN_NUMERIC.captures(text)?;
    to_date(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
}

fn gregorian_glyph(text: &str) -> Option<NaiveDate> {
    let caps = GREGORIAN_GLYPH.captures(text)?;
    to_date(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
}

fn era_glyph(text: &str) -> Option<NaiveDate> {
    let caps = ERA_GLYPH.captures(text)?;
    let year = era_to_gregorian(&caps[1], caps[2].parse().ok()?);
    to_date(year, caps[3].parse().ok()?, caps[4].parse().ok()?)
}

fn era_letter_numeric(text: &str) -> Option<NaiveDate> {
    let caps = ERA_LETTER_NUMERIC.captures(text)?;
    let year = era_to_gregorian(&caps[1], caps[2].parse().ok()?);
    to_date(year, caps[3].parse().ok()?, caps[4].parse().ok()?)
}

fn era_letter_glyph(text: &str) -> Option<NaiveDate> {
    let caps = ERA_LETTER_GLYPH.captures(text)?;
    let year = era_to_gregorian(&caps[1], caps[2].parse().ok()?);
    to_date(year, caps[3].parse().ok()?, caps[4].parse().ok()?)
}

/// Extract the purchase date from OCR text, or `None` when no tier matches
/// a valid calendar date.
pub fn extract_date(text: &str) -> Option<NaiveDate> {
    if text.is_empty() {
        return None;
    }
    // OCR tends to insert a space after the date glyphs: "2025年 9月 28日".
    let text = text.replace("年 ", "年").replace("月 ", "月").replace("日 ", "日");

    FallbackChain::new()
        .step("gregorian-numeric", || gregorian_numeric(&text))
        .step("gregorian-glyph", || gregorian_glyph(&text))
        .step("era-glyph", || era_glyph(&text))
        .step("era-letter-numeric", || era_letter_numeric(&text))
        .step("era-letter-glyph", || era_letter_glyph(&text))
        .resolve()
        .map(|hit| hit.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_gregorian_separators() {
        assert_eq!(extract_date("2025/9/28 12:34"), Some(date(2025, 9, 28)));
        assert_eq!(extract_date("2025-09-28"), Some(date(2025, 9, 28)));
        assert_eq!(extract_date("1999.1.5"), Some(date(1999, 1, 5)));
    }

    #[test]
    fn test_gregorian_glyphs_with_ocr_spaces() {
        assert_eq!(extract_date("2025年9月28日"), Some(date(2025, 9, 28)));
        assert_eq!(extract_date("2025年 9月 28日"), Some(date(2025, 9, 28)));
    }

    #[test]
    fn test_era_glyph_forms() {
        // Reiwa year 1 = 2019, Heisei year 1 = 1989, Shōwa year 1 = 1926.
        assert_eq!(extract_date("令和7年9月28日"), Some(date(2025, 9, 28)));
        assert_eq!(extract_date("平成31年1月8日"), Some(date(2019, 1, 8)));
        assert_eq!(extract_date("昭和64年1月7日"), Some(date(1989, 1, 7)));
        assert_eq!(extract_date("令和1年5月1日"), Some(date(2019, 5, 1)));
    }

    #[test]
    fn test_era_letter_forms() {
        assert_eq!(extract_date("R7.9.28"), Some(date(2025, 9, 28)));
        assert_eq!(extract_date("h31/1/8"), Some(date(2019, 1, 8)));
        assert_eq!(extract_date("S60-4-1"), Some(date(1985, 4, 1)));
        assert_eq!(extract_date("R7年9月28日"), Some(date(2025, 9, 28)));
    }

    #[test]
    fn test_invalid_dates_do_not_raise() {
        assert_eq!(extract_date("2025/13/1"), None);
        assert_eq!(extract_date("2025/2/30"), None);
        assert_eq!(extract_date("令和7年2月30日"), None);
        assert_eq!(extract_date(""), None);
        assert_eq!(extract_date("合計 ¥1,234"), None);
    }

    #[test]
    fn test_invalid_tier_falls_through_to_later_tier() {
        // The Gregorian match is impossible; the era tier should still win.
        let text = "2025/2/30\n令和7年9月28日";
        assert_eq!(extract_date(text), Some(date(2025, 9, 28)));
    }

    #[test]
    fn test_unknown_era_yields_year_zero() {
        assert_eq!(era_to_gregorian("大正", 5), 0);
        assert_eq!(to_date(0, 9, 28), None);
    }

    #[test]
    fn test_first_tier_wins_over_later_matches() {
        let text = "令和7年9月28日 2024/1/2";
        assert_eq!(extract_date(text), Some(date(2024, 1, 2)));
    }
}
