//! Best-effort coercion of oracle-extracted price text.

/// Strip the yen sign and thousands separators, then parse as a float.
/// Unparseable input degrades to `None`; the item is still created and
/// classified downstream.
pub fn coerce_price(raw: &str) -> Option<f64> {
    let cleaned = raw.replace('¥', "").replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yen_and_thousands_separator() {
        assert_eq!(coerce_price("¥1,234"), Some(1234.0));
        assert_eq!(coerce_price("198"), Some(198.0));
        assert_eq!(coerce_price(" 1,280 "), Some(1280.0));
    }

    #[test]
    fn test_unparseable_degrades_to_none() {
        assert_eq!(coerce_price("N/A"), None);
        assert_eq!(coerce_price(""), None);
        assert_eq!(coerce_price("無料"), None);
    }

    #[test]
    fn test_decimal_prices() {
        assert_eq!(coerce_price("128.5"), Some(128.5));
    }
}
