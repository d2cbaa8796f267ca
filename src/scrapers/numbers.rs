//! Numeric primitives for the yen amounts and sizes printed on listings.

use regex::Regex;
use std::sync::LazyLock;

static MAN_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9.]+)\s*万").expect("Invalid man-yen regex"));
static LEADING_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?[0-9]+)").expect("Invalid integer regex"));
static MONTHS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9.]+)\s*ヶ?月").expect("Invalid months regex"));
static AREA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)\s*m").expect("Invalid area regex"));

/// Parse a yen amount such as "8.5万円", "5,000円" or "12000".
///
/// A "万" token is multiplied by 10,000 and rounded; otherwise the
/// leading integer is used. Anything unparseable is 0.
pub fn parse_japanese_currency(text: &str) -> i64 {
    if text.is_empty() {
        return 0;
    }
    let cleaned = text.replace([',', '円'], "");
    let cleaned = cleaned.trim();

    if let Some(caps) = MAN_AMOUNT.captures(cleaned) {
        return caps[1]
            .parse::<f64>()
            .map(|man| (man * 10_000.0).round() as i64)
            .unwrap_or(0);
    }

    LEADING_INT
        .captures(cleaned)
        .and_then(|caps| caps[1].parse::<i64>().ok())
        .unwrap_or(0)
}

/// Parse a deposit-style value that is either "N months' rent" or an
/// absolute amount. "-" and "なし" mean none.
pub fn parse_months(text: &str, rent: i64) -> i64 {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "-" || trimmed == "なし" {
        return 0;
    }

    if let Some(caps) = MONTHS.captures(trimmed) {
        return caps[1]
            .parse::<f64>()
            .map(|months| (months * rent as f64).round() as i64)
            .unwrap_or(0);
    }

    parse_japanese_currency(trimmed)
}

/// First "<number>m" token, e.g. 52.36 from "52.36m²"
pub fn parse_area(text: &str) -> f64 {
    AREA.captures(text)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn man_yen_is_multiplied_and_rounded() {
        assert_eq!(parse_japanese_currency("8.5万円"), 85_000);
        assert_eq!(parse_japanese_currency("12.35万円"), 123_500);
        assert_eq!(parse_japanese_currency("7.25 万円"), 72_500);
    }

    #[test]
    fn plain_yen_keeps_leading_integer() {
        assert_eq!(parse_japanese_currency("5,000円"), 5_000);
        assert_eq!(parse_japanese_currency("12000"), 12_000);
        assert_eq!(parse_japanese_currency("3000円(税込)"), 3_000);
    }

    #[test]
    fn garbage_is_zero() {
        assert_eq!(parse_japanese_currency(""), 0);
        assert_eq!(parse_japanese_currency("-"), 0);
        assert_eq!(parse_japanese_currency("なし"), 0);
        assert_eq!(parse_japanese_currency("応相談"), 0);
    }

    #[test]
    fn months_scale_with_rent() {
        assert_eq!(parse_months("1ヶ月", 85_000), 85_000);
        assert_eq!(parse_months("1.5ヶ月", 80_000), 120_000);
        assert_eq!(parse_months("2月", 50_000), 100_000);
        assert_eq!(parse_months("なし", 85_000), 0);
        assert_eq!(parse_months("-", 85_000), 0);
        assert_eq!(parse_months("10万円", 85_000), 100_000);
    }

    #[test]
    fn area_takes_first_metre_token() {
        assert_eq!(parse_area("52.36m²"), 52.36);
        assert_eq!(parse_area("25 m2 (壁芯)"), 25.0);
        assert_eq!(parse_area("不明"), 0.0);
    }
}
