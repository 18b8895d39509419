//! Text-level helpers shared by the extractors.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

/// A European-format price with optional currency symbol and per-litre unit:
/// `1,649`, `€ 1,649`, `1,649 €`, `1,649 €/litro`, `1.649 EUR/l`.
static CURRENCY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:€|eur)?\s*(\d+(?:[.,]\d+)?)\s*(?:€|eur)?\s*(?:/\s*l(?:itro)?)?$")
        .expect("valid currency regex")
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Parses a European-format currency amount.
///
/// Returns `None` for anything that is not a single decimal number with an
/// optional currency symbol and unit suffix. Never panics.
#[must_use]
pub fn parse_currency(raw: &str) -> Option<Decimal> {
    let trimmed = raw.replace('\u{a0}', " ");
    let caps = CURRENCY_RE.captures(trimmed.trim())?;
    let number = caps.get(1)?.as_str().replace(',', ".");
    number.parse::<Decimal>().ok()
}

/// Replaces markup tags with spaces, decodes the few entities that show up
/// around prices, and collapses whitespace.
#[must_use]
pub fn clean_text(html: &str) -> String {
    let without_tags = TAG_RE.replace_all(html, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&euro;", "€")
        .replace("&#8364;", "€")
        .replace("&amp;", "&");
    WHITESPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

/// First `max_chars` characters of the cleaned text of `html`.
#[must_use]
pub fn snippet(html: &str, max_chars: usize) -> String {
    clean_text(html).chars().take(max_chars).collect()
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
