//! Grade-95 price scan over rendered station markup.

use std::sync::LazyLock;

use fuelwatch_core::{GradeVariant, PriceObservation};
use regex::Regex;

use super::dedupe;
use crate::parse::{clean_text, parse_currency};

/// Grade marker followed, within 200 characters, by a three-decimal price.
static GRADE_95_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)gasolina 95.{0,200}?(\d+,\d{3})\b").expect("valid grade-95 regex")
});

/// Looser scan for tag-stripped text: tolerates a grade word between
/// `gasolina` and `95` and a wider gap before the price.
static GRADE_95_LOOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)gasolina\s*(?:[a-z]+\s+)?95.{0,300}?(\d+[,.]\d{3})\b")
        .expect("valid loose grade-95 regex")
});

/// Scan station markup for 95-octane prices.
///
/// Runs the strict scan over the lowercased markup first; only when it finds
/// nothing is the loose scan applied to the tag-stripped text.
pub(super) fn extract_html_prices(html: &str) -> Vec<PriceObservation> {
    let lower = html.to_lowercase();
    let strict = scan(&GRADE_95_RE, &lower);
    if !strict.is_empty() {
        return dedupe(strict);
    }

    let text = clean_text(&lower);
    dedupe(scan(&GRADE_95_LOOSE_RE, &text))
}

fn scan(re: &Regex, lower: &str) -> Vec<PriceObservation> {
    re.captures_iter(lower)
        .filter_map(|caps| {
            let span = caps.get(0)?.as_str();
            let value = parse_currency(caps.get(1)?.as_str())?;
            PriceObservation::new(GradeVariant::classify(span), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn eur(millis: i64) -> Decimal {
        Decimal::new(millis, 3)
    }

    fn pairs(observations: &[PriceObservation]) -> Vec<(GradeVariant, Decimal)> {
        observations
            .iter()
            .map(|o| (o.variant(), o.value()))
            .collect()
    }

    #[test]
    fn classifies_especial_and_simples_rows() {
        let html = r#"
            <table class="precos">
              <tr><td>Gasolina 95 Especial</td><td>€ 1,789</td></tr>
              <tr><td>Gasolina 95</td><td>€ 1,649</td></tr>
            </table>"#;
        let found = pairs(&extract_html_prices(html));
        assert_eq!(
            found,
            vec![(GradeVariant::Especial, eur(1789)), (GradeVariant::Simples, eur(1649))]
        );
    }

    #[test]
    fn additive_and_plus_markers_mean_especial() {
        let html = "<li>Gasolina 95 Aditivada: 1,719 €</li><li>Gasolina 95+ 1,759 €</li>";
        let found = pairs(&extract_html_prices(html));
        assert_eq!(
            found,
            vec![(GradeVariant::Especial, eur(1719)), (GradeVariant::Especial, eur(1759))]
        );
    }

    #[test]
    fn duplicate_rows_are_collapsed() {
        let html = "<p>Gasolina 95 € 1,649</p><div>Gasolina 95 € 1,649</div>";
        assert_eq!(extract_html_prices(html).len(), 1);
    }

    #[test]
    fn price_beyond_window_is_ignored() {
        let filler = "x".repeat(400);
        let html = format!("<p>Gasolina 95</p>{filler}<p>1,649</p>");
        assert!(extract_html_prices(&html).is_empty());
    }

    #[test]
    fn requires_exactly_three_fraction_digits() {
        let html = "<p>Gasolina 95 € 1,6490</p>";
        assert!(extract_html_prices(html).is_empty());
    }

    #[test]
    fn fallback_handles_grade_word_between_marker_and_octane() {
        let html = r#"
            <div class="combustivel">
              <span class="nome">Gasolina
                 simples</span> <span class="oct">95</span>
              <span class="preco">1,639&nbsp;&euro;</span>
            </div>"#;
        let found = pairs(&extract_html_prices(html));
        assert_eq!(found, vec![(GradeVariant::Simples, eur(1639))]);
    }

    #[test]
    fn diesel_only_page_yields_nothing() {
        let html = "<tr><td>Gasóleo simples</td><td>1,549 €</td></tr>";
        assert!(extract_html_prices(html).is_empty());
    }
}
