//! Extraction strategies, one per upstream representation.
//!
//! Every strategy is a pure function of the raw payload and never fails:
//! input it cannot understand yields no observations.

mod html;
mod json_api;
mod page;

use fuelwatch_core::{PriceObservation, SourceKind};

pub use page::extract_page_stations;

/// Extract 95-octane price observations from a raw upstream payload.
///
/// For [`SourceKind::AggregatorPage`] the observations of every station block
/// on the page are returned together; use [`extract_page_stations`] to keep
/// them apart.
#[must_use]
pub fn extract(raw: &str, kind: SourceKind) -> Vec<PriceObservation> {
    match kind {
        SourceKind::HtmlById => html::extract_html_prices(raw),
        SourceKind::JsonApi => json_api::extract_json_prices(raw),
        SourceKind::AggregatorPage => extract_page_stations(raw, "")
            .into_iter()
            .flat_map(|entry| entry.observations)
            .collect(),
    }
}

/// Drop repeated `(variant, value)` pairs, keeping first-seen order.
fn dedupe(observations: Vec<PriceObservation>) -> Vec<PriceObservation> {
    let mut unique: Vec<PriceObservation> = Vec::with_capacity(observations.len());
    for obs in observations {
        if !unique.contains(&obs) {
            unique.push(obs);
        }
    }
    unique
}
