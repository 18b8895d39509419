//! Cheapest-per-brand reduction and ranking.
//!
//! Both functions are pure: the same observations in the same registry order
//! always produce the same records, which keeps the first-seen tie-break
//! deterministic.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::app_config::Discount;
use crate::model::{Brand, BrandRecord, PriceObservation, StationObservations};

/// Reduce per-station observations to one record per brand.
///
/// Each station contributes its cheapest observation; each brand keeps the
/// cheapest station, with ties resolved in favor of the station seen first.
/// Stations without observations contribute nothing. The discount is applied
/// after the scan, so it never affects which station wins.
#[must_use]
pub fn aggregate(
    stations: &[StationObservations],
    discount: &Discount,
) -> BTreeMap<Brand, BrandRecord> {
    let mut best: BTreeMap<Brand, BrandRecord> = BTreeMap::new();

    for entry in stations {
        let Some(cheapest) = cheapest_observation(&entry.observations) else {
            continue;
        };

        let brand = entry.station.brand;
        let keeps_current = best
            .get(&brand)
            .is_some_and(|current| current.price_raw <= cheapest.value());
        if keeps_current {
            continue;
        }

        best.insert(
            brand,
            BrandRecord {
                brand,
                station_name: entry.station.name.clone(),
                location: entry.station.location.clone(),
                price_raw: cheapest.value(),
                price_type: cheapest.variant(),
                price_adj: cheapest.value(),
            },
        );
    }

    for record in best.values_mut() {
        record.price_adj = adjusted_price(record.price_raw, discount.for_brand(record.brand));
    }

    best
}

/// Order brand records ascending by adjusted price.
///
/// The sort is stable, so equal prices keep brand iteration order.
#[must_use]
pub fn rank(by_brand: &BTreeMap<Brand, BrandRecord>) -> Vec<BrandRecord> {
    let mut ranked: Vec<BrandRecord> = by_brand.values().cloned().collect();
    ranked.sort_by_key(|record| record.price_adj);
    ranked
}

/// `max(raw - discount, 0)`, exact in decimal arithmetic. A non-positive
/// discount returns `raw` untouched.
#[must_use]
pub fn adjusted_price(raw: Decimal, discount: Decimal) -> Decimal {
    if discount <= Decimal::ZERO {
        return raw;
    }
    (raw - discount).max(Decimal::ZERO)
}

// First minimum in input order.
fn cheapest_observation(observations: &[PriceObservation]) -> Option<PriceObservation> {
    observations
        .iter()
        .copied()
        .reduce(|best, next| if next.value() < best.value() { next } else { best })
}

#[cfg(test)]
#[path = "pricing_test.rs"]
mod tests;
