use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::model::{Brand, BrandRecord, Payload, Station};
use crate::pricing::rank;

/// Compose the response envelope from aggregator output.
#[must_use]
pub fn assemble(
    at: DateTime<Utc>,
    stations: Vec<Station>,
    by_brand: BTreeMap<Brand, BrandRecord>,
) -> Payload {
    let ranked = rank(&by_brand);
    Payload {
        at,
        stations,
        by_brand,
        ranked,
    }
}

/// Payload served before anything was computed or ingested.
#[must_use]
pub fn empty_payload(at: DateTime<Utc>, stations: Vec<Station>) -> Payload {
    assemble(at, stations, BTreeMap::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GradeVariant;
    use crate::stations::default_registry;
    use rust_decimal::Decimal;

    #[test]
    fn assemble_ranks_by_brand_records() {
        let mut by_brand = BTreeMap::new();
        for (brand, millis) in [(Brand::Galp, 1559), (Brand::Prio, 1529)] {
            let price = Decimal::new(millis, 3);
            by_brand.insert(
                brand,
                BrandRecord {
                    brand,
                    station_name: format!("{brand} station"),
                    location: "Seixal".to_string(),
                    price_raw: price,
                    price_type: GradeVariant::Simples,
                    price_adj: price,
                },
            );
        }

        let at = Utc::now();
        let payload = assemble(at, default_registry(), by_brand);
        assert_eq!(payload.at, at);
        assert_eq!(payload.stations.len(), 6);
        assert_eq!(payload.ranked.len(), 2);
        assert_eq!(payload.ranked[0].brand, Brand::Prio);
    }

    #[test]
    fn empty_payload_serializes_expected_shape() {
        let payload = empty_payload(Utc::now(), vec![]);
        let json = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(json["byBrand"], serde_json::json!({}));
        assert_eq!(json["ranked"], serde_json::json!([]));
        assert!(json["at"].is_string());
    }
}
