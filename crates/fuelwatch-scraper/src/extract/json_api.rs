//! Station JSON documents: `{"resultado": {"Combustiveis": [...]}}`.

use fuelwatch_core::{GradeVariant, PriceObservation};
use rust_decimal::Decimal;
use serde_json::Value;

use super::dedupe;
use crate::parse::parse_currency;

pub(super) fn extract_json_prices(raw: &str) -> Vec<PriceObservation> {
    let Ok(document) = serde_json::from_str::<Value>(raw) else {
        return vec![];
    };

    let Some(entries) = document
        .get("resultado")
        .and_then(|r| r.get("Combustiveis").or_else(|| r.get("combustiveis")))
        .and_then(Value::as_array)
    else {
        return vec![];
    };

    let observations = entries
        .iter()
        .filter_map(|entry| {
            let label = entry
                .get("TipoCombustivel")
                .or_else(|| entry.get("label"))
                .and_then(Value::as_str)?
                .to_lowercase();
            if !(label.contains("gasolina") && label.contains("95")) {
                return None;
            }

            let value = match entry.get("Preco").or_else(|| entry.get("price"))? {
                Value::String(s) => parse_currency(s)?,
                Value::Number(n) => n.to_string().parse::<Decimal>().ok()?,
                _ => return None,
            };

            PriceObservation::new(GradeVariant::classify(&label), value)
        })
        .collect();

    dedupe(observations)
}
