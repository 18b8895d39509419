//! Canonical price schema shared by every upstream source.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Retail brand of a station.
///
/// Variant order is the brand iteration order used by `byBrand` and by the
/// ranking tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Brand {
    Galp,
    Prio,
    Cepsa,
    Unknown,
}

impl Brand {
    /// Brands that can be recognized by name in upstream markup.
    pub const KNOWN: [Brand; 3] = [Brand::Galp, Brand::Prio, Brand::Cepsa];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Brand::Galp => "galp",
            Brand::Prio => "prio",
            Brand::Cepsa => "cepsa",
            Brand::Unknown => "unknown",
        }
    }

    /// Infer a brand from free text by substring match against the known
    /// brand names. Falls back to [`Brand::Unknown`].
    #[must_use]
    pub fn infer_from_text(text: &str) -> Brand {
        let lower = text.to_lowercase();
        Brand::KNOWN
            .into_iter()
            .find(|brand| lower.contains(brand.as_str()))
            .unwrap_or(Brand::Unknown)
    }

    /// Display name used when an upstream block carries no station name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Brand::Galp => "Galp",
            Brand::Prio => "PRIO",
            Brand::Cepsa => "Cepsa",
            Brand::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Brand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "galp" => Ok(Brand::Galp),
            "prio" => Ok(Brand::Prio),
            "cepsa" => Ok(Brand::Cepsa),
            "unknown" => Ok(Brand::Unknown),
            other => Err(format!(
                "unknown brand '{other}'; expected galp, prio, cepsa or unknown"
            )),
        }
    }
}

/// Sub-classification of the 95-octane grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeVariant {
    Simples,
    Especial,
}

impl GradeVariant {
    /// Classify a lowercased label or markup span.
    ///
    /// Premium/additized grades are marked by `especial`, `aditiv` or `+`.
    #[must_use]
    pub fn classify(lower: &str) -> GradeVariant {
        if lower.contains("especial") || lower.contains("aditiv") || lower.contains('+') {
            GradeVariant::Especial
        } else {
            GradeVariant::Simples
        }
    }
}

/// Opaque station identifier.
///
/// Registries and upstream documents carry both numeric and textual ids, so
/// deserialization accepts either and keeps the textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StationId(String);

impl StationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Number(n) => Self(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub brand: Brand,
    pub name: String,
    pub location: String,
}

/// One price reading for the 95-octane grade.
///
/// Only constructible through [`PriceObservation::new`], so every instance
/// holds a strictly positive value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceObservation {
    variant: GradeVariant,
    value: Decimal,
}

impl PriceObservation {
    /// Returns `None` unless `value` is strictly positive.
    #[must_use]
    pub fn new(variant: GradeVariant, value: Decimal) -> Option<Self> {
        (value > Decimal::ZERO).then_some(Self { variant, value })
    }

    #[must_use]
    pub fn variant(&self) -> GradeVariant {
        self.variant
    }

    #[must_use]
    pub fn value(&self) -> Decimal {
        self.value
    }
}

/// All observations extracted for one station (or one aggregator-page block).
#[derive(Debug, Clone, PartialEq)]
pub struct StationObservations {
    pub station: Station,
    pub observations: Vec<PriceObservation>,
}

/// Cheapest reading for one brand, with its discount-adjusted price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandRecord {
    pub brand: Brand,
    pub station_name: String,
    pub location: String,
    pub price_raw: Decimal,
    pub price_type: GradeVariant,
    pub price_adj: Decimal,
}

/// Unit of caching and of the read response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    pub at: DateTime<Utc>,
    pub stations: Vec<Station>,
    pub by_brand: BTreeMap<Brand, BrandRecord>,
    pub ranked: Vec<BrandRecord>,
}
