//! Upstream fetching and price extraction for fuelwatch.
//!
//! Each upstream representation (per-station HTML, per-station JSON, or a
//! regional aggregator page) has its own extraction strategy; all of them
//! converge on [`fuelwatch_core::PriceObservation`].

pub mod client;
pub mod error;
pub mod extract;
pub mod pacing;
pub mod parse;
pub mod pipeline;

pub use client::{UpstreamClient, UpstreamDocument};
pub use error::ScraperError;
pub use extract::{extract, extract_page_stations};
pub use parse::{clean_text, parse_currency};
pub use pipeline::{build_payload, collect_observations, PipelineOptions};
