//! Refresh pipeline: fetch every upstream document, extract, aggregate and
//! assemble one [`Payload`].

use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use fuelwatch_core::{
    aggregate, assemble, AppConfig, Discount, Payload, SourceKind, Station, StationObservations,
};

use crate::client::UpstreamClient;
use crate::error::ScraperError;
use crate::extract::{extract, extract_page_stations};
use crate::pacing::Pacer;

/// Everything the pipeline needs besides the HTTP client and the registry.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub source: SourceKind,
    pub html_base_url: String,
    pub json_base_url: String,
    pub aggregator_url: Option<String>,
    pub region: String,
    pub max_concurrent_stations: usize,
    pub inter_request_delay: Duration,
    pub discount: Discount,
}

impl PipelineOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            source: config.source,
            html_base_url: config.html_base_url.clone(),
            json_base_url: config.json_base_url.clone(),
            aggregator_url: config.aggregator_url.clone(),
            region: config.region.clone(),
            max_concurrent_stations: config.scraper_max_concurrent_stations,
            inter_request_delay: Duration::from_millis(config.scraper_inter_request_delay_ms),
            discount: config.discount,
        }
    }

    /// Upstream URL of one station's document. Ids are appended verbatim to
    /// the base URL of the configured per-station source.
    ///
    /// Returns `None` for the aggregator page, which has no per-station URL.
    #[must_use]
    pub fn station_url(&self, station: &Station) -> Option<String> {
        let base = match self.source {
            SourceKind::HtmlById => &self.html_base_url,
            SourceKind::JsonApi => &self.json_base_url,
            SourceKind::AggregatorPage => return None,
        };
        Some(format!("{base}{}", station.id))
    }
}

/// Fetch and extract observations for every station.
///
/// Per-station sources fetch each registry entry; a failed fetch is logged
/// and contributes an empty observation list. The aggregator page is a single
/// fetch whose blocks become the stations.
///
/// # Errors
///
/// - [`ScraperError::AllFetchesFailed`]: every per-station fetch failed.
/// - [`ScraperError::MissingAggregatorUrl`]: page source without a URL.
/// - Any [`UpstreamClient::fetch_text`] error of the aggregator page fetch.
pub async fn collect_observations(
    client: &UpstreamClient,
    options: &PipelineOptions,
    registry: &[Station],
) -> Result<Vec<StationObservations>, ScraperError> {
    match options.source {
        SourceKind::AggregatorPage => collect_from_page(client, options).await,
        SourceKind::HtmlById | SourceKind::JsonApi => {
            collect_by_station(client, options, registry).await
        }
    }
}

async fn collect_by_station(
    client: &UpstreamClient,
    options: &PipelineOptions,
    registry: &[Station],
) -> Result<Vec<StationObservations>, ScraperError> {
    let pacer = Pacer::new(options.inter_request_delay);
    let max_concurrent = options.max_concurrent_stations.max(1);

    let results: Vec<(StationObservations, bool)> = stream::iter(registry.iter().cloned())
        .map(|station| fetch_station(client, options, &pacer, station))
        .buffered(max_concurrent)
        .collect()
        .await;

    let attempted = results.len();
    let succeeded = results.iter().filter(|(_, ok)| *ok).count();
    if attempted > 0 && succeeded == 0 {
        return Err(ScraperError::AllFetchesFailed { attempted });
    }

    Ok(results.into_iter().map(|(entry, _)| entry).collect())
}

async fn collect_from_page(
    client: &UpstreamClient,
    options: &PipelineOptions,
) -> Result<Vec<StationObservations>, ScraperError> {
    let url = options
        .aggregator_url
        .as_deref()
        .ok_or(ScraperError::MissingAggregatorUrl)?;

    let raw = client.fetch_text(url).await?;
    let stations = extract_page_stations(&raw, &options.region);
    tracing::debug!(url, blocks = stations.len(), "aggregator page fetched");
    Ok(stations)
}

/// Fetch and extract one station. The flag reports whether the fetch itself
/// succeeded, independent of how many observations it produced.
async fn fetch_station(
    client: &UpstreamClient,
    options: &PipelineOptions,
    pacer: &Pacer,
    station: Station,
) -> (StationObservations, bool) {
    let Some(url) = options.station_url(&station) else {
        return (empty(station), false);
    };
    pacer.wait().await;

    match client.fetch_text(&url).await {
        Ok(raw) => {
            let observations = extract(&raw, options.source);
            tracing::debug!(
                station = %station.id,
                observations = observations.len(),
                "station fetched"
            );
            (
                StationObservations {
                    station,
                    observations,
                },
                true,
            )
        }
        Err(e) => {
            tracing::warn!(
                station = %station.id,
                url = %url,
                error = %e,
                "station fetch failed; contributing no observations"
            );
            (empty(station), false)
        }
    }
}

fn empty(station: Station) -> StationObservations {
    StationObservations {
        station,
        observations: vec![],
    }
}

/// Run one full refresh cycle and return the assembled payload.
///
/// The payload's station list is the registry for per-station sources and
/// the discovered blocks for the aggregator page.
///
/// # Errors
///
/// - [`ScraperError::NoObservations`]: the upstream answered but no brand
///   came out of it (blocked pages, `{"status": false}`, a page without
///   blocks).
/// - Everything [`collect_observations`] returns.
pub async fn build_payload(
    client: &UpstreamClient,
    options: &PipelineOptions,
    registry: &[Station],
) -> Result<Payload, ScraperError> {
    let collected = collect_observations(client, options, registry).await?;
    let by_brand = aggregate(&collected, &options.discount);
    if by_brand.is_empty() {
        return Err(ScraperError::NoObservations {
            stations: collected.len(),
        });
    }

    let stations = match options.source {
        SourceKind::AggregatorPage => collected.into_iter().map(|entry| entry.station).collect(),
        SourceKind::HtmlById | SourceKind::JsonApi => registry.to_vec(),
    };

    tracing::info!(
        source = %options.source,
        stations = stations.len(),
        brands = by_brand.len(),
        "payload assembled"
    );
    Ok(assemble(Utc::now(), stations, by_brand))
}
