//! Subcommand handlers. Each one builds its own upstream client from the
//! loaded config and runs to completion.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use fuelwatch_core::{AppConfig, Payload, SourceKind, Station};
use fuelwatch_scraper::parse::snippet;
use fuelwatch_scraper::{build_payload, extract, PipelineOptions, UpstreamClient};

const SNIPPET_CHARS: usize = 400;

async fn run_pipeline(config: &AppConfig) -> anyhow::Result<Payload> {
    let registry = fuelwatch_core::resolve_registry(config.stations_path.as_deref())?;
    let client = UpstreamClient::from_config(config)?;
    let options = PipelineOptions::from_app_config(config);
    build_payload(&client, &options, &registry)
        .await
        .context("refresh pipeline failed")
}

pub(crate) async fn run_snapshot(config: &AppConfig, pretty: bool) -> anyhow::Result<()> {
    let payload = run_pipeline(config).await?;
    let json = if pretty {
        serde_json::to_string_pretty(&payload)?
    } else {
        serde_json::to_string(&payload)?
    };
    println!("{json}");
    Ok(())
}

pub(crate) async fn run_push(config: &AppConfig, endpoint: &str) -> anyhow::Result<()> {
    let payload = run_pipeline(config).await?;
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.scraper_request_timeout_secs))
        .user_agent(config.scraper_user_agent.as_str())
        .build()?;
    let ack = push_payload(&http, endpoint, &payload).await?;
    tracing::info!(endpoint, brands = payload.by_brand.len(), "payload pushed");
    println!("{ack}");
    Ok(())
}

/// POST `payload` to an ingest endpoint and return the acknowledgement body.
///
/// # Errors
///
/// Transport failures and any non-2xx response.
pub(crate) async fn push_payload(
    http: &reqwest::Client,
    endpoint: &str,
    payload: &Payload,
) -> anyhow::Result<String> {
    let response = http
        .post(endpoint)
        .json(payload)
        .send()
        .await
        .with_context(|| format!("failed to reach ingest endpoint {endpoint}"))?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if !status.is_success() {
        anyhow::bail!("ingest endpoint {endpoint} returned {status}: {body}");
    }
    Ok(body)
}

/// Upstream URL the probe fetches for the configured source.
///
/// # Errors
///
/// Fails when the page source has no aggregator URL, the registry is empty,
/// or a by-id source has nothing to build a URL from.
pub(crate) fn probe_url(
    options: &PipelineOptions,
    registry: &[Station],
    station: Option<&str>,
) -> anyhow::Result<String> {
    if options.source == SourceKind::AggregatorPage {
        return options
            .aggregator_url
            .clone()
            .context("FUELWATCH_AGGREGATOR_URL is not set");
    }

    let target = match station {
        Some(id) => registry
            .iter()
            .find(|s| s.id.as_str() == id)
            .cloned()
            .unwrap_or_else(|| Station {
                id: fuelwatch_core::StationId::new(id),
                brand: fuelwatch_core::Brand::Unknown,
                name: String::new(),
                location: String::new(),
            }),
        None => registry
            .first()
            .cloned()
            .context("station registry is empty")?,
    };

    options
        .station_url(&target)
        .context("source has no per-station URL")
}

pub(crate) async fn run_probe(
    config: &AppConfig,
    station: Option<&str>,
    save: Option<&Path>,
) -> anyhow::Result<()> {
    let registry = fuelwatch_core::resolve_registry(config.stations_path.as_deref())?;
    let options = PipelineOptions::from_app_config(config);
    let url = probe_url(&options, &registry, station)?;
    let client = UpstreamClient::from_config(config)?;

    let document = client.fetch_document(&url).await?;
    if let Some(path) = save {
        tokio::fs::write(path, &document.body)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), bytes = document.body.len(), "raw body saved");
    }

    println!("url: {url}");
    println!("status: {}", document.status);
    println!("snippet: {}", snippet(&document.body, SNIPPET_CHARS));

    let observations = extract(&document.body, options.source);
    if observations.is_empty() {
        println!("observations: none");
    }
    for obs in observations {
        println!("observation: {:?} {}", obs.variant(), obs.value());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fuelwatch_core::{default_registry, empty_payload, Discount};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options(source: SourceKind) -> PipelineOptions {
        PipelineOptions {
            source,
            html_base_url: "https://upstream.test/Posto/".to_string(),
            json_base_url: "https://upstream.test/api?id=".to_string(),
            aggregator_url: None,
            region: "Seixal".to_string(),
            max_concurrent_stations: 1,
            inter_request_delay: Duration::ZERO,
            discount: Discount::default(),
        }
    }

    #[test]
    fn probe_defaults_to_first_registry_station() {
        let url = probe_url(&options(SourceKind::HtmlById), &default_registry(), None)
            .expect("url");
        assert_eq!(url, "https://upstream.test/Posto/66099");
    }

    #[test]
    fn probe_accepts_ids_outside_the_registry() {
        let url = probe_url(&options(SourceKind::JsonApi), &default_registry(), Some("12345"))
            .expect("url");
        assert_eq!(url, "https://upstream.test/api?id=12345");
    }

    #[test]
    fn probe_page_source_needs_aggregator_url() {
        let mut opts = options(SourceKind::AggregatorPage);
        assert!(probe_url(&opts, &default_registry(), None).is_err());
        opts.aggregator_url = Some("https://aggregator.test/seixal".to_string());
        assert_eq!(
            probe_url(&opts, &[], Some("ignored")).expect("url"),
            "https://aggregator.test/seixal"
        );
    }

    #[tokio::test]
    async fn push_payload_returns_ack_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ingest"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
            .expect(1)
            .mount(&server)
            .await;

        let ack = push_payload(
            &reqwest::Client::new(),
            &format!("{}/ingest", server.uri()),
            &empty_payload(Utc::now(), vec![]),
        )
        .await
        .expect("push succeeds");
        assert_eq!(ack, r#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn push_payload_fails_on_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/ingest"))
            .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"error":"bad"}"#))
            .mount(&server)
            .await;

        let err = push_payload(
            &reqwest::Client::new(),
            &format!("{}/ingest", server.uri()),
            &empty_payload(Utc::now(), vec![]),
        )
        .await
        .expect_err("400 is an error");
        assert!(err.to_string().contains("400"));
    }
}
