//! HTTP client for the upstream price sources.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::ScraperError;

const ACCEPT_LANGUAGE: &str = "pt-PT,pt;q=0.9,en;q=0.8";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8";

/// Raw upstream response, kept even when the status is not a success.
#[derive(Debug, Clone)]
pub struct UpstreamDocument {
    pub status: u16,
    pub body: String,
}

impl UpstreamDocument {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Upstream HTTP client.
///
/// Holds two `reqwest` clients: a strict one used for every host, and a
/// relaxed one that skips certificate verification, used only for hosts in
/// `insecure_hosts` (upstreams known to serve a broken certificate chain).
pub struct UpstreamClient {
    strict: Client,
    relaxed: Client,
    insecure_hosts: Vec<String>,
}

impl UpstreamClient {
    /// Creates an `UpstreamClient` with the given per-request timeout and
    /// `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if either underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        insecure_hosts: Vec<String>,
    ) -> Result<Self, ScraperError> {
        let builder = || {
            Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .connect_timeout(Duration::from_secs(10))
                .user_agent(user_agent)
        };

        let strict = builder().build()?;
        let relaxed = builder().danger_accept_invalid_certs(true).build()?;

        Ok(Self {
            strict,
            relaxed,
            insecure_hosts: insecure_hosts
                .into_iter()
                .map(|h| h.to_lowercase())
                .collect(),
        })
    }

    /// Builds a client from the scraper settings in `config`.
    ///
    /// # Errors
    ///
    /// See [`UpstreamClient::new`].
    pub fn from_config(config: &fuelwatch_core::AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            config.scraper_request_timeout_secs,
            &config.scraper_user_agent,
            config.insecure_tls_hosts.clone(),
        )
    }

    fn client_for(&self, url: &Url) -> &Client {
        let relaxed = url.host_str().is_some_and(|host| {
            let host = host.to_lowercase();
            self.insecure_hosts.iter().any(|h| *h == host)
        });
        if relaxed {
            &self.relaxed
        } else {
            &self.strict
        }
    }

    /// Fetches `url` and returns the status and body, whatever the status.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::InvalidUrl`]: `url` does not parse.
    /// - [`ScraperError::Http`]: network, TLS or timeout failure.
    pub async fn fetch_document(&self, url: &str) -> Result<UpstreamDocument, ScraperError> {
        let parsed = Url::parse(url).map_err(|e| ScraperError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;

        let response = self
            .client_for(&parsed)
            .get(parsed)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .header(reqwest::header::ACCEPT_LANGUAGE, ACCEPT_LANGUAGE)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(UpstreamDocument { status, body })
    }

    /// Fetches `url` and returns the body of a successful response.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::UnexpectedStatus`]: any non-2xx status.
    /// - Everything [`UpstreamClient::fetch_document`] returns.
    pub async fn fetch_text(&self, url: &str) -> Result<String, ScraperError> {
        let document = self.fetch_document(url).await?;
        if !document.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: document.status,
                url: url.to_owned(),
            });
        }
        Ok(document.body)
    }
}
