use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::model::Brand;

/// Which upstream representation a deployment scrapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// One rendered HTML page per station id.
    HtmlById,
    /// One JSON document per station id.
    JsonApi,
    /// A single third-party page listing every station in the region.
    AggregatorPage,
}

impl SourceKind {
    /// Default cache TTL for this source.
    ///
    /// The aggregator page updates less often and is costlier to fetch.
    #[must_use]
    pub fn default_ttl_secs(self) -> u64 {
        match self {
            SourceKind::HtmlById | SourceKind::JsonApi => 15 * 60,
            SourceKind::AggregatorPage => 60 * 60,
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::HtmlById => write!(f, "html"),
            SourceKind::JsonApi => write!(f, "json"),
            SourceKind::AggregatorPage => write!(f, "page"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "html" => Ok(SourceKind::HtmlById),
            "json" => Ok(SourceKind::JsonApi),
            "page" => Ok(SourceKind::AggregatorPage),
            other => Err(format!("unknown source '{other}'; expected html, json or page")),
        }
    }
}

/// Behavior of a read against a cache that has never been populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Refresh synchronously from upstream.
    Pull,
    /// Serve a zero payload and wait for an external producer to ingest.
    Push,
}

impl std::fmt::Display for CacheMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheMode::Pull => write!(f, "pull"),
            CacheMode::Push => write!(f, "push"),
        }
    }
}

impl FromStr for CacheMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pull" => Ok(CacheMode::Pull),
            "push" => Ok(CacheMode::Push),
            other => Err(format!("unknown cache mode '{other}'; expected pull or push")),
        }
    }
}

/// Fixed deduction applied to a single brand's raw price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discount {
    pub brand: Brand,
    pub amount: Decimal,
}

impl Discount {
    /// Discount for `brand`: the configured amount for the discounted brand,
    /// zero for every other one.
    #[must_use]
    pub fn for_brand(&self, brand: Brand) -> Decimal {
        if brand == self.brand {
            self.amount
        } else {
            Decimal::ZERO
        }
    }
}

impl Default for Discount {
    fn default() -> Self {
        Self {
            brand: Brand::Galp,
            amount: Decimal::new(19, 2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub stations_path: Option<PathBuf>,
    pub source: SourceKind,
    pub cache_mode: CacheMode,
    pub cache_ttl_secs: u64,
    pub discount: Discount,
    pub html_base_url: String,
    pub json_base_url: String,
    pub aggregator_url: Option<String>,
    pub region: String,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub scraper_max_concurrent_stations: usize,
    pub scraper_inter_request_delay_ms: u64,
    pub insecure_tls_hosts: Vec<String>,
}

impl AppConfig {
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
