use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid upstream URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("all {attempted} upstream fetches failed")]
    AllFetchesFailed { attempted: usize },

    #[error("no 95-octane price found across {stations} upstream stations")]
    NoObservations { stations: usize },

    #[error("aggregator page source selected but no aggregator URL configured")]
    MissingAggregatorUrl,
}
