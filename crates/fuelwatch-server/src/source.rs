use futures::future::BoxFuture;
use fuelwatch_core::{Payload, Station};
use fuelwatch_scraper::{build_payload, PipelineOptions, ScraperError, UpstreamClient};

use crate::cache::PayloadSource;

/// Live upstream pipeline behind the cache.
pub struct UpstreamSource {
    client: UpstreamClient,
    options: PipelineOptions,
    registry: Vec<Station>,
}

impl UpstreamSource {
    pub fn new(client: UpstreamClient, options: PipelineOptions, registry: Vec<Station>) -> Self {
        Self {
            client,
            options,
            registry,
        }
    }
}

impl PayloadSource for UpstreamSource {
    fn load(&self) -> BoxFuture<'_, Result<Payload, ScraperError>> {
        Box::pin(build_payload(&self.client, &self.options, &self.registry))
    }
}
