mod api;
mod cache;
mod middleware;
mod source;

use std::sync::Arc;

use fuelwatch_scraper::{PipelineOptions, UpstreamClient};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    cache::PriceCache,
    source::UpstreamSource,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = fuelwatch_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let registry = fuelwatch_core::resolve_registry(config.stations_path.as_deref())?;
    let client = UpstreamClient::from_config(&config)?;
    let source = UpstreamSource::new(
        client,
        PipelineOptions::from_app_config(&config),
        registry.clone(),
    );
    let cache = PriceCache::new(
        Arc::new(source),
        config.cache_mode,
        config.cache_ttl(),
        registry,
    );

    let app = build_app(AppState {
        cache: Arc::new(cache),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %config.bind_addr,
        source = %config.source,
        mode = %config.cache_mode,
        ttl_secs = config.cache_ttl_secs,
        "fuelwatch server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
