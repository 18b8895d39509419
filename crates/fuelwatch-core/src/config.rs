use rust_decimal::Decimal;

use crate::app_config::{AppConfig, CacheMode, Discount, SourceKind};
use crate::model::Brand;
use crate::ConfigError;

const DEFAULT_HTML_BASE_URL: &str = "https://precoscombustiveis.dgeg.gov.pt/Posto/";
const DEFAULT_JSON_BASE_URL: &str =
    "https://precoscombustiveis.dgeg.gov.pt/api/PrecoComb/GetDadosPosto?id=";
const DEFAULT_INSECURE_TLS_HOSTS: &str = "precoscombustiveis.dgeg.gov.pt";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can use a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    // `PORT` is the conventional platform override; an explicit bind address wins.
    let default_bind = match lookup("PORT") {
        Ok(port) => {
            let port = port
                .parse::<u16>()
                .map_err(|e| invalid("PORT", e.to_string()))?;
            format!("0.0.0.0:{port}")
        }
        Err(_) => "0.0.0.0:3000".to_string(),
    };
    let bind_addr = or_default("FUELWATCH_BIND_ADDR", &default_bind)
        .parse::<SocketAddr>()
        .map_err(|e| invalid("FUELWATCH_BIND_ADDR", e.to_string()))?;

    let log_level = or_default("FUELWATCH_LOG_LEVEL", "info");
    let stations_path = lookup("FUELWATCH_STATIONS_PATH").ok().map(PathBuf::from);

    let source = or_default("FUELWATCH_SOURCE", "html")
        .parse::<SourceKind>()
        .map_err(|e| invalid("FUELWATCH_SOURCE", e))?;
    let cache_mode = or_default("FUELWATCH_CACHE_MODE", "pull")
        .parse::<CacheMode>()
        .map_err(|e| invalid("FUELWATCH_CACHE_MODE", e))?;
    let cache_ttl_secs = parse_u64(
        "FUELWATCH_CACHE_TTL_SECS",
        &source.default_ttl_secs().to_string(),
    )?;

    let discount_brand = or_default("FUELWATCH_DISCOUNT_BRAND", "galp")
        .parse::<Brand>()
        .map_err(|e| invalid("FUELWATCH_DISCOUNT_BRAND", e))?;
    let discount_amount = or_default("FUELWATCH_DISCOUNT_VALUE", "0.19")
        .trim()
        .parse::<Decimal>()
        .map_err(|e| invalid("FUELWATCH_DISCOUNT_VALUE", e.to_string()))?;
    if discount_amount < Decimal::ZERO {
        return Err(invalid(
            "FUELWATCH_DISCOUNT_VALUE",
            format!("must be a non-negative amount, got {discount_amount}"),
        ));
    }

    let html_base_url = or_default("FUELWATCH_HTML_BASE_URL", DEFAULT_HTML_BASE_URL);
    let json_base_url = or_default("FUELWATCH_JSON_BASE_URL", DEFAULT_JSON_BASE_URL);
    let aggregator_url = lookup("FUELWATCH_AGGREGATOR_URL")
        .ok()
        .filter(|s| !s.trim().is_empty());
    if source == SourceKind::AggregatorPage && aggregator_url.is_none() {
        return Err(ConfigError::MissingEnvVar(
            "FUELWATCH_AGGREGATOR_URL".to_string(),
        ));
    }
    let region = or_default("FUELWATCH_REGION", "Seixal");

    let scraper_request_timeout_secs =
        parse_u64("FUELWATCH_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    let scraper_user_agent = or_default(
        "FUELWATCH_SCRAPER_USER_AGENT",
        "fuelwatch/0.1 (+fuel price aggregator)",
    );
    let scraper_max_concurrent_stations =
        parse_usize("FUELWATCH_SCRAPER_MAX_CONCURRENT_STATIONS", "1")?;
    if scraper_max_concurrent_stations == 0 {
        return Err(invalid(
            "FUELWATCH_SCRAPER_MAX_CONCURRENT_STATIONS",
            "must be at least 1".to_string(),
        ));
    }
    let scraper_inter_request_delay_ms =
        parse_u64("FUELWATCH_SCRAPER_INTER_REQUEST_DELAY_MS", "250")?;

    let insecure_tls_hosts = or_default("FUELWATCH_INSECURE_TLS_HOSTS", DEFAULT_INSECURE_TLS_HOSTS)
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect();

    Ok(AppConfig {
        bind_addr,
        log_level,
        stations_path,
        source,
        cache_mode,
        cache_ttl_secs,
        discount: Discount {
            brand: discount_brand,
            amount: discount_amount,
        },
        html_base_url,
        json_base_url,
        aggregator_url,
        region,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_max_concurrent_stations,
        scraper_inter_request_delay_ms,
        insecure_tls_hosts,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
