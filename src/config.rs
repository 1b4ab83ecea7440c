//! Runtime configuration for the price store
//!
//! Defaults come from [`crate::constants`]. `from_env` lets a deployment
//! override them with `PRICE_STORE_*` variables.

use crate::{
    constants::{
        COINGECKO_API_URL, DEFAULT_ASSET_ID, DEFAULT_PRIMARY_CURRENCY,
        DEFAULT_SECONDARY_CURRENCY, REFRESH_INTERVAL_SECS, REQUEST_TIMEOUT_SECS,
        STALE_THRESHOLD_SECS,
    },
    error::ConfigError,
};
use std::time::Duration;

pub const ENV_ASSET: &str = "PRICE_STORE_ASSET";
pub const ENV_CURRENCIES: &str = "PRICE_STORE_CURRENCIES";
pub const ENV_POLL_SECS: &str = "PRICE_STORE_POLL_SECS";
pub const ENV_API_URL: &str = "PRICE_STORE_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "PRICE_STORE_TIMEOUT_SECS";
pub const ENV_STALE_SECS: &str = "PRICE_STORE_STALE_SECS";

/// Settings for a [`PriceStore`](crate::store::PriceStore) and its provider
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Asset identifier as the feed knows it (e.g. "bitcoin")
    pub asset_id: String,
    /// First reference currency code
    pub primary_currency: String,
    /// Second reference currency code
    pub secondary_currency: String,
    /// Period between timer-triggered fetches
    pub poll_interval: Duration,
    /// Base URL of the price API
    pub api_url: String,
    /// Per-request timeout handed to the HTTP client
    pub request_timeout: Duration,
    /// Age after which the health check reports the snapshot as stale
    pub stale_threshold: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            asset_id: DEFAULT_ASSET_ID.to_string(),
            primary_currency: DEFAULT_PRIMARY_CURRENCY.to_string(),
            secondary_currency: DEFAULT_SECONDARY_CURRENCY.to_string(),
            poll_interval: Duration::from_secs(REFRESH_INTERVAL_SECS),
            api_url: COINGECKO_API_URL.to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            stale_threshold: Duration::from_secs(STALE_THRESHOLD_SECS),
        }
    }
}

impl StoreConfig {
    /// Defaults overridden by any `PRICE_STORE_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(asset) = non_empty(lookup(ENV_ASSET)) {
            config.asset_id = asset.to_lowercase();
        }

        if let Some(raw) = non_empty(lookup(ENV_CURRENCIES)) {
            let codes: Vec<String> = raw
                .split(',')
                .map(|c| c.trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .collect();
            match codes.as_slice() {
                [primary, secondary] if primary != secondary => {
                    config.primary_currency = primary.clone();
                    config.secondary_currency = secondary.clone();
                }
                _ => {
                    return Err(ConfigError::invalid(
                        ENV_CURRENCIES,
                        &raw,
                        "expected two distinct comma-separated currency codes",
                    ))
                }
            }
        }

        if let Some(url) = non_empty(lookup(ENV_API_URL)) {
            config.api_url = url.trim_end_matches('/').to_string();
        }

        if let Some(d) = parse_secs(&lookup, ENV_POLL_SECS)? {
            config.poll_interval = d;
        }
        if let Some(d) = parse_secs(&lookup, ENV_TIMEOUT_SECS)? {
            config.request_timeout = d;
        }
        if let Some(d) = parse_secs(&lookup, ENV_STALE_SECS)? {
            config.stale_threshold = d;
        }

        Ok(config)
    }

    /// Currency codes in the order they are sent upstream
    pub fn currencies(&self) -> [&str; 2] {
        [self.primary_currency.as_str(), self.secondary_currency.as_str()]
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = non_empty(lookup(key)) else {
        return Ok(None);
    };
    match raw.parse::<u64>() {
        Ok(0) => Err(ConfigError::invalid(key, &raw, "must be greater than zero")),
        Ok(secs) => Ok(Some(Duration::from_secs(secs))),
        Err(e) => Err(ConfigError::invalid(key, &raw, e.to_string())),
    }
}
