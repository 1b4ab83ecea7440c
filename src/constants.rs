//! Constants for the price store
//!
//! Compile-time defaults for every setting. `StoreConfig::from_env` can
//! override most of them at runtime.

/// How often the store polls the price feed (in seconds)
pub const REFRESH_INTERVAL_SECS: u64 = 60;

/// How long before a snapshot is reported as stale by the health check (in seconds)
pub const STALE_THRESHOLD_SECS: u64 = 300;

/// HTTP request timeout when fetching prices (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Asset tracked by default
pub const DEFAULT_ASSET_ID: &str = "bitcoin";

/// Primary reference currency
pub const DEFAULT_PRIMARY_CURRENCY: &str = "eur";

/// Secondary reference currency
pub const DEFAULT_SECONDARY_CURRENCY: &str = "usd";

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko API endpoint for simple price queries
pub const COINGECKO_SIMPLE_PRICE_ENDPOINT: &str = "/simple/price";

/// User agent for HTTP requests
pub const USER_AGENT: &str = "price-store/0.1.0";

/// Capacity of the store's event broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Error shown when a failure translates to an empty message
pub const FALLBACK_ERROR_MESSAGE: &str = "Failed to fetch price";
