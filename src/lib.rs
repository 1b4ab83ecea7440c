//! # Price Store
//!
//! Keeps a live, periodically refreshed snapshot of a cryptocurrency's price
//! in two reference currencies (Bitcoin in EUR and USD by default) and
//! exposes it as reactive state.
//!
//! ## Usage
//!
//! ```no_run
//! use price_store::{PriceStore, StoreConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(PriceStore::coingecko(StoreConfig::from_env()?)?);
//! let mut events = store.subscribe_events();
//! store.start();
//!
//! // first completed fetch, successful or not
//! events.recv().await?;
//!
//! match (store.snapshot(), store.error()) {
//!     (Some(s), None) => println!("{:.2} / {:.2}", s.primary, s.secondary),
//!     (Some(s), Some(e)) => println!("{:.2} / {:.2} (stale: {})", s.primary, s.secondary, e),
//!     (None, e) => println!("no price yet: {:?}", e),
//! }
//!
//! store.dispose();
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! PriceStore::start()
//!     ↓
//! Timer task (ticks every poll_interval, only spawns refreshes)
//!     ↓
//! PriceStore::refresh()  ── generation token taken here
//!     ↓
//! QuoteProvider (CoinGecko)
//!     ↓
//! response::validate
//!     ↓
//! watch channels (snapshot / loading / error) + event broadcast
//! ```
//!
//! ## Error Handling
//!
//! Fetch failures never reach the caller. Transport failures are turned into
//! short messages by [`translate::to_message`]; validation failures carry
//! their own message. Either way the last good snapshot stays visible.

pub mod config;
pub mod constants;
pub mod error;
pub mod metrics;
pub mod provider;
pub mod providers;
pub mod response;
pub mod store;
pub mod translate;
pub mod types;

// Re-export commonly used types
pub use config::StoreConfig;
pub use error::{ConfigError, FetchError, TransportError};
pub use metrics::FetchMetrics;
pub use provider::{QuoteProvider, QuoteRequest};
pub use store::PriceStore;
pub use types::{ComponentHealth, HealthStatus, PriceSnapshot, PriceStoreEvent, StoreState};
