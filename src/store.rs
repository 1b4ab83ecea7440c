//! Polled price store with reactive state
//!
//! Every fetch takes a generation token when it starts. Only the fetch
//! whose token is still the latest when it completes may touch the state;
//! anything older is dropped on arrival. Fetches may overlap freely.

use crate::{
    config::StoreConfig,
    constants::{EVENT_CHANNEL_CAPACITY, FALLBACK_ERROR_MESSAGE},
    error::{FetchError, TransportError},
    metrics::{FetchMetrics, FetchOutcome, MetricsCollector},
    provider::{QuoteProvider, QuoteRequest},
    providers::CoinGeckoProvider,
    response::{self, Quote},
    types::{ComponentHealth, HealthStatus, PriceSnapshot, PriceStoreEvent, StoreState},
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Default)]
struct Lifecycle {
    generation: u64,
    disposed: bool,
    timer: Option<JoinHandle<()>>,
}

/// Live snapshot of an asset's price in two currencies
///
/// Construction performs no I/O. Call [`start`](Self::start) to begin
/// polling and [`dispose`](Self::dispose) to stop it.
///
/// # Example
/// ```no_run
/// use price_store::{PriceStore, StoreConfig};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(PriceStore::coingecko(StoreConfig::default())?);
/// store.start();
///
/// let mut snapshots = store.watch_snapshot();
/// snapshots.changed().await?;
/// if let Some(snapshot) = *snapshots.borrow() {
///     println!("BTC: {:.2} EUR / {:.2} USD", snapshot.primary, snapshot.secondary);
/// }
/// store.dispose();
/// # Ok(())
/// # }
/// ```
pub struct PriceStore {
    config: StoreConfig,
    request: QuoteRequest,
    provider: Arc<dyn QuoteProvider>,
    lifecycle: Mutex<Lifecycle>,
    snapshot_tx: watch::Sender<Option<PriceSnapshot>>,
    loading_tx: watch::Sender<bool>,
    error_tx: watch::Sender<Option<String>>,
    events_tx: broadcast::Sender<PriceStoreEvent>,
    metrics: MetricsCollector,
}

impl PriceStore {
    /// Creates a store that fetches through `provider`
    pub fn new(config: StoreConfig, provider: Arc<dyn QuoteProvider>) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            request: QuoteRequest::from(&config),
            metrics: MetricsCollector::new(provider.provider_name()),
            config,
            provider,
            lifecycle: Mutex::new(Lifecycle::default()),
            snapshot_tx: watch::Sender::new(None),
            loading_tx: watch::Sender::new(false),
            error_tx: watch::Sender::new(None),
            events_tx,
        }
    }

    /// Creates a store backed by the CoinGecko simple-price API
    pub fn coingecko(config: StoreConfig) -> Result<Self, TransportError> {
        let provider = CoinGeckoProvider::from_config(&config)?;
        Ok(Self::new(config, Arc::new(provider)))
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts polling: one fetch right away, then one per `poll_interval`.
    ///
    /// Does nothing if the store is already started or has been disposed.
    /// Must be called from within a tokio runtime.
    pub fn start(self: &Arc<Self>) {
        let mut lifecycle = self.lifecycle();
        if lifecycle.disposed || lifecycle.timer.is_some() {
            return;
        }

        // tokio intervals panic on a zero period
        let period = self.config.poll_interval.max(Duration::from_secs(1));
        let store = Arc::downgrade(self);

        tracing::info!(
            poll_interval_secs = period.as_secs(),
            asset = %self.request.asset_id,
            currencies = %self.request.vs_currencies(),
            provider = self.provider.provider_name(),
            "Starting price store polling"
        );

        lifecycle.timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                tokio::spawn(async move { store.refresh().await });
            }
        }));
    }

    /// Runs one fetch-and-validate cycle and returns once it has completed.
    ///
    /// Failures end up in [`error`](Self::error); nothing is returned to the
    /// caller. After [`dispose`](Self::dispose) this returns immediately.
    pub async fn refresh(&self) {
        let Some(token) = self.begin() else {
            tracing::debug!("Price store disposed, skipping refresh");
            return;
        };

        let started = Instant::now();
        let result = match self.provider.fetch_quote(&self.request).await {
            Ok(body) => response::validate(body.as_ref(), &self.request),
            Err(e) => Err(FetchError::from(e)),
        };

        let outcome = self.complete(token, result);
        self.metrics.record(started.elapsed(), outcome).await;
    }

    /// Stops the polling timer. In-flight fetches still complete and may
    /// still update the state; no new fetch will start.
    pub fn dispose(&self) {
        let mut lifecycle = self.lifecycle();
        if lifecycle.disposed {
            return;
        }
        lifecycle.disposed = true;
        if let Some(timer) = lifecycle.timer.take() {
            timer.abort();
        }
        tracing::info!(generation = lifecycle.generation, "Price store disposed");
    }

    fn begin(&self) -> Option<u64> {
        let mut lifecycle = self.lifecycle();
        if lifecycle.disposed {
            return None;
        }
        lifecycle.generation += 1;

        set_if_changed(&self.loading_tx, true);
        set_if_changed(&self.error_tx, None);

        tracing::debug!(generation = lifecycle.generation, "Price fetch started");
        Some(lifecycle.generation)
    }

    fn complete(&self, token: u64, result: Result<Quote, FetchError>) -> FetchOutcome {
        let lifecycle = self.lifecycle();

        if token != lifecycle.generation {
            tracing::debug!(
                generation = token,
                current_generation = lifecycle.generation,
                "Discarding stale price response"
            );
            let _ = self
                .events_tx
                .send(PriceStoreEvent::stale_discarded(token, lifecycle.generation));
            return FetchOutcome::Discarded;
        }

        match result {
            Ok(quote) => {
                let previous = *self.snapshot_tx.borrow();
                let now = Utc::now().timestamp_millis();
                // observation times never go backwards, even if the clock does
                let observed_at_ms = previous.map_or(now, |p| now.max(p.observed_at_ms));
                let snapshot = PriceSnapshot::observed_at(quote.primary, quote.secondary, observed_at_ms);

                self.snapshot_tx.send_replace(Some(snapshot));
                set_if_changed(&self.error_tx, None);
                set_if_changed(&self.loading_tx, false);

                tracing::debug!(
                    generation = token,
                    primary = snapshot.primary,
                    secondary = snapshot.secondary,
                    "Price snapshot updated"
                );
                let _ = self
                    .events_tx
                    .send(PriceStoreEvent::snapshot_updated(token, previous, snapshot));
                FetchOutcome::Applied
            }
            Err(e) => {
                let mut message = e.user_message();
                if message.is_empty() {
                    message = FALLBACK_ERROR_MESSAGE.to_string();
                }

                set_if_changed(&self.error_tx, Some(message.clone()));
                set_if_changed(&self.loading_tx, false);

                tracing::warn!(
                    generation = token,
                    kind = e.kind(),
                    error = %e,
                    "Failed to fetch price"
                );
                let _ = self
                    .events_tx
                    .send(PriceStoreEvent::fetch_failed(token, message));
                FetchOutcome::Failed
            }
        }
    }

    /// Last accepted snapshot, if any fetch has succeeded yet
    pub fn snapshot(&self) -> Option<PriceSnapshot> {
        *self.snapshot_tx.borrow()
    }

    /// Whether the current fetch is still in flight
    pub fn loading(&self) -> bool {
        *self.loading_tx.borrow()
    }

    /// Message describing how the current fetch failed
    pub fn error(&self) -> Option<String> {
        self.error_tx.borrow().clone()
    }

    /// Token of the most recently started fetch
    pub fn generation(&self) -> u64 {
        self.lifecycle().generation
    }

    /// Consistent copy of all exposed state
    pub fn state(&self) -> StoreState {
        let lifecycle = self.lifecycle();
        StoreState {
            snapshot: self.snapshot(),
            loading: self.loading(),
            error: self.error(),
            generation: lifecycle.generation,
        }
    }

    pub fn is_started(&self) -> bool {
        self.lifecycle().timer.is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.lifecycle().disposed
    }

    /// Observe snapshot changes
    pub fn watch_snapshot(&self) -> watch::Receiver<Option<PriceSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Observe the loading flag
    pub fn watch_loading(&self) -> watch::Receiver<bool> {
        self.loading_tx.subscribe()
    }

    /// Observe the error message
    pub fn watch_error(&self) -> watch::Receiver<Option<String>> {
        self.error_tx.subscribe()
    }

    /// Stream of fetch completions
    pub fn subscribe_events(&self) -> broadcast::Receiver<PriceStoreEvent> {
        self.events_tx.subscribe()
    }

    /// Returns the name of the provider behind this store
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Latency percentiles and outcome counts of completed fetches
    pub async fn fetch_metrics(&self) -> FetchMetrics {
        self.metrics.get_metrics().await
    }

    /// Perform a health check on the store
    pub fn health_check(&self) -> ComponentHealth {
        let state = self.state();
        let threshold_secs = self.config.stale_threshold.as_secs();
        let mut details = HashMap::new();

        details.insert("generation".to_string(), serde_json::json!(state.generation));
        details.insert("loading".to_string(), serde_json::json!(state.loading));
        details.insert("error".to_string(), serde_json::json!(state.error));
        details.insert(
            "provider_name".to_string(),
            serde_json::json!(self.provider_name()),
        );
        details.insert(
            "snapshot_age_secs".to_string(),
            serde_json::json!(state.snapshot.map(|s| s.age().as_secs())),
        );

        let (status, message) = match state.snapshot {
            None => (
                HealthStatus::Unhealthy,
                "Price store has no snapshot yet".to_string(),
            ),
            Some(snapshot) if snapshot.is_stale(threshold_secs) => (
                HealthStatus::Degraded,
                format!(
                    "Price snapshot is stale (age: {}s)",
                    snapshot.age().as_secs()
                ),
            ),
            Some(_) if state.error.is_some() => (
                HealthStatus::Degraded,
                "Price store is showing the last snapshot alongside an error".to_string(),
            ),
            Some(_) => (
                HealthStatus::Healthy,
                "Price store is operational with fresh data".to_string(),
            ),
        };

        ComponentHealth {
            name: "price_store".to_string(),
            status,
            message: Some(message),
            details,
            last_checked: Utc::now(),
        }
    }
}

impl Drop for PriceStore {
    fn drop(&mut self) {
        let lifecycle = self
            .lifecycle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = lifecycle.timer.take() {
            timer.abort();
        }
    }
}

/// Writes `value` and notifies observers only if it differs from the current one
fn set_if_changed<T: PartialEq>(tx: &watch::Sender<T>, value: T) {
    tx.send_if_modified(|current| {
        if *current == value {
            false
        } else {
            *current = value;
            true
        }
    });
}
