//! Provider abstraction for fetching quotes from an external price API

use crate::{config::StoreConfig, error::TransportError};
use async_trait::async_trait;
use serde_json::Value;

/// What the store asks a provider for on every fetch cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    /// Asset identifier (e.g. "bitcoin")
    pub asset_id: String,
    /// Primary reference currency code
    pub primary_currency: String,
    /// Secondary reference currency code
    pub secondary_currency: String,
}

impl QuoteRequest {
    pub fn new(
        asset_id: impl Into<String>,
        primary_currency: impl Into<String>,
        secondary_currency: impl Into<String>,
    ) -> Self {
        Self {
            asset_id: asset_id.into(),
            primary_currency: primary_currency.into(),
            secondary_currency: secondary_currency.into(),
        }
    }

    /// Comma-separated currency list as sent upstream (`eur,usd`)
    pub fn vs_currencies(&self) -> String {
        format!("{},{}", self.primary_currency, self.secondary_currency)
    }
}

impl From<&StoreConfig> for QuoteRequest {
    fn from(config: &StoreConfig) -> Self {
        Self::new(
            config.asset_id.clone(),
            config.primary_currency.clone(),
            config.secondary_currency.clone(),
        )
    }
}

/// Trait for quote providers
///
/// A provider only moves bytes: it returns the decoded JSON body, or `None`
/// when the response carried no body at all. Validation is the store's job.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Issues one combined query for both currencies of `request`
    async fn fetch_quote(&self, request: &QuoteRequest) -> Result<Option<Value>, TransportError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    type Reply = Result<Option<Value>, TransportError>;

    enum Scripted {
        Ready(Reply),
        Deferred(oneshot::Receiver<Reply>),
    }

    /// Mock provider for testing
    ///
    /// Replies are consumed in call order. A deferred reply blocks its call
    /// until the test sends on the returned channel, which lets tests decide
    /// the order in which overlapping fetches complete.
    pub struct MockProvider {
        script: Mutex<VecDeque<Scripted>>,
        call_count: AtomicUsize,
    }

    impl Default for MockProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockProvider {
        pub fn new() -> Self {
            Self {
                script: Mutex::new(VecDeque::new()),
                call_count: AtomicUsize::new(0),
            }
        }

        /// JSON body in the CoinGecko simple-price shape for bitcoin/eur/usd
        pub fn body(eur: f64, usd: f64) -> Value {
            serde_json::json!({ "bitcoin": { "eur": eur, "usd": usd } })
        }

        pub fn push_price(&self, eur: f64, usd: f64) {
            self.push_reply(Ok(Some(Self::body(eur, usd))));
        }

        pub fn push_error(&self, error: TransportError) {
            self.push_reply(Err(error));
        }

        pub fn push_reply(&self, reply: Reply) {
            self.script.lock().unwrap().push_back(Scripted::Ready(reply));
        }

        /// Queues a reply that is released by sending on the returned channel
        pub fn push_deferred(&self) -> oneshot::Sender<Reply> {
            let (tx, rx) = oneshot::channel();
            self.script.lock().unwrap().push_back(Scripted::Deferred(rx));
            tx
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuoteProvider for MockProvider {
        async fn fetch_quote(&self, _request: &QuoteRequest) -> Reply {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Scripted::Ready(reply)) => reply,
                Some(Scripted::Deferred(rx)) => rx
                    .await
                    .unwrap_or_else(|_| Err(TransportError::Other("mock reply dropped".into()))),
                None => Err(TransportError::Other("no scripted reply".into())),
            }
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }
}
