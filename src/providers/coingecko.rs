//! CoinGecko quote provider implementation

use crate::{
    config::StoreConfig,
    constants::{COINGECKO_SIMPLE_PRICE_ENDPOINT, USER_AGENT},
    error::TransportError,
    provider::{QuoteProvider, QuoteRequest},
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// CoinGecko quote provider
pub struct CoinGeckoProvider {
    client: Client,
    api_url: String,
}

impl CoinGeckoProvider {
    /// Creates a new CoinGecko provider
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    /// Creates a provider from the store configuration
    pub fn from_config(config: &StoreConfig) -> Result<Self, TransportError> {
        Self::new(config.api_url.clone(), config.request_timeout)
    }

    /// Builds the simple-price request; query values are percent-encoded
    fn build_request(&self, request: &QuoteRequest) -> Result<reqwest::Request, TransportError> {
        self.client
            .get(format!("{}{}", self.api_url, COINGECKO_SIMPLE_PRICE_ENDPOINT))
            .query(&[
                ("ids", request.asset_id.as_str()),
                ("vs_currencies", request.vs_currencies().as_str()),
            ])
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))
    }

    /// Classifies a reqwest failure that happened before a status was read
    fn classify(url: &str, error: reqwest::Error) -> TransportError {
        if error.is_connect() || error.is_timeout() || error.is_request() {
            TransportError::unreachable(url, error.to_string())
        } else if let Some(status) = error.status() {
            TransportError::status(status.as_u16(), Some(error.to_string()))
        } else {
            TransportError::Other(error.to_string())
        }
    }

    /// Turns a raw body into JSON; a blank body means "no body"
    fn decode_body(url: &str, text: &str) -> Result<Option<Value>, TransportError> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(text)
            .map(Some)
            .map_err(|e| TransportError::Decode(format!("Http failure during parsing for {url}: {e}")))
    }
}

#[async_trait]
impl QuoteProvider for CoinGeckoProvider {
    async fn fetch_quote(&self, request: &QuoteRequest) -> Result<Option<Value>, TransportError> {
        let http_request = self.build_request(request)?;
        let url = http_request.url().to_string();
        tracing::debug!(url = %url, "Fetching quote from CoinGecko");

        let response = self
            .client
            .execute(http_request)
            .await
            .map_err(|e| Self::classify(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::status(
                status.as_u16(),
                Some(format!("Http failure response for {url}: {status}")),
            ));
        }

        let text = response.text().await.map_err(|e| Self::classify(&url, e))?;
        Self::decode_body(&url, &text)
    }

    fn provider_name(&self) -> &'static str {
        "coingecko"
    }
}
