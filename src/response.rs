//! Validation of the simple-price response body
//!
//! Expected shape: `{ "<asset>": { "<currency>": <number>, ... } }`.

use crate::{error::FetchError, provider::QuoteRequest};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Top level keyed by asset; only the requested asset is typed further
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct SimplePriceResponse(HashMap<String, Value>);

/// Prices of one asset; currency values stay raw until checked
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct AssetPrices(HashMap<String, Value>);

/// Both prices extracted from a valid body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub primary: f64,
    pub secondary: f64,
}

/// Validates a provider body against `request`.
///
/// A missing body or a falsy JSON value (`null`, `false`, `0`, `""`) is an
/// empty response. Anything else that does not yield a number for both
/// currencies of the requested asset is invalid. Other top-level keys are
/// ignored.
pub fn validate(body: Option<&Value>, request: &QuoteRequest) -> Result<Quote, FetchError> {
    let body = match body {
        Some(body) if !is_falsy(body) => body,
        _ => return Err(FetchError::EmptyResponse),
    };

    let parsed = SimplePriceResponse::deserialize(body).map_err(|_| FetchError::InvalidResponse)?;
    let asset = parsed
        .0
        .get(&request.asset_id)
        .ok_or(FetchError::InvalidResponse)?;
    let prices = AssetPrices::deserialize(asset)
        .map(|p| p.0)
        .map_err(|_| FetchError::InvalidResponse)?;

    let number = |currency: &str| {
        prices
            .get(currency)
            .and_then(Value::as_f64)
            .ok_or(FetchError::InvalidResponse)
    };

    Ok(Quote {
        primary: number(&request.primary_currency)?,
        secondary: number(&request.secondary_currency)?,
    })
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
