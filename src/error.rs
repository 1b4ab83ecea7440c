//! Error types for the price store

use thiserror::Error;

/// Failures raised by a [`QuoteProvider`](crate::provider::QuoteProvider)
/// before a response body could be handed to validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    /// The request never got a response (connect failure, DNS, timeout)
    #[error("no response from {url}: {reason}")]
    Unreachable { url: String, reason: String },

    /// The server answered with a non-success status
    #[error("{}", status_message(.code, .message))]
    Status { code: u16, message: Option<String> },

    /// A 2xx response whose body could not be decoded
    #[error("{0}")]
    Decode(String),

    /// Anything the transport could not classify
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Creates an Unreachable error
    pub fn unreachable(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unreachable {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a Status error
    pub fn status(code: u16, message: Option<String>) -> Self {
        Self::Status { code, message }
    }
}

fn status_message(code: &u16, message: &Option<String>) -> String {
    match message {
        Some(m) if !m.is_empty() => m.clone(),
        _ => format!("Request failed {code}"),
    }
}

/// Errors that end a single fetch cycle
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FetchError {
    /// The request itself failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// 2xx response with no usable body
    #[error("Empty response from price API")]
    EmptyResponse,

    /// Body present but the required numeric fields are missing or mistyped
    #[error("Invalid response from price API")]
    InvalidResponse,
}

impl FetchError {
    /// Message written into the store's `error` field
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Transport(e) => crate::translate::to_message(e),
            other => other.to_string(),
        }
    }

    /// Short label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::EmptyResponse => "empty_response",
            FetchError::InvalidResponse => "invalid_response",
        }
    }
}

/// Errors raised while building a [`StoreConfig`](crate::config::StoreConfig)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// A variable held a value that could not be parsed
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    /// Creates an InvalidValue error
    pub fn invalid(key: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            FetchError::EmptyResponse.user_message(),
            "Empty response from price API"
        );
        assert_eq!(
            FetchError::InvalidResponse.user_message(),
            "Invalid response from price API"
        );
    }

    #[test]
    fn test_transport_message_goes_through_translator() {
        let err = FetchError::from(TransportError::status(429, None));
        assert_eq!(err.user_message(), "Too many requests");
        assert_eq!(err.kind(), "transport");
    }

    #[test]
    fn test_status_display_falls_back_to_code() {
        assert_eq!(
            TransportError::status(418, None).to_string(),
            "Request failed 418"
        );
    }
}
