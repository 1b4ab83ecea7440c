//! Transport failure → user-facing message

use crate::error::TransportError;

/// Maps a transport failure to the short message shown to users.
///
/// Pure and total: every variant produces a string.
pub fn to_message(error: &TransportError) -> String {
    match error {
        TransportError::Unreachable { .. } => "Network error".to_string(),
        TransportError::Status { code, message } => match *code {
            0 => "Network error".to_string(),
            404 => "Not found 404".to_string(),
            429 => "Too many requests".to_string(),
            code if code >= 500 => "Server error".to_string(),
            _ => message
                .as_deref()
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Request failed {code}")),
        },
        TransportError::Decode(message) => message.clone(),
        TransportError::Other(message) => message.clone(),
    }
}
