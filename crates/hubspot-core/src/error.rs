//! Error types for the hubspot client.
//!
//! This module provides a unified error type with explicit variants for
//! configuration, caller input, transport, and response decoding failures.

use thiserror::Error;

/// The unified error type for hubspot operations.
///
/// Every failure propagates to the caller synchronously. Nothing is retried
/// and no error is swallowed inside the library.
#[derive(Debug, Error)]
pub enum Error {
    /// A required configuration value was never set.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The caller passed a malformed or ambiguous request.
    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// HTTP or network failure, including non-2xx responses.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The server kept reporting more pages past the configured maximum.
    #[error("page limit of {max_pages} reached while the server still reports more results")]
    PageLimitExceeded { max_pages: usize },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A named configuration value is required but unset.
    #[error("'{key}' not configured")]
    NotConfigured { key: &'static str },

    /// The base URL could not be parsed.
    #[error("invalid base URL '{value}': {reason}")]
    InvalidBaseUrl { value: String, reason: String },
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out: {message}")]
    Timeout { message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },

    /// The server answered with a non-success status.
    #[error("HTTP {status}{}", format_status_detail(.message, .correlation_id))]
    Status {
        status: u16,
        message: Option<String>,
        correlation_id: Option<String>,
    },
}

fn format_status_detail(message: &Option<String>, correlation_id: &Option<String>) -> String {
    let mut detail = String::new();
    if let Some(message) = message {
        detail.push_str(": ");
        detail.push_str(message);
    }
    if let Some(id) = correlation_id {
        detail.push_str(" (correlation id ");
        detail.push_str(id);
        detail.push(')');
    }
    detail
}

impl TransportError {
    /// Returns the HTTP status for `Status` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Response decoding errors.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The body was not valid JSON.
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field was absent.
    #[error("missing field '{field}'")]
    MissingField { field: String },

    /// A field was present with the wrong type.
    #[error("field '{field}' is not {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },
}

impl DecodeError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        DecodeError::MissingField {
            field: field.into(),
        }
    }

    pub(crate) fn invalid(field: impl Into<String>, expected: &'static str) -> Self {
        DecodeError::InvalidField {
            field: field.into(),
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display_includes_detail() {
        let err = TransportError::Status {
            status: 404,
            message: Some("resource not found".to_string()),
            correlation_id: Some("abc-123".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "HTTP 404: resource not found (correlation id abc-123)"
        );
    }

    #[test]
    fn bare_status_error_display() {
        let err = TransportError::Status {
            status: 503,
            message: None,
            correlation_id: None,
        };
        assert_eq!(err.to_string(), "HTTP 503");
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn not_configured_names_the_key() {
        let err = Error::from(ConfigurationError::NotConfigured { key: "portal_id" });
        assert_eq!(
            err.to_string(),
            "configuration error: 'portal_id' not configured"
        );
    }
}
