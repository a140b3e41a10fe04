//! Error types for the Posterous API client.
//!
//! # Design
//! A declared failure from the service (`stat="fail"`) lands in `Api` with the
//! code and message exactly as sent. Responses that do not honor the envelope
//! contract get their own variants (`InvalidStatus`, `MalformedResponse`) so
//! callers can tell "the service said no" apart from "the response was
//! unintelligible". Transport failures are never retried: the posting methods
//! have side effects and are not assumed idempotent.

use thiserror::Error;

/// Failure raised by a `Transport` before any response body was obtained.
#[derive(Debug, Error)]
#[error("transport failed: {0}")]
pub struct TransportError(Box<dyn std::error::Error + Send + Sync>);

impl TransportError {
    pub fn new(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(e))
    }

    /// Wrap a plain message, for transports that fail without an error value.
    pub fn msg(message: impl Into<String>) -> Self {
        Self(message.into().into())
    }
}

/// Errors returned by `ApiClient` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// A posting method was called without a username and password.
    #[error("Posterous API call \"{method}\" requires authentication")]
    AuthenticationRequired { method: &'static str },

    /// The HTTP round-trip itself failed (connect, timeout, I/O).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The service answered with `stat="fail"`.
    #[error("Error Code {code}: {message}")]
    Api { code: String, message: String },

    /// The envelope status was missing or not one of `ok` / `fail`.
    #[error("invalid Posterous response status: {}", .0.as_deref().unwrap_or("<missing>"))]
    InvalidStatus(Option<String>),

    /// The body was not a well-formed envelope.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The client configuration could not be used to build a request.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// True when the service itself reported the failure.
    pub fn is_api_failure(&self) -> bool {
        matches!(self, ApiError::Api { .. })
    }

    /// The service error code parsed as an integer, if this is an `Api` error
    /// and the code is numeric.
    pub fn numeric_code(&self) -> Option<i64> {
        match self {
            ApiError::Api { code, .. } => code.trim().parse().ok(),
            _ => None,
        }
    }
}
