//! Error types for the Web Reader gateway.
//!
//! This module provides a unified error hierarchy using `thiserror` so the
//! synthesis and catalog paths surface failures the same way.
//!
//! # Error Categories
//!
//! - `ConfigError`: Missing or invalid configuration
//! - `AuthError`: Credential discovery and token refresh failures
//! - `Error::ProviderUnavailable`: Speech provider not configured or not reachable
//! - `Error::Provider`: Well-formed request rejected by the speech provider
//! - `Error::EmptyTokenization`: Text produced nothing to speak
//! - `Error::Validation`: Input validation failures
//! - `Error::Timeout`: Request deadline exceeded

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Unified error type for the gateway.
#[derive(Debug, Error)]
pub enum Error {
    /// The speech provider cannot be used at all: credentials are missing,
    /// the client could not be built, or the connection was refused.
    #[error("Speech provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Provider errors with endpoint and HTTP status context
    ///
    /// Raised when the provider answers but rejects the request, for example
    /// an unknown voice name or malformed markup.
    #[error("Provider error for {endpoint} (HTTP {status_code}): {message}")]
    Provider {
        /// The provider endpoint that was called
        endpoint: String,
        /// HTTP status code returned by the provider
        status_code: u16,
        /// Error message from the provider or describing the failure
        message: String,
    },

    /// The text produced no tokens to synthesize.
    #[error("Tokenization produced no tokens")]
    EmptyTokenization,

    /// Input validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation timeout errors
    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),
}

impl Error {
    /// Create a new provider error with endpoint, status code, and message.
    ///
    /// # Example
    ///
    /// ```
    /// use web_reader_common::error::Error;
    ///
    /// let err = Error::provider(
    ///     "https://texttospeech.googleapis.com/v1beta1/text:synthesize",
    ///     400,
    ///     "Voice does not exist"
    /// );
    /// assert!(err.to_string().contains("texttospeech.googleapis.com"));
    /// assert!(err.to_string().contains("400"));
    /// ```
    pub fn provider(
        endpoint: impl Into<String>,
        status_code: u16,
        message: impl Into<String>,
    ) -> Self {
        Error::Provider {
            endpoint: endpoint.into(),
            status_code,
            message: message.into(),
        }
    }

    /// Create a new provider-unavailable error.
    ///
    /// # Example
    ///
    /// ```
    /// use web_reader_common::error::Error;
    ///
    /// let err = Error::unavailable("connection refused");
    /// assert!(err.is_unavailable());
    /// ```
    pub fn unavailable(message: impl Into<String>) -> Self {
        Error::ProviderUnavailable(message.into())
    }

    /// Create a new validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// Create a new timeout error.
    pub fn timeout(seconds: u64) -> Self {
        Error::Timeout(seconds)
    }

    /// Whether this error means the provider could not be used at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::ProviderUnavailable(_))
    }

    /// HTTP status the gateway answers with for this error.
    ///
    /// Only malformed requests are distinguished; every other failure is a
    /// generic server error carrying the underlying message.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON body returned for failed requests.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable failure description.
    pub detail: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Configuration errors.
///
/// These errors occur when loading or validating configuration from
/// environment variables or the `.env` file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl ConfigError {
    /// Create a new invalid value error.
    pub fn invalid_value(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue(name.into(), reason.into())
    }
}

/// Authentication errors.
///
/// These errors occur while obtaining credentials for the speech provider
/// using Application Default Credentials (ADC).
#[derive(Debug, Error)]
pub enum AuthError {
    /// ADC is not configured
    #[error("ADC not configured. Run 'gcloud auth application-default login' or set GOOGLE_APPLICATION_CREDENTIALS")]
    NotConfigured,

    /// Token refresh failed
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),
}

impl AuthError {
    /// Create a new token refresh failed error.
    pub fn refresh_failed(message: impl Into<String>) -> Self {
        AuthError::RefreshFailed(message.into())
    }
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        Error::ProviderUnavailable(err.to_string())
    }
}
