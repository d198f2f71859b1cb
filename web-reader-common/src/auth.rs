//! Authentication module using Application Default Credentials.
//!
//! The speech provider is called with OAuth2 bearer tokens. Credentials are
//! discovered through ADC:
//! - Service account credentials via `GOOGLE_APPLICATION_CREDENTIALS`
//! - User credentials from `gcloud auth application-default login`
//! - GCE metadata server for workloads running on Google Cloud
//! - gcloud CLI fallback
//!
//! For local development a fixed token (for example the output of
//! `gcloud auth print-access-token`) can be supplied instead.

use std::sync::Arc;

use gcp_auth::TokenProvider;
use tracing::{debug, instrument};

use crate::error::AuthError;

/// Internal token source abstraction.
enum TokenSource {
    /// Production token provider from gcp_auth
    Provider(Arc<dyn TokenProvider>),
    /// Fixed token supplied by configuration or tests
    Static(String),
}

/// Authentication provider for the speech provider's REST API.
///
/// Wraps the `gcp_auth` crate to provide automatic credential discovery and token refresh.
/// Tokens are cached internally and refreshed automatically when they expire.
pub struct AuthProvider {
    source: TokenSource,
}

impl AuthProvider {
    /// Create a new auth provider using Application Default Credentials.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotConfigured` if no valid credentials can be found.
    #[instrument(level = "debug", name = "auth_provider_new")]
    pub async fn new() -> Result<Self, AuthError> {
        debug!("Initializing AuthProvider with ADC");

        let provider = gcp_auth::provider().await.map_err(|e| {
            debug!("Failed to initialize ADC: {}", e);
            AuthError::NotConfigured
        })?;

        debug!("AuthProvider initialized successfully");
        Ok(Self {
            source: TokenSource::Provider(provider),
        })
    }

    /// Create an auth provider that always returns `token`.
    ///
    /// No refresh happens; once the token expires provider calls fail with
    /// HTTP 401 until the process is restarted with a new one.
    pub fn with_static_token(token: impl Into<String>) -> Self {
        Self {
            source: TokenSource::Static(token.into()),
        }
    }

    /// Use `token` when given, otherwise discover credentials through ADC.
    pub async fn from_token_or_adc(token: Option<&str>) -> Result<Self, AuthError> {
        match token {
            Some(token) => {
                debug!("Using static access token");
                Ok(Self::with_static_token(token))
            }
            None => Self::new().await,
        }
    }

    /// Get a valid access token for the specified scopes.
    ///
    /// The caller should not cache tokens themselves.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RefreshFailed` if the token cannot be obtained or refreshed.
    #[instrument(level = "debug", name = "get_token", skip(self))]
    pub async fn get_token(&self, scopes: &[&str]) -> Result<String, AuthError> {
        debug!(?scopes, "Requesting token");

        match &self.source {
            TokenSource::Provider(provider) => {
                let token = provider.token(scopes).await.map_err(|e| {
                    debug!("Token refresh failed: {}", e);
                    AuthError::RefreshFailed(e.to_string())
                })?;

                debug!("Token obtained successfully");
                Ok(token.as_str().to_string())
            }
            TokenSource::Static(token) => Ok(token.clone()),
        }
    }
}

/// OAuth2 scopes used by the gateway.
pub mod scopes {
    /// Full access to Google Cloud Platform APIs, required by Cloud Text-to-Speech.
    pub const CLOUD_PLATFORM: &str = "https://www.googleapis.com/auth/cloud-platform";
}
