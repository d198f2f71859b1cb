//! HTTP surface of the gateway.
//!
//! Routes:
//! - `GET /` liveness message
//! - `POST /api/v1/synthesize` audio plus mark alignment
//! - `GET /api/v1/voices` allow-listed voice catalog
//! - `POST /api/v1/detect-language` best-effort voice recommendation

use std::future::Future;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use web_reader_common::Config;
use web_reader_common::error::Error;

use crate::cloud_tts::CloudTtsClient;
use crate::language::{LanguageRecommender, Recommendation};
use crate::provider::{ProviderHandle, SpeechProvider, VoiceDescriptor};
use crate::synthesis::{SynthesisRequest, SynthesisResult, synthesize};
use crate::voices::VoiceCatalog;

/// Message returned by `GET /`.
pub const ROOT_MESSAGE: &str = "Web Reader API is running";

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    provider: Arc<ProviderHandle>,
    catalog: Arc<VoiceCatalog>,
    recommender: Arc<LanguageRecommender>,
}

impl AppState {
    /// State backed by Cloud TTS, connected on first use.
    pub fn new(config: Config) -> Self {
        let provider_config = config.clone();
        let provider = ProviderHandle::lazy(move || {
            let config = provider_config.clone();
            async move {
                let client = CloudTtsClient::new(&config).await?;
                Ok(Arc::new(client) as Arc<dyn SpeechProvider>)
            }
        });
        let recommender = LanguageRecommender::new(config.default_voice.clone());
        Self::with_parts(config, provider, recommender)
    }

    /// State with an explicit provider and recommender.
    pub fn with_parts(config: Config, provider: ProviderHandle, recommender: LanguageRecommender) -> Self {
        Self {
            catalog: Arc::new(VoiceCatalog::from_config(&config)),
            config: Arc::new(config),
            provider: Arc::new(provider),
            recommender: Arc::new(recommender),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run `fut` under the configured request deadline.
    async fn with_deadline<T>(&self, fut: impl Future<Output = Result<T, Error>>) -> Result<T, Error> {
        let secs = self.config.request_timeout_secs;
        tokio::time::timeout(self.config.request_timeout(), fut)
            .await
            .unwrap_or_else(|_| Err(Error::timeout(secs)))
    }
}

/// Build the router with tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(state.config());

    Router::new()
        .route("/", get(root))
        .route("/api/v1/synthesize", post(synthesize_audio))
        .route("/api/v1/voices", get(list_voices))
        .route("/api/v1/detect-language", post(detect_language))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS for the configured browser origins.
///
/// A `*` entry opens the API to any origin without credentials; otherwise
/// credentials are allowed and methods and headers are mirrored.
pub fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(AllowOrigin::any())
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

#[derive(Debug, Serialize)]
struct RootMessage {
    message: &'static str,
}

async fn root() -> Json<RootMessage> {
    Json(RootMessage { message: ROOT_MESSAGE })
}

async fn synthesize_audio(
    State(state): State<AppState>,
    body: Result<Json<SynthesisRequest>, JsonRejection>,
) -> Result<Json<SynthesisResult>, Error> {
    let Json(request) = body.map_err(|rejection| Error::validation(rejection.body_text()))?;

    let voice_id = request.voice_or(&state.config.default_voice).to_string();
    info!(text_len = request.text.len(), voice = %voice_id, "Synthesizing audio");

    let result = state
        .with_deadline(async {
            let provider = state.provider.get().await?;
            synthesize(provider.as_ref(), &request.text, &voice_id).await
        })
        .await
        .inspect_err(|e| error!(error = %e, "Synthesis failed"))?;

    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
struct VoicesQuery {
    language_code: Option<String>,
}

async fn list_voices(
    State(state): State<AppState>,
    Query(query): Query<VoicesQuery>,
) -> Result<Json<Vec<VoiceDescriptor>>, Error> {
    let language_code = query.language_code.filter(|code| !code.is_empty());

    let voices = state
        .with_deadline(async {
            let provider = state.provider.get().await?;
            state
                .catalog
                .list_voices(provider.as_ref(), language_code.as_deref())
                .await
        })
        .await
        .inspect_err(|e| error!(error = %e, "Listing voices failed"))?;

    Ok(Json(voices))
}

#[derive(Debug, Deserialize)]
struct DetectRequest {
    #[serde(default)]
    text: String,
}

async fn detect_language(
    State(state): State<AppState>,
    body: Result<Json<DetectRequest>, JsonRejection>,
) -> Json<Recommendation> {
    let recommender = &state.recommender;
    let Ok(Json(request)) = body else {
        warn!("Unreadable detect-language body, returning fallback");
        return Json(recommender.fallback());
    };

    let recommendation = state
        .with_deadline(async {
            Ok(recommender
                .recommend(&request.text, &state.provider, &state.catalog)
                .await)
        })
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Recommendation timed out, returning fallback");
            recommender.fallback()
        });

    Json(recommendation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_state(config: Config) -> AppState {
        let recommender = LanguageRecommender::new(config.default_voice.clone());
        AppState::with_parts(config, ProviderHandle::unavailable("offline"), recommender)
    }

    #[test]
    fn test_cors_layer_accepts_wildcard_and_skips_invalid_origins() {
        let wildcard = Config {
            cors_origins: vec!["*".to_string()],
            ..Config::default()
        };
        let _ = cors_layer(&wildcard);

        let invalid = Config {
            cors_origins: vec!["http://ok.example".to_string(), "bad\norigin".to_string()],
            ..Config::default()
        };
        let _ = cors_layer(&invalid);
    }

    #[test]
    fn test_state_uses_configured_allow_list() {
        let config = Config {
            voice_allow_list: vec!["Neural2".to_string()],
            ..Config::default()
        };
        let state = offline_state(config);
        assert!(state.catalog.allows("en-US-Neural2-A"));
        assert!(!state.catalog.allows("en-US-Wavenet-D"));
    }

    #[tokio::test]
    async fn test_deadline_maps_to_timeout_error() {
        let state = offline_state(Config {
            request_timeout_secs: 1,
            ..Config::default()
        });

        let result: Result<(), Error> = state
            .with_deadline(async {
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(Error::Timeout(1))));
    }

    #[tokio::test]
    async fn test_deadline_passes_through_results() {
        let state = offline_state(Config::default());
        let result = state.with_deadline(async { Err::<(), _>(Error::unavailable("offline")) }).await;
        assert!(result.unwrap_err().is_unavailable());
    }
}
