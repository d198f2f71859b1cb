//! Cloud Text-to-Speech REST client.
//!
//! Implements [`SpeechProvider`] against the `text:synthesize` and `voices`
//! endpoints. Mark timepoints are only exposed by the `v1beta1` synthesize
//! endpoint, so synthesis goes there while the catalog uses `v1`.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use web_reader_common::Config;
use web_reader_common::auth::{AuthProvider, scopes};
use web_reader_common::error::Error;

use crate::provider::{
    AudioEncoding, SpeechProvider, SpeechRequest, SsmlGender, SynthesizedSpeech, Timepoint,
    VoiceDescriptor,
};

/// Header carrying the quota project for user credentials.
const USER_PROJECT_HEADER: &str = "x-goog-user-project";

/// Timepoint type requesting one entry per `<mark>`.
const SSML_MARK_TIMEPOINTS: &str = "SSML_MARK";

/// REST client for Cloud Text-to-Speech.
pub struct CloudTtsClient {
    http: reqwest::Client,
    auth: AuthProvider,
    base_url: String,
    project_id: Option<String>,
}

impl CloudTtsClient {
    /// Build a client from configuration, discovering credentials.
    ///
    /// # Errors
    /// Returns `Error::ProviderUnavailable` when no credentials are found or
    /// the HTTP client cannot be built.
    #[instrument(level = "debug", name = "cloud_tts_client_new", skip_all)]
    pub async fn new(config: &Config) -> Result<Self, Error> {
        debug!("Initializing Cloud TTS client");

        let auth = AuthProvider::from_token_or_adc(config.access_token.as_deref()).await?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::unavailable(format!("HTTP client: {}", e)))?;

        Ok(Self::with_deps(config, http, auth))
    }

    /// Build a client from explicit dependencies.
    pub fn with_deps(config: &Config, http: reqwest::Client, auth: AuthProvider) -> Self {
        Self {
            http,
            auth,
            base_url: config.tts_api_base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
        }
    }

    /// Synthesize endpoint (beta surface, required for mark timepoints).
    pub fn synthesize_endpoint(&self) -> String {
        format!("{}/v1beta1/text:synthesize", self.base_url)
    }

    /// Voice catalog endpoint.
    pub fn voices_endpoint(&self) -> String {
        format!("{}/v1/voices", self.base_url)
    }

    async fn authorized(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder, Error> {
        let token = self.auth.get_token(&[scopes::CLOUD_PLATFORM]).await?;
        let builder = builder.bearer_auth(token);
        Ok(match &self.project_id {
            Some(project) => builder.header(USER_PROJECT_HEADER, project),
            None => builder,
        })
    }

    async fn send(&self, endpoint: &str, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, Error> {
        let response = self
            .authorized(builder)
            .await?
            .send()
            .await
            .map_err(|e| transport_error(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::provider(endpoint, status.as_u16(), provider_message(&body)));
        }
        Ok(response)
    }
}

#[async_trait]
impl SpeechProvider for CloudTtsClient {
    #[instrument(level = "info", name = "cloud_tts_synthesize", skip(self, request), fields(voice = %request.voice.name))]
    async fn synthesize_speech(&self, request: SpeechRequest) -> Result<SynthesizedSpeech, Error> {
        let endpoint = self.synthesize_endpoint();
        let body = TtsRequest::from(&request);
        debug!(endpoint = %endpoint, "Calling Cloud TTS synthesize");

        let response = self.send(&endpoint, self.http.post(&endpoint).json(&body)).await?;
        let api_response: TtsResponse = response.json().await.map_err(|e| {
            Error::provider(&endpoint, 200, format!("Failed to parse response: {}", e))
        })?;

        if api_response.audio_content.is_empty() {
            return Err(Error::provider(&endpoint, 200, "No audio content returned"));
        }
        let audio = BASE64.decode(&api_response.audio_content).map_err(|e| {
            Error::provider(&endpoint, 200, format!("Invalid base64 audio: {}", e))
        })?;

        let timepoints: Vec<Timepoint> = api_response
            .timepoints
            .into_iter()
            .map(|tp| Timepoint {
                mark_name: tp.mark_name,
                time_seconds: tp.time_seconds,
            })
            .collect();

        info!(
            bytes = audio.len(),
            timepoints = timepoints.len(),
            "Received synthesized audio"
        );
        Ok(SynthesizedSpeech { audio, timepoints })
    }

    #[instrument(level = "info", name = "cloud_tts_list_voices", skip(self))]
    async fn list_voices(&self, language_code: Option<&str>) -> Result<Vec<VoiceDescriptor>, Error> {
        let endpoint = self.voices_endpoint();
        let mut builder = self.http.get(&endpoint);
        if let Some(code) = language_code {
            builder = builder.query(&[("languageCode", code)]);
        }

        let response = self.send(&endpoint, builder).await?;
        let api_response: VoicesResponse = response.json().await.map_err(|e| {
            Error::provider(&endpoint, 200, format!("Failed to parse response: {}", e))
        })?;

        let voices: Vec<VoiceDescriptor> = api_response
            .voices
            .into_iter()
            .map(|v| VoiceDescriptor {
                name: v.name,
                ssml_gender: v.ssml_gender,
                language_codes: v.language_codes,
            })
            .collect();

        debug!(count = voices.len(), "Fetched voice catalog");
        Ok(voices)
    }
}

/// Connection-level failures mean the provider is unreachable; anything else
/// happened mid-request and is reported against the endpoint.
fn transport_error(endpoint: &str, err: reqwest::Error) -> Error {
    if err.is_connect() {
        Error::unavailable(format!("{}: {}", endpoint, err))
    } else {
        Error::provider(endpoint, 0, format!("Request failed: {}", err))
    }
}

/// Pull `error.message` out of a Google API error body, or return it as is.
fn provider_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.to_string())
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TtsRequest<'a> {
    input: TtsInput<'a>,
    voice: TtsVoice<'a>,
    audio_config: TtsAudioConfig,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    enable_time_pointing: Vec<&'static str>,
}

impl<'a> From<&'a SpeechRequest> for TtsRequest<'a> {
    fn from(request: &'a SpeechRequest) -> Self {
        let enable_time_pointing = if request.enable_mark_timepoints {
            vec![SSML_MARK_TIMEPOINTS]
        } else {
            Vec::new()
        };
        Self {
            input: TtsInput { ssml: &request.ssml },
            voice: TtsVoice {
                language_code: &request.voice.language_code,
                name: &request.voice.name,
            },
            audio_config: TtsAudioConfig {
                audio_encoding: request.audio_encoding,
            },
            enable_time_pointing,
        }
    }
}

#[derive(Debug, Serialize)]
struct TtsInput<'a> {
    ssml: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TtsVoice<'a> {
    language_code: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TtsAudioConfig {
    audio_encoding: AudioEncoding,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TtsResponse {
    #[serde(default)]
    audio_content: String,
    #[serde(default)]
    timepoints: Vec<ApiTimepoint>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTimepoint {
    mark_name: String,
    // Omitted by the API for a mark reached at 0s.
    #[serde(default)]
    time_seconds: f64,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<ApiVoice>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiVoice {
    name: String,
    #[serde(default)]
    ssml_gender: SsmlGender,
    #[serde(default)]
    language_codes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}
