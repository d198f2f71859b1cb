//! Speech provider capability and the process-wide provider handle.
//!
//! The gateway needs two things from a text-to-speech provider: synthesize
//! SSML with mark timepoints, and list the voice catalog. `SpeechProvider`
//! captures exactly that so the orchestration logic can be exercised with
//! an in-memory fake.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{info, warn};
use web_reader_common::error::Error;

/// Output audio encoding.
///
/// Only uncompressed PCM is offered: compressed encodings do not reliably
/// carry SSML mark timepoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioEncoding {
    /// Uncompressed 16-bit PCM in a WAV container.
    #[serde(rename = "LINEAR16")]
    Linear16,
}

impl AudioEncoding {
    /// Short format tag returned to clients.
    pub fn format_tag(&self) -> &'static str {
        match self {
            AudioEncoding::Linear16 => "wav",
        }
    }
}

/// Voice gender as reported by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SsmlGender {
    #[default]
    #[serde(rename = "SSML_VOICE_GENDER_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "MALE")]
    Male,
    #[serde(rename = "FEMALE")]
    Female,
    #[serde(rename = "NEUTRAL")]
    Neutral,
}

/// A voice catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceDescriptor {
    /// Provider voice name, `<lang>-<region>-<family>-<variant>`.
    pub name: String,
    /// Voice gender.
    pub ssml_gender: SsmlGender,
    /// Language-region codes the voice serves.
    pub language_codes: Vec<String>,
}

impl VoiceDescriptor {
    /// Convenience constructor.
    pub fn new(
        name: impl Into<String>,
        ssml_gender: SsmlGender,
        language_codes: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            ssml_gender,
            language_codes: language_codes.into_iter().map(Into::into).collect(),
        }
    }
}

/// Voice selection for a synthesis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSelector {
    /// Language code, e.g. `en-US`.
    pub language_code: String,
    /// Full voice name.
    pub name: String,
}

/// Everything the provider needs to synthesize one document.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    /// SSML document.
    pub ssml: String,
    /// Voice to speak with.
    pub voice: VoiceSelector,
    /// Output encoding.
    pub audio_encoding: AudioEncoding,
    /// Ask the provider to report when each `<mark>` is reached.
    pub enable_mark_timepoints: bool,
}

/// Elapsed time at which a mark was reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timepoint {
    /// Mark name as written in the SSML.
    pub mark_name: String,
    /// Seconds from the start of the audio.
    pub time_seconds: f64,
}

/// Provider output for one synthesis call.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedSpeech {
    /// Raw audio bytes in the requested encoding.
    pub audio: Vec<u8>,
    /// Reported mark timepoints; may be empty.
    pub timepoints: Vec<Timepoint>,
}

/// Text-to-speech capability consumed by the gateway.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize an SSML document.
    ///
    /// # Errors
    /// `Error::ProviderUnavailable` when the provider cannot be reached,
    /// `Error::Provider` when it rejects the request.
    async fn synthesize_speech(&self, request: SpeechRequest) -> Result<SynthesizedSpeech, Error>;

    /// Fetch the voice catalog, optionally scoped to a language code.
    async fn list_voices(&self, language_code: Option<&str>) -> Result<Vec<VoiceDescriptor>, Error>;
}

type InitFuture = Pin<Box<dyn Future<Output = Result<Arc<dyn SpeechProvider>, Error>> + Send>>;
type InitFn = Box<dyn Fn() -> InitFuture + Send + Sync>;

enum ProviderSlot {
    Ready(Arc<dyn SpeechProvider>),
    Unavailable(String),
}

/// Shared, lazily-initialized provider.
///
/// The first caller runs the initializer; concurrent callers wait for it.
/// A failed initialization is remembered and every later call fails fast
/// with `Error::ProviderUnavailable` instead of retrying.
pub struct ProviderHandle {
    slot: OnceCell<ProviderSlot>,
    init: Option<InitFn>,
}

impl ProviderHandle {
    /// Build the provider on first use with `init`.
    pub fn lazy<F, Fut>(init: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn SpeechProvider>, Error>> + Send + 'static,
    {
        Self {
            slot: OnceCell::new(),
            init: Some(Box::new(move || -> InitFuture { Box::pin(init()) })),
        }
    }

    /// Wrap an already constructed provider.
    pub fn ready(provider: Arc<dyn SpeechProvider>) -> Self {
        Self {
            slot: OnceCell::from(ProviderSlot::Ready(provider)),
            init: None,
        }
    }

    /// A handle that is permanently unavailable.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            slot: OnceCell::from(ProviderSlot::Unavailable(reason.into())),
            init: None,
        }
    }

    /// Get the provider, initializing it on first call.
    ///
    /// # Errors
    /// Returns `Error::ProviderUnavailable` if initialization failed, now or earlier.
    pub async fn get(&self) -> Result<Arc<dyn SpeechProvider>, Error> {
        let slot = self
            .slot
            .get_or_init(|| async {
                let Some(init) = &self.init else {
                    return ProviderSlot::Unavailable("speech provider not configured".to_string());
                };
                match init().await {
                    Ok(provider) => {
                        info!("Speech provider initialized");
                        ProviderSlot::Ready(provider)
                    }
                    Err(e) => {
                        warn!(error = %e, "Speech provider initialization failed");
                        ProviderSlot::Unavailable(unavailable_reason(e))
                    }
                }
            })
            .await;

        match slot {
            ProviderSlot::Ready(provider) => Ok(Arc::clone(provider)),
            ProviderSlot::Unavailable(reason) => Err(Error::unavailable(reason.clone())),
        }
    }
}

fn unavailable_reason(err: Error) -> String {
    match err {
        Error::ProviderUnavailable(reason) => reason,
        other => other.to_string(),
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory provider used across the crate's tests.

    use std::sync::Mutex;

    use super::*;

    /// Records every request and answers from canned data.
    #[derive(Default)]
    pub struct FakeProvider {
        pub audio: Vec<u8>,
        pub timepoints: Vec<Timepoint>,
        pub voices: Vec<VoiceDescriptor>,
        pub fail_with: Option<fn() -> Error>,
        pub requests: Mutex<Vec<SpeechRequest>>,
        pub voice_queries: Mutex<Vec<Option<String>>>,
    }

    impl FakeProvider {
        pub fn with_audio(audio: &[u8]) -> Self {
            Self {
                audio: audio.to_vec(),
                ..Default::default()
            }
        }

        pub fn with_voices(voices: Vec<VoiceDescriptor>) -> Self {
            Self {
                audio: b"RIFF".to_vec(),
                voices,
                ..Default::default()
            }
        }

        pub fn failing(fail_with: fn() -> Error) -> Self {
            Self {
                fail_with: Some(fail_with),
                ..Default::default()
            }
        }

        pub fn recorded(&self) -> Vec<SpeechRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SpeechProvider for FakeProvider {
        async fn synthesize_speech(&self, request: SpeechRequest) -> Result<SynthesizedSpeech, Error> {
            self.requests.lock().unwrap().push(request);
            if let Some(fail) = self.fail_with {
                return Err(fail());
            }
            Ok(SynthesizedSpeech {
                audio: self.audio.clone(),
                timepoints: self.timepoints.clone(),
            })
        }

        async fn list_voices(&self, language_code: Option<&str>) -> Result<Vec<VoiceDescriptor>, Error> {
            self.voice_queries
                .lock()
                .unwrap()
                .push(language_code.map(str::to_string));
            if let Some(fail) = self.fail_with {
                return Err(fail());
            }
            Ok(self.voices.clone())
        }
    }
}
