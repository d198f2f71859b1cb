//! Synthesis orchestration: tokenize, mark up, synthesize, align.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use web_reader_common::error::Error;

use crate::markup::{build_markup, mark_index};
use crate::provider::{AudioEncoding, SpeechProvider, SpeechRequest, Timepoint, VoiceSelector};
use crate::tokenizer::tokenize;

/// Encoding requested from the provider.
pub const SYNTHESIS_ENCODING: AudioEncoding = AudioEncoding::Linear16;

/// Body of `POST /api/v1/synthesize`.
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisRequest {
    /// Text to speak.
    pub text: String,
    /// Voice name; the configured default voice when absent.
    #[serde(default)]
    pub voice_id: Option<String>,
}

impl SynthesisRequest {
    /// Requested voice, or `default_voice`.
    pub fn voice_or<'a>(&'a self, default_voice: &'a str) -> &'a str {
        self.voice_id.as_deref().unwrap_or(default_voice)
    }
}

/// Response of `POST /api/v1/synthesize`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisResult {
    /// Tokens in display order; token `i` starts at mark `i`.
    pub disp_world_list: Vec<String>,
    /// Base64-encoded audio.
    pub audio_base64: String,
    /// Mark timepoints for tokens the provider reported.
    pub timepoints: Vec<Timepoint>,
    /// Audio container tag.
    pub audio_format: String,
}

/// Language code of a voice: its first two hyphen-delimited segments.
///
/// ```
/// use web_reader_server::synthesis::language_code_for_voice;
///
/// assert_eq!(language_code_for_voice("en-US-Wavenet-D"), "en-US");
/// assert_eq!(language_code_for_voice("cmn-TW-Standard-A"), "cmn-TW");
/// ```
pub fn language_code_for_voice(voice_id: &str) -> String {
    voice_id.splitn(3, '-').take(2).collect::<Vec<_>>().join("-")
}

/// Keep provider marks that name one of the `token_count` tokens.
///
/// Missing marks are not padded; partial coverage is a valid result.
pub fn align_timepoints(timepoints: Vec<Timepoint>, token_count: usize) -> Vec<Timepoint> {
    timepoints
        .into_iter()
        .filter(|tp| mark_index(&tp.mark_name).is_some_and(|i| i < token_count))
        .collect()
}

/// Synthesize `text` with `voice_id` and return audio plus alignment.
///
/// # Errors
/// - `Error::EmptyTokenization` if the text yields no tokens.
/// - `Error::ProviderUnavailable` / `Error::Provider` from the provider.
#[instrument(level = "info", name = "synthesize", skip(provider, text), fields(text_len = text.len()))]
pub async fn synthesize(
    provider: &dyn SpeechProvider,
    text: &str,
    voice_id: &str,
) -> Result<SynthesisResult, Error> {
    let tokens = tokenize(text, voice_id)?;
    if tokens.is_empty() {
        return Err(Error::EmptyTokenization);
    }
    let ssml = build_markup(&tokens);
    debug!(tokens = tokens.len(), "Built marked SSML");

    let request = SpeechRequest {
        ssml,
        voice: VoiceSelector {
            language_code: language_code_for_voice(voice_id),
            name: voice_id.to_string(),
        },
        audio_encoding: SYNTHESIS_ENCODING,
        enable_mark_timepoints: true,
    };

    let speech = provider.synthesize_speech(request).await?;
    if speech.audio.is_empty() {
        return Err(Error::provider("synthesize", 200, "No audio content returned"));
    }

    let timepoints = align_timepoints(speech.timepoints, tokens.len());
    info!(
        tokens = tokens.len(),
        timepoints = timepoints.len(),
        "Synthesis complete"
    );

    Ok(SynthesisResult {
        disp_world_list: tokens,
        audio_base64: BASE64.encode(&speech.audio),
        timepoints,
        audio_format: SYNTHESIS_ENCODING.format_tag().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::fake::FakeProvider;

    fn tp(name: &str, seconds: f64) -> Timepoint {
        Timepoint {
            mark_name: name.to_string(),
            time_seconds: seconds,
        }
    }

    #[test]
    fn test_language_code_for_voice() {
        assert_eq!(language_code_for_voice("en-US-Wavenet-D"), "en-US");
        assert_eq!(language_code_for_voice("cmn-CN-Wavenet-A"), "cmn-CN");
        assert_eq!(language_code_for_voice("fr"), "fr");
    }

    #[test]
    fn test_voice_defaults() {
        let request: SynthesisRequest = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        assert_eq!(request.voice_or("en-US-Wavenet-D"), "en-US-Wavenet-D");
    }

    #[test]
    fn test_align_drops_unknown_and_out_of_range_marks() {
        let aligned = align_timepoints(
            vec![tp("0", 0.0), tp("bogus", 0.1), tp("+1", 0.2), tp("1", 0.3), tp("7", 0.9)],
            2,
        );
        assert_eq!(aligned, vec![tp("0", 0.0), tp("1", 0.3)]);
    }

    #[tokio::test]
    async fn test_synthesize_assembles_result() {
        let provider = FakeProvider {
            timepoints: vec![tp("0", 0.0), tp("1", 0.35)],
            ..FakeProvider::with_audio(b"RIFFdata")
        };

        let result = synthesize(&provider, "Hello world", "en-US-Wavenet-D").await.unwrap();

        assert_eq!(result.disp_world_list, vec!["Hello", "world"]);
        assert_eq!(result.audio_base64, BASE64.encode(b"RIFFdata"));
        assert_eq!(result.timepoints.len(), 2);
        assert_eq!(result.audio_format, "wav");

        let sent = provider.recorded();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].voice.language_code, "en-US");
        assert_eq!(sent[0].voice.name, "en-US-Wavenet-D");
        assert_eq!(sent[0].audio_encoding, AudioEncoding::Linear16);
        assert!(sent[0].enable_mark_timepoints);
        assert_eq!(
            sent[0].ssml,
            r#"<speak><mark name="0"/>Hello <mark name="1"/>world</speak>"#
        );
    }

    #[tokio::test]
    async fn test_partial_timepoints_are_not_padded() {
        let provider = FakeProvider {
            timepoints: vec![tp("0", 0.0)],
            ..FakeProvider::with_audio(b"RIFF")
        };
        let result = synthesize(&provider, "one two three", "en-US-Wavenet-D").await.unwrap();
        assert_eq!(result.disp_world_list.len(), 3);
        assert_eq!(result.timepoints, vec![tp("0", 0.0)]);
    }

    #[tokio::test]
    async fn test_mandarin_voice_uses_sentence_tokens() {
        let provider = FakeProvider::with_audio(b"RIFF");
        let result = synthesize(&provider, "你好。世界！", "cmn-CN-Wavenet-A").await.unwrap();
        assert_eq!(result.disp_world_list, vec!["你好。", "世界！", ""]);
        assert_eq!(provider.recorded()[0].voice.language_code, "cmn-CN");
    }

    #[tokio::test]
    async fn test_empty_text_fails_before_provider_call() {
        let provider = FakeProvider::with_audio(b"RIFF");
        let err = synthesize(&provider, "", "en-US-Wavenet-D").await.unwrap_err();
        assert!(matches!(err, Error::EmptyTokenization));
        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(provider.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_whitespace_only_text_fails_before_provider_call() {
        let provider = FakeProvider::with_audio(b"RIFF");
        let err = synthesize(&provider, "   ", "en-US-Wavenet-D").await.unwrap_err();
        assert!(matches!(err, Error::EmptyTokenization));
        assert!(provider.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_provider_errors_propagate() {
        let provider = FakeProvider::failing(|| Error::unavailable("no credentials"));
        let err = synthesize(&provider, "Hello", "en-US-Wavenet-D").await.unwrap_err();
        assert!(err.is_unavailable());

        let provider = FakeProvider::failing(|| Error::provider("synthesize", 400, "bad voice"));
        let err = synthesize(&provider, "Hello", "xx-XX-Bogus-Z").await.unwrap_err();
        assert!(matches!(err, Error::Provider { status_code: 400, .. }));
    }

    #[tokio::test]
    async fn test_empty_audio_is_provider_error() {
        let provider = FakeProvider::default();
        let err = synthesize(&provider, "Hello", "en-US-Wavenet-D").await.unwrap_err();
        assert!(matches!(err, Error::Provider { .. }));
    }
}
