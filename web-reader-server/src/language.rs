//! Best-effort language detection and voice recommendation.
//!
//! Recommendation is a convenience for picking a voice, so it never fails:
//! detector problems fall back to English, and any failure while consulting
//! the catalog yields the fixed fallback pair.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::provider::{ProviderHandle, VoiceDescriptor};
use crate::voices::VoiceCatalog;

/// Language reported when detection is not possible.
pub const FALLBACK_LANGUAGE: &str = "en";

/// Why the detector produced no language.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DetectionError {
    /// Nothing to analyse.
    #[error("no text to analyse")]
    EmptyText,

    /// The detector could not make a guess.
    #[error("language could not be determined")]
    Undetermined,

    /// The detected language has no two-letter code.
    #[error("unsupported language: {0}")]
    Unsupported(String),
}

/// Statistical language detection.
pub trait LanguageDetector: Send + Sync {
    /// Detect the language of `text` as a lower-case two-letter code
    /// (`zh-cn` / `zh-tw` for Chinese).
    fn detect(&self, text: &str) -> Result<String, DetectionError>;
}

/// Texts with fewer characters than this only count when `whatlang`
/// marks its guess reliable.
const SHORT_TEXT_CHARS: usize = 12;

/// Detector backed by `whatlang` trigram models.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhatlangDetector;

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Result<String, DetectionError> {
        if text.trim().is_empty() {
            return Err(DetectionError::EmptyText);
        }
        let info = whatlang::detect(text).ok_or(DetectionError::Undetermined)?;
        let code = info.lang().code();
        debug!(
            lang = code,
            confidence = info.confidence(),
            reliable = info.is_reliable(),
            "Detected language"
        );
        if !info.is_reliable() && text.trim().chars().count() < SHORT_TEXT_CHARS {
            return Err(DetectionError::Undetermined);
        }
        two_letter_code(code)
            .map(str::to_string)
            .ok_or_else(|| DetectionError::Unsupported(code.to_string()))
    }
}

/// Map an ISO 639-3 code to the code matched against catalog language codes.
///
/// Mandarin maps to `zh-cn` since the trigram models do not separate
/// simplified and traditional script.
fn two_letter_code(iso639_3: &str) -> Option<&'static str> {
    let code = match iso639_3 {
        "afr" => "af",
        "aka" => "ak",
        "amh" => "am",
        "ara" => "ar",
        "aze" => "az",
        "bel" => "be",
        "ben" => "bn",
        "bul" => "bg",
        "cat" => "ca",
        "ces" => "cs",
        "cmn" => "zh-cn",
        "dan" => "da",
        "deu" => "de",
        "ell" => "el",
        "eng" => "en",
        "epo" => "eo",
        "est" => "et",
        "fin" => "fi",
        "fra" => "fr",
        "guj" => "gu",
        "heb" => "he",
        "hin" => "hi",
        "hrv" => "hr",
        "hun" => "hu",
        "hye" => "hy",
        "ind" => "id",
        "ita" => "it",
        "jav" => "jv",
        "jpn" => "ja",
        "kan" => "kn",
        "kat" => "ka",
        "khm" => "km",
        "kor" => "ko",
        "lat" => "la",
        "lav" => "lv",
        "lit" => "lt",
        "mal" => "ml",
        "mar" => "mr",
        "mkd" => "mk",
        "mya" => "my",
        "nep" => "ne",
        "nld" => "nl",
        // Catalog codes use the Bokmål tag.
        "nob" => "nb",
        "ori" => "or",
        "pan" => "pa",
        "pes" => "fa",
        "pol" => "pl",
        "por" => "pt",
        "ron" => "ro",
        "rus" => "ru",
        "sin" => "si",
        "slk" => "sk",
        "slv" => "sl",
        "sna" => "sn",
        "spa" => "es",
        "srp" => "sr",
        "swe" => "sv",
        "tam" => "ta",
        "tel" => "te",
        "tgl" => "fil",
        "tha" => "th",
        "tuk" => "tk",
        "tur" => "tr",
        "ukr" => "uk",
        "urd" => "ur",
        "uzb" => "uz",
        "vie" => "vi",
        "yid" => "yi",
        "zul" => "zu",
        _ => return None,
    };
    Some(code)
}

/// Result of `POST /api/v1/detect-language`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub detected_language: String,
    pub recommended_voice: Option<String>,
}

/// Find a catalog voice for a detected language code.
///
/// Precedence, scanning the catalog in order:
/// 1. `zh*` codes look for a `cmn-TW` (code contains `tw`) or `cmn-CN` voice.
/// 2. A language code equal to `detected` (case-insensitive) wins.
/// 3. Otherwise the first voice with a code starting with `detected` is the
///    candidate, except that for `en` the first `US` voice wins outright.
///
/// Returns `None` when nothing matches.
pub fn map_language_to_voice(detected: &str, voices: &[VoiceDescriptor]) -> Option<String> {
    let detected = detected.to_lowercase();

    if detected.starts_with("zh") {
        let target = if detected.contains("tw") { "cmn-tw" } else { "cmn-cn" };
        let mandarin = voices.iter().find(|v| {
            v.language_codes
                .iter()
                .any(|code| code.to_lowercase().contains(target))
        });
        if let Some(voice) = mandarin {
            return Some(voice.name.clone());
        }
    }

    let mut candidate: Option<&str> = None;
    for voice in voices {
        for code in &voice.language_codes {
            let lowered = code.to_lowercase();
            if lowered == detected {
                return Some(voice.name.clone());
            }
            if lowered.starts_with(&detected) {
                if detected == "en" && code.contains("US") {
                    return Some(voice.name.clone());
                }
                candidate.get_or_insert(voice.name.as_str());
            }
        }
    }

    candidate.map(str::to_string)
}

/// Detection plus catalog lookup with a fixed fallback.
pub struct LanguageRecommender {
    detector: Box<dyn LanguageDetector>,
    fallback_voice: String,
}

impl LanguageRecommender {
    /// Recommender using `whatlang`, falling back to `fallback_voice`.
    pub fn new(fallback_voice: impl Into<String>) -> Self {
        Self::with_detector(WhatlangDetector, fallback_voice)
    }

    pub fn with_detector(
        detector: impl LanguageDetector + 'static,
        fallback_voice: impl Into<String>,
    ) -> Self {
        Self {
            detector: Box::new(detector),
            fallback_voice: fallback_voice.into(),
        }
    }

    /// The pair returned whenever recommendation cannot complete.
    pub fn fallback(&self) -> Recommendation {
        Recommendation {
            detected_language: FALLBACK_LANGUAGE.to_string(),
            recommended_voice: Some(self.fallback_voice.clone()),
        }
    }

    /// Detected language, or `en` when the detector fails.
    pub fn detect_language(&self, text: &str) -> String {
        match self.detector.detect(text) {
            Ok(code) => code,
            Err(e) => {
                warn!(error = %e, "Language detection failed, assuming {}", FALLBACK_LANGUAGE);
                FALLBACK_LANGUAGE.to_string()
            }
        }
    }

    /// Recommend a voice from an already filtered catalog.
    pub fn recommend_from_catalog(&self, text: &str, voices: &[VoiceDescriptor]) -> Recommendation {
        let detected_language = self.detect_language(text);
        let recommended_voice = map_language_to_voice(&detected_language, voices);
        Recommendation {
            detected_language,
            recommended_voice,
        }
    }

    /// Detect the language of `text` and recommend a catalog voice.
    ///
    /// Never fails: empty text or an unusable provider yields
    /// [`LanguageRecommender::fallback`].
    #[instrument(level = "info", name = "recommend_voice", skip_all, fields(text_len = text.len()))]
    pub async fn recommend(
        &self,
        text: &str,
        provider: &ProviderHandle,
        catalog: &VoiceCatalog,
    ) -> Recommendation {
        if text.trim().is_empty() {
            debug!("Empty text, returning fallback recommendation");
            return self.fallback();
        }

        let voices = match provider.get().await {
            Ok(provider) => catalog.list_voices(provider.as_ref(), None).await,
            Err(e) => Err(e),
        };

        match voices {
            Ok(voices) => self.recommend_from_catalog(text, &voices),
            Err(e) => {
                warn!(error = %e, "Voice catalog unavailable, returning fallback recommendation");
                self.fallback()
            }
        }
    }
}
