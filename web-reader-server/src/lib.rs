//! Web Reader Server Library
//!
//! Turns text into speech audio plus a token/timepoint alignment so a client
//! can highlight each word (or sentence fragment) as it is spoken.
//!
//! Pipeline: [`tokenizer`] splits text, [`markup`] wraps each token with a
//! timing mark, [`synthesis`] calls a [`provider::SpeechProvider`] and aligns
//! the returned marks. [`voices`] and [`language`] back voice discovery and
//! recommendation, and [`server`] exposes everything over HTTP.

pub mod cloud_tts;
pub mod language;
pub mod markup;
pub mod provider;
pub mod server;
pub mod synthesis;
pub mod tokenizer;
pub mod voices;

pub use cloud_tts::CloudTtsClient;
pub use language::{LanguageDetector, LanguageRecommender, Recommendation, WhatlangDetector};
pub use provider::{ProviderHandle, SpeechProvider, VoiceDescriptor};
pub use server::{AppState, create_router};
pub use synthesis::{SynthesisRequest, SynthesisResult, synthesize};
pub use voices::VoiceCatalog;
