//! Voice catalog filtered by the configured allow-list.

use tracing::{debug, instrument};
use web_reader_common::Config;
use web_reader_common::error::Error;

use crate::provider::{SpeechProvider, VoiceDescriptor};

/// Allow-list filter over the provider's voice catalog.
#[derive(Debug, Clone)]
pub struct VoiceCatalog {
    allow_list: Vec<String>,
}

impl Default for VoiceCatalog {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl VoiceCatalog {
    /// Filter keeping voices whose name contains one of `allow_list`.
    pub fn new(allow_list: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            allow_list: allow_list.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.voice_allow_list.iter().cloned())
    }

    /// Case-sensitive substring match against the allow-list.
    pub fn allows(&self, voice_name: &str) -> bool {
        self.allow_list.iter().any(|family| voice_name.contains(family.as_str()))
    }

    /// Retain allowed voices, sorted by name.
    pub fn filter(&self, mut voices: Vec<VoiceDescriptor>) -> Vec<VoiceDescriptor> {
        voices.retain(|v| self.allows(&v.name));
        voices.sort_by(|a, b| a.name.cmp(&b.name));
        voices
    }

    /// Fetch the catalog from `provider` and filter it.
    ///
    /// # Errors
    /// Propagates provider failures unchanged.
    #[instrument(level = "info", name = "list_voices", skip(self, provider))]
    pub async fn list_voices(
        &self,
        provider: &dyn SpeechProvider,
        language_code: Option<&str>,
    ) -> Result<Vec<VoiceDescriptor>, Error> {
        let voices = provider.list_voices(language_code).await?;
        let total = voices.len();
        let retained = self.filter(voices);
        debug!(total, retained = retained.len(), "Filtered voice catalog");
        Ok(retained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SsmlGender;
    use crate::provider::fake::FakeProvider;

    fn voice(name: &str) -> VoiceDescriptor {
        let code = name.splitn(3, '-').take(2).collect::<Vec<_>>().join("-");
        VoiceDescriptor::new(name, SsmlGender::Female, [code])
    }

    fn mixed_catalog() -> Vec<VoiceDescriptor> {
        vec![
            voice("en-US-Wavenet-D"),
            voice("en-US-Neural2-A"),
            voice("de-DE-Standard-B"),
            voice("en-US-Chirp3-HD-Aoede"),
            voice("cmn-CN-Wavenet-A"),
            voice("en-GB-Standard-A"),
            voice("fr-FR-Chirp-HD-D"),
        ]
    }

    #[tokio::test]
    async fn test_mixed_catalog_keeps_wavenet_and_standard_sorted() {
        let provider = FakeProvider::with_voices(mixed_catalog());
        let voices = VoiceCatalog::default().list_voices(&provider, None).await.unwrap();

        let names: Vec<_> = voices.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "cmn-CN-Wavenet-A",
                "de-DE-Standard-B",
                "en-GB-Standard-A",
                "en-US-Wavenet-D",
            ]
        );
    }

    #[tokio::test]
    async fn test_language_code_is_forwarded() {
        let provider = FakeProvider::with_voices(vec![]);
        VoiceCatalog::default()
            .list_voices(&provider, Some("fr-FR"))
            .await
            .unwrap();
        assert_eq!(
            *provider.voice_queries.lock().unwrap(),
            vec![Some("fr-FR".to_string())]
        );
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let provider = FakeProvider::failing(|| Error::unavailable("offline"));
        let err = VoiceCatalog::default().list_voices(&provider, None).await.unwrap_err();
        assert!(err.is_unavailable());
    }

    #[test]
    fn test_allow_list_is_case_sensitive() {
        let catalog = VoiceCatalog::default();
        assert!(catalog.allows("en-US-Wavenet-D"));
        assert!(!catalog.allows("en-US-wavenet-D"));
        assert!(!catalog.allows("en-US-Neural2-A"));
    }

    #[test]
    fn test_custom_allow_list() {
        let catalog = VoiceCatalog::new(["Neural2"]);
        let names: Vec<_> = catalog
            .filter(mixed_catalog())
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, vec!["en-US-Neural2-A"]);
    }
}
