//! Configuration module for loading environment variables and settings.

use std::time::Duration;

use crate::error::ConfigError;

/// Voice used when a request does not name one.
pub const DEFAULT_VOICE: &str = "en-US-Wavenet-D";

/// Voice families exposed by the catalog unless `VOICE_ALLOW_LIST` says otherwise.
pub const DEFAULT_VOICE_ALLOW_LIST: &[&str] = &["Wavenet", "Standard"];

/// Cloud Text-to-Speech REST base URL.
pub const DEFAULT_TTS_API_BASE_URL: &str = "https://texttospeech.googleapis.com";

/// Browser origins allowed by default (local frontend dev servers).
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://localhost:5173",
];

/// Default request deadline in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP bind address
    pub host: String,
    /// HTTP server port
    pub port: u16,
    /// Voice used when a request omits `voice_id`
    pub default_voice: String,
    /// Case-sensitive name substrings a voice must contain to be listed
    pub voice_allow_list: Vec<String>,
    /// Speech provider REST base URL
    pub tts_api_base_url: String,
    /// Quota project sent with provider calls
    pub project_id: Option<String>,
    /// Request-level deadline in seconds
    pub request_timeout_secs: u64,
    /// Allowed CORS origins
    pub cors_origins: Vec<String>,
    /// Static bearer token that replaces Application Default Credentials
    pub access_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            default_voice: DEFAULT_VOICE.to_string(),
            voice_allow_list: to_owned_list(DEFAULT_VOICE_ALLOW_LIST),
            tts_api_base_url: DEFAULT_TTS_API_BASE_URL.to_string(),
            project_id: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            cors_origins: to_owned_list(DEFAULT_CORS_ORIGINS),
            access_token: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables and .env file.
    ///
    /// Every setting has a default, so this only fails on values that are
    /// present but unusable.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` for a malformed port, timeout,
    /// or an allow-list with no entries.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// `from_env` delegates here; tests pass a map instead of mutating the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = non_empty(lookup("HOST")).unwrap_or(defaults.host);

        let port = match non_empty(lookup("PORT")) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|e| ConfigError::invalid_value("PORT", e.to_string()))?,
            None => defaults.port,
        };

        let default_voice = non_empty(lookup("DEFAULT_VOICE")).unwrap_or(defaults.default_voice);

        let voice_allow_list = match lookup("VOICE_ALLOW_LIST") {
            Some(raw) => {
                let list = split_list(&raw);
                if list.is_empty() {
                    return Err(ConfigError::invalid_value(
                        "VOICE_ALLOW_LIST",
                        "must name at least one voice family",
                    ));
                }
                list
            }
            None => defaults.voice_allow_list,
        };

        let tts_api_base_url = non_empty(lookup("TTS_API_BASE_URL"))
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.tts_api_base_url);

        let project_id = non_empty(lookup("PROJECT_ID"));

        let request_timeout_secs = match non_empty(lookup("REQUEST_TIMEOUT_SECS")) {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| {
                    ConfigError::invalid_value("REQUEST_TIMEOUT_SECS", e.to_string())
                })?;
                if secs == 0 {
                    return Err(ConfigError::invalid_value(
                        "REQUEST_TIMEOUT_SECS",
                        "must be greater than zero",
                    ));
                }
                secs
            }
            None => defaults.request_timeout_secs,
        };

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|raw| split_list(&raw))
            .unwrap_or(defaults.cors_origins);

        let access_token = non_empty(lookup("GOOGLE_OAUTH_ACCESS_TOKEN"));

        Ok(Self {
            host,
            port,
            default_voice,
            voice_allow_list,
            tts_api_base_url,
            project_id,
            request_timeout_secs,
            cors_origins,
            access_token,
        })
    }

    /// Request deadline as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// `host:port` string to bind the listener to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
