use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{ConfigError, ConfigurationError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct VidlensConfig {
    pub server: ServerSection,
    pub fetch: FetchSection,
    pub model: ModelSection,
    pub translation: TranslationSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind_addr: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    pub timeout_seconds: u64,
    pub max_bytes: usize,
}

impl FetchSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            timeout_seconds: 120,
            max_bytes: 200 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelSection {
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout_seconds: u64,
}

impl ModelSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}

impl Default for ModelSection {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".into(),
            model: "gemini-2.0-flash".into(),
            api_key_env: "GEMINI_API_KEY".into(),
            timeout_seconds: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslationSection {
    pub endpoint: String,
    pub api_key_env: String,
    pub timeout_seconds: u64,
    pub max_concurrency: usize,
    pub max_attempts: usize,
    pub retry_delay_ms: u64,
    pub allow_partial: bool,
}

impl TranslationSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}

impl Default for TranslationSection {
    fn default() -> Self {
        Self {
            endpoint: "https://api-free.deepl.com/v2/translate".into(),
            api_key_env: "DEEPL_API_KEY".into(),
            timeout_seconds: 30,
            max_concurrency: 4,
            max_attempts: 1,
            retry_delay_ms: 500,
            allow_partial: false,
        }
    }
}

/// Provider API keys, read once at startup and shared read-only afterwards.
#[derive(Clone, Default)]
pub struct Credentials {
    pub model_api_key: Option<String>,
    pub translation_api_key: Option<String>,
    model_env: String,
    translation_env: String,
}

impl Credentials {
    pub fn from_env(config: &VidlensConfig) -> Self {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|value| !value.trim().is_empty())
        };
        Self {
            model_api_key: read(&config.model.api_key_env),
            translation_api_key: read(&config.translation.api_key_env),
            model_env: config.model.api_key_env.clone(),
            translation_env: config.translation.api_key_env.clone(),
        }
    }

    pub fn require_model_key(&self) -> std::result::Result<&str, ConfigurationError> {
        self.model_api_key
            .as_deref()
            .ok_or_else(|| ConfigurationError {
                provider: "Gemini",
                env_var: self.model_env.clone(),
            })
    }

    pub fn require_translation_key(&self) -> std::result::Result<&str, ConfigurationError> {
        self.translation_api_key
            .as_deref()
            .ok_or_else(|| ConfigurationError {
                provider: "DeepL",
                env_var: self.translation_env.clone(),
            })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("model_api_key", &self.model_api_key.as_ref().map(|_| "***"))
            .field(
                "translation_api_key",
                &self.translation_api_key.as_ref().map(|_| "***"),
            )
            .finish()
    }
}

pub fn load_vidlens_config<P: AsRef<Path>>(path: P) -> Result<VidlensConfig> {
    load_toml(path)
}

fn load_toml<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        source,
        path: path.to_path_buf(),
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        source,
        path: path.to_path_buf(),
    })
}
