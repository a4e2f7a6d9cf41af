use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
}

/// Speech capture is optional. With no endpoint configured the dictation
/// control is hidden entirely.
#[derive(Debug, Default, Deserialize)]
pub struct SpeechConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UiConfig {
    pub side_panels: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { side_panels: true }
    }
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("PARLEY_BASE_URL") {
            self.backend.base_url = v;
        }
        if let Ok(v) = std::env::var("PARLEY_SPEECH_ENDPOINT") {
            self.speech.endpoint = Some(v);
        }
    }

    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: DEFAULT_BASE_URL.into(),
            },
            speech: SpeechConfig::default(),
            ui: UiConfig::default(),
        }
    }
}
