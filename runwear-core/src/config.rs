use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::provider::nominatim::DEFAULT_USER_AGENT;

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.1-8b-instruct:free";

pub const ENV_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_API_URL: &str = "OPENROUTER_API_URL";
pub const ENV_MODEL: &str = "OPENROUTER_MODEL";

/// Credentials for the optional text-generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextGenerationConfig {
    pub api_key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl TextGenerationConfig {
    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Example TOML:
    /// [text_generation]
    /// api_key = "..."
    /// model = "meta-llama/llama-3.1-8b-instruct:free"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_generation: Option<TextGenerationConfig>,

    /// Sent to Nominatim, which rejects anonymous clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load from disk, then let `OPENROUTER_*` environment variables win.
    pub fn load_with_env() -> Result<Self> {
        let mut cfg = Self::load()?;
        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "runwear", "runwear")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay values from the environment. Blank variables are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(api_key) = get(ENV_API_KEY) {
            self.set_text_generation_key(api_key);
        }

        if let Some(tg) = self.text_generation.as_mut() {
            if let Some(url) = get(ENV_API_URL) {
                tg.api_url = Some(url);
            }
            if let Some(model) = get(ENV_MODEL) {
                tg.model = Some(model);
            }
        }
    }

    /// Set or replace the API key, keeping any configured URL and model.
    pub fn set_text_generation_key(&mut self, api_key: String) {
        match self.text_generation.as_mut() {
            Some(tg) => tg.api_key = api_key,
            None => {
                self.text_generation = Some(TextGenerationConfig { api_key, api_url: None, model: None })
            }
        }
    }

    /// Configured credentials, if any. A blank key counts as unconfigured.
    pub fn text_generation(&self) -> Option<&TextGenerationConfig> {
        self.text_generation.as_ref().filter(|tg| !tg.api_key.trim().is_empty())
    }

    pub fn is_text_generation_configured(&self) -> bool {
        self.text_generation().is_some()
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn default_has_no_text_generation() {
        let cfg = Config::default();
        assert!(!cfg.is_text_generation_configured());
        assert_eq!(cfg.user_agent(), DEFAULT_USER_AGENT);
    }

    #[test]
    fn parses_toml_with_defaults() {
        let cfg = Config::from_toml(
            r#"
            [text_generation]
            api_key = "sk-or-123"
            "#,
        )
        .expect("valid toml");

        let tg = cfg.text_generation().expect("configured");
        assert_eq!(tg.api_key, "sk-or-123");
        assert_eq!(tg.api_url(), DEFAULT_API_URL);
        assert_eq!(tg.model(), DEFAULT_MODEL);
    }

    #[test]
    fn blank_key_counts_as_unconfigured() {
        let cfg = Config::from_toml("[text_generation]\napi_key = \"  \"\n").expect("valid toml");
        assert!(!cfg.is_text_generation_configured());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = Config::default();
        cfg.set_text_generation_key("FILE_KEY".into());

        cfg.apply_env(env(&[(ENV_API_KEY, "ENV_KEY"), (ENV_MODEL, "other/model")]));

        let tg = cfg.text_generation().expect("configured");
        assert_eq!(tg.api_key, "ENV_KEY");
        assert_eq!(tg.model(), "other/model");
        assert_eq!(tg.api_url(), DEFAULT_API_URL);
    }

    #[test]
    fn env_url_without_key_is_ignored() {
        let mut cfg = Config::default();
        cfg.apply_env(env(&[(ENV_API_URL, "http://localhost:9999")]));
        assert!(cfg.text_generation.is_none());
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut cfg = Config::default();
        cfg.apply_env(env(&[(ENV_API_KEY, "")]));
        assert!(!cfg.is_text_generation_configured());
    }

    #[test]
    fn set_key_keeps_model() {
        let mut cfg = Config::default();
        cfg.text_generation = Some(TextGenerationConfig {
            api_key: "OLD".into(),
            api_url: None,
            model: Some("custom/model".into()),
        });

        cfg.set_text_generation_key("NEW".into());

        let tg = cfg.text_generation().expect("configured");
        assert_eq!(tg.api_key, "NEW");
        assert_eq!(tg.model(), "custom/model");
    }

    #[test]
    fn toml_roundtrip_omits_unset_fields() {
        let mut cfg = Config::default();
        cfg.set_text_generation_key("KEY".into());

        let text = toml::to_string_pretty(&cfg).expect("serializes");
        assert!(text.contains("api_key = \"KEY\""));
        assert!(!text.contains("model"));

        let back = Config::from_toml(&text).expect("parses");
        assert_eq!(back.text_generation, cfg.text_generation);
    }
}
