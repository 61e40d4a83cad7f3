//! Configuration management for Glint.
//!
//! Loads configuration from ${GLINT_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub mod paths {
    //! Path resolution for Glint configuration and data directories.
    //!
    //! GLINT_HOME resolution order:
    //! 1. GLINT_HOME environment variable (if set)
    //! 2. ~/.config/glint (default)

    use std::path::PathBuf;

    /// Returns the Glint home directory.
    ///
    /// Checks GLINT_HOME env var first, falls back to ~/.config/glint
    pub fn glint_home() -> PathBuf {
        if let Ok(home) = std::env::var("GLINT_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("glint"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        glint_home().join("config.toml")
    }

    /// Returns the path to the cached session file.
    pub fn session_path() -> PathBuf {
        glint_home().join("session.json")
    }

    /// Returns the directory log files are written to.
    pub fn logs_dir() -> PathBuf {
        glint_home().join("logs")
    }
}

/// Search endpoint configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Base URL of the chat-completions endpoint.
    pub base_url: Option<String>,
    /// API key; falls back to OPENAI_API_KEY when unset.
    pub api_key: Option<String>,
}

/// Identity provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Identity-toolkit web API key; falls back to GLINT_IDENTITY_API_KEY.
    pub api_key: Option<String>,
    /// Base URL of the identity-toolkit endpoint.
    pub base_url: Option<String>,
    /// Base URL of the token-refresh endpoint.
    pub token_base_url: Option<String>,
    /// Google OAuth client ID for the browser sign-in flow.
    pub google_client_id: Option<String>,
    /// Google OAuth client secret (installed-app flows ship one; not secret).
    pub google_client_secret: Option<String>,
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The completion model used to synthesize search results.
    pub model: String,

    /// Sampling temperature for search completions.
    pub temperature: f32,

    /// Search endpoint configuration.
    #[serde(default)]
    pub search: SearchConfig,

    /// Identity provider configuration.
    #[serde(default)]
    pub identity: IdentityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: Self::DEFAULT_MODEL.to_string(),
            temperature: Self::DEFAULT_TEMPERATURE,
            search: SearchConfig::default(),
            identity: IdentityConfig::default(),
        }
    }
}

impl Config {
    const DEFAULT_MODEL: &str = "gpt-4o-mini";
    const DEFAULT_TEMPERATURE: f32 = 0.7;

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let contents =
            toml::to_string_pretty(&Config::default()).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        Ok(())
    }
}

/// Resolves the search API key with precedence: config > env.
pub fn resolve_search_api_key(config_api_key: Option<&str>) -> Result<String> {
    if let Some(key) = config_api_key {
        let trimmed = key.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }

    std::env::var("OPENAI_API_KEY")
        .context("No API key available. Set OPENAI_API_KEY or api_key in [search].")
}

/// Resolves the search base URL with precedence: env > config > default.
pub fn resolve_search_base_url(config_base_url: Option<&str>, default: &str) -> Result<String> {
    if let Ok(env_url) = std::env::var("GLINT_SEARCH_BASE_URL") {
        let trimmed = env_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed)?;
            return Ok(trimmed.to_string());
        }
    }

    if let Some(config_url) = config_base_url {
        let trimmed = config_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed)?;
            return Ok(trimmed.to_string());
        }
    }

    Ok(default.to_string())
}

fn validate_url(url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid base URL: {url}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.model, Config::DEFAULT_MODEL);
        assert!(config.search.api_key.is_none());
    }

    #[test]
    fn load_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = \"gpt-4o\"\n\n[search]\napi_key = \"sk-test\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.search.api_key.as_deref(), Some("sk-test"));
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn load_malformed_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "model = [not toml").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config::init(&path).unwrap();
        assert!(Config::init(&path).is_err());
    }

    #[test]
    fn config_key_takes_precedence_over_env() {
        let key = resolve_search_api_key(Some("from-config")).unwrap();
        assert_eq!(key, "from-config");
    }

    #[test]
    fn blank_config_key_is_ignored() {
        // Falls through to env; error text covers the unset case.
        let result = resolve_search_api_key(Some("   "));
        if let Err(err) = result {
            assert!(err.to_string().contains("OPENAI_API_KEY"));
        }
    }
}
