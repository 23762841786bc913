//! Application configuration for docstitch.
//!
//! User config lives at `~/.docstitch/docstitch.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocstitchError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docstitch.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docstitch";

// ---------------------------------------------------------------------------
// Config structs (matching docstitch.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Extraction provider settings.
    #[serde(default)]
    pub provider: ProviderSettings,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Default extraction profile: "invoice" or "registration".
    #[serde(default = "default_profile")]
    pub profile: String,

    /// Default multi-page comparison strategy: "adjacent" or "anchor".
    #[serde(default = "default_strategy")]
    pub strategy: String,

    /// Maximum concurrent provider calls per batch.
    #[serde(default = "default_fan_out")]
    pub fan_out: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            strategy: default_strategy(),
            fan_out: default_fan_out(),
        }
    }
}

fn default_profile() -> String {
    "invoice".into()
}
fn default_strategy() -> String {
    "adjacent".into()
}
fn default_fan_out() -> u32 {
    4
}

/// `[provider]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Base URL of the extraction provider.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// API version query parameter sent with every request.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Delay between polls of a pending analyze operation.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Overall deadline per page, submission through final poll.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            api_version: default_api_version(),
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "https://example.cognitiveservices.azure.com".into()
}
fn default_api_key_env() -> String {
    "DOCSTITCH_PROVIDER_KEY".into()
}
fn default_api_version() -> String {
    "2024-02-29-preview".into()
}
fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_timeout_secs() -> u64 {
    120
}

// ---------------------------------------------------------------------------
// Provider config (runtime, merged from config + env)
// ---------------------------------------------------------------------------

/// Runtime provider configuration — endpoint plus the resolved API key.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL of the extraction provider.
    pub endpoint: String,
    /// Resolved API key value.
    pub api_key: String,
    /// API version query parameter.
    pub api_version: String,
    /// Delay between operation polls.
    pub poll_interval_ms: u64,
    /// Per-page deadline in seconds.
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Build a runtime provider config, resolving the API key from the
    /// environment variable named in the settings.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self> {
        let api_key = resolve_api_key(settings)?;
        Ok(Self {
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            api_key,
            api_version: settings.api_version.clone(),
            poll_interval_ms: settings.poll_interval_ms,
            timeout_secs: settings.timeout_secs,
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docstitch/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocstitchError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docstitch/docstitch.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocstitchError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        DocstitchError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocstitchError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocstitchError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocstitchError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Resolve the provider API key from the env var named in the settings.
pub fn resolve_api_key(settings: &ProviderSettings) -> Result<String> {
    let var_name = &settings.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(DocstitchError::config(format!(
            "provider API key not found. Set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("endpoint"));
        assert!(toml_str.contains("DOCSTITCH_PROVIDER_KEY"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.fan_out, 4);
        assert_eq!(parsed.defaults.strategy, "adjacent");
        assert_eq!(parsed.provider.api_key_env, "DOCSTITCH_PROVIDER_KEY");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[provider]
endpoint = "https://di.internal.example.com"

[defaults]
profile = "registration"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.provider.endpoint, "https://di.internal.example.com");
        assert_eq!(config.provider.poll_interval_ms, 1000);
        assert_eq!(config.defaults.profile, "registration");
        assert_eq!(config.defaults.fan_out, 4);
    }

    #[test]
    fn api_key_resolution_fails_without_env() {
        let mut settings = ProviderSettings::default();
        // Use a unique env var name to avoid interfering with other tests
        settings.api_key_env = "DS_TEST_NONEXISTENT_KEY_12345".into();
        let result = resolve_api_key(&settings);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("API key not found"));
    }

    #[test]
    fn provider_config_strips_trailing_slash() {
        let mut settings = ProviderSettings::default();
        settings.endpoint = "https://di.example.com/".into();
        settings.api_key_env = "DS_TEST_KEY_PRESENT_67890".into();
        // SAFETY: test-local env var with a unique name.
        unsafe { std::env::set_var(&settings.api_key_env, "secret") };
        let provider = ProviderConfig::from_settings(&settings).expect("resolve");
        assert_eq!(provider.endpoint, "https://di.example.com");
        unsafe { std::env::remove_var(&settings.api_key_env) };
    }
}
