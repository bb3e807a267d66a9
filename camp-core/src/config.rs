use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";

/// Where the HTTP server listens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080 }
    }
}

/// Credentials and sampling settings for the Gemini API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.4,
            max_output_tokens: 300,
            base_url: DEFAULT_GEMINI_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Number of forecast days offered to the model (1..=7).
    pub days: u32,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self { days: 7 }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// [server]
/// port = 8080
///
/// [gemini]
/// api_key = "..."
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub gemini: GeminiConfig,
    pub weather: WeatherConfig,
}

impl Config {
    /// Load config from the default location, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the default location, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "camp-weather", "camp-weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply `GEMINI_API_KEY`, `GEMINI_MODEL` and `PORT` from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(key) = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.gemini.api_key = Some(key);
        }

        if let Some(model) = lookup("GEMINI_MODEL").filter(|m| !m.trim().is_empty()) {
            self.gemini.model = model;
        }

        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value '{port}'"))?;
        }

        Ok(())
    }

    /// Returns the Gemini API key, or an error with a hint on how to set one.
    pub fn gemini_api_key(&self) -> Result<&str> {
        self.gemini
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No Gemini API key configured.\n\
                     Hint: run `camp-weather configure` or set GEMINI_API_KEY."
                )
            })
    }

    /// Set or replace the Gemini API key.
    pub fn set_gemini_api_key(&mut self, api_key: String) {
        self.gemini.api_key = Some(api_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_generation_settings() {
        let cfg = Config::default();

        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.gemini.model, DEFAULT_MODEL);
        assert_eq!(cfg.gemini.max_output_tokens, 300);
        assert!((cfg.gemini.temperature - 0.4).abs() < f32::EPSILON);
        assert_eq!(cfg.weather.days, 7);
    }

    #[test]
    fn api_key_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.gemini_api_key().unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No Gemini API key configured"));
        assert!(msg.contains("Hint: run `camp-weather configure`"));
    }

    #[test]
    fn set_api_key() {
        let mut cfg = Config::default();
        cfg.set_gemini_api_key("KEY".into());

        assert_eq!(cfg.gemini_api_key().unwrap(), "KEY");
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = Config::default();
        cfg.set_gemini_api_key("FILE_KEY".into());

        cfg.apply_env_from(env(&[
            ("GEMINI_API_KEY", "ENV_KEY"),
            ("GEMINI_MODEL", "gemini-2.0-flash"),
            ("PORT", "9090"),
        ]))
        .unwrap();

        assert_eq!(cfg.gemini_api_key().unwrap(), "ENV_KEY");
        assert_eq!(cfg.gemini.model, "gemini-2.0-flash");
        assert_eq!(cfg.server.port, 9090);
    }

    #[test]
    fn blank_env_key_is_ignored() {
        let mut cfg = Config::default();
        cfg.set_gemini_api_key("FILE_KEY".into());

        cfg.apply_env_from(env(&[("GEMINI_API_KEY", "  ")])).unwrap();
        assert_eq!(cfg.gemini_api_key().unwrap(), "FILE_KEY");
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut cfg = Config::default();
        let err = cfg.apply_env_from(env(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("Invalid PORT value"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(cfg.gemini.api_key.is_none());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_gemini_api_key("SAVED".into());
        cfg.server.port = 3000;
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.gemini_api_key().unwrap(), "SAVED");
        assert_eq!(loaded.server.port, 3000);
        assert_eq!(loaded.gemini.model, DEFAULT_MODEL);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[gemini]\napi_key = \"PARTIAL\"\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.gemini_api_key().unwrap(), "PARTIAL");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.weather.days, 7);
    }
}
