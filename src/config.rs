use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
#[cfg(feature = "cli")]
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub engine: EngineConfig,
    pub session: SessionConfig,
}

/// Audio device configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AudioConfig {
    pub input_device: Option<String>,
    pub output_device: Option<String>,
}

/// Translation engine connection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub url: String,
    pub api_key: Option<String>,
}

/// Session behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    pub max_reconnect_attempts: u32,
    pub reconnect_base_ms: u64,
    pub reconnect_max_ms: u64,
    pub history_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: defaults::DEFAULT_ENGINE_URL.to_string(),
            api_key: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: defaults::RECONNECT_MAX_ATTEMPTS,
            reconnect_base_ms: defaults::RECONNECT_BASE_MS,
            reconnect_max_ms: defaults::RECONNECT_MAX_MS,
            history_limit: defaults::HISTORY_LIMIT,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - PARLO_ENGINE_URL → engine.url
    /// - PARLO_API_KEY → engine.api_key
    /// - PARLO_INPUT_DEVICE → audio.input_device
    /// - PARLO_OUTPUT_DEVICE → audio.output_device
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("PARLO_ENGINE_URL")
            && !url.is_empty()
        {
            self.engine.url = url;
        }

        if let Ok(key) = std::env::var("PARLO_API_KEY")
            && !key.is_empty()
        {
            self.engine.api_key = Some(key);
        }

        if let Ok(device) = std::env::var("PARLO_INPUT_DEVICE")
            && !device.is_empty()
        {
            self.audio.input_device = Some(device);
        }

        if let Ok(device) = std::env::var("PARLO_OUTPUT_DEVICE")
            && !device.is_empty()
        {
            self.audio.output_device = Some(device);
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/parlo/config.toml on Linux
    #[cfg(feature = "cli")]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("parlo").join("config.toml"))
    }
}

impl From<&SessionConfig> for crate::session::SessionSettings {
    fn from(config: &SessionConfig) -> Self {
        Self {
            max_reconnect_attempts: config.max_reconnect_attempts,
            reconnect_base_ms: config.reconnect_base_ms,
            reconnect_max_ms: config.reconnect_max_ms,
            history_limit: config.history_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_parlo_env() {
        remove_env("PARLO_ENGINE_URL");
        remove_env("PARLO_API_KEY");
        remove_env("PARLO_INPUT_DEVICE");
        remove_env("PARLO_OUTPUT_DEVICE");
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.audio.input_device, None);
        assert_eq!(config.audio.output_device, None);

        assert_eq!(config.engine.url, "ws://127.0.0.1:8765/translate");
        assert_eq!(config.engine.api_key, None);

        assert_eq!(config.session.max_reconnect_attempts, 5);
        assert_eq!(config.session.reconnect_base_ms, 3000);
        assert_eq!(config.session.reconnect_max_ms, 30_000);
        assert_eq!(config.session.history_limit, 50);
    }

    #[test]
    fn test_load_from_toml_file() {
        let toml_content = r#"
            [audio]
            input_device = "hw:0,0"
            output_device = "pulse"

            [engine]
            url = "wss://translate.example.com/v1"
            api_key = "sk-test"

            [session]
            max_reconnect_attempts = 3
            reconnect_base_ms = 1000
            reconnect_max_ms = 10000
            history_limit = 20
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.audio.input_device, Some("hw:0,0".to_string()));
        assert_eq!(config.audio.output_device, Some("pulse".to_string()));

        assert_eq!(config.engine.url, "wss://translate.example.com/v1");
        assert_eq!(config.engine.api_key, Some("sk-test".to_string()));

        assert_eq!(config.session.max_reconnect_attempts, 3);
        assert_eq!(config.session.reconnect_base_ms, 1000);
        assert_eq!(config.session.reconnect_max_ms, 10000);
        assert_eq!(config.session.history_limit, 20);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let toml_content = r#"
            [engine]
            url = "ws://10.0.0.2:9000/translate"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        // Only the URL should be overridden
        assert_eq!(config.engine.url, "ws://10.0.0.2:9000/translate");

        // Everything else should be defaults
        assert_eq!(config.audio.input_device, None);
        assert_eq!(config.engine.api_key, None);
        assert_eq!(config.session.max_reconnect_attempts, 5);
        assert_eq!(config.session.history_limit, 50);
    }

    #[test]
    fn test_env_override_engine_url() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_parlo_env();

        set_env("PARLO_ENGINE_URL", "ws://localhost:1234/t");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.engine.url, "ws://localhost:1234/t");
        assert_eq!(config.engine.api_key, None); // Not overridden

        clear_parlo_env();
    }

    #[test]
    fn test_env_override_all() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_parlo_env();

        set_env("PARLO_ENGINE_URL", "wss://prod.example.com");
        set_env("PARLO_API_KEY", "sk-live");
        set_env("PARLO_INPUT_DEVICE", "hw:1,0");
        set_env("PARLO_OUTPUT_DEVICE", "default");

        let config = Config::default().with_env_overrides();

        assert_eq!(config.engine.url, "wss://prod.example.com");
        assert_eq!(config.engine.api_key, Some("sk-live".to_string()));
        assert_eq!(config.audio.input_device, Some("hw:1,0".to_string()));
        assert_eq!(config.audio.output_device, Some("default".to_string()));

        clear_parlo_env();
    }

    #[test]
    fn test_env_override_empty_string_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_parlo_env();

        set_env("PARLO_ENGINE_URL", "");
        let config = Config::default().with_env_overrides();

        // Empty string should not override default
        assert_eq!(config.engine.url, "ws://127.0.0.1:8765/translate");

        clear_parlo_env();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let invalid_toml = r#"
            [engine
            url = "broken
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_toml.as_bytes()).unwrap();

        let result = Config::load(temp_file.path());

        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let missing_path = Path::new("/tmp/nonexistent_parlo_config_12345.toml");
        let config = Config::load_or_default(missing_path).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_fails_on_invalid_toml() {
        let invalid_toml = r#"
            [engine
            url = "broken
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_toml.as_bytes()).unwrap();

        // Invalid TOML must surface as an error, not silently become defaults
        assert!(Config::load_or_default(temp_file.path()).is_err());
    }

    #[test]
    fn test_session_settings_from_config() {
        let config = SessionConfig {
            max_reconnect_attempts: 2,
            reconnect_base_ms: 500,
            reconnect_max_ms: 4000,
            history_limit: 10,
        };
        let settings = crate::session::SessionSettings::from(&config);
        assert_eq!(settings.max_reconnect_attempts, 2);
        assert_eq!(settings.reconnect_base_ms, 500);
        assert_eq!(settings.reconnect_max_ms, 4000);
        assert_eq!(settings.history_limit, 10);
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_default_path_is_xdg_compliant() {
        let path = Config::default_path().unwrap();
        let path_str = path.to_string_lossy();

        assert!(path_str.contains("parlo"));
        assert!(path_str.ends_with("config.toml"));
    }
}
