//! Configuration loading for the FlowBoard client.
//!
//! All fields are required unless explicitly marked optional. No defaults
//! for endpoints.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use flowboard_storage::CacheConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout_ms: u64,
    pub credential_store_path: PathBuf,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSettings {
    pub stale_after_ms: u64,
    pub retry_max: u32,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or FLOWBOARD_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "api_base_url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.credential_store_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "credential_store_path",
                reason: "must not be empty".to_string(),
            });
        }
        if self.cache.stale_after_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.stale_after_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.cache.retry_backoff_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.retry_backoff_ms",
                reason: "must be > 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .with_stale_after(Duration::from_millis(self.cache.stale_after_ms))
            .with_retry_max(self.cache.retry_max)
            .with_retry_backoff(Duration::from_millis(self.cache.retry_backoff_ms))
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("FLOWBOARD_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = r#"
        api_base_url = "https://flow-board.onrender.com"
        request_timeout_ms = 10000
        credential_store_path = "/tmp/flowboard/secure.json"

        [cache]
        stale_after_ms = 300000
        retry_max = 2
        retry_backoff_ms = 1000
    "#;

    #[test]
    fn test_parse_and_validate() {
        let config: ClientConfig = toml::from_str(GOOD).unwrap();
        config.validate().unwrap();
        assert_eq!(config.cache_config().retry_max, 2);
        assert_eq!(
            config.cache_config().stale_after,
            Duration::from_secs(300)
        );
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let mut config: ClientConfig = toml::from_str(GOOD).unwrap();
        config.api_base_url = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue {
                field: "api_base_url",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config: ClientConfig = toml::from_str(GOOD).unwrap();
        config.request_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let with_extra = format!("{GOOD}\nunknown_field = 1\n");
        assert!(toml::from_str::<ClientConfig>(&with_extra).is_err());
    }
}
