use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const CONFIG_PATH_ENV: &str = "REDDIT_DATA_CONFIG";
pub const USER_AGENT_ENV: &str = "REDDIT_DATA_USER_AGENT";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub archival_base_url: String,
    pub live_base_url: String,
    pub user_agent: String,
    pub http_timeout_secs: u64,
    pub rate_limit: RateLimitSettings,
    pub defaults: SearchDefaults,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub max_tokens: u32,
    pub refill_window_secs: u64,
    pub pacing_min_ms: u64,
    pub pacing_max_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchDefaults {
    pub limit: u32,
    pub max_chars: usize,
    pub comments_per_post: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            archival_base_url: "https://api.pullpush.io/reddit".to_string(),
            live_base_url: "https://www.reddit.com".to_string(),
            user_agent: concat!("reddit-data/", env!("CARGO_PKG_VERSION")).to_string(),
            http_timeout_secs: 30,
            rate_limit: RateLimitSettings::default(),
            defaults: SearchDefaults::default(),
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_tokens: 3,
            refill_window_secs: 60,
            pacing_min_ms: 1000,
            pacing_max_ms: 5000,
        }
    }
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            limit: 10,
            max_chars: 500,
            comments_per_post: 5,
        }
    }
}

impl AppConfig {
    /// Reads a TOML file; missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        let config: AppConfig = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolves configuration from an explicit path, then `REDDIT_DATA_CONFIG`,
    /// then built-in defaults. `REDDIT_DATA_USER_AGENT` always wins.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var(CONFIG_PATH_ENV).ok();
        let mut config = match explicit.or(env_path.as_deref().map(Path::new)) {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };

        if let Ok(user_agent) = std::env::var(USER_AGENT_ENV) {
            if !user_agent.trim().is_empty() {
                config.user_agent = user_agent;
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "user_agent".to_string(),
                value: self.user_agent.clone(),
            });
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http_timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }
        self.rate_limit.validate()
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

impl RateLimitSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationFailed {
                reason: "rate_limit.max_tokens must be at least 1".to_string(),
            });
        }
        if self.refill_window_secs == 0 {
            return Err(ConfigError::ValidationFailed {
                reason: "rate_limit.refill_window_secs must be at least 1".to_string(),
            });
        }
        if self.pacing_min_ms > self.pacing_max_ms {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "rate_limit.pacing_min_ms ({}) exceeds pacing_max_ms ({})",
                    self.pacing_min_ms, self.pacing_max_ms
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rate_limit.max_tokens, 3);
        assert_eq!(config.rate_limit.refill_window_secs, 60);
        assert_eq!(config.http_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "user_agent = \"test-agent/1.0\"\n\n[rate_limit]\nmax_tokens = 5"
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.user_agent, "test-agent/1.0");
        assert_eq!(config.rate_limit.max_tokens, 5);
        assert_eq!(config.rate_limit.refill_window_secs, 60);
        assert_eq!(config.defaults.limit, 10);
    }

    #[test]
    fn test_inverted_pacing_rejected() {
        let settings = RateLimitSettings {
            pacing_min_ms: 10,
            pacing_max_ms: 5,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::ValidationFailed { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = AppConfig::from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }
}
