use serde::Deserialize;
use std::path::{Path, PathBuf};

use trellis_core::access::SessionPolicy;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log: LogConfig,
    pub session: SessionConfig,
    pub bootstrap: BootstrapConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub ttl_minutes: i64,
    pub renewal_minutes: i64,
}

/// Credentials of the root principal created at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub user: String,
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub path: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            level: "info".to_string(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 30,
            renewal_minutes: 30,
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            user: "System Administrator".to_string(),
            login: "sysadmin".to_string(),
            password: "changeme".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e.to_string()))?;
            toml::from_str::<AppConfig>(&contents)
                .map_err(|e| ConfigError::ParseToml(e.to_string()))?
        } else {
            AppConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("TRELLIS_LOG_LEVEL") {
            self.log.level = v;
        }
        if let Ok(v) = std::env::var("TRELLIS_LOG_FORMAT") {
            match v.as_str() {
                "json" => self.log.format = LogFormat::Json,
                "pretty" => self.log.format = LogFormat::Pretty,
                _ => {}
            }
        }
        if let Ok(v) = std::env::var("TRELLIS_SEED_PATH") {
            self.seed.path = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("TRELLIS_BOOTSTRAP_LOGIN") {
            self.bootstrap.login = v;
        }
        if let Ok(v) = std::env::var("TRELLIS_BOOTSTRAP_PASSWORD") {
            self.bootstrap.password = v;
        }
        if let Ok(v) = std::env::var("TRELLIS_SESSION_TTL_MINUTES")
            && let Ok(n) = v.parse()
        {
            self.session.ttl_minutes = n;
        }
        if let Ok(v) = std::env::var("TRELLIS_SESSION_RENEWAL_MINUTES")
            && let Ok(n) = v.parse()
        {
            self.session.renewal_minutes = n;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session.ttl_minutes <= 0 {
            return Err(ConfigError::Validation(
                "session.ttl_minutes must be positive".to_string(),
            ));
        }
        if self.session.renewal_minutes <= 0 {
            return Err(ConfigError::Validation(
                "session.renewal_minutes must be positive".to_string(),
            ));
        }
        if self.bootstrap.login.trim().is_empty() {
            return Err(ConfigError::Validation(
                "bootstrap.login must not be empty".to_string(),
            ));
        }
        if self.bootstrap.password.is_empty() {
            return Err(ConfigError::Validation(
                "bootstrap.password must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            ttl: chrono::Duration::minutes(self.session.ttl_minutes),
            renewal: chrono::Duration::minutes(self.session.renewal_minutes),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{0}': {1}")]
    ReadFile(String, String),

    #[error("failed to parse TOML config: {0}")]
    ParseToml(String),

    #[error("config validation failed: {0}")]
    Validation(String),
}
