//! Layered server configuration
//!
//! Sources, highest priority last:
//! 1. Built-in defaults
//! 2. YAML file given with `--config`
//! 3. `TRAINING_*` environment variables, `__` separating sections
//!    (`TRAINING_DATABASE__URL` -> `database.url`)

use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_PREFIX: &str = "TRAINING_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub ledger: enrollment_ledger::Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Upper bound for a single request, including its transaction
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8087".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://training-admin.db?mode=rwc".to_string(),
            max_connections: 10,
            connect_timeout: Duration::from_secs(10),
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` wins when set
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl AppConfig {
    /// Load from defaults, the optional YAML file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
        }
        Self::figment(path)
            .extract()
            .context("failed to load configuration")
    }

    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_extract_without_sources() {
        Jail::expect_with(|_jail| {
            let config: AppConfig = AppConfig::figment(None).extract()?;
            assert_eq!(config.server.bind_addr, "127.0.0.1:8087");
            assert_eq!(config.server.request_timeout, Duration::from_secs(30));
            assert_eq!(config.database.max_connections, 10);
            assert!(config.database.run_migrations);
            assert_eq!(config.logging.format, LogFormat::Compact);
            assert_eq!(config.ledger.max_page_size, 100);
            Ok(())
        });
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "server.yaml",
                r#"
server:
  bind_addr: "0.0.0.0:9000"
  request_timeout: 5s
database:
  url: "postgres://ledger@localhost/training"
  max_connections: 4
  connect_timeout: 2s
  run_migrations: false
logging:
  level: debug
  format: json
ledger:
  max_page_size: 50
"#,
            )?;

            let config: AppConfig = AppConfig::figment(Some(Path::new("server.yaml"))).extract()?;
            assert_eq!(config.server.bind_addr, "0.0.0.0:9000");
            assert_eq!(config.server.request_timeout, Duration::from_secs(5));
            assert_eq!(config.database.url, "postgres://ledger@localhost/training");
            assert!(!config.database.run_migrations);
            assert_eq!(config.logging.format, LogFormat::Json);
            assert_eq!(config.ledger.max_page_size, 50);
            assert_eq!(config.ledger.default_page_size, 20);
            Ok(())
        });
    }

    #[test]
    fn environment_beats_yaml() {
        Jail::expect_with(|jail| {
            jail.create_file("server.yaml", "logging:\n  level: debug\n  format: compact\n")?;
            jail.set_env("TRAINING_LOGGING__LEVEL", "warn");
            jail.set_env("TRAINING_LEDGER__AUDIT_ENABLED", "false");

            let config: AppConfig = AppConfig::figment(Some(Path::new("server.yaml"))).extract()?;
            assert_eq!(config.logging.level, "warn");
            assert!(!config.ledger.audit_enabled);
            Ok(())
        });
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/training-admin.yaml")));
        assert!(result.is_err());
    }
}
