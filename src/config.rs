use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::lecroy::vicp::{ConnectionConfig, DEFAULT_PORT};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    pub scope: ScopeConfig,
    pub logging: LoggingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScopeConfig {
    pub host: String,
    pub port: u16,
    pub connect_timeout_secs: f64,
    /// Baseline read timeout for every command
    pub read_timeout_secs: f64,
    pub write_timeout_secs: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OutputConfig {
    /// Directory for screenshots and waveform files
    pub directory: String,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            connect_timeout_secs: 5.0,
            read_timeout_secs: 10.0,
            write_timeout_secs: 5.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "./captures".to_string(),
        }
    }
}

impl ScopeConfig {
    pub fn connection_config(&self) -> Result<ConnectionConfig, ConfigError> {
        Ok(ConnectionConfig {
            connect_timeout: seconds("connect_timeout_secs", self.connect_timeout_secs)?,
            read_timeout: seconds("read_timeout_secs", self.read_timeout_secs)?,
            write_timeout: seconds("write_timeout_secs", self.write_timeout_secs)?,
        })
    }
}

fn seconds(key: &str, value: f64) -> Result<Duration, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(Duration::from_secs_f64(value))
    } else {
        Err(ConfigError::Message(format!(
            "scope.{key} must be a positive number of seconds, got {value}"
        )))
    }
}

/// Load configuration from file with layered fallbacks
pub fn load_config(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

    if let Some(path) = config_path {
        if path.exists() {
            builder = builder.add_source(File::from(path));
        } else {
            return Err(ConfigError::Message(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
    } else {
        for path in ["scope.toml", "config.toml"] {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
                break;
            }
        }
    }

    // Environment overrides, e.g. RUSTY_LECROY_SCOPE__HOST
    builder = builder.add_source(
        Environment::with_prefix("RUSTY_LECROY")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize::<AppConfig>()
}

/// Load configuration, falling back to defaults on any error
pub fn load_config_or_default(config_path: Option<&Path>) -> AppConfig {
    match load_config(config_path) {
        Ok(config) => {
            log::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            log::warn!("Failed to load config ({}), using defaults", e);
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[scope]\nhost = \"10.0.0.7\"\nread_timeout_secs = 2.5\n\n[output]\ndirectory = \"/tmp/shots\""
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();

        assert_eq!(config.scope.host, "10.0.0.7");
        assert_eq!(config.scope.port, DEFAULT_PORT);
        assert_eq!(config.scope.read_timeout_secs, 2.5);
        assert_eq!(config.logging.log_level, "info");
        assert_eq!(config.output.directory, "/tmp/shots");
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = load_config(Some(Path::new("/definitely/not/here.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config_or_default(Some(Path::new("/definitely/not/here.toml")));
        assert_eq!(config.scope.host, "127.0.0.1");
    }

    #[test]
    fn test_connection_config_conversion() {
        let scope = ScopeConfig {
            read_timeout_secs: 0.25,
            ..ScopeConfig::default()
        };
        let connection = scope.connection_config().unwrap();
        assert_eq!(connection.read_timeout, Duration::from_millis(250));
        assert_eq!(connection.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_connection_config_rejects_non_positive() {
        let scope = ScopeConfig {
            write_timeout_secs: 0.0,
            ..ScopeConfig::default()
        };
        assert!(scope.connection_config().is_err());
    }
}
