use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::{AddrParseError, SocketAddr};
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub relay: RelayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            http_port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

/// Relay tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Queue depth of each per-connection sink. When a slow consumer fills
    /// its queue the router drops further events for it rather than block.
    pub sink_capacity: usize,
    /// Maximum accepted WebSocket frame size in bytes.
    pub max_frame_bytes: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            sink_capacity: 256,
            max_frame_bytes: 1024 * 1024,
        }
    }
}

impl Config {
    /// Layered configuration: defaults underneath, an optional file on top
    /// of them, and `ROOMCAST_*` environment variables above both. A file
    /// path that does not exist is simply skipped.
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file.map(Path::new).filter(|path| path.exists()) {
            builder = builder.add_source(File::from(path));
        }

        builder
            .add_source(
                Environment::with_prefix("ROOMCAST")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Check invariants that would otherwise only surface at runtime.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.relay.sink_capacity == 0 {
            errors.push("relay.sink_capacity must be at least 1".to_string());
        }
        if self.relay.max_frame_bytes == 0 {
            errors.push("relay.max_frame_bytes must be at least 1".to_string());
        }
        if !matches!(self.logging.format.as_str(), "json" | "pretty") {
            errors.push(format!(
                "logging.format must be \"json\" or \"pretty\", got {:?}",
                self.logging.format
            ));
        }
        if self.http_addr().is_err() {
            errors.push(format!(
                "server.host {:?} and http_port {} do not form a bindable address",
                self.server.host, self.server.http_port
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Address the HTTP listener binds.
    pub fn http_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.host, self.server.http_port).parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.server.http_port > 0);
        assert!(config.relay.sink_capacity > 0);
        assert!(config.relay.max_frame_bytes > 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_http_addr() {
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                http_port: 9090,
            },
            ..Config::default()
        };

        let addr = config.http_addr().unwrap();
        assert_eq!(addr, "127.0.0.1:9090".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_validate_rejects_unparseable_host() {
        let config = Config {
            server: ServerConfig {
                host: "not a host".to_string(),
                http_port: 8080,
            },
            ..Config::default()
        };

        let errors = config.validate().unwrap_err();
        assert!(errors[0].contains("bindable address"));
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = Config {
            relay: RelayConfig {
                sink_capacity: 0,
                ..RelayConfig::default()
            },
            ..Config::default()
        };

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("sink_capacity"));
    }

    #[test]
    fn test_validate_rejects_unknown_log_format() {
        let config = Config {
            logging: LoggingConfig {
                format: "xml".to_string(),
                ..LoggingConfig::default()
            },
            ..Config::default()
        };

        assert!(config.validate().is_err());
    }
}
