//! Configuration loading and validation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{InkcastError, Result};

/// Top-level Inkcast configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_bind")]
    pub bind: String,

    /// WebSocket endpoint path.
    #[serde(default = "default_ws_path")]
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            path: default_ws_path(),
        }
    }
}

fn default_port() -> u16 {
    1234
}

fn default_bind() -> String {
    "0.0.0.0".into()
}

fn default_ws_path() -> String {
    "/test".into()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "plain" (default) or "json".
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log level override (trace/debug/info/warn/error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Per-crate log level overrides (e.g. "inkcast_hub=debug").
    #[serde(default)]
    pub filters: Vec<String>,

    /// Output target: "stderr" (default) or "stdout".
    #[serde(default = "default_log_output")]
    pub output: String,
}

fn default_log_format() -> String {
    "plain".into()
}

fn default_log_output() -> String {
    "stderr".into()
}

/// Paths the server reserves for its own HTTP routes.
const RESERVED_PATHS: &[&str] = &["/health", "/metrics"];

/// Characters the router treats as captures or wildcards.
const ROUTE_PATTERN_CHARS: &[char] = &['*', ':', '{', '}'];

/// Substitute `${ENV_VAR}` patterns in a string with their environment variable values.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| InkcastError::Config(e.to_string()))?;
    Ok(re
        .replace_all(input, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned())
}

impl Config {
    /// Load config from a JSON5 file, substituting `${ENV_VAR}` references.
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        debug!(path = %path.display(), "Loading config");
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    /// Parse config text (JSON5).
    pub fn parse(raw: &str) -> Result<Self> {
        let substituted = substitute_env_vars(raw)?;
        json5::from_str(&substituted).map_err(|e| InkcastError::Config(e.to_string()))
    }

    /// Default config file location.
    pub fn default_path() -> PathBuf {
        data_dir().join("config.json")
    }

    /// Effective server settings (defaults filled in).
    pub fn server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    /// Validate config, returning (warnings, errors).
    pub fn validate(&self) -> (Vec<String>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        let server = self.server();
        if server.port == 0 {
            errors.push("Server port cannot be 0".to_string());
        }
        if !server.path.starts_with('/') {
            errors.push(format!(
                "WebSocket path must start with '/': {}",
                server.path
            ));
        }
        if server.path.contains(ROUTE_PATTERN_CHARS) {
            errors.push(format!(
                "WebSocket path must be a literal path without '*', ':', '{{' or '}}': {}",
                server.path
            ));
        }
        if RESERVED_PATHS.contains(&server.path.as_str()) {
            errors.push(format!("WebSocket path is reserved: {}", server.path));
        }
        if server.bind.parse::<std::net::IpAddr>().is_err() {
            warnings.push(format!(
                "Bind address '{}' is not an IP literal and will be resolved at startup",
                server.bind
            ));
        }

        if let Some(logging) = &self.logging {
            if logging.format != "plain" && logging.format != "json" {
                warnings.push(format!(
                    "Unknown log format '{}', falling back to plain",
                    logging.format
                ));
            }
            if logging.output != "stderr" && logging.output != "stdout" {
                warnings.push(format!(
                    "Unknown log output '{}', falling back to stderr",
                    logging.output
                ));
            }
        }

        (warnings, errors)
    }
}

/// Base directory for Inkcast data: `~/.inkcast/`
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".inkcast")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        let server = config.server();
        assert_eq!(server.port, 1234);
        assert_eq!(server.bind, "0.0.0.0");
        assert_eq!(server.path, "/test");
        let (warnings, errors) = config.validate();
        assert!(warnings.is_empty());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.json")).unwrap();
        assert!(config.server.is_none());
        assert_eq!(config.server().port, 1234);
    }

    #[test]
    fn test_load_json5_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                // trailing commas and comments are fine
                server: { port: 9000, path: "/draw", },
            }"#,
        )
        .unwrap();
        let config = Config::load(&path).unwrap();
        let server = config.server();
        assert_eq!(server.port, 9000);
        assert_eq!(server.path, "/draw");
        assert_eq!(server.bind, "0.0.0.0");
    }

    #[test]
    fn test_env_var_substitution() {
        // SAFETY: test-only, variable name unique to this test
        unsafe { std::env::set_var("TEST_INKCAST_PORT", "4321") };
        let config = Config::parse(r#"{ "server": { "port": ${TEST_INKCAST_PORT} } }"#).unwrap();
        assert_eq!(config.server().port, 4321);
        unsafe { std::env::remove_var("TEST_INKCAST_PORT") };
    }

    #[test]
    fn test_env_var_missing() {
        let result = substitute_env_vars(r#"{"bind": "${NONEXISTENT_VAR_INKCAST_TEST}"}"#).unwrap();
        assert_eq!(result, r#"{"bind": ""}"#);
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let err = Config::parse("{ server: ").unwrap_err();
        assert!(matches!(err, InkcastError::Config(_)));
    }

    #[test]
    fn test_logging_config_defaults() {
        let config = Config::parse(r#"{ "logging": {} }"#).unwrap();
        let logging = config.logging.expect("logging should be present");
        assert_eq!(logging.format, "plain");
        assert!(logging.level.is_none());
        assert_eq!(logging.output, "stderr");
        assert!(logging.filters.is_empty());
    }

    #[test]
    fn test_logging_config_filters() {
        let config = Config::parse(
            r#"{
                "logging": {
                    "format": "json",
                    "level": "debug",
                    "filters": ["inkcast_hub=trace", "tower_http=warn"]
                }
            }"#,
        )
        .unwrap();
        let logging = config.logging.expect("logging should be present");
        assert_eq!(logging.format, "json");
        assert_eq!(logging.level.as_deref(), Some("debug"));
        assert_eq!(logging.filters, vec!["inkcast_hub=trace", "tower_http=warn"]);
    }

    #[test]
    fn test_validate_bad_server() {
        let config = Config {
            server: Some(ServerConfig {
                port: 0,
                bind: "localhost".into(),
                path: "test".into(),
            }),
            ..Config::default()
        };
        let (warnings, errors) = config.validate();
        assert!(errors.iter().any(|e| e.contains("port")), "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("start with")), "{errors:?}");
        assert!(warnings.iter().any(|w| w.contains("localhost")), "{warnings:?}");
    }

    #[test]
    fn test_validate_reserved_path() {
        let config = Config {
            server: Some(ServerConfig {
                path: "/health".into(),
                ..ServerConfig::default()
            }),
            ..Config::default()
        };
        let (_warnings, errors) = config.validate();
        assert!(errors.iter().any(|e| e.contains("reserved")), "{errors:?}");
    }

    #[test]
    fn test_validate_rejects_route_patterns() {
        for path in ["/a/*x", "/a/:id", "/draw/{room}", "/{*rest}"] {
            let config = Config {
                server: Some(ServerConfig {
                    path: path.into(),
                    ..ServerConfig::default()
                }),
                ..Config::default()
            };
            let (_warnings, errors) = config.validate();
            assert!(
                errors.iter().any(|e| e.contains("literal path")),
                "expected {path} to be rejected, got: {errors:?}"
            );
        }
    }

    #[test]
    fn test_validate_accepts_nested_literal_path() {
        let config = Config {
            server: Some(ServerConfig {
                path: "/rooms/main-board".into(),
                ..ServerConfig::default()
            }),
            ..Config::default()
        };
        let (_warnings, errors) = config.validate();
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_validate_unknown_log_format_warns() {
        let config = Config::parse(r#"{ logging: { format: "xml" } }"#).unwrap();
        let (warnings, errors) = config.validate();
        assert!(errors.is_empty());
        assert!(warnings.iter().any(|w| w.contains("xml")), "{warnings:?}");
    }
}
