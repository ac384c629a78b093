//! Application settings.
//!
//! Layers, lowest to highest priority: built-in defaults, an optional TOML
//! file (`hello-htmx.toml`, or the path in `HELLO_HTMX_CONFIG`), a `.env` file
//! loaded with `dotenvy`, then `HELLO_HTMX_*` environment variables. Values
//! already present in the process environment win over `.env`.
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 8080
//! cookie_secure = true
//! log_format = "json"
//! ```

use hello_htmx_core::logging::{LogConfig, LogFormat, LogLevel};
use hello_htmx_templates::TemplateConfig;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix shared by every setting's environment variable
pub const ENV_PREFIX: &str = "HELLO_HTMX";

/// Points at a TOML settings file
pub const CONFIG_PATH_ENV: &str = "HELLO_HTMX_CONFIG";

/// Settings file read from the working directory when present
pub const DEFAULT_CONFIG_FILE: &str = "hello-htmx.toml";

/// Dotenv file read from the working directory when present
pub const ENV_FILE: &str = ".env";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub template_dir: PathBuf,
    /// Directory holding `.state/csrf_secret`
    pub state_dir: PathBuf,
    /// Mark the CSRF cookie `Secure`
    pub cookie_secure: bool,
    /// Reload templates on every render
    pub template_dev_mode: bool,
    pub log_level: String,
    pub log_format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            template_dir: PathBuf::from("templates"),
            state_dir: PathBuf::from("."),
            cookie_secure: false,
            template_dev_mode: false,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Resolve settings from the process environment and working directory
    pub fn load() -> Result<Self> {
        load_env_file(Path::new(ENV_FILE))?;

        let lookup = |key: &str| std::env::var(key).ok();
        let file = match lookup(CONFIG_PATH_ENV) {
            Some(path) => Some(PathBuf::from(path)),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
        };

        Self::resolve(file.as_deref(), lookup)
    }

    /// Resolve settings from an optional file and an environment lookup
    pub fn resolve<F>(file: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        base.apply_env_with(lookup)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::LoadError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))
    }

    /// Override fields from `HELLO_HTMX_*` variables
    pub fn apply_env_with<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}_{}", ENV_PREFIX, name));

        if let Some(host) = var("HOST") {
            self.host = host;
        }
        if let Some(port) = var("PORT") {
            self.port = port
                .parse()
                .map_err(|_| ConfigError::ValidationError(format!("Invalid port: {}", port)))?;
        }
        if let Some(dir) = var("TEMPLATE_DIR") {
            self.template_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var("STATE_DIR") {
            self.state_dir = PathBuf::from(dir);
        }
        if let Some(value) = var("COOKIE_SECURE") {
            self.cookie_secure = parse_bool("COOKIE_SECURE", &value)?;
        }
        if let Some(value) = var("TEMPLATE_DEV_MODE") {
            self.template_dev_mode = parse_bool("TEMPLATE_DEV_MODE", &value)?;
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.log_format = format;
        }

        Ok(self)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ConfigError::ValidationError(format!("Invalid listen address: {}", addr)))
    }

    pub fn log_config(&self) -> Result<LogConfig> {
        let level = LogLevel::parse(&self.log_level).ok_or_else(|| {
            ConfigError::ValidationError(format!("Unknown log level: {}", self.log_level))
        })?;
        let format = LogFormat::parse(&self.log_format).ok_or_else(|| {
            ConfigError::ValidationError(format!("Unknown log format: {}", self.log_format))
        })?;

        Ok(LogConfig::new().level(level).format(format))
    }

    pub fn template_config(&self) -> TemplateConfig {
        TemplateConfig::new(&self.template_dir).with_dev_mode(self.template_dev_mode)
    }
}

/// Export the variables in a dotenv file
///
/// A missing file is not an error. A file that fails to parse is.
pub fn load_env_file(path: &Path) -> Result<()> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(ConfigError::LoadError(format!(
            "Failed to load {}: {}",
            path.display(),
            e
        ))),
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::ValidationError(format!(
            "{}_{} must be a boolean, got {:?}",
            ENV_PREFIX, name, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::resolve(None, env(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.socket_addr().unwrap().port(), 8000);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            port = 9000
            cookie_secure = true
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 9000);
        assert!(config.cookie_secure);
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_unknown_toml_key_rejected() {
        assert!(matches!(
            AppConfig::from_toml_str("prot = 1"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello-htmx.toml");
        fs::write(&path, "port = 9000\nlog_level = \"debug\"\n").unwrap();

        let config = AppConfig::resolve(
            Some(&path),
            env(&[("HELLO_HTMX_PORT", "9100"), ("HELLO_HTMX_COOKIE_SECURE", "yes")]),
        )
        .unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.log_level, "debug");
        assert!(config.cookie_secure);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::resolve(Some(&dir.path().join("absent.toml")), env(&[]));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn test_missing_env_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_env_file(&dir.path().join(".env")).is_ok());
    }

    #[test]
    fn test_malformed_env_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        fs::write(&path, "this is not a variable\n").unwrap();

        assert!(matches!(
            load_env_file(&path),
            Err(ConfigError::LoadError(_))
        ));
    }

    #[test]
    fn test_invalid_env_values() {
        assert!(matches!(
            AppConfig::resolve(None, env(&[("HELLO_HTMX_PORT", "http")])),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            AppConfig::resolve(None, env(&[("HELLO_HTMX_TEMPLATE_DEV_MODE", "maybe")])),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_log_config() {
        let config = AppConfig {
            log_level: "warning".to_string(),
            log_format: "json".to_string(),
            ..AppConfig::default()
        };
        let log = config.log_config().unwrap();
        assert_eq!(log.level, LogLevel::Warn);
        assert_eq!(log.format, LogFormat::Json);

        let bad = AppConfig {
            log_format: "xml".to_string(),
            ..AppConfig::default()
        };
        assert!(bad.log_config().is_err());
    }

    #[test]
    fn test_invalid_host() {
        let config = AppConfig {
            host: "not a host".to_string(),
            ..AppConfig::default()
        };
        assert!(config.socket_addr().is_err());
    }
}
