//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_DB_FILE: &str = "DB_FILE";
pub const ENV_CORS_ORIGINS: &str = "CORS_ORIGINS";
pub const ENV_CORS_DEV_ORIGIN_PATTERN: &str = "CORS_DEV_ORIGIN_PATTERN";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
pub const ENV_METRICS_ENABLED: &str = "METRICS_ENABLED";
pub const ENV_METRICS_ADDRESS: &str = "METRICS_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{var}={value:?} is invalid: {reason}")]
    Env {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the optional TOML file, then the
/// environment (including a `.env` file), then validate.
pub fn load_config(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_file(path)?,
        None => ServerConfig::default(),
    };

    if let Ok(env_file) = dotenvy::dotenv() {
        tracing::debug!(path = %env_file.display(), "Loaded .env file");
    }
    apply_overrides(&mut config, |var| std::env::var(var).ok())?;

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Parse a TOML configuration file without validating it.
pub fn load_file(path: &Path) -> Result<ServerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Apply environment overrides read through `lookup`.
pub fn apply_overrides<F>(config: &mut ServerConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(ENV_HOST) {
        config.listener.host = host;
    }
    if let Some(port) = lookup(ENV_PORT) {
        config.listener.port = parse_var(ENV_PORT, port)?;
    }
    if let Some(path) = lookup(ENV_DB_FILE) {
        config.store.path = path;
    }
    if let Some(origins) = lookup(ENV_CORS_ORIGINS) {
        let origins: Vec<String> = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
        config.cors.allow_any_origin = origins.iter().any(|o| o == "*");
        config.cors.allowed_origins = origins;
    }
    if let Some(pattern) = lookup(ENV_CORS_DEV_ORIGIN_PATTERN) {
        config.cors.dev_origin_pattern = pattern;
    }
    if let Some(secs) = lookup(ENV_REQUEST_TIMEOUT_SECS) {
        config.timeouts.request_secs = parse_var(ENV_REQUEST_TIMEOUT_SECS, secs)?;
    }
    if let Some(level) = lookup(ENV_LOG_LEVEL) {
        config.observability.log_level = level;
    }
    if let Some(enabled) = lookup(ENV_METRICS_ENABLED) {
        config.observability.metrics_enabled = parse_var(ENV_METRICS_ENABLED, enabled)?;
    }
    if let Some(address) = lookup(ENV_METRICS_ADDRESS) {
        config.observability.metrics_address = address;
    }
    Ok(())
}

fn parse_var<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| ConfigError::Env {
        var,
        reason: e.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_defaults() {
        let mut config = ServerConfig::default();
        apply_overrides(
            &mut config,
            lookup(&[
                ("PORT", "8088"),
                ("DB_FILE", "/tmp/routes.json"),
                ("CORS_ORIGINS", "https://a.test, https://b.test"),
                ("METRICS_ENABLED", "true"),
            ]),
        )
        .unwrap();

        assert_eq!(config.listener.port, 8088);
        assert_eq!(config.store.path, "/tmp/routes.json");
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://a.test".to_string(), "https://b.test".to_string()]
        );
        assert!(!config.cors.allow_any_origin);
        assert!(config.observability.metrics_enabled);
    }

    #[test]
    fn test_wildcard_origin_env_allows_any() {
        let mut config = ServerConfig::default();
        apply_overrides(&mut config, lookup(&[("CORS_ORIGINS", "*")])).unwrap();
        assert!(config.cors.allow_any_origin);
    }

    #[test]
    fn test_invalid_port_is_reported() {
        let mut config = ServerConfig::default();
        let err = apply_overrides(&mut config, lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "PORT", .. }));
    }

    #[test]
    fn test_toml_file_is_merged_with_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mock.toml");
        std::fs::write(
            &path,
            "[listener]\nport = 4000\n\n[store]\npath = \"state/routes.json\"\n",
        )
        .unwrap();

        let config = load_file(&path).unwrap();
        assert_eq!(config.listener.port, 4000);
        assert_eq!(config.listener.host, "0.0.0.0");
        assert_eq!(config.store.path, "state/routes.json");
        assert_eq!(config.timeouts.request_secs, 30);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
