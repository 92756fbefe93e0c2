//! Load `AppConfig` from a YAML file, then apply environment overrides.

use crate::config::types::{AppConfig, LogFormat};
use crate::error::ConfigError;
use std::path::Path;

pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "configs/config.yaml";

/// Load from `$CONFIG_PATH` (or the default path) and the process environment.
pub fn load() -> Result<AppConfig, ConfigError> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let config = load_file(Path::new(&path))?;
    let config = with_env_overrides(config, |k| std::env::var(k).ok())?;
    validate(&config)?;
    Ok(config)
}

/// A missing file yields the defaults.
pub fn load_file(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "config file not found, using defaults");
        return Ok(AppConfig::default());
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    parse(&text)
}

pub fn parse(yaml: &str) -> Result<AppConfig, ConfigError> {
    if yaml.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    serde_yaml::from_str(yaml).map_err(|e| ConfigError::Load(e.to_string()))
}

/// Apply `SERVER_PORT`, `SERVER_HOST`, `STORE_URI`/`DATABASE_URL`, `STORE_DATABASE`,
/// `LOG_LEVEL` and `LOG_FORMAT` read through `var`.
pub fn with_env_overrides(
    mut config: AppConfig,
    var: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigError> {
    if let Some(v) = var("SERVER_PORT") {
        config.server.port = v
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("SERVER_PORT must be a port number, got '{}'", v)))?;
    }
    if let Some(v) = var("SERVER_HOST") {
        config.server.host = v;
    }
    if let Some(v) = var("STORE_URI").or_else(|| var("DATABASE_URL")) {
        config.store.uri = v;
    }
    if let Some(v) = var("STORE_DATABASE") {
        config.store.database = Some(v);
    }
    if let Some(v) = var("LOG_LEVEL") {
        config.log.level = v;
    }
    if let Some(v) = var("LOG_FORMAT") {
        config.log.format = match v.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "text" => LogFormat::Text,
            _ => return Err(ConfigError::Invalid(format!("LOG_FORMAT must be text or json, got '{}'", v))),
        };
    }
    Ok(config)
}

pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    if config.store.uri.trim().is_empty() {
        return Err(ConfigError::Invalid("store.uri is required".into()));
    }
    if config.search.max_limit == 0 {
        return Err(ConfigError::Invalid("search.max_limit must be greater than 0".into()));
    }
    if config.server.max_body_bytes == 0 {
        return Err(ConfigError::Invalid("server.max_body_bytes must be greater than 0".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn yaml_sections_fill_in_defaults() {
        let config = parse(
            r#"
server:
  port: 9000
store:
  uri: memory://
middleware:
  masks:
    - field: email
      keep_prefix: 2
"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.store.uri, "memory://");
        assert_eq!(config.middleware.skips, vec!["/health".to_string()]);
        assert_eq!(config.middleware.masks[0].mask_char, '*');
        assert_eq!(config.response.id_header, "X-Request-Id");
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = [
            ("SERVER_PORT", "7070"),
            ("DATABASE_URL", "postgres://db/app"),
            ("LOG_FORMAT", "JSON"),
        ]
        .into_iter()
        .collect();
        let config = with_env_overrides(AppConfig::default(), |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.server.port, 7070);
        assert_eq!(config.store.uri, "postgres://db/app");
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = with_env_overrides(AppConfig::default(), |k| (k == "SERVER_PORT").then(|| "http".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = load_file(Path::new("does/not/exist.yaml")).unwrap();
        assert_eq!(config.server.port, 8080);
    }
}
