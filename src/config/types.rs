//! Application configuration, deserialized from YAML. Every section has defaults.

use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub log: LogConfig,
    pub response: ResponseConfig,
    pub middleware: MiddlewareConfig,
    pub search: SearchConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            name: env!("CARGO_PKG_NAME").to_string(),
            host: "0.0.0.0".into(),
            port: 8080,
            request_timeout_secs: 30,
            max_body_bytes: 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// `postgres://...` or `memory://`.
    pub uri: String,
    /// Overrides the database named in `uri`.
    pub database: Option<String>,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
    /// Overrides the resource's collection (table) name.
    pub collection: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            uri: "postgres://localhost/users".into(),
            database: None,
            max_connections: 10,
            connect_timeout_secs: 5,
            collection: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info".into(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    pub id_header: String,
    /// Added to every response unless the handler already set them.
    pub headers: BTreeMap<String, String>,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        ResponseConfig {
            id_header: "X-Request-Id".into(),
            headers: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MiddlewareConfig {
    pub log: bool,
    /// Paths that are never logged.
    pub skips: Vec<String>,
    pub request_body: bool,
    pub response_body: bool,
    pub masks: Vec<MaskRule>,
    pub max_logged_body_bytes: usize,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        MiddlewareConfig {
            log: true,
            skips: vec!["/health".into()],
            request_body: false,
            response_body: false,
            masks: Vec::new(),
            max_logged_body_bytes: 4096,
        }
    }
}

/// JSON field whose value is masked in logged bodies.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MaskRule {
    pub field: String,
    #[serde(default)]
    pub keep_prefix: usize,
    #[serde(default)]
    pub keep_suffix: usize,
    #[serde(default = "default_mask_char")]
    pub mask_char: char,
}

fn default_mask_char() -> char {
    '*'
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: u64,
    pub max_limit: u64,
    /// Unmapped or mistyped filter fields fail startup instead of being skipped.
    pub strict: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            default_limit: crate::query::DEFAULT_LIMIT,
            max_limit: crate::query::MAX_LIMIT,
            strict: true,
        }
    }
}
