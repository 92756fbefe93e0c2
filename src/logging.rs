//! Tracing subscriber setup: `RUST_LOG` wins over the configured level.

use crate::config::{LogConfig, LogFormat};
use crate::error::ConfigError;
use tracing_subscriber::EnvFilter;

pub fn init(config: &LogConfig) -> Result<(), ConfigError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    result.map_err(|e| ConfigError::Invalid(format!("logging: {}", e)))
}
