//! Configuration: YAML file plus environment overrides, loaded once at startup.

mod loader;
mod types;

pub use loader::{load, load_file, parse, validate, with_env_overrides, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
pub use types::{
    AppConfig, LogConfig, LogFormat, MaskRule, MiddlewareConfig, ResponseConfig, SearchConfig, ServerConfig,
    StoreConfig,
};
