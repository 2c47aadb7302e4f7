use juniper_connections::{BatchConfig, PaginationConfig};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: `{value}`")]
    InvalidValue { name: &'static str, value: String },
}

/// Settings for the example server, read from the environment.
///
/// | Variable                | Default          |
/// |-------------------------|------------------|
/// | `APP_BIND`              | `127.0.0.1:3000` |
/// | `APP_DEFAULT_PAGE_SIZE` | `20`             |
/// | `APP_MAX_BATCH_SIZE`    | unlimited        |
/// | `APP_BATCH_DELAY_MS`    | `1`              |
#[derive(Debug, Clone, Copy)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub pagination: PaginationConfig,
    pub batch: BatchConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            pagination: PaginationConfig::default(),
            batch: BatchConfig {
                max_batch_size: None,
                dispatch_delay_ms: Some(1),
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();
        Ok(AppConfig {
            bind: read("APP_BIND")?.unwrap_or(defaults.bind),
            pagination: PaginationConfig {
                default_page_size: read("APP_DEFAULT_PAGE_SIZE")?
                    .unwrap_or(defaults.pagination.default_page_size),
            },
            batch: BatchConfig {
                max_batch_size: read("APP_MAX_BATCH_SIZE")?.or(defaults.batch.max_batch_size),
                dispatch_delay_ms: read("APP_BATCH_DELAY_MS")?
                    .or(defaults.batch.dispatch_delay_ms),
            },
        })
    }
}

fn read<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        Err(_) => Ok(None),
    }
}
