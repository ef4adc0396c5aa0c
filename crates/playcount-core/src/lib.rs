pub mod app_config;
pub mod config;
pub mod dates;
pub mod types;

use thiserror::Error;

pub use app_config::{AppConfig, EngineKind, SheetNames};
pub use config::{load_app_config, load_app_config_from_env, parse_engine_list};
pub use dates::{iso_timestamp_utc, taipei_date};
pub use types::{
    AttemptOutcome, CellValue, TargetResult, ALL_ENGINES, ERROR_SENTINEL, URL_HEADER,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
