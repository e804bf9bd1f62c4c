//! Chart error types
//!
//! Only loading and parsing can fail. Data queries never return errors; they
//! report missing data as [`chartkit_core::Value::Invalid`] or empty geometry.

use chartkit_core::ColorParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    /// Chart configuration was not valid TOML or did not match the schema
    #[error("invalid chart configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Source data was not valid JSON
    #[error("invalid source data: {0}")]
    Json(#[from] serde_json::Error),

    /// Valid JSON that cannot be turned into source values
    #[error("unsupported source data: {0}")]
    UnsupportedJson(String),

    #[error(transparent)]
    Color(#[from] ColorParseError),
}

pub type Result<T> = std::result::Result<T, ChartError>;
