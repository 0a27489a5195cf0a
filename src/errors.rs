use thiserror::Error;
use crate::manager_meteo::MeteoError;

/// A city name outside the supported set was passed in. This is a caller
/// bug and fails the call it was made on, nothing else.
#[derive(Error, Debug)]
#[error("unsupported city: {0}")]
pub struct UnsupportedCity(pub String);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<&str> for ConfigError {
    fn from(e: &str) -> Self {
        ConfigError::Invalid(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv document error: {0}")]
    Csv(#[from] csv::Error),
    #[error("glob pattern error: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("malformed snapshot identifier: {0}")]
    MalformedIdentifier(String),
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Meteo(#[from] MeteoError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
