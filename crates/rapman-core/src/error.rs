//! Error taxonomy for rapman plan generation.

use std::path::PathBuf;

/// Configuration problems detected before any artifact is written.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("base_image is required")]
    MissingBaseImage,

    #[error("test at position {index} has an empty name")]
    EmptyTestName { index: usize },

    #[error("test name {name:?} must use only ASCII letters, digits, `.`, `_` or `-` and not be `.`, `..` or `docker-file`")]
    UnsafeTestName { name: String },

    #[error("test name {name:?} is declared more than once")]
    DuplicateTestName { name: String },

    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),
}

/// Errors produced while loading a configuration or emitting a plan.
#[derive(Debug, thiserror::Error)]
pub enum RapmanError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("failed to read configuration {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("test {test:?}: failed to write {path}: {source}")]
    Io {
        test: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<toml::de::Error> for RapmanError {
    fn from(err: toml::de::Error) -> Self {
        RapmanError::Parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for RapmanError {
    fn from(err: serde_yaml::Error) -> Self {
        RapmanError::Parse(err.to_string())
    }
}

/// Result type for rapman operations.
pub type Result<T> = std::result::Result<T, RapmanError>;
