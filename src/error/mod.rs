//! Error handling module for ObjChop

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for ObjChop operations
#[derive(Error, Debug)]
pub enum ChopError {
    /// Input file not found or inaccessible
    #[error("Input file not found: {path}")]
    InputFileNotFound { path: String },

    /// Invalid duration format on the command line or in the environment
    #[error("Invalid duration: {value}. Expected e.g. 20ms, 1.5s, 00:00:01.500 or nanoseconds")]
    InvalidDuration { value: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Sample stream error
    #[error("Sample stream error: {message}")]
    SampleStreamError { message: String },

    /// Domain rule violation
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML error
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
}

/// Result type alias for ObjChop operations
pub type ChopResult<T> = std::result::Result<T, ChopError>;
