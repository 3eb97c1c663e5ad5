//! Error types for the field catalog and schema session

use std::path::PathBuf;
use thiserror::Error;

/// Result type for field operations
pub type Result<T> = std::result::Result<T, FieldsError>;

/// Errors that can occur outside the total resolver paths: loading
/// configuration, (de)serialising catalogs and rejected session transitions.
#[derive(Debug, Error)]
pub enum FieldsError {
    /// A required field cannot leave the mapped rows
    #[error("field '{key}' is required and cannot be unmapped")]
    RequiredField { key: String },

    /// Catalog is structurally unusable
    #[error("invalid catalog: {message}")]
    InvalidCatalog { message: String },

    /// Configuration file does not exist
    #[error("configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration file has an extension we cannot parse
    #[error("unsupported configuration file format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// Configuration layering or extraction failed
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for FieldsError {
    fn from(error: figment::Error) -> Self {
        FieldsError::Config(Box::new(error))
    }
}
