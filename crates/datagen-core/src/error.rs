use thiserror::Error;

use crate::validation::ValidationReport;

/// Core error type shared across datagen crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The column type tag is not present in the registry.
    #[error("unknown column type: {0}")]
    UnknownColumnType(String),
    /// A schema without columns can never be compiled.
    #[error("schema has no columns")]
    EmptySchema,
    /// One or more columns failed validation; every offending column is listed.
    #[error("invalid schema: {0}")]
    InvalidSchema(ValidationReport),
    /// The schema contract itself could not be built or applied.
    #[error("contract error: {0}")]
    Contract(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Structured issues carried by this error, if any.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Error::InvalidSchema(report) => Some(report),
            _ => None,
        }
    }
}

/// Convenience alias for results returned by datagen crates.
pub type Result<T> = std::result::Result<T, Error>;
