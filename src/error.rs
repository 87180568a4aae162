use thiserror::Error;

use crate::datatype::ValueKind;

#[derive(Error, Debug)]
pub enum PagewiseError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Unknown attribute '{attribute}' for entity '{entity}'")]
    UnknownAttribute { entity: String, attribute: String },
    #[error("Attribute '{attribute}' holds {expected} values, got {found}")]
    KindMismatch { attribute: String, expected: ValueKind, found: String },
    #[error("Duplicate record {id} in entity '{entity}'")]
    DuplicateRecord { entity: String, id: String },
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),
    #[error("Schema error: {0}")]
    Schema(String),
    #[error("Source error: {0}")]
    Source(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, PagewiseError>;

impl PagewiseError {
    /// Errors caused by what the caller asked for, as opposed to failures of
    /// the data source or the host.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_)
                | Self::UnknownAttribute { .. }
                | Self::KindMismatch { .. }
                | Self::UnknownEntity(_)
        )
    }
}

// Helper conversions
impl From<rusqlite::Error> for PagewiseError {
    fn from(e: rusqlite::Error) -> Self { Self::Persistence(e.to_string()) }
}

impl From<config::ConfigError> for PagewiseError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}

impl From<serde_json::Error> for PagewiseError {
    fn from(e: serde_json::Error) -> Self { Self::Source(e.to_string()) }
}

impl<T> From<std::sync::PoisonError<T>> for PagewiseError {
    fn from(e: std::sync::PoisonError<T>) -> Self { Self::Lock(e.to_string()) }
}
