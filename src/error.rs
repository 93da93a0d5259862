use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("No header row found within the first {searched} rows of the grid")]
    HeaderNotFound { searched: usize },

    #[error("Header row found at index {header_row}, but no account code column could be identified")]
    AccountCodeColumnMissing { header_row: usize },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AuditError>;
