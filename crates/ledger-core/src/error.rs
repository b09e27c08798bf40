use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// A field handed to the hasher could not be normalised to JSON.
    #[error("failed to serialize hash input: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("block does not extend the current tip (expected last hash {expected}, found {found})")]
    StaleBlock { expected: String, found: String },

    #[error("invalid block: {0}")]
    InvalidBlock(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
