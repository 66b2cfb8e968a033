use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("Missing required columns: {}", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    #[error("Duplicate image_name values: {}", .0.join(", "))]
    DuplicateKeys(Vec<String>),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Invalid feedback: {0}")]
    InvalidFeedback(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// True for failures of the remote feedback store (network, HTTP status).
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}
