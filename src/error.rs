//! Error types for synpair.

use thiserror::Error;

/// Result type for synpair operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for synpair operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid configuration value, rejected before any example is processed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Dataset loading/parsing error.
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Tokenizer loading or encoding error.
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Invalid input provided to a numeric operation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model retrieval error (downloading from HuggingFace).
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Create a dataset error.
    pub fn dataset(msg: impl Into<String>) -> Self {
        Error::Dataset(msg.into())
    }

    /// Create a tokenizer error.
    pub fn tokenizer(msg: impl Into<String>) -> Self {
        Error::Tokenizer(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a retrieval error.
    pub fn retrieval(msg: impl Into<String>) -> Self {
        Error::Retrieval(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_config("unknown pool_type 'median'");
        assert!(err.to_string().contains("pool_type"));
        let err = Error::dataset("line 7: expected 7 or 8 fields");
        assert!(err.to_string().starts_with("Dataset error"));
    }
}
