use std::path::PathBuf;
use thiserror::Error;

/// Custom error type for pagediff operations
#[derive(Debug, Error)]
pub enum PageDiffError {
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse JSON from {path}: {source}")]
    JsonParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid page at {path}:{line}: {message}")]
    InvalidPage {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Invalid input {input}: {message}")]
    InvalidInput { input: String, message: String },

    #[error("File {path} is {size} bytes, exceeding the limit of {limit} bytes")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("Invalid arguments: {message}")]
    InvalidArgs { message: String },

    #[error("Failed to write output: {source}")]
    Output { source: serde_json::Error },
}

impl From<std::io::Error> for PageDiffError {
    fn from(error: std::io::Error) -> Self {
        PageDiffError::FileRead {
            path: PathBuf::new(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for PageDiffError {
    fn from(error: serde_json::Error) -> Self {
        PageDiffError::JsonParse {
            path: PathBuf::new(),
            source: error,
        }
    }
}
