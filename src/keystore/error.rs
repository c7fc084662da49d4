// passd — Key store error types

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid key size (got {actual} bytes, expected {expected})")]
    InvalidLength { expected: usize, actual: usize },

    #[error("key file not found at {0}")]
    Missing(PathBuf),

    #[error("key file already exists at {0}, refusing to overwrite")]
    AlreadyExists(PathBuf),

    #[error("parent of key path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("random source failed while generating key: {0}")]
    Entropy(String),

    #[error("key file IO error: {0}")]
    Io(#[from] std::io::Error),
}
