// passd — Store error types

use thiserror::Error;

use crate::cipher::{DecryptError, EncryptError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Password with id already exists: {0}")]
    Conflict(String),

    #[error("No stored password for id: {0}")]
    NotFound(String),

    #[error("Identifier must not be empty")]
    EmptyIdentifier,

    #[error("Failed to encrypt password: {0}")]
    Encrypt(#[from] EncryptError),

    #[error("Failed to decrypt password: {0}")]
    Decrypt(#[from] DecryptError),

    #[error("Stored password is not valid UTF-8")]
    InvalidUtf8,
}
