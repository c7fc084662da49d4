// passd — Top-level error types
//
// Aggregates errors from the key store, cipher and store modules into a
// single error enum for the application boundary.

use thiserror::Error;

/// Top-level error type for all passd operations.
#[derive(Debug, Error)]
pub enum PassdError {
    #[error("Key error: {0}")]
    Key(#[from] crate::keystore::KeyError),

    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PassdError>;
