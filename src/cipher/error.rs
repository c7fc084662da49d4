// passd — Cipher error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncryptError {
    #[error("random source failed while generating nonce: {0}")]
    Nonce(String),

    #[error("authenticated encryption failed")]
    Seal,
}

/// Failure to recover plaintext from an envelope.
///
/// Callers treat both variants as "cannot recover plaintext"; they are kept
/// apart so the two causes can be told apart in logs.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecryptError {
    #[error("malformed envelope ({len} bytes, need at least {min})")]
    Malformed { len: usize, min: usize },

    #[error("envelope failed authentication (wrong key or corrupted data)")]
    AuthenticationFailed,
}
