// passd — Cipher Module
//
// Stateless AES-256-GCM sealing of stored passwords, plus the one-way
// digest used to compare them. Envelope layout is `nonce || ciphertext || tag`.

mod engine;
mod error;

pub use engine::{decrypt, digest, digests_match, encrypt, DIGEST_LEN, NONCE_LEN};
pub use error::{DecryptError, EncryptError};
