// passd — Key Store Module
//
// Owns the single 32-byte symmetric key used to encrypt every stored
// password. The key lives in a raw key file created once by
// `passd generate-key` and read once at process start.

mod error;
mod key;

pub use error::KeyError;
pub use key::{Key, KEY_SIZE};
