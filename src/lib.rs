// passd — Library root
//
// Re-exports the key store, cipher, store, gateway, and CLI modules.

pub mod cipher;
pub mod cli;
pub mod error;
pub mod gateway;
pub mod keystore;
pub mod store;

pub use error::{PassdError, Result};
