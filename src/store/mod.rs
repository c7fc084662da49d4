// passd — Store Module
//
// Durable identifier -> encrypted password mapping in SQLite. Passwords are
// sealed with the process key before they reach the database and are only
// opened again inside `get` and `verify`.

mod db;
mod error;
mod repository;

pub use db::Database;
pub use error::StoreError;
pub use repository::{CredentialStore, SqliteCredentialStore};
