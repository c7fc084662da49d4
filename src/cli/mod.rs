// passd — CLI Module
//
// Command-line interface using clap derive macros.
// Subcommands: generate-key, serve, list, get, set, create, delete, verify.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::execute;
pub use config::Paths;

/// passd — encrypted password storage and verification for front-end sites.
#[derive(Parser, Debug)]
#[command(name = "passd")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the passd SQLite database [default: ~/.passd/passd.sqlite]
    #[arg(long, env = "PASSD_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Path to the password encryption key [default: ~/.passd/passd.key]
    #[arg(long, env = "PASSD_KEY_PATH", global = true)]
    pub key_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a new password encryption key. Never overwrites an existing file.
    GenerateKey {
        /// Where to write the key [default: the configured key path]
        path: Option<PathBuf>,
    },

    /// Run the passd socket service.
    Serve {
        /// Unix socket to listen on [default: $XDG_RUNTIME_DIR/passd/passd.sock]
        #[arg(long, env = "PASSD_SOCKET_PATH")]
        socket: Option<PathBuf>,

        /// Only serve password verification; hide the admin methods.
        #[arg(long, env = "PASSD_VERIFY_ONLY")]
        verify_only: bool,
    },

    /// List all stored identifiers.
    List,

    /// Print the stored password for an identifier.
    Get {
        /// The identifier to look up.
        id: String,
    },

    /// Store a password, replacing any existing one.
    Set {
        /// The identifier to store under.
        id: String,

        /// The password to store.
        /// For production use, prefer the socket API to avoid shell history exposure.
        #[arg(long)]
        password: String,
    },

    /// Store a password only if the identifier is new.
    Create {
        /// The identifier to store under.
        id: String,

        /// The password to store.
        #[arg(long)]
        password: String,
    },

    /// Delete the password for an identifier.
    Delete {
        /// The identifier to delete.
        id: String,
    },

    /// Check a candidate password against the stored one.
    Verify {
        /// The identifier to check.
        id: String,

        /// The candidate password.
        #[arg(long)]
        password: String,
    },
}
