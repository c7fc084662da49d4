// passd — Path configuration
//
// Resolves the database and key locations from flags / environment, with
// defaults under `~/.passd`.

use std::io;
use std::path::{Path, PathBuf};

const DEFAULT_DIR_NAME: &str = ".passd";
const DEFAULT_DB_NAME: &str = "passd.sqlite";
const DEFAULT_KEY_NAME: &str = "passd.key";

/// Default data directory: `~/.passd`.
pub fn default_dir() -> PathBuf {
    let home = dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(DEFAULT_DIR_NAME)
}

/// Resolved file locations for one invocation.
#[derive(Debug, Clone)]
pub struct Paths {
    pub db_path: PathBuf,
    pub key_path: PathBuf,
    /// Directory created on demand when a default path is in use.
    pub default_dir: PathBuf,
}

impl Paths {
    pub fn resolve(db_path: Option<PathBuf>, key_path: Option<PathBuf>) -> Self {
        Self::resolve_in(default_dir(), db_path, key_path)
    }

    fn resolve_in(default_dir: PathBuf, db_path: Option<PathBuf>, key_path: Option<PathBuf>) -> Self {
        Self {
            db_path: db_path.unwrap_or_else(|| default_dir.join(DEFAULT_DB_NAME)),
            key_path: key_path.unwrap_or_else(|| default_dir.join(DEFAULT_KEY_NAME)),
            default_dir,
        }
    }

    /// Make sure the directory that will hold `path` exists.
    ///
    /// The default directory is created owner-only; any other parent is
    /// created with the process umask.
    pub fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => return Ok(()),
        };

        if parent == self.default_dir {
            ensure_private_dir(parent)
        } else {
            std::fs::create_dir_all(parent)
        }
    }
}

fn ensure_private_dir(dir: &Path) -> io::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
