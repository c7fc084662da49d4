// passd — Symmetric Key
//
// A `Key` is exactly `KEY_SIZE` raw bytes. It is generated from the OS
// random source, persisted as a headerless key file with owner-only
// permissions, and loaded back at startup. The bytes are zeroized on drop
// and never shown in Debug output.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

use rand::rngs::OsRng;
use rand::TryRngCore;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::KeyError;

/// Length of the key in bytes (AES-256).
pub const KEY_SIZE: usize = 32;

/// The process-wide encryption key.
///
/// Constructed once at startup and passed explicitly to everything that
/// encrypts or decrypts; never mutated or copied after construction.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Key([u8; KEY_SIZE]);

impl Key {
    /// Generate a fresh key from the operating system's CSPRNG.
    pub fn generate() -> Result<Self, KeyError> {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| KeyError::Entropy(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Build a key from raw bytes. Any input that is not exactly
    /// `KEY_SIZE` bytes long is rejected; no padding or truncation.
    pub fn load(bytes: &[u8]) -> Result<Self, KeyError> {
        let array: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| KeyError::InvalidLength {
            expected: KEY_SIZE,
            actual: bytes.len(),
        })?;
        Ok(Self(array))
    }

    /// Read every byte from `source` and hand it to [`Key::load`].
    pub fn read(mut source: impl Read) -> Result<Self, KeyError> {
        let mut buf = Zeroizing::new(Vec::with_capacity(KEY_SIZE));
        source.read_to_end(&mut buf)?;
        Self::load(&buf)
    }

    /// Open and read the key file at `path`.
    pub fn read_file(path: &Path) -> Result<Self, KeyError> {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(KeyError::Missing(path.to_path_buf()))
            }
            Err(e) => return Err(KeyError::Io(e)),
        };
        Self::read(file)
    }

    /// Write the raw key bytes to a new file at `path` with mode 0600.
    ///
    /// Fails if `path` already exists or if its parent is not an existing
    /// directory. If the write itself fails the partial file is removed.
    pub fn save(&self, path: &Path) -> Result<(), KeyError> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        match fs::metadata(parent) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(KeyError::NotADirectory(parent.to_path_buf())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(KeyError::NotADirectory(parent.to_path_buf()))
            }
            Err(e) => return Err(KeyError::Io(e)),
        }

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = match options.open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(KeyError::AlreadyExists(path.to_path_buf()))
            }
            Err(e) => return Err(KeyError::Io(e)),
        };

        self.write_or_remove(path, move |bytes| {
            file.write_all(bytes)?;
            file.sync_all()
        })
    }

    /// Run `write` over the key bytes; on failure delete the file at `path`
    /// so no partial key is left behind.
    fn write_or_remove(
        &self,
        path: &Path,
        write: impl FnOnce(&[u8]) -> io::Result<()>,
    ) -> Result<(), KeyError> {
        if let Err(e) = write(&self.0) {
            let _ = fs::remove_file(path);
            return Err(KeyError::Io(e));
        }
        Ok(())
    }

    /// Raw key bytes, for the cipher only.
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Key").field(&"[REDACTED]").finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
