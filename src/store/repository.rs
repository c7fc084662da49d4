// passd — Credential Store Repository
//
// CRUD over the `passwords` table plus the verification primitive used by
// the public validate path. Passwords are sealed with the process key on
// write; `verify` opens the stored envelope, digests both sides and only
// ever hands back the comparison result.

use rusqlite::{params, OptionalExtension};
use zeroize::Zeroizing;

use crate::cipher;
use crate::keystore::Key;

use super::db::Database;
use super::StoreError;

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over password storage operations.
pub trait CredentialStore {
    /// Store a new password. Fails with `Conflict` if `id` already exists.
    fn create(&self, id: &str, password: &str) -> Result<(), StoreError>;

    /// Store a password, replacing any existing one for `id`.
    fn upsert(&self, id: &str, password: &str) -> Result<(), StoreError>;

    /// Decrypt and return the stored password. `None` if `id` is unknown.
    fn get(&self, id: &str) -> Result<Option<Zeroizing<String>>, StoreError>;

    /// Delete the password for `id`. Returns true if a row was removed.
    fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Every stored identifier, in no particular order.
    fn list_ids(&self) -> Result<Vec<String>, StoreError>;

    /// Check `candidate` against the stored password for `id`.
    ///
    /// An unknown `id` is `NotFound`, never a plain `false`.
    fn verify(&self, id: &str, candidate: &str) -> Result<bool, StoreError>;
}

// ─── SQLite Implementation ──────────────────────────────────────────────────

pub struct SqliteCredentialStore<'a> {
    db: &'a Database,
    key: &'a Key,
}

impl<'a> SqliteCredentialStore<'a> {
    pub fn new(db: &'a Database, key: &'a Key) -> Self {
        Self { db, key }
    }

    /// Fetch the raw envelope for `id`, if any.
    fn load_envelope(&self, id: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let envelope = self
            .db
            .conn()
            .query_row(
                "SELECT password_enc FROM passwords WHERE id = ?1",
                params![id],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(envelope)
    }

    fn seal(&self, id: &str, password: &str) -> Result<Vec<u8>, StoreError> {
        if id.is_empty() {
            return Err(StoreError::EmptyIdentifier);
        }
        Ok(cipher::encrypt(self.key, password.as_bytes())?)
    }
}

impl<'a> CredentialStore for SqliteCredentialStore<'a> {
    fn create(&self, id: &str, password: &str) -> Result<(), StoreError> {
        let envelope = self.seal(id, password)?;

        let result = self.db.conn().execute(
            "INSERT INTO passwords (id, password_enc) VALUES (?1, ?2)",
            params![id, envelope],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                Err(StoreError::Conflict(id.to_string()))
            }
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    fn upsert(&self, id: &str, password: &str) -> Result<(), StoreError> {
        let envelope = self.seal(id, password)?;

        self.db.conn().execute(
            "INSERT INTO passwords (id, password_enc) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET password_enc = excluded.password_enc",
            params![id, envelope],
        )?;

        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Zeroizing<String>>, StoreError> {
        let envelope = match self.load_envelope(id)? {
            Some(e) => e,
            None => return Ok(None),
        };

        let plaintext = cipher::decrypt(self.key, &envelope)?;
        let text = std::str::from_utf8(&plaintext).map_err(|_| StoreError::InvalidUtf8)?;

        Ok(Some(Zeroizing::new(text.to_owned())))
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let affected = self
            .db
            .conn()
            .execute("DELETE FROM passwords WHERE id = ?1", params![id])?;

        Ok(affected > 0)
    }

    fn list_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.db.conn().prepare("SELECT id FROM passwords")?;

        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }

        Ok(ids)
    }

    fn verify(&self, id: &str, candidate: &str) -> Result<bool, StoreError> {
        let envelope = self
            .load_envelope(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let stored = cipher::decrypt(self.key, &envelope)?;
        let stored_digest = cipher::digest(&stored);
        let candidate_digest = cipher::digest(candidate.as_bytes());

        Ok(cipher::digests_match(&stored_digest, &candidate_digest))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
