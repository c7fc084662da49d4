// passd — CLI Command Handlers
//
// Each function handles one CLI subcommand. Every command except
// `generate-key` reads the key file first and only then opens the
// database, so a missing key aborts before any store state is created.

use crate::error::Result;
use crate::gateway::UdsServer;
use crate::keystore::Key;
use crate::store::{CredentialStore, Database, SqliteCredentialStore};

use super::config::Paths;
use super::{Cli, Commands};

/// Execute the parsed CLI command.
pub async fn execute(cli: Cli) -> Result<()> {
    let paths = Paths::resolve(cli.db_path, cli.key_path);

    match cli.command {
        Commands::GenerateKey { path } => cmd_generate_key(&paths, path),
        Commands::Serve {
            socket,
            verify_only,
        } => cmd_serve(&paths, socket, verify_only).await,
        Commands::List => cmd_list(&paths),
        Commands::Get { id } => cmd_get(&paths, &id),
        Commands::Set { id, password } => cmd_set(&paths, &id, &password),
        Commands::Create { id, password } => cmd_create(&paths, &id, &password),
        Commands::Delete { id } => cmd_delete(&paths, &id),
        Commands::Verify { id, password } => cmd_verify(&paths, &id, &password),
    }
}

// ─── Generate Key ────────────────────────────────────────────────────────────

fn cmd_generate_key(paths: &Paths, path: Option<std::path::PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(|| paths.key_path.clone());

    if path.starts_with(&paths.default_dir) {
        paths.ensure_parent(&path)?;
    }

    let key = Key::generate()?;
    key.save(&path)?;

    tracing::info!(path = %path.display(), "Generated new key");
    println!("✓ Key written to {}", path.display());
    println!("  Keep this file safe: stored passwords cannot be recovered without it.");

    Ok(())
}

// ─── Serve ───────────────────────────────────────────────────────────────────

async fn cmd_serve(
    paths: &Paths,
    socket: Option<std::path::PathBuf>,
    verify_only: bool,
) -> Result<()> {
    let (key, db) = open_store(paths)?;
    // Schema is bootstrapped; requests open their own handles.
    drop(db);

    let socket_path = socket.unwrap_or_else(UdsServer::default_socket_path);
    tracing::info!(db = %paths.db_path.display(), "Database ready");

    UdsServer::new(paths.db_path.clone(), key, socket_path, verify_only)
        .run()
        .await?;

    Ok(())
}

// ─── Admin Commands ──────────────────────────────────────────────────────────

fn cmd_list(paths: &Paths) -> Result<()> {
    let (key, db) = open_store(paths)?;
    let store = SqliteCredentialStore::new(&db, &key);

    let ids = store.list_ids()?;
    if ids.is_empty() {
        println!("No passwords stored yet.");
        println!("Add one with: passd set <id> --password <value>");
        return Ok(());
    }

    for id in ids {
        println!("{}", id);
    }
    Ok(())
}

fn cmd_get(paths: &Paths, id: &str) -> Result<()> {
    let (key, db) = open_store(paths)?;
    let store = SqliteCredentialStore::new(&db, &key);

    match store.get(id)? {
        Some(password) => println!("{}", password.as_str()),
        None => println!("No password stored for: {}", id),
    }
    Ok(())
}

fn cmd_set(paths: &Paths, id: &str, password: &str) -> Result<()> {
    let (key, db) = open_store(paths)?;
    SqliteCredentialStore::new(&db, &key).upsert(id, password)?;

    tracing::info!(%id, "Password stored");
    println!("✓ Password stored for {}", id);
    Ok(())
}

fn cmd_create(paths: &Paths, id: &str, password: &str) -> Result<()> {
    let (key, db) = open_store(paths)?;
    SqliteCredentialStore::new(&db, &key).create(id, password)?;

    tracing::info!(%id, "Password created");
    println!("✓ Password created for {}", id);
    Ok(())
}

fn cmd_delete(paths: &Paths, id: &str) -> Result<()> {
    let (key, db) = open_store(paths)?;

    if SqliteCredentialStore::new(&db, &key).delete(id)? {
        println!("✓ Password for {} deleted", id);
    } else {
        println!("No password stored for: {}", id);
    }
    Ok(())
}

fn cmd_verify(paths: &Paths, id: &str, password: &str) -> Result<()> {
    let (key, db) = open_store(paths)?;
    let matched = SqliteCredentialStore::new(&db, &key).verify(id, password)?;

    println!("{}", matched);
    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Load the key, then open (and bootstrap) the database.
fn open_store(paths: &Paths) -> Result<(Key, Database)> {
    let key = Key::read_file(&paths.key_path)?;

    paths.ensure_parent(&paths.db_path)?;
    let db = Database::open(&paths.db_path)?;

    Ok((key, db))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PassdError;
    use crate::keystore::KeyError;
    use crate::store::StoreError;

    fn temp_paths() -> (tempfile::TempDir, Paths) {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths {
            db_path: dir.path().join("data").join("passd.sqlite"),
            key_path: dir.path().join("passd.key"),
            default_dir: dir.path().join(".passd"),
        };
        (dir, paths)
    }

    #[test]
    fn test_missing_key_refuses_to_start() {
        let (_dir, paths) = temp_paths();

        let err = open_store(&paths).unwrap_err();
        assert!(matches!(err, PassdError::Key(KeyError::Missing(_))));
        assert!(!paths.db_path.exists(), "No database may be created without a key");
        assert!(!paths.db_path.parent().unwrap().exists());

        assert!(cmd_list(&paths).is_err());
        assert!(!paths.db_path.exists());
    }

    #[test]
    fn test_malformed_key_refuses_to_start() {
        let (_dir, paths) = temp_paths();
        std::fs::write(&paths.key_path, b"too short").unwrap();

        let err = open_store(&paths).unwrap_err();
        assert!(matches!(err, PassdError::Key(KeyError::InvalidLength { .. })));
        assert!(!paths.db_path.exists());
    }

    #[test]
    fn test_generate_key_then_admin_commands() {
        let (_dir, paths) = temp_paths();

        cmd_generate_key(&paths, None).unwrap();
        assert!(paths.key_path.exists());

        cmd_set(&paths, "blog", "pw1").unwrap();
        cmd_set(&paths, "blog", "pw2").unwrap();
        cmd_verify(&paths, "blog", "pw2").unwrap();
        cmd_get(&paths, "blog").unwrap();
        cmd_list(&paths).unwrap();

        let (key, db) = open_store(&paths).unwrap();
        let store = SqliteCredentialStore::new(&db, &key);
        assert_eq!(store.get("blog").unwrap().unwrap().as_str(), "pw2");

        let err = cmd_create(&paths, "blog", "other").unwrap_err();
        assert!(matches!(err, PassdError::Store(StoreError::Conflict(_))));

        cmd_delete(&paths, "blog").unwrap();
        assert!(store.get("blog").unwrap().is_none());

        let err = cmd_verify(&paths, "blog", "pw2").unwrap_err();
        assert!(matches!(err, PassdError::Store(StoreError::NotFound(_))));
    }

    #[test]
    fn test_generate_key_never_overwrites() {
        let (_dir, paths) = temp_paths();

        cmd_generate_key(&paths, None).unwrap();
        let before = std::fs::read(&paths.key_path).unwrap();

        let err = cmd_generate_key(&paths, None).unwrap_err();
        assert!(matches!(err, PassdError::Key(KeyError::AlreadyExists(_))));
        assert_eq!(std::fs::read(&paths.key_path).unwrap(), before);
    }

    #[test]
    fn test_generate_key_creates_default_dir_only() {
        let (dir, paths) = temp_paths();

        let default_key = paths.default_dir.join("passd.key");
        cmd_generate_key(&paths, Some(default_key.clone())).unwrap();
        assert!(default_key.exists());

        let elsewhere = dir.path().join("missing").join("passd.key");
        let err = cmd_generate_key(&paths, Some(elsewhere)).unwrap_err();
        assert!(matches!(err, PassdError::Key(KeyError::NotADirectory(_))));
    }
}
