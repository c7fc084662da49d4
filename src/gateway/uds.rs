// passd — Unix Domain Socket Server
//
// Listens on a Unix domain socket for newline-delimited JSON-RPC 2.0
// requests from the front-end sites and the admin surface. Each connection
// runs in its own task; each request opens its own database handle on the
// blocking pool so no SQLite connection crosses threads.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

use crate::cipher::DecryptError;
use crate::keystore::Key;
use crate::store::{CredentialStore, Database, SqliteCredentialStore, StoreError};

use super::protocol::{
    JsonRpcRequest, JsonRpcResponse, CONFLICT, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND, NOT_FOUND,
};

/// Longest request line accepted, newline excluded.
const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Shared, read-only state handed to every connection.
struct Context {
    db_path: PathBuf,
    key: Key,
    verify_only: bool,
}

/// Unix Domain Socket server for passd.
pub struct UdsServer {
    ctx: Arc<Context>,
    socket_path: PathBuf,
}

impl UdsServer {
    /// Create a new UDS server. The key is moved in and shared read-only
    /// across all connections for the life of the server.
    ///
    /// With `verify_only` set, every admin method reports "method not found".
    pub fn new(db_path: PathBuf, key: Key, socket_path: PathBuf, verify_only: bool) -> Self {
        Self {
            ctx: Arc::new(Context {
                db_path,
                key,
                verify_only,
            }),
            socket_path,
        }
    }

    /// Default socket path: `$XDG_RUNTIME_DIR/passd/passd.sock`
    /// Falls back to `/tmp/passd/passd.sock`.
    pub fn default_socket_path() -> PathBuf {
        let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"));
        runtime_dir.join("passd").join("passd.sock")
    }

    /// Start the UDS server. Runs until Ctrl-C, then removes the socket file.
    pub async fn run(&self) -> io::Result<()> {
        if let Some(parent) = self.socket_path.parent() {
            if !parent.as_os_str().is_empty() {
                prepare_socket_dir(parent)?;
            }
        }

        // Remove stale socket file if it exists
        if self.socket_path.exists() {
            tokio::fs::remove_file(&self.socket_path).await?;
        }

        let listener = UnixListener::bind(&self.socket_path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.socket_path, perms)?;
        }

        tracing::info!(
            socket = %self.socket_path.display(),
            verify_only = self.ctx.verify_only,
            "passd listening"
        );

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, _addr) = accepted?;
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, ctx).await {
                            tracing::error!("Connection handler error: {}", e);
                        }
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown requested");
                    break;
                }
            }
        }

        if let Err(e) = tokio::fs::remove_file(&self.socket_path).await {
            tracing::warn!("Failed to remove socket file: {}", e);
        }
        Ok(())
    }
}

/// Create the socket directory owner-only and refuse one that another
/// user owns or can write to.
fn prepare_socket_dir(dir: &Path) -> io::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;

        let meta = std::fs::metadata(dir)?;
        let euid = unsafe { libc::geteuid() };
        if meta.uid() != euid {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("socket directory {} is owned by another user", dir.display()),
            ));
        }
        if meta.mode() & 0o022 != 0 {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("socket directory {} is writable by other users", dir.display()),
            ));
        }
    }
    Ok(())
}

/// Handle a single client connection.
/// Reads newline-delimited JSON-RPC requests and writes one response per line.
/// A line that is not UTF-8 gets a parse error; an oversized line gets an
/// error reply and closes the connection.
async fn handle_connection(
    stream: UnixStream,
    ctx: Arc<Context>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing::debug!("Client connected");

    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        let limit = MAX_REQUEST_BYTES as u64 + 1;
        let n = (&mut reader).take(limit).read_until(b'\n', &mut buf).await?;
        if n == 0 {
            break;
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
        } else if buf.len() > MAX_REQUEST_BYTES {
            tracing::warn!(limit = MAX_REQUEST_BYTES, "Request line too long, closing connection");
            let response =
                JsonRpcResponse::error(Value::Null, INVALID_REQUEST, "request too large");
            write_response(&mut writer, &response).await?;
            return Ok(());
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim().to_string(),
            Err(_) => {
                let response =
                    JsonRpcResponse::parse_error("Parse error: request is not valid UTF-8");
                write_response(&mut writer, &response).await?;
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        let ctx = Arc::clone(&ctx);
        let response = tokio::task::spawn_blocking(move || {
            process_request(&line, &ctx.db_path, &ctx.key, ctx.verify_only)
        })
        .await?;

        write_response(&mut writer, &response).await?;
    }

    tracing::debug!("Client disconnected");
    Ok(())
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &JsonRpcResponse,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut json = serde_json::to_string(response)?;
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Parse and dispatch a single JSON-RPC request.
fn process_request(raw: &str, db_path: &Path, key: &Key, verify_only: bool) -> JsonRpcResponse {
    let request: JsonRpcRequest = match serde_json::from_str(raw) {
        Ok(req) => req,
        Err(e) => return JsonRpcResponse::parse_error(format!("Parse error: {}", e)),
    };

    if let Err(e) = request.validate() {
        return JsonRpcResponse::error(request.id, INVALID_REQUEST, e);
    }

    if verify_only && request.method != "verify" {
        return unknown_method(request.id, &request.method);
    }

    tracing::debug!(method = %request.method, "Handling request");

    let db = match Database::open(db_path) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!(error = %e, "Failed to open database");
            return JsonRpcResponse::error(request.id, INTERNAL_ERROR, "internal error");
        }
    };
    let store = SqliteCredentialStore::new(&db, key);

    match request.method.as_str() {
        "verify" => handle_verify(&store, request.id, &request.params),
        "list" => handle_list(&store, request.id),
        "get" => handle_get(&store, request.id, &request.params),
        "upsert" => handle_write(&store, request.id, &request.params, WriteMode::Upsert),
        "create" => handle_write(&store, request.id, &request.params, WriteMode::Create),
        "delete" => handle_delete(&store, request.id, &request.params),
        _ => unknown_method(request.id, &request.method),
    }
}

// ─── Method Handlers ─────────────────────────────────────────────────────────

fn handle_verify(store: &SqliteCredentialStore<'_>, id: Value, params: &Value) -> JsonRpcResponse {
    let (cred_id, password) = match (extract_str(params, "id"), extract_str(params, "password")) {
        (Ok(i), Ok(p)) => (i, p),
        (Err(resp), _) | (_, Err(resp)) => return resp.with_id(id),
    };

    match store.verify(cred_id, password) {
        Ok(matched) => JsonRpcResponse::success(id, serde_json::json!({ "result": matched })),
        Err(e) => store_error_response(id, "verify", e),
    }
}

fn handle_list(store: &SqliteCredentialStore<'_>, id: Value) -> JsonRpcResponse {
    match store.list_ids() {
        Ok(ids) => {
            let entries: Vec<Value> = ids
                .into_iter()
                .map(|cred_id| serde_json::json!({ "id": cred_id }))
                .collect();
            JsonRpcResponse::success(id, Value::Array(entries))
        }
        Err(e) => store_error_response(id, "list", e),
    }
}

fn handle_get(store: &SqliteCredentialStore<'_>, id: Value, params: &Value) -> JsonRpcResponse {
    let cred_id = match extract_str(params, "id") {
        Ok(i) => i,
        Err(resp) => return resp.with_id(id),
    };

    match store.get(cred_id) {
        Ok(Some(password)) => JsonRpcResponse::success(
            id,
            serde_json::json!({ "id": cred_id, "password": password.as_str() }),
        ),
        Ok(None) => JsonRpcResponse::error(id, NOT_FOUND, "no such credential"),
        Err(e) => store_error_response(id, "get", e),
    }
}

enum WriteMode {
    Upsert,
    Create,
}

fn handle_write(
    store: &SqliteCredentialStore<'_>,
    id: Value,
    params: &Value,
    mode: WriteMode,
) -> JsonRpcResponse {
    let (cred_id, password) = match (extract_str(params, "id"), extract_str(params, "password")) {
        (Ok(i), Ok(p)) => (i, p),
        (Err(resp), _) | (_, Err(resp)) => return resp.with_id(id),
    };
    if password.is_empty() {
        return JsonRpcResponse::error(id, INVALID_PARAMS, "'password' must not be empty");
    }

    let (method, result) = match mode {
        WriteMode::Upsert => ("upsert", store.upsert(cred_id, password)),
        WriteMode::Create => ("create", store.create(cred_id, password)),
    };

    match result {
        Ok(()) => {
            tracing::info!(id = %cred_id, method, "Password stored");
            JsonRpcResponse::success(id, serde_json::json!({ "id": cred_id }))
        }
        Err(e) => store_error_response(id, method, e),
    }
}

fn handle_delete(store: &SqliteCredentialStore<'_>, id: Value, params: &Value) -> JsonRpcResponse {
    let cred_id = match extract_str(params, "id") {
        Ok(i) => i,
        Err(resp) => return resp.with_id(id),
    };

    match store.delete(cred_id) {
        Ok(deleted) => {
            if deleted {
                tracing::info!(id = %cred_id, "Password deleted");
            }
            JsonRpcResponse::success(id, serde_json::json!({ "deleted": deleted }))
        }
        Err(e) => store_error_response(id, "delete", e),
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn unknown_method(id: Value, method: &str) -> JsonRpcResponse {
    JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Unknown method: {}", method))
}

fn extract_str<'p>(params: &'p Value, field: &str) -> Result<&'p str, JsonRpcResponse> {
    params.get(field).and_then(|v| v.as_str()).ok_or_else(|| {
        JsonRpcResponse::error(
            Value::Null,
            INVALID_PARAMS,
            format!("Missing '{}' parameter", field),
        )
    })
}

/// Map a store failure to a response. Internal details go to the log only.
fn store_error_response(id: Value, method: &str, err: StoreError) -> JsonRpcResponse {
    match err {
        StoreError::NotFound(_) => JsonRpcResponse::error(id, NOT_FOUND, "no such credential"),
        StoreError::Conflict(_) => {
            JsonRpcResponse::error(id, CONFLICT, "credential already exists")
        }
        StoreError::EmptyIdentifier => {
            JsonRpcResponse::error(id, INVALID_PARAMS, "'id' must not be empty")
        }
        StoreError::Decrypt(DecryptError::Malformed { len, min }) => {
            tracing::error!(method, len, min, "Stored envelope is malformed");
            JsonRpcResponse::error(id, INTERNAL_ERROR, "internal error")
        }
        StoreError::Decrypt(DecryptError::AuthenticationFailed) => {
            tracing::error!(method, "Stored envelope failed authentication");
            JsonRpcResponse::error(id, INTERNAL_ERROR, "internal error")
        }
        other => {
            tracing::error!(method, error = %other, "Store operation failed");
            JsonRpcResponse::error(id, INTERNAL_ERROR, "internal error")
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
