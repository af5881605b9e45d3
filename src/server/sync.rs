//! Companion-app sync: authenticated snapshot ingress plus a status probe.
//!
//! Ingress accepts the same player export JSON the importer reads from disk,
//! so a companion app can push a fresh snapshot without shelling into the
//! CLI. The body lands in a temp file and runs through the normal import
//! pipeline, yielding the same report and the same resolution rules.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::time::UNIX_EPOCH;

use chrono::TimeZone;
use uuid::Uuid;

use crate::data::import::{import_player_export, ImportError};
use crate::data::player::{load_player_snapshot, DEFAULT_PLAYER_SNAPSHOT_PATH};

/// Shared-secret environment variable. When set (non-blank), ingress requests
/// must carry the same value in [`SYNC_TOKEN_HEADER`].
pub const SYNC_TOKEN_ENV: &str = "CRYODEX_SYNC_TOKEN";
pub const SYNC_TOKEN_HEADER: &str = "cryodex-sync-token";

/// Snapshot writes are serialized; concurrent ingress calls would otherwise
/// interleave on the same output file.
static SNAPSHOT_WRITE_LOCK: Mutex<()> = Mutex::new(());

#[derive(Debug)]
pub enum SyncError {
    Unauthorized,
    Import(ImportError),
    Io(io::Error),
    Serialize(serde_json::Error),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Unauthorized => write!(f, "missing or invalid sync token"),
            SyncError::Import(err) => write!(f, "import failed: {err}"),
            SyncError::Io(err) => write!(f, "io error: {err}"),
            SyncError::Serialize(err) => write!(f, "serialize error: {err}"),
        }
    }
}

impl std::error::Error for SyncError {}

/// `expected` comes from the environment, `provided` from the request header.
/// A missing or blank expected token disables the check.
fn token_accepted(expected: Option<&str>, provided: Option<&str>) -> bool {
    match expected.map(str::trim).filter(|token| !token.is_empty()) {
        None => true,
        Some(expected) => provided.map(str::trim) == Some(expected),
    }
}

/// Accept a pushed player export and import it as the active snapshot.
pub fn ingress_payload(
    body: &str,
    provided_token: Option<&str>,
    output_path: &str,
) -> Result<String, SyncError> {
    let expected = std::env::var(SYNC_TOKEN_ENV).ok();
    if !token_accepted(expected.as_deref(), provided_token) {
        return Err(SyncError::Unauthorized);
    }

    let temp_path = std::env::temp_dir().join(format!("cryodex_sync_{}.json", Uuid::new_v4()));
    fs::write(&temp_path, body).map_err(SyncError::Io)?;

    let imported = {
        let _guard = SNAPSHOT_WRITE_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        import_player_export(&temp_path.to_string_lossy(), output_path)
    };
    let _ = fs::remove_file(&temp_path);
    let report = imported.map_err(SyncError::Import)?;

    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "report": report,
    }))
    .map_err(SyncError::Serialize)
}

/// Where the snapshot lives, when it last changed, and how much it holds.
/// `last_synced` is null until a snapshot exists.
pub fn sync_status_payload() -> Result<String, serde_json::Error> {
    let snapshot = load_player_snapshot(DEFAULT_PLAYER_SNAPSHOT_PATH);
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "snapshot_path": DEFAULT_PLAYER_SNAPSHOT_PATH,
        "last_synced": file_modified_rfc3339(DEFAULT_PLAYER_SNAPSHOT_PATH),
        "crew_copies": snapshot.crew.len(),
        "collection_records": snapshot.cryo_collections.len(),
    }))
}

/// Modification time of `path` as an RFC 3339 stamp; `None` when the file is
/// missing or its clock data is unusable.
pub fn file_modified_rfc3339(path: impl AsRef<Path>) -> Option<String> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    let elapsed = modified.duration_since(UNIX_EPOCH).ok()?;
    chrono::Utc
        .timestamp_opt(elapsed.as_secs() as i64, elapsed.subsec_nanos())
        .single()
        .map(|stamp| stamp.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_check_passes_when_no_token_is_configured() {
        assert!(token_accepted(None, None));
        assert!(token_accepted(None, Some("anything")));
        assert!(token_accepted(Some("  "), None));
    }

    #[test]
    fn token_check_requires_exact_match_when_configured() {
        assert!(token_accepted(Some("secret"), Some("secret")));
        assert!(token_accepted(Some(" secret "), Some("secret")));
        assert!(!token_accepted(Some("secret"), Some("wrong")));
        assert!(!token_accepted(Some("secret"), Some("")));
        assert!(!token_accepted(Some("secret"), None));
    }

    #[test]
    fn ingress_rejects_malformed_bodies() {
        let output = std::env::temp_dir().join("cryodex_sync_reject_test.json");
        let result = ingress_payload("not json", None, &output.to_string_lossy());
        assert!(matches!(result, Err(SyncError::Import(ImportError::Parse(_)))));
        assert!(!output.exists());
    }

    #[test]
    fn missing_snapshot_yields_no_timestamp() {
        assert_eq!(
            file_modified_rfc3339("data/player/no_such_snapshot.json"),
            None
        );
    }
}
