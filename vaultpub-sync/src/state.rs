//! Publish state — last-success bookkeeping per target.
//!
//! Persists a `PublishState` JSON document at
//! `<home>/.vaultpub/state/<target_name>.json`.
//! Writes use the same atomic `.tmp` + rename pattern as the registry.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{io_err, SyncError};

/// On-disk publish state payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishState {
    /// When the last successful publish finished (including no-op publishes).
    pub published_at: DateTime<Utc>,
    /// Commit created by the last publish that actually wrote; `None` while
    /// every publish so far has been a no-op.
    pub commit: Option<String>,
}

/// Path to the state JSON for a given target, rooted at `home`.
///
/// `~/.vaultpub/state/<target_name>.json`
pub fn state_path_at(home: &Path, target_name: &str) -> PathBuf {
    home.join(".vaultpub")
        .join("state")
        .join(format!("{target_name}.json"))
}

/// Load the publish state for `target_name`.
///
/// Returns `None` if the target has never published successfully.
pub fn load_at(home: &Path, target_name: &str) -> Result<Option<PublishState>, SyncError> {
    let path = state_path_at(home, target_name);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    Ok(Some(serde_json::from_str(&contents)?))
}

/// Save the publish state for `target_name` atomically.
///
/// Writes to `<path>.tmp` then renames to `<path>`.
pub fn save_at(home: &Path, target_name: &str, state: &PublishState) -> Result<(), SyncError> {
    let path = state_path_at(home, target_name);
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid state path")));
    };

    // Ensure the state directory exists.
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_state_loads_as_none() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(load_at(tmp.path(), "nonexistent").unwrap(), None);
    }

    #[test]
    fn roundtrip_save_load() {
        let tmp = TempDir::new().unwrap();
        let state = PublishState {
            published_at: Utc::now(),
            commit: Some("a".repeat(40)),
        };

        save_at(tmp.path(), "notes", &state).unwrap();
        let loaded = load_at(tmp.path(), "notes").unwrap();
        assert_eq!(loaded, Some(state));
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let tmp = TempDir::new().unwrap();
        let state = PublishState {
            published_at: Utc::now(),
            commit: None,
        };
        save_at(tmp.path(), "clean", &state).unwrap();
        let tmp_path = state_path_at(tmp.path(), "clean").with_extension("json.tmp");
        assert!(
            !tmp_path.exists(),
            "tmp file should be removed after atomic rename"
        );
    }
}
