//! Tree reconciliation — diff the local file set against the remote tree.
//!
//! The remote tree is addressed by content hash, so equality is decided by
//! comparing locally computed blob hashes against the hashes the remote
//! reports; remote blob bytes are never transferred.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::blob::blob_sha;
use crate::github::TreeEntry;

/// One local file resolved for publishing. Ephemeral: rebuilt from current
/// vault state on every publish, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    pub local_path: PathBuf,
    pub remote_path: String,
    pub content: String,
}

/// One mutation to apply to the remote tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeMutation {
    /// Create or overwrite the blob at `path` with inline `content`.
    Upsert { path: String, content: String },
    /// Remove the blob at `path`.
    Delete { path: String },
}

impl TreeMutation {
    pub fn path(&self) -> &str {
        match self {
            TreeMutation::Upsert { path, .. } | TreeMutation::Delete { path } => path,
        }
    }
}

/// Filter a recursive tree listing down to the mirrored region: blob entries
/// whose path equals `folder` or falls under `folder/`. An empty folder
/// prefix scopes to every blob in the tree — the whole branch root is the
/// mirror, and unrelated remote files become deletion candidates.
pub fn remote_scope(entries: &[TreeEntry], folder: &str) -> BTreeMap<String, String> {
    entries
        .iter()
        .filter(|e| e.is_blob())
        .filter(|e| {
            folder.is_empty()
                || e.path == folder
                || e.path.starts_with(&format!("{folder}/"))
        })
        .filter_map(|e| e.sha.clone().map(|sha| (e.path.clone(), sha)))
        .collect()
}

/// Compute the minimal mutation set that makes the remote scope mirror the
/// local entries.
///
/// - local entry absent remotely, or present with a different hash → Upsert
/// - local entry whose hash matches the remote hash → nothing
/// - remote path with no local counterpart → Delete
///
/// An empty result means the mirror already matches and no write calls are
/// needed.
pub fn plan(local: &[LocalEntry], remote: &BTreeMap<String, String>) -> Vec<TreeMutation> {
    let mut mutations = Vec::new();

    for entry in local {
        let local_hash = blob_sha(&entry.content);
        match remote.get(&entry.remote_path) {
            Some(remote_hash) if *remote_hash == local_hash => {
                tracing::debug!("unchanged: {}", entry.remote_path);
            }
            _ => mutations.push(TreeMutation::Upsert {
                path: entry.remote_path.clone(),
                content: entry.content.clone(),
            }),
        }
    }

    for path in remote.keys() {
        if !local.iter().any(|e| e.remote_path == *path) {
            mutations.push(TreeMutation::Delete { path: path.clone() });
        }
    }

    mutations
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
