//! Error types for vaultpub-sync.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use vaultpub_core::error::{ConfigError, RegistryError};

/// Which of the five Git Data API calls failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCall {
    GetRef,
    GetCommit,
    GetTree,
    CreateTree,
    CreateCommit,
    UpdateRef,
}

impl fmt::Display for RemoteCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RemoteCall::GetRef => "get-ref",
            RemoteCall::GetCommit => "get-commit",
            RemoteCall::GetTree => "get-tree",
            RemoteCall::CreateTree => "create-tree",
            RemoteCall::CreateCommit => "create-commit",
            RemoteCall::UpdateRef => "update-ref",
        };
        f.write_str(name)
    }
}

/// All errors that can arise from planning or publishing.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration rejected before any network call.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An error from the target registry.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A selected local path could not be read — the whole publish aborts
    /// rather than silently mirroring a partial selection.
    #[error("cannot read local file {path}: {source}")]
    LocalRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A remote API call failed (auth, not-found, rate limit, transport).
    #[error("{call} failed{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Remote {
        call: RemoteCall,
        status: Option<u16>,
        message: String,
    },

    /// The non-force ref update was rejected: the branch moved concurrently.
    #[error("branch '{branch}' moved during publish; ref update rejected")]
    RefConflict { branch: String },

    /// Another publish for the same target is already in flight.
    #[error("publish already in progress for target '{target}'")]
    InFlight { target: String },

    /// The recursive tree listing was truncated by the remote; diffing a
    /// partial listing would turn unseen entries into spurious deletes.
    #[error("remote tree listing truncated; refusing to plan deletions against a partial tree")]
    TreeTruncated,

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (state store, wire bodies).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`SyncError::Remote`].
pub(crate) fn remote_err(
    call: RemoteCall,
    status: Option<u16>,
    message: impl Into<String>,
) -> SyncError {
    SyncError::Remote {
        call,
        status,
        message: message.into(),
    }
}
