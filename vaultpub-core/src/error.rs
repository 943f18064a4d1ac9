//! Error types for vaultpub-core.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration problems caught before any network call is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The repository URL did not match `host/owner/repo[.git]`.
    #[error("malformed repository url '{url}'; expected host/owner/repo or owner/repo")]
    MalformedRepoUrl { url: String },

    /// No token in the target config and `VAULTPUB_TOKEN` is unset.
    #[error("no access token configured; set VAULTPUB_TOKEN or store one on the target")]
    MissingToken,

    /// The target has an empty branch name.
    #[error("target '{target}' has no branch configured")]
    MissingBranch { target: String },

    /// The target selects nothing — publishing would wipe the remote folder.
    #[error("target '{target}' has an empty selection")]
    EmptySelection { target: String },
}

/// All errors that can arise from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse target at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None` — cannot locate `~/.vaultpub/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// The target YAML file did not exist at the expected path.
    #[error("target not found at {path}")]
    TargetNotFound { path: PathBuf },
}
