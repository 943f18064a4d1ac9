//! # vaultpub-core
//!
//! Domain types and target registry for vaultpub: strongly-typed repository
//! coordinates, per-target mirror configuration, and the YAML config store
//! under `~/.vaultpub/targets/`.

pub mod error;
pub mod registry;
pub mod types;

pub use error::{ConfigError, RegistryError};
pub use types::{Identity, RepoUrl, Target, TargetName};
