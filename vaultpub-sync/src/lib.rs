//! # vaultpub-sync
//!
//! Reconciliation engine and publisher.
//!
//! Call [`publish`] to mirror a target's local selection into its remote
//! branch folder as a single commit, or [`plan_publish`] to see the tree
//! mutations a publish would apply without writing anything.

pub mod blob;
pub mod error;
pub mod github;
pub mod publish;
pub mod reconcile;
pub mod state;
pub mod vault;

pub use error::{RemoteCall, SyncError};
pub use github::{GitRemote, GithubClient, TreeEntry};
pub use publish::{plan_publish, publish, PublishOutcome};
pub use reconcile::{LocalEntry, TreeMutation};
pub use vault::{FsVault, Vault};
