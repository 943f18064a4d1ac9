//! Publisher — sequence the remote calls that turn a plan into one commit.
//!
//! ## `publish` — call sequence
//!
//! 1. Acquire the per-target in-flight guard.
//! 2. Validate configuration (branch, selection) — before any network call.
//! 3. Resolve the local selection into entries.
//! 4. read-ref → read-commit → read-tree(recursive) → scope → plan.
//! 5. Empty plan: record success, zero write calls (idempotent no-op).
//! 6. Otherwise create-tree → create-commit → update-ref (non-force).
//! 7. Record success only after the ref update.
//!
//! Any failure aborts the whole publish with no retries; the next publish
//! recomputes the diff from the then-current ref, so a failure between
//! create-commit and update-ref only leaves unreferenced remote objects.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use chrono::Utc;

use vaultpub_core::error::ConfigError;
use vaultpub_core::types::Target;

use crate::error::SyncError;
use crate::github::GitRemote;
use crate::reconcile::{plan, remote_scope, TreeMutation};
use crate::state::{self, PublishState};
use crate::vault::{resolve_selection, Vault};

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The remote mirror already matched the local selection; no write calls
    /// were made. The success timestamp still advances.
    Unchanged,
    /// A commit was created and the branch moved to it.
    Published {
        commit: String,
        upserts: usize,
        deletes: usize,
    },
}

// ---------------------------------------------------------------------------
// In-flight guard
// ---------------------------------------------------------------------------

fn in_flight() -> &'static Mutex<BTreeSet<String>> {
    static IN_FLIGHT: OnceLock<Mutex<BTreeSet<String>>> = OnceLock::new();
    IN_FLIGHT.get_or_init(|| Mutex::new(BTreeSet::new()))
}

/// Process-wide exclusion: at most one publish per target at a time, so a
/// timer tick and a manual trigger can never race two ref updates.
struct FlightGuard {
    target: String,
}

impl FlightGuard {
    fn acquire(target: &str) -> Result<Self, SyncError> {
        let mut set = in_flight().lock().expect("in-flight lock poisoned");
        if !set.insert(target.to_owned()) {
            return Err(SyncError::InFlight {
                target: target.to_owned(),
            });
        }
        Ok(Self {
            target: target.to_owned(),
        })
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if let Ok(mut set) = in_flight().lock() {
            set.remove(&self.target);
        }
    }
}

// ---------------------------------------------------------------------------
// Planning
// ---------------------------------------------------------------------------

struct RemoteBase {
    head: String,
    root_tree: String,
}

fn validate(target: &Target) -> Result<(), SyncError> {
    if target.branch.trim().is_empty() {
        return Err(ConfigError::MissingBranch {
            target: target.name.0.clone(),
        }
        .into());
    }
    if target.selection.is_empty() {
        return Err(ConfigError::EmptySelection {
            target: target.name.0.clone(),
        }
        .into());
    }
    Ok(())
}

fn read_plan(
    target: &Target,
    vault: &impl Vault,
    remote: &impl GitRemote,
) -> Result<(RemoteBase, Vec<TreeMutation>), SyncError> {
    validate(target)?;
    let local = resolve_selection(vault, &target.selection, &target.folder)?;

    let head = remote.branch_head(&target.branch)?;
    let root_tree = remote.commit_root_tree(&head)?;
    let listing = remote.tree_entries(&root_tree)?;
    let scope = remote_scope(&listing, &target.folder);

    let mutations = plan(&local, &scope);
    Ok((RemoteBase { head, root_tree }, mutations))
}

/// Compute the mutations a publish would apply, using only the read calls.
/// Nothing is written remotely or locally.
pub fn plan_publish(
    target: &Target,
    vault: &impl Vault,
    remote: &impl GitRemote,
) -> Result<Vec<TreeMutation>, SyncError> {
    let _guard = FlightGuard::acquire(&target.name.0)?;
    let (_base, mutations) = read_plan(target, vault, remote)?;
    Ok(mutations)
}

// ---------------------------------------------------------------------------
// Publish
// ---------------------------------------------------------------------------

/// Mirror `target`'s local selection into its remote branch folder.
///
/// Idempotent: publishing twice without local changes makes zero write
/// calls the second time and still advances the recorded success timestamp.
pub fn publish(
    home: &Path,
    target: &Target,
    vault: &impl Vault,
    remote: &impl GitRemote,
) -> Result<PublishOutcome, SyncError> {
    let _guard = FlightGuard::acquire(&target.name.0)?;
    let (base, mutations) = read_plan(target, vault, remote)?;

    if mutations.is_empty() {
        // Keep the last real commit sha across no-op publishes.
        let prior_commit = state::load_at(home, &target.name.0)?.and_then(|s| s.commit);
        state::save_at(
            home,
            &target.name.0,
            &PublishState {
                published_at: Utc::now(),
                commit: prior_commit,
            },
        )?;
        tracing::debug!("'{}': mirror already current", target.name);
        return Ok(PublishOutcome::Unchanged);
    }

    let upserts = mutations
        .iter()
        .filter(|m| matches!(m, TreeMutation::Upsert { .. }))
        .count();
    let deletes = mutations.len() - upserts;

    let message = commit_message(target, upserts, deletes);
    let tree = remote.create_tree(&base.root_tree, &mutations)?;
    let commit = remote.create_commit(&tree, &base.head, &message, &target.identity)?;
    remote.update_ref(&target.branch, &commit)?;

    state::save_at(
        home,
        &target.name.0,
        &PublishState {
            published_at: Utc::now(),
            commit: Some(commit.clone()),
        },
    )?;
    tracing::info!(
        "'{}': published {} ({upserts} upserted, {deletes} deleted)",
        target.name,
        &commit[..commit.len().min(12)]
    );

    Ok(PublishOutcome::Published {
        commit,
        upserts,
        deletes,
    })
}

fn commit_message(target: &Target, upserts: usize, deletes: usize) -> String {
    match &target.commit_message {
        Some(message) => message.clone(),
        None => format!("vaultpub: {upserts} upserted, {deletes} deleted"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::Utc;
    use vaultpub_core::types::{Identity, TargetName};

    use super::*;

    fn target(name: &str) -> Target {
        Target {
            name: TargetName::from(name),
            repo: "alice/notes".parse().unwrap(),
            branch: "main".to_owned(),
            folder: "docs".to_owned(),
            vault: PathBuf::from("/v"),
            selection: vec![PathBuf::from("a.md")],
            token: None,
            commit_message: None,
            identity: Identity::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn flight_guard_excludes_same_target_only() {
        let first = FlightGuard::acquire("guard-target").unwrap();
        let second = FlightGuard::acquire("guard-target");
        assert!(matches!(second, Err(SyncError::InFlight { target }) if target == "guard-target"));

        // A different target is unaffected.
        let other = FlightGuard::acquire("guard-other").unwrap();
        drop(other);

        drop(first);
        FlightGuard::acquire("guard-target").expect("released on drop");
    }

    #[test]
    fn validation_rejects_empty_branch_and_selection() {
        let mut t = target("validate");
        t.branch = "  ".to_owned();
        assert!(matches!(
            validate(&t),
            Err(SyncError::Config(ConfigError::MissingBranch { .. }))
        ));

        let mut t = target("validate");
        t.selection.clear();
        assert!(matches!(
            validate(&t),
            Err(SyncError::Config(ConfigError::EmptySelection { .. }))
        ));
    }

    #[test]
    fn default_commit_message_summarizes_the_plan() {
        let t = target("msg");
        assert_eq!(commit_message(&t, 2, 1), "vaultpub: 2 upserted, 1 deleted");

        let mut t = target("msg");
        t.commit_message = Some("publish notes".to_owned());
        assert_eq!(commit_message(&t, 2, 1), "publish notes");
    }
}
