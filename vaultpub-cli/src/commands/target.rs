//! `vaultpub target add|list|remove` — manage configured mirror targets.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Subcommand};

use vaultpub_core::{
    error::RegistryError,
    registry,
    types::{Identity, RepoUrl, Target, TargetName},
};

/// Manage configured mirror targets.
#[derive(Subcommand, Debug)]
pub enum TargetCommand {
    /// Configure a new mirror target.
    Add(AddArgs),

    /// List all configured targets.
    List,

    /// Delete a target's configuration (remote content is left alone).
    Remove(RemoveArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Target name (e.g. "notes").
    pub name: String,

    /// Repository: https://host/owner/repo[.git], host/owner/repo, or owner/repo.
    #[arg(long)]
    pub repo: String,

    /// Branch to publish to.
    #[arg(long, default_value = "main")]
    pub branch: String,

    /// Remote folder the mirror lives under. Empty mirrors the branch root,
    /// which makes every remote file outside the selection a deletion
    /// candidate — deliberate, but worth knowing.
    #[arg(long, default_value = "")]
    pub folder: String,

    /// Absolute path of the local vault root.
    #[arg(long)]
    pub vault: PathBuf,

    /// Vault-relative file or folder to mirror; repeatable.
    #[arg(long = "select", value_name = "PATH", required = true)]
    pub selection: Vec<PathBuf>,

    /// Access token to store (VAULTPUB_TOKEN overrides it at publish time).
    #[arg(long)]
    pub token: Option<String>,

    /// Fixed commit message; a per-publish summary is generated when omitted.
    #[arg(long)]
    pub message: Option<String>,
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Target name to remove.
    pub name: String,
}

pub fn run(cmd: TargetCommand) -> Result<()> {
    match cmd {
        TargetCommand::Add(args) => add(args),
        TargetCommand::List => list(),
        TargetCommand::Remove(args) => remove(args),
    }
}

fn add(args: AddArgs) -> Result<()> {
    // URL shape is validated here, long before any network call.
    let repo: RepoUrl = args
        .repo
        .parse()
        .with_context(|| format!("invalid --repo '{}'", args.repo))?;

    let name = TargetName::from(args.name.as_str());
    match registry::load_target(&name) {
        Ok(existing) => bail!(
            "target '{}' already exists (→ {}); remove it first",
            name,
            existing.repo
        ),
        Err(RegistryError::TargetNotFound { .. }) => {}
        Err(other) => {
            return Err(other).with_context(|| format!("failed to check for '{name}'"))
        }
    }

    let now = Utc::now();
    let target = Target {
        name,
        repo,
        branch: args.branch,
        folder: args.folder,
        vault: args.vault,
        selection: args.selection,
        token: args.token,
        commit_message: args.message,
        identity: Identity::default(),
        created_at: now,
        updated_at: now,
    };

    registry::save_target(&target).context("failed to save target")?;
    println!(
        "✓ target '{}' → {} (branch {}, folder '{}')",
        target.name, target.repo, target.branch, target.folder
    );
    Ok(())
}

fn list() -> Result<()> {
    let targets = registry::list_targets().context("failed to load targets")?;

    if targets.is_empty() {
        println!("No targets configured.");
        println!("Run: vaultpub target add <name> --repo <url> --vault <dir> --select <path>");
        return Ok(());
    }

    for target in &targets {
        println!(
            "{} → {} [{}] folder '{}'",
            target.name, target.repo, target.branch, target.folder
        );
        for path in &target.selection {
            println!("  - {}", path.display());
        }
    }
    Ok(())
}

fn remove(args: RemoveArgs) -> Result<()> {
    let name = TargetName::from(args.name.as_str());
    registry::remove_target(&name).with_context(|| format!("failed to remove '{}'", args.name))?;
    println!("✓ removed target '{}'", args.name);
    Ok(())
}
