//! `vaultpub publish` — reconcile and commit a target's mirror.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use vaultpub_core::{registry, types::TargetName};
use vaultpub_sync::{plan_publish, publish, FsVault, GithubClient, PublishOutcome};

use super::plan::print_plan;

/// Arguments for `vaultpub publish`.
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Name of the target to publish.
    pub target: String,

    /// Show what would be committed without writing anything remotely.
    #[arg(long)]
    pub dry_run: bool,
}

impl PublishArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
        let name = TargetName::from(self.target.as_str());
        let target = registry::load_target(&name)
            .with_context(|| format!("no target named '{}'", self.target))?;

        let vault = FsVault::new(&target.vault);
        let token = target.resolve_token()?;
        let remote = GithubClient::new(&target.repo, token);

        if self.dry_run {
            let mutations = plan_publish(&target, &vault, &remote)
                .with_context(|| format!("plan failed for '{}'", self.target))?;
            print_plan(&self.target, &mutations, "[dry-run] ");
            return Ok(());
        }

        let outcome = publish(&home, &target, &vault, &remote)
            .with_context(|| format!("publish failed for '{}'", self.target))?;
        match outcome {
            PublishOutcome::Unchanged => {
                println!("✓ '{}' — remote already mirrors the selection", self.target);
            }
            PublishOutcome::Published {
                commit,
                upserts,
                deletes,
            } => {
                println!(
                    "✓ '{}' published {} ({upserts} upserted, {deletes} deleted)",
                    self.target,
                    &commit[..commit.len().min(12)]
                );
            }
        }
        Ok(())
    }
}
