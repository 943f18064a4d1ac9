//! `vaultpub plan` — show the mutations a publish would apply.

use anyhow::{Context, Result};
use clap::Args;

use vaultpub_core::{registry, types::TargetName};
use vaultpub_sync::{plan_publish, FsVault, GithubClient, TreeMutation};

/// Arguments for `vaultpub plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Name of the target to plan.
    pub target: String,
}

impl PlanArgs {
    pub fn run(self) -> Result<()> {
        let name = TargetName::from(self.target.as_str());
        let target = registry::load_target(&name)
            .with_context(|| format!("no target named '{}'", self.target))?;

        let vault = FsVault::new(&target.vault);
        let token = target.resolve_token()?;
        let remote = GithubClient::new(&target.repo, token);

        let mutations = plan_publish(&target, &vault, &remote)
            .with_context(|| format!("plan failed for '{}'", self.target))?;
        print_plan(&self.target, &mutations, "");
        Ok(())
    }
}

pub(crate) fn print_plan(target_name: &str, mutations: &[TreeMutation], prefix: &str) {
    if mutations.is_empty() {
        println!("{prefix}✓ '{target_name}' — nothing to do");
        return;
    }

    let upserts = mutations
        .iter()
        .filter(|m| matches!(m, TreeMutation::Upsert { .. }))
        .count();
    println!(
        "{prefix}'{target_name}' — {} mutation(s) ({upserts} upsert, {} delete)",
        mutations.len(),
        mutations.len() - upserts
    );
    for mutation in mutations {
        match mutation {
            TreeMutation::Upsert { path, .. } => println!("  ✎  {path}"),
            TreeMutation::Delete { path } => println!("  ✗  {path}"),
        }
    }
}
