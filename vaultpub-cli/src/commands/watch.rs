//! `vaultpub watch` — interval scheduler around `publish`.
//!
//! The single-owner timer for a target: each tick reloads the target config
//! (so edits take effect without a restart), publishes, reports, sleeps.
//! A failed tick is reported and retried on the next tick; there are no
//! mid-tick retries.

use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use vaultpub_core::{registry, types::TargetName};
use vaultpub_sync::{publish, FsVault, GithubClient, PublishOutcome};

/// Arguments for `vaultpub watch`.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Name of the target to keep published.
    pub target: String,

    /// Seconds between publish attempts.
    #[arg(long, default_value_t = 300)]
    pub interval: u64,
}

impl WatchArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
        let name = TargetName::from(self.target.as_str());
        let interval = Duration::from_secs(self.interval.max(1));

        println!(
            "watching '{}' — publishing every {}s (Ctrl-C to stop)",
            self.target, self.interval
        );

        loop {
            match tick(&home, &name) {
                Ok(PublishOutcome::Unchanged) => {
                    println!("· '{}' unchanged", self.target);
                }
                Ok(PublishOutcome::Published {
                    commit,
                    upserts,
                    deletes,
                }) => {
                    println!(
                        "✓ '{}' published {} ({upserts} upserted, {deletes} deleted)",
                        self.target,
                        &commit[..commit.len().min(12)]
                    );
                }
                Err(err) => {
                    eprintln!("✗ '{}' publish failed: {err:#}", self.target);
                }
            }
            sleep(interval);
        }
    }
}

fn tick(home: &Path, name: &TargetName) -> Result<PublishOutcome> {
    let target =
        registry::load_target(name).with_context(|| format!("no target named '{name}'"))?;
    let vault = FsVault::new(&target.vault);
    let token = target.resolve_token()?;
    let remote = GithubClient::new(&target.repo, token);
    Ok(publish(home, &target, &vault, &remote)?)
}
