//! `vaultpub status` — last-publish visibility across targets.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use vaultpub_core::registry;
use vaultpub_sync::state;

/// Arguments for `vaultpub status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
        let targets = registry::list_targets().context("failed to load targets")?;

        let mut rows = Vec::new();
        for target in &targets {
            let published = state::load_at(&home, &target.name.0)
                .with_context(|| format!("failed to read state for '{}'", target.name))?;
            rows.push(TargetStatus {
                target: target.name.0.clone(),
                repo: target.repo.to_string(),
                branch: target.branch.clone(),
                folder: target.folder.clone(),
                published_at: published.as_ref().map(|s| s.published_at),
                commit: published.and_then(|s| s.commit),
            });
        }

        if self.json {
            print_json(&rows)?;
            return Ok(());
        }
        print_table(&rows);
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct TargetStatus {
    target: String,
    repo: String,
    branch: String,
    folder: String,
    published_at: Option<DateTime<Utc>>,
    commit: Option<String>,
}

#[derive(Serialize)]
struct TargetStatusJson {
    target: String,
    repo: String,
    branch: String,
    folder: String,
    last_publish_age: Option<String>,
    last_publish_at: Option<String>,
    commit: Option<String>,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "target")]
    target: String,
    #[tabled(rename = "repository")]
    repository: String,
    #[tabled(rename = "last publish")]
    last_publish: String,
    #[tabled(rename = "commit")]
    commit: String,
}

fn print_json(rows: &[TargetStatus]) -> Result<()> {
    let out: Vec<TargetStatusJson> = rows
        .iter()
        .map(|row| TargetStatusJson {
            target: row.target.clone(),
            repo: row.repo.clone(),
            branch: row.branch.clone(),
            folder: row.folder.clone(),
            last_publish_age: row.published_at.map(format_age),
            last_publish_at: row.published_at.map(|t| t.to_rfc3339()),
            commit: row.commit.clone(),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn print_table(rows: &[TargetStatus]) {
    if rows.is_empty() {
        println!("No targets configured.");
        return;
    }

    let table_rows: Vec<StatusTableRow> = rows
        .iter()
        .map(|row| StatusTableRow {
            target: format!("{} {}", publish_indicator(row), row.target),
            repository: format!("{} [{}] '{}'", row.repo, row.branch, row.folder),
            last_publish: match row.published_at {
                Some(at) => format!("{} ago", format_age(at)),
                None => "never".to_owned(),
            },
            commit: row
                .commit
                .as_deref()
                .map(|c| c[..c.len().min(12)].to_owned())
                .unwrap_or_else(|| "-".to_owned()),
        })
        .collect();

    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn publish_indicator(row: &TargetStatus) -> String {
    match row.published_at {
        Some(_) => "■".green().bold().to_string(),
        None => "■".bright_black().bold().to_string(),
    }
}

/// Compact age rendering: 42s, 7m, 3h, 2d.
fn format_age(timestamp: DateTime<Utc>) -> String {
    let age = Utc::now()
        .signed_duration_since(timestamp)
        .num_seconds()
        .max(0) as u64;
    match age {
        0..=59 => format!("{age}s"),
        60..=3599 => format!("{}m", age / 60),
        3600..=86_399 => format!("{}h", age / 3600),
        _ => format!("{}d", age / 86_400),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn age_buckets() {
        let now = Utc::now();
        assert_eq!(format_age(now), "0s");
        assert_eq!(format_age(now - Duration::seconds(65)), "1m");
        assert_eq!(format_age(now - Duration::hours(3)), "3h");
        assert_eq!(format_age(now - Duration::days(2)), "2d");
    }

    #[test]
    fn future_timestamps_clamp_to_zero() {
        let ahead = Utc::now() + Duration::seconds(30);
        assert_eq!(format_age(ahead), "0s");
    }
}
