//! vaultpub — mirror a local vault selection into a GitHub repo folder.
//!
//! # Usage
//!
//! ```text
//! vaultpub target add <name> --repo <url> --vault <dir> --select <path>... [--branch main] [--folder docs]
//! vaultpub target list
//! vaultpub target remove <name>
//! vaultpub publish <target> [--dry-run]
//! vaultpub plan <target>
//! vaultpub status [--json]
//! vaultpub watch <target> [--interval <secs>]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    plan::PlanArgs, publish::PublishArgs, status::StatusArgs, target::TargetCommand,
    watch::WatchArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "vaultpub",
    version,
    about = "Publish a selection of local documents into a GitHub repository folder",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage configured mirror targets.
    Target {
        #[command(subcommand)]
        command: TargetCommand,
    },

    /// Reconcile a target's selection against the remote and commit the result.
    Publish(PublishArgs),

    /// Show the tree mutations a publish would apply, without writing.
    Plan(PlanArgs),

    /// Show last-publish state across configured targets.
    Status(StatusArgs),

    /// Publish a target on a fixed interval until interrupted.
    Watch(WatchArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Target { command } => commands::target::run(command),
        Commands::Publish(args) => args.run(),
        Commands::Plan(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Watch(args) => args.run(),
    }
}
