//! kioskctl - kiosk profile control CLI
//!
//! Inspect, validate and edit a versioned kiosk profile from the shell.
//! Every change goes through the profile engine, so each write lands as a
//! commit that can be listed, diffed and rolled back.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod commands;
mod completion;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::Context;

#[derive(Parser)]
#[command(name = "kioskctl")]
#[command(about = "Kiosk profile control CLI - validate, edit and version kiosk profiles")]
#[command(version)]
#[command(long_about = "
kioskctl manages the profile document that drives a self-service kiosk:
store information, menu, promotions and settings.

Writes are recorded as commits in the profile store (--store). Use the log,
diff and rollback commands to audit or undo them. Use --json for
machine-readable output suitable for scripting.
")]
struct Cli {
    /// Output format (human-readable or JSON)
    #[arg(
        long,
        global = true,
        help = "Output in JSON format for machine parsing"
    )]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Profile store directory
    #[arg(long, global = true, env = "KIOSKCTL_STORE")]
    store: Option<PathBuf>,

    /// Profile document used when the store is empty
    #[arg(long, global = true, env = "KIOSKCTL_SOURCE")]
    source: Option<PathBuf>,

    /// Engine configuration file (JSON)
    #[arg(long, global = true, env = "KIOSKCTL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current profile
    Show {
        /// Print the whole document instead of a summary
        #[arg(long)]
        full: bool,
    },

    /// Validate a profile document without touching the store
    Validate {
        /// Profile JSON file
        file: PathBuf,

        /// Treat the file as a partial update
        #[arg(long)]
        partial: bool,
    },

    /// Apply a partial update and commit it
    Apply {
        /// Partial profile JSON file
        file: PathBuf,

        /// Commit message
        #[arg(short, long)]
        message: String,

        /// Commit author
        #[arg(long, env = "KIOSKCTL_AUTHOR")]
        author: Option<String>,
    },

    /// Replace the profile with a complete document and commit it
    Import {
        /// Profile JSON file
        file: PathBuf,

        /// Commit message
        #[arg(short, long, default_value = "Import profile")]
        message: String,

        /// Commit author
        #[arg(long, env = "KIOSKCTL_AUTHOR")]
        author: Option<String>,
    },

    /// Write the current profile as JSON
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List commits, newest first
    Log {
        /// Maximum number of commits
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Number of newest commits to skip
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },

    /// Show the changes between two commits
    Diff {
        /// Older commit id or unique prefix
        from: String,

        /// Newer commit id or unique prefix
        to: String,
    },

    /// Describe what a single commit changed
    Summary {
        /// Commit id or unique prefix
        commit: String,
    },

    /// Restore the profile recorded at a commit
    Rollback {
        /// Commit id or unique prefix
        commit: String,

        /// Commit author
        #[arg(long, env = "KIOSKCTL_AUTHOR")]
        author: Option<String>,
    },

    /// Print the orderable menu
    Menu,

    /// Drop old commits beyond the retention limit
    Prune,

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "kioskctl={log_level},kiosk_profile={log_level},\
                     kiosk_profile_repository={log_level}"
                )
                .into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match execute_command(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            ExitCode::from(error::exit_code(&e))
        }
    }
}

async fn execute_command(cli: &Cli) -> Result<()> {
    let ctx = Context {
        json: cli.json,
        store: cli.store.clone(),
        source: cli.source.clone(),
        config: cli.config.clone(),
    };
    match &cli.command {
        Commands::Show { full } => commands::profile::show(&ctx, *full).await,
        Commands::Validate { file, partial } => commands::profile::validate(&ctx, file, *partial).await,
        Commands::Apply {
            file,
            message,
            author,
        } => commands::profile::apply(&ctx, file, message, author.as_deref()).await,
        Commands::Import {
            file,
            message,
            author,
        } => commands::profile::import(&ctx, file, message, author.as_deref()).await,
        Commands::Export { output } => commands::profile::export(&ctx, output.as_deref()).await,
        Commands::Log { limit, offset } => commands::history::log(&ctx, *limit, *offset).await,
        Commands::Diff { from, to } => commands::history::diff(&ctx, from, to).await,
        Commands::Summary { commit } => commands::history::summary(&ctx, commit).await,
        Commands::Rollback { commit, author } => {
            commands::history::rollback(&ctx, commit, author.as_deref()).await
        }
        Commands::Menu => commands::menu::show(&ctx).await,
        Commands::Prune => commands::history::prune(&ctx).await,
        Commands::Completion { shell } => {
            completion::generate_completion(*shell);
            Ok(())
        }
    }
}
