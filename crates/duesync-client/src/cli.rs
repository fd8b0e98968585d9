//! Command-line interface definition.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

/// duesync - LMS due dates in your calendar
#[derive(Debug, Parser)]
#[command(name = "duesync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "DUESYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Emit logs as JSON lines (for cron and CI runs)
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Normalize a scraper hand-off file into calendar-ready events
    Normalize(NormalizeArgs),

    /// Push due dates to Google Calendar
    Sync(SyncArgs),

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Arguments of `duesync normalize`.
#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// JSON array of raw events written by the scraper
    pub input: PathBuf,

    /// Write the normalized events here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Reference instant for year inference and fallbacks (RFC 3339)
    #[arg(long)]
    pub now: Option<DateTime<Utc>>,
}

/// Arguments of `duesync sync`.
#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Raw events file, or normalized events with --normalized
    pub input: PathBuf,

    /// The input was produced by `duesync normalize`
    #[arg(long)]
    pub normalized: bool,

    /// Print what would be synced without contacting the calendar
    #[arg(long)]
    pub dry_run: bool,

    /// Override `[sync] look_ahead_days`
    #[arg(long)]
    pub look_ahead_days: Option<u32>,

    /// Reference instant for the window and normalization (RFC 3339)
    #[arg(long)]
    pub now: Option<DateTime<Utc>>,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
