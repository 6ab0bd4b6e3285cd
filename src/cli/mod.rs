//! CLI interface using clap.
//!
//! Provides command-line arguments and subcommands for the tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Slack History Export - Archive a Slack workspace's history to JSON.
///
/// Exports users, conversations, messages with their threads, and files.
#[derive(Parser, Debug)]
#[command(name = "slack-history-export")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (use multiple times for more verbosity).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to the user config directory).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export the whole workspace history.
    Export {
        /// Base directory; each run writes a timestamped subdirectory.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Authenticate with the bot token instead of the user token.
        #[arg(long)]
        bot: bool,

        /// Write one messages file per local calendar day.
        #[arg(long, conflicts_with = "combined")]
        split_by_day: bool,

        /// Write one messages file per conversation.
        #[arg(long)]
        combined: bool,

        /// Abort on the first failed call instead of skipping what failed.
        #[arg(long)]
        fail_fast: bool,
    },

    /// Create default config file if it doesn't exist.
    InitConfig,

    /// Show config file path.
    ConfigPath,
}
