//! Slack History Export - Archive a Slack workspace's history to JSON.
//!
//! Walks every paginated listing (users, conversations, root history and
//! thread replies) behind a fixed inter-call delay, rebuilds each
//! conversation as one timestamp-ordered stream and writes it, together with
//! the attached files, into a timestamped export directory.
//!
//! QUICK START:
//!   slack-history-export init-config          # Write default config
//!   SLACK_USER_TOKEN=xoxp-... slack-history-export export
//!   slack-history-export export --bot --combined -o ./archive

mod application;
mod cli;
mod domain;
mod infrastructure;
#[cfg(test)]
mod test_support;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{format_summary_table, format_totals, ExportService, ExportSettings};
use cli::{Cli, Commands};
use domain::AppConfig;
use infrastructure::{
    ensure_config_exists, load_config, ExportWriter, HttpFileFetcher, SlackClient,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main application logic.
async fn run(cli: Cli) -> domain::Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Export {
            output,
            bot,
            split_by_day,
            combined,
            fail_fast,
        } => {
            let mut config = load_config(config_path)?;
            config.apply_token_overrides(|key| std::env::var(key).ok());

            if let Some(output) = output {
                config.export.base_path = output;
            }
            if bot {
                config.auth.use_user_token = false;
            }
            if split_by_day {
                config.export.split_by_day = true;
            }
            if combined {
                config.export.split_by_day = false;
            }
            if fail_fast {
                config.export.fail_fast = true;
            }

            cmd_export(&config).await?;
        }
        Commands::InitConfig => {
            cmd_init_config(config_path)?;
        }
        Commands::ConfigPath => {
            cmd_config_path(config_path);
        }
    }

    Ok(())
}

/// Export the workspace into a new timestamped directory.
async fn cmd_export(config: &AppConfig) -> domain::Result<()> {
    tracing::info!(credential = config.credential_label(), "Authenticating");

    let api = SlackClient::new(
        &config.api.base_url,
        config.credential()?,
        config.api.page_limit,
    )?;
    let fetcher = HttpFileFetcher::new(
        config.credential()?,
        config.connect_timeout(),
        config.read_timeout(),
    )?;

    let run_stamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let writer = ExportWriter::create(&config.export.base_path, &run_stamp)?;

    println!(
        "{} Exporting to {}",
        "→".cyan().bold(),
        writer.root().display()
    );

    let service = ExportService::new(
        Arc::new(api),
        Arc::new(fetcher),
        writer,
        ExportSettings::from_config(config),
    );
    let summary = service.run().await?;

    println!("{}", format_summary_table(&summary));
    println!();
    println!("{}", format_totals(&summary));

    if summary.is_complete() {
        println!(
            "\n{} Exported {} conversations to {}",
            "✓".green().bold(),
            summary.conversations.len(),
            summary.root.display()
        );
    } else {
        println!(
            "\n{} Export finished with gaps, see the log above (rerun with -v for details)",
            "⚠".yellow().bold()
        );
    }

    Ok(())
}

/// Create default config file.
fn cmd_init_config(path: Option<&Path>) -> domain::Result<()> {
    let (path, created) = ensure_config_exists(path)?;

    if created {
        println!(
            "{} Created config file: {}",
            "✓".green().bold(),
            path.display()
        );
        println!("  Add a token under [auth], or set SLACK_USER_TOKEN / SLACK_BOT_TOKEN.");
    } else {
        println!("Config file already exists: {}", path.display());
    }

    Ok(())
}

/// Show config file path.
fn cmd_config_path(path: Option<&Path>) {
    let path = path.map_or_else(AppConfig::default_config_path, Path::to_path_buf);
    let exists = path.exists();

    println!(
        "{} {}",
        if exists { "✓".green() } else { "✗".red() },
        path.display()
    );

    if !exists {
        println!("  Run 'slack-history-export init-config' to create it.");
    }
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
