//! Infrastructure layer - external adapters (Slack Web API, HTTP downloads, filesystem).
//!
//! This layer handles all I/O operations and external dependencies.

pub mod config;
pub mod export_writer;
pub mod file_downloader;
pub mod slack_client;

pub use config::{ensure_config_exists, load_config};
pub use export_writer::ExportWriter;
pub use file_downloader::{Download, FileFetcher, HttpFileFetcher};
pub use slack_client::{SlackApi, SlackClient};
