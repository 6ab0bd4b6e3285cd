//! Domain layer - core types and configuration.
//!
//! This layer contains the Slack entities, the timestamp type used for
//! ordering, configuration and error types, without any I/O.

pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod timestamp;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use models::{Conversation, ConversationKind, File, Message, Page, User};
pub use report::{ConversationReport, ExportSummary, FileTally};
pub use timestamp::MessageTs;
