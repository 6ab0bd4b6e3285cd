//! Application layer - use cases and orchestration.
//!
//! This layer contains the export engine: the rate-limited call gate, cursor
//! pagination, directory resolution, thread reconstruction and the export
//! run that ties them together.

pub mod directory;
pub mod export_service;
pub mod formatter;
pub mod gate;
pub mod paginator;
pub mod reconstructor;

pub use export_service::{ExportService, ExportSettings};
pub use formatter::{format_summary_table, format_totals};
