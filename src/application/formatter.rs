//! Terminal output for export runs.

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Table};

use crate::domain::{ConversationReport, ExportSummary};

/// Formats a table listing of exported conversations.
pub fn format_summary_table(summary: &ExportSummary) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["ID", "Kind", "Name", "Msgs", "Threads", "Files", "Status"]);

    for report in &summary.conversations {
        let threads = if report.failed_threads == 0 {
            report.threads.to_string()
        } else {
            format!("{} ({} lost)", report.threads, report.failed_threads)
        };

        table.add_row(vec![
            report.id.clone(),
            report.kind.to_string(),
            truncate(&report.name, 30),
            report.messages.to_string(),
            threads,
            format_files(report),
            status(report).to_string(),
        ]);
    }

    table.to_string()
}

/// Formats run totals for display.
pub fn format_totals(summary: &ExportSummary) -> String {
    let files = summary.files();
    let incomplete = summary.incomplete_count();

    let status = if summary.is_complete() {
        "complete".green()
    } else if !summary.directory_complete {
        "directory incomplete".red()
    } else {
        format!("{incomplete} conversation(s) incomplete").yellow()
    };

    format!(
        "{}\n  Output: {}\n  Users: {}\n  Conversations: {}\n  Messages: {}\n  Files saved: {}\n  Files deleted upstream: {}\n  Files failed: {}\n  Status: {}",
        "📊 Export".bold(),
        summary.root.display().to_string().cyan(),
        summary.users.to_string().cyan(),
        summary.conversations.len().to_string().cyan(),
        summary.message_count().to_string().cyan(),
        files.saved.to_string().green(),
        files.tombstoned.to_string().yellow(),
        files.failed.to_string().red(),
        status
    )
}

fn format_files(report: &ConversationReport) -> String {
    let files = report.files;
    let mut out = files.saved.to_string();
    if files.failed > 0 {
        out.push_str(&format!(" ({} failed)", files.failed));
    }
    if files.tombstoned > 0 {
        out.push_str(&format!(" ({} deleted)", files.tombstoned));
    }
    out
}

const fn status(report: &ConversationReport) -> &'static str {
    if !report.complete {
        "partial"
    } else if report.files.failed > 0 {
        "files missing"
    } else {
        "ok"
    }
}

/// Truncates a string to max chars with ellipsis.
fn truncate(s: &str, max_len: usize) -> String {
    let s = s.lines().next().unwrap_or(s);
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
