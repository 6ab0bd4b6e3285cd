//! Outcome of an export run.

use std::path::PathBuf;

use serde::Serialize;

use super::ConversationKind;

/// File download counters for one conversation.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct FileTally {
    /// Files written to the archive.
    pub saved: usize,
    /// Deleted files, kept in metadata only.
    pub tombstoned: usize,
    /// Downloads that failed or had no URL.
    pub failed: usize,
    /// Downloads answered through a redirect (likely a scope problem).
    pub redirected: usize,
}

/// What happened to one conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationReport {
    pub id: String,
    pub name: String,
    pub kind: ConversationKind,
    pub messages: usize,
    pub threads: usize,
    pub failed_threads: usize,
    pub files: FileTally,
    /// Every page of history and every thread was fetched.
    pub complete: bool,
}

/// Summary of a whole export run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportSummary {
    /// Directory the run wrote to.
    pub root: PathBuf,
    pub users: usize,
    /// Users and conversation listings were fetched to the end.
    pub directory_complete: bool,
    pub conversations: Vec<ConversationReport>,
}

impl ExportSummary {
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.conversations.iter().map(|c| c.messages).sum()
    }

    #[must_use]
    pub fn files(&self) -> FileTally {
        self.conversations
            .iter()
            .fold(FileTally::default(), |acc, c| FileTally {
                saved: acc.saved + c.files.saved,
                tombstoned: acc.tombstoned + c.files.tombstoned,
                failed: acc.failed + c.files.failed,
                redirected: acc.redirected + c.files.redirected,
            })
    }

    /// Conversations with missing history, threads or files.
    #[must_use]
    pub fn incomplete_count(&self) -> usize {
        self.conversations
            .iter()
            .filter(|c| !c.complete || c.files.failed > 0)
            .count()
    }

    /// Nothing was lost anywhere in the run.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.directory_complete && self.incomplete_count() == 0
    }
}
