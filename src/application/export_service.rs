//! Export orchestration.
//!
//! Resolves the directory once, then exports conversations one at a time:
//! reconstruct messages, write them, download their files. Nothing runs
//! concurrently; the gate delay after each call is the only pacing.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{
    AppConfig, Conversation, ConversationReport, ExportSummary, FileTally, Message, Result,
};
use crate::infrastructure::{ExportWriter, FileFetcher, SlackApi};

use super::directory::DirectoryResolver;
use super::gate::CallGate;
use super::paginator::Paginator;
use super::reconstructor::Reconstructor;

/// Behaviour knobs of an export run.
#[derive(Debug, Clone, Copy)]
pub struct ExportSettings {
    /// Wait after every API call and download.
    pub access_wait: Duration,
    /// Optional page ceiling per listing.
    pub max_pages: Option<usize>,
    /// One messages document per local calendar day.
    pub split_by_day: bool,
    /// Abort on the first failed call.
    pub fail_fast: bool,
}

impl ExportSettings {
    #[must_use]
    pub const fn from_config(config: &AppConfig) -> Self {
        Self {
            access_wait: config.access_wait(),
            max_pages: config.api.max_pages,
            split_by_day: config.export.split_by_day,
            fail_fast: config.export.fail_fast,
        }
    }
}

/// Runs a full export into one [`ExportWriter`].
pub struct ExportService {
    api: Arc<dyn SlackApi>,
    fetcher: Arc<dyn FileFetcher>,
    writer: ExportWriter,
    settings: ExportSettings,
    gate: CallGate,
    paginator: Paginator,
}

impl ExportService {
    /// Create a new export service.
    #[must_use]
    pub fn new(
        api: Arc<dyn SlackApi>,
        fetcher: Arc<dyn FileFetcher>,
        writer: ExportWriter,
        settings: ExportSettings,
    ) -> Self {
        let gate = CallGate::new(settings.access_wait);
        let paginator = Paginator::new(gate).with_max_pages(settings.max_pages);

        Self {
            api,
            fetcher,
            writer,
            settings,
            gate,
            paginator,
        }
    }

    /// Exports every accessible conversation.
    ///
    /// # Errors
    /// Returns error when the users or conversations document cannot be
    /// written, or on the first failed call or write in fail-fast mode.
    pub async fn run(&self) -> Result<ExportSummary> {
        tracing::info!(root = %self.writer.root().display(), "Start Slack data export");

        let directory = DirectoryResolver::new(
            self.api.as_ref(),
            self.paginator,
            self.settings.fail_fast,
        )
        .resolve()
        .await?;

        self.writer.write_users(&directory.users)?;
        self.writer.write_conversations(&directory.conversations)?;

        let reconstructor =
            Reconstructor::new(self.api.as_ref(), self.paginator, self.settings.fail_fast);

        let mut summary = ExportSummary {
            root: self.writer.root().to_path_buf(),
            users: directory.users.len(),
            directory_complete: directory.complete,
            conversations: Vec::with_capacity(directory.conversations.len()),
        };

        for conversation in &directory.conversations {
            let report = self.export_conversation(&reconstructor, conversation).await?;
            summary.conversations.push(report);
        }

        tracing::info!(
            conversations = summary.conversations.len(),
            messages = summary.message_count(),
            incomplete = summary.incomplete_count(),
            "End Slack data export"
        );

        Ok(summary)
    }

    async fn export_conversation(
        &self,
        reconstructor: &Reconstructor<'_>,
        conversation: &Conversation,
    ) -> Result<ConversationReport> {
        tracing::info!(
            channel = %conversation.id,
            name = %conversation.name,
            kind = %conversation.kind(),
            "Export conversation"
        );

        let reconstruction = reconstructor.reconstruct(&conversation.id).await?;

        let written = match self.writer.write_messages(
            conversation,
            &reconstruction.messages,
            self.settings.split_by_day,
        ) {
            Ok(_) => true,
            Err(err) if self.settings.fail_fast => return Err(err),
            Err(err) => {
                tracing::error!(channel = %conversation.id, error = %err, "Writing messages failed");
                false
            }
        };

        let files = self.save_files(conversation, &reconstruction.messages).await?;

        Ok(ConversationReport {
            id: conversation.id.clone(),
            name: conversation.name.clone(),
            kind: conversation.kind(),
            messages: reconstruction.messages.len(),
            threads: reconstruction.threads,
            failed_threads: reconstruction.failed_threads.len(),
            files,
            complete: written && reconstruction.is_complete(),
        })
    }

    /// Downloads every non-tombstoned file referenced by `messages`.
    ///
    /// Download and write failures are logged per file and skipped. A file
    /// shared in several messages is downloaded once.
    async fn save_files(
        &self,
        conversation: &Conversation,
        messages: &[Message],
    ) -> Result<FileTally> {
        let mut tally = FileTally::default();
        let mut seen = HashSet::new();

        tracing::info!(channel = %conversation.id, "Save files");

        for message in messages {
            tally.tombstoned += message.tombstoned_files().count();

            for file in message.downloadable_files() {
                if !seen.insert(file.id.as_str()) {
                    continue;
                }

                let Some(url) = file.url_private.as_deref() else {
                    tracing::warn!(file = %file.id, "File has no download URL, skipping");
                    tally.failed += 1;
                    continue;
                };

                tracing::debug!(file = %file.archive_name(), "Download");

                match self.gate.invoke("file download", self.fetcher.fetch(url)).await {
                    Ok(download) => {
                        if download.redirected {
                            tracing::warn!(
                                file = %file.id,
                                "Download was redirected, file may be invalid. \
                                 Check that the token's scopes include files:read"
                            );
                            tally.redirected += 1;
                        }
                        match self.writer.write_file(conversation, file, &download.bytes) {
                            Ok(_) => tally.saved += 1,
                            Err(err) if self.settings.fail_fast => return Err(err),
                            Err(err) => {
                                tracing::error!(file = %file.id, error = %err, "Saving file failed");
                                tally.failed += 1;
                            }
                        }
                    }
                    Err(err) => {
                        tracing::error!(file = %file.id, url, "File download failed");
                        if self.settings.fail_fast {
                            return Err(err);
                        }
                        tally.failed += 1;
                    }
                }
            }
        }

        Ok(tally)
    }
}
