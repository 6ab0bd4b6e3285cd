//! Message and thread reconstruction for one conversation.
//!
//! Root history only contains top-level messages. Threads are fetched per
//! parent, the parent copy the replies endpoint includes is dropped, and
//! everything is merged into one stream ordered by timestamp.

use std::collections::HashSet;

use crate::domain::{Message, MessageTs, Result};
use crate::infrastructure::SlackApi;

use super::paginator::Paginator;

/// Ordered messages of one conversation and how complete they are.
#[derive(Debug)]
pub struct Reconstruction {
    /// Root messages and thread replies, deduplicated, ascending by timestamp.
    pub messages: Vec<Message>,
    /// Root history was fetched to its last page.
    pub history_complete: bool,
    /// Thread parents found in the root history.
    pub threads: usize,
    /// Threads whose replies could not be fetched and were left out.
    pub failed_threads: Vec<MessageTs>,
}

impl Reconstruction {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.history_complete && self.failed_threads.is_empty()
    }
}

/// Rebuilds the full message stream of a conversation.
pub struct Reconstructor<'a> {
    api: &'a dyn SlackApi,
    paginator: Paginator,
    fail_fast: bool,
}

impl<'a> Reconstructor<'a> {
    #[must_use]
    pub const fn new(api: &'a dyn SlackApi, paginator: Paginator, fail_fast: bool) -> Self {
        Self {
            api,
            paginator,
            fail_fast,
        }
    }

    /// Fetches root history and every thread of `channel_id`.
    ///
    /// A root history failure stops here and returns the root messages
    /// fetched so far. A thread failure drops that thread only.
    ///
    /// # Errors
    /// Only in fail-fast mode, on the first failed call.
    pub async fn reconstruct(&self, channel_id: &str) -> Result<Reconstruction> {
        tracing::info!(channel = channel_id, "Get messages");

        let history = self
            .paginator
            .fetch_all("conversations.history", |cursor| {
                self.api.conversations_history(channel_id, cursor)
            })
            .await
            .into_result(self.fail_fast)?;

        if history.failure.is_some() {
            tracing::error!(
                channel = channel_id,
                kept = history.items.len(),
                "History incomplete, skipping threads"
            );
            return Ok(Reconstruction {
                messages: merge_messages(history.items, Vec::new()),
                history_complete: false,
                threads: 0,
                failed_threads: Vec::new(),
            });
        }

        let history_complete = history.is_complete();
        let roots = history.items;

        let parents: Vec<MessageTs> = roots
            .iter()
            .filter(|m| m.is_thread_parent())
            .map(|m| m.ts.clone())
            .collect();

        let mut replies = Vec::new();
        let mut failed_threads = Vec::new();

        for parent in &parents {
            tracing::debug!(channel = channel_id, thread = %parent, "Get thread replies");

            let thread = self
                .paginator
                .fetch_all("conversations.replies", |cursor| {
                    self.api.conversations_replies(channel_id, parent, cursor)
                })
                .await
                .into_result(self.fail_fast)?;

            if thread.failure.is_some() {
                tracing::error!(
                    channel = channel_id,
                    thread = %parent,
                    dropped = thread.items.len(),
                    "Thread replies lost, continuing with remaining threads"
                );
                failed_threads.push(parent.clone());
                continue;
            }

            replies.extend(thread.items.into_iter().filter(|reply| reply.ts != *parent));
        }

        let messages = merge_messages(roots, replies);

        tracing::info!(
            channel = channel_id,
            messages = messages.len(),
            threads = parents.len(),
            failed_threads = failed_threads.len(),
            "Messages reconstructed"
        );

        Ok(Reconstruction {
            messages,
            history_complete,
            threads: parents.len(),
            failed_threads,
        })
    }
}

/// Merges root messages and replies into one ascending stream.
///
/// A message's `ts` is its identity within a conversation, so two entries
/// with the same numeric timestamp are the same message fetched twice (a
/// reply also broadcast to the channel shows up in both root history and its
/// thread). Only the first occurrence is kept, roots before replies. The sort
/// is stable, so the remaining order among distinct messages follows fetch
/// order wherever timestamps compare equal.
#[must_use]
pub fn merge_messages(roots: Vec<Message>, replies: Vec<Message>) -> Vec<Message> {
    let mut seen = HashSet::new();
    let mut merged: Vec<Message> = roots
        .into_iter()
        .chain(replies)
        .filter(|m| seen.insert(m.ts.clone()))
        .collect();
    merged.sort_by(|a, b| a.ts.cmp(&b.ts));
    merged
}
