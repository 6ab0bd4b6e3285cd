//! In-memory fakes of the remote collaborators, shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::domain::{AppError, Conversation, Message, MessageTs, Page, Result, User};
use crate::infrastructure::{Download, FileFetcher, SlackApi};

/// Scripted Slack workspace.
///
/// Every listing is a vector of pages. Cursors are `page-<n>`. Call keys are
/// `users`, `conversations`, `history:<channel>` and `replies:<thread ts>`;
/// putting a key in `failing` makes every call to it fail, and `<key>@<n>`
/// fails only page `n`.
#[derive(Default)]
pub struct FakeSlack {
    pub users: Vec<Vec<User>>,
    pub conversations: Vec<Vec<Conversation>>,
    pub history: HashMap<String, Vec<Vec<Message>>>,
    pub replies: HashMap<String, Vec<Vec<Message>>>,
    pub failing: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeSlack {
    fn serve<T: Clone>(&self, key: &str, pages: Option<&Vec<Vec<T>>>, cursor: Option<String>) -> Result<Page<T>> {
        let index = cursor
            .as_deref()
            .and_then(|c| c.strip_prefix("page-"))
            .map_or(0, |n| n.parse::<usize>().unwrap());
        let call = format!("{key}@{index}");
        self.calls.lock().unwrap().push(call.clone());

        if self.failing.contains(key) || self.failing.contains(&call) {
            return Err(AppError::api(key, "ratelimited"));
        }

        let Some(pages) = pages else {
            return Ok(Page::last(Vec::new()));
        };
        let items = pages.get(index).cloned().unwrap_or_default();
        let next = (index + 1 < pages.len()).then(|| format!("page-{}", index + 1));
        Ok(Page::new(items, next))
    }

    /// Calls made to keys starting with `prefix`.
    pub fn calls_for(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SlackApi for FakeSlack {
    async fn users_list(&self, cursor: Option<String>) -> Result<Page<User>> {
        self.serve("users", Some(&self.users), cursor)
    }

    async fn conversations_list(&self, cursor: Option<String>) -> Result<Page<Conversation>> {
        self.serve("conversations", Some(&self.conversations), cursor)
    }

    async fn conversations_history(
        &self,
        channel: &str,
        cursor: Option<String>,
    ) -> Result<Page<Message>> {
        self.serve(&format!("history:{channel}"), self.history.get(channel), cursor)
    }

    async fn conversations_replies(
        &self,
        _channel: &str,
        thread_ts: &MessageTs,
        cursor: Option<String>,
    ) -> Result<Page<Message>> {
        self.serve(
            &format!("replies:{thread_ts}"),
            self.replies.get(thread_ts.as_str()),
            cursor,
        )
    }
}

/// Scripted file host.
#[derive(Default)]
pub struct FakeFetcher {
    pub failing: HashSet<String>,
    pub redirecting: HashSet<String>,
    pub fetched: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn fetched_urls(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Download> {
        self.fetched.lock().unwrap().push(url.to_string());
        if self.failing.contains(url) {
            return Err(AppError::InvalidData {
                message: format!("connection reset: {url}"),
            });
        }
        Ok(Download {
            bytes: format!("bytes of {url}").into_bytes(),
            redirected: self.redirecting.contains(url),
        })
    }
}

fn from_json<T: serde::de::DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).unwrap()
}

pub fn user(id: &str, real_name: &str) -> User {
    from_json(json!({"id": id, "name": real_name.to_lowercase(), "real_name": real_name}))
}

pub fn channel(id: &str, name: &str) -> Conversation {
    from_json(json!({"id": id, "name": name, "is_channel": true}))
}

pub fn direct(id: &str, user_id: &str) -> Conversation {
    from_json(json!({"id": id, "is_im": true, "user": user_id}))
}

/// Top-level message without thread.
pub fn msg(ts: &str) -> Message {
    from_json(json!({"type": "message", "ts": ts, "text": format!("text {ts}")}))
}

/// Message belonging to the thread started at `thread_ts` (the parent itself when equal).
pub fn threaded(ts: &str, thread_ts: &str) -> Message {
    from_json(json!({"type": "message", "ts": ts, "thread_ts": thread_ts, "text": format!("text {ts}")}))
}

/// Message with attached files given as `(id, mode)`.
pub fn with_files(ts: &str, files: &[(&str, &str)]) -> Message {
    let files: Vec<Value> = files
        .iter()
        .map(|(id, mode)| {
            json!({
                "id": id,
                "name": format!("{id}.txt"),
                "mode": mode,
                "url_private": format!("https://files.example/{id}"),
            })
        })
        .collect();
    from_json(json!({"type": "message", "ts": ts, "files": files}))
}

/// Timestamps of `messages`, in order.
pub fn stamps(messages: &[Message]) -> Vec<&str> {
    messages.iter().map(|m| m.ts.as_str()).collect()
}
