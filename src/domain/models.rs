//! Domain models for Slack workspace data.
//!
//! Only the structural fields needed for naming, ordering, threading and file
//! downloads are typed. Everything else the API returns is kept in an opaque
//! `extra` map so the archive preserves the full payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::timestamp::MessageTs;

/// Mode value Slack uses for deleted files.
const TOMBSTONE_MODE: &str = "tombstone";

/// Kind of conversation, derived from the `is_*` flags of the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationKind {
    /// Public channel.
    PublicChannel,
    /// Private channel (or legacy group).
    PrivateChannel,
    /// Multi-person direct message.
    MultiPartyDirect,
    /// One-to-one direct message.
    Direct,
}

impl std::fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PublicChannel => write!(f, "public"),
            Self::PrivateChannel => write!(f, "private"),
            Self::MultiPartyDirect => write!(f, "mpim"),
            Self::Direct => write!(f, "im"),
        }
    }
}

/// A channel, group or direct message conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Opaque conversation id.
    pub id: String,
    /// Display name. Empty for one-to-one conversations until resolved.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_im: bool,
    #[serde(default)]
    pub is_mpim: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_group: bool,
    /// Counterpart user id (one-to-one conversations only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Remaining fields, preserved as received.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Conversation {
    /// Kind of this conversation.
    #[must_use]
    pub const fn kind(&self) -> ConversationKind {
        if self.is_im {
            ConversationKind::Direct
        } else if self.is_mpim {
            ConversationKind::MultiPartyDirect
        } else if self.is_private || self.is_group {
            ConversationKind::PrivateChannel
        } else {
            ConversationKind::PublicChannel
        }
    }

    /// Directory name used in the archive: `{id}_{name}`.
    #[must_use]
    pub fn dir_name(&self) -> String {
        format!("{}_{}", self.id, self.name)
    }
}

/// Profile section of a user record.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A workspace member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user id within the workspace.
    pub id: String,
    /// Handle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Full name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,
    #[serde(default)]
    pub profile: UserProfile,
    /// Remaining membership record, preserved as received.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Human-readable name, never empty.
    ///
    /// Prefers the full name, then the profile names, then the handle, and
    /// finally the id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        [
            self.real_name.as_deref(),
            self.profile.real_name.as_deref(),
            self.profile.display_name.as_deref(),
            self.name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(&self.id)
    }
}

/// A file attached to a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct File {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Authenticated download URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_private: Option<String>,
    /// Lifecycle marker; `"tombstone"` for deleted files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl File {
    /// Whether the platform has deleted this file.
    #[must_use]
    pub fn is_tombstoned(&self) -> bool {
        self.mode.as_deref() == Some(TOMBSTONE_MODE)
    }

    /// Unsanitized archive file name: `{id}_{name}`, or just `{id}` without a name.
    #[must_use]
    pub fn archive_name(&self) -> String {
        match self.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => format!("{}_{}", self.id, name),
            None => self.id.clone(),
        }
    }
}

/// A single message, either top-level or a thread reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Timestamp token, also the message identity.
    pub ts: MessageTs,
    /// Timestamp of the thread parent, if the message belongs to a thread.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<MessageTs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<File>>,
    /// Remaining payload (text, user, blocks, reactions...), preserved as received.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    /// Whether this message starts a reply thread.
    #[must_use]
    pub fn is_thread_parent(&self) -> bool {
        self.thread_ts.as_ref() == Some(&self.ts)
    }

    /// Attached files that still exist on the platform.
    pub fn downloadable_files(&self) -> impl Iterator<Item = &File> {
        self.files
            .iter()
            .flatten()
            .filter(|f| !f.is_tombstoned())
    }

    /// Attached files the platform has deleted.
    pub fn tombstoned_files(&self) -> impl Iterator<Item = &File> {
        self.files.iter().flatten().filter(|f| f.is_tombstoned())
    }
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items of this page.
    pub items: Vec<T>,
    /// Continuation token; `None` means this is the last page.
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Create a page, normalizing an empty cursor to "no more pages".
    #[must_use]
    pub fn new(items: Vec<T>, next_cursor: Option<String>) -> Self {
        Self {
            items,
            next_cursor: next_cursor.filter(|c| !c.is_empty()),
        }
    }

    /// A final page.
    #[must_use]
    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_conversation_kind() {
        let conv = |v: Value| serde_json::from_value::<Conversation>(v).unwrap().kind();

        assert_eq!(conv(json!({"id": "C1", "name": "general"})), ConversationKind::PublicChannel);
        assert_eq!(
            conv(json!({"id": "G1", "name": "ops", "is_private": true})),
            ConversationKind::PrivateChannel
        );
        assert_eq!(
            conv(json!({"id": "G2", "name": "mpdm-a--b-1", "is_mpim": true, "is_private": true})),
            ConversationKind::MultiPartyDirect
        );
        assert_eq!(
            conv(json!({"id": "D1", "is_im": true, "user": "U1"})),
            ConversationKind::Direct
        );
    }

    #[test]
    fn test_user_display_name_precedence() {
        let user = |v: Value| serde_json::from_value::<User>(v).unwrap();

        let u = user(json!({"id": "U1", "name": "alice", "real_name": "Alice Liddell"}));
        assert_eq!(u.display_name(), "Alice Liddell");

        let u = user(json!({"id": "U1", "name": "alice", "real_name": "  ",
                            "profile": {"display_name": "Al"}}));
        assert_eq!(u.display_name(), "Al");

        let u = user(json!({"id": "U1", "name": "alice"}));
        assert_eq!(u.display_name(), "alice");

        let u = user(json!({"id": "U1"}));
        assert_eq!(u.display_name(), "U1");
    }

    #[test]
    fn test_message_preserves_unknown_fields() {
        let raw = json!({
            "type": "message",
            "ts": "1700000000.000100",
            "user": "U1",
            "text": "hello",
            "reactions": [{"name": "wave", "count": 1}]
        });
        let msg: Message = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(msg.extra["text"], "hello");
        assert_eq!(serde_json::to_value(&msg).unwrap(), raw);
    }

    #[test]
    fn test_thread_parent_detection() {
        let msg = |v: Value| serde_json::from_value::<Message>(v).unwrap();

        assert!(msg(json!({"ts": "10.0", "thread_ts": "10.0"})).is_thread_parent());
        assert!(!msg(json!({"ts": "11.0", "thread_ts": "10.0"})).is_thread_parent());
        assert!(!msg(json!({"ts": "12.0"})).is_thread_parent());
    }

    #[test]
    fn test_tombstoned_files_are_not_downloadable() {
        let msg: Message = serde_json::from_value(json!({
            "ts": "1.0",
            "files": [
                {"id": "F1", "name": "a.png", "url_private": "https://files/a.png", "mode": "hosted"},
                {"id": "F2", "mode": "tombstone"}
            ]
        }))
        .unwrap();

        let ids: Vec<_> = msg.downloadable_files().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["F1"]);
        assert_eq!(msg.tombstoned_files().count(), 1);
    }

    #[test]
    fn test_file_archive_name() {
        let file: File = serde_json::from_value(json!({"id": "F1", "name": "report.pdf"})).unwrap();
        assert_eq!(file.archive_name(), "F1_report.pdf");

        let file: File = serde_json::from_value(json!({"id": "F2"})).unwrap();
        assert_eq!(file.archive_name(), "F2");
    }

    #[test]
    fn test_page_normalizes_empty_cursor() {
        let page = Page::new(vec![1, 2], Some(String::new()));
        assert!(page.next_cursor.is_none());

        let page = Page::new(vec![3], Some("dXNlcjpVMDYxTkZUVDI=".into()));
        assert_eq!(page.next_cursor.as_deref(), Some("dXNlcjpVMDYxTkZUVDI="));
    }
}
