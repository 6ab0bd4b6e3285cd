//! Directory resolution: users and addressable conversations.
//!
//! One-to-one conversations carry no name of their own; they are named after
//! the counterpart user, prefixed with [`DIRECT_NAME_PREFIX`] so they cannot
//! be mistaken for a channel name.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::domain::{Conversation, ConversationKind, Result, User};
use crate::infrastructure::SlackApi;

use super::paginator::Paginator;

/// Marker prepended to one-to-one conversation names.
pub const DIRECT_NAME_PREFIX: &str = "@";

/// Users and conversations of one workspace snapshot.
#[derive(Debug)]
pub struct Directory {
    pub users: Vec<User>,
    /// Conversations in listing order, every one with a non-empty name.
    pub conversations: Vec<Conversation>,
    /// Both listings were fetched to the end.
    pub complete: bool,
}

/// Builds the [`Directory`] from the API.
pub struct DirectoryResolver<'a> {
    api: &'a dyn SlackApi,
    paginator: Paginator,
    fail_fast: bool,
}

impl<'a> DirectoryResolver<'a> {
    #[must_use]
    pub const fn new(api: &'a dyn SlackApi, paginator: Paginator, fail_fast: bool) -> Self {
        Self {
            api,
            paginator,
            fail_fast,
        }
    }

    /// Fetches all users and conversations and names every conversation.
    ///
    /// # Errors
    /// Only in fail-fast mode, when a listing fails.
    pub async fn resolve(&self) -> Result<Directory> {
        let users = self
            .paginator
            .fetch_all("users.list", |cursor| self.api.users_list(cursor))
            .await
            .into_result(self.fail_fast)?;

        let conversations = self
            .paginator
            .fetch_all("conversations.list", |cursor| {
                self.api.conversations_list(cursor)
            })
            .await
            .into_result(self.fail_fast)?;

        let complete = users.is_complete() && conversations.is_complete();
        let users = users.items;
        let mut conversations = conversations.items;

        let index = index_users(&users);
        for conversation in &mut conversations {
            assign_name(conversation, &index);
        }
        disambiguate_direct_names(&mut conversations);

        tracing::info!(
            users = users.len(),
            conversations = conversations.len(),
            complete,
            "Directory resolved"
        );

        Ok(Directory {
            users,
            conversations,
            complete,
        })
    }
}

/// Indexes users by id. A duplicated id keeps its first record.
#[must_use]
pub fn index_users(users: &[User]) -> HashMap<&str, &User> {
    let mut index = HashMap::with_capacity(users.len());
    for user in users {
        match index.entry(user.id.as_str()) {
            Entry::Occupied(_) => {
                tracing::warn!(user = %user.id, "Duplicate user id in listing, keeping the first");
            }
            Entry::Vacant(slot) => {
                slot.insert(user);
            }
        }
    }
    index
}

/// Appends the counterpart id to one-to-one names shared by several
/// conversations, e.g. two users both called `Alice` become
/// `@Alice (U1)` and `@Alice (U2)`.
///
/// Every conversation carrying a repeated name is renamed, so the result does
/// not depend on listing order.
pub fn disambiguate_direct_names(conversations: &mut [Conversation]) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for conversation in conversations.iter() {
        if conversation.kind() == ConversationKind::Direct {
            *counts.entry(conversation.name.clone()).or_default() += 1;
        }
    }

    for conversation in conversations.iter_mut() {
        if conversation.kind() != ConversationKind::Direct
            || counts.get(&conversation.name).copied().unwrap_or(0) < 2
        {
            continue;
        }
        let suffix = conversation
            .user
            .clone()
            .unwrap_or_else(|| conversation.id.clone());
        tracing::debug!(
            conversation = %conversation.id,
            name = %conversation.name,
            "Direct conversation name shared, adding counterpart id"
        );
        conversation.name = format!("{} ({suffix})", conversation.name);
    }
}

/// Gives `conversation` its export name.
///
/// One-to-one conversations get `@<counterpart display name>`. When the
/// counterpart is not in the user list the counterpart id stands in, and
/// without any counterpart the conversation id does. Other conversations
/// keep their listed name, or their id when it is empty.
pub fn assign_name(conversation: &mut Conversation, users: &HashMap<&str, &User>) {
    if conversation.kind() == ConversationKind::Direct {
        let counterpart = match conversation.user.as_deref() {
            Some(user_id) => {
                if let Some(user) = users.get(user_id) {
                    user.display_name().to_string()
                } else {
                    tracing::warn!(
                        conversation = %conversation.id,
                        user = user_id,
                        "Counterpart not in user list, naming by user id"
                    );
                    user_id.to_string()
                }
            }
            None => {
                tracing::warn!(
                    conversation = %conversation.id,
                    "Direct conversation without counterpart, naming by conversation id"
                );
                conversation.id.clone()
            }
        };
        conversation.name = format!("{DIRECT_NAME_PREFIX}{counterpart}");
    } else if conversation.name.trim().is_empty() {
        conversation.name.clone_from(&conversation.id);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::application::gate::CallGate;
    use crate::test_support::{channel, direct, user, FakeSlack};

    fn resolver(api: &FakeSlack, fail_fast: bool) -> DirectoryResolver<'_> {
        DirectoryResolver::new(api, Paginator::new(CallGate::new(Duration::ZERO)), fail_fast)
    }

    #[tokio::test]
    async fn test_direct_conversation_named_after_counterpart() {
        let api = FakeSlack {
            users: vec![vec![user("U1", "Alice")], vec![user("U2", "Bob")]],
            conversations: vec![vec![channel("C1", "general"), direct("D1", "U1")]],
            ..FakeSlack::default()
        };

        let directory = resolver(&api, false).resolve().await.unwrap();

        assert!(directory.complete);
        assert_eq!(directory.users.len(), 2);
        let names: Vec<_> = directory.conversations.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["general", "@Alice"]);
    }

    #[tokio::test]
    async fn test_all_conversation_pages_are_fetched() {
        let api = FakeSlack {
            conversations: vec![
                vec![channel("C1", "general")],
                vec![channel("C2", "random")],
                vec![channel("C3", "ops")],
            ],
            ..FakeSlack::default()
        };

        let directory = resolver(&api, false).resolve().await.unwrap();

        assert_eq!(directory.conversations.len(), 3);
        assert_eq!(api.calls_for("conversations"), 3);
    }

    #[tokio::test]
    async fn test_unknown_counterpart_falls_back_to_user_id() {
        let api = FakeSlack {
            users: vec![vec![user("U1", "Alice")]],
            conversations: vec![vec![direct("D9", "U404")]],
            ..FakeSlack::default()
        };

        let directory = resolver(&api, false).resolve().await.unwrap();

        assert_eq!(directory.conversations[0].name, "@U404");
    }

    #[tokio::test]
    async fn test_failed_user_listing_is_soft() {
        let api = FakeSlack {
            users: vec![vec![user("U1", "Alice")]],
            conversations: vec![vec![direct("D1", "U1")]],
            failing: ["users".to_string()].into(),
            ..FakeSlack::default()
        };

        let directory = resolver(&api, false).resolve().await.unwrap();

        assert!(!directory.complete);
        assert!(directory.users.is_empty());
        assert_eq!(directory.conversations[0].name, "@U1");
    }

    #[tokio::test]
    async fn test_failed_listing_aborts_in_fail_fast_mode() {
        let api = FakeSlack {
            failing: ["conversations".to_string()].into(),
            ..FakeSlack::default()
        };

        assert!(resolver(&api, true).resolve().await.is_err());
    }

    #[tokio::test]
    async fn test_same_named_counterparts_get_distinct_names() {
        let api = FakeSlack {
            users: vec![vec![user("U1", "Alice"), user("U2", "Alice"), user("U3", "Bob")]],
            conversations: vec![vec![
                direct("D1", "U1"),
                direct("D2", "U2"),
                direct("D3", "U3"),
                channel("C1", "@Alice"),
            ]],
            ..FakeSlack::default()
        };

        let directory = resolver(&api, false).resolve().await.unwrap();

        let names: Vec<_> = directory.conversations.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["@Alice (U1)", "@Alice (U2)", "@Bob", "@Alice"]);
    }

    #[test]
    fn test_assign_name_edge_cases() {
        let users = vec![user("U1", "Alice")];
        let index = index_users(&users);

        let mut conv = direct("D1", "U1");
        conv.user = None;
        assign_name(&mut conv, &index);
        assert_eq!(conv.name, "@D1");

        let mut conv = channel("C1", "");
        assign_name(&mut conv, &index);
        assert_eq!(conv.name, "C1");

        let mut conv = channel("C2", "general");
        assign_name(&mut conv, &index);
        assert_eq!(conv.name, "general");
    }

    #[test]
    fn test_index_users_keeps_first_duplicate() {
        let users = vec![user("U1", "First"), user("U1", "Second")];
        let index = index_users(&users);
        assert_eq!(index["U1"].display_name(), "First");
    }
}
