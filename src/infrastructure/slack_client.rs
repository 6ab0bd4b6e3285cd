//! Slack Web API client.
//!
//! `SlackApi` is the remote capability the export engine depends on: four
//! cursor-paginated listing endpoints, each returning one typed page or a
//! typed error. `SlackClient` implements it over HTTP with `reqwest`.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::{AppError, Conversation, Message, MessageTs, Page, Result, User};

/// Conversation kinds requested from `conversations.list`.
const CONVERSATION_TYPES: &str = "public_channel,private_channel,mpim,im";

/// Error code reported when the API answers with HTTP 429.
const RATE_LIMITED: &str = "ratelimited";

/// Cursor-paginated Slack endpoints used by the exporter.
///
/// Cursors are owned so the returned future does not borrow the caller's
/// pagination state.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// `users.list`
    async fn users_list(&self, cursor: Option<String>) -> Result<Page<User>>;

    /// `conversations.list` across every conversation kind.
    async fn conversations_list(&self, cursor: Option<String>) -> Result<Page<Conversation>>;

    /// `conversations.history` for one conversation (top-level messages only).
    async fn conversations_history(
        &self,
        channel: &str,
        cursor: Option<String>,
    ) -> Result<Page<Message>>;

    /// `conversations.replies` for one thread, parent included.
    async fn conversations_replies(
        &self,
        channel: &str,
        thread_ts: &MessageTs,
        cursor: Option<String>,
    ) -> Result<Page<Message>>;
}

/// Common wrapper of every Web API response.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Extracts the continuation token.
///
/// A missing metadata wrapper, a missing `next_cursor` and an empty string all
/// mean "no more pages".
fn next_cursor(metadata: Option<ResponseMetadata>) -> Option<String> {
    metadata
        .and_then(|m| m.next_cursor)
        .filter(|c| !c.is_empty())
}

/// Parses a response body into a page of `items_key` entries.
///
/// # Errors
/// Returns `AppError::Api` when the envelope says `ok: false`, and
/// `AppError::JsonParse` when the body or its items cannot be decoded.
fn parse_page<T: DeserializeOwned>(method: &str, items_key: &str, body: &[u8]) -> Result<Page<T>> {
    let mut envelope: Envelope = serde_json::from_slice(body).map_err(AppError::json_parse)?;

    if !envelope.ok {
        let code = envelope.error.unwrap_or_else(|| "unknown_error".to_string());
        return Err(AppError::api(method, code));
    }

    let items = match envelope.rest.remove(items_key) {
        Some(value) => serde_json::from_value(value).map_err(AppError::json_parse)?,
        None => {
            tracing::debug!(method, items_key, "Response carries no items");
            Vec::new()
        }
    };

    Ok(Page::new(items, next_cursor(envelope.response_metadata)))
}

/// HTTP implementation of [`SlackApi`].
pub struct SlackClient {
    http: reqwest::Client,
    base_url: String,
    token: SecretString,
    page_limit: u32,
}

impl SlackClient {
    /// Creates a client for the Web API at `base_url`.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(base_url: &str, token: SecretString, page_limit: u32) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("slack-history-export/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::transport("Failed to build HTTP client", e))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            page_limit,
        })
    }

    /// Performs one paginated GET call.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        items_key: &str,
        mut query: Vec<(&str, String)>,
        cursor: Option<String>,
    ) -> Result<Page<T>> {
        query.push(("limit", self.page_limit.to_string()));
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }

        tracing::debug!(method, "Call Slack API");

        let response = self
            .http
            .get(format!("{}/{method}", self.base_url))
            .bearer_auth(self.token.expose_secret())
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::transport(format!("{method} request failed"), e))?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string();
            tracing::warn!(method, retry_after = %retry_after, "Rate limited by Slack");
            return Err(AppError::api(method, RATE_LIMITED));
        }

        if !status.is_success() {
            return Err(AppError::api(method, format!("http_{}", status.as_u16())));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::transport(format!("{method} response read failed"), e))?;

        parse_page(method, items_key, &body)
    }
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn users_list(&self, cursor: Option<String>) -> Result<Page<User>> {
        self.call("users.list", "members", Vec::new(), cursor).await
    }

    async fn conversations_list(&self, cursor: Option<String>) -> Result<Page<Conversation>> {
        let query = vec![("types", CONVERSATION_TYPES.to_string())];
        self.call("conversations.list", "channels", query, cursor)
            .await
    }

    async fn conversations_history(
        &self,
        channel: &str,
        cursor: Option<String>,
    ) -> Result<Page<Message>> {
        let query = vec![("channel", channel.to_string())];
        self.call("conversations.history", "messages", query, cursor)
            .await
    }

    async fn conversations_replies(
        &self,
        channel: &str,
        thread_ts: &MessageTs,
        cursor: Option<String>,
    ) -> Result<Page<Message>> {
        let query = vec![
            ("channel", channel.to_string()),
            ("ts", thread_ts.to_string()),
        ];
        self.call("conversations.replies", "messages", query, cursor)
            .await
    }
}
