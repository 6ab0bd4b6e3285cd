//! Export configuration.
//!
//! Every knob the exporter recognizes: credential selection, per-call delay,
//! page size, download timeouts, export root and chunking. Values are loaded
//! once and handed to each component at construction.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{AppError, Result};

/// Environment variable overriding `auth.user_token`.
pub const USER_TOKEN_ENV: &str = "SLACK_USER_TOKEN";
/// Environment variable overriding `auth.bot_token`.
pub const BOT_TOKEN_ENV: &str = "SLACK_BOT_TOKEN";

/// Credential configuration.
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// Use the user token (wider scopes) instead of the bot token.
    #[serde(default = "default_use_user_token")]
    pub use_user_token: bool,

    /// User OAuth token (`xoxp-...`).
    #[serde(default)]
    pub user_token: Option<SecretString>,

    /// Bot OAuth token (`xoxb-...`).
    #[serde(default)]
    pub bot_token: Option<SecretString>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            use_user_token: default_use_user_token(),
            user_token: None,
            bot_token: None,
        }
    }
}

const fn default_use_user_token() -> bool {
    true
}

/// Remote API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the Web API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Wait after every API call or file download, in milliseconds.
    /// Check the per-method rate limits before lowering it.
    #[serde(default = "default_access_wait_ms")]
    pub access_wait_ms: u64,

    /// Page size requested from paginated endpoints.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    /// Optional ceiling on pages per listing. Unbounded when unset.
    #[serde(default)]
    pub max_pages: Option<usize>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_wait_ms: default_access_wait_ms(),
            page_limit: default_page_limit(),
            max_pages: None,
        }
    }
}

fn default_base_url() -> String {
    "https://slack.com/api".to_string()
}

const fn default_access_wait_ms() -> u64 {
    1200
}

const fn default_page_limit() -> u32 {
    200
}

/// File download configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

const fn default_connect_timeout_ms() -> u64 {
    3050
}

const fn default_read_timeout_ms() -> u64 {
    60_000
}

/// Archive output configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Root directory; each run creates a timestamped subdirectory.
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,

    /// Write one messages document per local calendar day instead of one per conversation.
    #[serde(default = "default_split_by_day")]
    pub split_by_day: bool,

    /// Abort the run on the first failed call instead of keeping partial results.
    #[serde(default)]
    pub fail_fast: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            split_by_day: default_split_by_day(),
            fail_fast: false,
        }
    }
}

fn default_base_path() -> PathBuf {
    PathBuf::from("./export")
}

const fn default_split_by_day() -> bool {
    true
}

/// Complete application configuration.
#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

impl AppConfig {
    /// Get the default configuration directory.
    #[must_use]
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("slack-history-export")
    }

    /// Get the default config file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Delay applied after every remote call.
    #[must_use]
    pub const fn access_wait(&self) -> Duration {
        Duration::from_millis(self.api.access_wait_ms)
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.download.connect_timeout_ms)
    }

    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.download.read_timeout_ms)
    }

    /// Replace configured tokens with values from the given lookup (normally the environment).
    pub fn apply_token_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup(USER_TOKEN_ENV).filter(|t| !t.is_empty()) {
            self.auth.user_token = Some(SecretString::new(token));
        }
        if let Some(token) = lookup(BOT_TOKEN_ENV).filter(|t| !t.is_empty()) {
            self.auth.bot_token = Some(SecretString::new(token));
        }
    }

    /// Name of the selected credential, for logging.
    #[must_use]
    pub const fn credential_label(&self) -> &'static str {
        if self.auth.use_user_token {
            "user token"
        } else {
            "bot token"
        }
    }

    /// The selected bearer token.
    ///
    /// # Errors
    /// Returns error if the selected token is not configured.
    pub fn credential(&self) -> Result<SecretString> {
        let (token, env) = if self.auth.use_user_token {
            (self.auth.user_token.as_ref(), USER_TOKEN_ENV)
        } else {
            (self.auth.bot_token.as_ref(), BOT_TOKEN_ENV)
        };

        token
            .filter(|t| !t.expose_secret().is_empty())
            .map(|t| SecretString::new(t.expose_secret().clone()))
            .ok_or_else(|| AppError::Config {
                message: format!(
                    "No {} configured. Set {env} or add it to the [auth] section.",
                    self.credential_label()
                ),
            })
    }
}
