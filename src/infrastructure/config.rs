//! Configuration file management.
//!
//! Handles loading the TOML configuration and writing the default template.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{AppConfig, AppError, Result};

/// Default configuration file content.
pub const DEFAULT_CONFIG: &str = r#"# Slack History Export Configuration
# Auto-generated - edit as needed

[auth]
# Use the user token (true) or the bot token (false).
use_user_token = true

# Tokens can also be provided through SLACK_USER_TOKEN / SLACK_BOT_TOKEN,
# which take precedence over the values below.
# user_token = "xoxp-..."
# bot_token = "xoxb-..."

[api]
base_url = "https://slack.com/api"

# Wait after every API call or file download, in milliseconds.
# Check the Slack API rate limits before lowering it.
access_wait_ms = 1200

# Items requested per page.
page_limit = 200

# Optional ceiling on pages per listing (unbounded when unset).
# max_pages = 10000

[download]
connect_timeout_ms = 3050
read_timeout_ms = 60000

[export]
base_path = "./export"

# One messages document per local calendar day (true) or one per conversation (false).
split_by_day = true

# Abort on the first failed call instead of keeping partial results.
fail_fast = false
"#;

/// Load configuration from `path`, or from the default location.
///
/// An explicit path must exist; a missing default file yields defaults.
///
/// # Errors
/// Returns error if the file cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(AppError::Config {
                    message: format!("Config file not found: {}", path.display()),
                });
            }
            load_config_from_file(path)
        }
        None => {
            let default_path = AppConfig::default_config_path();
            if default_path.exists() {
                load_config_from_file(&default_path)
            } else {
                tracing::debug!(path = %default_path.display(), "No config file, using defaults");
                Ok(AppConfig::default())
            }
        }
    }
}

/// Load configuration from a specific file.
///
/// # Errors
/// Returns error if file cannot be read or parsed.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config file: {}", path.display()), e))?;

    let config = toml::from_str(&content).map_err(|e| AppError::Config {
        message: format!("Failed to parse config file: {e}"),
    })?;

    tracing::debug!(path = %path.display(), "Configuration loaded");

    Ok(config)
}

/// Create the default configuration file if it doesn't exist.
///
/// Returns the path and whether it was created.
///
/// # Errors
/// Returns error if file cannot be created.
pub fn ensure_config_exists(path: Option<&Path>) -> Result<(PathBuf, bool)> {
    let config_path = path.map_or_else(AppConfig::default_config_path, Path::to_path_buf);

    if config_path.exists() {
        return Ok((config_path, false));
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create config directory", e))?;
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .map_err(|e| AppError::io("Failed to create default config", e))?;

    tracing::info!(path = %config_path.display(), "Created default configuration");

    Ok((config_path, true))
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config: AppConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.api.access_wait_ms, 1200);
        assert_eq!(config.api.page_limit, 200);
        assert_eq!(config.download.connect_timeout_ms, 3050);
        assert!(config.export.split_by_day);
        assert!(config.auth.user_token.is_none());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [auth]
            use_user_token = false
            bot_token = "xoxb-123"

            [export]
            base_path = "/tmp/slack"
            "#,
        )
        .unwrap();

        assert!(!config.auth.use_user_token);
        assert_eq!(config.credential().unwrap().expose_secret(), "xoxb-123");
        assert_eq!(config.export.base_path, PathBuf::from("/tmp/slack"));
        assert_eq!(config.api.access_wait_ms, 1200);
    }

    #[test]
    fn test_ensure_and_load() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nested/config.toml");

        let (path, created) = ensure_config_exists(Some(&config_path)).unwrap();
        assert!(created);
        assert_eq!(path, config_path);

        let (_, created) = ensure_config_exists(Some(&config_path)).unwrap();
        assert!(!created);

        let loaded = load_config(Some(&config_path)).unwrap();
        assert_eq!(loaded.api.base_url, "https://slack.com/api");
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let dir = tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, AppError::Config { .. }));
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[api]\naccess_wait_ms = \"soon\"").unwrap();

        let err = load_config_from_file(&path).unwrap_err();
        assert!(matches!(err, AppError::Config { .. }));
    }
}
