//! On-disk archive layout.
//!
//! ```text
//! <base>/<YYYYmmdd_HHMMSS>/
//!   users.json
//!   channels.json
//!   <conversation id>_<name>/
//!     messages.json            (combined)
//!     2024-01-31.json ...      (one per local calendar day)
//!     files/<file id>_<file name>
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, TimeZone};
use serde::Serialize;

use crate::domain::{AppError, Conversation, File, Message, Result, User};

const USERS_FILE: &str = "users.json";
const CONVERSATIONS_FILE: &str = "channels.json";
const MESSAGES_FILE: &str = "messages.json";
const UNDATED_FILE: &str = "undated.json";
const FILES_DIR: &str = "files";

/// Longest file name most filesystems accept, in bytes.
const MAX_COMPONENT_BYTES: usize = 255;
/// Longest suffix kept as an extension when a name is shortened.
const MAX_EXTENSION_BYTES: usize = 16;

/// Writes one export run below a timestamped root directory.
pub struct ExportWriter {
    root: PathBuf,
}

impl ExportWriter {
    /// Creates `<base>/<run_stamp>/`.
    ///
    /// # Errors
    /// Returns error if the directory cannot be created.
    pub fn create(base: &Path, run_stamp: &str) -> Result<Self> {
        let root = base.join(sanitize_component(run_stamp));
        fs::create_dir_all(&root).map_err(|e| {
            AppError::io(format!("Failed to create export directory: {}", root.display()), e)
        })?;

        tracing::debug!(path = %root.display(), "Export root created");

        Ok(Self { root })
    }

    /// Root directory of this run.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the users document.
    pub fn write_users(&self, users: &[User]) -> Result<PathBuf> {
        let path = self.root.join(USERS_FILE);
        write_json(&path, users)?;
        Ok(path)
    }

    /// Writes the conversations document.
    pub fn write_conversations(&self, conversations: &[Conversation]) -> Result<PathBuf> {
        let path = self.root.join(CONVERSATIONS_FILE);
        write_json(&path, conversations)?;
        Ok(path)
    }

    /// Directory holding one conversation's documents.
    #[must_use]
    pub fn conversation_dir(&self, conversation: &Conversation) -> PathBuf {
        self.root.join(sanitize_component(&conversation.dir_name()))
    }

    /// Writes a conversation's ordered messages, either as one document or
    /// one per calendar day of the local time zone.
    ///
    /// # Errors
    /// Returns error if a directory or document cannot be written.
    pub fn write_messages(
        &self,
        conversation: &Conversation,
        messages: &[Message],
        split_by_day: bool,
    ) -> Result<Vec<PathBuf>> {
        self.write_messages_in(conversation, messages, split_by_day, &Local)
    }

    /// [`Self::write_messages`] with an explicit time zone for day boundaries.
    pub fn write_messages_in<Tz: TimeZone>(
        &self,
        conversation: &Conversation,
        messages: &[Message],
        split_by_day: bool,
        tz: &Tz,
    ) -> Result<Vec<PathBuf>> {
        let dir = self.conversation_dir(conversation);
        fs::create_dir_all(&dir).map_err(|e| {
            AppError::io(format!("Failed to create directory: {}", dir.display()), e)
        })?;

        if !split_by_day {
            let path = dir.join(MESSAGES_FILE);
            write_json(&path, messages)?;
            return Ok(vec![path]);
        }

        let mut written = Vec::new();
        for (day, day_messages) in group_by_day(messages, tz) {
            let name = day.map_or_else(
                || UNDATED_FILE.to_string(),
                |d| format!("{}.json", d.format("%Y-%m-%d")),
            );
            let path = dir.join(name);
            write_json(&path, &day_messages)?;
            written.push(path);
        }

        tracing::debug!(
            conversation = %conversation.id,
            documents = written.len(),
            "Messages written"
        );

        Ok(written)
    }

    /// Writes a downloaded attachment as `files/{id}_{name}`.
    ///
    /// # Errors
    /// Returns error if the file cannot be written.
    pub fn write_file(&self, conversation: &Conversation, file: &File, bytes: &[u8]) -> Result<PathBuf> {
        let dir = self.conversation_dir(conversation).join(FILES_DIR);
        fs::create_dir_all(&dir).map_err(|e| {
            AppError::io(format!("Failed to create directory: {}", dir.display()), e)
        })?;

        let path = dir.join(sanitize_component(&file.archive_name()));
        fs::write(&path, bytes)
            .map_err(|e| AppError::io(format!("Failed to write file: {}", path.display()), e))?;

        Ok(path)
    }
}

/// Groups ordered messages by the calendar date of their timestamp in `tz`.
///
/// Order within a day is the input order. Timestamps outside the
/// representable range land under `None`.
pub fn group_by_day<'m, Tz: TimeZone>(
    messages: &'m [Message],
    tz: &Tz,
) -> BTreeMap<Option<NaiveDate>, Vec<&'m Message>> {
    let mut days: BTreeMap<Option<NaiveDate>, Vec<&Message>> = BTreeMap::new();
    for message in messages {
        days.entry(message.ts.date_in(tz)).or_default().push(message);
    }
    days
}

/// Makes a name safe to use as a single path component.
#[must_use]
pub fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.trim() {
        "" | "." | ".." => "_".to_string(),
        _ => fit_length(cleaned),
    }
}

/// Shortens `name` to [`MAX_COMPONENT_BYTES`], cutting the stem on a char
/// boundary and keeping a short extension.
fn fit_length(name: String) -> String {
    if name.len() <= MAX_COMPONENT_BYTES {
        return name;
    }

    let extension = name
        .rfind('.')
        .map(|i| &name[i..])
        .filter(|ext| ext.len() > 1 && ext.len() <= MAX_EXTENSION_BYTES)
        .unwrap_or("");
    let stem = &name[..name.len() - extension.len()];
    let budget = MAX_COMPONENT_BYTES - extension.len();

    let cut = stem
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take_while(|&end| end <= budget)
        .last()
        .unwrap_or(0);

    format!("{}{extension}", &stem[..cut])
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_vec_pretty(value).map_err(AppError::json_parse)?;
    fs::write(path, content)
        .map_err(|e| AppError::io(format!("Failed to write {}", path.display()), e))
}
