//! Rendered log records and the keys of the files they land in.

use crate::event::EventCategory;
use crate::template::{DateFormat, FilenameTemplate, FORBIDDEN_FILENAME_CHARS};
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Identifies the file a rendered line is appended to.
///
/// Two logs with equal keys always share a buffer and a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileKey {
    /// Subject directory under `players/`, already sanitized.
    pub subject: Option<String>,
    pub file_name: String,
}

impl FileKey {
    pub fn derive(
        template: &FilenameTemplate,
        event_type: &str,
        category: EventCategory,
        subject: Option<&str>,
        date: NaiveDate,
    ) -> Self {
        Self {
            subject: subject.map(sanitize_subject),
            file_name: template.render(event_type, category.file_type(), date),
        }
    }

    /// Path relative to the logs directory.
    pub fn relative_path(&self) -> PathBuf {
        match &self.subject {
            Some(subject) => PathBuf::from(crate::PLAYERS_DIR)
                .join(subject)
                .join(&self.file_name),
            None => PathBuf::from(&self.file_name),
        }
    }
}

/// Make a subject key safe to use as a single directory name.
pub fn sanitize_subject(subject: &str) -> String {
    let cleaned: String = subject
        .chars()
        .map(|c| if FORBIDDEN_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// One event that passed its rule, ready for persistence and live fanout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedLog {
    pub timestamp: DateTime<Local>,
    pub event_type: String,
    /// Primary actor, used for live routing and the per-subject directory.
    pub subject_key: Option<String>,
    pub message: String,
    #[serde(default)]
    pub cancelled: bool,
    pub target_file_key: FileKey,
}

impl RenderedLog {
    /// The line written to disk, without trailing newline.
    ///
    /// `[<time>][<EventType>][Cancelled]: <message>`
    pub fn persisted_line(&self, date_format: &DateFormat) -> String {
        format!(
            "[{}][{}]{}: {}",
            date_format.format(&self.timestamp),
            self.event_type,
            if self.cancelled { "[Cancelled]" } else { "" },
            self.message
        )
    }
}
