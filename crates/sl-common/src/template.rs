//! Validated configuration templates.
//!
//! Templates are checked once, when configuration is loaded. A template
//! that fails validation is replaced by its default by the caller; these
//! types only guarantee that whatever they hold is usable.

use chrono::format::{Item, StrftimeItems};
use chrono::{Datelike, NaiveDate};
use std::fmt;
use thiserror::Error;

/// Characters that may not appear in a persisted filename template.
pub const FORBIDDEN_FILENAME_CHARS: &[char] = &[
    '/', '\n', '\r', '\t', '\0', '\x0c', '`', '?', '*', '\\', '<', '>', '|', '"', ':',
];

/// Errors from template validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template is empty")]
    Empty,

    #[error("template contains forbidden character {0:?}")]
    ForbiddenChar(char),

    #[error("invalid date format: {0}")]
    InvalidDateFormat(String),
}

/// Persisted file naming: `{EVENT} {TYPE} {DAY} {MONTH} {YEAR}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameTemplate(String);

impl FilenameTemplate {
    pub const DEFAULT: &'static str = "{DAY}-{MONTH}-{YEAR}_{TYPE}.log";

    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        if template.trim().is_empty() {
            return Err(TemplateError::Empty);
        }
        if let Some(c) = template.chars().find(|c| FORBIDDEN_FILENAME_CHARS.contains(c)) {
            return Err(TemplateError::ForbiddenChar(c));
        }
        Ok(Self(template.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extension of rendered file names (`log` for the default template).
    pub fn extension(&self) -> Option<&str> {
        let (_, ext) = self.0.rsplit_once('.')?;
        (!ext.is_empty() && !ext.contains('{')).then_some(ext)
    }

    /// Render the file name. Day and month are two digits, year is the
    /// two-digit year.
    pub fn render(&self, event_type: &str, file_type: &str, date: NaiveDate) -> String {
        self.0
            .replace("{EVENT}", event_type)
            .replace("{TYPE}", file_type)
            .replace("{DAY}", &format!("{:02}", date.day()))
            .replace("{MONTH}", &format!("{:02}", date.month()))
            .replace("{YEAR}", &format!("{:02}", date.year().rem_euclid(100)))
    }
}

impl Default for FilenameTemplate {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for FilenameTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Live line format: `{TIME} {EVENT} {LOG}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveTemplate(String);

impl LiveTemplate {
    pub const DEFAULT: &'static str = "[{TIME}][{EVENT}] {LOG}";

    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        if template.is_empty() {
            return Err(TemplateError::Empty);
        }
        Ok(Self(template.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn render(&self, time: &str, event_type: &str, message: &str) -> String {
        self.0
            .replace("{TIME}", time)
            .replace("{EVENT}", event_type)
            .replace("{LOG}", message)
    }
}

impl Default for LiveTemplate {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

/// strftime pattern used for the time column of persisted lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat(String);

impl DateFormat {
    pub const DEFAULT: &'static str = "%H:%M:%S";

    pub fn parse(pattern: &str) -> Result<Self, TemplateError> {
        if pattern.is_empty() {
            return Err(TemplateError::Empty);
        }
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(TemplateError::InvalidDateFormat(pattern.to_string()));
        }
        Ok(Self(pattern.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn format<Tz>(&self, time: &chrono::DateTime<Tz>) -> String
    where
        Tz: chrono::TimeZone,
        Tz::Offset: fmt::Display,
    {
        time.format(&self.0).to_string()
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_filename_render_default() {
        let t = FilenameTemplate::default();
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(t.render("BlockBreakEvent", "BlockEvents", date), "07-03-24_BlockEvents.log");
        assert_eq!(t.extension(), Some("log"));
    }

    #[test]
    fn test_filename_render_event() {
        let t = FilenameTemplate::parse("{EVENT}_{YEAR}{MONTH}.txt").unwrap();
        let date = NaiveDate::from_ymd_opt(2009, 12, 31).unwrap();
        assert_eq!(t.render("PlayerJoinEvent", "PlayerEvents", date), "PlayerJoinEvent_0912.txt");
    }

    #[test]
    fn test_filename_rejects_forbidden() {
        assert_eq!(
            FilenameTemplate::parse("../{TYPE}.log"),
            Err(TemplateError::ForbiddenChar('/'))
        );
        assert_eq!(
            FilenameTemplate::parse("{TYPE}:log"),
            Err(TemplateError::ForbiddenChar(':'))
        );
        assert_eq!(FilenameTemplate::parse("  "), Err(TemplateError::Empty));
    }

    #[test]
    fn test_extension_absent() {
        assert_eq!(FilenameTemplate::parse("{TYPE}").unwrap().extension(), None);
        assert_eq!(FilenameTemplate::parse("{DAY}.{TYPE}").unwrap().extension(), None);
    }

    #[test]
    fn test_live_render() {
        let t = LiveTemplate::default();
        assert_eq!(
            t.render("12:00:01", "PlayerJoinEvent", "Alice joined"),
            "[12:00:01][PlayerJoinEvent] Alice joined"
        );
        assert!(LiveTemplate::parse("").is_err());
    }

    #[test]
    fn test_date_format_validation() {
        assert!(DateFormat::parse("%d/%m %H:%M").is_ok());
        assert!(matches!(
            DateFormat::parse("%Q"),
            Err(TemplateError::InvalidDateFormat(_))
        ));
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(DateFormat::default().format(&t), "03:04:05");
    }
}
