//! Validated runtime settings.
//!
//! [`Settings::from_document`] never fails. Each invalid value is replaced
//! by its default and reported once as a [`ConfigIssue`].

use crate::document::{ConfigDocument, Setting};
use crate::validate::ConfigIssue;
use sl_common::{DateFormat, FilenameTemplate, LiveTemplate};
use std::time::Duration;

/// Default flush interval in seconds.
pub const DEFAULT_SAVE_DELAY_SECS: u64 = 300;

/// Age thresholds for the retention sweeps, in days.
///
/// Thresholds are kept as read; a negative value is reported when the
/// sweep runs and the sweep is skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionSettings {
    pub gzip_after_days: i64,
    pub delete_after_days: i64,
    pub delete_even_gzipped: bool,
}

/// Command alert settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandAlertSettings {
    /// Lowercased command prefixes; `*` matches every command.
    pub prefixes: Vec<String>,
    pub message: Option<String>,
}

impl CommandAlertSettings {
    pub fn matches(&self, command: &str) -> bool {
        let command = command.to_lowercase();
        self.prefixes
            .iter()
            .any(|p| p == "*" || command.starts_with(p.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Zero means every line is written as soon as it is rendered.
    pub flush_interval: Duration,
    pub date_format: DateFormat,
    pub logs_format: FilenameTemplate,
    pub live_format: LiveTemplate,
    pub retention: RetentionSettings,
    pub ignore_npcs: bool,
    pub command_alert: CommandAlertSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_secs(DEFAULT_SAVE_DELAY_SECS),
            date_format: DateFormat::default(),
            logs_format: FilenameTemplate::default(),
            live_format: LiveTemplate::default(),
            retention: RetentionSettings::default(),
            ignore_npcs: true,
            command_alert: CommandAlertSettings::default(),
        }
    }
}

impl Settings {
    pub fn from_document(doc: &ConfigDocument) -> (Self, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let mut settings = Settings::default();

        match &doc.save_delay {
            Setting::Missing => {}
            Setting::Set(secs) if *secs >= 0 => {
                settings.flush_interval = Duration::from_secs(*secs as u64);
            }
            Setting::Set(secs) => issues.push(ConfigIssue::new(
                "save-delay",
                format!("must not be negative, got {secs}"),
                DEFAULT_SAVE_DELAY_SECS,
            )),
            Setting::Invalid(raw) => issues.push(ConfigIssue::new(
                "save-delay",
                format!("expected a number of seconds, got {raw}"),
                DEFAULT_SAVE_DELAY_SECS,
            )),
        }

        match &doc.date_format {
            Setting::Set(pattern) => match DateFormat::parse(pattern) {
                Ok(f) => settings.date_format = f,
                Err(e) => issues.push(ConfigIssue::new(
                    "date-format",
                    e.to_string(),
                    DateFormat::DEFAULT,
                )),
            },
            Setting::Missing => issues.push(ConfigIssue::new(
                "date-format",
                "not set",
                DateFormat::DEFAULT,
            )),
            Setting::Invalid(raw) => issues.push(ConfigIssue::new(
                "date-format",
                format!("expected a string, got {raw}"),
                DateFormat::DEFAULT,
            )),
        }

        match &doc.logs_format {
            Setting::Set(template) => match FilenameTemplate::parse(template) {
                Ok(t) => settings.logs_format = t,
                Err(e) => issues.push(ConfigIssue::new(
                    "logs-format",
                    e.to_string(),
                    FilenameTemplate::DEFAULT,
                )),
            },
            Setting::Missing => issues.push(ConfigIssue::new(
                "logs-format",
                "not set",
                FilenameTemplate::DEFAULT,
            )),
            Setting::Invalid(raw) => issues.push(ConfigIssue::new(
                "logs-format",
                format!("expected a string, got {raw}"),
                FilenameTemplate::DEFAULT,
            )),
        }

        match &doc.logs_live_format {
            Setting::Set(template) => match LiveTemplate::parse(template) {
                Ok(t) => settings.live_format = t,
                Err(e) => issues.push(ConfigIssue::new(
                    "logs-live-format",
                    e.to_string(),
                    LiveTemplate::DEFAULT,
                )),
            },
            Setting::Missing => issues.push(ConfigIssue::new(
                "logs-live-format",
                "not set",
                LiveTemplate::DEFAULT,
            )),
            Setting::Invalid(raw) => issues.push(ConfigIssue::new(
                "logs-live-format",
                format!("expected a string, got {raw}"),
                LiveTemplate::DEFAULT,
            )),
        }

        settings.retention.gzip_after_days =
            days_or_disabled("gzip-logs-after", &doc.gzip_logs_after, &mut issues);
        settings.retention.delete_after_days =
            days_or_disabled("delete-logs.after", &doc.delete_logs.after, &mut issues);
        settings.retention.delete_even_gzipped = flag(
            "delete-logs.even-gzipped",
            &doc.delete_logs.even_gzipped,
            false,
            &mut issues,
        );
        settings.ignore_npcs = flag("ignore-npcs", &doc.ignore_npcs, true, &mut issues);

        match &doc.commands_alert.list {
            Setting::Set(list) => {
                settings.command_alert.prefixes = list.iter().map(|c| c.to_lowercase()).collect();
            }
            Setting::Missing => {}
            Setting::Invalid(raw) => issues.push(ConfigIssue::new(
                "commands-alert.list",
                format!("expected a list of commands, got {raw}"),
                "[]",
            )),
        }
        settings.command_alert.message = doc.commands_alert.message.as_set().cloned();

        (settings, issues)
    }
}

fn days_or_disabled(field: &str, setting: &Setting<i64>, issues: &mut Vec<ConfigIssue>) -> i64 {
    match setting {
        Setting::Set(days) => *days,
        Setting::Missing => 0,
        Setting::Invalid(raw) => {
            issues.push(ConfigIssue::new(
                field,
                format!("expected a number of days, got {raw}"),
                0,
            ));
            0
        }
    }
}

fn flag(field: &str, setting: &Setting<bool>, default: bool, issues: &mut Vec<ConfigIssue>) -> bool {
    match setting {
        Setting::Set(v) => *v,
        Setting::Missing => default,
        Setting::Invalid(raw) => {
            issues.push(ConfigIssue::new(
                field,
                format!("expected true or false, got {raw}"),
                default,
            ));
            default
        }
    }
}
