//! Per-subject filtered export.

use crate::error::FilterError;
use crate::retention::is_compressed;
use sl_common::{sanitize_subject, LOGS_DIR, PLAYERS_DIR};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Directory (under the data directory) receiving filtered exports.
pub const FILTERED_DIR: &str = "logs_filtered";

/// A written export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterExport {
    pub path: PathBuf,
    pub lines: usize,
}

/// Collect the lines of `subject`'s plain log files that mention `event`.
///
/// Files are read in name order and must carry `extension` (the
/// persisted template's extension; `None` accepts any uncompressed file).
/// The result replaces `logs_filtered/filtered_<subject>_<event>.log`
/// under `data_dir`.
pub fn export_filtered(
    data_dir: &Path,
    subject: &str,
    event: &str,
    extension: Option<&str>,
) -> Result<FilterExport, FilterError> {
    let subject_dir = data_dir
        .join(LOGS_DIR)
        .join(PLAYERS_DIR)
        .join(sanitize_subject(subject));

    let mut files: Vec<PathBuf> = match fs::read_dir(&subject_dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file() && !is_compressed(p))
            .filter(|p| match extension {
                Some(ext) => p.extension().is_some_and(|e| e.eq_ignore_ascii_case(ext)),
                None => true,
            })
            .collect(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e.into()),
    };
    if files.is_empty() {
        return Err(FilterError::NoLogs {
            subject: subject.to_string(),
        });
    }
    files.sort();

    let mut matched = Vec::new();
    for file in &files {
        let contents = fs::read_to_string(file)?;
        matched.extend(
            contents
                .lines()
                .filter(|line| line.contains(event))
                .map(str::to_string),
        );
    }
    if matched.is_empty() {
        return Err(FilterError::NoMatches {
            subject: subject.to_string(),
            event: event.to_string(),
        });
    }

    let out_dir = data_dir.join(FILTERED_DIR);
    fs::create_dir_all(&out_dir)?;
    let path = out_dir.join(format!(
        "filtered_{}_{}.log",
        sanitize_subject(subject),
        sanitize_subject(event)
    ));
    let mut body = matched.join("\n");
    body.push('\n');
    fs::write(&path, body)?;

    info!(subject, event, count = matched.len(), file = %path.display(), "filtered export written");
    Ok(FilterExport {
        path,
        lines: matched.len(),
    })
}
