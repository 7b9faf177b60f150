//! Age-based retention for persisted log files.
//!
//! Two independent sweeps walk the logs tree:
//! - **compress**: gzip files at least N days old into `<name>.gz` and
//!   remove the original
//! - **delete**: remove files at least N days old, optionally sparing
//!   compressed ones
//!
//! A threshold of 0 disables a sweep; a negative threshold is rejected.
//! Sweeps touch files only, never the sink's cache. A failure on one file
//! is logged and counted; the sweep continues with the next file.

use crate::error::RetentionError;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sl_common::COMPRESSED_SUFFIX;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

const SECS_PER_DAY: u64 = 86_400;

/// Which sweep a report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepKind {
    Compress,
    Delete,
}

impl SweepKind {
    fn as_str(&self) -> &'static str {
        match self {
            SweepKind::Compress => "compress",
            SweepKind::Delete => "delete",
        }
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub kind: SweepKind,
    /// Files compressed or deleted.
    pub affected: usize,
    /// Eligible files that could not be processed.
    pub failed: usize,
    /// The sweep was disabled by a zero threshold.
    pub disabled: bool,
}

impl SweepReport {
    fn new(kind: SweepKind) -> Self {
        Self {
            kind,
            affected: 0,
            failed: 0,
            disabled: false,
        }
    }

    fn disabled(kind: SweepKind) -> Self {
        Self {
            disabled: true,
            ..Self::new(kind)
        }
    }
}

/// Runs retention sweeps over one logs directory.
#[derive(Debug, Clone)]
pub struct RetentionManager {
    logs_dir: PathBuf,
}

impl RetentionManager {
    pub fn new(logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            logs_dir: logs_dir.into(),
        }
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// Gzip every uncompressed file at least `days` old.
    pub fn compress_older_than(&self, days: i64) -> Result<SweepReport, RetentionError> {
        let Some(min_age) = threshold(SweepKind::Compress, days)? else {
            return Ok(SweepReport::disabled(SweepKind::Compress));
        };
        let mut report = SweepReport::new(SweepKind::Compress);

        for path in self.eligible(min_age, |p| !is_compressed(p) && !is_partial(p))? {
            match compress_file(&path) {
                Ok(target) => {
                    debug!(file = %path.display(), target = %target.display(), "compressed");
                    report.affected += 1;
                }
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "compress failed");
                    report.failed += 1;
                }
            }
        }

        if report.affected > 0 {
            info!(count = report.affected, days, "compressed old logs");
        }
        Ok(report)
    }

    /// Delete every file at least `days` old. Compressed files are only
    /// included when `include_compressed` is set.
    pub fn delete_older_than(
        &self,
        days: i64,
        include_compressed: bool,
    ) -> Result<SweepReport, RetentionError> {
        let Some(min_age) = threshold(SweepKind::Delete, days)? else {
            return Ok(SweepReport::disabled(SweepKind::Delete));
        };
        let mut report = SweepReport::new(SweepKind::Delete);

        for path in self.eligible(min_age, |p| include_compressed || !is_compressed(p))? {
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!(file = %path.display(), "deleted");
                    report.affected += 1;
                }
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "delete failed");
                    report.failed += 1;
                }
            }
        }

        if report.affected > 0 {
            info!(count = report.affected, days, "deleted old logs");
        }
        Ok(report)
    }

    /// Files under the logs tree old enough and accepted by `filter`.
    ///
    /// Collected before any file is touched, so files created by the sweep
    /// itself are never revisited.
    fn eligible(
        &self,
        min_age: Duration,
        filter: impl Fn(&Path) -> bool,
    ) -> Result<Vec<PathBuf>, RetentionError> {
        let mut files = Vec::new();
        if !self.logs_dir.is_dir() {
            return Ok(files);
        }
        collect_files(&self.logs_dir, &mut files).map_err(|source| RetentionError::Io {
            path: self.logs_dir.clone(),
            source,
        })?;

        let now = SystemTime::now();
        files.retain(|path| {
            if !filter(path) {
                return false;
            }
            match fs::metadata(path).and_then(|m| m.modified()) {
                Ok(modified) => now.duration_since(modified).unwrap_or_default() >= min_age,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "cannot read modification time");
                    false
                }
            }
        });
        files.sort();
        Ok(files)
    }
}

/// Validate a day threshold. `None` disables the sweep.
fn threshold(kind: SweepKind, days: i64) -> Result<Option<Duration>, RetentionError> {
    match days {
        d if d < 0 => Err(RetentionError::InvalidThreshold {
            sweep: kind.as_str(),
            days,
        }),
        0 => Ok(None),
        d => Ok(Some(Duration::from_secs(d.unsigned_abs() * SECS_PER_DAY))),
    }
}

/// Regular files under `dir`. Symlinks are never followed, so a sweep
/// stays inside the logs tree.
fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_symlink() {
            debug!(path = %entry.path().display(), "skipping symlink");
        } else if file_type.is_dir() {
            collect_files(&entry.path(), files)?;
        } else if file_type.is_file() {
            files.push(entry.path());
        }
    }
    Ok(())
}

/// Whether the file name carries the compressed suffix, any case.
pub fn is_compressed(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(COMPRESSED_SUFFIX))
}

/// Leftover of an interrupted compression.
fn is_partial(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "tmp")
        && path
            .file_stem()
            .is_some_and(|stem| is_compressed(Path::new(stem)))
}

/// Gzip `path` to `<path>.gz` and remove the original.
///
/// The archive is written to `<path>.gz.tmp` and renamed into place; the
/// original is removed only after the rename.
fn compress_file(path: &Path) -> io::Result<PathBuf> {
    let mut target = path.as_os_str().to_owned();
    target.push(".");
    target.push(COMPRESSED_SUFFIX);
    let target = PathBuf::from(target);
    let mut partial = target.as_os_str().to_owned();
    partial.push(".tmp");
    let partial = PathBuf::from(partial);

    let result = (|| {
        let mut input = BufReader::new(File::open(path)?);
        let output = BufWriter::new(File::create(&partial)?);
        let mut encoder = GzEncoder::new(output, Compression::default());
        io::copy(&mut input, &mut encoder)?;
        encoder.finish()?.flush()?;
        fs::rename(&partial, &target)
    })();
    if let Err(e) = result {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }

    fs::remove_file(path)?;
    Ok(target)
}
