//! Write-behind sink for rendered log lines.
//!
//! Lines are buffered per [`FileKey`] and written in batches by
//! [`WriteBehindSink::flush_all`]. With a zero flush interval every line is
//! written straight through instead.
//!
//! # Locking
//!
//! One mutex guards the cache. An append and a full flush pass are
//! mutually atomic: the flush holds the lock for every file it writes, and
//! immediate writes take the same lock. Within one key, lines reach the
//! file in the order their appends acquired the lock.
//!
//! # Delivery
//!
//! A key whose write fails keeps its lines for the next flush. Nothing is
//! dropped on a transient I/O error; a crash before a flush loses whatever
//! was buffered.

use crate::error::SinkError;
use sl_common::{DateFormat, FileKey, RenderedLog};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

type Cache = HashMap<FileKey, Vec<String>>;

/// Buffered, batched writer of persisted log lines.
#[derive(Debug)]
pub struct WriteBehindSink {
    logs_dir: PathBuf,
    date_format: DateFormat,
    immediate: bool,
    cache: Mutex<Cache>,
}

impl WriteBehindSink {
    /// Create a sink writing under `logs_dir`.
    ///
    /// A zero `flush_interval` disables buffering.
    pub fn new(logs_dir: impl Into<PathBuf>, date_format: DateFormat, flush_interval: Duration) -> Self {
        Self {
            logs_dir: logs_dir.into(),
            date_format,
            immediate: flush_interval.is_zero(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    pub fn is_immediate(&self) -> bool {
        self.immediate
    }

    /// Absolute path of the file behind `key`.
    pub fn path_for(&self, key: &FileKey) -> PathBuf {
        self.logs_dir.join(key.relative_path())
    }

    /// Queue a rendered log, or write it now in immediate mode.
    ///
    /// Only immediate mode can fail; a failed immediate write is not
    /// buffered.
    pub fn append(&self, log: &RenderedLog) -> Result<(), SinkError> {
        let line = log.persisted_line(&self.date_format);
        let mut cache = self.lock();

        if self.immediate {
            let path = self.path_for(&log.target_file_key);
            return write_lines(&path, std::slice::from_ref(&line))
                .map_err(|source| SinkError::Io { path, source });
        }

        cache
            .entry(log.target_file_key.clone())
            .or_default()
            .push(line);
        Ok(())
    }

    /// Write every pending sequence to its file.
    ///
    /// Returns the number of files written. Keys that were already empty
    /// are dropped from the cache; keys that failed keep their lines.
    pub fn flush_all(&self) -> usize {
        let mut cache = self.lock();
        let mut flushed = 0;

        cache.retain(|key, lines| {
            if lines.is_empty() {
                return false;
            }
            let path = self.path_for(key);
            match write_lines(&path, lines) {
                Ok(()) => {
                    debug!(file = %path.display(), count = lines.len(), "flushed");
                    lines.clear();
                    flushed += 1;
                }
                Err(e) => {
                    warn!(file = %path.display(), count = lines.len(), error = %e, "flush failed, keeping lines");
                }
            }
            true
        });

        flushed
    }

    /// Lines waiting for the next flush.
    pub fn pending_lines(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    /// Keys currently tracked by the cache, including cleared ones.
    pub fn tracked_keys(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Cache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Append `lines` to `path`, creating the file and its parents.
///
/// The handle is flushed and closed before returning. A failed batch
/// leaves the file at its previous length, so a retry writes each line
/// once.
fn write_lines(path: &Path, lines: &[String]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    truncate_on_error(&file, |file| {
        let mut writer = BufWriter::new(file);
        for line in lines {
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    })
}

/// Run `write` against `file`, cutting the file back to its starting
/// length if it fails.
fn truncate_on_error(
    file: &File,
    write: impl FnOnce(&File) -> io::Result<()>,
) -> io::Result<()> {
    let start = file.metadata()?.len();
    write(file).map_err(|e| {
        if let Err(undo) = file.set_len(start) {
            warn!(len = start, error = %undo, "could not truncate partial write");
        }
        e
    })
}
