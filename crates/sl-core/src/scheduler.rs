//! Periodic flush timer.

use sl_sink::WriteBehindSink;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

/// Background thread calling [`WriteBehindSink::flush_all`] every
/// interval until stopped.
///
/// Stopping waits for an in-progress flush to finish.
#[derive(Debug)]
pub struct FlushScheduler {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
    interval: Duration,
}

impl FlushScheduler {
    pub fn start(sink: Arc<WriteBehindSink>, interval: Duration) -> std::io::Result<Self> {
        let (stop, rx) = mpsc::channel::<()>();
        let thread = thread::Builder::new()
            .name("superlog-flush".to_string())
            .spawn(move || loop {
                match rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let saved = sink.flush_all();
                        if saved > 0 {
                            info!(count = saved, "logs saved");
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;
        debug!(interval_secs = interval.as_secs(), "flush timer started");

        Ok(Self {
            stop: Some(stop),
            thread: Some(thread),
            interval,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stop the timer and wait for the thread to exit.
    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        drop(self.stop.take());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
            debug!("flush timer stopped");
        }
    }
}

impl Drop for FlushScheduler {
    fn drop(&mut self) {
        self.halt();
    }
}
