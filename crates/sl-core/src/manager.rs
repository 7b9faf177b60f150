//! Log manager: owns the pipeline and its control operations.
//!
//! Event flow:
//!
//! ```text
//! HostEvent ─► RuleSet lookup ─► EventRenderer ─┬─► WriteBehindSink (buffered)
//!                                               └─► LiveFanout (subject subscribers)
//! ```
//!
//! The rule set, renderer and sink live together in one pipeline behind a
//! read/write lock. Producers hold the read side for the length of one
//! event; reloads and shutdown take the write side, so a final flush can
//! never miss a line appended to the pipeline it retires.
//!
//! Reload and shutdown order: stop the flush timer, flush everything,
//! then drop or swap the rules.

use crate::scheduler::FlushScheduler;
use chrono::{DateTime, Local};
use sl_common::{EventTypeRegistry, HostEvent, RenderedLog, LOGS_DIR};
use sl_config::{RuleDocument, Settings};
use sl_rules::{
    CompileReport, EventRenderer, RenderOptions, RenderOutcome, RuleCompiler, RuleSet,
};
use sl_sink::{
    LiveFanout, LiveSubscriber, RetentionError, RetentionManager, SubscriberId, SweepReport,
    WriteBehindSink,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

/// Trace one pipeline step: `info` with a `debug` marker while debug mode
/// is on, plain `debug` otherwise.
macro_rules! step {
    ($mgr:expr, $($arg:tt)+) => {
        if $mgr.debug.load(Ordering::Relaxed) {
            tracing::info!(debug = true, $($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

/// What happened to one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Logging is switched off.
    Disabled,
    /// No rule is registered for the event type.
    Unregistered,
    Outcome(RenderOutcome),
}

impl Dispatch {
    pub fn rendered(&self) -> Option<&RenderedLog> {
        match self {
            Dispatch::Outcome(outcome) => outcome.rendered(),
            _ => None,
        }
    }
}

/// Results of one retention run. `None` means the sweep did not run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionSummary {
    pub compress: Option<SweepReport>,
    pub delete: Option<SweepReport>,
}

struct Pipeline {
    settings: Settings,
    rules: RuleSet,
    renderer: EventRenderer,
    sink: Arc<WriteBehindSink>,
}

impl Pipeline {
    fn build(
        registry: &EventTypeRegistry,
        logs_dir: &Path,
        settings: Settings,
        doc: &RuleDocument,
    ) -> (Self, CompileReport) {
        let (rules, report) = RuleCompiler::new(registry).compile_all(doc);
        let renderer = EventRenderer::new(RenderOptions {
            ignore_npcs: settings.ignore_npcs,
            filename: settings.logs_format.clone(),
        });
        let sink = Arc::new(WriteBehindSink::new(
            logs_dir,
            settings.date_format.clone(),
            settings.flush_interval,
        ));
        (
            Self {
                settings,
                rules,
                renderer,
                sink,
            },
            report,
        )
    }
}

pub struct LogManager {
    registry: EventTypeRegistry,
    logs_dir: PathBuf,
    pipeline: RwLock<Pipeline>,
    live: LiveFanout,
    scheduler: Mutex<Option<FlushScheduler>>,
    enabled: AtomicBool,
    debug: AtomicBool,
}

impl LogManager {
    /// Build a manager writing under `<data_dir>/logs`. Rules are compiled
    /// now; nothing runs until [`LogManager::start`].
    pub fn new(
        registry: EventTypeRegistry,
        data_dir: &Path,
        settings: Settings,
        rules: &RuleDocument,
    ) -> (Self, CompileReport) {
        let logs_dir = data_dir.join(LOGS_DIR);
        let (pipeline, report) = Pipeline::build(&registry, &logs_dir, settings, rules);
        info!(
            registered = report.registered,
            skipped = report.skipped.len(),
            "rules loaded"
        );
        let manager = Self {
            registry,
            logs_dir,
            pipeline: RwLock::new(pipeline),
            live: LiveFanout::new(),
            scheduler: Mutex::new(None),
            enabled: AtomicBool::new(true),
            debug: AtomicBool::new(false),
        };
        (manager, report)
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// Run retention, then start the flush timer.
    ///
    /// No timer runs when the flush interval is zero or no rule is
    /// registered.
    pub fn start(&self) -> std::io::Result<()> {
        self.run_retention();
        let pipeline = self.read();
        self.start_timer(&pipeline)
    }

    fn start_timer(&self, pipeline: &Pipeline) -> std::io::Result<()> {
        if pipeline.rules.is_empty() {
            info!("nothing to log");
            return Ok(());
        }
        if pipeline.sink.is_immediate() {
            return Ok(());
        }
        let scheduler =
            FlushScheduler::start(Arc::clone(&pipeline.sink), pipeline.settings.flush_interval)?;
        if let Some(old) = self.scheduler().replace(scheduler) {
            old.stop();
        }
        Ok(())
    }

    fn stop_timer(&self) {
        if let Some(scheduler) = self.scheduler().take() {
            scheduler.stop();
        }
    }

    /// Process one host event.
    ///
    /// Never fails: render errors and write errors are logged and
    /// reported in the returned [`Dispatch`].
    pub fn handle(&self, event: &HostEvent) -> Dispatch {
        self.handle_at(event, Local::now())
    }

    /// [`LogManager::handle`] with an explicit render time.
    pub fn handle_at(&self, event: &HostEvent, now: DateTime<Local>) -> Dispatch {
        if !self.is_enabled() {
            return Dispatch::Disabled;
        }
        let pipeline = self.read();
        let Some(rule) = pipeline.rules.get(&event.event_type) else {
            return Dispatch::Unregistered;
        };

        let outcome = pipeline.renderer.render(event, rule, now);
        match &outcome {
            RenderOutcome::Rendered(log) => {
                step!(self, event_type = %log.event_type, file = %log.target_file_key.file_name, "rendered");
                if let Err(e) = pipeline.sink.append(log) {
                    warn!(event_type = %log.event_type, category = %e.category(), "{}", e);
                }
                self.fan_out(&pipeline.settings, log);
            }
            RenderOutcome::Suppressed(reason) => {
                step!(self, event_type = %event.event_type, reason = %reason, "suppressed");
            }
            RenderOutcome::Failed(e) => {
                warn!(event_type = %event.event_type, category = %e.category(), "{}", e);
            }
        }
        Dispatch::Outcome(outcome)
    }

    fn fan_out(&self, settings: &Settings, log: &RenderedLog) {
        let Some(subject) = log.subject_key.as_deref() else {
            return;
        };
        if !self.live.has_subscribers(subject) {
            return;
        }
        let time = log.timestamp.format("%H:%M:%S").to_string();
        let line = settings
            .live_format
            .render(&time, &log.event_type, &log.message);
        let delivered = self.live.publish(subject, &line);
        step!(self, subject, delivered, "live line sent");
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        info!(enabled, "logging toggled");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_debug(&self, debug: bool) {
        self.debug.store(debug, Ordering::Relaxed);
    }

    pub fn is_debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    /// Flush every buffered line now. Returns the number of files written.
    pub fn flush_all_now(&self) -> usize {
        let saved = self.read().sink.flush_all();
        if saved > 0 {
            info!(count = saved, "logs saved");
        }
        saved
    }

    pub fn pending_lines(&self) -> usize {
        self.read().sink.pending_lines()
    }

    pub fn subscribe_live(&self, subject: &str, subscriber: Arc<dyn LiveSubscriber>) -> SubscriberId {
        self.live.subscribe(subject, subscriber)
    }

    pub fn unsubscribe_live(&self, subject: &str, id: SubscriberId) -> bool {
        self.live.unsubscribe(subject, id)
    }

    /// Replace the rules, keeping the current settings.
    pub fn reload_rules(&self, doc: &RuleDocument) -> CompileReport {
        let settings = self.read().settings.clone();
        self.reload(settings, doc)
    }

    /// Replace settings and rules.
    ///
    /// The old pipeline is fully flushed before it is dropped. Retention
    /// runs against the new settings before the timer restarts.
    pub fn reload(&self, settings: Settings, doc: &RuleDocument) -> CompileReport {
        self.stop_timer();
        let report = {
            let mut pipeline = self.write();
            let saved = pipeline.sink.flush_all();
            if saved > 0 {
                info!(count = saved, "logs saved before reload");
            }
            let (next, report) = Pipeline::build(&self.registry, &self.logs_dir, settings, doc);
            *pipeline = next;
            report
        };
        info!(
            registered = report.registered,
            skipped = report.skipped.len(),
            "rules reloaded"
        );

        self.run_retention();
        if let Err(e) = self.start_timer(&self.read()) {
            warn!(error = %e, "flush timer not restarted");
        }
        report
    }

    /// Stop the timer, flush, then drop every registered rule.
    ///
    /// Returns the number of files written by the final flush.
    pub fn shutdown(&self) -> usize {
        self.stop_timer();
        let mut pipeline = self.write();
        let saved = pipeline.sink.flush_all();
        pipeline.rules = RuleSet::new();
        info!(count = saved, "log manager stopped");
        saved
    }

    /// Alert text for a player running `command`, if the command matches
    /// one of the configured prefixes.
    pub fn command_alert(&self, player: &str, command: &str) -> Option<String> {
        let pipeline = self.read();
        let alert = &pipeline.settings.command_alert;
        if !alert.matches(command) {
            return None;
        }
        let message = alert.message.as_deref()?;
        Some(message.replace("{PLAYER}", player).replace("{COMMAND}", command))
    }

    /// Run the compress sweep, then the delete sweep.
    pub fn run_retention(&self) -> RetentionSummary {
        let retention = self.read().settings.retention.clone();
        let manager = RetentionManager::new(&self.logs_dir);

        let compress = report_sweep(manager.compress_older_than(retention.gzip_after_days));
        let delete = report_sweep(
            manager.delete_older_than(retention.delete_after_days, retention.delete_even_gzipped),
        );
        RetentionSummary { compress, delete }
    }

    fn read(&self) -> RwLockReadGuard<'_, Pipeline> {
        self.pipeline.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Pipeline> {
        self.pipeline.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn scheduler(&self) -> MutexGuard<'_, Option<FlushScheduler>> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn report_sweep(result: Result<SweepReport, RetentionError>) -> Option<SweepReport> {
    match result {
        Ok(report) => Some(report),
        Err(e) => {
            warn!(category = %e.category(), "{}", e);
            None
        }
    }
}

impl Drop for LogManager {
    fn drop(&mut self) {
        self.stop_timer();
        let saved = self.read().sink.flush_all();
        if saved > 0 {
            info!(count = saved, "logs saved on drop");
        }
    }
}

impl std::fmt::Debug for LogManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogManager")
            .field("logs_dir", &self.logs_dir)
            .field("rules", &self.read().rules.len())
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sl_common::{Actor, AttributeValue, EventCategory, EventTypeDescriptor, Location};
    use sl_config::CommandAlertSettings;
    use sl_sink::ChannelSubscriber;
    use std::fs;
    use std::sync::mpsc::channel;
    use std::time::Duration;
    use tempfile::tempdir;

    fn registry() -> EventTypeRegistry {
        EventTypeRegistry::from(vec![
            EventTypeDescriptor::new("BlockBreakEvent", EventCategory::Block).cancellable(),
            EventTypeDescriptor::new("PlayerJoinEvent", EventCategory::Player),
        ])
    }

    fn rules() -> RuleDocument {
        RuleDocument::parse(
            r#"
BlockBreakEvent: { enabled: true, message: "{PLAYER} broke {BLOCK}", BLOCK-IGNORED: AIR }
PlayerJoinEvent: { enabled: true, message: "{NAME} joined" }
"#,
        )
        .unwrap()
    }

    fn block_break(player: &str, block: &str) -> HostEvent {
        HostEvent::new("BlockBreakEvent")
            .with("player", AttributeValue::Actor(Actor::player(player)))
            .with(
                "block",
                AttributeValue::Actor(Actor::block(block, Location::new("world", 1.0, 2.0, 3.0))),
            )
            .with_cancelled(false)
    }

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 7, 4, 18, 5, 9).unwrap()
    }

    fn manager(dir: &Path, settings: Settings) -> LogManager {
        LogManager::new(registry(), dir, settings, &rules()).0
    }

    #[test]
    fn test_handle_buffers_until_flush() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path(), Settings::default());
        let out = mgr.handle_at(&block_break("Alice", "STONE"), now());
        assert_eq!(out.rendered().unwrap().message, "Alice broke STONE");
        assert_eq!(mgr.pending_lines(), 1);

        assert_eq!(mgr.flush_all_now(), 1);
        let file = dir.path().join("logs/players/Alice/04-07-24_BlockEvents.log");
        assert_eq!(
            fs::read_to_string(file).unwrap(),
            "[18:05:09][BlockBreakEvent]: Alice broke STONE\n"
        );
    }

    #[test]
    fn test_disabled_and_unregistered() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path(), Settings::default());
        assert_eq!(mgr.handle(&HostEvent::new("Nope")), Dispatch::Unregistered);
        mgr.set_enabled(false);
        assert_eq!(mgr.handle(&block_break("Alice", "STONE")), Dispatch::Disabled);
        assert_eq!(mgr.pending_lines(), 0);
    }

    #[test]
    fn test_suppressed_event_not_buffered() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path(), Settings::default());
        mgr.set_debug(true);
        let out = mgr.handle(&block_break("Alice", "AIR"));
        assert!(matches!(out, Dispatch::Outcome(RenderOutcome::Suppressed(_))));
        assert_eq!(mgr.pending_lines(), 0);
    }

    #[test]
    fn test_live_subscriber_only_sees_own_subject() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path(), Settings::default());
        let (tx, rx) = channel();
        let id = mgr.subscribe_live("Alice", Arc::new(ChannelSubscriber::new(tx)));

        mgr.handle_at(&block_break("Bob", "STONE"), now());
        mgr.handle_at(&block_break("Alice", "AIR"), now());
        assert!(rx.try_recv().is_err());

        mgr.handle_at(&block_break("Alice", "STONE"), now());
        assert_eq!(
            rx.try_recv().unwrap(),
            "[18:05:09][BlockBreakEvent] Alice broke STONE"
        );

        assert!(mgr.unsubscribe_live("Alice", id));
        mgr.handle_at(&block_break("Alice", "STONE"), now());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_reload_flushes_old_pipeline() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path(), Settings::default());
        mgr.handle_at(&block_break("Alice", "STONE"), now());

        let report = mgr.reload_rules(&RuleDocument::parse("PlayerJoinEvent: { enabled: true }").unwrap());
        assert_eq!(report.registered, 1);
        assert_eq!(mgr.pending_lines(), 0);
        assert!(dir
            .path()
            .join("logs/players/Alice/04-07-24_BlockEvents.log")
            .exists());
        assert_eq!(mgr.handle(&block_break("Alice", "STONE")), Dispatch::Unregistered);
    }

    #[test]
    fn test_shutdown_flushes_then_drops_rules() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path(), Settings::default());
        mgr.start().unwrap();
        mgr.handle_at(&block_break("Alice", "STONE"), now());
        assert_eq!(mgr.shutdown(), 1);
        assert_eq!(mgr.handle(&block_break("Alice", "STONE")), Dispatch::Unregistered);
    }

    #[test]
    fn test_immediate_mode() {
        let dir = tempdir().unwrap();
        let settings = Settings {
            flush_interval: Duration::ZERO,
            ..Settings::default()
        };
        let mgr = manager(dir.path(), settings);
        mgr.start().unwrap();
        mgr.handle_at(&block_break("Alice", "STONE"), now());
        assert_eq!(mgr.pending_lines(), 0);
        assert!(dir
            .path()
            .join("logs/players/Alice/04-07-24_BlockEvents.log")
            .exists());
    }

    #[test]
    fn test_command_alert() {
        let dir = tempdir().unwrap();
        let settings = Settings {
            command_alert: CommandAlertSettings {
                prefixes: vec!["/op".into()],
                message: Some("{PLAYER} used {COMMAND}".into()),
            },
            ..Settings::default()
        };
        let mgr = manager(dir.path(), settings);
        assert_eq!(
            mgr.command_alert("Alice", "/OP Bob").as_deref(),
            Some("Alice used /OP Bob")
        );
        assert_eq!(mgr.command_alert("Alice", "/help"), None);
    }

    #[test]
    fn test_negative_retention_skips_sweep() {
        let dir = tempdir().unwrap();
        let mut settings = Settings::default();
        settings.retention.gzip_after_days = -1;
        settings.retention.delete_after_days = 30;
        let mgr = manager(dir.path(), settings);
        let summary = mgr.run_retention();
        assert_eq!(summary.compress, None);
        assert_eq!(summary.delete.map(|r| r.affected), Some(0));
    }
}
