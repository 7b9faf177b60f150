//! superlog - replay recorded host events through the log pipeline
//!
//! Subcommands:
//! - `replay`: compile rules, render a JSONL event stream, persist it
//! - `sweep`: run the retention sweeps over a logs directory
//! - `filter`: export one subject's lines for one event type

use clap::{Args, Parser, Subcommand};
use sl_common::FilenameTemplate;
use sl_config::{load_settings, resolve_config, Settings};
use sl_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use sl_core::{load_catalog, load_events, replay, Error, ExitCode, LogManager};
use sl_sink::{export_filtered, FilterError, RetentionManager, SweepReport};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "superlog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

#[derive(Args, Debug)]
struct GlobalOpts {
    /// Diagnostic log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Diagnostic log format (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Print command results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a recorded event stream into log files
    Replay(ReplayArgs),

    /// Compress and delete aged log files
    Sweep(SweepArgs),

    /// Export one subject's lines for one event type
    Filter(FilterArgs),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Configuration file (falls back to SUPERLOG_CONFIG, XDG and /etc)
    #[arg(long, env = "SUPERLOG_CONFIG")]
    config: Option<PathBuf>,

    /// Event-type catalog (YAML list of descriptors)
    #[arg(long)]
    catalog: PathBuf,

    /// Host events, one JSON object per line
    #[arg(long)]
    events: PathBuf,

    /// Data directory; logs are written under <data-dir>/logs
    #[arg(long)]
    data_dir: PathBuf,

    /// Run the retention sweeps before replaying
    #[arg(long)]
    retention: bool,
}

#[derive(Args, Debug)]
struct SweepArgs {
    #[arg(long)]
    data_dir: PathBuf,

    /// Compress files at least this many days old (0 disables)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    compress_after: i64,

    /// Delete files at least this many days old (0 disables)
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    delete_after: i64,

    /// Let the delete sweep remove compressed files too
    #[arg(long)]
    even_gzipped: bool,
}

#[derive(Args, Debug)]
struct FilterArgs {
    #[arg(long)]
    data_dir: PathBuf,

    /// Subject (player) whose logs are scanned
    subject: String,

    /// Event type name to keep
    event: String,

    /// Extension of the plain log files
    #[arg(long)]
    extension: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_env(cli.global.log_level, cli.global.log_format));

    let exit_code = match &cli.command {
        Commands::Replay(args) => run_replay(&cli.global, args),
        Commands::Sweep(args) => run_sweep(&cli.global, args),
        Commands::Filter(args) => run_filter(&cli.global, args),
    };

    std::process::exit(exit_code.as_i32());
}

fn fail(err: &Error) -> ExitCode {
    error!(category = %err.category(), "{}", err);
    ExitCode::from(err)
}

fn settings_for(config: Option<&Path>) -> Result<(Settings, sl_config::RuleDocument), Error> {
    let resolved = resolve_config(config);
    match resolved.path {
        Some(path) => {
            info!(path = %path.display(), source = %resolved.source, "loading configuration");
            Ok(load_settings(&path)?)
        }
        None => {
            warn!("no configuration found; using defaults with no rules");
            Ok((Settings::default(), sl_config::RuleDocument::default()))
        }
    }
}

fn run_replay(global: &GlobalOpts, args: &ReplayArgs) -> ExitCode {
    let loaded = settings_for(args.config.as_deref()).and_then(|(settings, rules)| {
        let registry = load_catalog(&args.catalog)?;
        let events = load_events(&args.events)?;
        Ok((settings, rules, registry, events))
    });
    let (settings, rules, registry, events) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => return fail(&e),
    };

    let (manager, report) = LogManager::new(registry, &args.data_dir, settings, &rules);
    for skipped in &report.skipped {
        warn!(category = %skipped.category(), "{}", skipped);
    }
    if args.retention {
        manager.run_retention();
    }

    let summary = replay(&manager, &events);
    let files = manager.shutdown();

    if global.json {
        let out = serde_json::json!({
            "summary": summary,
            "files_written": files,
            "logs_dir": manager.logs_dir().display().to_string(),
            "rules": {
                "registered": report.registered,
                "disabled": report.disabled,
                "skipped": report.skipped.len(),
                "warnings": report.warnings.len(),
            },
        });
        println!("{out}");
    } else {
        println!(
            "{} events: {} rendered, {} suppressed, {} failed, {} unregistered",
            summary.events, summary.rendered, summary.suppressed, summary.failed, summary.unregistered
        );
        println!("{} files written under {}", files, manager.logs_dir().display());
    }

    if summary.rendered == 0 {
        ExitCode::NothingFound
    } else {
        ExitCode::Clean
    }
}

fn run_sweep(global: &GlobalOpts, args: &SweepArgs) -> ExitCode {
    let manager = RetentionManager::new(args.data_dir.join(sl_common::LOGS_DIR));

    let compress = match manager.compress_older_than(args.compress_after) {
        Ok(report) => report,
        Err(e) => return fail(&e.into()),
    };
    let delete = match manager.delete_older_than(args.delete_after, args.even_gzipped) {
        Ok(report) => report,
        Err(e) => return fail(&e.into()),
    };

    if global.json {
        println!("{}", serde_json::json!({ "compress": compress, "delete": delete }));
    } else {
        print_sweep("compressed", &compress);
        print_sweep("deleted", &delete);
    }

    if compress.failed + delete.failed > 0 {
        ExitCode::IoError
    } else if compress.affected + delete.affected == 0 {
        ExitCode::NothingFound
    } else {
        ExitCode::Clean
    }
}

fn print_sweep(verb: &str, report: &SweepReport) {
    if report.disabled {
        println!("{verb}: disabled");
    } else if report.failed > 0 {
        println!("{verb}: {} ({} failed)", report.affected, report.failed);
    } else {
        println!("{verb}: {}", report.affected);
    }
}

fn run_filter(global: &GlobalOpts, args: &FilterArgs) -> ExitCode {
    let default_template = FilenameTemplate::default();
    let extension = args
        .extension
        .as_deref()
        .or_else(|| default_template.extension());

    match export_filtered(&args.data_dir, &args.subject, &args.event, extension) {
        Ok(export) => {
            if global.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "path": export.path.display().to_string(),
                        "lines": export.lines,
                    })
                );
            } else {
                println!("{} lines written to {}", export.lines, export.path.display());
            }
            ExitCode::Clean
        }
        Err(e @ (FilterError::NoLogs { .. } | FilterError::NoMatches { .. })) => {
            if global.json {
                println!(
                    "{}",
                    serde_json::json!({ "path": null, "lines": 0, "message": e.to_string() })
                );
            } else {
                println!("{e}");
            }
            ExitCode::NothingFound
        }
        Err(e) => fail(&e.into()),
    }
}
