//! superlog core.
//!
//! Wires rule compilation, rendering, write-behind persistence, retention
//! and live fanout into one [`LogManager`], plus the pieces the `superlog`
//! binary needs:
//! - Diagnostic logging setup
//! - The periodic flush timer
//! - Offline replay of recorded events
//! - CLI exit codes

pub mod error;
pub mod exit_codes;
pub mod logging;
pub mod manager;
pub mod replay;
pub mod scheduler;

pub use error::{Error, Result};
pub use exit_codes::ExitCode;
pub use manager::{Dispatch, LogManager, RetentionSummary};
pub use replay::{load_catalog, load_events, read_events, replay, ReplaySummary};
pub use scheduler::FlushScheduler;
