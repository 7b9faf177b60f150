//! Rule engine for superlog.
//!
//! This crate decides whether an event is logged and how it reads:
//!
//! - **Compilation**: raw per-event definitions become immutable
//!   [`EventRule`]s checked against the host's event-type registry. A rule
//!   with an unreadable condition field is never registered.
//! - **Conditions**: `IGNORED`/`LOGGED` sets, whole-event or per field,
//!   with deny taking precedence over allow.
//! - **Coercion**: type-directed conversion of attribute values to text.
//! - **Rendering**: one event plus its rule gives a [`RenderedLog`], a
//!   suppression reason, or a render error. Never a panic.
//!
//! # Example
//!
//! ```no_run
//! use sl_common::{EventTypeRegistry, HostEvent};
//! use sl_config::RuleDocument;
//! use sl_rules::{EventRenderer, RuleCompiler};
//!
//! let registry = EventTypeRegistry::new();
//! let doc = RuleDocument::parse("PlayerJoinEvent: { enabled: true }").unwrap();
//! let (rules, report) = RuleCompiler::new(&registry).compile_all(&doc);
//! println!("{} rules registered", report.registered);
//!
//! let event = HostEvent::new("PlayerJoinEvent");
//! if let Some(rule) = rules.get(&event.event_type) {
//!     let outcome = EventRenderer::default().render(&event, rule, chrono::Local::now());
//!     println!("{outcome:?}");
//! }
//! ```
//!
//! [`RenderedLog`]: sl_common::RenderedLog

pub mod coerce;
pub mod compiler;
pub mod condition;
pub mod error;
pub mod render;
pub mod template;

pub use coerce::{coerce, Coerced};
pub use compiler::{
    CompileReport, CompileWarning, EventRule, FieldBinding, RuleCompiler, RuleSet,
    DEFAULT_MESSAGE,
};
pub use condition::{ConditionKey, Conditions};
pub use error::{RenderError, RuleCompileError};
pub use render::{EventRenderer, RenderOptions, RenderOutcome, SuppressReason};
pub use template::{scan_tokens, substitute, TemplateToken};
