//! superlog common types.
//!
//! This crate provides the types shared by every superlog crate:
//! - The Event Source contract: attribute values, event categories,
//!   per-event-type capability descriptors and the type registry
//! - Rendered log records and their target file keys
//! - Validated filename, live-line and date templates
//! - The error category taxonomy used for diagnostics

pub mod error;
pub mod event;
pub mod log;
pub mod template;
pub mod value;

pub use error::{Diagnostic, ErrorCategory};
pub use event::{
    AttributePath, EventCategory, EventTypeDescriptor, EventTypeRegistry, HostEvent,
    RESERVED_FIELDS,
};
pub use log::{sanitize_subject, FileKey, RenderedLog};
pub use template::{DateFormat, FilenameTemplate, LiveTemplate, TemplateError};
pub use value::{
    Actor, ActorKind, AttributeValue, ChunkInfo, Inventory, ItemStack, Location, NamedCount,
    PluginInfo,
};

/// Directory (under the data directory) holding persisted log files.
pub const LOGS_DIR: &str = "logs";

/// Directory (under [`LOGS_DIR`]) holding per-subject log files.
pub const PLAYERS_DIR: &str = "players";

/// Suffix of compressed log files.
pub const COMPRESSED_SUFFIX: &str = "gz";
