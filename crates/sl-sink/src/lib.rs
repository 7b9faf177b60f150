//! Persistence side of superlog.
//!
//! - [`WriteBehindSink`]: per-file line buffers flushed in batches
//! - [`RetentionManager`]: gzip and delete sweeps over the logs tree
//! - [`LiveFanout`]: synchronous delivery to live subscribers by subject
//! - [`export_filtered`]: per-subject grep of persisted logs

pub mod error;
pub mod filter;
pub mod live;
pub mod retention;
pub mod writer;

pub use error::{FilterError, RetentionError, SinkError};
pub use filter::{export_filtered, FilterExport, FILTERED_DIR};
pub use live::{ChannelSubscriber, DeliveryError, LiveFanout, LiveSubscriber, SubscriberId};
pub use retention::{is_compressed, RetentionManager, SweepKind, SweepReport};
pub use writer::WriteBehindSink;
