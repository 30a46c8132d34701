//! Polling file watcher for following a single file.
//!
//! This module samples a file's metadata at a fixed interval and turns the
//! difference between samples into a stream of change events, the way a log
//! tailer needs them: appended, truncated, deleted or rotated away.
//!
//! # Architecture
//!
//! ```text
//! caller
//!   block_until_exists(path)   sleep-or-cancel until the path appears
//!   snapshot()                 baseline size, mtime, identity
//!   start_monitoring()  ---->  PollSession (tokio task)
//!         |                      stat -> classify -> emit
//!         v                           |
//!   ChangeStream  <---- unbounded ----+
//! ```
//!
//! Deletion and rotation end the stream after a `Deleted` event. Cancellation
//! ends it silently. Unrecoverable stat errors go to the [`FatalHandler`] and
//! end it without a `Deleted` event.

mod error;
mod event;
mod handler;
mod polling;
mod snapshot;
mod stream;
mod target;

pub use error::{WatchError, WatchResult};
pub use event::ChangeEvent;
pub use handler::{FatalHandler, FileWatcher, LogFatalHandler};
pub use polling::{
    DEFAULT_MAX_PERMISSION_RETRIES, DEFAULT_POLL_INTERVAL, PollingWatcher, PollingWatcherBuilder,
};
pub use snapshot::{FileIdentity, FileSnapshot, FsMetadata, MetadataSource};
pub use stream::{ChangeSender, ChangeStream, StreamClosed, change_channel};
