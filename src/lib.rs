//! Follow a single file by polling its metadata.
//!
//! See [`watcher`] for the change-detection model.

pub mod config;
pub mod logging;
pub mod watcher;

pub use config::{LoggingConfig, Settings, WatchConfig};
pub use watcher::{
    ChangeEvent, ChangeStream, FatalHandler, FileIdentity, FileSnapshot, FileWatcher,
    MetadataSource, PollingWatcher, PollingWatcherBuilder, WatchError, WatchResult,
};
