//! Watcher trait and the fatal-error hook.

use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::error::{WatchError, WatchResult};
use super::snapshot::FileSnapshot;
use super::stream::ChangeStream;

/// A strategy for following a single file.
///
/// [`PollingWatcher`](super::PollingWatcher) is the only implementation in
/// this crate.
#[async_trait]
pub trait FileWatcher: Send + Sync {
    /// The path being followed.
    fn path(&self) -> &Path;

    /// Wait until the path exists.
    ///
    /// Returns `Err(WatchError::Cancelled)` if `cancel` fires first.
    async fn block_until_exists(&self, cancel: &CancellationToken) -> WatchResult<()>;

    /// Start monitoring from `initial` and return the event stream.
    ///
    /// Must be called from within a tokio runtime.
    fn change_events(&self, initial: FileSnapshot, cancel: CancellationToken) -> ChangeStream;
}

/// Receives errors that end a monitoring session without a `Deleted` event.
///
/// Called at most once per session, from the poll task.
pub trait FatalHandler: Send + Sync {
    fn on_fatal(&self, error: WatchError);
}

impl<F> FatalHandler for F
where
    F: Fn(WatchError) + Send + Sync,
{
    fn on_fatal(&self, error: WatchError) {
        self(error)
    }
}

/// Default hook: logs the error and lets the embedding application carry on.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFatalHandler;

impl FatalHandler for LogFatalHandler {
    fn on_fatal(&self, error: WatchError) {
        tracing::error!("[watcher] monitoring aborted: {error}");
    }
}
