//! Polling watcher: follows one file by sampling its metadata on a timer.

use std::io;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::time::{Duration, sleep};
use tokio_util::sync::CancellationToken;

use crate::config::Settings;

use super::error::{WatchError, WatchResult};
use super::handler::{FatalHandler, FileWatcher, LogFatalHandler};
use super::snapshot::{FileIdentity, FileSnapshot, FsMetadata, MetadataSource};
use super::stream::{ChangeSender, ChangeStream, change_channel};
use super::target::{RetryCounter, WatchTarget};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);
pub const DEFAULT_MAX_PERMISSION_RETRIES: u32 = 5;

/// Follows a single file by polling its metadata.
///
/// ```ignore
/// let watcher = PollingWatcher::new("/var/log/app.log");
/// let cancel = CancellationToken::new();
/// let mut changes = watcher.follow(&cancel).await?;
/// while let Some(event) = changes.next().await {
///     // re-read the file
/// }
/// ```
#[derive(Clone)]
pub struct PollingWatcher {
    path: PathBuf,
    poll_interval: Duration,
    max_permission_retries: u32,
    source: Arc<dyn MetadataSource>,
    fatal: Arc<dyn FatalHandler>,
}

impl std::fmt::Debug for PollingWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingWatcher")
            .field("path", &self.path)
            .field("poll_interval", &self.poll_interval)
            .field("max_permission_retries", &self.max_permission_retries)
            .finish_non_exhaustive()
    }
}

impl PollingWatcher {
    /// Watcher with default interval, retry bound, filesystem source and
    /// logging fatal handler.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_permission_retries: DEFAULT_MAX_PERMISSION_RETRIES,
            source: Arc::new(FsMetadata),
            fatal: Arc::new(LogFatalHandler),
        }
    }

    /// Create a builder for configuring the watcher.
    pub fn builder(path: impl Into<PathBuf>) -> PollingWatcherBuilder {
        PollingWatcherBuilder::new(path)
    }

    /// Build a watcher from loaded settings.
    pub fn from_settings(path: impl Into<PathBuf>, settings: &Settings) -> WatchResult<Self> {
        Self::builder(path)
            .poll_interval(settings.watch.poll_interval())
            .max_permission_retries(settings.watch.max_permission_retries)
            .build()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn max_permission_retries(&self) -> u32 {
        self.max_permission_retries
    }

    /// Sample the path's current metadata.
    pub fn snapshot(&self) -> WatchResult<FileSnapshot> {
        self.source
            .stat(&self.path)
            .map_err(|e| WatchError::stat(&self.path, e))
    }

    /// Wait until the path exists.
    ///
    /// Not-found is retried every poll interval without limit. Any other stat
    /// error is returned as is. The wait between attempts races `cancel`, so
    /// cancellation returns `Err(WatchError::Cancelled)` without waiting out
    /// the interval.
    pub async fn block_until_exists(&self, cancel: &CancellationToken) -> WatchResult<()> {
        loop {
            match self.source.stat(&self.path) {
                Ok(_) => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    crate::debug_event!("watcher", "waiting", "{}", self.path.display());
                }
                Err(e) => return Err(WatchError::stat(&self.path, e)),
            }

            tokio::select! {
                _ = sleep(self.poll_interval) => {}
                _ = cancel.cancelled() => return Err(WatchError::Cancelled),
            }
        }
    }

    /// Start the poll loop in a background task and return its event stream.
    ///
    /// `initial` is the baseline: size and mtime seed the classifier, identity
    /// is fixed for the whole session. The stream ends after `Deleted`, after
    /// cancellation, or after a fatal error has been passed to the fatal
    /// handler. Must be called from within a tokio runtime.
    pub fn start_monitoring(
        &self,
        initial: FileSnapshot,
        cancel: CancellationToken,
    ) -> ChangeStream {
        let (changes, stream) = change_channel();

        let session = PollSession {
            target: WatchTarget::new(self.path.clone(), &initial),
            identity: initial.identity,
            retries: RetryCounter::new(self.max_permission_retries),
            poll_interval: self.poll_interval,
            source: Arc::clone(&self.source),
            fatal: Arc::clone(&self.fatal),
            cancel,
        };

        crate::log_event!(
            "watcher",
            "monitoring",
            "{} ({} bytes, every {:?})",
            self.path.display(),
            initial.size,
            self.poll_interval
        );

        tokio::spawn(session.run(changes));
        stream
    }

    /// Wait for the file, take its baseline and start monitoring.
    pub async fn follow(&self, cancel: &CancellationToken) -> WatchResult<ChangeStream> {
        self.block_until_exists(cancel).await?;
        let initial = self.snapshot()?;
        Ok(self.start_monitoring(initial, cancel.clone()))
    }
}

#[async_trait]
impl FileWatcher for PollingWatcher {
    fn path(&self) -> &Path {
        &self.path
    }

    async fn block_until_exists(&self, cancel: &CancellationToken) -> WatchResult<()> {
        PollingWatcher::block_until_exists(self, cancel).await
    }

    fn change_events(&self, initial: FileSnapshot, cancel: CancellationToken) -> ChangeStream {
        self.start_monitoring(initial, cancel)
    }
}

/// State of one monitoring session. Owned by its task.
struct PollSession {
    target: WatchTarget,
    identity: FileIdentity,
    retries: RetryCounter,
    poll_interval: Duration,
    source: Arc<dyn MetadataSource>,
    fatal: Arc<dyn FatalHandler>,
    cancel: CancellationToken,
}

impl PollSession {
    async fn run(mut self, changes: ChangeSender) {
        loop {
            if self.should_stop(&changes) {
                break;
            }

            // Plain sleep: cancellation is only polled between ticks
            sleep(self.poll_interval).await;

            if self.should_stop(&changes) {
                break;
            }

            if self.tick(&changes).is_break() {
                break;
            }
        }

        crate::debug_event!("watcher", "stopped", "{}", self.target.path().display());
        changes.close();
    }

    fn should_stop(&self, changes: &ChangeSender) -> bool {
        if self.cancel.is_cancelled() {
            crate::debug_event!("watcher", "cancelled", "{}", self.target.path().display());
            return true;
        }
        if changes.is_closed() {
            crate::debug_event!("watcher", "stream dropped", "{}", self.target.path().display());
            return true;
        }
        false
    }

    /// One poll: stat, classify, emit at most one event.
    fn tick(&mut self, changes: &ChangeSender) -> ControlFlow<()> {
        let snapshot = match self.source.stat(self.target.path()) {
            Ok(snapshot) => {
                self.retries.reset();
                snapshot
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                crate::log_event!(
                    "watcher",
                    "deleted",
                    "{} (last seen at {} bytes)",
                    self.target.path().display(),
                    self.target.size()
                );
                changes.notify_deleted();
                return ControlFlow::Break(());
            }
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                if self.retries.record_failure() {
                    tracing::warn!(
                        "[watcher] permission denied on {} (attempt {}): {e}",
                        self.target.path().display(),
                        self.retries.count()
                    );
                    return ControlFlow::Continue(());
                }
                self.fatal.on_fatal(WatchError::RetriesExhausted {
                    path: self.target.path().to_path_buf(),
                    attempts: self.retries.count(),
                    source: e,
                });
                return ControlFlow::Break(());
            }
            Err(e) => {
                self.fatal.on_fatal(WatchError::stat(self.target.path(), e));
                return ControlFlow::Break(());
            }
        };

        if snapshot.identity != self.identity {
            crate::log_event!("watcher", "rotated", "{}", self.target.path().display());
            changes.notify_deleted();
            return ControlFlow::Break(());
        }

        if let Some(event) = self.target.observe(&snapshot) {
            crate::debug_event!(
                "watcher",
                "change",
                "{event} {} ({} bytes)",
                self.target.path().display(),
                snapshot.size
            );
            changes.emit(event);
        } else {
            tracing::trace!("[watcher] unchanged: {}", self.target.path().display());
        }

        ControlFlow::Continue(())
    }
}

/// Builder for constructing a PollingWatcher.
pub struct PollingWatcherBuilder {
    path: PathBuf,
    poll_interval: Duration,
    max_permission_retries: u32,
    source: Option<Arc<dyn MetadataSource>>,
    fatal: Option<Arc<dyn FatalHandler>>,
}

impl PollingWatcherBuilder {
    /// Create a new builder with defaults.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_permission_retries: DEFAULT_MAX_PERMISSION_RETRIES,
            source: None,
            fatal: None,
        }
    }

    /// Set the time between samples.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set how many consecutive permission errors are tolerated.
    pub fn max_permission_retries(mut self, max: u32) -> Self {
        self.max_permission_retries = max;
        self
    }

    /// Read metadata from somewhere other than the local filesystem.
    pub fn metadata_source(mut self, source: impl MetadataSource + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Set the hook for errors that abort monitoring.
    pub fn on_fatal(mut self, handler: impl FatalHandler + 'static) -> Self {
        self.fatal = Some(Arc::new(handler));
        self
    }

    /// Build the PollingWatcher.
    pub fn build(self) -> WatchResult<PollingWatcher> {
        if self.poll_interval.is_zero() {
            return Err(WatchError::Config {
                reason: "poll interval must be greater than zero".to_string(),
            });
        }

        Ok(PollingWatcher {
            path: self.path,
            poll_interval: self.poll_interval,
            max_permission_retries: self.max_permission_retries,
            source: self.source.unwrap_or_else(|| Arc::new(FsMetadata)),
            fatal: self.fatal.unwrap_or_else(|| Arc::new(LogFatalHandler)),
        })
    }
}
