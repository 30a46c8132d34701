//! Per-session state owned by the poll loop.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::event::ChangeEvent;
use super::snapshot::FileSnapshot;

/// Last known size and mtime of the watched path.
#[derive(Debug, Clone)]
pub(crate) struct WatchTarget {
    path: PathBuf,
    size: u64,
    modified: Option<SystemTime>,
}

impl WatchTarget {
    /// Seed the baseline so the first poll is silent for an unchanged file.
    pub(crate) fn new(path: PathBuf, initial: &FileSnapshot) -> Self {
        Self {
            path,
            size: initial.size,
            modified: initial.modified,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn size(&self) -> u64 {
        self.size
    }

    /// Classify a fresh sample against the baseline and advance it.
    ///
    /// Identity is checked by the caller; this only looks at size and mtime.
    pub(crate) fn observe(&mut self, snapshot: &FileSnapshot) -> Option<ChangeEvent> {
        let current = snapshot.size;

        if self.size > 0 && current < self.size {
            // mtime baseline stays put, so the next tick also reports Modified
            self.size = current;
            return Some(ChangeEvent::Truncated);
        }

        // Size check covers filesystems that lag on mtime for appends
        let event = if snapshot.modified != self.modified || current > self.size {
            self.modified = snapshot.modified;
            Some(ChangeEvent::Modified)
        } else {
            None
        };

        self.size = current;
        event
    }
}

/// Consecutive permission failures.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryCounter {
    count: u32,
    max: u32,
}

impl RetryCounter {
    pub(crate) fn new(max: u32) -> Self {
        Self { count: 0, max }
    }

    /// Count a failure. Returns `true` while still within the bound.
    pub(crate) fn record_failure(&mut self) -> bool {
        self.count = self.count.saturating_add(1);
        self.count <= self.max
    }

    pub(crate) fn reset(&mut self) {
        self.count = 0;
    }

    pub(crate) fn count(&self) -> u32 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watcher::FileIdentity;
    use std::time::Duration;

    fn at(secs: u64) -> Option<SystemTime> {
        Some(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
    }

    fn snap(size: u64, modified: Option<SystemTime>) -> FileSnapshot {
        FileSnapshot {
            size,
            modified,
            identity: FileIdentity::new(1, 42),
        }
    }

    fn target(size: u64, modified: Option<SystemTime>) -> WatchTarget {
        WatchTarget::new(PathBuf::from("/var/log/app.log"), &snap(size, modified))
    }

    #[test]
    fn test_unchanged_sample_is_silent() {
        let mut target = target(100, at(10));
        assert_eq!(target.observe(&snap(100, at(10))), None);
        assert_eq!(target.observe(&snap(100, at(10))), None);
    }

    #[test]
    fn test_growth_is_modified() {
        let mut target = target(100, at(10));
        assert_eq!(target.observe(&snap(150, at(11))), Some(ChangeEvent::Modified));
        assert_eq!(target.size(), 150);
    }

    #[test]
    fn test_growth_without_mtime_change_is_modified() {
        let mut target = target(100, at(10));
        assert_eq!(target.observe(&snap(120, at(10))), Some(ChangeEvent::Modified));
        assert_eq!(target.observe(&snap(120, at(10))), None);
    }

    #[test]
    fn test_touch_is_modified() {
        let mut target = target(100, at(10));
        assert_eq!(target.observe(&snap(100, at(12))), Some(ChangeEvent::Modified));
    }

    #[test]
    fn test_shrink_is_truncated_and_rebases() {
        let mut target = target(100, at(10));
        assert_eq!(target.observe(&snap(20, at(11))), Some(ChangeEvent::Truncated));
        assert_eq!(target.size(), 20);

        // The truncating write's mtime is reported on the following tick
        assert_eq!(target.observe(&snap(20, at(11))), Some(ChangeEvent::Modified));
        assert_eq!(target.observe(&snap(20, at(11))), None);

        // Growing from the new baseline is an append, not another truncation
        assert_eq!(target.observe(&snap(40, at(12))), Some(ChangeEvent::Modified));
    }

    #[test]
    fn test_shrink_from_empty_baseline_is_not_truncation() {
        let mut target = target(0, at(10));
        assert_eq!(target.observe(&snap(0, at(10))), None);
    }

    #[test]
    fn test_equal_size_rewrite_is_modified_not_truncated() {
        let mut target = target(100, at(10));
        assert_eq!(target.observe(&snap(100, at(11))), Some(ChangeEvent::Modified));
    }

    #[test]
    fn test_retry_counter_bound() {
        let mut retries = RetryCounter::new(2);
        assert!(retries.record_failure());
        assert!(retries.record_failure());
        assert!(!retries.record_failure());
        assert_eq!(retries.count(), 3);

        retries.reset();
        assert_eq!(retries.count(), 0);
        assert!(retries.record_failure());
    }

    #[test]
    fn test_zero_bound_fails_immediately() {
        let mut retries = RetryCounter::new(0);
        assert!(!retries.record_failure());
    }
}
