//! Ordered, unbounded stream of change events.
//!
//! The poll loop holds the [`ChangeSender`]; the caller holds the
//! [`ChangeStream`]. Dropping or closing the sender ends the stream once the
//! buffered events have been drained.

use tokio::sync::mpsc::{self, error::TryRecvError};

use super::event::ChangeEvent;

/// Create a connected sender/stream pair.
pub fn change_channel() -> (ChangeSender, ChangeStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChangeSender { tx }, ChangeStream { rx })
}

/// Producer half, owned by the poll loop.
#[derive(Debug)]
pub struct ChangeSender {
    tx: mpsc::UnboundedSender<ChangeEvent>,
}

impl ChangeSender {
    /// Queue an event without blocking.
    ///
    /// Returns `false` when the consumer has dropped its stream.
    pub fn emit(&self, event: ChangeEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn notify_modified(&self) -> bool {
        self.emit(ChangeEvent::Modified)
    }

    pub fn notify_truncated(&self) -> bool {
        self.emit(ChangeEvent::Truncated)
    }

    pub fn notify_deleted(&self) -> bool {
        self.emit(ChangeEvent::Deleted)
    }

    /// Whether the consumer has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Signal end-of-stream. Consumes the sender, so it can only happen once.
    pub fn close(self) {
        drop(self);
    }
}

/// Consumer half, handed to the caller by `start_monitoring`.
#[derive(Debug)]
pub struct ChangeStream {
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl ChangeStream {
    /// Wait for the next event. `None` means monitoring has ended.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    /// Take the next buffered event without waiting.
    ///
    /// `Ok(None)` means nothing is buffered yet. `Err(StreamClosed)` means the
    /// producer closed and every buffered event has been taken.
    pub fn try_next(&mut self) -> Result<Option<ChangeEvent>, StreamClosed> {
        match self.rx.try_recv() {
            Ok(event) => Ok(Some(event)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(StreamClosed),
        }
    }

    /// True once the producer has closed. Buffered events may still be pending.
    pub fn is_closed(&self) -> bool {
        self.rx.is_closed()
    }
}

/// Returned by [`ChangeStream::try_next`] after the producer closed and the
/// buffer is drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamClosed;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_arrive_in_emission_order() {
        let (tx, mut rx) = change_channel();

        assert!(tx.notify_modified());
        assert!(tx.notify_truncated());
        assert!(tx.notify_modified());
        assert!(tx.notify_deleted());
        tx.close();

        assert_eq!(rx.next().await, Some(ChangeEvent::Modified));
        assert_eq!(rx.next().await, Some(ChangeEvent::Truncated));
        assert_eq!(rx.next().await, Some(ChangeEvent::Modified));
        assert_eq!(rx.next().await, Some(ChangeEvent::Deleted));
        assert_eq!(rx.next().await, None);
    }

    #[tokio::test]
    async fn test_next_waits_for_producer() {
        let (tx, mut rx) = change_channel();

        let producer = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            tx.notify_modified();
        });

        assert_eq!(rx.next().await, Some(ChangeEvent::Modified));
        producer.await.unwrap();
        // Sender dropped with the task
        assert_eq!(rx.next().await, None);
    }

    #[test]
    fn test_try_next_states() {
        let (tx, mut rx) = change_channel();

        assert_eq!(rx.try_next(), Ok(None));
        assert!(!rx.is_closed());

        tx.notify_truncated();
        tx.close();

        assert!(rx.is_closed());
        assert_eq!(rx.try_next(), Ok(Some(ChangeEvent::Truncated)));
        assert_eq!(rx.try_next(), Err(StreamClosed));
    }

    #[test]
    fn test_emit_reports_dropped_consumer() {
        let (tx, rx) = change_channel();
        drop(rx);

        assert!(tx.is_closed());
        assert!(!tx.notify_modified());
    }
}
