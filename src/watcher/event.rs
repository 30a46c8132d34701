//! Change notifications delivered to the consumer.

use std::fmt;

/// A change observed on the watched file.
///
/// Events carry no payload. Consumers re-stat or re-read the file themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    /// Data was appended or the modification time moved.
    Modified,

    /// The file shrank below its last known size.
    Truncated,

    /// The path is gone, or now names a different file. Always the last event.
    Deleted,
}

impl ChangeEvent {
    /// Whether monitoring ends after this event.
    pub fn is_terminal(self) -> bool {
        matches!(self, ChangeEvent::Deleted)
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeEvent::Modified => "modified",
            ChangeEvent::Truncated => "truncated",
            ChangeEvent::Deleted => "deleted",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_deleted_is_terminal() {
        assert!(ChangeEvent::Deleted.is_terminal());
        assert!(!ChangeEvent::Modified.is_terminal());
        assert!(!ChangeEvent::Truncated.is_terminal());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(ChangeEvent::Truncated.to_string(), "truncated");
    }
}
