//! The per-pane event log.
//!
//! An [`EventLog`] is an append-only history of what a pane observed: local
//! notices, transport errors and the raw text of every inbound frame. It is
//! shared by handle (`Arc<EventLog>`) between the pane and the slots that feed
//! it, so every slot appends to the same live log rather than to a copy.

use std::fmt;

use bithose_console_core::Signal;
use chrono::{DateTime, Local};
use parking_lot::{Mutex, RwLock};

/// Where a log entry came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryOrigin {
    /// Generated by the console itself (lifecycle, validation).
    LocalNotice,
    /// The exact text of a frame received from the broker.
    RemoteFrame,
    /// A transport error report.
    ErrorNotice,
}

impl EntryOrigin {
    /// Short tag used when rendering entries.
    pub fn tag(self) -> &'static str {
        match self {
            Self::LocalNotice => "notice",
            Self::RemoteFrame => "frame",
            Self::ErrorNotice => "error",
        }
    }
}

impl fmt::Display for EntryOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One immutable entry in an [`EventLog`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    sequence: u64,
    origin: EntryOrigin,
    text: String,
    recorded_at: DateTime<Local>,
}

impl LogEntry {
    /// Position in the log, starting at 0.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Where the entry came from.
    pub fn origin(&self) -> EntryOrigin {
        self.origin
    }

    /// The entry text. For remote frames this is exactly what was received.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Local time the entry was appended.
    pub fn recorded_at(&self) -> DateTime<Local> {
        self.recorded_at
    }
}

/// Append-only, ordered log of pane events.
///
/// Sequence numbers are assigned under the same write lock that inserts the
/// entry, so concurrent appends never collide or get lost.
pub struct EventLog {
    entries: RwLock<Vec<LogEntry>>,
    /// Held across insert and notify; readers only take `entries`.
    appending: Mutex<()>,
    /// Emitted after every append with the new entry.
    ///
    /// Notifications arrive in sequence order, one append at a time, even
    /// when several threads append concurrently. Direct slots must not
    /// append to the same log.
    pub entry_appended: Signal<LogEntry>,
}

impl EventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            appending: Mutex::new(()),
            entry_appended: Signal::new(),
        }
    }

    /// Append a new entry and return its sequence number.
    pub fn append(&self, origin: EntryOrigin, text: impl Into<String>) -> u64 {
        let _appending = self.appending.lock();
        let entry = {
            let mut entries = self.entries.write();
            let entry = LogEntry {
                sequence: entries.len() as u64,
                origin,
                text: text.into(),
                recorded_at: Local::now(),
            };
            entries.push(entry.clone());
            entry
        };
        let sequence = entry.sequence;
        self.entry_appended.emit(entry);
        sequence
    }

    /// Snapshot of every entry, oldest first.
    ///
    /// Each call takes a fresh snapshot, so a view can simply re-read after
    /// every append.
    pub fn all(&self) -> Vec<LogEntry> {
        self.entries.read().clone()
    }

    /// The newest entry.
    pub fn last(&self) -> Option<LogEntry> {
        self.entries.read().last().cloned()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing has been logged yet.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Borrow the entries without cloning.
    ///
    /// The log is read-locked for the duration of `f`; appending from inside
    /// `f` deadlocks.
    pub fn with_entries<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[LogEntry]) -> R,
    {
        f(&self.entries.read())
    }

    /// The text of every entry, oldest first.
    pub fn texts(&self) -> Vec<String> {
        self.with_entries(|entries| entries.iter().map(|e| e.text.clone()).collect())
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLog")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_append_preserves_order() {
        let log = EventLog::new();
        for i in 0..100 {
            assert_eq!(log.append(EntryOrigin::RemoteFrame, format!("frame {i}")), i);
        }

        let all = log.all();
        assert_eq!(all.len(), 100);
        for (i, entry) in all.iter().enumerate() {
            assert_eq!(entry.sequence(), i as u64);
            assert_eq!(entry.text(), format!("frame {i}"));
        }
    }

    #[test]
    fn test_duplicates_are_kept() {
        let log = EventLog::new();
        log.append(EntryOrigin::RemoteFrame, "same");
        log.append(EntryOrigin::RemoteFrame, "same");
        assert_eq!(log.texts(), vec!["same", "same"]);
    }

    #[test]
    fn test_all_is_restartable() {
        let log = EventLog::new();
        log.append(EntryOrigin::LocalNotice, "a");
        let first = log.all();
        log.append(EntryOrigin::LocalNotice, "b");
        let second = log.all();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
        assert_eq!(first[0], second[0]);
    }

    #[test]
    fn test_last_and_len() {
        let log = EventLog::new();
        assert!(log.last().is_none());
        assert!(log.is_empty());

        for text in ["a", "b", "c"] {
            log.append(EntryOrigin::LocalNotice, text);
        }

        assert_eq!(log.len(), 3);
        assert_eq!(log.last().unwrap().text(), "c");
        assert_eq!(log.last().unwrap().sequence(), 2);
    }

    #[test]
    fn test_entry_appended_signal() {
        let log = EventLog::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        log.entry_appended.connect(move |entry| {
            seen_clone.lock().push((entry.sequence(), entry.origin()));
        });

        log.append(EntryOrigin::LocalNotice, "websocket open");
        log.append(EntryOrigin::ErrorNotice, "there's been an error: boom");

        assert_eq!(
            *seen.lock(),
            vec![(0, EntryOrigin::LocalNotice), (1, EntryOrigin::ErrorNotice)]
        );
    }

    #[test]
    fn test_concurrent_appends_lose_nothing() {
        let log = Arc::new(EventLog::new());
        let mut handles = vec![];

        for t in 0..8 {
            let log = log.clone();
            handles.push(thread::spawn(move || {
                for i in 0..250 {
                    log.append(EntryOrigin::RemoteFrame, format!("{t}:{i}"));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let all = log.all();
        assert_eq!(all.len(), 2000);
        for (i, entry) in all.iter().enumerate() {
            assert_eq!(entry.sequence(), i as u64);
        }

        // Each thread's own frames stay in the order it appended them.
        for t in 0..8 {
            let prefix = format!("{t}:");
            let mine: Vec<usize> = all
                .iter()
                .filter_map(|e| e.text().strip_prefix(&prefix))
                .map(|n| n.parse().unwrap())
                .collect();
            assert_eq!(mine, (0..250).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_entry_appended_follows_sequence_order() {
        for _ in 0..50 {
            let log = Arc::new(EventLog::new());
            let notified = Arc::new(Mutex::new(Vec::new()));
            let notified_clone = notified.clone();
            log.entry_appended.connect(move |entry| {
                notified_clone.lock().push(entry.sequence());
            });

            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let log = log.clone();
                    thread::spawn(move || {
                        for i in 0..500 {
                            log.append(EntryOrigin::RemoteFrame, format!("{t}:{i}"));
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }

            let notified = notified.lock();
            assert_eq!(*notified, (0..2000).collect::<Vec<u64>>());
        }
    }
}
