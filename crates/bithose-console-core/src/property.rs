//! Shared values with change detection.
//!
//! A [`Property<T>`] is written from whichever thread edits it and read from
//! any other. Writers learn whether the value actually changed, which is the
//! cue to emit the owner's change signal.
//!
//! ```
//! use bithose_console_core::{Property, Signal};
//!
//! let draft = Property::new(String::new());
//! let draft_changed = Signal::<String>::new();
//!
//! let text = String::from("{\"type\": \"message\"}");
//! if draft.set(text.clone()) {
//!     draft_changed.emit(text);
//! }
//! assert!(!draft.set(String::from("{\"type\": \"message\"}")));
//! ```

use std::fmt;

use parking_lot::RwLock;

/// A lock-guarded value that reports real changes.
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T> Property<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Borrow the value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.read())
    }
}

impl<T: Clone> Property<T> {
    /// A copy of the current value.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }
}

impl<T: PartialEq> Property<T> {
    /// Store `value`, returning `true` if it differs from the previous one.
    pub fn set(&self, value: T) -> bool {
        self.replace(value).is_some()
    }

    /// Store `value` and hand back the old one, or `None` when nothing
    /// changed. Comparison and store happen under one write lock.
    pub fn replace(&self, value: T) -> Option<T> {
        let mut current = self.value.write();
        if *current == value {
            None
        } else {
            Some(std::mem::replace(&mut *current, value))
        }
    }
}

impl<T: Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with(|value| f.debug_tuple("Property").field(value).finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_set_reports_change() {
        let draft = Property::new(String::new());

        assert!(!draft.set(String::new()));
        assert!(draft.set("{}".to_string()));
        assert!(!draft.set("{}".to_string()));
        assert_eq!(draft.get(), "{}");
    }

    #[test]
    fn test_replace_returns_previous() {
        let draft = Property::new("old".to_string());
        assert_eq!(draft.replace("new".to_string()), Some("old".to_string()));
        assert_eq!(draft.replace("new".to_string()), None);
    }

    #[test]
    fn test_with_borrows() {
        let draft = Property::new(String::from("{\"type\": \"message\"}"));
        assert_eq!(draft.with(String::len), 19);
        assert_eq!(format!("{draft:?}"), "Property(\"{\\\"type\\\": \\\"message\\\"}\")");
    }

    #[test]
    fn test_concurrent_writers_see_one_change_each() {
        let counter = Arc::new(Property::new(0u32));

        let handles: Vec<_> = (1..=8)
            .map(|n| {
                let counter = counter.clone();
                std::thread::spawn(move || counter.set(n))
            })
            .collect();
        let changed = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|changed| *changed)
            .count();

        // Every distinct value differs from whatever preceded it.
        assert_eq!(changed, 8);
        assert!((1..=8).contains(&counter.get()));
    }
}
