#![warn(missing_docs)]
//! # restyle-mailbox
//!
//! ## Purpose
//! Moves session-scoped data (captured photo, selected design) from one
//! screen to the next without a network round trip or long-lived persistence.
//!
//! ## Responsibilities
//! - Provide a single-use mailbox: `put` then exactly one `take_once`.
//! - Degrade storage failures to "no data available" rather than surfacing a
//!   distinct error class to consumers.
//! - Define the well-known transfer keys used by the capture/compare flow.
//!
//! ## Data flow
//! Capture screen `put`s a data-URL payload -> next screen `take_once`s it;
//! the key is deleted on read so back-navigation can never replay stale data.
//!
//! ## Ownership and lifetimes
//! Values are owned `String`s; the store lives for one process session and is
//! cleared with it.
//!
//! ## Error model
//! [`SessionStore`] implementations report [`StoreError`]; the mailbox maps
//! every store failure to [`Taken::Absent`] after logging a warning.
//!
//! ## Security and privacy notes
//! Payload contents are never logged; only key names appear in diagnostics.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

/// Transfer key for the captured room photo.
pub const CAPTURED_PHOTO_KEY: &str = "capturedPhoto";

/// Transfer key for a selected design image.
pub const DESIGN_PHOTO_KEY: &str = "designPhoto";

/// Backing store abstraction for session-scoped key/value data.
pub trait SessionStore: Send + Sync {
    /// Stores or overwrites the value under the key.
    ///
    /// # Errors
    /// Returns [`StoreError`] on quota or availability failures.
    fn put(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Removes and returns the value under the key, when present.
    ///
    /// # Errors
    /// Returns [`StoreError`] on availability failures.
    fn take(&self, key: &str) -> Result<Option<String>, StoreError>;
}

/// Result of consuming a mailbox key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Taken {
    /// The stored value; the key no longer exists.
    Value(String),
    /// Nothing was stored, or the store failed; treat as "no upstream data".
    Absent,
}

/// Single-use session transfer over an injectable store.
pub struct SessionMailbox {
    store: Box<dyn SessionStore>,
}

impl SessionMailbox {
    /// Creates a mailbox over the given store.
    pub fn new(store: Box<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Creates a mailbox over the in-memory session store.
    pub fn in_memory() -> Self {
        Self::new(Box::new(InMemorySessionStore::new()))
    }

    /// Stores a value under the key, overwriting any previous value.
    ///
    /// Overwriting is intentional: retrying a capture replaces the stale
    /// payload so at most one live value exists per key.
    pub fn put(&self, key: &str, value: impl Into<String>) {
        if let Err(error) = self.store.put(key, value.into()) {
            log::warn!("session store put failed for key '{key}': {error}");
        }
    }

    /// Reads and deletes the value under the key.
    ///
    /// A value is never readable twice; store failures degrade to
    /// [`Taken::Absent`] so consumers follow their normal redirect-to-entry
    /// path instead of rendering a broken state.
    pub fn take_once(&self, key: &str) -> Taken {
        match self.store.take(key) {
            Ok(Some(value)) => Taken::Value(value),
            Ok(None) => Taken::Absent,
            Err(error) => {
                log::warn!("session store take failed for key '{key}': {error}");
                Taken::Absent
            }
        }
    }
}

/// Process-lifetime in-memory store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn put(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?;
        Ok(entries.remove(key))
    }
}

/// Session store error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store rejected the write for capacity reasons.
    #[error("session store quota exceeded")]
    QuotaExceeded,
    /// Store is disabled or otherwise unreachable.
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for single-use semantics and failure degradation.

    use super::*;

    struct FailingStore;

    impl SessionStore for FailingStore {
        fn put(&self, _key: &str, _value: String) -> Result<(), StoreError> {
            Err(StoreError::QuotaExceeded)
        }

        fn take(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("storage disabled".to_string()))
        }
    }

    #[test]
    fn take_once_consumes_exactly_once() {
        let mailbox = SessionMailbox::in_memory();
        mailbox.put(CAPTURED_PHOTO_KEY, "payload");

        assert_eq!(
            mailbox.take_once(CAPTURED_PHOTO_KEY),
            Taken::Value("payload".to_string())
        );
        assert_eq!(mailbox.take_once(CAPTURED_PHOTO_KEY), Taken::Absent);
    }

    #[test]
    fn put_overwrites_previous_value() {
        let mailbox = SessionMailbox::in_memory();
        mailbox.put(DESIGN_PHOTO_KEY, "first");
        mailbox.put(DESIGN_PHOTO_KEY, "second");

        assert_eq!(
            mailbox.take_once(DESIGN_PHOTO_KEY),
            Taken::Value("second".to_string())
        );
    }

    #[test]
    fn store_failures_degrade_to_absent() {
        let mailbox = SessionMailbox::new(Box::new(FailingStore));
        mailbox.put(CAPTURED_PHOTO_KEY, "payload");
        assert_eq!(mailbox.take_once(CAPTURED_PHOTO_KEY), Taken::Absent);
    }
}
