// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Durable per-tool state.
//!
//! [`KeyValueStore`] is the storage contract (browser `localStorage` in the web
//! backend, [`MemoryStore`] here). [`LayerStateStore`] keeps the decoded
//! [`ToolState`] and writes it back through the backend after every mutation.

mod state;

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use core::cell::{Cell, RefCell};

use thiserror::Error;

pub use state::{LayerStateStore, PersistedLayer, ToolState};

/// Errors reported when writing persisted state.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The backend rejected a write (quota exceeded, storage disabled).
    #[error("failed to write `{key}`: {message}")]
    Backend {
        /// Storage key.
        key: String,
        /// Backend message.
        message: String,
    },

    /// The state could not be serialized.
    #[error("failed to encode tool state: {0}")]
    Encode(String),
}

/// String key-value storage.
pub trait KeyValueStore {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend rejects the write.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the backend rejects the removal.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// In-memory [`KeyValueStore`].
///
/// Clones share the same entries, so a test can keep a handle to inspect what
/// a [`LayerStateStore`] wrote.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
    writes: Rc<Cell<usize>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `value` under `key`.
    #[must_use]
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .entries
            .borrow_mut()
            .insert(String::from(key), String::from(value));
        store
    }

    /// Number of successful `set` calls so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    /// Makes subsequent writes fail, as a full or disabled store would.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(StoreError::Backend {
                key: String::from(key),
                message: String::from("writes disabled"),
            });
        }
        self.entries
            .borrow_mut()
            .insert(String::from(key), String::from(value));
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
