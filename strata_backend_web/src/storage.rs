// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::string::String;
use core::fmt;

use strata_core::persist::{KeyValueStore, StoreError};
use wasm_bindgen::JsValue;

use crate::js_message;

/// [`KeyValueStore`] over `window.localStorage`.
///
/// Writes fail when the quota is exceeded or storage is disabled (for
/// example in some private browsing modes).
pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl fmt::Debug for LocalStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStorage")
            .field("len", &self.storage.length().ok())
            .finish_non_exhaustive()
    }
}

impl LocalStorage {
    /// Opens the window's local storage, if the browser provides one.
    #[must_use]
    pub fn open() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        Some(Self { storage })
    }
}

fn backend_error(key: &str, err: &JsValue) -> StoreError {
    StoreError::Backend {
        key: String::from(key),
        message: js_message(err),
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        match self.storage.get_item(key) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("localStorage read of `{key}` failed: {}", js_message(&err));
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage
            .set_item(key, value)
            .map_err(|err| backend_error(key, &err))
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.storage
            .remove_item(key)
            .map_err(|err| backend_error(key, &err))
    }
}
