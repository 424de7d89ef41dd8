// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser backend for strata.
//!
//! This crate provides the browser side of a layer tool:
//!
//! - [`DomLayerList`]: the drag-sortable lists, as a
//!   [`LayerListView`](strata_core::tool::LayerListView)
//! - [`SortableList`]: `SortableJS` drag-end binding
//! - [`LocalStorage`]: `window.localStorage` as a
//!   [`KeyValueStore`](strata_core::persist::KeyValueStore)
//! - [`BrowserDialogs`], [`ToastNotifier`], [`DomOverlays`],
//!   [`BlobDownloader`]: host collaborators
//! - [`JsLayerFactory`] and [`RandomIds`]: renderable layers and ids supplied
//!   by JavaScript

#![no_std]

extern crate alloc;

mod host;
mod layer;
mod list;
mod sortable;
mod storage;

pub use host::{BlobDownloader, BrowserDialogs, DomOverlays, ToastNotifier};
pub use layer::{JsLayer, JsLayerFactory, JsLayerHost, RandomIds};
pub use list::{ActionSlot, DomLayerList};
pub use sortable::SortableList;
pub use storage::LocalStorage;

use alloc::string::String;

use wasm_bindgen::JsValue;

/// Best-effort message of a thrown JavaScript value.
pub(crate) fn js_message(err: &JsValue) -> String {
    if let Some(text) = err.as_string() {
        return text;
    }
    js_sys::Reflect::get(err, &JsValue::from_str("message"))
        .ok()
        .and_then(|message| message.as_string())
        .unwrap_or_else(|| String::from("unknown JavaScript error"))
}
