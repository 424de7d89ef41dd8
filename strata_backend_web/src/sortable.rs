// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `SortableJS` binding.
//!
//! `SortableJS` moves the dragged `<li>` itself and then reports the old and
//! new positions through its `onEnd` option. [`SortableList`] turns that
//! report into a [`DragEnd`].

use alloc::boxed::Box;
use core::fmt;

use strata_core::ordering::DragEnd;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = Sortable)]
    type SortableJs;

    #[wasm_bindgen(static_method_of = SortableJs, js_class = "Sortable")]
    fn create(element: &HtmlElement, options: &JsValue) -> SortableJs;

    #[wasm_bindgen(method)]
    fn destroy(this: &SortableJs);
}

/// Converts a `SortableJS` index to a list position.
fn position(value: f64) -> Option<usize> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "list positions are small non-negative integers"
    )]
    Some(value as usize)
}

fn index_field(event: &JsValue, name: &str) -> Option<usize> {
    js_sys::Reflect::get(event, &JsValue::from_str(name))
        .ok()?
        .as_f64()
        .and_then(position)
}

fn drag_end(event: &JsValue) -> Option<DragEnd> {
    Some(DragEnd {
        old_position: index_field(event, "oldIndex")?,
        new_position: index_field(event, "newIndex")?,
    })
}

/// A `SortableJS` instance bound to one list.
///
/// Dropping the value destroys the instance and its `onEnd` callback.
pub struct SortableList {
    sortable: SortableJs,
    _on_end: Closure<dyn FnMut(JsValue)>,
}

impl fmt::Debug for SortableList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortableList").finish_non_exhaustive()
    }
}

impl Drop for SortableList {
    fn drop(&mut self) {
        self.sortable.destroy();
    }
}

impl SortableList {
    /// Makes the children of `list` draggable.
    ///
    /// `on_end` runs after every drop that `SortableJS` reports with both
    /// indices, including drops back onto the starting position.
    pub fn attach(
        list: &HtmlElement,
        mut on_end: impl FnMut(DragEnd) + 'static,
    ) -> Result<Self, JsValue> {
        let callback = Closure::wrap(Box::new(move |event: JsValue| {
            match drag_end(&event) {
                Some(drag) => on_end(drag),
                None => log::warn!("ignoring drag end without list indices"),
            }
        }) as Box<dyn FnMut(_)>);

        let options = js_sys::Object::new();
        js_sys::Reflect::set(&options, &"animation".into(), &JsValue::from_f64(150.0))?;
        js_sys::Reflect::set(&options, &"draggable".into(), &"li".into())?;
        js_sys::Reflect::set(&options, &"onEnd".into(), callback.as_ref())?;

        Ok(Self {
            sortable: SortableJs::create(list, &options),
            _on_end: callback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_are_whole_and_non_negative() {
        assert_eq!(position(0.0), Some(0));
        assert_eq!(position(3.0), Some(3));
        assert_eq!(position(-1.0), None);
        assert_eq!(position(f64::NAN), None);
        assert_eq!(position(f64::INFINITY), None);
    }
}
