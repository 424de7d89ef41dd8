// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser implementations of the tool's host collaborators.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use core::fmt;

use strata_core::feature::FeatureId;
use strata_core::layer::{LayerId, MapLayerSpec, MapSourceType};
use strata_core::tool::{Dialogs, Downloader, NoticeLevel, Notifier, Overlays};
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Blob, BlobPropertyBag, Document, Element, HtmlAnchorElement, HtmlElement, Url, Window};

use crate::js_message;

const TOAST_MILLIS: i32 = 4000;

/// Dialogs built on the blocking `window.confirm` and `window.prompt`.
///
/// Callbacks run before the dialog method returns.
pub struct BrowserDialogs {
    window: Window,
}

impl fmt::Debug for BrowserDialogs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrowserDialogs").finish_non_exhaustive()
    }
}

impl BrowserDialogs {
    /// Uses the global window, if there is one.
    #[must_use]
    pub fn new() -> Option<Self> {
        Some(Self {
            window: web_sys::window()?,
        })
    }

    fn ask(&self, message: &str, initial: &str) -> Option<String> {
        self.window
            .prompt_with_message_and_default(message, initial)
            .ok()
            .flatten()
    }
}

/// Finds the option a typed answer refers to, ignoring case and surrounding
/// whitespace.
fn match_option<'a>(options: &[&'a str], answer: &str) -> Option<&'a str> {
    let answer = answer.trim();
    options
        .iter()
        .copied()
        .find(|option| option.eq_ignore_ascii_case(answer))
}

impl Dialogs for BrowserDialogs {
    fn confirm(&self, title: &str, message: &str, on_confirm: Box<dyn FnOnce()>) {
        let text = format!("{title}\n\n{message}");
        if self.window.confirm_with_message(&text).unwrap_or(false) {
            on_confirm();
        }
    }

    fn prompt(&self, title: &str, initial: &str, on_submit: Box<dyn FnOnce(String)>) {
        if let Some(text) = self.ask(title, initial) {
            on_submit(text);
        }
    }

    fn select(&self, title: &str, options: &[&str], on_select: Box<dyn FnOnce(String)>) {
        let Some(first) = options.first() else {
            return;
        };
        let message = format!("{title} ({})", options.join(", "));
        let Some(answer) = self.ask(&message, first) else {
            return;
        };
        match match_option(options, &answer) {
            Some(option) => on_select(String::from(option)),
            None => log::warn!("`{answer}` is not one of {options:?}"),
        }
    }

    fn map_layer_form(&self, projections: &[String], on_submit: Box<dyn FnOnce(MapLayerSpec)>) {
        let Some(name) = self.ask("Layer name", "") else {
            return;
        };
        let Some(url) = self.ask("Tile URL template (leave empty for OpenStreetMap)", "") else {
            return;
        };
        let initial = projections.first().map_or("", String::as_str);
        let Some(projection) = self.ask(
            &format!("Projection ({})", projections.join(", ")),
            initial,
        ) else {
            return;
        };

        let mut spec = MapLayerSpec::new(name.trim());
        spec.projection = String::from(projection.trim());
        let url = url.trim();
        if !url.is_empty() {
            spec.source = MapSourceType::Xyz;
            spec.url = String::from(url);
        }
        on_submit(spec);
    }
}

fn level_class(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "strata-toast--info",
        NoticeLevel::Success => "strata-toast--success",
        NoticeLevel::Error => "strata-toast--error",
    }
}

/// Shows notices as transient elements appended to a host element.
///
/// Every notice is also written to the log.
pub struct ToastNotifier {
    document: Document,
    host: Element,
}

impl fmt::Debug for ToastNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToastNotifier")
            .field("host", &self.host.id())
            .finish_non_exhaustive()
    }
}

impl ToastNotifier {
    /// Appends toasts to `host`.
    #[must_use]
    pub fn new(document: &Document, host: &Element) -> Self {
        Self {
            document: document.clone(),
            host: host.clone(),
        }
    }

    fn show(&self, level: NoticeLevel, message: &str) -> Result<(), JsValue> {
        let toast: HtmlElement = self.document.create_element("div")?.unchecked_into();
        toast.set_class_name(&format!("strata-toast {}", level_class(level)));
        toast.set_text_content(Some(message));
        self.host.append_child(&toast)?;

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let expire = Closure::once_into_js(move || toast.remove());
        window.set_timeout_with_callback_and_timeout_and_arguments_0(
            expire.unchecked_ref(),
            TOAST_MILLIS,
        )?;
        Ok(())
    }
}

impl Notifier for ToastNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Error => log::error!("{message}"),
            NoticeLevel::Info | NoticeLevel::Success => log::info!("{message}"),
        }
        if let Err(err) = self.show(level, message) {
            log::warn!("failed to show notice: {}", js_message(&err));
        }
    }
}

/// DOM id of a feature's tooltip overlay element.
fn tooltip_dom_id(layer: &LayerId, feature: &FeatureId) -> String {
    format!("strata-tooltip-{layer}-{feature}")
}

/// Shows and hides tooltip overlay elements by id.
///
/// Overlay elements are created by the map integration with the id
/// `strata-tooltip-{layer}-{feature}`.
pub struct DomOverlays {
    document: Document,
}

impl fmt::Debug for DomOverlays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomOverlays").finish_non_exhaustive()
    }
}

impl DomOverlays {
    /// Looks overlays up in `document`.
    #[must_use]
    pub fn new(document: &Document) -> Self {
        Self {
            document: document.clone(),
        }
    }
}

impl Overlays for DomOverlays {
    fn set_tooltip_visible(&self, layer: &LayerId, feature: &FeatureId, visible: bool) {
        let Some(el) = self
            .document
            .get_element_by_id(&tooltip_dom_id(layer, feature))
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };
        let style = el.style();
        if visible {
            let _ = style.remove_property("display");
        } else {
            let _ = style.set_property("display", "none");
        }
    }
}

/// Saves exports through a temporary object URL and a synthetic link click.
pub struct BlobDownloader {
    document: Document,
}

impl fmt::Debug for BlobDownloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobDownloader").finish_non_exhaustive()
    }
}

impl BlobDownloader {
    /// Creates links in `document`.
    #[must_use]
    pub fn new(document: &Document) -> Self {
        Self {
            document: document.clone(),
        }
    }

    fn save(&self, file_name: &str, mime_type: &str, content: &str) -> Result<(), JsValue> {
        let parts = js_sys::Array::of1(&JsValue::from_str(content));
        let options = BlobPropertyBag::new();
        options.set_type(mime_type);
        let blob = Blob::new_with_str_sequence_and_options(&parts, &options)?;
        let url = Url::create_object_url_with_blob(&blob)?;

        let anchor: HtmlAnchorElement = self.document.create_element("a")?.unchecked_into();
        anchor.set_href(&url);
        anchor.set_download(file_name);
        anchor.click();
        Url::revoke_object_url(&url)
    }
}

impl Downloader for BlobDownloader {
    fn download(&self, file_name: &str, mime_type: &str, content: &str) {
        if let Err(err) = self.save(file_name, mime_type, content) {
            log::error!("download of `{file_name}` failed: {}", js_message(&err));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_match_case_insensitively() {
        let options = ["geojson", "wkt"];
        assert_eq!(match_option(&options, " WKT "), Some("wkt"));
        assert_eq!(match_option(&options, "GeoJSON"), Some("geojson"));
        assert_eq!(match_option(&options, "kml"), None);
    }

    #[test]
    fn tooltip_ids_combine_layer_and_feature() {
        assert_eq!(
            tooltip_dom_id(&LayerId::new("pins"), &FeatureId::new("p1")),
            "strata-tooltip-pins-p1"
        );
    }

    #[test]
    fn every_level_has_its_own_class() {
        assert_ne!(level_class(NoticeLevel::Info), level_class(NoticeLevel::Error));
        assert_ne!(
            level_class(NoticeLevel::Success),
            level_class(NoticeLevel::Error)
        );
    }
}
