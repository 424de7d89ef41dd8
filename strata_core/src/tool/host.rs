// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborators the layer tool borrows from the page hosting it.
//!
//! Dialogs answer through boxed callbacks. A host may invoke them
//! synchronously or later from its own event loop; the tool holds no borrows
//! across a dialog call either way.

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

use crate::feature::FeatureId;
use crate::layer::{LayerId, MapLayerSpec};

/// Severity of a user-facing notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    /// Something happened.
    Info,
    /// A user action completed.
    Success,
    /// A user action was refused or failed.
    Error,
}

/// Confirm, prompt, and select dialogs plus the map layer form.
pub trait Dialogs {
    /// Asks a yes/no question; `on_confirm` runs only on yes.
    fn confirm(&self, title: &str, message: &str, on_confirm: Box<dyn FnOnce()>);

    /// Asks for a line of text seeded with `initial`.
    fn prompt(&self, title: &str, initial: &str, on_submit: Box<dyn FnOnce(String)>);

    /// Asks the user to pick one of `options`; the callback receives the
    /// chosen option.
    fn select(&self, title: &str, options: &[&str], on_select: Box<dyn FnOnce(String)>);

    /// Shows the map layer creation form offering the registered
    /// `projections`.
    fn map_layer_form(&self, projections: &[String], on_submit: Box<dyn FnOnce(MapLayerSpec)>);
}

/// Transient notifications (toasts).
pub trait Notifier {
    /// Shows `message`.
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// Per-feature tooltip overlays drawn on the map.
pub trait Overlays {
    /// Shows or hides the overlay of `feature` in `layer`.
    fn set_tooltip_visible(&self, layer: &LayerId, feature: &FeatureId, visible: bool);
}

/// Saves generated text as a file on the user's machine.
pub trait Downloader {
    /// Offers `content` for download as `file_name`.
    fn download(&self, file_name: &str, mime_type: &str, content: &str);
}

/// Notifier that writes to the log instead of the page.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info | NoticeLevel::Success => log::info!("{message}"),
            NoticeLevel::Error => log::error!("{message}"),
        }
    }
}

/// Host collaborators of a [`LayerTool`](super::LayerTool).
pub struct ToolHost {
    /// Dialogs.
    pub dialogs: Box<dyn Dialogs>,
    /// Notifications.
    pub notifier: Box<dyn Notifier>,
    /// Tooltip overlays.
    pub overlays: Box<dyn Overlays>,
    /// File downloads.
    pub downloader: Box<dyn Downloader>,
}

impl fmt::Debug for ToolHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolHost").finish_non_exhaustive()
    }
}

impl ToolHost {
    /// Bundles host collaborators.
    pub fn new(
        dialogs: impl Dialogs + 'static,
        notifier: impl Notifier + 'static,
        overlays: impl Overlays + 'static,
        downloader: impl Downloader + 'static,
    ) -> Self {
        Self {
            dialogs: Box::new(dialogs),
            notifier: Box::new(notifier),
            overlays: Box::new(overlays),
            downloader: Box::new(downloader),
        }
    }

    pub(crate) fn hide_tooltips(&self, layer: &LayerId, features: &[FeatureId]) {
        self.show_tooltips(layer, features, false);
    }

    pub(crate) fn show_tooltips(&self, layer: &LayerId, features: &[FeatureId], visible: bool) {
        for feature in features {
            self.overlays.set_tooltip_visible(layer, feature, visible);
        }
    }
}

