// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drag-sortable layer list, as seen by the controller.

use alloc::string::String;
use alloc::vec::Vec;

use crate::layer::{ButtonOverrides, LayerId, LayerKind};

use super::config::KindButtons;

/// Which buttons an item shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ButtonSet {
    /// Rename.
    pub edit: bool,
    /// Download; only ever set for feature layers.
    pub download: bool,
    /// Delete.
    pub delete: bool,
}

impl ButtonSet {
    /// Resolves per-layer overrides against the tool-wide flags for `kind`.
    ///
    /// An override, when present, wins over the tool-wide flag.
    #[must_use]
    pub fn resolve(kind: LayerKind, global: &KindButtons, layer: ButtonOverrides) -> Self {
        let enabled = |layer: Option<bool>, global: bool| !layer.unwrap_or(global);
        Self {
            edit: enabled(layer.disable_edit, global.disable_edit),
            download: kind == LayerKind::Feature
                && enabled(layer.disable_download, global.disable_download),
            delete: enabled(layer.disable_delete, global.disable_delete),
        }
    }
}

/// What a list item displays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemModel {
    /// Layer id; the item's stable identity.
    pub id: LayerId,
    /// Which list the item belongs to.
    pub kind: LayerKind,
    /// Truncated name shown in the label.
    pub label: String,
    /// Full name, shown as the label's tooltip.
    pub name: String,
    /// Value of the item's `data-sort-index`.
    pub sort_index: u32,
    /// Checkbox state.
    pub is_visible: bool,
    /// Active marker; feature layers only.
    pub is_active: bool,
    /// Button cluster.
    pub buttons: ButtonSet,
}

/// A user gesture on a list item, as reported by the view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemAction {
    /// Create button above a list clicked.
    Create(LayerKind),
    /// Visibility checkbox clicked.
    ToggleVisibility(LayerKind, LayerId),
    /// Feature layer label clicked.
    Activate(LayerId),
    /// Edit button clicked.
    Rename(LayerKind, LayerId),
    /// Delete button clicked.
    Delete(LayerKind, LayerId),
    /// Download button clicked.
    Download(LayerId),
}

/// A pair of drag-sortable lists, one per [`LayerKind`].
///
/// The view is a projection of the registry. It never changes visibility,
/// order, or names on its own; user gestures come back as [`ItemAction`]s and
/// drag ends as [`DragEnd`](crate::ordering::DragEnd)s.
pub trait LayerListView {
    /// Appends an item.
    fn insert_item(&mut self, item: &ItemModel);

    /// Removes the item for `id`. Unknown ids are ignored.
    fn remove_item(&mut self, kind: LayerKind, id: &LayerId);

    /// Sets the checkbox and the hidden-state styling.
    fn set_item_visible(&mut self, kind: LayerKind, id: &LayerId, visible: bool);

    /// Sets or clears the active marker of a feature layer item.
    fn set_item_active(&mut self, id: &LayerId, active: bool);

    /// Sets the label text and its tooltip.
    fn set_item_label(&mut self, kind: LayerKind, id: &LayerId, label: &str, tooltip: &str);

    /// Writes the item's `data-sort-index`.
    fn set_item_sort_index(&mut self, kind: LayerKind, id: &LayerId, index: u32);

    /// Item ids in on-screen order, top first.
    fn order(&self, kind: LayerKind) -> Vec<LayerId>;

    /// Rearranges the items in descending `data-sort-index` order.
    fn sort_desc(&mut self, kind: LayerKind);
}

/// Shortens `name` to at most `max` characters, marking the cut with an
/// ellipsis.
#[must_use]
pub fn truncate_label(name: &str, max: usize) -> String {
    match name.char_indices().nth(max) {
        Some((cut, _)) => {
            let mut label = String::from(&name[..cut]);
            label.push('\u{2026}');
            label
        }
        None => String::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_are_untouched() {
        assert_eq!(truncate_label("Roads", 20), "Roads");
        assert_eq!(truncate_label("exactly", 7), "exactly");
    }

    #[test]
    fn long_names_are_cut_on_char_boundaries() {
        assert_eq!(truncate_label("Öffentliche Verkehrsmittel", 5), "Öffen\u{2026}");
    }

    #[test]
    fn overrides_win_over_tool_flags() {
        let global = KindButtons {
            disable_delete: true,
            ..KindButtons::default()
        };
        let overrides = ButtonOverrides {
            disable_delete: Some(false),
            disable_edit: Some(true),
            ..ButtonOverrides::default()
        };
        let set = ButtonSet::resolve(LayerKind::Feature, &global, overrides);
        assert_eq!(
            set,
            ButtonSet {
                edit: false,
                download: true,
                delete: true,
            }
        );
    }

    #[test]
    fn map_layers_never_offer_download() {
        let set = ButtonSet::resolve(
            LayerKind::Map,
            &KindButtons::default(),
            ButtonOverrides::default(),
        );
        assert!(!set.download);
        assert!(set.edit && set.delete);
    }
}
