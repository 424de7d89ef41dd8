// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM rendering of the two layer lists.
//!
//! Each list is a `<section>` holding a header and a `<ul>`. Items are `<li>`
//! elements carrying `data-layer-id` and `data-sort-index`; their controls
//! carry `data-action`. One delegated click listener per section turns clicks
//! into [`ItemAction`]s, so items can be added and removed without managing a
//! closure per control.

use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use strata_core::layer::{LayerId, LayerKind};
use strata_core::tool::{ItemAction, ItemModel, LayerListView, LayerToolConfig};
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, HtmlElement, HtmlInputElement};

use crate::js_message;

const ITEM_CLASS: &str = "strata-layer-item";
const HIDDEN_CLASS: &str = "strata-layer-item--hidden";
const ACTIVE_CLASS: &str = "strata-layer-item--active";
const NAME_CLASS: &str = "strata-layer-name";

type Handler = Rc<dyn Fn(ItemAction)>;

/// Where a [`DomLayerList`] sends user gestures.
///
/// The list is created before the tool that owns it, so the handler is
/// connected afterwards. Clones share the same slot.
#[derive(Clone, Default)]
pub struct ActionSlot(Rc<RefCell<Option<Handler>>>);

impl fmt::Debug for ActionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ActionSlot")
            .field(&self.0.borrow().is_some())
            .finish()
    }
}

impl ActionSlot {
    /// Routes future gestures to `handler`, replacing any previous one.
    pub fn connect(&self, handler: impl Fn(ItemAction) + 'static) {
        *self.0.borrow_mut() = Some(Rc::new(handler));
    }

    /// Drops the handler; gestures are ignored until the next `connect`.
    pub fn disconnect(&self) {
        self.0.borrow_mut().take();
    }

    fn fire(&self, action: ItemAction) {
        // The handler may reconnect the slot, so it runs without the borrow.
        let handler = self.0.borrow().clone();
        if let Some(handler) = handler {
            handler(action);
        }
    }
}

/// Maps a control's `data-action` to an [`ItemAction`].
fn parse_action(kind: LayerKind, action: &str, id: Option<LayerId>) -> Option<ItemAction> {
    if action == "create" {
        return Some(ItemAction::Create(kind));
    }
    let id = id?;
    match (action, kind) {
        ("toggle", _) => Some(ItemAction::ToggleVisibility(kind, id)),
        ("activate", LayerKind::Feature) => Some(ItemAction::Activate(id)),
        ("rename", _) => Some(ItemAction::Rename(kind, id)),
        ("delete", _) => Some(ItemAction::Delete(kind, id)),
        ("download", LayerKind::Feature) => Some(ItemAction::Download(id)),
        _ => None,
    }
}

fn section_title(kind: LayerKind) -> &'static str {
    match kind {
        LayerKind::Map => "Map layers",
        LayerKind::Feature => "Feature layers",
    }
}

fn element(document: &Document, tag: &str, class: &str) -> Result<HtmlElement, JsValue> {
    let el: HtmlElement = document.create_element(tag)?.unchecked_into();
    el.set_class_name(class);
    Ok(el)
}

fn children(parent: &Element) -> impl Iterator<Item = Element> {
    let collection = parent.children();
    (0..collection.length()).filter_map(move |i| collection.item(i))
}

fn sort_index_of(item: &Element) -> u32 {
    item.get_attribute("data-sort-index")
        .and_then(|index| index.parse().ok())
        .unwrap_or(0)
}

struct KindList {
    root: HtmlElement,
    list: HtmlElement,
    on_click: Closure<dyn FnMut(Event)>,
}

impl Drop for KindList {
    fn drop(&mut self) {
        let _ = self
            .root
            .remove_event_listener_with_callback("click", self.on_click.as_ref().unchecked_ref());
        self.root.remove();
    }
}

impl KindList {
    fn new(
        document: &Document,
        host: &Element,
        kind: LayerKind,
        show_create: bool,
        actions: &ActionSlot,
    ) -> Result<Self, JsValue> {
        let root = element(document, "section", "strata-layer-section")?;
        root.set_attribute("data-kind", kind.as_str())?;

        let header = element(document, "header", "strata-layer-header")?;
        let title = element(document, "span", "strata-layer-title")?;
        title.set_text_content(Some(section_title(kind)));
        header.append_child(&title)?;
        if show_create {
            let create = element(document, "button", "strata-layer-create")?;
            create.set_attribute("type", "button")?;
            create.set_attribute("data-action", "create")?;
            create.set_title(&format!("Add {kind} layer"));
            create.set_text_content(Some("+"));
            header.append_child(&create)?;
        }
        root.append_child(&header)?;

        let list = element(document, "ul", "strata-layer-list")?;
        root.append_child(&list)?;
        host.append_child(&root)?;

        let slot = actions.clone();
        let on_click = Closure::wrap(Box::new(move |event: Event| {
            let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
                return;
            };
            let Ok(Some(control)) = target.closest("[data-action]") else {
                return;
            };
            let Some(action) = control.get_attribute("data-action") else {
                return;
            };
            let id = control
                .closest("li[data-layer-id]")
                .ok()
                .flatten()
                .and_then(|item| item.get_attribute("data-layer-id"))
                .map(LayerId::new);
            if let Some(action) = parse_action(kind, &action, id) {
                slot.fire(action);
            }
        }) as Box<dyn FnMut(_)>);
        root.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;

        Ok(Self {
            root,
            list,
            on_click,
        })
    }

    fn find(&self, id: &LayerId) -> Option<Element> {
        children(&self.list).find(|item| {
            item.get_attribute("data-layer-id")
                .is_some_and(|value| value == id.as_str())
        })
    }
}

/// A [`LayerListView`] rendered into the DOM.
///
/// Drop the list to remove its sections from the page.
pub struct DomLayerList {
    document: Document,
    map: KindList,
    features: KindList,
    actions: ActionSlot,
}

impl fmt::Debug for DomLayerList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomLayerList")
            .field("map_items", &self.map.list.child_element_count())
            .field("feature_items", &self.features.list.child_element_count())
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}

impl DomLayerList {
    /// Appends a map layer section to `map_host` and a feature layer section
    /// to `feature_host`.
    ///
    /// Create buttons are shown unless `config` disables creation for the
    /// kind.
    pub fn new(
        document: &Document,
        map_host: &Element,
        feature_host: &Element,
        config: &LayerToolConfig,
    ) -> Result<Self, JsValue> {
        let actions = ActionSlot::default();
        let map = KindList::new(
            document,
            map_host,
            LayerKind::Map,
            !config.buttons(LayerKind::Map).disable_create,
            &actions,
        )?;
        let features = KindList::new(
            document,
            feature_host,
            LayerKind::Feature,
            !config.buttons(LayerKind::Feature).disable_create,
            &actions,
        )?;
        Ok(Self {
            document: document.clone(),
            map,
            features,
            actions,
        })
    }

    /// The slot user gestures are delivered to.
    #[must_use]
    pub fn actions(&self) -> ActionSlot {
        self.actions.clone()
    }

    /// The `<ul>` holding the items of `kind`, for attaching a drag handler.
    #[must_use]
    pub fn list_element(&self, kind: LayerKind) -> &HtmlElement {
        &self.kind_list(kind).list
    }

    fn kind_list(&self, kind: LayerKind) -> &KindList {
        match kind {
            LayerKind::Map => &self.map,
            LayerKind::Feature => &self.features,
        }
    }

    fn build_item(&self, item: &ItemModel) -> Result<Element, JsValue> {
        let li = element(&self.document, "li", ITEM_CLASS)?;
        li.set_attribute("data-layer-id", item.id.as_str())?;
        li.set_attribute("data-sort-index", &format!("{}", item.sort_index))?;
        let classes = li.class_list();
        classes.toggle_with_force(HIDDEN_CLASS, !item.is_visible)?;
        classes.toggle_with_force(ACTIVE_CLASS, item.is_active)?;

        let checkbox: HtmlInputElement = self.document.create_element("input")?.unchecked_into();
        checkbox.set_type("checkbox");
        checkbox.set_checked(item.is_visible);
        checkbox.set_attribute("data-action", "toggle")?;
        li.append_child(&checkbox)?;

        let name = element(&self.document, "span", NAME_CLASS)?;
        name.set_text_content(Some(&item.label));
        name.set_title(&item.name);
        if item.kind == LayerKind::Feature {
            name.set_attribute("data-action", "activate")?;
        }
        li.append_child(&name)?;

        let buttons = element(&self.document, "span", "strata-layer-buttons")?;
        for (shown, action, text) in [
            (item.buttons.edit, "rename", "Rename"),
            (item.buttons.download, "download", "Download"),
            (item.buttons.delete, "delete", "Delete"),
        ] {
            if !shown {
                continue;
            }
            let button = element(&self.document, "button", "strata-layer-button")?;
            button.set_attribute("type", "button")?;
            button.set_attribute("data-action", action)?;
            button.set_title(text);
            button.set_text_content(Some(text));
            buttons.append_child(&button)?;
        }
        li.append_child(&buttons)?;
        Ok(li.into())
    }
}

impl LayerListView for DomLayerList {
    fn insert_item(&mut self, item: &ItemModel) {
        let list = &self.kind_list(item.kind).list;
        let appended = self
            .build_item(item)
            .and_then(|li| list.append_child(&li).map(drop));
        if let Err(err) = appended {
            log::warn!("failed to render layer item {}: {}", item.id, js_message(&err));
        }
    }

    fn remove_item(&mut self, kind: LayerKind, id: &LayerId) {
        if let Some(item) = self.kind_list(kind).find(id) {
            item.remove();
        }
    }

    fn set_item_visible(&mut self, kind: LayerKind, id: &LayerId, visible: bool) {
        let Some(item) = self.kind_list(kind).find(id) else {
            return;
        };
        let _ = item.class_list().toggle_with_force(HIDDEN_CLASS, !visible);
        if let Ok(Some(checkbox)) = item.query_selector("input[data-action=toggle]")
            && let Ok(checkbox) = checkbox.dyn_into::<HtmlInputElement>()
        {
            checkbox.set_checked(visible);
        }
    }

    fn set_item_active(&mut self, id: &LayerId, active: bool) {
        if let Some(item) = self.features.find(id) {
            let _ = item.class_list().toggle_with_force(ACTIVE_CLASS, active);
        }
    }

    fn set_item_label(&mut self, kind: LayerKind, id: &LayerId, label: &str, tooltip: &str) {
        let Some(item) = self.kind_list(kind).find(id) else {
            return;
        };
        if let Ok(Some(name)) = item.query_selector(&format!(".{NAME_CLASS}")) {
            name.set_text_content(Some(label));
            let _ = name.set_attribute("title", tooltip);
        }
    }

    fn set_item_sort_index(&mut self, kind: LayerKind, id: &LayerId, index: u32) {
        if let Some(item) = self.kind_list(kind).find(id) {
            let _ = item.set_attribute("data-sort-index", &format!("{index}"));
        }
    }

    fn order(&self, kind: LayerKind) -> Vec<LayerId> {
        children(&self.kind_list(kind).list)
            .filter_map(|item| item.get_attribute("data-layer-id"))
            .map(LayerId::new)
            .collect()
    }

    fn sort_desc(&mut self, kind: LayerKind) {
        let list = &self.kind_list(kind).list;
        let mut items: Vec<(u32, Element)> = children(list)
            .map(|item| (sort_index_of(&item), item))
            .collect();
        items.sort_by(|a, b| b.0.cmp(&a.0));
        // Re-appending moves an existing node to the end.
        for (_, item) in items {
            let _ = list.append_child(&item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_needs_no_item() {
        assert_eq!(
            parse_action(LayerKind::Map, "create", None),
            Some(ItemAction::Create(LayerKind::Map))
        );
    }

    #[test]
    fn item_actions_need_an_id() {
        assert_eq!(parse_action(LayerKind::Map, "toggle", None), None);
        assert_eq!(
            parse_action(LayerKind::Map, "toggle", Some(LayerId::new("osm"))),
            Some(ItemAction::ToggleVisibility(LayerKind::Map, LayerId::new("osm")))
        );
    }

    #[test]
    fn feature_only_actions_are_ignored_on_map_items() {
        let id = || Some(LayerId::new("osm"));
        assert_eq!(parse_action(LayerKind::Map, "activate", id()), None);
        assert_eq!(parse_action(LayerKind::Map, "download", id()), None);
        assert_eq!(
            parse_action(LayerKind::Feature, "download", Some(LayerId::new("pins"))),
            Some(ItemAction::Download(LayerId::new("pins")))
        );
    }

    #[test]
    fn unknown_actions_are_ignored() {
        assert_eq!(
            parse_action(LayerKind::Feature, "explode", Some(LayerId::new("pins"))),
            None
        );
    }
}
