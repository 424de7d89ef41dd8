// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory stand-ins for the collaborators of the registry and the tool.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};

use crate::event::LayerEvent;
use crate::feature::{FeatureId, FeatureSource};
use crate::layer::{
    BuildError, DetachedFactory, LayerFactory, LayerId, LayerKind, LayerSpec, MapLayerSpec,
    RenderLayer,
};
use crate::registry::LayerManager;
use crate::tool::{
    ButtonSet, Dialogs, Downloader, ItemModel, LayerListView, NoticeLevel, Notifier, Overlays,
    ToolHost,
};

/// Records every event the manager emits.
#[derive(Clone, Default)]
pub(crate) struct EventLog(Rc<RefCell<Vec<LayerEvent>>>);

impl EventLog {
    pub(crate) fn attach(manager: &LayerManager) -> Self {
        let log = Self::default();
        let sink = Rc::clone(&log.0);
        manager
            .events()
            .subscribe(move |event| sink.borrow_mut().push(event.clone()));
        log
    }

    pub(crate) fn names(&self) -> Vec<&'static str> {
        self.0.borrow().iter().map(LayerEvent::name).collect()
    }
}

/// Z-index writes, in call order, as `(layer id, z)`.
#[derive(Clone, Default)]
pub(crate) struct ZLog(Rc<RefCell<Vec<(String, i32)>>>);

impl ZLog {
    pub(crate) fn calls(&self) -> Vec<(String, i32)> {
        self.0.borrow().clone()
    }

    pub(crate) fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// A detached layer that logs its z-index writes.
struct RecordingLayer {
    id: String,
    inner: Box<dyn RenderLayer>,
    log: ZLog,
}

impl RenderLayer for RecordingLayer {
    fn is_visible(&self) -> bool {
        self.inner.is_visible()
    }

    fn set_visible(&mut self, visible: bool) {
        self.inner.set_visible(visible);
    }

    fn z_index(&self) -> i32 {
        self.inner.z_index()
    }

    fn set_z_index(&mut self, index: i32) {
        self.log.0.borrow_mut().push((self.id.clone(), index));
        self.inner.set_z_index(index);
    }

    fn features(&self) -> Option<&FeatureSource> {
        self.inner.features()
    }

    fn features_mut(&mut self) -> Option<&mut FeatureSource> {
        self.inner.features_mut()
    }
}

/// Builds [`RecordingLayer`]s sharing one [`ZLog`].
pub(crate) struct RecordingFactory {
    log: ZLog,
}

impl RecordingFactory {
    pub(crate) fn new(log: &ZLog) -> Self {
        Self { log: log.clone() }
    }
}

impl LayerFactory for RecordingFactory {
    fn build(&self, id: &LayerId, spec: &LayerSpec) -> Result<Box<dyn RenderLayer>, BuildError> {
        Ok(Box::new(RecordingLayer {
            id: String::from(id.as_str()),
            inner: DetachedFactory.build(id, spec)?,
            log: self.log.clone(),
        }))
    }
}

/// Visibility flags of [`SharedVisibilityLayer`]s by layer id.
///
/// Flipping a flag changes the renderable without going through the
/// registry, the way another map control would.
#[derive(Clone, Default)]
pub(crate) struct VisibilityFlags(Rc<RefCell<Vec<(LayerId, Rc<Cell<bool>>)>>>);

impl VisibilityFlags {
    pub(crate) fn flag(&self, id: &LayerId) -> Rc<Cell<bool>> {
        let flags = self.0.borrow();
        let (_, flag) = flags
            .iter()
            .find(|(layer, _)| layer == id)
            .expect("no layer built with this id");
        Rc::clone(flag)
    }
}

/// A renderable whose visibility lives in a shared cell.
struct SharedVisibilityLayer {
    visible: Rc<Cell<bool>>,
    inner: Box<dyn RenderLayer>,
}

impl RenderLayer for SharedVisibilityLayer {
    fn is_visible(&self) -> bool {
        self.visible.get()
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible.set(visible);
    }

    fn z_index(&self) -> i32 {
        self.inner.z_index()
    }

    fn set_z_index(&mut self, index: i32) {
        self.inner.set_z_index(index);
    }

    fn features(&self) -> Option<&FeatureSource> {
        self.inner.features()
    }

    fn features_mut(&mut self) -> Option<&mut FeatureSource> {
        self.inner.features_mut()
    }
}

/// Builds [`SharedVisibilityLayer`]s and registers their flags.
pub(crate) struct SharedVisibilityFactory {
    flags: VisibilityFlags,
}

impl SharedVisibilityFactory {
    pub(crate) fn new(flags: &VisibilityFlags) -> Self {
        Self {
            flags: flags.clone(),
        }
    }
}

impl LayerFactory for SharedVisibilityFactory {
    fn build(&self, id: &LayerId, spec: &LayerSpec) -> Result<Box<dyn RenderLayer>, BuildError> {
        let visible = Rc::new(Cell::new(spec.is_visible()));
        self.flags
            .0
            .borrow_mut()
            .push((id.clone(), Rc::clone(&visible)));
        Ok(Box::new(SharedVisibilityLayer {
            visible,
            inner: DetachedFactory.build(id, spec)?,
        }))
    }
}

/// A factory whose rendering library always throws.
pub(crate) struct FailingFactory;

impl LayerFactory for FailingFactory {
    fn build(&self, _id: &LayerId, _spec: &LayerSpec) -> Result<Box<dyn RenderLayer>, BuildError> {
        Err(BuildError::new("source constructor threw"))
    }
}

#[derive(Default)]
struct ViewState {
    map: Vec<ItemModel>,
    feature: Vec<ItemModel>,
    visibility_calls: Vec<(LayerKind, LayerId)>,
    sorts: [usize; 2],
}

impl ViewState {
    fn list(&mut self, kind: LayerKind) -> &mut Vec<ItemModel> {
        match kind {
            LayerKind::Map => &mut self.map,
            LayerKind::Feature => &mut self.feature,
        }
    }

    fn item(&mut self, kind: LayerKind, id: &LayerId) -> Option<&mut ItemModel> {
        self.list(kind).iter_mut().find(|item| item.id == *id)
    }
}

fn slot(kind: LayerKind) -> usize {
    match kind {
        LayerKind::Map => 0,
        LayerKind::Feature => 1,
    }
}

/// A list view kept in memory. Clones share the same lists.
#[derive(Clone, Default)]
pub(crate) struct FakeView(Rc<RefCell<ViewState>>);

impl FakeView {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Lists every registered layer of `kind` in registry order.
    pub(crate) fn fill_from(&mut self, manager: &LayerManager, kind: LayerKind) {
        for record in manager.records(kind) {
            self.insert_item(&ItemModel {
                id: record.id.clone(),
                kind,
                label: record.name.clone(),
                name: record.name,
                sort_index: record.sort_index,
                is_visible: record.is_visible,
                is_active: false,
                buttons: ButtonSet::default(),
            });
        }
    }

    /// Moves an item the way a drag gesture would, without touching its
    /// sort index.
    pub(crate) fn move_item(&self, kind: LayerKind, from: usize, to: usize) {
        let mut state = self.0.borrow_mut();
        let list = state.list(kind);
        let item = list.remove(from);
        list.insert(to, item);
    }

    pub(crate) fn item(&self, kind: LayerKind, id: &LayerId) -> Option<ItemModel> {
        self.0.borrow_mut().item(kind, id).cloned()
    }

    pub(crate) fn sort_index(&self, kind: LayerKind, id: &LayerId) -> Option<u32> {
        self.item(kind, id).map(|item| item.sort_index)
    }

    pub(crate) fn sorts(&self, kind: LayerKind) -> usize {
        self.0.borrow().sorts[slot(kind)]
    }

    pub(crate) fn visibility_calls(&self, kind: LayerKind, id: &LayerId) -> usize {
        self.0
            .borrow()
            .visibility_calls
            .iter()
            .filter(|(k, i)| *k == kind && i == id)
            .count()
    }

    pub(crate) fn active_ids(&self) -> Vec<LayerId> {
        self.0
            .borrow()
            .feature
            .iter()
            .filter(|item| item.is_active)
            .map(|item| item.id.clone())
            .collect()
    }
}

impl LayerListView for FakeView {
    fn insert_item(&mut self, item: &ItemModel) {
        self.0.borrow_mut().list(item.kind).push(item.clone());
    }

    fn remove_item(&mut self, kind: LayerKind, id: &LayerId) {
        self.0.borrow_mut().list(kind).retain(|item| item.id != *id);
    }

    fn set_item_visible(&mut self, kind: LayerKind, id: &LayerId, visible: bool) {
        let mut state = self.0.borrow_mut();
        state.visibility_calls.push((kind, id.clone()));
        if let Some(item) = state.item(kind, id) {
            item.is_visible = visible;
        }
    }

    fn set_item_active(&mut self, id: &LayerId, active: bool) {
        if let Some(item) = self.0.borrow_mut().item(LayerKind::Feature, id) {
            item.is_active = active;
        }
    }

    fn set_item_label(&mut self, kind: LayerKind, id: &LayerId, label: &str, tooltip: &str) {
        if let Some(item) = self.0.borrow_mut().item(kind, id) {
            item.label = String::from(label);
            item.name = String::from(tooltip);
        }
    }

    fn set_item_sort_index(&mut self, kind: LayerKind, id: &LayerId, index: u32) {
        if let Some(item) = self.0.borrow_mut().item(kind, id) {
            item.sort_index = index;
        }
    }

    fn order(&self, kind: LayerKind) -> Vec<LayerId> {
        self.0
            .borrow_mut()
            .list(kind)
            .iter()
            .map(|item| item.id.clone())
            .collect()
    }

    fn sort_desc(&mut self, kind: LayerKind) {
        let mut state = self.0.borrow_mut();
        state.sorts[slot(kind)] += 1;
        state
            .list(kind)
            .sort_by(|a, b| b.sort_index.cmp(&a.sort_index));
    }
}

#[derive(Default)]
struct HostState {
    confirm: Cell<bool>,
    prompt: RefCell<Option<String>>,
    select: RefCell<Option<String>>,
    form: RefCell<Option<MapLayerSpec>>,
    form_projections: RefCell<Vec<String>>,
    dialogs_shown: Cell<usize>,
    notices: RefCell<Vec<(NoticeLevel, String)>>,
    tooltips: RefCell<Vec<(LayerId, FeatureId, bool)>>,
    downloads: RefCell<Vec<(String, String, String)>>,
}

/// Scripted dialogs that answer synchronously, plus recording notifier,
/// overlays, and downloader.
#[derive(Clone, Default)]
pub(crate) struct FakeHost(Rc<HostState>);

impl FakeHost {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn tool_host(&self) -> ToolHost {
        ToolHost::new(self.clone(), self.clone(), self.clone(), self.clone())
    }

    pub(crate) fn answer_confirm(&self, yes: bool) {
        self.0.confirm.set(yes);
    }

    pub(crate) fn answer_prompt(&self, text: &str) {
        *self.0.prompt.borrow_mut() = Some(String::from(text));
    }

    pub(crate) fn answer_select(&self, option: &str) {
        *self.0.select.borrow_mut() = Some(String::from(option));
    }

    pub(crate) fn answer_form(&self, spec: MapLayerSpec) {
        *self.0.form.borrow_mut() = Some(spec);
    }

    pub(crate) fn dialogs_shown(&self) -> usize {
        self.0.dialogs_shown.get()
    }

    pub(crate) fn form_projections(&self) -> Vec<String> {
        self.0.form_projections.borrow().clone()
    }

    pub(crate) fn notices(&self) -> Vec<(NoticeLevel, String)> {
        self.0.notices.borrow().clone()
    }

    pub(crate) fn tooltips(&self) -> Vec<(LayerId, FeatureId, bool)> {
        self.0.tooltips.borrow().clone()
    }

    pub(crate) fn downloads(&self) -> Vec<(String, String, String)> {
        self.0.downloads.borrow().clone()
    }

    fn shown(&self) {
        self.0.dialogs_shown.set(self.0.dialogs_shown.get() + 1);
    }
}

impl Dialogs for FakeHost {
    fn confirm(&self, _title: &str, _message: &str, on_confirm: Box<dyn FnOnce()>) {
        self.shown();
        if self.0.confirm.get() {
            on_confirm();
        }
    }

    fn prompt(&self, _title: &str, _initial: &str, on_submit: Box<dyn FnOnce(String)>) {
        self.shown();
        let answer = self.0.prompt.borrow_mut().take();
        if let Some(text) = answer {
            on_submit(text);
        }
    }

    fn select(&self, _title: &str, _options: &[&str], on_select: Box<dyn FnOnce(String)>) {
        self.shown();
        let answer = self.0.select.borrow_mut().take();
        if let Some(option) = answer {
            on_select(option);
        }
    }

    fn map_layer_form(&self, projections: &[String], on_submit: Box<dyn FnOnce(MapLayerSpec)>) {
        self.shown();
        *self.0.form_projections.borrow_mut() = projections.to_vec();
        let answer = self.0.form.borrow_mut().take();
        if let Some(spec) = answer {
            on_submit(spec);
        }
    }
}

impl Notifier for FakeHost {
    fn notify(&self, level: NoticeLevel, message: &str) {
        self.0
            .notices
            .borrow_mut()
            .push((level, String::from(message)));
    }
}

impl Overlays for FakeHost {
    fn set_tooltip_visible(&self, layer: &LayerId, feature: &FeatureId, visible: bool) {
        self.0
            .tooltips
            .borrow_mut()
            .push((layer.clone(), feature.clone(), visible));
    }
}

impl Downloader for FakeHost {
    fn download(&self, file_name: &str, mime_type: &str, content: &str) {
        self.0.downloads.borrow_mut().push((
            String::from(file_name),
            String::from(mime_type),
            String::from(content),
        ));
    }
}
