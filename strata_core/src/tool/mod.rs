// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layer tool controller.
//!
//! [`LayerTool`] keeps a [`LayerListView`] and a [`LayerStateStore`] in step
//! with a [`LayerManager`]. It never updates the list directly in response to
//! a user action: actions go to the manager, and the tool's event listener
//! updates the list, the stored state, and the overlays once the manager
//! reports what actually changed. A visibility flip made by another tool
//! therefore looks exactly like one made through this list.
//!
//! Dialog flows (`request_*`) hand a callback to the host's [`Dialogs`]. The
//! callback holds only a weak reference to the tool, so a dialog answered
//! after the tool was dropped does nothing.

mod config;
mod host;
mod view;

pub use config::{
    DragCallback, KindButtons, KindCallbacks, LayerCallbacks, LayerToolConfig, RecordCallback,
};
pub use host::{Dialogs, Downloader, LogNotifier, NoticeLevel, Notifier, Overlays, ToolHost};
pub use view::{ButtonSet, ItemAction, ItemModel, LayerListView, truncate_label};

use alloc::boxed::Box;
use alloc::format;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::error::{LayerError, Result};
use crate::event::{LayerEvent, SubscriptionId};
use crate::format::FeatureFormat;
use crate::layer::{
    AddOptions, ButtonOverrides, FeatureLayerSpec, LayerId, LayerKind, LayerRecord, MapLayerSpec,
};
use crate::ordering::{DragEnd, OrderingController, ReorderDelta};
use crate::persist::{KeyValueStore, LayerStateStore, StoreError, ToolState};
use crate::registry::LayerManager;

struct ToolInner {
    manager: LayerManager,
    ordering: OrderingController,
    store: Rc<RefCell<LayerStateStore>>,
    view: RefCell<Box<dyn LayerListView>>,
    host: ToolHost,
    config: LayerToolConfig,
    callbacks: LayerCallbacks,
    subscription: Cell<Option<SubscriptionId>>,
    ready: Cell<bool>,
}

impl Drop for ToolInner {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.manager.events().unsubscribe(id);
        }
    }
}

impl ToolInner {
    /// Runs a store mutation. Failed writes are already logged by the store
    /// and do not roll back the registry.
    fn persist<T>(&self, f: impl FnOnce(&mut LayerStateStore) -> core::result::Result<T, StoreError>) {
        f(&mut self.store.borrow_mut()).ok();
    }

    fn item_model(&self, record: &LayerRecord, overrides: ButtonOverrides) -> ItemModel {
        let is_active = record.kind == LayerKind::Feature
            && self
                .manager
                .get_active_feature_layer()
                .is_some_and(|active| active.id == record.id);
        ItemModel {
            id: record.id.clone(),
            kind: record.kind,
            label: truncate_label(&record.name, self.config.name_display_length),
            name: record.name.clone(),
            sort_index: record.sort_index,
            is_visible: record.is_visible,
            is_active,
            buttons: ButtonSet::resolve(record.kind, self.config.buttons(record.kind), overrides),
        }
    }

    fn handle(&self, event: &LayerEvent) {
        match event {
            LayerEvent::Added {
                record,
                is_silent,
                buttons,
            } => {
                let item = self.item_model(record, *buttons);
                {
                    let mut view = self.view.borrow_mut();
                    view.insert_item(&item);
                    view.sort_desc(record.kind);
                }
                self.persist(|store| store.upsert(record.kind, record));
                if !is_silent {
                    self.host.notifier.notify(
                        NoticeLevel::Success,
                        &format!("Added {} layer \"{}\"", record.kind, record.name),
                    );
                    let callback = self.callbacks.for_kind(record.kind).added.clone();
                    if let Some(callback) = callback {
                        callback(record);
                    }
                }
            }
            LayerEvent::Removed {
                record,
                is_silent,
                shifted,
                tooltips,
            } => {
                {
                    let mut view = self.view.borrow_mut();
                    view.remove_item(record.kind, &record.id);
                    for a in shifted {
                        view.set_item_sort_index(record.kind, &a.id, a.index);
                    }
                }
                self.persist(|store| store.remove(record.kind, &record.id));
                self.persist(|store| store.apply_assignments(record.kind, shifted));
                self.host.hide_tooltips(&record.id, tooltips);
                if !is_silent {
                    self.host.notifier.notify(
                        NoticeLevel::Success,
                        &format!("Removed {} layer \"{}\"", record.kind, record.name),
                    );
                    let callback = self.callbacks.for_kind(record.kind).removed.clone();
                    if let Some(callback) = callback {
                        callback(record);
                    }
                }
            }
            LayerEvent::VisibilityChanged { record } => {
                self.view
                    .borrow_mut()
                    .set_item_visible(record.kind, &record.id, record.is_visible);
                self.persist(|store| store.upsert(record.kind, record));
                let tooltips = self.manager.tooltip_ids(record.kind, &record.id);
                self.host
                    .show_tooltips(&record.id, &tooltips, record.is_visible);
                let callback = self.callbacks.for_kind(record.kind).visibility_changed.clone();
                if let Some(callback) = callback {
                    callback(record);
                }
            }
            LayerEvent::Renamed { record } => {
                let label = truncate_label(&record.name, self.config.name_display_length);
                self.view
                    .borrow_mut()
                    .set_item_label(record.kind, &record.id, &label, &record.name);
                let callback = self.callbacks.for_kind(record.kind).renamed.clone();
                if let Some(callback) = callback {
                    callback(record);
                }
            }
            LayerEvent::ActiveFeatureLayerChanged { previous, current } => {
                let mut view = self.view.borrow_mut();
                if let Some(previous) = previous {
                    view.set_item_active(previous, false);
                }
                if let Some(current) = current {
                    view.set_item_active(current, true);
                }
            }
        }
    }

    fn report(&self, err: &LayerError) {
        match err {
            LayerError::Construction { name, source } => {
                log::error!("failed to create layer `{name}`: {source}");
            }
            _ => log::warn!("{err}"),
        }
        self.host.notifier.notify(NoticeLevel::Error, &format!("{err}"));
    }
}

/// Non-owning counterpart of [`LayerTool`].
#[derive(Clone)]
pub struct WeakLayerTool(Weak<ToolInner>);

impl fmt::Debug for WeakLayerTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WeakLayerTool")
            .field(&(self.0.strong_count() > 0))
            .finish()
    }
}

impl WeakLayerTool {
    /// Returns the tool if it still exists.
    #[must_use]
    pub fn upgrade(&self) -> Option<LayerTool> {
        LayerTool::upgrade(&self.0)
    }
}

/// Controller for the map and feature layer lists of one map.
///
/// Cheap to clone; clones share the same tool.
#[derive(Clone)]
pub struct LayerTool {
    inner: Rc<ToolInner>,
}

impl fmt::Debug for LayerTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerTool")
            .field("manager", &self.inner.manager)
            .field("config", &self.inner.config)
            .field("ready", &self.inner.ready.get())
            .finish_non_exhaustive()
    }
}

impl LayerTool {
    /// Attaches a tool to `manager`.
    ///
    /// Opens the stored state under the configured key and installs it as the
    /// manager's restore source, so layers added from now on pick up their
    /// stored order and visibility. Layers already registered are listed
    /// immediately.
    pub fn new(
        manager: LayerManager,
        view: impl LayerListView + 'static,
        storage: impl KeyValueStore + 'static,
        host: ToolHost,
        config: LayerToolConfig,
        callbacks: LayerCallbacks,
    ) -> Self {
        let store = Rc::new(RefCell::new(LayerStateStore::open(
            storage,
            &config.storage_key,
            &config.toolbox_id,
        )));
        manager.set_restore(store.clone());

        let inner = Rc::new(ToolInner {
            ordering: OrderingController::new(manager.clone()),
            manager,
            store,
            view: RefCell::new(Box::new(view)),
            host,
            config,
            callbacks,
            subscription: Cell::new(None),
            ready: Cell::new(false),
        });

        for kind in LayerKind::ALL {
            let mut records = inner.manager.records(kind);
            records.reverse();
            let mut view = inner.view.borrow_mut();
            for record in &records {
                view.insert_item(&inner.item_model(record, ButtonOverrides::default()));
            }
            view.sort_desc(kind);
        }

        let weak = Rc::downgrade(&inner);
        let id = inner.manager.events().subscribe(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.handle(event);
            }
        });
        inner.subscription.set(Some(id));
        Self { inner }
    }

    fn weak(&self) -> Weak<ToolInner> {
        Rc::downgrade(&self.inner)
    }

    /// Returns a non-owning handle, for view callbacks owned by the tool.
    #[must_use]
    pub fn downgrade(&self) -> WeakLayerTool {
        WeakLayerTool(self.weak())
    }

    fn upgrade(weak: &Weak<ToolInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// The registry this tool presents.
    #[must_use]
    pub fn manager(&self) -> &LayerManager {
        &self.inner.manager
    }

    /// The configuration the tool was created with.
    #[must_use]
    pub fn config(&self) -> &LayerToolConfig {
        &self.inner.config
    }

    /// A copy of the persisted tool state.
    #[must_use]
    pub fn state(&self) -> ToolState {
        self.inner.store.borrow().state().clone()
    }

    /// Marks bootstrap as finished.
    ///
    /// Drops stored entries of layers that were not re-created, renumbers each
    /// list densely, stores the result, and makes sure a feature layer is
    /// active if any exist. Later calls do nothing.
    pub fn ready(&self) {
        if self.inner.ready.replace(true) {
            return;
        }
        let inner = &self.inner;
        for kind in LayerKind::ALL {
            let live = inner.manager.ids(kind);
            inner.persist(|store| store.prune_unused(kind, &live));

            let changed = inner.manager.normalize_order(kind);
            {
                let mut view = inner.view.borrow_mut();
                for a in &changed {
                    view.set_item_sort_index(kind, &a.id, a.index);
                }
                view.sort_desc(kind);
            }
            let records = inner.manager.records(kind);
            inner.persist(|store| store.save(kind, &records));
        }
        inner.manager.ensure_active_feature_layer();
        log::debug!(
            "layer tool ready: {} map, {} feature layers",
            inner.manager.len(LayerKind::Map),
            inner.manager.len(LayerKind::Feature)
        );
    }

    /// Whether [`ready`](Self::ready) has run.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.ready.get()
    }

    /// Creates a map layer from a user action.
    ///
    /// # Errors
    ///
    /// Validation and construction errors are reported through the notifier
    /// and returned; the registry is unchanged.
    pub fn create_map_layer(&self, spec: MapLayerSpec) -> Result<LayerRecord> {
        self.inner
            .manager
            .add_layer(spec, AddOptions::dynamic())
            .inspect_err(|err| self.inner.report(err))
    }

    /// Opens the map layer form; submitting it creates the layer.
    pub fn request_create_map_layer(&self) {
        let weak = self.weak();
        let projections = self.inner.manager.projection_codes();
        self.inner.host.dialogs.map_layer_form(
            &projections,
            Box::new(move |spec| {
                if let Some(tool) = Self::upgrade(&weak) {
                    let _ = tool.create_map_layer(spec);
                }
            }),
        );
    }

    /// Creates an empty feature layer from a user action. It becomes active.
    ///
    /// # Errors
    ///
    /// Construction errors are reported through the notifier and returned.
    pub fn create_feature_layer(&self, name: &str) -> Result<LayerRecord> {
        self.inner
            .manager
            .add_layer(FeatureLayerSpec::new(name), AddOptions::dynamic())
            .inspect_err(|err| self.inner.report(err))
    }

    /// Asks for a name, then creates a feature layer with it.
    pub fn request_create_feature_layer(&self) {
        let weak = self.weak();
        let initial = format!(
            "Feature layer {}",
            self.inner.manager.len(LayerKind::Feature) + 1
        );
        self.inner.host.dialogs.prompt(
            "New feature layer",
            &initial,
            Box::new(move |name| {
                if let Some(tool) = Self::upgrade(&weak) {
                    let name = name.trim();
                    if !name.is_empty() {
                        let _ = tool.create_feature_layer(name);
                    }
                }
            }),
        );
    }

    /// Flips a layer's visibility. The list follows through the registry's
    /// visibility event.
    pub fn toggle_visibility(&self, kind: LayerKind, id: &LayerId) -> bool {
        self.inner.manager.toggle_visibility(kind, id)
    }

    /// Makes a feature layer the target for new features.
    pub fn activate_feature_layer(&self, id: &LayerId) -> bool {
        self.inner.manager.set_active_feature_layer(id)
    }

    /// Opens a prompt seeded with the current name; confirming renames.
    pub fn request_rename(&self, kind: LayerKind, id: &LayerId) {
        let Some(record) = self.inner.manager.get_layer_by_id(kind, id) else {
            return;
        };
        let weak = self.weak();
        let id = id.clone();
        self.inner.host.dialogs.prompt(
            "Rename layer",
            &record.name,
            Box::new(move |name| {
                if let Some(tool) = Self::upgrade(&weak) {
                    tool.rename(kind, &id, &name);
                }
            }),
        );
    }

    /// Renames a layer. Blank names are ignored.
    pub fn rename(&self, kind: LayerKind, id: &LayerId, name: &str) -> bool {
        let name = name.trim();
        !name.is_empty() && self.inner.manager.rename(kind, id, name)
    }

    /// Asks for confirmation, then deletes the layer.
    pub fn request_delete(&self, kind: LayerKind, id: &LayerId) {
        let Some(record) = self.inner.manager.get_layer_by_id(kind, id) else {
            return;
        };
        let weak = self.weak();
        let id = id.clone();
        self.inner.host.dialogs.confirm(
            "Delete layer",
            &format!("Delete layer \"{}\"?", record.name),
            Box::new(move || {
                if let Some(tool) = Self::upgrade(&weak) {
                    tool.delete(kind, &id);
                }
            }),
        );
    }

    /// Deletes a layer. Returns `false` if it no longer exists.
    pub fn delete(&self, kind: LayerKind, id: &LayerId) -> bool {
        self.inner.manager.remove_layer(kind, id, false).is_some()
    }

    /// Asks for a format, then downloads the feature layer's features.
    pub fn request_download(&self, id: &LayerId) {
        if !self.inner.manager.has_layer_with_id(LayerKind::Feature, id) {
            return;
        }
        let preferred = FeatureFormat::from_key(&self.inner.config.default_download_format)
            .unwrap_or(FeatureFormat::GeoJson);
        let mut options = alloc::vec![preferred.key()];
        options.extend(
            FeatureFormat::ALL
                .iter()
                .filter(|format| **format != preferred)
                .map(|format| format.key()),
        );
        let weak = self.weak();
        let id = id.clone();
        self.inner.host.dialogs.select(
            "Download layer",
            &options,
            Box::new(move |key| {
                if let Some(tool) = Self::upgrade(&weak) {
                    let _ = tool.download(&id, &key);
                }
            }),
        );
    }

    /// Serializes a feature layer's features and hands them to the downloader.
    ///
    /// Does nothing if the layer no longer exists.
    ///
    /// # Errors
    ///
    /// [`LayerError::UnsupportedFormat`] for unknown keys, checked before any
    /// serialization. Errors are also reported through the notifier.
    pub fn download(&self, id: &LayerId, format_key: &str) -> Result<()> {
        let inner = &self.inner;
        let format = FeatureFormat::from_key(format_key).inspect_err(|err| inner.report(err))?;
        let Some(record) = inner.manager.get_layer_by_id(LayerKind::Feature, id) else {
            return Ok(());
        };
        let features = inner
            .manager
            .features(LayerKind::Feature, id)
            .unwrap_or_default();
        let content = format.write(&features).inspect_err(|err| inner.report(err))?;
        let file_name = format!("{}.{}", record.name, format.extension());
        inner
            .host
            .downloader
            .download(&file_name, format.mime_type(), &content);
        log::debug!("downloaded {} features of {id} as {}", features.len(), format.label());
        Ok(())
    }

    /// Creates a feature layer from file contents, named after the file.
    ///
    /// # Errors
    ///
    /// [`LayerError::UnsupportedFormat`] for unknown or write-only formats,
    /// [`LayerError::Parse`] for malformed input, and construction errors. All
    /// are reported through the notifier; the registry is unchanged.
    pub fn import(&self, file_name: &str, format_key: &str, text: &str) -> Result<LayerRecord> {
        let inner = &self.inner;
        let result = FeatureFormat::from_key(format_key).and_then(|format| {
            let features = format.read(text)?;
            let name = match file_name.rsplit_once('.') {
                Some((stem, _)) if !stem.is_empty() => stem,
                _ => file_name,
            };
            inner.manager.add_layer(
                FeatureLayerSpec::new(name).with_features(features),
                AddOptions::dynamic(),
            )
        });
        result.inspect_err(|err| inner.report(err))
    }

    /// Applies a finished drag in the `kind` list, then runs the dragged
    /// callback.
    pub fn on_sort_end(&self, kind: LayerKind, drag: DragEnd) -> Option<ReorderDelta> {
        let inner = &self.inner;
        let delta = {
            let mut view = inner.view.borrow_mut();
            let mut store = inner.store.borrow_mut();
            inner
                .ordering
                .on_sort_end(kind, view.as_mut(), &mut store, drag, None)
        };
        if let Some(delta) = &delta {
            let callback = inner.callbacks.for_kind(kind).dragged.clone();
            if let Some(callback) = callback {
                callback(delta);
            }
        }
        delta
    }

    /// Routes a gesture reported by the view.
    pub fn dispatch(&self, action: ItemAction) {
        match action {
            ItemAction::Create(LayerKind::Map) => self.request_create_map_layer(),
            ItemAction::Create(LayerKind::Feature) => self.request_create_feature_layer(),
            ItemAction::ToggleVisibility(kind, id) => {
                self.toggle_visibility(kind, &id);
            }
            ItemAction::Activate(id) => {
                self.activate_feature_layer(&id);
            }
            ItemAction::Rename(kind, id) => self.request_rename(kind, &id),
            ItemAction::Delete(kind, id) => self.request_delete(kind, &id),
            ItemAction::Download(id) => self.request_download(&id),
        }
    }

    /// Records whether the `kind` section is collapsed.
    pub fn set_toolbox_collapsed(&self, kind: LayerKind, collapsed: bool) {
        self.inner
            .persist(|store| store.set_collapsed(kind, collapsed));
    }

    /// Whether the `kind` section is collapsed.
    #[must_use]
    pub fn is_toolbox_collapsed(&self, kind: LayerKind) -> bool {
        self.inner.store.borrow().is_collapsed(kind)
    }

    /// Records whether the tool is open.
    pub fn set_active(&self, active: bool) {
        self.inner.persist(|store| store.set_active(active));
    }

    /// Whether the tool was left open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.store.borrow().is_active()
    }

    /// The tool's storage key, for hosts that clear state.
    #[must_use]
    pub fn storage_key(&self) -> String {
        String::from(self.inner.store.borrow().key())
    }
}
