// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The authoritative layer registry.
//!
//! [`LayerManager`] is a cheap-clone handle to one registry per map. It owns
//! the map and feature collections, the renderables, the active feature layer,
//! and the [`EventBus`] that broadcasts [`LayerEvent`]s.
//!
//! # Event delivery
//!
//! Mutations queue their events inside the registry. The handle releases its
//! borrow and only then dispatches the queue, so by the time a call such as
//! [`add_layer`](LayerManager::add_layer) returns every listener has already
//! run, and listeners are free to read the registry or issue further
//! mutations of their own.
//!
//! # Failure atomicity
//!
//! [`add_layer`](LayerManager::add_layer) validates the spec and builds the
//! renderable before touching any collection. A rejected projection, a
//! duplicate id, or a factory failure leaves the registry as it was and emits
//! nothing.

mod collection;

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;
use core::mem;

use crate::error::{LayerError, Result};
use crate::event::{EventBus, LayerEvent};
use crate::feature::{Feature, FeatureId};
use crate::layer::{
    AddOptions, IdSource, LayerFactory, LayerId, LayerKind, LayerRecord, LayerSpec, RenderLayer,
    SequentialIds, SortAssignment,
};
use crate::projection::ProjectionRegistry;

use collection::{Entry, LayerCollection, z_for};

/// Order and visibility recovered from a previous session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RestoredState {
    /// Stored `sort_index`.
    pub sort_index: u32,
    /// Stored visibility.
    pub is_visible: bool,
}

/// Source of persisted per-layer state consulted when a layer is added.
///
/// When an added layer's id has stored state, the new record inherits the
/// stored order and visibility instead of the defaults.
pub trait LayerRestore {
    /// Returns the stored state for `id`, if any.
    fn restore(&self, kind: LayerKind, id: &LayerId) -> Option<RestoredState>;
}

/// Registry state behind a [`LayerManager`] handle.
struct Registry {
    map: LayerCollection,
    features: LayerCollection,
    active_feature: Option<LayerId>,
    factory: Box<dyn LayerFactory>,
    projections: ProjectionRegistry,
    ids: Box<dyn IdSource>,
    restore: Option<Rc<dyn LayerRestore>>,
    pending: Vec<LayerEvent>,
    next_seq: u64,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("map", &self.map)
            .field("features", &self.features)
            .field("active_feature", &self.active_feature)
            .field("projections", &self.projections)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl Registry {
    fn collection(&self, kind: LayerKind) -> &LayerCollection {
        match kind {
            LayerKind::Map => &self.map,
            LayerKind::Feature => &self.features,
        }
    }

    fn collection_mut(&mut self, kind: LayerKind) -> &mut LayerCollection {
        match kind {
            LayerKind::Map => &mut self.map,
            LayerKind::Feature => &mut self.features,
        }
    }

    fn validate(&self, spec: &LayerSpec) -> Result<()> {
        if let LayerSpec::Map(map) = spec {
            if !self.projections.contains(&map.projection) {
                return Err(LayerError::UnregisteredProjection(map.projection.clone()));
            }
            if let Some(extent) = map.extent_rect() {
                if !extent.is_finite() || extent.area() <= 0.0 {
                    return Err(LayerError::InvalidExtent);
                }
            }
        }
        if let Some(id) = spec.id() {
            let kind = spec.kind();
            if self.collection(kind).contains(id) {
                return Err(LayerError::DuplicateId {
                    kind,
                    id: id.clone(),
                });
            }
        }
        Ok(())
    }

    fn fresh_id(&mut self, kind: LayerKind) -> LayerId {
        loop {
            let id = self.ids.next_id(kind);
            if !self.collection(kind).contains(&id) {
                return id;
            }
        }
    }

    fn add(&mut self, spec: &LayerSpec, options: AddOptions) -> Result<LayerRecord> {
        let kind = spec.kind();
        self.validate(spec)?;

        let id = match spec.id() {
            Some(id) => id.clone(),
            None => self.fresh_id(kind),
        };
        let mut layer = self
            .factory
            .build(&id, spec)
            .map_err(|source| LayerError::Construction {
                name: String::from(spec.name()),
                source,
            })?;

        // Nothing above this line touched the collections.
        let restored = self
            .restore
            .as_ref()
            .and_then(|restore| restore.restore(kind, &id));
        let (sort_index, is_visible) = match restored {
            Some(state) => (state.sort_index, state.is_visible),
            None => (self.collection(kind).next_sort_index(), spec.is_visible()),
        };
        layer.set_visible(is_visible);
        layer.set_z_index(z_for(sort_index));

        let record = LayerRecord {
            id: id.clone(),
            kind,
            name: String::from(spec.name()),
            sort_index,
            is_visible,
            is_dynamically_added: options.is_dynamically_added,
        };
        let seq = self.next_seq;
        self.next_seq += 1;
        self.collection_mut(kind).insert(Entry {
            record: record.clone(),
            layer,
            seq,
        });
        log::debug!(
            "added {kind} layer {id} at {sort_index} (restored: {})",
            restored.is_some()
        );

        self.pending.push(LayerEvent::Added {
            record: record.clone(),
            is_silent: options.is_silent,
            buttons: options.buttons,
        });
        if kind == LayerKind::Feature {
            self.set_active(Some(id));
        }
        Ok(record)
    }

    fn remove(&mut self, kind: LayerKind, id: &LayerId, is_silent: bool) -> Option<LayerRecord> {
        let (mut entry, shifted) = self.collection_mut(kind).remove(id)?;
        let tooltips = entry
            .layer
            .features()
            .map(|source| source.tooltip_ids())
            .unwrap_or_default();
        entry.layer.dispose();
        log::debug!("removed {kind} layer {id}, {} shifted", shifted.len());

        self.pending.push(LayerEvent::Removed {
            record: entry.record.clone(),
            is_silent,
            shifted,
            tooltips,
        });
        if kind == LayerKind::Feature && self.active_feature.as_ref() == Some(id) {
            let next = self.features.top_most();
            self.set_active(next);
        }
        Some(entry.record)
    }

    fn set_active(&mut self, id: Option<LayerId>) -> bool {
        if self.active_feature == id {
            return false;
        }
        let previous = mem::replace(&mut self.active_feature, id.clone());
        self.pending.push(LayerEvent::ActiveFeatureLayerChanged {
            previous,
            current: id,
        });
        true
    }

    /// Pulls the renderable's visibility flag into the record.
    fn sync_visibility(&mut self, kind: LayerKind, id: &LayerId) -> bool {
        let Some(entry) = self.collection_mut(kind).get_mut(id) else {
            return false;
        };
        let visible = entry.layer.is_visible();
        if entry.record.is_visible == visible {
            return false;
        }
        entry.record.is_visible = visible;
        let record = entry.record.clone();
        self.pending.push(LayerEvent::VisibilityChanged { record });
        true
    }

    fn set_visible(&mut self, kind: LayerKind, id: &LayerId, visible: bool) -> bool {
        let Some(entry) = self.collection_mut(kind).get_mut(id) else {
            return false;
        };
        entry.layer.set_visible(visible);
        self.sync_visibility(kind, id)
    }

    fn rename(&mut self, kind: LayerKind, id: &LayerId, name: &str) -> bool {
        let Some(entry) = self.collection_mut(kind).get_mut(id) else {
            return false;
        };
        if entry.record.name == name {
            return false;
        }
        entry.record.name = String::from(name);
        let record = entry.record.clone();
        self.pending.push(LayerEvent::Renamed { record });
        true
    }
}

/// Handle to the layer registry of one map.
///
/// Cloning the handle shares the registry. All methods take `&self`; the
/// registry is borrowed only for the duration of each call and released
/// before events are dispatched.
#[derive(Clone)]
pub struct LayerManager {
    registry: Rc<RefCell<Registry>>,
    bus: Rc<EventBus<LayerEvent>>,
    deferred: Rc<RefCell<Vec<(LayerKind, LayerId)>>>,
}

impl fmt::Debug for LayerManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.registry.try_borrow() {
            Ok(registry) => f
                .debug_struct("LayerManager")
                .field("registry", &*registry)
                .field("bus", &self.bus)
                .field("deferred", &self.deferred.borrow().len())
                .finish(),
            Err(_) => f
                .debug_struct("LayerManager")
                .field("registry", &"<borrowed>")
                .finish_non_exhaustive(),
        }
    }
}

/// Non-owning counterpart of [`LayerManager`].
///
/// Renderable property-change hooks hold one of these so the registry does
/// not keep itself alive through its own layers.
#[derive(Clone)]
pub struct WeakLayerManager {
    registry: Weak<RefCell<Registry>>,
    bus: Weak<EventBus<LayerEvent>>,
    deferred: Weak<RefCell<Vec<(LayerKind, LayerId)>>>,
}

impl fmt::Debug for WeakLayerManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakLayerManager")
            .field("alive", &(self.registry.strong_count() > 0))
            .finish_non_exhaustive()
    }
}

impl WeakLayerManager {
    /// Returns the manager if it still exists.
    #[must_use]
    pub fn upgrade(&self) -> Option<LayerManager> {
        Some(LayerManager {
            registry: self.registry.upgrade()?,
            bus: self.bus.upgrade()?,
            deferred: self.deferred.upgrade()?,
        })
    }
}

impl LayerManager {
    /// Creates a registry with the default projections and sequential ids.
    #[must_use]
    pub fn new(factory: impl LayerFactory + 'static) -> Self {
        Self::with_parts(
            Box::new(factory),
            ProjectionRegistry::default(),
            Box::new(SequentialIds::default()),
        )
    }

    /// Creates a registry from explicit parts.
    #[must_use]
    pub fn with_parts(
        factory: Box<dyn LayerFactory>,
        projections: ProjectionRegistry,
        ids: Box<dyn IdSource>,
    ) -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                map: LayerCollection::new(LayerKind::Map),
                features: LayerCollection::new(LayerKind::Feature),
                active_feature: None,
                factory,
                projections,
                ids,
                restore: None,
                pending: Vec::new(),
                next_seq: 0,
            })),
            bus: Rc::new(EventBus::new()),
            deferred: Rc::default(),
        }
    }

    /// Returns a non-owning handle.
    #[must_use]
    pub fn downgrade(&self) -> WeakLayerManager {
        WeakLayerManager {
            registry: Rc::downgrade(&self.registry),
            bus: Rc::downgrade(&self.bus),
            deferred: Rc::downgrade(&self.deferred),
        }
    }

    /// The channel lifecycle and property events are broadcast on.
    #[must_use]
    pub fn events(&self) -> &EventBus<LayerEvent> {
        &self.bus
    }

    /// Runs a mutation, then dispatches the events it queued.
    fn mutate<R>(&self, f: impl FnOnce(&mut Registry) -> R) -> R {
        let (result, events) = {
            let mut registry = self.registry.borrow_mut();
            let result = f(&mut registry);
            (result, mem::take(&mut registry.pending))
        };
        for event in &events {
            self.bus.emit(event);
        }
        self.flush_deferred();
        result
    }

    /// Replays visibility hooks that fired while the registry was borrowed.
    fn flush_deferred(&self) {
        loop {
            let deferred = mem::take(&mut *self.deferred.borrow_mut());
            if deferred.is_empty() {
                return;
            }
            if self.registry.try_borrow_mut().is_err() {
                let mut queue = self.deferred.borrow_mut();
                let later = mem::replace(&mut *queue, deferred);
                queue.extend(later);
                return;
            }
            for (kind, id) in deferred {
                self.sync_visibility(kind, &id);
            }
        }
    }

    fn read<R>(&self, f: impl FnOnce(&Registry) -> R) -> R {
        f(&self.registry.borrow())
    }

    /// Installs the source of persisted state used to reconcile added layers.
    pub fn set_restore(&self, restore: Rc<dyn LayerRestore>) {
        self.registry.borrow_mut().restore = Some(restore);
    }

    /// Registers a projection code so map layers may use it.
    pub fn register_projection(&self, code: &str) -> bool {
        self.registry.borrow_mut().projections.register(code)
    }

    /// Returns whether `code` is a registered projection.
    #[must_use]
    pub fn has_projection(&self, code: &str) -> bool {
        self.read(|r| r.projections.contains(code))
    }

    /// Registered projection codes, sorted.
    #[must_use]
    pub fn projection_codes(&self) -> Vec<String> {
        self.read(|r| r.projections.codes().map(String::from).collect())
    }

    /// Validates `spec`, builds its renderable, and registers it.
    ///
    /// Emits [`LayerEvent::Added`]; feature layers also become the active
    /// feature layer.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::UnregisteredProjection`],
    /// [`LayerError::InvalidExtent`], [`LayerError::DuplicateId`], or
    /// [`LayerError::Construction`]. In each case the registry is unchanged.
    pub fn add_layer(&self, spec: impl Into<LayerSpec>, options: AddOptions) -> Result<LayerRecord> {
        let spec = spec.into();
        self.mutate(|r| r.add(&spec, options))
    }

    /// Removes a layer. Returns `None` (and does nothing) for unknown ids.
    ///
    /// Siblings above it close the gap; if it was the active feature layer the
    /// top-most remaining feature layer becomes active.
    pub fn remove_layer(
        &self,
        kind: LayerKind,
        id: &LayerId,
        is_silent: bool,
    ) -> Option<LayerRecord> {
        self.mutate(|r| r.remove(kind, id, is_silent))
    }

    /// Returns a snapshot of a layer's record.
    #[must_use]
    pub fn get_layer_by_id(&self, kind: LayerKind, id: &LayerId) -> Option<LayerRecord> {
        self.read(|r| r.collection(kind).get(id).map(|e| e.record.clone()))
    }

    /// Returns whether a layer with `id` is registered.
    #[must_use]
    pub fn has_layer_with_id(&self, kind: LayerKind, id: &LayerId) -> bool {
        self.read(|r| r.collection(kind).contains(id))
    }

    /// Returns all records of `kind`, top of the stack first.
    #[must_use]
    pub fn records(&self, kind: LayerKind) -> Vec<LayerRecord> {
        self.read(|r| r.collection(kind).records())
    }

    /// Returns all ids of `kind`, top of the stack first.
    #[must_use]
    pub fn ids(&self, kind: LayerKind) -> Vec<LayerId> {
        self.read(|r| r.collection(kind).ids())
    }

    /// Returns the number of layers of `kind`.
    #[must_use]
    pub fn len(&self, kind: LayerKind) -> usize {
        self.read(|r| r.collection(kind).len())
    }

    /// Returns whether no layer of `kind` is registered.
    #[must_use]
    pub fn is_empty(&self, kind: LayerKind) -> bool {
        self.len(kind) == 0
    }

    /// Sets the renderable's paint order without touching the record.
    pub fn set_z_index(&self, kind: LayerKind, id: &LayerId, index: i32) -> bool {
        self.mutate(|r| r.collection_mut(kind).set_z_index(id, index))
    }

    /// Sets a layer's `sort_index` and derives its z-index from it.
    pub fn set_sort_index(&self, kind: LayerKind, id: &LayerId, index: u32) -> bool {
        self.mutate(|r| r.collection_mut(kind).set_sort_index(id, index))
    }

    /// Re-ranks `kind` to dense indices `0..N`, preserving relative order.
    ///
    /// Needed after bootstrap, when records restored from storage may leave
    /// holes or collisions. Returns the layers whose index changed.
    pub fn normalize_order(&self, kind: LayerKind) -> Vec<SortAssignment> {
        self.mutate(|r| r.collection_mut(kind).normalize())
    }

    /// Makes `id` the active feature layer. Returns `false` for unknown ids or
    /// if it already was active.
    pub fn set_active_feature_layer(&self, id: &LayerId) -> bool {
        self.mutate(|r| {
            if !r.features.contains(id) {
                return false;
            }
            r.set_active(Some(id.clone()))
        })
    }

    /// Returns the active feature layer.
    #[must_use]
    pub fn get_active_feature_layer(&self) -> Option<LayerRecord> {
        self.read(|r| {
            r.active_feature
                .as_ref()
                .and_then(|id| r.features.get(id))
                .map(|e| e.record.clone())
        })
    }

    /// Activates the top-most feature layer when none is active.
    pub fn ensure_active_feature_layer(&self) -> Option<LayerId> {
        self.mutate(|r| {
            if r.active_feature.is_none() {
                let top = r.features.top_most();
                r.set_active(top);
            }
            r.active_feature.clone()
        })
    }

    /// Asks the renderable to change visibility, then records the change.
    ///
    /// Emits [`LayerEvent::VisibilityChanged`] only if the flag actually
    /// changed. Returns whether it did.
    pub fn set_visible(&self, kind: LayerKind, id: &LayerId, visible: bool) -> bool {
        self.mutate(|r| r.set_visible(kind, id, visible))
    }

    /// Flips a layer's visibility. Returns `false` for unknown ids.
    pub fn toggle_visibility(&self, kind: LayerKind, id: &LayerId) -> bool {
        self.mutate(|r| {
            let Some(visible) = r.collection(kind).get(id).map(|e| e.layer.is_visible()) else {
                return false;
            };
            r.set_visible(kind, id, !visible)
        })
    }

    /// Property-change hook for renderables whose visibility was changed
    /// outside the registry (another tool, a bulk operation).
    ///
    /// Reads the renderable's flag and, if it differs from the record, updates
    /// the record and emits [`LayerEvent::VisibilityChanged`]. Calls arriving
    /// while the registry is borrowed are queued and replayed once the
    /// current mutation has released it; they return `false`.
    pub fn sync_visibility(&self, kind: LayerKind, id: &LayerId) -> bool {
        let (changed, events) = {
            let Ok(mut registry) = self.registry.try_borrow_mut() else {
                self.deferred.borrow_mut().push((kind, id.clone()));
                return false;
            };
            let changed = registry.sync_visibility(kind, id);
            (changed, mem::take(&mut registry.pending))
        };
        for event in &events {
            self.bus.emit(event);
        }
        changed
    }

    /// Changes a layer's display name. Returns `false` for unknown ids or an
    /// unchanged name.
    pub fn rename(&self, kind: LayerKind, id: &LayerId, name: &str) -> bool {
        self.mutate(|r| r.rename(kind, id, name))
    }

    /// Appends a feature to the active feature layer's source.
    ///
    /// Returns the layer it was added to, or `None` if no feature layer is
    /// active or the active layer has no source.
    pub fn add_feature(&self, feature: Feature) -> Option<LayerId> {
        self.mutate(|r| {
            let id = r.active_feature.clone()?;
            let entry = r.features.get_mut(&id)?;
            entry.layer.add_feature(feature).then_some(id)
        })
    }

    /// Returns clones of a layer's features, or `None` if it has no source.
    #[must_use]
    pub fn features(&self, kind: LayerKind, id: &LayerId) -> Option<Vec<Feature>> {
        self.with_layer(kind, id, |layer| {
            layer.features().map(|source| source.features().to_vec())
        })
        .flatten()
    }

    /// Returns the ids of a layer's features carrying tooltip overlays.
    #[must_use]
    pub fn tooltip_ids(&self, kind: LayerKind, id: &LayerId) -> Vec<FeatureId> {
        self.with_layer(kind, id, |layer| {
            layer
                .features()
                .map(|source| source.tooltip_ids())
                .unwrap_or_default()
        })
        .unwrap_or_default()
    }

    /// Runs `f` with read access to a layer's renderable.
    pub fn with_layer<R>(
        &self,
        kind: LayerKind,
        id: &LayerId,
        f: impl FnOnce(&dyn RenderLayer) -> R,
    ) -> Option<R> {
        self.read(|r| r.collection(kind).get(id).map(|e| f(e.layer.as_ref())))
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::feature::{Feature, Geometry};
    use crate::layer::{FeatureLayerSpec, MapLayerSpec};
    use crate::testing::{
        EventLog, FailingFactory, RecordingFactory, SharedVisibilityFactory, VisibilityFlags, ZLog,
    };

    fn sort_indices(manager: &LayerManager, kind: LayerKind) -> Vec<(String, u32)> {
        manager
            .records(kind)
            .into_iter()
            .map(|r| (String::from(r.id.as_str()), r.sort_index))
            .collect()
    }

    fn assert_dense(manager: &LayerManager, kind: LayerKind) {
        let mut indices: Vec<u32> = manager
            .records(kind)
            .into_iter()
            .map(|r| r.sort_index)
            .collect();
        indices.sort_unstable();
        let expected: Vec<u32> = (0..u32::try_from(indices.len()).unwrap()).collect();
        assert_eq!(indices, expected, "sort indices must be dense");
    }

    #[test]
    fn new_layers_stack_on_top() {
        let manager = LayerManager::new(crate::layer::DetachedFactory);
        for name in ["a", "b", "c"] {
            manager
                .add_layer(MapLayerSpec::new(name).with_id(name), AddOptions::dynamic())
                .unwrap();
        }
        assert_eq!(
            sort_indices(&manager, LayerKind::Map),
            vec![
                (String::from("c"), 2),
                (String::from("b"), 1),
                (String::from("a"), 0),
            ]
        );
        assert_dense(&manager, LayerKind::Map);
    }

    #[test]
    fn kinds_are_ordered_independently() {
        let manager = LayerManager::new(crate::layer::DetachedFactory);
        manager
            .add_layer(MapLayerSpec::new("osm"), AddOptions::bootstrap())
            .unwrap();
        let feature = manager
            .add_layer(FeatureLayerSpec::new("pins"), AddOptions::dynamic())
            .unwrap();
        assert_eq!(feature.sort_index, 0);
        assert_eq!(manager.len(LayerKind::Map), 1);
        assert_eq!(manager.len(LayerKind::Feature), 1);
    }

    #[test]
    fn unregistered_projection_is_rejected_without_mutation() {
        let manager = LayerManager::new(crate::layer::DetachedFactory);
        let log = EventLog::attach(&manager);
        let mut spec = MapLayerSpec::new("utm");
        spec.projection = String::from("EPSG:32633");

        let err = manager.add_layer(spec.clone(), AddOptions::dynamic()).unwrap_err();
        assert_eq!(err, LayerError::UnregisteredProjection(String::from("EPSG:32633")));
        assert!(manager.is_empty(LayerKind::Map));
        assert!(log.names().is_empty());

        assert!(manager.register_projection("EPSG:32633"));
        manager.add_layer(spec, AddOptions::dynamic()).unwrap();
        assert_eq!(manager.len(LayerKind::Map), 1);
    }

    #[test]
    fn degenerate_extent_is_rejected() {
        let manager = LayerManager::new(crate::layer::DetachedFactory);
        let mut spec = MapLayerSpec::new("flat");
        spec.extent = Some([0.0, 0.0, 10.0, 0.0]);
        assert_eq!(
            manager.add_layer(spec, AddOptions::dynamic()),
            Err(LayerError::InvalidExtent)
        );
        let mut spec = MapLayerSpec::new("nan");
        spec.extent = Some([0.0, 0.0, f64::NAN, 5.0]);
        assert_eq!(
            manager.add_layer(spec, AddOptions::dynamic()),
            Err(LayerError::InvalidExtent)
        );
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let manager = LayerManager::new(crate::layer::DetachedFactory);
        manager
            .add_layer(MapLayerSpec::new("a").with_id("x"), AddOptions::dynamic())
            .unwrap();
        let err = manager
            .add_layer(MapLayerSpec::new("b").with_id("x"), AddOptions::dynamic())
            .unwrap_err();
        assert!(matches!(err, LayerError::DuplicateId { kind: LayerKind::Map, .. }));
        // The same id is fine in the other collection.
        manager
            .add_layer(FeatureLayerSpec::new("f").with_id("x"), AddOptions::dynamic())
            .unwrap();
    }

    #[test]
    fn construction_failure_leaves_registry_untouched() {
        let manager = LayerManager::new(FailingFactory);
        let log = EventLog::attach(&manager);
        let err = manager
            .add_layer(MapLayerSpec::new("broken"), AddOptions::dynamic())
            .unwrap_err();
        assert!(matches!(err, LayerError::Construction { .. }));
        assert!(manager.is_empty(LayerKind::Map));
        assert!(log.names().is_empty());
    }

    #[test]
    fn generated_ids_skip_live_ids() {
        let manager = LayerManager::new(crate::layer::DetachedFactory);
        manager
            .add_layer(MapLayerSpec::new("taken").with_id("layer-map-0"), AddOptions::dynamic())
            .unwrap();
        let record = manager
            .add_layer(MapLayerSpec::new("fresh"), AddOptions::dynamic())
            .unwrap();
        assert_eq!(record.id.as_str(), "layer-map-1");
    }

    #[test]
    fn remove_closes_gap_and_updates_z_index() {
        let z = ZLog::default();
        let manager = LayerManager::new(RecordingFactory::new(&z));
        for id in ["a", "b", "c"] {
            manager
                .add_layer(MapLayerSpec::new(id).with_id(id), AddOptions::dynamic())
                .unwrap();
        }
        z.clear();
        let log = EventLog::attach(&manager);

        let removed = manager
            .remove_layer(LayerKind::Map, &LayerId::new("a"), false)
            .unwrap();
        assert_eq!(removed.sort_index, 0);
        assert_dense(&manager, LayerKind::Map);
        assert_eq!(z.calls(), vec![(String::from("b"), 0), (String::from("c"), 1)]);
        assert_eq!(log.names(), vec!["removed"]);

        assert!(manager
            .remove_layer(LayerKind::Map, &LayerId::new("a"), false)
            .is_none());
    }

    #[test]
    fn feature_layers_become_active_and_hand_over_on_removal() {
        let manager = LayerManager::new(crate::layer::DetachedFactory);
        let a = manager
            .add_layer(FeatureLayerSpec::new("A").with_id("a"), AddOptions::dynamic())
            .unwrap();
        let b = manager
            .add_layer(FeatureLayerSpec::new("B").with_id("b"), AddOptions::dynamic())
            .unwrap();
        assert_eq!(manager.get_active_feature_layer().map(|r| r.id), Some(b.id.clone()));

        manager.remove_layer(LayerKind::Feature, &b.id, false);
        assert_eq!(manager.get_active_feature_layer().map(|r| r.id), Some(a.id.clone()));

        manager.remove_layer(LayerKind::Feature, &a.id, false);
        assert!(manager.get_active_feature_layer().is_none());
    }

    #[test]
    fn removing_inactive_layer_keeps_selection() {
        let manager = LayerManager::new(crate::layer::DetachedFactory);
        let a = manager
            .add_layer(FeatureLayerSpec::new("A").with_id("a"), AddOptions::dynamic())
            .unwrap();
        manager
            .add_layer(FeatureLayerSpec::new("B").with_id("b"), AddOptions::dynamic())
            .unwrap();
        assert!(manager.set_active_feature_layer(&a.id));
        let log = EventLog::attach(&manager);
        manager.remove_layer(LayerKind::Feature, &LayerId::new("b"), false);
        assert_eq!(manager.get_active_feature_layer().map(|r| r.id), Some(a.id));
        assert_eq!(log.names(), vec!["removed"]);
    }

    #[test]
    fn map_ids_cannot_be_activated() {
        let manager = LayerManager::new(crate::layer::DetachedFactory);
        let map = manager
            .add_layer(MapLayerSpec::new("osm"), AddOptions::bootstrap())
            .unwrap();
        assert!(!manager.set_active_feature_layer(&map.id));
        assert!(manager.get_active_feature_layer().is_none());
    }

    #[test]
    fn visibility_events_fire_only_on_change() {
        let manager = LayerManager::new(crate::layer::DetachedFactory);
        let record = manager
            .add_layer(MapLayerSpec::new("osm"), AddOptions::bootstrap())
            .unwrap();
        let log = EventLog::attach(&manager);

        assert!(!manager.set_visible(LayerKind::Map, &record.id, true));
        assert!(manager.set_visible(LayerKind::Map, &record.id, false));
        assert!(manager.toggle_visibility(LayerKind::Map, &record.id));
        assert!(!manager.toggle_visibility(LayerKind::Map, &LayerId::new("missing")));
        assert_eq!(log.names(), vec!["visibility", "visibility"]);
        assert!(manager.get_layer_by_id(LayerKind::Map, &record.id).unwrap().is_visible);
    }

    #[test]
    fn rename_emits_once() {
        let manager = LayerManager::new(crate::layer::DetachedFactory);
        let record = manager
            .add_layer(MapLayerSpec::new("old"), AddOptions::bootstrap())
            .unwrap();
        let log = EventLog::attach(&manager);
        assert!(manager.rename(LayerKind::Map, &record.id, "new"));
        assert!(!manager.rename(LayerKind::Map, &record.id, "new"));
        assert_eq!(log.names(), vec!["renamed"]);
        assert_eq!(
            manager.get_layer_by_id(LayerKind::Map, &record.id).unwrap().name,
            "new"
        );
    }

    #[test]
    fn restored_state_overrides_defaults() {
        struct Stored;
        impl LayerRestore for Stored {
            fn restore(&self, _kind: LayerKind, id: &LayerId) -> Option<RestoredState> {
                (id.as_str() == "x").then_some(RestoredState {
                    sort_index: 3,
                    is_visible: false,
                })
            }
        }

        let manager = LayerManager::new(crate::layer::DetachedFactory);
        manager.set_restore(Rc::new(Stored));
        let record = manager
            .add_layer(MapLayerSpec::new("x").with_id("x"), AddOptions::bootstrap())
            .unwrap();
        assert_eq!(record.sort_index, 3);
        assert!(!record.is_visible);
        assert_eq!(
            manager.with_layer(LayerKind::Map, &record.id, |l| (l.z_index(), l.is_visible())),
            Some((3, false))
        );

        let normalized = manager.normalize_order(LayerKind::Map);
        assert_eq!(normalized, vec![SortAssignment::new(record.id, 0)]);
        assert_dense(&manager, LayerKind::Map);
    }

    #[test]
    fn listeners_may_query_and_mutate_during_dispatch() {
        let manager = LayerManager::new(crate::layer::DetachedFactory);
        let inner = manager.clone();
        manager.events().subscribe(move |event| {
            if let LayerEvent::Added { record, .. } = event {
                // Reading inside a listener must not hit an outstanding borrow.
                assert!(inner.has_layer_with_id(record.kind, &record.id));
                if record.kind == LayerKind::Map {
                    inner.set_visible(record.kind, &record.id, false);
                }
            }
        });
        let record = manager
            .add_layer(MapLayerSpec::new("osm"), AddOptions::dynamic())
            .unwrap();
        assert!(!manager.get_layer_by_id(LayerKind::Map, &record.id).unwrap().is_visible);
    }

    #[test]
    fn add_feature_goes_to_active_layer() {
        let manager = LayerManager::new(crate::layer::DetachedFactory);
        let point = Feature::new("p", Geometry::Point(kurbo::Point::new(1.0, 1.0))).with_tooltip();
        assert!(manager.add_feature(point.clone()).is_none());

        let layer = manager
            .add_layer(FeatureLayerSpec::new("pins"), AddOptions::dynamic())
            .unwrap();
        assert_eq!(manager.add_feature(point), Some(layer.id.clone()));
        assert_eq!(
            manager.tooltip_ids(LayerKind::Feature, &layer.id),
            vec![FeatureId::new("p")]
        );
        assert_eq!(manager.features(LayerKind::Feature, &layer.id).map(|f| f.len()), Some(1));
    }

    #[test]
    fn weak_handle_does_not_keep_registry_alive() {
        let manager = LayerManager::new(crate::layer::DetachedFactory);
        let weak = manager.downgrade();
        assert!(weak.upgrade().is_some());
        drop(manager);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn sync_visibility_during_mutation_returns_false() {
        let manager = LayerManager::new(crate::layer::DetachedFactory);
        let record = manager
            .add_layer(MapLayerSpec::new("osm"), AddOptions::bootstrap())
            .unwrap();
        let inner = manager.clone();
        let id = record.id.clone();
        let result = manager.mutate(|_| inner.sync_visibility(LayerKind::Map, &id));
        assert!(!result);
    }

    #[test]
    fn visibility_hooks_fired_during_another_mutation_are_replayed() {
        let flags = VisibilityFlags::default();
        let manager = LayerManager::new(SharedVisibilityFactory::new(&flags));
        let x = manager
            .add_layer(MapLayerSpec::new("x"), AddOptions::bootstrap())
            .unwrap();
        let log = EventLog::attach(&manager);

        // The map library flips X while the registry is busy creating Y.
        let inner = manager.clone();
        let flag = flags.flag(&x.id);
        let skipped = manager.mutate(|r| {
            flag.set(false);
            let hooked = inner.sync_visibility(LayerKind::Map, &x.id);
            r.add(&LayerSpec::from(MapLayerSpec::new("y")), AddOptions::bootstrap())
                .map(|_| hooked)
        });
        assert_eq!(skipped, Ok(false));

        let record = manager.get_layer_by_id(LayerKind::Map, &x.id).unwrap();
        assert!(!record.is_visible);
        assert_eq!(log.names(), vec!["added", "visibility"]);

        // Nothing is left to replay.
        assert!(!manager.sync_visibility(LayerKind::Map, &x.id));
        assert_eq!(log.names().len(), 2);
    }
}
