// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The persisted layer tool state and its write-through store.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{KeyValueStore, StoreError};
use crate::layer::{LayerId, LayerKind, LayerRecord, SortAssignment};
use crate::registry::{LayerRestore, RestoredState};

/// The persisted part of a [`LayerRecord`].
///
/// Only `id` is required when decoding; entries written by older versions may
/// lack the other fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedLayer {
    /// Layer id.
    pub id: LayerId,
    /// Position within the kind, `0` = bottom.
    #[serde(default)]
    pub sort_index: u32,
    /// Visibility.
    #[serde(default = "visible_by_default")]
    pub is_visible: bool,
}

fn visible_by_default() -> bool {
    true
}

impl From<&LayerRecord> for PersistedLayer {
    fn from(record: &LayerRecord) -> Self {
        Self {
            id: record.id.clone(),
            sort_index: record.sort_index,
            is_visible: record.is_visible,
        }
    }
}

/// Everything the layer tool stores under its storage key.
///
/// Keys this version does not know, including the per-toolbox collapse flags,
/// live in `extra` and are written back untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolState {
    /// Whether the tool was open.
    pub is_active: bool,
    /// Map layer entries, unordered.
    pub map_layers: Vec<PersistedLayer>,
    /// Feature layer entries, unordered.
    pub feature_layers: Vec<PersistedLayer>,
    /// Remaining keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolState {
    /// Merges stored JSON over the defaults, key by key.
    ///
    /// Layer entries that do not decode are dropped one at a time, and known
    /// keys of the wrong type fall back to their defaults, so a single bad value
    /// never discards the rest of the state.
    fn merge(stored: Map<String, Value>) -> Self {
        let mut state = Self::default();
        for (key, value) in stored {
            match key.as_str() {
                "isActive" => match value.as_bool() {
                    Some(active) => state.is_active = active,
                    None => log::warn!("ignoring stored `isActive` of the wrong type: {value}"),
                },
                "mapLayers" => state.map_layers = layer_entries(&key, value),
                "featureLayers" => state.feature_layers = layer_entries(&key, value),
                _ => {
                    state.extra.insert(key, value);
                }
            }
        }
        state
    }

    /// Entries of one kind.
    #[must_use]
    pub fn layers(&self, kind: LayerKind) -> &[PersistedLayer] {
        match kind {
            LayerKind::Map => &self.map_layers,
            LayerKind::Feature => &self.feature_layers,
        }
    }

    fn layers_mut(&mut self, kind: LayerKind) -> &mut Vec<PersistedLayer> {
        match kind {
            LayerKind::Map => &mut self.map_layers,
            LayerKind::Feature => &mut self.feature_layers,
        }
    }
}

/// Write-through store for [`ToolState`].
///
/// Every mutating method serializes the whole state and writes it to the
/// backend before returning. A failed write is logged and returned; the
/// in-memory state keeps the change so later writes can catch up.
pub struct LayerStateStore {
    backend: Box<dyn KeyValueStore>,
    key: String,
    toolbox_id: String,
    state: ToolState,
}

impl fmt::Debug for LayerStateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerStateStore")
            .field("key", &self.key)
            .field("toolbox_id", &self.toolbox_id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl LayerStateStore {
    /// Loads the state stored under `key` and merges it over the defaults.
    ///
    /// Missing keys take their default values and unknown keys are kept.
    /// Unreadable layer entries are dropped individually. Stored text that is
    /// not a JSON object is discarded with a warning.
    pub fn open(backend: impl KeyValueStore + 'static, key: &str, toolbox_id: &str) -> Self {
        let stored = backend.get(key).and_then(|text| {
            match serde_json::from_str::<Map<String, Value>>(&text) {
                Ok(stored) => Some(stored),
                Err(err) => {
                    log::warn!("discarding unreadable layer state under `{key}`: {err}");
                    None
                }
            }
        });
        let mut state = stored.map(ToolState::merge).unwrap_or_default();
        for kind in LayerKind::ALL {
            state
                .extra
                .entry(collapsed_key(toolbox_id, kind))
                .or_insert(Value::Bool(false));
        }
        Self {
            backend: Box::new(backend),
            key: String::from(key),
            toolbox_id: String::from(toolbox_id),
            state,
        }
    }

    /// The storage key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> &ToolState {
        &self.state
    }

    /// Entries of one kind, in stored order.
    #[must_use]
    pub fn load(&self, kind: LayerKind) -> Vec<PersistedLayer> {
        self.state.layers(kind).to_vec()
    }

    /// The stored entry for `id`.
    #[must_use]
    pub fn find(&self, kind: LayerKind, id: &LayerId) -> Option<&PersistedLayer> {
        self.state.layers(kind).iter().find(|l| l.id == *id)
    }

    /// Replaces every entry of `kind` with `records`.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`StoreError`] if the write fails.
    pub fn save(&mut self, kind: LayerKind, records: &[LayerRecord]) -> Result<(), StoreError> {
        *self.state.layers_mut(kind) = records.iter().map(PersistedLayer::from).collect();
        self.persist()
    }

    /// Inserts or replaces the entry for `record`.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`StoreError`] if the write fails.
    pub fn upsert(&mut self, kind: LayerKind, record: &LayerRecord) -> Result<(), StoreError> {
        let entry = PersistedLayer::from(record);
        let layers = self.state.layers_mut(kind);
        match layers.iter_mut().find(|l| l.id == entry.id) {
            Some(existing) => *existing = entry,
            None => layers.push(entry),
        }
        self.persist()
    }

    /// Removes the entry for `id`. Returns whether one existed; nothing is
    /// written otherwise.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`StoreError`] if the write fails.
    pub fn remove(&mut self, kind: LayerKind, id: &LayerId) -> Result<bool, StoreError> {
        let layers = self.state.layers_mut(kind);
        let before = layers.len();
        layers.retain(|l| l.id != *id);
        if layers.len() == before {
            return Ok(false);
        }
        self.persist().map(|()| true)
    }

    /// Updates the stored `sort_index` of every listed layer that has an entry.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`StoreError`] if the write fails.
    pub fn apply_assignments(
        &mut self,
        kind: LayerKind,
        assignments: &[SortAssignment],
    ) -> Result<(), StoreError> {
        if assignments.is_empty() {
            return Ok(());
        }
        for layer in self.state.layers_mut(kind) {
            if let Some(a) = assignments.iter().find(|a| a.id == layer.id) {
                layer.sort_index = a.index;
            }
        }
        self.persist()
    }

    /// Drops entries whose id is not in `live_ids`. Returns how many were
    /// dropped; nothing is written when none were.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`StoreError`] if the write fails.
    pub fn prune_unused(
        &mut self,
        kind: LayerKind,
        live_ids: &[LayerId],
    ) -> Result<usize, StoreError> {
        let layers = self.state.layers_mut(kind);
        let before = layers.len();
        layers.retain(|l| live_ids.contains(&l.id));
        let pruned = before - layers.len();
        if pruned == 0 {
            return Ok(0);
        }
        log::debug!("pruned {pruned} stale {kind} layer entries");
        self.persist().map(|()| pruned)
    }

    /// Whether the tool was left open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.is_active
    }

    /// Records whether the tool is open.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`StoreError`] if the write fails.
    pub fn set_active(&mut self, active: bool) -> Result<(), StoreError> {
        self.state.is_active = active;
        self.persist()
    }

    /// Whether the toolbox section for `kind` is collapsed.
    #[must_use]
    pub fn is_collapsed(&self, kind: LayerKind) -> bool {
        self.state
            .extra
            .get(&collapsed_key(&self.toolbox_id, kind))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Records the collapse state of the toolbox section for `kind`.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`StoreError`] if the write fails.
    pub fn set_collapsed(&mut self, kind: LayerKind, collapsed: bool) -> Result<(), StoreError> {
        self.state
            .extra
            .insert(collapsed_key(&self.toolbox_id, kind), Value::Bool(collapsed));
        self.persist()
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let text =
            serde_json::to_string(&self.state).map_err(|err| StoreError::Encode(err.to_string()))?;
        self.backend.set(&self.key, &text).inspect_err(|err| {
            log::warn!("{err}");
        })
    }
}

fn layer_entries(key: &str, value: Value) -> Vec<PersistedLayer> {
    let Value::Array(entries) = value else {
        log::warn!("ignoring stored `{key}`: expected an array");
        return Vec::new();
    };
    entries
        .into_iter()
        .filter_map(|entry| {
            PersistedLayer::deserialize(entry)
                .inspect_err(|err| log::warn!("dropping unreadable `{key}` entry: {err}"))
                .ok()
        })
        .collect()
}

fn collapsed_key(toolbox_id: &str, kind: LayerKind) -> String {
    format!("{toolbox_id}-{kind}-toolbox-collapsed")
}

impl LayerRestore for RefCell<LayerStateStore> {
    fn restore(&self, kind: LayerKind, id: &LayerId) -> Option<RestoredState> {
        let store = self.try_borrow().ok()?;
        store.find(kind, id).map(|entry| RestoredState {
            sort_index: entry.sort_index,
            is_visible: entry.is_visible,
        })
    }
}
