// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer registry, ordering, and persistence for map toolbar layer lists.
//!
//! `strata_core` keeps three views of "which layers exist and in what order"
//! consistent: the renderable layers and their paint order, the drag-sortable
//! list shown to the user, and the persisted record that survives reloads. It
//! is `no_std` compatible (with `alloc`); platform glue lives in backend crates.
//!
//! # Architecture
//!
//! ```text
//!   user action (click / drag end)
//!       │
//!       ▼
//!   LayerTool ──► LayerManager::add_layer / remove_layer / set_visible ...
//!       │               │
//!       │               ▼
//!       │         Registry mutates, queues LayerEvent
//!       │               │
//!       │               ▼  (dispatched before the call returns)
//!       └──────◄── EventBus ──► LayerListView + LayerStateStore + callbacks
//!
//!   drag end ──► OrderingController ──► view, store, z-index
//! ```
//!
//! **[`layer`]**: Identity, records, specs, and the renderable-layer contract
//! ([`RenderLayer`](layer::RenderLayer), [`LayerFactory`](layer::LayerFactory)).
//!
//! **[`registry`]**: The [`LayerManager`](registry::LayerManager) service:
//! the authoritative layer collections, active feature layer, and lifecycle
//! events.
//!
//! **[`event`]**: Typed synchronous publish/subscribe.
//!
//! **[`ordering`]**: The reverse-index reorder reducer and the controller that
//! applies a finished drag to every representation.
//!
//! **[`persist`]**: Key-value storage contract and the persisted tool state
//! with default merging and pruning.
//!
//! **[`tool`]**: The [`LayerTool`](tool::LayerTool) controller that wires the
//! registry to a list view, storage, and host collaborators.
//!
//! **[`feature`]** / **[`format`]**: Vector features and their GeoJSON/WKT
//! serialization.
//!
//! **[`projection`]**: Registered projection codes used to validate map layers.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod error;
pub mod event;
pub mod feature;
pub mod format;
pub mod layer;
pub mod ordering;
pub mod persist;
pub mod projection;
pub mod registry;
pub mod tool;

#[cfg(test)]
pub(crate) mod testing;
