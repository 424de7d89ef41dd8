// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer data model.
//!
//! A *layer* is one entry in either the map collection or the feature
//! collection. Each layer has:
//!
//! - An identity ([`LayerId`]) scoped to its [`LayerKind`], stable for the
//!   layer's lifetime and across reloads for configured layers.
//! - A [`LayerRecord`] describing name, order, and visibility. Records are
//!   value snapshots; the registry holds the authoritative copy.
//! - A renderable ([`RenderLayer`]) built by a [`LayerFactory`] and owned by
//!   the registry.
//!
//! # Ordering
//!
//! `sort_index` is dense within a kind and counts from the bottom of the
//! stack. The renderable's z-index and the list view's `data-sort-index`
//! attribute are both projections of it and are recomputed from it, never the
//! reverse.

mod id;
mod record;
mod render;
mod spec;

pub use id::{IdSource, LayerId, LayerKind, SequentialIds};
pub use record::{LayerRecord, SortAssignment};
pub use render::{BuildError, DetachedFactory, DetachedLayer, LayerFactory, RenderLayer};
pub use spec::{
    AddOptions, ButtonOverrides, FeatureLayerSpec, LayerSpec, MapLayerSpec, MapLayerType,
    MapSourceType,
};
