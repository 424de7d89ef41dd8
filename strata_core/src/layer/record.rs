// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer records and sort assignments.

use alloc::string::String;

use serde::Serialize;

use super::id::{LayerId, LayerKind};

/// Identity, ordering, and visibility of one live layer.
///
/// Records are snapshots handed out by the registry; mutating a copy has no
/// effect on the registry. `sort_index` is dense within a kind: for `N` layers
/// the indices are exactly `0..N`, with `0` at the bottom of the paint stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerRecord {
    /// Stable identity within `kind`.
    pub id: LayerId,
    /// Which collection the layer belongs to.
    pub kind: LayerKind,
    /// Display name, stored untruncated.
    pub name: String,
    /// Position in the stack, `0` = bottom.
    pub sort_index: u32,
    /// Mirrors the renderable layer's visibility flag.
    pub is_visible: bool,
    /// Created at runtime rather than supplied by initial configuration.
    pub is_dynamically_added: bool,
}

/// A new sort index for one layer, as produced by reordering or gap closing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SortAssignment {
    /// The layer being moved.
    pub id: LayerId,
    /// Its new `sort_index`.
    pub index: u32,
}

impl SortAssignment {
    /// Creates an assignment.
    #[must_use]
    pub fn new(id: LayerId, index: u32) -> Self {
        Self { id, index }
    }
}
