// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registry snapshots and consistency checks.

use serde_json::{Value, json};

use strata_core::layer::{LayerId, LayerKind};
use strata_core::ordering::is_dense;
use strata_core::registry::LayerManager;

/// Returns the registry's contents as JSON.
///
/// ```json
/// { "map": [record, ...], "feature": [record, ...], "activeFeatureLayer": "id" }
/// ```
///
/// Lists are ordered top of the stack first, matching the on-screen lists.
#[must_use]
pub fn snapshot(manager: &LayerManager) -> Value {
    json!({
        "map": manager.records(LayerKind::Map),
        "feature": manager.records(LayerKind::Feature),
        "activeFeatureLayer": manager.get_active_feature_layer().map(|record| record.id),
    })
}

/// A broken registry invariant found by [`check`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    /// The sort indices of a kind are not exactly `0..N`.
    SparseOrder {
        /// Affected collection.
        kind: LayerKind,
        /// The indices found, ascending.
        indices: Vec<u32>,
    },
    /// A renderable's z-index differs from its record's sort index.
    ZIndexMismatch {
        /// Affected collection.
        kind: LayerKind,
        /// Affected layer.
        id: LayerId,
        /// Sort index on the record.
        sort_index: u32,
        /// Z-index on the renderable.
        z_index: i32,
    },
    /// A renderable's visibility differs from its record.
    VisibilityMismatch {
        /// Affected collection.
        kind: LayerKind,
        /// Affected layer.
        id: LayerId,
        /// Visibility on the renderable.
        layer_visible: bool,
    },
}

/// Checks order density and record/renderable agreement for both kinds.
#[must_use]
pub fn check(manager: &LayerManager) -> Vec<Violation> {
    let mut violations = Vec::new();
    for kind in LayerKind::ALL {
        let records = manager.records(kind);
        if !is_dense(records.iter().map(|record| record.sort_index)) {
            let mut indices: Vec<u32> = records.iter().map(|record| record.sort_index).collect();
            indices.sort_unstable();
            violations.push(Violation::SparseOrder { kind, indices });
        }
        for record in &records {
            let Some((z_index, layer_visible)) = manager
                .with_layer(kind, &record.id, |layer| (layer.z_index(), layer.is_visible()))
            else {
                continue;
            };
            if i32::try_from(record.sort_index) != Ok(z_index) {
                violations.push(Violation::ZIndexMismatch {
                    kind,
                    id: record.id.clone(),
                    sort_index: record.sort_index,
                    z_index,
                });
            }
            if layer_visible != record.is_visible {
                violations.push(Violation::VisibilityMismatch {
                    kind,
                    id: record.id.clone(),
                    layer_visible,
                });
            }
        }
    }
    violations
}
