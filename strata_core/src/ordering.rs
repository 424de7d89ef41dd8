// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Turning a finished drag into a new layer order.
//!
//! The list shows the newest layer on top while the paint stack counts from
//! the bottom, so a child at on-screen position `p` of `M` receives
//! `sort_index = M - p - 1`. [`sort_assignments`] is the only place this
//! inversion happens. It is a fixed point on its own output: re-reading a list
//! that was just sorted by the assignments yields the same assignments.
//!
//! [`OrderingController`] applies the assignments to every representation in
//! turn: the view's `data-sort-index`, the registry record and z-index, and the
//! persisted state.

use alloc::vec::Vec;

use crate::layer::{LayerId, LayerKind, LayerRecord, SortAssignment};
use crate::persist::LayerStateStore;
use crate::registry::LayerManager;
use crate::tool::LayerListView;

/// Raw positions reported by the drag library when a gesture ends.
///
/// Positions index the list top-down, as displayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DragEnd {
    /// Where the item was picked up.
    pub old_position: usize,
    /// Where the item was dropped.
    pub new_position: usize,
}

/// What a reorder callback receives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReorderDelta {
    /// The dragged layer.
    pub id: LayerId,
    /// Raw drop position.
    ///
    /// The names are swapped relative to the drag library; consumers read the
    /// pair as if the descending list were ascending.
    pub old_index: usize,
    /// Raw pick-up position. See [`old_index`](Self::old_index).
    pub new_index: usize,
    /// The full new order of the kind.
    pub list: Vec<SortAssignment>,
}

/// Sort indices for a top-to-bottom list order.
#[must_use]
pub fn sort_assignments(dom_order: &[LayerId]) -> Vec<SortAssignment> {
    let count = dom_order.len();
    dom_order
        .iter()
        .enumerate()
        .map(|(position, id)| {
            let index = u32::try_from(count - position - 1).unwrap_or(u32::MAX);
            SortAssignment::new(id.clone(), index)
        })
        .collect()
}

/// Returns `records` with sort indices taken from `dom_order`.
///
/// Records whose id is not in `dom_order` are returned unchanged.
#[must_use]
pub fn apply_reorder(records: &[LayerRecord], dom_order: &[LayerId]) -> Vec<LayerRecord> {
    let assignments = sort_assignments(dom_order);
    records
        .iter()
        .map(|record| {
            let mut record = record.clone();
            if let Some(a) = assignments.iter().find(|a| a.id == record.id) {
                record.sort_index = a.index;
            }
            record
        })
        .collect()
}

/// Returns whether `indices` are exactly `0..N` in some order.
#[must_use]
pub fn is_dense(indices: impl IntoIterator<Item = u32>) -> bool {
    let mut indices: Vec<u32> = indices.into_iter().collect();
    indices.sort_unstable();
    indices
        .iter()
        .enumerate()
        .all(|(i, &index)| usize::try_from(index).is_ok_and(|index| index == i))
}

/// Applies finished drags to the view, the registry, and the persisted state.
#[derive(Clone, Debug)]
pub struct OrderingController {
    manager: LayerManager,
}

impl OrderingController {
    /// Creates a controller for the layers of `manager`.
    #[must_use]
    pub fn new(manager: LayerManager) -> Self {
        Self { manager }
    }

    /// Reconciles every representation with the list order the drag left
    /// behind.
    ///
    /// Items whose layer is no longer registered are ignored. The full path
    /// runs even for a single-item list. Returns the delta for the dragged
    /// item, or `None` if the drop position names no registered item;
    /// `callback` receives the same delta.
    pub fn on_sort_end(
        &self,
        kind: LayerKind,
        view: &mut dyn LayerListView,
        store: &mut LayerStateStore,
        drag: DragEnd,
        callback: Option<&dyn Fn(&ReorderDelta)>,
    ) -> Option<ReorderDelta> {
        let displayed = view.order(kind);
        // Drag positions index the list as displayed, stale items included.
        let dragged = displayed
            .get(drag.new_position)
            .filter(|id| self.manager.has_layer_with_id(kind, id))
            .cloned();
        let order: Vec<LayerId> = displayed
            .into_iter()
            .filter(|id| self.manager.has_layer_with_id(kind, id))
            .collect();
        let list = sort_assignments(&order);
        for assignment in &list {
            view.set_item_sort_index(kind, &assignment.id, assignment.index);
            self.manager
                .set_sort_index(kind, &assignment.id, assignment.index);
        }
        log::debug!(
            "reordered {} {kind} layers ({} -> {})",
            list.len(),
            drag.old_position,
            drag.new_position
        );

        // Logged by the store; the registry order stands either way.
        store.save(kind, &self.manager.records(kind)).ok();

        let delta = dragged.map(|id| ReorderDelta {
            id,
            old_index: drag.new_position,
            new_index: drag.old_position,
            list,
        });
        if let (Some(delta), Some(callback)) = (&delta, callback) {
            callback(delta);
        }
        view.sort_desc(kind);
        delta
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec;
    use core::cell::RefCell;

    use super::*;
    use crate::layer::{AddOptions, FeatureLayerSpec};
    use crate::persist::MemoryStore;
    use crate::testing::{FakeView, RecordingFactory, ZLog};
    use crate::tool::{ButtonSet, ItemModel};

    fn ids(names: &[&str]) -> Vec<LayerId> {
        names.iter().map(|n| LayerId::new(*n)).collect()
    }

    #[test]
    fn reverse_index_scheme() {
        let list = sort_assignments(&ids(&["c", "b", "a"]));
        assert_eq!(
            list,
            vec![
                SortAssignment::new(LayerId::new("c"), 2),
                SortAssignment::new(LayerId::new("b"), 1),
                SortAssignment::new(LayerId::new("a"), 0),
            ]
        );
        assert!(is_dense(list.iter().map(|a| a.index)));
        assert!(sort_assignments(&[]).is_empty());
    }

    #[test]
    fn reorder_is_a_fixed_point() {
        let records: Vec<LayerRecord> = ["a", "b", "c"]
            .iter()
            .enumerate()
            .map(|(i, id)| LayerRecord {
                id: LayerId::new(*id),
                kind: LayerKind::Map,
                name: String::from(*id),
                sort_index: u32::try_from(i).unwrap(),
                is_visible: true,
                is_dynamically_added: false,
            })
            .collect();
        let dom = ids(&["a", "c", "b"]);
        let once = apply_reorder(&records, &dom);

        // Rebuild the list from the result, top first, and reorder again.
        let mut sorted = once.clone();
        sorted.sort_by(|x, y| y.sort_index.cmp(&x.sort_index));
        let dom_again: Vec<LayerId> = sorted.into_iter().map(|r| r.id).collect();
        assert_eq!(dom_again, dom);
        assert_eq!(apply_reorder(&once, &dom_again), once);
        assert!(is_dense(once.iter().map(|r| r.sort_index)));
    }

    #[test]
    fn density_check() {
        assert!(is_dense(core::iter::empty::<u32>()));
        assert!(is_dense([1, 0, 2]));
        assert!(!is_dense([0, 2]));
        assert!(!is_dense([0, 0]));
    }

    #[test]
    fn drag_updates_view_registry_store_and_reports_swapped_delta() {
        let z = ZLog::default();
        let manager = LayerManager::new(RecordingFactory::new(&z));
        let mut view = FakeView::new();
        let backend = MemoryStore::new();
        let mut store = LayerStateStore::open(backend.clone(), "layers", "tb");
        for name in ["A", "B"] {
            manager
                .add_layer(FeatureLayerSpec::new(name).with_id(name), AddOptions::dynamic())
                .unwrap();
        }
        view.fill_from(&manager, LayerKind::Feature);
        assert_eq!(view.order(LayerKind::Feature), ids(&["B", "A"]));

        // Drag A from the bottom (1) to the top (0).
        view.move_item(LayerKind::Feature, 1, 0);
        z.clear();
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        let callback = move |delta: &ReorderDelta| *sink.borrow_mut() = Some(delta.clone());
        let controller = OrderingController::new(manager.clone());
        let delta = controller
            .on_sort_end(
                LayerKind::Feature,
                &mut view,
                &mut store,
                DragEnd {
                    old_position: 1,
                    new_position: 0,
                },
                Some(&callback),
            )
            .unwrap();

        assert_eq!(delta.id, LayerId::new("A"));
        assert_eq!((delta.old_index, delta.new_index), (0, 1));
        assert_eq!(seen.borrow().as_ref(), Some(&delta));
        assert_eq!(z.calls(), vec![(String::from("A"), 1), (String::from("B"), 0)]);
        assert_eq!(
            manager
                .get_layer_by_id(LayerKind::Feature, &LayerId::new("A"))
                .unwrap()
                .sort_index,
            1
        );
        assert_eq!(store.find(LayerKind::Feature, &LayerId::new("B")).unwrap().sort_index, 0);
        assert_eq!(view.sort_index(LayerKind::Feature, &LayerId::new("A")), Some(1));
        assert_eq!(view.sorts(LayerKind::Feature), 1);
    }

    #[test]
    fn stale_items_above_the_drop_do_not_shift_the_dragged_id() {
        let manager = LayerManager::new(crate::layer::DetachedFactory);
        let mut view = FakeView::new();
        let mut store = LayerStateStore::open(MemoryStore::new(), "layers", "tb");
        for name in ["A", "B"] {
            manager
                .add_layer(FeatureLayerSpec::new(name).with_id(name), AddOptions::dynamic())
                .unwrap();
        }
        view.fill_from(&manager, LayerKind::Feature);
        view.insert_item(&ItemModel {
            id: LayerId::new("ghost"),
            kind: LayerKind::Feature,
            label: String::from("ghost"),
            name: String::from("ghost"),
            sort_index: 9,
            is_visible: true,
            is_active: false,
            buttons: ButtonSet::default(),
        });
        view.move_item(LayerKind::Feature, 2, 0);
        assert_eq!(view.order(LayerKind::Feature), ids(&["ghost", "B", "A"]));

        // Drag A above B, below the stale item.
        view.move_item(LayerKind::Feature, 2, 1);
        let delta = OrderingController::new(manager.clone())
            .on_sort_end(
                LayerKind::Feature,
                &mut view,
                &mut store,
                DragEnd {
                    old_position: 2,
                    new_position: 1,
                },
                None,
            )
            .unwrap();
        assert_eq!(delta.id, LayerId::new("A"));
        assert_eq!(
            delta.list,
            vec![
                SortAssignment::new(LayerId::new("A"), 1),
                SortAssignment::new(LayerId::new("B"), 0),
            ]
        );

        // Dropping onto the stale item names no layer.
        let none = OrderingController::new(manager).on_sort_end(
            LayerKind::Feature,
            &mut view,
            &mut store,
            DragEnd {
                old_position: 1,
                new_position: 0,
            },
            None,
        );
        assert!(none.is_none());
    }

    #[test]
    fn single_item_runs_full_path() {
        let manager = LayerManager::new(crate::layer::DetachedFactory);
        let mut view = FakeView::new();
        let backend = MemoryStore::new();
        let mut store = LayerStateStore::open(backend.clone(), "layers", "tb");
        manager
            .add_layer(FeatureLayerSpec::new("only").with_id("only"), AddOptions::dynamic())
            .unwrap();
        view.fill_from(&manager, LayerKind::Feature);
        let writes = backend.writes();

        let controller = OrderingController::new(manager);
        let drag = DragEnd {
            old_position: 0,
            new_position: 0,
        };
        let first = controller
            .on_sort_end(LayerKind::Feature, &mut view, &mut store, drag, None)
            .unwrap();
        let second = controller
            .on_sort_end(LayerKind::Feature, &mut view, &mut store, drag, None)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.list, vec![SortAssignment::new(LayerId::new("only"), 0)]);
        assert_eq!(backend.writes(), writes + 2);
        assert_eq!(view.sorts(LayerKind::Feature), 2);
    }
}
