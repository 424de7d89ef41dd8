// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Storage for one kind of layer.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::layer::{LayerId, LayerKind, LayerRecord, RenderLayer, SortAssignment};

/// A registered layer: its record plus the renderable it describes.
pub(crate) struct Entry {
    pub(crate) record: LayerRecord,
    pub(crate) layer: Box<dyn RenderLayer>,
    /// Insertion sequence; breaks `sort_index` ties deterministically.
    pub(crate) seq: u64,
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("record", &self.record)
            .field("z_index", &self.layer.z_index())
            .field("seq", &self.seq)
            .finish_non_exhaustive()
    }
}

/// Converts a sort index to a paint order.
pub(crate) fn z_for(index: u32) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

/// The live layers of one [`LayerKind`], in insertion order.
///
/// Visual order is derived from `sort_index`, never from position in
/// `entries`.
#[derive(Debug)]
pub(crate) struct LayerCollection {
    kind: LayerKind,
    entries: Vec<Entry>,
}

impl LayerCollection {
    pub(crate) fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the `sort_index` a newly appended layer receives.
    pub(crate) fn next_sort_index(&self) -> u32 {
        u32::try_from(self.entries.len()).unwrap_or(u32::MAX)
    }

    pub(crate) fn contains(&self, id: &LayerId) -> bool {
        self.position(id).is_some()
    }

    pub(crate) fn get(&self, id: &LayerId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.record.id == *id)
    }

    pub(crate) fn get_mut(&mut self, id: &LayerId) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.record.id == *id)
    }

    fn position(&self, id: &LayerId) -> Option<usize> {
        self.entries.iter().position(|e| e.record.id == *id)
    }

    pub(crate) fn insert(&mut self, entry: Entry) {
        debug_assert_eq!(entry.record.kind, self.kind, "entry kind mismatch");
        self.entries.push(entry);
    }

    /// Removes a layer and closes the gap it leaves in the ordering.
    ///
    /// Every sibling above the removed index moves down by one; the returned
    /// assignments list exactly those siblings, with their z-index already
    /// updated.
    pub(crate) fn remove(&mut self, id: &LayerId) -> Option<(Entry, Vec<SortAssignment>)> {
        let pos = self.position(id)?;
        let removed = self.entries.remove(pos);
        let gap = removed.record.sort_index;

        let mut shifted = Vec::new();
        for entry in &mut self.entries {
            if entry.record.sort_index > gap {
                entry.record.sort_index -= 1;
                entry.layer.set_z_index(z_for(entry.record.sort_index));
                shifted.push(SortAssignment::new(
                    entry.record.id.clone(),
                    entry.record.sort_index,
                ));
            }
        }
        Some((removed, shifted))
    }

    /// Sets the authoritative order of a layer and derives its z-index.
    pub(crate) fn set_sort_index(&mut self, id: &LayerId, index: u32) -> bool {
        let Some(entry) = self.get_mut(id) else {
            return false;
        };
        entry.record.sort_index = index;
        entry.layer.set_z_index(z_for(index));
        true
    }

    /// Sets only the renderable's paint order.
    pub(crate) fn set_z_index(&mut self, id: &LayerId, index: i32) -> bool {
        let Some(entry) = self.get_mut(id) else {
            return false;
        };
        entry.layer.set_z_index(index);
        true
    }

    /// Entries from top of the stack to bottom.
    pub(crate) fn ordered(&self) -> Vec<&Entry> {
        let mut ordered: Vec<&Entry> = self.entries.iter().collect();
        ordered.sort_by(|a, b| {
            (b.record.sort_index, b.seq).cmp(&(a.record.sort_index, a.seq))
        });
        ordered
    }

    /// Record snapshots from top to bottom.
    pub(crate) fn records(&self) -> Vec<LayerRecord> {
        self.ordered().into_iter().map(|e| e.record.clone()).collect()
    }

    pub(crate) fn ids(&self) -> Vec<LayerId> {
        self.ordered()
            .into_iter()
            .map(|e| e.record.id.clone())
            .collect()
    }

    /// The layer drawn on top, if any.
    pub(crate) fn top_most(&self) -> Option<LayerId> {
        self.ordered().first().map(|e| e.record.id.clone())
    }

    /// Re-ranks the collection to the dense form `0..N`.
    ///
    /// Relative order is preserved; equal indices are ordered by insertion.
    /// Returns the layers whose index changed.
    pub(crate) fn normalize(&mut self) -> Vec<SortAssignment> {
        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        order.sort_by_key(|&i| (self.entries[i].record.sort_index, self.entries[i].seq));

        let mut changed = Vec::new();
        for (rank, &i) in order.iter().enumerate() {
            let rank = u32::try_from(rank).unwrap_or(u32::MAX);
            let entry = &mut self.entries[i];
            if entry.record.sort_index != rank {
                entry.record.sort_index = rank;
                entry.layer.set_z_index(z_for(rank));
                changed.push(SortAssignment::new(entry.record.id.clone(), rank));
            }
        }
        changed
    }
}
