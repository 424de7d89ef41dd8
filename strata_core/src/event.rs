// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed synchronous publish/subscribe.
//!
//! [`EventBus`] replaces ambient window events with an explicit channel owned
//! by the registry. Delivery is synchronous and in subscription order. The
//! listener list is snapshotted before each emit, so a listener may subscribe,
//! unsubscribe, or trigger further emits without invalidating the iteration.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::feature::FeatureId;
use crate::layer::{ButtonOverrides, LayerId, LayerKind, LayerRecord, SortAssignment};

/// Handle returned by [`EventBus::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Listener<E> = Rc<dyn Fn(&E)>;

/// A single-threaded event channel.
pub struct EventBus<E> {
    listeners: RefCell<Vec<(SubscriptionId, Listener<E>)>>,
    next_id: Cell<u64>,
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventBus<E> {
    /// Creates a bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    /// Registers `listener` and returns a handle for [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe(&self, listener: impl Fn(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(sub, _)| *sub != id);
        listeners.len() != before
    }

    /// Delivers `event` to every listener registered at the time of the call.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    /// Returns the number of listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Returns whether no listener is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }
}

/// Lifecycle and property events broadcast by the
/// [`LayerManager`](crate::registry::LayerManager).
///
/// Every event carries a snapshot of the affected record taken after the
/// mutation, so listeners never need to query the registry to react.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerEvent {
    /// A layer was registered.
    Added {
        /// The new record.
        record: LayerRecord,
        /// Bootstrap layer; suppress user-facing notification.
        is_silent: bool,
        /// Per-layer button overrides.
        buttons: ButtonOverrides,
    },
    /// A layer was removed and its renderable disposed.
    Removed {
        /// The record as it was just before removal.
        record: LayerRecord,
        /// Bootstrap or programmatic removal; suppress notification.
        is_silent: bool,
        /// Siblings whose `sort_index` dropped by one to close the gap.
        shifted: Vec<SortAssignment>,
        /// Features of the removed layer carrying tooltip overlays.
        tooltips: Vec<FeatureId>,
    },
    /// The renderable's visibility flag changed.
    VisibilityChanged {
        /// The record with its new visibility.
        record: LayerRecord,
    },
    /// The display name changed.
    Renamed {
        /// The record with its new name.
        record: LayerRecord,
    },
    /// The active feature layer changed.
    ActiveFeatureLayerChanged {
        /// Previously active layer, if any.
        previous: Option<LayerId>,
        /// Newly active layer, or `None` when no feature layer remains.
        current: Option<LayerId>,
    },
}

impl LayerEvent {
    /// Returns the kind of layer the event concerns.
    #[must_use]
    pub fn kind(&self) -> LayerKind {
        match self {
            Self::Added { record, .. }
            | Self::Removed { record, .. }
            | Self::VisibilityChanged { record }
            | Self::Renamed { record } => record.kind,
            Self::ActiveFeatureLayerChanged { .. } => LayerKind::Feature,
        }
    }

    /// Returns a short name for logs (`added`, `removed`, ...).
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Added { .. } => "added",
            Self::Removed { .. } => "removed",
            Self::VisibilityChanged { .. } => "visibility",
            Self::Renamed { .. } => "renamed",
            Self::ActiveFeatureLayerChanged { .. } => "active",
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn emit_reaches_listeners_in_order() {
        let bus = EventBus::<u32>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let a = Rc::clone(&seen);
        bus.subscribe(move |e| a.borrow_mut().push(("a", *e)));
        let b = Rc::clone(&seen);
        bus.subscribe(move |e| b.borrow_mut().push(("b", *e)));

        bus.emit(&7);
        assert_eq!(*seen.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::<u32>::new();
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let id = bus.subscribe(move |_| c.set(c.get() + 1));
        bus.emit(&1);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(&2);
        assert_eq!(count.get(), 1);
        assert!(bus.is_empty());
    }

    #[test]
    fn listener_may_subscribe_during_emit() {
        let bus = Rc::new(EventBus::<u32>::new());
        let inner = Rc::clone(&bus);
        bus.subscribe(move |_| {
            inner.subscribe(|_| {});
        });
        bus.emit(&0);
        assert_eq!(bus.len(), 2);
    }
}
