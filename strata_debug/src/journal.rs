// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! JSON event journal.
//!
//! [`Journal`] records every [`LayerEvent`] a manager emits as a
//! [`serde_json::Value`]. [`Journal::export`] writes the recording as one JSON
//! array, suitable for attaching to a bug report or diffing between runs.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use serde_json::{Value, json};

use strata_core::event::{LayerEvent, SubscriptionId};
use strata_core::registry::LayerManager;

/// Converts one event to JSON.
///
/// Every object has `event` (the event name) and `kind`; the remaining keys
/// depend on the event.
#[must_use]
pub fn event_to_json(event: &LayerEvent) -> Value {
    let mut value = match event {
        LayerEvent::Added {
            record, is_silent, ..
        } => json!({ "record": record, "isSilent": is_silent }),
        LayerEvent::Removed {
            record,
            is_silent,
            shifted,
            tooltips,
        } => json!({
            "record": record,
            "isSilent": is_silent,
            "shifted": shifted,
            "tooltips": tooltips,
        }),
        LayerEvent::VisibilityChanged { record } | LayerEvent::Renamed { record } => {
            json!({ "record": record })
        }
        LayerEvent::ActiveFeatureLayerChanged { previous, current } => {
            json!({ "previous": previous, "current": current })
        }
    };
    value["event"] = json!(event.name());
    value["kind"] = json!(event.kind().as_str());
    value
}

/// Records a manager's events as JSON.
#[derive(Debug)]
pub struct Journal {
    entries: Rc<RefCell<Vec<Value>>>,
    subscription: SubscriptionId,
}

impl Journal {
    /// Starts recording `manager`'s events.
    #[must_use]
    pub fn attach(manager: &LayerManager) -> Self {
        let entries = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&entries);
        let subscription = manager
            .events()
            .subscribe(move |event| sink.borrow_mut().push(event_to_json(event)));
        Self {
            entries,
            subscription,
        }
    }

    /// Stops recording. Entries recorded so far are kept.
    pub fn detach(&self, manager: &LayerManager) -> bool {
        manager.events().unsubscribe(self.subscription)
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether nothing was recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Returns a copy of the recorded events.
    #[must_use]
    pub fn entries(&self) -> Vec<Value> {
        self.entries.borrow().clone()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// Writes the recording as a pretty-printed JSON array.
    pub fn export(&self, writer: &mut dyn Write) -> io::Result<()> {
        let entries = self.entries.borrow();
        serde_json::to_writer_pretty(&mut *writer, &*entries)?;
        writeln!(writer)
    }
}
