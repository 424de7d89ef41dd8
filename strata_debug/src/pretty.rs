// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable event output.
//!
//! [`PrettyPrintSink`] writes one line per [`LayerEvent`] to a
//! [`Write`](std::io::Write) destination (default: stderr).

use std::cell::RefCell;
use std::io::Write;

use strata_core::event::{LayerEvent, SubscriptionId};
use strata_core::layer::LayerId;
use strata_core::registry::LayerManager;

/// Writes human-readable event lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

fn id_or_none(id: Option<&LayerId>) -> &str {
    id.map_or("none", LayerId::as_str)
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the destination.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Writes the line for one event. Write errors are ignored.
    pub fn on_event(&mut self, event: &LayerEvent) {
        let _ = match event {
            LayerEvent::Added {
                record, is_silent, ..
            } => writeln!(
                self.writer,
                "[added] {} {} \"{}\" sort={} visible={} silent={is_silent}",
                record.kind, record.id, record.name, record.sort_index, record.is_visible,
            ),
            LayerEvent::Removed {
                record,
                is_silent,
                shifted,
                tooltips,
            } => writeln!(
                self.writer,
                "[removed] {} {} \"{}\" shifted={} tooltips={} silent={is_silent}",
                record.kind,
                record.id,
                record.name,
                shifted.len(),
                tooltips.len(),
            ),
            LayerEvent::VisibilityChanged { record } => writeln!(
                self.writer,
                "[visibility] {} {} visible={}",
                record.kind, record.id, record.is_visible,
            ),
            LayerEvent::Renamed { record } => writeln!(
                self.writer,
                "[renamed] {} {} \"{}\"",
                record.kind, record.id, record.name,
            ),
            LayerEvent::ActiveFeatureLayerChanged { previous, current } => writeln!(
                self.writer,
                "[active] {} -> {}",
                id_or_none(previous.as_ref()),
                id_or_none(current.as_ref()),
            ),
        };
    }
}

impl<W: Write + 'static> PrettyPrintSink<W> {
    /// Moves the sink into a listener on `manager`'s events.
    ///
    /// Pass the returned id to
    /// [`EventBus::unsubscribe`](strata_core::event::EventBus::unsubscribe)
    /// to stop printing.
    pub fn attach(self, manager: &LayerManager) -> SubscriptionId {
        let sink = RefCell::new(self);
        manager
            .events()
            .subscribe(move |event| sink.borrow_mut().on_event(event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::layer::{AddOptions, DetachedFactory, FeatureLayerSpec, MapLayerSpec};

    #[test]
    fn pretty_print_lifecycle() {
        let manager = LayerManager::new(DetachedFactory);
        let shared = std::rc::Rc::new(RefCell::new(Vec::<u8>::new()));
        let sink_buf = std::rc::Rc::clone(&shared);
        manager.events().subscribe(move |event| {
            let mut sink = PrettyPrintSink::with_writer(Vec::new());
            sink.on_event(event);
            sink_buf.borrow_mut().extend(sink.into_inner());
        });

        manager
            .add_layer(MapLayerSpec::new("OSM").with_id("osm"), AddOptions::bootstrap())
            .unwrap();
        manager
            .add_layer(FeatureLayerSpec::new("Pins").with_id("pins"), AddOptions::dynamic())
            .unwrap();
        manager.set_visible(strata_core::layer::LayerKind::Map, &LayerId::new("osm"), false);

        let output = String::from_utf8(shared.borrow().clone()).unwrap();
        assert!(
            output.contains("[added] map osm \"OSM\" sort=0 visible=true silent=true"),
            "got: {output}"
        );
        assert!(output.contains("[active] none -> pins"), "got: {output}");
        assert!(output.contains("[visibility] map osm visible=false"), "got: {output}");
    }

    #[test]
    fn attached_sink_keeps_printing() {
        let manager = LayerManager::new(DetachedFactory);
        let id = PrettyPrintSink::with_writer(std::io::sink()).attach(&manager);
        manager
            .add_layer(MapLayerSpec::new("OSM"), AddOptions::bootstrap())
            .unwrap();
        assert!(manager.events().unsubscribe(id), "sink should be subscribed");
    }
}
