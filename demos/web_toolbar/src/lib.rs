// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web demo: map and feature layer lists driven by `strata_backend_web`.
//!
//! Registers two configured map layers and a sketch feature layer, then
//! attaches a [`LayerTool`] with DOM lists, `SortableJS` dragging, and
//! `localStorage` persistence. Reload the page to see order and visibility
//! restored.
//!
//! Build with: `wasm-pack build --target web demos/web_toolbar`
//!
//! Then serve `demos/web_toolbar/` and open `index.html` in a browser.

// This crate only runs in the browser; suppress dead-code warnings when
// cargo-checking on a native host target.
#![no_std]
#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

extern crate alloc;

use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::vec::Vec;

use strata_backend_web::{
    BlobDownloader, BrowserDialogs, DomLayerList, DomOverlays, JsLayerFactory, JsLayerHost,
    LocalStorage, RandomIds, SortableList, ToastNotifier,
};
use strata_core::layer::{
    AddOptions, DetachedFactory, FeatureLayerSpec, LayerFactory, LayerKind, MapLayerSpec,
};
use strata_core::persist::{KeyValueStore, MemoryStore};
use strata_core::projection::ProjectionRegistry;
use strata_core::registry::LayerManager;
use strata_core::tool::{
    KindCallbacks, LayerCallbacks, LayerTool, LayerToolConfig, ToolHost, WeakLayerTool,
};
use wasm_bindgen::JsCast as _;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement};

/// Map layers the page is configured with.
const CONFIGURED_LAYERS: &str = r#"[
    { "id": "osm", "name": "OpenStreetMap" },
    {
        "id": "topo",
        "name": "OpenTopoMap",
        "source": "xyz",
        "url": "https://{a-c}.tile.opentopomap.org/{z}/{x}/{y}.png",
        "attributions": "OpenTopoMap (CC-BY-SA)",
        "isVisible": false
    }
]"#;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    fn log(msg: &str, format: &str);
    #[wasm_bindgen(js_namespace = console)]
    fn info(msg: &str, format: &str);
    #[wasm_bindgen(js_namespace = console)]
    fn warn(msg: &str, format: &str);
    #[wasm_bindgen(js_namespace = console)]
    fn error(msg: &str, format: &str);
}

/// Forwards `log` records to the browser console.
struct WasmLog;

impl log::Log for WasmLog {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record<'_>) {
        let (write, name, color): (fn(&str, &str), &str, &str) = match record.level() {
            log::Level::Trace => (log, "trace", "color:plum"),
            log::Level::Debug => (log, "debug", "color:cyan"),
            log::Level::Warn => (warn, "warn", "color:goldenrod"),
            log::Level::Info => (info, "info", "color:mediumseagreen"),
            log::Level::Error => (error, "error", "color:red"),
        };
        write(&format!("%c{name}\t{}", record.args()), color);
    }

    fn flush(&self) {}
}

static LOGGER: WasmLog = WasmLog;

/// Returns the element with `id`, creating it under `<body>` if missing.
fn host_element(document: &Document, id: &str) -> Result<Element, JsValue> {
    if let Some(el) = document.get_element_by_id(id) {
        return Ok(el);
    }
    let el = document.create_element("div")?;
    el.set_id(id);
    document
        .body()
        .ok_or_else(|| JsValue::from_str("document has no body"))?
        .append_child(&el)?;
    Ok(el)
}

/// The page's map integration, if it installed one as `window.strataLayerHost`.
fn layer_host(window: &web_sys::Window) -> Option<JsLayerHost> {
    let host = js_sys::Reflect::get(window, &JsValue::from_str("strataLayerHost")).ok()?;
    (!host.is_undefined() && !host.is_null()).then(|| host.unchecked_into())
}

fn create_manager(window: &web_sys::Window) -> LayerManager {
    let (factory, js_factory): (Box<dyn LayerFactory>, Option<JsLayerFactory>) =
        match layer_host(window) {
            Some(host) => {
                let factory = JsLayerFactory::new(host);
                (Box::new(factory.clone()), Some(factory))
            }
            None => {
                log::warn!("no `strataLayerHost` on window; layers will not be drawn");
                (Box::new(DetachedFactory), None)
            }
        };
    let manager =
        LayerManager::with_parts(factory, ProjectionRegistry::default(), Box::new(RandomIds));
    if let Some(factory) = js_factory {
        factory.bind(&manager);
    }
    manager
}

fn add_configured_layers(manager: &LayerManager) {
    let specs: Vec<MapLayerSpec> = match serde_json::from_str(CONFIGURED_LAYERS) {
        Ok(specs) => specs,
        Err(err) => {
            log::error!("invalid layer configuration: {err}");
            return;
        }
    };
    for spec in specs {
        let name = spec.name.clone();
        if let Err(err) = manager.add_layer(spec, AddOptions::bootstrap()) {
            log::error!("skipping configured layer `{name}`: {err}");
        }
    }
    if let Err(err) = manager.add_layer(
        FeatureLayerSpec::new("Sketches").with_id("sketches"),
        AddOptions::bootstrap(),
    ) {
        log::error!("failed to create the sketch layer: {err}");
    }
}

fn callbacks() -> LayerCallbacks {
    LayerCallbacks {
        map: KindCallbacks::default(),
        feature: KindCallbacks {
            added: Some(Rc::new(|record| {
                log::info!("feature layer `{}` is ready for drawing", record.name);
            })),
            ..KindCallbacks::default()
        },
    }
}

fn attach_tool(
    manager: LayerManager,
    view: DomLayerList,
    storage: impl KeyValueStore + 'static,
    host: ToolHost,
    config: LayerToolConfig,
) -> LayerTool {
    LayerTool::new(manager, view, storage, host, config, callbacks())
}

fn sortable(
    list: &HtmlElement,
    kind: LayerKind,
    tool: &WeakLayerTool,
) -> Result<SortableList, JsValue> {
    let tool = tool.clone();
    SortableList::attach(list, move |drag| {
        if let Some(tool) = tool.upgrade() {
            tool.on_sort_end(kind, drag);
        }
    })
}

/// Entry point for the layer toolbar demo.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() -> Result<(), JsValue> {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let map_host = host_element(&document, "strata-map-layers")?;
    let feature_host = host_element(&document, "strata-feature-layers")?;
    let toast_host = host_element(&document, "strata-toasts")?;

    let manager = create_manager(&window);

    let config = LayerToolConfig::default();
    let view = DomLayerList::new(&document, &map_host, &feature_host, &config)?;
    let actions = view.actions();
    let map_list = view.list_element(LayerKind::Map).clone();
    let feature_list = view.list_element(LayerKind::Feature).clone();

    let dialogs = BrowserDialogs::new().ok_or_else(|| JsValue::from_str("no window"))?;
    let host = ToolHost::new(
        dialogs,
        ToastNotifier::new(&document, &toast_host),
        DomOverlays::new(&document),
        BlobDownloader::new(&document),
    );
    let tool = match LocalStorage::open() {
        Some(storage) => attach_tool(manager, view, storage, host, config),
        None => {
            log::warn!("localStorage is unavailable; layer state will not survive reloads");
            attach_tool(manager, view, MemoryStore::new(), host, config)
        }
    };

    let weak = tool.downgrade();
    let sortables = [
        sortable(&map_list, LayerKind::Map, &weak)?,
        sortable(&feature_list, LayerKind::Feature, &weak)?,
    ];
    actions.connect(move |action| {
        if let Some(tool) = weak.upgrade() {
            tool.dispatch(action);
        }
    });
    // Layers added after the tool exists pick up their stored order and
    // visibility.
    add_configured_layers(tool.manager());
    tool.ready();

    // The page never tears the toolbar down.
    core::mem::forget(sortables);
    core::mem::forget(tool);
    Ok(())
}
