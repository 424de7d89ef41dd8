// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderable layers supplied by a JavaScript map integration.

use alloc::boxed::Box;
use alloc::format;
use alloc::rc::Rc;
use alloc::string::{String, ToString as _};
use core::cell::RefCell;
use core::fmt;
use core::slice;

use serde_json::{Map, Value};
use strata_core::feature::{Feature, FeatureSource};
use strata_core::format::FeatureFormat;
use strata_core::layer::{
    BuildError, IdSource, LayerFactory, LayerId, LayerKind, LayerSpec, MapLayerType, RenderLayer,
};
use strata_core::registry::{LayerManager, WeakLayerManager};
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use crate::js_message;

const VISIBLE_CHANGE: &str = "change:visible";

#[wasm_bindgen]
extern "C" {
    /// A layer object owned by the map library, for example an OpenLayers
    /// `BaseLayer`.
    pub type JsLayer;

    #[wasm_bindgen(method, js_name = getVisible)]
    fn get_visible(this: &JsLayer) -> bool;

    #[wasm_bindgen(method, js_name = setVisible)]
    fn set_visible(this: &JsLayer, visible: bool);

    #[wasm_bindgen(method, js_name = getZIndex)]
    fn get_z_index(this: &JsLayer) -> Option<f64>;

    #[wasm_bindgen(method, js_name = setZIndex)]
    fn set_z_index(this: &JsLayer, index: i32);

    #[wasm_bindgen(method)]
    fn on(this: &JsLayer, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method)]
    fn un(this: &JsLayer, event: &str, listener: &js_sys::Function);

    /// The map integration: constructs layers, attaches them to the map, and
    /// draws features.
    ///
    /// `createLayer(id, description)` may throw; the message becomes the
    /// [`BuildError`]. `description` is `{ kind: "map", spec }` with the
    /// camelCase map layer spec, or `{ kind: "feature", name, isVisible }`.
    #[derive(Clone)]
    pub type JsLayerHost;

    #[wasm_bindgen(method, catch, js_name = createLayer)]
    fn create_layer(this: &JsLayerHost, id: &str, description: &JsValue)
    -> Result<JsLayer, JsValue>;

    #[wasm_bindgen(method, js_name = removeLayer)]
    fn remove_layer(this: &JsLayerHost, layer: &JsLayer);

    #[wasm_bindgen(method, js_name = addFeatures)]
    fn add_features(this: &JsLayerHost, layer: &JsLayer, geojson: &str);

    #[wasm_bindgen(js_namespace = crypto, js_name = randomUUID)]
    fn random_uuid() -> String;
}

/// The JSON handed to `createLayer`.
fn describe(spec: &LayerSpec) -> Result<Value, BuildError> {
    let mut description = Map::new();
    description.insert(String::from("kind"), Value::from(spec.kind().as_str()));
    match spec {
        LayerSpec::Map(map) => {
            let map = serde_json::to_value(map)
                .map_err(|err| BuildError::new(format!("{err}")))?;
            description.insert(String::from("spec"), map);
        }
        LayerSpec::Feature(feature) => {
            description.insert(String::from("name"), Value::from(feature.name.as_str()));
            description.insert(String::from("isVisible"), Value::from(feature.is_visible));
        }
    }
    Ok(Value::Object(description))
}

fn initial_source(spec: &LayerSpec) -> Option<FeatureSource> {
    match spec {
        LayerSpec::Feature(feature) => Some(feature.features.iter().cloned().collect()),
        LayerSpec::Map(map) if map.layer == MapLayerType::Vector => Some(FeatureSource::new()),
        LayerSpec::Map(_) => None,
    }
}

type ManagerSlot = Rc<RefCell<Option<WeakLayerManager>>>;

/// A [`RenderLayer`] backed by a [`JsLayer`].
struct WebLayer {
    host: JsLayerHost,
    layer: JsLayer,
    source: Option<FeatureSource>,
    on_visible: Closure<dyn FnMut()>,
}

impl WebLayer {
    fn draw(&self, features: &[Feature]) {
        match FeatureFormat::GeoJson.write(features) {
            Ok(geojson) => self.host.add_features(&self.layer, &geojson),
            Err(err) => log::warn!("failed to encode features for drawing: {err}"),
        }
    }
}

impl RenderLayer for WebLayer {
    fn is_visible(&self) -> bool {
        self.layer.get_visible()
    }

    fn set_visible(&mut self, visible: bool) {
        self.layer.set_visible(visible);
    }

    fn z_index(&self) -> i32 {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "z-indices are written by the registry as i32"
        )]
        let z = self.layer.get_z_index().map_or(0, |z| z as i32);
        z
    }

    fn set_z_index(&mut self, index: i32) {
        self.layer.set_z_index(index);
    }

    fn features(&self) -> Option<&FeatureSource> {
        self.source.as_ref()
    }

    fn features_mut(&mut self) -> Option<&mut FeatureSource> {
        self.source.as_mut()
    }

    fn add_feature(&mut self, feature: Feature) -> bool {
        if self.source.is_none() {
            return false;
        }
        self.draw(slice::from_ref(&feature));
        if let Some(source) = self.source.as_mut() {
            source.push(feature);
        }
        true
    }

    fn dispose(&mut self) {
        self.layer
            .un(VISIBLE_CHANGE, self.on_visible.as_ref().unchecked_ref());
        self.host.remove_layer(&self.layer);
    }
}

/// A [`LayerFactory`] delegating construction to a [`JsLayerHost`].
///
/// Visibility flips made on the JavaScript side (for example by another map
/// control) are reported to the registry once [`bind`](Self::bind) has been
/// called. Clones share the binding.
#[derive(Clone)]
pub struct JsLayerFactory {
    host: JsLayerHost,
    manager: ManagerSlot,
}

impl fmt::Debug for JsLayerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsLayerFactory")
            .field("bound", &self.manager.borrow().is_some())
            .finish_non_exhaustive()
    }
}

impl JsLayerFactory {
    /// Creates a factory for `host`.
    #[must_use]
    pub fn new(host: JsLayerHost) -> Self {
        Self {
            host,
            manager: Rc::default(),
        }
    }

    /// Reports future visibility flips to `manager`.
    ///
    /// Only a weak reference is kept, since the manager owns this factory.
    pub fn bind(&self, manager: &LayerManager) {
        *self.manager.borrow_mut() = Some(manager.downgrade());
    }

    fn visibility_listener(&self, kind: LayerKind, id: &LayerId) -> Closure<dyn FnMut()> {
        let slot = Rc::clone(&self.manager);
        let id = id.clone();
        Closure::wrap(Box::new(move || {
            let manager = slot.borrow().as_ref().and_then(WeakLayerManager::upgrade);
            if let Some(manager) = manager {
                manager.sync_visibility(kind, &id);
            }
        }) as Box<dyn FnMut()>)
    }
}

impl LayerFactory for JsLayerFactory {
    fn build(&self, id: &LayerId, spec: &LayerSpec) -> Result<Box<dyn RenderLayer>, BuildError> {
        let description = describe(spec)?;
        let description = js_sys::JSON::parse(&description.to_string())
            .map_err(|err| BuildError::new(js_message(&err)))?;
        let layer = self
            .host
            .create_layer(id.as_str(), &description)
            .map_err(|err| BuildError::new(js_message(&err)))?;

        let on_visible = self.visibility_listener(spec.kind(), id);
        layer.on(VISIBLE_CHANGE, on_visible.as_ref().unchecked_ref());

        let web = WebLayer {
            host: self.host.clone(),
            layer,
            source: initial_source(spec),
            on_visible,
        };
        if let Some(source) = web.source.as_ref().filter(|source| !source.is_empty()) {
            web.draw(source.features());
        }
        Ok(Box::new(web))
    }
}

/// Layer ids from `crypto.randomUUID()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&mut self, _kind: LayerKind) -> LayerId {
        LayerId::new(random_uuid())
    }
}
