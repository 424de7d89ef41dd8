// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contract with the rendering library's layer object model.
//!
//! The registry never knows how a layer is drawn. It owns a boxed
//! [`RenderLayer`] per record, created by a [`LayerFactory`], and only touches
//! the three things ordering and visibility need: the visibility flag, the
//! paint order, and (for vector layers) the feature source.

use alloc::boxed::Box;
use alloc::string::String;

use thiserror::Error;

use super::id::LayerId;
use super::spec::LayerSpec;
use crate::feature::{Feature, FeatureSource};

/// A renderable layer owned by the registry.
pub trait RenderLayer {
    /// Returns the layer's own visibility flag.
    fn is_visible(&self) -> bool;

    /// Sets the visibility flag.
    ///
    /// Implementations backed by an external object model may report the change
    /// through their own property-change event; the registry tolerates that
    /// event arriving while the call is still on the stack.
    fn set_visible(&mut self, visible: bool);

    /// Returns the paint order.
    fn z_index(&self) -> i32;

    /// Sets the paint order. Higher values draw on top.
    fn set_z_index(&mut self, index: i32);

    /// Returns the feature source, if the layer has enumerable features.
    fn features(&self) -> Option<&FeatureSource> {
        None
    }

    /// Mutable access to the feature source.
    fn features_mut(&mut self) -> Option<&mut FeatureSource> {
        None
    }

    /// Appends a feature to the source. Returns `false` if the layer has none.
    ///
    /// Backends that draw features themselves override this to forward the
    /// feature to the renderer as well.
    fn add_feature(&mut self, feature: Feature) -> bool {
        match self.features_mut() {
            Some(source) => {
                source.push(feature);
                true
            }
            None => false,
        }
    }

    /// Releases rendering resources. Called once, when the layer is removed.
    fn dispose(&mut self) {}
}

/// The rendering library refused to construct a layer.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct BuildError {
    message: String,
}

impl BuildError {
    /// Creates an error with a human-readable message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Builds renderable layers from specs.
///
/// `build` must not have observable side effects when it fails: the registry
/// relies on a failed build leaving nothing behind.
pub trait LayerFactory {
    /// Constructs the renderable for a layer with the given id.
    fn build(&self, id: &LayerId, spec: &LayerSpec) -> Result<Box<dyn RenderLayer>, BuildError>;
}

/// A renderable that only stores its state.
///
/// Used headless (tests, server-side previews) and as the fallback when no
/// rendering library is attached.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetachedLayer {
    visible: bool,
    z_index: i32,
    source: Option<FeatureSource>,
}

impl DetachedLayer {
    /// Creates a layer without a feature source.
    #[must_use]
    pub fn new(visible: bool) -> Self {
        Self {
            visible,
            z_index: 0,
            source: None,
        }
    }

    /// Creates a vector layer backed by `source`.
    #[must_use]
    pub fn with_source(visible: bool, source: FeatureSource) -> Self {
        Self {
            visible,
            z_index: 0,
            source: Some(source),
        }
    }
}

impl RenderLayer for DetachedLayer {
    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn z_index(&self) -> i32 {
        self.z_index
    }

    fn set_z_index(&mut self, index: i32) {
        self.z_index = index;
    }

    fn features(&self) -> Option<&FeatureSource> {
        self.source.as_ref()
    }

    fn features_mut(&mut self) -> Option<&mut FeatureSource> {
        self.source.as_mut()
    }
}

/// Factory producing [`DetachedLayer`]s.
///
/// Feature layers get a source seeded from their spec; vector map layers get
/// an empty source; tile layers get none.
#[derive(Clone, Copy, Debug, Default)]
pub struct DetachedFactory;

impl LayerFactory for DetachedFactory {
    fn build(&self, _id: &LayerId, spec: &LayerSpec) -> Result<Box<dyn RenderLayer>, BuildError> {
        let layer = match spec {
            LayerSpec::Feature(feature) => DetachedLayer::with_source(
                feature.is_visible,
                feature.features.iter().cloned().collect(),
            ),
            LayerSpec::Map(map) if map.layer == super::spec::MapLayerType::Vector => {
                DetachedLayer::with_source(map.is_visible, FeatureSource::new())
            }
            LayerSpec::Map(map) => DetachedLayer::new(map.is_visible),
        };
        Ok(Box::new(layer))
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::feature::{Feature, Geometry};
    use crate::layer::spec::{FeatureLayerSpec, MapLayerSpec};

    #[test]
    fn detached_factory_seeds_feature_sources() {
        let spec = LayerSpec::Feature(FeatureLayerSpec::new("Pins").with_features(vec![
            Feature::new("p1", Geometry::Point(kurbo::Point::new(0.0, 0.0))),
        ]));
        let layer = DetachedFactory.build(&LayerId::new("x"), &spec).unwrap();
        assert_eq!(layer.features().map(FeatureSource::len), Some(1));
    }

    #[test]
    fn tile_layers_have_no_source() {
        let spec = LayerSpec::Map(MapLayerSpec::new("OSM"));
        let layer = DetachedFactory.build(&LayerId::new("osm"), &spec).unwrap();
        assert!(layer.features().is_none());
        assert!(layer.is_visible());
    }
}
