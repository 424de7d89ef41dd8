// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layer creation specs and add options.

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::Rect;
use serde::{Deserialize, Serialize};

use super::id::{LayerId, LayerKind};
use crate::feature::Feature;
use crate::projection::DEFAULT_PROJECTION;

/// Rendering strategy of a map layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MapLayerType {
    /// Raster tiles.
    #[default]
    Tile,
    /// Vector data drawn client-side.
    Vector,
}

/// Data source backing a map layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MapSourceType {
    /// OpenStreetMap tiles.
    #[default]
    Osm,
    /// Templated `{z}/{x}/{y}` tile URL.
    Xyz,
    /// Tiled WMS.
    TileWms,
    /// Single-image WMS.
    ImageWms,
    /// Vector data loaded from `url`.
    Vector,
}

/// Describes a map layer to create.
///
/// Deserializable from configuration JSON (camelCase keys); everything except
/// `name` has a default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapLayerSpec {
    /// Fixed id for configured layers; `None` asks the registry for one.
    #[serde(default)]
    pub id: Option<LayerId>,
    /// Display name.
    pub name: String,
    /// Rendering strategy.
    #[serde(default)]
    pub layer: MapLayerType,
    /// Data source.
    #[serde(default)]
    pub source: MapSourceType,
    /// Projection code; must be registered before the layer is created.
    #[serde(default = "default_projection")]
    pub projection: String,
    /// Source URL (ignored for OSM).
    #[serde(default)]
    pub url: String,
    /// Attribution text shown by the map.
    #[serde(default)]
    pub attributions: String,
    /// Initial visibility when no persisted state exists.
    #[serde(default = "default_visible")]
    pub is_visible: bool,
    /// Optional `[min_x, min_y, max_x, max_y]` extent in projection units.
    #[serde(default)]
    pub extent: Option<[f64; 4]>,
}

fn default_projection() -> String {
    String::from(DEFAULT_PROJECTION)
}

const fn default_visible() -> bool {
    true
}

impl MapLayerSpec {
    /// Creates an OSM tile layer spec in the default projection.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            layer: MapLayerType::default(),
            source: MapSourceType::default(),
            projection: default_projection(),
            url: String::new(),
            attributions: String::new(),
            is_visible: true,
            extent: None,
        }
    }

    /// Sets a fixed id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<LayerId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Returns the extent as a rectangle, if one is set.
    #[must_use]
    pub fn extent_rect(&self) -> Option<Rect> {
        self.extent
            .map(|[x0, y0, x1, y1]| Rect::new(x0, y0, x1, y1))
    }
}

/// Describes a feature layer to create.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureLayerSpec {
    /// Fixed id; `None` asks the registry for one.
    pub id: Option<LayerId>,
    /// Display name.
    pub name: String,
    /// Initial visibility when no persisted state exists.
    pub is_visible: bool,
    /// Features seeding the layer's source.
    pub features: Vec<Feature>,
}

impl FeatureLayerSpec {
    /// Creates an empty, visible feature layer spec.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            is_visible: true,
            features: Vec::new(),
        }
    }

    /// Sets a fixed id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<LayerId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Seeds the source with `features`.
    #[must_use]
    pub fn with_features(mut self, features: Vec<Feature>) -> Self {
        self.features = features;
        self
    }
}

/// Either kind of layer spec.
#[derive(Clone, Debug, PartialEq)]
pub enum LayerSpec {
    /// A map layer.
    Map(MapLayerSpec),
    /// A feature layer.
    Feature(FeatureLayerSpec),
}

impl LayerSpec {
    /// Returns the kind of layer this spec creates.
    #[must_use]
    pub const fn kind(&self) -> LayerKind {
        match self {
            Self::Map(_) => LayerKind::Map,
            Self::Feature(_) => LayerKind::Feature,
        }
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Map(spec) => &spec.name,
            Self::Feature(spec) => &spec.name,
        }
    }

    /// Returns the fixed id, if any.
    #[must_use]
    pub fn id(&self) -> Option<&LayerId> {
        match self {
            Self::Map(spec) => spec.id.as_ref(),
            Self::Feature(spec) => spec.id.as_ref(),
        }
    }

    /// Returns the initial visibility.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        match self {
            Self::Map(spec) => spec.is_visible,
            Self::Feature(spec) => spec.is_visible,
        }
    }
}

impl From<MapLayerSpec> for LayerSpec {
    fn from(spec: MapLayerSpec) -> Self {
        Self::Map(spec)
    }
}

impl From<FeatureLayerSpec> for LayerSpec {
    fn from(spec: FeatureLayerSpec) -> Self {
        Self::Feature(spec)
    }
}

/// Per-layer overrides of the globally configured item buttons.
///
/// `None` defers to the tool configuration; `Some(true)` disables the button
/// for this layer only, `Some(false)` enables it even when disabled globally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ButtonOverrides {
    /// Rename button.
    pub disable_edit: Option<bool>,
    /// Download button (feature layers).
    pub disable_download: Option<bool>,
    /// Delete button.
    pub disable_delete: Option<bool>,
}

/// How a layer is being added.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AddOptions {
    /// Suppress user-facing notifications and callbacks (bootstrap layers).
    pub is_silent: bool,
    /// The layer is created at runtime rather than from configuration.
    pub is_dynamically_added: bool,
    /// Item button overrides forwarded in the `Added` event.
    pub buttons: ButtonOverrides,
}

impl AddOptions {
    /// Options for configured layers created while the map boots.
    #[must_use]
    pub const fn bootstrap() -> Self {
        Self {
            is_silent: true,
            is_dynamically_added: false,
            buttons: ButtonOverrides {
                disable_edit: None,
                disable_download: None,
                disable_delete: None,
            },
        }
    }

    /// Options for layers created by a user action.
    #[must_use]
    pub const fn dynamic() -> Self {
        Self {
            is_silent: false,
            is_dynamically_added: true,
            buttons: ButtonOverrides {
                disable_edit: None,
                disable_download: None,
                disable_delete: None,
            },
        }
    }
}
