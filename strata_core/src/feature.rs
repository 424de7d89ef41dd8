// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vector features held by feature layers.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Point;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifies a feature within its layer's source.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(String);

impl FeatureId {
    /// Wraps a string as a feature id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeatureId({})", self.0)
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Feature geometry in map projection coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    /// A single position (markers).
    Point(Point),
    /// An open polyline.
    LineString(Vec<Point>),
    /// An exterior ring followed by optional holes.
    Polygon(Vec<Vec<Point>>),
}

impl Geometry {
    /// Returns the GeoJSON/WKT type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Point(_) => "Point",
            Self::LineString(_) => "LineString",
            Self::Polygon(_) => "Polygon",
        }
    }
}

/// A vector feature.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    /// Identity within the owning source.
    pub id: FeatureId,
    /// Shape of the feature.
    pub geometry: Geometry,
    /// Free-form properties, written out verbatim by serializers.
    pub properties: Map<String, Value>,
    /// Whether a tooltip overlay is attached to this feature.
    pub has_tooltip: bool,
}

impl Feature {
    /// Creates a feature without properties or tooltip.
    #[must_use]
    pub fn new(id: impl Into<String>, geometry: Geometry) -> Self {
        Self {
            id: FeatureId::new(id),
            geometry,
            properties: Map::new(),
            has_tooltip: false,
        }
    }

    /// Marks the feature as carrying a tooltip overlay.
    #[must_use]
    pub fn with_tooltip(mut self) -> Self {
        self.has_tooltip = true;
        self
    }

    /// Sets a property, replacing any previous value.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// An enumerable collection of features backing a vector layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureSource {
    features: Vec<Feature>,
}

impl FeatureSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a feature.
    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    /// Returns the number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns whether the source holds no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Returns the features in insertion order.
    #[must_use]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Returns the ids of every feature.
    #[must_use]
    pub fn ids(&self) -> Vec<FeatureId> {
        self.features.iter().map(|f| f.id.clone()).collect()
    }

    /// Returns the ids of features carrying a tooltip overlay.
    #[must_use]
    pub fn tooltip_ids(&self) -> Vec<FeatureId> {
        self.features
            .iter()
            .filter(|f| f.has_tooltip)
            .map(|f| f.id.clone())
            .collect()
    }
}

impl From<Vec<Feature>> for FeatureSource {
    fn from(features: Vec<Feature>) -> Self {
        Self { features }
    }
}

impl FromIterator<Feature> for FeatureSource {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn tooltip_ids_only_lists_features_with_overlays() {
        let source: FeatureSource = vec![
            Feature::new("a", Geometry::Point(Point::new(1.0, 2.0))).with_tooltip(),
            Feature::new("b", Geometry::Point(Point::new(3.0, 4.0))),
        ]
        .into_iter()
        .collect();
        assert_eq!(source.len(), 2);
        assert_eq!(source.tooltip_ids(), vec![FeatureId::new("a")]);
    }
}
