// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Feature serialization for layer download and import.

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt::Write as _;

use kurbo::Point;
use serde_json::{Value, json};

use crate::error::{LayerError, Result};
use crate::feature::{Feature, Geometry};

/// A feature serialization format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureFormat {
    /// GeoJSON `FeatureCollection`. Reads and writes.
    GeoJson,
    /// Well-known text. Write only.
    Wkt,
}

impl FeatureFormat {
    /// All formats, in the order offered to the user.
    pub const ALL: [Self; 2] = [Self::GeoJson, Self::Wkt];

    /// Looks up a format by key, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::UnsupportedFormat`] for unknown keys.
    pub fn from_key(key: &str) -> Result<Self> {
        let key = key.trim();
        Self::ALL
            .into_iter()
            .find(|format| format.key().eq_ignore_ascii_case(key))
            .ok_or_else(|| LayerError::UnsupportedFormat(String::from(key)))
    }

    /// Lowercase key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::GeoJson => "geojson",
            Self::Wkt => "wkt",
        }
    }

    /// Display name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::GeoJson => "GeoJSON",
            Self::Wkt => "WKT",
        }
    }

    /// File extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::GeoJson => "geojson",
            Self::Wkt => "wkt",
        }
    }

    /// MIME type of written files.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::GeoJson => "application/geo+json",
            Self::Wkt => "text/plain",
        }
    }

    /// Whether [`read`](Self::read) is supported.
    #[must_use]
    pub const fn can_read(self) -> bool {
        matches!(self, Self::GeoJson)
    }

    /// Serializes `features`.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::Parse`] if the output could not be encoded.
    pub fn write(self, features: &[Feature]) -> Result<String> {
        match self {
            Self::GeoJson => {
                let collection = json!({
                    "type": "FeatureCollection",
                    "features": features.iter().map(geojson_feature).collect::<Vec<_>>(),
                });
                serde_json::to_string(&collection).map_err(|err| LayerError::Parse {
                    format: self.label(),
                    message: err.to_string(),
                })
            }
            Self::Wkt => Ok(wkt_collection(features)),
        }
    }

    /// Parses features from `text`.
    ///
    /// Features without an id are numbered by position.
    ///
    /// # Errors
    ///
    /// Returns [`LayerError::UnsupportedFormat`] for write-only formats and
    /// [`LayerError::Parse`] for malformed input.
    pub fn read(self, text: &str) -> Result<Vec<Feature>> {
        match self {
            Self::GeoJson => read_geojson(text),
            Self::Wkt => Err(LayerError::UnsupportedFormat(String::from(self.key()))),
        }
    }
}

fn coords(p: Point) -> Value {
    json!([p.x, p.y])
}

fn geojson_geometry(geometry: &Geometry) -> Value {
    let coordinates = match geometry {
        Geometry::Point(p) => coords(*p),
        Geometry::LineString(line) => line.iter().copied().map(coords).collect(),
        Geometry::Polygon(rings) => rings
            .iter()
            .map(|ring| ring.iter().copied().map(coords).collect::<Value>())
            .collect(),
    };
    json!({ "type": geometry.type_name(), "coordinates": coordinates })
}

fn geojson_feature(feature: &Feature) -> Value {
    json!({
        "type": "Feature",
        "id": feature.id.as_str(),
        "geometry": geojson_geometry(&feature.geometry),
        "properties": feature.properties,
    })
}

fn parse_error(message: impl Into<String>) -> LayerError {
    LayerError::Parse {
        format: FeatureFormat::GeoJson.label(),
        message: message.into(),
    }
}

fn read_geojson(text: &str) -> Result<Vec<Feature>> {
    let root: Value = serde_json::from_str(text).map_err(|err| parse_error(err.to_string()))?;
    match root.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => root
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| parse_error("`features` must be an array"))?
            .iter()
            .enumerate()
            .map(|(i, value)| read_feature(i, value))
            .collect(),
        Some("Feature") => Ok(alloc::vec![read_feature(0, &root)?]),
        Some(other) => Err(parse_error(format!("unsupported object type `{other}`"))),
        None => Err(parse_error("missing `type`")),
    }
}

fn read_feature(position: usize, value: &Value) -> Result<Feature> {
    let id = match value.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("feature-{position}"),
    };
    let geometry = value
        .get("geometry")
        .ok_or_else(|| parse_error(format!("feature `{id}` has no geometry")))?;
    let mut feature = Feature::new(id, read_geometry(geometry)?);
    if let Some(Value::Object(properties)) = value.get("properties") {
        feature.properties = properties.clone();
    }
    Ok(feature)
}

fn read_geometry(value: &Value) -> Result<Geometry> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| parse_error("geometry without `type`"))?;
    let coordinates = value
        .get("coordinates")
        .ok_or_else(|| parse_error("geometry without `coordinates`"))?;
    match kind {
        "Point" => read_point(coordinates).map(Geometry::Point),
        "LineString" => read_line(coordinates).map(Geometry::LineString),
        "Polygon" => as_array(coordinates)?
            .iter()
            .map(read_line)
            .collect::<Result<_>>()
            .map(Geometry::Polygon),
        other => Err(parse_error(format!("unsupported geometry `{other}`"))),
    }
}

fn as_array(value: &Value) -> Result<&Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| parse_error("coordinates must be arrays"))
}

fn read_point(value: &Value) -> Result<Point> {
    match as_array(value)?.as_slice() {
        [x, y, ..] => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => Ok(Point::new(x, y)),
            _ => Err(parse_error("coordinates must be numbers")),
        },
        _ => Err(parse_error("a position needs two coordinates")),
    }
}

fn read_line(value: &Value) -> Result<Vec<Point>> {
    as_array(value)?.iter().map(read_point).collect()
}

fn wkt_points(out: &mut String, points: &[Point]) {
    out.push('(');
    for (i, p) in points.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{} {}", p.x, p.y);
    }
    out.push(')');
}

fn wkt_geometry(out: &mut String, geometry: &Geometry) {
    match geometry {
        Geometry::Point(p) => {
            let _ = write!(out, "POINT ({} {})", p.x, p.y);
        }
        Geometry::LineString(line) => {
            out.push_str("LINESTRING ");
            wkt_points(out, line);
        }
        Geometry::Polygon(rings) => {
            out.push_str("POLYGON (");
            for (i, ring) in rings.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                wkt_points(out, ring);
            }
            out.push(')');
        }
    }
}

/// A single feature is written as its bare geometry; anything else becomes a
/// `GEOMETRYCOLLECTION`.
fn wkt_collection(features: &[Feature]) -> String {
    let mut out = String::new();
    match features {
        [] => out.push_str("GEOMETRYCOLLECTION EMPTY"),
        [single] => wkt_geometry(&mut out, &single.geometry),
        many => {
            out.push_str("GEOMETRYCOLLECTION (");
            for (i, feature) in many.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                wkt_geometry(&mut out, &feature.geometry);
            }
            out.push(')');
        }
    }
    out
}
