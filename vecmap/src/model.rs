use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type LayerId = u32;

/// Longitude/latitude pair in the map engine's native geographic space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Coordinate { lon, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from(v: [f64; 2]) -> Self {
        Coordinate { lon: v[0], lat: v[1] }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.lon, c.lat]
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lon, lat): (f64, f64)) -> Self {
        Coordinate { lon, lat }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
}

impl GeometryKind {
    /// Distinct vertices a finished geometry of this kind needs.
    pub fn min_points(self) -> usize {
        match self {
            GeometryKind::Point => 1,
            GeometryKind::Line => 2,
            GeometryKind::Polygon => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GeometryKind::Point => "point",
            GeometryKind::Line => "line",
            GeometryKind::Polygon => "polygon",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// GeoJSON-shaped geometry. Polygon rings are closed (first coordinate
/// repeated as the last); the outer ring comes first, holes follow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Coordinate),
    LineString(Vec<Coordinate>),
    Polygon(Vec<Vec<Coordinate>>),
    MultiPoint(Vec<Coordinate>),
    MultiLineString(Vec<Vec<Coordinate>>),
    MultiPolygon(Vec<Vec<Vec<Coordinate>>>),
}

impl Geometry {
    /// Multi geometries report the kind of their parts.
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Point(_) | Geometry::MultiPoint(_) => GeometryKind::Point,
            Geometry::LineString(_) | Geometry::MultiLineString(_) => GeometryKind::Line,
            Geometry::Polygon(_) | Geometry::MultiPolygon(_) => GeometryKind::Polygon,
        }
    }

    /// Every vertex of every part, holes and closing vertices included.
    pub fn vertices(&self) -> Vec<Coordinate> {
        match self {
            Geometry::Point(c) => vec![*c],
            Geometry::LineString(cs) | Geometry::MultiPoint(cs) => cs.clone(),
            Geometry::Polygon(parts) | Geometry::MultiLineString(parts) => parts.concat(),
            Geometry::MultiPolygon(polys) => polys.iter().flat_map(|p| p.concat()).collect(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        match self {
            Geometry::Point(_) => 1,
            Geometry::LineString(cs) | Geometry::MultiPoint(cs) => cs.len(),
            Geometry::Polygon(parts) | Geometry::MultiLineString(parts) => parts.iter().map(Vec::len).sum(),
            Geometry::MultiPolygon(polys) => polys.iter().flatten().map(Vec::len).sum(),
        }
    }

    /// Outer ring of a polygon, or of the first polygon of a multipolygon.
    pub fn outer_ring(&self) -> Option<&[Coordinate]> {
        match self {
            Geometry::Polygon(rings) => rings.first().map(Vec::as_slice),
            Geometry::MultiPolygon(polys) => polys.first()?.first().map(Vec::as_slice),
            _ => None,
        }
    }

    /// Builds a hole-free polygon from an open or closed ring.
    pub fn polygon_from_ring(ring: Vec<Coordinate>) -> Geometry {
        Geometry::Polygon(vec![close_ring(ring)])
    }
}

/// Repeats the first coordinate at the end unless the ring already closes.
pub fn close_ring(mut ring: Vec<Coordinate>) -> Vec<Coordinate> {
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
        if first != last {
            ring.push(first);
        }
    }
    ring
}

/// Scalar attribute value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

pub type Properties = BTreeMap<String, PropertyValue>;

pub const ANNOTATION_KEY: &str = "_annotation";
pub const CREATED_AT_KEY: &str = "createdAt";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Properties,
}

impl Feature {
    pub fn new(geometry: Geometry) -> Self {
        Feature {
            geometry,
            properties: Properties::new(),
        }
    }

    pub fn is_annotation(&self) -> bool {
        matches!(
            self.properties.get(ANNOTATION_KEY),
            Some(PropertyValue::Bool(true))
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointShape {
    #[default]
    Circle,
    Square,
    Triangle,
    Star,
    Diamond,
}

/// Layer symbology. For point layers `stroke_width` is the marker radius.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStyle {
    pub stroke_color: String,
    pub fill_color: String,
    pub fill_opacity: f64,
    pub stroke_width: f64,
    #[serde(default)]
    pub point_shape: PointShape,
}

fn default_true() -> bool {
    true
}

fn default_opacity() -> f64 {
    1.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub geometry_kind: GeometryKind,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_true")]
    pub selectable: bool,
    pub style: LayerStyle,
    #[serde(default)]
    pub features: Vec<Feature>,
    /// Created by an annotation drawing rather than by import or feature drawing.
    #[serde(default)]
    pub annotation: bool,
}

impl Layer {
    pub fn is_interactive(&self) -> bool {
        self.visible && self.selectable && !self.features.is_empty()
    }
}
