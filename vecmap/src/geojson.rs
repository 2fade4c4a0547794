use crate::error::{Error, Result};
use crate::geometry::limits;
use crate::geometry::predicates::distinct_count;
use crate::model::{close_ring, Coordinate, Feature, Geometry, GeometryKind, Properties, PropertyValue};
use serde_json::{json, Map, Value};

/// FeatureCollection for a map source. Each feature's top-level `id` is its
/// index in `features`, which highlight expressions and click picking rely on.
pub fn feature_collection(features: &[Feature]) -> Value {
    let features: Vec<Value> = features
        .iter()
        .enumerate()
        .map(|(i, f)| feature_value(f, Some(i)))
        .collect();
    json!({"type": "FeatureCollection", "features": features})
}

pub fn feature_value(f: &Feature, id: Option<usize>) -> Value {
    let mut obj = Map::new();
    obj.insert("type".into(), Value::from("Feature"));
    if let Some(id) = id {
        obj.insert("id".into(), Value::from(id));
    }
    obj.insert("geometry".into(), geometry_value(&f.geometry));
    obj.insert(
        "properties".into(),
        serde_json::to_value(&f.properties).unwrap_or_else(|_| Value::Object(Map::new())),
    );
    Value::Object(obj)
}

pub fn geometry_value(g: &Geometry) -> Value {
    fn pos(c: &Coordinate) -> Value {
        json!([c.lon, c.lat])
    }
    fn line(cs: &[Coordinate]) -> Value {
        Value::Array(cs.iter().map(pos).collect())
    }
    fn rings(rs: &[Vec<Coordinate>]) -> Value {
        Value::Array(rs.iter().map(|r| line(r)).collect())
    }
    let (ty, coordinates) = match g {
        Geometry::Point(c) => ("Point", pos(c)),
        Geometry::LineString(cs) => ("LineString", line(cs)),
        Geometry::Polygon(rs) => ("Polygon", rings(rs)),
        Geometry::MultiPoint(cs) => ("MultiPoint", line(cs)),
        Geometry::MultiLineString(ls) => ("MultiLineString", rings(ls)),
        Geometry::MultiPolygon(ps) => ("MultiPolygon", Value::Array(ps.iter().map(|p| rings(p)).collect())),
    };
    json!({"type": ty, "coordinates": coordinates})
}

fn parse_position(v: &Value) -> Result<Coordinate> {
    let arr = v
        .as_array()
        .ok_or_else(|| Error::InvalidGeoJson("position must be an array".into()))?;
    // Extra ordinates (altitude) are ignored.
    match (arr.first().and_then(Value::as_f64), arr.get(1).and_then(Value::as_f64)) {
        (Some(lon), Some(lat)) if limits::finite_pair(lon, lat) => Ok(Coordinate::new(lon, lat)),
        _ => Err(Error::InvalidGeoJson("position needs two finite numbers".into())),
    }
}

fn parse_positions(v: &Value) -> Result<Vec<Coordinate>> {
    let arr = v
        .as_array()
        .ok_or_else(|| Error::InvalidGeoJson("coordinates must be an array".into()))?;
    if arr.len() > limits::MAX_GEOMETRY_VERTICES {
        return Err(Error::LimitExceeded {
            what: "geometry vertices",
            max: limits::MAX_GEOMETRY_VERTICES,
        });
    }
    arr.iter().map(parse_position).collect()
}

fn parse_parts<T>(v: &Value, part: impl Fn(&Value) -> Result<T>) -> Result<Vec<T>> {
    v.as_array()
        .ok_or_else(|| Error::InvalidGeoJson("coordinates must be an array".into()))?
        .iter()
        .map(part)
        .collect()
}

fn parse_line(v: &Value) -> Result<Vec<Coordinate>> {
    let cs = parse_positions(v)?;
    if cs.len() < 2 {
        return Err(Error::InvalidGeometry {
            kind: GeometryKind::Line,
            needed: 2,
            got: cs.len(),
        });
    }
    Ok(cs)
}

fn parse_ring(v: &Value) -> Result<Vec<Coordinate>> {
    let ring = parse_positions(v)?;
    let distinct = distinct_count(&ring);
    if distinct < 3 {
        return Err(Error::InvalidGeometry {
            kind: GeometryKind::Polygon,
            needed: 3,
            got: distinct,
        });
    }
    Ok(close_ring(ring))
}

/// Outer ring first. A degenerate outer ring rejects the polygon; a
/// degenerate hole is dropped.
fn parse_polygon(v: &Value) -> Result<Vec<Vec<Coordinate>>> {
    let rings = v
        .as_array()
        .filter(|rings| !rings.is_empty())
        .ok_or_else(|| Error::InvalidGeoJson("polygon without rings".into()))?;
    let mut out = vec![parse_ring(&rings[0])?];
    for hole in &rings[1..] {
        match parse_ring(hole) {
            Ok(ring) => out.push(ring),
            Err(e @ Error::LimitExceeded { .. }) => return Err(e),
            Err(e) => log::warn!("dropping polygon hole: {e}"),
        }
    }
    Ok(out)
}

fn non_empty<T>(parts: Vec<T>, kind: GeometryKind) -> Result<Vec<T>> {
    if parts.is_empty() {
        return Err(Error::InvalidGeometry {
            kind,
            needed: 1,
            got: 0,
        });
    }
    Ok(parts)
}

/// Parse any GeoJSON geometry except GeometryCollection. Polygon rings are
/// closed if the input left them open.
pub fn geometry_from_value(v: &Value) -> Result<Geometry> {
    let ty = v
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidGeoJson("geometry without type".into()))?;
    let coords = v
        .get("coordinates")
        .ok_or_else(|| Error::InvalidGeoJson("geometry without coordinates".into()))?;
    let geometry = match ty {
        "Point" => Geometry::Point(parse_position(coords)?),
        "LineString" => Geometry::LineString(parse_line(coords)?),
        "Polygon" => Geometry::Polygon(parse_polygon(coords)?),
        "MultiPoint" => Geometry::MultiPoint(non_empty(parse_positions(coords)?, GeometryKind::Point)?),
        "MultiLineString" => {
            Geometry::MultiLineString(non_empty(parse_parts(coords, parse_line)?, GeometryKind::Line)?)
        }
        "MultiPolygon" => {
            Geometry::MultiPolygon(non_empty(parse_parts(coords, parse_polygon)?, GeometryKind::Polygon)?)
        }
        other => return Err(Error::InvalidGeoJson(format!("unsupported geometry type '{other}'"))),
    };
    if geometry.vertex_count() > limits::MAX_GEOMETRY_VERTICES {
        return Err(Error::LimitExceeded {
            what: "geometry vertices",
            max: limits::MAX_GEOMETRY_VERTICES,
        });
    }
    Ok(geometry)
}

fn scalar(v: &Value) -> PropertyValue {
    match v {
        Value::Null => PropertyValue::Null,
        Value::Bool(b) => PropertyValue::Bool(*b),
        Value::Number(n) => n.as_f64().map_or(PropertyValue::Null, PropertyValue::Number),
        Value::String(s) => PropertyValue::String(s.clone()),
        // Nested values are flattened to their JSON text.
        other => PropertyValue::String(other.to_string()),
    }
}

fn parse_properties(v: Option<&Value>) -> Properties {
    v.and_then(Value::as_object)
        .map(|o| o.iter().map(|(k, v)| (k.clone(), scalar(v))).collect())
        .unwrap_or_default()
}

pub fn feature_from_value(v: &Value) -> Result<Feature> {
    let geom = v
        .get("geometry")
        .filter(|g| !g.is_null())
        .ok_or_else(|| Error::InvalidGeoJson("feature without geometry".into()))?;
    Ok(Feature {
        geometry: geometry_from_value(geom)?,
        properties: parse_properties(v.get("properties")),
    })
}

/// Features parsed from an import.
#[derive(Debug, Default)]
pub struct Import {
    pub features: Vec<Feature>,
    /// Input features that were skipped (unsupported or invalid geometry).
    pub skipped: usize,
}

impl Import {
    /// Geometry kind of the first feature, used as the layer's kind.
    pub fn kind(&self) -> Option<GeometryKind> {
        self.features.first().map(|f| f.geometry.kind())
    }
}

/// Lenient import of a FeatureCollection (or a single Feature). Features with
/// unsupported or invalid geometry are skipped and counted; a collection
/// with nothing usable is an error.
pub fn import(v: &Value) -> Result<Import> {
    let items: Vec<&Value> = match v.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => v
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::InvalidGeoJson("FeatureCollection without features".into()))?
            .iter()
            .collect(),
        Some("Feature") => vec![v],
        _ => return Err(Error::InvalidGeoJson("expected a FeatureCollection or Feature".into())),
    };
    if items.len() > limits::MAX_IMPORT_FEATURES {
        return Err(Error::LimitExceeded {
            what: "features",
            max: limits::MAX_IMPORT_FEATURES,
        });
    }
    let mut out = Import::default();
    let mut total_vertices = 0usize;
    for item in items {
        match feature_from_value(item) {
            Ok(f) => {
                total_vertices += f.geometry.vertex_count();
                if total_vertices > limits::MAX_IMPORT_VERTICES_TOTAL {
                    return Err(Error::LimitExceeded {
                        what: "total vertices",
                        max: limits::MAX_IMPORT_VERTICES_TOTAL,
                    });
                }
                out.features.push(f);
            }
            Err(Error::LimitExceeded { what, max }) => return Err(Error::LimitExceeded { what, max }),
            Err(e) => {
                log::warn!("skipping imported feature: {e}");
                out.skipped += 1;
            }
        }
    }
    if out.features.is_empty() {
        return Err(Error::InvalidGeoJson("no supported features".into()));
    }
    Ok(out)
}
