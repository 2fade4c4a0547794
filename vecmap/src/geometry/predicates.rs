use crate::model::{Coordinate, Feature, Geometry};

/// Even-odd ray casting. The ring does not need to be explicitly closed; the
/// edge from the last vertex back to the first is always tested. Rings with
/// fewer than three vertices contain nothing.
pub fn point_in_polygon(point: Coordinate, ring: &[Coordinate]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let (x, y) = (point.lon, point.lat);
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = (ring[i].lon, ring[i].lat);
        let (xj, yj) = (ring[j].lon, ring[j].lat);
        // (yi > y) != (yj > y) excludes horizontal edges, so yj - yi is never zero here.
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Arithmetic mean of the ring's vertices (not area weighted). A closing
/// vertex equal to the first one is not counted twice.
pub fn centroid(ring: &[Coordinate]) -> Option<Coordinate> {
    let verts = open_ring(ring);
    if verts.is_empty() {
        return None;
    }
    let n = verts.len() as f64;
    let (sx, sy) = verts
        .iter()
        .fold((0.0, 0.0), |(sx, sy), c| (sx + c.lon, sy + c.lat));
    Some(Coordinate::new(sx / n, sy / n))
}

/// The ring without its closing vertex.
pub fn open_ring(ring: &[Coordinate]) -> &[Coordinate] {
    match ring {
        [first, .., last] if first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

/// Single coordinate standing in for a geometry during hit testing and
/// popup placement.
pub fn representative_point(geometry: &Geometry) -> Option<Coordinate> {
    match geometry {
        Geometry::Point(c) => Some(*c),
        Geometry::LineString(cs) => cs.get(cs.len() / 2).copied(),
        Geometry::MultiPoint(ps) => ps.first().copied(),
        Geometry::MultiLineString(lines) => lines.first().and_then(|cs| cs.get(cs.len() / 2)).copied(),
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) => geometry.outer_ring().and_then(centroid),
    }
}

pub fn feature_representative_point(feature: &Feature) -> Option<Coordinate> {
    representative_point(&feature.geometry)
}

/// Number of distinct vertices, compared exactly.
pub fn distinct_count(points: &[Coordinate]) -> usize {
    let mut seen: Vec<Coordinate> = Vec::with_capacity(points.len());
    for p in points {
        if !seen.contains(p) {
            seen.push(*p);
        }
    }
    seen.len()
}
