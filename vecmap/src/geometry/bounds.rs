use crate::model::{Coordinate, Feature};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounds in lon/lat. Serializes as `[[west, south], [east, north]]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[Coordinate; 2]", into = "[Coordinate; 2]")]
pub struct BBox {
    pub min: Coordinate,
    pub max: Coordinate,
}

impl From<[Coordinate; 2]> for BBox {
    fn from([min, max]: [Coordinate; 2]) -> Self {
        BBox { min, max }
    }
}

impl From<BBox> for [Coordinate; 2] {
    fn from(b: BBox) -> Self {
        [b.min, b.max]
    }
}

impl BBox {
    pub fn of_point(c: Coordinate) -> Self {
        BBox { min: c, max: c }
    }

    pub fn extend(&mut self, c: Coordinate) {
        self.min.lon = self.min.lon.min(c.lon);
        self.min.lat = self.min.lat.min(c.lat);
        self.max.lon = self.max.lon.max(c.lon);
        self.max.lat = self.max.lat.max(c.lat);
    }

    pub fn union(a: Option<BBox>, b: Option<BBox>) -> Option<BBox> {
        match (a, b) {
            (None, x) | (x, None) => x,
            (Some(mut a), Some(b)) => {
                a.extend(b.min);
                a.extend(b.max);
                Some(a)
            }
        }
    }

    pub fn of_coords<'a>(coords: impl IntoIterator<Item = &'a Coordinate>) -> Option<BBox> {
        let mut out: Option<BBox> = None;
        for c in coords {
            match out.as_mut() {
                Some(b) => b.extend(*c),
                None => out = Some(BBox::of_point(*c)),
            }
        }
        out
    }

    /// Bounds over every vertex of every feature.
    pub fn of_features<'a>(features: impl IntoIterator<Item = &'a Feature>) -> Option<BBox> {
        features
            .into_iter()
            .map(|f| BBox::of_coords(&f.geometry.vertices()))
            .fold(None, BBox::union)
    }
}
