use crate::error::{Error, Result};
use crate::geometry::limits::MAX_SESSION_POINTS;
use crate::geometry::predicates::{distinct_count, feature_representative_point, point_in_polygon};
use crate::layers::LayerList;
use crate::model::{Coordinate, GeometryKind, Layer, LayerId};
use crate::scene::ids::parse_paint_layer_id;
use crate::scene::surface::RenderedFeature;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Selected feature indices per layer. Indices refer to the layer's feature
/// sequence at selection time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionSet {
    entries: BTreeMap<LayerId, Vec<usize>>,
}

impl SelectionSet {
    pub fn new() -> Self {
        SelectionSet::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of layers with a selection.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Set a layer's indices. An empty list removes the entry.
    pub fn insert(&mut self, layer: LayerId, indices: Vec<usize>) {
        if indices.is_empty() {
            self.entries.remove(&layer);
        } else {
            self.entries.insert(layer, indices);
        }
    }

    pub fn remove_layer(&mut self, layer: LayerId) -> bool {
        self.entries.remove(&layer).is_some()
    }

    pub fn get(&self, layer: LayerId) -> &[usize] {
        self.entries.get(&layer).map_or(&[], Vec::as_slice)
    }

    pub fn contains(&self, layer: LayerId, index: usize) -> bool {
        self.get(layer).contains(&index)
    }

    pub fn layers(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.entries.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LayerId, &[usize])> {
        self.entries.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Indices for a layer holding `len` features. One out-of-range index
    /// means the entry predates an edit, so the whole entry is ignored.
    pub fn valid_indices(&self, layer: LayerId, len: usize) -> Vec<usize> {
        let all = self.get(layer);
        if let Some(stale) = all.iter().find(|&&i| i >= len) {
            log::trace!("layer {layer}: ignoring stale selection (index {stale} of {len})");
            return Vec::new();
        }
        all.to_vec()
    }
}

/// Shared contract of the click and lasso strategies.
pub trait SelectionStrategy {
    type Input;

    fn run(&self, input: Self::Input, layers: &LayerList) -> SelectionSet;
}

fn candidates(layers: &LayerList) -> impl Iterator<Item = &Layer> {
    layers.iter().filter(|l| l.visible && l.selectable)
}

/// Maps engine hits under the cursor back to (layer, index) pairs.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClickPick;

impl ClickPick {
    /// Index of the feature a hit refers to. The engine-reported id is tried
    /// first and must match the geometry exactly; otherwise the first
    /// structurally equal feature wins.
    pub fn match_feature(layer: &Layer, hit: &RenderedFeature) -> Option<usize> {
        if let Some(id) = hit.id.and_then(|id| usize::try_from(id).ok()) {
            if layer.features.get(id).map(|f| &f.geometry) == Some(&hit.geometry) {
                return Some(id);
            }
        }
        layer.features.iter().position(|f| f.geometry == hit.geometry)
    }
}

impl SelectionStrategy for ClickPick {
    /// Hits in engine order, topmost first.
    type Input = Vec<RenderedFeature>;

    fn run(&self, hits: Vec<RenderedFeature>, layers: &LayerList) -> SelectionSet {
        let mut out = SelectionSet::new();
        for hit in &hits {
            let Some((layer_id, _)) = parse_paint_layer_id(&hit.layer) else {
                continue;
            };
            if !out.get(layer_id).is_empty() {
                continue;
            }
            let Some(layer) = candidates(layers).find(|l| l.id == layer_id) else {
                continue;
            };
            match Self::match_feature(layer, hit) {
                Some(index) => out.insert(layer_id, vec![index]),
                None => log::warn!("pick on layer {layer_id} has no matching feature"),
            }
        }
        out
    }
}

/// Representative-point-in-lasso test over every selectable, visible layer.
#[derive(Clone, Copy, Debug, Default)]
pub struct LassoPick;

impl SelectionStrategy for LassoPick {
    /// Closed lasso ring.
    type Input = Vec<Coordinate>;

    fn run(&self, ring: Vec<Coordinate>, layers: &LayerList) -> SelectionSet {
        let mut out = SelectionSet::new();
        for layer in candidates(layers) {
            let hits: Vec<usize> = layer
                .features
                .iter()
                .enumerate()
                .filter(|(_, f)| {
                    feature_representative_point(f).is_some_and(|p| point_in_polygon(p, &ring))
                })
                .map(|(i, _)| i)
                .collect();
            out.insert(layer.id, hits);
        }
        out
    }
}

/// Vertex buffer for a lasso gesture, independent of the drawing session.
#[derive(Clone, Debug, Default)]
pub struct LassoSession {
    points: Vec<Coordinate>,
}

impl LassoSession {
    pub fn new() -> Self {
        LassoSession::default()
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn push(&mut self, coord: Coordinate) -> bool {
        if !coord.is_finite()
            || self.points.len() >= MAX_SESSION_POINTS
            || self.points.last() == Some(&coord)
        {
            return false;
        }
        self.points.push(coord);
        true
    }

    /// Close the ring and reset the buffer. With fewer than three distinct
    /// vertices the buffer is kept and nothing is returned.
    pub fn finish(&mut self) -> Result<Vec<Coordinate>> {
        let got = distinct_count(&self.points);
        if got < 3 {
            return Err(Error::InvalidGeometry {
                kind: GeometryKind::Polygon,
                needed: 3,
                got,
            });
        }
        let mut ring = std::mem::take(&mut self.points);
        ring.push(ring[0]);
        Ok(ring)
    }

    pub fn clear(&mut self) -> bool {
        let had = !self.points.is_empty();
        self.points.clear();
        had
    }
}
