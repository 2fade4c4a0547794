use crate::geometry::bounds::BBox;
use crate::scene::surface::{Cursor, MapSurface, PaintKind, PaintProperties, RenderedFeature, ScreenPoint};
use serde_json::Value;
use std::collections::BTreeMap;

/// One recorded call.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceCall {
    SetStyle(Value),
    AddSource(String),
    UpdateSourceData(String),
    RemoveSource(String),
    AddPaintLayer(String),
    SetPaintProperty { layer: String, property: String },
    RemoveLayer(String),
    MoveLayer { id: String, before: Option<String> },
    SetLayerInteractive { layer: String, interactive: bool },
    SetCursor(Cursor),
    FitBounds(BBox, f64),
}

impl SurfaceCall {
    /// Cursor and viewport changes do not touch the scene.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, SurfaceCall::SetCursor(_) | SurfaceCall::FitBounds(..))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MemoryPaintLayer {
    pub id: String,
    pub source: String,
    pub kind: PaintKind,
    pub paint: PaintProperties,
    pub filter: Option<Value>,
    pub interactive: bool,
}

/// Headless surface for tests and native hosts. Panics on calls that name a
/// missing source or layer, like a real engine throwing in its console.
#[derive(Clone, Debug)]
pub struct MemorySurface {
    loaded: bool,
    style: Option<Value>,
    sources: BTreeMap<String, Value>,
    layers: Vec<MemoryPaintLayer>,
    hits: Vec<RenderedFeature>,
    cursor: Cursor,
    fitted: Option<(BBox, f64)>,
    calls: Vec<SurfaceCall>,
}

impl Default for MemorySurface {
    fn default() -> Self {
        MemorySurface::new()
    }
}

impl MemorySurface {
    /// A surface whose style has already loaded.
    pub fn new() -> Self {
        MemorySurface {
            loaded: true,
            style: None,
            sources: BTreeMap::new(),
            layers: Vec::new(),
            hits: Vec::new(),
            cursor: Cursor::Default,
            fitted: None,
            calls: Vec::new(),
        }
    }

    pub fn unloaded() -> Self {
        MemorySurface {
            loaded: false,
            ..MemorySurface::new()
        }
    }

    pub fn finish_loading(&mut self) {
        self.loaded = true;
    }

    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn mutation_count(&self) -> usize {
        self.calls.iter().filter(|c| c.is_mutation()).count()
    }

    /// Script the hits returned by the next queries, topmost first.
    pub fn set_hits(&mut self, hits: Vec<RenderedFeature>) {
        self.hits = hits;
    }

    pub fn style(&self) -> Option<&Value> {
        self.style.as_ref()
    }

    pub fn source(&self, id: &str) -> Option<&Value> {
        self.sources.get(id)
    }

    pub fn source_ids(&self) -> Vec<&str> {
        self.sources.keys().map(String::as_str).collect()
    }

    pub fn paint_layer(&self, id: &str) -> Option<&MemoryPaintLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Paint layer ids, bottom first.
    pub fn layer_order(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.id.as_str()).collect()
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn fitted(&self) -> Option<(BBox, f64)> {
        self.fitted
    }

    fn layer_index(&self, id: &str) -> usize {
        match self.layers.iter().position(|l| l.id == id) {
            Some(i) => i,
            None => panic!("paint layer '{id}' does not exist"),
        }
    }
}

impl MapSurface for MemorySurface {
    fn style_loaded(&self) -> bool {
        self.loaded
    }

    fn set_style(&mut self, style: &Value) {
        self.calls.push(SurfaceCall::SetStyle(style.clone()));
        self.style = Some(style.clone());
        self.sources.clear();
        self.layers.clear();
        self.loaded = false;
    }

    fn add_source(&mut self, id: &str, data: &Value) {
        assert!(!self.sources.contains_key(id), "source '{id}' already exists");
        self.calls.push(SurfaceCall::AddSource(id.to_string()));
        self.sources.insert(id.to_string(), data.clone());
    }

    fn update_source_data(&mut self, id: &str, data: &Value) {
        self.calls.push(SurfaceCall::UpdateSourceData(id.to_string()));
        match self.sources.get_mut(id) {
            Some(slot) => *slot = data.clone(),
            None => panic!("source '{id}' does not exist"),
        }
    }

    fn remove_source(&mut self, id: &str) {
        assert!(
            !self.layers.iter().any(|l| l.source == id),
            "source '{id}' still has paint layers"
        );
        assert!(self.sources.remove(id).is_some(), "source '{id}' does not exist");
        self.calls.push(SurfaceCall::RemoveSource(id.to_string()));
    }

    fn add_paint_layer(
        &mut self,
        id: &str,
        source_id: &str,
        kind: PaintKind,
        paint: &PaintProperties,
        filter: Option<&Value>,
    ) {
        assert!(self.sources.contains_key(source_id), "source '{source_id}' does not exist");
        assert!(self.paint_layer(id).is_none(), "paint layer '{id}' already exists");
        self.calls.push(SurfaceCall::AddPaintLayer(id.to_string()));
        self.layers.push(MemoryPaintLayer {
            id: id.to_string(),
            source: source_id.to_string(),
            kind,
            paint: paint.clone(),
            filter: filter.cloned(),
            interactive: false,
        });
    }

    fn set_paint_property(&mut self, layer_id: &str, property: &str, value: &Value) {
        let i = self.layer_index(layer_id);
        let paint = &mut self.layers[i].paint;
        if value.is_null() {
            paint.remove(property);
        } else {
            paint.insert(property.to_string(), value.clone());
        }
        self.calls.push(SurfaceCall::SetPaintProperty {
            layer: layer_id.to_string(),
            property: property.to_string(),
        });
    }

    fn remove_layer(&mut self, id: &str) {
        let i = self.layer_index(id);
        self.layers.remove(i);
        self.calls.push(SurfaceCall::RemoveLayer(id.to_string()));
    }

    fn move_layer(&mut self, id: &str, before_id: Option<&str>) {
        let i = self.layer_index(id);
        let layer = self.layers.remove(i);
        let at = match before_id {
            Some(before) => self.layer_index(before),
            None => self.layers.len(),
        };
        self.layers.insert(at, layer);
        self.calls.push(SurfaceCall::MoveLayer {
            id: id.to_string(),
            before: before_id.map(str::to_string),
        });
    }

    fn set_layer_interactive(&mut self, layer_id: &str, interactive: bool) {
        let i = self.layer_index(layer_id);
        self.layers[i].interactive = interactive;
        self.calls.push(SurfaceCall::SetLayerInteractive {
            layer: layer_id.to_string(),
            interactive,
        });
    }

    fn query_features_at_point(&self, _pixel: ScreenPoint, layer_ids: &[String]) -> Vec<RenderedFeature> {
        self.hits
            .iter()
            .filter(|h| layer_ids.contains(&h.layer))
            .filter(|h| self.paint_layer(&h.layer).is_some_and(|l| l.interactive))
            .cloned()
            .collect()
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
        self.calls.push(SurfaceCall::SetCursor(cursor));
    }

    fn fit_bounds(&mut self, bbox: BBox, padding: f64) {
        self.fitted = Some((bbox, padding));
        self.calls.push(SurfaceCall::FitBounds(bbox, padding));
    }
}
