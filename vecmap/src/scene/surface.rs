use crate::geometry::bounds::BBox;
use crate::model::Geometry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaintKind {
    Fill,
    Line,
    Circle,
}

impl PaintKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PaintKind::Fill => "fill",
            PaintKind::Line => "line",
            PaintKind::Circle => "circle",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
}

impl Cursor {
    /// CSS cursor value.
    pub fn css(self) -> &'static str {
        match self {
            Cursor::Default => "",
            Cursor::Pointer => "pointer",
        }
    }
}

/// Pixel position on the map canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        ScreenPoint { x, y }
    }
}

/// One feature reported by the surface under the cursor.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedFeature {
    /// Paint layer the hit came from.
    pub layer: String,
    /// Top-level GeoJSON id, if the engine kept it.
    pub id: Option<u64>,
    pub geometry: Geometry,
}

pub type PaintProperties = Map<String, Value>;

/// The map rendering engine, seen from the interaction core.
///
/// Calls naming a source or paint layer that does not exist (or adding one
/// that already exists) are programming errors; the scene synchronizer
/// orders its calls so they never happen.
pub trait MapSurface {
    fn style_loaded(&self) -> bool;

    /// Swap the basemap. `style` is a complete style document (`version: 8`,
    /// a raster source and a raster layer), never a bare tile URL. Drops
    /// every source and paint layer the core added.
    fn set_style(&mut self, style: &Value);

    fn add_source(&mut self, id: &str, data: &Value);
    fn update_source_data(&mut self, id: &str, data: &Value);
    fn remove_source(&mut self, id: &str);

    /// Add on top of the current paint stack.
    fn add_paint_layer(
        &mut self,
        id: &str,
        source_id: &str,
        kind: PaintKind,
        paint: &PaintProperties,
        filter: Option<&Value>,
    );
    /// `Value::Null` resets the property to the engine default.
    fn set_paint_property(&mut self, layer_id: &str, property: &str, value: &Value);
    fn remove_layer(&mut self, id: &str);
    /// Move below `before_id`, or to the top when `None`.
    fn move_layer(&mut self, id: &str, before_id: Option<&str>);

    /// Whether click and hover on this paint layer are forwarded to the core.
    fn set_layer_interactive(&mut self, layer_id: &str, interactive: bool);

    /// Hits at a pixel, topmost first.
    fn query_features_at_point(&self, pixel: ScreenPoint, layer_ids: &[String]) -> Vec<RenderedFeature>;

    fn set_cursor(&mut self, cursor: Cursor);
    fn fit_bounds(&mut self, bbox: BBox, padding: f64);
}
