use crate::model::{GeometryKind, LayerStyle, PointShape};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Style seed for layers the engine creates itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleDefaults {
    pub color: String,
    pub fill_opacity: f64,
    pub stroke_width: f64,
}

impl Default for StyleDefaults {
    fn default() -> Self {
        StyleDefaults {
            color: "#3b82f6".into(),
            fill_opacity: 0.3,
            stroke_width: 2.0,
        }
    }
}

impl StyleDefaults {
    pub fn with_color(color: &str, fill_opacity: f64) -> Self {
        StyleDefaults {
            color: color.into(),
            fill_opacity,
            ..Default::default()
        }
    }

    pub fn layer_style(&self, kind: GeometryKind, point_radius: f64) -> LayerStyle {
        LayerStyle {
            stroke_color: self.color.clone(),
            fill_color: self.color.clone(),
            fill_opacity: self.fill_opacity,
            stroke_width: match kind {
                GeometryKind::Point => point_radius,
                _ => self.stroke_width,
            },
            point_shape: PointShape::Circle,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HighlightStyle {
    pub color: String,
    pub line_width: f64,
    pub circle_radius: f64,
    pub fill_opacity: f64,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        HighlightStyle {
            color: "#facc15".into(),
            line_width: 4.0,
            circle_radius: 9.0,
            fill_opacity: 0.6,
        }
    }
}

/// Raster basemap. `tiles` are XYZ URL templates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Basemap {
    pub id: String,
    pub label: String,
    pub tiles: Vec<String>,
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    #[serde(default)]
    pub attribution: String,
}

fn default_tile_size() -> u32 {
    256
}

impl Basemap {
    fn raster(id: &str, label: &str, tile: &str, attribution: &str) -> Self {
        Basemap {
            id: id.into(),
            label: label.into(),
            tiles: vec![tile.into()],
            tile_size: default_tile_size(),
            attribution: attribution.into(),
        }
    }

    /// Style document with this basemap as its only source and layer.
    pub fn style(&self, glyphs: &str) -> Value {
        let mut sources = Map::new();
        sources.insert(
            self.id.clone(),
            json!({
                "type": "raster",
                "tiles": self.tiles,
                "tileSize": self.tile_size,
                "attribution": self.attribution,
            }),
        );
        json!({
            "version": 8,
            "sources": sources,
            "layers": [{"id": self.id, "type": "raster", "source": self.id}],
            "glyphs": glyphs,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Colours cycled for imported layers.
    pub palette: Vec<String>,
    pub drawn_feature_style: StyleDefaults,
    pub annotation_style: StyleDefaults,
    pub point_radius: f64,
    pub highlight: HighlightStyle,
    /// Viewport padding in pixels when fitting a focused layer.
    pub fit_padding: f64,
    pub draft_marker_color: String,
    pub annotation_marker_color: String,
    pub lasso_color: String,
    pub measure_color: String,
    pub basemaps: Vec<Basemap>,
    pub default_basemap: String,
    /// Font endpoint written into every basemap style.
    pub glyphs_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            palette: [
                "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899", "#06b6d4",
                "#f97316", "#14b8a6", "#a855f7", "#84cc16", "#f43f5e",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            drawn_feature_style: StyleDefaults::with_color("#f59e0b", 0.3),
            annotation_style: StyleDefaults::with_color("#10b981", 0.2),
            point_radius: 6.0,
            highlight: HighlightStyle::default(),
            fit_padding: 50.0,
            draft_marker_color: "#f59e0b".into(),
            annotation_marker_color: "#10b981".into(),
            lasso_color: "#0ea5e9".into(),
            measure_color: "#22c55e".into(),
            basemaps: vec![
                Basemap::raster(
                    "street",
                    "Street",
                    "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
                    "© OpenStreetMap contributors",
                ),
                Basemap::raster(
                    "satellite",
                    "Satellite",
                    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}",
                    "© Esri",
                ),
                Basemap::raster(
                    "terrain",
                    "Terrain",
                    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Topo_Map/MapServer/tile/{z}/{y}/{x}",
                    "© Esri",
                ),
            ],
            default_basemap: "street".into(),
            glyphs_url: "https://demotiles.maplibre.org/font/{fontstack}/{range}.pbf".into(),
        }
    }
}

impl EngineConfig {
    pub fn basemap(&self, id: &str) -> Option<&Basemap> {
        self.basemaps.iter().find(|b| b.id == id)
    }

    pub fn basemap_style(&self, id: &str) -> Option<Value> {
        self.basemap(id).map(|b| b.style(&self.glyphs_url))
    }

    /// Style for the `n`th imported layer.
    pub fn palette_style(&self, n: usize, kind: GeometryKind) -> LayerStyle {
        let color = if self.palette.is_empty() {
            StyleDefaults::default().color
        } else {
            self.palette[n % self.palette.len()].clone()
        };
        StyleDefaults::with_color(&color, 0.3).layer_style(kind, self.point_radius)
    }
}
