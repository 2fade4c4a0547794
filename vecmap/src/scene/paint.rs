// Declarative scene: what the surface should show for the current layers,
// selection and interaction buffers.

use crate::config::{EngineConfig, HighlightStyle};
use crate::geojson::{feature_collection, feature_value};
use crate::interaction::drawing::DrawPurpose;
use crate::interaction::selection::SelectionSet;
use crate::layers::LayerList;
use crate::model::{Coordinate, Feature, Geometry, GeometryKind, Layer};
use crate::scene::ids::{self, paint_layer_id, source_id, PaintRole};
use crate::scene::surface::{PaintKind, PaintProperties};
use serde_json::{json, Value};
use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq)]
pub struct PaintLayerSpec {
    pub id: String,
    pub kind: PaintKind,
    pub paint: PaintProperties,
    pub filter: Option<Value>,
    pub interactive: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SourceSpec {
    pub id: String,
    pub data: Value,
    /// Bottom to top.
    pub layers: Vec<PaintLayerSpec>,
}

/// Every source the surface should hold, in paint order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub sources: Vec<SourceSpec>,
}

impl Scene {
    pub fn paint_layer_ids(&self) -> Vec<&str> {
        self.sources
            .iter()
            .flat_map(|s| s.layers.iter().map(|l| l.id.as_str()))
            .collect()
    }
}

/// Transient buffers drawn above every layer.
#[derive(Clone, Copy, Debug, Default)]
pub struct Overlays<'a> {
    pub draft: &'a [Coordinate],
    pub draft_purpose: Option<DrawPurpose>,
    pub lasso: &'a [Coordinate],
    pub measure: &'a [Coordinate],
}

pub fn compose(
    layers: &LayerList,
    selection: &SelectionSet,
    overlays: Overlays<'_>,
    config: &EngineConfig,
) -> Scene {
    let mut sources: Vec<SourceSpec> = layers
        .iter()
        .filter_map(|l| {
            let highlighted = selection.valid_indices(l.id, l.features.len());
            layer_source(l, &highlighted, &config.highlight)
        })
        .collect();

    let marker = match overlays.draft_purpose {
        Some(DrawPurpose::Annotation) => &config.annotation_marker_color,
        _ => &config.draft_marker_color,
    };
    sources.extend(overlay_source(ids::DRAFT_SOURCE, overlays.draft, marker, false));
    sources.extend(overlay_source(ids::LASSO_SOURCE, overlays.lasso, &config.lasso_color, true));
    sources.extend(overlay_source(ids::MEASURE_SOURCE, overlays.measure, &config.measure_color, false));
    Scene { sources }
}

/// Paint layers a layer needs: one set per geometry kind among its features.
pub fn paint_roles(layer: &Layer) -> Vec<PaintRole> {
    let kinds: BTreeSet<GeometryKind> = layer.features.iter().map(|f| f.geometry.kind()).collect();
    let mut roles = Vec::new();
    if kinds.contains(&GeometryKind::Polygon) {
        roles.extend([PaintRole::Fill, PaintRole::Outline]);
    }
    if kinds.contains(&GeometryKind::Line) {
        roles.push(PaintRole::Line);
    }
    if kinds.contains(&GeometryKind::Point) {
        roles.push(PaintRole::Circle);
    }
    roles
}

/// Paint layers click and hover queries should look at.
pub fn interactive_layer_ids(layers: &LayerList) -> Vec<String> {
    layers
        .iter()
        .filter(|l| l.is_interactive())
        .flat_map(|l| {
            let source = source_id(l.id);
            paint_roles(l)
                .into_iter()
                .map(move |role| paint_layer_id(&source, role))
        })
        .collect()
}

/// `None` for hidden or empty layers, which must not be on the surface.
pub fn layer_source(layer: &Layer, highlighted: &[usize], hl: &HighlightStyle) -> Option<SourceSpec> {
    if !layer.visible || layer.features.is_empty() {
        return None;
    }
    let source = source_id(layer.id);
    let style = &layer.style;
    let opacity = layer.opacity;
    let stroke = || {
        json!({
            "line-color": highlight(highlighted, json!(hl.color), json!(style.stroke_color)),
            "line-width": highlight(highlighted, json!(hl.line_width), json!(style.stroke_width)),
            "line-opacity": opacity,
        })
    };

    let layers = paint_roles(layer)
        .into_iter()
        .map(|role| {
            let (filter, paint) = match role {
                PaintRole::Fill => (
                    geometry_filter("Polygon"),
                    json!({
                        "fill-color": highlight(highlighted, json!(hl.color), json!(style.fill_color)),
                        "fill-opacity": highlight(
                            highlighted,
                            json!(hl.fill_opacity * opacity),
                            json!(style.fill_opacity * opacity),
                        ),
                    }),
                ),
                PaintRole::Outline => (geometry_filter("Polygon"), stroke()),
                PaintRole::Line => (geometry_filter("LineString"), stroke()),
                PaintRole::Circle => (
                    geometry_filter("Point"),
                    json!({
                        "circle-color": highlight(highlighted, json!(hl.color), json!(style.fill_color)),
                        "circle-radius": highlight(highlighted, json!(hl.circle_radius), json!(style.stroke_width)),
                        "circle-opacity": opacity,
                        "circle-stroke-width": 2,
                        "circle-stroke-color": style.stroke_color,
                        "circle-stroke-opacity": opacity,
                    }),
                ),
            };
            PaintLayerSpec {
                id: paint_layer_id(&source, role),
                kind: role.kind(),
                paint: into_map(paint),
                filter: Some(filter),
                interactive: layer.selectable,
            }
        })
        .collect();

    Some(SourceSpec {
        id: source,
        data: feature_collection(&layer.features),
        layers,
    })
}

/// `["case", ["in", ["id"], ["literal", [..]]], on, off]`, or just `off` when
/// nothing is highlighted.
pub fn highlight(indices: &[usize], on: Value, off: Value) -> Value {
    if indices.is_empty() {
        return off;
    }
    json!(["case", ["in", ["id"], ["literal", indices]], on, off])
}

/// Matches the single and multi form, since engines differ on whether
/// `geometry-type` reports `MultiPolygon` or `Polygon` for multi parts.
fn geometry_filter(ty: &str) -> Value {
    json!(["in", ["geometry-type"], ["literal", [ty, format!("Multi{ty}")]]])
}

fn into_map(v: Value) -> PaintProperties {
    match v {
        Value::Object(m) => m,
        _ => PaintProperties::new(),
    }
}

/// Vertex markers plus, from two points on, the connecting line.
fn overlay_source(id: &str, points: &[Coordinate], color: &str, dashed: bool) -> Option<SourceSpec> {
    if points.is_empty() {
        return None;
    }
    let mut features: Vec<Value> = points
        .iter()
        .map(|p| feature_value(&Feature::new(Geometry::Point(*p)), None))
        .collect();
    let mut layers = Vec::new();
    if points.len() >= 2 {
        features.push(feature_value(&Feature::new(Geometry::LineString(points.to_vec())), None));
        let mut paint = json!({"line-color": color, "line-width": 2});
        if dashed {
            paint["line-dasharray"] = json!([2, 2]);
        }
        layers.push(PaintLayerSpec {
            id: paint_layer_id(id, PaintRole::Line),
            kind: PaintKind::Line,
            paint: into_map(paint),
            filter: Some(geometry_filter("LineString")),
            interactive: false,
        });
    }
    layers.push(PaintLayerSpec {
        id: paint_layer_id(id, PaintRole::Circle),
        kind: PaintKind::Circle,
        paint: into_map(json!({
            "circle-color": color,
            "circle-radius": 5,
            "circle-stroke-width": 2,
            "circle-stroke-color": "#ffffff",
        })),
        filter: Some(geometry_filter("Point")),
        interactive: false,
    });
    Some(SourceSpec {
        id: id.to_string(),
        data: json!({"type": "FeatureCollection", "features": features}),
        layers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer_with(features: Vec<Feature>) -> (LayerList, u32) {
        let mut list = LayerList::new();
        let kind = features[0].geometry.kind();
        let id = list.create_imported("l".into(), kind, features, &EngineConfig::default());
        (list, id)
    }

    fn square() -> Feature {
        Feature::new(Geometry::polygon_from_ring(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 1.0),
            Coordinate::new(1.0, 1.0),
        ]))
    }

    #[test]
    fn polygon_layer_gets_fill_and_outline() {
        let (list, id) = layer_with(vec![square()]);
        let scene = compose(&list, &SelectionSet::new(), Overlays::default(), &EngineConfig::default());
        assert_eq!(scene.paint_layer_ids(), vec![format!("vm-{id}-fill"), format!("vm-{id}-outline")]);
        let fill = &scene.sources[0].layers[0];
        assert_eq!(fill.paint["fill-color"], json!("#3b82f6"));
        assert_eq!(
            fill.filter,
            Some(json!(["in", ["geometry-type"], ["literal", ["Polygon", "MultiPolygon"]]]))
        );
        assert!(fill.interactive);
    }

    #[test]
    fn mixed_layer_gets_one_paint_layer_per_kind() {
        let point = Feature::new(Geometry::Point(Coordinate::new(3.0, 3.0)));
        let (list, _) = layer_with(vec![square(), point]);
        let scene = compose(&list, &SelectionSet::new(), Overlays::default(), &EngineConfig::default());
        let kinds: Vec<PaintKind> = scene.sources[0].layers.iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![PaintKind::Fill, PaintKind::Line, PaintKind::Circle]);
    }

    #[test]
    fn selection_is_embedded_in_expressions() {
        let (list, id) = layer_with(vec![square(), square(), square()]);
        let mut sel = SelectionSet::new();
        sel.insert(id, vec![0, 2, 7]);
        let scene = compose(&list, &sel, Overlays::default(), &EngineConfig::default());
        let outline = &scene.sources[0].layers[1];
        assert_eq!(
            outline.paint["line-width"],
            json!(["case", ["in", ["id"], ["literal", [0, 2]]], 4.0, 2.0])
        );
    }

    #[test]
    fn hidden_and_empty_layers_are_absent() {
        let (mut list, id) = layer_with(vec![square()]);
        list.set_visibility(id, false);
        list.create_layer(
            "empty".into(),
            GeometryKind::Line,
            EngineConfig::default().palette_style(0, GeometryKind::Line),
            vec![],
        );
        let scene = compose(&list, &SelectionSet::new(), Overlays::default(), &EngineConfig::default());
        assert!(scene.sources.is_empty());
    }

    #[test]
    fn opacity_multiplies_fill_opacity() {
        let (mut list, id) = layer_with(vec![square()]);
        list.set_opacity(id, 0.5);
        let scene = compose(&list, &SelectionSet::new(), Overlays::default(), &EngineConfig::default());
        assert_eq!(scene.sources[0].layers[0].paint["fill-opacity"], json!(0.15));
        assert_eq!(scene.sources[0].layers[1].paint["line-opacity"], json!(0.5));
    }

    #[test]
    fn overlays_sit_on_top_and_are_inert() {
        let (list, _) = layer_with(vec![square()]);
        let lasso = [Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0)];
        let draft = [Coordinate::new(5.0, 5.0)];
        let overlays = Overlays {
            draft: &draft,
            draft_purpose: Some(DrawPurpose::Annotation),
            lasso: &lasso,
            measure: &[],
        };
        let cfg = EngineConfig::default();
        let scene = compose(&list, &SelectionSet::new(), overlays, &cfg);
        let ids: Vec<&str> = scene.sources.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(&ids[1..], &["vm-draft", "vm-lasso"]);
        let draft = &scene.sources[1];
        assert_eq!(draft.layers.len(), 1);
        assert_eq!(draft.layers[0].paint["circle-color"], json!(cfg.annotation_marker_color));
        let lasso_line = &scene.sources[2].layers[0];
        assert_eq!(lasso_line.paint["line-dasharray"], json!([2, 2]));
        assert!(scene.sources[1..].iter().flat_map(|s| &s.layers).all(|l| !l.interactive));
    }
}
