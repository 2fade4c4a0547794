use serde_json::json;
use vecmap::{
    Coordinate, DrawPurpose, Engine, EngineConfig, EngineEvent, Error, Geometry, GeometryKind,
    InteractionMode, MapEvent, ScreenPoint,
};

fn c(x: f64, y: f64) -> Coordinate {
    Coordinate::new(x, y)
}

fn click(e: &mut Engine<vecmap::MemorySurface>, x: f64, y: f64) {
    e.handle_event(MapEvent::Click {
        coord: c(x, y),
        pixel: ScreenPoint::new(x * 10.0, y * 10.0),
    });
}

fn draw(kind: GeometryKind, purpose: DrawPurpose) -> InteractionMode {
    InteractionMode::Draw { kind, purpose }
}

#[test]
fn polygon_from_three_clicks_is_closed() {
    let mut e = Engine::headless(EngineConfig::default());
    e.arm_tool(draw(GeometryKind::Polygon, DrawPurpose::NewLayer));
    click(&mut e, 0.0, 0.0);
    click(&mut e, 0.0, 10.0);
    click(&mut e, 10.0, 10.0);
    // Browsers fire a second click on the same spot before dblclick.
    click(&mut e, 10.0, 10.0);
    e.handle_event(MapEvent::DoubleClick { coord: c(10.0, 10.0) });

    let layer = &e.layers().as_slice()[0];
    assert_eq!(layer.geometry_kind, GeometryKind::Polygon);
    assert_eq!(
        layer.features[0].geometry,
        Geometry::Polygon(vec![vec![c(0.0, 0.0), c(0.0, 10.0), c(10.0, 10.0), c(0.0, 0.0)]])
    );
    assert!(layer.visible && layer.selectable);
    assert_eq!(layer.opacity, 1.0);
}

#[test]
fn two_point_polygon_stays_accumulating() {
    let mut e = Engine::headless(EngineConfig::default());
    e.arm_tool(draw(GeometryKind::Polygon, DrawPurpose::NewLayer));
    click(&mut e, 0.0, 0.0);
    click(&mut e, 0.0, 10.0);
    e.handle_event(MapEvent::DoubleClick { coord: c(0.0, 10.0) });
    assert!(matches!(e.mode(), InteractionMode::Draw { .. }));
    assert!(matches!(
        e.complete_drawing(),
        Err(Error::InvalidGeometry { needed: 3, got: 2, .. })
    ));
    assert_eq!(e.controller().drawing().points(), &[c(0.0, 0.0), c(0.0, 10.0)]);
    assert!(e.layers().is_empty());
}

#[test]
fn appended_feature_round_trips_exactly() {
    let mut e = Engine::headless(EngineConfig::default());
    let data = json!({"type": "FeatureCollection", "features": [
        {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}, "properties": {}}
    ]});
    let id = e.import_geojson("roads", &data).unwrap();
    e.drain_events();

    let path = [c(12.345678901, -45.6789), c(12.3457, -45.679), c(12.35, -45.7)];
    e.arm_tool(draw(GeometryKind::Line, DrawPurpose::AppendToLayer { layer_id: id }));
    for p in path {
        e.handle_event(MapEvent::Click {
            coord: p,
            pixel: ScreenPoint::default(),
        });
    }
    e.handle_event(MapEvent::DoubleClick { coord: path[2] });

    let layer = e.layer(id).unwrap();
    assert_eq!(layer.features.len(), 2);
    assert_eq!(layer.features[1].geometry, Geometry::LineString(path.to_vec()));
    let created = e
        .drain_events()
        .into_iter()
        .find_map(|ev| match ev {
            EngineEvent::FeatureCreated { layer_id, index, .. } => Some((layer_id, index)),
            _ => None,
        });
    assert_eq!(created, Some((id, 1)));
}

#[test]
fn cancel_discards_draft_and_overlay() {
    let mut e = Engine::headless(EngineConfig::default());
    e.arm_tool(draw(GeometryKind::Line, DrawPurpose::Annotation));
    click(&mut e, 1.0, 1.0);
    click(&mut e, 2.0, 2.0);
    assert_eq!(
        e.surface().layer_order(),
        vec!["vm-draft-line", "vm-draft-circle"]
    );
    assert!(e.cancel());
    assert!(e.surface().source("vm-draft").is_none());
    assert!(e.surface().layer_order().is_empty());
    assert!(e.layers().is_empty());
}

#[test]
fn switching_tools_drops_draft_overlay() {
    let mut e = Engine::headless(EngineConfig::default());
    e.arm_tool(draw(GeometryKind::Polygon, DrawPurpose::NewLayer));
    click(&mut e, 1.0, 1.0);
    e.arm_tool(InteractionMode::SelectLasso);
    assert!(e.surface().source("vm-draft").is_none());
    click(&mut e, 3.0, 3.0);
    assert!(e.surface().source("vm-lasso").is_some());
    assert!(e.controller().drawing().points().is_empty());
}

#[test]
fn point_draw_is_single_shot() {
    let mut e = Engine::headless(EngineConfig::default());
    e.arm_tool(draw(GeometryKind::Point, DrawPurpose::NewLayer));
    click(&mut e, 5.0, 5.0);
    click(&mut e, 6.0, 6.0);
    assert_eq!(e.layers().len(), 1);
    assert_eq!(e.mode(), InteractionMode::None);
    let layer = &e.layers().as_slice()[0];
    assert_eq!(layer.style.stroke_width, 6.0);
    assert!(layer.features[0].properties.is_empty());
}
