use serde_json::{json, Value};
use vecmap::scene::ids::{paint_layer_id, source_id, PaintRole};
use vecmap::{
    Coordinate, Cursor, Engine, EngineConfig, EngineEvent, Geometry, InteractionMode, LayerId, MapEvent,
    MemorySurface, RenderedFeature, ScreenPoint,
};

fn c(x: f64, y: f64) -> Coordinate {
    Coordinate::new(x, y)
}

fn points(pts: &[(f64, f64)]) -> Value {
    let features: Vec<Value> = pts
        .iter()
        .map(|(x, y)| json!({"type": "Feature", "geometry": {"type": "Point", "coordinates": [x, y]}}))
        .collect();
    json!({"type": "FeatureCollection", "features": features})
}

fn click(e: &mut Engine<MemorySurface>, x: f64, y: f64) {
    e.handle_event(MapEvent::Click {
        coord: c(x, y),
        pixel: ScreenPoint::new(x, y),
    });
}

fn circle_hit(layer: LayerId, id: u64, x: f64, y: f64) -> RenderedFeature {
    RenderedFeature {
        layer: paint_layer_id(&source_id(layer), PaintRole::Circle),
        id: Some(id),
        geometry: Geometry::Point(c(x, y)),
    }
}

fn lasso(e: &mut Engine<MemorySurface>, ring: &[(f64, f64)]) {
    for &(x, y) in ring {
        click(e, x, y);
    }
    e.handle_event(MapEvent::DoubleClick {
        coord: c(ring[ring.len() - 1].0, ring[ring.len() - 1].1),
    });
}

#[test]
fn lasso_selects_one_of_three_points() {
    let mut e = Engine::headless(EngineConfig::default());
    let id = e
        .import_geojson("pts", &points(&[(-3.0, -3.0), (5.0, 5.0), (30.0, 5.0)]))
        .unwrap();
    e.arm_tool(InteractionMode::SelectLasso);
    lasso(&mut e, &[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0)]);

    assert_eq!(e.selection().len(), 1);
    assert_eq!(e.selection().get(id), &[1]);
    assert_eq!(e.mode(), InteractionMode::SelectLasso);
    assert!(e.surface().source("vm-lasso").is_none());
    let paint = &e.surface().paint_layer(&format!("vm-{id}-circle")).unwrap().paint;
    assert_eq!(
        paint["circle-color"],
        json!(["case", ["in", ["id"], ["literal", [1]]], "#facc15", "#3b82f6"])
    );
}

#[test]
fn second_lasso_replaces_selection() {
    let mut e = Engine::headless(EngineConfig::default());
    let id = e.import_geojson("pts", &points(&[(1.0, 1.0), (21.0, 1.0)])).unwrap();
    e.arm_tool(InteractionMode::SelectLasso);
    lasso(&mut e, &[(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)]);
    assert_eq!(e.selection().get(id), &[0]);
    lasso(&mut e, &[(20.0, 0.0), (20.0, 2.0), (22.0, 2.0), (22.0, 0.0)]);
    assert_eq!(e.selection().get(id), &[1]);
}

#[test]
fn lasso_skips_hidden_and_unselectable_layers() {
    let mut e = Engine::headless(EngineConfig::default());
    let a = e.import_geojson("a", &points(&[(1.0, 1.0)])).unwrap();
    let b = e.import_geojson("b", &points(&[(1.0, 1.0)])).unwrap();
    let d = e.import_geojson("d", &points(&[(1.0, 1.0)])).unwrap();
    e.set_visibility(a, false);
    e.set_selectable(b, false);
    e.arm_tool(InteractionMode::SelectLasso);
    lasso(&mut e, &[(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)]);
    assert_eq!(e.selection().layers().collect::<Vec<_>>(), vec![d]);
}

#[test]
fn click_pick_uses_topmost_hit_per_layer() {
    let mut e = Engine::headless(EngineConfig::default());
    let id = e.import_geojson("pts", &points(&[(1.0, 1.0), (1.0, 1.00001)])).unwrap();
    e.arm_tool(InteractionMode::SelectClick);
    e.surface_mut().set_hits(vec![
        circle_hit(id, 1, 1.0, 1.00001),
        circle_hit(id, 0, 1.0, 1.0),
    ]);
    click(&mut e, 1.0, 1.0);
    assert_eq!(e.selection().get(id), &[1]);
}

#[test]
fn click_on_nothing_clears_selection() {
    let mut e = Engine::headless(EngineConfig::default());
    let id = e.import_geojson("pts", &points(&[(1.0, 1.0)])).unwrap();
    e.arm_tool(InteractionMode::SelectClick);
    e.surface_mut().set_hits(vec![circle_hit(id, 0, 1.0, 1.0)]);
    click(&mut e, 1.0, 1.0);
    assert!(!e.selection().is_empty());
    e.drain_events();

    e.surface_mut().set_hits(vec![]);
    click(&mut e, 50.0, 50.0);
    assert!(e.selection().is_empty());
    let events = e.drain_events();
    assert!(matches!(
        events.as_slice(),
        [EngineEvent::SelectionChanged { selection }] if selection.is_empty()
    ));
    let paint = &e.surface().paint_layer(&format!("vm-{id}-circle")).unwrap().paint;
    assert_eq!(paint["circle-color"], json!("#3b82f6"));
}

#[test]
fn unmatched_hit_is_a_no_op() {
    let mut e = Engine::headless(EngineConfig::default());
    let id = e.import_geojson("pts", &points(&[(1.0, 1.0), (2.0, 2.0)])).unwrap();
    e.arm_tool(InteractionMode::SelectClick);
    e.surface_mut().set_hits(vec![circle_hit(id, 1, 2.0, 2.0)]);
    click(&mut e, 2.0, 2.0);
    e.drain_events();

    e.surface_mut().set_hits(vec![circle_hit(id, 0, 9.0, 9.0)]);
    click(&mut e, 9.0, 9.0);
    assert_eq!(e.selection().get(id), &[1]);
    assert!(e.drain_events().is_empty());
}

#[test]
fn deleting_a_layer_drops_its_selection_entry() {
    let mut e = Engine::headless(EngineConfig::default());
    let a = e.import_geojson("a", &points(&[(1.0, 1.0)])).unwrap();
    let b = e.import_geojson("b", &points(&[(1.5, 1.5)])).unwrap();
    e.arm_tool(InteractionMode::SelectLasso);
    lasso(&mut e, &[(0.0, 0.0), (0.0, 2.0), (2.0, 2.0), (2.0, 0.0)]);
    assert_eq!(e.selection().len(), 2);

    assert!(e.remove_layer(a));
    assert!(e.selection().get(a).is_empty());
    assert_eq!(e.selection().layers().collect::<Vec<_>>(), vec![b]);
    assert!(e.surface().source(&source_id(a)).is_none());
    assert!(e.attribute_rows(a).is_none());
}

#[test]
fn hover_sets_pointer_only_while_selecting() {
    let mut e = Engine::headless(EngineConfig::default());
    let id = e.import_geojson("pts", &points(&[(1.0, 1.0)])).unwrap();
    e.surface_mut().set_hits(vec![circle_hit(id, 0, 1.0, 1.0)]);

    e.handle_event(MapEvent::MouseMove { pixel: ScreenPoint::new(1.0, 1.0) });
    assert_eq!(e.surface().cursor(), Cursor::Default);

    e.arm_tool(InteractionMode::SelectClick);
    e.handle_event(MapEvent::MouseMove { pixel: ScreenPoint::new(1.0, 1.0) });
    assert_eq!(e.surface().cursor(), Cursor::Pointer);
    e.surface_mut().clear_calls();
    e.handle_event(MapEvent::MouseMove { pixel: ScreenPoint::new(1.0, 1.0) });
    assert!(e.surface().calls().is_empty());

    e.cancel();
    assert_eq!(e.surface().cursor(), Cursor::Default);
}

#[test]
fn hover_ignores_unselectable_layers() {
    let mut e = Engine::headless(EngineConfig::default());
    let id = e.import_geojson("pts", &points(&[(1.0, 1.0)])).unwrap();
    e.set_selectable(id, false);
    e.surface_mut().set_hits(vec![circle_hit(id, 0, 1.0, 1.0)]);
    e.arm_tool(InteractionMode::SelectClick);
    e.handle_event(MapEvent::MouseMove { pixel: ScreenPoint::new(1.0, 1.0) });
    assert_eq!(e.surface().cursor(), Cursor::Default);
    assert!(!e.surface().paint_layer(&format!("vm-{id}-circle")).unwrap().interactive);
}
