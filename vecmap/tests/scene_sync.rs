use serde_json::{json, Value};
use vecmap::scene::memory::SurfaceCall;
use vecmap::{
    Engine, EngineConfig, InteractionMode, LayerStyle, MapEvent, MemorySurface, SyncOutcome,
};

fn polygons(n: usize) -> Value {
    let features: Vec<Value> = (0..n)
        .map(|i| {
            let x = i as f64 * 3.0;
            json!({
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [[[x, 0], [x, 2], [x + 2.0, 2], [x, 0]]]},
                "properties": {"i": i}
            })
        })
        .collect();
    json!({"type": "FeatureCollection", "features": features})
}

fn line() -> Value {
    json!({"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[0, 0], [5, 5]]}})
}

#[test]
fn second_sync_issues_no_mutations() {
    let mut e = Engine::headless(EngineConfig::default());
    e.import_geojson("parcels", &polygons(3)).unwrap();
    e.import_geojson("road", &line()).unwrap();
    e.surface_mut().clear_calls();
    assert_eq!(e.sync(), SyncOutcome::Applied { mutations: 0 });
    assert_eq!(e.surface().mutation_count(), 0);
}

#[test]
fn sync_before_style_load_is_deferred_until_loaded() {
    let mut e = Engine::new(MemorySurface::unloaded(), EngineConfig::default());
    let id = e.import_geojson("parcels", &polygons(1)).unwrap();
    assert!(e.sync_pending());
    assert_eq!(e.sync(), SyncOutcome::Deferred);
    assert!(e.surface().calls().is_empty());

    e.surface_mut().finish_loading();
    e.handle_event(MapEvent::StyleLoaded);
    assert!(!e.sync_pending());
    assert!(e.surface().source(&format!("vm-{id}")).is_some());
    assert_eq!(
        e.surface().layer_order(),
        vec![format!("vm-{id}-fill"), format!("vm-{id}-outline")]
    );
}

#[test]
fn move_up_changes_only_z_order() {
    let mut e = Engine::headless(EngineConfig::default());
    let a = e.import_geojson("a", &line()).unwrap();
    let b = e.import_geojson("b", &polygons(2)).unwrap();
    let before_a = e.layer(a).cloned().unwrap();
    let before_b = e.layer(b).cloned().unwrap();
    e.surface_mut().clear_calls();

    assert!(e.move_layer_up(b));
    let ids: Vec<u32> = e.layers().iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![b, a]);
    assert_eq!(e.layer(a), Some(&before_a));
    assert_eq!(e.layer(b), Some(&before_b));
    assert!(e
        .surface()
        .calls()
        .iter()
        .all(|c| matches!(c, SurfaceCall::MoveLayer { .. })));
    assert_eq!(
        e.surface().layer_order(),
        vec![
            format!("vm-{b}-fill"),
            format!("vm-{b}-outline"),
            format!("vm-{a}-line"),
        ]
    );
    assert!(!e.move_layer_up(b));
}

#[test]
fn hiding_removes_and_showing_restores() {
    let mut e = Engine::headless(EngineConfig::default());
    let id = e.import_geojson("a", &polygons(1)).unwrap();
    e.set_visibility(id, false);
    assert!(e.surface().source(&format!("vm-{id}")).is_none());
    assert!(e.surface().layer_order().is_empty());
    e.set_visibility(id, true);
    assert_eq!(e.surface().layer_order().len(), 2);
}

#[test]
fn style_edit_updates_paint_in_place() {
    let mut e = Engine::headless(EngineConfig::default());
    let id = e.import_geojson("road", &line()).unwrap();
    e.surface_mut().clear_calls();
    let style = LayerStyle {
        stroke_color: "#000000".into(),
        ..e.layer(id).unwrap().style.clone()
    };
    assert!(e.set_style(id, style));
    assert_eq!(
        e.surface().calls(),
        &[SurfaceCall::SetPaintProperty {
            layer: format!("vm-{id}-line"),
            property: "line-color".into(),
        }]
    );
}

#[test]
fn opacity_is_clamped_and_painted() {
    let mut e = Engine::headless(EngineConfig::default());
    let id = e.import_geojson("road", &line()).unwrap();
    assert!(e.set_opacity(id, -2.0));
    let paint = &e.surface().paint_layer(&format!("vm-{id}-line")).unwrap().paint;
    assert_eq!(paint["line-opacity"], json!(0.0));
}

#[test]
fn empty_layer_has_no_source() {
    let mut e = Engine::headless(EngineConfig::default());
    let id = e.import_geojson("a", &polygons(1)).unwrap();
    e.remove_feature(id, 0).unwrap();
    assert!(e.layer(id).unwrap().features.is_empty());
    assert!(e.surface().source(&format!("vm-{id}")).is_none());
}

#[test]
fn basemap_switch_rebuilds_scene_after_load() {
    let mut e = Engine::headless(EngineConfig::default());
    let id = e.import_geojson("a", &polygons(1)).unwrap();
    assert!(!e.set_basemap("moon"));
    assert!(e.set_basemap("satellite"));
    assert_eq!(e.basemap(), "satellite");
    let style = e.surface().style().unwrap();
    assert_eq!(style["version"], json!(8));
    assert_eq!(style["sources"]["satellite"]["type"], json!("raster"));
    assert_eq!(style["layers"][0]["source"], json!("satellite"));
    assert!(e.surface().source_ids().is_empty());
    assert!(e.sync_pending());

    e.surface_mut().finish_loading();
    e.handle_event(MapEvent::StyleLoaded);
    assert_eq!(e.surface().source_ids(), vec![format!("vm-{id}")]);
}

#[test]
fn set_layers_prunes_changed_selection() {
    let mut e = Engine::headless(EngineConfig::default());
    let a = e.import_geojson("a", &polygons(2)).unwrap();
    let b = e.import_geojson("b", &polygons(2)).unwrap();
    e.arm_tool(InteractionMode::SelectLasso);
    for (x, y) in [(-1.0, -1.0), (-1.0, 3.0), (20.0, 3.0), (20.0, -1.0)] {
        e.handle_event(MapEvent::Click {
            coord: vecmap::Coordinate::new(x, y),
            pixel: Default::default(),
        });
    }
    e.finish_lasso().unwrap();
    assert_eq!(e.selection().len(), 2);

    let mut layers = e.layers().as_slice().to_vec();
    layers[1].features.pop();
    layers[0].name = "renamed".into();
    e.set_layers(layers).unwrap();
    assert_eq!(e.selection().get(a), &[0, 1]);
    assert!(e.selection().get(b).is_empty());
    assert_eq!(e.layer(a).unwrap().name, "renamed");
}
