use proptest::prelude::*;
use serde_json::json;
use vecmap::geometry::predicates::point_in_polygon;
use vecmap::scene::ids::parse_paint_layer_id;
use vecmap::{
    Coordinate, DrawPurpose, Engine, EngineConfig, GeometryKind, InteractionMode, LayerId, MapEvent,
    MemorySurface, ScreenPoint, SyncOutcome,
};

#[derive(Clone, Debug)]
enum Op {
    Import { n: u8, x: i8 },
    Remove { idx: u8 },
    MoveUp { idx: u8 },
    MoveDown { idx: u8 },
    Toggle { idx: u8 },
    Opacity { idx: u8, pct: u8 },
    Click { x: i8, y: i8 },
    DoubleClick,
    Arm { tool: u8 },
    RemoveFeature { idx: u8, f: u8 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u8..4, any::<i8>()).prop_map(|(n, x)| Op::Import { n, x }),
        any::<u8>().prop_map(|idx| Op::Remove { idx }),
        any::<u8>().prop_map(|idx| Op::MoveUp { idx }),
        any::<u8>().prop_map(|idx| Op::MoveDown { idx }),
        any::<u8>().prop_map(|idx| Op::Toggle { idx }),
        (any::<u8>(), 0u8..=100).prop_map(|(idx, pct)| Op::Opacity { idx, pct }),
        (any::<i8>(), any::<i8>()).prop_map(|(x, y)| Op::Click { x, y }),
        Just(Op::DoubleClick),
        (0u8..6).prop_map(|tool| Op::Arm { tool }),
        (any::<u8>(), any::<u8>()).prop_map(|(idx, f)| Op::RemoveFeature { idx, f }),
    ]
}

fn layer_at(e: &Engine<MemorySurface>, idx: u8) -> Option<LayerId> {
    let layers = e.layers().as_slice();
    if layers.is_empty() {
        return None;
    }
    Some(layers[idx as usize % layers.len()].id)
}

fn tool(n: u8) -> InteractionMode {
    match n {
        0 => InteractionMode::SelectClick,
        1 => InteractionMode::SelectLasso,
        2 => InteractionMode::Measure,
        3 => InteractionMode::Draw {
            kind: GeometryKind::Point,
            purpose: DrawPurpose::NewLayer,
        },
        4 => InteractionMode::Draw {
            kind: GeometryKind::Polygon,
            purpose: DrawPurpose::Annotation,
        },
        _ => InteractionMode::Draw {
            kind: GeometryKind::Line,
            purpose: DrawPurpose::NewLayer,
        },
    }
}

fn apply(e: &mut Engine<MemorySurface>, op: Op) {
    match op {
        Op::Import { n, x } => {
            let features: Vec<_> = (0..n)
                .map(|i| {
                    let lon = x as f64 + i as f64;
                    json!({"type": "Feature", "geometry": {"type": "Point", "coordinates": [lon, 1.0]}})
                })
                .collect();
            let _ = e.import_geojson("p", &json!({"type": "FeatureCollection", "features": features}));
        }
        Op::Remove { idx } => {
            if let Some(id) = layer_at(e, idx) {
                e.remove_layer(id);
            }
        }
        Op::MoveUp { idx } => {
            if let Some(id) = layer_at(e, idx) {
                e.move_layer_up(id);
            }
        }
        Op::MoveDown { idx } => {
            if let Some(id) = layer_at(e, idx) {
                e.move_layer_down(id);
            }
        }
        Op::Toggle { idx } => {
            if let Some(id) = layer_at(e, idx) {
                let visible = e.layer(id).map_or(true, |l| l.visible);
                e.set_visibility(id, !visible);
            }
        }
        Op::Opacity { idx, pct } => {
            if let Some(id) = layer_at(e, idx) {
                e.set_opacity(id, pct as f64 / 100.0);
            }
        }
        Op::Click { x, y } => e.handle_event(MapEvent::Click {
            coord: Coordinate::new(x as f64, y as f64),
            pixel: ScreenPoint::new(x as f64, y as f64),
        }),
        Op::DoubleClick => e.handle_event(MapEvent::DoubleClick {
            coord: Coordinate::new(0.0, 0.0),
        }),
        Op::Arm { tool: n } => {
            e.arm_tool(tool(n));
        }
        Op::RemoveFeature { idx, f } => {
            if let Some(id) = layer_at(e, idx) {
                let len = e.layer(id).map_or(0, |l| l.features.len());
                if len > 0 {
                    let _ = e.remove_feature(id, f as usize % len);
                }
            }
        }
    }
}

fn assert_consistent(e: &mut Engine<MemorySurface>) {
    // Every selection entry points at a live layer and live features.
    for (id, indices) in e.selection().iter() {
        let layer = e.layer(id).expect("selection names a deleted layer");
        assert!(indices.iter().all(|&i| i < layer.features.len()));
    }
    // The surface mirrors the visible, non-empty layers in list order.
    let expected: Vec<String> = e
        .layers()
        .iter()
        .filter(|l| l.visible && !l.features.is_empty())
        .map(|l| format!("vm-{}", l.id))
        .collect();
    let mut order: Vec<String> = e
        .surface()
        .layer_order()
        .iter()
        .filter_map(|id| parse_paint_layer_id(id))
        .map(|(layer, _)| format!("vm-{layer}"))
        .collect();
    order.dedup();
    assert_eq!(order, expected);

    e.surface_mut().clear_calls();
    assert_eq!(e.sync(), SyncOutcome::Applied { mutations: 0 });
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 512, .. ProptestConfig::default() })]

    #[test]
    fn engine_edit_invariants(seq in prop::collection::vec(op_strategy(), 5..40)) {
        let mut e = Engine::headless(EngineConfig::default());
        for op in seq {
            apply(&mut e, op);
        }
        assert_consistent(&mut e);
    }

    #[test]
    fn move_keeps_layer_contents(n in 2usize..6, pick in any::<u8>(), up in any::<bool>()) {
        let mut e = Engine::headless(EngineConfig::default());
        for i in 0..n {
            apply(&mut e, Op::Import { n: 2, x: i as i8 * 10 });
        }
        let before: Vec<_> = e.layers().iter().cloned().collect();
        let id = layer_at(&e, pick).unwrap();
        if up { e.move_layer_up(id); } else { e.move_layer_down(id); }
        let mut after: Vec<_> = e.layers().iter().cloned().collect();
        prop_assert_eq!(after.len(), before.len());
        after.sort_by_key(|l| l.id);
        let mut sorted = before.clone();
        sorted.sort_by_key(|l| l.id);
        prop_assert_eq!(after, sorted);
    }

    #[test]
    fn point_in_polygon_is_deterministic(
        ring in prop::collection::vec((-50i16..50, -50i16..50), 0..12),
        p in (-60i16..60, -60i16..60),
    ) {
        let ring: Vec<Coordinate> = ring.iter().map(|&(x, y)| Coordinate::new(x as f64, y as f64)).collect();
        let point = Coordinate::new(p.0 as f64, p.1 as f64);
        let first = point_in_polygon(point, &ring);
        prop_assert_eq!(first, point_in_polygon(point, &ring));
        if ring.len() < 3 {
            prop_assert!(!first);
        }
        // Explicit closure does not change the answer.
        if let Some(&start) = ring.first() {
            let mut closed = ring.clone();
            closed.push(start);
            prop_assert_eq!(first, point_in_polygon(point, &closed));
        }
    }
}
