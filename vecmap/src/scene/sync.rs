use crate::error::{Error, Result};
use crate::scene::paint::{PaintLayerSpec, Scene, SourceSpec};
use crate::scene::surface::MapSurface;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug)]
struct LiveSource {
    data: Value,
    layers: Vec<PaintLayerSpec>,
}

/// Shadow copy of what this crate has put on the surface, used to issue the
/// smallest set of calls that turns the live scene into the desired one.
#[derive(Clone, Debug, Default)]
pub struct SceneSync {
    live: HashMap<String, LiveSource>,
    /// Our paint layers in surface z-order, bottom first.
    order: Vec<String>,
    pending: bool,
}

impl SceneSync {
    pub fn new() -> Self {
        SceneSync::default()
    }

    /// A pass was attempted before the style finished loading.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Forget the shadow scene after the surface dropped it (style swap).
    pub fn reset(&mut self) {
        self.live.clear();
        self.order.clear();
    }

    /// Reconcile and return the number of surface mutations issued. Before the
    /// style has loaded nothing is touched and the pass is marked pending.
    pub fn reconcile<S: MapSurface + ?Sized>(&mut self, surface: &mut S, scene: &Scene) -> Result<usize> {
        if !surface.style_loaded() {
            self.pending = true;
            log::debug!("scene sync deferred until the style has loaded");
            return Err(Error::EngineNotReady);
        }
        self.pending = false;
        let mut calls = 0;

        // Remove first so nothing is added under an id that is being dropped.
        let wanted: HashSet<&str> = scene.sources.iter().map(|s| s.id.as_str()).collect();
        let stale: Vec<String> = self
            .live
            .keys()
            .filter(|id| !wanted.contains(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            if let Some(live) = self.live.remove(&id) {
                for layer in &live.layers {
                    surface.remove_layer(&layer.id);
                    self.order.retain(|l| l != &layer.id);
                    calls += 1;
                }
                surface.remove_source(&id);
                calls += 1;
            }
        }

        for source in &scene.sources {
            calls += match self.live.get_mut(&source.id) {
                None => self.add_source(surface, source),
                Some(live) => update_source(surface, live, source, &mut self.order),
            };
        }

        let desired: Vec<&str> = scene.paint_layer_ids();
        if self.order.iter().map(String::as_str).ne(desired.iter().copied()) {
            for id in &desired {
                surface.move_layer(id, None);
                calls += 1;
            }
            self.order = desired.into_iter().map(str::to_string).collect();
        }

        log::debug!("scene sync issued {calls} surface calls");
        Ok(calls)
    }

    fn add_source<S: MapSurface + ?Sized>(&mut self, surface: &mut S, source: &SourceSpec) -> usize {
        surface.add_source(&source.id, &source.data);
        let mut calls = 1;
        for layer in &source.layers {
            calls += add_layer(surface, &source.id, layer);
            self.order.push(layer.id.clone());
        }
        self.live.insert(
            source.id.clone(),
            LiveSource {
                data: source.data.clone(),
                layers: source.layers.clone(),
            },
        );
        calls
    }
}

fn add_layer<S: MapSurface + ?Sized>(surface: &mut S, source_id: &str, layer: &PaintLayerSpec) -> usize {
    surface.add_paint_layer(&layer.id, source_id, layer.kind, &layer.paint, layer.filter.as_ref());
    if layer.interactive {
        surface.set_layer_interactive(&layer.id, true);
        return 2;
    }
    1
}

fn update_source<S: MapSurface + ?Sized>(
    surface: &mut S,
    live: &mut LiveSource,
    source: &SourceSpec,
    order: &mut Vec<String>,
) -> usize {
    let mut calls = 0;
    if live.data != source.data {
        surface.update_source_data(&source.id, &source.data);
        live.data = source.data.clone();
        calls += 1;
    }

    let wanted: HashSet<&str> = source.layers.iter().map(|l| l.id.as_str()).collect();
    live.layers.retain(|l| {
        if wanted.contains(l.id.as_str()) {
            return true;
        }
        surface.remove_layer(&l.id);
        order.retain(|o| o != &l.id);
        calls += 1;
        false
    });

    for desired in &source.layers {
        match live.layers.iter_mut().find(|l| l.id == desired.id) {
            None => {
                calls += add_layer(surface, &source.id, desired);
                order.push(desired.id.clone());
                live.layers.push(desired.clone());
            }
            // Filters cannot be edited in place.
            Some(current) if current.kind != desired.kind || current.filter != desired.filter => {
                surface.remove_layer(&current.id);
                order.retain(|o| o != &current.id);
                calls += 1 + add_layer(surface, &source.id, desired);
                order.push(desired.id.clone());
                *current = desired.clone();
            }
            Some(current) => {
                calls += update_paint(surface, current, desired);
            }
        }
    }
    calls
}

fn update_paint<S: MapSurface + ?Sized>(
    surface: &mut S,
    current: &mut PaintLayerSpec,
    desired: &PaintLayerSpec,
) -> usize {
    let mut calls = 0;
    for (key, value) in &desired.paint {
        if current.paint.get(key) != Some(value) {
            surface.set_paint_property(&desired.id, key, value);
            calls += 1;
        }
    }
    for key in current.paint.keys() {
        if !desired.paint.contains_key(key) {
            surface.set_paint_property(&desired.id, key, &Value::Null);
            calls += 1;
        }
    }
    if current.interactive != desired.interactive {
        surface.set_layer_interactive(&desired.id, desired.interactive);
        calls += 1;
    }
    *current = desired.clone();
    calls
}
