pub mod config;
pub mod error;
pub mod geojson;
pub mod layers;
pub mod model;
pub mod geometry {
    pub mod bounds;
    pub mod limits;
    pub mod measure;
    pub mod predicates;
}
pub mod interaction {
    pub mod controller;
    pub mod drawing;
    pub mod measure;
    pub mod selection;
}
pub mod scene {
    pub mod ids;
    pub mod memory;
    pub mod paint;
    pub mod surface;
    pub mod sync;
}

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use interaction::controller::InteractionMode;
pub use interaction::drawing::DrawPurpose;
pub use interaction::measure::Measurement;
pub use interaction::selection::SelectionSet;
pub use layers::LayerList;
pub use model::{Coordinate, Feature, Geometry, GeometryKind, Layer, LayerId, LayerStyle, PropertyValue};
pub use scene::memory::MemorySurface;
pub use scene::surface::{Cursor, MapSurface, RenderedFeature, ScreenPoint};

use geometry::bounds::BBox;
use interaction::controller::{Dispatch, ModeController};
use interaction::drawing::DrawnFeature;
use interaction::selection::{ClickPick, LassoPick, SelectionStrategy};
use model::Properties;
use scene::paint::{self, Overlays};
use scene::sync::SceneSync;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw input forwarded by the host from the map engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MapEvent {
    Click { coord: Coordinate, pixel: ScreenPoint },
    DoubleClick { coord: Coordinate },
    MouseMove { pixel: ScreenPoint },
    StyleLoaded,
}

/// Notifications for collaborators (attribute table, layer panel, toolbar).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EngineEvent {
    SelectionChanged {
        selection: SelectionSet,
    },
    #[serde(rename_all = "camelCase")]
    FeatureCreated {
        layer_id: LayerId,
        index: usize,
        feature: Feature,
    },
    #[serde(rename_all = "camelCase")]
    LayerCreated {
        layer_id: LayerId,
    },
    LayersChanged,
    ModeChanged {
        mode: InteractionMode,
    },
    MeasurementChanged {
        measurement: Measurement,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SyncOutcome {
    Applied { mutations: usize },
    /// Style not loaded; the pass runs on the next `StyleLoaded`.
    Deferred,
}

/// One attribute table row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeRow {
    /// Index in the layer's feature sequence.
    pub index: usize,
    pub properties: Properties,
}

/// Interaction core bound to one map surface. Every mutating call finishes
/// with a scene sync, so the surface always reflects the current state.
pub struct Engine<S: MapSurface> {
    surface: S,
    config: EngineConfig,
    layers: LayerList,
    selection: SelectionSet,
    controller: ModeController,
    scene: SceneSync,
    events: Vec<EngineEvent>,
    focus: Option<LayerId>,
    cursor: Cursor,
    basemap: String,
}

impl<S: MapSurface> Engine<S> {
    pub fn new(surface: S, config: EngineConfig) -> Self {
        let basemap = config.default_basemap.clone();
        Engine {
            surface,
            config,
            layers: LayerList::new(),
            selection: SelectionSet::new(),
            controller: ModeController::new(),
            scene: SceneSync::new(),
            events: Vec::new(),
            focus: None,
            cursor: Cursor::Default,
            basemap,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Direct surface access for hosts; changes made here are not tracked.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn layers(&self) -> &LayerList {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(id)
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn mode(&self) -> InteractionMode {
        self.controller.mode()
    }

    pub fn controller(&self) -> &ModeController {
        &self.controller
    }

    pub fn basemap(&self) -> &str {
        &self.basemap
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    /// Replace the layer list wholesale. Selection entries for layers that
    /// vanished or whose features changed are dropped. A list with repeated
    /// ids is rejected before anything changes.
    pub fn set_layers(&mut self, layers: Vec<Layer>) -> Result<()> {
        let old = self.layers.clone();
        self.layers.replace_all(layers)?;
        let stale: Vec<LayerId> = self
            .selection
            .layers()
            .filter(|id| match (old.get(*id), self.layers.get(*id)) {
                (Some(a), Some(b)) => a.features != b.features,
                _ => true,
            })
            .collect();
        let mut changed = false;
        for id in stale {
            changed |= self.selection.remove_layer(id);
        }
        if self.focus.is_some_and(|id| self.layers.get(id).is_none()) {
            self.focus = None;
        }
        if changed {
            self.publish_selection();
        }
        self.events.push(EngineEvent::LayersChanged);
        self.sync();
        Ok(())
    }

    /// Restart the import colour rotation at the first palette entry.
    pub fn reset_palette(&mut self) {
        self.layers.reset_palette();
    }

    /// Import a GeoJSON FeatureCollection as a new layer. The geometry kind
    /// comes from the first supported feature.
    pub fn import_geojson(&mut self, name: &str, data: &Value) -> Result<LayerId> {
        let import = geojson::import(data)?;
        let kind = import.kind().ok_or_else(|| Error::InvalidGeoJson("no supported features".into()))?;
        if import.skipped > 0 {
            log::warn!("import '{name}': skipped {} unsupported features", import.skipped);
        }
        let name = match name.trim() {
            "" => format!("Imported {kind}"),
            n => n.to_string(),
        };
        let id = self.layers.create_imported(name, kind, import.features, &self.config);
        self.events.push(EngineEvent::LayerCreated { layer_id: id });
        self.events.push(EngineEvent::LayersChanged);
        self.sync();
        Ok(id)
    }

    pub fn remove_layer(&mut self, id: LayerId) -> bool {
        if self.layers.remove_layer(id).is_none() {
            return false;
        }
        if self.selection.remove_layer(id) {
            self.publish_selection();
        }
        if self.focus == Some(id) {
            self.focus = None;
        }
        self.layers_changed()
    }

    pub fn move_layer_up(&mut self, id: LayerId) -> bool {
        self.layers.move_up(id) && self.layers_changed()
    }

    pub fn move_layer_down(&mut self, id: LayerId) -> bool {
        self.layers.move_down(id) && self.layers_changed()
    }

    pub fn set_visibility(&mut self, id: LayerId, visible: bool) -> bool {
        self.layers.set_visibility(id, visible) && self.layers_changed()
    }

    pub fn set_opacity(&mut self, id: LayerId, opacity: f64) -> bool {
        self.layers.set_opacity(id, opacity) && self.layers_changed()
    }

    pub fn set_selectable(&mut self, id: LayerId, selectable: bool) -> bool {
        self.layers.set_selectable(id, selectable) && self.layers_changed()
    }

    pub fn rename_layer(&mut self, id: LayerId, name: &str) -> bool {
        self.layers.rename(id, name) && self.layers_changed()
    }

    pub fn set_style(&mut self, id: LayerId, style: LayerStyle) -> bool {
        self.layers.set_style(id, style) && self.layers_changed()
    }

    /// Mark a layer as focused; the next applied sync fits the viewport to it.
    /// Layers without features cannot be focused.
    pub fn focus_layer(&mut self, id: LayerId) -> bool {
        match self.layers.get(id) {
            Some(layer) if !layer.features.is_empty() => {
                self.focus = Some(id);
                self.sync();
                true
            }
            _ => false,
        }
    }

    // Attributes

    pub fn attribute_keys(&self, id: LayerId) -> Option<Vec<String>> {
        self.layers.attribute_keys(id)
    }

    /// Rows for the attribute table: the selected features of the layer, or
    /// every feature when nothing in it is selected.
    pub fn attribute_rows(&self, id: LayerId) -> Option<Vec<AttributeRow>> {
        let layer = self.layers.get(id)?;
        let selected = self.selection.valid_indices(id, layer.features.len());
        let row = |index: usize| AttributeRow {
            index,
            properties: layer.features[index].properties.clone(),
        };
        Some(if selected.is_empty() {
            (0..layer.features.len()).map(row).collect()
        } else {
            selected.into_iter().map(row).collect()
        })
    }

    /// Set one attribute. Values are stored as strings, as typed in the table.
    pub fn set_feature_property(&mut self, id: LayerId, index: usize, key: &str, value: &str) -> Result<()> {
        self.check_feature(id, index)?;
        self.layers
            .set_feature_property(id, index, key, PropertyValue::String(value.to_string()));
        self.features_changed(id);
        Ok(())
    }

    pub fn remove_feature(&mut self, id: LayerId, index: usize) -> Result<Feature> {
        self.check_feature(id, index)?;
        let feature = self
            .layers
            .remove_feature(id, index)
            .ok_or(Error::UnknownFeature { layer: id, index })?;
        self.features_changed(id);
        Ok(feature)
    }

    pub fn annotation_layers(&self) -> Vec<&Layer> {
        self.layers.annotation_layers().collect()
    }

    fn check_feature(&self, id: LayerId, index: usize) -> Result<()> {
        let layer = self.layers.get(id).ok_or(Error::UnknownLayer(id))?;
        if index >= layer.features.len() {
            return Err(Error::UnknownFeature { layer: id, index });
        }
        Ok(())
    }

    // Tools

    /// Toolbar entry point. Choosing the active tool again disarms it.
    /// Appending to a missing layer is refused.
    pub fn arm_tool(&mut self, tool: InteractionMode) -> bool {
        if let InteractionMode::Draw {
            purpose: DrawPurpose::AppendToLayer { layer_id },
            ..
        } = tool
        {
            if self.layers.get(layer_id).is_none() {
                log::warn!("cannot append drawings to missing layer {layer_id}");
                return false;
            }
        }
        let leaving_measure = self.mode() == InteractionMode::Measure;
        if !self.controller.choose(tool) {
            return false;
        }
        self.mode_changed(leaving_measure);
        true
    }

    /// Disarm whatever tool is active, discarding its buffer.
    pub fn cancel(&mut self) -> bool {
        let leaving_measure = self.mode() == InteractionMode::Measure;
        if !self.controller.cancel() {
            return false;
        }
        self.mode_changed(leaving_measure);
        true
    }

    /// Finish the drawing in progress without waiting for a double-click.
    pub fn complete_drawing(&mut self) -> Result<Option<(LayerId, usize)>> {
        let done = self.controller.complete_drawing()?;
        let created = self.emit_drawn(done);
        self.events.push(EngineEvent::ModeChanged { mode: self.mode() });
        self.sync();
        Ok(created)
    }

    /// Close the lasso and select what it encloses.
    pub fn finish_lasso(&mut self) -> Result<()> {
        let ring = self.controller.finish_lasso()?;
        self.apply_lasso(ring);
        Ok(())
    }

    pub fn measurement(&self) -> Option<Measurement> {
        (self.mode() == InteractionMode::Measure).then(|| self.controller.measure().measurement())
    }

    pub fn reset_measurement(&mut self) -> bool {
        if !self.controller.reset_measurement() {
            return false;
        }
        self.publish_measurement();
        self.sync();
        true
    }

    pub fn clear_selection(&mut self) -> bool {
        self.replace_selection(SelectionSet::new())
    }

    /// Switch the basemap style. The surface drops every custom source, so
    /// the whole scene is re-added once the new style reports loaded.
    pub fn set_basemap(&mut self, id: &str) -> bool {
        let Some(style) = self.config.basemap_style(id) else {
            return false;
        };
        self.surface.set_style(&style);
        self.scene.reset();
        self.basemap = id.to_string();
        self.sync();
        true
    }

    // Events

    pub fn handle_event(&mut self, event: MapEvent) {
        match event {
            MapEvent::Click { coord, pixel } => match self.controller.on_click(coord) {
                Dispatch::Pick => self.pick(pixel),
                dispatch => self.dispatched(dispatch),
            },
            MapEvent::DoubleClick { .. } => {
                let dispatch = self.controller.on_double_click();
                self.dispatched(dispatch);
            }
            MapEvent::MouseMove { pixel } => self.hover(pixel),
            MapEvent::StyleLoaded => {
                self.sync();
            }
        }
    }

    fn dispatched(&mut self, dispatch: Dispatch) {
        match dispatch {
            Dispatch::Ignored | Dispatch::Pick => {}
            Dispatch::Buffered => {
                self.sync();
            }
            Dispatch::Measured => {
                self.publish_measurement();
                self.sync();
            }
            Dispatch::Drawn(done) => {
                self.emit_drawn(done);
                self.events.push(EngineEvent::ModeChanged { mode: self.mode() });
                self.sync();
            }
            Dispatch::Lasso(ring) => self.apply_lasso(ring),
        }
    }

    fn pick(&mut self, pixel: ScreenPoint) {
        let ids = paint::interactive_layer_ids(&self.layers);
        let hits = if ids.is_empty() {
            Vec::new()
        } else {
            self.surface.query_features_at_point(pixel, &ids)
        };
        if hits.is_empty() {
            self.clear_selection();
            return;
        }
        let picked = ClickPick.run(hits, &self.layers);
        if picked.is_empty() {
            log::warn!("click hit rendered features but none matched a layer feature");
            return;
        }
        self.replace_selection(picked);
    }

    fn apply_lasso(&mut self, ring: Vec<Coordinate>) {
        let picked = LassoPick.run(ring, &self.layers);
        log::debug!("lasso selected features in {} layers", picked.len());
        self.replace_selection(picked);
        // The ring buffer is gone even if the selection did not change.
        self.sync();
    }

    fn hover(&mut self, pixel: ScreenPoint) {
        let cursor = if self.mode().is_selecting() {
            let ids = paint::interactive_layer_ids(&self.layers);
            if !ids.is_empty() && !self.surface.query_features_at_point(pixel, &ids).is_empty() {
                Cursor::Pointer
            } else {
                Cursor::Default
            }
        } else {
            Cursor::Default
        };
        self.apply_cursor(cursor);
    }

    fn apply_cursor(&mut self, cursor: Cursor) {
        if cursor != self.cursor {
            self.cursor = cursor;
            self.surface.set_cursor(cursor);
        }
    }

    /// Store a finished drawing according to its purpose. Returns where it went.
    fn emit_drawn(&mut self, done: DrawnFeature) -> Option<(LayerId, usize)> {
        let DrawnFeature {
            feature,
            kind,
            purpose,
        } = done;
        let (layer_id, index) = match purpose {
            DrawPurpose::AppendToLayer { layer_id } => {
                let Some(index) = self.layers.append_feature(layer_id, feature.clone()) else {
                    log::warn!("target layer {layer_id} is gone; dropping drawn {kind}");
                    return None;
                };
                if self.selection.remove_layer(layer_id) {
                    self.publish_selection();
                }
                (layer_id, index)
            }
            DrawPurpose::NewLayer | DrawPurpose::Annotation => {
                let annotation = purpose == DrawPurpose::Annotation;
                let (name, defaults) = if annotation {
                    (format!("Annotation {kind}"), &self.config.annotation_style)
                } else {
                    (format!("New {kind}"), &self.config.drawn_feature_style)
                };
                let style = defaults.layer_style(kind, self.config.point_radius);
                let id = self.layers.create_layer(name, kind, style, vec![feature.clone()]);
                if let Some(layer) = self.layers.get_mut(id) {
                    layer.annotation = annotation;
                }
                self.events.push(EngineEvent::LayerCreated { layer_id: id });
                (id, 0)
            }
        };
        self.events.push(EngineEvent::FeatureCreated {
            layer_id,
            index,
            feature,
        });
        self.events.push(EngineEvent::LayersChanged);
        Some((layer_id, index))
    }

    fn replace_selection(&mut self, next: SelectionSet) -> bool {
        if next == self.selection {
            return false;
        }
        self.selection = next;
        self.publish_selection();
        self.sync();
        true
    }

    fn features_changed(&mut self, id: LayerId) {
        if self.selection.remove_layer(id) {
            self.publish_selection();
        }
        self.layers_changed();
    }

    fn layers_changed(&mut self) -> bool {
        self.events.push(EngineEvent::LayersChanged);
        self.sync();
        true
    }

    fn mode_changed(&mut self, leaving_measure: bool) {
        self.events.push(EngineEvent::ModeChanged { mode: self.mode() });
        if leaving_measure {
            self.events.push(EngineEvent::MeasurementChanged {
                measurement: Measurement::default(),
            });
        }
        if !self.mode().is_selecting() {
            self.apply_cursor(Cursor::Default);
        }
        self.sync();
    }

    fn publish_selection(&mut self) {
        self.events.push(EngineEvent::SelectionChanged {
            selection: self.selection.clone(),
        });
    }

    fn publish_measurement(&mut self) {
        self.events.push(EngineEvent::MeasurementChanged {
            measurement: self.controller.measure().measurement(),
        });
    }

    /// Reconcile the surface with the current state. Before the style has
    /// loaded the pass is deferred to the next `StyleLoaded` event.
    pub fn sync(&mut self) -> SyncOutcome {
        let drawing = self.controller.drawing();
        let overlays = Overlays {
            draft: drawing.points(),
            draft_purpose: drawing.purpose(),
            lasso: self.controller.lasso().points(),
            measure: self.controller.measure().points(),
        };
        let scene = paint::compose(&self.layers, &self.selection, overlays, &self.config);
        match self.scene.reconcile(&mut self.surface, &scene) {
            Ok(mutations) => {
                self.fit_focus();
                SyncOutcome::Applied { mutations }
            }
            Err(_) => SyncOutcome::Deferred,
        }
    }

    pub fn sync_pending(&self) -> bool {
        self.scene.is_pending()
    }

    fn fit_focus(&mut self) {
        let Some(id) = self.focus.take() else {
            return;
        };
        let bbox = self.layers.get(id).and_then(|l| BBox::of_features(&l.features));
        if let Some(bbox) = bbox {
            self.surface.fit_bounds(bbox, self.config.fit_padding);
        }
    }
}

impl Engine<MemorySurface> {
    /// Engine over a headless surface whose style is already loaded.
    pub fn headless(config: EngineConfig) -> Self {
        Engine::new(MemorySurface::new(), config)
    }
}
