use crate::error;
use crate::interop::{from_js, to_js};
use crate::surface::MapSurfaceHandle;
use crate::Engine;
use vecmap::{Coordinate, EngineConfig, InteractionMode, Layer, LayerStyle, MapEvent, ScreenPoint};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn config_or_default(config: JsValue) -> Result<EngineConfig, String> {
    if config.is_undefined() || config.is_null() {
        return Ok(EngineConfig::default());
    }
    from_js(config)
}

#[wasm_bindgen]
impl Engine {
    /// `config` may be omitted; a malformed config falls back to defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(surface: MapSurfaceHandle, config: JsValue) -> Engine {
        let config = config_or_default(config).unwrap_or_else(|e| {
            log::warn!("ignoring engine config: {e}");
            EngineConfig::default()
        });
        Engine::rs_new(surface, config)
    }
    pub fn create_res(surface: MapSurfaceHandle, config: JsValue) -> JsValue {
        match config_or_default(config) {
            Ok(config) => error::ok(Engine::rs_new(surface, config).into()),
            Err(e) => error::invalid_input("config", e),
        }
    }

    // Host events
    pub fn handle_event(&mut self, event: JsValue) -> bool {
        match from_js::<MapEvent>(event) {
            Ok(ev) => {
                self.inner.handle_event(ev);
                true
            }
            Err(e) => {
                log::debug!("dropping malformed map event: {e}");
                false
            }
        }
    }
    pub fn handle_event_res(&mut self, event: JsValue) -> JsValue {
        match from_js::<MapEvent>(event) {
            Ok(ev) => {
                self.inner.handle_event(ev);
                error::ok(JsValue::TRUE)
            }
            Err(e) => error::invalid_input("event", e),
        }
    }
    pub fn on_click(&mut self, lon: f64, lat: f64, x: f64, y: f64) {
        self.inner.handle_event(MapEvent::Click {
            coord: Coordinate::new(lon, lat),
            pixel: ScreenPoint::new(x, y),
        });
    }
    pub fn on_click_res(&mut self, lon: f64, lat: f64, x: f64, y: f64) -> JsValue {
        for (name, v) in [("lon", lon), ("lat", lat), ("x", x), ("y", y)] {
            if !v.is_finite() {
                return error::non_finite(name);
            }
        }
        self.on_click(lon, lat, x, y);
        error::ok(JsValue::TRUE)
    }
    pub fn on_double_click(&mut self, lon: f64, lat: f64) {
        self.inner.handle_event(MapEvent::DoubleClick {
            coord: Coordinate::new(lon, lat),
        });
    }
    pub fn on_mouse_move(&mut self, x: f64, y: f64) {
        self.inner.handle_event(MapEvent::MouseMove {
            pixel: ScreenPoint::new(x, y),
        });
    }
    pub fn on_style_loaded(&mut self) {
        self.inner.handle_event(MapEvent::StyleLoaded);
    }
    /// Pending notifications as an array of `{ type, ... }` objects.
    pub fn drain_events(&mut self) -> JsValue {
        to_js(&self.inner.drain_events())
    }

    // Layers
    pub fn layers(&self) -> JsValue {
        to_js(self.inner.layers().as_slice())
    }
    pub fn layer(&self, id: u32) -> JsValue {
        self.inner.layer(id).map_or(JsValue::NULL, |l| to_js(l))
    }
    pub fn layer_res(&self, id: u32) -> JsValue {
        match self.inner.layer(id) {
            Some(l) => error::ok(to_js(l)),
            None => error::invalid_id("layer", id),
        }
    }
    pub fn set_layers(&mut self, layers: JsValue) -> bool {
        match from_js::<Vec<Layer>>(layers) {
            Ok(layers) => match self.inner.set_layers(layers) {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("set_layers rejected: {e}");
                    false
                }
            },
            Err(e) => {
                log::warn!("set_layers rejected: {e}");
                false
            }
        }
    }
    pub fn set_layers_res(&mut self, layers: JsValue) -> JsValue {
        match from_js::<Vec<Layer>>(layers) {
            Ok(layers) => match self.inner.set_layers(layers) {
                Ok(()) => error::ok(JsValue::TRUE),
                Err(e) => error::from_error(&e),
            },
            Err(e) => error::invalid_input("layers", e),
        }
    }
    pub fn import_geojson(&mut self, name: &str, data: JsValue) -> Option<u32> {
        self.import_geojson_inner(name, data).ok()
    }
    pub fn import_geojson_res(&mut self, name: &str, data: JsValue) -> JsValue {
        match self.import_geojson_inner(name, data) {
            Ok(id) => error::ok(JsValue::from_f64(id as f64)),
            Err(e) => e,
        }
    }
    pub fn remove_layer(&mut self, id: u32) -> bool {
        self.inner.remove_layer(id)
    }
    pub fn remove_layer_res(&mut self, id: u32) -> JsValue {
        if !self.rs_layer_exists(id) {
            return error::invalid_id("layer", id);
        }
        error::ok(JsValue::from_bool(self.inner.remove_layer(id)))
    }
    pub fn move_layer_up(&mut self, id: u32) -> bool {
        self.inner.move_layer_up(id)
    }
    pub fn move_layer_down(&mut self, id: u32) -> bool {
        self.inner.move_layer_down(id)
    }
    pub fn set_visibility(&mut self, id: u32, visible: bool) -> bool {
        self.inner.set_visibility(id, visible)
    }
    pub fn set_opacity(&mut self, id: u32, opacity: f64) -> bool {
        self.inner.set_opacity(id, opacity)
    }
    pub fn set_opacity_res(&mut self, id: u32, opacity: f64) -> JsValue {
        if !opacity.is_finite() {
            return error::non_finite("opacity");
        }
        if !self.rs_layer_exists(id) {
            return error::invalid_id("layer", id);
        }
        error::ok(JsValue::from_bool(self.inner.set_opacity(id, opacity)))
    }
    pub fn set_selectable(&mut self, id: u32, selectable: bool) -> bool {
        self.inner.set_selectable(id, selectable)
    }
    pub fn rename_layer(&mut self, id: u32, name: &str) -> bool {
        self.inner.rename_layer(id, name)
    }
    pub fn set_style(&mut self, id: u32, style: JsValue) -> bool {
        match from_js::<LayerStyle>(style) {
            Ok(style) => self.inner.set_style(id, style),
            Err(e) => {
                log::warn!("set_style rejected for layer {id}: {e}");
                false
            }
        }
    }
    pub fn set_style_res(&mut self, id: u32, style: JsValue) -> JsValue {
        if !self.rs_layer_exists(id) {
            return error::invalid_id("layer", id);
        }
        match from_js::<LayerStyle>(style) {
            Ok(style) => error::ok(JsValue::from_bool(self.inner.set_style(id, style))),
            Err(e) => error::invalid_input("style", e),
        }
    }
    pub fn focus_layer(&mut self, id: u32) -> bool {
        self.inner.focus_layer(id)
    }
    pub fn reset_palette(&mut self) {
        self.inner.reset_palette();
    }

    // Attributes
    pub fn attribute_keys(&self, id: u32) -> JsValue {
        self.inner.attribute_keys(id).map_or(JsValue::NULL, |k| to_js(&k))
    }
    pub fn attribute_rows(&self, id: u32) -> JsValue {
        self.inner.attribute_rows(id).map_or(JsValue::NULL, |r| to_js(&r))
    }
    pub fn attribute_rows_res(&self, id: u32) -> JsValue {
        match self.inner.attribute_rows(id) {
            Some(rows) => error::ok(to_js(&rows)),
            None => error::invalid_id("layer", id),
        }
    }
    pub fn set_feature_property(&mut self, id: u32, index: usize, key: &str, value: &str) -> bool {
        self.inner.set_feature_property(id, index, key, value).is_ok()
    }
    pub fn set_feature_property_res(&mut self, id: u32, index: usize, key: &str, value: &str) -> JsValue {
        match self.inner.set_feature_property(id, index, key, value) {
            Ok(()) => error::ok(JsValue::TRUE),
            Err(e) => error::from_error(&e),
        }
    }
    pub fn remove_feature(&mut self, id: u32, index: usize) -> bool {
        self.inner.remove_feature(id, index).is_ok()
    }
    pub fn remove_feature_res(&mut self, id: u32, index: usize) -> JsValue {
        match self.inner.remove_feature(id, index) {
            Ok(f) => error::ok(to_js(&f)),
            Err(e) => error::from_error(&e),
        }
    }
    pub fn annotation_layers(&self) -> JsValue {
        to_js(&self.inner.annotation_layers())
    }

    // Tools
    pub fn mode(&self) -> JsValue {
        to_js(&self.inner.mode())
    }
    pub fn arm_tool(&mut self, mode: JsValue) -> bool {
        match from_js::<InteractionMode>(mode) {
            Ok(mode) => self.inner.arm_tool(mode),
            Err(e) => {
                log::debug!("unknown tool: {e}");
                false
            }
        }
    }
    pub fn arm_tool_res(&mut self, mode: JsValue) -> JsValue {
        match from_js::<InteractionMode>(mode) {
            Ok(mode) => error::ok(JsValue::from_bool(self.inner.arm_tool(mode))),
            Err(e) => error::invalid_input("mode", e),
        }
    }
    pub fn cancel(&mut self) -> bool {
        self.inner.cancel()
    }
    /// `{ ok, value: { layerId, index } | null }`; a too-short shape yields
    /// `invalid_geometry` and the draft stays editable.
    pub fn complete_drawing_res(&mut self) -> JsValue {
        match self.inner.complete_drawing() {
            Ok(Some((layer_id, index))) => {
                error::ok(to_js(&serde_json::json!({ "layerId": layer_id, "index": index })))
            }
            Ok(None) => error::ok(JsValue::NULL),
            Err(e) => error::from_error(&e),
        }
    }
    pub fn finish_lasso(&mut self) -> bool {
        self.inner.finish_lasso().is_ok()
    }
    pub fn finish_lasso_res(&mut self) -> JsValue {
        match self.inner.finish_lasso() {
            Ok(()) => error::ok(JsValue::TRUE),
            Err(e) => error::from_error(&e),
        }
    }
    pub fn measurement(&self) -> JsValue {
        self.inner.measurement().map_or(JsValue::NULL, |m| to_js(&m))
    }
    pub fn reset_measurement(&mut self) -> bool {
        self.inner.reset_measurement()
    }
    pub fn selection(&self) -> JsValue {
        to_js(self.inner.selection())
    }
    pub fn clear_selection(&mut self) -> bool {
        self.inner.clear_selection()
    }

    // Basemap and sync
    pub fn basemap(&self) -> String {
        self.inner.basemap().to_string()
    }
    pub fn basemaps(&self) -> JsValue {
        to_js(&self.inner.config().basemaps)
    }
    pub fn set_basemap(&mut self, id: &str) -> bool {
        self.inner.set_basemap(id)
    }
    pub fn sync(&mut self) -> JsValue {
        to_js(&self.inner.sync())
    }
    pub fn sync_pending(&self) -> bool {
        self.inner.sync_pending()
    }
}

impl Engine {
    fn import_geojson_inner(&mut self, name: &str, data: JsValue) -> Result<u32, JsValue> {
        let data: serde_json::Value = from_js(data).map_err(|e| error::invalid_input("data", e))?;
        self.inner.import_geojson(name, &data).map_err(|e| error::from_error(&e))
    }
}
