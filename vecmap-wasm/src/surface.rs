use crate::interop;
use js_sys::Array;
use serde_json::Value;
use vecmap::geometry::bounds::BBox;
use vecmap::scene::surface::{PaintKind, PaintProperties};
use vecmap::{Cursor, MapSurface, RenderedFeature, ScreenPoint};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// Host adapter around the JavaScript map (MapLibre-style). Query results
    /// are plain `{ layer, id, geometry }` objects, topmost first.
    #[derive(Clone)]
    pub type MapSurfaceHandle;

    #[wasm_bindgen(method, js_name = styleLoaded)]
    fn style_loaded(this: &MapSurfaceHandle) -> bool;
    #[wasm_bindgen(method, js_name = setStyle)]
    fn set_style(this: &MapSurfaceHandle, style: JsValue);
    #[wasm_bindgen(method, js_name = addSource)]
    fn add_source(this: &MapSurfaceHandle, id: &str, data: JsValue);
    #[wasm_bindgen(method, js_name = updateSourceData)]
    fn update_source_data(this: &MapSurfaceHandle, id: &str, data: JsValue);
    #[wasm_bindgen(method, js_name = removeSource)]
    fn remove_source(this: &MapSurfaceHandle, id: &str);
    #[wasm_bindgen(method, js_name = addPaintLayer)]
    fn add_paint_layer(
        this: &MapSurfaceHandle,
        id: &str,
        source_id: &str,
        kind: &str,
        paint: JsValue,
        filter: JsValue,
    );
    #[wasm_bindgen(method, js_name = setPaintProperty)]
    fn set_paint_property(this: &MapSurfaceHandle, layer_id: &str, property: &str, value: JsValue);
    #[wasm_bindgen(method, js_name = removeLayer)]
    fn remove_layer(this: &MapSurfaceHandle, id: &str);
    #[wasm_bindgen(method, js_name = moveLayer)]
    fn move_layer(this: &MapSurfaceHandle, id: &str, before_id: Option<String>);
    #[wasm_bindgen(method, js_name = setLayerInteractive)]
    fn set_layer_interactive(this: &MapSurfaceHandle, layer_id: &str, interactive: bool);
    #[wasm_bindgen(method, js_name = queryFeaturesAtPoint)]
    fn query_features_at_point(this: &MapSurfaceHandle, x: f64, y: f64, layer_ids: &Array) -> JsValue;
    #[wasm_bindgen(method, js_name = setCursor)]
    fn set_cursor(this: &MapSurfaceHandle, cursor: &str);
    #[wasm_bindgen(method, js_name = fitBounds)]
    fn fit_bounds(this: &MapSurfaceHandle, west: f64, south: f64, east: f64, north: f64, padding: f64);
}

pub struct JsSurface {
    handle: MapSurfaceHandle,
}

impl JsSurface {
    pub fn new(handle: MapSurfaceHandle) -> Self {
        JsSurface { handle }
    }
}

fn rendered_feature(v: &Value) -> Option<RenderedFeature> {
    // Accept both the adapter shape and a raw MapLibre feature (`layer.id`).
    let layer = match v.get("layer")? {
        Value::String(s) => s.clone(),
        other => other.get("id")?.as_str()?.to_string(),
    };
    let geometry = match vecmap::geojson::geometry_from_value(v.get("geometry")?) {
        Ok(g) => g,
        Err(e) => {
            log::debug!("ignoring rendered feature on '{layer}': {e}");
            return None;
        }
    };
    Some(RenderedFeature {
        layer,
        id: v.get("id").and_then(Value::as_u64),
        geometry,
    })
}

impl MapSurface for JsSurface {
    fn style_loaded(&self) -> bool {
        self.handle.style_loaded()
    }

    fn set_style(&mut self, style: &Value) {
        self.handle.set_style(interop::to_js(style));
    }

    fn add_source(&mut self, id: &str, data: &Value) {
        self.handle.add_source(id, interop::to_js(data));
    }

    fn update_source_data(&mut self, id: &str, data: &Value) {
        self.handle.update_source_data(id, interop::to_js(data));
    }

    fn remove_source(&mut self, id: &str) {
        self.handle.remove_source(id);
    }

    fn add_paint_layer(
        &mut self,
        id: &str,
        source_id: &str,
        kind: PaintKind,
        paint: &PaintProperties,
        filter: Option<&Value>,
    ) {
        let filter = filter.map_or(JsValue::UNDEFINED, interop::to_js);
        self.handle
            .add_paint_layer(id, source_id, kind.as_str(), interop::to_js(paint), filter);
    }

    fn set_paint_property(&mut self, layer_id: &str, property: &str, value: &Value) {
        self.handle.set_paint_property(layer_id, property, interop::to_js(value));
    }

    fn remove_layer(&mut self, id: &str) {
        self.handle.remove_layer(id);
    }

    fn move_layer(&mut self, id: &str, before_id: Option<&str>) {
        self.handle.move_layer(id, before_id.map(str::to_string));
    }

    fn set_layer_interactive(&mut self, layer_id: &str, interactive: bool) {
        self.handle.set_layer_interactive(layer_id, interactive);
    }

    fn query_features_at_point(&self, pixel: ScreenPoint, layer_ids: &[String]) -> Vec<RenderedFeature> {
        let ids: Array = layer_ids.iter().map(|s| JsValue::from_str(s)).collect();
        let raw = self.handle.query_features_at_point(pixel.x, pixel.y, &ids);
        match serde_wasm_bindgen::from_value::<Value>(raw) {
            Ok(Value::Array(items)) => items.iter().filter_map(rendered_feature).collect(),
            Ok(_) => Vec::new(),
            Err(e) => {
                log::warn!("queryFeaturesAtPoint returned an unreadable value: {e}");
                Vec::new()
            }
        }
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.handle.set_cursor(cursor.css());
    }

    fn fit_bounds(&mut self, bbox: BBox, padding: f64) {
        self.handle
            .fit_bounds(bbox.min.lon, bbox.min.lat, bbox.max.lon, bbox.max.lat, padding);
    }
}
