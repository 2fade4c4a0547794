use js_sys::{Object, Reflect};
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::JsValue;

pub fn new_obj() -> Object {
    Object::new()
}

pub fn set_kv(obj: &Object, k: &str, v: &JsValue) {
    let _ = Reflect::set(obj, &JsValue::from_str(k), v);
}

/// Serializes through `serde_json::Value` so maps with integer keys (the
/// selection) come out as plain objects instead of JS `Map`s.
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> JsValue {
    let json = match serde_json::to_value(value) {
        Ok(v) => v,
        Err(e) => {
            log::error!("cannot serialize value for JS: {e}");
            return JsValue::NULL;
        }
    };
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    json.serialize(&serializer).unwrap_or(JsValue::NULL)
}

pub fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, String> {
    serde_wasm_bindgen::from_value(value).map_err(|e| e.to_string())
}
