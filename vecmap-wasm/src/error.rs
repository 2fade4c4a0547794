use crate::interop::{new_obj, set_kv};
use wasm_bindgen::prelude::*;

pub fn ok(v: JsValue) -> JsValue {
    let o = new_obj();
    set_kv(&o, "ok", &JsValue::from_bool(true));
    set_kv(&o, "value", &v);
    o.into()
}

pub fn err(code: &'static str, message: impl Into<String>, data: Option<JsValue>) -> JsValue {
    let root = new_obj();
    set_kv(&root, "ok", &JsValue::from_bool(false));
    let e = new_obj();
    set_kv(&e, "code", &JsValue::from_str(code));
    set_kv(&e, "message", &JsValue::from_str(&message.into()));
    if let Some(d) = data {
        set_kv(&e, "data", &d);
    }
    set_kv(&root, "error", &e.into());
    root.into()
}

#[inline]
pub fn non_finite(param: &'static str) -> JsValue {
    from_error(&vecmap::Error::NonFinite(param))
}

#[inline]
pub fn invalid_id(kind: &str, id: u32) -> JsValue {
    let d = new_obj();
    set_kv(&d, "kind", &JsValue::from_str(kind));
    set_kv(&d, "id", &JsValue::from_f64(id as f64));
    err("invalid_id", format!("invalid {kind} id"), Some(d.into()))
}

/// Malformed argument that serde could not decode.
pub fn invalid_input(param: &str, reason: String) -> JsValue {
    let d = new_obj();
    set_kv(&d, "param", &JsValue::from_str(param));
    err("invalid_input", format!("parameter '{param}': {reason}"), Some(d.into()))
}

pub fn from_error(e: &vecmap::Error) -> JsValue {
    use vecmap::Error::*;
    let d = new_obj();
    let data = match e {
        InvalidGeometry { kind, needed, got } => {
            set_kv(&d, "kind", &JsValue::from_str(kind.as_str()));
            set_kv(&d, "needed", &JsValue::from_f64(*needed as f64));
            set_kv(&d, "got", &JsValue::from_f64(*got as f64));
            Some(d.into())
        }
        UnknownLayer(id) => {
            set_kv(&d, "kind", &JsValue::from_str("layer"));
            set_kv(&d, "id", &JsValue::from_f64(*id as f64));
            Some(d.into())
        }
        DuplicateLayer(id) => {
            set_kv(&d, "id", &JsValue::from_f64(*id as f64));
            Some(d.into())
        }
        UnknownFeature { layer, index } => {
            set_kv(&d, "kind", &JsValue::from_str("feature"));
            set_kv(&d, "layer", &JsValue::from_f64(*layer as f64));
            set_kv(&d, "index", &JsValue::from_f64(*index as f64));
            Some(d.into())
        }
        NonFinite(param) => {
            set_kv(&d, "param", &JsValue::from_str(param));
            Some(d.into())
        }
        LimitExceeded { what, max } => {
            set_kv(&d, "what", &JsValue::from_str(what));
            set_kv(&d, "max", &JsValue::from_f64(*max as f64));
            Some(d.into())
        }
        EngineNotReady | NotArmed | InvalidGeoJson(_) => None,
    };
    err(e.code(), e.to_string(), data)
}
