use wasm_bindgen::prelude::*;
mod api;
mod error;
mod interop;
mod logging;
mod surface;

pub use logging::init_logging;
pub use surface::MapSurfaceHandle;

#[wasm_bindgen]
pub struct Engine {
    pub(crate) inner: vecmap::Engine<surface::JsSurface>,
}

impl Engine {
    pub fn rs_new(handle: MapSurfaceHandle, config: vecmap::EngineConfig) -> Engine {
        Engine {
            inner: vecmap::Engine::new(surface::JsSurface::new(handle), config),
        }
    }

    pub fn rs_layer_exists(&self, id: u32) -> bool {
        self.inner.layer(id).is_some()
    }
}
