use log::{Level, LevelFilter, Metadata, Record};
use wasm_bindgen::prelude::*;
use web_sys::console;

struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => console::error_1(&line),
            Level::Warn => console::warn_1(&line),
            Level::Info => console::info_1(&line),
            Level::Debug => console::debug_1(&line),
            Level::Trace => console::log_1(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Routes `log` records to the browser console. `level` is one of
/// `off|error|warn|info|debug|trace`; anything else means `info`.
/// Returns false when another logger was installed first (the level still applies).
#[wasm_bindgen]
pub fn init_logging(level: &str) -> bool {
    let filter = level.parse::<LevelFilter>().unwrap_or(LevelFilter::Info);
    let installed = log::set_logger(&LOGGER).is_ok();
    log::set_max_level(filter);
    installed
}
