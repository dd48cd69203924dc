//! Status and progress forwarding to JavaScript callbacks

use pagecraft_core::session::{Status, StatusReporter};
use wasm_bindgen::prelude::*;

/// Call `callback(status)` on every status change until the reporter is
/// dropped. `status` is `{ state: "working" | "ready" | ..., message, ... }`.
pub fn forward_status(reporter: &StatusReporter, callback: js_sys::Function) {
    let mut rx = reporter.subscribe();
    wasm_bindgen_futures::spawn_local(async move {
        while rx.changed().await.is_ok() {
            let status = rx.borrow_and_update().clone();
            if let Ok(value) = status_to_js(&status) {
                let _ = callback.call1(&JsValue::null(), &value);
            }
        }
    });
}

pub fn status_to_js(status: &Status) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(status)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Synchronous progress callback, `(current, total, message) => void`
#[derive(Default)]
pub struct ProgressCallback {
    callback: Option<js_sys::Function>,
}

impl ProgressCallback {
    pub fn set(&mut self, callback: js_sys::Function) {
        self.callback = Some(callback);
    }

    pub fn report(&self, current: usize, total: usize, message: &str) {
        if let Some(callback) = &self.callback {
            let _ = callback.call3(
                &JsValue::null(),
                &JsValue::from(current as u32),
                &JsValue::from(total as u32),
                &JsValue::from_str(message),
            );
        }
    }
}
