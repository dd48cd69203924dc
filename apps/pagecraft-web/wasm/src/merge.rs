//! Merge tab: ordered file queue

use pagecraft_core::page_model::Direction;
use pagecraft_core::{ExportedFile, LopdfBuilder, MergeSession, PageCraftConfig};
use wasm_bindgen::prelude::*;

use crate::status::{forward_status, ProgressCallback};
use crate::{to_js, ExportedPdf};

#[wasm_bindgen(js_name = MergeSession)]
pub struct WasmMergeSession {
    inner: MergeSession<LopdfBuilder>,
    progress: ProgressCallback,
}

impl Default for WasmMergeSession {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen(js_class = MergeSession)]
impl WasmMergeSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: MergeSession::new(LopdfBuilder, &PageCraftConfig::default()),
            progress: ProgressCallback::default(),
        }
    }

    /// Callback signature: (current: number, total: number, message: string) => void
    #[wasm_bindgen(js_name = setProgressCallback)]
    pub fn set_progress_callback(&mut self, callback: js_sys::Function) {
        self.progress.set(callback);
    }

    #[wasm_bindgen(js_name = onStatus)]
    pub fn on_status(&self, callback: js_sys::Function) {
        forward_status(self.inner.status(), callback);
    }

    /// Queue a file; returns its id.
    #[wasm_bindgen(js_name = addFile)]
    pub fn add_file(&mut self, name: &str, bytes: Vec<u8>) -> f64 {
        self.inner.add_file(name, bytes) as f64
    }

    pub fn remove(&mut self, id: f64) -> bool {
        self.inner.remove(id as u64)
    }

    #[wasm_bindgen(js_name = moveUp)]
    pub fn move_up(&mut self, id: f64) -> bool {
        self.inner.move_entry(id as u64, Direction::Up)
    }

    #[wasm_bindgen(js_name = moveDown)]
    pub fn move_down(&mut self, id: f64) -> bool {
        self.inner.move_entry(id as u64, Direction::Down)
    }

    /// Queue contents: `[{ id, name, size_bytes }]`
    pub fn entries(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.summaries())
    }

    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.inner.queue().len()
    }

    pub fn export(&self, filename: Option<String>) -> Result<ExportedPdf, JsValue> {
        self.export_internal(filename.as_deref())
            .map(ExportedPdf::from)
            .map_err(|e| JsValue::from_str(&e))
    }
}

impl WasmMergeSession {
    fn export_internal(&self, filename: Option<&str>) -> Result<ExportedFile, String> {
        self.inner
            .export_with_progress(filename, |current, total, message| {
                self.progress.report(current, total, message)
            })
            .map_err(|e| e.to_string())
    }
}
