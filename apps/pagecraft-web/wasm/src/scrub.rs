//! Scrub tab: metadata removal

use pagecraft_core::{ExportedFile, LopdfBuilder, PageCraftConfig, ScrubSession};
use wasm_bindgen::prelude::*;

use crate::status::forward_status;
use crate::ExportedPdf;

#[wasm_bindgen(js_name = ScrubSession)]
pub struct WasmScrubSession {
    inner: ScrubSession<LopdfBuilder>,
}

impl Default for WasmScrubSession {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen(js_class = ScrubSession)]
impl WasmScrubSession {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: ScrubSession::new(LopdfBuilder, &PageCraftConfig::default()),
        }
    }

    #[wasm_bindgen(js_name = onStatus)]
    pub fn on_status(&self, callback: js_sys::Function) {
        forward_status(self.inner.status(), callback);
    }

    /// Load a document; returns its page count.
    pub fn load(&mut self, name: &str, bytes: &[u8]) -> Result<u32, JsValue> {
        self.load_internal(name, bytes)
            .map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen(getter, js_name = isLoaded)]
    pub fn is_loaded(&self) -> bool {
        self.inner.is_loaded()
    }

    pub fn export(&self, filename: Option<String>) -> Result<ExportedPdf, JsValue> {
        self.export_internal(filename.as_deref())
            .map(ExportedPdf::from)
            .map_err(|e| JsValue::from_str(&e))
    }
}

impl WasmScrubSession {
    fn load_internal(&mut self, name: &str, bytes: &[u8]) -> Result<u32, String> {
        self.inner.load(name, bytes).map_err(|e| e.to_string())
    }

    fn export_internal(&self, filename: Option<&str>) -> Result<ExportedFile, String> {
        self.inner.export(filename).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_core::sample::sample_document_with_info;
    use pagecraft_core::{BuiltDocument, DocumentBuilder, InfoField};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_and_export() {
        let mut session = WasmScrubSession::new();
        let source =
            sample_document_with_info("Memo", 3, &[(InfoField::Keywords, "secret")]).unwrap();
        assert_eq!(session.load_internal("memo.pdf", &source).unwrap(), 3);
        assert!(session.is_loaded());

        let file = session.export_internal(Some("memo clean")).unwrap();
        assert_eq!(file.filename, "memo clean.pdf");
        let doc = LopdfBuilder.load(file.bytes).unwrap();
        assert_eq!(doc.info(InfoField::Keywords), Some(String::new()));
        assert_eq!(doc.info(InfoField::Producer), Some("pagecraft".to_string()));
    }

    #[test]
    fn test_empty_file_rejected() {
        let mut session = WasmScrubSession::new();
        let err = session.load_internal("empty.pdf", b"").unwrap_err();
        assert_eq!(err, "Input too small to be a PDF (0 bytes)");
        assert!(!session.is_loaded());
    }
}
