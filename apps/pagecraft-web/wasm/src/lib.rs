//! WASM bindings for page composition
//!
//! One session object per tab; all document state lives in Rust and
//! JavaScript only handles DOM events, file I/O and the PDF.js adapter.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { OrganizeSession, MergeSession, ScrubSession } from './pkg/pagecraft_wasm.js';
//!
//! await init();
//!
//! // Organize
//! const organize = new OrganizeSession(pdfjsBackend, canvas, indicator);
//! organize.onStatus(status => showStatus(status));
//! const { loaded, pageCount } = await organize.load("file.pdf", bytes);
//! await organize.render(0);
//! organize.rotate(0, 90);
//! organize.toggleKeep(2);
//! const out = organize.export("reordered");
//! download(out.bytes, out.filename);
//!
//! // Merge
//! const merge = new MergeSession();
//! merge.setProgressCallback((current, total, msg) => updateUI(current, total, msg));
//! const a = merge.addFile("a.pdf", bytesA);
//! merge.addFile("b.pdf", bytesB);
//! merge.moveDown(a);
//! const merged = merge.export();
//! ```

pub mod merge;
pub mod organize;
pub mod raster;
pub mod scrub;
pub mod status;

use pagecraft_core::{ExportedFile, LopdfBuilder, PageCraftConfig, PageCraftError, PdfCommand};
use serde::Serialize;
use wasm_bindgen::prelude::*;

pub use merge::WasmMergeSession;
pub use organize::WasmOrganizeSession;
pub use raster::{CanvasSurface, JsRasterEngine, RasterBackend};
pub use scrub::WasmScrubSession;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// An exported document, ready for download.
#[wasm_bindgen]
pub struct ExportedPdf {
    filename: String,
    bytes: Vec<u8>,
}

#[wasm_bindgen]
impl ExportedPdf {
    #[wasm_bindgen(getter)]
    pub fn filename(&self) -> String {
        self.filename.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn bytes(&self) -> js_sys::Uint8Array {
        js_sys::Uint8Array::from(self.bytes.as_slice())
    }

    #[wasm_bindgen(getter)]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl From<ExportedFile> for ExportedPdf {
    fn from(file: ExportedFile) -> Self {
        Self {
            filename: file.filename,
            bytes: file.bytes,
        }
    }
}

pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

pub(crate) fn to_js_error(error: PageCraftError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// Check that the bytes contain a PDF header; returns how many leading
/// bytes would be skipped.
#[wasm_bindgen(js_name = quickValidate)]
pub fn quick_validate(bytes: &[u8]) -> Result<usize, JsValue> {
    pagecraft_core::normalize(bytes)
        .map(|normalized| normalized.header_offset())
        .map_err(to_js_error)
}

/// Page count, version, encryption and title/author without a session
#[wasm_bindgen(js_name = getPdfInfo)]
pub fn get_pdf_info(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let summary = pagecraft_core::inspect(bytes).map_err(to_js_error)?;
    to_js(&summary)
}

/// Run a one-shot JSON command (`{"type": "Merge", ...}`) and return the
/// `ProcessResult` as JSON.
#[wasm_bindgen(js_name = processCommand)]
pub fn process_command(json: &str) -> String {
    process_command_internal(json)
}

fn process_command_internal(json: &str) -> String {
    let result = match serde_json::from_str::<PdfCommand>(json) {
        Ok(command) => pagecraft_core::execute(&LopdfBuilder, command, &PageCraftConfig::default()),
        Err(e) => pagecraft_core::ProcessResult {
            success: false,
            data: None,
            error: Some(format!("Invalid command: {}", e)),
            metrics: None,
        },
    };
    serde_json::to_string(&result)
        .unwrap_or_else(|e| format!(r#"{{"success":false,"error":"{}"}}"#, e))
}

/// Generate a labelled sample document for trying the tools out.
#[wasm_bindgen(js_name = generateSample)]
pub fn generate_sample(label: &str, page_count: u32) -> Result<Vec<u8>, JsValue> {
    pagecraft_core::sample::sample_document(label, page_count.max(1)).map_err(to_js_error)
}
