//! Organize tab: page gestures, preview and export

use std::rc::Rc;

use pagecraft_core::page_model::{Direction, PageDescriptor};
use pagecraft_core::render::{LoadOutcome, RenderOutcome};
use pagecraft_core::{LopdfBuilder, OrganizeSession, PageCraftConfig};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{HtmlCanvasElement, HtmlElement};

use crate::raster::{CanvasSurface, JsRasterEngine, RasterBackend};
use crate::status::forward_status;
use crate::{to_js, to_js_error, ExportedPdf};

type Session = OrganizeSession<LopdfBuilder, JsRasterEngine, CanvasSurface>;

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct LoadResultJs {
    loaded: bool,
    page_count: u32,
}

impl From<LoadOutcome> for LoadResultJs {
    fn from(outcome: LoadOutcome) -> Self {
        match outcome {
            LoadOutcome::Loaded { page_count } => Self {
                loaded: true,
                page_count,
            },
            LoadOutcome::Superseded => Self {
                loaded: false,
                page_count: 0,
            },
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct PageJs {
    source_index: u32,
    rotation: u16,
    keep: bool,
}

impl From<&PageDescriptor> for PageJs {
    fn from(page: &PageDescriptor) -> Self {
        Self {
            source_index: page.source_index(),
            rotation: page.rotation.degrees(),
            keep: page.keep,
        }
    }
}

/// Rotations arrive from JavaScript unchecked; refuse rather than panic.
fn check_delta(delta: i32) -> Result<i32, String> {
    if delta % 90 == 0 {
        Ok(delta)
    } else {
        Err(format!("Rotation must be a multiple of 90, got {}", delta))
    }
}

#[wasm_bindgen(js_name = OrganizeSession)]
pub struct WasmOrganizeSession {
    inner: Rc<Session>,
}

#[wasm_bindgen(js_class = OrganizeSession)]
impl WasmOrganizeSession {
    #[wasm_bindgen(constructor)]
    pub fn new(
        backend: RasterBackend,
        canvas: HtmlCanvasElement,
        indicator: Option<HtmlElement>,
    ) -> Result<WasmOrganizeSession, JsValue> {
        let surface = CanvasSurface::new(canvas, indicator)?;
        let session = OrganizeSession::new(
            LopdfBuilder,
            JsRasterEngine::new(backend),
            surface,
            &PageCraftConfig::default(),
        );
        Ok(Self {
            inner: Rc::new(session),
        })
    }

    /// Callback signature: (status: { state, message, ... }) => void
    #[wasm_bindgen(js_name = onStatus)]
    pub fn on_status(&self, callback: js_sys::Function) {
        forward_status(self.inner.organizer().status(), callback);
    }

    /// Resolves to `{ loaded, pageCount }`; `loaded` is false when a newer
    /// load replaced this one.
    pub fn load(&self, name: String, bytes: Vec<u8>) -> js_sys::Promise {
        let inner = Rc::clone(&self.inner);
        future_to_promise(async move {
            let outcome = inner.load(&name, &bytes).await.map_err(to_js_error)?;
            to_js(&LoadResultJs::from(outcome))
        })
    }

    /// Resolves to true when the page was painted, false when superseded.
    pub fn render(&self, page_index: u32) -> js_sys::Promise {
        let inner = Rc::clone(&self.inner);
        future_to_promise(async move {
            let outcome = inner
                .render_preview(page_index)
                .await
                .map_err(to_js_error)?;
            Ok(JsValue::from_bool(matches!(
                outcome,
                RenderOutcome::Painted(_)
            )))
        })
    }

    #[wasm_bindgen(js_name = moveUp)]
    pub fn move_up(&self, index: usize) -> Result<bool, JsValue> {
        self.inner
            .organizer_mut()
            .move_adjacent(index, Direction::Up)
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = moveDown)]
    pub fn move_down(&self, index: usize) -> Result<bool, JsValue> {
        self.inner
            .organizer_mut()
            .move_adjacent(index, Direction::Down)
            .map_err(to_js_error)
    }

    /// Drag-drop reorder
    #[wasm_bindgen(js_name = moveTo)]
    pub fn move_to(&self, from: usize, to: usize) -> bool {
        self.inner.organizer_mut().move_to(from, to)
    }

    /// Returns the new rotation in degrees.
    pub fn rotate(&self, index: usize, delta: i32) -> Result<u16, JsValue> {
        let delta = check_delta(delta).map_err(|e| JsValue::from_str(&e))?;
        self.inner
            .organizer_mut()
            .rotate(index, delta)
            .map(|rotation| rotation.degrees())
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = toggleKeep)]
    pub fn toggle_keep(&self, index: usize) -> Result<bool, JsValue> {
        self.inner
            .organizer_mut()
            .toggle_keep(index)
            .map_err(to_js_error)
    }

    /// Current page list: `[{ sourceIndex, rotation, keep }]`
    pub fn pages(&self) -> Result<JsValue, JsValue> {
        let organizer = self.inner.organizer();
        let pages: Vec<PageJs> = organizer.pages().pages().iter().map(PageJs::from).collect();
        to_js(&pages)
    }

    /// Every gesture since the session started, as JSON.
    #[wasm_bindgen(js_name = actionLog)]
    pub fn action_log(&self) -> Result<String, JsValue> {
        self.inner
            .organizer()
            .actions()
            .to_json()
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn export(&self, filename: Option<String>) -> Result<ExportedPdf, JsValue> {
        self.inner
            .export(filename.as_deref())
            .map(ExportedPdf::from)
            .map_err(to_js_error)
    }

    /// Cancel rendering and release the preview document.
    pub fn close(&self) {
        self.inner.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_core::page_model::PageModel;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_check_delta() {
        assert_eq!(check_delta(-90), Ok(-90));
        assert_eq!(check_delta(450), Ok(450));
        assert!(check_delta(45).is_err());
    }

    #[test]
    fn test_load_result_from_outcome() {
        assert_eq!(
            LoadResultJs::from(LoadOutcome::Loaded { page_count: 4 }),
            LoadResultJs {
                loaded: true,
                page_count: 4
            }
        );
        assert!(!LoadResultJs::from(LoadOutcome::Superseded).loaded);
    }

    #[test]
    fn test_page_js_serializes_camel_case() {
        let mut model = PageModel::new(2);
        model.rotate(1, 270).unwrap();
        let pages: Vec<PageJs> = model.pages().iter().map(PageJs::from).collect();
        assert_eq!(
            serde_json::to_value(&pages).unwrap(),
            serde_json::json!([
                { "sourceIndex": 0, "rotation": 0, "keep": true },
                { "sourceIndex": 1, "rotation": 270, "keep": true },
            ])
        );
    }
}
