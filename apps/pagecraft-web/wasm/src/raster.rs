//! PDF.js-backed rasterization and canvas output
//!
//! The page hands in a small adapter object around PDF.js:
//!
//! ```javascript
//! const backend = {
//!   async open(bytes) {            // bytes: Uint8Array, may be transferred
//!     const doc = await pdfjsLib.getDocument({ data: bytes }).promise;
//!     return {
//!       numPages: doc.numPages,
//!       async render(pageIndex, scale) { /* ... */ return imageData; },
//!       destroy() { doc.destroy(); },
//!     };
//!   },
//! };
//! ```

use async_trait::async_trait;
use js_sys::{Promise, Uint8Array};
use pagecraft_core::error::{PageCraftError, Result};
use pagecraft_core::raster::{
    Bitmap, CancellationToken, PageIndicator, RasterDocument, RasterEngine, Surface,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::{Clamped, JsCast};
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement, ImageData};

#[wasm_bindgen]
extern "C" {
    /// `{ open(bytes: Uint8Array): Promise<RasterHandle> }`
    pub type RasterBackend;

    #[wasm_bindgen(method, catch)]
    fn open(this: &RasterBackend, bytes: Uint8Array) -> std::result::Result<Promise, JsValue>;

    /// One opened document on the JavaScript side.
    pub type RasterHandle;

    #[wasm_bindgen(method, getter, js_name = numPages)]
    fn num_pages(this: &RasterHandle) -> u32;

    #[wasm_bindgen(method, catch)]
    fn render(
        this: &RasterHandle,
        page_index: u32,
        scale: f32,
    ) -> std::result::Result<Promise, JsValue>;

    #[wasm_bindgen(method)]
    fn destroy(this: &RasterHandle);
}

fn js_error(context: &str, err: JsValue) -> String {
    match err.as_string() {
        Some(message) => format!("{}: {}", context, message),
        None => format!("{}: {:?}", context, err),
    }
}

pub struct JsRasterEngine {
    backend: RasterBackend,
}

impl JsRasterEngine {
    pub fn new(backend: RasterBackend) -> Self {
        Self { backend }
    }
}

#[async_trait(?Send)]
impl RasterEngine for JsRasterEngine {
    type Document = JsRasterDocument;

    async fn open(&self, bytes: Vec<u8>) -> Result<JsRasterDocument> {
        // The backend owns this copy; PDF.js may detach it.
        let data = Uint8Array::from(bytes.as_slice());
        drop(bytes);

        let promise = self
            .backend
            .open(data)
            .map_err(|e| PageCraftError::ParseError(js_error("open failed", e)))?;
        let handle = JsFuture::from(promise)
            .await
            .map_err(|e| PageCraftError::ParseError(js_error("open failed", e)))?;

        Ok(JsRasterDocument {
            handle: handle.unchecked_into(),
        })
    }
}

pub struct JsRasterDocument {
    handle: RasterHandle,
}

#[async_trait(?Send)]
impl RasterDocument for JsRasterDocument {
    fn page_count(&self) -> u32 {
        self.handle.num_pages()
    }

    async fn render_page(
        &self,
        page_index: u32,
        scale: f32,
        cancel: &CancellationToken,
    ) -> Result<Bitmap> {
        let promise = self
            .handle
            .render(page_index, scale)
            .map_err(|e| PageCraftError::RenderFailed(js_error("render failed", e)))?;
        let result = JsFuture::from(promise).await;
        if cancel.is_cancelled() {
            return Err(PageCraftError::RenderCancelled);
        }

        let image: ImageData = result
            .map_err(|e| PageCraftError::RenderFailed(js_error("render failed", e)))?
            .dyn_into()
            .map_err(|_| PageCraftError::RenderFailed("render did not return ImageData".into()))?;
        Ok(Bitmap {
            width: image.width(),
            height: image.height(),
            pixels: image.data().0,
        })
    }

    fn close(&self) {
        self.handle.destroy();
    }
}

/// Draws bitmaps onto a canvas and keeps a "Page n of m" label in sync.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    indicator: Option<HtmlElement>,
}

impl CanvasSurface {
    pub fn new(
        canvas: HtmlCanvasElement,
        indicator: Option<HtmlElement>,
    ) -> std::result::Result<Self, JsValue> {
        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("Canvas has no 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            canvas,
            context,
            indicator,
        })
    }

    fn set_label(&self, text: &str) {
        if let Some(indicator) = &self.indicator {
            indicator.set_text_content(Some(text));
        }
    }
}

impl Surface for CanvasSurface {
    fn paint(&mut self, bitmap: &Bitmap, indicator: PageIndicator) {
        self.canvas.set_width(bitmap.width);
        self.canvas.set_height(bitmap.height);
        let drawn = ImageData::new_with_u8_clamped_array_and_sh(
            Clamped(&bitmap.pixels),
            bitmap.width,
            bitmap.height,
        )
        .and_then(|image| self.context.put_image_data(&image, 0.0, 0.0));
        if let Err(e) = drawn {
            web_sys::console::warn_1(&JsValue::from_str(&js_error("paint failed", e)));
            return;
        }
        self.set_label(&format!("Page {} of {}", indicator.current, indicator.total));
    }

    fn clear(&mut self) {
        self.context.clear_rect(
            0.0,
            0.0,
            self.canvas.width() as f64,
            self.canvas.height() as f64,
        );
        self.set_label("");
    }
}
