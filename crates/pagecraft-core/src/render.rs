//! Render scheduling
//!
//! Wraps a rasterization engine so that at most one render is live per
//! surface. Every request bumps a generation counter and cancels the token
//! of the render it replaces; a completing render paints only if its
//! generation is still current. Supersession is therefore decided by data,
//! whatever order the engine's futures resolve in.
//!
//! The scheduler is built for single-threaded cooperative use: methods take
//! `&self` so several requests can be pending on one scheduler at once.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::error::{PageCraftError, Result};
use crate::raster::{CancellationToken, PageIndicator, RasterDocument, RasterEngine, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The bitmap was painted and the indicator updated.
    Painted(PageIndicator),
    /// A newer request or a teardown replaced this one; nothing was painted.
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { page_count: u32 },
    /// A newer load (or a close) started before this one finished.
    Superseded,
}

pub struct RenderScheduler<D, S> {
    surface: RefCell<S>,
    document: RefCell<Option<Rc<D>>>,
    generation: Cell<u64>,
    load_generation: Cell<u64>,
    in_flight: RefCell<Option<CancellationToken>>,
    indicator: Cell<Option<PageIndicator>>,
    painted: Cell<bool>,
}

impl<D: RasterDocument, S: Surface> RenderScheduler<D, S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface: RefCell::new(surface),
            document: RefCell::new(None),
            generation: Cell::new(0),
            load_generation: Cell::new(0),
            in_flight: RefCell::new(None),
            indicator: Cell::new(None),
            painted: Cell::new(false),
        }
    }

    pub fn surface(&self) -> Ref<'_, S> {
        self.surface.borrow()
    }

    pub fn indicator(&self) -> Option<PageIndicator> {
        self.indicator.get()
    }

    pub fn page_count(&self) -> Option<u32> {
        self.document.borrow().as_ref().map(|doc| doc.page_count())
    }

    pub fn has_document(&self) -> bool {
        self.document.borrow().is_some()
    }

    /// Open `bytes` with `engine`, replacing the current document.
    ///
    /// Any in-flight render is cancelled up front. The old document stays
    /// loaded until the engine has opened the new one, and is torn down
    /// before the new one is installed. If the engine fails, the old
    /// document and the surface are left as they were.
    pub async fn load<E>(&self, engine: &E, bytes: Vec<u8>) -> Result<LoadOutcome>
    where
        E: RasterEngine<Document = D>,
    {
        let load_generation = self.load_generation.get() + 1;
        self.load_generation.set(load_generation);
        self.supersede();
        self.in_flight.borrow_mut().take();

        let opened = engine.open(bytes).await;
        if self.load_generation.get() != load_generation {
            if let Ok(stale) = opened {
                stale.close();
            }
            debug!(load_generation, "discarding superseded document load");
            return Ok(LoadOutcome::Superseded);
        }

        let document = opened?;
        let page_count = document.page_count();
        self.teardown();
        *self.document.borrow_mut() = Some(Rc::new(document));
        debug!(page_count, "document opened for rendering");
        Ok(LoadOutcome::Loaded { page_count })
    }

    /// Render the 0-based page at `scale` onto the surface.
    ///
    /// Cancellation never surfaces as an error: a replaced request resolves
    /// to [`RenderOutcome::Superseded`]. A failed render leaves the last
    /// painted page in place, or a cleared surface if nothing was painted.
    pub async fn render(&self, page_index: u32, scale: f32) -> Result<RenderOutcome> {
        let document = self
            .document
            .borrow()
            .clone()
            .ok_or(PageCraftError::NoDocumentLoaded)?;
        let total = document.page_count();
        if page_index >= total {
            return Err(PageCraftError::IndexOutOfRange {
                index: page_index as usize,
                len: total as usize,
            });
        }

        let (generation, token) = self.supersede();
        let result = document.render_page(page_index, scale, &token).await;

        if token.is_cancelled() || self.generation.get() != generation {
            debug!(page_index, generation, "discarding superseded render");
            return Ok(RenderOutcome::Superseded);
        }
        self.in_flight.borrow_mut().take();

        match result {
            Ok(bitmap) => {
                let indicator = PageIndicator {
                    current: page_index + 1,
                    total,
                };
                self.surface.borrow_mut().paint(&bitmap, indicator);
                self.painted.set(true);
                self.indicator.set(Some(indicator));
                Ok(RenderOutcome::Painted(indicator))
            }
            Err(e) if e.is_cancellation() => Ok(RenderOutcome::Superseded),
            Err(e) => {
                warn!(page_index, error = %e, "page render failed");
                if !self.painted.get() {
                    self.surface.borrow_mut().clear();
                }
                Err(e)
            }
        }
    }

    /// Cancel any in-flight render, clear the surface and release the
    /// current document.
    pub fn teardown(&self) {
        self.supersede();
        self.in_flight.borrow_mut().take();
        self.surface.borrow_mut().clear();
        self.painted.set(false);
        self.indicator.set(None);
        if let Some(document) = self.document.borrow_mut().take() {
            document.close();
        }
    }

    /// Tear down and also discard any load still in progress.
    pub fn close(&self) {
        self.load_generation.set(self.load_generation.get() + 1);
        self.teardown();
    }

    /// Start a new generation, cancelling the render it replaces.
    fn supersede(&self) -> (u64, CancellationToken) {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        let token = CancellationToken::new();
        if let Some(previous) = self.in_flight.borrow_mut().replace(token.clone()) {
            previous.cancel();
        }
        (generation, token)
    }
}
