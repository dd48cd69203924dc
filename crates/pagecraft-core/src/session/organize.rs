//! Organize flow: page model editing, preview rendering and re-export.

use std::cell::{Ref, RefCell, RefMut};

use tracing::{debug, warn};

use crate::builder::{BuiltDocument, DocumentBuilder};
use crate::config::PageCraftConfig;
use crate::error::{PageCraftError, Result};
use crate::filename::sanitize_filename;
use crate::normalize::{normalize, PdfBytes};
use crate::page_model::{Direction, PageModel, ProjectedPage, Rotation};
use crate::pipeline::export_projection;
use crate::raster::{PageIndicator, RasterEngine, Surface};
use crate::render::{LoadOutcome, RenderOutcome, RenderScheduler};
use crate::session::{ActionLog, ExportedFile, PageAction, StatusReporter};

struct LoadedSource<D> {
    name: String,
    document: D,
}

/// Page model plus the builder-side copy of the loaded document.
pub struct Organizer<B: DocumentBuilder> {
    builder: B,
    source: Option<LoadedSource<B::Document>>,
    pages: PageModel,
    log: ActionLog,
    status: StatusReporter,
    default_filename: String,
}

impl<B: DocumentBuilder> Organizer<B> {
    pub fn new(builder: B, config: &PageCraftConfig) -> Self {
        Self {
            builder,
            source: None,
            pages: PageModel::default(),
            log: ActionLog::new(),
            status: StatusReporter::new(),
            default_filename: config.output.organize_filename.clone(),
        }
    }

    /// Normalize and load raw bytes; returns the page count.
    pub fn load(&mut self, name: &str, bytes: &[u8]) -> Result<u32> {
        let normalized = self.report(normalize(bytes))?;
        self.load_normalized(name, normalized)
    }

    pub fn load_normalized(&mut self, name: &str, bytes: PdfBytes) -> Result<u32> {
        self.status.working(format!("Loading {}...", name));
        let document = self.report(self.builder.load(bytes.into_inner()))?;
        let page_count = document.page_count();
        self.install(name, document, page_count);
        Ok(page_count)
    }

    /// Parse a builder-side copy without touching the current state.
    fn open(&self, bytes: PdfBytes) -> Result<B::Document> {
        self.report(self.builder.load(bytes.into_inner()))
    }

    /// Replace the loaded document and start a fresh page model.
    fn install(&mut self, name: &str, document: B::Document, page_count: u32) {
        self.source = Some(LoadedSource {
            name: name.to_string(),
            document,
        });
        self.pages.load(page_count);
        self.log.record(PageAction::Load {
            name: name.to_string(),
            page_count,
        });
        self.status
            .ready(format!("Loaded {} ({} pages)", name, page_count));
    }

    pub fn move_adjacent(&mut self, index: usize, direction: Direction) -> Result<bool> {
        let moved = self.pages.move_adjacent(index, direction)?;
        if moved {
            self.log
                .record(PageAction::MoveAdjacent { index, direction });
        }
        Ok(moved)
    }

    pub fn move_to(&mut self, from: usize, to: usize) -> bool {
        let moved = self.pages.move_to(from, to);
        if moved {
            self.log.record(PageAction::MoveTo { from, to });
        }
        moved
    }

    /// # Panics
    ///
    /// Panics if `delta` is not a multiple of 90.
    pub fn rotate(&mut self, index: usize, delta: i32) -> Result<Rotation> {
        let rotation = self.pages.rotate(index, delta)?;
        self.log.record(PageAction::Rotate { index, delta });
        Ok(rotation)
    }

    pub fn toggle_keep(&mut self, index: usize) -> Result<bool> {
        let keep = self.pages.toggle_keep(index)?;
        self.log.record(PageAction::ToggleKeep { index });
        Ok(keep)
    }

    pub fn pages(&self) -> &PageModel {
        &self.pages
    }

    pub fn project(&self) -> Vec<ProjectedPage> {
        self.pages.project()
    }

    pub fn actions(&self) -> &ActionLog {
        &self.log
    }

    pub fn status(&self) -> &StatusReporter {
        &self.status
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source.as_ref().map(|s| s.name.as_str())
    }

    /// Export the current projection under `filename` (or the default name).
    pub fn export(&self, filename: Option<&str>) -> Result<ExportedFile> {
        self.status.working("Building document...");
        let source = self.report(
            self.source
                .as_ref()
                .ok_or(PageCraftError::NoDocumentLoaded),
        )?;
        let bytes = self.report(export_projection(
            &self.builder,
            &source.document,
            &self.pages.project(),
        ))?;

        let filename = sanitize_filename(filename.unwrap_or(""), &self.default_filename);
        self.status.ready(format!("Exported {}", filename));
        Ok(ExportedFile { filename, bytes })
    }

    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.status.failed(e);
        }
        result
    }
}

/// Organize session: an [`Organizer`] plus a preview renderer.
///
/// Loading forks the normalized bytes so the builder and the rasterization
/// engine each consume their own copy.
pub struct OrganizeSession<B, E, S>
where
    B: DocumentBuilder,
    E: RasterEngine,
{
    organizer: RefCell<Organizer<B>>,
    engine: E,
    renderer: RenderScheduler<E::Document, S>,
    preview_scale: f32,
}

impl<B, E, S> OrganizeSession<B, E, S>
where
    B: DocumentBuilder,
    E: RasterEngine,
    S: Surface,
{
    pub fn new(builder: B, engine: E, surface: S, config: &PageCraftConfig) -> Self {
        Self {
            organizer: RefCell::new(Organizer::new(builder, config)),
            engine,
            renderer: RenderScheduler::new(surface),
            preview_scale: config.render.preview_scale,
        }
    }

    pub fn organizer(&self) -> Ref<'_, Organizer<B>> {
        self.organizer.borrow()
    }

    /// Mutable access for page gestures. Do not hold across an `.await`.
    pub fn organizer_mut(&self) -> RefMut<'_, Organizer<B>> {
        self.organizer.borrow_mut()
    }

    pub fn renderer(&self) -> &RenderScheduler<E::Document, S> {
        &self.renderer
    }

    /// Load a new document, replacing the current one once the engine has
    /// opened it. A load overtaken by a newer one resolves to `Superseded`
    /// and changes nothing.
    pub async fn load(&self, name: &str, bytes: &[u8]) -> Result<LoadOutcome> {
        let (for_builder, for_renderer) = {
            let organizer = self.organizer.borrow();
            organizer.status().working(format!("Loading {}...", name));
            let normalized = organizer.report(normalize(bytes))?;
            let for_renderer = normalized.fork();
            (organizer.open(normalized)?, for_renderer)
        };

        let outcome = match self
            .renderer
            .load(&self.engine, for_renderer.into_inner())
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                self.organizer.borrow().status().failed(&e);
                return Err(e);
            }
        };

        if let LoadOutcome::Loaded { page_count } = outcome {
            let builder_pages = for_builder.page_count();
            if builder_pages != page_count {
                warn!(
                    renderer = page_count,
                    builder = builder_pages,
                    "engines disagree on page count"
                );
            }
            self.organizer
                .borrow_mut()
                .install(name, for_builder, page_count);
        } else {
            debug!(name, "load superseded");
        }
        Ok(outcome)
    }

    pub async fn render(&self, page_index: u32, scale: f32) -> Result<RenderOutcome> {
        let result = self.renderer.render(page_index, scale).await;
        if let Err(e) = &result {
            self.organizer.borrow().status().failed(e);
        }
        result
    }

    /// Render at the configured preview scale.
    pub async fn render_preview(&self, page_index: u32) -> Result<RenderOutcome> {
        self.render(page_index, self.preview_scale).await
    }

    pub fn indicator(&self) -> Option<PageIndicator> {
        self.renderer.indicator()
    }

    pub fn export(&self, filename: Option<&str>) -> Result<ExportedFile> {
        self.organizer.borrow().export(filename)
    }

    /// Close the view: cancel rendering and release the engine's document.
    /// A load still in progress resolves to `Superseded`.
    pub fn close(&self) {
        self.renderer.close();
        self.organizer.borrow().status().idle();
    }
}
