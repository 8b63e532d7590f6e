// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Editor session — the single owner of document, rasters, crop, undo and view
// state.
//
// The session is synchronous. Operations that need pages re-rendered return a
// `RenderRequest`; the caller runs it (see `Editor`) and feeds every outcome
// back through `accept`. While a batch is pending, or a save is in flight, the
// session is busy and refuses mutations.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::RgbaImage;
use pagecrop_core::error::{EditorError, Result};
use pagecrop_core::{
    CanvasSet, DocumentPhase, EditorConfig, LayoutMode, OverlayRect, PageDimensions, PageGroup,
    PageReference, PdfRect, Rgb, SaveOptions, to_physical_rect,
};
use pagecrop_document::{OverlayGroup, PdfContainer, RasterProcessor, sample_color};
use tracing::{debug, info, instrument, warn};

use crate::crop::{CropSelection, CropState};
use crate::overlay::{OverlayCache, OverlayFrame};
use crate::save::SaveReport;
use crate::scheduler::{PageRenderOutcome, RenderJob, RenderRequest};
use crate::selection::{SelectionSync, ViewKind, ViewUpdate};
use crate::thumbnails::ThumbnailStrip;
use crate::undo::{Snapshot, UndoStack};

/// Pages a whiteout is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteoutTarget {
    /// One previewed page, mapped through its own (single-layout) canvas.
    Page(usize),
    /// Every page, through the all-pages canvas.
    All,
    /// One parity group, through its split-layout canvas.
    Group(PageGroup),
}

/// Result of feeding one render outcome to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchProgress {
    /// The outcome belongs to a superseded batch, or repeats a page that
    /// already reported. Ignored.
    Stale,
    /// Recorded; `remaining` pages are still outstanding.
    InProgress { remaining: usize },
    /// The last expected page reported.
    Complete(BatchSummary),
}

/// Totals for a finished render batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub generation: u64,
    pub rendered: usize,
    /// `(page_index, detail)` for each page that failed.
    pub failed: Vec<(usize, String)>,
}

/// Outcome of [`EditorSession::reset_crop`].
#[derive(Debug)]
pub enum ResetOutcome {
    /// No crop was active; nothing changed.
    NothingToReset,
    /// The crop was cleared; the pages must be re-rendered.
    Reset(RenderRequest),
}

/// Outcome of a page deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    /// Deleted indices (as they were before deletion), ascending.
    pub deleted: Vec<usize>,
    pub remaining: usize,
}

/// Everything a save worker needs, detached from the session.
#[derive(Debug, Clone)]
pub struct SaveJob {
    pub pdf: Vec<u8>,
    /// Physical crop box per page; empty when no crop is active.
    pub clips: Vec<Option<PdfRect>>,
    pub path: PathBuf,
    pub options: SaveOptions,
}

/// State of one editing session.
#[derive(Debug)]
pub struct EditorSession {
    config: EditorConfig,
    container: Option<PdfContainer>,
    references: Vec<PageReference>,
    rasters: Vec<Option<RgbaImage>>,
    failures: BTreeMap<usize, String>,
    pending: BTreeSet<usize>,
    generation: u64,
    crop: Option<CropState>,
    undo: UndoStack,
    selection: SelectionSync,
    thumbnails: ThumbnailStrip,
    overlays: OverlayCache,
    layout: LayoutMode,
    preview: Option<usize>,
    fill_color: Rgb,
    phase: DocumentPhase,
    saving: bool,
    last_saved: Option<DateTime<Utc>>,
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        let undo = UndoStack::new(config.undo_depth);
        let thumbnails = ThumbnailStrip::new(config.thumbnail_width, config.thumbnail_height);
        let fill_color = config.fill_color;
        let layout = initial_layout(&config);
        Self {
            config,
            container: None,
            references: Vec::new(),
            rasters: Vec::new(),
            failures: BTreeMap::new(),
            pending: BTreeSet::new(),
            generation: 0,
            crop: None,
            undo,
            selection: SelectionSync::new(),
            thumbnails,
            overlays: OverlayCache::new(),
            layout,
            preview: None,
            fill_color,
            phase: DocumentPhase::NoDocument,
            saving: false,
            last_saved: None,
        }
    }

    // -- Accessors -------------------------------------------------------------

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Adjust settings that are read per operation (zoom, save destination
    /// and options). Undo depth and thumbnail size are fixed at construction.
    pub fn config_mut(&mut self) -> &mut EditorConfig {
        &mut self.config
    }

    pub fn document(&self) -> Option<&PdfContainer> {
        self.container.as_ref()
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.container.as_ref().and_then(PdfContainer::source_path)
    }

    pub fn page_count(&self) -> usize {
        self.rasters.len()
    }

    pub fn references(&self) -> &[PageReference] {
        &self.references
    }

    /// Current page rasters; `None` for pages not (yet) rendered.
    pub fn rasters(&self) -> &[Option<RgbaImage>] {
        &self.rasters
    }

    /// Pages whose last render failed, with the failure detail.
    pub fn failures(&self) -> &BTreeMap<usize, String> {
        &self.failures
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn crop_state(&self) -> Option<&CropState> {
        self.crop.as_ref()
    }

    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo
    }

    pub fn thumbnails(&self) -> &ThumbnailStrip {
        &self.thumbnails
    }

    /// Mutable access for check-box toggles.
    pub fn thumbnails_mut(&mut self) -> &mut ThumbnailStrip {
        &mut self.thumbnails
    }

    pub fn layout(&self) -> LayoutMode {
        self.layout
    }

    pub fn preview(&self) -> Option<usize> {
        self.preview
    }

    pub fn fill_color(&self) -> Rgb {
        self.fill_color
    }

    pub fn set_fill_color(&mut self, color: Rgb) {
        debug!(%color, "Fill color set");
        self.fill_color = color;
    }

    pub fn phase(&self) -> DocumentPhase {
        self.phase
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// A render batch is outstanding or a save is running.
    pub fn is_busy(&self) -> bool {
        self.saving || !self.pending.is_empty()
    }

    pub fn is_rendering(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn selection(&self, view: ViewKind) -> Option<OverlayRect> {
        self.selection.get(view)
    }

    /// The user drew or cleared a selection on `view`.
    pub fn selection_changed(
        &mut self,
        view: ViewKind,
        rect: Option<OverlayRect>,
    ) -> Vec<ViewUpdate> {
        self.selection.selection_changed(view, rect)
    }

    /// The view whose selection drives the visible layout: the primary view
    /// while previewing or in the all-pages overlay, the odd half otherwise.
    pub fn main_view(&self) -> ViewKind {
        if self.preview.is_none() && self.layout == LayoutMode::OddEvenSplit {
            ViewKind::Odd
        } else {
            ViewKind::Primary
        }
    }

    // -- Opening ---------------------------------------------------------------

    /// Open the document at `path` and request the first render.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn open_path(&mut self, path: impl AsRef<Path>) -> Result<RenderRequest> {
        self.ensure_not_saving()?;
        let container = PdfContainer::open(path.as_ref())?;
        self.install(container)
    }

    /// Open an in-memory document. `source` names the file it came from, for
    /// save-path resolution.
    #[instrument(skip(self, bytes), fields(bytes_len = bytes.len()))]
    pub fn open_bytes(&mut self, bytes: &[u8], source: Option<PathBuf>) -> Result<RenderRequest> {
        self.ensure_not_saving()?;
        let mut container = PdfContainer::from_bytes(bytes)?;
        if let Some(source) = source {
            container = container.with_source_path(source);
        }
        self.install(container)
    }

    fn install(&mut self, container: PdfContainer) -> Result<RenderRequest> {
        let page_count = container.page_count();
        self.container = Some(container);
        self.crop = None;
        self.undo.clear();
        self.preview = None;
        self.selection.clear();
        self.layout = initial_layout(&self.config);
        self.phase = DocumentPhase::Loaded;
        info!(page_count, layout = self.layout.label(), "Document opened");
        self.begin_render()
    }

    // -- Rendering -------------------------------------------------------------

    /// Re-render every page with the current crop applied.
    pub fn reload(&mut self) -> Result<RenderRequest> {
        self.ensure_not_saving()?;
        self.begin_render()
    }

    /// Start a new render batch for every page, superseding any batch still in
    /// flight.
    fn begin_render(&mut self) -> Result<RenderRequest> {
        let container = self.container.as_ref().ok_or(EditorError::NoDocument)?;
        let pdf = container.snapshot()?;
        let references = container.page_references()?;
        let clips = match &self.crop {
            Some(crop) => crop.physical_clips(&references),
            None => vec![None; references.len()],
        };

        self.generation += 1;
        let jobs: Vec<RenderJob> = references
            .iter()
            .zip(clips)
            .enumerate()
            .map(|(page_index, (reference, clip))| RenderJob {
                page_index,
                reference: *reference,
                clip,
            })
            .collect();

        self.rasters = vec![None; references.len()];
        self.references = references;
        self.failures.clear();
        self.pending = (0..jobs.len()).collect();
        self.overlays.invalidate();
        self.thumbnails.rebuild(&self.rasters, self.preview);

        debug!(
            generation = self.generation,
            pages = jobs.len(),
            cropped = self.crop.is_some(),
            "Render batch requested"
        );
        Ok(RenderRequest {
            generation: self.generation,
            pdf: Arc::new(pdf),
            zoom: self.config.render_zoom,
            jobs,
        })
    }

    /// Record one page's render outcome.
    ///
    /// Outcomes may arrive in any order. Dependent views (overlays,
    /// thumbnails) are rebuilt once, when the last expected page reports.
    pub fn accept(&mut self, outcome: PageRenderOutcome) -> BatchProgress {
        if outcome.generation != self.generation || !self.pending.remove(&outcome.page_index) {
            debug!(
                generation = outcome.generation,
                current = self.generation,
                page_index = outcome.page_index,
                "Stale render result dropped"
            );
            return BatchProgress::Stale;
        }

        match outcome.result {
            Ok(image) => {
                if let Some(slot) = self.rasters.get_mut(outcome.page_index) {
                    *slot = Some(image);
                }
            }
            Err(err) => {
                warn!(page_index = outcome.page_index, %err, "Page render failed");
                self.failures.insert(outcome.page_index, err.to_string());
            }
        }

        if !self.pending.is_empty() {
            return BatchProgress::InProgress {
                remaining: self.pending.len(),
            };
        }

        self.overlays.invalidate();
        self.thumbnails.rebuild(&self.rasters, self.preview);
        let summary = BatchSummary {
            generation: self.generation,
            rendered: self.rasters.iter().flatten().count(),
            failed: self
                .failures
                .iter()
                .map(|(index, detail)| (*index, detail.clone()))
                .collect(),
        };
        info!(
            generation = summary.generation,
            rendered = summary.rendered,
            failed = summary.failed.len(),
            "Render batch complete"
        );
        BatchProgress::Complete(summary)
    }

    // -- Views -----------------------------------------------------------------

    /// Switch between the all-pages overlay and the odd/even split, carrying
    /// the selection of the outgoing main view over to the incoming one.
    ///
    /// Single layout is entered through [`EditorSession::toggle_preview`]
    /// only; asking for it here changes nothing.
    pub fn set_layout(&mut self, layout: LayoutMode) -> Vec<ViewUpdate> {
        if layout == LayoutMode::Single {
            warn!("Single layout is entered by previewing a page");
            return Vec::new();
        }
        if layout == self.layout {
            return Vec::new();
        }
        let carried = self.selection.get(self.main_view());
        self.layout = layout;
        info!(layout = layout.label(), "Layout changed");
        let target = self.main_view();
        self.selection.set_selection(target, carried)
    }

    /// Preview page `page_index` on its own, or leave the preview when it is
    /// already the previewed page.
    pub fn toggle_preview(&mut self, page_index: usize) -> Result<Vec<ViewUpdate>> {
        self.ensure_idle()?;
        let count = self.page_count();
        if page_index >= count {
            return Err(EditorError::PageOutOfRange {
                index: page_index,
                count,
            });
        }

        let carried = self.selection.get(self.main_view());
        self.preview = if self.preview == Some(page_index) {
            None
        } else {
            Some(page_index)
        };
        self.thumbnails.set_preview(self.preview);
        debug!(preview = ?self.preview, "Preview toggled");

        let target = self.main_view();
        Ok(self.selection.set_selection(target, carried))
    }

    /// What the overlay area shows right now, or `None` while a batch is
    /// rendering or nothing is available.
    pub fn overlay_frame(&mut self) -> Option<OverlayFrame<'_>> {
        if self.container.is_none() || !self.pending.is_empty() {
            return None;
        }

        if let Some(page_index) = self.preview {
            return self
                .rasters
                .get(page_index)?
                .as_ref()
                .map(|image| OverlayFrame::Preview { page_index, image });
        }

        match self.layout {
            LayoutMode::OddEvenSplit => {
                self.overlays.ensure(OverlayGroup::Odd, &self.rasters);
                self.overlays.ensure(OverlayGroup::Even, &self.rasters);
                let odd = self.overlays.get(OverlayGroup::Odd);
                let even = self.overlays.get(OverlayGroup::Even);
                if odd.is_none() && even.is_none() {
                    None
                } else {
                    Some(OverlayFrame::Split { odd, even })
                }
            }
            LayoutMode::AllOverlay | LayoutMode::Single => {
                self.overlays.ensure(OverlayGroup::All, &self.rasters);
                self.overlays.get(OverlayGroup::All).map(OverlayFrame::All)
            }
        }
    }

    /// Sample the color under `(x, y)` on `view` and make it the fill color.
    ///
    /// Returns `None`, leaving the fill color alone, when the view shows
    /// nothing at that point (outside the image or on a transparent canvas
    /// margin).
    pub fn pick_color(&mut self, view: ViewKind, x: u32, y: u32) -> Option<Rgb> {
        let color = {
            let frame = self.overlay_frame()?;
            let image = match (frame, view) {
                (OverlayFrame::Preview { image, .. }, ViewKind::Primary) => image,
                (OverlayFrame::All(composite), ViewKind::Primary) => &composite.image,
                (OverlayFrame::Split { odd, .. }, ViewKind::Odd) => &odd?.image,
                (OverlayFrame::Split { even, .. }, ViewKind::Even) => &even?.image,
                _ => return None,
            };
            sample_color(image, x, y)?
        };
        info!(%color, x, y, "Fill color picked");
        self.fill_color = color;
        Some(color)
    }

    /// Write the current overlay as PNG. A split layout writes one file per
    /// non-empty half, suffixed `_odd` and `_even`.
    pub fn export_overlay(&mut self, path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        self.ensure_not_saving()?;
        if self.container.is_none() {
            return Err(EditorError::NoDocument);
        }
        if self.is_rendering() {
            return Err(EditorError::Busy);
        }
        let path = path.as_ref();
        let frame = self
            .overlay_frame()
            .ok_or_else(|| EditorError::Image("no rendered pages to export".into()))?;

        let outputs: Vec<(PathBuf, &RgbaImage)> = match frame {
            OverlayFrame::Preview { image, .. } => vec![(path.to_path_buf(), image)],
            OverlayFrame::All(composite) => vec![(path.to_path_buf(), &composite.image)],
            OverlayFrame::Split { odd, even } => [("odd", odd), ("even", even)]
                .into_iter()
                .filter_map(|(suffix, composite)| {
                    composite.map(|composite| (suffixed(path, suffix), &composite.image))
                })
                .collect(),
        };

        let mut written = Vec::with_capacity(outputs.len());
        for (target, image) in outputs {
            RasterProcessor::from_rgba(image.clone()).save(&target)?;
            written.push(target);
        }
        info!(files = written.len(), "Overlay exported");
        Ok(written)
    }

    // -- Edit operations -------------------------------------------------------

    /// Commit the selection of the visible layout as a crop.
    ///
    /// Refused while a page is previewed: the preview canvas holds one page,
    /// so its selection has no position on the shared crop canvases.
    pub fn crop(&mut self) -> Result<RenderRequest> {
        if let Some(page) = self.preview {
            return Err(EditorError::PreviewActive {
                page,
                operation: "cropping",
            });
        }
        let selection = match self.layout {
            LayoutMode::OddEvenSplit => CropSelection::Split {
                odd: self.selection.get(ViewKind::Odd),
                even: self.selection.get(ViewKind::Even),
            },
            _ => CropSelection::All(
                self.selection
                    .get(ViewKind::Primary)
                    .ok_or_else(|| EditorError::NoSelection("make a selection first".into()))?,
            ),
        };
        self.crop_with(selection)
    }

    /// Commit `selection` as the crop and request a clipped re-render.
    #[instrument(skip(self), fields(layout = ?selection.layout()))]
    pub fn crop_with(&mut self, selection: CropSelection) -> Result<RenderRequest> {
        self.ensure_idle()?;
        if self.container.is_none() {
            return Err(EditorError::NoDocument);
        }
        if self.crop.is_some() {
            return Err(EditorError::CropActive {
                operation: "cropping again",
            });
        }

        let state = CropState::new(selection, self.raster_dims())?;
        info!(pages = state.rects().len(), "Crop committed");
        self.crop = Some(state);
        self.phase = DocumentPhase::Cropped;
        self.begin_render()
    }

    /// Drop the active crop and request an unclipped re-render.
    pub fn reset_crop(&mut self) -> Result<ResetOutcome> {
        self.ensure_idle()?;
        if self.container.is_none() {
            return Err(EditorError::NoDocument);
        }
        if self.crop.take().is_none() {
            info!("No crop is active");
            return Ok(ResetOutcome::NothingToReset);
        }
        self.phase = DocumentPhase::Loaded;
        info!("Crop reset");
        Ok(ResetOutcome::Reset(self.begin_render()?))
    }

    /// The pages a whiteout drawn on `view` applies to.
    pub fn whiteout_target(&self, view: ViewKind) -> WhiteoutTarget {
        match (view, self.preview) {
            (ViewKind::Primary, Some(page_index)) => WhiteoutTarget::Page(page_index),
            (ViewKind::Primary, None) => WhiteoutTarget::All,
            (ViewKind::Odd, _) => WhiteoutTarget::Group(PageGroup::Odd),
            (ViewKind::Even, _) => WhiteoutTarget::Group(PageGroup::Even),
        }
    }

    /// A whiteout rectangle was drawn on `view`.
    pub fn whiteout_requested(&mut self, view: ViewKind, rect: OverlayRect) -> Result<RenderRequest> {
        let target = self.whiteout_target(view);
        self.whiteout(target, rect)
    }

    /// Fill `rect` with the fill color on every page of `target`.
    ///
    /// Pages without a raster are skipped: there is no canvas to map the
    /// rectangle through.
    #[instrument(skip(self), fields(color = %self.fill_color))]
    pub fn whiteout(&mut self, target: WhiteoutTarget, rect: OverlayRect) -> Result<RenderRequest> {
        self.ensure_idle()?;
        if self.container.is_none() {
            return Err(EditorError::NoDocument);
        }
        if self.crop.is_some() {
            return Err(EditorError::CropActive {
                operation: "applying a whiteout",
            });
        }
        if !rect.is_valid() {
            return Err(EditorError::NoSelection("draw a whiteout rectangle".into()));
        }

        let page_count = self.page_count();
        let (indices, layout): (Vec<usize>, LayoutMode) = match target {
            WhiteoutTarget::Page(index) if index >= page_count => {
                return Err(EditorError::PageOutOfRange {
                    index,
                    count: page_count,
                });
            }
            WhiteoutTarget::Page(index) => (vec![index], LayoutMode::Single),
            WhiteoutTarget::All => ((0..page_count).collect(), LayoutMode::AllOverlay),
            WhiteoutTarget::Group(group) => {
                (group.indices(page_count).collect(), LayoutMode::OddEvenSplit)
            }
        };

        let dims = self.raster_dims();
        let canvases = CanvasSet::from_pages(dims.iter().flatten().copied());
        let fills: Vec<(usize, PdfRect)> = indices
            .into_iter()
            .filter_map(|index| match (dims.get(index).copied().flatten(), self.references.get(index)) {
                (Some(page), Some(reference)) => Some((
                    index,
                    to_physical_rect(&rect, page, reference, index, layout, &canvases),
                )),
                _ => {
                    warn!(page_index = index, "Page has no raster, whiteout skipped");
                    None
                }
            })
            .collect();
        if fills.is_empty() {
            return Err(EditorError::NoSelection(
                "draw the whiteout on a view with rendered pages".into(),
            ));
        }

        let container = self.container.as_mut().ok_or(EditorError::NoDocument)?;
        let snapshot = Snapshot::new("whiteout", container.snapshot()?);
        let original = container.clone();

        for (index, physical) in &fills {
            if let Err(err) = container.draw_filled_rect(*index, physical, self.fill_color) {
                warn!(page_index = index, %err, "Whiteout failed, document rolled back");
                *container = original;
                return Err(err);
            }
        }

        self.undo.push(snapshot);
        self.phase = DocumentPhase::WhitedOut;
        info!(pages = fills.len(), ?target, "Whiteout applied");
        self.begin_render()
    }

    /// Delete the checked thumbnails' pages.
    pub fn delete_checked(&mut self) -> Result<DeleteReport> {
        let checked = self.thumbnails.checked_pages();
        self.delete_pages(&checked)
    }

    /// Delete `indices` from the document.
    ///
    /// Rasters, references and the active crop are shifted in lockstep, so
    /// no re-render is needed.
    #[instrument(skip(self), fields(count = indices.len()))]
    pub fn delete_pages(&mut self, indices: &BTreeSet<usize>) -> Result<DeleteReport> {
        if self.container.is_none() {
            return Err(EditorError::NoDocument);
        }
        if indices.is_empty() {
            return Err(EditorError::NoPagesSelected);
        }
        self.ensure_idle()?;

        let container = self.container.as_mut().ok_or(EditorError::NoDocument)?;
        let count = container.page_count();
        if let Some(&index) = indices.iter().find(|&&index| index >= count) {
            return Err(EditorError::PageOutOfRange { index, count });
        }
        let snapshot = Snapshot::new("delete pages", container.snapshot()?);
        let original = container.clone();

        for &index in indices.iter().rev() {
            if let Err(err) = container.delete_page(index) {
                warn!(page_index = index, %err, "Page deletion failed, document rolled back");
                *container = original;
                return Err(err);
            }
        }
        self.undo.push(snapshot);

        for &index in indices.iter().rev() {
            if index < self.rasters.len() {
                self.rasters.remove(index);
            }
            if index < self.references.len() {
                self.references.remove(index);
            }
        }
        self.failures = std::mem::take(&mut self.failures)
            .into_iter()
            .filter_map(|(index, detail)| shifted_index(index, indices).map(|i| (i, detail)))
            .collect();
        if let Some(crop) = self.crop.as_mut() {
            crop.reindex_after_delete(indices);
        }
        self.preview = self.preview.and_then(|index| shifted_index(index, indices));
        self.overlays.invalidate();
        self.thumbnails.rebuild(&self.rasters, self.preview);
        self.phase = DocumentPhase::PagesDeleted;

        let report = DeleteReport {
            deleted: indices.iter().copied().collect(),
            remaining: self.rasters.len(),
        };
        info!(deleted = ?report.deleted, remaining = report.remaining, "Pages deleted");
        Ok(report)
    }

    /// Restore the most recent snapshot. Clears the crop and re-renders.
    #[instrument(skip(self))]
    pub fn undo(&mut self) -> Result<RenderRequest> {
        self.ensure_idle()?;
        if self.container.is_none() {
            return Err(EditorError::NoDocument);
        }
        let snapshot = self.undo.pop()?;
        let label = snapshot.label.clone();
        let bytes = snapshot.into_bytes()?;

        let mut container = match PdfContainer::from_bytes(&bytes) {
            Ok(container) => container,
            Err(err) => {
                self.undo.push(Snapshot::new(label, bytes));
                return Err(err);
            }
        };
        if let Some(source) = self.source_path() {
            container = container.with_source_path(source.to_path_buf());
        }

        let page_count = container.page_count();
        self.container = Some(container);
        self.crop = None;
        self.preview = self.preview.filter(|&index| index < page_count);
        self.phase = DocumentPhase::Loaded;
        info!(%label, remaining = self.undo.len(), "Undo applied");
        self.begin_render()
    }

    // -- Saving ----------------------------------------------------------------

    /// Detach a save of the current document to `path`, or to the configured
    /// destination when `path` is `None`. The session stays busy until
    /// [`EditorSession::finish_save`].
    pub fn begin_save(&mut self, path: Option<PathBuf>) -> Result<SaveJob> {
        self.ensure_idle()?;
        let container = self.container.as_ref().ok_or(EditorError::NoDocument)?;
        let path = path
            .or_else(|| self.config.resolve_save_path(container.source_path()))
            .ok_or_else(|| {
                EditorError::Save("no destination given and no save directory configured".into())
            })?;
        let pdf = container.snapshot()?;
        let clips = match &self.crop {
            Some(crop) => crop.physical_clips(&self.references),
            None => Vec::new(),
        };

        self.saving = true;
        debug!(path = %path.display(), cropped = clips.iter().flatten().count(), "Save started");
        Ok(SaveJob {
            pdf,
            clips,
            path,
            options: self.config.save_options(),
        })
    }

    /// Record the result of a save started with [`EditorSession::begin_save`].
    pub fn finish_save(&mut self, result: &Result<SaveReport>) {
        self.saving = false;
        match result {
            Ok(report) => {
                self.last_saved = Some(report.saved_at);
                info!(path = %report.path.display(), bytes = report.bytes_written, "PDF saved");
            }
            Err(err) => warn!(%err, "Save failed"),
        }
    }

    // -- Internal --------------------------------------------------------------

    fn raster_dims(&self) -> Vec<Option<PageDimensions>> {
        self.rasters
            .iter()
            .map(|raster| {
                raster
                    .as_ref()
                    .map(|image| PageDimensions::new(image.width(), image.height()))
            })
            .collect()
    }

    fn ensure_not_saving(&self) -> Result<()> {
        if self.saving {
            return Err(EditorError::Busy);
        }
        Ok(())
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.is_busy() {
            return Err(EditorError::Busy);
        }
        Ok(())
    }
}

/// Layout used after opening: the configured default, or the all-pages
/// overlay when the default is the preview-only single layout.
fn initial_layout(config: &EditorConfig) -> LayoutMode {
    match config.default_layout {
        LayoutMode::Single => LayoutMode::AllOverlay,
        layout => layout,
    }
}

/// New position of `index` after `deleted` were removed, or `None` when it
/// was deleted itself.
fn shifted_index(index: usize, deleted: &BTreeSet<usize>) -> Option<usize> {
    if deleted.contains(&index) {
        return None;
    }
    Some(index - deleted.range(..index).count())
}

/// `dir/stem_suffix.ext` for `path = dir/stem.ext`.
fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "overlay".into());
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{suffix}"),
    };
    path.with_file_name(name)
}
