// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Crop state — the committed crop selection, the layout it was drawn in, and
// the page raster sizes at commit time.
//
// The same state drives the preview (raster clips) and the save (crop
// boxes); both call `physical_clip`, so they cannot disagree.

use std::collections::{BTreeMap, BTreeSet};

use pagecrop_core::error::{EditorError, Result};
use pagecrop_core::{
    CanvasSet, LayoutMode, OverlayRect, PageDimensions, PageGroup, PageReference, PdfRect,
    to_physical_rect,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The rectangles a user commits as a crop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropSelection {
    /// One rectangle for every page (all-pages overlay).
    All(OverlayRect),
    /// Separate rectangles for the odd and even groups; either may be absent.
    Split {
        odd: Option<OverlayRect>,
        even: Option<OverlayRect>,
    },
}

impl CropSelection {
    pub fn layout(&self) -> LayoutMode {
        match self {
            Self::All(_) => LayoutMode::AllOverlay,
            Self::Split { .. } => LayoutMode::OddEvenSplit,
        }
    }
}

/// An active (previewed, not yet saved) crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropState {
    rects: BTreeMap<usize, OverlayRect>,
    layout: LayoutMode,
    page_dims: Vec<Option<PageDimensions>>,
}

impl CropState {
    /// Capture a crop for a document whose pages currently have the raster
    /// sizes in `page_dims` (`None` for pages that are not rendered).
    ///
    /// Zero-area rectangles count as missing. Fails without building any
    /// state when no usable rectangle remains.
    pub fn new(selection: CropSelection, page_dims: Vec<Option<PageDimensions>>) -> Result<Self> {
        let page_count = page_dims.len();
        let valid = |rect: Option<OverlayRect>| rect.filter(OverlayRect::is_valid);

        let rects: BTreeMap<usize, OverlayRect> = match selection {
            CropSelection::All(rect) => {
                let rect = valid(Some(rect))
                    .ok_or_else(|| EditorError::NoSelection("make a selection first".into()))?;
                (0..page_count).map(|index| (index, rect)).collect()
            }
            CropSelection::Split { odd, even } => {
                let (odd, even) = (valid(odd), valid(even));
                if odd.is_none() && even.is_none() {
                    return Err(EditorError::NoSelection(
                        "make at least one selection".into(),
                    ));
                }
                [(PageGroup::Odd, odd), (PageGroup::Even, even)]
                    .into_iter()
                    .filter_map(|(group, rect)| rect.map(|rect| (group, rect)))
                    .flat_map(|(group, rect)| {
                        group.indices(page_count).map(move |index| (index, rect))
                    })
                    .collect()
            }
        };

        debug!(
            layout = ?selection.layout(),
            pages = rects.len(),
            "Crop state captured"
        );
        Ok(Self {
            rects,
            layout: selection.layout(),
            page_dims,
        })
    }

    pub fn layout(&self) -> LayoutMode {
        self.layout
    }

    pub fn rects(&self) -> &BTreeMap<usize, OverlayRect> {
        &self.rects
    }

    pub fn rect_for(&self, index: usize) -> Option<&OverlayRect> {
        self.rects.get(&index)
    }

    pub fn page_dims(&self) -> &[Option<PageDimensions>] {
        &self.page_dims
    }

    /// Canvases as they were when the crop was drawn.
    pub fn canvases(&self) -> CanvasSet {
        CanvasSet::from_pages(self.page_dims.iter().flatten().copied())
    }

    /// Physical-space clip for page `index`, or `None` when the page has no
    /// rectangle or was not rendered at commit time.
    pub fn physical_clip(&self, index: usize, reference: &PageReference) -> Option<PdfRect> {
        self.physical_clip_with(index, reference, &self.canvases())
    }

    /// [`CropState::physical_clip`] for every page; `references` is indexed by
    /// page.
    pub fn physical_clips(&self, references: &[PageReference]) -> Vec<Option<PdfRect>> {
        let canvases = self.canvases();
        references
            .iter()
            .enumerate()
            .map(|(index, reference)| self.physical_clip_with(index, reference, &canvases))
            .collect()
    }

    fn physical_clip_with(
        &self,
        index: usize,
        reference: &PageReference,
        canvases: &CanvasSet,
    ) -> Option<PdfRect> {
        let rect = self.rects.get(&index)?;
        let dims = self.page_dims.get(index).copied().flatten()?;
        Some(to_physical_rect(
            rect,
            dims,
            reference,
            index,
            self.layout,
            canvases,
        ))
    }

    /// Drop the entries of deleted pages and shift the survivors down to their
    /// new indices.
    pub fn reindex_after_delete(&mut self, deleted: &BTreeSet<usize>) {
        let new_index = |old: usize| old - deleted.range(..old).count();

        self.rects = std::mem::take(&mut self.rects)
            .into_iter()
            .filter(|(old, _)| !deleted.contains(old))
            .map(|(old, rect)| (new_index(old), rect))
            .collect();

        self.page_dims = std::mem::take(&mut self.page_dims)
            .into_iter()
            .enumerate()
            .filter(|(old, _)| !deleted.contains(old))
            .map(|(_, dims)| dims)
            .collect();

        debug!(
            deleted = deleted.len(),
            remaining = self.page_dims.len(),
            "Crop state reindexed"
        );
    }
}
