// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Thumbnail strip view models — one entry per page, in page order.

use std::collections::BTreeSet;

use image::RgbaImage;
use pagecrop_document::RasterProcessor;

/// Columns in the thumbnail grid.
pub const GRID_COLUMNS: usize = 2;

/// One page tile in the thumbnail strip.
#[derive(Debug, Clone)]
pub struct ThumbnailModel {
    pub page_index: usize,
    /// Scaled-down raster, or `None` while the page is not rendered.
    pub image: Option<RgbaImage>,
    /// Marked for deletion.
    pub checked: bool,
    /// Currently shown in the single-page preview.
    pub previewed: bool,
}

impl ThumbnailModel {
    /// 1-based caption shown under the tile.
    pub fn label(&self) -> String {
        format!("Page {}", self.page_index + 1)
    }

    /// `(row, column)` of this tile in the grid.
    pub fn grid_position(&self) -> (usize, usize) {
        (self.page_index / GRID_COLUMNS, self.page_index % GRID_COLUMNS)
    }
}

#[derive(Debug, Clone)]
pub struct ThumbnailStrip {
    items: Vec<ThumbnailModel>,
    max_width: u32,
    max_height: u32,
}

impl ThumbnailStrip {
    pub fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            items: Vec::new(),
            max_width,
            max_height,
        }
    }

    pub fn items(&self) -> &[ThumbnailModel] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace every tile from the current rasters. Check marks are reset.
    pub fn rebuild(&mut self, rasters: &[Option<RgbaImage>], preview: Option<usize>) {
        self.items = rasters
            .iter()
            .enumerate()
            .map(|(page_index, raster)| ThumbnailModel {
                page_index,
                image: raster.as_ref().map(|raster| {
                    RasterProcessor::from_rgba(raster.clone())
                        .thumbnail(self.max_width, self.max_height)
                        .into_rgba()
                }),
                checked: false,
                previewed: preview == Some(page_index),
            })
            .collect();
    }

    /// Set the check mark of page `index`; false when there is no such page.
    pub fn set_checked(&mut self, index: usize, checked: bool) -> bool {
        match self.items.get_mut(index) {
            Some(item) => {
                item.checked = checked;
                true
            }
            None => false,
        }
    }

    pub fn checked_pages(&self) -> BTreeSet<usize> {
        self.items
            .iter()
            .filter(|item| item.checked)
            .map(|item| item.page_index)
            .collect()
    }

    pub fn set_preview(&mut self, preview: Option<usize>) {
        for item in &mut self.items {
            item.previewed = preview == Some(item.page_index);
        }
    }
}
