// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Draft rasterizer — paints each page as a sheet of paper with a border,
// sized exactly as a full renderer would size it. No content is drawn.

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use pagecrop_core::error::Result;
use tracing::{debug, instrument};

use super::Rasterizer;
use crate::pdf::PdfContainer;

/// Geometry-only rasterizer for headless runs and tests.
#[derive(Debug, Clone, Copy)]
pub struct DraftRasterizer {
    pub paper: Rgba<u8>,
    pub border: Rgba<u8>,
}

impl Default for DraftRasterizer {
    fn default() -> Self {
        Self {
            paper: Rgba([255, 255, 255, 255]),
            border: Rgba([96, 96, 96, 255]),
        }
    }
}

impl Rasterizer for DraftRasterizer {
    fn name(&self) -> &'static str {
        "draft"
    }

    #[instrument(skip(self, pdf), fields(bytes_len = pdf.len()))]
    fn rasterize(&self, pdf: &[u8], page_index: usize, zoom: f32) -> Result<RgbaImage> {
        let container = PdfContainer::from_bytes(pdf)?;
        let dims = container.page_reference(page_index)?.pixel_dims(zoom);

        let mut image = RgbaImage::from_pixel(dims.width, dims.height, self.paper);
        draw_hollow_rect_mut(
            &mut image,
            Rect::at(0, 0).of_size(dims.width, dims.height),
            self.border,
        );

        debug!(width = dims.width, height = dims.height, "Draft page rasterized");
        Ok(image)
    }
}
