// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// MuPDF rasterizer — full page rendering through the `mupdf` crate.

use image::{Rgba, RgbaImage};
use mupdf::{Colorspace, Document, Matrix};
use pagecrop_core::error::{EditorError, Result};
use tracing::{debug, instrument};

use super::Rasterizer;

/// Renders pages with MuPDF into RGBA buffers.
#[derive(Debug, Default, Clone, Copy)]
pub struct MupdfRasterizer;

impl MupdfRasterizer {
    pub fn new() -> Self {
        Self
    }
}

impl Rasterizer for MupdfRasterizer {
    fn name(&self) -> &'static str {
        "mupdf"
    }

    #[instrument(skip(self, pdf), fields(bytes_len = pdf.len()))]
    fn rasterize(&self, pdf: &[u8], page_index: usize, zoom: f32) -> Result<RgbaImage> {
        let render_err = |detail: String| EditorError::Render {
            page: page_index,
            detail,
        };

        let document = Document::from_bytes(pdf, "pdf")
            .map_err(|err| render_err(format!("failed to open document: {}", err)))?;
        let page = document
            .load_page(page_index as i32)
            .map_err(|err| render_err(format!("failed to load page: {}", err)))?;
        let pixmap = page
            .to_pixmap(
                &Matrix::new_scale(zoom, zoom),
                &Colorspace::device_rgb(),
                false,
                false,
            )
            .map_err(|err| render_err(format!("failed to render page: {}", err)))?;

        let width = pixmap.width() as u32;
        let height = pixmap.height() as u32;
        let channels = pixmap.n() as usize;
        let stride = pixmap.stride() as usize;
        let samples = pixmap.samples();
        if channels < 3 || samples.len() < stride * height as usize {
            return Err(render_err(format!(
                "unexpected pixmap layout: {} channels, {} bytes",
                channels,
                samples.len()
            )));
        }

        let image = RgbaImage::from_fn(width, height, |x, y| {
            let offset = y as usize * stride + x as usize * channels;
            Rgba([samples[offset], samples[offset + 1], samples[offset + 2], 255])
        });

        debug!(width, height, "Page rasterized");
        Ok(image)
    }
}
