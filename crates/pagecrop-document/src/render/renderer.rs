// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page renderer — rasterizes one page and, when a crop is active, limits the
// result to the clip rectangle.
//
// The clip arrives in physical page space (the same rectangle a save writes
// as the crop box). It is mapped back to visual space with the inverse of the
// page's derotation and then to raster pixels.

use std::sync::Arc;

use image::RgbaImage;
use pagecrop_core::error::{EditorError, Result};
use pagecrop_core::{PageReference, PdfRect};
use tracing::{debug, instrument, warn};

use super::Rasterizer;
use crate::image::RasterProcessor;

/// Slack applied before flooring/ceiling pixel edges, so clips that land on
/// a pixel boundary do not gain a stray row or column from rounding noise.
const EDGE_EPSILON: f64 = 1e-6;

/// Read-only page renderer shared by every render worker.
#[derive(Clone)]
pub struct PageRenderer {
    rasterizer: Arc<dyn Rasterizer>,
}

impl PageRenderer {
    pub fn new(rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self { rasterizer }
    }

    pub fn backend(&self) -> &'static str {
        self.rasterizer.name()
    }

    /// Render page `page_index` of `pdf` at `zoom`, cropped to `clip` when
    /// given.
    ///
    /// Every failure is reported as [`EditorError::Render`] tagged with the
    /// page index.
    #[instrument(skip(self, pdf, reference), fields(backend = self.backend(), page_index, zoom))]
    pub fn render(
        &self,
        pdf: &[u8],
        page_index: usize,
        zoom: f32,
        reference: &PageReference,
        clip: Option<&PdfRect>,
    ) -> Result<RgbaImage> {
        let raster = self
            .rasterizer
            .rasterize(pdf, page_index, zoom)
            .map_err(|err| match err {
                EditorError::Render { .. } => err,
                other => EditorError::Render {
                    page: page_index,
                    detail: other.to_string(),
                },
            })?;

        let Some(clip) = clip else {
            return Ok(raster);
        };

        let (x, y, width, height) = clip_to_pixels(clip, reference, raster.width(), raster.height());
        debug!(x, y, width, height, "Applying clip");
        Ok(RasterProcessor::from_rgba(raster)
            .crop(x, y, width, height)
            .into_rgba())
    }
}

/// Pixel rectangle `(x, y, width, height)` of a `raster_width` ×
/// `raster_height` raster covered by the physical-space `clip`.
///
/// The result always lies inside the raster and is at least one pixel wide
/// and tall.
pub fn clip_to_pixels(
    clip: &PdfRect,
    reference: &PageReference,
    raster_width: u32,
    raster_height: u32,
) -> (u32, u32, u32, u32) {
    let visual_bounds = reference.visual_rect;
    let visual = clip
        .transform(&reference.rotation_matrix())
        .clamp_to(&visual_bounds);
    if visual.is_empty() {
        warn!(?clip, "Clip does not overlap the page");
    }

    let axis = |lo: f64, hi: f64, origin: f64, extent: f64, pixels: u32| -> (u32, u32) {
        let pixels_f = f64::from(pixels);
        let scale = if extent > 0.0 { pixels_f / extent } else { 0.0 };
        let start = ((lo - origin) * scale + EDGE_EPSILON)
            .floor()
            .clamp(0.0, pixels_f - 1.0) as u32;
        let end = ((hi - origin) * scale - EDGE_EPSILON)
            .ceil()
            .clamp(0.0, pixels_f) as u32;
        (start, end.saturating_sub(start).max(1))
    };

    let (x, width) = axis(
        visual.x0,
        visual.x1,
        visual_bounds.x0,
        visual_bounds.width(),
        raster_width,
    );
    let (y, height) = axis(
        visual.y0,
        visual.y1,
        visual_bounds.y0,
        visual_bounds.height(),
        raster_height,
    );
    (x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::{BlankPage, blank_document};
    use crate::render::DraftRasterizer;

    struct FailingRasterizer;

    impl Rasterizer for FailingRasterizer {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn rasterize(&self, _pdf: &[u8], _page_index: usize, _zoom: f32) -> Result<RgbaImage> {
            Err(EditorError::Pdf("corrupt content stream".into()))
        }
    }

    #[test]
    fn unclipped_render_is_the_full_page() {
        let pdf = blank_document(&[BlankPage::new(200.0, 100.0)]).unwrap();
        let renderer = PageRenderer::new(Arc::new(DraftRasterizer::default()));
        let reference = PageReference::from_box(200.0, 100.0, 0);
        let image = renderer.render(&pdf, 0, 2.0, &reference, None).unwrap();
        assert_eq!(image.dimensions(), (400, 200));
    }

    #[test]
    fn clip_crops_the_raster() {
        let pdf = blank_document(&[BlankPage::new(200.0, 100.0)]).unwrap();
        let renderer = PageRenderer::new(Arc::new(DraftRasterizer::default()));
        let reference = PageReference::from_box(200.0, 100.0, 0);
        let clip = PdfRect::new(50.0, 25.0, 150.0, 75.0);
        let image = renderer
            .render(&pdf, 0, 2.0, &reference, Some(&clip))
            .unwrap();
        assert_eq!(image.dimensions(), (200, 100));
    }

    #[test]
    fn rotated_clip_maps_back_to_visual_pixels() {
        // Stored 200x100, shown a quarter turn: visual 100x200.
        let reference = PageReference::from_box(200.0, 100.0, 90);
        // Physical strip x in [0, 10] is the visual top strip.
        let clip = PdfRect::new(0.0, 0.0, 10.0, 100.0);
        assert_eq!(clip_to_pixels(&clip, &reference, 100, 200), (0, 0, 100, 10));
    }

    #[test]
    fn degenerate_clip_keeps_one_pixel() {
        let reference = PageReference::from_box(100.0, 100.0, 0);
        let clip = PdfRect::new(100.0, 100.0, 100.0, 100.0);
        let (x, y, width, height) = clip_to_pixels(&clip, &reference, 50, 50);
        assert_eq!((x, y, width, height), (49, 49, 1, 1));
    }

    #[test]
    fn backend_errors_are_tagged_with_the_page() {
        let renderer = PageRenderer::new(Arc::new(FailingRasterizer));
        let reference = PageReference::from_box(10.0, 10.0, 0);
        let err = renderer.render(b"", 7, 1.0, &reference, None).unwrap_err();
        match err {
            EditorError::Render { page, detail } => {
                assert_eq!(page, 7);
                assert!(detail.contains("corrupt content stream"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
