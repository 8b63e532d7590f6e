// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coordinate transformer — maps a rectangle drawn on an overlay canvas to the
// page-space rectangle it covers on one particular page.
//
// Both the crop preview (raster clip) and the mutation paths (crop box on save,
// whiteout fill) go through `to_pdf_rect`, so identical inputs always yield
// identical rectangles on both sides.

use serde::{Deserialize, Serialize};

use crate::geometry::{
    CanvasDimensions, OverlayRect, PageDimensions, PageReference, PdfRect, canvas_dims,
    centering_offset,
};
use crate::types::{LayoutMode, PageGroup};

/// Canvases used by the overlay layouts for one set of page rasters.
///
/// The odd and even canvases of a split layout are both the maximum over all
/// pages, not over their own parity group, so a rectangle drawn at the same
/// canvas position lands at the same page position in either half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CanvasSet {
    pub all: Option<CanvasDimensions>,
    pub odd: Option<CanvasDimensions>,
    pub even: Option<CanvasDimensions>,
}

impl CanvasSet {
    /// Canvases for the given (known) page dimensions.
    pub fn from_pages<I>(pages: I) -> Self
    where
        I: IntoIterator<Item = PageDimensions>,
    {
        let all = canvas_dims(pages);
        Self {
            all,
            odd: all,
            even: all,
        }
    }

    /// The canvas page `page_index` is centered on under `layout`.
    ///
    /// Single layout uses the page's own size. An overlay layout with no known
    /// canvas falls back to the page size as well, which yields a zero offset.
    pub fn canvas_for(
        &self,
        layout: LayoutMode,
        page_index: usize,
        page: PageDimensions,
    ) -> CanvasDimensions {
        let shared = match layout {
            LayoutMode::Single => None,
            LayoutMode::AllOverlay => self.all,
            LayoutMode::OddEvenSplit => match PageGroup::of(page_index) {
                PageGroup::Odd => self.odd,
                PageGroup::Even => self.even,
            },
        };
        shared.unwrap_or_else(|| CanvasDimensions::of_page(page))
    }
}

/// Per-axis pixel → point scale for a page; 0 on a degenerate (zero-pixel)
/// axis.
fn scale_factors(page: PageDimensions, reference: &PageReference) -> (f64, f64) {
    let visual = &reference.visual_rect;
    let sx = if page.width > 0 {
        visual.width() / f64::from(page.width)
    } else {
        0.0
    };
    let sy = if page.height > 0 {
        visual.height() / f64::from(page.height)
    } else {
        0.0
    };
    (sx, sy)
}

/// Map `overlay` (canvas pixels) to the visual-space rectangle it covers on
/// page `page_index`, clamped to the page's visual bounds.
pub fn to_pdf_rect(
    overlay: &OverlayRect,
    page: PageDimensions,
    reference: &PageReference,
    page_index: usize,
    layout: LayoutMode,
    canvases: &CanvasSet,
) -> PdfRect {
    let canvas = canvases.canvas_for(layout, page_index, page);
    let (offset_x, offset_y) = centering_offset(canvas, page);
    let (sx, sy) = scale_factors(page, reference);
    let visual = &reference.visual_rect;

    let x0 = (overlay.x - offset_x as f64) * sx + visual.x0;
    let y0 = (overlay.y - offset_y as f64) * sy + visual.y0;
    let x1 = x0 + overlay.width * sx;
    let y1 = y0 + overlay.height * sy;

    PdfRect { x0, y0, x1, y1 }.clamp_to(visual)
}

/// [`to_pdf_rect`] composed with the page's derotation: the rectangle in
/// physical (stored) page space, as clip, crop-box and fill operations need.
pub fn to_physical_rect(
    overlay: &OverlayRect,
    page: PageDimensions,
    reference: &PageReference,
    page_index: usize,
    layout: LayoutMode,
    canvases: &CanvasSet,
) -> PdfRect {
    to_pdf_rect(overlay, page, reference, page_index, layout, canvases)
        .transform(&reference.derotation)
}

/// Inverse of [`to_pdf_rect`] for rectangles inside the page: where a
/// visual-space rectangle appears on the overlay canvas.
pub fn to_overlay_rect(
    rect: &PdfRect,
    page: PageDimensions,
    reference: &PageReference,
    page_index: usize,
    layout: LayoutMode,
    canvases: &CanvasSet,
) -> OverlayRect {
    let canvas = canvases.canvas_for(layout, page_index, page);
    let (offset_x, offset_y) = centering_offset(canvas, page);
    let (sx, sy) = scale_factors(page, reference);
    if sx == 0.0 || sy == 0.0 {
        return OverlayRect::new(offset_x as f64, offset_y as f64, 0.0, 0.0);
    }
    let visual = &reference.visual_rect;
    OverlayRect::new(
        (rect.x0 - visual.x0) / sx + offset_x as f64,
        (rect.y0 - visual.y0) / sy + offset_y as f64,
        rect.width() / sx,
        rect.height() / sy,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_300x450() -> PageReference {
        PageReference::from_box(300.0, 450.0, 0)
    }

    #[test]
    fn wider_sibling_offsets_the_page() {
        // 100x150 raster on a 120x150 canvas, 3x scale in both axes.
        let page = PageDimensions::new(100, 150);
        let canvases = CanvasSet::from_pages([page, PageDimensions::new(120, 150)]);
        let rect = OverlayRect::new(20.0, 20.0, 40.0, 40.0);

        let pdf = to_pdf_rect(&rect, page, &page_300x450(), 0, LayoutMode::AllOverlay, &canvases);

        assert_eq!(pdf, PdfRect::new(30.0, 60.0, 150.0, 180.0));
    }

    #[test]
    fn result_is_clamped_to_the_visual_rect() {
        let page = PageDimensions::new(100, 150);
        let canvases = CanvasSet::from_pages([page]);
        let rect = OverlayRect::new(-50.0, 90.0, 500.0, 500.0);

        let pdf = to_pdf_rect(&rect, page, &page_300x450(), 0, LayoutMode::AllOverlay, &canvases);

        assert_eq!(pdf, PdfRect::new(0.0, 270.0, 300.0, 450.0));
    }

    #[test]
    fn degenerate_page_does_not_divide_by_zero() {
        let page = PageDimensions::new(0, 0);
        let canvases = CanvasSet::from_pages([page]);
        let rect = OverlayRect::new(5.0, 5.0, 10.0, 10.0);

        let pdf = to_pdf_rect(&rect, page, &page_300x450(), 0, LayoutMode::Single, &canvases);

        assert!(pdf.x0.is_finite() && pdf.y1.is_finite());
        assert!(pdf.is_empty());
    }

    #[test]
    fn single_layout_ignores_the_shared_canvas() {
        let page = PageDimensions::new(100, 150);
        let canvases = CanvasSet::from_pages([page, PageDimensions::new(300, 300)]);
        let rect = OverlayRect::new(10.0, 10.0, 10.0, 10.0);

        let pdf = to_pdf_rect(&rect, page, &page_300x450(), 0, LayoutMode::Single, &canvases);

        assert_eq!(pdf, PdfRect::new(30.0, 30.0, 60.0, 60.0));
    }

    #[test]
    fn split_canvases_are_symmetric_and_global() {
        let dims = [
            PageDimensions::new(100, 150),
            PageDimensions::new(80, 200),
            PageDimensions::new(140, 90),
        ];
        let canvases = CanvasSet::from_pages(dims);
        let expected = CanvasDimensions::new(140, 200);

        assert_eq!(canvases.odd, canvases.even);
        assert_eq!(canvases.odd, Some(expected));
        for (index, page) in dims.iter().enumerate() {
            for layout in [LayoutMode::AllOverlay, LayoutMode::OddEvenSplit] {
                assert_eq!(canvases.canvas_for(layout, index, *page), expected);
            }
        }
    }

    #[test]
    fn odd_and_even_pages_map_identically_when_same_size() {
        let page = PageDimensions::new(100, 150);
        let canvases = CanvasSet::from_pages([page, page, PageDimensions::new(130, 170)]);
        let rect = OverlayRect::new(25.0, 30.0, 50.0, 60.0);
        let reference = page_300x450();

        let odd = to_pdf_rect(&rect, page, &reference, 0, LayoutMode::OddEvenSplit, &canvases);
        let even = to_pdf_rect(&rect, page, &reference, 1, LayoutMode::OddEvenSplit, &canvases);

        assert_eq!(odd, even);
    }

    #[test]
    fn overlay_round_trip_within_tolerance() {
        let page = PageDimensions::new(893, 1263);
        let reference = PageReference::from_box(595.0, 842.0, 0);
        let canvases = CanvasSet::from_pages([page, PageDimensions::new(1000, 1300)]);
        let cases = [
            OverlayRect::new(53.0, 18.0, 500.0, 700.0),
            OverlayRect::new(100.25, 300.5, 0.75, 12.0),
            OverlayRect::new(53.0, 18.0, 893.0, 1263.0),
        ];

        for rect in cases {
            let pdf = to_pdf_rect(&rect, page, &reference, 0, LayoutMode::AllOverlay, &canvases);
            let back =
                to_overlay_rect(&pdf, page, &reference, 0, LayoutMode::AllOverlay, &canvases);
            assert!((back.x - rect.x).abs() < 1e-6, "{back:?} vs {rect:?}");
            assert!((back.y - rect.y).abs() < 1e-6);
            assert!((back.width - rect.width).abs() < 1e-6);
            assert!((back.height - rect.height).abs() < 1e-6);
        }
    }

    #[test]
    fn physical_rect_accounts_for_rotation() {
        // Stored box 200x100 shown rotated a quarter turn: visual 100x200.
        let reference = PageReference::from_box(200.0, 100.0, 90);
        let page = PageDimensions::new(100, 200);
        let canvases = CanvasSet::from_pages([page]);
        // Top strip of the visual page, 10pt tall.
        let rect = OverlayRect::new(0.0, 0.0, 100.0, 10.0);

        let visual = to_pdf_rect(&rect, page, &reference, 0, LayoutMode::Single, &canvases);
        let physical =
            to_physical_rect(&rect, page, &reference, 0, LayoutMode::Single, &canvases);

        assert_eq!(visual, PdfRect::new(0.0, 0.0, 100.0, 10.0));
        // The visual top edge is the physical left edge.
        assert!(physical.approx_eq(&PdfRect::new(0.0, 0.0, 10.0, 100.0), 1e-9));
    }
}
