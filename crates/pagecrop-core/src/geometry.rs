// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry model — page and canvas dimensions, overlay/PDF rectangles, affine
// matrices, and the per-page reference data needed to map between them.
//
// Two coordinate spaces matter here:
//
// * overlay space: canvas pixels, origin top-left, y grows downward;
// * page space: PDF points, origin at the top-left of the page's effective
//   box, y grows downward. "Visual" page space matches the displayed
//   rotation; "physical" page space is the stored, unrotated orientation.

use serde::{Deserialize, Serialize};

/// Rendered pixel size of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageDimensions {
    pub width: u32,
    pub height: u32,
}

impl PageDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Bounding box of the largest page(s) participating in an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanvasDimensions {
    pub max_width: u32,
    pub max_height: u32,
}

impl CanvasDimensions {
    pub const fn new(max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
        }
    }

    /// A canvas exactly the size of one page (single-page layout).
    pub fn of_page(page: PageDimensions) -> Self {
        Self::new(page.width, page.height)
    }
}

/// Canvas covering every page in `pages`: the maximum width and the maximum
/// height, taken independently.
///
/// Returns `None` for an empty set, which callers treat as "nothing to
/// render".
pub fn canvas_dims<I>(pages: I) -> Option<CanvasDimensions>
where
    I: IntoIterator<Item = PageDimensions>,
{
    pages.into_iter().fold(None, |acc, page| {
        Some(match acc {
            None => CanvasDimensions::of_page(page),
            Some(canvas) => CanvasDimensions::new(
                canvas.max_width.max(page.width),
                canvas.max_height.max(page.height),
            ),
        })
    })
}

/// Offset that centers `page` on `canvas`: `(canvas - page) / 2` per axis,
/// rounded toward negative infinity.
pub fn centering_offset(canvas: CanvasDimensions, page: PageDimensions) -> (i64, i64) {
    let dx = i64::from(canvas.max_width) - i64::from(page.width);
    let dy = i64::from(canvas.max_height) - i64::from(page.height);
    (dx.div_euclid(2), dy.div_euclid(2))
}

// -- Overlay rectangles -------------------------------------------------------

/// Axis-aligned rectangle in overlay-canvas pixels. Width and height are never
/// negative.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OverlayRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl OverlayRect {
    /// Build a rectangle, flipping negative extents so the stored rectangle is
    /// normalized.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        let (x, width) = if width < 0.0 { (x + width, -width) } else { (x, width) };
        let (y, height) = if height < 0.0 { (y + height, -height) } else { (y, height) };
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle spanned by two drag corners, in any order.
    pub fn from_points(a: (f64, f64), b: (f64, f64)) -> Self {
        Self::new(a.0.min(b.0), a.1.min(b.1), (a.0 - b.0).abs(), (a.1 - b.1).abs())
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Strictly positive area. Zero-area rectangles count as "no selection".
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    pub fn contains_rect(&self, other: &OverlayRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Same top-left corner, different size.
    pub fn with_size(&self, width: f64, height: f64) -> Self {
        Self::new(self.x, self.y, width, height)
    }
}

// -- PDF rectangles -----------------------------------------------------------

/// Axis-aligned rectangle in page space (points), with `x0 <= x1` and
/// `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PdfRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl PdfRect {
    /// Build a normalized rectangle from two corners.
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Clamp every coordinate into `bounds`.
    pub fn clamp_to(&self, bounds: &PdfRect) -> Self {
        Self {
            x0: self.x0.clamp(bounds.x0, bounds.x1),
            y0: self.y0.clamp(bounds.y0, bounds.y1),
            x1: self.x1.clamp(bounds.x0, bounds.x1),
            y1: self.y1.clamp(bounds.y0, bounds.y1),
        }
    }

    /// Map all four corners through `matrix` and return their bounding box.
    pub fn transform(&self, matrix: &Matrix) -> Self {
        let corners = [
            matrix.apply(self.x0, self.y0),
            matrix.apply(self.x1, self.y0),
            matrix.apply(self.x0, self.y1),
            matrix.apply(self.x1, self.y1),
        ];
        let (mut x0, mut y0) = corners[0];
        let (mut x1, mut y1) = corners[0];
        for (x, y) in &corners[1..] {
            x0 = x0.min(*x);
            y0 = y0.min(*y);
            x1 = x1.max(*x);
            y1 = y1.max(*y);
        }
        Self { x0, y0, x1, y1 }
    }

    pub fn approx_eq(&self, other: &PdfRect, tolerance: f64) -> bool {
        (self.x0 - other.x0).abs() <= tolerance
            && (self.y0 - other.y0).abs() <= tolerance
            && (self.x1 - other.x1).abs() <= tolerance
            && (self.y1 - other.y1).abs() <= tolerance
    }
}

// -- Affine matrices ----------------------------------------------------------

/// 2×3 affine transform: `x' = a·x + c·y + e`, `y' = b·x + d·y + f`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// `self` followed by `then`.
    pub fn concat(&self, then: &Matrix) -> Self {
        Self {
            a: self.a * then.a + self.b * then.c,
            b: self.a * then.b + self.b * then.d,
            c: self.c * then.a + self.d * then.c,
            d: self.c * then.b + self.d * then.d,
            e: self.e * then.a + self.f * then.c + then.e,
            f: self.e * then.b + self.f * then.d + then.f,
        }
    }

    /// Inverse transform, or `None` for a singular matrix.
    pub fn invert(&self) -> Option<Self> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f64::EPSILON {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(Self {
            a,
            b,
            c,
            d,
            e: -(self.e * a + self.f * c),
            f: -(self.e * b + self.f * d),
        })
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// -- Page reference -----------------------------------------------------------

/// Page metadata needed to turn visual-space rectangles into physical
/// content-space coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageReference {
    /// Page bounds in visual space.
    pub visual_rect: PdfRect,
    /// Maps visual space to physical (stored) space.
    pub derotation: Matrix,
    /// Normalized page rotation: 0, 90, 180 or 270 degrees clockwise.
    pub rotation: u16,
}

impl PageReference {
    /// Derive the reference for a page whose effective box is
    /// `box_width` × `box_height` points and whose `/Rotate` is `rotation`.
    ///
    /// Rotations are normalized into `0..360` and snapped to the nearest
    /// quarter turn.
    pub fn from_box(box_width: f64, box_height: f64, rotation: i64) -> Self {
        let quarter = ((rotation.rem_euclid(360) + 45) / 90) % 4;
        let (w, h) = (box_width, box_height);
        let (visual_w, visual_h, derotation) = match quarter {
            1 => (h, w, Matrix::new(0.0, -1.0, 1.0, 0.0, 0.0, h)),
            2 => (w, h, Matrix::new(-1.0, 0.0, 0.0, -1.0, w, h)),
            3 => (h, w, Matrix::new(0.0, 1.0, -1.0, 0.0, w, 0.0)),
            _ => (w, h, Matrix::IDENTITY),
        };
        Self {
            visual_rect: PdfRect::new(0.0, 0.0, visual_w, visual_h),
            derotation,
            rotation: (quarter * 90) as u16,
        }
    }

    /// Maps physical space back to visual space.
    pub fn rotation_matrix(&self) -> Matrix {
        self.derotation.invert().unwrap_or(Matrix::IDENTITY)
    }

    /// Pixel size a rasterizer produces for this page at `zoom`.
    pub fn pixel_dims(&self, zoom: f32) -> PageDimensions {
        let zoom = f64::from(zoom);
        let px = |extent: f64| ((extent * zoom).round() as u32).max(1);
        PageDimensions::new(
            px(self.visual_rect.width()),
            px(self.visual_rect.height()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_takes_independent_maxima() {
        let canvas = canvas_dims([
            PageDimensions::new(100, 300),
            PageDimensions::new(250, 120),
        ]);
        assert_eq!(canvas, Some(CanvasDimensions::new(250, 300)));
    }

    #[test]
    fn empty_page_set_has_no_canvas() {
        assert_eq!(canvas_dims(Vec::<PageDimensions>::new()), None);
    }

    #[test]
    fn centering_floors_odd_differences() {
        let canvas = CanvasDimensions::new(121, 150);
        assert_eq!(centering_offset(canvas, PageDimensions::new(100, 150)), (10, 0));
        // A page larger than the canvas floors toward negative infinity.
        let small = CanvasDimensions::new(100, 100);
        assert_eq!(centering_offset(small, PageDimensions::new(103, 100)), (-2, 0));
    }

    #[test]
    fn overlay_rect_normalizes() {
        let rect = OverlayRect::new(50.0, 40.0, -20.0, -10.0);
        assert_eq!(rect, OverlayRect::new(30.0, 30.0, 20.0, 10.0));
        let dragged = OverlayRect::from_points((10.0, 80.0), (4.0, 20.0));
        assert_eq!(dragged, OverlayRect::new(4.0, 20.0, 6.0, 60.0));
    }

    #[test]
    fn overlay_rect_containment() {
        let outer = OverlayRect::new(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains_point(100.0, 0.0));
        assert!(!outer.contains_point(100.5, 0.0));
        assert!(outer.contains_rect(&OverlayRect::new(10.0, 10.0, 90.0, 90.0)));
        assert!(!outer.contains_rect(&OverlayRect::new(10.0, 10.0, 91.0, 10.0)));
        assert!(!OverlayRect::new(5.0, 5.0, 0.0, 10.0).is_valid());
    }

    #[test]
    fn matrix_inverse_round_trips() {
        let m = Matrix::new(0.0, -1.0, 1.0, 0.0, 0.0, 200.0);
        let inv = m.invert().unwrap();
        let (x, y) = m.apply(30.0, 70.0);
        let (bx, by) = inv.apply(x, y);
        assert!((bx - 30.0).abs() < 1e-9 && (by - 70.0).abs() < 1e-9);
        let identity = m.concat(&inv);
        assert!((identity.a - 1.0).abs() < 1e-9 && identity.e.abs() < 1e-9);
    }

    #[test]
    fn quarter_turn_swaps_visual_extent() {
        let page = PageReference::from_box(200.0, 100.0, 90);
        assert_eq!(page.rotation, 90);
        assert_eq!(page.visual_rect, PdfRect::new(0.0, 0.0, 100.0, 200.0));
        // Visual top-right corner is the physical top-left corner.
        let (x, y) = page.derotation.apply(100.0, 0.0);
        assert!(x.abs() < 1e-9 && y.abs() < 1e-9);
    }

    #[test]
    fn rotations_normalize() {
        assert_eq!(PageReference::from_box(10.0, 10.0, -90).rotation, 270);
        assert_eq!(PageReference::from_box(10.0, 10.0, 450).rotation, 90);
        assert_eq!(PageReference::from_box(10.0, 10.0, 360).rotation, 0);
    }

    #[test]
    fn derotation_maps_visual_rect_onto_physical_box() {
        for rotation in [0, 90, 180, 270] {
            let page = PageReference::from_box(300.0, 500.0, rotation);
            let physical = page.visual_rect.transform(&page.derotation);
            assert!(
                physical.approx_eq(&PdfRect::new(0.0, 0.0, 300.0, 500.0), 1e-9),
                "rotation {rotation}: {physical:?}"
            );
        }
    }

    #[test]
    fn pixel_dims_round_and_never_vanish() {
        let page = PageReference::from_box(595.0, 842.0, 0);
        assert_eq!(page.pixel_dims(1.5), PageDimensions::new(893, 1263));
        let sliver = PageReference::from_box(0.1, 10.0, 0);
        assert_eq!(sliver.pixel_dims(1.0).width, 1);
    }
}
