// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render module — page rasterization backends and the clipping page renderer.
//
// The backend is a trait object so the editor can run headless (draft
// rasterizer), against MuPDF, or against a test double.

pub mod draft;
#[cfg(feature = "mupdf")]
pub mod mupdf;
pub mod renderer;

use image::RgbaImage;
use pagecrop_core::error::Result;

pub use draft::DraftRasterizer;
#[cfg(feature = "mupdf")]
pub use self::mupdf::MupdfRasterizer;
pub use renderer::PageRenderer;

/// Turns one page of a serialized PDF into pixels.
///
/// Implementations must be safe to call from many worker threads at once;
/// each call receives its own immutable copy of the document bytes.
pub trait Rasterizer: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Rasterize page `page_index` (0-based) at `zoom` pixels per point.
    ///
    /// The result covers the page's full visual rectangle, so its size is
    /// `round(visual extent × zoom)` on each axis.
    fn rasterize(&self, pdf: &[u8], page_index: usize, zoom: f32) -> Result<RgbaImage>;
}

/// The best rasterizer compiled into this build.
pub fn default_rasterizer() -> std::sync::Arc<dyn Rasterizer> {
    #[cfg(feature = "mupdf")]
    {
        std::sync::Arc::new(MupdfRasterizer::new())
    }
    #[cfg(not(feature = "mupdf"))]
    {
        std::sync::Arc::new(DraftRasterizer::default())
    }
}
