// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagecrop-document — Document and raster layer for the pagecrop editor.
//
// Provides the editable PDF container (geometry, whiteout fills, crop boxes,
// page deletion, serialization), page rasterization behind a backend trait,
// and the overlay compositor.

pub mod image;
pub mod pdf;
pub mod render;

// Re-export the primary types so callers can use `pagecrop_document::PdfContainer` etc.
pub use self::image::{
    Composite, CompositeLayer, OverlayGroup, RasterProcessor, compose, sample_color,
};
pub use pdf::PdfContainer;
pub use render::{DraftRasterizer, PageRenderer, Rasterizer, default_rasterizer};

#[cfg(feature = "mupdf")]
pub use render::MupdfRasterizer;
