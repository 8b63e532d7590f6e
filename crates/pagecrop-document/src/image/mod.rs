// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — raster processing and overlay compositing.

pub mod compositor;
pub mod processor;

pub use compositor::{Composite, CompositeLayer, OVERLAY_OPACITY, OverlayGroup, compose};
pub use processor::{RasterProcessor, sample_color};
