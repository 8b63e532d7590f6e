// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay cache — composites per group, computed on demand and kept until the
// page raster set changes.

use std::collections::HashMap;

use image::RgbaImage;
use pagecrop_document::{Composite, OverlayGroup, compose};
use tracing::debug;

/// What the overlay area should currently display.
#[derive(Debug, Clone, Copy)]
pub enum OverlayFrame<'a> {
    /// Single-page preview: the page's own raster, unscaled.
    Preview {
        page_index: usize,
        image: &'a RgbaImage,
    },
    /// All pages on one canvas.
    All(&'a Composite),
    /// Odd and even halves; a half with no rendered page is `None`.
    Split {
        odd: Option<&'a Composite>,
        even: Option<&'a Composite>,
    },
}

/// Memoized composites. An entry holding `None` records that the group had
/// nothing to show.
#[derive(Debug, Default)]
pub struct OverlayCache {
    entries: HashMap<OverlayGroup, Option<Composite>>,
}

impl OverlayCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every composite. Call whenever the rasters change.
    pub fn invalidate(&mut self) {
        if !self.entries.is_empty() {
            debug!(groups = self.entries.len(), "Overlay cache invalidated");
        }
        self.entries.clear();
    }

    pub fn is_cached(&self, group: OverlayGroup) -> bool {
        self.entries.contains_key(&group)
    }

    /// Build `group`'s composite from `rasters` unless it is cached.
    pub fn ensure(&mut self, group: OverlayGroup, rasters: &[Option<RgbaImage>]) {
        self.entries
            .entry(group)
            .or_insert_with(|| compose(rasters, group));
    }

    /// The cached composite for `group`, if built and non-empty.
    pub fn get(&self, group: OverlayGroup) -> Option<&Composite> {
        self.entries.get(&group).and_then(Option::as_ref)
    }
}
