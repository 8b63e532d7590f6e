// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the pagecrop editor.

use serde::{Deserialize, Serialize};

/// How page rasters are arranged on the overlay canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// One page shown on its own, unscaled; the canvas is the page itself.
    Single,
    /// Every page centered on one shared canvas.
    AllOverlay,
    /// Two canvases: pages at even indices ("odd" pages 1, 3, 5 …) and pages
    /// at odd indices ("even" pages 2, 4, 6 …).
    OddEvenSplit,
}

impl LayoutMode {
    /// Human-readable name, matching the view menu wording.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Single => "Single Page",
            Self::AllOverlay => "All Pages Overlay",
            Self::OddEvenSplit => "Separate Odd/Even Pages",
        }
    }
}

/// One half of an odd/even split, named by 1-based page parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageGroup {
    /// 0-based indices 0, 2, 4 …
    Odd,
    /// 0-based indices 1, 3, 5 …
    Even,
}

impl PageGroup {
    /// The group a 0-based page index belongs to.
    pub fn of(index: usize) -> Self {
        if index % 2 == 0 { Self::Odd } else { Self::Even }
    }

    pub fn contains(&self, index: usize) -> bool {
        Self::of(index) == *self
    }

    /// All 0-based indices of this group in a document of `page_count` pages.
    pub fn indices(self, page_count: usize) -> impl Iterator<Item = usize> {
        let start = match self {
            Self::Odd => 0,
            Self::Even => 1,
        };
        (start..page_count).step_by(2)
    }
}

/// Opaque RGB color used for whiteout fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `RRGGBB` or `#RRGGBB`.
    pub fn from_hex(text: &str) -> Option<Self> {
        let digits = text.strip_prefix('#').unwrap_or(text);
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Channels scaled to `0.0..=1.0`, as PDF color operators expect.
    pub fn to_unit(&self) -> [f32; 3] {
        [
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        ]
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Serialization options for writing a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOptions {
    /// 0 keeps every object, 1 prunes unreachable objects, 2 and above also
    /// renumbers the survivors into a compact cross-reference table.
    pub garbage_level: u8,
    /// Deflate-compress content streams.
    pub compress: bool,
}

impl SaveOptions {
    /// Byte-exact copy of the document for undo snapshots.
    pub const SNAPSHOT: SaveOptions = SaveOptions {
        garbage_level: 0,
        compress: false,
    };
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            garbage_level: 2,
            compress: false,
        }
    }
}

/// Lifecycle phase of the document held by an editor session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentPhase {
    /// Initial state, and the state re-entered when a new file is opened.
    NoDocument,
    /// A document is open with no pending edits since the last reset/undo.
    Loaded,
    /// A crop is active (previewed, not yet written).
    Cropped,
    /// At least one whiteout has been drawn onto page content.
    WhitedOut,
    /// Pages have been removed.
    PagesDeleted,
}
