// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagecrop — Core geometry, coordinate transforms, types, and errors shared
// across all crates.

pub mod config;
pub mod error;
pub mod geometry;
pub mod human_errors;
pub mod transform;
pub mod types;

pub use config::EditorConfig;
pub use error::{EditorError, ErrorKind, Result};
pub use geometry::*;
pub use transform::{CanvasSet, to_overlay_rect, to_pdf_rect, to_physical_rect};
pub use types::*;
