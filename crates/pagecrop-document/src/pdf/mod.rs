// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — the editable document container and a blank-document builder.

pub mod blank;
pub mod container;

pub use blank::{BlankPage, blank_document};
pub use container::PdfContainer;
