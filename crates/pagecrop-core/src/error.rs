// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for pagecrop.

use thiserror::Error;

/// Broad classification of an [`EditorError`], used to decide how the UI
/// reports it and whether an operation may have touched the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Open/save/rasterize failure from the PDF backend. The operation was
    /// aborted.
    Document,
    /// The user asked for a crop or whiteout without an applicable selection.
    Selection,
    /// A single page failed inside a render batch. Sibling pages are
    /// unaffected.
    PageRender,
    /// The operation is not allowed in the current state. Nothing changed.
    Precondition,
}

/// Top-level error type for all pagecrop operations.
#[derive(Debug, Error)]
pub enum EditorError {
    // -- Document errors --
    #[error("failed to open PDF: {0}")]
    Open(String),

    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("failed to save PDF: {0}")]
    Save(String),

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("page {index} out of range (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    #[error("snapshot integrity check failed: expected {expected}, got {actual}")]
    SnapshotMismatch { expected: String, actual: String },

    // -- Per-page render errors --
    #[error("rendering page {page} failed: {detail}")]
    Render { page: usize, detail: String },

    // -- Selection errors --
    #[error("no selection: {0}")]
    NoSelection(String),

    // -- Precondition errors --
    #[error("no document is open")]
    NoDocument,

    #[error("another render or save is still in progress")]
    Busy,

    #[error("a crop is active; reset the crop before {operation}")]
    CropActive { operation: &'static str },

    #[error("page {page} is previewed; close the preview before {operation}")]
    PreviewActive {
        page: usize,
        operation: &'static str,
    },

    #[error("no pages selected")]
    NoPagesSelected,

    #[error("nothing to undo")]
    NothingToUndo,

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EditorError {
    /// Classify this error for reporting.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Open(_)
            | Self::Pdf(_)
            | Self::Save(_)
            | Self::Image(_)
            | Self::PageOutOfRange { .. }
            | Self::SnapshotMismatch { .. }
            | Self::Io(_)
            | Self::Serialization(_) => ErrorKind::Document,
            Self::Render { .. } => ErrorKind::PageRender,
            Self::NoSelection(_) => ErrorKind::Selection,
            Self::NoDocument
            | Self::Busy
            | Self::CropActive { .. }
            | Self::PreviewActive { .. }
            | Self::NoPagesSelected
            | Self::NothingToUndo => ErrorKind::Precondition,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, EditorError>;
