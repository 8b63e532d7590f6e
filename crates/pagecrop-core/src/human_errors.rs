// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// User-facing messages for editor errors and outcomes.
//
// Selection and precondition problems are warnings (nothing changed, the user
// can fix it). Backend failures are errors.

use crate::error::{EditorError, ErrorKind};

/// How a notice is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Confirmation of a completed action.
    Info,
    /// Nothing changed; the user can correct the input and retry.
    Warning,
    /// The backend failed; the operation was aborted.
    Error,
}

/// A message-box style notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Short heading.
    pub title: String,
    /// Body text.
    pub message: String,
    pub severity: Severity,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            title: "Success".into(),
            message: message.into(),
            severity: Severity::Info,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            title: "Warning".into(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            title: "Error".into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }
}

/// Turn an [`EditorError`] into a notice for the user.
pub fn humanize_error(err: &EditorError) -> Notice {
    match err {
        EditorError::NoSelection(detail) => Notice::warning(format!("Please {detail}.")),
        EditorError::CropActive { operation } => Notice::warning(format!(
            "A crop is active. Reset the crop before {operation}."
        )),
        EditorError::PreviewActive { page, operation } => Notice::warning(format!(
            "Page {} is previewed. Close the preview before {operation}.",
            page + 1
        )),
        EditorError::NoPagesSelected => Notice::warning("Please select pages to delete."),
        EditorError::NothingToUndo => Notice::warning("Nothing to undo."),
        EditorError::NoDocument => Notice::warning("No PDF is open."),
        EditorError::Busy => {
            Notice::warning("Please wait for the current operation to finish.")
        }
        EditorError::Open(detail) => Notice::error(format!("Failed to load PDF: {detail}")),
        EditorError::Save(detail) => Notice::error(format!("Failed to save PDF: {detail}")),
        EditorError::Render { page, detail } => {
            Notice::error(format!("Page {} could not be rendered: {detail}", page + 1))
        }
        other => match other.kind() {
            ErrorKind::Selection | ErrorKind::Precondition => Notice::warning(other.to_string()),
            ErrorKind::Document | ErrorKind::PageRender => {
                Notice::error(format!("An error occurred:\n{other}"))
            }
        },
    }
}
