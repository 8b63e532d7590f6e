// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagecrop-editor — Editing session: crop state, whiteout, page deletion,
// undo snapshots, selection sync, thumbnails, and the async render/save
// plumbing around them.

pub mod crop;
pub mod editor;
pub mod overlay;
pub mod save;
pub mod scheduler;
pub mod selection;
pub mod session;
pub mod thumbnails;
pub mod undo;

pub use crop::{CropSelection, CropState};
pub use editor::Editor;
pub use overlay::{OverlayCache, OverlayFrame};
pub use save::{SaveReport, write_document};
pub use scheduler::{PageRenderOutcome, RenderBatch, RenderJob, RenderRequest, RenderScheduler};
pub use selection::{SelectionSync, ViewKind, ViewUpdate};
pub use session::{
    BatchProgress, BatchSummary, DeleteReport, EditorSession, ResetOutcome, SaveJob,
    WhiteoutTarget,
};
pub use thumbnails::{ThumbnailModel, ThumbnailStrip};
pub use undo::{Snapshot, UndoStack, hash_bytes};
