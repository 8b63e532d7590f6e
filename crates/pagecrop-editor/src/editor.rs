// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Async editor facade — pairs an `EditorSession` with a `RenderScheduler` and
// drives each render batch and save to completion.
//
// Every method that re-renders returns once the whole batch has reported, so
// callers observe a settled session. UIs that want per-page progress use the
// session and scheduler directly.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pagecrop_core::error::{EditorError, Result};
use pagecrop_core::{EditorConfig, OverlayRect};
use pagecrop_document::Rasterizer;
use tracing::{debug, info};

use crate::crop::CropSelection;
use crate::save::{SaveReport, write_document};
use crate::scheduler::{RenderRequest, RenderScheduler};
use crate::selection::ViewKind;
use crate::session::{
    BatchProgress, BatchSummary, DeleteReport, EditorSession, ResetOutcome, WhiteoutTarget,
};

/// An editor session with its render workers.
pub struct Editor {
    session: EditorSession,
    scheduler: RenderScheduler,
}

impl Editor {
    pub fn new(config: EditorConfig, rasterizer: Arc<dyn Rasterizer>) -> Self {
        info!(backend = rasterizer.name(), "Editor created");
        Self {
            session: EditorSession::new(config),
            scheduler: RenderScheduler::new(rasterizer),
        }
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditorSession {
        &mut self.session
    }

    // -- Document --------------------------------------------------------------

    pub async fn open_path(&mut self, path: impl AsRef<Path>) -> Result<BatchSummary> {
        let request = self.session.open_path(path)?;
        Ok(self.run(request).await)
    }

    pub async fn open_bytes(&mut self, bytes: &[u8], source: Option<PathBuf>) -> Result<BatchSummary> {
        let request = self.session.open_bytes(bytes, source)?;
        Ok(self.run(request).await)
    }

    pub async fn reload(&mut self) -> Result<BatchSummary> {
        let request = self.session.reload()?;
        Ok(self.run(request).await)
    }

    // -- Edits -----------------------------------------------------------------

    /// Crop with the selection of the visible layout.
    pub async fn crop(&mut self) -> Result<BatchSummary> {
        let request = self.session.crop()?;
        Ok(self.run(request).await)
    }

    pub async fn crop_with(&mut self, selection: CropSelection) -> Result<BatchSummary> {
        let request = self.session.crop_with(selection)?;
        Ok(self.run(request).await)
    }

    /// `None` when no crop was active.
    pub async fn reset_crop(&mut self) -> Result<Option<BatchSummary>> {
        match self.session.reset_crop()? {
            ResetOutcome::NothingToReset => Ok(None),
            ResetOutcome::Reset(request) => Ok(Some(self.run(request).await)),
        }
    }

    pub async fn whiteout(&mut self, target: WhiteoutTarget, rect: OverlayRect) -> Result<BatchSummary> {
        let request = self.session.whiteout(target, rect)?;
        Ok(self.run(request).await)
    }

    pub async fn whiteout_requested(&mut self, view: ViewKind, rect: OverlayRect) -> Result<BatchSummary> {
        let request = self.session.whiteout_requested(view, rect)?;
        Ok(self.run(request).await)
    }

    /// Deletion needs no re-render.
    pub fn delete_pages(&mut self, indices: &BTreeSet<usize>) -> Result<DeleteReport> {
        self.session.delete_pages(indices)
    }

    pub async fn undo(&mut self) -> Result<BatchSummary> {
        let request = self.session.undo()?;
        Ok(self.run(request).await)
    }

    // -- Output ----------------------------------------------------------------

    /// Save to `path`, or to the configured destination. The document is
    /// serialized on a blocking worker.
    pub async fn save(&mut self, path: Option<PathBuf>) -> Result<SaveReport> {
        let job = self.session.begin_save(path)?;
        let result = tokio::task::spawn_blocking(move || write_document(&job))
            .await
            .map_err(|err| EditorError::Save(format!("save worker failed: {err}")))
            .and_then(|result| result);
        self.session.finish_save(&result);
        result
    }

    pub fn export_overlay(&mut self, path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        self.session.export_overlay(path)
    }

    // -- Internal --------------------------------------------------------------

    /// Dispatch `request` and feed outcomes to the session until the batch
    /// completes.
    async fn run(&mut self, request: RenderRequest) -> BatchSummary {
        let generation = request.generation;
        let mut batch = self.scheduler.dispatch(request);
        while let Some(outcome) = batch.next().await {
            if let BatchProgress::Complete(summary) = self.session.accept(outcome) {
                return summary;
            }
        }
        debug!(generation, "Empty render batch");
        BatchSummary {
            generation,
            ..Default::default()
        }
    }
}
