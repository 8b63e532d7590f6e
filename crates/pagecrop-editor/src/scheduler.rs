// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Render scheduler — fans a render request out into one blocking task per
// page and streams the per-page results back.
//
// Tasks share one immutable copy of the document bytes and never touch the
// session. Results arrive in completion order; `RenderBatch` keeps count so
// the caller knows when every page of the batch has reported.

use std::collections::BTreeSet;
use std::sync::Arc;

use image::RgbaImage;
use pagecrop_core::error::{EditorError, Result};
use pagecrop_core::{PageReference, PdfRect};
use pagecrop_document::{PageRenderer, Rasterizer};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

/// One page to render.
#[derive(Debug, Clone, Copy)]
pub struct RenderJob {
    pub page_index: usize,
    pub reference: PageReference,
    /// Physical-space clip from the active crop.
    pub clip: Option<PdfRect>,
}

/// Everything a batch of render workers needs.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Batch number; results from older batches are stale.
    pub generation: u64,
    pub pdf: Arc<Vec<u8>>,
    pub zoom: f32,
    pub jobs: Vec<RenderJob>,
}

/// Result of rendering one page.
#[derive(Debug)]
pub struct PageRenderOutcome {
    pub generation: u64,
    pub page_index: usize,
    pub result: Result<RgbaImage>,
}

/// Dispatches render requests onto the blocking thread pool.
#[derive(Clone)]
pub struct RenderScheduler {
    renderer: PageRenderer,
}

impl RenderScheduler {
    pub fn new(rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self {
            renderer: PageRenderer::new(rasterizer),
        }
    }

    /// Start one task per job. Must be called from within a Tokio runtime.
    #[instrument(skip(self, request), fields(generation = request.generation, jobs = request.jobs.len()))]
    pub fn dispatch(&self, request: RenderRequest) -> RenderBatch {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut tasks = JoinSet::new();
        let expected: BTreeSet<usize> = request.jobs.iter().map(|job| job.page_index).collect();
        let generation = request.generation;

        for job in request.jobs {
            let tx = tx.clone();
            let renderer = self.renderer.clone();
            let pdf = Arc::clone(&request.pdf);
            let zoom = request.zoom;
            tasks.spawn_blocking(move || {
                let result = renderer.render(
                    &pdf,
                    job.page_index,
                    zoom,
                    &job.reference,
                    job.clip.as_ref(),
                );
                // The receiver is gone only when the batch was dropped.
                let _ = tx.send(PageRenderOutcome {
                    generation,
                    page_index: job.page_index,
                    result,
                });
            });
        }

        debug!(backend = self.renderer.backend(), "Render batch dispatched");
        RenderBatch {
            generation,
            pending: expected,
            rx,
            _tasks: tasks,
        }
    }
}

/// Handle on an in-flight batch.
///
/// Dropping it detaches from the batch: running tasks finish and their results
/// are discarded.
pub struct RenderBatch {
    generation: u64,
    pending: BTreeSet<usize>,
    rx: mpsc::UnboundedReceiver<PageRenderOutcome>,
    _tasks: JoinSet<()>,
}

impl RenderBatch {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Pages that have not reported yet.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Next result in completion order, or `None` once every page reported.
    ///
    /// A worker that died without reporting (a panicking rasterizer) is
    /// reported as a render failure for its page.
    pub async fn next(&mut self) -> Option<PageRenderOutcome> {
        if self.pending.is_empty() {
            return None;
        }
        match self.rx.recv().await {
            Some(outcome) => {
                self.pending.remove(&outcome.page_index);
                Some(outcome)
            }
            None => {
                let page_index = self.pending.pop_first()?;
                warn!(page_index, "Render task ended without a result");
                Some(PageRenderOutcome {
                    generation: self.generation,
                    page_index,
                    result: Err(EditorError::Render {
                        page: page_index,
                        detail: "render task ended without a result".into(),
                    }),
                })
            }
        }
    }

    /// Wait for every page of the batch.
    pub async fn join(mut self) -> Vec<PageRenderOutcome> {
        let mut outcomes = Vec::with_capacity(self.pending.len());
        while let Some(outcome) = self.next().await {
            outcomes.push(outcome);
        }
        outcomes
    }
}
