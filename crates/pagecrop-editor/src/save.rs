// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Save worker — writes a detached `SaveJob` to disk. Runs on a blocking
// thread; touches no session state.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use pagecrop_core::error::Result;
use pagecrop_document::PdfContainer;
use tracing::{info, instrument};

use crate::session::SaveJob;
use crate::undo::hash_bytes;

/// What a completed save wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub path: PathBuf,
    pub bytes_written: u64,
    /// Pages that received a crop box.
    pub cropped_pages: usize,
    /// SHA-256 of the source bytes the save was made from.
    pub source_digest: String,
    pub saved_at: DateTime<Utc>,
}

/// Apply the job's crop boxes to a private copy of the document and write it
/// with the job's serialization options.
#[instrument(skip(job), fields(path = %job.path.display(), bytes_len = job.pdf.len()))]
pub fn write_document(job: &SaveJob) -> Result<SaveReport> {
    let mut container = PdfContainer::from_bytes(&job.pdf)?;

    let mut cropped_pages = 0;
    for (index, clip) in job.clips.iter().enumerate() {
        if let Some(clip) = clip {
            container.set_crop_box(index, clip)?;
            cropped_pages += 1;
        }
    }

    let bytes_written = container.save(&job.path, &job.options)?;
    info!(bytes_written, cropped_pages, "Document written");

    Ok(SaveReport {
        path: job.path.clone(),
        bytes_written,
        cropped_pages,
        source_digest: hash_bytes(&job.pdf),
        saved_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecrop_core::{PdfRect, SaveOptions};
    use pagecrop_document::pdf::{BlankPage, blank_document};

    fn job(dir: &std::path::Path, clips: Vec<Option<PdfRect>>, options: SaveOptions) -> SaveJob {
        SaveJob {
            pdf: blank_document(&[BlankPage::new(200.0, 300.0), BlankPage::new(200.0, 300.0)])
                .unwrap(),
            clips,
            path: dir.join("saved.pdf"),
            options,
        }
    }

    #[test]
    fn crop_boxes_are_written_per_page() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(
            dir.path(),
            vec![None, Some(PdfRect::new(20.0, 30.0, 120.0, 230.0))],
            SaveOptions::default(),
        );

        let report = write_document(&job).unwrap();

        assert_eq!(report.cropped_pages, 1);
        assert_eq!(report.source_digest, hash_bytes(&job.pdf));
        assert_eq!(
            report.bytes_written,
            std::fs::metadata(&report.path).unwrap().len()
        );
        let saved = PdfContainer::open(&report.path).unwrap();
        let untouched = saved.page_reference(0).unwrap();
        let cropped = saved.page_reference(1).unwrap();
        assert_eq!(untouched.visual_rect, PdfRect::new(0.0, 0.0, 200.0, 300.0));
        assert!(cropped.visual_rect.approx_eq(&PdfRect::new(0.0, 0.0, 100.0, 200.0), 1e-6));
    }

    #[test]
    fn compressed_save_still_opens() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(
            dir.path(),
            Vec::new(),
            SaveOptions {
                garbage_level: 2,
                compress: true,
            },
        );

        let report = write_document(&job).unwrap();

        assert_eq!(report.cropped_pages, 0);
        assert_eq!(PdfContainer::open(&report.path).unwrap().page_count(), 2);
    }

    #[test]
    fn missing_directory_is_a_save_error() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(&dir.path().join("missing"), Vec::new(), SaveOptions::default());

        let err = write_document(&job).unwrap_err();

        assert_eq!(err.kind(), pagecrop_core::ErrorKind::Document);
    }
}
