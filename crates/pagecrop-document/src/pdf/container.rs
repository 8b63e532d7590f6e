// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF container — open, inspect, and mutate an editable PDF document using
// the `lopdf` crate.
//
// Every public method takes 0-based page indices. Rectangles passed in are in
// physical page space: points, origin at the top-left corner of the page's
// effective box, y growing downward. The conversion to PDF user space
// (origin bottom-left, y up) happens here and nowhere else.

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pagecrop_core::error::{EditorError, Result};
use pagecrop_core::{PageReference, PdfRect, Rgb, SaveOptions};
use tracing::{debug, info, instrument, warn};

/// US Letter, used when neither the page nor any ancestor has a `/MediaBox`.
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Upper bound on `/Parent` hops when resolving inherited attributes.
const MAX_TREE_DEPTH: usize = 64;

/// An open, editable PDF document.
///
/// Wraps `lopdf::Document` and exposes the primitives the editor needs: page
/// geometry, opaque rectangle fills, crop boxes, page deletion, and
/// serialization.
#[derive(Debug, Clone)]
pub struct PdfContainer {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file.
    source_path: Option<PathBuf>,
}

impl PdfContainer {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            EditorError::Open(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self {
            document,
            source_path: Some(path_ref.to_path_buf()),
        })
    }

    /// Load a document from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            EditorError::Open(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self {
            document,
            source_path: None,
        })
    }

    /// Remember where this document came from (used for default save names).
    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Source path, if the container was created via [`PdfContainer::open`].
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Visual rectangle and derotation for page `index`.
    pub fn page_reference(&self, index: usize) -> Result<PageReference> {
        let page_id = self.page_id(index)?;
        let bounds = self.effective_box(page_id);
        let rotation = self
            .inherited_attribute(page_id, b"Rotate")
            .and_then(|value| value.as_i64().ok())
            .unwrap_or(0);
        Ok(PageReference::from_box(
            bounds[2] - bounds[0],
            bounds[3] - bounds[1],
            rotation,
        ))
    }

    /// [`PdfContainer::page_reference`] for every page, in order.
    pub fn page_references(&self) -> Result<Vec<PageReference>> {
        (0..self.page_count())
            .map(|index| self.page_reference(index))
            .collect()
    }

    // -- Mutation -------------------------------------------------------------

    /// Fill `rect` (physical page space) on page `index` with an opaque color.
    ///
    /// The existing content is wrapped in `q`/`Q` so whatever graphics state it
    /// leaves behind cannot leak into the fill.
    #[instrument(skip(self), fields(index, color = %color))]
    pub fn draw_filled_rect(&mut self, index: usize, rect: &PdfRect, color: Rgb) -> Result<()> {
        let page_id = self.page_id(index)?;
        let [llx, lly, urx, ury] = self.to_user_space(page_id, rect);
        let [r, g, b] = color.to_unit();

        let fill = Content {
            operations: vec![
                Operation::new("Q", vec![]),
                Operation::new("q", vec![]),
                Operation::new("rg", vec![real(r.into()), real(g.into()), real(b.into())]),
                Operation::new(
                    "re",
                    vec![real(llx), real(lly), real(urx - llx), real(ury - lly)],
                ),
                Operation::new("f", vec![]),
                Operation::new("Q", vec![]),
            ],
        };
        let fill_bytes = fill.encode().map_err(|err| {
            EditorError::Pdf(format!("failed to encode fill for page {}: {}", index, err))
        })?;

        let existing = self.content_parts(page_id);
        let open_id = self
            .document
            .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let fill_id = self
            .document
            .add_object(Stream::new(Dictionary::new(), fill_bytes));

        let mut parts = Vec::with_capacity(existing.len() + 2);
        parts.push(Object::Reference(open_id));
        parts.extend(existing);
        parts.push(Object::Reference(fill_id));

        self.page_dictionary_mut(page_id)?
            .set("Contents", Object::Array(parts));

        debug!(llx, lly, urx, ury, "Filled rectangle");
        Ok(())
    }

    /// Set page `index`'s `/CropBox` to `rect` (physical page space).
    #[instrument(skip(self), fields(index))]
    pub fn set_crop_box(&mut self, index: usize, rect: &PdfRect) -> Result<()> {
        let page_id = self.page_id(index)?;
        let [llx, lly, urx, ury] = self.to_user_space(page_id, rect);
        if urx - llx <= 0.0 || ury - lly <= 0.0 {
            warn!(index, "Crop box is empty, page will render blank");
        }
        self.page_dictionary_mut(page_id)?.set(
            "CropBox",
            Object::Array(vec![real(llx), real(lly), real(urx), real(ury)]),
        );
        debug!(llx, lly, urx, ury, "Crop box set");
        Ok(())
    }

    /// Remove page `index`. Later pages shift down by one.
    #[instrument(skip(self), fields(index))]
    pub fn delete_page(&mut self, index: usize) -> Result<()> {
        let count = self.page_count();
        if index >= count {
            return Err(EditorError::PageOutOfRange { index, count });
        }
        // lopdf pages are keyed by 1-indexed page number.
        self.document.delete_pages(&[index as u32 + 1]);

        let remaining = self.page_count();
        if remaining + 1 != count {
            return Err(EditorError::Pdf(format!(
                "deleting page {} left {} of {} pages",
                index, remaining, count
            )));
        }
        debug!(remaining, "Page deleted");
        Ok(())
    }

    // -- Output ---------------------------------------------------------------

    /// Serialize the document.
    ///
    /// `garbage_level` 1 drops unreachable objects, 2 and above also renumbers
    /// the survivors. `compress` deflates streams that are not yet compressed.
    #[instrument(skip(self), fields(garbage = options.garbage_level, compress = options.compress))]
    pub fn to_bytes(&self, options: &SaveOptions) -> Result<Vec<u8>> {
        let mut doc = self.document.clone();
        if options.garbage_level >= 1 {
            let pruned = doc.prune_objects();
            debug!(pruned = pruned.len(), "Unreachable objects removed");
        }
        if options.garbage_level >= 2 {
            doc.renumber_objects();
        }
        if options.compress {
            doc.compress();
        }

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|err| EditorError::Pdf(format!("failed to serialise PDF: {}", err)))?;

        debug!(output_bytes = output.len(), "PDF serialised");
        Ok(output)
    }

    /// Uncollected, uncompressed serialization used for undo snapshots and
    /// for handing the document to render workers.
    pub fn snapshot(&self) -> Result<Vec<u8>> {
        self.to_bytes(&SaveOptions::SNAPSHOT)
    }

    /// Write the document to `path`, returning the number of bytes written.
    #[instrument(skip(self, options), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>, options: &SaveOptions) -> Result<u64> {
        let path_ref = path.as_ref();
        let bytes = self.to_bytes(options)?;
        std::fs::write(path_ref, &bytes).map_err(|err| {
            EditorError::Save(format!("failed to write {}: {}", path_ref.display(), err))
        })?;
        info!(bytes = bytes.len(), "PDF saved to {}", path_ref.display());
        Ok(bytes.len() as u64)
    }

    // -- Helpers --------------------------------------------------------------

    fn page_id(&self, index: usize) -> Result<ObjectId> {
        let pages = self.document.get_pages();
        pages
            .get(&(index as u32 + 1))
            .copied()
            .ok_or(EditorError::PageOutOfRange {
                index,
                count: pages.len(),
            })
    }

    fn page_dictionary_mut(&mut self, page_id: ObjectId) -> Result<&mut Dictionary> {
        self.document.get_dictionary_mut(page_id).map_err(|err| {
            EditorError::Pdf(format!("page object {:?} is not a dictionary: {}", page_id, err))
        })
    }

    /// Follow a reference to the object it names; other objects pass through.
    fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        match object {
            Object::Reference(id) => self.document.get_object(*id).unwrap_or(object),
            other => other,
        }
    }

    /// Look `key` up on the page, then on each ancestor in the page tree.
    fn inherited_attribute(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = Some(page_id);
        for _ in 0..MAX_TREE_DEPTH {
            let dict = self.document.get_dictionary(current?).ok()?;
            if let Ok(value) = dict.get(key) {
                return Some(self.resolve(value));
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }
        warn!(?page_id, "Page tree too deep while resolving attribute");
        None
    }

    fn rect_attribute(&self, page_id: ObjectId, key: &[u8]) -> Option<[f64; 4]> {
        let items = self.inherited_attribute(page_id, key)?.as_array().ok()?;
        if items.len() != 4 {
            return None;
        }
        let mut values = [0.0; 4];
        for (slot, item) in values.iter_mut().zip(items) {
            *slot = number(self.resolve(item))?;
        }
        Some([
            values[0].min(values[2]),
            values[1].min(values[3]),
            values[0].max(values[2]),
            values[1].max(values[3]),
        ])
    }

    /// The page's effective box in user space: the crop box clipped to the
    /// media box, or the media box alone.
    fn effective_box(&self, page_id: ObjectId) -> [f64; 4] {
        let media = self
            .rect_attribute(page_id, b"MediaBox")
            .unwrap_or(DEFAULT_MEDIA_BOX);
        match self.rect_attribute(page_id, b"CropBox") {
            Some(crop) => {
                let clipped = [
                    crop[0].max(media[0]),
                    crop[1].max(media[1]),
                    crop[2].min(media[2]),
                    crop[3].min(media[3]),
                ];
                if clipped[2] > clipped[0] && clipped[3] > clipped[1] {
                    clipped
                } else {
                    media
                }
            }
            None => media,
        }
    }

    /// Physical page-space rectangle to `[llx, lly, urx, ury]` in user space.
    fn to_user_space(&self, page_id: ObjectId, rect: &PdfRect) -> [f64; 4] {
        let [bx0, _, _, by1] = self.effective_box(page_id);
        [bx0 + rect.x0, by1 - rect.y1, bx0 + rect.x1, by1 - rect.y0]
    }

    /// The page's content streams as a flat list of references.
    fn content_parts(&self, page_id: ObjectId) -> Vec<Object> {
        let Ok(dict) = self.document.get_dictionary(page_id) else {
            return Vec::new();
        };
        match dict.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.document.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(*value as f64),
        _ => None,
    }
}

fn real(value: f64) -> Object {
    Object::Real(value as _)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::blank::{BlankPage, blank_document};

    fn three_pages() -> PdfContainer {
        let bytes = blank_document(&[
            BlankPage::new(595.0, 842.0),
            BlankPage::new(612.0, 792.0).rotated(90),
            BlankPage::new(300.0, 400.0),
        ])
        .unwrap();
        PdfContainer::from_bytes(&bytes).unwrap()
    }

    fn crop_box(container: &PdfContainer, index: usize) -> Vec<f64> {
        let page_id = container.page_id(index).unwrap();
        let dict = container.document.get_dictionary(page_id).unwrap();
        dict.get(b"CropBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|item| number(item).unwrap())
            .collect()
    }

    #[test]
    fn garbage_bytes_fail_to_open() {
        let err = PdfContainer::from_bytes(b"not a pdf").err().unwrap();
        assert!(matches!(err, EditorError::Open(_)));
    }

    #[test]
    fn page_references_reflect_box_and_rotation() {
        let container = three_pages();
        assert_eq!(container.page_count(), 3);

        let first = container.page_reference(0).unwrap();
        assert_eq!(first.visual_rect, PdfRect::new(0.0, 0.0, 595.0, 842.0));
        assert_eq!(first.rotation, 0);

        let rotated = container.page_reference(1).unwrap();
        assert_eq!(rotated.rotation, 90);
        assert_eq!(rotated.visual_rect, PdfRect::new(0.0, 0.0, 792.0, 612.0));

        assert!(matches!(
            container.page_reference(3),
            Err(EditorError::PageOutOfRange { index: 3, count: 3 })
        ));
    }

    #[test]
    fn crop_box_overrides_media_box() {
        let bytes = blank_document(&[
            BlankPage::new(600.0, 800.0).with_crop_box([50.0, 100.0, 550.0, 700.0])
        ])
        .unwrap();
        let container = PdfContainer::from_bytes(&bytes).unwrap();
        let reference = container.page_reference(0).unwrap();
        assert_eq!(reference.visual_rect, PdfRect::new(0.0, 0.0, 500.0, 600.0));
    }

    #[test]
    fn attributes_are_inherited_from_the_page_tree() {
        let mut container = three_pages();
        let page_id = container.page_id(2).unwrap();
        let parent = container
            .document
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Parent")
            .unwrap()
            .as_reference()
            .unwrap();

        container
            .page_dictionary_mut(page_id)
            .unwrap()
            .remove(b"MediaBox");
        let pages = container.document.get_dictionary_mut(parent).unwrap();
        pages.set(
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(200),
                Object::Integer(100),
            ]),
        );
        pages.set("Rotate", Object::Integer(180));

        let reference = container.page_reference(2).unwrap();
        assert_eq!(reference.visual_rect, PdfRect::new(0.0, 0.0, 200.0, 100.0));
        assert_eq!(reference.rotation, 180);
    }

    #[test]
    fn crop_box_is_written_in_user_space() {
        let mut container = three_pages();
        // Top-left 100x50 of a 595x842 page.
        container
            .set_crop_box(0, &PdfRect::new(0.0, 0.0, 100.0, 50.0))
            .unwrap();
        assert_eq!(crop_box(&container, 0), vec![0.0, 792.0, 100.0, 842.0]);

        // The new box becomes the effective box.
        let reference = container.page_reference(0).unwrap();
        assert_eq!(reference.visual_rect, PdfRect::new(0.0, 0.0, 100.0, 50.0));
    }

    #[test]
    fn fill_wraps_existing_content() {
        let mut container = three_pages();
        container
            .draw_filled_rect(0, &PdfRect::new(10.0, 20.0, 110.0, 70.0), Rgb::BLACK)
            .unwrap();
        container
            .draw_filled_rect(0, &PdfRect::new(0.0, 0.0, 5.0, 5.0), Rgb::WHITE)
            .unwrap();

        let page_id = container.page_id(0).unwrap();
        let parts = container.content_parts(page_id);
        // Two wrappers in front, original stream, two fills behind.
        assert_eq!(parts.len(), 5);

        let content = container.document.get_page_content(page_id).unwrap();
        let text = String::from_utf8_lossy(&content);
        assert!(text.starts_with('q'), "{text}");
        assert_eq!(text.matches(" re").count(), 2, "{text}");
        assert_eq!(text.matches('q').count(), text.matches('Q').count());
    }

    #[test]
    fn deleting_shifts_later_pages() {
        let mut container = three_pages();
        container.delete_page(1).unwrap();
        assert_eq!(container.page_count(), 2);
        let second = container.page_reference(1).unwrap();
        assert_eq!(second.visual_rect, PdfRect::new(0.0, 0.0, 300.0, 400.0));

        assert!(matches!(
            container.delete_page(2),
            Err(EditorError::PageOutOfRange { index: 2, count: 2 })
        ));
    }

    #[test]
    fn snapshot_round_trips() {
        let mut container = three_pages();
        container.delete_page(0).unwrap();
        let bytes = container.snapshot().unwrap();
        let restored = PdfContainer::from_bytes(&bytes).unwrap();
        assert_eq!(restored.page_count(), 2);
        assert_eq!(
            restored.page_reference(0).unwrap(),
            container.page_reference(0).unwrap()
        );
        // Serialization of an unchanged document is deterministic.
        assert_eq!(container.snapshot().unwrap(), bytes);
    }

    #[test]
    fn garbage_collection_keeps_pages() {
        let mut container = three_pages();
        container
            .draw_filled_rect(2, &PdfRect::new(0.0, 0.0, 10.0, 10.0), Rgb::WHITE)
            .unwrap();
        container.delete_page(0).unwrap();

        let compact = container
            .to_bytes(&SaveOptions {
                garbage_level: 2,
                compress: true,
            })
            .unwrap();
        let reloaded = PdfContainer::from_bytes(&compact).unwrap();
        assert_eq!(reloaded.page_count(), 2);
    }

    #[test]
    fn save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let written = three_pages().save(&path, &SaveOptions::default()).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), written);
        assert_eq!(PdfContainer::open(&path).unwrap().page_count(), 3);
    }
}
