// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Blank document builder — produces small, valid PDFs with pages of chosen
// size, rotation, and crop box. Used for fixtures and benchmarks.

use lopdf::{Dictionary, Document, Object, Stream};
use pagecrop_core::error::{EditorError, Result};
use tracing::debug;

/// Geometry of one generated page, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlankPage {
    pub width: f64,
    pub height: f64,
    pub rotation: i64,
    pub crop_box: Option<[f64; 4]>,
}

impl BlankPage {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            rotation: 0,
            crop_box: None,
        }
    }

    /// A4 portrait.
    pub fn a4() -> Self {
        Self::new(595.0, 842.0)
    }

    pub fn rotated(self, rotation: i64) -> Self {
        Self { rotation, ..self }
    }

    pub fn with_crop_box(self, crop_box: [f64; 4]) -> Self {
        Self {
            crop_box: Some(crop_box),
            ..self
        }
    }
}

/// Serialize a document containing one empty page per entry of `pages`.
pub fn blank_document(pages: &[BlankPage]) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::with_capacity(pages.len());
    for page in pages {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), Vec::new()));

        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"Page".to_vec()));
        dict.set("Parent", Object::Reference(pages_id));
        dict.set("MediaBox", rect([0.0, 0.0, page.width, page.height]));
        if let Some(crop_box) = page.crop_box {
            dict.set("CropBox", rect(crop_box));
        }
        if page.rotation != 0 {
            dict.set("Rotate", Object::Integer(page.rotation));
        }
        dict.set("Contents", Object::Reference(content_id));
        dict.set("Resources", Object::Dictionary(Dictionary::new()));

        kids.push(Object::Reference(doc.add_object(dict)));
    }

    let mut tree = Dictionary::new();
    tree.set("Type", Object::Name(b"Pages".to_vec()));
    tree.set("Count", Object::Integer(pages.len() as i64));
    tree.set("Kids", Object::Array(kids));
    doc.objects.insert(pages_id, Object::Dictionary(tree));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|err| EditorError::Pdf(format!("failed to serialise blank PDF: {}", err)))?;

    debug!(pages = pages.len(), output_bytes = output.len(), "Blank PDF built");
    Ok(output)
}

fn rect(values: [f64; 4]) -> Object {
    Object::Array(values.iter().map(|v| Object::Real(*v as _)).collect())
}
