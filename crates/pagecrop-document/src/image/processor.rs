// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster processor — crop, thumbnail, color sampling, and PNG output for page
// rasters and overlay composites. Operates on in-memory RGBA images using the
// `image` crate.

use std::path::Path;

use image::{DynamicImage, ImageFormat, RgbaImage};
use pagecrop_core::error::{EditorError, Result};
use pagecrop_core::{PageDimensions, Rgb};
use tracing::{debug, instrument};

/// Processing pipeline over one RGBA raster.
///
/// Transformations consume `self` and return a new processor, so calls chain:
///
/// ```ignore
/// let thumb = RasterProcessor::from_rgba(page)
///     .crop(10, 10, 400, 600)
///     .thumbnail(80, 120)
///     .into_rgba();
/// ```
pub struct RasterProcessor {
    image: RgbaImage,
}

impl RasterProcessor {
    // -- Construction ---------------------------------------------------------

    pub fn from_rgba(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Decode PNG (or any supported format) bytes.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(data)
            .map_err(|err| EditorError::Image(format!("failed to decode image: {}", err)))?;
        Ok(Self {
            image: image.to_rgba8(),
        })
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> PageDimensions {
        PageDimensions::new(self.image.width(), self.image.height())
    }

    pub fn as_rgba(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_rgba(self) -> RgbaImage {
        self.image
    }

    /// Opaque color of the pixel at `(x, y)`. See [`sample_color`].
    pub fn pixel_color(&self, x: u32, y: u32) -> Option<Rgb> {
        sample_color(&self.image, x, y)
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Crop a rectangular region. Values are clamped to image bounds.
    #[instrument(skip(self), fields(x, y, width, height))]
    pub fn crop(self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let img_w = self.image.width();
        let img_h = self.image.height();

        let safe_x = x.min(img_w.saturating_sub(1));
        let safe_y = y.min(img_h.saturating_sub(1));
        let safe_w = width.min(img_w - safe_x);
        let safe_h = height.min(img_h - safe_y);

        debug!(safe_x, safe_y, safe_w, safe_h, "Cropping raster");

        let cropped = image::imageops::crop_imm(&self.image, safe_x, safe_y, safe_w, safe_h);
        Self {
            image: cropped.to_image(),
        }
    }

    /// Scale down to fit within `max_width` × `max_height`, preserving aspect
    /// ratio. Images already inside the box are returned unchanged.
    #[instrument(skip(self), fields(max_width, max_height))]
    pub fn thumbnail(self, max_width: u32, max_height: u32) -> Self {
        if self.image.width() <= max_width && self.image.height() <= max_height {
            return self;
        }
        let resized = DynamicImage::ImageRgba8(self.image).resize(
            max_width.max(1),
            max_height.max(1),
            image::imageops::FilterType::Triangle,
        );
        debug!(
            new_w = resized.width(),
            new_h = resized.height(),
            "Thumbnail scaled"
        );
        Self {
            image: resized.to_rgba8(),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buffer);
        self.image
            .write_to(&mut cursor, ImageFormat::Png)
            .map_err(|err| EditorError::Image(format!("PNG encoding failed: {}", err)))?;
        Ok(buffer)
    }

    /// Write the image to a file. The format is inferred from the extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.image.save(path.as_ref()).map_err(|err| {
            EditorError::Image(format!(
                "failed to save image to {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }
}

/// Color of the pixel at `(x, y)` with alpha dropped, or `None` outside the
/// image or on a fully transparent pixel.
pub fn sample_color(image: &RgbaImage, x: u32, y: u32) -> Option<Rgb> {
    let [r, g, b, a] = image.get_pixel_checked(x, y)?.0;
    (a > 0).then(|| Rgb::new(r, g, b))
}
