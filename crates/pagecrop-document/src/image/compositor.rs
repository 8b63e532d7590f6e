// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay compositor — stacks page rasters, centered, onto one transparent
// canvas. The first available page of a group is drawn opaque; every later
// page is drawn at OVERLAY_OPACITY with source-over blending, in page order.
//
// Canvases for every group are sized by the maximum over all available pages,
// so the odd and even composites share one coordinate system.

use image::{Rgba, RgbaImage};
use pagecrop_core::{
    CanvasDimensions, PageDimensions, PageGroup, canvas_dims, centering_offset,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Opacity of every page after the first in a composite.
pub const OVERLAY_OPACITY: f32 = 0.2;

/// Which pages a composite covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayGroup {
    All,
    Odd,
    Even,
}

impl OverlayGroup {
    pub fn includes(&self, index: usize) -> bool {
        match self {
            Self::All => true,
            Self::Odd => PageGroup::Odd.contains(index),
            Self::Even => PageGroup::Even.contains(index),
        }
    }
}

/// One page's placement in a composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeLayer {
    pub page_index: usize,
    pub opacity: f32,
    /// Top-left corner of the page on the canvas; negative when the page is
    /// larger than the canvas on that axis.
    pub offset: (i64, i64),
}

/// A rendered composite and the layers it was painted from, bottom first.
#[derive(Debug, Clone)]
pub struct Composite {
    pub group: OverlayGroup,
    pub canvas: CanvasDimensions,
    pub layers: Vec<CompositeLayer>,
    pub image: RgbaImage,
}

/// Paint order for the pages of `group`.
///
/// `rasters` is indexed by page; `None` entries are pages without a raster
/// and are skipped. The canvas is computed over every available raster,
/// whatever the group.
pub fn plan_layers(
    rasters: &[Option<PageDimensions>],
    group: OverlayGroup,
) -> Option<(CanvasDimensions, Vec<CompositeLayer>)> {
    let canvas = canvas_dims(rasters.iter().flatten().copied())?;
    let layers: Vec<CompositeLayer> = rasters
        .iter()
        .enumerate()
        .filter(|(index, _)| group.includes(*index))
        .filter_map(|(index, dims)| dims.map(|dims| (index, dims)))
        .enumerate()
        .map(|(position, (page_index, dims))| CompositeLayer {
            page_index,
            opacity: if position == 0 { 1.0 } else { OVERLAY_OPACITY },
            offset: centering_offset(canvas, dims),
        })
        .collect();
    if layers.is_empty() {
        return None;
    }
    Some((canvas, layers))
}

/// Composite the pages of `group`, or `None` when the group has no raster.
#[instrument(skip(rasters), fields(pages = rasters.len()))]
pub fn compose(rasters: &[Option<RgbaImage>], group: OverlayGroup) -> Option<Composite> {
    let dims: Vec<Option<PageDimensions>> = rasters
        .iter()
        .map(|raster| {
            raster
                .as_ref()
                .map(|image| PageDimensions::new(image.width(), image.height()))
        })
        .collect();
    let (canvas, layers) = plan_layers(&dims, group)?;

    let mut image = RgbaImage::new(canvas.max_width, canvas.max_height);
    for layer in &layers {
        if let Some(raster) = rasters.get(layer.page_index).and_then(Option::as_ref) {
            blend_onto(&mut image, raster, layer.offset, layer.opacity);
        }
    }

    debug!(
        ?group,
        width = canvas.max_width,
        height = canvas.max_height,
        layers = layers.len(),
        "Composite built"
    );
    Some(Composite {
        group,
        canvas,
        layers,
        image,
    })
}

/// Source-over blend `source`, scaled by `opacity`, onto `canvas` with its
/// top-left corner at `offset`. Parts falling outside the canvas are dropped.
pub fn blend_onto(canvas: &mut RgbaImage, source: &RgbaImage, offset: (i64, i64), opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    let (canvas_w, canvas_h) = (i64::from(canvas.width()), i64::from(canvas.height()));

    for (x, y, pixel) in source.enumerate_pixels() {
        let cx = i64::from(x) + offset.0;
        let cy = i64::from(y) + offset.1;
        if cx < 0 || cy < 0 || cx >= canvas_w || cy >= canvas_h {
            continue;
        }
        let dst = canvas.get_pixel_mut(cx as u32, cy as u32);
        *dst = source_over(*pixel, *dst, opacity);
    }
}

fn source_over(src: Rgba<u8>, dst: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let src_a = f32::from(src.0[3]) / 255.0 * opacity;
    let dst_a = f32::from(dst.0[3]) / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |s: u8, d: u8| -> u8 {
        let value =
            (f32::from(s) * src_a + f32::from(d) * dst_a * (1.0 - src_a)) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(src.0[0], dst.0[0]),
        channel(src.0[1], dst.0[1]),
        channel(src.0[2], dst.0[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    fn close(actual: Rgba<u8>, expected: [u8; 4]) -> bool {
        actual
            .0
            .iter()
            .zip(expected)
            .all(|(a, e)| (i16::from(*a) - i16::from(e)).abs() <= 1)
    }

    #[test]
    fn first_page_is_opaque_and_later_pages_faint() {
        let rasters = vec![
            Some(solid(10, 10, [255, 0, 0])),
            Some(solid(10, 10, [0, 255, 0])),
            Some(solid(10, 10, [0, 0, 255])),
        ];
        let composite = compose(&rasters, OverlayGroup::All).unwrap();

        let order: Vec<_> = composite
            .layers
            .iter()
            .map(|layer| (layer.page_index, layer.opacity))
            .collect();
        assert_eq!(order, vec![(0, 1.0), (1, 0.2), (2, 0.2)]);

        // red, then 20% green, then 20% blue on top.
        let pixel = *composite.image.get_pixel(5, 5);
        assert!(close(pixel, [163, 41, 51, 255]), "{pixel:?}");
    }

    #[test]
    fn faint_layer_blends_with_the_page_below() {
        let mut canvas = solid(2, 2, [255, 255, 255]);
        blend_onto(&mut canvas, &solid(2, 2, [0, 0, 0]), (0, 0), OVERLAY_OPACITY);
        assert_eq!(canvas.get_pixel(0, 0).0, [204, 204, 204, 255]);

        // On a transparent canvas the color survives and only alpha drops.
        let mut empty = RgbaImage::new(1, 1);
        blend_onto(&mut empty, &solid(1, 1, [100, 150, 200]), (0, 0), OVERLAY_OPACITY);
        assert_eq!(empty.get_pixel(0, 0).0, [100, 150, 200, 51]);

        // Source alpha and layer opacity multiply.
        let mut paper = solid(1, 1, [255, 255, 255]);
        let half = RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128]));
        blend_onto(&mut paper, &half, (0, 0), 0.5);
        assert!(close(*paper.get_pixel(0, 0), [191, 191, 191, 255]));
    }

    #[test]
    fn pages_are_centered_on_a_global_canvas() {
        let rasters = vec![Some(solid(100, 150, [0, 0, 0])), Some(solid(120, 150, [0, 0, 0]))];

        let odd = compose(&rasters, OverlayGroup::Odd).unwrap();
        let even = compose(&rasters, OverlayGroup::Even).unwrap();

        assert_eq!(odd.canvas, CanvasDimensions::new(120, 150));
        assert_eq!(odd.canvas, even.canvas);
        assert_eq!(odd.layers[0].offset, (10, 0));
        assert_eq!(even.layers[0].offset, (0, 0));
        // Outside the narrower page the odd canvas stays transparent.
        assert_eq!(odd.image.get_pixel(5, 5).0[3], 0);
        assert_eq!(odd.image.get_pixel(15, 5).0[3], 255);
    }

    #[test]
    fn groups_pick_alternating_pages() {
        let dims = vec![Some(PageDimensions::new(10, 10)); 5];
        let (_, odd) = plan_layers(&dims, OverlayGroup::Odd).unwrap();
        let (_, even) = plan_layers(&dims, OverlayGroup::Even).unwrap();
        let indices = |layers: &[CompositeLayer]| -> Vec<usize> {
            layers.iter().map(|layer| layer.page_index).collect()
        };
        assert_eq!(indices(&odd), vec![0, 2, 4]);
        assert_eq!(indices(&even), vec![1, 3]);
        assert_eq!(even[0].opacity, 1.0);
    }

    #[test]
    fn missing_rasters_are_skipped() {
        let rasters = vec![None, Some(solid(8, 8, [10, 20, 30])), None];
        let composite = compose(&rasters, OverlayGroup::All).unwrap();
        assert_eq!(composite.layers.len(), 1);
        assert_eq!(composite.layers[0].page_index, 1);
        assert_eq!(composite.layers[0].opacity, 1.0);

        // Page 1 is the only even page; the odd group has nothing to show.
        assert!(compose(&rasters, OverlayGroup::Odd).is_none());
    }

    #[test]
    fn empty_page_set_composes_nothing() {
        assert!(compose(&[], OverlayGroup::All).is_none());
        assert!(compose(&[None, None], OverlayGroup::All).is_none());
    }

    #[test]
    fn oversized_pages_are_clipped_to_the_canvas() {
        let mut canvas = RgbaImage::new(4, 4);
        blend_onto(&mut canvas, &solid(6, 6, [9, 9, 9]), (-1, -1), 1.0);
        assert!(canvas.pixels().all(|pixel| pixel.0 == [9, 9, 9, 255]));
    }
}
