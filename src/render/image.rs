//! Scene rasterization using tiny-skia
//!
//! Flattens a visual tree into one RgbaImage, drawing every tile's image with
//! its cover fit and content transform applied and clipped to the tile.

use std::collections::HashMap;

use image::RgbaImage;
use tiny_skia::{
    Color, FilterQuality, IntSize, Paint, Pattern, Pixmap, SpreadMode, Transform,
};

use super::geometry::{cover_rect, transform_about_center};
use super::scene::{ExclusionFilter, ImageContent, NodeContent, SceneNode};
use crate::domain::{PixelRect, Point, ResourceHandle};
use crate::export::ExportError;

/// Fill used where an image could not be loaded
pub const PLACEHOLDER_RGBA: [u8; 4] = [0xe5, 0xe7, 0xeb, 0xff];

/// Rasterization parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    /// Output pixels per logical pixel
    pub supersample: f32,
    pub background: [u8; 4],
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            supersample: 2.0,
            background: [255, 255, 255, 255],
        }
    }
}

/// Convert a straight-alpha image into a premultiplied pixmap
pub fn rgba_to_pixmap(img: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(img.width(), img.height())?;
    let mut data = img.as_raw().clone();
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }
    Pixmap::from_vec(data, size)
}

/// Convert a premultiplied pixmap back into a straight-alpha image
pub fn pixmap_to_rgba(pixmap: &Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

fn to_skia_rect(rect: PixelRect) -> Option<tiny_skia::Rect> {
    tiny_skia::Rect::from_xywh(rect.left, rect.top, rect.width, rect.height)
}

fn fill(pixmap: &mut Pixmap, rect: PixelRect, rgba: [u8; 4]) {
    let Some(rect) = to_skia_rect(rect) else {
        return;
    };
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]);
    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
}

/// Draw a cover-fitted, transformed image clipped to `cell` (canvas pixels)
fn draw_image(pixmap: &mut Pixmap, cell: PixelRect, source: &Pixmap, content: &ImageContent, ss: f32) {
    let cover = cover_rect(source.width(), source.height(), cell);
    let pan = Point::new(content.pan.x * ss, content.pan.y * ss);
    let placed = transform_about_center(cover, cell.center(), content.scale, pan);
    let Some(visible) = placed.intersect(cell).and_then(to_skia_rect) else {
        return;
    };

    let sx = placed.width / source.width() as f32;
    let sy = placed.height / source.height() as f32;
    let mut paint = Paint::default();
    paint.anti_alias = true;
    paint.shader = Pattern::new(
        source.as_ref(),
        SpreadMode::Pad,
        FilterQuality::Bilinear,
        1.0,
        Transform::from_row(sx, 0.0, 0.0, sy, placed.left, placed.top),
    );
    pixmap.fill_rect(visible, &paint, Transform::identity(), None);
}

/// Flatten `root` into an image.
///
/// `images` holds decoded pixels per resource; a resource without an entry
/// is painted as a placeholder.
pub fn rasterize(
    root: &SceneNode,
    filter: &ExclusionFilter,
    images: &HashMap<ResourceHandle, RgbaImage>,
    options: RasterOptions,
) -> Result<RgbaImage, ExportError> {
    let ss = options.supersample.max(f32::EPSILON);
    let width = (root.rect.width * ss).ceil();
    let height = (root.rect.height * ss).ceil();
    if !(width >= 1.0 && height >= 1.0) {
        return Err(ExportError::EmptyContainer);
    }
    let (width, height) = (width as u32, height as u32);
    let mut pixmap =
        Pixmap::new(width, height).ok_or(ExportError::RasterAllocation { width, height })?;

    let [r, g, b, a] = options.background;
    pixmap.fill(Color::from_rgba8(r, g, b, a));

    let sources: HashMap<&ResourceHandle, Pixmap> = images
        .iter()
        .filter_map(|(handle, img)| Some((handle, rgba_to_pixmap(img)?)))
        .collect();

    let origin = (root.rect.left, root.rect.top);
    root.visit(filter, &mut |node| {
        let cell = node.rect.translate(-origin.0, -origin.1).scaled(ss);
        match &node.content {
            NodeContent::None => {}
            NodeContent::Fill(rgba) => fill(&mut pixmap, cell, *rgba),
            NodeContent::Image(content) => match sources.get(&content.resource) {
                Some(source) => draw_image(&mut pixmap, cell, source, content, ss),
                None => {
                    log::debug!("Drawing placeholder for '{}'", content.resource.as_str());
                    fill(&mut pixmap, cell, PLACEHOLDER_RGBA);
                }
            },
        }
    });

    Ok(pixmap_to_rgba(&pixmap))
}
