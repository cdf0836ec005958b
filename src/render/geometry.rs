//! Shared geometry calculations for the collage
//!
//! This module contains the pixel math shared between the interaction
//! previews (pixels ⇄ cells) and export rasterization (cell boxes, cover fit
//! and per-item content transforms).

use crate::config::GridMetricsConfig;
use crate::domain::{CellRect, CellRequest, PixelRect, Point};

/// Pixel metrics of one breakpoint's grid at a given container width
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    pub cols: u32,
    pub container_width: f32,
    pub row_height: f32,
    pub margin: [f32; 2],
    pub padding: [f32; 2],
}

impl GridMetrics {
    pub fn new(config: &GridMetricsConfig, cols: u32, container_width: f32) -> Self {
        Self {
            cols: cols.max(1),
            container_width: container_width.max(0.0),
            row_height: config.row_height,
            margin: config.margin,
            padding: config.container_padding,
        }
    }

    /// Width of one column in pixels
    pub fn col_width(&self) -> f32 {
        let cols = self.cols as f32;
        let gutters = self.margin[0] * (cols - 1.0);
        ((self.container_width - gutters - 2.0 * self.padding[0]) / cols).max(0.0)
    }

    /// Distance between the left edges of adjacent columns
    fn col_pitch(&self) -> f32 {
        self.col_width() + self.margin[0]
    }

    /// Distance between the top edges of adjacent rows
    fn row_pitch(&self) -> f32 {
        self.row_height + self.margin[1]
    }

    /// Pixel box of a cell rectangle, relative to the container
    pub fn cell_to_px(&self, rect: CellRect) -> PixelRect {
        let col_width = self.col_width();
        PixelRect::new(
            self.padding[0] + rect.x as f32 * self.col_pitch(),
            self.padding[1] + rect.y as f32 * self.row_pitch(),
            span(rect.w, col_width, self.margin[0]),
            span(rect.h, self.row_height, self.margin[1]),
        )
    }

    /// Nearest cell rectangle for a pixel box. Not clamped.
    pub fn px_to_cells(&self, rect: PixelRect) -> CellRequest {
        let col_pitch = self.col_pitch().max(f32::EPSILON);
        let row_pitch = self.row_pitch().max(f32::EPSILON);
        CellRequest::new(
            ((rect.left - self.padding[0]) / col_pitch).round() as i32,
            ((rect.top - self.padding[1]) / row_pitch).round() as i32,
            ((rect.width + self.margin[0]) / col_pitch).round() as i32,
            ((rect.height + self.margin[1]) / row_pitch).round() as i32,
        )
    }

    /// Container height for a layout whose bottom edge is `rows`
    pub fn container_height(&self, rows: u32) -> f32 {
        2.0 * self.padding[1] + span(rows, self.row_height, self.margin[1])
    }
}

/// Length of `count` units of `unit` separated by `gap`
fn span(count: u32, unit: f32, gap: f32) -> f32 {
    if count == 0 {
        return 0.0;
    }
    count as f32 * unit + (count - 1) as f32 * gap
}

/// Box of an image scaled to cover `cell` entirely, centered on it
pub fn cover_rect(image_width: u32, image_height: u32, cell: PixelRect) -> PixelRect {
    if image_width == 0 || image_height == 0 {
        return cell;
    }
    let (iw, ih) = (image_width as f32, image_height as f32);
    let factor = (cell.width / iw).max(cell.height / ih);
    let (width, height) = (iw * factor, ih * factor);
    let center = cell.center();
    PixelRect::new(center.x - width * 0.5, center.y - height * 0.5, width, height)
}

/// Scale `(width, height)` down or up to fit inside `(max_width, max_height)`
/// preserving aspect ratio
pub fn aspect_fit(width: f32, height: f32, max_width: f32, max_height: f32) -> (f32, f32) {
    if width <= 0.0 || height <= 0.0 {
        return (0.0, 0.0);
    }
    let factor = (max_width / width).min(max_height / height);
    (width * factor, height * factor)
}

/// Apply an item content transform to `rect`.
///
/// Every point `p` maps to `center + pan + scale·(p − center)`, with the
/// center being the cell's center.
pub fn transform_about_center(rect: PixelRect, center: Point, scale: f32, pan: Point) -> PixelRect {
    PixelRect::new(
        center.x + pan.x + scale * (rect.left - center.x),
        center.y + pan.y + scale * (rect.top - center.y),
        rect.width * scale,
        rect.height * scale,
    )
}
