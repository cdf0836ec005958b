//! Geometric types for grid cells and pixel regions

use serde::{Deserialize, Serialize};

/// Rectangle in grid-cell units
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl CellRect {
    /// Create a new cell rectangle
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// First column past the right edge
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.w)
    }

    /// First row past the bottom edge
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.h)
    }

    /// Check whether two rectangles share at least one cell
    pub fn overlaps(&self, other: &CellRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Unvalidated cell rectangle requested by a user edit.
///
/// Values may be negative or exceed the grid; the layout model clamps them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellRequest {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl CellRequest {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }
}

impl From<CellRect> for CellRequest {
    fn from(rect: CellRect) -> Self {
        let signed = |v: u32| i32::try_from(v).unwrap_or(i32::MAX);
        Self {
            x: signed(rect.x),
            y: signed(rect.y),
            w: signed(rect.w),
            h: signed(rect.h),
        }
    }
}

/// Point in logical pixels
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Vector from `origin` to this point
    pub fn delta_from(self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }

    /// Component-wise sum
    pub fn offset(self, delta: Point) -> Point {
        Point::new(self.x + delta.x, self.y + delta.y)
    }
}

/// Logical size and position of a rectangle in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PixelRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    /// Create a new rectangle from position and size
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Center point of the rectangle
    pub fn center(&self) -> Point {
        Point::new(self.left + self.width * 0.5, self.top + self.height * 0.5)
    }

    /// Calculate the intersection of two rectangles
    pub fn intersect(&self, other: PixelRect) -> Option<PixelRect> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if left < right && top < bottom {
            Some(PixelRect::new(left, top, right - left, bottom - top))
        } else {
            None
        }
    }

    /// Translate the rectangle by the given offset
    pub fn translate(&self, dx: f32, dy: f32) -> PixelRect {
        PixelRect::new(self.left + dx, self.top + dy, self.width, self.height)
    }

    /// Multiply position and size by a factor
    pub fn scaled(&self, factor: f32) -> PixelRect {
        PixelRect::new(
            self.left * factor,
            self.top * factor,
            self.width * factor,
            self.height * factor,
        )
    }

    /// Whether the rectangle covers no area
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}
