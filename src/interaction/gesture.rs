//! Gesture bookkeeping
//!
//! A gesture is the span between pointer-down on a tile and the matching
//! pointer-up/cancel. Only one exists at a time; whoever holds the
//! [`GestureToken`] owns pointer input.

use std::time::{Duration, Instant};

use crate::domain::{PixelRect, Point, ResizeHandle};

/// Opaque proof of owning the one active gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GestureToken(u64);

impl GestureToken {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

/// What an active gesture is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    /// Moving a whole tile across the grid
    GridDragging,
    /// Resizing a tile from one of its handles
    GridResizing(ResizeHandle),
    /// Panning image content inside its cell
    ContentPanning,
}

/// An in-flight gesture
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveGesture {
    pub token: GestureToken,
    pub item_id: String,
    pub kind: GestureKind,
    /// Pointer position at pointer-down
    pub origin: Point,
    /// Most recent pointer position
    pub last: Point,
    /// Tile box at pointer-down, relative to the container
    pub start_rect: PixelRect,
    /// When the pointer left the viewport, if it is outside
    pub(crate) left_viewport_at: Option<Instant>,
}

impl ActiveGesture {
    /// Pointer travel since pointer-down
    pub fn delta(&self) -> Point {
        self.last.delta_from(self.origin)
    }

    /// Tile box the gesture would produce at the current pointer position
    pub fn preview_rect(&self) -> PixelRect {
        let delta = self.delta();
        match self.kind {
            GestureKind::GridDragging => self.start_rect.translate(delta.x, delta.y),
            GestureKind::GridResizing(handle) => resized(self.start_rect, handle, delta),
            GestureKind::ContentPanning => self.start_rect,
        }
    }

    /// Whether the pointer has been outside the viewport for at least `limit`
    pub fn is_abandoned(&self, now: Instant, limit: Duration) -> bool {
        self.left_viewport_at
            .is_some_and(|left| now.saturating_duration_since(left) >= limit)
    }
}

/// Smallest edge length a resize preview can shrink to
const MIN_PREVIEW_EDGE: f32 = 1.0;

/// Move the edges `handle` grabs by `delta`, keeping the opposite edges fixed
fn resized(start: PixelRect, handle: ResizeHandle, delta: Point) -> PixelRect {
    let (mut left, mut top) = (start.left, start.top);
    let (mut right, mut bottom) = (start.right(), start.bottom());

    if handle.moves_left() {
        left = (left + delta.x).min(right - MIN_PREVIEW_EDGE);
    }
    if handle.moves_right() {
        right = (right + delta.x).max(left + MIN_PREVIEW_EDGE);
    }
    if handle.moves_top() {
        top = (top + delta.y).min(bottom - MIN_PREVIEW_EDGE);
    }
    if handle.moves_bottom() {
        bottom = (bottom + delta.y).max(top + MIN_PREVIEW_EDGE);
    }
    PixelRect::new(left, top, right - left, bottom - top)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gesture(kind: GestureKind) -> ActiveGesture {
        ActiveGesture {
            token: GestureToken::new(1),
            item_id: "a".into(),
            kind,
            origin: Point::new(100.0, 100.0),
            last: Point::new(100.0, 100.0),
            start_rect: PixelRect::new(10.0, 10.0, 300.0, 150.0),
            left_viewport_at: None,
        }
    }

    #[test]
    fn drag_preview_follows_pointer() {
        let mut g = gesture(GestureKind::GridDragging);
        g.last = Point::new(150.0, 80.0);
        assert_eq!(g.preview_rect(), PixelRect::new(60.0, -10.0, 300.0, 150.0));
    }

    #[test]
    fn south_east_resize_grows_size_only() {
        let mut g = gesture(GestureKind::GridResizing(ResizeHandle::SE));
        g.last = Point::new(200.0, 250.0);
        assert_eq!(g.preview_rect(), PixelRect::new(10.0, 10.0, 400.0, 300.0));
    }

    #[test]
    fn north_west_resize_keeps_far_edges_fixed() {
        let mut g = gesture(GestureKind::GridResizing(ResizeHandle::NW));
        g.last = Point::new(1000.0, 1000.0);
        let rect = g.preview_rect();
        assert_eq!(rect.right(), 310.0);
        assert_eq!(rect.bottom(), 160.0);
        assert_eq!(rect.width, MIN_PREVIEW_EDGE);
    }

    #[test]
    fn abandonment_needs_pointer_outside_long_enough() {
        let now = Instant::now();
        let mut g = gesture(GestureKind::ContentPanning);
        assert!(!g.is_abandoned(now + Duration::from_secs(60), Duration::from_secs(5)));
        g.left_viewport_at = Some(now);
        assert!(!g.is_abandoned(now + Duration::from_secs(4), Duration::from_secs(5)));
        assert!(g.is_abandoned(now + Duration::from_secs(5), Duration::from_secs(5)));
    }
}
