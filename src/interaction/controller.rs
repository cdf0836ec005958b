//! Pointer interaction state machine
//!
//! The controller never touches the committed layout or transforms. It turns
//! pointer events into live [`Preview`]s while a gesture runs and into one
//! [`GestureEnd`] when it finishes; the caller decides what to commit.

use std::time::{Duration, Instant};

use crate::domain::{CellRequest, PixelRect, Point, PointerTarget};
use crate::render::geometry::GridMetrics;
use crate::transform::InteractionMode;

use super::gesture::{ActiveGesture, GestureKind, GestureToken};

/// What the controller needs to know about an item to accept a gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemCapabilities {
    pub mode: InteractionMode,
    pub locked: bool,
    /// Current tile box relative to the container
    pub rect: PixelRect,
}

impl ItemCapabilities {
    /// Gesture a pointer-down on `target` starts, if the item allows it
    pub fn gesture_for(&self, target: PointerTarget) -> Result<GestureKind, GestureRejected> {
        match (self.mode, target) {
            (InteractionMode::Move, PointerTarget::Content) => Err(GestureRejected::WrongMode),
            (InteractionMode::Move, _) if self.locked => Err(GestureRejected::Locked),
            (InteractionMode::Move, PointerTarget::DragHandle) => Ok(GestureKind::GridDragging),
            (InteractionMode::Move, PointerTarget::Resize(handle)) => {
                Ok(GestureKind::GridResizing(handle))
            }
            (InteractionMode::Scale, PointerTarget::Content) => Ok(GestureKind::ContentPanning),
            (InteractionMode::Scale, _) => Err(GestureRejected::WrongMode),
        }
    }
}

/// Why a pointer-down did not start a gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GestureRejected {
    #[error("another gesture is in progress")]
    Busy,
    #[error("item mode does not allow this gesture")]
    WrongMode,
    #[error("item is locked")]
    Locked,
    #[error("unknown item")]
    UnknownItem,
}

/// Live, uncommitted feedback for the active gesture
#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    /// Tile box under the pointer and the cells it would snap to
    Grid {
        item_id: String,
        rect: PixelRect,
        cells: CellRequest,
    },
    /// Pan delta relative to the last committed offset
    Pan { item_id: String, delta: Point },
}

/// Final result of a gesture that ended normally
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEnd {
    Grid { item_id: String, cells: CellRequest },
    Pan { item_id: String, delta: Point },
}

/// Owner of the single system-wide gesture
#[derive(Debug)]
pub struct InteractionController {
    active: Option<ActiveGesture>,
    next_token: u64,
    abandon_after: Duration,
}

impl InteractionController {
    pub fn new(abandon_after: Duration) -> Self {
        Self {
            active: None,
            next_token: 1,
            abandon_after,
        }
    }

    pub fn active(&self) -> Option<&ActiveGesture> {
        self.active.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    /// Item the active gesture targets
    pub fn active_item(&self) -> Option<&str> {
        self.active.as_ref().map(|g| g.item_id.as_str())
    }

    /// Try to start a gesture on `item_id`
    pub fn pointer_down(
        &mut self,
        item_id: &str,
        target: PointerTarget,
        position: Point,
        capabilities: ItemCapabilities,
    ) -> Result<GestureToken, GestureRejected> {
        if self.active.is_some() {
            return Err(GestureRejected::Busy);
        }
        let kind = capabilities.gesture_for(target)?;

        let token = GestureToken::new(self.next_token);
        self.next_token += 1;
        log::debug!("Gesture {:?} started on '{}'", kind, item_id);
        self.active = Some(ActiveGesture {
            token,
            item_id: item_id.to_string(),
            kind,
            origin: position,
            last: position,
            start_rect: capabilities.rect,
            left_viewport_at: None,
        });
        Ok(token)
    }

    /// The active gesture, if `token` owns it
    fn owned_mut(&mut self, token: GestureToken) -> Option<&mut ActiveGesture> {
        match self.active.as_mut() {
            Some(gesture) if gesture.token == token => Some(gesture),
            Some(_) => {
                log::debug!("Ignoring pointer event from stale gesture {:?}", token);
                None
            }
            None => None,
        }
    }

    /// Update the pointer position and compute the live preview
    pub fn pointer_move(
        &mut self,
        token: GestureToken,
        position: Point,
        metrics: &GridMetrics,
    ) -> Option<Preview> {
        let gesture = self.owned_mut(token)?;
        gesture.last = position;
        Some(preview(gesture, metrics))
    }

    /// Finish the gesture at `position`, wherever the pointer is
    pub fn pointer_up(
        &mut self,
        token: GestureToken,
        position: Point,
        metrics: &GridMetrics,
    ) -> Option<GestureEnd> {
        self.owned_mut(token)?.last = position;
        let gesture = self.active.take()?;
        log::debug!("Gesture {:?} on '{}' ended", gesture.kind, gesture.item_id);
        Some(match preview(&gesture, metrics) {
            Preview::Grid { item_id, cells, .. } => GestureEnd::Grid { item_id, cells },
            Preview::Pan { item_id, delta } => GestureEnd::Pan { item_id, delta },
        })
    }

    /// Pointer cancel ends the gesture like pointer-up at the last known position
    pub fn pointer_cancel(&mut self, token: GestureToken, metrics: &GridMetrics) -> Option<GestureEnd> {
        let last = self.owned_mut(token)?.last;
        self.pointer_up(token, last, metrics)
    }

    /// The pointer left the viewport; start the abandon clock
    pub fn pointer_leave(&mut self, now: Instant) {
        if let Some(gesture) = self.active.as_mut() {
            gesture.left_viewport_at.get_or_insert(now);
        }
    }

    /// The pointer came back; stop the abandon clock
    pub fn pointer_enter(&mut self) {
        if let Some(gesture) = self.active.as_mut() {
            gesture.left_viewport_at = None;
        }
    }

    /// Abandon the gesture if the pointer has been gone too long.
    ///
    /// The abandoned gesture is returned so the caller can revert its preview.
    pub fn tick(&mut self, now: Instant) -> Option<ActiveGesture> {
        if !self
            .active
            .as_ref()
            .is_some_and(|g| g.is_abandoned(now, self.abandon_after))
        {
            return None;
        }
        let gesture = self.active.take()?;
        log::warn!(
            "Abandoning {:?} on '{}' after the pointer left the viewport",
            gesture.kind,
            gesture.item_id
        );
        Some(gesture)
    }

    /// Drop the active gesture without committing anything
    pub fn release(&mut self) -> Option<ActiveGesture> {
        self.active.take()
    }

    /// Drop the active gesture if it targets `item_id`
    pub fn release_item(&mut self, item_id: &str) -> Option<ActiveGesture> {
        if self.active_item() == Some(item_id) {
            self.active.take()
        } else {
            None
        }
    }
}

fn preview(gesture: &ActiveGesture, metrics: &GridMetrics) -> Preview {
    let item_id = gesture.item_id.clone();
    match gesture.kind {
        GestureKind::ContentPanning => Preview::Pan {
            item_id,
            delta: gesture.delta(),
        },
        GestureKind::GridDragging | GestureKind::GridResizing(_) => {
            let rect = gesture.preview_rect();
            Preview::Grid {
                item_id,
                rect,
                cells: metrics.px_to_cells(rect),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridMetricsConfig;
    use crate::domain::{CellRect, ResizeHandle};

    fn metrics() -> GridMetrics {
        GridMetrics::new(&GridMetricsConfig::default(), 4, 1250.0)
    }

    fn caps(mode: InteractionMode, locked: bool) -> ItemCapabilities {
        ItemCapabilities {
            mode,
            locked,
            rect: metrics().cell_to_px(CellRect::new(0, 0, 1, 1)),
        }
    }

    fn controller() -> InteractionController {
        InteractionController::new(Duration::from_secs(5))
    }

    #[test]
    fn capability_dispatch_follows_mode() {
        let moving = caps(InteractionMode::Move, false);
        assert_eq!(moving.gesture_for(PointerTarget::DragHandle), Ok(GestureKind::GridDragging));
        assert_eq!(moving.gesture_for(PointerTarget::Content), Err(GestureRejected::WrongMode));

        let scaling = caps(InteractionMode::Scale, true);
        assert_eq!(scaling.gesture_for(PointerTarget::Content), Ok(GestureKind::ContentPanning));
        assert_eq!(
            scaling.gesture_for(PointerTarget::Resize(ResizeHandle::SE)),
            Err(GestureRejected::WrongMode)
        );

        let locked = caps(InteractionMode::Move, true);
        assert_eq!(locked.gesture_for(PointerTarget::DragHandle), Err(GestureRejected::Locked));
    }

    #[test]
    fn only_one_gesture_at_a_time() {
        let mut c = controller();
        let origin = Point::new(50.0, 50.0);
        c.pointer_down("a", PointerTarget::DragHandle, origin, caps(InteractionMode::Move, false))
            .unwrap();
        let second =
            c.pointer_down("b", PointerTarget::DragHandle, origin, caps(InteractionMode::Move, false));
        assert_eq!(second, Err(GestureRejected::Busy));
        assert_eq!(c.active_item(), Some("a"));
    }

    #[test]
    fn drag_previews_then_commits_snapped_cells() {
        let mut c = controller();
        let m = metrics();
        let token = c
            .pointer_down(
                "a",
                PointerTarget::DragHandle,
                Point::new(50.0, 50.0),
                caps(InteractionMode::Move, false),
            )
            .unwrap();

        let preview = c.pointer_move(token, Point::new(400.0, 60.0), &m).unwrap();
        let Preview::Grid { cells, .. } = preview else {
            panic!("expected grid preview");
        };
        assert_eq!(cells, CellRequest::new(1, 0, 1, 1));

        // Released far outside the tile, still ends the gesture
        let end = c.pointer_up(token, Point::new(700.0, 60.0), &m).unwrap();
        assert_eq!(
            end,
            GestureEnd::Grid {
                item_id: "a".into(),
                cells: CellRequest::new(2, 0, 1, 1)
            }
        );
        assert!(c.is_idle());
    }

    #[test]
    fn pan_reports_delta_from_origin() {
        let mut c = controller();
        let m = metrics();
        let token = c
            .pointer_down(
                "a",
                PointerTarget::Content,
                Point::new(100.0, 100.0),
                caps(InteractionMode::Scale, true),
            )
            .unwrap();
        c.pointer_move(token, Point::new(120.0, 90.0), &m);
        let end = c.pointer_cancel(token, &m).unwrap();
        assert_eq!(
            end,
            GestureEnd::Pan {
                item_id: "a".into(),
                delta: Point::new(20.0, -10.0)
            }
        );
    }

    #[test]
    fn tick_abandons_after_pointer_left_viewport() {
        let mut c = controller();
        let start = Instant::now();
        c.pointer_down(
            "a",
            PointerTarget::Content,
            Point::ORIGIN,
            caps(InteractionMode::Scale, true),
        )
        .unwrap();

        c.pointer_leave(start);
        assert!(c.tick(start + Duration::from_secs(1)).is_none());
        c.pointer_enter();
        assert!(c.tick(start + Duration::from_secs(10)).is_none());

        c.pointer_leave(start + Duration::from_secs(10));
        let abandoned = c.tick(start + Duration::from_secs(15)).unwrap();
        assert_eq!(abandoned.item_id, "a");
        assert!(c.is_idle());
    }

    #[test]
    fn stale_token_cannot_drive_a_newer_gesture() {
        let mut c = controller();
        let m = metrics();
        let first = c
            .pointer_down("a", PointerTarget::Content, Point::ORIGIN, caps(InteractionMode::Scale, true))
            .unwrap();
        c.release();
        let second = c
            .pointer_down("b", PointerTarget::Content, Point::ORIGIN, caps(InteractionMode::Scale, true))
            .unwrap();
        assert_ne!(first, second);

        assert!(c.pointer_move(first, Point::new(30.0, 0.0), &m).is_none());
        assert!(c.pointer_up(first, Point::new(30.0, 0.0), &m).is_none());
        assert!(c.pointer_cancel(first, &m).is_none());
        assert_eq!(c.active_item(), Some("b"));
        assert_eq!(c.active().unwrap().last, Point::ORIGIN);

        let end = c.pointer_up(second, Point::new(5.0, 5.0), &m).unwrap();
        assert_eq!(
            end,
            GestureEnd::Pan {
                item_id: "b".into(),
                delta: Point::new(5.0, 5.0)
            }
        );
    }

    #[test]
    fn release_item_ignores_other_items() {
        let mut c = controller();
        c.pointer_down(
            "a",
            PointerTarget::Content,
            Point::ORIGIN,
            caps(InteractionMode::Scale, true),
        )
        .unwrap();
        assert!(c.release_item("b").is_none());
        assert!(c.release_item("a").is_some());
        assert!(c.is_idle());
    }
}
