//! Collage engine
//!
//! Ties the grid layout, per-item transforms, pointer interaction and the
//! snapshot store together. Every committed mutation is persisted right
//! away; previews never are.

use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::domain::{Breakpoint, CellRequest, CollageItem, PixelRect, Point, PointerTarget};
use crate::interaction::{
    GestureEnd, GestureKind, GestureRejected, GestureToken, InteractionController,
    ItemCapabilities, Preview,
};
use crate::layout::{EditOutcome, GridLayout, GridPlacement, Layouts};
use crate::persistence::{PersistedSnapshot, SnapshotStore};
use crate::render::geometry::GridMetrics;
use crate::render::scene::{ImageContent, NodeContent, NodeTag, SceneNode};
use crate::transform::{InteractionMode, ItemTransform, TransformModel};

/// Receives committed layout changes
pub trait LayoutObserver {
    /// `current` is the active breakpoint's placements, `all` every breakpoint
    fn on_layout_change(&mut self, current: &[GridPlacement], all: &Layouts);

    /// The user cleared the collage
    fn on_clear_all(&mut self) {
        self.on_layout_change(&[], &Layouts::new());
    }
}

/// Height of the drag strip along a tile's top edge
const DRAG_HANDLE_HEIGHT: f32 = 24.0;
/// Edge length of the resize grip in the bottom-right corner
const RESIZE_GRIP: f32 = 14.0;
/// Edge length of one button in a tile's control strip
const CONTROL_SIZE: f32 = 28.0;

pub struct CollageEngine {
    config: EngineConfig,
    items: Vec<CollageItem>,
    layout: GridLayout,
    transforms: TransformModel,
    controller: InteractionController,
    store: SnapshotStore,
    observers: Vec<Box<dyn LayoutObserver>>,
    container_width: f32,
    breakpoint: Breakpoint,
    preview: Option<Preview>,
}

impl std::fmt::Debug for CollageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollageEngine")
            .field("items", &self.items.len())
            .field("breakpoint", &self.breakpoint)
            .field("container_width", &self.container_width)
            .field("gesture", &self.controller.active())
            .finish_non_exhaustive()
    }
}

impl CollageEngine {
    /// Restore state from `store` and reconcile it with `items`
    pub fn new(
        config: EngineConfig,
        items: Vec<CollageItem>,
        store: SnapshotStore,
        container_width: f32,
    ) -> Self {
        let snapshot = store.load().into_snapshot().unwrap_or_default();
        let layout = GridLayout::restore(snapshot.layouts, &items, config.columns());
        let mut transforms =
            TransformModel::from_parts(&snapshot.modes, &snapshot.scales, &snapshot.pan_offsets);
        transforms.retain_items(items.iter().map(|item| item.id.as_str()));

        let container_width = sanitize_width(container_width);
        let breakpoint = config.breakpoint_for_width(container_width);
        let controller =
            InteractionController::new(Duration::from_millis(config.gesture_abandon_ms));
        log::info!(
            "Collage engine ready with {} items at breakpoint {}",
            items.len(),
            breakpoint
        );

        let mut engine = Self {
            config,
            items,
            layout,
            transforms,
            controller,
            store,
            observers: Vec::new(),
            container_width,
            breakpoint,
            preview: None,
        };
        engine.sync_locks();
        engine
    }

    pub fn add_observer(&mut self, observer: impl LayoutObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn items(&self) -> &[CollageItem] {
        &self.items
    }

    fn contains(&self, item_id: &str) -> bool {
        self.items.iter().any(|item| item.id == item_id)
    }

    pub fn breakpoint(&self) -> Breakpoint {
        self.breakpoint
    }

    pub fn container_width(&self) -> f32 {
        self.container_width
    }

    pub fn layouts(&self) -> &Layouts {
        self.layout.layouts()
    }

    /// Placements of the active breakpoint
    pub fn placements(&self) -> &[GridPlacement] {
        self.layout.placements(self.breakpoint)
    }

    pub fn placement(&self, item_id: &str) -> Option<&GridPlacement> {
        self.layout.placement(self.breakpoint, item_id)
    }

    pub fn transform(&self, item_id: &str) -> ItemTransform {
        self.transforms.get(item_id)
    }

    /// Pan offset to render, including an in-flight gesture
    pub fn live_pan(&self, item_id: &str) -> Point {
        self.transforms.live_pan(item_id)
    }

    /// Live feedback of the active gesture, if any
    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn active_gesture(&self) -> Option<GestureKind> {
        self.controller.active().map(|g| g.kind)
    }

    pub fn snapshot_store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Pixel metrics of the active breakpoint
    pub fn metrics(&self) -> GridMetrics {
        GridMetrics::new(
            &self.config.grid,
            self.layout.cols(self.breakpoint),
            self.container_width,
        )
    }

    /// Container height needed for the active breakpoint
    pub fn container_height(&self) -> f32 {
        let rows = self.layout.bottom(self.breakpoint);
        self.metrics().container_height(rows)
    }

    /// Replace the item set, keeping placements of items that persist
    pub fn set_items(&mut self, items: Vec<CollageItem>) {
        self.items = items;
        if let Some(active) = self.controller.active_item()
            && !self.contains(active)
        {
            self.abort_gesture();
        }
        self.layout.reconcile(&self.items);
        self.transforms
            .retain_items(self.items.iter().map(|item| item.id.as_str()));
        self.sync_locks();
        self.commit();
    }

    /// React to a container resize; may switch the active breakpoint
    pub fn set_container_width(&mut self, width: f32) {
        let width = sanitize_width(width);
        self.container_width = width;
        let breakpoint = self.config.breakpoint_for_width(width);
        if breakpoint == self.breakpoint {
            return;
        }
        log::debug!("Breakpoint {} -> {}", self.breakpoint, breakpoint);
        self.abort_gesture();
        self.breakpoint = breakpoint;
        self.sync_locks();
        self.commit();
    }

    /// Apply a grid edit on the active breakpoint
    pub fn apply_user_edit(&mut self, item_id: &str, request: CellRequest) -> EditOutcome {
        let outcome = self.layout.apply_user_edit(self.breakpoint, item_id, request);
        if let EditOutcome::Applied(_) = outcome {
            self.commit();
        }
        outcome
    }

    /// Flip an item between `Move` and `Scale`
    pub fn toggle_mode(&mut self, item_id: &str) -> InteractionMode {
        if !self.contains(item_id) {
            return self.transforms.mode(item_id);
        }
        if self.controller.release_item(item_id).is_some() {
            self.preview = None;
        }
        let mode = self.transforms.toggle_mode(item_id);
        self.sync_locks();
        self.commit();
        mode
    }

    /// Set an item's scale; returns the clamped value actually applied
    pub fn set_scale(&mut self, item_id: &str, requested: f32) -> f32 {
        if !self.contains(item_id) {
            return self.transforms.get(item_id).scale.value();
        }
        let before = self.transforms.get(item_id).scale;
        let applied = self.transforms.set_scale(item_id, requested);
        if before.value() != applied {
            self.persist();
        }
        applied
    }

    pub fn zoom_in(&mut self, item_id: &str) -> f32 {
        self.zoom_by(item_id, self.config.zoom_step)
    }

    pub fn zoom_out(&mut self, item_id: &str) -> f32 {
        self.zoom_by(item_id, -self.config.zoom_step)
    }

    fn zoom_by(&mut self, item_id: &str, step: f32) -> f32 {
        let before = self.transforms.get(item_id).scale.value();
        if !self.contains(item_id) {
            return before;
        }
        let applied = self.transforms.nudge_scale(item_id, step);
        if before != applied {
            self.persist();
        }
        applied
    }

    /// Restore an item's default scale, pan and mode
    pub fn reset_transform(&mut self, item_id: &str) {
        if !self.contains(item_id) {
            return;
        }
        if self.controller.release_item(item_id).is_some() {
            self.preview = None;
        }
        self.transforms.reset(item_id);
        self.sync_locks();
        self.commit();
    }

    /// Regenerate the default placement for every breakpoint
    pub fn reset_layout(&mut self) {
        self.abort_gesture();
        self.layout.reset(&self.items);
        self.sync_locks();
        self.commit();
    }

    /// Forget all persisted state and start over from defaults
    pub fn clear_all(&mut self) {
        self.abort_gesture();
        self.store.clear();
        self.transforms.clear();
        self.transforms
            .retain_items(self.items.iter().map(|item| item.id.as_str()));
        self.layout.reset(&self.items);
        self.sync_locks();
        for observer in &mut self.observers {
            observer.on_clear_all();
        }
    }

    pub fn pointer_down(
        &mut self,
        item_id: &str,
        target: PointerTarget,
        position: Point,
    ) -> Result<GestureToken, GestureRejected> {
        let placement = self
            .placement(item_id)
            .ok_or(GestureRejected::UnknownItem)?;
        let capabilities = ItemCapabilities {
            mode: self.transforms.mode(item_id),
            locked: placement.locked,
            rect: self.metrics().cell_to_px(placement.rect()),
        };
        self.controller
            .pointer_down(item_id, target, position, capabilities)
    }

    /// Track the pointer; returns the live preview of the active gesture
    pub fn pointer_move(&mut self, token: GestureToken, position: Point) -> Option<&Preview> {
        let metrics = self.metrics();
        let preview = self.controller.pointer_move(token, position, &metrics)?;
        if let Preview::Pan { item_id, delta } = &preview {
            self.transforms.set_pan(item_id, delta.x, delta.y);
        }
        self.preview = Some(preview);
        self.preview.as_ref()
    }

    /// Commit the active gesture
    pub fn pointer_up(&mut self, token: GestureToken, position: Point) -> Option<GestureEnd> {
        let metrics = self.metrics();
        let end = self.controller.pointer_up(token, position, &metrics)?;
        self.finish(&end);
        Some(end)
    }

    /// Commit the active gesture at the last known pointer position
    pub fn pointer_cancel(&mut self, token: GestureToken) -> Option<GestureEnd> {
        let metrics = self.metrics();
        let end = self.controller.pointer_cancel(token, &metrics)?;
        self.finish(&end);
        Some(end)
    }

    pub fn pointer_leave(&mut self, now: Instant) {
        self.controller.pointer_leave(now);
    }

    pub fn pointer_enter(&mut self) {
        self.controller.pointer_enter();
    }

    /// Abandon a gesture whose pointer has been gone too long.
    /// Returns true when state was reverted.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(gesture) = self.controller.tick(now) else {
            return false;
        };
        self.revert(&gesture.item_id);
        true
    }

    fn finish(&mut self, end: &GestureEnd) {
        self.preview = None;
        match end {
            GestureEnd::Grid { item_id, cells } => {
                self.apply_user_edit(item_id, *cells);
            }
            GestureEnd::Pan { item_id, delta } => {
                self.transforms.set_pan(item_id, delta.x, delta.y);
                if self.transforms.commit_pan(item_id).is_some() {
                    self.persist();
                }
            }
        }
    }

    fn abort_gesture(&mut self) {
        if let Some(gesture) = self.controller.release() {
            self.revert(&gesture.item_id);
        }
    }

    fn revert(&mut self, item_id: &str) {
        self.transforms.discard_pan(item_id);
        self.preview = None;
    }

    fn sync_locks(&mut self) {
        let transforms = &self.transforms;
        self.layout.sync_locks(self.breakpoint, |id| {
            transforms.mode(id) == InteractionMode::Scale
        });
    }

    fn snapshot(&self) -> PersistedSnapshot {
        PersistedSnapshot {
            layouts: Some(self.layout.layouts().clone()),
            modes: self.transforms.modes(),
            scales: self.transforms.scales(),
            pan_offsets: self.transforms.pans(),
        }
    }

    fn persist(&mut self) {
        let snapshot = self.snapshot();
        self.store.save(&snapshot);
    }

    /// Persist and tell observers about a committed layout change
    fn commit(&mut self) {
        self.persist();
        let current = self.layout.placements(self.breakpoint);
        let all = self.layout.layouts();
        for observer in &mut self.observers {
            observer.on_layout_change(current, all);
        }
    }

    /// Visual tree of the committed state at the current container width
    pub fn visual_tree(&self) -> SceneNode {
        let metrics = self.metrics();
        let container = PixelRect::new(0.0, 0.0, self.container_width, self.container_height());
        let mut root = SceneNode::new(NodeTag::Container, container).with_class("collage-container");

        for item in &self.items {
            let Some(placement) = self.placement(&item.id) else {
                continue;
            };
            let transform = self.transforms.get(&item.id);
            let cell = metrics.cell_to_px(placement.rect());
            root.children.push(tile_node(item, placement, transform, cell));
        }
        root
    }
}

fn sanitize_width(width: f32) -> f32 {
    if width.is_finite() { width.max(0.0) } else { 0.0 }
}

fn tile_node(
    item: &CollageItem,
    placement: &GridPlacement,
    transform: ItemTransform,
    cell: PixelRect,
) -> SceneNode {
    let image = SceneNode::new(NodeTag::Img, cell)
        .with_class("collage-image")
        .with_content(NodeContent::Image(ImageContent {
            resource: item.image.clone(),
            alt: item.label().to_string(),
            scale: transform.scale.value(),
            pan: transform.pan,
        }));

    let mut tile = SceneNode::new(NodeTag::Div, cell)
        .with_class("collage-item")
        .with_child(image)
        .with_child(SceneNode::new(NodeTag::Div, cell).with_class("export-hide"));
    if placement.locked {
        tile = tile.with_class("locked");
    }

    let mut controls = SceneNode::new(
        NodeTag::Div,
        PixelRect::new(cell.right() - CONTROL_SIZE * 3.0, cell.top, CONTROL_SIZE * 3.0, CONTROL_SIZE),
    )
    .with_class("controls");
    let button = |index: f32, icon: &str| {
        let rect = PixelRect::new(
            cell.right() - CONTROL_SIZE * (index + 1.0),
            cell.top,
            CONTROL_SIZE,
            CONTROL_SIZE,
        );
        SceneNode::new(NodeTag::Button, rect)
            .with_content(NodeContent::Fill([255, 255, 255, 220]))
            .with_child(SceneNode::new(NodeTag::Span, rect).with_class("icon").with_class(icon))
    };

    match transform.mode {
        InteractionMode::Move => {
            controls = controls.with_child(button(0.0, "icon-zoom"));
            tile = tile.with_child(
                SceneNode::new(
                    NodeTag::Div,
                    PixelRect::new(cell.left, cell.top, cell.width, DRAG_HANDLE_HEIGHT),
                )
                .with_class("drag-handle")
                .with_content(NodeContent::Fill([0, 0, 0, 64])),
            );
            if !placement.locked {
                tile = tile.with_child(
                    SceneNode::new(
                        NodeTag::Span,
                        PixelRect::new(
                            cell.right() - RESIZE_GRIP,
                            cell.bottom() - RESIZE_GRIP,
                            RESIZE_GRIP,
                            RESIZE_GRIP,
                        ),
                    )
                    .with_class("resize-handle")
                    .with_content(NodeContent::Fill([0, 0, 0, 128])),
                );
            }
        }
        InteractionMode::Scale => {
            controls = controls
                .with_child(button(0.0, "icon-move"))
                .with_child(button(1.0, "icon-zoom-in"))
                .with_child(button(2.0, "icon-zoom-out"));
            tile = tile.with_child(
                SceneNode::new(
                    NodeTag::Span,
                    PixelRect::new(cell.left, cell.bottom() - CONTROL_SIZE, cell.width, CONTROL_SIZE),
                )
                .with_class("badge")
                .with_class("export-hide")
                .with_content(NodeContent::Fill([37, 99, 235, 200])),
            );
        }
    }
    tile.with_child(controls)
}
