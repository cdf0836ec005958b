//! Per-item content transform state
//!
//! Each item carries a scale, a pan offset and an interaction mode, all
//! independent of where its tile sits on the grid. Pan is edited through a
//! pending delta that only becomes part of the committed offset on
//! [`TransformModel::commit_pan`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::Point;

pub const MIN_SCALE: f32 = 0.5;
pub const MAX_SCALE: f32 = 3.0;
pub const DEFAULT_SCALE: f32 = 1.0;

/// Content scale, guaranteed to be within the valid range (0.5–3.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "f32", into = "f32")]
pub struct Scale(f32);

impl Scale {
    /// Creates a new scale, clamping the value to the valid range.
    #[must_use]
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(MIN_SCALE, MAX_SCALE))
    }

    #[must_use]
    pub fn value(self) -> f32 {
        self.0
    }

    #[must_use]
    pub fn is_min(self) -> bool {
        self.0 <= MIN_SCALE
    }

    #[must_use]
    pub fn is_max(self) -> bool {
        self.0 >= MAX_SCALE
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self(DEFAULT_SCALE)
    }
}

impl From<f32> for Scale {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

impl From<Scale> for f32 {
    fn from(scale: Scale) -> Self {
        scale.0
    }
}

/// Who owns pointer input for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    /// Pointer drives grid drag/resize
    #[default]
    Move,
    /// Pointer pans the image content, the tile is pinned
    Scale,
}

impl InteractionMode {
    pub fn toggled(self) -> Self {
        match self {
            InteractionMode::Move => InteractionMode::Scale,
            InteractionMode::Scale => InteractionMode::Move,
        }
    }
}

/// Committed transform of one item's content
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ItemTransform {
    pub scale: Scale,
    pub pan: Point,
    pub mode: InteractionMode,
}

#[derive(Debug, Clone, Default)]
struct TransformEntry {
    committed: ItemTransform,
    /// Uncommitted pan delta of an in-flight gesture
    pending_pan: Option<Point>,
}

/// Transform state of all items
#[derive(Debug, Clone, Default)]
pub struct TransformModel {
    entries: HashMap<String, TransformEntry>,
}

impl TransformModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted slices; missing values take defaults
    pub fn from_parts(
        modes: &HashMap<String, InteractionMode>,
        scales: &HashMap<String, Scale>,
        pans: &HashMap<String, Point>,
    ) -> Self {
        let mut model = Self::new();
        let ids = modes.keys().chain(scales.keys()).chain(pans.keys());
        for id in ids {
            model.entries.entry(id.clone()).or_insert_with(|| TransformEntry {
                committed: ItemTransform {
                    scale: scales.get(id).copied().unwrap_or_default(),
                    pan: pans.get(id).copied().unwrap_or_default(),
                    mode: modes.get(id).copied().unwrap_or_default(),
                },
                pending_pan: None,
            });
        }
        model
    }

    fn entry(&mut self, item_id: &str) -> &mut TransformEntry {
        self.entries.entry(item_id.to_string()).or_default()
    }

    /// Committed transform (defaults for unknown items)
    pub fn get(&self, item_id: &str) -> ItemTransform {
        self.entries
            .get(item_id)
            .map(|entry| entry.committed)
            .unwrap_or_default()
    }

    pub fn mode(&self, item_id: &str) -> InteractionMode {
        self.get(item_id).mode
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.entries.contains_key(item_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Clamp and apply a scale, returning the value actually applied
    pub fn set_scale(&mut self, item_id: &str, requested: f32) -> f32 {
        let entry = self.entry(item_id);
        if requested.is_finite() {
            entry.committed.scale = Scale::new(requested);
        }
        entry.committed.scale.value()
    }

    /// Step the scale up or down by `step`
    pub fn nudge_scale(&mut self, item_id: &str, step: f32) -> f32 {
        let current = self.get(item_id).scale.value();
        self.set_scale(item_id, current + step)
    }

    /// Record a pan delta relative to the last committed offset.
    ///
    /// Returns the live offset to render, or `None` when the item is not in
    /// `Scale` mode.
    pub fn set_pan(&mut self, item_id: &str, dx: f32, dy: f32) -> Option<Point> {
        let entry = self.entry(item_id);
        if entry.committed.mode != InteractionMode::Scale {
            return None;
        }
        let delta = Point::new(dx, dy);
        entry.pending_pan = Some(delta);
        Some(entry.committed.pan.offset(delta))
    }

    /// Live offset: committed offset plus any pending delta
    pub fn live_pan(&self, item_id: &str) -> Point {
        match self.entries.get(item_id) {
            Some(entry) => entry
                .pending_pan
                .map(|delta| entry.committed.pan.offset(delta))
                .unwrap_or(entry.committed.pan),
            None => Point::ORIGIN,
        }
    }

    pub fn has_pending_pan(&self, item_id: &str) -> bool {
        self.entries
            .get(item_id)
            .is_some_and(|entry| entry.pending_pan.is_some())
    }

    /// Fold the pending delta into the committed offset
    pub fn commit_pan(&mut self, item_id: &str) -> Option<Point> {
        let entry = self.entries.get_mut(item_id)?;
        let delta = entry.pending_pan.take()?;
        entry.committed.pan = entry.committed.pan.offset(delta);
        Some(entry.committed.pan)
    }

    /// Drop the pending delta, reverting to the committed offset
    pub fn discard_pan(&mut self, item_id: &str) -> bool {
        self.entries
            .get_mut(item_id)
            .is_some_and(|entry| entry.pending_pan.take().is_some())
    }

    /// Flip `Move ⇄ Scale`; a pending pan is discarded, never committed
    pub fn toggle_mode(&mut self, item_id: &str) -> InteractionMode {
        let entry = self.entry(item_id);
        if entry.pending_pan.take().is_some() {
            log::debug!("Mode toggle discarded pending pan of '{}'", item_id);
        }
        entry.committed.mode = entry.committed.mode.toggled();
        entry.committed.mode
    }

    /// Restore scale, pan and mode defaults
    pub fn reset(&mut self, item_id: &str) {
        *self.entry(item_id) = TransformEntry::default();
    }

    /// Drop entries for items that no longer exist and add defaults for new ones
    pub fn retain_items<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        let keep: std::collections::HashSet<&str> = ids.into_iter().collect();
        self.entries.retain(|id, _| keep.contains(id.as_str()));
        for id in keep {
            self.entries.entry(id.to_string()).or_default();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Committed modes keyed by item id
    pub fn modes(&self) -> HashMap<String, InteractionMode> {
        self.collect(|t| t.mode)
    }

    /// Committed scales keyed by item id
    pub fn scales(&self) -> HashMap<String, Scale> {
        self.collect(|t| t.scale)
    }

    /// Committed pan offsets keyed by item id
    pub fn pans(&self) -> HashMap<String, Point> {
        self.collect(|t| t.pan)
    }

    fn collect<T>(&self, f: impl Fn(&ItemTransform) -> T) -> HashMap<String, T> {
        self.entries
            .iter()
            .map(|(id, entry)| (id.clone(), f(&entry.committed)))
            .collect()
    }
}
