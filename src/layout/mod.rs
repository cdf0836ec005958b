//! Grid layout model
//!
//! This module contains:
//! - Placement records and the breakpoint → placements map
//! - Default row-major packing and reconciliation against the item set
//! - Validated user edits followed by vertical compaction

pub mod compact;
pub mod placement;

use std::collections::HashSet;

use crate::domain::{Breakpoint, CellRect, CellRequest, CollageItem};

pub use compact::{compact_vertical, is_collision_free};
pub use placement::{GridPlacement, Layouts, bottom};

/// Row-major 1×1 placements for `ids`, starting at row `first_row`
fn pack_row_major<'a>(
    ids: impl Iterator<Item = &'a str>,
    cols: u32,
    first_row: u32,
) -> impl Iterator<Item = GridPlacement> {
    let cols = cols.max(1);
    ids.enumerate().map(move |(index, id)| {
        let index = index as u32;
        GridPlacement::unit(id, index % cols, first_row + index / cols)
    })
}

/// Assign each item a 1×1 cell in row-major order for every breakpoint
pub fn compute_default_placement(items: &[CollageItem], columns: &[(Breakpoint, u32)]) -> Layouts {
    let mut layouts = Layouts::new();
    for &(breakpoint, cols) in columns {
        let placements = pack_row_major(items.iter().map(|item| item.id.as_str()), cols, 0);
        layouts.insert(breakpoint, placements.collect());
    }
    layouts
}

/// Keep placements of items that persist, append new items below the current
/// bottom and drop placements of items that no longer exist.
pub fn reconcile(
    existing: &Layouts,
    items: &[CollageItem],
    columns: &[(Breakpoint, u32)],
) -> Layouts {
    let present: HashSet<&str> = items.iter().map(|item| item.id.as_str()).collect();
    let mut layouts = Layouts::new();

    for &(breakpoint, cols) in columns {
        let cols = cols.max(1);
        let mut seen = HashSet::new();
        let mut kept: Vec<GridPlacement> = existing
            .get(breakpoint)
            .unwrap_or_default()
            .iter()
            .filter(|p| present.contains(p.item_id.as_str()))
            .filter(|p| seen.insert(p.item_id.clone()))
            .cloned()
            .map(|mut p| {
                // Column count may have shrunk since the layout was saved.
                let saved = p.rect();
                p.w = p.w.clamp(1, cols);
                p.x = p.x.min(cols - p.w);
                p.h = p.h.max(1);
                if p.rect() != saved {
                    p.locked = false;
                }
                p
            })
            .collect();
        if !is_collision_free(&kept) {
            log::debug!("Re-flowing {} placements after a column change", breakpoint);
            compact_vertical(&mut kept, None);
        }

        let first_row = bottom(&kept);
        let fresh: Vec<&str> = items
            .iter()
            .map(|item| item.id.as_str())
            .filter(|id| seen.insert((*id).to_string()))
            .collect();
        kept.extend(pack_row_major(fresh.into_iter(), cols, first_row));
        layouts.insert(breakpoint, kept);
    }
    layouts
}

/// Result of a user edit on one placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The edit was applied; carries the item's settled rectangle
    Applied(CellRect),
    /// The edit resolved to the rectangle the item already had
    Unchanged,
    /// Locked or unknown item, nothing happened
    Rejected,
}

/// Responsive grid layout for one collage
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    layouts: Layouts,
    columns: Vec<(Breakpoint, u32)>,
}

impl GridLayout {
    /// Default packing for `items`
    pub fn with_defaults(items: &[CollageItem], columns: Vec<(Breakpoint, u32)>) -> Self {
        Self {
            layouts: compute_default_placement(items, &columns),
            columns,
        }
    }

    /// Restore a persisted layout, regenerating defaults when it is malformed
    pub fn restore(
        persisted: Option<Layouts>,
        items: &[CollageItem],
        columns: Vec<(Breakpoint, u32)>,
    ) -> Self {
        let Some(persisted) = persisted else {
            return Self::with_defaults(items, columns);
        };
        let expected: Vec<Breakpoint> = columns.iter().map(|(bp, _)| *bp).collect();
        if let Some(defect) = persisted.defect(&expected) {
            log::warn!("Persisted layout is malformed ({}), regenerating defaults", defect);
            return Self::with_defaults(items, columns);
        }
        let layouts = reconcile(&persisted, items, &columns);
        Self { layouts, columns }
    }

    pub fn layouts(&self) -> &Layouts {
        &self.layouts
    }

    pub fn placements(&self, breakpoint: Breakpoint) -> &[GridPlacement] {
        self.layouts.get(breakpoint).unwrap_or_default()
    }

    pub fn placement(&self, breakpoint: Breakpoint, item_id: &str) -> Option<&GridPlacement> {
        self.layouts.placement(breakpoint, item_id)
    }

    /// Column count of a breakpoint
    pub fn cols(&self, breakpoint: Breakpoint) -> u32 {
        self.columns
            .iter()
            .find(|(bp, _)| *bp == breakpoint)
            .map(|(_, cols)| (*cols).max(1))
            .unwrap_or(1)
    }

    pub fn columns(&self) -> &[(Breakpoint, u32)] {
        &self.columns
    }

    /// First free row of a breakpoint
    pub fn bottom(&self, breakpoint: Breakpoint) -> u32 {
        bottom(self.placements(breakpoint))
    }

    /// Re-sync with the current item set
    pub fn reconcile(&mut self, items: &[CollageItem]) {
        self.layouts = reconcile(&self.layouts, items, &self.columns);
    }

    /// Regenerate the default packing for every breakpoint
    pub fn reset(&mut self, items: &[CollageItem]) {
        self.layouts = compute_default_placement(items, &self.columns);
    }

    /// Set the locked flag of one placement; returns whether it changed
    pub fn set_locked(&mut self, breakpoint: Breakpoint, item_id: &str, locked: bool) -> bool {
        match self.layouts.placement_mut(breakpoint, item_id) {
            Some(placement) if placement.locked != locked => {
                placement.locked = locked;
                true
            }
            _ => false,
        }
    }

    /// Lock the placements of `active` for which `locked` holds and unlock
    /// every other placement. Returns whether any flag changed.
    pub fn sync_locks(&mut self, active: Breakpoint, locked: impl Fn(&str) -> bool) -> bool {
        let mut changed = false;
        for (breakpoint, _) in &self.columns {
            let Some(placements) = self.layouts.get_mut(*breakpoint) else {
                continue;
            };
            for placement in placements {
                let want = *breakpoint == active && locked(&placement.item_id);
                if placement.locked != want {
                    placement.locked = want;
                    changed = true;
                }
            }
        }
        changed
    }

    /// Clamp `request` to the item's bounds, apply it and compact the breakpoint
    pub fn apply_user_edit(
        &mut self,
        breakpoint: Breakpoint,
        item_id: &str,
        request: CellRequest,
    ) -> EditOutcome {
        let cols = self.cols(breakpoint);
        let Some(placements) = self.layouts.get_mut(breakpoint) else {
            return EditOutcome::Rejected;
        };
        let Some(index) = placements.iter().position(|p| p.item_id == item_id) else {
            return EditOutcome::Rejected;
        };
        if placements[index].locked {
            log::debug!("Ignoring edit on locked item '{}'", item_id);
            return EditOutcome::Rejected;
        }

        let clamped = clamp_request(&placements[index], request, cols);
        let before = placements.clone();
        placements[index].set_rect(clamped);
        compact_vertical(placements, Some(item_id));

        if *placements == before {
            EditOutcome::Unchanged
        } else {
            EditOutcome::Applied(placements[index].rect())
        }
    }
}

/// Clamp a requested rectangle to minimum size and column bounds
pub fn clamp_request(placement: &GridPlacement, request: CellRequest, cols: u32) -> CellRect {
    let cols = cols.max(1) as i32;
    let min_w = (placement.min_w() as i32).min(cols);
    let min_h = placement.min_h() as i32;

    let w = request.w.clamp(min_w, cols);
    let h = request.h.max(min_h);
    let x = request.x.clamp(0, cols - w);
    let y = request.y.max(0);
    CellRect::new(x as u32, y as u32, w as u32, h as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(ids: &[&str]) -> Vec<CollageItem> {
        ids.iter()
            .map(|id| CollageItem::new(*id, format!("https://img.example/{id}.jpg")))
            .collect()
    }

    fn columns() -> Vec<(Breakpoint, u32)> {
        vec![(Breakpoint::Lg, 4), (Breakpoint::Md, 3), (Breakpoint::Sm, 2)]
    }

    fn rects(layout: &GridLayout, bp: Breakpoint) -> Vec<(String, CellRect)> {
        layout
            .placements(bp)
            .iter()
            .map(|p| (p.item_id.clone(), p.rect()))
            .collect()
    }

    #[test]
    fn default_placement_is_row_major_per_breakpoint() {
        let layout = GridLayout::with_defaults(&items(&["a", "b", "c", "d"]), columns());
        let lg: Vec<_> = layout.placements(Breakpoint::Lg).iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(lg, vec![(0, 0), (1, 0), (2, 0), (3, 0)]);
        let sm: Vec<_> = layout.placements(Breakpoint::Sm).iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(sm, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
    }

    #[test]
    fn adding_an_item_appends_without_moving_others() {
        let mut layout = GridLayout::with_defaults(&items(&["a", "b", "c", "d"]), columns());
        let before = rects(&layout, Breakpoint::Lg);
        layout.reconcile(&items(&["a", "b", "c", "d", "e"]));
        let after = rects(&layout, Breakpoint::Lg);
        assert_eq!(&after[..4], &before[..]);
        assert_eq!(after[4], ("e".to_string(), CellRect::new(0, 1, 1, 1)));
    }

    #[test]
    fn reconcile_preserves_user_edits() {
        let mut layout = GridLayout::with_defaults(&items(&["a", "b"]), columns());
        layout.apply_user_edit(Breakpoint::Lg, "a", CellRequest::new(2, 0, 2, 2));
        let edited = layout.placement(Breakpoint::Lg, "a").cloned();
        layout.reconcile(&items(&["a", "b", "c"]));
        assert_eq!(layout.placement(Breakpoint::Lg, "a").cloned(), edited);
        let c = layout.placement(Breakpoint::Lg, "c").unwrap();
        assert_eq!(c.y, layout.placement(Breakpoint::Lg, "a").unwrap().rect().bottom());
    }

    #[test]
    fn removing_an_item_prunes_every_breakpoint() {
        let mut layout = GridLayout::with_defaults(&items(&["a", "b", "c"]), columns());
        let b_before: Vec<_> = columns()
            .iter()
            .map(|(bp, _)| layout.placement(*bp, "b").cloned())
            .collect();
        layout.reconcile(&items(&["b", "c"]));
        for (i, (bp, _)) in columns().iter().enumerate() {
            assert!(layout.placement(*bp, "a").is_none());
            assert_eq!(layout.placement(*bp, "b").cloned(), b_before[i]);
        }
    }

    #[test]
    fn reconcile_is_idempotent() {
        let mut layout = GridLayout::with_defaults(&items(&["a", "b", "c"]), columns());
        layout.apply_user_edit(Breakpoint::Md, "c", CellRequest::new(1, 0, 2, 3));
        let next = items(&["c", "x", "a", "y"]);
        let once = reconcile(layout.layouts(), &next, &columns());
        let twice = reconcile(&once, &next, &columns());
        assert_eq!(once, twice);
    }

    #[test]
    fn restore_falls_back_on_missing_breakpoint() {
        let mut partial = Layouts::new();
        partial.insert(Breakpoint::Lg, vec![GridPlacement::unit("a", 3, 0)]);
        let layout = GridLayout::restore(Some(partial), &items(&["a"]), columns());
        assert_eq!(layout.placement(Breakpoint::Lg, "a").unwrap().x, 0);
        assert!(layout.placement(Breakpoint::Sm, "a").is_some());
    }

    #[test]
    fn restore_keeps_well_formed_layout() {
        let mut saved = compute_default_placement(&items(&["a", "b"]), &columns());
        saved.placement_mut(Breakpoint::Lg, "b").unwrap().set_rect(CellRect::new(2, 0, 2, 2));
        let layout = GridLayout::restore(Some(saved), &items(&["a", "b"]), columns());
        assert_eq!(
            layout.placement(Breakpoint::Lg, "b").unwrap().rect(),
            CellRect::new(2, 0, 2, 2)
        );
    }

    #[test]
    fn restore_reflows_when_columns_shrink() {
        let mut saved = Layouts::new();
        for (bp, _) in columns() {
            saved.insert(
                bp,
                vec![
                    GridPlacement::unit("a", 0, 0),
                    GridPlacement::unit("b", 1, 0),
                    GridPlacement::unit("c", 3, 0),
                ],
            );
        }
        let narrow = vec![(Breakpoint::Lg, 2), (Breakpoint::Md, 3), (Breakpoint::Sm, 2)];
        let layout = GridLayout::restore(Some(saved), &items(&["a", "b", "c"]), narrow);

        let lg = layout.placements(Breakpoint::Lg);
        assert_eq!(lg.len(), 3);
        assert!(is_collision_free(lg));
        assert!(lg.iter().all(|p| p.rect().right() <= 2));
        assert_eq!(layout.placement(Breakpoint::Lg, "a").unwrap().rect(), CellRect::new(0, 0, 1, 1));
        assert!(is_collision_free(layout.placements(Breakpoint::Md)));
    }

    #[test]
    fn restore_regenerates_overlapping_layout() {
        let mut saved = compute_default_placement(&items(&["a", "b"]), &columns());
        saved.placement_mut(Breakpoint::Lg, "a").unwrap().set_rect(CellRect::new(0, 0, 2, 2));
        saved.placement_mut(Breakpoint::Lg, "b").unwrap().set_rect(CellRect::new(1, 1, 1, 1));
        let layout = GridLayout::restore(Some(saved), &items(&["a", "b"]), columns());
        assert_eq!(
            rects(&layout, Breakpoint::Lg),
            vec![
                ("a".to_string(), CellRect::new(0, 0, 1, 1)),
                ("b".to_string(), CellRect::new(1, 0, 1, 1)),
            ]
        );
    }

    #[test]
    fn restore_survives_rows_near_overflow() {
        let mut saved = compute_default_placement(&items(&["a"]), &columns());
        saved.placement_mut(Breakpoint::Lg, "a").unwrap().y = u32::MAX;
        let layout = GridLayout::restore(Some(saved), &items(&["a", "b"]), columns());
        assert_eq!(layout.placement(Breakpoint::Lg, "a").unwrap().rect(), CellRect::new(0, 0, 1, 1));
        assert_eq!(layout.placement(Breakpoint::Lg, "b").unwrap().rect(), CellRect::new(1, 0, 1, 1));
    }

    #[test]
    fn edit_is_clamped_to_columns_and_minimums() {
        let mut layout = GridLayout::with_defaults(&items(&["a"]), columns());
        let outcome = layout.apply_user_edit(Breakpoint::Lg, "a", CellRequest::new(3, -4, 9, 0));
        assert_eq!(outcome, EditOutcome::Applied(CellRect::new(0, 0, 4, 1)));

        let outcome = layout.apply_user_edit(Breakpoint::Lg, "a", CellRequest::new(7, 0, 1, 1));
        assert_eq!(outcome, EditOutcome::Applied(CellRect::new(3, 0, 1, 1)));
    }

    #[test]
    fn edit_on_locked_item_is_rejected() {
        let mut layout = GridLayout::with_defaults(&items(&["a", "b"]), columns());
        assert!(layout.set_locked(Breakpoint::Lg, "a", true));
        let before = layout.clone();
        let outcome = layout.apply_user_edit(Breakpoint::Lg, "a", CellRequest::new(2, 0, 1, 1));
        assert_eq!(outcome, EditOutcome::Rejected);
        assert_eq!(layout, before);
    }

    #[test]
    fn moving_onto_another_item_pushes_it_down() {
        let mut layout = GridLayout::with_defaults(&items(&["a", "b"]), columns());
        let outcome = layout.apply_user_edit(Breakpoint::Lg, "b", CellRequest::new(0, 0, 1, 1));
        assert_eq!(outcome, EditOutcome::Applied(CellRect::new(0, 0, 1, 1)));
        assert_eq!(
            layout.placement(Breakpoint::Lg, "a").unwrap().rect(),
            CellRect::new(0, 1, 1, 1)
        );
        assert!(is_collision_free(layout.placements(Breakpoint::Lg)));
    }

    #[test]
    fn edit_to_same_rect_is_unchanged() {
        let mut layout = GridLayout::with_defaults(&items(&["a", "b"]), columns());
        let outcome = layout.apply_user_edit(Breakpoint::Lg, "b", CellRequest::new(1, 0, 1, 1));
        assert_eq!(outcome, EditOutcome::Unchanged);
    }

    #[test]
    fn sync_locks_only_touches_active_breakpoint() {
        let mut layout = GridLayout::with_defaults(&items(&["a", "b"]), columns());
        layout.set_locked(Breakpoint::Md, "a", true);
        assert!(layout.sync_locks(Breakpoint::Lg, |id| id == "a"));
        assert!(layout.placement(Breakpoint::Lg, "a").unwrap().locked);
        assert!(!layout.placement(Breakpoint::Md, "a").unwrap().locked);
        assert!(!layout.placement(Breakpoint::Lg, "b").unwrap().locked);
        assert!(!layout.sync_locks(Breakpoint::Lg, |id| id == "a"));
    }

    #[test]
    fn unknown_item_is_rejected() {
        let mut layout = GridLayout::with_defaults(&items(&["a"]), columns());
        let outcome = layout.apply_user_edit(Breakpoint::Lg, "zzz", CellRequest::new(0, 0, 1, 1));
        assert_eq!(outcome, EditOutcome::Rejected);
    }
}
