//! Placement records and the per-breakpoint layout map

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::domain::{Breakpoint, CellRect};

/// Rows past this are never produced by editing and mark a corrupt layout
pub const MAX_ROWS: u32 = 10_000;
/// Column spans past this mark a corrupt layout
pub const MAX_COLS: u32 = 64;

/// An item's assigned grid rectangle within one breakpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridPlacement {
    #[serde(rename = "i")]
    pub item_id: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_h: Option<u32>,
    /// Excluded from drag/resize, still occupies space
    #[serde(default, alias = "static")]
    pub locked: bool,
}

impl GridPlacement {
    /// A 1×1 placement with the default minimum size
    pub fn unit(item_id: impl Into<String>, x: u32, y: u32) -> Self {
        Self {
            item_id: item_id.into(),
            x,
            y,
            w: 1,
            h: 1,
            min_w: Some(1),
            min_h: Some(1),
            locked: false,
        }
    }

    pub fn rect(&self) -> CellRect {
        CellRect::new(self.x, self.y, self.w, self.h)
    }

    pub fn set_rect(&mut self, rect: CellRect) {
        self.x = rect.x;
        self.y = rect.y;
        self.w = rect.w;
        self.h = rect.h;
    }

    pub fn min_w(&self) -> u32 {
        self.min_w.unwrap_or(1).max(1)
    }

    pub fn min_h(&self) -> u32 {
        self.min_h.unwrap_or(1).max(1)
    }
}

/// Placements for every breakpoint, keyed by breakpoint name
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layouts(BTreeMap<Breakpoint, Vec<GridPlacement>>);

impl Layouts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, breakpoint: Breakpoint) -> Option<&[GridPlacement]> {
        self.0.get(&breakpoint).map(Vec::as_slice)
    }

    pub fn get_mut(&mut self, breakpoint: Breakpoint) -> Option<&mut Vec<GridPlacement>> {
        self.0.get_mut(&breakpoint)
    }

    pub fn insert(&mut self, breakpoint: Breakpoint, placements: Vec<GridPlacement>) {
        self.0.insert(breakpoint, placements);
    }

    pub fn contains(&self, breakpoint: Breakpoint) -> bool {
        self.0.contains_key(&breakpoint)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Breakpoint, &[GridPlacement])> {
        self.0.iter().map(|(bp, placements)| (*bp, placements.as_slice()))
    }

    pub fn breakpoints(&self) -> impl Iterator<Item = Breakpoint> + '_ {
        self.0.keys().copied()
    }

    /// True when no breakpoint holds any placement
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn placement(&self, breakpoint: Breakpoint, item_id: &str) -> Option<&GridPlacement> {
        self.get(breakpoint)?
            .iter()
            .find(|placement| placement.item_id == item_id)
    }

    pub fn placement_mut(
        &mut self,
        breakpoint: Breakpoint,
        item_id: &str,
    ) -> Option<&mut GridPlacement> {
        self.0
            .get_mut(&breakpoint)?
            .iter_mut()
            .find(|placement| placement.item_id == item_id)
    }

    /// Describe the first structural defect, if any.
    ///
    /// A well-formed layout has every expected breakpoint, unique item ids
    /// per breakpoint, non-empty rectangles inside `MAX_COLS` × `MAX_ROWS`
    /// and no two placements sharing a cell.
    pub fn defect(&self, expected: &[Breakpoint]) -> Option<String> {
        if let Some(missing) = expected.iter().find(|bp| !self.contains(**bp)) {
            return Some(format!("missing breakpoint '{}'", missing));
        }
        for (bp, placements) in self.iter() {
            let mut seen = HashSet::new();
            for placement in placements {
                if !seen.insert(placement.item_id.as_str()) {
                    return Some(format!(
                        "duplicate item '{}' in breakpoint '{}'",
                        placement.item_id, bp
                    ));
                }
                if placement.w == 0 || placement.h == 0 {
                    return Some(format!(
                        "empty rectangle for item '{}' in breakpoint '{}'",
                        placement.item_id, bp
                    ));
                }
                let right = placement.x.checked_add(placement.w);
                let bottom = placement.y.checked_add(placement.h);
                if !right.is_some_and(|r| r <= MAX_COLS) || !bottom.is_some_and(|b| b <= MAX_ROWS) {
                    return Some(format!(
                        "item '{}' in breakpoint '{}' lies outside the grid",
                        placement.item_id, bp
                    ));
                }
            }
            for (i, a) in placements.iter().enumerate() {
                if let Some(b) = placements[i + 1..].iter().find(|b| a.rect().overlaps(&b.rect())) {
                    return Some(format!(
                        "items '{}' and '{}' overlap in breakpoint '{}'",
                        a.item_id, b.item_id, bp
                    ));
                }
            }
        }
        None
    }
}

/// Bottom edge (first free row) of a set of placements
pub fn bottom(placements: &[GridPlacement]) -> u32 {
    placements
        .iter()
        .map(|p| p.rect().bottom())
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_grid_library_wire_format() {
        let json = r#"{
            "lg": [{"i": "a", "x": 0, "y": 0, "w": 2, "h": 1, "minW": 1, "moved": false, "static": true}],
            "md": []
        }"#;
        let layouts: Layouts = serde_json::from_str(json).unwrap();
        let a = layouts.placement(Breakpoint::Lg, "a").unwrap();
        assert_eq!(a.rect(), CellRect::new(0, 0, 2, 1));
        assert_eq!(a.min_w, Some(1));
        assert!(a.locked);
        assert!(layouts.get(Breakpoint::Md).is_some_and(|p| p.is_empty()));
    }

    #[test]
    fn unknown_breakpoint_key_is_rejected() {
        assert!(serde_json::from_str::<Layouts>(r#"{"foo": 1}"#).is_err());
        assert!(serde_json::from_str::<Layouts>(r#"{"lg": [{"i": "a", "x": -1, "y": 0, "w": 1, "h": 1}]}"#).is_err());
    }

    #[test]
    fn defect_reports_missing_breakpoint_and_duplicates() {
        let mut layouts = Layouts::new();
        layouts.insert(Breakpoint::Lg, vec![GridPlacement::unit("a", 0, 0)]);
        assert!(layouts.defect(&[Breakpoint::Lg]).is_none());
        assert!(layouts.defect(&[Breakpoint::Lg, Breakpoint::Md]).is_some());

        layouts.insert(
            Breakpoint::Lg,
            vec![GridPlacement::unit("a", 0, 0), GridPlacement::unit("a", 1, 0)],
        );
        assert!(layouts.defect(&[Breakpoint::Lg]).unwrap().contains("duplicate"));
    }

    #[test]
    fn defect_rejects_out_of_range_rows() {
        let mut far = GridPlacement::unit("a", 0, u32::MAX);
        far.h = 1;
        let mut layouts = Layouts::new();
        layouts.insert(Breakpoint::Lg, vec![far]);
        assert!(layouts.defect(&[Breakpoint::Lg]).unwrap().contains("outside"));

        layouts.insert(Breakpoint::Lg, vec![GridPlacement::unit("a", u32::MAX, 0)]);
        assert!(layouts.defect(&[Breakpoint::Lg]).is_some());

        layouts.insert(Breakpoint::Lg, vec![GridPlacement::unit("a", 0, MAX_ROWS - 1)]);
        assert!(layouts.defect(&[Breakpoint::Lg]).is_none());
    }

    #[test]
    fn defect_rejects_overlapping_placements() {
        let mut big = GridPlacement::unit("a", 0, 0);
        big.w = 2;
        big.h = 2;
        let mut layouts = Layouts::new();
        layouts.insert(Breakpoint::Lg, vec![big, GridPlacement::unit("b", 1, 1)]);
        assert!(layouts.defect(&[Breakpoint::Lg]).unwrap().contains("overlap"));
    }

    #[test]
    fn bottom_saturates_instead_of_overflowing() {
        assert_eq!(bottom(&[GridPlacement::unit("a", 0, u32::MAX)]), u32::MAX);
    }

    #[test]
    fn bottom_of_empty_is_zero() {
        assert_eq!(bottom(&[]), 0);
        let mut tall = GridPlacement::unit("a", 0, 2);
        tall.h = 3;
        assert_eq!(bottom(&[tall, GridPlacement::unit("b", 1, 0)]), 5);
    }
}
