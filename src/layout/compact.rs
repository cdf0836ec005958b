//! Vertical compaction
//!
//! Every unlocked rectangle floats up as far as it can without overlapping a
//! rectangle that was already settled. Locked rectangles never move and act as
//! fixed obstacles. Settling order is top-to-bottom, left-to-right, with an
//! optional priority item winning ties on its row so that a freshly edited
//! tile pushes the tiles it lands on instead of being pushed by them.

use crate::domain::CellRect;

use super::placement::GridPlacement;

fn first_collision<'a>(rect: &CellRect, settled: &'a [CellRect]) -> Option<&'a CellRect> {
    settled.iter().find(|other| rect.overlaps(other))
}

fn settled_bottom(settled: &[CellRect]) -> u32 {
    settled.iter().map(CellRect::bottom).max().unwrap_or(0)
}

/// Compact placements in place.
pub fn compact_vertical(placements: &mut [GridPlacement], priority: Option<&str>) {
    let mut settled: Vec<CellRect> = placements
        .iter()
        .filter(|p| p.locked)
        .map(GridPlacement::rect)
        .collect();

    let mut order: Vec<usize> = (0..placements.len())
        .filter(|&i| !placements[i].locked)
        .collect();
    order.sort_by_key(|&i| {
        let p = &placements[i];
        let rank = u8::from(priority != Some(p.item_id.as_str()));
        (p.y, rank, p.x)
    });

    for index in order {
        let mut rect = placements[index].rect();

        // Nothing below the settled stack can be supported, start from there.
        rect.y = rect.y.min(settled_bottom(&settled));
        while rect.y > 0 {
            let above = CellRect { y: rect.y - 1, ..rect };
            if first_collision(&above, &settled).is_some() {
                break;
            }
            rect.y -= 1;
        }
        while let Some(hit) = first_collision(&rect, &settled) {
            rect.y = hit.bottom();
        }

        settled.push(rect);
        placements[index].set_rect(rect);
    }
}

/// True when no two unlocked placements overlap each other or a locked one
pub fn is_collision_free(placements: &[GridPlacement]) -> bool {
    placements.iter().enumerate().all(|(i, a)| {
        placements[i + 1..]
            .iter()
            .all(|b| (a.locked && b.locked) || !a.rect().overlaps(&b.rect()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(id: &str, x: u32, y: u32, w: u32, h: u32) -> GridPlacement {
        GridPlacement {
            w,
            h,
            ..GridPlacement::unit(id, x, y)
        }
    }

    #[test]
    fn floats_items_up_into_gaps() {
        let mut layout = vec![placement("a", 0, 3, 1, 1), placement("b", 1, 5, 1, 2)];
        compact_vertical(&mut layout, None);
        assert_eq!(layout[0].rect(), CellRect::new(0, 0, 1, 1));
        assert_eq!(layout[1].rect(), CellRect::new(1, 0, 1, 2));
    }

    #[test]
    fn stacks_items_in_the_same_column() {
        let mut layout = vec![
            placement("a", 0, 0, 2, 1),
            placement("b", 1, 0, 1, 1),
            placement("c", 0, 9, 1, 1),
        ];
        compact_vertical(&mut layout, None);
        assert_eq!(layout[0].rect(), CellRect::new(0, 0, 2, 1));
        assert_eq!(layout[1].rect(), CellRect::new(1, 1, 1, 1));
        assert_eq!(layout[2].rect(), CellRect::new(0, 1, 1, 1));
        assert!(is_collision_free(&layout));
    }

    #[test]
    fn priority_item_pushes_the_item_it_lands_on() {
        let mut layout = vec![placement("a", 0, 0, 1, 1), placement("b", 0, 0, 1, 1)];
        compact_vertical(&mut layout, Some("b"));
        assert_eq!(layout[1].rect(), CellRect::new(0, 0, 1, 1));
        assert_eq!(layout[0].rect(), CellRect::new(0, 1, 1, 1));
    }

    #[test]
    fn locked_items_stay_put_and_block() {
        let mut pinned = placement("pinned", 0, 2, 2, 1);
        pinned.locked = true;
        let mut layout = vec![pinned, placement("a", 0, 2, 1, 1), placement("b", 1, 0, 1, 3)];
        compact_vertical(&mut layout, None);
        assert_eq!(layout[0].rect(), CellRect::new(0, 2, 2, 1));
        assert_eq!(layout[1].rect(), CellRect::new(0, 0, 1, 1));
        assert_eq!(layout[2].rect(), CellRect::new(1, 3, 1, 3));
        assert!(is_collision_free(&layout));
    }
}
