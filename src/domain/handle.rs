//! Pointer targets on a collage tile

/// Resize handle on a tile edge or corner
#[repr(u8)]
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    /// North-West corner
    NW,
    /// North edge
    N,
    /// North-East corner
    NE,
    /// East edge
    E,
    /// South-East corner
    #[default]
    SE,
    /// South edge
    S,
    /// South-West corner
    SW,
    /// West edge
    W,
}

impl ResizeHandle {
    /// Whether dragging this handle moves the left edge
    pub fn moves_left(self) -> bool {
        matches!(self, ResizeHandle::NW | ResizeHandle::W | ResizeHandle::SW)
    }

    /// Whether dragging this handle moves the right edge
    pub fn moves_right(self) -> bool {
        matches!(self, ResizeHandle::NE | ResizeHandle::E | ResizeHandle::SE)
    }

    /// Whether dragging this handle moves the top edge
    pub fn moves_top(self) -> bool {
        matches!(self, ResizeHandle::NW | ResizeHandle::N | ResizeHandle::NE)
    }

    /// Whether dragging this handle moves the bottom edge
    pub fn moves_bottom(self) -> bool {
        matches!(self, ResizeHandle::SW | ResizeHandle::S | ResizeHandle::SE)
    }
}

impl From<u8> for ResizeHandle {
    fn from(state: u8) -> Self {
        match state {
            0 => ResizeHandle::NW,
            1 => ResizeHandle::N,
            2 => ResizeHandle::NE,
            3 => ResizeHandle::E,
            5 => ResizeHandle::S,
            6 => ResizeHandle::SW,
            7 => ResizeHandle::W,
            _ => ResizeHandle::SE,
        }
    }
}

impl From<ResizeHandle> for u8 {
    fn from(handle: ResizeHandle) -> Self {
        handle as u8
    }
}

/// What the pointer went down on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    /// The tile's drag handle (grid-level move)
    DragHandle,
    /// One of the tile's resize handles (grid-level resize)
    Resize(ResizeHandle),
    /// The image content inside the tile (item-level pan)
    Content,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_round_trips_through_u8() {
        for raw in 0u8..8 {
            let handle = ResizeHandle::from(raw);
            assert_eq!(u8::from(handle), raw);
        }
    }

    #[test]
    fn corner_handles_move_two_edges() {
        assert!(ResizeHandle::NW.moves_left() && ResizeHandle::NW.moves_top());
        assert!(ResizeHandle::SE.moves_right() && ResizeHandle::SE.moves_bottom());
        assert!(!ResizeHandle::E.moves_top() && !ResizeHandle::E.moves_bottom());
    }
}
