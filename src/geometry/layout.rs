//! Fiducial layouts and marker slot naming.

use crate::geometry::window::{corner_windows, midside_windows, Window};
use crate::util::AerofidResult;

/// Which set of four fiducials a template targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FiducialLayout {
    /// Markers at the middle of each frame edge.
    Midside,
    /// Markers in the four frame corners.
    Corner,
}

/// One of the eight fiducial positions of a frame camera.
///
/// The discriminant is the slot's index in a full eight-marker frame:
/// midside markers first, then corners.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkerSlot {
    MidsideLeft = 0,
    MidsideTop = 1,
    MidsideRight = 2,
    MidsideBottom = 3,
    CornerTopLeft = 4,
    CornerTopRight = 5,
    CornerBottomRight = 6,
    CornerBottomLeft = 7,
}

impl MarkerSlot {
    /// All slots in frame order.
    pub const ALL: [MarkerSlot; 8] = [
        MarkerSlot::MidsideLeft,
        MarkerSlot::MidsideTop,
        MarkerSlot::MidsideRight,
        MarkerSlot::MidsideBottom,
        MarkerSlot::CornerTopLeft,
        MarkerSlot::CornerTopRight,
        MarkerSlot::CornerBottomRight,
        MarkerSlot::CornerBottomLeft,
    ];

    /// Stable column label used in result tables.
    pub fn label(self) -> &'static str {
        match self {
            MarkerSlot::MidsideLeft => "midside_left",
            MarkerSlot::MidsideTop => "midside_top",
            MarkerSlot::MidsideRight => "midside_right",
            MarkerSlot::MidsideBottom => "midside_bottom",
            MarkerSlot::CornerTopLeft => "corner_top_left",
            MarkerSlot::CornerTopRight => "corner_top_right",
            MarkerSlot::CornerBottomRight => "corner_bottom_right",
            MarkerSlot::CornerBottomLeft => "corner_bottom_left",
        }
    }

    /// Parses a label produced by [`MarkerSlot::label`].
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.label() == label)
    }

    /// Index into an eight-marker frame.
    pub fn frame_index(self) -> usize {
        self as usize
    }

    /// Index within the slot's four-marker layout.
    pub fn layout_index(self) -> usize {
        self as usize % 4
    }

    pub fn layout(self) -> FiducialLayout {
        if (self as usize) < 4 {
            FiducialLayout::Midside
        } else {
            FiducialLayout::Corner
        }
    }
}

impl FiducialLayout {
    /// Slots of this layout in detection order.
    pub fn slots(self) -> [MarkerSlot; 4] {
        match self {
            FiducialLayout::Midside => [
                MarkerSlot::MidsideLeft,
                MarkerSlot::MidsideTop,
                MarkerSlot::MidsideRight,
                MarkerSlot::MidsideBottom,
            ],
            FiducialLayout::Corner => [
                MarkerSlot::CornerTopLeft,
                MarkerSlot::CornerTopRight,
                MarkerSlot::CornerBottomRight,
                MarkerSlot::CornerBottomLeft,
            ],
        }
    }

    /// Column labels of this layout in detection order.
    pub fn labels(self) -> [&'static str; 4] {
        self.slots().map(MarkerSlot::label)
    }

    /// Layout-local index pairs of diametrically opposed markers.
    ///
    /// Midside: left/right and top/bottom. Corner: the two diagonals.
    pub fn opposite_pairs(self) -> [(usize, usize); 2] {
        [(0, 2), (1, 3)]
    }

    /// Offset of this layout's first slot in an eight-marker frame.
    pub fn frame_offset(self) -> usize {
        match self {
            FiducialLayout::Midside => 0,
            FiducialLayout::Corner => 4,
        }
    }

    /// Search windows for a raster of the given size.
    pub fn windows(self, height: usize, width: usize) -> AerofidResult<[Window; 4]> {
        match self {
            FiducialLayout::Midside => midside_windows(height, width),
            FiducialLayout::Corner => corner_windows(height, width),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FiducialLayout, MarkerSlot};

    #[test]
    fn slots_round_trip_through_indices() {
        for (i, slot) in MarkerSlot::ALL.iter().enumerate() {
            assert_eq!(slot.frame_index(), i);
            let layout = slot.layout();
            assert_eq!(layout.slots()[slot.layout_index()], *slot);
            assert_eq!(layout.frame_offset() + slot.layout_index(), i);
            assert_eq!(MarkerSlot::from_label(slot.label()), Some(*slot));
        }
        assert_eq!(MarkerSlot::from_label("center"), None);
    }

    #[test]
    fn labels_follow_detection_order() {
        assert_eq!(
            FiducialLayout::Corner.labels(),
            [
                "corner_top_left",
                "corner_top_right",
                "corner_bottom_right",
                "corner_bottom_left"
            ]
        );
    }
}
