//! Per-frame detection rows combining both fiducial layouts.

use crate::fiducial::{Confidence, FiducialSet, Marker};
use crate::geometry::{MarkerSlot, Point};

/// All eight marker slots of one frame plus its principal point.
///
/// Slots of a layout that was not detected stay undefined.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameDetection {
    pub id: String,
    /// Markers indexed by [`MarkerSlot::frame_index`].
    pub markers: [Marker; 8],
    pub principal_point: Option<Point>,
    /// `None` when the principal point is undefined.
    pub confidence: Option<Confidence>,
}

impl FrameDetection {
    /// A frame with no detections.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            markers: [Marker::missing(); 8],
            principal_point: None,
            confidence: None,
        }
    }

    /// Copies the markers of `set` into their frame slots.
    pub fn with_set(mut self, set: &FiducialSet) -> Self {
        let offset = set.layout.frame_offset();
        self.markers[offset..offset + 4].copy_from_slice(&set.markers);
        self
    }

    /// Sets the principal point, superseding any previous estimate.
    pub fn with_principal_point(mut self, point: Option<Point>, confidence: Confidence) -> Self {
        self.principal_point = point;
        self.confidence = point.map(|_| confidence);
        self
    }

    pub fn marker(&self, slot: MarkerSlot) -> &Marker {
        &self.markers[slot.frame_index()]
    }

    /// Marker points in frame slot order.
    pub fn points(&self) -> [Option<Point>; 8] {
        self.markers.map(|m| m.point)
    }
}

#[cfg(test)]
mod tests {
    use super::FrameDetection;
    use crate::fiducial::{Confidence, FiducialSet, Marker};
    use crate::geometry::{FiducialLayout, MarkerSlot, Point};

    #[test]
    fn sets_land_in_their_frame_slots() {
        let corner = FiducialSet::new("f", FiducialLayout::Corner, [Marker::new(Point::new(1.0, 2.0), 0.5); 4]);
        let frame = FrameDetection::new("f")
            .with_set(&corner)
            .with_principal_point(None, Confidence::Full);
        assert_eq!(frame.marker(MarkerSlot::MidsideLeft).point, None);
        assert_eq!(frame.marker(MarkerSlot::CornerBottomLeft).score, Some(0.5));
        assert_eq!(frame.confidence, None);
    }
}
