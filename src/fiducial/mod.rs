//! Fiducial detection results and their batch-level post-processing.
//!
//! Detection runs per image ([`detect_fiducials`], [`detect_fiducial_proxies`]).
//! Score and position outlier rejection need the whole batch and run as a
//! separate pass ([`reject_low_scores`], [`reject_offset_proxies`]) before
//! principal points are estimated.

mod detect;
mod frame;
mod principal;
mod proxy;
mod score;

pub use detect::{detect_fiducials, DetectConfig, FiducialTemplates};
pub use frame::FrameDetection;
pub use principal::{
    merge_principal_points, principal_point_from_pairs, principal_point_from_proxies, Confidence,
    PrincipalPointEstimate,
};
pub use proxy::{detect_fiducial_proxies, ProxyConfig};
pub use score::{reject_low_scores, reject_offset_proxies, OutlierConfig, ScoreMedians};

use crate::geometry::{FiducialLayout, MarkerSlot, Point};

/// One detected marker. Either field may be undefined.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Marker {
    /// Marker center in raster coordinates.
    pub point: Option<Point>,
    /// Match score in [-1, 1].
    pub score: Option<f64>,
}

impl Marker {
    pub fn new(point: Point, score: f64) -> Self {
        Self {
            point: Some(point),
            score: Some(score),
        }
    }

    /// A marker that could not be detected.
    pub fn missing() -> Self {
        Self::default()
    }
}

/// Exactly four markers of one layout for one raster.
#[derive(Clone, Debug, PartialEq)]
pub struct FiducialSet {
    /// Identity of the source raster.
    pub id: String,
    pub layout: FiducialLayout,
    /// Markers in the layout's slot order.
    pub markers: [Marker; 4],
}

impl FiducialSet {
    pub fn new(id: impl Into<String>, layout: FiducialLayout, markers: [Marker; 4]) -> Self {
        Self {
            id: id.into(),
            layout,
            markers,
        }
    }

    /// Marker stored for `slot`, or `None` if the slot belongs to another layout.
    pub fn marker(&self, slot: MarkerSlot) -> Option<&Marker> {
        (slot.layout() == self.layout).then(|| &self.markers[slot.layout_index()])
    }

    /// Marker points in slot order.
    pub fn points(&self) -> [Option<Point>; 4] {
        self.markers.map(|m| m.point)
    }

    /// Number of markers with a defined point.
    pub fn defined_count(&self) -> usize {
        self.markers.iter().filter(|m| m.point.is_some()).count()
    }
}
