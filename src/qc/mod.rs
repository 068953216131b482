//! Quality-control metrics of fiducial restitution.
//!
//! All distances are reported in millimeters on the film. "Before" metrics
//! compare the detected markers with the calibrated geometry anchored at the
//! detected principal point; "after" metrics repeat the comparison with the
//! markers and principal point mapped through the fitted transform.

mod table;

pub use table::{MetricSummary, QcTable};

use crate::geometry::{FiducialLayout, MarkerSlot, Point};
use crate::transform::CanonicalGeometry;
use crate::util::math::{rms, wrap_deg};

/// Per-frame QC metrics. Undefined metrics are `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QcRecord {
    pub id: String,
    pub coordinates_rmse_before: Option<f64>,
    pub coordinates_rmse_after: Option<f64>,
    pub pp_distance_rmse_before: Option<f64>,
    pub pp_distance_rmse_after: Option<f64>,
    pub midside_angle_diff_before: Option<f64>,
    pub midside_angle_diff_after: Option<f64>,
    pub corner_angle_diff_before: Option<f64>,
    pub corner_angle_diff_after: Option<f64>,
}

impl QcRecord {
    /// Metric names in table column order.
    pub const METRICS: [&'static str; 8] = [
        "coordinates_rmse_before",
        "coordinates_rmse_after",
        "pp_distance_rmse_before",
        "pp_distance_rmse_after",
        "midside_angle_diff_before",
        "midside_angle_diff_after",
        "corner_angle_diff_before",
        "corner_angle_diff_after",
    ];

    /// Metric values in [`QcRecord::METRICS`] order.
    pub fn values(&self) -> [Option<f64>; 8] {
        [
            self.coordinates_rmse_before,
            self.coordinates_rmse_after,
            self.pp_distance_rmse_before,
            self.pp_distance_rmse_after,
            self.midside_angle_diff_before,
            self.midside_angle_diff_after,
            self.corner_angle_diff_before,
            self.corner_angle_diff_after,
        ]
    }
}

/// Marker positions and principal point of one frame state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameState {
    pub points: [Option<Point>; 8],
    pub principal_point: Point,
}

/// Computes the QC record of one frame.
///
/// `anchor` is the principal point the calibrated geometry is anchored at
/// for the position RMSE; `after` is `None` when no transform was fitted.
pub fn frame_qc(
    id: &str,
    canonical: &CanonicalGeometry,
    anchor: Point,
    before: &FrameState,
    after: Option<&FrameState>,
) -> QcRecord {
    let mut expected = [None; 8];
    for slot in MarkerSlot::ALL {
        expected[slot.frame_index()] = canonical.offset(slot).map(|o| anchor.offset(o.y, o.x));
    }
    let res = canonical.resolution_mm();

    let metrics = |state: &FrameState| {
        (
            coordinate_rmse(&state.points, &expected, res),
            pp_distance_rmse(state, canonical, res),
            angle_diff(&state.points, canonical, FiducialLayout::Midside),
            angle_diff(&state.points, canonical, FiducialLayout::Corner),
        )
    };

    let (c0, d0, m0, k0) = metrics(before);
    let (c1, d1, m1, k1) = match after {
        Some(state) => metrics(state),
        None => (None, None, None, None),
    };
    QcRecord {
        id: id.to_owned(),
        coordinates_rmse_before: c0,
        coordinates_rmse_after: c1,
        pp_distance_rmse_before: d0,
        pp_distance_rmse_after: d1,
        midside_angle_diff_before: m0,
        midside_angle_diff_after: m1,
        corner_angle_diff_before: k0,
        corner_angle_diff_after: k1,
    }
}

/// RMSE of marker position errors over slots defined on both sides.
pub fn coordinate_rmse(points: &[Option<Point>; 8], expected: &[Option<Point>; 8], res_mm: f64) -> Option<f64> {
    rms(points
        .iter()
        .zip(expected)
        .map(|(p, e)| Some(p.as_ref()?.distance(*e.as_ref()?) * res_mm)))
}

/// RMSE of measured minus expected marker distances to the principal point.
pub fn pp_distance_rmse(state: &FrameState, canonical: &CanonicalGeometry, res_mm: f64) -> Option<f64> {
    rms(MarkerSlot::ALL.iter().map(|&slot| {
        let measured = state.points[slot.frame_index()]?.distance(state.principal_point);
        let expected = canonical.offset(slot)?.distance(Point::new(0.0, 0.0));
        Some((measured - expected) * res_mm)
    }))
}

/// Absolute difference in degrees between the measured and calibrated
/// intersection angles of the lines through a layout's opposed markers.
pub fn angle_diff(points: &[Option<Point>; 8], canonical: &CanonicalGeometry, layout: FiducialLayout) -> Option<f64> {
    let slots = layout.slots();
    let [(a0, a1), (b0, b1)] = layout.opposite_pairs();
    let measured = intersection_angle(
        points[slots[a0].frame_index()]?,
        points[slots[a1].frame_index()]?,
        points[slots[b0].frame_index()]?,
        points[slots[b1].frame_index()]?,
    )?;
    let expected = intersection_angle(
        canonical.offset(slots[a0])?,
        canonical.offset(slots[a1])?,
        canonical.offset(slots[b0])?,
        canonical.offset(slots[b1])?,
    )?;
    Some(wrap_deg(measured - expected).abs())
}

/// Signed angle in degrees from line `p0 -> p1` to line `q0 -> q1`.
fn intersection_angle(p0: Point, p1: Point, q0: Point, q1: Point) -> Option<f64> {
    let (ux, uy) = (p1.x - p0.x, p1.y - p0.y);
    let (vx, vy) = (q1.x - q0.x, q1.y - q0.y);
    if (ux == 0.0 && uy == 0.0) || (vx == 0.0 && vy == 0.0) {
        return None;
    }
    Some((ux * vy - uy * vx).atan2(ux * vx + uy * vy).to_degrees())
}

#[cfg(test)]
mod tests {
    use super::{angle_diff, frame_qc, FrameState};
    use crate::geometry::{MarkerSlot, Point};
    use crate::transform::CanonicalGeometry;

    fn geometry() -> CanonicalGeometry {
        let mut table = [None; 8];
        for (slot, mm) in [
            (MarkerSlot::MidsideLeft, (-1.0, 0.0)),
            (MarkerSlot::MidsideTop, (0.0, 1.0)),
            (MarkerSlot::MidsideRight, (1.0, 0.0)),
            (MarkerSlot::MidsideBottom, (0.0, -1.0)),
        ] {
            table[slot.frame_index()] = Some(mm);
        }
        CanonicalGeometry::from_mm(table, 0.01).unwrap()
    }

    fn ideal(pp: Point) -> [Option<Point>; 8] {
        let mut points = [None; 8];
        points[0] = Some(pp.offset(0.0, -100.0));
        points[1] = Some(pp.offset(-100.0, 0.0));
        points[2] = Some(pp.offset(0.0, 100.0));
        points[3] = Some(pp.offset(100.0, 0.0));
        points
    }

    #[test]
    fn ideal_markers_have_zero_error() {
        let pp = Point::new(500.0, 400.0);
        let state = FrameState {
            points: ideal(pp),
            principal_point: pp,
        };
        let qc = frame_qc("a", &geometry(), pp, &state, None);
        assert!(qc.coordinates_rmse_before.unwrap() < 1e-12);
        assert!(qc.pp_distance_rmse_before.unwrap() < 1e-12);
        assert!(qc.midside_angle_diff_before.unwrap() < 1e-12);
        assert_eq!(qc.corner_angle_diff_before, None);
        assert_eq!(qc.coordinates_rmse_after, None);
    }

    #[test]
    fn shifted_marker_shows_up_in_rmse_and_angle() {
        let pp = Point::new(500.0, 400.0);
        let mut points = ideal(pp);
        // Top marker moved 10 px right: 0.1 mm error on one of four markers.
        points[1] = points[1].map(|p| p.offset(0.0, 10.0));
        let state = FrameState {
            points,
            principal_point: pp,
        };
        let qc = frame_qc("a", &geometry(), pp, &state, None);
        assert!((qc.coordinates_rmse_before.unwrap() - 0.05).abs() < 1e-9);
        let expected_angle = (10.0f64 / 200.0).atan().to_degrees();
        let got = angle_diff(&points, &geometry(), crate::geometry::FiducialLayout::Midside).unwrap();
        assert!((got - expected_angle).abs() < 1e-9);
    }
}
