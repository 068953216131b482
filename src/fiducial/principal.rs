//! Principal point estimation from opposed marker pairs.

use crate::fiducial::{FiducialSet, ScoreMedians};
use crate::geometry::{mean_point, Point};
use crate::trace::trace_warn;

/// How a principal point estimate was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confidence {
    /// Every estimate came from a complete pair of opposed markers.
    Full,
    /// At least one estimate combined two adjacent markers.
    Reduced,
}

/// A principal point and how much of the marker set backed it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PrincipalPointEstimate {
    pub point: Point,
    pub confidence: Confidence,
}

/// Mean midpoint of the opposed pairs that pass the score rule.
///
/// A pair contributes when both endpoints are defined and neither score
/// falls more than `threshold` below its slot median. Returns `None` when no
/// pair survives.
pub fn principal_point_from_pairs(set: &FiducialSet, medians: &ScoreMedians, threshold: f64) -> Option<Point> {
    let slots = set.layout.slots();
    let midpoints = set.layout.opposite_pairs().map(|(a, b)| {
        let (ma, mb) = (&set.markers[a], &set.markers[b]);
        let accepted = !medians.is_outlier(slots[a], ma.score, threshold)
            && !medians.is_outlier(slots[b], mb.score, threshold);
        match (ma.point, mb.point) {
            (Some(pa), Some(pb)) if accepted => Some(pa.midpoint(pb)),
            _ => None,
        }
    });
    mean_point(midpoints)
}

/// Principal point from midside proxies with adjacent-marker fallback.
///
/// The left/right and top/bottom midpoints are the primary estimates. Each
/// one that is missing is replaced by the first available combination of
/// `(row of left or right, column of top or bottom)` in the order
/// left+top, left+bottom, right+top, right+bottom. The defined estimates are
/// averaged. Returns `None` when no estimate can be formed.
pub fn principal_point_from_proxies(set: &FiducialSet) -> Option<PrincipalPointEstimate> {
    let [left, top, right, bottom] = set.points();
    let pair = |a: Option<Point>, b: Option<Point>| Some(a?.midpoint(b?));
    let fallback = [(left, top), (left, bottom), (right, top), (right, bottom)]
        .into_iter()
        .find_map(|(side, edge)| Some(Point::new(side?.y, edge?.x)));

    let mut confidence = Confidence::Full;
    let mut estimates = [pair(left, right), pair(top, bottom)];
    for estimate in estimates.iter_mut() {
        if estimate.is_none() && fallback.is_some() {
            *estimate = fallback;
            confidence = Confidence::Reduced;
        }
    }

    match mean_point(estimates) {
        Some(point) => Some(PrincipalPointEstimate { point, confidence }),
        None => {
            trace_warn!("no usable proxy combination", id = set.id.as_str());
            None
        }
    }
}

/// Combines midside and corner estimates of the same frame.
///
/// The result is the component-wise mean of the defined estimates.
pub fn merge_principal_points(midside: Option<Point>, corner: Option<Point>) -> Option<Point> {
    mean_point([midside, corner])
}

#[cfg(test)]
mod tests {
    use super::{merge_principal_points, principal_point_from_pairs, principal_point_from_proxies, Confidence};
    use crate::fiducial::{FiducialSet, Marker, ScoreMedians};
    use crate::geometry::{FiducialLayout, Point};

    fn rectangle() -> [Marker; 4] {
        [
            Marker::new(Point::new(50.0, 0.0), 0.9),
            Marker::new(Point::new(0.0, 80.0), 0.9),
            Marker::new(Point::new(50.0, 160.0), 0.9),
            Marker::new(Point::new(100.0, 80.0), 0.9),
        ]
    }

    #[test]
    fn rectangle_center_from_complete_pairs() {
        let set = FiducialSet::new("a", FiducialLayout::Midside, rectangle());
        let medians = ScoreMedians::from_sets(std::slice::from_ref(&set));
        assert_eq!(principal_point_from_pairs(&set, &medians, 0.01), Some(Point::new(50.0, 80.0)));
    }

    #[test]
    fn low_scoring_pair_is_excluded() {
        let good = FiducialSet::new("a", FiducialLayout::Midside, rectangle());
        let mut bad = good.clone();
        bad.markers[1].score = Some(0.2);
        bad.markers[0].point = Some(Point::new(52.0, 0.0));
        let medians = ScoreMedians::from_sets(&[good.clone(), good, bad.clone()]);
        // Only the left/right pair survives.
        assert_eq!(principal_point_from_pairs(&bad, &medians, 0.01), Some(Point::new(51.0, 80.0)));
        bad.markers[2].point = None;
        assert_eq!(principal_point_from_pairs(&bad, &medians, 0.01), None);
    }

    #[test]
    fn left_and_top_fall_back_with_reduced_confidence() {
        let mut markers = rectangle();
        markers[2] = Marker::missing();
        markers[3] = Marker::missing();
        let set = FiducialSet::new("a", FiducialLayout::Midside, markers);
        let est = principal_point_from_proxies(&set).unwrap();
        assert_eq!(est.point, Point::new(50.0, 80.0));
        assert_eq!(est.confidence, Confidence::Reduced);
    }

    #[test]
    fn complete_proxies_have_full_confidence() {
        let set = FiducialSet::new("a", FiducialLayout::Midside, rectangle());
        let est = principal_point_from_proxies(&set).unwrap();
        assert_eq!(est.point, Point::new(50.0, 80.0));
        assert_eq!(est.confidence, Confidence::Full);
    }

    #[test]
    fn one_side_only_is_a_failure() {
        let mut markers = [Marker::missing(); 4];
        markers[0] = Marker::new(Point::new(50.0, 0.0), 0.9);
        let set = FiducialSet::new("a", FiducialLayout::Midside, markers);
        assert_eq!(principal_point_from_proxies(&set), None);
    }

    #[test]
    fn merge_averages_defined_estimates() {
        let a = Some(Point::new(10.0, 20.0));
        let b = Some(Point::new(12.0, 18.0));
        assert_eq!(merge_principal_points(a, b), Some(Point::new(11.0, 19.0)));
        assert_eq!(merge_principal_points(None, b), b);
        assert_eq!(merge_principal_points(None, None), None);
    }
}
