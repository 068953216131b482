//! Batch-level outlier rejection.
//!
//! A low score only means something relative to how well the same marker
//! slot matches across the roll, so medians are taken per slot over the
//! whole batch before any marker is flagged.

use crate::fiducial::{FiducialSet, ProxyConfig};
use crate::geometry::{FiducialLayout, MarkerSlot};
use crate::trace::trace_event;
use crate::util::math::median;
use crate::util::{AerofidError, AerofidResult};

/// Configuration for score-based outlier rejection.
#[derive(Clone, Debug, PartialEq)]
pub struct OutlierConfig {
    /// Largest tolerated gap below the slot median score.
    pub threshold: f64,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self { threshold: 0.01 }
    }
}

impl OutlierConfig {
    pub fn validate(&self) -> AerofidResult<()> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(AerofidError::InvalidConfig {
                field: "threshold",
                reason: "must be finite and non-negative",
            });
        }
        Ok(())
    }
}

/// Median score of every marker slot across a batch.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScoreMedians {
    medians: [Option<f64>; 8],
}

impl ScoreMedians {
    /// Computes per-slot medians; undefined scores are excluded.
    pub fn from_sets(sets: &[FiducialSet]) -> Self {
        let mut medians = [None; 8];
        for slot in MarkerSlot::ALL {
            medians[slot.frame_index()] = median(
                sets.iter()
                    .filter_map(|set| set.marker(slot))
                    .map(|marker| marker.score),
            );
        }
        Self { medians }
    }

    /// Median score of `slot`, if any image scored it.
    pub fn get(&self, slot: MarkerSlot) -> Option<f64> {
        self.medians[slot.frame_index()]
    }

    /// True when `score` falls more than `threshold` below the slot median.
    pub fn is_outlier(&self, slot: MarkerSlot, score: Option<f64>, threshold: f64) -> bool {
        match (self.get(slot), score) {
            (Some(median), Some(score)) => median - score > threshold,
            _ => false,
        }
    }
}

/// Marks low-scoring markers as undefined.
///
/// Scores are kept for reporting; only the points are cleared. Returns the
/// medians the decision was based on.
pub fn reject_low_scores(sets: &mut [FiducialSet], cfg: &OutlierConfig) -> AerofidResult<ScoreMedians> {
    cfg.validate()?;
    let medians = ScoreMedians::from_sets(sets);
    let mut flagged = 0usize;
    for set in sets.iter_mut() {
        let slots = set.layout.slots();
        for (marker, slot) in set.markers.iter_mut().zip(slots) {
            if marker.point.is_some() && medians.is_outlier(slot, marker.score, cfg.threshold) {
                marker.point = None;
                flagged += 1;
            }
        }
    }
    trace_event!("low_scores_rejected", flagged = flagged);
    Ok(medians)
}

/// Marks proxies far from the batch median position as undefined.
///
/// A proxy is cleared when its row or column deviates from the slot median
/// by more than `offset_threshold_px`. The configured missing proxy slot is
/// cleared in every set. Only midside sets are considered.
pub fn reject_offset_proxies(sets: &mut [FiducialSet], cfg: &ProxyConfig) -> AerofidResult<()> {
    cfg.validate()?;
    let mut centers = [(None, None); 4];
    for (index, center) in centers.iter_mut().enumerate() {
        let points = || {
            sets.iter()
                .filter(|set| set.layout == FiducialLayout::Midside)
                .filter_map(move |set| set.markers[index].point)
        };
        *center = (median(points().map(|p| Some(p.y))), median(points().map(|p| Some(p.x))));
    }

    let mut flagged = 0usize;
    for set in sets.iter_mut().filter(|set| set.layout == FiducialLayout::Midside) {
        for (index, marker) in set.markers.iter_mut().enumerate() {
            let point = match marker.point {
                Some(point) => point,
                None => continue,
            };
            let off = |value: f64, center: Option<f64>| {
                center.is_some_and(|c| (value - c).abs() > cfg.offset_threshold_px)
            };
            let (cy, cx) = centers[index];
            if off(point.y, cy) || off(point.x, cx) {
                marker.point = None;
                flagged += 1;
            }
        }
        if let Some(slot) = cfg.missing_proxy {
            set.markers[slot.layout_index()].point = None;
        }
    }
    trace_event!("offset_proxies_rejected", flagged = flagged);
    Ok(())
}
