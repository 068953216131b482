//! Per-frame restitution: transform fitting, resampling, cropping and QC.

use crate::fiducial::FrameDetection;
use crate::geometry::{MarkerSlot, Point};
use crate::image::{ops, Raster};
use crate::qc::{frame_qc, FrameState, QcRecord};
use crate::refine::InterpolationOrder;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::transform::{warp_affine, AffineTransform, CanonicalGeometry};
use crate::util::{AerofidError, AerofidResult};

/// Configuration for restitution of detected frames.
#[derive(Clone, Debug, PartialEq)]
pub struct RestitutionConfig {
    /// Scanning resolution in millimeters per pixel.
    pub scanning_resolution_mm: f64,
    /// Fit the transform and map the coordinates.
    pub transform_coords: bool,
    /// Resample the raster through the fitted transform.
    pub transform_image: bool,
    /// Crop a square around the principal point.
    pub crop_image: bool,
    /// Side of the cropped output in pixels.
    pub output_size: usize,
    /// Spline order used when resampling.
    pub interpolation: InterpolationOrder,
    /// Compute QC metrics.
    pub compute_qc: bool,
}

impl Default for RestitutionConfig {
    fn default() -> Self {
        Self {
            scanning_resolution_mm: 0.02,
            transform_coords: true,
            transform_image: true,
            crop_image: true,
            output_size: 10800,
            interpolation: InterpolationOrder::Cubic,
            compute_qc: true,
        }
    }
}

impl RestitutionConfig {
    pub fn validate(&self) -> AerofidResult<()> {
        if !self.scanning_resolution_mm.is_finite() || self.scanning_resolution_mm <= 0.0 {
            return Err(AerofidError::InvalidConfig {
                field: "scanning_resolution_mm",
                reason: "must be finite and positive",
            });
        }
        if self.crop_image && self.output_size == 0 {
            return Err(AerofidError::InvalidConfig {
                field: "output_size",
                reason: "must be positive when cropping",
            });
        }
        Ok(())
    }

    /// True when restitution produces an output raster.
    pub fn writes_raster(&self) -> bool {
        self.transform_image || self.crop_image
    }
}

/// Result of restituting one frame.
#[derive(Clone, Debug)]
pub struct Restitution {
    pub id: String,
    /// Detected to canonical map, when at least three pairs were available.
    pub transform: Option<AffineTransform>,
    /// Marker points after the transform, or the detected ones.
    pub points: [Option<Point>; 8],
    /// Principal point after the transform, or the detected one.
    pub principal_point: Option<Point>,
    /// Output raster when resampling or cropping was requested.
    pub raster: Option<Raster>,
    pub qc: Option<QcRecord>,
}

/// Fits the detected to canonical transform of one frame.
///
/// Canonical positions are anchored at the frame's principal point; slots
/// undefined on either side are skipped. Returns `None` without a principal
/// point or with fewer than three usable, non-collinear pairs.
pub fn fit_frame(detection: &FrameDetection, canonical: &CanonicalGeometry) -> Option<AffineTransform> {
    let pp = detection.principal_point?;
    let mut src = Vec::with_capacity(8);
    let mut dst = Vec::with_capacity(8);
    for slot in MarkerSlot::ALL {
        let measured = detection.marker(slot).point;
        let expected = canonical.offset(slot).map(|o| pp.offset(o.y, o.x));
        if let (Some(m), Some(e)) = (measured, expected) {
            src.push(m);
            dst.push(e);
        }
    }
    if src.len() < 3 {
        trace_warn!("too few correspondences", id = detection.id.as_str(), pairs = src.len());
        return None;
    }
    match AffineTransform::estimate(&src, &dst) {
        Ok(tf) => Some(tf),
        Err(_) => {
            trace_warn!("degenerate correspondences", id = detection.id.as_str(), pairs = src.len());
            None
        }
    }
}

/// Restitutes one frame.
///
/// `raster` is required when the config resamples or crops. Without a
/// transform the coordinates pass through and the raster is only cropped
/// (or returned unchanged when cropping is off or the principal point is
/// undefined).
pub fn restitute(
    detection: &FrameDetection,
    raster: Option<&Raster>,
    canonical: &CanonicalGeometry,
    cfg: &RestitutionConfig,
) -> AerofidResult<Restitution> {
    cfg.validate()?;
    let _span = trace_span!("restitute", id = detection.id.as_str()).entered();

    let detected = detection.points();
    let transform = if cfg.transform_coords || cfg.transform_image {
        fit_frame(detection, canonical)
    } else {
        None
    };

    let (points, principal_point) = match &transform {
        Some(tf) => (
            detected.map(|p| p.map(|p| tf.apply(p))),
            detection.principal_point.map(|p| tf.apply(p)),
        ),
        None => (detected, detection.principal_point),
    };

    let raster = match (cfg.writes_raster(), raster) {
        (false, _) => None,
        (true, None) => return Err(AerofidError::InvalidInput("restitution needs the frame raster")),
        (true, Some(source)) => {
            let mut out = match (&transform, cfg.transform_image) {
                (Some(tf), true) => warp_affine(source, &tf.inverse()?, cfg.interpolation)?,
                _ => source.clone(),
            };
            if cfg.crop_image {
                if let Some(center) = principal_point {
                    out = ops::crop_about_point(&out, center, cfg.output_size)?;
                }
            }
            Some(out)
        }
    };

    let qc = match (cfg.compute_qc, detection.principal_point) {
        (true, Some(pp)) => {
            let before = FrameState {
                points: detected,
                principal_point: pp,
            };
            let after = transform.as_ref().and(principal_point).map(|tpp| FrameState {
                points,
                principal_point: tpp,
            });
            Some(frame_qc(&detection.id, canonical, pp, &before, after.as_ref()))
        }
        (true, None) => Some(QcRecord {
            id: detection.id.clone(),
            ..QcRecord::default()
        }),
        (false, _) => None,
    };

    trace_event!("restituted", fitted = transform.is_some());
    Ok(Restitution {
        id: detection.id.clone(),
        transform,
        points,
        principal_point,
        raster,
        qc,
    })
}
