//! Refinement of coarse candidates at finer pyramid levels.
//!
//! Each candidate is upscaled to the next finer level and re-scored in a
//! small ROI around its projected position.

use crate::bank::CompiledTemplate;
use crate::candidate::nms::nms_2d;
use crate::candidate::topk::Peak;
use crate::image::pyramid::ImagePyramid;
use crate::kernel::rayon::{scan_range, ScanRange};
use crate::kernel::DefaultKernel;
use crate::search::MatchConfig;

fn upscale_pos(x: usize, y: usize) -> (usize, usize) {
    (x.saturating_mul(2), y.saturating_mul(2))
}

/// Clamps a square ROI of `radius` around `(x, y)` to `[0, max_x] x [0, max_y]`.
pub(crate) fn roi_bounds(x: usize, y: usize, radius: usize, max_x: usize, max_y: usize) -> Option<ScanRange> {
    let x0 = x.saturating_sub(radius);
    let y0 = y.saturating_sub(radius);
    if x0 > max_x || y0 > max_y {
        return None;
    }
    Some(ScanRange {
        x0,
        y0,
        x1: x.saturating_add(radius).min(max_x),
        y1: y.saturating_add(radius).min(max_y),
    })
}

pub(crate) fn refine_to_finer_level(
    pyramid: &ImagePyramid,
    tpl: &CompiledTemplate,
    finer_level: usize,
    prev: &[Peak],
    cfg: &MatchConfig,
) -> Vec<Peak> {
    let (image, plan) = match (pyramid.level(finer_level), tpl.plan(finer_level)) {
        (Some(image), Some(plan)) => (image, plan),
        _ => return Vec::new(),
    };
    let full = match ScanRange::full(image, plan) {
        Some(range) => range,
        None => return Vec::new(),
    };

    let mut all_peaks = Vec::new();
    for cand in prev {
        let (x_up, y_up) = upscale_pos(cand.x, cand.y);
        let roi = match roi_bounds(x_up, y_up, cfg.roi_radius, full.x1, full.y1) {
            Some(roi) => roi,
            None => continue,
        };
        all_peaks.extend(scan_range::<DefaultKernel>(
            image,
            plan,
            roi,
            cfg.min_var,
            cfg.per_level_topk,
        ));
    }
    if all_peaks.is_empty() {
        return all_peaks;
    }

    let mut kept = nms_2d(&mut all_peaks, cfg.nms_radius);
    kept.truncate(cfg.beam_width);
    kept
}
