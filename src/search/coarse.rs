//! Coarse search at the top of the pyramid.
//!
//! Coarse search scores the full translation range at the coarsest level,
//! then prunes candidates with non-maximum suppression and keeps a beam.

use crate::bank::CompiledTemplate;
use crate::candidate::nms::nms_2d;
use crate::candidate::topk::Peak;
use crate::image::pyramid::ImagePyramid;
use crate::kernel::rayon::{scan_range, scan_range_par, ScanRange};
use crate::kernel::DefaultKernel;
use crate::search::MatchConfig;
use crate::trace::{trace_event, trace_span};

pub(crate) fn coarse_search_level(
    pyramid: &ImagePyramid,
    tpl: &CompiledTemplate,
    level: usize,
    cfg: &MatchConfig,
) -> Vec<Peak> {
    let _span = trace_span!("coarse_search", level = level).entered();

    let (image, plan) = match (pyramid.level(level), tpl.plan(level)) {
        (Some(image), Some(plan)) => (image, plan),
        _ => return Vec::new(),
    };
    let range = match ScanRange::full(image, plan) {
        Some(range) => range,
        None => return Vec::new(),
    };

    let mut peaks = if cfg.parallel {
        scan_range_par::<DefaultKernel>(image, plan, range, cfg.min_var, cfg.per_level_topk)
    } else {
        scan_range::<DefaultKernel>(image, plan, range, cfg.min_var, cfg.per_level_topk)
    };
    if peaks.is_empty() {
        return peaks;
    }

    let mut kept = nms_2d(&mut peaks, cfg.nms_radius);
    kept.truncate(cfg.beam_width);

    trace_event!("coarse_candidates", count = kept.len());
    kept
}
