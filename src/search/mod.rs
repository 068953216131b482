//! Template matching over search regions.
//!
//! `match_template` returns the best ZNCC placement of a compiled template
//! inside a region. With `pyramid_levels = 1` every placement is scored and
//! ties resolve to the first placement in row-major order. Larger values run
//! a coarse-to-fine beam search that trades exactness for speed on large
//! windows.

pub(crate) mod coarse;
pub(crate) mod refine;

use crate::bank::CompiledTemplate;
use crate::image::pyramid::ImagePyramid;
use crate::kernel::rayon::{scan_range, scan_range_par, ScanRange};
use crate::kernel::DefaultKernel;
use crate::trace::{trace_event, trace_span};
use crate::util::{AerofidError, AerofidResult};
use crate::ImageView;

/// Best template placement inside a region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Match {
    /// Row of the template's top-left corner.
    pub row: usize,
    /// Column of the template's top-left corner.
    pub col: usize,
    /// ZNCC score in [-1, 1].
    pub score: f64,
}

/// Configuration for template matching.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchConfig {
    /// Image windows with variance at or below this value are not scored.
    pub min_var: f64,
    /// Pyramid levels used for the search; 1 means exhaustive.
    pub pyramid_levels: usize,
    /// Candidates kept per level in pyramid mode.
    pub beam_width: usize,
    /// Peaks collected per scan before suppression.
    pub per_level_topk: usize,
    /// Chebyshev radius for non-maximum suppression.
    pub nms_radius: usize,
    /// Search radius around an upscaled candidate at finer levels.
    pub roi_radius: usize,
    /// Scan rows in parallel.
    pub parallel: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            min_var: 1e-8,
            pyramid_levels: 1,
            beam_width: 8,
            per_level_topk: 64,
            nms_radius: 4,
            roi_radius: 4,
            parallel: false,
        }
    }
}

impl MatchConfig {
    /// Checks field ranges.
    pub fn validate(&self) -> AerofidResult<()> {
        if !self.min_var.is_finite() || self.min_var < 0.0 {
            return Err(AerofidError::InvalidConfig {
                field: "min_var",
                reason: "must be finite and non-negative",
            });
        }
        if self.pyramid_levels == 0 {
            return Err(AerofidError::InvalidConfig {
                field: "pyramid_levels",
                reason: "must be at least 1",
            });
        }
        if self.pyramid_levels > 1 {
            if self.beam_width == 0 {
                return Err(AerofidError::InvalidConfig {
                    field: "beam_width",
                    reason: "must be at least 1",
                });
            }
            if self.per_level_topk < self.beam_width {
                return Err(AerofidError::InvalidConfig {
                    field: "per_level_topk",
                    reason: "must be at least beam_width",
                });
            }
            if self.roi_radius == 0 {
                return Err(AerofidError::InvalidConfig {
                    field: "roi_radius",
                    reason: "must be at least 1",
                });
            }
        }
        Ok(())
    }
}

/// Checks that the full-resolution template fits inside a region.
pub fn check_fits(region: ImageView<'_, u8>, tpl: &CompiledTemplate) -> AerofidResult<()> {
    if tpl.width() > region.width() || tpl.height() > region.height() {
        return Err(AerofidError::TemplateTooLarge {
            tpl_width: tpl.width(),
            tpl_height: tpl.height(),
            region_width: region.width(),
            region_height: region.height(),
        });
    }
    Ok(())
}

/// Finds the best placement of `tpl` inside `region`.
///
/// Returns `Err(TemplateTooLarge)` when the template does not fit and
/// `Ok(None)` when no placement has enough variance to be scored.
pub fn match_template(
    region: ImageView<'_, u8>,
    tpl: &CompiledTemplate,
    cfg: &MatchConfig,
) -> AerofidResult<Option<Match>> {
    cfg.validate()?;
    check_fits(region, tpl)?;

    let levels = cfg.pyramid_levels.min(tpl.num_levels());
    let _span = trace_span!(
        "match_template",
        width = region.width(),
        height = region.height(),
        levels = levels
    )
    .entered();

    if levels <= 1 {
        return Ok(match_exhaustive(region, tpl, cfg));
    }

    let pyramid = ImagePyramid::build(region, levels, 1)?;
    let mut top = 0;
    for level in 1..pyramid.len().min(levels) {
        let fits = match (pyramid.level(level), tpl.plan(level)) {
            (Some(img), Some(plan)) => img.width() >= plan.width() && img.height() >= plan.height(),
            _ => false,
        };
        if !fits {
            break;
        }
        top = level;
    }
    if top == 0 {
        return Ok(match_exhaustive(region, tpl, cfg));
    }

    let mut candidates = coarse::coarse_search_level(&pyramid, tpl, top, cfg);
    for level in (0..top).rev() {
        candidates = refine::refine_to_finer_level(&pyramid, tpl, level, &candidates, cfg);
        if candidates.is_empty() {
            break;
        }
    }

    let best = candidates.first().map(|c| Match {
        row: c.y,
        col: c.x,
        score: c.score,
    });
    trace_event!("match_result", found = best.is_some());
    Ok(best)
}

fn match_exhaustive(region: ImageView<'_, u8>, tpl: &CompiledTemplate, cfg: &MatchConfig) -> Option<Match> {
    let plan = tpl.plan(0)?;
    let range = ScanRange::full(region, plan)?;
    let peaks = if cfg.parallel {
        scan_range_par::<DefaultKernel>(region, plan, range, cfg.min_var, 1)
    } else {
        scan_range::<DefaultKernel>(region, plan, range, cfg.min_var, 1)
    };
    peaks.first().map(|p| Match {
        row: p.y,
        col: p.x,
        score: p.score,
    })
}
