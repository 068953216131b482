//! Crop, upsample and re-match around a coarse marker center.

use crate::bank::CompiledTemplate;
use crate::geometry::Point;
use crate::image::Raster;
use crate::kernel::rayon::{scan_range, ScanRange};
use crate::kernel::DefaultKernel;
use crate::refine::spline::{upsample, InterpolationOrder};
use crate::search::{check_fits, refine::roi_bounds};
use crate::trace::trace_span;
use crate::util::{AerofidError, AerofidResult};

/// Configuration for subpixel refinement.
#[derive(Clone, Debug, PartialEq)]
pub struct SubpixelConfig {
    /// Side of the square cropped around the coarse center, in pixels.
    pub distance_from_loc: usize,
    /// Integer upsampling factor.
    pub factor: usize,
    /// Spline order used for upsampling.
    pub order: InterpolationOrder,
    /// Optional search radius around the coarse center in source pixels.
    /// `None` (the default) scans the whole upsampled crop.
    pub search_radius: Option<usize>,
    /// Windows with variance at or below this value are not scored.
    pub min_var: f64,
}

impl Default for SubpixelConfig {
    fn default() -> Self {
        Self {
            distance_from_loc: 200,
            factor: 8,
            order: InterpolationOrder::Cubic,
            search_radius: None,
            min_var: 1e-8,
        }
    }
}

impl SubpixelConfig {
    /// Checks field ranges.
    pub fn validate(&self) -> AerofidResult<()> {
        if self.distance_from_loc < 2 {
            return Err(AerofidError::InvalidConfig {
                field: "distance_from_loc",
                reason: "must be at least 2",
            });
        }
        if self.factor == 0 {
            return Err(AerofidError::InvalidConfig {
                field: "factor",
                reason: "must be at least 1",
            });
        }
        if !self.min_var.is_finite() || self.min_var < 0.0 {
            return Err(AerofidError::InvalidConfig {
                field: "min_var",
                reason: "must be finite and non-negative",
            });
        }
        Ok(())
    }

    /// Side of the upsampled crop.
    pub fn upsampled_side(&self) -> usize {
        self.distance_from_loc * self.factor
    }

    /// Checks that a high-resolution template fits inside the upsampled crop.
    pub fn check_template(&self, tpl: &CompiledTemplate) -> AerofidResult<()> {
        let side = self.upsampled_side();
        if tpl.width() > side || tpl.height() > side {
            return Err(AerofidError::TemplateTooLarge {
                tpl_width: tpl.width(),
                tpl_height: tpl.height(),
                region_width: side,
                region_height: side,
            });
        }
        Ok(())
    }
}

/// Refined marker center with its high-resolution match score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Refined {
    pub point: Point,
    pub score: f64,
}

/// Refines a coarse marker center to subpixel precision.
///
/// Returns `Err(CropOutOfBounds)` when the crop does not fit inside the
/// raster and `Ok(None)` when no high-resolution placement can be scored.
pub fn refine_marker(
    raster: &Raster,
    coarse: Point,
    hr_template: &CompiledTemplate,
    cfg: &SubpixelConfig,
) -> AerofidResult<Option<Refined>> {
    cfg.validate()?;
    if !coarse.is_finite() {
        return Err(AerofidError::InvalidInput("coarse center is not finite"));
    }
    let _span = trace_span!("refine_marker", y = coarse.y, x = coarse.x).entered();

    let side = cfg.distance_from_loc;
    let top = coarse.y.round() as isize - (side / 2) as isize;
    let left = coarse.x.round() as isize - (side / 2) as isize;
    let fits = top >= 0
        && left >= 0
        && top as usize + side <= raster.height()
        && left as usize + side <= raster.width();
    if !fits {
        return Err(AerofidError::CropOutOfBounds {
            row: top,
            col: left,
            side,
            img_width: raster.width(),
            img_height: raster.height(),
        });
    }
    let (top, left) = (top as usize, left as usize);

    let crop = Raster::from_view(raster.id(), raster.view().roi(left, top, side, side)?)?;
    let zoomed = upsample(&crop, cfg.factor, cfg.order)?;
    let view = zoomed.view();
    check_fits(view, hr_template)?;
    let plan = match hr_template.plan(0) {
        Some(plan) => plan,
        None => return Ok(None),
    };
    let full = match ScanRange::full(view, plan) {
        Some(range) => range,
        None => return Ok(None),
    };

    let factor = cfg.factor as f64;
    let half_h = (plan.height() as f64 - 1.0) / 2.0;
    let half_w = (plan.width() as f64 - 1.0) / 2.0;
    let range = match cfg.search_radius {
        None => Some(full),
        Some(radius) => {
            let expect_row = (coarse.y - top as f64 + 0.5) * factor - 0.5 - half_h;
            let expect_col = (coarse.x - left as f64 + 0.5) * factor - 0.5 - half_w;
            roi_bounds(
                expect_col.round().max(0.0) as usize,
                expect_row.round().max(0.0) as usize,
                radius * cfg.factor,
                full.x1,
                full.y1,
            )
        }
    };
    let range = match range {
        Some(range) => range,
        None => return Ok(None),
    };

    let best = scan_range::<DefaultKernel>(view, plan, range, cfg.min_var, 1);
    Ok(best.first().map(|peak| Refined {
        point: Point::new(
            top as f64 + (peak.y as f64 + half_h + 0.5) / factor - 0.5,
            left as f64 + (peak.x as f64 + half_w + 0.5) / factor - 0.5,
        ),
        score: peak.score,
    }))
}
