//! Window search and subpixel refinement for one raster.

use crate::bank::{CompileConfig, CompiledTemplate};
use crate::fiducial::{FiducialSet, Marker};
use crate::geometry::{FiducialLayout, Point};
use crate::image::{ops, Raster};
use crate::refine::{refine_marker, SubpixelConfig};
use crate::search::{check_fits, match_template, MatchConfig};
use crate::template::Template;
use crate::trace::{trace_span, trace_warn};
use crate::util::{AerofidError, AerofidResult};

/// Configuration for detecting one fiducial layout.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectConfig {
    pub matching: MatchConfig,
    pub subpixel: SubpixelConfig,
}

impl DetectConfig {
    pub fn validate(&self) -> AerofidResult<()> {
        self.matching.validate()?;
        self.subpixel.validate()
    }
}

/// Compiled templates for one layout.
///
/// The coarse template is searched in every window; the optional
/// high-resolution template, zoomed by the subpixel factor, refines each hit.
#[derive(Clone, Debug)]
pub struct FiducialTemplates {
    pub layout: FiducialLayout,
    pub coarse: CompiledTemplate,
    pub high_res: Option<CompiledTemplate>,
}

impl FiducialTemplates {
    /// Compiles the templates used by [`detect_fiducials`].
    pub fn compile(
        layout: FiducialLayout,
        coarse: &Template,
        high_res: Option<&Template>,
        cfg: &DetectConfig,
    ) -> AerofidResult<Self> {
        cfg.validate()?;
        let compile_cfg = CompileConfig {
            max_levels: cfg.matching.pyramid_levels,
            ..CompileConfig::default()
        };
        let coarse = CompiledTemplate::compile(coarse, &compile_cfg)?;
        let high_res = high_res.map(CompiledTemplate::single_level).transpose()?;
        if let Some(hr) = &high_res {
            cfg.subpixel.check_template(hr)?;
        }
        Ok(Self {
            layout,
            coarse,
            high_res,
        })
    }

    /// Checks that the coarse template fits every window of a raster with
    /// the given size.
    pub fn check_raster_size(&self, height: usize, width: usize) -> AerofidResult<()> {
        for window in self.layout.windows(height, width)? {
            if self.coarse.width() > window.width() || self.coarse.height() > window.height() {
                return Err(AerofidError::TemplateTooLarge {
                    tpl_width: self.coarse.width(),
                    tpl_height: self.coarse.height(),
                    region_width: window.width(),
                    region_height: window.height(),
                });
            }
        }
        Ok(())
    }
}

/// Detects the four markers of `templates.layout` in `raster`.
///
/// Each marker is matched in its own window. A window without a scorable
/// placement, a refinement crop outside the raster or a failed
/// high-resolution match leave that marker undefined.
pub fn detect_fiducials(
    raster: &Raster,
    templates: &FiducialTemplates,
    cfg: &DetectConfig,
) -> AerofidResult<FiducialSet> {
    let _span = trace_span!("detect_fiducials", id = raster.id(), layout = ?templates.layout).entered();

    let windows = templates.layout.windows(raster.height(), raster.width())?;
    let slots = templates.layout.slots();
    let half_h = (templates.coarse.height() as f64 - 1.0) / 2.0;
    let half_w = (templates.coarse.width() as f64 - 1.0) / 2.0;

    let mut markers = [Marker::missing(); 4];
    for (index, window) in windows.iter().enumerate() {
        let region = ops::window_view(raster.view(), window)?;
        check_fits(region, &templates.coarse)?;
        let hit = match match_template(region, &templates.coarse, &cfg.matching)? {
            Some(hit) => hit,
            None => {
                trace_warn!("no scorable placement", slot = slots[index].label());
                continue;
            }
        };
        let coarse = Point::new(
            (window.top + hit.row) as f64 + half_h,
            (window.left + hit.col) as f64 + half_w,
        );

        markers[index] = match &templates.high_res {
            None => Marker::new(coarse, hit.score),
            Some(hr) => match refine_marker(raster, coarse, hr, &cfg.subpixel) {
                Ok(Some(refined)) => Marker::new(refined.point, refined.score),
                Ok(None) => {
                    trace_warn!("high-resolution match failed", slot = slots[index].label());
                    Marker::missing()
                }
                Err(AerofidError::CropOutOfBounds { .. }) => {
                    trace_warn!("refinement crop outside raster", slot = slots[index].label());
                    Marker::missing()
                }
                Err(err) => return Err(err),
            },
        };
    }

    Ok(FiducialSet::new(raster.id(), templates.layout, markers))
}
