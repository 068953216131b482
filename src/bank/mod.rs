//! Precomputed template assets for coarse-to-fine search.
//!
//! Compiling a template once amortizes the cost of building its pyramid and
//! per-level ZNCC plans across every window and image of a batch.

use crate::image::pyramid::ImagePyramid;
use crate::template::{Template, TemplatePlan};
use crate::util::{AerofidError, AerofidResult};

/// Configuration for compiling template assets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileConfig {
    /// Maximum pyramid levels to build.
    pub max_levels: usize,
    /// Smallest template side kept at a coarser level.
    pub min_template_side: usize,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            max_levels: 4,
            min_template_side: 6,
        }
    }
}

/// Compiled template with one ZNCC plan per pyramid level.
///
/// Level 0 is always present. Coarser levels stop early when the
/// downsampled template becomes too small or loses all contrast.
#[derive(Clone, Debug)]
pub struct CompiledTemplate {
    plans: Vec<TemplatePlan>,
}

impl CompiledTemplate {
    /// Compiles template assets for matching.
    pub fn compile(tpl: &Template, cfg: &CompileConfig) -> AerofidResult<Self> {
        if cfg.max_levels == 0 {
            return Err(AerofidError::InvalidConfig {
                field: "max_levels",
                reason: "must be at least 1",
            });
        }
        let pyramid = ImagePyramid::build(tpl.view(), cfg.max_levels, cfg.min_template_side)?;
        let mut plans = Vec::with_capacity(pyramid.len());
        for level in 0..pyramid.len() {
            let view = match pyramid.level(level) {
                Some(view) => view,
                None => break,
            };
            match TemplatePlan::from_view(view) {
                Ok(plan) => plans.push(plan),
                Err(err) if level == 0 => return Err(err),
                Err(_) => break,
            }
        }
        Ok(Self { plans })
    }

    /// Compiles only the full-resolution plan.
    pub fn single_level(tpl: &Template) -> AerofidResult<Self> {
        Ok(Self {
            plans: vec![tpl.plan()?],
        })
    }

    /// Returns the number of compiled levels.
    pub fn num_levels(&self) -> usize {
        self.plans.len()
    }

    /// Returns the plan for a pyramid level.
    pub fn plan(&self, level: usize) -> Option<&TemplatePlan> {
        self.plans.get(level)
    }

    /// Full-resolution template width.
    pub fn width(&self) -> usize {
        self.plans[0].width()
    }

    /// Full-resolution template height.
    pub fn height(&self) -> usize {
        self.plans[0].height()
    }
}
