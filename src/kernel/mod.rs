//! Correlation kernel implementations.

use crate::template::TemplatePlan;
use crate::ImageView;

pub mod rayon;
pub mod scalar;
#[cfg(feature = "simd")]
pub mod simd;

/// Kernel trait for scoring a template placement.
pub trait Kernel {
    /// Computes the ZNCC score at a single placement (top-left coordinates).
    ///
    /// Returns `f64::NEG_INFINITY` when the placement does not fit or when
    /// the image window variance is at or below `min_var`.
    fn score_at(image: ImageView<'_, u8>, plan: &TemplatePlan, x: usize, y: usize, min_var: f64) -> f64;
}

/// Kernel used by the matcher: SIMD when the `simd` feature is on.
#[cfg(not(feature = "simd"))]
pub type DefaultKernel = scalar::ZnccScalar;
#[cfg(feature = "simd")]
pub type DefaultKernel = simd::ZnccSimd;

/// Converts accumulated sums into a ZNCC score.
#[inline]
pub(crate) fn finish_score(dot: f64, sum_i: f64, sum_i2: f64, n: f64, var_t: f64, min_var: f64) -> f64 {
    let var_i = sum_i2 - (sum_i * sum_i) / n;
    if var_i <= min_var {
        return f64::NEG_INFINITY;
    }
    let score = dot / (var_t * var_i).sqrt();
    if score.is_finite() {
        score.clamp(-1.0, 1.0)
    } else {
        f64::NEG_INFINITY
    }
}

/// Returns true when a template placed at `(x, y)` fits inside `image`.
#[inline]
pub(crate) fn placement_fits(image: ImageView<'_, u8>, plan: &TemplatePlan, x: usize, y: usize) -> bool {
    image.width() >= plan.width()
        && image.height() >= plan.height()
        && x <= image.width() - plan.width()
        && y <= image.height() - plan.height()
}
