//! Template plan precomputation for ZNCC.

use crate::image::ImageView;
use crate::util::{AerofidError, AerofidResult};

/// Precomputed statistics and zero-mean buffer for template matching.
///
/// With `t' = t - mean(t)` and `var_t = sum(t'^2)`, the ZNCC score of an
/// image window `I` is `sum(t' * I) / sqrt(var_t * var_i)` where
/// `var_i = sum(I^2) - sum(I)^2 / n`. This equals OpenCV's
/// `TM_CCOEFF_NORMED`.
#[derive(Clone, Debug)]
pub struct TemplatePlan {
    width: usize,
    height: usize,
    mean: f64,
    var_t: f64,
    t_prime: Vec<f64>,
}

impl TemplatePlan {
    /// Builds a plan from a template view.
    pub fn from_view(tpl: ImageView<'_, u8>) -> AerofidResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let count = width
            .checked_mul(height)
            .ok_or(AerofidError::InvalidDimensions { width, height })?;

        let mut values = Vec::with_capacity(count);
        for y in 0..height {
            let row = tpl.row(y).ok_or(AerofidError::BufferTooSmall {
                needed: (y + 1) * tpl.stride(),
                got: tpl.as_slice().len(),
            })?;
            values.extend(row.iter().map(|&v| f64::from(v)));
        }

        let mean = values.iter().sum::<f64>() / count as f64;
        let t_prime: Vec<f64> = values.iter().map(|v| v - mean).collect();
        let var_t: f64 = t_prime.iter().map(|v| v * v).sum();
        if var_t / count as f64 <= 1e-8 {
            return Err(AerofidError::DegenerateTemplate {
                reason: "zero variance",
            });
        }

        Ok(Self {
            width,
            height,
            mean,
            var_t,
            t_prime,
        })
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the mean intensity of the template.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Returns the sum of squared deviations from the mean.
    pub fn var_t(&self) -> f64 {
        self.var_t
    }

    /// Returns the zero-mean template buffer in row-major order.
    pub fn t_prime(&self) -> &[f64] {
        &self.t_prime
    }
}

#[cfg(test)]
mod tests {
    use super::TemplatePlan;
    use crate::image::ImageView;
    use crate::util::AerofidError;

    #[test]
    fn plan_matches_known_stats() {
        let data = [0u8, 1, 2, 3];
        let plan = TemplatePlan::from_view(ImageView::from_slice(&data, 2, 2).unwrap()).unwrap();
        assert!((plan.mean() - 1.5).abs() < 1e-12);
        assert!((plan.var_t() - 5.0).abs() < 1e-12);
        assert_eq!(plan.t_prime(), &[-1.5, -0.5, 0.5, 1.5]);
    }

    #[test]
    fn plan_rejects_flat_templates() {
        let data = [5u8; 4];
        let err = TemplatePlan::from_view(ImageView::from_slice(&data, 2, 2).unwrap())
            .err()
            .unwrap();
        assert_eq!(
            err,
            AerofidError::DegenerateTemplate {
                reason: "zero variance",
            }
        );
    }
}
