//! SIMD-accelerated kernel using the `wide` crate.
//!
//! The inner template pixel loop is vectorized to process 4 pixels at a time
//! using `f64x4`, with a scalar tail for widths that are not a multiple of 4.

use crate::kernel::{finish_score, placement_fits, Kernel};
use crate::template::TemplatePlan;
use crate::ImageView;
use wide::f64x4;

const LANES: usize = 4;

#[inline]
fn load_u8x4(slice: &[u8]) -> f64x4 {
    f64x4::from([
        f64::from(slice[0]),
        f64::from(slice[1]),
        f64::from(slice[2]),
        f64::from(slice[3]),
    ])
}

#[inline]
fn load_f64x4(slice: &[f64]) -> f64x4 {
    f64x4::from([slice[0], slice[1], slice[2], slice[3]])
}

#[inline]
fn hsum(v: f64x4) -> f64 {
    let arr = v.to_array();
    arr[0] + arr[1] + arr[2] + arr[3]
}

/// SIMD-accelerated ZNCC kernel.
pub struct ZnccSimd;

impl Kernel for ZnccSimd {
    fn score_at(image: ImageView<'_, u8>, plan: &TemplatePlan, x: usize, y: usize, min_var: f64) -> f64 {
        if !placement_fits(image, plan, x, y) {
            return f64::NEG_INFINITY;
        }

        let tpl_width = plan.width();
        let t_prime = plan.t_prime();
        let simd_end = tpl_width / LANES * LANES;

        let mut dot_vec = f64x4::ZERO;
        let mut sum_i_vec = f64x4::ZERO;
        let mut sum_i2_vec = f64x4::ZERO;
        let mut dot_s = 0.0f64;
        let mut sum_i_s = 0.0f64;
        let mut sum_i2_s = 0.0f64;

        for ty in 0..plan.height() {
            let img_row = match image.row(y + ty) {
                Some(row) => &row[x..x + tpl_width],
                None => return f64::NEG_INFINITY,
            };
            let tpl_row = &t_prime[ty * tpl_width..(ty + 1) * tpl_width];

            let mut tx = 0;
            while tx < simd_end {
                let img_vals = load_u8x4(&img_row[tx..]);
                let tpl_vals = load_f64x4(&tpl_row[tx..]);
                dot_vec += tpl_vals * img_vals;
                sum_i_vec += img_vals;
                sum_i2_vec += img_vals * img_vals;
                tx += LANES;
            }
            while tx < tpl_width {
                let value = f64::from(img_row[tx]);
                dot_s += tpl_row[tx] * value;
                sum_i_s += value;
                sum_i2_s += value * value;
                tx += 1;
            }
        }

        let n = (tpl_width * plan.height()) as f64;
        finish_score(
            hsum(dot_vec) + dot_s,
            hsum(sum_i_vec) + sum_i_s,
            hsum(sum_i2_vec) + sum_i2_s,
            n,
            plan.var_t(),
            min_var,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::ZnccSimd;
    use crate::kernel::scalar::ZnccScalar;
    use crate::kernel::Kernel;
    use crate::template::TemplatePlan;
    use crate::ImageView;

    #[test]
    fn simd_matches_scalar_including_tail() {
        let image: Vec<u8> = (0..400).map(|i| ((i * 31) ^ (i / 7)) as u8).collect();
        let view = ImageView::from_slice(&image, 20, 20).unwrap();
        let tpl: Vec<u8> = (0..42).map(|i| ((i * 13) % 97) as u8).collect();
        let plan = TemplatePlan::from_view(ImageView::from_slice(&tpl, 7, 6).unwrap()).unwrap();
        for y in 0..=14 {
            for x in 0..=13 {
                let a = ZnccScalar::score_at(view, &plan, x, y, 1e-8);
                let b = ZnccSimd::score_at(view, &plan, x, y, 1e-8);
                assert!((a - b).abs() < 1e-9, "({x}, {y}): {a} vs {b}");
            }
        }
    }
}
