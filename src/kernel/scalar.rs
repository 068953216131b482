//! Scalar reference kernel for score evaluation.

use crate::kernel::{finish_score, placement_fits, Kernel};
use crate::template::TemplatePlan;
use crate::ImageView;

/// Scalar ZNCC kernel.
pub struct ZnccScalar;

impl Kernel for ZnccScalar {
    fn score_at(image: ImageView<'_, u8>, plan: &TemplatePlan, x: usize, y: usize, min_var: f64) -> f64 {
        if !placement_fits(image, plan, x, y) {
            return f64::NEG_INFINITY;
        }

        let tpl_width = plan.width();
        let t_prime = plan.t_prime();
        let mut dot = 0.0f64;
        let mut sum_i = 0.0f64;
        let mut sum_i2 = 0.0f64;

        for ty in 0..plan.height() {
            let img_row = match image.row(y + ty) {
                Some(row) => &row[x..x + tpl_width],
                None => return f64::NEG_INFINITY,
            };
            let tpl_row = &t_prime[ty * tpl_width..(ty + 1) * tpl_width];
            for (&t, &v) in tpl_row.iter().zip(img_row) {
                let value = f64::from(v);
                dot += t * value;
                sum_i += value;
                sum_i2 += value * value;
            }
        }

        let n = (tpl_width * plan.height()) as f64;
        finish_score(dot, sum_i, sum_i2, n, plan.var_t(), min_var)
    }
}

#[cfg(test)]
mod tests {
    use super::ZnccScalar;
    use crate::kernel::Kernel;
    use crate::template::TemplatePlan;
    use crate::ImageView;

    #[test]
    fn scalar_score_matches_textbook_ncc() {
        let image: Vec<u8> = (0..30).map(|i| ((i * 37 + i * i) % 251) as u8).collect();
        let view = ImageView::from_slice(&image, 6, 5).unwrap();
        let tpl: Vec<u8> = vec![10, 40, 20, 90, 70, 30];
        let plan = TemplatePlan::from_view(ImageView::from_slice(&tpl, 3, 2).unwrap()).unwrap();

        let (x, y) = (2usize, 1usize);
        let mut win = Vec::new();
        for ty in 0..2 {
            for tx in 0..3 {
                win.push(f64::from(*view.get(x + tx, y + ty).unwrap()));
            }
        }
        let t: Vec<f64> = tpl.iter().map(|&v| f64::from(v)).collect();
        let mi = win.iter().sum::<f64>() / 6.0;
        let mt = t.iter().sum::<f64>() / 6.0;
        let num: f64 = win.iter().zip(&t).map(|(a, b)| (a - mi) * (b - mt)).sum();
        let da: f64 = win.iter().map(|a| (a - mi).powi(2)).sum();
        let db: f64 = t.iter().map(|b| (b - mt).powi(2)).sum();
        let expected = num / (da * db).sqrt();

        let score = ZnccScalar::score_at(view, &plan, x, y, 1e-8);
        assert!((score - expected).abs() < 1e-9, "{score} vs {expected}");
    }

    #[test]
    fn flat_windows_and_overhangs_score_negative_infinity() {
        let image = vec![50u8; 16];
        let view = ImageView::from_slice(&image, 4, 4).unwrap();
        let tpl = [0u8, 255, 255, 0];
        let plan = TemplatePlan::from_view(ImageView::from_slice(&tpl, 2, 2).unwrap()).unwrap();
        assert_eq!(ZnccScalar::score_at(view, &plan, 0, 0, 1e-8), f64::NEG_INFINITY);
        assert_eq!(ZnccScalar::score_at(view, &plan, 3, 0, 1e-8), f64::NEG_INFINITY);
    }
}
