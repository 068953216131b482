//! Row-parallel scans over a search region.
//!
//! Rows of placements are scored independently and merged through a
//! deterministic Top-K, so the result matches the sequential scan exactly.

use crate::candidate::topk::{Peak, TopK};
use crate::kernel::Kernel;
use crate::template::TemplatePlan;
use crate::ImageView;
use rayon::prelude::*;

/// Inclusive range of top-left placements to score.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanRange {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl ScanRange {
    /// Every placement of `plan` inside `image`, or `None` if it does not fit.
    pub fn full(image: ImageView<'_, u8>, plan: &TemplatePlan) -> Option<Self> {
        if image.width() < plan.width() || image.height() < plan.height() {
            return None;
        }
        Some(Self {
            x0: 0,
            y0: 0,
            x1: image.width() - plan.width(),
            y1: image.height() - plan.height(),
        })
    }
}

/// Sequential scan collecting the best `topk` placements.
pub fn scan_range<K: Kernel>(
    image: ImageView<'_, u8>,
    plan: &TemplatePlan,
    range: ScanRange,
    min_var: f64,
    topk: usize,
) -> Vec<Peak> {
    let mut best = TopK::new(topk);
    for y in range.y0..=range.y1 {
        scan_row::<K>(image, plan, range, y, min_var, &mut best);
    }
    best.into_sorted_desc()
}

/// Row-parallel scan collecting the best `topk` placements.
pub fn scan_range_par<K: Kernel>(
    image: ImageView<'_, u8>,
    plan: &TemplatePlan,
    range: ScanRange,
    min_var: f64,
    topk: usize,
) -> Vec<Peak> {
    (range.y0..=range.y1)
        .into_par_iter()
        .fold(
            || TopK::new(topk),
            |mut best, y| {
                scan_row::<K>(image, plan, range, y, min_var, &mut best);
                best
            },
        )
        .reduce(
            || TopK::new(topk),
            |mut a, b| {
                a.extend(b);
                a
            },
        )
        .into_sorted_desc()
}

fn scan_row<K: Kernel>(
    image: ImageView<'_, u8>,
    plan: &TemplatePlan,
    range: ScanRange,
    y: usize,
    min_var: f64,
    best: &mut TopK,
) {
    for x in range.x0..=range.x1 {
        let score = K::score_at(image, plan, x, y, min_var);
        if score.is_finite() {
            best.push(Peak { x, y, score });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{scan_range, scan_range_par, ScanRange};
    use crate::kernel::scalar::ZnccScalar;
    use crate::template::TemplatePlan;
    use crate::ImageView;

    #[test]
    fn parallel_scan_equals_sequential_scan() {
        let image: Vec<u8> = (0..48 * 40).map(|i| ((i * 7919) % 253) as u8).collect();
        let view = ImageView::from_slice(&image, 48, 40).unwrap();
        let tpl: Vec<u8> = (0..25).map(|i| ((i * 53) % 211) as u8).collect();
        let plan = TemplatePlan::from_view(ImageView::from_slice(&tpl, 5, 5).unwrap()).unwrap();
        let range = ScanRange::full(view, &plan).unwrap();

        let seq = scan_range::<ZnccScalar>(view, &plan, range, 1e-8, 5);
        let par = scan_range_par::<ZnccScalar>(view, &plan, range, 1e-8, 5);
        assert_eq!(seq, par);
        assert_eq!(seq.len(), 5);
    }
}
