//! Resampling rasters through affine maps.

use crate::image::Raster;
use crate::refine::spline::{to_u8, InterpolationOrder, SplineImage};
use crate::trace::trace_span;
use crate::transform::AffineTransform;
use crate::util::AerofidResult;
use rayon::prelude::*;

/// Resamples `raster` into a raster of the same shape.
///
/// `output_to_source` maps each output pixel center to the source position
/// it is pulled from. Samples that land outside the source are zero.
pub fn warp_affine(
    raster: &Raster,
    output_to_source: &AffineTransform,
    order: InterpolationOrder,
) -> AerofidResult<Raster> {
    let _span = trace_span!("warp_affine", width = raster.width(), height = raster.height()).entered();

    let width = raster.width();
    let spline = SplineImage::new(raster, order);
    let m = output_to_source.matrix();
    let mut data = vec![0u8; width * raster.height()];
    data.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        let yf = y as f64;
        let (bx, by) = (m[(0, 1)] * yf + m[(0, 2)], m[(1, 1)] * yf + m[(1, 2)]);
        for (x, out) in row.iter_mut().enumerate() {
            let xf = x as f64;
            let sx = m[(0, 0)] * xf + bx;
            let sy = m[(1, 0)] * xf + by;
            *out = spline.sample(sx, sy).map_or(0, to_u8);
        }
    });
    Raster::new(raster.id(), data, width, raster.height())
}
