//! Padding and cropping of rasters.

use crate::geometry::{Point, Window};
use crate::image::{ImageView, Raster};
use crate::util::{AerofidError, AerofidResult};

/// Returns a zero-copy view of `window` inside `view`.
pub fn window_view<'a>(view: ImageView<'a, u8>, window: &Window) -> AerofidResult<ImageView<'a, u8>> {
    view.roi(window.left, window.top, window.width(), window.height())
}

/// Pads a raster with `buffer` zero samples on every side.
pub fn pad(raster: &Raster, buffer: usize) -> AerofidResult<Raster> {
    let width = raster.width() + 2 * buffer;
    let height = raster.height() + 2 * buffer;
    let mut data = vec![0u8; width * height];
    for (y, row) in raster.data().chunks_exact(raster.width()).enumerate() {
        let start = (y + buffer) * width + buffer;
        data[start..start + raster.width()].copy_from_slice(row);
    }
    Raster::new(raster.id(), data, width, height)
}

/// Crops a `side x side` square centered on the rounded `center`.
///
/// Pixels that fall outside the source are zero, so the output always has the
/// requested size regardless of where the center lies.
pub fn crop_about_point(raster: &Raster, center: Point, side: usize) -> AerofidResult<Raster> {
    if side == 0 {
        return Err(AerofidError::InvalidDimensions {
            width: side,
            height: side,
        });
    }
    if !center.is_finite() {
        return Err(AerofidError::InvalidInput("crop center is not finite"));
    }
    let half = (side / 2) as i64;
    let top = center.y.round() as i64 - half;
    let left = center.x.round() as i64 - half;
    let src_w = raster.width() as i64;
    let src_h = raster.height() as i64;

    let mut data = vec![0u8; side * side];
    for (dy, out_row) in data.chunks_exact_mut(side).enumerate() {
        let sy = top + dy as i64;
        if sy < 0 || sy >= src_h {
            continue;
        }
        let x0 = left.max(0);
        let x1 = (left + side as i64).min(src_w);
        if x0 >= x1 {
            continue;
        }
        let src_row = &raster.data()[(sy * src_w) as usize..((sy + 1) * src_w) as usize];
        let dst_start = (x0 - left) as usize;
        out_row[dst_start..dst_start + (x1 - x0) as usize]
            .copy_from_slice(&src_row[x0 as usize..x1 as usize]);
    }
    Raster::new(raster.id(), data, side, side)
}
