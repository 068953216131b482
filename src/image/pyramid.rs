//! Image pyramids for coarse-to-fine window search.
//!
//! Downsampling uses a 2x2 box filter with integer rounding:
//! `dst = ((a + b + c + d) + 2) / 4`. Odd trailing rows and columns are
//! dropped, so level `k` covers `floor(size / 2^k)` pixels.

use crate::image::{ImageView, Raster};
use crate::util::{AerofidError, AerofidResult};

/// Owned image pyramid built from a base level.
pub struct ImagePyramid {
    levels: Vec<Raster>,
}

impl ImagePyramid {
    /// Builds a pyramid from a base grayscale view.
    ///
    /// `max_levels` is clamped to at least 1 so the base level is always
    /// present. Construction stops early once a level would drop below
    /// `min_side` pixels in either dimension.
    pub fn build(base: ImageView<'_, u8>, max_levels: usize, min_side: usize) -> AerofidResult<Self> {
        let max_levels = max_levels.max(1);
        let mut levels = vec![Raster::from_view("level0", base)?];

        while levels.len() < max_levels {
            let src = match levels.last() {
                Some(prev) => prev.view(),
                None => break,
            };
            let dst_width = src.width() / 2;
            let dst_height = src.height() / 2;
            if dst_width < min_side.max(1) || dst_height < min_side.max(1) {
                break;
            }
            levels.push(downsample_box2(src, dst_width, dst_height, levels.len())?);
        }

        Ok(Self { levels })
    }

    /// Returns the number of levels (level 0 is the base resolution).
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Returns true when the pyramid has no levels.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Returns a view for a specific pyramid level.
    pub fn level(&self, index: usize) -> Option<ImageView<'_, u8>> {
        self.levels.get(index).map(Raster::view)
    }
}

fn downsample_box2(
    src: ImageView<'_, u8>,
    dst_width: usize,
    dst_height: usize,
    level: usize,
) -> AerofidResult<Raster> {
    let mut dst = Vec::with_capacity(dst_width * dst_height);
    for y in 0..dst_height {
        let (row0, row1) = src
            .row(y * 2)
            .zip(src.row(y * 2 + 1))
            .ok_or(AerofidError::BufferTooSmall {
                needed: (y * 2 + 2) * src.stride(),
                got: src.as_slice().len(),
            })?;
        for x in 0..dst_width {
            let sum = u16::from(row0[2 * x])
                + u16::from(row0[2 * x + 1])
                + u16::from(row1[2 * x])
                + u16::from(row1[2 * x + 1]);
            dst.push(((sum + 2) / 4) as u8);
        }
    }
    Raster::new(format!("level{level}"), dst, dst_width, dst_height)
}
