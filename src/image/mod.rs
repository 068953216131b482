//! Raster storage, borrowed views and pixel operations.
//!
//! `ImageView` is a borrowed 2D view into a 1D buffer with an explicit stride.
//! The stride counts elements between the starts of consecutive rows, so a
//! stride larger than the width represents padded rows. ROI slices are
//! zero-copy views into the same backing slice and retain the original stride.
//! `Raster` is the owned, immutable counterpart carrying a source identity.

use crate::util::{AerofidError, AerofidResult};

#[cfg(feature = "image-io")]
pub mod io;
pub mod ops;
pub mod pyramid;
mod raster;

pub use raster::Raster;

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> AerofidResult<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> AerofidResult<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(AerofidError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y.checked_mul(self.stride)?.checked_add(x)?)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        self.data.get(start..start.checked_add(self.width)?)
    }

    /// Returns a zero-copy ROI view into the same backing buffer.
    pub fn roi(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> AerofidResult<ImageView<'a, T>> {
        if width == 0 || height == 0 {
            return Err(AerofidError::InvalidDimensions { width, height });
        }
        let out_of_bounds = AerofidError::RoiOutOfBounds {
            x,
            y,
            width,
            height,
            img_width: self.width,
            img_height: self.height,
        };
        let fits = x
            .checked_add(width)
            .zip(y.checked_add(height))
            .is_some_and(|(end_x, end_y)| end_x <= self.width && end_y <= self.height);
        if !fits {
            return Err(out_of_bounds);
        }

        let start = y * self.stride + x;
        let data = self.data.get(start..).ok_or(AerofidError::BufferTooSmall {
            needed: start.saturating_add(1),
            got: self.data.len(),
        })?;
        ImageView::new(data, width, height, self.stride)
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> AerofidResult<usize> {
    if width == 0 || height == 0 {
        return Err(AerofidError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(AerofidError::InvalidStride { width, stride });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(AerofidError::InvalidDimensions { width, height })
}

#[cfg(test)]
mod tests {
    use super::ImageView;
    use crate::util::AerofidError;

    #[test]
    fn roi_is_zero_copy_with_parent_stride() {
        let data: Vec<u8> = (0u8..16).collect();
        let view = ImageView::from_slice(&data, 4, 4).unwrap();
        let roi = view.roi(1, 1, 2, 2).unwrap();
        assert_eq!(roi.stride(), 4);
        assert_eq!(roi.row(0).unwrap(), &[5u8, 6u8]);
        assert_eq!(roi.row(1).unwrap(), &[9u8, 10u8]);
        assert!(roi.get(2, 0).is_none());
    }

    #[test]
    fn roi_rejects_overhang() {
        let data = [0u8; 16];
        let view = ImageView::from_slice(&data, 4, 4).unwrap();
        assert_eq!(
            view.roi(3, 3, 2, 2).err(),
            Some(AerofidError::RoiOutOfBounds {
                x: 3,
                y: 3,
                width: 2,
                height: 2,
                img_width: 4,
                img_height: 4,
            })
        );
    }

    #[test]
    fn view_rejects_bad_layouts() {
        let data = [0u8; 3];
        assert_eq!(
            ImageView::new(&data, 2, 2, 2).err(),
            Some(AerofidError::BufferTooSmall { needed: 4, got: 3 })
        );
        assert_eq!(
            ImageView::new(&data, 4, 1, 3).err(),
            Some(AerofidError::InvalidStride {
                width: 4,
                stride: 3,
            })
        );
    }
}
