//! Owned 8-bit rasters with a source identity.

use crate::image::ImageView;
use crate::util::{AerofidError, AerofidResult};

/// Owned contiguous grayscale raster.
///
/// The `id` is the raster's source identity (a file path or logical name) and
/// is what batch tables are keyed and sorted by. Rasters are never mutated in
/// place; operations return new rasters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    id: String,
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl Raster {
    /// Wraps a row-major buffer of exactly `width * height` samples.
    pub fn new(
        id: impl Into<String>,
        data: Vec<u8>,
        width: usize,
        height: usize,
    ) -> AerofidResult<Self> {
        if width == 0 || height == 0 {
            return Err(AerofidError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(AerofidError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(AerofidError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(AerofidError::InvalidDimensions { width, height });
        }
        Ok(Self {
            id: id.into(),
            data,
            width,
            height,
        })
    }

    /// Creates a raster with every sample set to `value`.
    pub fn filled(
        id: impl Into<String>,
        width: usize,
        height: usize,
        value: u8,
    ) -> AerofidResult<Self> {
        let len = width
            .checked_mul(height)
            .ok_or(AerofidError::InvalidDimensions { width, height })?;
        Self::new(id, vec![value; len], width, height)
    }

    /// Creates a raster by evaluating `f(x, y)` for every pixel.
    pub fn from_fn<F>(id: impl Into<String>, width: usize, height: usize, mut f: F) -> AerofidResult<Self>
    where
        F: FnMut(usize, usize) -> u8,
    {
        let len = width
            .checked_mul(height)
            .ok_or(AerofidError::InvalidDimensions { width, height })?;
        let mut data = Vec::with_capacity(len);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self::new(id, data, width, height)
    }

    /// Copies a (possibly strided) view into a contiguous raster.
    pub fn from_view(id: impl Into<String>, view: ImageView<'_, u8>) -> AerofidResult<Self> {
        let width = view.width();
        let height = view.height();
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            let row = view.row(y).ok_or(AerofidError::BufferTooSmall {
                needed: (y + 1) * view.stride(),
                got: view.as_slice().len(),
            })?;
            data.extend_from_slice(row);
        }
        Self::new(id, data, width, height)
    }

    /// Returns the source identity.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the raster under a different identity.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the row-major sample buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the raster and returns its sample buffer.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Returns a borrowed view of the whole raster.
    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }
}
