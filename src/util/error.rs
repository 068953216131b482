//! Error types for aerofid.

use thiserror::Error;

/// Result alias for aerofid operations.
pub type AerofidResult<T> = std::result::Result<T, AerofidError>;

/// Errors that can occur when running aerofid algorithms.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum AerofidError {
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Image dimensions are zero or overflow.
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is smaller than the view requires.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A region of interest does not fit inside the image.
    #[error("roi ({x}, {y}, {width}x{height}) out of bounds for {img_width}x{img_height} image")]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// The template does not fit inside the search region.
    #[error(
        "template {tpl_width}x{tpl_height} larger than search region {region_width}x{region_height}"
    )]
    TemplateTooLarge {
        tpl_width: usize,
        tpl_height: usize,
        region_width: usize,
        region_height: usize,
    },
    /// The template cannot be normalized.
    #[error("degenerate template: {reason}")]
    DegenerateTemplate { reason: &'static str },
    /// A configuration field holds an unusable value.
    #[error("invalid config `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },
    /// A template file could not be found or read.
    #[error("missing template `{path}`: {reason}")]
    MissingTemplate { path: String, reason: String },
    /// Raster decoding or encoding failed.
    #[error("image io: {reason}")]
    ImageIo { reason: String },
    /// A refinement crop around a marker leaves the raster.
    #[error("crop of side {side} around ({row}, {col}) leaves {img_width}x{img_height} raster")]
    CropOutOfBounds {
        row: isize,
        col: isize,
        side: usize,
        img_width: usize,
        img_height: usize,
    },
    /// Point correspondences do not determine an affine transform.
    #[error("degenerate correspondences: {count} usable pairs")]
    DegenerateCorrespondences { count: usize },
}
