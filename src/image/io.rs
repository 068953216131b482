//! Convenience helpers for reading and writing rasters via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::Raster;
use crate::template::Template;
use crate::util::{AerofidError, AerofidResult};
use std::path::Path;

/// Creates a raster from a grayscale image buffer.
pub fn raster_from_gray_image(id: impl Into<String>, img: &image::GrayImage) -> AerofidResult<Raster> {
    Raster::new(
        id,
        img.as_raw().clone(),
        img.width() as usize,
        img.height() as usize,
    )
}

/// Loads an image from disk as an 8-bit grayscale raster identified by its path.
pub fn load_gray_raster<P: AsRef<Path>>(path: P) -> AerofidResult<Raster> {
    let path = path.as_ref();
    let img = image::open(path).map_err(|err| AerofidError::ImageIo {
        reason: format!("{}: {err}", path.display()),
    })?;
    raster_from_gray_image(path.display().to_string(), &img.to_luma8())
}

/// Writes a raster to disk; the format follows the file extension.
pub fn save_gray_raster<P: AsRef<Path>>(raster: &Raster, path: P) -> AerofidResult<()> {
    let path = path.as_ref();
    let img = image::GrayImage::from_raw(
        raster.width() as u32,
        raster.height() as u32,
        raster.data().to_vec(),
    )
    .ok_or(AerofidError::InvalidDimensions {
        width: raster.width(),
        height: raster.height(),
    })?;
    img.save(path).map_err(|err| AerofidError::ImageIo {
        reason: format!("{}: {err}", path.display()),
    })
}

/// Loads a template patch; any failure is a configuration error.
pub fn load_template<P: AsRef<Path>>(path: P) -> AerofidResult<Template> {
    let path = path.as_ref();
    let missing = |reason: String| AerofidError::MissingTemplate {
        path: path.display().to_string(),
        reason,
    };
    if !path.is_file() {
        return Err(missing("not a file".to_string()));
    }
    let raster = load_gray_raster(path).map_err(|err| missing(err.to_string()))?;
    Ok(Template::from_raster(raster))
}
