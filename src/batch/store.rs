//! Raster sources and sinks used by the batch runner.

use crate::image::Raster;
use crate::util::AerofidResult;

/// Loads input rasters by identity and persists output rasters.
///
/// Implementations are shared across worker threads.
pub trait RasterStore: Sync {
    /// Loads the raster named by `id`. The returned raster carries `id`.
    fn load(&self, id: &str) -> AerofidResult<Raster>;

    /// Persists an output raster under the basename of its identity and
    /// returns where it was written.
    fn save(&self, raster: &Raster) -> AerofidResult<String>;
}

/// Final path component of an identity, or the identity itself.
#[cfg(any(feature = "image-io", test))]
pub(crate) fn basename(id: &str) -> &str {
    id.rsplit(['/', '\\']).find(|part| !part.is_empty()).unwrap_or(id)
}

#[cfg(feature = "image-io")]
pub use fs::FsRasterStore;

#[cfg(feature = "image-io")]
mod fs {
    use super::{basename, RasterStore};
    use crate::image::io::{load_gray_raster, save_gray_raster};
    use crate::image::Raster;
    use crate::util::{AerofidError, AerofidResult};
    use std::path::PathBuf;

    /// Reads rasters from paths and writes outputs into one directory.
    #[derive(Clone, Debug)]
    pub struct FsRasterStore {
        out_dir: PathBuf,
    }

    impl FsRasterStore {
        pub fn new(out_dir: impl Into<PathBuf>) -> Self {
            Self {
                out_dir: out_dir.into(),
            }
        }

        pub fn out_dir(&self) -> &std::path::Path {
            &self.out_dir
        }
    }

    impl RasterStore for FsRasterStore {
        fn load(&self, id: &str) -> AerofidResult<Raster> {
            Ok(load_gray_raster(id)?.with_id(id))
        }

        fn save(&self, raster: &Raster) -> AerofidResult<String> {
            std::fs::create_dir_all(&self.out_dir).map_err(|err| AerofidError::ImageIo {
                reason: format!("{}: {err}", self.out_dir.display()),
            })?;
            let path = self.out_dir.join(basename(raster.id()));
            save_gray_raster(raster, &path)?;
            Ok(path.display().to_string())
        }
    }

}

#[cfg(test)]
mod tests {
    use super::basename;

    #[test]
    fn basename_strips_directories() {
        assert_eq!(basename("a/b/frame.tif"), "frame.tif");
        assert_eq!(basename("C:\\scans\\frame.tif"), "frame.tif");
        assert_eq!(basename("frame.tif"), "frame.tif");
        assert_eq!(basename("dir/"), "dir");
    }
}
