//! Aerofid detects fiducial markers on scanned aerial film frames and
//! restitutes each frame into camera geometry.
//!
//! The pipeline matches marker templates with ZNCC inside one window per
//! marker, refines each hit on a B-spline upsampled crop, rejects detections
//! that score poorly against the rest of the batch, estimates the principal
//! point from opposed markers, fits a detected-to-canonical affine transform
//! and reports QC metrics before and after the transform.
//!
//! [`batch`] runs the whole pipeline over many rasters on a worker pool.
//! Reading and writing image files requires the `image-io` feature.

mod trace;

pub mod bank;
pub mod batch;
mod candidate;
pub mod fiducial;
pub mod geometry;
pub mod image;
pub mod kernel;
pub mod qc;
pub mod refine;
pub mod restitution;
pub mod search;
pub mod template;
pub mod transform;
pub mod util;

#[cfg(feature = "image-io")]
pub use image::io;

pub use bank::{CompileConfig, CompiledTemplate};
pub use batch::{
    run_detection, run_restitution, BatchConfig, DetectionRow, Detector, FiducialJob, ProxyJob,
    RasterStore, RestitutionReport, RestitutionRow,
};
pub use candidate::topk::Peak;
pub use fiducial::{
    Confidence, DetectConfig, FiducialSet, FiducialTemplates, FrameDetection, Marker, OutlierConfig,
    ProxyConfig,
};
pub use geometry::{FiducialLayout, MarkerSlot, Point, Window};
pub use image::pyramid::ImagePyramid;
pub use image::{ImageView, Raster};
pub use kernel::Kernel;
pub use qc::{QcRecord, QcTable};
pub use refine::{InterpolationOrder, SubpixelConfig};
pub use restitution::{restitute, Restitution, RestitutionConfig};
pub use search::{match_template, Match, MatchConfig};
pub use template::{Template, TemplatePlan};
pub use transform::{AffineTransform, CanonicalGeometry};
pub use util::{AerofidError, AerofidResult};
