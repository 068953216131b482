//! Subpixel refinement of coarse marker detections.
//!
//! The refiner crops a square around a coarse detection, upsamples it with a
//! B-spline and re-matches a high-resolution template inside the crop.

pub mod spline;
pub mod subpixel;

pub use spline::{upsample, InterpolationOrder, SplineImage};
pub use subpixel::{refine_marker, Refined, SubpixelConfig};
