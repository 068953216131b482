//! Affine restitution of scanned frames onto calibrated fiducial geometry.

mod affine;
mod canonical;
mod warp;

pub use affine::AffineTransform;
pub use canonical::CanonicalGeometry;
pub use warp::warp_affine;
