//! Least-squares 2D affine transforms.

use crate::geometry::Point;
use crate::util::{AerofidError, AerofidResult};
use nalgebra::{DMatrix, Matrix2, Matrix3, Vector3};

/// Affine map `[x', y'] = A [x, y] + t` in raster coordinates.
///
/// Stored as a homogeneous 3x3 matrix acting on `(x, y, 1)` column vectors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AffineTransform {
    matrix: Matrix3<f64>,
}

impl AffineTransform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix3::identity(),
        }
    }

    /// Builds `x' = a x + b y + tx`, `y' = c x + d y + ty`.
    pub fn new(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
        Self {
            matrix: Matrix3::new(a, b, tx, c, d, ty, 0.0, 0.0, 1.0),
        }
    }

    /// Pure translation by `(dy, dx)`.
    pub fn translation_by(dy: f64, dx: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, dx, dy)
    }

    /// Fits the affine map sending each `src[i]` to `dst[i]` in the least
    /// squares sense.
    ///
    /// Needs at least three non-collinear correspondences.
    pub fn estimate(src: &[Point], dst: &[Point]) -> AerofidResult<Self> {
        if src.len() != dst.len() {
            return Err(AerofidError::InvalidInput("correspondence lists differ in length"));
        }
        let n = src.len();
        if n < 3 || src.iter().chain(dst).any(|p| !p.is_finite()) {
            return Err(AerofidError::DegenerateCorrespondences { count: n });
        }

        // Centering the sources keeps the design matrix well conditioned for
        // full-frame pixel coordinates.
        let mx = src.iter().map(|p| p.x).sum::<f64>() / n as f64;
        let my = src.iter().map(|p| p.y).sum::<f64>() / n as f64;
        let a = DMatrix::from_fn(n, 3, |r, c| match c {
            0 => src[r].x - mx,
            1 => src[r].y - my,
            _ => 1.0,
        });
        let b = DMatrix::from_fn(n, 2, |r, c| if c == 0 { dst[r].x } else { dst[r].y });

        let svd = a.svd(true, true);
        let s_max = svd.singular_values.max();
        if svd.rank(s_max * 1e-9) < 3 {
            return Err(AerofidError::DegenerateCorrespondences { count: n });
        }
        let sol = svd
            .solve(&b, s_max * 1e-12)
            .map_err(|_| AerofidError::DegenerateCorrespondences { count: n })?;

        let (ax, bx, cx) = (sol[(0, 0)], sol[(1, 0)], sol[(2, 0)]);
        let (ay, by, cy) = (sol[(0, 1)], sol[(1, 1)], sol[(2, 1)]);
        Ok(Self::new(
            ax,
            bx,
            ay,
            by,
            cx - ax * mx - bx * my,
            cy - ay * mx - by * my,
        ))
    }

    /// Maps a point.
    pub fn apply(&self, p: Point) -> Point {
        let v = self.matrix * Vector3::new(p.x, p.y, 1.0);
        Point::new(v.y, v.x)
    }

    /// Inverse map, or an error when the linear part is singular.
    pub fn inverse(&self) -> AerofidResult<Self> {
        let matrix = self
            .matrix
            .try_inverse()
            .ok_or(AerofidError::InvalidInput("affine transform is not invertible"))?;
        Ok(Self { matrix })
    }

    /// The 2x2 linear part acting on `(x, y)`.
    pub fn linear(&self) -> Matrix2<f64> {
        self.matrix.fixed_view::<2, 2>(0, 0).into_owned()
    }

    /// Translation as `(dy, dx)`.
    pub fn translation(&self) -> (f64, f64) {
        (self.matrix[(1, 2)], self.matrix[(0, 2)])
    }

    /// The homogeneous matrix.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    /// Parameters `[a, b, tx, c, d, ty]` in row-major order.
    pub fn params(&self) -> [f64; 6] {
        let m = &self.matrix;
        [m[(0, 0)], m[(0, 1)], m[(0, 2)], m[(1, 0)], m[(1, 1)], m[(1, 2)]]
    }
}
