//! B-spline interpolation of 8-bit rasters (orders 0 to 5).
//!
//! Coefficients are obtained with the recursive prefilter of Unser and
//! Thévenaz under mirror boundary conditions, so interpolation reproduces the
//! input samples exactly at integer positions. Positions are in pixel-center
//! coordinates: sample `(x, y)` lies at the center of pixel `(x, y)`.

use crate::image::Raster;
use crate::util::{AerofidError, AerofidResult};

/// Spline order used for resampling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InterpolationOrder {
    Nearest,
    Linear,
    Quadratic,
    #[default]
    Cubic,
    Quartic,
    Quintic,
}

impl InterpolationOrder {
    /// Maps an integer order in `0..=5` to a variant.
    pub fn from_order(order: u8) -> AerofidResult<Self> {
        Ok(match order {
            0 => Self::Nearest,
            1 => Self::Linear,
            2 => Self::Quadratic,
            3 => Self::Cubic,
            4 => Self::Quartic,
            5 => Self::Quintic,
            _ => {
                return Err(AerofidError::InvalidConfig {
                    field: "interpolation_order",
                    reason: "must be in 0..=5",
                })
            }
        })
    }

    /// Polynomial degree of the spline.
    pub fn order(self) -> usize {
        match self {
            Self::Nearest => 0,
            Self::Linear => 1,
            Self::Quadratic => 2,
            Self::Cubic => 3,
            Self::Quartic => 4,
            Self::Quintic => 5,
        }
    }

    fn poles(self) -> Vec<f64> {
        match self {
            Self::Nearest | Self::Linear => Vec::new(),
            Self::Quadratic => vec![8.0f64.sqrt() - 3.0],
            Self::Cubic => vec![3.0f64.sqrt() - 2.0],
            Self::Quartic => vec![
                (664.0 - 438976.0f64.sqrt()).sqrt() + 304.0f64.sqrt() - 19.0,
                (664.0 + 438976.0f64.sqrt()).sqrt() - 304.0f64.sqrt() - 19.0,
            ],
            Self::Quintic => vec![
                (135.0 / 2.0 - (17745.0f64 / 4.0).sqrt()).sqrt() + (105.0f64 / 4.0).sqrt() - 13.0 / 2.0,
                (135.0 / 2.0 + (17745.0f64 / 4.0).sqrt()).sqrt() - (105.0f64 / 4.0).sqrt() - 13.0 / 2.0,
            ],
        }
    }
}

/// Separable taps for one sampling coordinate.
#[derive(Clone, Copy, Debug)]
struct Taps {
    start: isize,
    weights: [f64; 6],
}

/// Prefiltered spline coefficients of a raster.
#[derive(Clone, Debug)]
pub struct SplineImage {
    width: usize,
    height: usize,
    order: InterpolationOrder,
    coeffs: Vec<f64>,
}

impl SplineImage {
    /// Computes interpolation coefficients for `raster`.
    pub fn new(raster: &Raster, order: InterpolationOrder) -> Self {
        let width = raster.width();
        let height = raster.height();
        let mut coeffs: Vec<f64> = raster.data().iter().map(|&v| f64::from(v)).collect();

        let poles = order.poles();
        if !poles.is_empty() {
            for row in coeffs.chunks_mut(width) {
                prefilter_1d(row, &poles);
            }
            let mut column = vec![0.0f64; height];
            for x in 0..width {
                for (y, slot) in column.iter_mut().enumerate() {
                    *slot = coeffs[y * width + x];
                }
                prefilter_1d(&mut column, &poles);
                for (y, value) in column.iter().enumerate() {
                    coeffs[y * width + x] = *value;
                }
            }
        }

        Self {
            width,
            height,
            order,
            coeffs,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Interpolates at column `x`, row `y`.
    ///
    /// Positions outside `[-0.5, size - 0.5)` on either axis return `None`.
    pub fn sample(&self, x: f64, y: f64) -> Option<f64> {
        if !self.covers(x, y) {
            return None;
        }
        let tx = self.taps(x);
        let ty = self.taps(y);
        Some(self.eval(&tx, &ty))
    }

    fn covers(&self, x: f64, y: f64) -> bool {
        x >= -0.5 && x < self.width as f64 - 0.5 && y >= -0.5 && y < self.height as f64 - 0.5
    }

    fn taps(&self, t: f64) -> Taps {
        let n = self.order.order();
        let mut weights = [0.0f64; 6];
        if n == 0 {
            return Taps {
                start: (t + 0.5).floor() as isize,
                weights: [1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            };
        }
        let base = if n % 2 == 1 { t.floor() } else { (t + 0.5).floor() };
        let start = base as isize - (n / 2) as isize;
        for (k, w) in weights.iter_mut().enumerate().take(n + 1) {
            *w = bspline_basis(n, t - (start + k as isize) as f64);
        }
        Taps { start, weights }
    }

    fn eval(&self, tx: &Taps, ty: &Taps) -> f64 {
        let n = self.order.order();
        let mut acc = 0.0f64;
        for j in 0..=n {
            let wy = ty.weights[j];
            if wy == 0.0 {
                continue;
            }
            let row = mirror(ty.start + j as isize, self.height) * self.width;
            let mut line = 0.0f64;
            for i in 0..=n {
                let col = mirror(tx.start + i as isize, self.width);
                line += tx.weights[i] * self.coeffs[row + col];
            }
            acc += wy * line;
        }
        acc
    }
}

/// Upsamples `raster` by an integer `factor`.
///
/// Output pixel `j` samples source position `(j + 0.5) / factor - 0.5`.
pub fn upsample(raster: &Raster, factor: usize, order: InterpolationOrder) -> AerofidResult<Raster> {
    if factor == 0 {
        return Err(AerofidError::InvalidConfig {
            field: "factor",
            reason: "must be at least 1",
        });
    }
    let width = raster.width() * factor;
    let height = raster.height() * factor;
    if factor == 1 {
        return Ok(raster.clone());
    }

    let spline = SplineImage::new(raster, order);
    let scale = factor as f64;
    let col_taps: Vec<Taps> = (0..width)
        .map(|j| spline.taps((j as f64 + 0.5) / scale - 0.5))
        .collect();
    let row_taps: Vec<Taps> = (0..height)
        .map(|i| spline.taps((i as f64 + 0.5) / scale - 0.5))
        .collect();

    let mut data = Vec::with_capacity(width * height);
    for ty in &row_taps {
        for tx in &col_taps {
            data.push(to_u8(spline.eval(tx, ty)));
        }
    }
    Raster::new(raster.id(), data, width, height)
}

/// Rounds and saturates an interpolated value.
pub(crate) fn to_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Centered B-spline of degree `n` evaluated at `t`.
fn bspline_basis(n: usize, t: f64) -> f64 {
    let half = (n + 1) as f64 / 2.0;
    let mut sum = 0.0f64;
    let mut binom = 1.0f64;
    for k in 0..=n + 1 {
        let arg = t + half - k as f64;
        if arg > 0.0 {
            let term = binom * arg.powi(n as i32);
            sum += if k % 2 == 0 { term } else { -term };
        }
        binom = binom * (n + 1 - k) as f64 / (k + 1) as f64;
    }
    let factorial: f64 = (1..=n).map(|v| v as f64).product();
    (sum / factorial).max(0.0)
}

/// Mirror boundary index with period `2n - 2`.
fn mirror(i: isize, n: usize) -> usize {
    if n <= 1 {
        return 0;
    }
    let period = 2 * n as isize - 2;
    let mut i = i.rem_euclid(period);
    if i >= n as isize {
        i = period - i;
    }
    i as usize
}

fn prefilter_1d(c: &mut [f64], poles: &[f64]) {
    let n = c.len();
    if n < 2 {
        return;
    }
    let gain: f64 = poles.iter().map(|z| (1.0 - z) * (1.0 - 1.0 / z)).product();
    for v in c.iter_mut() {
        *v *= gain;
    }
    for &z in poles {
        c[0] = causal_init(c, z);
        for k in 1..n {
            c[k] += z * c[k - 1];
        }
        c[n - 1] = (z / (z * z - 1.0)) * (c[n - 1] + z * c[n - 2]);
        for k in (0..n - 1).rev() {
            c[k] = z * (c[k + 1] - c[k]);
        }
    }
}

fn causal_init(c: &[f64], z: f64) -> f64 {
    const TOLERANCE: f64 = 1e-12;
    let n = c.len();
    let horizon = (TOLERANCE.ln() / z.abs().ln()).ceil() as usize;
    if horizon < n {
        let mut zn = z;
        let mut sum = c[0];
        for value in &c[1..horizon] {
            sum += zn * value;
            zn *= z;
        }
        return sum;
    }

    let iz = 1.0 / z;
    let mut zn = z;
    let mut z2n = z.powi(n as i32 - 1);
    let mut sum = c[0] + z2n * c[n - 1];
    z2n *= z2n * iz;
    for value in &c[1..n - 1] {
        sum += (zn + z2n) * value;
        zn *= z;
        z2n *= iz;
    }
    sum / (1.0 - zn * zn)
}
