//! Image-plane geometry: points, windows and fiducial layouts.
//!
//! Points are stored in `(y, x)` order with `y` growing down the rows, the
//! same frame the rasters are indexed in. Pixel centers sit on integer
//! coordinates.

mod layout;
mod window;

pub use layout::{FiducialLayout, MarkerSlot};
pub use window::{corner_windows, midside_windows, Window};

/// A location in raster coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    /// Row coordinate.
    pub y: f64,
    /// Column coordinate.
    pub x: f64,
}

impl Point {
    pub const fn new(y: f64, x: f64) -> Self {
        Self { y, x }
    }

    /// Returns the point halfway between `self` and `other`.
    pub fn midpoint(self, other: Point) -> Point {
        Point::new(0.5 * (self.y + other.y), 0.5 * (self.x + other.x))
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Point) -> f64 {
        (self.y - other.y).hypot(self.x - other.x)
    }

    /// Returns the point shifted by `(dy, dx)`.
    pub fn offset(self, dy: f64, dx: f64) -> Point {
        Point::new(self.y + dy, self.x + dx)
    }

    /// Returns true when both coordinates are finite.
    pub fn is_finite(self) -> bool {
        self.y.is_finite() && self.x.is_finite()
    }
}

/// Component-wise mean of the defined points.
pub fn mean_point<I>(points: I) -> Option<Point>
where
    I: IntoIterator<Item = Option<Point>>,
{
    let mut sum_y = 0.0;
    let mut sum_x = 0.0;
    let mut n = 0usize;
    for p in points.into_iter().flatten() {
        sum_y += p.y;
        sum_x += p.x;
        n += 1;
    }
    (n > 0).then(|| Point::new(sum_y / n as f64, sum_x / n as f64))
}

#[cfg(test)]
mod tests {
    use super::{mean_point, Point};

    #[test]
    fn midpoint_and_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(6.0, 8.0);
        assert_eq!(a.midpoint(b), Point::new(3.0, 4.0));
        assert!((a.distance(b) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn mean_point_skips_missing() {
        let m = mean_point([Some(Point::new(1.0, 2.0)), None, Some(Point::new(3.0, 4.0))]);
        assert_eq!(m, Some(Point::new(2.0, 3.0)));
        assert_eq!(mean_point([None, None]), None);
    }
}
