//! Calibrated fiducial coordinates of a camera.

use crate::geometry::{FiducialLayout, MarkerSlot, Point};
use crate::util::{AerofidError, AerofidResult};

/// True fiducial positions relative to the principal point.
///
/// Calibration reports use millimeters with `x` to the right and `y` up;
/// the stored pixel offsets are `(dy, dx) = (-y, x) / resolution` so that
/// they can be added to raster coordinates directly.
#[derive(Clone, Debug, PartialEq)]
pub struct CanonicalGeometry {
    resolution_mm: f64,
    mm: [Option<(f64, f64)>; 8],
    offsets: [Option<Point>; 8],
}

impl CanonicalGeometry {
    /// Converts a calibration table of `(x_mm, y_mm)` per frame slot.
    pub fn from_mm(table: [Option<(f64, f64)>; 8], resolution_mm: f64) -> AerofidResult<Self> {
        if !resolution_mm.is_finite() || resolution_mm <= 0.0 {
            return Err(AerofidError::InvalidConfig {
                field: "scanning_resolution_mm",
                reason: "must be finite and positive",
            });
        }
        if table.iter().flatten().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(AerofidError::InvalidInput("canonical coordinates must be finite"));
        }
        let offsets = table.map(|entry| entry.map(|(x, y)| Point::new(-y / resolution_mm, x / resolution_mm)));
        Ok(Self {
            resolution_mm,
            mm: table,
            offsets,
        })
    }

    /// Scanning resolution in millimeters per pixel.
    pub fn resolution_mm(&self) -> f64 {
        self.resolution_mm
    }

    /// Calibrated `(x_mm, y_mm)` of a slot.
    pub fn mm(&self, slot: MarkerSlot) -> Option<(f64, f64)> {
        self.mm[slot.frame_index()]
    }

    /// Pixel offset `(dy, dx)` of a slot from the principal point.
    pub fn offset(&self, slot: MarkerSlot) -> Option<Point> {
        self.offsets[slot.frame_index()]
    }

    /// Canonical positions of a layout's markers for a frame whose
    /// principal point sits at `principal_point`.
    pub fn anchored_at(&self, layout: FiducialLayout, principal_point: Point) -> [Option<Point>; 4] {
        layout
            .slots()
            .map(|slot| self.offset(slot).map(|o| principal_point.offset(o.y, o.x)))
    }
}

#[cfg(test)]
mod tests {
    use super::CanonicalGeometry;
    use crate::geometry::{FiducialLayout, MarkerSlot, Point};

    #[test]
    fn converts_millimeters_with_inverted_rows() {
        let mut table = [None; 8];
        table[MarkerSlot::MidsideTop.frame_index()] = Some((0.0, 106.0));
        table[MarkerSlot::MidsideLeft.frame_index()] = Some((-106.0, 0.0));
        let geom = CanonicalGeometry::from_mm(table, 0.02).unwrap();
        let top = geom.offset(MarkerSlot::MidsideTop).unwrap();
        assert!((top.y + 5300.0).abs() < 1e-9 && top.x.abs() < 1e-9);

        let anchored = geom.anchored_at(FiducialLayout::Midside, Point::new(6000.0, 6000.0));
        let left = anchored[0].unwrap();
        assert!((left.x - 700.0).abs() < 1e-9 && (left.y - 6000.0).abs() < 1e-9);
        assert_eq!(anchored[2], None);
    }

    #[test]
    fn rejects_non_positive_resolution() {
        assert!(CanonicalGeometry::from_mm([None; 8], 0.0).is_err());
    }
}
