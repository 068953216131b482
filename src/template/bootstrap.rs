//! Building templates from manually picked marker positions.
//!
//! Point picking itself happens in an external viewer; these helpers turn the
//! picked coordinates into template patches.

use crate::geometry::Point;
use crate::image::{ops, Raster};
use crate::template::Template;
use crate::util::{AerofidError, AerofidResult};

/// Cuts a `2 * half_side` square template centered on a picked marker.
///
/// The square must lie inside the raster.
pub fn template_from_point(raster: &Raster, point: Point, half_side: usize) -> AerofidResult<Template> {
    if half_side == 0 {
        return Err(AerofidError::InvalidConfig {
            field: "half_side",
            reason: "must be positive",
        });
    }
    let side = 2 * half_side;
    let (top, left) = corner_of(point, half_side as i64, half_side as i64, raster, side, side)?;
    crop(raster, left, top, side, side)
}

/// Cuts the four midside proxy templates from picked inner-most points.
///
/// Points are given in `left, top, right, bottom` order in raster
/// coordinates. The raster is padded by `buffer` so that proxies near the
/// frame edge can be cut; each template spans `buffer` pixels outward from
/// the picked point and `2 * buffer` pixels to either side of it along the
/// edge.
pub fn proxy_templates_from_points(
    raster: &Raster,
    points: [Point; 4],
    buffer: usize,
) -> AerofidResult<[Template; 4]> {
    if buffer == 0 {
        return Err(AerofidError::InvalidConfig {
            field: "buffer",
            reason: "must be positive",
        });
    }
    let padded = ops::pad(raster, buffer)?;
    let shift = buffer as f64;
    let [left, top, right, bottom] = points.map(|p| p.offset(shift, shift));
    let b = buffer as i64;
    let long = 4 * buffer;

    let (y, x) = corner_of(left, 2 * b, b, &padded, buffer, long)?;
    let left_tpl = crop(&padded, x, y, buffer, long)?;
    let (y, x) = corner_of(top, b, 2 * b, &padded, long, buffer)?;
    let top_tpl = crop(&padded, x, y, long, buffer)?;
    let (y, x) = corner_of(right, 2 * b, 0, &padded, buffer, long)?;
    let right_tpl = crop(&padded, x, y, buffer, long)?;
    let (y, x) = corner_of(bottom, 0, 2 * b, &padded, long, buffer)?;
    let bottom_tpl = crop(&padded, x, y, long, buffer)?;

    Ok([left_tpl, top_tpl, right_tpl, bottom_tpl])
}

/// Top-left corner of a `width x height` patch reaching `up` rows above and
/// `back` columns left of `point`, checked against the raster bounds.
fn corner_of(
    point: Point,
    up: i64,
    back: i64,
    raster: &Raster,
    width: usize,
    height: usize,
) -> AerofidResult<(usize, usize)> {
    if !point.is_finite() {
        return Err(AerofidError::InvalidInput("picked point is not finite"));
    }
    let top = point.y as i64 - up;
    let left = point.x as i64 - back;
    let fits = top >= 0
        && left >= 0
        && top as usize + height <= raster.height()
        && left as usize + width <= raster.width();
    if !fits {
        return Err(AerofidError::RoiOutOfBounds {
            x: left.max(0) as usize,
            y: top.max(0) as usize,
            width,
            height,
            img_width: raster.width(),
            img_height: raster.height(),
        });
    }
    Ok((top as usize, left as usize))
}

fn crop(raster: &Raster, x: usize, y: usize, width: usize, height: usize) -> AerofidResult<Template> {
    let roi = raster.view().roi(x, y, width, height)?;
    Ok(Template::from_raster(Raster::from_view("template", roi)?))
}

#[cfg(test)]
mod tests {
    use super::{proxy_templates_from_points, template_from_point};
    use crate::geometry::Point;
    use crate::image::Raster;

    #[test]
    fn template_is_centered_on_point() {
        let raster = Raster::from_fn("frame", 20, 20, |x, y| (y * 20 + x) as u8).unwrap();
        let tpl = template_from_point(&raster, Point::new(10.0, 8.0), 3).unwrap();
        assert_eq!((tpl.width(), tpl.height()), (6, 6));
        assert_eq!(tpl.view().get(0, 0).copied(), Some((7 * 20 + 5) as u8));
        assert!(template_from_point(&raster, Point::new(1.0, 8.0), 3).is_err());
    }

    #[test]
    fn proxy_templates_have_edge_shapes() {
        let raster = Raster::from_fn("frame", 40, 30, |x, y| (x * 3 + y) as u8).unwrap();
        let points = [
            Point::new(15.0, 2.0),
            Point::new(2.0, 20.0),
            Point::new(15.0, 37.0),
            Point::new(27.0, 20.0),
        ];
        let [l, t, r, b] = proxy_templates_from_points(&raster, points, 5).unwrap();
        assert_eq!((l.width(), l.height()), (5, 20));
        assert_eq!((t.width(), t.height()), (20, 5));
        assert_eq!((r.width(), r.height()), (5, 20));
        assert_eq!((b.width(), b.height()), (20, 5));
        // Left proxy ends at the picked column: its last column is raster x = 1.
        assert_eq!(l.view().get(4, 0).copied(), Some((1 * 3 + 5) as u8));
    }
}
