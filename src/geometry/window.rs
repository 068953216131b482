//! Quadrant-band search windows.
//!
//! With `hh = H / 2`, `qh = hh / 2`, `hw = W / 2` and `qw = hw / 2` (integer
//! division), each window spans one quarter band along an edge of the frame.
//! The center of the frame is never searched: fiducials sit on the border.

use crate::util::{AerofidError, AerofidResult};

/// Half-open integer bounds `[top, bottom) x [left, right)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

impl Window {
    pub fn height(&self) -> usize {
        self.bottom - self.top
    }

    pub fn width(&self) -> usize {
        self.right - self.left
    }

    /// Returns true when the two windows share at least one pixel.
    pub fn overlaps(&self, other: &Window) -> bool {
        self.top < other.bottom
            && other.top < self.bottom
            && self.left < other.right
            && other.left < self.right
    }

    /// Returns true when pixel `(row, col)` lies inside the window.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.top..self.bottom).contains(&row) && (self.left..self.right).contains(&col)
    }
}

struct Bands {
    qh: usize,
    lower_h: usize,
    qw: usize,
    right_w: usize,
}

fn bands(height: usize, width: usize) -> AerofidResult<Bands> {
    if height < 4 || width < 4 {
        return Err(AerofidError::InvalidDimensions { width, height });
    }
    let hh = height / 2;
    let qh = hh / 2;
    let hw = width / 2;
    let qw = hw / 2;
    Ok(Bands {
        qh,
        lower_h: hh + qh,
        qw,
        right_w: hw + qw,
    })
}

/// Search windows for midside markers in `left, top, right, bottom` order.
pub fn midside_windows(height: usize, width: usize) -> AerofidResult<[Window; 4]> {
    let b = bands(height, width)?;
    Ok([
        Window {
            top: b.qh,
            bottom: b.lower_h,
            left: 0,
            right: b.qw,
        },
        Window {
            top: 0,
            bottom: b.qh,
            left: b.qw,
            right: b.right_w,
        },
        Window {
            top: b.qh,
            bottom: b.lower_h,
            left: b.right_w,
            right: width,
        },
        Window {
            top: b.lower_h,
            bottom: height,
            left: b.qw,
            right: b.right_w,
        },
    ])
}

/// Search windows for corner markers in
/// `top_left, top_right, bottom_right, bottom_left` order.
pub fn corner_windows(height: usize, width: usize) -> AerofidResult<[Window; 4]> {
    let b = bands(height, width)?;
    Ok([
        Window {
            top: 0,
            bottom: b.qh,
            left: 0,
            right: b.qw,
        },
        Window {
            top: 0,
            bottom: b.qh,
            left: b.right_w,
            right: width,
        },
        Window {
            top: b.lower_h,
            bottom: height,
            left: b.right_w,
            right: width,
        },
        Window {
            top: b.lower_h,
            bottom: height,
            left: 0,
            right: b.qw,
        },
    ])
}
