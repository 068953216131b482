//! Detection of fiducial proxies on frames without usable markers.
//!
//! Some frames only expose the inner edge of the film holder at each side.
//! Each side gets its own template spanning outward from the picked edge
//! point; the raster is zero-padded so that edges close to the frame border
//! can still be matched.

use crate::bank::CompiledTemplate;
use crate::fiducial::{FiducialSet, Marker};
use crate::geometry::{FiducialLayout, MarkerSlot, Point};
use crate::image::{ops, Raster};
use crate::search::{check_fits, match_template, MatchConfig};
use crate::trace::{trace_span, trace_warn};
use crate::util::{AerofidError, AerofidResult};

/// Configuration for proxy detection and proxy position filtering.
#[derive(Clone, Debug, PartialEq)]
pub struct ProxyConfig {
    /// Zero padding added around the raster before matching.
    pub buffer: usize,
    /// Maximum distance from the batch median position, per axis, in pixels.
    pub offset_threshold_px: f64,
    /// A midside slot known to have no usable proxy on this roll.
    pub missing_proxy: Option<MarkerSlot>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            buffer: 250,
            offset_threshold_px: 50.0,
            missing_proxy: None,
        }
    }
}

impl ProxyConfig {
    pub fn validate(&self) -> AerofidResult<()> {
        if !self.offset_threshold_px.is_finite() || self.offset_threshold_px < 0.0 {
            return Err(AerofidError::InvalidConfig {
                field: "offset_threshold_px",
                reason: "must be finite and non-negative",
            });
        }
        if let Some(slot) = self.missing_proxy {
            if slot.layout() != FiducialLayout::Midside {
                return Err(AerofidError::InvalidConfig {
                    field: "missing_proxy",
                    reason: "must be a midside slot",
                });
            }
        }
        Ok(())
    }
}

/// Detects the left, top, right and bottom proxies of `raster`.
///
/// `templates` are in `left, top, right, bottom` order. Each reported point
/// sits on the template edge facing the frame interior, in unpadded raster
/// coordinates.
pub fn detect_fiducial_proxies(
    raster: &Raster,
    templates: &[CompiledTemplate; 4],
    matching: &MatchConfig,
    cfg: &ProxyConfig,
) -> AerofidResult<FiducialSet> {
    cfg.validate()?;
    let _span = trace_span!("detect_fiducial_proxies", id = raster.id()).entered();

    let padded = ops::pad(raster, cfg.buffer)?;
    let windows = FiducialLayout::Midside.windows(padded.height(), padded.width())?;
    let shift = cfg.buffer as f64;

    let mut markers = [Marker::missing(); 4];
    for (index, (window, tpl)) in windows.iter().zip(templates).enumerate() {
        let region = ops::window_view(padded.view(), window)?;
        check_fits(region, tpl)?;
        let hit = match match_template(region, tpl, matching)? {
            Some(hit) => hit,
            None => {
                trace_warn!("no scorable placement", slot = FiducialLayout::Midside.labels()[index]);
                continue;
            }
        };
        let row = (window.top + hit.row) as f64;
        let col = (window.left + hit.col) as f64;
        let th = tpl.height() as f64;
        let tw = tpl.width() as f64;
        let edge = match index {
            0 => Point::new(row + th / 2.0, col + tw),
            1 => Point::new(row + th, col + tw / 2.0),
            2 => Point::new(row + th / 2.0, col),
            _ => Point::new(row, col + tw / 2.0),
        };
        markers[index] = Marker::new(edge.offset(-shift, -shift), hit.score);
    }

    Ok(FiducialSet::new(raster.id(), FiducialLayout::Midside, markers))
}

#[cfg(test)]
mod tests {
    use super::{detect_fiducial_proxies, ProxyConfig};
    use crate::bank::CompiledTemplate;
    use crate::geometry::{MarkerSlot, Point};
    use crate::image::Raster;
    use crate::search::MatchConfig;
    use crate::template::proxy_templates_from_points;

    fn textured() -> Raster {
        Raster::from_fn("frame", 120, 100, |x, y| {
            (((x * 73 + y * 151) ^ (x * y * 31)) % 251) as u8
        })
        .unwrap()
    }

    #[test]
    fn recovers_picked_proxy_points() {
        let raster = textured();
        let picked = [
            Point::new(50.0, 10.0),
            Point::new(8.0, 60.0),
            Point::new(50.0, 110.0),
            Point::new(92.0, 60.0),
        ];
        let cfg = ProxyConfig {
            buffer: 6,
            ..ProxyConfig::default()
        };
        let templates = proxy_templates_from_points(&raster, picked, cfg.buffer).unwrap();
        let compiled = templates.map(|t| CompiledTemplate::single_level(&t).unwrap());
        let set = detect_fiducial_proxies(&raster, &compiled, &MatchConfig::default(), &cfg).unwrap();
        for (marker, expected) in set.markers.iter().zip(picked) {
            assert_eq!(marker.point, Some(expected));
            assert!((marker.score.unwrap() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn missing_proxy_must_be_midside() {
        let cfg = ProxyConfig {
            missing_proxy: Some(MarkerSlot::CornerTopLeft),
            ..ProxyConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
