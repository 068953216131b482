//! Statistical helpers that skip undefined values.

/// Wraps an angle in degrees to the range [-180, 180).
pub(crate) fn wrap_deg(angle_deg: f64) -> f64 {
    let mut wrapped = angle_deg % 360.0;
    if wrapped < -180.0 {
        wrapped += 360.0;
    }
    if wrapped >= 180.0 {
        wrapped -= 360.0;
    }
    wrapped
}

/// Median of the defined values; even counts average the two middle values.
pub fn median<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut defined: Vec<f64> = values
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();
    if defined.is_empty() {
        return None;
    }
    defined.sort_by(f64::total_cmp);
    let mid = defined.len() / 2;
    if defined.len() % 2 == 1 {
        Some(defined[mid])
    } else {
        Some(0.5 * (defined[mid - 1] + defined[mid]))
    }
}

/// Mean of the defined values.
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut sum = 0.0f64;
    let mut n = 0usize;
    for v in values.into_iter().flatten() {
        if v.is_finite() {
            sum += v;
            n += 1;
        }
    }
    (n > 0).then(|| sum / n as f64)
}

/// Root of the mean of squared residuals, skipping undefined residuals.
pub fn rms<I>(residuals: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    mean(residuals.into_iter().map(|r| r.map(|v| v * v))).map(f64::sqrt)
}
