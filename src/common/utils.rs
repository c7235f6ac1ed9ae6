use chrono::{DateTime, Utc};
use crate::common::error::{GraphLabError, Result};

/// Relative tolerance used when comparing floating point aggregates
pub const RELATIVE_TOLERANCE: f64 = 1e-9;

/// Absolute floor for comparisons close to zero
pub const ABSOLUTE_TOLERANCE: f64 = 1e-12;

/// Compare two floats with relative and absolute tolerance
pub fn approx_eq(a: f64, b: f64) -> bool {
    if a == b {
        return true;
    }
    let diff = (a - b).abs();
    diff <= ABSOLUTE_TOLERANCE || diff <= RELATIVE_TOLERANCE * a.abs().max(b.abs())
}

/// Arithmetic mean; fails on an empty input instead of dividing by zero
pub fn mean<I>(values: I) -> Result<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut sum = 0.0;
    let mut count = 0usize;
    for value in values {
        sum += value;
        count += 1;
    }

    if count == 0 {
        return Err(GraphLabError::empty_graph("cannot average an empty set of values"));
    }
    Ok(sum / count as f64)
}

/// Minimum and maximum of a sequence, ignoring NaN
pub fn min_max<I>(values: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = f64>,
{
    values.into_iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Scale 2-D coordinates so that the largest magnitude along either axis is 1
pub fn rescale_positions(points: &mut [(f64, f64)]) {
    if points.is_empty() {
        return;
    }

    let n = points.len() as f64;
    let (cx, cy) = points.iter().fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
    let (cx, cy) = (cx / n, cy / n);

    let mut extent: f64 = 0.0;
    for (x, y) in points.iter_mut() {
        *x -= cx;
        *y -= cy;
        extent = extent.max(x.abs()).max(y.abs());
    }

    if extent > 0.0 {
        for (x, y) in points.iter_mut() {
            *x /= extent;
            *y /= extent;
        }
    }
}

/// Get current timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}
