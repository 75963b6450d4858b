//! In-memory cleanup applied to a composition matrix before projection.
//!
//! Mirrors what a loader does after reading a dataset: replace missing
//! values, rescale into `[0, 1]` (globally or per channel), clip a channel
//! to a focus range and drop rows that are entirely zero.

use crate::error::DataError;
use crate::projector::validate_rows;

/// Entries with absolute value at or below this count as zero.
pub const ZERO_TOLERANCE: f64 = 1e-8;

/// Replace NaN and infinities with `value`. Returns how many were replaced.
pub fn replace_non_finite(rows: &mut [Vec<f64>], value: f64) -> usize {
    let mut replaced = 0;
    for v in rows.iter_mut().flatten() {
        if !v.is_finite() {
            *v = value;
            replaced += 1;
        }
    }
    replaced
}

fn min_max<'a>(values: impl Iterator<Item = &'a f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

fn rescale(v: f64, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        (v - lo) / (hi - lo)
    } else {
        0.0
    }
}

/// Min–max rescale the whole matrix into `[0, 1]`. Constant data maps to 0.
pub fn normalize(rows: &mut [Vec<f64>]) {
    if let Some((lo, hi)) = min_max(rows.iter().flatten()) {
        for v in rows.iter_mut().flatten() {
            *v = rescale(*v, lo, hi);
        }
    }
}

/// Min–max rescale every column independently.
pub fn normalize_channels(rows: &mut [Vec<f64>]) -> Result<(), DataError> {
    let dims = match rows.first() {
        Some(r) => r.len(),
        None => return Ok(()),
    };
    validate_rows(rows, dims)?;

    for c in 0..dims {
        if let Some((lo, hi)) = min_max(rows.iter().map(|r| &r[c])) {
            for row in rows.iter_mut() {
                row[c] = rescale(row[c], lo, hi);
            }
        }
    }
    Ok(())
}

/// Clamp column `column` of every row into `[lo, hi]`.
pub fn clip_channel(rows: &mut [Vec<f64>], column: usize, lo: f64, hi: f64) -> Result<(), DataError> {
    for row in rows.iter_mut() {
        let expected = row.len();
        let v = row.get_mut(column).ok_or(DataError::ChannelCount {
            expected,
            found: column,
        })?;
        *v = v.clamp(lo, hi);
    }
    Ok(())
}

/// Indices of rows with at least one entry away from zero.
pub fn nonzero_rows<R: AsRef<[f64]>>(rows: &[R]) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, r)| r.as_ref().iter().any(|v| v.abs() > ZERO_TOLERANCE))
        .map(|(i, _)| i)
        .collect()
}

/// Mean of a row, used as the opacity of a sample.
pub fn mean_alpha(row: &[f64]) -> f64 {
    if row.is_empty() {
        0.0
    } else {
        row.iter().sum::<f64>() / row.len() as f64
    }
}
