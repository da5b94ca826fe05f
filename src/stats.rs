//! Statistical moments and shared numeric helpers.
//!
//! [`compute_moments`] reports four moments for one numeric column of the
//! cleaned table. Conventions, fixed and relied on by tests:
//!
//! - standard deviation is the *sample* estimate (divisor n − 1);
//! - skewness is the Fisher-Pearson coefficient g1 = m3 / m2^(3/2) with
//!   population moments and **no** bias correction;
//! - kurtosis is excess kurtosis g2 = m4 / m2² − 3, same convention.
//!
//! Degenerate input (zero variance) yields `NaN` skewness and kurtosis
//! rather than an error; the interpretation stage classifies `NaN`
//! through its fallback branches.
//!
//! # Example
//!
//! ```
//! use accident_trends::dataframe::{Column, DataFrame, ValidityBitmap};
//! use accident_trends::stats::compute_moments;
//!
//! let mut df = DataFrame::new();
//! df.add_column(
//!     "Number_of_Casualties".to_string(),
//!     Column::numeric(vec![1.0, 3.0], ValidityBitmap::all_valid(2)),
//! ).unwrap();
//! let m = compute_moments(&df, "Number_of_Casualties").unwrap();
//! assert!((m.mean - 2.0).abs() < 1e-12);
//! assert!((m.std_dev - 2.0_f64.sqrt()).abs() < 1e-12);
//! assert_eq!(m.skewness, 0.0);
//! ```

use crate::dataframe::DataFrame;
use crate::error::TrendsError;

// ── Moments ───────────────────────────────────────────────────────────

/// The four moments of one numeric attribute. Ephemeral; consumed once
/// by the interpretation stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation (divisor n − 1).
    pub std_dev: f64,
    /// Fisher-Pearson skewness g1 (uncorrected). `NaN` under zero variance.
    pub skewness: f64,
    /// Excess kurtosis g2 (uncorrected). `NaN` under zero variance.
    pub excess_kurtosis: f64,
}

/// Computes the moments of a named numeric column, ignoring missing values.
///
/// # Errors
///
/// - [`TrendsError::ColumnNotFound`] if `column_name` is absent.
/// - [`TrendsError::NonNumericColumn`] if the column is not numeric.
/// - [`TrendsError::InsufficientData`] if fewer than 2 valid values
///   remain (the sample standard deviation is undefined).
pub fn compute_moments(df: &DataFrame, column_name: &str) -> Result<Moments, TrendsError> {
    let col = df
        .column_by_name(column_name)
        .ok_or_else(|| TrendsError::ColumnNotFound {
            name: column_name.to_string(),
        })?;
    let values = col
        .valid_numeric_values()
        .ok_or_else(|| TrendsError::NonNumericColumn {
            column: column_name.to_string(),
        })?;

    let n = values.len();
    if n < 2 {
        return Err(TrendsError::InsufficientData {
            column: column_name.to_string(),
            min_required: 2,
            actual: n,
        });
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let mut m2 = 0.0;
    let mut m3 = 0.0;
    let mut m4 = 0.0;
    for &x in &values {
        let d = x - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    let nf = n as f64;
    let std_dev = (m2 / (nf - 1.0)).sqrt();
    m2 /= nf;
    m3 /= nf;
    m4 /= nf;

    // 0/0 under zero variance; NaN is the documented sentinel
    let skewness = m3 / m2.powf(1.5);
    let excess_kurtosis = m4 / (m2 * m2) - 3.0;

    Ok(Moments {
        mean,
        std_dev,
        skewness,
        excess_kurtosis,
    })
}

// ── Numeric helpers ───────────────────────────────────────────────────

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (divisor n − 1), or `None` for n < 2.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = values.iter().sum::<f64>() / n as f64;
    let ss: f64 = values.iter().map(|&x| (x - m) * (x - m)).sum();
    Some((ss / (n as f64 - 1.0)).sqrt())
}

/// Percentile via linear interpolation between closest ranks
/// (`q` in 0..=1). `None` for an empty slice.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Pearson correlation between two paired slices.
///
/// Returns `None` for fewer than 2 pairs or when either side has zero
/// variance (the coefficient is undefined there).
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let mx = x[..n].iter().sum::<f64>() / n as f64;
    let my = y[..n].iter().sum::<f64>() / n as f64;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for i in 0..n {
        let dx = x[i] - mx;
        let dy = y[i] - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    let denom = (sxx * syy).sqrt();
    if denom == 0.0 {
        return None;
    }
    Some(sxy / denom)
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::{Column, ValidityBitmap};

    fn numeric_frame(name: &str, values: Vec<f64>) -> DataFrame {
        let n = values.len();
        let mut df = DataFrame::new();
        df.add_column(
            name.to_string(),
            Column::numeric(values, ValidityBitmap::all_valid(n)),
        )
        .unwrap();
        df
    }

    // ── compute_moments ──────────────────────────────────────────

    #[test]
    fn two_point_symmetric_set() {
        let df = numeric_frame("Number_of_Casualties", vec![1.0, 3.0]);
        let m = compute_moments(&df, "Number_of_Casualties").unwrap();
        assert!((m.mean - 2.0).abs() < 1e-12);
        assert!((m.std_dev - 1.4142135623730951).abs() < 1e-3);
        assert_eq!(m.skewness, 0.0);
        // Any two-point set is maximally flat: g2 = -2
        assert!((m.excess_kurtosis + 2.0).abs() < 1e-12);
    }

    #[test]
    fn right_skewed_sample() {
        // [1,1,1,5]: m2 = 3, m3 = 6, g1 = 6 / 3^1.5
        let df = numeric_frame("x", vec![1.0, 1.0, 1.0, 5.0]);
        let m = compute_moments(&df, "x").unwrap();
        assert!((m.skewness - 6.0 / 3.0_f64.powf(1.5)).abs() < 1e-12);
        assert!(m.skewness > 0.5);
    }

    #[test]
    fn identical_values_nan_sentinel() {
        let df = numeric_frame("x", vec![4.0, 4.0, 4.0, 4.0]);
        let m = compute_moments(&df, "x").unwrap();
        assert_eq!(m.mean, 4.0);
        assert_eq!(m.std_dev, 0.0);
        assert!(m.skewness.is_nan());
        assert!(m.excess_kurtosis.is_nan());
    }

    #[test]
    fn single_value_insufficient() {
        let df = numeric_frame("Number_of_Casualties", vec![2.0]);
        let err = compute_moments(&df, "Number_of_Casualties").unwrap_err();
        match err {
            TrendsError::InsufficientData {
                column,
                min_required,
                actual,
            } => {
                assert_eq!(column, "Number_of_Casualties");
                assert_eq!(min_required, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("expected InsufficientData, got {other:?}"),
        }
    }

    #[test]
    fn empty_column_insufficient_not_numeric_error() {
        let df = numeric_frame("x", vec![]);
        let err = compute_moments(&df, "x").unwrap_err();
        assert!(matches!(err, TrendsError::InsufficientData { .. }));
    }

    #[test]
    fn missing_values_are_skipped() {
        let mut v = ValidityBitmap::empty();
        v.push(true);
        v.push(false);
        v.push(true);
        let mut df = DataFrame::new();
        df.add_column("x".into(), Column::numeric(vec![1.0, 99.0, 3.0], v))
            .unwrap();
        let m = compute_moments(&df, "x").unwrap();
        assert!((m.mean - 2.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_column() {
        let df = numeric_frame("x", vec![1.0, 2.0]);
        let err = compute_moments(&df, "y").unwrap_err();
        assert!(matches!(err, TrendsError::ColumnNotFound { .. }));
    }

    #[test]
    fn non_numeric_column() {
        let mut df = DataFrame::new();
        df.add_column(
            "label".into(),
            Column::text(vec!["a".into(), "b".into()], ValidityBitmap::all_valid(2)),
        )
        .unwrap();
        let err = compute_moments(&df, "label").unwrap_err();
        assert!(matches!(err, TrendsError::NonNumericColumn { .. }));
    }

    // ── Helpers ──────────────────────────────────────────────────

    #[test]
    fn percentile_interpolates() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&values, 0.5), Some(2.5));
        assert_eq!(percentile(&values, 0.0), Some(1.0));
        assert_eq!(percentile(&values, 1.0), Some(4.0));
        assert_eq!(percentile(&values, 0.25), Some(1.75));
    }

    #[test]
    fn percentile_empty() {
        assert_eq!(percentile(&[], 0.5), None);
    }

    #[test]
    fn pearson_perfect_negative() {
        let x = vec![1.0, 2.0, 3.0];
        let y = vec![3.0, 2.0, 1.0];
        let r = pearson(&x, &y).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_zero_variance_undefined() {
        let x = vec![1.0, 1.0, 1.0];
        let y = vec![1.0, 2.0, 3.0];
        assert_eq!(pearson(&x, &y), None);
    }

    #[test]
    fn sample_std_bessel() {
        let s = sample_std(&[1.0, 3.0]).unwrap();
        assert!((s - 2.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(sample_std(&[1.0]), None);
    }
}
