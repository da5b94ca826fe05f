//! Natural-language interpretation of computed moments.
//!
//! Classifies skewness and excess kurtosis into qualitative categories
//! and renders the two report lines printed at the end of a run.
//!
//! Boundary handling is deliberate: skewness of exactly ±0.5 counts as
//! approximately symmetric, and excess kurtosis of exactly 0 counts as
//! mesokurtic. A `NaN` moment fails every strict comparison and so also
//! lands in those fallback branches — degenerate input is classified,
//! never a panic.

use std::fmt;

use crate::stats::Moments;

// ── Classification ────────────────────────────────────────────────────

/// Qualitative skewness category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkewClass {
    RightSkewed,
    LeftSkewed,
    ApproximatelySymmetric,
}

impl SkewClass {
    /// Classifies a skewness value. `NaN` falls through to
    /// `ApproximatelySymmetric`.
    pub fn from_value(skewness: f64) -> Self {
        if skewness > 0.5 {
            Self::RightSkewed
        } else if skewness < -0.5 {
            Self::LeftSkewed
        } else {
            Self::ApproximatelySymmetric
        }
    }

    /// The phrase used in the report sentence.
    pub fn label(self) -> &'static str {
        match self {
            Self::RightSkewed => "right skewed",
            Self::LeftSkewed => "left skewed",
            Self::ApproximatelySymmetric => "approximately symmetric",
        }
    }
}

/// Qualitative tail-weight category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KurtosisClass {
    Leptokurtic,
    Platykurtic,
    Mesokurtic,
}

impl KurtosisClass {
    /// Classifies an excess-kurtosis value. `NaN` falls through to
    /// `Mesokurtic`.
    pub fn from_value(excess_kurtosis: f64) -> Self {
        if excess_kurtosis > 0.0 {
            Self::Leptokurtic
        } else if excess_kurtosis < 0.0 {
            Self::Platykurtic
        } else {
            Self::Mesokurtic
        }
    }

    /// The phrase used in the report sentence.
    pub fn label(self) -> &'static str {
        match self {
            Self::Leptokurtic => "leptokurtic",
            Self::Platykurtic => "platykurtic",
            Self::Mesokurtic => "mesokurtic",
        }
    }
}

// ── Interpretation ────────────────────────────────────────────────────

/// The rendered interpretation of one attribute's moments.
///
/// Displays as the two report lines (moments to two decimal places,
/// then the classification sentence).
///
/// ```
/// use accident_trends::report::interpret;
/// use accident_trends::stats::Moments;
///
/// let m = Moments { mean: 2.0, std_dev: 1.41, skewness: 0.0, excess_kurtosis: -2.0 };
/// let report = interpret(&m, "Number_of_Casualties");
/// let text = report.to_string();
/// assert!(text.contains("approximately symmetric"));
/// assert!(text.contains("platykurtic"));
/// ```
#[derive(Debug, Clone)]
pub struct Interpretation {
    pub column: String,
    pub moments: Moments,
    pub skew: SkewClass,
    pub kurtosis: KurtosisClass,
}

impl fmt::Display for Interpretation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "For the attribute {}:", self.column)?;
        writeln!(
            f,
            "Mean = {:.2}, Standard Deviation = {:.2}, Skewness = {:.2}, and Excess Kurtosis = {:.2}.",
            self.moments.mean,
            self.moments.std_dev,
            self.moments.skewness,
            self.moments.excess_kurtosis,
        )?;
        write!(
            f,
            "The distribution is {} and {}.",
            self.skew.label(),
            self.kurtosis.label()
        )
    }
}

/// Builds the interpretation for one attribute's moments.
pub fn interpret(moments: &Moments, column: &str) -> Interpretation {
    Interpretation {
        column: column.to_string(),
        moments: *moments,
        skew: SkewClass::from_value(moments.skewness),
        kurtosis: KurtosisClass::from_value(moments.excess_kurtosis),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn moments(skewness: f64, excess_kurtosis: f64) -> Moments {
        Moments {
            mean: 0.0,
            std_dev: 1.0,
            skewness,
            excess_kurtosis,
        }
    }

    // ── Skew classification ──────────────────────────────────────

    #[test]
    fn skew_above_half_is_right() {
        assert_eq!(SkewClass::from_value(0.51), SkewClass::RightSkewed);
    }

    #[test]
    fn skew_below_negative_half_is_left() {
        assert_eq!(SkewClass::from_value(-0.51), SkewClass::LeftSkewed);
    }

    #[test]
    fn skew_boundaries_are_symmetric() {
        // Exactly ±0.5 is inside the symmetric band
        assert_eq!(
            SkewClass::from_value(0.5),
            SkewClass::ApproximatelySymmetric
        );
        assert_eq!(
            SkewClass::from_value(-0.5),
            SkewClass::ApproximatelySymmetric
        );
    }

    #[test]
    fn skew_nan_falls_through() {
        assert_eq!(
            SkewClass::from_value(f64::NAN),
            SkewClass::ApproximatelySymmetric
        );
    }

    // ── Kurtosis classification ──────────────────────────────────

    #[test]
    fn kurtosis_signs() {
        assert_eq!(KurtosisClass::from_value(0.1), KurtosisClass::Leptokurtic);
        assert_eq!(KurtosisClass::from_value(-0.1), KurtosisClass::Platykurtic);
        assert_eq!(KurtosisClass::from_value(0.0), KurtosisClass::Mesokurtic);
    }

    #[test]
    fn kurtosis_nan_falls_through() {
        assert_eq!(
            KurtosisClass::from_value(f64::NAN),
            KurtosisClass::Mesokurtic
        );
    }

    // ── Rendering ────────────────────────────────────────────────

    #[test]
    fn report_lines() {
        let m = Moments {
            mean: 2.0,
            std_dev: 1.4142,
            skewness: 0.0,
            excess_kurtosis: -2.0,
        };
        let text = interpret(&m, "Number_of_Casualties").to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "For the attribute Number_of_Casualties:");
        assert_eq!(
            lines[1],
            "Mean = 2.00, Standard Deviation = 1.41, Skewness = 0.00, and Excess Kurtosis = -2.00."
        );
        assert_eq!(
            lines[2],
            "The distribution is approximately symmetric and platykurtic."
        );
    }

    #[test]
    fn nan_moments_still_render() {
        let text = interpret(&moments(f64::NAN, f64::NAN), "x").to_string();
        assert!(text.contains("approximately symmetric and mesokurtic"));
        assert!(text.contains("NaN"));
    }
}
