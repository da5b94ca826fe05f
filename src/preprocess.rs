//! Cleaning pass over the raw accident table.
//!
//! Preprocessing is the only stage that removes rows. It works in fixed
//! order over whole columns:
//!
//! 1. parse `Accident Date` (`DD-MM-YYYY`), marking unparseable rows;
//! 2. coerce `Number_of_Casualties` and `Number_of_Vehicles` to numeric,
//!    marking non-numeric rows;
//! 3. eliminate every row marked in step 1 or 2 — the single
//!    row-removal point;
//! 4. derive `Severity_Num` (Slight→1, Serious→2, Fatal→3) over the
//!    surviving rows; unrecognized labels get a missing code and the row
//!    is *retained*;
//! 5. print the descriptive summary and correlation matrix.
//!
//! The input table is not mutated; a new cleaned table is returned
//! together with a [`PreprocessReport`] of what was dropped. Running the
//! pass again over its own output is a no-op on row count and codes.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::dataframe::{Column, DataFrame, ValidityBitmap};
use crate::error::TrendsError;
use crate::stats;

/// Raw date column, day-month-year text.
pub const DATE_COLUMN: &str = "Accident Date";
/// Categorical severity labels.
pub const SEVERITY_COLUMN: &str = "Accident_Severity";
/// Casualty count per accident.
pub const CASUALTIES_COLUMN: &str = "Number_of_Casualties";
/// Vehicle count per accident.
pub const VEHICLES_COLUMN: &str = "Number_of_Vehicles";
/// Lighting conditions at the accident site.
pub const LIGHT_COLUMN: &str = "Light_Conditions";
/// Ordinal severity code derived by preprocessing.
pub const SEVERITY_NUM_COLUMN: &str = "Severity_Num";

/// Strict day-month-year format for `Accident Date`.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Columns the pipeline consumes; all must be present in the input.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    DATE_COLUMN,
    SEVERITY_COLUMN,
    CASUALTIES_COLUMN,
    VEHICLES_COLUMN,
    LIGHT_COLUMN,
];

// ── Report ────────────────────────────────────────────────────────────

/// Row accounting for one preprocessing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreprocessReport {
    /// Rows in the input table.
    pub input_rows: usize,
    /// Rows surviving elimination.
    pub retained_rows: usize,
    /// Rows whose date failed to parse.
    pub invalid_dates: usize,
    /// Rows whose casualty or vehicle count was non-numeric or missing.
    pub invalid_counts: usize,
    /// Surviving rows whose severity label matched none of the three codes.
    pub unmapped_severities: usize,
}

// ── Preprocessing ─────────────────────────────────────────────────────

/// Cleans the raw table and prints the descriptive summary.
///
/// Fails with [`TrendsError::MissingColumn`] if any of
/// [`REQUIRED_COLUMNS`] is absent. An input whose every row is
/// eliminated is reported with a warning, not an error; the empty
/// cleaned table is returned and downstream stages must tolerate it.
pub fn preprocess(df: &DataFrame) -> Result<(DataFrame, PreprocessReport), TrendsError> {
    for name in REQUIRED_COLUMNS {
        if df.column_index(name).is_none() {
            return Err(TrendsError::MissingColumn {
                name: name.to_string(),
            });
        }
    }

    let n_rows = df.row_count();

    // Step 1: parse dates (marking only; no rows removed yet)
    let (dates, date_validity) =
        parse_date_column(df.column_by_name(DATE_COLUMN).expect("presence checked"));

    // Step 2: coerce the two count columns
    let (casualties, cas_validity) =
        coerce_numeric_column(df.column_by_name(CASUALTIES_COLUMN).expect("presence checked"));
    let (vehicles, veh_validity) =
        coerce_numeric_column(df.column_by_name(VEHICLES_COLUMN).expect("presence checked"));

    // Step 3: the single elimination point
    let mut keep = vec![false; n_rows];
    let mut invalid_dates = 0;
    let mut invalid_counts = 0;
    for i in 0..n_rows {
        let date_ok = date_validity.is_valid(i);
        let counts_ok = cas_validity.is_valid(i) && veh_validity.is_valid(i);
        if !date_ok {
            invalid_dates += 1;
        }
        if !counts_ok {
            invalid_counts += 1;
        }
        keep[i] = date_ok && counts_ok;
    }

    let mut working = df.clone();
    working.replace_column(DATE_COLUMN, Column::date(dates, date_validity))?;
    working.replace_column(CASUALTIES_COLUMN, Column::numeric(casualties, cas_validity))?;
    working.replace_column(VEHICLES_COLUMN, Column::numeric(vehicles, veh_validity))?;
    let mut cleaned = working.filter_rows(&keep)?;

    // Step 4: ordinal severity over survivors only
    let severity = cleaned
        .column_by_name(SEVERITY_COLUMN)
        .expect("presence checked");
    let (codes, code_validity, unmapped_severities) = encode_severity(severity);
    let severity_num = Column::numeric(codes, code_validity);
    if cleaned.column_index(SEVERITY_NUM_COLUMN).is_some() {
        cleaned.replace_column(SEVERITY_NUM_COLUMN, severity_num)?;
    } else {
        cleaned.add_column(SEVERITY_NUM_COLUMN.to_string(), severity_num)?;
    }

    let report = PreprocessReport {
        input_rows: n_rows,
        retained_rows: cleaned.row_count(),
        invalid_dates,
        invalid_counts,
        unmapped_severities,
    };

    if report.retained_rows == 0 && report.input_rows > 0 {
        warn!("all {} rows eliminated during cleaning; empty table flows downstream", n_rows);
    }
    info!(
        input = report.input_rows,
        retained = report.retained_rows,
        invalid_dates = report.invalid_dates,
        invalid_counts = report.invalid_counts,
        "preprocessing finished"
    );

    // Step 5: observational summary
    println!("{}", summary(&cleaned));

    Ok((cleaned, report))
}

/// Parses a raw date column into dates plus a validity mask.
///
/// An already-parsed date column passes through unchanged, which makes
/// a second preprocessing run a no-op for dates.
fn parse_date_column(col: &Column) -> (Vec<NaiveDate>, ValidityBitmap) {
    if let Some(dates) = col.as_dates() {
        return (dates.to_vec(), col.validity().clone());
    }
    let n = col.len();
    let mut out = Vec::with_capacity(n);
    let mut validity = ValidityBitmap::empty();
    for i in 0..n {
        match col
            .str_at(i)
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok())
        {
            Some(d) => {
                out.push(d);
                validity.push(true);
            }
            None => {
                out.push(NaiveDate::default());
                validity.push(false);
            }
        }
    }
    (out, validity)
}

/// Coerces a column of numeric-like values to `f64` plus a validity mask.
///
/// Numeric columns pass through with their existing mask; string
/// columns are parsed per value, with failures marked missing.
fn coerce_numeric_column(col: &Column) -> (Vec<f64>, ValidityBitmap) {
    if let Some(values) = col.as_numeric() {
        return (values.to_vec(), col.validity().clone());
    }
    let n = col.len();
    let mut out = Vec::with_capacity(n);
    let mut validity = ValidityBitmap::empty();
    for i in 0..n {
        match col.str_at(i).and_then(|s| s.trim().parse::<f64>().ok()) {
            Some(v) => {
                out.push(v);
                validity.push(true);
            }
            None => {
                out.push(0.0);
                validity.push(false);
            }
        }
    }
    (out, validity)
}

/// Maps severity labels to the ordinal code.
///
/// Labels outside the three recognized values produce a missing code;
/// such rows stay in the table (filtering-by-omission is preserved).
fn encode_severity(col: &Column) -> (Vec<f64>, ValidityBitmap, usize) {
    let n = col.len();
    let mut codes = Vec::with_capacity(n);
    let mut validity = ValidityBitmap::empty();
    let mut unmapped = 0;
    for i in 0..n {
        let code = match col.str_at(i) {
            Some("Slight") => Some(1.0),
            Some("Serious") => Some(2.0),
            Some("Fatal") => Some(3.0),
            _ => None,
        };
        match code {
            Some(c) => {
                codes.push(c);
                validity.push(true);
            }
            None => {
                unmapped += 1;
                codes.push(0.0);
                validity.push(false);
            }
        }
    }
    (codes, validity, unmapped)
}

// ── Summary rendering ─────────────────────────────────────────────────

const DESCRIBE_ROWS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Renders the describe-style table and pairwise correlation matrix
/// over every numeric column.
pub fn summary(df: &DataFrame) -> String {
    let numeric: Vec<(&str, Vec<f64>)> = df
        .iter()
        .filter_map(|(name, col)| col.valid_numeric_values().map(|v| (name, v)))
        .collect();

    if numeric.is_empty() {
        return "(no numeric columns to summarize)".to_string();
    }

    let mut out = String::new();
    out.push_str(&describe_table(&numeric));
    out.push('\n');
    out.push_str(&correlation_table(df, &numeric));
    out
}

fn describe_table(numeric: &[(&str, Vec<f64>)]) -> String {
    let widths: Vec<usize> = numeric
        .iter()
        .map(|(name, _)| name.len().max(12) + 2)
        .collect();

    let mut out = String::new();
    out.push_str(&" ".repeat(6));
    for (i, (name, _)) in numeric.iter().enumerate() {
        let w = widths[i];
        out.push_str(&format!("{name:>w$}"));
    }
    out.push('\n');

    for label in DESCRIBE_ROWS {
        out.push_str(&format!("{label:<6}"));
        for (i, (_, values)) in numeric.iter().enumerate() {
            let w = widths[i];
            let cell = describe_cell(label, values);
            out.push_str(&format!("{cell:>w$}"));
        }
        out.push('\n');
    }
    out
}

fn describe_cell(label: &str, values: &[f64]) -> String {
    let v = match label {
        "count" => return format!("{}", values.len()),
        "mean" => stats::mean(values),
        "std" => stats::sample_std(values),
        "min" => stats::percentile(values, 0.0),
        "25%" => stats::percentile(values, 0.25),
        "50%" => stats::percentile(values, 0.5),
        "75%" => stats::percentile(values, 0.75),
        "max" => stats::percentile(values, 1.0),
        _ => None,
    };
    match v {
        Some(x) => format!("{x:.6}"),
        None => "NaN".to_string(),
    }
}

/// Pairwise Pearson correlation over valid-in-both rows, pandas-style.
fn correlation_table(df: &DataFrame, numeric: &[(&str, Vec<f64>)]) -> String {
    let names: Vec<&str> = numeric.iter().map(|(n, _)| *n).collect();
    let label_width = names.iter().map(|n| n.len()).max().unwrap_or(0);
    let widths: Vec<usize> = names.iter().map(|n| n.len().max(9) + 2).collect();

    let mut out = String::new();
    out.push_str(&" ".repeat(label_width));
    for (i, name) in names.iter().enumerate() {
        let w = widths[i];
        out.push_str(&format!("{name:>w$}"));
    }
    out.push('\n');

    for &row_name in &names {
        out.push_str(&format!("{row_name:<label_width$}"));
        for (i, &col_name) in names.iter().enumerate() {
            let w = widths[i];
            let cell = match pairwise_pearson(df, row_name, col_name) {
                Some(r) => format!("{r:.6}"),
                None => "NaN".to_string(),
            };
            out.push_str(&format!("{cell:>w$}"));
        }
        out.push('\n');
    }
    out
}

/// Pearson correlation between two numeric columns, restricted to rows
/// valid in both (pairwise deletion of missing values).
pub fn pairwise_pearson(df: &DataFrame, a: &str, b: &str) -> Option<f64> {
    let ca = df.column_by_name(a)?;
    let cb = df.column_by_name(b)?;
    let xa = ca.as_numeric()?;
    let xb = cb.as_numeric()?;
    let mut px = Vec::new();
    let mut py = Vec::new();
    for i in 0..xa.len().min(xb.len()) {
        if ca.is_valid(i) && cb.is_valid(i) {
            px.push(xa[i]);
            py.push(xb[i]);
        }
    }
    if a == b && px.len() >= 2 {
        // Diagonal is 1 by definition even under rounding
        return Some(1.0);
    }
    stats::pearson(&px, &py)
}

// ── Tests ─────────────────────────────────────────────────────────────
