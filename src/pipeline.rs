//! Fixed-order orchestration of the analysis run.
//!
//! ingest → preprocess → visualize → moments → interpretation, one pass
//! over one input file. Each stage hands a fresh table or value to the
//! next; nothing is shared or retained across stages.

use std::path::Path;

use tracing::info;

use crate::dataframe::DataFrame;
use crate::error::TrendsError;
use crate::ingest::CsvReader;
use crate::preprocess::{preprocess, CASUALTIES_COLUMN};
use crate::report::{interpret, Interpretation};
use crate::stats::compute_moments;
use crate::visualize::{visualize, Visualizer};

/// The attribute whose moments the run reports by default.
pub const ANALYSIS_COLUMN: &str = CASUALTIES_COLUMN;

/// Runs the whole pipeline against one CSV file.
///
/// Prints the preprocessing summary and the interpretation report to
/// stdout, in that order, and returns the interpretation. Any failure
/// aborts the run with an error naming the column involved.
pub fn run<P: AsRef<Path>>(
    path: P,
    column: &str,
    renderer: &mut dyn Visualizer,
) -> Result<Interpretation, TrendsError> {
    info!(path = %path.as_ref().display(), column, "starting analysis run");
    let raw = CsvReader::new().read_file(path)?;
    run_frame(&raw, column, renderer)
}

/// Runs every stage after ingestion against an already-loaded table.
pub fn run_frame(
    raw: &DataFrame,
    column: &str,
    renderer: &mut dyn Visualizer,
) -> Result<Interpretation, TrendsError> {
    let (cleaned, report) = preprocess(raw)?;
    info!(
        retained = report.retained_rows,
        dropped = report.input_rows - report.retained_rows,
        "table cleaned"
    );

    visualize(&cleaned, renderer)?;

    let moments = compute_moments(&cleaned, column)?;
    let interpretation = interpret(&moments, column);
    println!("{interpretation}");
    Ok(interpretation)
}

// ── Tests ─────────────────────────────────────────────────────────────
