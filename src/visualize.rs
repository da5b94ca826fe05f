//! Plot datasets and the external-renderer seam.
//!
//! Rendering is an external collaborator; this crate only derives the
//! three datasets the plots consume and hands them to an injected
//! [`Visualizer`]:
//!
//! - [`MonthlySeries`] — accident counts per calendar year-month, for
//!   the time-series line plot (`relational_plot.png`);
//! - [`CorrelationGrid`] — the pairwise Pearson matrix over casualty,
//!   vehicle, and severity columns, for the annotated heatmap
//!   (`statistical_plot.png`);
//! - [`CategoryCounts`] — row counts per `Light_Conditions` label, for
//!   the bar plot (`categorical_plot.png`).
//!
//! [`NullVisualizer`] satisfies the trait for headless runs.

use std::collections::HashMap;

use chrono::Datelike;
use tracing::debug;

use crate::dataframe::DataFrame;
use crate::error::TrendsError;
use crate::preprocess::{
    pairwise_pearson, CASUALTIES_COLUMN, DATE_COLUMN, LIGHT_COLUMN, SEVERITY_NUM_COLUMN,
    VEHICLES_COLUMN,
};

/// Artifact name for the time-series plot.
pub const RELATIONAL_PLOT: &str = "relational_plot.png";
/// Artifact name for the correlation heatmap.
pub const STATISTICAL_PLOT: &str = "statistical_plot.png";
/// Artifact name for the categorical bar plot.
pub const CATEGORICAL_PLOT: &str = "categorical_plot.png";

// ── Plot datasets ─────────────────────────────────────────────────────

/// Accident count for one calendar year-month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
    pub count: usize,
}

impl MonthBucket {
    /// Axis label in `YYYY-MM` form.
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// Accident counts grouped by year-month, sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MonthlySeries {
    pub buckets: Vec<MonthBucket>,
}

/// Row counts per category label, in first-appearance order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryCounts {
    pub column: String,
    pub counts: Vec<(String, usize)>,
}

/// Pairwise Pearson matrix over the heatmap columns.
///
/// `values[i][j]` is the correlation between `names[i]` and `names[j]`;
/// `NaN` where the coefficient is undefined (too few pairs or zero
/// variance).
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationGrid {
    pub names: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

// ── Dataset derivation ────────────────────────────────────────────────

/// Groups valid accident dates by calendar year-month.
pub fn monthly_counts(df: &DataFrame) -> Result<MonthlySeries, TrendsError> {
    let col = df
        .column_by_name(DATE_COLUMN)
        .ok_or_else(|| TrendsError::ColumnNotFound {
            name: DATE_COLUMN.to_string(),
        })?;
    let mut by_month: HashMap<(i32, u32), usize> = HashMap::new();
    for i in 0..col.len() {
        if let Some(d) = col.date_at(i) {
            *by_month.entry((d.year(), d.month())).or_insert(0) += 1;
        }
    }
    let mut buckets: Vec<MonthBucket> = by_month
        .into_iter()
        .map(|((year, month), count)| MonthBucket { year, month, count })
        .collect();
    buckets.sort_by_key(|b| (b.year, b.month));
    Ok(MonthlySeries { buckets })
}

/// Counts rows per `Light_Conditions` label, preserving first-appearance
/// order.
pub fn light_condition_counts(df: &DataFrame) -> Result<CategoryCounts, TrendsError> {
    let col = df
        .column_by_name(LIGHT_COLUMN)
        .ok_or_else(|| TrendsError::ColumnNotFound {
            name: LIGHT_COLUMN.to_string(),
        })?;
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for i in 0..col.len() {
        if let Some(label) = col.str_at(i) {
            if !counts.contains_key(label) {
                order.push(label.to_string());
            }
            *counts.entry(label.to_string()).or_insert(0) += 1;
        }
    }
    Ok(CategoryCounts {
        column: LIGHT_COLUMN.to_string(),
        counts: order
            .into_iter()
            .map(|label| {
                let c = counts[&label];
                (label, c)
            })
            .collect(),
    })
}

/// Builds the heatmap grid over casualty, vehicle, and severity columns.
pub fn correlation_grid(df: &DataFrame) -> Result<CorrelationGrid, TrendsError> {
    let names = [CASUALTIES_COLUMN, VEHICLES_COLUMN, SEVERITY_NUM_COLUMN];
    for name in names {
        if df.column_index(name).is_none() {
            return Err(TrendsError::ColumnNotFound {
                name: name.to_string(),
            });
        }
    }
    let values: Vec<Vec<f64>> = names
        .iter()
        .map(|&a| {
            names
                .iter()
                .map(|&b| pairwise_pearson(df, a, b).unwrap_or(f64::NAN))
                .collect()
        })
        .collect();
    Ok(CorrelationGrid {
        names: names.iter().map(|s| s.to_string()).collect(),
        values,
    })
}

// ── Renderer seam ─────────────────────────────────────────────────────

/// External renderer contract. Implementations write the three image
/// artifacts; the pipeline only derives and hands over their datasets.
pub trait Visualizer {
    /// Consumes the time-series dataset for [`RELATIONAL_PLOT`].
    fn relational_plot(&mut self, series: &MonthlySeries) -> Result<(), TrendsError>;

    /// Consumes the heatmap dataset for [`STATISTICAL_PLOT`].
    fn statistical_plot(&mut self, grid: &CorrelationGrid) -> Result<(), TrendsError>;

    /// Consumes the bar-plot dataset for [`CATEGORICAL_PLOT`].
    fn categorical_plot(&mut self, counts: &CategoryCounts) -> Result<(), TrendsError>;
}

/// Renderer that discards every dataset; used for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullVisualizer;

impl Visualizer for NullVisualizer {
    fn relational_plot(&mut self, series: &MonthlySeries) -> Result<(), TrendsError> {
        debug!(months = series.buckets.len(), "discarding relational plot data");
        Ok(())
    }

    fn statistical_plot(&mut self, grid: &CorrelationGrid) -> Result<(), TrendsError> {
        debug!(columns = grid.names.len(), "discarding statistical plot data");
        Ok(())
    }

    fn categorical_plot(&mut self, counts: &CategoryCounts) -> Result<(), TrendsError> {
        debug!(labels = counts.counts.len(), "discarding categorical plot data");
        Ok(())
    }
}

/// Derives all three datasets from the cleaned table and hands them to
/// the renderer, in the fixed order relational → statistical →
/// categorical.
pub fn visualize(df: &DataFrame, renderer: &mut dyn Visualizer) -> Result<(), TrendsError> {
    renderer.relational_plot(&monthly_counts(df)?)?;
    renderer.statistical_plot(&correlation_grid(df)?)?;
    renderer.categorical_plot(&light_condition_counts(df)?)?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────
