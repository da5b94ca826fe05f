//! # accident-trends
//!
//! One-shot exploratory analysis of a road-accident dataset: ingest a
//! CSV, clean it, print descriptive statistics and a correlation
//! matrix, compute four moments for one attribute, and report a
//! qualitative interpretation. Plot rendering is an external
//! collaborator fed through the [`visualize::Visualizer`] seam.
//!
//! ## Modules
//!
//! - [`dataframe`] — column-major table (DataFrame, Column, ValidityBitmap)
//! - [`ingest`] — CSV reading with automatic type inference
//! - [`preprocess`] — date parsing, numeric coercion, row elimination, severity coding, printed summary
//! - [`stats`] — moments (mean, sample std, skewness g1, excess kurtosis g2) and numeric helpers
//! - [`report`] — qualitative interpretation of the moments
//! - [`visualize`] — plot datasets and the renderer seam
//! - [`pipeline`] — fixed-order orchestration
//! - [`error`] — error types
//!
//! ## Quick Start
//!
//! ```
//! use accident_trends::ingest::CsvReader;
//! use accident_trends::preprocess::preprocess;
//! use accident_trends::stats::compute_moments;
//!
//! let csv = "\
//! Accident Date,Accident_Severity,Number_of_Casualties,Number_of_Vehicles,Light_Conditions
//! 15-03-2021,Slight,1,1,Daylight
//! 16-03-2021,Serious,3,2,Darkness
//! ";
//! let raw = CsvReader::new().read_str(csv).unwrap();
//! let (cleaned, _report) = preprocess(&raw).unwrap();
//! let moments = compute_moments(&cleaned, "Number_of_Casualties").unwrap();
//! assert!((moments.mean - 2.0).abs() < 1e-12);
//! ```

pub mod dataframe;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod preprocess;
pub mod report;
pub mod stats;
pub mod visualize;
