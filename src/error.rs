//! Error types for accident-trends.

use std::fmt;

/// All errors produced by pipeline operations.
#[derive(Debug, Clone, PartialEq)]
pub enum TrendsError {
    /// CSV parsing failed.
    CsvParse { line: usize, message: String },
    /// A column the pipeline must consume is absent from the input.
    MissingColumn { name: String },
    /// The column requested for analysis is absent.
    ColumnNotFound { name: String },
    /// The column is not numeric where numeric data is required.
    NonNumericColumn { column: String },
    /// Too few valid values for the requested statistic.
    InsufficientData {
        column: String,
        min_required: usize,
        actual: usize,
    },
    /// Column lengths disagree.
    DimensionMismatch { expected: usize, actual: usize },
    /// I/O error while reading the input file.
    Io(String),
}

impl fmt::Display for TrendsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CsvParse { line, message } => {
                write!(f, "CSV parse error at line {line}: {message}")
            }
            Self::MissingColumn { name } => {
                write!(f, "required column '{name}' is missing from the input")
            }
            Self::ColumnNotFound { name } => {
                write!(f, "column '{name}' not found")
            }
            Self::NonNumericColumn { column } => {
                write!(f, "column '{column}' is not numeric")
            }
            Self::InsufficientData {
                column,
                min_required,
                actual,
            } => {
                write!(
                    f,
                    "column '{column}' needs at least {min_required} valid values, got {actual}"
                )
            }
            Self::DimensionMismatch { expected, actual } => {
                write!(f, "expected {expected} rows, got {actual}")
            }
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for TrendsError {}

impl From<std::io::Error> for TrendsError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
