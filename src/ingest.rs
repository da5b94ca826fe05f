//! CSV ingestion with automatic type inference.
//!
//! Reads the accident-records file into a [`DataFrame`](crate::dataframe::DataFrame)
//! with column types inferred from content. Inference priority is
//! Numeric → Categorical → Text. Dates are deliberately *not* inferred
//! here: the raw `Accident Date` column arrives as text and is parsed by
//! preprocessing, which owns the row-elimination decision.
//!
//! # Features
//!
//! - RFC 4180 quoting (quoted fields, escaped quotes, embedded commas)
//! - Standard null markers recognized: empty, `NA`, `N/A`, `null`, `NULL`, `None`, `.`
//! - Low-cardinality strings are dictionary-encoded as Categorical
//! - Configurable delimiter and null markers
//!
//! # Example
//!
//! ```
//! use accident_trends::ingest::CsvReader;
//! use accident_trends::dataframe::DataType;
//!
//! let csv = "Accident Date,Number_of_Casualties\n15-03-2021,2\n16-03-2021,1\n";
//! let df = CsvReader::new().read_str(csv).unwrap();
//! assert_eq!(df.row_count(), 2);
//! let schema = df.schema();
//! assert_eq!(schema[0].1, DataType::Text);
//! assert_eq!(schema[1].1, DataType::Numeric);
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::debug;

use crate::dataframe::{Column, DataFrame, DataType, ValidityBitmap};
use crate::error::TrendsError;

/// Field values treated as missing during parsing.
const DEFAULT_NULL_MARKERS: &[&str] = &[
    "", "NA", "N/A", "na", "n/a", "null", "NULL", "None", "none", ".",
    "NaN", "nan", "NAN", "#N/A", "#NA",
];

/// Maximum unique-value ratio for a column to be dictionary-encoded as
/// Categorical instead of stored as Text.
const CATEGORICAL_THRESHOLD: f64 = 0.5;

/// Maximum dictionary size for categorical columns.
const MAX_CATEGORICAL_UNIQUE: usize = 1000;

/// CSV reader configuration and entry point.
///
/// ```
/// use accident_trends::ingest::CsvReader;
///
/// let csv = "a,b\n1,2\n3,4\n";
/// let df = CsvReader::new().read_str(csv).unwrap();
/// assert_eq!(df.row_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct CsvReader {
    delimiter: u8,
    has_header: bool,
    null_markers: Vec<String>,
}

impl CsvReader {
    /// Creates a reader with default settings (comma delimiter, header row,
    /// standard null markers).
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            null_markers: DEFAULT_NULL_MARKERS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    /// Sets the field delimiter (default: comma).
    pub fn delimiter(mut self, delim: u8) -> Self {
        self.delimiter = delim;
        self
    }

    /// Sets whether the first row is a header (default: true).
    pub fn has_header(mut self, header: bool) -> Self {
        self.has_header = header;
        self
    }

    /// Sets custom null markers (replaces defaults).
    pub fn null_markers(mut self, markers: Vec<String>) -> Self {
        self.null_markers = markers;
        self
    }

    /// Reads a CSV file from disk into a DataFrame.
    pub fn read_file<P: AsRef<Path>>(&self, path: P) -> Result<DataFrame, TrendsError> {
        let content = std::fs::read_to_string(path)?;
        self.read_str(&content)
    }

    /// Parses a CSV string into a DataFrame.
    pub fn read_str(&self, input: &str) -> Result<DataFrame, TrendsError> {
        // Strip BOM if present
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);

        let raw_rows = self.split_rows(input)?;
        if raw_rows.is_empty() {
            return Ok(DataFrame::new());
        }

        let (headers, data_rows) = if self.has_header {
            let headers: Vec<String> = raw_rows[0].clone();
            (headers, &raw_rows[1..])
        } else {
            let n_cols = raw_rows[0].len();
            let headers: Vec<String> = (0..n_cols).map(|i| format!("col_{i}")).collect();
            (headers, &raw_rows[..])
        };

        if data_rows.is_empty() {
            return Ok(DataFrame::new());
        }

        let n_cols = headers.len();
        let n_rows = data_rows.len();

        // Transpose to column-major raw strings
        let mut raw_columns: Vec<Vec<String>> = vec![Vec::with_capacity(n_rows); n_cols];
        for (line_idx, row) in data_rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(TrendsError::CsvParse {
                    line: if self.has_header {
                        line_idx + 2
                    } else {
                        line_idx + 1
                    },
                    message: format!("expected {n_cols} fields, got {}", row.len()),
                });
            }
            for (col_idx, field) in row.iter().enumerate() {
                raw_columns[col_idx].push(field.clone());
            }
        }

        let mut df = DataFrame::new();
        for (col_idx, raw_col) in raw_columns.iter().enumerate() {
            let col = self.build_column(raw_col);
            df.add_column(headers[col_idx].clone(), col)
                .expect("all columns same length");
        }

        debug!(rows = df.row_count(), columns = df.column_count(), "ingested table");
        Ok(df)
    }

    // ── Internal parsing ─────────────────────────────────────────

    /// Splits raw CSV text into rows of string fields, honoring quotes.
    fn split_rows(&self, input: &str) -> Result<Vec<Vec<String>>, TrendsError> {
        let delim = self.delimiter as char;
        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut current_row: Vec<String> = Vec::new();
        let mut current_field = String::new();
        let mut in_quotes = false;
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            if in_quotes {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        // Escaped quote ""
                        chars.next();
                        current_field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    current_field.push(c);
                }
            } else if c == '"' && current_field.is_empty() {
                in_quotes = true;
            } else if c == delim {
                current_row.push(std::mem::take(&mut current_field));
            } else if c == '\n' {
                // Handle \r\n: strip trailing \r from field
                if current_field.ends_with('\r') {
                    current_field.truncate(current_field.len() - 1);
                }
                current_row.push(std::mem::take(&mut current_field));
                if !current_row.iter().all(|f| f.is_empty()) || !rows.is_empty() {
                    rows.push(std::mem::take(&mut current_row));
                } else {
                    current_row.clear();
                }
            } else if c == '\r' {
                // Standalone \r (old Mac style) ends the row; \r\n is
                // handled by the \n branch above
                if chars.peek() != Some(&'\n') {
                    current_row.push(std::mem::take(&mut current_field));
                    if !current_row.iter().all(|f| f.is_empty()) || !rows.is_empty() {
                        rows.push(std::mem::take(&mut current_row));
                    } else {
                        current_row.clear();
                    }
                }
            } else {
                current_field.push(c);
            }
        }

        // Last field/row without trailing newline
        if !current_field.is_empty() || !current_row.is_empty() {
            current_row.push(current_field);
            rows.push(current_row);
        }

        while rows.last().is_some_and(|r| r.iter().all(|f| f.is_empty())) {
            rows.pop();
        }

        Ok(rows)
    }

    /// Checks if a trimmed value is a null marker.
    fn is_null(&self, value: &str) -> bool {
        let trimmed = value.trim();
        self.null_markers.iter().any(|m| m == trimmed)
    }

    /// Infers the column type and builds a typed Column.
    fn build_column(&self, raw_values: &[String]) -> Column {
        let n = raw_values.len();
        let trimmed: Vec<&str> = raw_values.iter().map(|s| s.trim()).collect();
        let null_flags: Vec<bool> = trimmed.iter().map(|s| self.is_null(s)).collect();

        let non_null_count = null_flags.iter().filter(|&&is_null| !is_null).count();
        if non_null_count == 0 {
            // All null: default to numeric
            return Column::numeric(vec![0.0; n], ValidityBitmap::all_invalid(n));
        }

        match self.infer_type(&trimmed, &null_flags) {
            DataType::Numeric => build_numeric_column(&trimmed, &null_flags),
            DataType::Categorical => build_categorical_column(&trimmed, &null_flags),
            _ => build_text_column(&trimmed, &null_flags),
        }
    }

    /// Determines the most specific type that fits all non-null values.
    fn infer_type(&self, values: &[&str], null_flags: &[bool]) -> DataType {
        let non_null: Vec<&str> = values
            .iter()
            .zip(null_flags.iter())
            .filter(|(_, &is_null)| !is_null)
            .map(|(&v, _)| v)
            .collect();

        if non_null.iter().all(|s| s.parse::<f64>().is_ok()) {
            return DataType::Numeric;
        }

        let unique: HashSet<&str> = non_null.iter().copied().collect();
        let ratio = unique.len() as f64 / non_null.len() as f64;
        if ratio < CATEGORICAL_THRESHOLD && unique.len() <= MAX_CATEGORICAL_UNIQUE {
            DataType::Categorical
        } else {
            DataType::Text
        }
    }
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::new()
    }
}

// ── Column builders ───────────────────────────────────────────────────

fn build_numeric_column(values: &[&str], null_flags: &[bool]) -> Column {
    let mut nums = Vec::with_capacity(values.len());
    let mut validity = ValidityBitmap::empty();

    for (i, &val) in values.iter().enumerate() {
        if null_flags[i] {
            nums.push(0.0);
            validity.push(false);
        } else {
            nums.push(val.parse::<f64>().unwrap_or(0.0));
            validity.push(true);
        }
    }

    Column::numeric(nums, validity)
}

fn build_categorical_column(values: &[&str], null_flags: &[bool]) -> Column {
    let mut dict_map: HashMap<String, u32> = HashMap::new();
    let mut dictionary: Vec<String> = Vec::new();
    let mut indices = Vec::with_capacity(values.len());
    let mut validity = ValidityBitmap::empty();

    for (i, &val) in values.iter().enumerate() {
        if null_flags[i] {
            indices.push(0);
            validity.push(false);
        } else {
            let idx = if let Some(&existing) = dict_map.get(val) {
                existing
            } else {
                let idx = dictionary.len() as u32;
                dictionary.push(val.to_string());
                dict_map.insert(val.to_string(), idx);
                idx
            };
            indices.push(idx);
            validity.push(true);
        }
    }

    Column::categorical(dictionary, indices, validity)
}

fn build_text_column(values: &[&str], null_flags: &[bool]) -> Column {
    let mut texts = Vec::with_capacity(values.len());
    let mut validity = ValidityBitmap::empty();

    for (i, &val) in values.iter().enumerate() {
        if null_flags[i] {
            texts.push(String::new());
            validity.push(false);
        } else {
            texts.push(val.to_string());
            validity.push(true);
        }
    }

    Column::text(texts, validity)
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_parse_and_types() {
        let csv = "Accident Date,Number_of_Casualties,Accident_Severity\n\
                   15-03-2021,2,Slight\n\
                   16-03-2021,1,Slight\n\
                   17-03-2021,4,Fatal\n\
                   18-03-2021,1,Slight\n\
                   19-03-2021,2,Slight\n";
        let df = CsvReader::new().read_str(csv).unwrap();
        assert_eq!(df.row_count(), 5);
        assert_eq!(df.column_count(), 3);
        let schema = df.schema();
        // Dates are not inferred; they stay textual until preprocessing
        assert_eq!(schema[0].1, DataType::Text);
        assert_eq!(schema[1].1, DataType::Numeric);
        // Two distinct labels over five rows is low-cardinality
        assert_eq!(schema[2].1, DataType::Categorical);
    }

    #[test]
    fn null_markers_become_missing() {
        let csv = "x\n1\nNA\n3\n";
        let df = CsvReader::new().read_str(csv).unwrap();
        let col = df.column_by_name("x").unwrap();
        assert_eq!(col.null_count(), 1);
        assert_eq!(col.valid_numeric_values().unwrap(), vec![1.0, 3.0]);
    }

    #[test]
    fn quoted_fields_with_commas() {
        let csv = "label,n\n\"Darkness - lights lit\",2\n\"say \"\"hi\"\"\",3\n";
        let df = CsvReader::new().read_str(csv).unwrap();
        assert_eq!(df.row_count(), 2);
        let col = df.column_by_name("label").unwrap();
        assert_eq!(col.str_at(0), Some("Darkness - lights lit"));
        assert_eq!(col.str_at(1), Some("say \"hi\""));
    }

    #[test]
    fn crlf_line_endings() {
        let csv = "a,b\r\n1,2\r\n3,4\r\n";
        let df = CsvReader::new().read_str(csv).unwrap();
        assert_eq!(df.row_count(), 2);
        assert_eq!(
            df.column_by_name("b").unwrap().valid_numeric_values().unwrap(),
            vec![2.0, 4.0]
        );
    }

    #[test]
    fn ragged_row_rejected() {
        let csv = "a,b\n1,2\n3\n";
        let err = CsvReader::new().read_str(csv).unwrap_err();
        match err {
            TrendsError::CsvParse { line, .. } => assert_eq!(line, 3),
            other => panic!("expected CsvParse, got {other:?}"),
        }
    }

    #[test]
    fn bom_stripped() {
        let csv = "\u{feff}a\n1\n";
        let df = CsvReader::new().read_str(csv).unwrap();
        assert!(df.column_by_name("a").is_some());
    }

    #[test]
    fn custom_delimiter() {
        let csv = "a;b\n1;2\n";
        let df = CsvReader::new().delimiter(b';').read_str(csv).unwrap();
        assert_eq!(df.column_count(), 2);
    }

    #[test]
    fn headerless_input() {
        let csv = "1,2\n3,4\n";
        let df = CsvReader::new().has_header(false).read_str(csv).unwrap();
        assert!(df.column_by_name("col_0").is_some());
        assert_eq!(df.row_count(), 2);
    }

    #[test]
    fn empty_input_gives_empty_frame() {
        let df = CsvReader::new().read_str("").unwrap();
        assert_eq!(df.row_count(), 0);
        assert_eq!(df.column_count(), 0);
    }

    #[test]
    fn mixed_numeric_text_column_is_not_numeric() {
        // One stray non-numeric value forces the whole column textual,
        // leaving coercion to preprocessing
        let csv = "n\n1\ntwo\n3\n4\n5\n6\n7\n8\n";
        let df = CsvReader::new().read_str(csv).unwrap();
        let col = df.column_by_name("n").unwrap();
        assert_ne!(col.data_type(), DataType::Numeric);
        assert_eq!(col.str_at(1), Some("two"));
    }
}
