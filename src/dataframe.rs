//! Column-major table for accident records.
//!
//! The [`DataFrame`] stores data in column-major order with typed columns
//! and a compact validity bitmap for tracking missing values. Missing
//! values are always represented by a cleared validity bit, never by a
//! numeric sentinel, so an unset `Severity_Num` can flow through later
//! stages without being mistaken for data.
//!
//! # Column Types
//!
//! | Type | Storage | Use case |
//! |------|---------|----------|
//! | [`Numeric`](Column::Numeric) | `Vec<f64>` + bitmap | Casualty/vehicle counts, severity codes |
//! | [`Date`](Column::Date) | `Vec<NaiveDate>` + bitmap | Parsed accident dates |
//! | [`Categorical`](Column::Categorical) | Dictionary + `Vec<u32>` | Severity labels, light conditions |
//! | [`Text`](Column::Text) | `Vec<String>` + bitmap | Unparsed dates, free-form fields |
//!
//! # Example
//!
//! ```
//! use accident_trends::dataframe::{DataFrame, Column, ValidityBitmap};
//!
//! let mut df = DataFrame::new();
//! df.add_column(
//!     "Number_of_Casualties".to_string(),
//!     Column::numeric(vec![2.0, 1.0, 3.0], ValidityBitmap::all_valid(3)),
//! ).unwrap();
//! assert_eq!(df.row_count(), 3);
//! assert_eq!(df.column_count(), 1);
//! ```

use chrono::NaiveDate;

use crate::error::TrendsError;

// ── ValidityBitmap ────────────────────────────────────────────────────

/// Bit-packed validity bitmap using `Vec<u64>`.
///
/// Each bit records whether the corresponding row holds a value (1) or
/// is missing (0). One bit per row instead of one byte.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidityBitmap {
    bits: Vec<u64>,
    len: usize,
}

impl ValidityBitmap {
    /// Creates a bitmap where all `len` positions are valid.
    pub fn all_valid(len: usize) -> Self {
        let n_words = len.div_ceil(64);
        let mut bits = vec![u64::MAX; n_words];
        let trailing = len % 64;
        if trailing != 0 && n_words > 0 {
            bits[n_words - 1] = (1u64 << trailing) - 1;
        }
        Self { bits, len }
    }

    /// Creates a bitmap where all `len` positions are missing.
    pub fn all_invalid(len: usize) -> Self {
        let n_words = len.div_ceil(64);
        Self {
            bits: vec![0u64; n_words],
            len,
        }
    }

    /// Creates an empty bitmap tracking no rows.
    pub fn empty() -> Self {
        Self {
            bits: Vec::new(),
            len: 0,
        }
    }

    /// Returns `true` if the value at `idx` is present (not missing).
    #[inline]
    pub fn is_valid(&self, idx: usize) -> bool {
        debug_assert!(idx < self.len, "index {idx} out of bounds (len={})", self.len);
        let (word, bit) = (idx / 64, idx % 64);
        (self.bits[word] >> bit) & 1 == 1
    }

    /// Appends a new position (valid or missing).
    pub fn push(&mut self, valid: bool) {
        let idx = self.len;
        self.len += 1;
        let word = idx / 64;
        if word >= self.bits.len() {
            self.bits.push(0);
        }
        if valid {
            self.bits[word] |= 1u64 << (idx % 64);
        }
    }

    /// Returns the total number of tracked positions.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the bitmap tracks zero positions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Counts missing positions.
    pub fn null_count(&self) -> usize {
        let valid: usize = self.bits.iter().map(|w| w.count_ones() as usize).sum();
        self.len - valid
    }

    /// Counts present positions.
    pub fn valid_count(&self) -> usize {
        self.len - self.null_count()
    }

    /// Returns an iterator over indices of present positions.
    pub fn valid_indices(&self) -> ValidIndicesIter<'_> {
        ValidIndicesIter {
            bitmap: self,
            current: 0,
        }
    }
}

/// Iterator over valid indices in a [`ValidityBitmap`].
pub struct ValidIndicesIter<'a> {
    bitmap: &'a ValidityBitmap,
    current: usize,
}

impl<'a> Iterator for ValidIndicesIter<'a> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.current < self.bitmap.len {
            let idx = self.current;
            self.current += 1;
            if self.bitmap.is_valid(idx) {
                return Some(idx);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.bitmap.len - self.current))
    }
}

// ── DataType ──────────────────────────────────────────────────────────

/// Semantic data type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// Continuous or integer numeric values (stored as `f64`).
    Numeric,
    /// Calendar dates (produced by preprocessing, never inferred at ingest).
    Date,
    /// Low-cardinality strings (dictionary-encoded).
    Categorical,
    /// High-cardinality or free-form text.
    Text,
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric => write!(f, "Numeric"),
            Self::Date => write!(f, "Date"),
            Self::Categorical => write!(f, "Categorical"),
            Self::Text => write!(f, "Text"),
        }
    }
}

// ── Column ────────────────────────────────────────────────────────────

/// A typed column with a validity bitmap for missing values.
///
/// All variants store values densely alongside a [`ValidityBitmap`].
/// Missing positions hold a placeholder value (0.0, the epoch date,
/// index 0, or an empty string) that must be ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Dense `f64` values. Missing positions hold `0.0`.
    Numeric {
        values: Vec<f64>,
        validity: ValidityBitmap,
    },
    /// Calendar dates. Missing positions hold `NaiveDate::default()`.
    Date {
        values: Vec<NaiveDate>,
        validity: ValidityBitmap,
    },
    /// Dictionary-encoded categorical column.
    ///
    /// `dictionary` holds the unique labels; `indices` maps each row to
    /// a dictionary slot. Missing positions carry index `0` and a
    /// cleared validity bit.
    Categorical {
        dictionary: Vec<String>,
        indices: Vec<u32>,
        validity: ValidityBitmap,
    },
    /// Free-form text column. Missing positions hold an empty string.
    Text {
        values: Vec<String>,
        validity: ValidityBitmap,
    },
}

impl Column {
    /// Creates a numeric column.
    pub fn numeric(values: Vec<f64>, validity: ValidityBitmap) -> Self {
        Self::Numeric { values, validity }
    }

    /// Creates a date column.
    pub fn date(values: Vec<NaiveDate>, validity: ValidityBitmap) -> Self {
        Self::Date { values, validity }
    }

    /// Creates a categorical column from a dictionary and indices.
    pub fn categorical(
        dictionary: Vec<String>,
        indices: Vec<u32>,
        validity: ValidityBitmap,
    ) -> Self {
        Self::Categorical {
            dictionary,
            indices,
            validity,
        }
    }

    /// Creates a text column.
    pub fn text(values: Vec<String>, validity: ValidityBitmap) -> Self {
        Self::Text { values, validity }
    }

    /// Returns the data type of this column.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Numeric { .. } => DataType::Numeric,
            Self::Date { .. } => DataType::Date,
            Self::Categorical { .. } => DataType::Categorical,
            Self::Text { .. } => DataType::Text,
        }
    }

    /// Returns the number of rows in this column.
    pub fn len(&self) -> usize {
        self.validity().len()
    }

    /// Returns `true` if the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a reference to the validity bitmap.
    pub fn validity(&self) -> &ValidityBitmap {
        match self {
            Self::Numeric { validity, .. }
            | Self::Date { validity, .. }
            | Self::Categorical { validity, .. }
            | Self::Text { validity, .. } => validity,
        }
    }

    /// Returns the number of missing values.
    pub fn null_count(&self) -> usize {
        self.validity().null_count()
    }

    /// Returns the number of present values.
    pub fn valid_count(&self) -> usize {
        self.validity().valid_count()
    }

    /// Returns `true` if the value at `idx` is present.
    pub fn is_valid(&self, idx: usize) -> bool {
        self.validity().is_valid(idx)
    }

    /// Returns the numeric values, or `None` if not a numeric column.
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Self::Numeric { values, .. } => Some(values),
            _ => None,
        }
    }

    /// Returns the dates, or `None` if not a date column.
    pub fn as_dates(&self) -> Option<&[NaiveDate]> {
        match self {
            Self::Date { values, .. } => Some(values),
            _ => None,
        }
    }

    /// Returns present numeric values (missing positions excluded).
    pub fn valid_numeric_values(&self) -> Option<Vec<f64>> {
        match self {
            Self::Numeric { values, validity } => {
                Some(validity.valid_indices().map(|i| values[i]).collect())
            }
            _ => None,
        }
    }

    /// Returns the string value at `idx` for categorical or text columns.
    ///
    /// Returns `None` for missing positions and for non-string columns.
    pub fn str_at(&self, idx: usize) -> Option<&str> {
        match self {
            Self::Categorical {
                dictionary,
                indices,
                validity,
            } => {
                if validity.is_valid(idx) {
                    dictionary.get(indices[idx] as usize).map(|s| s.as_str())
                } else {
                    None
                }
            }
            Self::Text { values, validity } => {
                if validity.is_valid(idx) {
                    Some(&values[idx])
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Returns the date at `idx`, or `None` if missing or not a date column.
    pub fn date_at(&self, idx: usize) -> Option<NaiveDate> {
        match self {
            Self::Date { values, validity } => {
                if validity.is_valid(idx) {
                    Some(values[idx])
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Returns a copy of this column keeping only rows where `keep[i]` is true.
    pub fn filter(&self, keep: &[bool]) -> Column {
        match self {
            Self::Numeric { values, validity } => {
                let mut out = Vec::new();
                let mut v = ValidityBitmap::empty();
                for (i, &k) in keep.iter().enumerate() {
                    if k {
                        out.push(values[i]);
                        v.push(validity.is_valid(i));
                    }
                }
                Self::Numeric {
                    values: out,
                    validity: v,
                }
            }
            Self::Date { values, validity } => {
                let mut out = Vec::new();
                let mut v = ValidityBitmap::empty();
                for (i, &k) in keep.iter().enumerate() {
                    if k {
                        out.push(values[i]);
                        v.push(validity.is_valid(i));
                    }
                }
                Self::Date {
                    values: out,
                    validity: v,
                }
            }
            Self::Categorical {
                dictionary,
                indices,
                validity,
            } => {
                let mut out = Vec::new();
                let mut v = ValidityBitmap::empty();
                for (i, &k) in keep.iter().enumerate() {
                    if k {
                        out.push(indices[i]);
                        v.push(validity.is_valid(i));
                    }
                }
                Self::Categorical {
                    dictionary: dictionary.clone(),
                    indices: out,
                    validity: v,
                }
            }
            Self::Text { values, validity } => {
                let mut out = Vec::new();
                let mut v = ValidityBitmap::empty();
                for (i, &k) in keep.iter().enumerate() {
                    if k {
                        out.push(values[i].clone());
                        v.push(validity.is_valid(i));
                    }
                }
                Self::Text {
                    values: out,
                    validity: v,
                }
            }
        }
    }
}

// ── DataFrame ─────────────────────────────────────────────────────────

/// Column-major tabular data structure.
///
/// Named, typed columns of equal length. Produced by ingestion and
/// transformed (never mutated in place) by preprocessing: each stage
/// hands a new table to the next.
#[derive(Debug, Clone)]
pub struct DataFrame {
    names: Vec<String>,
    columns: Vec<Column>,
    row_count: usize,
}

impl DataFrame {
    /// Creates an empty DataFrame with no columns or rows.
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            columns: Vec::new(),
            row_count: 0,
        }
    }

    /// Adds a named column.
    ///
    /// Fails with [`TrendsError::DimensionMismatch`] if the column length
    /// disagrees with the existing row count (first column sets it).
    pub fn add_column(&mut self, name: String, column: Column) -> Result<(), TrendsError> {
        let col_len = column.len();
        if self.columns.is_empty() {
            self.row_count = col_len;
        } else if col_len != self.row_count {
            return Err(TrendsError::DimensionMismatch {
                expected: self.row_count,
                actual: col_len,
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Replaces the column named `name`, keeping its position.
    ///
    /// Fails with [`TrendsError::ColumnNotFound`] if absent, or
    /// [`TrendsError::DimensionMismatch`] on a length change.
    pub fn replace_column(&mut self, name: &str, column: Column) -> Result<(), TrendsError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| TrendsError::ColumnNotFound {
                name: name.to_string(),
            })?;
        if column.len() != self.row_count {
            return Err(TrendsError::DimensionMismatch {
                expected: self.row_count,
                actual: column.len(),
            });
        }
        self.columns[idx] = column;
        Ok(())
    }

    /// Returns the number of rows.
    #[inline]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Returns the number of columns.
    #[inline]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the DataFrame has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns column names.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Returns a reference to the column at `index`.
    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Returns a reference to the column with the given `name`.
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.column_index(name).map(|i| &self.columns[i])
    }

    /// Returns the index of the column with the given `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Returns an iterator over (name, column) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(|s| s.as_str()).zip(self.columns.iter())
    }

    /// Returns a summary of column data types.
    pub fn schema(&self) -> Vec<(&str, DataType)> {
        self.names
            .iter()
            .zip(self.columns.iter())
            .map(|(name, col)| (name.as_str(), col.data_type()))
            .collect()
    }

    /// Returns a new DataFrame keeping only rows where `keep[i]` is true.
    ///
    /// The mask length must equal the row count.
    pub fn filter_rows(&self, keep: &[bool]) -> Result<DataFrame, TrendsError> {
        if keep.len() != self.row_count {
            return Err(TrendsError::DimensionMismatch {
                expected: self.row_count,
                actual: keep.len(),
            });
        }
        let mut out = DataFrame::new();
        for (name, col) in self.iter() {
            out.add_column(name.to_string(), col.filter(keep))?;
        }
        Ok(out)
    }
}

impl Default for DataFrame {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── ValidityBitmap ───────────────────────────────────────────

    #[test]
    fn bitmap_all_valid() {
        let b = ValidityBitmap::all_valid(100);
        assert_eq!(b.len(), 100);
        assert_eq!(b.null_count(), 0);
        assert!(b.is_valid(0));
        assert!(b.is_valid(99));
    }

    #[test]
    fn bitmap_all_invalid() {
        let b = ValidityBitmap::all_invalid(70);
        assert_eq!(b.null_count(), 70);
        assert_eq!(b.valid_count(), 0);
    }

    #[test]
    fn bitmap_push_and_iterate() {
        let mut b = ValidityBitmap::empty();
        b.push(true);
        b.push(false);
        b.push(true);
        let idxs: Vec<usize> = b.valid_indices().collect();
        assert_eq!(idxs, vec![0, 2]);
        assert_eq!(b.null_count(), 1);
    }

    #[test]
    fn bitmap_word_boundary() {
        // 65 positions crosses the first u64 word
        let mut b = ValidityBitmap::empty();
        for i in 0..65 {
            b.push(i % 2 == 0);
        }
        assert_eq!(b.valid_count(), 33);
        assert!(b.is_valid(64));
        assert!(!b.is_valid(63));
    }

    // ── Column ───────────────────────────────────────────────────

    #[test]
    fn numeric_column_valid_values() {
        let mut v = ValidityBitmap::empty();
        v.push(true);
        v.push(false);
        v.push(true);
        let col = Column::numeric(vec![1.0, 0.0, 3.0], v);
        assert_eq!(col.valid_numeric_values().unwrap(), vec![1.0, 3.0]);
        assert_eq!(col.null_count(), 1);
    }

    #[test]
    fn date_column_access() {
        let mut v = ValidityBitmap::empty();
        v.push(true);
        v.push(false);
        let col = Column::date(vec![date(2021, 3, 15), NaiveDate::default()], v);
        assert_eq!(col.date_at(0), Some(date(2021, 3, 15)));
        assert_eq!(col.date_at(1), None);
        assert_eq!(col.data_type(), DataType::Date);
    }

    #[test]
    fn categorical_str_at() {
        let col = Column::categorical(
            vec!["Slight".into(), "Fatal".into()],
            vec![0, 1, 0],
            ValidityBitmap::all_valid(3),
        );
        assert_eq!(col.str_at(1), Some("Fatal"));
        assert_eq!(col.str_at(2), Some("Slight"));
    }

    #[test]
    fn text_str_at_missing() {
        let mut v = ValidityBitmap::empty();
        v.push(false);
        v.push(true);
        let col = Column::text(vec![String::new(), "Daylight".into()], v);
        assert_eq!(col.str_at(0), None);
        assert_eq!(col.str_at(1), Some("Daylight"));
    }

    #[test]
    fn filter_keeps_validity() {
        let mut v = ValidityBitmap::empty();
        v.push(true);
        v.push(false);
        v.push(true);
        v.push(true);
        let col = Column::numeric(vec![1.0, 0.0, 3.0, 4.0], v);
        let filtered = col.filter(&[true, true, false, true]);
        assert_eq!(filtered.len(), 3);
        assert_eq!(filtered.valid_numeric_values().unwrap(), vec![1.0, 4.0]);
        assert!(!filtered.is_valid(1));
    }

    // ── DataFrame ────────────────────────────────────────────────

    #[test]
    fn add_and_lookup_columns() {
        let mut df = DataFrame::new();
        df.add_column(
            "Number_of_Vehicles".into(),
            Column::numeric(vec![1.0, 2.0], ValidityBitmap::all_valid(2)),
        )
        .unwrap();
        assert_eq!(df.row_count(), 2);
        assert!(df.column_by_name("Number_of_Vehicles").is_some());
        assert!(df.column_by_name("missing").is_none());
    }

    #[test]
    fn add_column_length_mismatch() {
        let mut df = DataFrame::new();
        df.add_column(
            "a".into(),
            Column::numeric(vec![1.0, 2.0], ValidityBitmap::all_valid(2)),
        )
        .unwrap();
        let err = df
            .add_column(
                "b".into(),
                Column::numeric(vec![1.0], ValidityBitmap::all_valid(1)),
            )
            .unwrap_err();
        assert!(matches!(err, TrendsError::DimensionMismatch { .. }));
    }

    #[test]
    fn replace_column_keeps_position() {
        let mut df = DataFrame::new();
        df.add_column(
            "a".into(),
            Column::numeric(vec![1.0, 2.0], ValidityBitmap::all_valid(2)),
        )
        .unwrap();
        df.add_column(
            "b".into(),
            Column::numeric(vec![3.0, 4.0], ValidityBitmap::all_valid(2)),
        )
        .unwrap();
        df.replace_column(
            "a",
            Column::numeric(vec![9.0, 8.0], ValidityBitmap::all_valid(2)),
        )
        .unwrap();
        assert_eq!(df.column_index("a"), Some(0));
        assert_eq!(
            df.column_by_name("a").unwrap().as_numeric().unwrap(),
            &[9.0, 8.0]
        );
    }

    #[test]
    fn replace_missing_column_fails() {
        let mut df = DataFrame::new();
        let err = df
            .replace_column(
                "ghost",
                Column::numeric(vec![], ValidityBitmap::empty()),
            )
            .unwrap_err();
        assert!(matches!(err, TrendsError::ColumnNotFound { .. }));
    }

    #[test]
    fn filter_rows_shrinks_all_columns() {
        let mut df = DataFrame::new();
        df.add_column(
            "n".into(),
            Column::numeric(vec![1.0, 2.0, 3.0], ValidityBitmap::all_valid(3)),
        )
        .unwrap();
        df.add_column(
            "t".into(),
            Column::text(
                vec!["a".into(), "b".into(), "c".into()],
                ValidityBitmap::all_valid(3),
            ),
        )
        .unwrap();
        let out = df.filter_rows(&[true, false, true]).unwrap();
        assert_eq!(out.row_count(), 2);
        assert_eq!(out.column_by_name("t").unwrap().str_at(1), Some("c"));
    }

    #[test]
    fn filter_rows_bad_mask() {
        let mut df = DataFrame::new();
        df.add_column(
            "n".into(),
            Column::numeric(vec![1.0], ValidityBitmap::all_valid(1)),
        )
        .unwrap();
        assert!(df.filter_rows(&[true, false]).is_err());
    }
}
