//! Item data model.
//!
//! [`DataMatrix`] is what a loader hands over: named columns of raw
//! [`Cell`]s. [`ItemMatrix`] is the validated numeric form the engines
//! work on, column-major, with [`MISSING`] (`NaN`) marking absent values.
//!
//! # Examples
//!
//! ```
//! use u_reliability::matrix::{Cell, DataMatrix};
//!
//! let m = DataMatrix::from_rows(vec![
//!     vec![Cell::parse("4"), Cell::parse("3")],
//!     vec![Cell::parse("NA"), Cell::parse("5")],
//! ]);
//! assert_eq!(m.n_columns(), 2);
//! assert_eq!(m.n_rows(), 2);
//! assert_eq!(m.column(0)[1], Cell::Missing);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Sentinel stored in an [`ItemMatrix`] for a missing observation.
pub const MISSING: f64 = f64::NAN;

/// Returns `true` if `v` is the missing sentinel.
#[inline]
pub fn is_missing(v: f64) -> bool {
    v.is_nan()
}

/// One raw input value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    /// A numeric value. `NaN` is read as missing.
    Number(#[serde(with = "crate::float_serde::nullable")] f64),
    /// Explicitly missing.
    Missing,
    /// Text that could not be read as a number.
    Text(String),
}

impl Cell {
    /// Interprets a textual field.
    ///
    /// Empty fields and the markers `NA`, `NaN`, `.` (any case) are
    /// missing; anything `f64::from_str` accepts is a number; the rest is
    /// kept as text.
    pub fn parse(s: &str) -> Self {
        let t = s.trim();
        if t.is_empty() || t == "." || t.eq_ignore_ascii_case("na") || t.eq_ignore_ascii_case("nan")
        {
            return Cell::Missing;
        }
        match t.parse::<f64>() {
            Ok(v) => Cell::Number(v),
            Err(_) => Cell::Text(t.to_string()),
        }
    }

    /// The numeric reading of this cell: `Some(MISSING)` for missing,
    /// `None` for non-numeric content.
    pub fn as_value(&self) -> Option<f64> {
        match self {
            Cell::Number(v) if v.is_nan() => Some(MISSING),
            Cell::Number(v) if v.is_finite() => Some(*v),
            Cell::Number(_) => None,
            Cell::Missing => Some(MISSING),
            Cell::Text(_) => None,
        }
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Number(v)
    }
}

impl From<Option<f64>> for Cell {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Cell::Missing, Cell::Number)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::parse(s)
    }
}

/// Raw, named item columns as produced by a loader.
///
/// Deserializes from `{"names": [...], "columns": [[...], ...]}`; `names`
/// may be omitted or shorter than `columns` (defaults fill the rest) but
/// not longer. Column lengths are left for the validator to judge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataMatrix")]
pub struct DataMatrix {
    names: Vec<String>,
    columns: Vec<Vec<Cell>>,
}

#[derive(Deserialize)]
struct RawDataMatrix {
    #[serde(default)]
    names: Vec<String>,
    columns: Vec<Vec<Cell>>,
}

impl TryFrom<RawDataMatrix> for DataMatrix {
    type Error = String;

    fn try_from(raw: RawDataMatrix) -> Result<Self, Self::Error> {
        if raw.names.len() > raw.columns.len() {
            return Err(format!(
                "{} names given for {} columns",
                raw.names.len(),
                raw.columns.len()
            ));
        }
        Ok(Self::from_columns(raw.columns).with_names(raw.names))
    }
}

impl DataMatrix {
    /// Builds a matrix from item columns, naming them `item_1`, `item_2`, ...
    pub fn from_columns(columns: Vec<Vec<Cell>>) -> Self {
        let names = default_names(columns.len());
        Self { names, columns }
    }

    /// Builds a matrix from observation rows.
    ///
    /// Short rows leave their columns short; the validator reports the
    /// resulting length mismatch.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut columns: Vec<Vec<Cell>> = vec![Vec::with_capacity(rows.len()); width];
        for row in rows {
            for (j, cell) in row.into_iter().enumerate() {
                columns[j].push(cell);
            }
        }
        Self::from_columns(columns)
    }

    /// Builds a matrix from numeric columns where `NaN` marks missing.
    pub fn from_numeric_columns(columns: Vec<Vec<f64>>) -> Self {
        Self::from_columns(
            columns
                .into_iter()
                .map(|c| c.into_iter().map(Cell::Number).collect())
                .collect(),
        )
    }

    /// Replaces item names. Missing names keep their defaults; extra
    /// names are ignored.
    pub fn with_names<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        for (slot, name) in self.names.iter_mut().zip(names) {
            *slot = name.into();
        }
        self
    }

    /// Number of items.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of observations (length of the first column).
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Item names in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Cells of item `j`.
    pub fn column(&self, j: usize) -> &[Cell] {
        &self.columns[j]
    }

    pub(crate) fn columns(&self) -> &[Vec<Cell>] {
        &self.columns
    }
}

fn default_names(k: usize) -> Vec<String> {
    (1..=k).map(|i| format!("item_{i}")).collect()
}

/// Numeric item matrix, column-major, [`MISSING`] for absent values.
///
/// Serialized missing values are `null`. Deserialization goes through
/// [`ItemMatrix::from_columns`], so ragged columns are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawItemMatrix")]
pub struct ItemMatrix {
    #[serde(with = "crate::float_serde::nullable_columns")]
    columns: Vec<Vec<f64>>,
    n_rows: usize,
}

#[derive(Deserialize)]
struct RawItemMatrix {
    #[serde(with = "crate::float_serde::nullable_columns")]
    columns: Vec<Vec<f64>>,
    n_rows: Option<usize>,
}

impl TryFrom<RawItemMatrix> for ItemMatrix {
    type Error = String;

    fn try_from(raw: RawItemMatrix) -> Result<Self, Self::Error> {
        let m = Self::from_columns(raw.columns).map_err(|e| e.to_string())?;
        match raw.n_rows {
            Some(n) if !m.columns.is_empty() && n != m.n_rows => Err(format!(
                "n_rows is {n} but columns have {} rows",
                m.n_rows
            )),
            Some(n) if m.columns.is_empty() => Ok(Self::from_columns_unchecked(Vec::new(), n)),
            _ => Ok(m),
        }
    }
}

impl ItemMatrix {
    /// Builds a matrix from numeric columns (`NaN` = missing).
    ///
    /// Only the rectangular shape is checked here; row and column minimums
    /// belong to [`validate`](crate::validate::validate).
    ///
    /// # Examples
    ///
    /// ```
    /// use u_reliability::matrix::ItemMatrix;
    ///
    /// let m = ItemMatrix::from_columns(vec![vec![1.0, 2.0], vec![3.0, f64::NAN]]).unwrap();
    /// assert_eq!(m.complete_rows(), vec![0]);
    /// assert!(ItemMatrix::from_columns(vec![vec![1.0], vec![1.0, 2.0]]).is_err());
    /// ```
    pub fn from_columns(columns: Vec<Vec<f64>>) -> Result<Self, ValidationError> {
        let n_rows = columns.first().map_or(0, Vec::len);
        for (j, col) in columns.iter().enumerate() {
            if col.len() != n_rows {
                return Err(ValidationError::RaggedColumns {
                    item: format!("item_{}", j + 1),
                    expected: n_rows,
                    found: col.len(),
                });
            }
        }
        Ok(Self { columns, n_rows })
    }

    pub(crate) fn from_columns_unchecked(columns: Vec<Vec<f64>>, n_rows: usize) -> Self {
        debug_assert!(columns.iter().all(|c| c.len() == n_rows));
        Self { columns, n_rows }
    }

    /// Number of items.
    pub fn n_items(&self) -> usize {
        self.columns.len()
    }

    /// Number of observations.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Values of item `j`, missing included.
    pub fn column(&self, j: usize) -> &[f64] {
        &self.columns[j]
    }

    /// Non-missing values of item `j`.
    pub fn observed(&self, j: usize) -> Vec<f64> {
        self.columns[j]
            .iter()
            .copied()
            .filter(|v| !is_missing(*v))
            .collect()
    }

    /// Number of missing cells in item `j`.
    pub fn missing_count(&self, j: usize) -> usize {
        self.columns[j].iter().filter(|v| is_missing(**v)).count()
    }

    /// `true` if any cell is missing.
    pub fn has_missing(&self) -> bool {
        self.columns.iter().flatten().any(|v| is_missing(*v))
    }

    /// Indices of rows where every item is present.
    pub fn complete_rows(&self) -> Vec<usize> {
        (0..self.n_rows)
            .filter(|&r| self.columns.iter().all(|c| !is_missing(c[r])))
            .collect()
    }

    /// Row sums over all items except `exclude`; [`MISSING`] for rows
    /// where any summed item is missing.
    pub fn row_sums(&self, exclude: Option<usize>) -> Vec<f64> {
        (0..self.n_rows)
            .map(|r| {
                let mut sum = 0.0;
                for (j, col) in self.columns.iter().enumerate() {
                    if Some(j) == exclude {
                        continue;
                    }
                    let v = col[r];
                    if is_missing(v) {
                        return MISSING;
                    }
                    sum += v;
                }
                sum
            })
            .collect()
    }

    /// Copy with item `j` removed.
    pub fn without_item(&self, j: usize) -> Self {
        let columns = self
            .columns
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != j)
            .map(|(_, c)| c.clone())
            .collect();
        Self::from_columns_unchecked(columns, self.n_rows)
    }

    /// Copy built from the given rows, in the given order. Indices may
    /// repeat.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|c| rows.iter().map(|&r| c[r]).collect())
            .collect();
        Self::from_columns_unchecked(columns, rows.len())
    }

    /// Copy restricted to complete-case rows.
    pub fn listwise(&self) -> Self {
        self.select_rows(&self.complete_rows())
    }
}
