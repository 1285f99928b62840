//! Input validation.
//!
//! Turns a raw [`DataMatrix`] into a [`ValidatedMatrix`], rejecting shapes
//! and contents no computation can use and recording the conditions that
//! only deserve a warning.

use serde::Serialize;
use tracing::debug;
use u_numflow::stats;

use crate::error::ValidationError;
use crate::matrix::{is_missing, DataMatrix, ItemMatrix};
use crate::warning::Warning;

/// A numeric item matrix that passed validation, with its warnings.
///
/// Only obtainable from [`validate`]; it serializes for reporting but is
/// never read back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedMatrix {
    names: Vec<String>,
    items: ItemMatrix,
    warnings: Vec<Warning>,
}

impl ValidatedMatrix {
    /// Item names in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The numeric matrix.
    pub fn items(&self) -> &ItemMatrix {
        &self.items
    }

    /// Warnings raised during validation.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, ItemMatrix, Vec<Warning>) {
        (self.names, self.items, self.warnings)
    }
}

/// Validates a raw matrix.
///
/// # Errors
///
/// - [`ValidationError::TooFewColumns`] if there are fewer than 2 items
/// - [`ValidationError::RaggedColumns`] if item lengths differ
/// - [`ValidationError::TooFewRows`] if there are fewer than 2 observations
/// - [`ValidationError::NonNumericData`] for a text or infinite cell
///
/// # Warnings
///
/// Per item, in order: missing values, negative values, zero variance.
///
/// # Examples
///
/// ```
/// use u_reliability::matrix::DataMatrix;
/// use u_reliability::validate::validate;
/// use u_reliability::warning::Warning;
///
/// let m = DataMatrix::from_numeric_columns(vec![
///     vec![1.0, 2.0, 3.0],
///     vec![4.0, 4.0, 4.0],
/// ]);
/// let v = validate(&m).unwrap();
/// assert_eq!(v.warnings(), &[Warning::ZeroVariance { item: "item_2".into() }]);
/// ```
pub fn validate(matrix: &DataMatrix) -> Result<ValidatedMatrix, ValidationError> {
    let k = matrix.n_columns();
    if k < 2 {
        return Err(ValidationError::TooFewColumns { columns: k });
    }

    let names = matrix.names().to_vec();
    let n = matrix.n_rows();
    for (j, col) in matrix.columns().iter().enumerate() {
        if col.len() != n {
            return Err(ValidationError::RaggedColumns {
                item: names[j].clone(),
                expected: n,
                found: col.len(),
            });
        }
    }

    if n < 2 {
        return Err(ValidationError::TooFewRows { rows: n });
    }

    let mut columns = Vec::with_capacity(k);
    for (j, col) in matrix.columns().iter().enumerate() {
        let mut values = Vec::with_capacity(n);
        for (row, cell) in col.iter().enumerate() {
            let v = cell.as_value().ok_or_else(|| ValidationError::NonNumericData {
                item: names[j].clone(),
                row,
            })?;
            values.push(v);
        }
        columns.push(values);
    }
    let items = ItemMatrix::from_columns_unchecked(columns, n);

    let mut warnings = Vec::new();
    for (j, name) in names.iter().enumerate() {
        let missing = items.missing_count(j);
        if missing > 0 {
            warnings.push(Warning::MissingValues {
                item: name.clone(),
                count: missing,
            });
        }

        let negative = items
            .column(j)
            .iter()
            .filter(|v| !is_missing(**v) && **v < 0.0)
            .count();
        if negative > 0 {
            warnings.push(Warning::NegativeValues {
                item: name.clone(),
                count: negative,
            });
        }

        let var = stats::variance(&items.observed(j));
        if var.map_or(true, |v| v <= 0.0) {
            warnings.push(Warning::ZeroVariance { item: name.clone() });
        }
    }

    debug!(
        items = k,
        rows = n,
        warnings = warnings.len(),
        "validated item matrix"
    );

    Ok(ValidatedMatrix {
        names,
        items,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::Cell;

    #[test]
    fn one_row_is_too_few() {
        let m = DataMatrix::from_numeric_columns(vec![vec![1.0], vec![2.0]]);
        assert_eq!(validate(&m), Err(ValidationError::TooFewRows { rows: 1 }));
    }

    #[test]
    fn one_column_is_too_few() {
        let m = DataMatrix::from_numeric_columns(vec![vec![1.0, 2.0, 3.0]]);
        assert_eq!(validate(&m), Err(ValidationError::TooFewColumns { columns: 1 }));
    }

    #[test]
    fn text_cell_is_non_numeric() {
        let m = DataMatrix::from_columns(vec![
            vec![Cell::Number(1.0), Cell::Number(2.0), Cell::Number(3.0)],
            vec![Cell::Number(1.0), Cell::Text("often".into()), Cell::Number(3.0)],
        ]);
        assert_eq!(
            validate(&m),
            Err(ValidationError::NonNumericData {
                item: "item_2".into(),
                row: 1
            })
        );
    }

    #[test]
    fn infinity_is_non_numeric() {
        let m = DataMatrix::from_numeric_columns(vec![vec![1.0, f64::INFINITY], vec![1.0, 2.0]]);
        assert!(matches!(
            validate(&m),
            Err(ValidationError::NonNumericData { row: 1, .. })
        ));
    }

    #[test]
    fn ragged_columns_rejected() {
        let m = DataMatrix::from_numeric_columns(vec![vec![1.0, 2.0, 3.0], vec![1.0, 2.0]])
            .with_names(["a", "b"]);
        assert_eq!(
            validate(&m),
            Err(ValidationError::RaggedColumns {
                item: "b".into(),
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn warnings_in_item_order() {
        let m = DataMatrix::from_columns(vec![
            vec![Cell::Number(-1.0), Cell::Number(2.0), Cell::Missing, Cell::Number(4.0)],
            vec![Cell::Number(3.0), Cell::Number(3.0), Cell::Number(3.0), Cell::Number(3.0)],
            vec![Cell::Number(1.0), Cell::Number(2.0), Cell::Number(3.0), Cell::Number(5.0)],
        ])
        .with_names(["a", "b", "c"]);
        let v = validate(&m).expect("valid");
        assert_eq!(
            v.warnings(),
            &[
                Warning::MissingValues {
                    item: "a".into(),
                    count: 1
                },
                Warning::NegativeValues {
                    item: "a".into(),
                    count: 1
                },
                Warning::ZeroVariance { item: "b".into() },
            ]
        );
        assert_eq!(v.items().n_items(), 3);
        assert!(v.items().column(0)[2].is_nan());
    }

    #[test]
    fn clean_matrix_has_no_warnings() {
        let m = DataMatrix::from_numeric_columns(vec![vec![4.0, 3.0, 5.0], vec![3.0, 4.0, 2.0]]);
        let v = validate(&m).expect("valid");
        assert!(v.warnings().is_empty());
        assert_eq!(v.names(), &["item_1", "item_2"]);
    }
}
