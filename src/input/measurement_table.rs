//! Row-oriented measurement table of a single hole.

use hashbrown::HashSet;

use crate::error::{DownholeError, Result};

fn check_unique_columns<'a>(names: impl IntoIterator<Item = &'a String>) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(DownholeError::DuplicateMeasurementColumn(name.clone()));
        }
    }
    Ok(())
}

/// A row-oriented table of `f64` readings with stable header names.
///
/// The first column is the primary distance axis. Missing readings are carried as
/// `NaN`, the way CPT parsers hand them over.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementTable {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl MeasurementTable {
    /// Builds a table, rejecting a repeated column name and rows whose width
    /// differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self> {
        check_unique_columns(&columns)?;
        if let Some((row, values)) = rows
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != columns.len())
        {
            return Err(DownholeError::RaggedMeasurementRow {
                row,
                expected: columns.len(),
                found: values.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    /// Builds a table from named columns of equal length.
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        check_unique_columns(columns.iter().map(|(name, _)| name))?;
        let num_rows = columns.first().map_or(0, |(_, values)| values.len());
        if let Some((_, values)) = columns.iter().find(|(_, values)| values.len() != num_rows) {
            return Err(DownholeError::RaggedMeasurementRow {
                row: values.len().min(num_rows),
                expected: num_rows,
                found: values.len(),
            });
        }
        let rows = (0..num_rows)
            .map(|i| columns.iter().map(|(_, values)| values[i]).collect())
            .collect();
        let names = columns.into_iter().map(|(name, _)| name).collect();
        Ok(Self {
            columns: names,
            rows,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Copies one column out of the row store.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.position(name)?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }

    pub fn check_required_columns(&self, hole_id: &str, required: &[String]) -> Result<()> {
        let missing: Vec<String> = required
            .iter()
            .filter(|name| self.position(name).is_none())
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DownholeError::MissingRequiredColumns {
                hole_id: hole_id.to_string(),
                missing,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ragged_row_is_rejected() {
        let err = MeasurementTable::new(
            vec!["penetrationLength".into(), "coneResistance".into()],
            vec![vec![0.0, 1.0], vec![1.0]],
        )
        .unwrap_err();
        match err {
            DownholeError::RaggedMeasurementRow {
                row,
                expected,
                found,
            } => assert_eq!((row, expected, found), (1, 2, 1)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_columns_transposes() {
        let table = MeasurementTable::from_columns(vec![
            ("penetrationLength".into(), vec![0.0, 0.5, 1.0]),
            ("coneResistance".into(), vec![1.1, 2.2, 3.3]),
        ])
        .unwrap();
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.rows()[1], vec![0.5, 2.2]);
        assert_eq!(table.column("coneResistance").unwrap(), vec![1.1, 2.2, 3.3]);
        assert!(table.column("friction").is_none());
    }

    #[test]
    fn test_repeated_column_name_is_rejected() {
        let err = MeasurementTable::new(
            vec![
                "penetrationLength".into(),
                "coneResistance".into(),
                "coneResistance".into(),
            ],
            vec![vec![0.0, 1.0, 2.0]],
        )
        .unwrap_err();
        assert!(matches!(err, DownholeError::DuplicateMeasurementColumn(name) if name == "coneResistance"));

        let result = MeasurementTable::from_columns(vec![
            ("penetrationLength".into(), vec![0.0]),
            ("penetrationLength".into(), vec![0.5]),
        ]);
        assert!(matches!(
            result,
            Err(DownholeError::DuplicateMeasurementColumn(_))
        ));
    }

    #[test]
    fn test_from_columns_rejects_unequal_lengths() {
        let result = MeasurementTable::from_columns(vec![
            ("penetrationLength".into(), vec![0.0, 0.5]),
            ("coneResistance".into(), vec![1.1]),
        ]);
        assert!(result.is_err());
    }
}
