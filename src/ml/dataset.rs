//! CSV feature and label tables

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to open {source_name}: {error}")]
    Open {
        source_name: String,
        #[source]
        error: std::io::Error,
    },

    #[error("failed to read {source_name}: {error}")]
    Csv {
        source_name: String,
        #[source]
        error: csv::Error,
    },

    #[error("{source_name}: row {row}, column '{column}': '{value}' is not a number")]
    InvalidNumber {
        source_name: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("{source_name}: label '{value}' on row {row} is not an integer class")]
    InvalidLabel {
        source_name: String,
        row: usize,
        value: String,
    },

    #[error("row has {found} values, expected {expected}")]
    RowWidth { expected: usize, found: usize },
}

/// Numeric table with named columns, read from a CSV file with a header row
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, DatasetError> {
        if let Some(row) = rows.iter().find(|r| r.len() != columns.len()) {
            return Err(DatasetError::RowWidth {
                expected: columns.len(),
                found: row.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    /// Single-row table from `(column, value)` pairs
    pub fn from_named_row<S: AsRef<str>>(values: &[(S, f64)]) -> Self {
        Self {
            columns: values.iter().map(|(name, _)| name.as_ref().to_string()).collect(),
            rows: vec![values.iter().map(|(_, v)| *v).collect()],
        }
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, DatasetError> {
        let source_name = path.display().to_string();
        let file = File::open(path).map_err(|error| DatasetError::Open {
            source_name: source_name.clone(),
            error,
        })?;
        Self::from_reader(file, &source_name)
    }

    pub fn from_reader<R: Read>(reader: R, source_name: &str) -> Result<Self, DatasetError> {
        let csv_err = |error| DatasetError::Csv {
            source_name: source_name.to_string(),
            error,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for (row_idx, record) in reader.records().enumerate() {
            let record = record.map_err(csv_err)?;
            let row = record
                .iter()
                .zip(&columns)
                .map(|(cell, column)| {
                    cell.parse::<f64>().map_err(|_| DatasetError::InvalidNumber {
                        source_name: source_name.to_string(),
                        row: row_idx + 1,
                        column: column.clone(),
                        value: cell.to_string(),
                    })
                })
                .collect::<Result<Vec<f64>, _>>()?;
            rows.push(row);
        }

        tracing::debug!("Read {} rows x {} columns from {}", rows.len(), columns.len(), source_name);
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Copy of row `index` as its own table
    pub fn select_row(&self, index: usize) -> Option<Self> {
        self.rows.get(index).map(|row| Self {
            columns: self.columns.clone(),
            rows: vec![row.clone()],
        })
    }

    /// Row `index` keyed by column name
    pub fn row_features(&self, index: usize) -> Option<BTreeMap<String, f64>> {
        self.rows.get(index).map(|row| {
            self.columns
                .iter()
                .cloned()
                .zip(row.iter().copied())
                .collect()
        })
    }
}

/// Read a label CSV and flatten every cell, row by row, into one class sequence
pub fn load_labels(path: &Path) -> Result<Vec<i64>, DatasetError> {
    let source_name = path.display().to_string();
    let file = File::open(path).map_err(|error| DatasetError::Open {
        source_name: source_name.clone(),
        error,
    })?;
    labels_from_reader(file, &source_name)
}

fn labels_from_reader<R: Read>(reader: R, source_name: &str) -> Result<Vec<i64>, DatasetError> {
    let table = FeatureTable::from_reader(reader, source_name)?;
    let mut labels = Vec::with_capacity(table.n_rows() * table.n_columns());

    for (row_idx, row) in table.rows().iter().enumerate() {
        for value in row {
            if !value.is_finite() || value.fract() != 0.0 {
                return Err(DatasetError::InvalidLabel {
                    source_name: source_name.to_string(),
                    row: row_idx + 1,
                    value: value.to_string(),
                });
            }
            labels.push(*value as i64);
        }
    }

    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_header_and_rows() {
        let csv = "place,lat,int\n10,48.6,1\n3, 45.75 ,2\n";
        let table = FeatureTable::from_reader(csv.as_bytes(), "inline").unwrap();

        assert_eq!(table.columns(), &["place", "lat", "int"]);
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.rows()[1], vec![3.0, 45.75, 2.0]);
        assert_eq!(table.column_index("int"), Some(2));
    }

    #[test]
    fn test_non_numeric_cell_is_reported() {
        let csv = "place,lat\n10,north\n";
        let err = FeatureTable::from_reader(csv.as_bytes(), "inline").unwrap_err();
        match err {
            DatasetError::InvalidNumber { row, column, .. } => {
                assert_eq!(row, 1);
                assert_eq!(column, "lat");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_row_features_and_select_row() {
        let table = FeatureTable::new(
            vec!["a".into(), "b".into()],
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
        )
        .unwrap();

        let features = table.row_features(1).unwrap();
        assert_eq!(features["a"], 3.0);
        assert_eq!(features["b"], 4.0);
        assert_eq!(table.select_row(0).unwrap().rows(), &[vec![1.0, 2.0]]);
        assert!(table.row_features(2).is_none());
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let err = FeatureTable::new(vec!["a".into()], vec![vec![1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, DatasetError::RowWidth { expected: 1, found: 2 }));
    }

    #[test]
    fn test_labels_are_flattened() {
        let labels = labels_from_reader("priority\n1\n0\n1.0\n".as_bytes(), "y").unwrap();
        assert_eq!(labels, vec![1, 0, 1]);

        let err = labels_from_reader("priority\n0.5\n".as_bytes(), "y").unwrap_err();
        assert!(matches!(err, DatasetError::InvalidLabel { .. }));
    }
}
