//! CSV dataset reader with full input validation.

use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2};
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::Dataset;

/// Reads a numeric tabular dataset from a CSV file.
///
/// Expected CSV format:
/// - Header row required, one name per column
/// - Every cell is a finite floating-point number
/// - All rows have the same number of columns as the header
///
/// When a target column is named via [`DatasetReader::with_target`], it is
/// split off into [`Dataset::targets`]; every other column is a feature.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingTargetColumn`] | Named target column is not in the header |
/// | [`IoError::NoFeatureColumns`] | No column remains besides the target |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
pub struct DatasetReader {
    path: PathBuf,
    target: Option<String>,
}

impl DatasetReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            target: None,
        }
    }

    /// Split off `column` as the target vector.
    #[must_use]
    pub fn with_target(mut self, column: impl Into<String>) -> Self {
        self.target = Some(column.into());
        self
    }

    /// Read and validate the CSV file, returning a [`Dataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Dataset, IoError> {
        // 1. Open file (FileNotFound on failure)
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // 2. Build CSV reader with headers.
        // flexible(true) allows rows with varying column counts so that our own
        // InconsistentRowLength check fires instead of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        // 3. Read header to get column names and expected column count
        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let expected_cols = header.len();
        debug!(expected_cols, "read CSV header");

        let target_index = match &self.target {
            Some(column) => Some(header.iter().position(|h| h == column).ok_or_else(|| {
                IoError::MissingTargetColumn {
                    path: self.path.clone(),
                    column: column.clone(),
                }
            })?),
            None => None,
        };

        let feature_names: Vec<String> = header
            .iter()
            .enumerate()
            .filter(|&(i, _)| Some(i) != target_index)
            .map(|(_, name)| name.to_string())
            .collect();
        if feature_names.is_empty() {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
            });
        }

        // 4. Iterate rows with validation
        let mut rows: Vec<Vec<f64>> = Vec::new();
        let mut targets: Vec<f64> = Vec::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;

            // Check column count consistency
            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let mut row = Vec::with_capacity(feature_names.len());
            for (col_index, raw) in record.iter().enumerate() {
                let value = self.parse_cell(raw, row_index, &header[col_index])?;
                if Some(col_index) == target_index {
                    targets.push(value);
                } else {
                    row.push(value);
                }
            }
            rows.push(row);
        }

        // 5. Check for empty dataset
        if rows.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let features = Array2::from_shape_fn((rows.len(), feature_names.len()), |(i, j)| rows[i][j]);
        let target = self
            .target
            .clone()
            .zip(target_index)
            .map(|(name, _)| (name, Array1::from_vec(targets)));

        info!(
            n_samples = features.nrows(),
            n_features = feature_names.len(),
            target_column = self.target.as_deref(),
            "dataset loaded"
        );

        Ok(Dataset::new(feature_names, features, target))
    }

    fn parse_cell(&self, raw: &str, row_index: usize, column: &str) -> Result<f64, IoError> {
        let non_finite = || IoError::NonFiniteValue {
            path: self.path.clone(),
            row_index,
            column: column.to_string(),
            raw: raw.to_string(),
        };
        let value: f64 = raw.parse().map_err(|_| non_finite())?;
        if !value.is_finite() {
            return Err(non_finite());
        }
        Ok(value)
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn read_with_target_column() {
        let csv = "area,label,slope\n100.0,0,0.05\n200.0,1,0.10\n150.0,2,0.08\n";
        let f = write_csv(csv);
        let ds = DatasetReader::new(f.path()).with_target("label").read().unwrap();
        assert_eq!(ds.n_samples(), 3);
        assert_eq!(ds.n_features(), 2);
        assert_eq!(ds.feature_names(), &["area", "slope"]);
        assert_eq!(ds.target_name(), Some("label"));
        assert_eq!(ds.targets().unwrap().to_vec(), vec![0.0, 1.0, 2.0]);
        assert!((ds.features()[[1, 1]] - 0.10).abs() < f64::EPSILON);
    }

    #[test]
    fn read_without_target_keeps_every_column() {
        let csv = "a,b\n1,2\n3,4\n";
        let f = write_csv(csv);
        let ds = DatasetReader::new(f.path()).read().unwrap();
        assert_eq!(ds.n_features(), 2);
        assert!(ds.targets().is_none());
    }

    #[test]
    fn missing_target_column_error() {
        let f = write_csv("a,b\n1,2\n");
        let err = DatasetReader::new(f.path()).with_target("y").read().unwrap_err();
        assert!(matches!(err, IoError::MissingTargetColumn { ref column, .. } if column == "y"));
    }

    #[test]
    fn empty_dataset_error() {
        let f = write_csv("area,slope\n");
        let err = DatasetReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::EmptyDataset { .. }));
    }

    #[test]
    fn no_feature_columns_error() {
        let f = write_csv("y\n1\n2\n");
        let err = DatasetReader::new(f.path()).with_target("y").read().unwrap_err();
        assert!(matches!(err, IoError::NoFeatureColumns { .. }));
    }

    #[test]
    fn inconsistent_row_length_error() {
        let f = write_csv("a,b,c\n1,2,3\n4,5\n");
        let err = DatasetReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::InconsistentRowLength { row_index: 1, expected: 3, got: 2, .. }));
    }

    #[test]
    fn non_finite_value_error() {
        let f = write_csv("a,b\n1,NaN\n");
        let err = DatasetReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::NonFiniteValue { ref column, .. } if column == "b"));
    }

    #[test]
    fn unparseable_target_error() {
        let f = write_csv("a,y\n1,abc\n");
        let err = DatasetReader::new(f.path()).with_target("y").read().unwrap_err();
        assert!(matches!(err, IoError::NonFiniteValue { .. }));
    }

    #[test]
    fn missing_file_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = DatasetReader::new(&dir.path().join("absent.csv")).read().unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }
}
