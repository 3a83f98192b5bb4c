// ============================================================
// Layer 4 — Feature Matrix Loader
// ============================================================
// Reads a numeric CSV file into a FeatureMatrix.
//
// Expected layout:
//   price,weight,rating        ← optional header row
//   0.12,0.80,0.50
//   0.90,0.10,0.75
//
// The header is detected automatically: if any cell of the
// first line fails to parse as a number, the line is treated
// as column names. Every later line must be fully numeric and
// as wide as the first data row.
//
// Cells may be quoted and padded with spaces. Blank lines are
// skipped. Errors carry the 1-based line number so a broken
// export is easy to find.
//
// Reference: csv crate documentation (ReaderBuilder, StringRecord)

use std::{fs, path::PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::domain::feature_matrix::FeatureMatrix;
use crate::domain::traits::FeatureSource;
use crate::error::{EmbedError, Result};

/// Loads one CSV file of numeric features.
pub struct CsvMatrixLoader {
    path:      PathBuf,
    delimiter: u8,
}

impl CsvMatrixLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse CSV text that is already in memory.
    pub fn parse(&self, text: &str) -> Result<FeatureMatrix> {
        // Headers are detected by hand and ragged rows are reported
        // by FeatureMatrix, so the reader takes every record as-is.
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .delimiter(self.delimiter)
            .from_reader(text.as_bytes());

        let mut rows: Vec<Vec<f32>> = Vec::new();
        let mut header: Option<StringRecord> = None;

        for record in reader.records() {
            let record = record.map_err(|e| {
                EmbedError::config(format!("{}: malformed CSV ({e})", self.path.display()))
            })?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let parsed: std::result::Result<Vec<f32>, _> =
                record.iter().map(|cell| cell.parse::<f32>()).collect();

            match parsed {
                Ok(row) => rows.push(row),
                Err(_) if rows.is_empty() && header.is_none() => header = Some(record),
                Err(e) => {
                    return Err(EmbedError::config(format!(
                        "{}:{}: non-numeric cell ({e})",
                        self.path.display(),
                        line,
                    )));
                }
            }
        }

        if let Some(names) = &header {
            tracing::debug!("Skipped CSV header with {} columns", names.len());
        }

        FeatureMatrix::from_rows(rows)
    }
}

impl FeatureSource for CsvMatrixLoader {
    fn load(&self) -> Result<FeatureMatrix> {
        let text = fs::read_to_string(&self.path)
            .map_err(|e| EmbedError::io(&self.path, e))?;

        let matrix = self.parse(&text)?;
        tracing::info!(
            "Loaded feature matrix {}x{} from '{}'",
            matrix.rows(),
            matrix.cols(),
            self.path.display(),
        );
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_with_header() {
        let loader = CsvMatrixLoader::new("inline.csv");
        let m = loader.parse("a,b\n1,2\n\n3.5, 4\n").unwrap();
        assert_eq!((m.rows(), m.cols()), (2, 2));
        assert_eq!(m.row(1).to_vec(), vec![3.5, 4.0]);
    }

    #[test]
    fn test_parse_without_header() {
        let m = CsvMatrixLoader::new("inline.csv").parse("1;2;3\n4;5;6").ok();
        assert!(m.is_none(), "default delimiter is a comma");

        let m = CsvMatrixLoader::new("inline.csv")
            .with_delimiter(b';')
            .parse("1;2;3\n4;5;6")
            .unwrap();
        assert_eq!((m.rows(), m.cols()), (2, 3));
    }

    #[test]
    fn test_quoted_cells() {
        let m = CsvMatrixLoader::new("quoted.csv")
            .parse("\"price\",\"weight\"\n\"1.5\",\"2.0\"\n\"3.0\",\"4.0\"\n")
            .unwrap();
        assert_eq!((m.rows(), m.cols()), (2, 2));
        assert_eq!(m.row(0).to_vec(), vec![1.5, 2.0]);
    }

    #[test]
    fn test_bad_cell_reports_line() {
        let err = CsvMatrixLoader::new("bad.csv")
            .parse("1,2\n3,x\n")
            .unwrap_err();
        assert!(err.to_string().contains("bad.csv:2"));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = CsvMatrixLoader::new("ragged.csv").parse("1,2\n3\n").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_load_from_disk_and_missing_file() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.csv");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "0.1,0.2\n0.3,0.4").unwrap();

        let m = CsvMatrixLoader::new(&path).load().unwrap();
        assert_eq!(m.rows(), 2);

        let missing = CsvMatrixLoader::new(dir.path().join("nope.csv")).load().unwrap_err();
        assert!(matches!(missing, EmbedError::Io { .. }));
    }
}
