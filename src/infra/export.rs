// ============================================================
// Layer 6 — Matrix Export
// ============================================================
// Writes encodings as a header-less numeric CSV, one row per
// record, in the same order as the input feature file. The
// output reads straight back through CsvMatrixLoader.
//
// Reference: csv crate documentation (WriterBuilder)

use std::{fs, path::Path};

use csv::WriterBuilder;
use ndarray::Array2;

use crate::error::{EmbedError, Result};

pub fn write_matrix_csv(matrix: &Array2<f32>, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| EmbedError::io(parent, e))?;
    }
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| EmbedError::io(path, e.into()))?;

    for row in matrix.rows() {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .map_err(|e| EmbedError::io(path, e.into()))?;
    }
    writer.flush().map_err(|e| EmbedError::io(path, e))?;

    tracing::info!("Wrote {}x{} matrix to '{}'", matrix.nrows(), matrix.ncols(), path.display());
    Ok(())
}
