// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends every loss report to a CSV file so learning curves
// can be plotted after a run.
//
// Output file: <checkpoint dir>/metrics.csv
//
//   epoch,batch,train_loss,val_loss
//   1,100,0.041230,0.043907
//   1,200,0.030118,0.032455
//   ...
//
// Reading the curve: both losses should fall; a validation loss
// that rises while the training loss keeps falling means the
// autoencoder is memorising the training rows.

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::loss_history::LossReport;
use crate::error::{EmbedError, Result};

pub const METRICS_FILE: &str = "metrics.csv";
const HEADER: &str = "epoch,batch,train_loss,val_loss";

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the header if the file does not exist yet, so runs
    /// sharing a directory append to one log.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| EmbedError::io(dir, e))?;

        let csv_path = dir.join(METRICS_FILE);
        if !csv_path.exists() {
            fs::write(&csv_path, format!("{HEADER}\n")).map_err(|e| EmbedError::io(&csv_path, e))?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }
        Ok(Self { csv_path })
    }

    pub fn log(&self, r: &LossReport) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .map_err(|e| EmbedError::io(&self.csv_path, e))?;

        writeln!(f, "{},{},{:.6},{:.6}", r.epoch, r.batch, r.train_loss, r.val_loss)
            .map_err(|e| EmbedError::io(&self.csv_path, e))?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_are_appended_after_header() {
        let dir = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();

        logger.log(&LossReport { epoch: 1, batch: 100, train_loss: 0.5, val_loss: 0.25 }).unwrap();
        logger.log(&LossReport { epoch: 2, batch: 100, train_loss: 0.125, val_loss: 0.0625 }).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![HEADER, "1,100,0.500000,0.250000", "2,100,0.125000,0.062500"]);
    }

    #[test]
    fn test_reopening_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        MetricsLogger::new(dir.path())
            .unwrap()
            .log(&LossReport { epoch: 1, batch: 10, train_loss: 1.0, val_loss: 1.0 })
            .unwrap();

        let again = MetricsLogger::new(dir.path()).unwrap();
        let text = fs::read_to_string(again.csv_path()).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
