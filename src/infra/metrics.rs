// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records the scalar training curves to a CSV file after each
// epoch, one row per epoch, in the log directory.
//
// Columns:
//   epoch       — epoch number (1, 2, 3, ...)
//   train_loss  — mean negative ELBO over training samples
//   test_loss   — mean negative ELBO over test samples
//   train_nll   — reconstruction part of train_loss
//   train_kl    — KL part of train_loss
//   test_nll    — reconstruction part of test_loss
//   test_kl     — KL part of test_loss
//
// Example:
//   epoch,train_loss,test_loss,train_nll,train_kl,test_nll,test_kl
//   1,131.204511,110.583201,118.403322,12.801189,97.114402,13.468799
//
// The file is appended to across runs; the header is only
// written when the file is new.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

use crate::ml::trainer::BatchStats;

const HEADER: &str = "epoch,train_loss,test_loss,train_nll,train_kl,test_nll,test_kl";

/// One row of metrics for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    pub train_loss: f64,
    pub test_loss:  f64,
    pub train_nll:  f64,
    pub train_kl:   f64,
    pub test_nll:   f64,
    pub test_kl:    f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train: BatchStats, test: BatchStats) -> Self {
        Self {
            epoch,
            train_loss: train.loss,
            test_loss:  test.loss,
            train_nll:  train.nll,
            train_kl:   train.kl,
            test_nll:   test.nll,
            test_kl:    test.kl,
        }
    }

    /// Returns true if this epoch beat the previous best test loss
    pub fn is_improvement(&self, best_test_loss: f64) -> bool {
        self.test_loss < best_test_loss
    }
}

/// Appends epoch metrics to `<dir>/metrics.csv`.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the directory and the CSV header if they don't exist yet.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create log dir '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.test_loss,
            m.train_nll,
            m.train_kl,
            m.test_nll,
            m.test_kl,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, test_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.test_loss,
        );

        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn stats(loss: f64) -> BatchStats {
        BatchStats { loss, nll: loss - 1.0, kl: 1.0 }
    }

    fn temp_dir(name: &str) -> String {
        let dir = std::env::temp_dir().join(format!("vrnn-metrics-{}-{}", std::process::id(), name));
        let _ = fs::remove_dir_all(&dir);
        dir.to_string_lossy().into_owned()
    }

    #[test]
    fn test_is_improvement() {
        let m = EpochMetrics::new(2, stats(120.0), stats(110.0));
        assert!(m.is_improvement(115.0));
        assert!(!m.is_improvement(100.0));
        assert!(m.is_improvement(f64::INFINITY));
    }

    #[test]
    fn test_nan_loss_is_never_an_improvement() {
        let m = EpochMetrics::new(1, stats(1.0), stats(f64::NAN));
        assert!(!m.is_improvement(f64::INFINITY));
    }

    #[test]
    fn test_header_written_once_rows_appended() {
        let dir = temp_dir("append");
        let logger = MetricsLogger::new(dir.clone()).unwrap();
        logger.log(&EpochMetrics::new(1, stats(130.0), stats(120.0))).unwrap();

        // A second logger on the same dir must not repeat the header
        let again = MetricsLogger::new(dir).unwrap();
        again.log(&EpochMetrics::new(2, stats(110.0), stats(105.0))).unwrap();

        let content = fs::read_to_string(again.csv_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER);
        assert!(lines[1].starts_with("1,130.000000,120.000000,129.000000,1.000000"));
        assert!(lines[2].starts_with("2,"));
    }
}
