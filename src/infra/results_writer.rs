// ============================================================
// Layer 6 — Results Writer
// ============================================================
// Writes a scored Table (the validation rows plus the
// pred_<answer> and metric columns) to a CSV file.
//
// Missing cells are written as empty fields, the same way
// CsvLoader reads them back.
//
// Example output:
//   prompt,answer,pred_answer,metric
//   What is 2+2?,4,4,1.000000
//   Capital of France?,Paris,Lyon,0.000000
//
// Reference: csv crate documentation

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::table::Table;

pub struct ResultsWriter {
    csv_path: PathBuf,
}

impl ResultsWriter {
    pub fn new(csv_path: impl AsRef<Path>) -> Self {
        Self { csv_path: csv_path.as_ref().to_path_buf() }
    }

    pub fn write(&self, table: &Table) -> Result<()> {
        if let Some(parent) = self.csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(&self.csv_path)
            .with_context(|| format!("Cannot create '{}'", self.csv_path.display()))?;

        writer.write_record(table.column_names())?;
        for row in 0..table.num_rows() {
            writer.write_record(
                table
                    .columns()
                    .iter()
                    .map(|c| c.values[row].as_deref().unwrap_or("")),
            )?;
        }
        writer.flush()?;

        tracing::info!(
            "Wrote {} result rows to '{}'",
            table.num_rows(),
            self.csv_path.display()
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

/// Format per-row scores for a results column.
pub fn metric_column(metrics: &[f64]) -> Vec<Option<String>> {
    metrics.iter().map(|m| Some(format!("{m:.6}"))).collect()
}
