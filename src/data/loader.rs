// ============================================================
// Layer 4 — CSV Table Loader
// ============================================================
// Loads the conversation table from a CSV file with a header
// row. Every column is kept as text; empty cells become
// missing values so the dataset can tell "no parent" and
// "missing answer" apart from real content.
//
// Reference: csv crate documentation

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::domain::table::Table;
use crate::domain::traits::RowSource;

/// Loads a `Table` from one CSV file.
/// Implements the RowSource trait from Layer 3.
pub struct CsvLoader {
    path: PathBuf,
}

impl CsvLoader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl RowSource for CsvLoader {
    fn load_table(&self) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_path(&self.path)
            .with_context(|| format!("Cannot open '{}'", self.path.display()))?;

        let headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("Cannot read header of '{}'", self.path.display()))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];

        for (line, record) in reader.records().enumerate() {
            let record = record.with_context(|| {
                format!("Malformed record {} in '{}'", line + 1, self.path.display())
            })?;
            for (col, field) in columns.iter_mut().zip(record.iter()) {
                col.push((!field.is_empty()).then(|| field.to_string()));
            }
        }

        let table = Table::from_columns(headers.into_iter().zip(columns))?;
        tracing::info!(
            "Loaded {} rows x {} columns from '{}'",
            table.num_rows(),
            table.num_columns(),
            self.path.display()
        );
        Ok(table)
    }
}
