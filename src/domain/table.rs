// ============================================================
// Layer 3 — Table Domain Type
// ============================================================
// The tabular row source the dataset reads from.
// Column-major: every column is a name plus one optional
// string per row. A `None` cell is a missing value.

use anyhow::{bail, Result};

/// A named column of optional string cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name:   String,
    pub values: Vec<Option<String>>,
}

/// An in-memory table with equally sized named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns:  Vec<Column>,
    num_rows: usize,
}

impl Table {
    /// Build a table from `(name, values)` pairs.
    /// All columns must have the same number of rows.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<Option<String>>)>,
        S: Into<String>,
    {
        let mut table = Table::default();
        for (name, values) in columns {
            table.push_column(name, values)?;
        }
        Ok(table)
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Option<String>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Value of `name` in row `row`, `None` if the column or the cell is missing.
    pub fn cell(&self, name: &str, row: usize) -> Option<&str> {
        self.column(name)?.get(row)?.as_deref()
    }

    /// Append a column, or replace the column with the same name.
    pub fn push_column(
        &mut self,
        name:   impl Into<String>,
        values: Vec<Option<String>>,
    ) -> Result<()> {
        let name = name.into();
        if !self.columns.is_empty() && values.len() != self.num_rows {
            bail!(
                "column '{}' has {} rows, table has {}",
                name,
                values.len(),
                self.num_rows
            );
        }
        self.num_rows = values.len();

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None           => self.columns.push(Column { name, values }),
        }
        Ok(())
    }

    /// A one-row table holding row `row` (for per-row metric calls).
    pub fn slice_row(&self, row: usize) -> Option<Table> {
        if row >= self.num_rows {
            return None;
        }
        let columns = self
            .columns
            .iter()
            .map(|c| Column { name: c.name.clone(), values: vec![c.values[row].clone()] })
            .collect();
        Some(Table { columns, num_rows: 1 })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(v: &[&str]) -> Vec<Option<String>> {
        v.iter().map(|s| Some(s.to_string())).collect()
    }

    #[test]
    fn test_rejects_ragged_columns() {
        let result = Table::from_columns(vec![
            ("a", cells(&["1", "2"])),
            ("b", cells(&["1"])),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_push_column_replaces_existing() {
        let mut t = Table::from_columns(vec![("a", cells(&["1", "2"]))]).unwrap();
        t.push_column("a", cells(&["x", "y"])).unwrap();
        assert_eq!(t.num_columns(), 1);
        assert_eq!(t.cell("a", 1), Some("y"));
    }

    #[test]
    fn test_slice_row() {
        let t = Table::from_columns(vec![
            ("a", cells(&["1", "2"])),
            ("b", vec![None, Some("z".into())]),
        ])
        .unwrap();
        let row = t.slice_row(1).unwrap();
        assert_eq!(row.num_rows(), 1);
        assert_eq!(row.cell("b", 0), Some("z"));
        assert!(t.slice_row(2).is_none());
    }
}
