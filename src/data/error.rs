// Errors raised while building or reading a dataset.

use crate::data::dataset::DatasetMode;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("the {mode} table does not contain the required column: {column}")]
    MissingColumn { mode: DatasetMode, column: String },

    #[error("the {mode} table column {column} contains missing values")]
    MissingValues { mode: DatasetMode, column: String },

    #[error("prompt column '{0}' not found")]
    MissingPromptColumn(String),

    #[error("parent chain of row {row} loops back to row {repeated}")]
    ParentCycle { row: usize, repeated: usize },

    #[error("parent chain of row {row} is deeper than {max_depth} ancestors")]
    ChainTooDeep { row: usize, max_depth: usize },

    #[error("index {index} is out of range for a dataset of {len} rows")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Tokenizer(#[from] anyhow::Error),
}
