use std::path::PathBuf;

use crate::backend::BackendError;
use crate::schema::ColumnKind;

/// Errors produced while writing an extract.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("extract file already exists: {}", .0.display())]
    FileExists(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("extract backend failed to {op}: {source}")]
    Backend {
        op: &'static str,
        #[source]
        source: BackendError,
    },

    #[error("row {row}: value in column {column:?} is not a {expected}")]
    CellMismatch {
        row: u64,
        column: String,
        expected: ColumnKind,
    },

    #[error("row {row} has {actual} cells, schema has {expected}")]
    RowWidth {
        row: u64,
        expected: usize,
        actual: usize,
    },

    #[error("extract backend lock poisoned")]
    Poisoned,

    #[error("cancelled")]
    Cancelled,
}

impl ExtractError {
    pub(crate) fn backend(op: &'static str) -> impl FnOnce(BackendError) -> Self {
        move |source| Self::Backend { op, source }
    }
}
