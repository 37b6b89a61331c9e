//! Seams for the native extract SDK.

use std::fmt;
use std::path::Path;

use crate::schema::{TableDefinition, TableauValue};

/// Error type returned by backend implementations.
pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Extract file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractKind {
    Hyper,
    Tde,
}

impl ExtractKind {
    /// Value for the `datasourceType` publish parameter.
    pub fn datasource_type(self) -> &'static str {
        match self {
            Self::Hyper => "hyper",
            Self::Tde => "tde",
        }
    }

    pub fn extension(self) -> &'static str {
        self.datasource_type()
    }

    /// Guesses the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "hyper" => Some(Self::Hyper),
            "tde" => Some(Self::Tde),
            _ => None,
        }
    }
}

impl fmt::Display for ExtractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.datasource_type())
    }
}

/// The native extract library.
///
/// `initialize` and `cleanup` bracket every use of the library; callers
/// never interleave two brackets on the same backend.
pub trait ExtractBackend: Send {
    fn kind(&self) -> ExtractKind;

    fn initialize(&mut self) -> Result<(), BackendError>;

    fn cleanup(&mut self) -> Result<(), BackendError>;

    /// Opens `path`, creating an empty extract if it does not exist.
    fn open(&mut self, path: &Path) -> Result<Box<dyn ExtractFile>, BackendError>;
}

/// An open extract file.
pub trait ExtractFile {
    fn has_table(&self, name: &str) -> Result<bool, BackendError>;

    fn create_table(
        &mut self,
        name: &str,
        definition: &TableDefinition,
    ) -> Result<Box<dyn TableSink>, BackendError>;

    fn open_table(&mut self, name: &str) -> Result<Box<dyn TableSink>, BackendError>;

    /// Flushes and closes the file.
    fn close(self: Box<Self>) -> Result<(), BackendError>;
}

/// Row-by-row writer for one table.
pub trait TableSink {
    /// Appends one row; values follow the table definition's column order.
    fn insert(&mut self, row: &[TableauValue]) -> Result<(), BackendError>;
}
