//! Tableau extract writing.
//!
//! The native extract SDK is not linked here; it is plugged in through the
//! [`ExtractBackend`] trait. This crate owns everything around it: mapping
//! input columns to Tableau column kinds, the local-file overwrite policy,
//! and serializing backend initialization.

pub mod backend;
pub mod error;
pub mod schema;
pub mod writer;

pub use backend::{BackendError, ExtractBackend, ExtractFile, ExtractKind, TableSink};
pub use error::ExtractError;
pub use schema::{
    Cell, ColumnBinding, ColumnKind, ColumnSpec, TableDefinition, TableauValue, ValueType,
    resolve_bindings,
};
pub use writer::{EXTRACT_TABLE, ExtractWriter, WriteSummary};
