use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use tableau_send_protocol::OverwritePolicy;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{ExtractBackend, ExtractKind};
use crate::error::ExtractError;
use crate::schema::{Cell, ColumnSpec, TableDefinition, resolve_bindings};

/// Name of the single table written to every extract.
pub const EXTRACT_TABLE: &str = "Extract";

/// Outcome of [`ExtractWriter::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub rows_written: u64,
    pub columns_written: usize,
    /// Input columns without a Tableau counterpart.
    pub skipped_columns: Vec<String>,
    /// `true` if rows were added to a table that already existed.
    pub appended: bool,
}

/// Writes tables into extract files through a backend.
///
/// The backend sits behind a mutex that is held from `initialize` to
/// `cleanup`, so concurrent writes through one writer are serialized.
pub struct ExtractWriter<B> {
    backend: Mutex<B>,
}

impl<B: ExtractBackend> ExtractWriter<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Mutex::new(backend),
        }
    }

    pub fn kind(&self) -> Result<ExtractKind, ExtractError> {
        Ok(self.lock()?.kind())
    }

    /// Writes `rows` to the `Extract` table of the file at `path`.
    ///
    /// An existing file is handled by `policy`: `Abort` fails before
    /// anything is touched, `Overwrite` deletes it first and `Append` adds
    /// rows to its table (creating the table if it is missing).
    pub fn write<I>(
        &self,
        path: &Path,
        policy: OverwritePolicy,
        schema: &[ColumnSpec],
        rows: I,
        cancel: &CancellationToken,
    ) -> Result<WriteSummary, ExtractError>
    where
        I: IntoIterator,
        I::Item: AsRef<[Cell]>,
    {
        self.write_with_progress(path, policy, schema, rows, cancel, |_| {})
    }

    /// Like [`write`](Self::write), calling `on_row` with the running row count.
    pub fn write_with_progress<I, F>(
        &self,
        path: &Path,
        policy: OverwritePolicy,
        schema: &[ColumnSpec],
        rows: I,
        cancel: &CancellationToken,
        mut on_row: F,
    ) -> Result<WriteSummary, ExtractError>
    where
        I: IntoIterator,
        I::Item: AsRef<[Cell]>,
        F: FnMut(u64),
    {
        let exists = path.try_exists()?;
        if exists {
            match policy {
                OverwritePolicy::Abort => {
                    return Err(ExtractError::FileExists(path.to_path_buf()));
                }
                OverwritePolicy::Overwrite => {
                    debug!(path = %path.display(), "removing existing extract");
                    std::fs::remove_file(path)?;
                }
                OverwritePolicy::Append => {}
            }
        }
        let append = exists && policy == OverwritePolicy::Append;

        let bindings = resolve_bindings(schema);
        let skipped_columns: Vec<String> = schema
            .iter()
            .enumerate()
            .filter(|(i, _)| !bindings.iter().any(|b| b.source_index == *i))
            .map(|(_, c)| c.name.clone())
            .collect();
        if !skipped_columns.is_empty() {
            debug!(columns = ?skipped_columns, "skipping columns without a Tableau type");
        }

        let mut library = Initialized::enter(self.lock()?)?;
        let backend = &mut *library.backend;

        let mut file = backend
            .open(path)
            .map_err(ExtractError::backend("open extract file"))?;
        let appended = append
            && file
                .has_table(EXTRACT_TABLE)
                .map_err(ExtractError::backend("inspect extract file"))?;
        let mut table = if appended {
            file.open_table(EXTRACT_TABLE)
                .map_err(ExtractError::backend("open table"))?
        } else {
            file.create_table(EXTRACT_TABLE, &TableDefinition::from_bindings(&bindings))
                .map_err(ExtractError::backend("create table"))?
        };

        let mut values = Vec::with_capacity(bindings.len());
        let mut rows_written: u64 = 0;
        for row in rows {
            if cancel.is_cancelled() {
                warn!(rows_written, "extract writing cancelled");
                return Err(ExtractError::Cancelled);
            }
            let row = row.as_ref();
            if row.len() != schema.len() {
                return Err(ExtractError::RowWidth {
                    row: rows_written,
                    expected: schema.len(),
                    actual: row.len(),
                });
            }

            values.clear();
            for binding in &bindings {
                values.push(binding.convert(rows_written, &row[binding.source_index])?);
            }
            table
                .insert(&values)
                .map_err(ExtractError::backend("insert row"))?;
            rows_written += 1;
            on_row(rows_written);
        }

        drop(table);
        file.close()
            .map_err(ExtractError::backend("close extract file"))?;
        library.finish()?;

        info!(
            path = %path.display(),
            rows = rows_written,
            appended,
            "wrote extract"
        );
        Ok(WriteSummary {
            rows_written,
            columns_written: bindings.len(),
            skipped_columns,
            appended,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, B>, ExtractError> {
        self.backend.lock().map_err(|_| ExtractError::Poisoned)
    }
}

/// Holds the backend lock between `initialize` and `cleanup`.
///
/// Dropping without [`finish`](Self::finish) still cleans up, logging any
/// failure instead of returning it.
struct Initialized<'a, B: ExtractBackend> {
    backend: MutexGuard<'a, B>,
    active: bool,
}

impl<'a, B: ExtractBackend> Initialized<'a, B> {
    fn enter(mut backend: MutexGuard<'a, B>) -> Result<Self, ExtractError> {
        backend
            .initialize()
            .map_err(ExtractError::backend("initialize"))?;
        Ok(Self {
            backend,
            active: true,
        })
    }

    fn finish(mut self) -> Result<(), ExtractError> {
        self.active = false;
        self.backend
            .cleanup()
            .map_err(ExtractError::backend("clean up"))
    }
}

impl<B: ExtractBackend> Drop for Initialized<'_, B> {
    fn drop(&mut self) {
        if self.active
            && let Err(e) = self.backend.cleanup()
        {
            warn!(error = %e, "extract backend cleanup failed");
        }
    }
}
