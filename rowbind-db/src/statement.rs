//! Prepared statements over [`ffi::RawStmt`].
//!
//! Indexes are 0-based for both parameters and columns; the 1-based
//! parameter numbering of the C API stays inside this file.

use std::os::raw::c_int;

use super::error::{DbError, DbResult};
use super::ffi::{self, RawStmt};
use super::value::{StorageClass, Value, ValueRef};

/// Outcome of advancing a statement by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// The statement produced a row; columns can be read until the next
    /// step or reset.
    Row,
    /// No more rows.
    Done,
}

/// Compiled SQL, borrowed from the [`Connection`](super::Connection) that
/// prepared it.
///
/// Finalized when dropped, or earlier through [`finalize`](Self::finalize).
pub struct Statement<'conn> {
    raw: RawStmt<'conn>,
}

fn parameter_index(idx: usize) -> DbResult<c_int> {
    idx.checked_add(1)
        .and_then(|i| c_int::try_from(i).ok())
        .ok_or_else(|| DbError::new(ffi::SQLITE_RANGE, format!("parameter index {idx} out of range")))
}

// Out-of-range columns read as NULL in SQLite, so saturating is enough.
fn column_index(idx: usize) -> c_int {
    c_int::try_from(idx).unwrap_or(c_int::MAX)
}

impl<'conn> Statement<'conn> {
    pub(super) const fn new(raw: RawStmt<'conn>) -> Self {
        Self { raw }
    }

    // binding

    /// Binds one value to parameter `idx` (0-based).
    pub fn bind_value(&mut self, idx: usize, value: ValueRef<'_>) -> DbResult<()> {
        let idx = parameter_index(idx)?;
        match value {
            ValueRef::Integer(v) => self.raw.bind_i64(idx, v),
            ValueRef::Float(v) => self.raw.bind_f64(idx, v),
            ValueRef::Text(v) => {
                let text = std::str::from_utf8(v).map_err(|e| {
                    DbError::new(ffi::SQLITE_MISUSE, format!("text parameter is not UTF-8: {e}"))
                })?;
                self.raw.bind_text(idx, text)
            }
            ValueRef::Blob(v) => self.raw.bind_blob(idx, v),
            ValueRef::Null => self.raw.bind_null(idx),
        }
    }

    /// Binds `values[i]` to parameter `i`. Parameters past the slice keep
    /// their previous binding.
    pub fn bind_values(&mut self, values: &[Value]) -> DbResult<()> {
        values
            .iter()
            .enumerate()
            .try_for_each(|(idx, value)| self.bind_value(idx, value.as_value_ref()))
    }

    /// Resets every parameter to NULL.
    pub fn clear_bindings(&mut self) -> DbResult<()> {
        self.raw.clear_bindings()
    }

    /// Number of SQL parameters in the statement.
    pub fn parameter_count(&self) -> usize {
        usize::try_from(self.raw.bind_parameter_count()).unwrap_or(0)
    }

    // stepping

    /// Advances to the next row.
    pub fn step(&mut self) -> DbResult<StepResult> {
        Ok(match self.raw.step()? {
            ffi::SQLITE_ROW => StepResult::Row,
            _ => StepResult::Done,
        })
    }

    /// Resets the statement so it can be stepped again. Bindings are kept.
    pub fn reset(&mut self) -> DbResult<()> {
        self.raw.reset()
    }

    /// Releases the native handle. Calling it again is a no-op; any other
    /// call on a finalized statement fails with `SQLITE_MISUSE`.
    pub fn finalize(&mut self) -> DbResult<()> {
        self.raw.finalize()
    }

    /// Returns `true` once [`finalize`](Self::finalize) has run.
    pub fn is_finalized(&self) -> bool {
        self.raw.is_finalized()
    }

    // columns

    /// Number of columns in the result set.
    pub fn column_count(&self) -> usize {
        usize::try_from(self.raw.column_count()).unwrap_or(0)
    }

    /// Name of column `idx`.
    pub fn column_name(&self, idx: usize) -> Option<&str> {
        self.raw.column_name(column_index(idx))
    }

    /// Storage class of column `idx` in the current row.
    pub fn column_type(&self, idx: usize) -> StorageClass {
        StorageClass::from_code(self.raw.column_type(column_index(idx)))
    }

    /// Shorthand for a `Null` [`column_type`](Self::column_type).
    pub fn is_column_null(&self, idx: usize) -> bool {
        self.column_type(idx) == StorageClass::Null
    }

    /// Integer value of column `idx`, with `SQLite`'s own coercions.
    pub fn column_i64(&self, idx: usize) -> i64 {
        self.raw.column_i64(column_index(idx))
    }

    /// Reads a column as `f64`.
    pub fn column_f64(&self, idx: usize) -> f64 {
        self.raw.column_f64(column_index(idx))
    }

    /// Borrows a column's text bytes. Empty for NULL.
    pub fn column_text(&self, idx: usize) -> &[u8] {
        self.raw.column_text(column_index(idx))
    }

    /// Reads a column as an owned, lossily decoded string. Empty for NULL.
    pub fn column_string(&self, idx: usize) -> String {
        String::from_utf8_lossy(self.column_text(idx)).into_owned()
    }

    /// Borrows a column's blob bytes. Empty for NULL.
    pub fn column_blob(&self, idx: usize) -> &[u8] {
        self.raw.column_blob(column_index(idx))
    }

    /// Reads column `idx` according to its storage class. Text and blob
    /// values borrow the row buffer.
    pub fn column_value(&self, idx: usize) -> ValueRef<'_> {
        match self.column_type(idx) {
            StorageClass::Integer => ValueRef::Integer(self.column_i64(idx)),
            StorageClass::Float => ValueRef::Float(self.column_f64(idx)),
            StorageClass::Text => ValueRef::Text(self.column_text(idx)),
            StorageClass::Blob => ValueRef::Blob(self.column_blob(idx)),
            StorageClass::Null => ValueRef::Null,
        }
    }

    // misc

    /// Rows changed by the most recently completed statement on the
    /// owning connection.
    pub fn changes(&self) -> usize {
        usize::try_from(self.raw.changes()).unwrap_or(0)
    }

    /// The SQL text of this statement.
    pub fn sql(&self) -> Option<&str> {
        self.raw.sql()
    }
}

impl std::fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("sql", &self.sql())
            .field("finalized", &self.is_finalized())
            .finish()
    }
}
