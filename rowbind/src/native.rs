//! The seam between converters and whatever holds the values.
//!
//! Converters only ever bind through [`BindTarget`] and read through
//! [`ColumnSource`]. The engine statement implements both; so do plain
//! value lists, which lets converters run without a database.

use rowbind_db::{DbError, DbErrorCode, DbResult, Statement, Value, ValueRef};

/// Something parameters can be bound to, by 0-based index.
pub trait BindTarget {
    /// Number of parameters.
    fn parameter_count(&self) -> usize;

    /// Binds `value` to parameter `index`.
    fn bind_value(&mut self, index: usize, value: ValueRef<'_>) -> DbResult<()>;
}

/// Something columns can be read from, by 0-based index.
pub trait ColumnSource {
    /// Number of columns.
    fn column_count(&self) -> usize;

    /// Column `index` tagged with its storage class. Out of range columns
    /// read as NULL.
    fn column_value(&self, index: usize) -> ValueRef<'_>;
}

impl BindTarget for Statement<'_> {
    fn parameter_count(&self) -> usize {
        Statement::parameter_count(self)
    }

    fn bind_value(&mut self, index: usize, value: ValueRef<'_>) -> DbResult<()> {
        Statement::bind_value(self, index, value)
    }
}

impl ColumnSource for Statement<'_> {
    fn column_count(&self) -> usize {
        Statement::column_count(self)
    }

    fn column_value(&self, index: usize) -> ValueRef<'_> {
        Statement::column_value(self, index)
    }
}

/// A pre-sized parameter list; binding overwrites slots in place.
impl BindTarget for [Value] {
    fn parameter_count(&self) -> usize {
        self.len()
    }

    fn bind_value(&mut self, index: usize, value: ValueRef<'_>) -> DbResult<()> {
        let len = self.len();
        let slot = self.get_mut(index).ok_or_else(|| {
            DbError::new(
                DbErrorCode::RANGE.0,
                format!("parameter index {index} out of range for {len} values"),
            )
        })?;
        *slot = value.to_value();
        Ok(())
    }
}

impl BindTarget for Vec<Value> {
    fn parameter_count(&self) -> usize {
        self.len()
    }

    fn bind_value(&mut self, index: usize, value: ValueRef<'_>) -> DbResult<()> {
        self.as_mut_slice().bind_value(index, value)
    }
}

impl ColumnSource for [Value] {
    fn column_count(&self) -> usize {
        self.len()
    }

    fn column_value(&self, index: usize) -> ValueRef<'_> {
        self.get(index).map_or(ValueRef::Null, Value::as_value_ref)
    }
}

impl ColumnSource for Vec<Value> {
    fn column_count(&self) -> usize {
        self.len()
    }

    fn column_value(&self, index: usize) -> ValueRef<'_> {
        self.as_slice().column_value(index)
    }
}
