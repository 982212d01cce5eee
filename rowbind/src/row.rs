//! Row views, cursors and typed row iteration.
//!
//! A view captures the statement's version when it is created. Every read
//! compares the captured version with the live one exactly once and fails
//! with [`StaleViewError`](crate::StaleViewError) if the statement was
//! reset in between. Text and blob spans are handed out only for the
//! duration of a read, so they never outlive the row buffer they alias.

use rowbind_db::{StorageClass, Value, ValueRef};

use crate::cancel::CancellationToken;
use crate::converter::ResultConverter;
use crate::error::{Error, Result};
use crate::statement::Statement;

/// The current row of a statement.
///
/// Obtained from [`Cursor::next_row`]; valid until the cursor advances.
pub struct Row<'s, 'conn> {
    stmt: &'s Statement<'conn>,
    version: u64,
}

impl<'s, 'conn> Row<'s, 'conn> {
    pub(crate) const fn new(stmt: &'s Statement<'conn>, version: u64) -> Self {
        Self { stmt, version }
    }

    /// Statement version this view was created at.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Number of columns.
    pub fn column_count(&self) -> Result<usize> {
        self.stmt.read_at(self.version, |raw| raw.column_count())
    }

    /// Name of column `index`.
    pub fn column_name(&self, index: usize) -> Result<Option<String>> {
        self.stmt
            .read_at(self.version, |raw| raw.column_name(index).map(str::to_owned))
    }

    /// Storage class of column `index`.
    pub fn storage_class(&self, index: usize) -> Result<StorageClass> {
        self.stmt
            .read_at(self.version, |raw| raw.column_type(index))
    }

    /// Calls `inspect` with column `index`. Text and blob values borrow the
    /// row buffer for the duration of the call.
    pub fn with_value<T>(&self, index: usize, inspect: impl FnOnce(ValueRef<'_>) -> T) -> Result<T> {
        self.stmt
            .read_at(self.version, |raw| inspect(raw.column_value(index)))
    }

    /// Copies column `index` out of the row.
    pub fn value(&self, index: usize) -> Result<Value> {
        self.with_value(index, |v| v.to_value())
    }

    /// Copies every column out of the row.
    pub fn to_values(&self) -> Result<Vec<Value>> {
        self.stmt.read_at(self.version, |raw| {
            (0..raw.column_count())
                .map(|i| raw.column_value(i).to_value())
                .collect()
        })
    }

    /// Assigns the row to `target` through `converter`.
    pub fn read_into<T: 'static>(&self, converter: &ResultConverter<T>, target: &mut T) -> Result<()> {
        self.stmt
            .read_at(self.version, |raw| converter.assign(target, raw))?
            .map_err(Error::from)
    }

    /// Assigns the row to a fresh `T::default()`.
    pub fn read<T: Default + 'static>(&self, converter: &ResultConverter<T>) -> Result<T> {
        self.stmt
            .read_at(self.version, |raw| converter.read(raw))?
            .map_err(Error::from)
    }
}

impl std::fmt::Debug for Row<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Row")
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// Steps a statement one row at a time.
///
/// Created by [`Statement::cursor`]. Each [`next_row`](Self::next_row)
/// borrows the cursor, so a row cannot be held across a step.
pub struct Cursor<'s, 'conn> {
    stmt: &'s Statement<'conn>,
    version: u64,
    done: bool,
}

impl<'s, 'conn> Cursor<'s, 'conn> {
    pub(crate) fn new(stmt: &'s Statement<'conn>) -> Self {
        Self {
            stmt,
            version: stmt.version(),
            done: false,
        }
    }

    /// Statement version this cursor was created at.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Advances to the next row. `Ok(None)` once the statement is done.
    pub fn next_row(&mut self) -> Result<Option<Row<'_, 'conn>>> {
        self.stmt.check_version(self.version)?;
        if self.done {
            return Ok(None);
        }
        if self.stmt.advance()? {
            Ok(Some(Row::new(self.stmt, self.version)))
        } else {
            self.done = true;
            Ok(None)
        }
    }
}

impl std::fmt::Debug for Cursor<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("version", &self.version)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Live,
    Exhausted,
    Failed,
}

/// Lazily assigns each row of a statement to a fresh `T`.
///
/// Created by [`Statement::query`]. Yields `Err` and then stops on the
/// first failure, cancellation included. The version is checked before
/// anything else, so a sequence that already ran out still reports one
/// [`StaleViewError`](crate::StaleViewError) once its statement is reset.
pub struct Rows<'s, 'conn, T> {
    stmt: &'s Statement<'conn>,
    converter: &'s ResultConverter<T>,
    version: u64,
    cancel: Option<CancellationToken>,
    scan: Scan,
}

impl<'s, 'conn, T: 'static> Rows<'s, 'conn, T> {
    pub(crate) fn new(stmt: &'s Statement<'conn>, converter: &'s ResultConverter<T>) -> Self {
        Self {
            stmt,
            converter,
            version: stmt.version(),
            cancel: None,
            scan: Scan::Live,
        }
    }

    /// Stops the scan with [`Error::Cancelled`] once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn next_record(&mut self) -> Result<Option<T>>
    where
        T: Default,
    {
        if !self.stmt.advance()? {
            return Ok(None);
        }
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            log::debug!("row scan for `{}` cancelled", self.converter.record());
            return Err(Error::Cancelled);
        }
        let mut record = T::default();
        self.stmt
            .with_raw(|raw| self.converter.assign(&mut record, raw))??;
        Ok(Some(record))
    }
}

impl<T: Default + 'static> Iterator for Rows<'_, '_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.scan == Scan::Failed {
            return None;
        }
        if let Err(stale) = self.stmt.check_version(self.version) {
            self.scan = Scan::Failed;
            return Some(Err(stale.into()));
        }
        if self.scan == Scan::Exhausted {
            return None;
        }
        let next = self.next_record();
        match next {
            Ok(Some(_)) => {}
            Ok(None) => self.scan = Scan::Exhausted,
            Err(_) => self.scan = Scan::Failed,
        }
        next.transpose()
    }
}

impl<T> std::fmt::Debug for Rows<'_, '_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rows")
            .field("version", &self.version)
            .field("scan", &self.scan)
            .finish_non_exhaustive()
    }
}
