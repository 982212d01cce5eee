//! Statement lifecycle on top of the engine statement.
//!
//! Every execution entry point (`bind`, `execute`, `query`, `cursor`, ...)
//! starts a fresh cycle: if the statement has been stepped, or has handed
//! out a row sequence, since its last reset, it is reset first. That
//! advances the version and invalidates row views and cursors from the
//! previous cycle. Arity is checked before any of that touches the engine.

use std::cell::{Cell, RefCell, RefMut};

use rowbind_db::{Connection, Statement as DbStatement, StepResult, Value};

use crate::converter::{Direction, ParameterConverter, ResultConverter};
use crate::error::{ArityError, Error, Result, StaleViewError};
use crate::native::BindTarget;
use crate::row::{Cursor, Rows};

/// Where a statement is in its execution cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementState {
    /// Freshly prepared or reset; safe to bind.
    Prepared,
    /// Stepped at least once and not finished.
    Stepping,
    /// Stepped to completion, failed, or closed.
    Done,
}

/// A prepared statement driven through converters.
///
/// Borrows its [`Connection`]. Not `Sync`: one thread drives a statement,
/// while compiled converters can be shared freely.
pub struct Statement<'conn> {
    raw: RefCell<DbStatement<'conn>>,
    version: Cell<u64>,
    state: Cell<StatementState>,
    // A `Rows` or `Cursor` was handed out since the last reset.
    scanned: Cell<bool>,
}

impl<'conn> Statement<'conn> {
    /// Prepares `sql` on `conn`.
    pub fn prepare(conn: &'conn Connection, sql: &str) -> Result<Self> {
        Ok(Self::from_raw(conn.prepare(sql)?))
    }

    /// Wraps an already prepared engine statement.
    #[must_use]
    pub const fn from_raw(raw: DbStatement<'conn>) -> Self {
        Self {
            raw: RefCell::new(raw),
            version: Cell::new(0),
            state: Cell::new(StatementState::Prepared),
            scanned: Cell::new(false),
        }
    }

    /// Current version. Advances by exactly one on every reset.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version.get()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> StatementState {
        self.state.get()
    }

    /// Number of parameters in the compiled statement.
    pub fn parameter_count(&self) -> Result<usize> {
        Ok(self.raw_ref()?.parameter_count())
    }

    /// Number of result columns in the compiled statement.
    pub fn column_count(&self) -> Result<usize> {
        Ok(self.raw_ref()?.column_count())
    }

    /// SQL text of the statement.
    pub fn sql(&self) -> Result<Option<String>> {
        Ok(self.raw_ref()?.sql().map(str::to_owned))
    }

    /// `true` once [`close`](Self::close) has run.
    pub fn is_closed(&self) -> Result<bool> {
        Ok(self.raw_ref()?.is_finalized())
    }

    // ── Lifecycle ───────────────────────────────────────────────────────

    /// Resets the statement for re-execution. Bindings are kept.
    ///
    /// Fails with [`Error::RowInUse`] while a row value is being read, and
    /// with an engine error once the statement is closed; the version is
    /// left alone in both cases.
    pub fn reset(&self) -> Result<()> {
        self.raw_mut()?.reset()?;
        self.version.set(self.version.get().wrapping_add(1));
        self.state.set(StatementState::Prepared);
        self.scanned.set(false);
        log::trace!("statement reset to version {}", self.version.get());
        Ok(())
    }

    /// Finalizes the native statement. Closing twice is a no-op; dropping
    /// the statement closes it as well.
    pub fn close(&self) -> Result<()> {
        self.raw_mut()?.finalize()?;
        self.state.set(StatementState::Done);
        Ok(())
    }

    fn begin_cycle(&self) -> Result<()> {
        if self.state.get() == StatementState::Prepared && !self.scanned.get() {
            Ok(())
        } else {
            self.reset()
        }
    }

    fn begin_scan(&self) {
        self.scanned.set(true);
    }

    // ── Binding ─────────────────────────────────────────────────────────

    /// Binds `params` through `converter`, starting a fresh cycle.
    pub fn bind<P: 'static>(&self, converter: &ParameterConverter<P>, params: &P) -> Result<()> {
        converter.check_arity(self.parameter_count()?)?;
        self.begin_cycle()?;
        let mut raw = self.raw_mut()?;
        converter.bind_unchecked(params, &mut *raw)
    }

    /// Binds raw values in order, starting a fresh cycle.
    pub fn bind_values(&self, values: &[Value]) -> Result<()> {
        let expected = self.parameter_count()?;
        if values.len() != expected {
            return Err(ArityError {
                record: "values",
                direction: Direction::Parameters,
                entries: values.len(),
                expected,
            }
            .into());
        }
        self.begin_cycle()?;
        let mut raw = self.raw_mut()?;
        for (index, value) in values.iter().enumerate() {
            BindTarget::bind_value(&mut *raw, index, value.as_value_ref())?;
        }
        Ok(())
    }

    /// Resets every parameter to NULL, starting a fresh cycle.
    pub fn clear_bindings(&self) -> Result<()> {
        self.begin_cycle()?;
        Ok(self.raw_mut()?.clear_bindings()?)
    }

    // ── Execution ───────────────────────────────────────────────────────

    /// Runs the statement to completion with the current bindings and
    /// returns the number of rows it changed.
    pub fn execute(&self) -> Result<usize> {
        self.begin_cycle()?;
        while self.advance()? {}
        Ok(self.raw_ref()?.changes())
    }

    /// Binds `params` and runs the statement to completion.
    pub fn execute_with<P: 'static>(&self, converter: &ParameterConverter<P>, params: &P) -> Result<usize> {
        self.bind(converter, params)?;
        self.execute()
    }

    /// Starts a scan that assigns every row through `converter`.
    pub fn query<'s, T: 'static>(&'s self, converter: &'s ResultConverter<T>) -> Result<Rows<'s, 'conn, T>> {
        converter.check_arity(self.column_count()?)?;
        self.begin_cycle()?;
        self.begin_scan();
        Ok(Rows::new(self, converter))
    }

    /// Binds `params`, then starts a scan like [`query`](Self::query).
    pub fn query_with<'s, P: 'static, T: 'static>(
        &'s self,
        params_converter: &ParameterConverter<P>,
        params: &P,
        converter: &'s ResultConverter<T>,
    ) -> Result<Rows<'s, 'conn, T>> {
        converter.check_arity(self.column_count()?)?;
        self.bind(params_converter, params)?;
        self.begin_scan();
        Ok(Rows::new(self, converter))
    }

    /// First row assigned to a fresh `T`, or `None` if there are no rows.
    pub fn query_row<T: Default + 'static>(&self, converter: &ResultConverter<T>) -> Result<Option<T>> {
        self.query(converter)?.next().transpose()
    }

    /// Assigns the first row to `target`. Returns `false`, leaving `target`
    /// untouched, if there are no rows.
    pub fn query_into<T: 'static>(&self, converter: &ResultConverter<T>, target: &mut T) -> Result<bool> {
        converter.check_arity(self.column_count()?)?;
        self.begin_cycle()?;
        if !self.advance()? {
            return Ok(false);
        }
        let raw = self.raw_ref()?;
        converter.assign(target, &*raw)?;
        Ok(true)
    }

    /// Starts a row-by-row scan with the current bindings.
    pub fn cursor(&self) -> Result<Cursor<'_, 'conn>> {
        self.begin_cycle()?;
        self.begin_scan();
        Ok(Cursor::new(self))
    }

    // ── Internals for row views ─────────────────────────────────────────

    pub(crate) fn check_version(&self, captured: u64) -> Result<(), StaleViewError> {
        let current = self.version.get();
        if captured == current {
            Ok(())
        } else {
            Err(StaleViewError { captured, current })
        }
    }

    /// Steps once. `true` when a row is available.
    ///
    /// A finished cycle yields nothing more until the next reset; the
    /// engine is not stepped again, so it cannot restart the query on its
    /// own under the same version.
    pub(crate) fn advance(&self) -> Result<bool> {
        if self.state.get() == StatementState::Done {
            return Ok(false);
        }
        let step = self.raw_mut()?.step();
        match step {
            Ok(StepResult::Row) => {
                self.state.set(StatementState::Stepping);
                Ok(true)
            }
            Ok(StepResult::Done) => {
                self.state.set(StatementState::Done);
                Ok(false)
            }
            Err(e) => {
                self.state.set(StatementState::Done);
                Err(e.into())
            }
        }
    }

    /// Runs `read` against the current row after one version check.
    pub(crate) fn read_at<T>(&self, captured: u64, read: impl FnOnce(&DbStatement<'conn>) -> T) -> Result<T> {
        self.check_version(captured)?;
        self.with_raw(read)
    }

    /// Runs `read` against the current row without a version check.
    pub(crate) fn with_raw<T>(&self, read: impl FnOnce(&DbStatement<'conn>) -> T) -> Result<T> {
        let raw = self.raw_ref()?;
        Ok(read(&raw))
    }

    fn raw_ref(&self) -> Result<std::cell::Ref<'_, DbStatement<'conn>>> {
        self.raw.try_borrow().map_err(|_| Error::RowInUse)
    }

    fn raw_mut(&self) -> Result<RefMut<'_, DbStatement<'conn>>> {
        self.raw.try_borrow_mut().map_err(|_| Error::RowInUse)
    }
}

impl std::fmt::Debug for Statement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement")
            .field("version", &self.version.get())
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}
