//! Database handle: open, configure, run SQL, close.
//!
//! No `unsafe` here; every C call goes through [`ffi::RawDb`].

use std::os::raw::c_int;
use std::path::Path;

use super::error::{DbError, DbResult};
use super::ffi::{self, RawDb};
use super::options::{CheckpointMode, ConnectionOptions};
use super::statement::{Statement, StepResult};
use super::transaction::{Transaction, TransactionBehavior};
use super::value::Value;

/// An open `SQLite` database.
///
/// Closed when dropped, or earlier through [`close`](Self::close). Not
/// `Send` or `Sync`: a connection and its statements belong to one thread.
pub struct Connection {
    db: RawDb,
}

impl Connection {
    /// Opens the database file at `path`, then applies the busy timeout and
    /// pragmas carried by `options`.
    pub fn open(path: &Path, options: &ConnectionOptions) -> DbResult<Self> {
        let location = path.to_string_lossy();
        let conn = Self {
            db: RawDb::open(&location, options.open_flags())?,
        };
        conn.configure(options)?;
        log::debug!("opened sqlite database at {location}");
        Ok(conn)
    }

    /// Fresh private database that lives as long as the connection.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::open(Path::new(":memory:"), &ConnectionOptions::default())
    }

    fn configure(&self, options: &ConnectionOptions) -> DbResult<()> {
        if let Some(timeout) = options.busy_timeout {
            let millis = c_int::try_from(timeout.as_millis()).unwrap_or(c_int::MAX);
            self.db.busy_timeout(millis)?;
        }
        self.execute_batch(&options.pragmas())
    }

    /// Runs a script of `;`-separated statements, discarding any rows.
    pub fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.db.exec(sql)
    }

    /// Compiles one statement.
    pub fn prepare(&self, sql: &str) -> DbResult<Statement<'_>> {
        self.db.prepare(sql).map(Statement::new)
    }

    /// One-shot statement with positional `params`. Steps to completion and
    /// returns [`changes`](Self::changes).
    pub fn execute(&self, sql: &str, params: &[Value]) -> DbResult<usize> {
        let mut stmt = self.prepare(sql)?;
        stmt.bind_values(params)?;
        while let StepResult::Row = stmt.step()? {}
        Ok(self.changes())
    }

    /// Maps the first row of a one-shot query, failing with `SQLITE_DONE`
    /// when the query is empty.
    pub fn query_row<T>(
        &self,
        sql: &str,
        params: &[Value],
        mapper: impl FnOnce(&Statement<'_>) -> DbResult<T>,
    ) -> DbResult<T> {
        match self.query_row_optional(sql, params, mapper)? {
            Some(value) => Ok(value),
            None => Err(DbError::new(ffi::SQLITE_DONE, "query returned no rows")),
        }
    }

    /// Maps the first row of a one-shot query, if there is one.
    pub fn query_row_optional<T>(
        &self,
        sql: &str,
        params: &[Value],
        mapper: impl FnOnce(&Statement<'_>) -> DbResult<T>,
    ) -> DbResult<Option<T>> {
        let mut stmt = self.prepare(sql)?;
        stmt.bind_values(params)?;
        if stmt.step()? == StepResult::Done {
            return Ok(None);
        }
        mapper(&stmt).map(Some)
    }

    /// `BEGIN DEFERRED`.
    pub fn transaction(&self) -> DbResult<Transaction<'_>> {
        self.transaction_with(TransactionBehavior::default())
    }

    /// Opens a transaction taking the locks `behavior` asks for.
    pub fn transaction_with(&self, behavior: TransactionBehavior) -> DbResult<Transaction<'_>> {
        Transaction::begin(self, behavior)
    }

    /// Rowid assigned by the latest successful `INSERT`.
    pub fn last_insert_rowid(&self) -> i64 {
        self.db.last_insert_rowid()
    }

    /// Rows touched by the latest `INSERT`, `UPDATE` or `DELETE`.
    pub fn changes(&self) -> usize {
        usize::try_from(self.db.changes()).unwrap_or(0)
    }

    /// Copies WAL content back into the database file.
    ///
    /// `Ok(false)` means another connection held the database and nothing
    /// was done; retrying is up to the caller. Outside WAL mode this
    /// succeeds without doing anything.
    pub fn checkpoint(&self, mode: CheckpointMode) -> DbResult<bool> {
        match self.db.wal_checkpoint(mode.code())? {
            ffi::SQLITE_OK => Ok(true),
            ffi::SQLITE_BUSY | ffi::SQLITE_LOCKED => {
                log::debug!("wal checkpoint ({mode:?}) skipped: database busy");
                Ok(false)
            }
            rc => Err(DbError::new(rc, self.db.errmsg())),
        }
    }

    /// `true` when `PRAGMA integrity_check` reports `ok`.
    pub fn integrity_check(&self) -> DbResult<bool> {
        let verdict = self.query_row("PRAGMA integrity_check;", &[], |stmt| {
            Ok(stmt.column_string(0))
        })?;
        Ok(verdict.trim() == "ok")
    }

    /// `false` once [`close`](Self::close) has succeeded.
    pub fn is_open(&self) -> bool {
        self.db.is_open()
    }

    /// Releases the handle. Repeated calls do nothing.
    pub fn close(&mut self) -> DbResult<()> {
        self.db.close()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}
