//! Scoped `BEGIN` / `COMMIT` guard over a [`Connection`].

use super::connection::Connection;
use super::error::DbResult;
use super::statement::Statement;
use super::value::Value;

/// Lock acquired when the transaction opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionBehavior {
    /// Locks are taken lazily by the first read or write.
    #[default]
    Deferred,
    /// Takes the write lock up front so a later write cannot hit `SQLITE_BUSY`.
    Immediate,
    /// Like `Immediate`, and also blocks readers outside WAL mode.
    Exclusive,
}

impl TransactionBehavior {
    const fn begin_sql(self) -> &'static str {
        match self {
            Self::Deferred => "BEGIN DEFERRED",
            Self::Immediate => "BEGIN IMMEDIATE",
            Self::Exclusive => "BEGIN EXCLUSIVE",
        }
    }
}

/// Guard for an open transaction.
///
/// Dropping the guard without calling [`Transaction::commit`] rolls the
/// work back.
pub struct Transaction<'conn> {
    conn: &'conn Connection,
    open: bool,
}

impl<'conn> Transaction<'conn> {
    pub(super) fn begin(conn: &'conn Connection, behavior: TransactionBehavior) -> DbResult<Self> {
        conn.execute_batch(behavior.begin_sql())?;
        log::trace!("transaction opened ({behavior:?})");
        Ok(Self { conn, open: true })
    }

    /// Makes the transaction's writes durable.
    pub fn commit(mut self) -> DbResult<()> {
        self.conn.execute_batch("COMMIT")?;
        self.open = false;
        Ok(())
    }

    /// Discards the transaction's writes. Unlike dropping the guard, a
    /// failed rollback is reported.
    pub fn rollback(mut self) -> DbResult<()> {
        self.open = false;
        self.conn.execute_batch("ROLLBACK")
    }

    /// Underlying connection; anything prepared on it runs inside this
    /// transaction.
    #[must_use]
    pub const fn connection(&self) -> &'conn Connection {
        self.conn
    }

    /// Runs `sql` (possibly several statements) inside the transaction.
    pub fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.conn.execute_batch(sql)
    }

    /// Runs one statement with positional `params`, returning the number of
    /// changed rows.
    pub fn execute(&self, sql: &str, params: &[Value]) -> DbResult<usize> {
        self.conn.execute(sql, params)
    }

    /// Compiles `sql` on the transaction's connection.
    pub fn prepare(&self, sql: &str) -> DbResult<Statement<'conn>> {
        self.conn.prepare(sql)
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.open {
            if let Err(err) = self.conn.execute_batch("ROLLBACK") {
                log::debug!("rollback on drop failed: {err}");
            }
        }
    }
}
