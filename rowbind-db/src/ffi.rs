//! Raw FFI layer over the SQLite library bundled by `libsqlite3-sys`.
//!
//! [`RawDb`] and [`RawStmt`] encapsulate the raw pointers and the C type
//! conversions. This is the **only** file in the crate that contains
//! `unsafe` code; everything else talks to these two types.

use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::os::raw::{c_char, c_int};
use std::ptr;

mod sys {
    pub use libsqlite3_sys::*;

    // The pre-generated bundled bindings omit `sqlite3_close_v2`; the symbol
    // is compiled into the bundled SQLite library, so declare it here.
    extern "C" {
        pub fn sqlite3_close_v2(db: *mut sqlite3) -> std::os::raw::c_int;
    }
}

use super::error::{DbError, DbResult};

// ── SQLite constants ────────────────────────────────────────────────────

pub use sys::{
    SQLITE_BLOB, SQLITE_BUSY, SQLITE_DONE, SQLITE_FLOAT, SQLITE_INTEGER,
    SQLITE_LOCKED, SQLITE_MISUSE, SQLITE_NULL, SQLITE_OK, SQLITE_RANGE, SQLITE_ROW,
    SQLITE_TEXT, SQLITE_TOOBIG,
};

// Open flags
pub use sys::{
    SQLITE_OPEN_CREATE, SQLITE_OPEN_READONLY, SQLITE_OPEN_READWRITE, SQLITE_OPEN_URI,
};

// Checkpoint modes
pub use sys::{
    SQLITE_CHECKPOINT_FULL, SQLITE_CHECKPOINT_PASSIVE, SQLITE_CHECKPOINT_RESTART,
    SQLITE_CHECKPOINT_TRUNCATE,
};

fn length(len: usize) -> DbResult<c_int> {
    c_int::try_from(len)
        .map_err(|_| DbError::new(SQLITE_TOOBIG, format!("value of {len} bytes is too large")))
}

fn closed(what: &str) -> DbError {
    DbError::new(SQLITE_MISUSE, format!("{what} is closed"))
}

/// Reads `sqlite3_errmsg` for `db`.
///
/// # Safety
///
/// `db` must be a valid (possibly failed-to-open) `sqlite3*` or null.
unsafe fn errmsg(db: *mut sys::sqlite3) -> String {
    if db.is_null() {
        return "unknown error".to_string();
    }
    let ptr = sys::sqlite3_errmsg(db);
    if ptr.is_null() {
        "unknown error".to_string()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

// ── Connection handle ───────────────────────────────────────────────────

/// Owned `sqlite3*` handle. Closed on drop.
pub struct RawDb {
    db: *mut sys::sqlite3,
}

impl RawDb {
    /// Opens a database with the given `sqlite3_open_v2` flags.
    pub fn open(path: &str, flags: c_int) -> DbResult<Self> {
        let c_path = CString::new(path)
            .map_err(|e| DbError::new(SQLITE_MISUSE, format!("invalid path: {e}")))?;
        let mut db: *mut sys::sqlite3 = ptr::null_mut();
        let rc = unsafe { sys::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, ptr::null()) };
        if rc != SQLITE_OK {
            // If open failed but we got a handle, extract the error and close.
            let msg = if db.is_null() {
                format!("sqlite3_open_v2 returned {rc}")
            } else {
                let msg = unsafe { errmsg(db) };
                unsafe {
                    sys::sqlite3_close_v2(db);
                }
                msg
            };
            return Err(DbError::new(rc, msg));
        }
        Ok(Self { db })
    }

    /// Returns `true` until [`close`](Self::close) succeeds.
    pub fn is_open(&self) -> bool {
        !self.db.is_null()
    }

    /// Closes the handle. Closing twice is a no-op.
    pub fn close(&mut self) -> DbResult<()> {
        if self.db.is_null() {
            return Ok(());
        }
        let rc = unsafe { sys::sqlite3_close_v2(self.db) };
        if rc != SQLITE_OK {
            return Err(DbError::new(rc, unsafe { errmsg(self.db) }));
        }
        self.db = ptr::null_mut();
        Ok(())
    }

    /// Runs one or more semicolon-separated statements via `sqlite3_exec`.
    pub fn exec(&self, sql: &str) -> DbResult<()> {
        if self.db.is_null() {
            return Err(closed("connection"));
        }
        let c_sql = CString::new(sql)
            .map_err(|e| DbError::new(SQLITE_MISUSE, format!("nul in SQL: {e}")))?;
        let mut err: *mut c_char = ptr::null_mut();
        let rc = unsafe { sys::sqlite3_exec(self.db, c_sql.as_ptr(), None, ptr::null_mut(), &mut err) };
        if rc != SQLITE_OK {
            let msg = if err.is_null() {
                unsafe { errmsg(self.db) }
            } else {
                let msg = unsafe { CStr::from_ptr(err) }.to_string_lossy().into_owned();
                unsafe {
                    sys::sqlite3_free(err.cast());
                }
                msg
            };
            return Err(DbError::new(rc, msg));
        }
        Ok(())
    }

    /// Compiles a single statement.
    pub fn prepare(&self, sql: &str) -> DbResult<RawStmt<'_>> {
        if self.db.is_null() {
            return Err(closed("connection"));
        }
        let len = length(sql.len())?;
        let mut stmt: *mut sys::sqlite3_stmt = ptr::null_mut();
        let rc = unsafe {
            sys::sqlite3_prepare_v2(
                self.db,
                sql.as_ptr().cast::<c_char>(),
                len,
                &mut stmt,
                ptr::null_mut(),
            )
        };
        if rc != SQLITE_OK {
            return Err(DbError::new(rc, unsafe { errmsg(self.db) }));
        }
        if stmt.is_null() {
            return Err(DbError::new(SQLITE_MISUSE, "SQL contains no statement"));
        }
        Ok(RawStmt {
            stmt,
            db: self.db,
            _db: PhantomData,
        })
    }

    /// Sets the busy handler timeout in milliseconds.
    pub fn busy_timeout(&self, millis: c_int) -> DbResult<()> {
        if self.db.is_null() {
            return Err(closed("connection"));
        }
        let rc = unsafe { sys::sqlite3_busy_timeout(self.db, millis) };
        self.check(rc)
    }

    /// Runs `sqlite3_wal_checkpoint_v2` on the main database and returns
    /// the raw result code (`SQLITE_OK` or `SQLITE_BUSY` among others).
    pub fn wal_checkpoint(&self, mode: c_int) -> DbResult<c_int> {
        if self.db.is_null() {
            return Err(closed("connection"));
        }
        let mut log_frames: c_int = 0;
        let mut checkpointed: c_int = 0;
        let rc = unsafe {
            sys::sqlite3_wal_checkpoint_v2(
                self.db,
                ptr::null(),
                mode,
                &mut log_frames,
                &mut checkpointed,
            )
        };
        Ok(rc)
    }

    /// Rows changed by the most recent statement.
    pub fn changes(&self) -> i64 {
        if self.db.is_null() {
            return 0;
        }
        i64::from(unsafe { sys::sqlite3_changes(self.db) })
    }

    /// Rowid of the most recent successful INSERT.
    pub fn last_insert_rowid(&self) -> i64 {
        if self.db.is_null() {
            return 0;
        }
        unsafe { sys::sqlite3_last_insert_rowid(self.db) }
    }

    /// Current error message for this connection.
    pub fn errmsg(&self) -> String {
        unsafe { errmsg(self.db) }
    }

    fn check(&self, rc: c_int) -> DbResult<()> {
        if rc == SQLITE_OK {
            Ok(())
        } else {
            Err(DbError::new(rc, self.errmsg()))
        }
    }
}

impl Drop for RawDb {
    fn drop(&mut self) {
        if !self.db.is_null() {
            unsafe {
                sys::sqlite3_close_v2(self.db);
            }
            self.db = ptr::null_mut();
        }
    }
}

// ── Statement handle ────────────────────────────────────────────────────

/// Owned `sqlite3_stmt*` handle tied to the connection that prepared it.
///
/// Stepping, resetting, binding and finalizing take `&mut self`; column
/// reads take `&self` and return spans borrowed from `self`, so a span can
/// never be observed after the statement moved to another row.
pub struct RawStmt<'db> {
    /// Null only after [`finalize`](Self::finalize).
    stmt: *mut sys::sqlite3_stmt,
    /// Owning `sqlite3*`, kept for error messages and change counts.
    db: *mut sys::sqlite3,
    _db: PhantomData<&'db RawDb>,
}

impl RawStmt<'_> {
    /// Returns `true` once the handle has been finalized.
    pub fn is_finalized(&self) -> bool {
        self.stmt.is_null()
    }

    fn live(&self) -> DbResult<*mut sys::sqlite3_stmt> {
        if self.stmt.is_null() {
            Err(closed("statement"))
        } else {
            Ok(self.stmt)
        }
    }

    fn check(&self, rc: c_int) -> DbResult<()> {
        if rc == SQLITE_OK {
            Ok(())
        } else {
            Err(self.error(rc))
        }
    }

    fn error(&self, rc: c_int) -> DbError {
        DbError::new(rc, unsafe { errmsg(self.db) })
    }

    /// Runs `sqlite3_step`, returning `SQLITE_ROW` or `SQLITE_DONE`.
    pub fn step(&mut self) -> DbResult<c_int> {
        let stmt = self.live()?;
        let rc = unsafe { sys::sqlite3_step(stmt) };
        match rc {
            SQLITE_ROW | SQLITE_DONE => Ok(rc),
            _ => Err(self.error(rc)),
        }
    }

    /// Runs `sqlite3_reset`. Bindings are kept. Fails only on a finalized
    /// handle.
    pub fn reset(&mut self) -> DbResult<()> {
        let stmt = self.live()?;
        let rc = unsafe { sys::sqlite3_reset(stmt) };
        // A non-OK code repeats the error of the last step, which step
        // already returned; the handle is reset regardless.
        if rc != SQLITE_OK {
            log::trace!("reset after failed step (rc {rc})");
        }
        Ok(())
    }

    /// Resets every parameter to NULL.
    pub fn clear_bindings(&mut self) -> DbResult<()> {
        let stmt = self.live()?;
        let rc = unsafe { sys::sqlite3_clear_bindings(stmt) };
        self.check(rc)
    }

    /// Finalizes the handle. Finalizing twice is a no-op.
    pub fn finalize(&mut self) -> DbResult<()> {
        if self.stmt.is_null() {
            return Ok(());
        }
        let rc = unsafe { sys::sqlite3_finalize(self.stmt) };
        self.stmt = ptr::null_mut();
        // sqlite3_finalize reports the error of the last step, the handle is
        // released either way.
        self.check(rc)
    }

    // ── Parameter binding (1-based indexes) ─────────────────────────────

    /// Binds a 64-bit integer.
    pub fn bind_i64(&mut self, idx: c_int, value: i64) -> DbResult<()> {
        let stmt = self.live()?;
        let rc = unsafe { sys::sqlite3_bind_int64(stmt, idx, value) };
        self.check(rc)
    }

    /// Binds a double.
    pub fn bind_f64(&mut self, idx: c_int, value: f64) -> DbResult<()> {
        let stmt = self.live()?;
        let rc = unsafe { sys::sqlite3_bind_double(stmt, idx, value) };
        self.check(rc)
    }

    /// Binds UTF-8 text. SQLite copies the bytes.
    pub fn bind_text(&mut self, idx: c_int, value: &str) -> DbResult<()> {
        let stmt = self.live()?;
        let len = length(value.len())?;
        let rc = unsafe {
            sys::sqlite3_bind_text(
                stmt,
                idx,
                value.as_ptr().cast::<c_char>(),
                len,
                sys::SQLITE_TRANSIENT(),
            )
        };
        self.check(rc)
    }

    /// Binds a blob. SQLite copies the bytes; an empty slice binds a
    /// zero-length blob, not NULL.
    pub fn bind_blob(&mut self, idx: c_int, value: &[u8]) -> DbResult<()> {
        let stmt = self.live()?;
        let len = length(value.len())?;
        let rc = if value.is_empty() {
            unsafe { sys::sqlite3_bind_zeroblob(stmt, idx, 0) }
        } else {
            unsafe {
                sys::sqlite3_bind_blob(stmt, idx, value.as_ptr().cast(), len, sys::SQLITE_TRANSIENT())
            }
        };
        self.check(rc)
    }

    /// Binds SQL NULL.
    pub fn bind_null(&mut self, idx: c_int) -> DbResult<()> {
        let stmt = self.live()?;
        let rc = unsafe { sys::sqlite3_bind_null(stmt, idx) };
        self.check(rc)
    }

    /// Number of SQL parameters.
    pub fn bind_parameter_count(&self) -> c_int {
        if self.stmt.is_null() {
            return 0;
        }
        unsafe { sys::sqlite3_bind_parameter_count(self.stmt) }
    }

    // ── Column reading (0-based indexes) ────────────────────────────────

    /// Number of result columns.
    pub fn column_count(&self) -> c_int {
        if self.stmt.is_null() {
            return 0;
        }
        unsafe { sys::sqlite3_column_count(self.stmt) }
    }

    /// Column name, when SQLite reports one as UTF-8.
    pub fn column_name(&self, idx: c_int) -> Option<&str> {
        if self.stmt.is_null() {
            return None;
        }
        unsafe {
            let ptr = sys::sqlite3_column_name(self.stmt, idx);
            if ptr.is_null() {
                None
            } else {
                CStr::from_ptr(ptr).to_str().ok()
            }
        }
    }

    /// Storage class code of the column in the current row.
    pub fn column_type(&self, idx: c_int) -> c_int {
        if self.stmt.is_null() {
            return SQLITE_NULL;
        }
        unsafe { sys::sqlite3_column_type(self.stmt, idx) }
    }

    /// Reads a column as `i64`.
    pub fn column_i64(&self, idx: c_int) -> i64 {
        if self.stmt.is_null() {
            return 0;
        }
        unsafe { sys::sqlite3_column_int64(self.stmt, idx) }
    }

    /// Reads a column as `f64`.
    pub fn column_f64(&self, idx: c_int) -> f64 {
        if self.stmt.is_null() {
            return 0.0;
        }
        unsafe { sys::sqlite3_column_double(self.stmt, idx) }
    }

    /// Borrows the column's UTF-8 text bytes (no terminator).
    ///
    /// Blob columns are returned through `sqlite3_column_blob` so that a
    /// blob-to-text conversion never invalidates a span handed out earlier.
    pub fn column_text(&self, idx: c_int) -> &[u8] {
        if self.stmt.is_null() {
            return &[];
        }
        if self.column_type(idx) == SQLITE_BLOB {
            return self.column_blob(idx);
        }
        unsafe {
            let ptr = sys::sqlite3_column_text(self.stmt, idx);
            let len = sys::sqlite3_column_bytes(self.stmt, idx);
            span(ptr, len)
        }
    }

    /// Borrows the column's blob bytes.
    pub fn column_blob(&self, idx: c_int) -> &[u8] {
        if self.stmt.is_null() {
            return &[];
        }
        unsafe {
            let ptr = sys::sqlite3_column_blob(self.stmt, idx);
            let len = sys::sqlite3_column_bytes(self.stmt, idx);
            span(ptr.cast(), len)
        }
    }

    /// Rows changed by the owning connection's most recent statement.
    pub fn changes(&self) -> i64 {
        i64::from(unsafe { sys::sqlite3_changes(self.db) })
    }

    /// The SQL text the statement was prepared from.
    pub fn sql(&self) -> Option<&str> {
        if self.stmt.is_null() {
            return None;
        }
        unsafe {
            let ptr = sys::sqlite3_sql(self.stmt);
            if ptr.is_null() {
                None
            } else {
                CStr::from_ptr(ptr).to_str().ok()
            }
        }
    }
}

/// Builds a byte span from a column pointer/length pair.
///
/// # Safety
///
/// `ptr` must be null or point at `len` readable bytes that stay valid for
/// the caller's borrow of the statement.
unsafe fn span<'a>(ptr: *const u8, len: c_int) -> &'a [u8] {
    match usize::try_from(len) {
        Ok(len) if len > 0 && !ptr.is_null() => std::slice::from_raw_parts(ptr, len),
        _ => &[],
    }
}

impl Drop for RawStmt<'_> {
    fn drop(&mut self) {
        if !self.stmt.is_null() {
            log::debug!("finalizing statement that was not closed explicitly");
            unsafe {
                sys::sqlite3_finalize(self.stmt);
            }
            self.stmt = ptr::null_mut();
        }
    }
}
