//! Errors surfaced by the engine layer.

use thiserror::Error;

use super::ffi;

/// Raw (possibly extended) `SQLite` result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DbErrorCode(pub i32);

impl DbErrorCode {
    /// `SQLITE_MISUSE`: the API was used incorrectly.
    pub const MISUSE: Self = Self(ffi::SQLITE_MISUSE);
    /// `SQLITE_RANGE`: a parameter index was out of range.
    pub const RANGE: Self = Self(ffi::SQLITE_RANGE);

    /// The primary result code (the low byte of an extended code).
    #[must_use]
    pub const fn primary(self) -> i32 {
        self.0 & 0xff
    }

    /// `true` for `SQLITE_BUSY` and `SQLITE_LOCKED`, the codes a caller may
    /// choose to retry on.
    #[must_use]
    pub const fn is_busy(self) -> bool {
        matches!(self.primary(), ffi::SQLITE_BUSY | ffi::SQLITE_LOCKED)
    }
}

impl std::fmt::Display for DbErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failure reported by `SQLite`, with the engine's own message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sqlite error {code}: {message}")]
pub struct DbError {
    /// Result code of the failing call.
    pub code: DbErrorCode,
    /// `sqlite3_errmsg` text, or a fixed description when the handle is gone.
    pub message: String,
}

impl DbError {
    /// Wraps a raw result code and its message.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            code: DbErrorCode(code),
            message,
        }
    }

    /// See [`DbErrorCode::is_busy`].
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.code.is_busy()
    }
}

/// Shorthand used throughout the engine layer.
pub type DbResult<T> = Result<T, DbError>;
