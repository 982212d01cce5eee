//! Connection configuration applied once at open time.

use std::os::raw::c_int;
use std::time::Duration;

use super::ffi;

/// `PRAGMA journal_mode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    /// Rollback journal deleted at the end of each transaction.
    Delete,
    /// Rollback journal truncated instead of deleted.
    Truncate,
    /// Write-ahead log; enables concurrent readers during writes.
    Wal,
    /// Journal kept in memory.
    Memory,
    /// No journal.
    Off,
}

impl JournalMode {
    /// The pragma argument.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
            Self::Wal => "WAL",
            Self::Memory => "MEMORY",
            Self::Off => "OFF",
        }
    }
}

/// `sqlite3_wal_checkpoint_v2` modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckpointMode {
    /// Checkpoint as many frames as possible without waiting.
    #[default]
    Passive,
    /// Wait for writers, then checkpoint everything.
    Full,
    /// Like `Full`, then wait for readers so the log restarts.
    Restart,
    /// Like `Restart`, then truncate the log file.
    Truncate,
}

impl CheckpointMode {
    pub(crate) const fn code(self) -> c_int {
        match self {
            Self::Passive => ffi::SQLITE_CHECKPOINT_PASSIVE,
            Self::Full => ffi::SQLITE_CHECKPOINT_FULL,
            Self::Restart => ffi::SQLITE_CHECKPOINT_RESTART,
            Self::Truncate => ffi::SQLITE_CHECKPOINT_TRUNCATE,
        }
    }
}

/// Options for [`Connection::open`](super::Connection::open).
///
/// The defaults open read-write, create the file if missing, enable
/// foreign keys and leave the journal mode and busy handler alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Open read-only.
    pub read_only: bool,
    /// Create the database file if it does not exist (ignored when
    /// `read_only` is set).
    pub create: bool,
    /// How long SQLite's busy handler waits on a locked database before
    /// returning `SQLITE_BUSY`. `None` keeps SQLite's default of failing
    /// immediately.
    pub busy_timeout: Option<Duration>,
    /// Journal mode to switch to after opening.
    pub journal_mode: Option<JournalMode>,
    /// `PRAGMA foreign_keys`.
    pub foreign_keys: bool,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            read_only: false,
            create: true,
            busy_timeout: None,
            journal_mode: None,
            foreign_keys: true,
        }
    }
}

impl ConnectionOptions {
    /// Sets [`read_only`](Self::read_only).
    #[must_use]
    pub const fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Sets [`create`](Self::create).
    #[must_use]
    pub const fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    /// Sets [`busy_timeout`](Self::busy_timeout).
    #[must_use]
    pub const fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    /// Sets [`journal_mode`](Self::journal_mode).
    #[must_use]
    pub const fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = Some(mode);
        self
    }

    /// Sets [`foreign_keys`](Self::foreign_keys).
    #[must_use]
    pub const fn foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    pub(crate) const fn open_flags(&self) -> c_int {
        if self.read_only {
            ffi::SQLITE_OPEN_READONLY | ffi::SQLITE_OPEN_URI
        } else if self.create {
            ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE | ffi::SQLITE_OPEN_URI
        } else {
            ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_URI
        }
    }

    /// The pragma script run right after opening.
    pub(crate) fn pragmas(&self) -> String {
        let mut sql = format!(
            "PRAGMA foreign_keys = {};",
            if self.foreign_keys { "ON" } else { "OFF" }
        );
        if let Some(mode) = self.journal_mode {
            sql.push_str(&format!(" PRAGMA journal_mode = {};", mode.as_str()));
        }
        sql
    }
}
