//! Native engine behind `rowbind`: a thin safe layer over bundled `SQLite`.
//!
//! `libsqlite3-sys` compiles the amalgamation (`bundled` feature), so no
//! system library is needed. The surface is what the codec layer needs:
//! statement prepare/step/reset/finalize, zero-based parameter binding,
//! storage-class aware column reads that borrow engine memory, and the
//! connection plumbing around them (options, transactions, WAL checkpoints).
//! `unsafe` and C types stay inside `ffi`.

mod ffi;

mod connection;
pub mod error;
mod options;
mod statement;
mod transaction;
pub mod value;

pub use connection::Connection;
pub use error::{DbError, DbErrorCode, DbResult};
pub use options::{CheckpointMode, ConnectionOptions, JournalMode};
pub use statement::{Statement, StepResult};
pub use transaction::{Transaction, TransactionBehavior};
pub use value::{StorageClass, Value, ValueRef};
