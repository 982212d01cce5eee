//! Typed records over `SQLite` prepared statements.
//!
//! `rowbind` moves values between plain Rust records and the five `SQLite`
//! storage classes (Integer, Float, Text, Blob, Null). A record's members
//! are ordered by declaration; a compiled [`ParameterConverter`] binds them
//! to parameters `0..n`, and a compiled [`ResultConverter`] assigns columns
//! `0..n` back to them. How each field type is converted is decided by its
//! [`SqlType`] codecs, which can be overridden per member.
//!
//! ```
//! use rowbind::{Connection, ParameterConverter, ResultConverter, Statement};
//!
//! rowbind::record! {
//!     #[derive(Debug, Default, PartialEq)]
//!     pub struct Person {
//!         pub id: i64,
//!         pub name: String,
//!         pub nickname: Option<String>,
//!     }
//! }
//!
//! # fn main() -> rowbind::Result<()> {
//! let conn = Connection::open_in_memory()?;
//! conn.execute_batch("CREATE TABLE people (id INTEGER, name TEXT, nickname TEXT)")?;
//!
//! let insert = Statement::prepare(&conn, "INSERT INTO people VALUES (?1, ?2, ?3)")?;
//! let params = ParameterConverter::<Person>::build()?;
//! let alice = Person { id: 1, name: "alice".into(), nickname: None };
//! insert.execute_with(&params, &alice)?;
//!
//! let select = Statement::prepare(&conn, "SELECT id, name, nickname FROM people")?;
//! let rows = ResultConverter::<Person>::build()?;
//! let people = select.query(&rows)?.collect::<rowbind::Result<Vec<_>>>()?;
//! assert_eq!(people, vec![alice]);
//! # Ok(())
//! # }
//! ```
//!
//! Row views and cursors capture the statement version; any use after a
//! reset fails with [`StaleViewError`] instead of reading another cycle's
//! row.

pub mod accessor;
mod cancel;
pub mod codec;
pub mod converter;
pub mod error;
pub mod logger;
mod native;
pub mod row;
pub mod schema;
mod statement;

pub use accessor::{Accessor, Getter, Setter};
pub use cancel::CancellationToken;
pub use codec::{Param, ReadCodec, SqlType, WriteCodec};
pub use converter::{Direction, ParameterBuilder, ParameterConverter, ResultBuilder, ResultConverter};
pub use error::{
    ArityError, AssignmentError, AssignmentFailure, BindingError, BindingFailure, BoxError,
    BuildError, Error, Result, SchemaError, SchemaViolation, StaleViewError,
};
pub use native::{BindTarget, ColumnSource};
pub use row::{Cursor, Row, Rows};
pub use schema::{Member, Record, Schema, SchemaBuilder, Shape};
pub use statement::{Statement, StatementState};

pub use rowbind_db as db;
pub use rowbind_db::{
    CheckpointMode, Connection, ConnectionOptions, DbError, JournalMode, StorageClass, Value,
    ValueRef,
};
