//! Storage classes and the parameter/column value types.

use std::fmt;
use std::str::Utf8Error;

use super::ffi;

/// The runtime tag of a value stored in or read from `SQLite`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageClass {
    /// 64-bit signed integer.
    Integer,
    /// IEEE 754 double.
    Float,
    /// Text (UTF-8 on the wire).
    Text,
    /// Binary blob.
    Blob,
    /// SQL NULL.
    Null,
}

impl StorageClass {
    /// All five classes, in `SQLite` code order.
    pub const ALL: [Self; 5] = [
        Self::Integer,
        Self::Float,
        Self::Text,
        Self::Blob,
        Self::Null,
    ];

    /// Maps a `sqlite3_column_type` code. Unknown codes map to `Null`.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            ffi::SQLITE_INTEGER => Self::Integer,
            ffi::SQLITE_FLOAT => Self::Float,
            ffi::SQLITE_TEXT => Self::Text,
            ffi::SQLITE_BLOB => Self::Blob,
            _ => Self::Null,
        }
    }

    /// Dense index (0..5), used for per-class dispatch tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Integer => 0,
            Self::Float => 1,
            Self::Text => 2,
            Self::Blob => 3,
            Self::Null => 4,
        }
    }

    /// Upper-case name as used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Integer => "Integer",
            Self::Float => "Float",
            Self::Text => "Text",
            Self::Blob => "Blob",
            Self::Null => "Null",
        }
    }
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An owned value that can be bound to a prepared statement parameter or
/// copied out of a result column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// 64-bit signed integer.
    Integer(i64),
    /// Double.
    Float(f64),
    /// UTF-8 text.
    Text(String),
    /// Binary blob.
    Blob(Vec<u8>),
    /// SQL NULL.
    Null,
}

impl Value {
    /// Storage class of this value.
    #[must_use]
    pub const fn storage_class(&self) -> StorageClass {
        match self {
            Self::Integer(_) => StorageClass::Integer,
            Self::Float(_) => StorageClass::Float,
            Self::Text(_) => StorageClass::Text,
            Self::Blob(_) => StorageClass::Blob,
            Self::Null => StorageClass::Null,
        }
    }

    /// Borrows this value.
    #[must_use]
    pub fn as_value_ref(&self) -> ValueRef<'_> {
        match self {
            Self::Integer(v) => ValueRef::Integer(*v),
            Self::Float(v) => ValueRef::Float(*v),
            Self::Text(v) => ValueRef::Text(v.as_bytes()),
            Self::Blob(v) => ValueRef::Blob(v),
            Self::Null => ValueRef::Null,
        }
    }
}

/// A borrowed value.
///
/// When read from a statement, `Text` and `Blob` alias `SQLite`'s row
/// buffers and are only valid until the statement steps or resets; the
/// borrow on the statement enforces that.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRef<'a> {
    /// 64-bit signed integer.
    Integer(i64),
    /// Double.
    Float(f64),
    /// Text bytes. `SQLite` does not validate UTF-8, so neither do we
    /// until [`as_str`](Self::as_str) is called.
    Text(&'a [u8]),
    /// Blob bytes.
    Blob(&'a [u8]),
    /// SQL NULL.
    Null,
}

impl<'a> ValueRef<'a> {
    /// Storage class of this value.
    #[must_use]
    pub const fn storage_class(&self) -> StorageClass {
        match self {
            Self::Integer(_) => StorageClass::Integer,
            Self::Float(_) => StorageClass::Float,
            Self::Text(_) => StorageClass::Text,
            Self::Blob(_) => StorageClass::Blob,
            Self::Null => StorageClass::Null,
        }
    }

    /// Borrowed text as `&str`; `None` if this is not a text value.
    pub fn as_str(&self) -> Option<Result<&'a str, Utf8Error>> {
        match *self {
            Self::Text(bytes) => Some(std::str::from_utf8(bytes)),
            _ => None,
        }
    }

    /// Copies the value out of the row buffer.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match *self {
            Self::Integer(v) => Value::Integer(v),
            Self::Float(v) => Value::Float(v),
            Self::Text(v) => Value::Text(String::from_utf8_lossy(v).into_owned()),
            Self::Blob(v) => Value::Blob(v.to_vec()),
            Self::Null => Value::Null,
        }
    }
}

impl<'a> From<&'a str> for ValueRef<'a> {
    fn from(v: &'a str) -> Self {
        Self::Text(v.as_bytes())
    }
}

impl<'a> From<&'a [u8]> for ValueRef<'a> {
    fn from(v: &'a [u8]) -> Self {
        Self::Blob(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Blob(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Blob(v.to_vec())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Convenience macro for building parameter lists.
///
/// Usage: `params![1_i64, blob.as_slice(), "text"]`
#[macro_export]
macro_rules! params {
    ($($val:expr),* $(,)?) => {
        &[$($crate::Value::from($val)),*][..]
    };
}
