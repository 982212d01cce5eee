//! Error taxonomy of the codec engine.
//!
//! Build-time problems ([`SchemaError`], [`BuildError`]) surface from
//! converter compilation. Data problems ([`BindingError`],
//! [`AssignmentError`]) and caller bugs ([`ArityError`], [`StaleViewError`],
//! [`Error::RowInUse`]) surface from the statement operation that detected
//! them. Engine failures are propagated verbatim as [`Error::Engine`].

use std::fmt;

use rowbind_db::{DbError, StorageClass};
use thiserror::Error;

use crate::converter::Direction;

/// Boxed error returned by conversion functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type of statement operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why a record type could not provide a verifiable member order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    /// The schema declares no members.
    #[error("no members declared")]
    Empty,
    /// Two members share a name.
    #[error("member `{0}` declared twice")]
    DuplicateMember(&'static str),
    /// A tuple member is not named after its position.
    #[error("tuple member at position {position} is named `{found}`")]
    TupleOrder {
        /// Declaration position.
        position: usize,
        /// Name found at that position.
        found: &'static str,
    },
}

/// A record type cannot yield a stable member ordering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record `{record}` has no stable member order: {violation}")]
pub struct SchemaError {
    /// Record type name.
    pub record: &'static str,
    /// What was wrong with the declaration.
    pub violation: SchemaViolation,
}

/// Converter compilation failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The record schema itself is invalid.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// An override or ignore names a member the record does not have.
    #[error("record `{record}` has no member `{member}`")]
    UnknownMember {
        /// Record type name.
        record: &'static str,
        /// Requested member name.
        member: String,
    },
    /// An override codec was registered for a different field type.
    #[error("override for `{record}.{member}` converts `{found}`, but the member is `{expected}`")]
    OverrideType {
        /// Record type name.
        record: &'static str,
        /// Member name.
        member: &'static str,
        /// Declared member type.
        expected: &'static str,
        /// Type the override converts.
        found: &'static str,
    },
    /// The member exists but has no getter (parameters) or setter (columns).
    #[error("member `{record}.{member}` has no accessor usable for {direction} conversion")]
    MissingAccessor {
        /// Record type name.
        record: &'static str,
        /// Member name.
        member: &'static str,
        /// Direction that needed the accessor.
        direction: Direction,
    },
}

/// Why a value could not be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingFailure {
    /// No guard matched and there is no unconditional conversion.
    NoConversion,
    /// The selected conversion to this storage class returned an error.
    ConversionFailed(StorageClass),
}

impl fmt::Display for BindingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoConversion => f.write_str("no applicable conversion"),
            Self::ConversionFailed(class) => write!(f, "conversion to class {class} failed"),
        }
    }
}

/// A record field could not be written into a query parameter.
#[derive(Debug, Error)]
#[error("cannot bind `{record}.{member}` ({member_type}) = {value}: {failure}")]
pub struct BindingError {
    /// Record type name.
    pub record: &'static str,
    /// Member name.
    pub member: &'static str,
    /// Declared member type.
    pub member_type: &'static str,
    /// `Debug` rendering of the rejected value.
    pub value: String,
    /// What went wrong.
    pub failure: BindingFailure,
    /// Error raised by the conversion function, if any.
    #[source]
    pub source: Option<BoxError>,
}

/// Why a column value could not be assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentFailure {
    /// The field's codec has no handler for the observed storage class.
    NoConversion,
    /// The handler for the observed storage class returned an error.
    ConversionFailed,
}

impl fmt::Display for AssignmentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoConversion => f.write_str("no conversion"),
            Self::ConversionFailed => f.write_str("failed conversion"),
        }
    }
}

/// A column value could not be written into a record field.
#[derive(Debug, Error)]
#[error("{failure} from class {storage_class} for field `{member}` ({member_type}) of `{record}`")]
pub struct AssignmentError {
    /// Record type name.
    pub record: &'static str,
    /// Member name.
    pub member: &'static str,
    /// Declared member type.
    pub member_type: &'static str,
    /// Storage class reported by the column.
    pub storage_class: StorageClass,
    /// What went wrong.
    pub failure: AssignmentFailure,
    /// Error raised by the conversion function, if any.
    #[source]
    pub source: Option<BoxError>,
}

/// A converter's entry count does not match the statement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("converter for `{record}` has {entries} {direction} entries but the statement has {expected}")]
pub struct ArityError {
    /// Record type name.
    pub record: &'static str,
    /// Parameters or columns.
    pub direction: Direction,
    /// Live converter entries.
    pub entries: usize,
    /// Parameter or column count of the compiled statement.
    pub expected: usize,
}

/// A row view or cursor was used after its statement was reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("row view from statement version {captured} used at version {current}")]
pub struct StaleViewError {
    /// Version captured when the view was created.
    pub captured: u64,
    /// Live version of the statement.
    pub current: u64,
}

/// Any failure of a statement operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Converter compilation failed.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// A parameter could not be bound.
    #[error(transparent)]
    Binding(#[from] BindingError),
    /// A column could not be assigned.
    #[error(transparent)]
    Assignment(#[from] AssignmentError),
    /// Converter and statement disagree on the number of entries.
    #[error(transparent)]
    Arity(#[from] ArityError),
    /// A row view outlived a reset of its statement.
    #[error(transparent)]
    StaleView(#[from] StaleViewError),
    /// The native engine reported an error.
    #[error(transparent)]
    Engine(#[from] DbError),
    /// A cancellation token stopped the scan.
    #[error("row iteration cancelled")]
    Cancelled,
    /// The statement was asked to step, reset, bind or close while a row
    /// borrowed from it was still alive.
    #[error("a row borrowed from this statement is still alive")]
    RowInUse,
}

impl Error {
    /// `true` for errors that indicate a bug in the calling code rather
    /// than bad data or an engine failure.
    #[must_use]
    pub const fn is_misuse(&self) -> bool {
        matches!(self, Self::Arity(_) | Self::StaleView(_) | Self::RowInUse)
    }
}
