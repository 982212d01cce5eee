//! Compiled converters between records and statement positions.
//!
//! A [`ParameterConverter`] binds the readable members of a record to
//! parameters `0..n`; a [`ResultConverter`] assigns columns `0..n` to the
//! writable members. Both are compiled once from the record's [`Schema`]
//! and the field codecs, are immutable afterwards, and can be shared
//! across threads and statements.
//!
//! [`Schema`]: crate::Schema

use std::any::Any;
use std::fmt;

use rowbind_db::ValueRef;

use crate::accessor::Accessor;
use crate::codec::{registry, ReadCodec, SqlType, WriteCodec};
use crate::error::{ArityError, AssignmentError, BuildError, Result};
use crate::native::{BindTarget, ColumnSource};
use crate::schema::{Record, Schema};

mod assigner;
mod binder;
mod builder;

#[cfg(test)]
mod tests;

pub use builder::{ParameterBuilder, ResultBuilder};

use assigner::FieldAssigner;
use binder::FieldBinder;

/// Which side of a statement a converter serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Record members to statement parameters.
    Parameters,
    /// Result columns to record members.
    Columns,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Parameters => "parameter",
            Self::Columns => "column",
        })
    }
}

/// Names carried into binding and assignment errors.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldContext {
    pub record: &'static str,
    pub member: &'static str,
    pub member_type: &'static str,
}

/// Override codec handed to a member during compilation.
pub(crate) struct Override {
    pub codec: Box<dyn Any + Send + Sync>,
    pub field_type: &'static str,
}

/// Typed side of a schema member, reached through the erased [`Member`].
///
/// [`Member`]: crate::schema::Member
pub(crate) trait MemberAccess<R>: Send + Sync {
    fn can_read(&self) -> bool;
    fn can_write(&self) -> bool;
    fn binder(
        &self,
        ctx: FieldContext,
        overrides: Vec<Override>,
        defaults: bool,
    ) -> Result<Box<dyn BindField<R>>, BuildError>;
    fn assigner(
        &self,
        ctx: FieldContext,
        overrides: Vec<Override>,
        defaults: bool,
    ) -> Result<Box<dyn AssignField<R>>, BuildError>;
}

/// Binds one member of `R` to one parameter.
pub(crate) trait BindField<R>: Send + Sync {
    fn bind(&self, record: &R, target: &mut dyn BindTarget, index: usize) -> Result<()>;
    fn context(&self) -> &FieldContext;
}

/// Assigns one column to one member of `R`.
pub(crate) trait AssignField<R>: Send + Sync {
    fn assign(&self, record: &mut R, value: ValueRef<'_>) -> Result<(), AssignmentError>;
    fn context(&self) -> &FieldContext;
}

pub(crate) struct TypedMember<R, F> {
    accessor: Accessor<R, F>,
}

impl<R, F> TypedMember<R, F> {
    pub(crate) const fn new(accessor: Accessor<R, F>) -> Self {
        Self { accessor }
    }
}

fn downcast_all<C: 'static>(ctx: &FieldContext, overrides: Vec<Override>) -> Result<Vec<C>, BuildError> {
    overrides
        .into_iter()
        .map(|o| {
            let found = o.field_type;
            o.codec
                .downcast::<C>()
                .map(|codec| *codec)
                .map_err(|_| BuildError::OverrideType {
                    record: ctx.record,
                    member: ctx.member,
                    expected: ctx.member_type,
                    found,
                })
        })
        .collect()
}

impl<R: 'static, F: SqlType> MemberAccess<R> for TypedMember<R, F> {
    fn can_read(&self) -> bool {
        self.accessor.getter().is_some()
    }

    fn can_write(&self) -> bool {
        self.accessor.setter().is_some()
    }

    fn binder(
        &self,
        ctx: FieldContext,
        overrides: Vec<Override>,
        defaults: bool,
    ) -> Result<Box<dyn BindField<R>>, BuildError> {
        let get = self.accessor.getter().ok_or(BuildError::MissingAccessor {
            record: ctx.record,
            member: ctx.member,
            direction: Direction::Parameters,
        })?;
        let base = if defaults {
            (*registry::write_codec::<F>()).clone()
        } else {
            WriteCodec::new()
        };
        let codec = downcast_all::<WriteCodec<F>>(&ctx, overrides)?
            .iter()
            .fold(base, WriteCodec::merge);
        Ok(Box::new(FieldBinder::new(ctx, get, codec)))
    }

    fn assigner(
        &self,
        ctx: FieldContext,
        overrides: Vec<Override>,
        defaults: bool,
    ) -> Result<Box<dyn AssignField<R>>, BuildError> {
        let set = self.accessor.setter().ok_or(BuildError::MissingAccessor {
            record: ctx.record,
            member: ctx.member,
            direction: Direction::Columns,
        })?;
        let base = if defaults {
            (*registry::read_codec::<F>()).clone()
        } else {
            ReadCodec::new()
        };
        let codec = downcast_all::<ReadCodec<F>>(&ctx, overrides)?
            .iter()
            .fold(base, ReadCodec::merge);
        Ok(Box::new(FieldAssigner::new(ctx, set, codec)))
    }
}

fn check_arity(
    record: &'static str,
    direction: Direction,
    entries: usize,
    expected: usize,
) -> Result<(), ArityError> {
    if entries == expected {
        Ok(())
    } else {
        Err(ArityError {
            record,
            direction,
            entries,
            expected,
        })
    }
}

/// Binds a record's readable members to statement parameters.
pub struct ParameterConverter<T> {
    record: &'static str,
    fields: Box<[Box<dyn BindField<T>>]>,
}

impl<T: 'static> ParameterConverter<T> {
    /// Builder over `T`'s record schema.
    pub fn builder() -> ParameterBuilder<T>
    where
        T: Record,
    {
        ParameterBuilder::new(T::schema())
    }

    /// Builder that treats `T` itself as the single parameter.
    pub fn scalar_builder() -> ParameterBuilder<T>
    where
        T: SqlType,
    {
        ParameterBuilder::new(Ok(Schema::scalar()))
    }

    /// Compiles a converter from `T`'s schema and the default codecs.
    pub fn build() -> Result<Self, BuildError>
    where
        T: Record,
    {
        Self::builder().compile()
    }

    /// Compiles a single-value converter from the default codecs.
    pub fn scalar() -> Result<Self, BuildError>
    where
        T: SqlType,
    {
        Self::scalar_builder().compile()
    }

    pub(crate) fn from_fields(record: &'static str, fields: Vec<Box<dyn BindField<T>>>) -> Self {
        Self {
            record,
            fields: fields.into_boxed_slice(),
        }
    }

    /// Record type name.
    #[must_use]
    pub const fn record(&self) -> &'static str {
        self.record
    }

    /// Number of parameters this converter binds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` if every member was ignored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Member names in parameter order.
    pub fn members(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.context().member)
    }

    /// Fails unless the statement has exactly one parameter per entry.
    pub fn check_arity(&self, parameter_count: usize) -> Result<(), ArityError> {
        check_arity(self.record, Direction::Parameters, self.len(), parameter_count)
    }

    /// Binds every entry of `params` to `target`, entry `i` to parameter `i`.
    ///
    /// The arity is checked before anything is bound. A failure part way
    /// through leaves the earlier parameters bound.
    pub fn bind<B: BindTarget + ?Sized>(&self, params: &T, target: &mut B) -> Result<()> {
        self.check_arity(target.parameter_count())?;
        self.bind_unchecked(params, target)
    }

    pub(crate) fn bind_unchecked<B: BindTarget + ?Sized>(&self, params: &T, target: &mut B) -> Result<()> {
        let mut target = Target(target);
        for (index, field) in self.fields.iter().enumerate() {
            field.bind(params, &mut target, index)?;
        }
        Ok(())
    }
}

impl<T> fmt::Debug for ParameterConverter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterConverter")
            .field("record", &self.record)
            .field(
                "members",
                &self.fields.iter().map(|x| x.context().member).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Sized shim so an unsized target can be handed out as `&mut dyn BindTarget`.
struct Target<'t, B: ?Sized>(&'t mut B);

impl<B: BindTarget + ?Sized> BindTarget for Target<'_, B> {
    fn parameter_count(&self) -> usize {
        self.0.parameter_count()
    }

    fn bind_value(&mut self, index: usize, value: ValueRef<'_>) -> rowbind_db::DbResult<()> {
        self.0.bind_value(index, value)
    }
}

/// Assigns result columns to a record's writable members.
pub struct ResultConverter<T> {
    record: &'static str,
    fields: Box<[Box<dyn AssignField<T>>]>,
}

impl<T: 'static> ResultConverter<T> {
    /// Builder over `T`'s record schema.
    pub fn builder() -> ResultBuilder<T>
    where
        T: Record,
    {
        ResultBuilder::new(T::schema())
    }

    /// Builder that treats `T` itself as the single column.
    pub fn scalar_builder() -> ResultBuilder<T>
    where
        T: SqlType,
    {
        ResultBuilder::new(Ok(Schema::scalar()))
    }

    /// Compiles a converter from `T`'s schema and the default codecs.
    pub fn build() -> Result<Self, BuildError>
    where
        T: Record,
    {
        Self::builder().compile()
    }

    /// Compiles a single-value converter from the default codecs.
    pub fn scalar() -> Result<Self, BuildError>
    where
        T: SqlType,
    {
        Self::scalar_builder().compile()
    }

    pub(crate) fn from_fields(record: &'static str, fields: Vec<Box<dyn AssignField<T>>>) -> Self {
        Self {
            record,
            fields: fields.into_boxed_slice(),
        }
    }

    /// Record type name.
    #[must_use]
    pub const fn record(&self) -> &'static str {
        self.record
    }

    /// Number of columns this converter reads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` if every member was ignored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Member names in column order.
    pub fn members(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.context().member)
    }

    /// Fails unless the result set has exactly one column per entry.
    pub fn check_arity(&self, column_count: usize) -> Result<(), ArityError> {
        check_arity(self.record, Direction::Columns, self.len(), column_count)
    }

    /// Assigns column `i` of `source` to entry `i` of `target`.
    ///
    /// Does not check the arity; statements do that once per execution. A
    /// failure part way through leaves the earlier members assigned.
    pub fn assign<S: ColumnSource + ?Sized>(&self, target: &mut T, source: &S) -> Result<(), AssignmentError> {
        for (index, field) in self.fields.iter().enumerate() {
            field.assign(target, source.column_value(index))?;
        }
        Ok(())
    }

    /// Assigns `source` into a fresh `T::default()`.
    pub fn read<S: ColumnSource + ?Sized>(&self, source: &S) -> Result<T, AssignmentError>
    where
        T: Default,
    {
        let mut record = T::default();
        self.assign(&mut record, source)?;
        Ok(record)
    }
}

impl<T> fmt::Debug for ResultConverter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultConverter")
            .field("record", &self.record)
            .field(
                "members",
                &self.fields.iter().map(|x| x.context().member).collect::<Vec<_>>(),
            )
            .finish()
    }
}

pub(crate) fn field_context<R>(schema: &Schema<R>, member: &crate::schema::Member<R>) -> FieldContext
where
    R: 'static,
{
    FieldContext {
        record: schema.record(),
        member: member.name(),
        member_type: member.type_name(),
    }
}
