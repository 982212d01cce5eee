use std::any::type_name;

use crate::codec::{ReadCodec, SqlType, WriteCodec};
use crate::error::{BuildError, SchemaError};
use crate::schema::{Member, Schema};

use super::{field_context, Direction, FieldContext, Override, ParameterConverter, ResultConverter};

/// State shared by both builders.
struct Plan<T> {
    schema: Result<Schema<T>, SchemaError>,
    overrides: Vec<(String, Override)>,
    ignored: Vec<String>,
    defaults: bool,
}

impl<T: 'static> Plan<T> {
    const fn new(schema: Result<Schema<T>, SchemaError>) -> Self {
        Self {
            schema,
            overrides: Vec::new(),
            ignored: Vec::new(),
            defaults: true,
        }
    }

    fn add_override<C: Send + Sync + 'static, F>(&mut self, member: &str, codec: C) {
        self.overrides.push((
            member.to_owned(),
            Override {
                codec: Box::new(codec),
                field_type: type_name::<F>(),
            },
        ));
    }

    fn resolve<E>(
        self,
        direction: Direction,
        compile: impl Fn(&Member<T>, FieldContext, Vec<Override>, bool) -> Result<E, BuildError>,
    ) -> Result<(&'static str, Vec<E>), BuildError> {
        let schema = self.schema?;
        let record = schema.record();
        let usable = |m: &Member<T>| match direction {
            Direction::Parameters => m.can_read(),
            Direction::Columns => m.can_write(),
        };

        for name in self.overrides.iter().map(|(name, _)| name) {
            let member = schema.member(name).ok_or_else(|| BuildError::UnknownMember {
                record,
                member: name.clone(),
            })?;
            if !usable(member) {
                return Err(BuildError::MissingAccessor {
                    record,
                    member: member.name(),
                    direction,
                });
            }
        }
        if let Some(name) = self.ignored.iter().find(|name| schema.member(name).is_none()) {
            return Err(BuildError::UnknownMember {
                record,
                member: name.clone(),
            });
        }

        let mut pending = self.overrides;
        let mut entries = Vec::with_capacity(schema.len());
        for member in schema.members() {
            if !usable(member) || self.ignored.iter().any(|name| name == member.name()) {
                continue;
            }
            let (own, rest): (Vec<_>, Vec<_>) = pending
                .into_iter()
                .partition(|(name, _)| name == member.name());
            pending = rest;
            let own = own.into_iter().map(|(_, o)| o).collect();
            entries.push(compile(
                member,
                field_context(&schema, member),
                own,
                self.defaults,
            )?);
        }

        log::debug!(
            "compiled {direction} converter for `{record}` with {} of {} members",
            entries.len(),
            schema.len()
        );
        Ok((record, entries))
    }
}

/// Configures and compiles a [`ParameterConverter`].
pub struct ParameterBuilder<T> {
    plan: Plan<T>,
}

impl<T: 'static> ParameterBuilder<T> {
    pub(crate) const fn new(schema: Result<Schema<T>, SchemaError>) -> Self {
        Self {
            plan: Plan::new(schema),
        }
    }

    /// Builder over a hand-written schema.
    #[must_use]
    pub const fn from_schema(schema: Schema<T>) -> Self {
        Self::new(Ok(schema))
    }

    /// Uses `codec` for `member`. Each storage class the override handles
    /// replaces the default conversion for that class; unconditional
    /// overrides are preferred over unconditional defaults.
    #[must_use]
    pub fn with<F: SqlType>(mut self, member: &str, codec: WriteCodec<F>) -> Self {
        self.plan.add_override::<_, F>(member, codec);
        self
    }

    /// Leaves `member` out; later members move up one parameter.
    #[must_use]
    pub fn ignore(mut self, member: &str) -> Self {
        self.plan.ignored.push(member.to_owned());
        self
    }

    /// Whether to start from the default codecs (on by default). When off,
    /// only overrides apply.
    #[must_use]
    pub const fn use_defaults(mut self, enabled: bool) -> Self {
        self.plan.defaults = enabled;
        self
    }

    /// Compiles the converter.
    pub fn compile(self) -> Result<ParameterConverter<T>, BuildError> {
        let (record, fields) = self
            .plan
            .resolve(Direction::Parameters, |member, ctx, overrides, defaults| {
                member.access.binder(ctx, overrides, defaults)
            })?;
        Ok(ParameterConverter::from_fields(record, fields))
    }
}

/// Configures and compiles a [`ResultConverter`].
pub struct ResultBuilder<T> {
    plan: Plan<T>,
}

impl<T: 'static> ResultBuilder<T> {
    pub(crate) const fn new(schema: Result<Schema<T>, SchemaError>) -> Self {
        Self {
            plan: Plan::new(schema),
        }
    }

    /// Builder over a hand-written schema.
    #[must_use]
    pub const fn from_schema(schema: Schema<T>) -> Self {
        Self::new(Ok(schema))
    }

    /// Uses `codec` for `member`. Each storage class the override handles
    /// replaces the default handler for that class.
    #[must_use]
    pub fn with<F: SqlType>(mut self, member: &str, codec: ReadCodec<F>) -> Self {
        self.plan.add_override::<_, F>(member, codec);
        self
    }

    /// Leaves `member` out; later members move up one column.
    #[must_use]
    pub fn ignore(mut self, member: &str) -> Self {
        self.plan.ignored.push(member.to_owned());
        self
    }

    /// Whether to start from the default codecs (on by default). When off,
    /// only overrides apply.
    #[must_use]
    pub const fn use_defaults(mut self, enabled: bool) -> Self {
        self.plan.defaults = enabled;
        self
    }

    /// Compiles the converter.
    pub fn compile(self) -> Result<ResultConverter<T>, BuildError> {
        let (record, fields) = self
            .plan
            .resolve(Direction::Columns, |member, ctx, overrides, defaults| {
                member.access.assigner(ctx, overrides, defaults)
            })?;
        Ok(ResultConverter::from_fields(record, fields))
    }
}
