//! Record schemas: the ordered member list of a record type.
//!
//! Member order is declaration order and is the only thing that ties a
//! member to a parameter or column position, so a schema that cannot state
//! its order unambiguously is rejected with a [`SchemaError`].

use std::any::{type_name, TypeId};
use std::fmt;

use crate::accessor::Accessor;
use crate::codec::SqlType;
use crate::converter::{MemberAccess, TypedMember};
use crate::error::{SchemaError, SchemaViolation};

/// How a record maps to statement positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Named members in declaration order.
    Struct,
    /// Positional members `0..n`.
    Tuple,
    /// The value itself is the single member.
    Scalar,
}

/// One member of a record: its name, declared type and accessor.
pub struct Member<R> {
    name: &'static str,
    type_name: &'static str,
    type_id: TypeId,
    pub(crate) access: Box<dyn MemberAccess<R>>,
}

impl<R> Member<R> {
    /// Member name (`"0"`, `"1"`, ... for tuples).
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Name of the declared field type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type id of the declared field type.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// `true` if the member has a getter, so it can be bound as a parameter.
    #[must_use]
    pub fn can_read(&self) -> bool {
        self.access.can_read()
    }

    /// `true` if the member has a setter, so it can be assigned from a column.
    #[must_use]
    pub fn can_write(&self) -> bool {
        self.access.can_write()
    }
}

impl<R> fmt::Debug for Member<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("type", &self.type_name)
            .field("read", &self.can_read())
            .field("write", &self.can_write())
            .finish()
    }
}

/// The ordered members of record type `R`.
pub struct Schema<R> {
    record: &'static str,
    shape: Shape,
    members: Vec<Member<R>>,
}

impl<R: 'static> Schema<R> {
    /// Starts a schema for a record called `record`.
    #[must_use]
    pub const fn builder(record: &'static str, shape: Shape) -> SchemaBuilder<R> {
        SchemaBuilder {
            record,
            shape,
            members: Vec::new(),
        }
    }

    /// Record type name.
    #[must_use]
    pub const fn record(&self) -> &'static str {
        self.record
    }

    /// Shape of the record.
    #[must_use]
    pub const fn shape(&self) -> Shape {
        self.shape
    }

    /// Members in position order.
    #[must_use]
    pub fn members(&self) -> &[Member<R>] {
        &self.members
    }

    /// Member called `name`.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&Member<R>> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// `true` if there are no members. Never the case for a built schema.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<F: SqlType> Schema<F> {
    /// Schema of a bare value: one member called `value` that is the value
    /// itself.
    #[must_use]
    pub fn scalar() -> Self {
        Self {
            record: type_name::<F>(),
            shape: Shape::Scalar,
            members: vec![member("value", Accessor::<F, F>::field(|v| v, |v, x| *v = x))],
        }
    }
}

impl<R> fmt::Debug for Schema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("record", &self.record)
            .field("shape", &self.shape)
            .field("members", &self.members)
            .finish()
    }
}

fn member<R: 'static, F: SqlType>(name: &'static str, accessor: Accessor<R, F>) -> Member<R> {
    Member {
        name,
        type_name: type_name::<F>(),
        type_id: TypeId::of::<F>(),
        access: Box::new(TypedMember::new(accessor)),
    }
}

/// Collects members in declaration order.
pub struct SchemaBuilder<R> {
    record: &'static str,
    shape: Shape,
    members: Vec<Member<R>>,
}

impl<R: 'static> SchemaBuilder<R> {
    /// Appends a member. Its position is the number of members added
    /// before it.
    #[must_use]
    pub fn member<F: SqlType>(mut self, name: &'static str, accessor: Accessor<R, F>) -> Self {
        self.members.push(member(name, accessor));
        self
    }

    /// Validates the declared order.
    pub fn build(self) -> Result<Schema<R>, SchemaError> {
        let fail = |violation| SchemaError {
            record: self.record,
            violation,
        };
        if self.members.is_empty() {
            return Err(fail(SchemaViolation::Empty));
        }
        for (position, m) in self.members.iter().enumerate() {
            if self.members[..position].iter().any(|prev| prev.name == m.name) {
                return Err(fail(SchemaViolation::DuplicateMember(m.name)));
            }
            if self.shape == Shape::Tuple && m.name != position.to_string() {
                return Err(fail(SchemaViolation::TupleOrder {
                    position,
                    found: m.name,
                }));
            }
        }
        Ok(Schema {
            record: self.record,
            shape: self.shape,
            members: self.members,
        })
    }
}

/// A type whose members map to statement positions.
///
/// Usually implemented through [`record!`](crate::record); tuples of up to
/// eight [`SqlType`] elements implement it out of the box.
pub trait Record: Sized + 'static {
    /// The ordered member list.
    fn schema() -> Result<Schema<Self>, SchemaError>;
}

macro_rules! tuple_record {
    ($($idx:tt : $t:ident),+) => {
        impl<$($t: SqlType),+> Record for ($($t,)+) {
            fn schema() -> Result<Schema<Self>, SchemaError> {
                Schema::builder(type_name::<Self>(), Shape::Tuple)
                    $( .member(stringify!($idx), Accessor::<Self, $t>::field(|r| &r.$idx, |r, v| r.$idx = v)) )+
                    .build()
            }
        }
    };
}

tuple_record!(0: A);
tuple_record!(0: A, 1: B);
tuple_record!(0: A, 1: B, 2: C);
tuple_record!(0: A, 1: B, 2: C, 3: D);
tuple_record!(0: A, 1: B, 2: C, 3: D, 4: E);
tuple_record!(0: A, 1: B, 2: C, 3: D, 4: E, 5: G);
tuple_record!(0: A, 1: B, 2: C, 3: D, 4: E, 5: G, 6: H);
tuple_record!(0: A, 1: B, 2: C, 3: D, 4: E, 5: G, 6: H, 7: I);

/// Declares a struct and implements [`Record`] for it, with members in
/// field declaration order.
///
/// ```
/// rowbind::record! {
///     #[derive(Debug, Default)]
///     pub struct User {
///         pub id: i64,
///         pub name: String,
///     }
/// }
///
/// use rowbind::Record;
/// let schema = User::schema().unwrap();
/// let names: Vec<_> = schema.members().iter().map(|m| m.name()).collect();
/// assert_eq!(names, ["id", "name"]);
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident : $ty:ty ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field : $ty ),+
        }

        impl $crate::Record for $name {
            fn schema() -> ::std::result::Result<$crate::Schema<Self>, $crate::SchemaError> {
                $crate::Schema::builder(::std::stringify!($name), $crate::Shape::Struct)
                    $( .member(::std::stringify!($field), $crate::field!($name, $field: $ty)) )+
                    .build()
            }
        }
    };
}
