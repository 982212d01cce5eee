//! Compiled member accessors.
//!
//! An [`Accessor`] pairs an optional getter with an optional setter for one
//! member of a record. Both are plain function pointers resolved at compile
//! time, so reading or writing a member never goes through reflection.

/// Reads a member from a record.
pub enum Getter<R, F> {
    /// Borrows a stored field; no copy is made.
    Field(for<'a> fn(&'a R) -> &'a F),
    /// Computes the value from the record.
    Computed(fn(&R) -> F),
}

impl<R, F> Getter<R, F> {
    /// Calls `use_value` with the member's current value.
    #[inline]
    pub fn with<T>(&self, record: &R, use_value: impl FnOnce(&F) -> T) -> T {
        match self {
            Self::Field(get) => use_value(get(record)),
            Self::Computed(get) => use_value(&get(record)),
        }
    }
}

impl<R, F> Clone for Getter<R, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R, F> Copy for Getter<R, F> {}

/// Writes a member of a record.
pub type Setter<R, F> = fn(&mut R, F);

/// Getter and setter of one record member.
pub struct Accessor<R, F> {
    get: Option<Getter<R, F>>,
    set: Option<Setter<R, F>>,
}

impl<R, F> Accessor<R, F> {
    /// A stored field that can be read and written.
    #[must_use]
    pub const fn field(get: for<'a> fn(&'a R) -> &'a F, set: fn(&mut R, F)) -> Self {
        Self {
            get: Some(Getter::Field(get)),
            set: Some(set),
        }
    }

    /// A stored field that is only ever bound as a parameter.
    #[must_use]
    pub const fn read_only(get: for<'a> fn(&'a R) -> &'a F) -> Self {
        Self {
            get: Some(Getter::Field(get)),
            set: None,
        }
    }

    /// A computed value with an optional setter.
    #[must_use]
    pub const fn property(get: fn(&R) -> F, set: Option<fn(&mut R, F)>) -> Self {
        Self {
            get: Some(Getter::Computed(get)),
            set,
        }
    }

    /// A member that is only ever assigned from a column.
    #[must_use]
    pub const fn write_only(set: fn(&mut R, F)) -> Self {
        Self {
            get: None,
            set: Some(set),
        }
    }

    /// The getter, if any.
    #[must_use]
    pub const fn getter(&self) -> Option<Getter<R, F>> {
        self.get
    }

    /// The setter, if any.
    #[must_use]
    pub const fn setter(&self) -> Option<Setter<R, F>> {
        self.set
    }
}

impl<R, F> Clone for Accessor<R, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R, F> Copy for Accessor<R, F> {}

/// Builds a read-write [`Accessor`] for a named or positional field.
///
/// ```
/// use rowbind::{field, Accessor};
///
/// struct Point {
///     x: i64,
/// }
///
/// let accessor: Accessor<Point, i64> = field!(Point, x: i64);
/// assert!(accessor.getter().is_some() && accessor.setter().is_some());
/// ```
#[macro_export]
macro_rules! field {
    ($record:ty, $name:tt : $ty:ty) => {
        $crate::Accessor::<$record, $ty>::field(|r| &r.$name, |r, v| r.$name = v)
    };
}
