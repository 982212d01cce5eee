//! Per-type conversion tables between field types and storage classes.
//!
//! A [`ReadCodec`] holds at most one handler per storage class and turns a
//! column value of that class into a field value. A [`WriteCodec`] holds an
//! ordered list of conversions from a field value to a parameter, each
//! tagged with the storage class it produces and optionally guarded by a
//! predicate.
//!
//! Types take part by implementing [`SqlType`]; the built-in coverage lives
//! in [`defaults`], and [`registry`] caches one codec pair per type.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use rowbind_db::{StorageClass, ValueRef};

use crate::error::BoxError;

pub mod defaults;
pub mod guid;
pub mod registry;
pub mod ticks;

#[cfg(test)]
mod tests;

/// Converts a column value of one storage class into a field value.
pub type ReadFn<F> = Arc<dyn Fn(ValueRef<'_>) -> Result<F, BoxError> + Send + Sync>;

/// Decides whether a conditional write conversion applies to a value.
pub type Guard<F> = Arc<dyn Fn(&F) -> bool + Send + Sync>;

/// Converts a field value into a parameter that may borrow from it.
pub type WriteFn<F> = Arc<dyn for<'a> Fn(&'a F) -> Result<Param<'a>, BoxError> + Send + Sync>;

/// A type that can be read from and written to `SQLite` columns.
///
/// Both methods default to an empty codec, so any `Debug + Send + Sync`
/// type can opt in with an empty impl and supply its conversions as
/// per-field overrides instead.
pub trait SqlType: fmt::Debug + Send + Sync + Sized + 'static {
    /// Conversions used when assigning a column to a field of this type.
    fn read_codec() -> ReadCodec<Self> {
        ReadCodec::new()
    }

    /// Conversions used when binding a field of this type.
    fn write_codec() -> WriteCodec<Self> {
        WriteCodec::new()
    }
}

/// A parameter value produced by a write conversion.
///
/// Text and blob payloads borrow from the field when they can.
#[derive(Debug, Clone, PartialEq)]
pub enum Param<'a> {
    /// 64-bit signed integer.
    Integer(i64),
    /// Double.
    Float(f64),
    /// UTF-8 text.
    Text(Cow<'a, str>),
    /// Binary blob.
    Blob(Cow<'a, [u8]>),
    /// SQL NULL.
    Null,
}

impl Param<'_> {
    /// Storage class this parameter binds as.
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

    /// Borrows the parameter for binding.
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

/// Boxes a read conversion. Closures passed here get the higher-ranked
/// signature [`ReadFn`] needs.
pub fn read_fn<F, C>(convert: C) -> ReadFn<F>
where
    C: Fn(ValueRef<'_>) -> Result<F, BoxError> + Send + Sync + 'static,
{
    Arc::new(convert)
}

/// Boxes a write conversion whose parameter may borrow from the value.
pub fn write_fn<F, C>(convert: C) -> WriteFn<F>
where
    C: for<'a> Fn(&'a F) -> Result<Param<'a>, BoxError> + Send + Sync + 'static,
{
    Arc::new(convert)
}

fn class_mismatch(expected: StorageClass, found: &ValueRef<'_>) -> BoxError {
    format!(
        "handler for class {expected} received a {} value",
        found.storage_class()
    )
    .into()
}

/// Read conversions of one field type, at most one per storage class.
pub struct ReadCodec<F> {
    slots: [Option<ReadFn<F>>; 5],
}

impl<F: 'static> ReadCodec<F> {
    /// A codec with no handlers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: [None, None, None, None, None],
        }
    }

    /// Installs `handler` for `class`, replacing any existing one.
    #[must_use]
    pub fn set(mut self, class: StorageClass, handler: ReadFn<F>) -> Self {
        self.slots[class.index()] = Some(handler);
        self
    }

    /// Handles `Integer` columns.
    #[must_use]
    pub fn from_integer<C>(self, convert: C) -> Self
    where
        C: Fn(i64) -> Result<F, BoxError> + Send + Sync + 'static,
    {
        self.set(
            StorageClass::Integer,
            read_fn(move |value| match value {
                ValueRef::Integer(v) => convert(v),
                other => Err(class_mismatch(StorageClass::Integer, &other)),
            }),
        )
    }

    /// Handles `Float` columns.
    #[must_use]
    pub fn from_float<C>(self, convert: C) -> Self
    where
        C: Fn(f64) -> Result<F, BoxError> + Send + Sync + 'static,
    {
        self.set(
            StorageClass::Float,
            read_fn(move |value| match value {
                ValueRef::Float(v) => convert(v),
                other => Err(class_mismatch(StorageClass::Float, &other)),
            }),
        )
    }

    /// Handles `Text` columns. The bytes are validated as UTF-8 first.
    #[must_use]
    pub fn from_text<C>(self, convert: C) -> Self
    where
        C: Fn(&str) -> Result<F, BoxError> + Send + Sync + 'static,
    {
        self.set(
            StorageClass::Text,
            read_fn(move |value| match value {
                ValueRef::Text(bytes) => convert(std::str::from_utf8(bytes)?),
                other => Err(class_mismatch(StorageClass::Text, &other)),
            }),
        )
    }

    /// Handles `Blob` columns.
    #[must_use]
    pub fn from_blob<C>(self, convert: C) -> Self
    where
        C: Fn(&[u8]) -> Result<F, BoxError> + Send + Sync + 'static,
    {
        self.set(
            StorageClass::Blob,
            read_fn(move |value| match value {
                ValueRef::Blob(bytes) => convert(bytes),
                other => Err(class_mismatch(StorageClass::Blob, &other)),
            }),
        )
    }

    /// Handles `Null` columns.
    #[must_use]
    pub fn from_null<C>(self, convert: C) -> Self
    where
        C: Fn() -> Result<F, BoxError> + Send + Sync + 'static,
    {
        self.set(
            StorageClass::Null,
            read_fn(move |value| match value {
                ValueRef::Null => convert(),
                other => Err(class_mismatch(StorageClass::Null, &other)),
            }),
        )
    }

    /// Handler for `Integer` columns.
    #[must_use]
    pub const fn integer(&self) -> Option<&ReadFn<F>> {
        self.slots[0].as_ref()
    }

    /// Handler for `Float` columns.
    #[must_use]
    pub const fn float(&self) -> Option<&ReadFn<F>> {
        self.slots[1].as_ref()
    }

    /// Handler for `Text` columns.
    #[must_use]
    pub const fn text(&self) -> Option<&ReadFn<F>> {
        self.slots[2].as_ref()
    }

    /// Handler for `Blob` columns.
    #[must_use]
    pub const fn blob(&self) -> Option<&ReadFn<F>> {
        self.slots[3].as_ref()
    }

    /// Handler for `Null` columns.
    #[must_use]
    pub const fn null(&self) -> Option<&ReadFn<F>> {
        self.slots[4].as_ref()
    }

    /// Handler for `class`.
    #[must_use]
    pub const fn get(&self, class: StorageClass) -> Option<&ReadFn<F>> {
        self.slots[class.index()].as_ref()
    }

    /// Storage classes that have a handler.
    pub fn classes(&self) -> impl Iterator<Item = StorageClass> + '_ {
        StorageClass::ALL
            .into_iter()
            .filter(|class| self.slots[class.index()].is_some())
    }

    /// `true` if no class has a handler.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Layers `overrides` on top of this codec: every class the override
    /// handles replaces the handler here, the rest are kept.
    #[must_use]
    pub fn merge(mut self, overrides: &Self) -> Self {
        for (slot, replacement) in self.slots.iter_mut().zip(&overrides.slots) {
            if let Some(handler) = replacement {
                *slot = Some(Arc::clone(handler));
            }
        }
        self
    }

    /// Wraps every handler so it produces `G` instead of `F`.
    #[must_use]
    pub fn map<G, M>(&self, wrap: M) -> ReadCodec<G>
    where
        G: 'static,
        M: Fn(F) -> G + Clone + Send + Sync + 'static,
    {
        let mut mapped = ReadCodec::new();
        for class in StorageClass::ALL {
            if let Some(inner) = self.get(class) {
                let inner = Arc::clone(inner);
                let wrap = wrap.clone();
                mapped = mapped.set(class, read_fn(move |value| inner(value).map(&wrap)));
            }
        }
        mapped
    }
}

impl<F: 'static> Default for ReadCodec<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> Clone for ReadCodec<F> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
        }
    }
}

impl<F: 'static> fmt::Debug for ReadCodec<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.classes()).finish()
    }
}

/// One write conversion of a [`WriteCodec`].
pub struct WriteSlot<F> {
    class: StorageClass,
    guard: Option<Guard<F>>,
    convert: WriteFn<F>,
}

impl<F> WriteSlot<F> {
    /// Storage class the conversion produces.
    #[must_use]
    pub const fn class(&self) -> StorageClass {
        self.class
    }

    /// `true` if the conversion only applies when its guard accepts.
    #[must_use]
    pub const fn is_guarded(&self) -> bool {
        self.guard.is_some()
    }

    /// Runs the conversion.
    pub fn convert<'a>(&self, value: &'a F) -> Result<Param<'a>, BoxError> {
        (self.convert)(value)
    }
}

impl<F> Clone for WriteSlot<F> {
    fn clone(&self) -> Self {
        Self {
            class: self.class,
            guard: self.guard.clone(),
            convert: Arc::clone(&self.convert),
        }
    }
}

/// Write conversions of one field type, in registration order.
///
/// Selection for a value: the first guarded conversion whose guard accepts
/// wins; otherwise the first unguarded conversion; otherwise nothing
/// applies and binding fails.
pub struct WriteCodec<F> {
    slots: Vec<WriteSlot<F>>,
}

impl<F: 'static> WriteCodec<F> {
    /// A codec with no conversions.
    #[must_use]
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Registers a conversion producing `class`. A conversion already
    /// registered for the same class is replaced in place.
    #[must_use]
    pub fn push(mut self, class: StorageClass, guard: Option<Guard<F>>, convert: WriteFn<F>) -> Self {
        let slot = WriteSlot {
            class,
            guard,
            convert,
        };
        match self.slots.iter_mut().find(|s| s.class == class) {
            Some(existing) => *existing = slot,
            None => self.slots.push(slot),
        }
        self
    }

    /// Writes the value as an `Integer`.
    #[must_use]
    pub fn to_integer<C>(self, convert: C) -> Self
    where
        C: Fn(&F) -> Result<i64, BoxError> + Send + Sync + 'static,
    {
        self.push(
            StorageClass::Integer,
            None,
            write_fn(move |v| convert(v).map(Param::Integer)),
        )
    }

    /// Writes the value as a `Float`.
    #[must_use]
    pub fn to_float<C>(self, convert: C) -> Self
    where
        C: Fn(&F) -> Result<f64, BoxError> + Send + Sync + 'static,
    {
        self.push(
            StorageClass::Float,
            None,
            write_fn(move |v| convert(v).map(Param::Float)),
        )
    }

    /// Writes the value as `Text`.
    #[must_use]
    pub fn to_text<C>(self, convert: C) -> Self
    where
        C: for<'a> Fn(&'a F) -> Result<Cow<'a, str>, BoxError> + Send + Sync + 'static,
    {
        self.push(
            StorageClass::Text,
            None,
            write_fn(move |v| convert(v).map(Param::Text)),
        )
    }

    /// Writes the value as a `Blob`.
    #[must_use]
    pub fn to_blob<C>(self, convert: C) -> Self
    where
        C: for<'a> Fn(&'a F) -> Result<Cow<'a, [u8]>, BoxError> + Send + Sync + 'static,
    {
        self.push(
            StorageClass::Blob,
            None,
            write_fn(move |v| convert(v).map(Param::Blob)),
        )
    }

    /// Writes SQL NULL regardless of the value.
    #[must_use]
    pub fn to_null(self) -> Self {
        self.push(StorageClass::Null, None, write_fn(|_| Ok(Param::Null)))
    }

    /// Makes the conversion registered for `class` conditional on `guard`.
    /// Does nothing if no conversion for `class` is registered.
    #[must_use]
    pub fn guard<P>(mut self, class: StorageClass, guard: P) -> Self
    where
        P: Fn(&F) -> bool + Send + Sync + 'static,
    {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.class == class) {
            slot.guard = Some(Arc::new(guard));
        }
        self
    }

    /// Picks the conversion for `value`.
    pub fn select(&self, value: &F) -> Option<&WriteSlot<F>> {
        self.slots
            .iter()
            .find(|slot| slot.guard.as_ref().is_some_and(|guard| guard(value)))
            .or_else(|| self.slots.iter().find(|slot| slot.guard.is_none()))
    }

    /// Registered conversions, in order.
    #[must_use]
    pub fn slots(&self) -> &[WriteSlot<F>] {
        &self.slots
    }

    /// `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Layers `overrides` on top of this codec. Override conversions come
    /// first, so an unconditional override wins over every unconditional
    /// default; defaults for classes the override does not mention follow
    /// in their original order.
    #[must_use]
    pub fn merge(self, overrides: &Self) -> Self {
        let mut slots = overrides.slots.clone();
        slots.extend(
            self.slots
                .into_iter()
                .filter(|slot| !overrides.slots.iter().any(|o| o.class == slot.class)),
        );
        Self { slots }
    }
}

impl<T: 'static> WriteCodec<Option<T>> {
    /// Lifts the conversions of `T`: `None` writes NULL and `Some` values
    /// go through the inner conversions, guards included.
    #[must_use]
    pub fn optional(inner: &WriteCodec<T>) -> Self {
        let mut codec = Self::new()
            .to_null()
            .guard(StorageClass::Null, Option::is_none);
        for slot in &inner.slots {
            let convert = Arc::clone(&slot.convert);
            let guard: Guard<Option<T>> = match slot.guard.clone() {
                Some(inner_guard) => {
                    Arc::new(move |v: &Option<T>| v.as_ref().is_some_and(|x| inner_guard(x)))
                }
                None => Arc::new(Option::is_some),
            };
            codec = codec.push(
                slot.class,
                Some(guard),
                write_fn(move |v: &Option<T>| match v {
                    Some(x) => convert(x),
                    None => Ok(Param::Null),
                }),
            );
        }
        codec
    }
}

impl<F: 'static> Default for WriteCodec<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> Clone for WriteCodec<F> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
        }
    }
}

impl<F> fmt::Debug for WriteCodec<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.slots.iter().map(|slot| {
                if slot.guard.is_some() {
                    format!("{}?", slot.class)
                } else {
                    slot.class.to_string()
                }
            }))
            .finish()
    }
}
