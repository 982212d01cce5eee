//! Process-wide cache of the default codecs, one pair per field type.
//!
//! Codecs are built on first request from [`SqlType`] and shared after
//! that. Building happens outside the lock, so a codec that asks the
//! registry for an inner type's codec (as `Option<T>` does) cannot
//! deadlock; when two threads race, the first insert wins and both get
//! the same instance.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use rowbind_db::StorageClass;

use super::{ReadCodec, ReadFn, SqlType, WriteCodec};

type Entries = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

#[derive(Default)]
struct Registry {
    read: Entries,
    write: Entries,
}

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(Registry::default)
}

fn cached<C, B>(entries: &Entries, build: B) -> Arc<C>
where
    C: Any + Send + Sync,
    B: FnOnce() -> C,
{
    let id = TypeId::of::<C>();
    let found = entries
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .cloned();
    if let Some(codec) = found.and_then(|any| any.downcast::<C>().ok()) {
        return codec;
    }

    let built = Arc::new(build());
    let shared = Arc::clone(
        entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id)
            .or_insert_with(|| Arc::clone(&built) as Arc<dyn Any + Send + Sync>),
    );
    log::trace!("registered codec {}", std::any::type_name::<C>());
    shared.downcast::<C>().unwrap_or(built)
}

/// Default read codec of `F`.
#[must_use]
pub fn read_codec<F: SqlType>() -> Arc<ReadCodec<F>> {
    cached(&registry().read, F::read_codec)
}

/// Default write codec of `F`.
#[must_use]
pub fn write_codec<F: SqlType>() -> Arc<WriteCodec<F>> {
    cached(&registry().write, F::write_codec)
}

/// Default read handler of `F` for `class`, if there is one.
#[must_use]
pub fn lookup<F: SqlType>(class: StorageClass) -> Option<ReadFn<F>> {
    read_codec::<F>().get(class).cloned()
}

/// `true` if `F` has a default conversion from `class`.
#[must_use]
pub fn can_read<F: SqlType>(class: StorageClass) -> bool {
    read_codec::<F>().get(class).is_some()
}
