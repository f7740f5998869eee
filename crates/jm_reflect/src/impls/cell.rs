//! Static storage for [`TypeInfo`].
//!
//! Non-generic types keep their info in a [`NonGenericTypeInfoCell`], a thin
//! [`OnceLock`]. A `static` inside a generic function is shared by every
//! instantiation, so generic types use [`GenericTypeInfoCell`], which keys
//! the leaked infos by [`TypeId`].

use core::any::{Any, TypeId};
use std::sync::{OnceLock, PoisonError, RwLock};

use jm_utils::TypeIdMap;

use crate::info::TypeInfo;

/// Storage for the [`TypeInfo`] of a non-generic type.
///
/// See [`Typed`](crate::info::Typed) for an example.
pub struct NonGenericTypeInfoCell(OnceLock<TypeInfo>);

impl NonGenericTypeInfoCell {
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the stored info, building it with `f` on first use.
    #[inline]
    pub fn get_or_init(&self, f: impl FnOnce() -> TypeInfo) -> &TypeInfo {
        self.0.get_or_init(f)
    }
}

/// Storage for the [`TypeInfo`] of every instantiation of a generic type.
///
/// ```
/// use jm_reflect::impls::GenericTypeInfoCell;
/// use jm_reflect::info::{ClassInfo, TypeInfo, Typed};
///
/// struct Wrapper<T> {
///     value: T,
/// }
///
/// impl<T: Typed> Typed for Wrapper<T> {
///     fn type_info() -> &'static TypeInfo {
///         static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
///         CELL.get_or_insert::<Self>(|| {
///             TypeInfo::Class(
///                 ClassInfo::builder::<Self>()
///                     .field("value", |w| &w.value, |w| &mut w.value)
///                     .build(),
///             )
///         })
///     }
/// }
///
/// let a = <Wrapper<u8>>::type_info();
/// let b = <Wrapper<String>>::type_info();
/// assert_ne!(a.type_id(), b.type_id());
/// ```
pub struct GenericTypeInfoCell(RwLock<TypeIdMap<&'static TypeInfo>>);

impl GenericTypeInfoCell {
    #[inline]
    pub const fn new() -> Self {
        Self(RwLock::new(TypeIdMap::new()))
    }

    /// Returns the info stored for `G`, building it with `f` on first use.
    ///
    /// `f` runs without the lock held, so it may look up other generic
    /// infos. If two threads race, the first insert is kept.
    pub fn get_or_insert<G: Any + ?Sized>(&self, f: impl FnOnce() -> TypeInfo) -> &'static TypeInfo {
        let type_id = TypeId::of::<G>();

        let cached = self
            .0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .copied();
        if let Some(info) = cached {
            return info;
        }

        let built = f();
        let mut table = self.0.write().unwrap_or_else(PoisonError::into_inner);
        *table.get_or_insert(type_id, || {
            log::trace!("leaking type info for `{}`", built.type_path());
            Box::leak(Box::new(built))
        })
    }
}
