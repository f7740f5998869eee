use core::any::TypeId;
use core::fmt;

use crate::hash::NoOpHashState;
use crate::hash::hashbrown::HashMap;
use crate::hash::hashbrown::hash_map::Entry;

// -----------------------------------------------------------------------------
// TypeIdMap

/// A map container with [`TypeId`] as the fixed key type.
///
/// Used for attribute tables and per-type caches. The underlying
/// [`HashMap`] is not exposed.
#[derive(Clone)]
pub struct TypeIdMap<V>(HashMap<TypeId, V, NoOpHashState>);

impl<V> TypeIdMap<V> {
    /// Creates an empty `TypeIdMap`.
    ///
    /// ```
    /// use jm_utils::TypeIdMap;
    /// let map = TypeIdMap::<i32>::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    pub const fn new() -> Self {
        Self(HashMap::with_hasher(NoOpHashState))
    }

    /// Inserts the value produced by `f` if the key is absent.
    ///
    /// Returns `true` when a value was inserted.
    #[inline]
    pub fn try_insert(&mut self, type_id: TypeId, f: impl FnOnce() -> V) -> bool {
        match self.0.entry(type_id) {
            Entry::Vacant(entry) => {
                entry.insert(f());
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Gets the value for the key, inserting the result of `f` if absent.
    #[inline]
    pub fn get_or_insert(&mut self, type_id: TypeId, f: impl FnOnce() -> V) -> &mut V {
        match self.0.entry(type_id) {
            Entry::Vacant(entry) => entry.insert(f()),
            Entry::Occupied(entry) => entry.into_mut(),
        }
    }

    #[inline]
    pub fn get(&self, type_id: &TypeId) -> Option<&V> {
        self.0.get(type_id)
    }

    #[inline(always)]
    pub fn get_type<T: ?Sized + 'static>(&self) -> Option<&V> {
        self.get(&TypeId::of::<T>())
    }

    #[inline]
    pub fn insert(&mut self, type_id: TypeId, v: V) -> Option<V> {
        self.0.insert(type_id, v)
    }

    #[inline(always)]
    pub fn insert_type<T: ?Sized + 'static>(&mut self, v: V) -> Option<V> {
        self.insert(TypeId::of::<T>(), v)
    }

    #[inline]
    pub fn contains(&self, type_id: &TypeId) -> bool {
        self.0.contains_key(type_id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over all values in arbitrary order.
    #[inline]
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.0.values()
    }
}

impl<V> Default for TypeIdMap<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for TypeIdMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::TypeIdMap;
    use core::any::TypeId;

    #[test]
    fn insert_and_lookup_by_type() {
        let mut map = TypeIdMap::new();
        assert!(map.try_insert(TypeId::of::<u8>(), || "u8"));
        assert!(!map.try_insert(TypeId::of::<u8>(), || "again"));
        map.insert_type::<String>("string");

        assert_eq!(map.get_type::<u8>(), Some(&"u8"));
        assert_eq!(map.get_type::<String>(), Some(&"string"));
        assert_eq!(map.get_type::<i64>(), None);
        assert_eq!(map.len(), 2);
    }
}
