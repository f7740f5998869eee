use core::hash::{BuildHasher, Hash};
use std::sync::{PoisonError, RwLock};

use crate::hash::FixedHashState;
use crate::hash::hashbrown::HashMap;
use crate::hash::hashbrown::hash_map::Entry;

// -----------------------------------------------------------------------------
// PublishMap

/// A read-mostly concurrent map with "first publish wins" semantics.
///
/// Values are built *outside* the lock. When two callers race to build the
/// same key, both builds run, but only the first one to reach
/// [`publish`](Self::publish) is stored; the other caller receives the stored
/// value and its own build is dropped.
///
/// Values are returned by clone, so `V` is usually an `Arc` or a small handle.
///
/// # Examples
///
/// ```
/// use jm_utils::PublishMap;
///
/// let map: PublishMap<&str, u32> = PublishMap::default();
/// assert_eq!(map.publish("a", 1), 1);
/// assert_eq!(map.publish("a", 2), 1); // the first value stays
///
/// let v: Result<u32, ()> = map.get_or_try_build("b", || Ok(7));
/// assert_eq!(v, Ok(7));
/// ```
pub struct PublishMap<K, V, S = FixedHashState> {
    table: RwLock<HashMap<K, V, S>>,
}

impl<K, V, S> PublishMap<K, V, S> {
    /// Creates an empty map with the given hash state.
    #[inline]
    pub const fn with_hasher(hasher: S) -> Self {
        Self {
            table: RwLock::new(HashMap::with_hasher(hasher)),
        }
    }

    /// Number of published entries.
    pub fn len(&self) -> usize {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash, V: Clone, S: BuildHasher> PublishMap<K, V, S> {
    /// Returns a clone of the published value, if any.
    pub fn get(&self, key: &K) -> Option<V> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Publishes `value` unless the key already has one.
    ///
    /// Returns the value that is stored after the call.
    pub fn publish(&self, key: K, value: V) -> V {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        match table.entry(key) {
            Entry::Occupied(entry) => {
                log::warn!("publish race lost, discarding redundant value");
                entry.get().clone()
            }
            Entry::Vacant(entry) => entry.insert(value).clone(),
        }
    }

    /// Stores `value`, replacing any previous one.
    ///
    /// Only meant for eager registration before the map is shared.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value)
    }

    /// Returns the published value, or builds and publishes one.
    ///
    /// `build` runs without holding any lock. A failed build publishes
    /// nothing, so a later call will try again.
    pub fn get_or_try_build<E>(&self, key: K, build: impl FnOnce() -> Result<V, E>) -> Result<V, E> {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = build()?;
        Ok(self.publish(key, value))
    }

    /// Infallible form of [`get_or_try_build`](Self::get_or_try_build).
    pub fn get_or_build(&self, key: K, build: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(&key) {
            return value;
        }
        self.publish(key, build())
    }
}

impl<K, V, S: Default> Default for PublishMap<K, V, S> {
    #[inline]
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

#[cfg(test)]
mod tests {
    use super::PublishMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn first_publish_wins() {
        let map: PublishMap<u32, Arc<str>> = PublishMap::default();
        let first = map.publish(1, Arc::from("first"));
        let second = map.publish(1, Arc::from("second"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(&*map.get(&1).unwrap(), "first");
    }

    #[test]
    fn failed_build_is_not_published() {
        let map: PublishMap<u32, u32> = PublishMap::default();
        let err: Result<u32, &str> = map.get_or_try_build(3, || Err("nope"));
        assert_eq!(err, Err("nope"));
        assert!(map.is_empty());
        assert_eq!(map.get_or_build(3, || 9), 9);
    }

    #[test]
    fn racing_builders_agree_on_one_value() {
        let map: Arc<PublishMap<u32, Arc<usize>>> = Arc::new(PublishMap::default());
        let builds = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let map = Arc::clone(&map);
                let builds = Arc::clone(&builds);
                std::thread::spawn(move || {
                    map.get_or_build(0, || {
                        builds.fetch_add(1, Ordering::Relaxed);
                        Arc::new(i)
                    })
                })
            })
            .collect();

        let values: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(values.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert!(builds.load(Ordering::Relaxed) >= 1);
        assert_eq!(map.len(), 1);
    }
}
