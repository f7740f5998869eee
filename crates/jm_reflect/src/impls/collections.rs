use core::hash::{BuildHasher, Hash};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use indexmap::IndexMap;

use crate::impls::GenericTypeInfoCell;
use crate::info::{ListInfo, ListKind, MapInfo, MapKind, TypeInfo, Typed};
use crate::ops::{ListOps, MapOps};
use crate::{AccessError, Reflect};

// -----------------------------------------------------------------------------
// Lists

macro_rules! impl_list_typed {
    () => {
        fn type_info() -> &'static TypeInfo {
            static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
            CELL.get_or_insert::<Self>(|| TypeInfo::List(ListInfo::new::<Self>()))
        }
    };
}

impl<T: Typed> Typed for Vec<T> {
    impl_list_typed!();
}

impl<T: Typed> ListOps for Vec<T> {
    type Item = T;
    const KIND: ListKind = ListKind::List;

    fn list_len(&self) -> usize {
        self.len()
    }

    fn list_iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(self.iter().map(|item| item as &dyn Reflect))
    }

    fn list_from_items(items: Vec<T>) -> Result<Self, AccessError> {
        Ok(items)
    }

    fn list_extend(&mut self, other: Self) -> Result<(), AccessError> {
        self.extend(other);
        Ok(())
    }

    fn list_default() -> Option<Self> {
        Some(Vec::new())
    }
}

impl<T: Typed> Typed for VecDeque<T> {
    impl_list_typed!();
}

impl<T: Typed> ListOps for VecDeque<T> {
    type Item = T;
    const KIND: ListKind = ListKind::Queue;

    fn list_len(&self) -> usize {
        self.len()
    }

    fn list_iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(self.iter().map(|item| item as &dyn Reflect))
    }

    fn list_from_items(items: Vec<T>) -> Result<Self, AccessError> {
        // Sized to the document array up front.
        let mut queue = VecDeque::with_capacity(items.len());
        queue.extend(items);
        Ok(queue)
    }

    fn list_extend(&mut self, other: Self) -> Result<(), AccessError> {
        self.extend(other);
        Ok(())
    }

    fn list_default() -> Option<Self> {
        Some(VecDeque::new())
    }
}

impl<T, S> Typed for HashSet<T, S>
where
    T: Typed + Eq + Hash,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    impl_list_typed!();
}

impl<T, S> ListOps for HashSet<T, S>
where
    T: Typed + Eq + Hash,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    type Item = T;
    const KIND: ListKind = ListKind::Set;

    fn list_len(&self) -> usize {
        self.len()
    }

    fn list_iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(self.iter().map(|item| item as &dyn Reflect))
    }

    fn list_from_items(items: Vec<T>) -> Result<Self, AccessError> {
        Ok(items.into_iter().collect())
    }

    fn list_extend(&mut self, other: Self) -> Result<(), AccessError> {
        self.extend(other);
        Ok(())
    }

    fn list_default() -> Option<Self> {
        Some(HashSet::default())
    }
}

impl<T: Typed + Ord> Typed for BTreeSet<T> {
    impl_list_typed!();
}

impl<T: Typed + Ord> ListOps for BTreeSet<T> {
    type Item = T;
    const KIND: ListKind = ListKind::SortedSet;

    fn list_len(&self) -> usize {
        self.len()
    }

    fn list_iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(self.iter().map(|item| item as &dyn Reflect))
    }

    fn list_from_items(items: Vec<T>) -> Result<Self, AccessError> {
        Ok(items.into_iter().collect())
    }

    fn list_extend(&mut self, other: Self) -> Result<(), AccessError> {
        self.extend(other);
        Ok(())
    }

    fn list_default() -> Option<Self> {
        Some(BTreeSet::new())
    }
}

impl<T: Typed, const N: usize> Typed for [T; N] {
    impl_list_typed!();
}

impl<T: Typed, const N: usize> ListOps for [T; N] {
    type Item = T;
    const KIND: ListKind = ListKind::Array(N);

    fn list_len(&self) -> usize {
        N
    }

    fn list_iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
        Box::new(self.iter().map(|item| item as &dyn Reflect))
    }

    fn list_from_items(items: Vec<T>) -> Result<Self, AccessError> {
        <[T; N]>::try_from(items).map_err(|items: Vec<T>| AccessError::Length {
            expected: N,
            found: items.len(),
        })
    }

    fn list_extend(&mut self, _other: Self) -> Result<(), AccessError> {
        Err(AccessError::Unsupported("a fixed-size array cannot grow"))
    }

    fn list_default() -> Option<Self> {
        None
    }
}

// -----------------------------------------------------------------------------
// Maps

macro_rules! impl_map_typed {
    () => {
        fn type_info() -> &'static TypeInfo {
            static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
            CELL.get_or_insert::<Self>(|| TypeInfo::Map(MapInfo::new::<Self>()))
        }
    };
}

impl<K, V, S> Typed for HashMap<K, V, S>
where
    K: Typed + Eq + Hash,
    V: Typed,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    impl_map_typed!();
}

impl<K, V, S> MapOps for HashMap<K, V, S>
where
    K: Typed + Eq + Hash,
    V: Typed,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    type Key = K;
    type Value = V;
    const KIND: MapKind = MapKind::Plain;

    fn map_len(&self) -> usize {
        self.len()
    }

    fn map_iter(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
        Box::new(self.iter().map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect)))
    }

    fn map_insert(&mut self, key: K, value: V) {
        self.insert(key, value);
    }

    fn map_into_entries(self) -> Vec<(K, V)> {
        self.into_iter().collect()
    }
}

impl<K: Typed + Ord, V: Typed> Typed for BTreeMap<K, V> {
    impl_map_typed!();
}

impl<K: Typed + Ord, V: Typed> MapOps for BTreeMap<K, V> {
    type Key = K;
    type Value = V;
    const KIND: MapKind = MapKind::Sorted;

    fn map_len(&self) -> usize {
        self.len()
    }

    fn map_iter(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
        Box::new(self.iter().map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect)))
    }

    fn map_insert(&mut self, key: K, value: V) {
        self.insert(key, value);
    }

    fn map_into_entries(self) -> Vec<(K, V)> {
        self.into_iter().collect()
    }
}

impl<K, V, S> Typed for IndexMap<K, V, S>
where
    K: Typed + Eq + Hash,
    V: Typed,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    impl_map_typed!();
}

impl<K, V, S> MapOps for IndexMap<K, V, S>
where
    K: Typed + Eq + Hash,
    V: Typed,
    S: BuildHasher + Default + Send + Sync + 'static,
{
    type Key = K;
    type Value = V;
    const KIND: MapKind = MapKind::Ordered;

    fn map_len(&self) -> usize {
        self.len()
    }

    fn map_iter(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
        Box::new(self.iter().map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect)))
    }

    fn map_insert(&mut self, key: K, value: V) {
        self.insert(key, value);
    }

    fn map_into_entries(self) -> Vec<(K, V)> {
        self.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, VecDeque};

    use indexmap::IndexMap;

    use crate::Reflect;
    use crate::info::{ListKind, MapKind, Typed};

    #[test]
    fn list_round_trip_through_erased_items() {
        let info = <VecDeque<u16>>::type_info().as_list().unwrap();
        assert_eq!(info.kind(), ListKind::Queue);

        let items: Vec<Box<dyn Reflect>> = vec![Box::new(1_u16), Box::new(2_u16)];
        let queue = info.from_items(items).unwrap();
        assert_eq!(info.len(&*queue), 2);
        let collected: Vec<u16> = info
            .iter(&*queue)
            .map(|item| *item.downcast_ref::<u16>().unwrap())
            .collect();
        assert_eq!(collected, [1, 2]);
    }

    #[test]
    fn array_length_is_checked() {
        let info = <[u8; 2]>::type_info().as_list().unwrap();
        assert_eq!(info.kind(), ListKind::Array(2));
        assert!(info.is_bytes());
        let short: Vec<Box<dyn Reflect>> = vec![Box::new(1_u8)];
        assert!(info.from_items(short).is_err());
    }

    #[test]
    fn extend_merges_into_existing_list() {
        let info = <Vec<String>>::type_info().as_list().unwrap();
        let mut target = vec!["a".to_string()];
        info.extend(&mut target, Box::new(vec!["b".to_string()])).unwrap();
        assert_eq!(target, ["a", "b"]);
    }

    #[test]
    fn map_kinds_and_entries() {
        assert_eq!(
            <BTreeMap<String, u8>>::type_info().as_map().unwrap().kind(),
            MapKind::Sorted
        );

        let info = <IndexMap<String, u8>>::type_info().as_map().unwrap();
        assert_eq!(info.kind(), MapKind::Ordered);
        let entries: Vec<(Box<dyn Reflect>, Box<dyn Reflect>)> = vec![
            (Box::new("z".to_string()) as Box<dyn Reflect>, Box::new(1_u8) as Box<dyn Reflect>),
            (Box::new("a".to_string()) as Box<dyn Reflect>, Box::new(2_u8) as Box<dyn Reflect>),
        ];
        let map = info.from_entries(entries).unwrap();
        let keys: Vec<&str> = info
            .iter(&*map)
            .map(|(k, _)| k.downcast_ref::<String>().unwrap().as_str())
            .collect();
        assert_eq!(keys, ["z", "a"]);
    }
}
