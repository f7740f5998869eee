use crate::info::{MapKind, Typed};
use crate::Reflect;

/// Key-value containers: hash maps, sorted maps and insertion-ordered maps.
pub trait MapOps: Typed + Default + Sized {
    type Key: Typed;
    type Value: Typed;

    const KIND: MapKind;

    fn map_len(&self) -> usize;

    /// Entries in iteration order.
    fn map_iter(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_>;

    fn map_insert(&mut self, key: Self::Key, value: Self::Value);

    /// Consumes the map into its entries, in iteration order.
    fn map_into_entries(self) -> Vec<(Self::Key, Self::Value)>;

    /// Builds the container from entries in document order.
    fn map_from_entries(entries: Vec<(Self::Key, Self::Value)>) -> Self {
        let mut map = Self::default();
        for (key, value) in entries {
            map.map_insert(key, value);
        }
        map
    }
}
