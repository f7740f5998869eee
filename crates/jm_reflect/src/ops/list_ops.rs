use crate::info::{ListKind, Typed};
use crate::{AccessError, Reflect};

/// Sequence-like containers: vectors, deques, sets and fixed arrays.
pub trait ListOps: Typed + Sized {
    type Item: Typed;

    const KIND: ListKind;

    fn list_len(&self) -> usize;

    /// Items in iteration order.
    fn list_iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_>;

    /// Builds the container from items in document order.
    fn list_from_items(items: Vec<Self::Item>) -> Result<Self, AccessError>;

    /// Appends every item of `other`.
    fn list_extend(&mut self, other: Self) -> Result<(), AccessError>;

    /// An empty container, if the type has one.
    fn list_default() -> Option<Self>;
}
