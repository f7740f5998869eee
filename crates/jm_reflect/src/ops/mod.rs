//! Container operations behind [`ListInfo`](crate::info::ListInfo) and
//! [`MapInfo`](crate::info::MapInfo).
//!
//! The traits are implemented for concrete container types; the info
//! structs erase them into function pointers over `dyn Reflect`.

// -----------------------------------------------------------------------------
// Modules

mod list_ops;
mod map_ops;

// -----------------------------------------------------------------------------
// Exports

pub use list_ops::ListOps;
pub use map_ops::MapOps;
