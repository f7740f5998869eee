//! [`Typed`](crate::info::Typed) impls for std and ecosystem types, plus
//! the cells used to cache type info.

// -----------------------------------------------------------------------------
// Modules

mod cell;
mod collections;
mod errors;
mod primitives;
mod scalars;
mod wrappers;

// -----------------------------------------------------------------------------
// Exports

pub use cell::{GenericTypeInfoCell, NonGenericTypeInfoCell};
