#![doc = include_str!("../README.md")]

// -----------------------------------------------------------------------------
// Modules

mod publish;
mod typeid_map;

pub mod hash;

// -----------------------------------------------------------------------------
// Top-level exports

pub use publish::PublishMap;
pub use typeid_map::TypeIdMap;
