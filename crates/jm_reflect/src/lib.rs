#![doc = include_str!("../README.md")]

// -----------------------------------------------------------------------------
// Extern Self

// Generated code names `jm_reflect` by its absolute path, which must also
// resolve inside this crate.
extern crate self as jm_reflect;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod reflection;

pub mod attrs;
pub mod impls;
pub mod info;
pub mod ops;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use error::AccessError;
pub use jm_reflect_derive as derive;
pub use reflection::Reflect;
