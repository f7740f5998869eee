//! Declarative attribute records attached to classes and members.
//!
//! Attributes are plain values stored in a
//! [`CustomAttributes`](crate::info::CustomAttributes) table keyed by their
//! type. The derive macro creates the common ones from
//! `#[reflect(rename = "..")]`, `#[reflect(ignore)]` and friends; any other
//! value can be attached with `#[reflect(@expr)]`.

/// Serialized name of a field, method, parameter or enum variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rename(pub &'static str);

/// Excludes a member from mapping in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ignore;

/// Minimum API version at which a property is serialized.
///
/// A property tagged `Since(3)` is left out when the mapper is configured
/// with a version lower than `3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Since(pub u32);

/// Properties listed here are emitted first, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyOrder(pub &'static [&'static str]);

/// Class-level list of property names excluded from mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IgnoreProperties(pub &'static [&'static str]);

/// Marks a class as a record: accessors are its readers and the canonical
/// constructor is its only way in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record;
