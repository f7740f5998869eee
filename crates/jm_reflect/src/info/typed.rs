use core::any::Any;

use crate::info::TypeInfo;

/// Static access to the [`TypeInfo`] of a type.
///
/// Usually implemented by `#[derive(Reflect)]`. Manual impls cache the info
/// in a [`NonGenericTypeInfoCell`](crate::impls::NonGenericTypeInfoCell) or,
/// for generic types, a [`GenericTypeInfoCell`](crate::impls::GenericTypeInfoCell).
///
/// ```
/// use jm_reflect::impls::NonGenericTypeInfoCell;
/// use jm_reflect::info::{ClassInfo, TypeInfo, Typed};
///
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// impl Typed for Point {
///     fn type_info() -> &'static TypeInfo {
///         static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
///         CELL.get_or_init(|| {
///             TypeInfo::Class(
///                 ClassInfo::builder::<Point>()
///                     .field("x", |p| &p.x, |p| &mut p.x)
///                     .field("y", |p| &p.y, |p| &mut p.y)
///                     .build(),
///             )
///         })
///     }
/// }
///
/// let class = Point::type_info().as_class().unwrap();
/// assert_eq!(class.members().unwrap().fields().len(), 2);
/// ```
pub trait Typed: Any + Send + Sync {
    fn type_info() -> &'static TypeInfo;
}
