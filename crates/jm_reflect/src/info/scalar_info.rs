use core::fmt;
use std::sync::Arc;

use crate::Reflect;
use crate::info::{CustomAttributes, Type, Typed, impl_custom_attributes_fn};

type FormatFn = fn(&dyn Reflect, &mut fmt::Formatter<'_>) -> fmt::Result;

// -----------------------------------------------------------------------------
// OpaqueInfo

/// Type info for scalar values with no visible structure.
///
/// Opaque values cross the JSON boundary through an adapter. The optional
/// format function is what the fallback converter prints when no adapter
/// is registered.
#[derive(Clone)]
pub struct OpaqueInfo {
    ty: Type,
    format: Option<FormatFn>,
    default: Option<fn() -> Box<dyn Reflect>>,
    custom_attributes: Option<Arc<CustomAttributes>>,
}

impl OpaqueInfo {
    pub fn new<T: Typed>() -> Self {
        Self {
            ty: Type::of::<T>(),
            format: None,
            default: None,
            custom_attributes: None,
        }
    }

    /// Formats values through their [`Display`](fmt::Display) impl.
    pub fn with_display<T: Typed + fmt::Display>(mut self) -> Self {
        debug_assert!(self.ty.is::<T>());
        self.format = Some(display_fmt::<T>);
        self
    }

    /// Formats values through their [`Debug`](fmt::Debug) impl.
    pub fn with_debug<T: Typed + fmt::Debug>(mut self) -> Self {
        debug_assert!(self.ty.is::<T>());
        self.format = Some(debug_fmt::<T>);
        self
    }

    pub fn with_default<T: Typed + Default>(mut self) -> Self {
        debug_assert!(self.ty.is::<T>());
        self.default = Some(|| Box::new(T::default()));
        self
    }

    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    /// Renders `value` with the registered format function.
    pub fn display(&self, value: &dyn Reflect) -> Option<String> {
        let format = self.format?;
        struct Shim<'a>(&'a dyn Reflect, FormatFn);
        impl fmt::Display for Shim<'_> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                (self.1)(self.0, f)
            }
        }
        let mut out = String::new();
        fmt::write(&mut out, format_args!("{}", Shim(value, format))).ok()?;
        Some(out)
    }

    #[inline]
    pub fn default_value(&self) -> Option<Box<dyn Reflect>> {
        self.default.map(|f| f())
    }

    impl_custom_attributes_fn!(custom_attributes);
}

fn display_fmt<T: Typed + fmt::Display>(value: &dyn Reflect, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value.downcast_ref::<T>() {
        Some(value) => fmt::Display::fmt(value, f),
        None => Err(fmt::Error),
    }
}

fn debug_fmt<T: Typed + fmt::Debug>(value: &dyn Reflect, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value.downcast_ref::<T>() {
        Some(value) => fmt::Debug::fmt(value, f),
        None => Err(fmt::Error),
    }
}

impl fmt::Debug for OpaqueInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpaqueInfo").field("ty", &self.ty).finish()
    }
}

// -----------------------------------------------------------------------------
// JsonInfo

/// Type info for raw JSON values, copied through unchanged.
#[derive(Debug, Clone)]
pub struct JsonInfo {
    ty: Type,
}

impl JsonInfo {
    pub fn new<T: Typed>() -> Self {
        Self { ty: Type::of::<T>() }
    }

    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }
}
