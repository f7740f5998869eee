use crate::info::{Type, TypeInfo, Typed};
use crate::{AccessError, Reflect};

// -----------------------------------------------------------------------------
// OptionInfo

/// Type info for `Option<T>`, the nillable wrapper.
#[derive(Debug, Clone)]
pub struct OptionInfo {
    ty: Type,
    some_ty: Type,
    some_info: fn() -> &'static TypeInfo,
    get: fn(&dyn Reflect) -> Option<&dyn Reflect>,
    wrap: fn(Option<Box<dyn Reflect>>) -> Result<Box<dyn Reflect>, AccessError>,
}

impl OptionInfo {
    pub fn new<T: Typed>() -> Self {
        Self {
            ty: Type::of::<Option<T>>(),
            some_ty: Type::of::<T>(),
            some_info: T::type_info,
            get: option_get::<T>,
            wrap: option_wrap::<T>,
        }
    }

    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub const fn some_ty(&self) -> &Type {
        &self.some_ty
    }

    #[inline]
    pub fn some_info(&self) -> &'static TypeInfo {
        (self.some_info)()
    }

    /// Borrows the inner value; `None` for `None` or a foreign value.
    #[inline]
    pub fn get<'a>(&self, value: &'a dyn Reflect) -> Option<&'a dyn Reflect> {
        (self.get)(value)
    }

    /// Builds `Some(inner)` or `None`.
    #[inline]
    pub fn wrap(&self, inner: Option<Box<dyn Reflect>>) -> Result<Box<dyn Reflect>, AccessError> {
        (self.wrap)(inner)
    }
}

fn option_get<T: Typed>(value: &dyn Reflect) -> Option<&dyn Reflect> {
    value
        .downcast_ref::<Option<T>>()?
        .as_ref()
        .map(|inner| inner as &dyn Reflect)
}

fn option_wrap<T: Typed>(inner: Option<Box<dyn Reflect>>) -> Result<Box<dyn Reflect>, AccessError> {
    match inner {
        None => Ok(Box::new(None::<T>)),
        Some(inner) => match inner.take::<T>() {
            Ok(inner) => Ok(Box::new(Some(inner))),
            Err(inner) => Err(AccessError::mismatch::<T>(&*inner)),
        },
    }
}

// -----------------------------------------------------------------------------
// PointerInfo

/// Type info for `Box<T>`.
#[derive(Debug, Clone)]
pub struct PointerInfo {
    ty: Type,
    inner_info: fn() -> &'static TypeInfo,
    deref: fn(&dyn Reflect) -> Option<&dyn Reflect>,
    wrap: fn(Box<dyn Reflect>) -> Result<Box<dyn Reflect>, AccessError>,
}

impl PointerInfo {
    pub fn new<T: Typed>() -> Self {
        Self {
            ty: Type::of::<Box<T>>(),
            inner_info: T::type_info,
            deref: |value| value.downcast_ref::<Box<T>>().map(|inner| &**inner as &dyn Reflect),
            wrap: |inner| match inner.take::<T>() {
                Ok(inner) => Ok(Box::new(Box::new(inner))),
                Err(inner) => Err(AccessError::mismatch::<T>(&*inner)),
            },
        }
    }

    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub fn inner_info(&self) -> &'static TypeInfo {
        (self.inner_info)()
    }

    #[inline]
    pub fn deref<'a>(&self, value: &'a dyn Reflect) -> Option<&'a dyn Reflect> {
        (self.deref)(value)
    }

    #[inline]
    pub fn wrap(&self, inner: Box<dyn Reflect>) -> Result<Box<dyn Reflect>, AccessError> {
        (self.wrap)(inner)
    }
}

// -----------------------------------------------------------------------------
// DynamicInfo

/// Type info for `Box<dyn Reflect>`: a slot whose shape is only known from
/// the runtime value.
#[derive(Debug, Clone)]
pub struct DynamicInfo {
    ty: Type,
}

impl DynamicInfo {
    pub fn new() -> Self {
        Self {
            ty: Type::of::<Box<dyn Reflect>>(),
        }
    }

    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    /// Borrows the value held by the slot.
    #[inline]
    pub fn deref<'a>(&self, value: &'a dyn Reflect) -> Option<&'a dyn Reflect> {
        value.downcast_ref::<Box<dyn Reflect>>().map(|inner| &**inner)
    }

    /// Puts any value into a slot.
    #[inline]
    pub fn wrap(&self, inner: Box<dyn Reflect>) -> Box<dyn Reflect> {
        Box::new(inner)
    }
}
