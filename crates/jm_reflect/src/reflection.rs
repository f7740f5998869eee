use core::any::{Any, TypeId};
use core::fmt;

use crate::info::{TypeInfo, Typed};

// -----------------------------------------------------------------------------
// Reflect

/// A value whose shape can be inspected at runtime.
///
/// Implemented for every [`Typed`] type, so it never needs a manual impl.
///
/// # Boxed values
///
/// `Box<dyn Reflect>` is itself `Typed` (it describes a dynamic slot), so a
/// method called directly on a box resolves to the *box*. Dereference first
/// (`(*boxed).reflect_type_info()` or `&*boxed`) to reach the inner value.
pub trait Reflect: Any + Send + Sync {
    /// Returns the [`TypeInfo`] of the runtime type.
    fn reflect_type_info(&self) -> &'static TypeInfo;

    /// Returns the full type path of the runtime type.
    fn reflect_type_path(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn as_reflect(&self) -> &dyn Reflect;

    fn as_reflect_mut(&mut self) -> &mut dyn Reflect;
}

impl<T: Typed> Reflect for T {
    #[inline]
    fn reflect_type_info(&self) -> &'static TypeInfo {
        T::type_info()
    }

    #[inline]
    fn reflect_type_path(&self) -> &'static str {
        T::type_info().type_path()
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    #[inline]
    fn as_reflect(&self) -> &dyn Reflect {
        self
    }

    #[inline]
    fn as_reflect_mut(&mut self) -> &mut dyn Reflect {
        self
    }
}

impl dyn Reflect {
    /// The [`TypeId`] of the runtime type.
    #[inline]
    pub fn ty_id(&self) -> TypeId {
        Any::type_id(self.as_any())
    }

    /// Returns `true` if the runtime type is `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.ty_id() == TypeId::of::<T>()
    }

    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Moves the value out of the box if its runtime type is `T`.
    ///
    /// On mismatch the original box is handed back.
    ///
    /// ```
    /// use jm_reflect::Reflect;
    ///
    /// let value: Box<dyn Reflect> = Box::new(7_u32);
    /// let value = value.take::<String>().unwrap_err();
    /// assert_eq!(value.take::<u32>().ok(), Some(7));
    /// ```
    pub fn take<T: Any>(self: Box<Self>) -> Result<T, Box<dyn Reflect>> {
        if self.is::<T>() {
            match self.into_any().downcast::<T>() {
                Ok(value) => Ok(*value),
                // `is` already checked the type id.
                Err(_) => unreachable!(),
            }
        } else {
            Err(self)
        }
    }
}

impl fmt::Debug for dyn Reflect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reflect_type_info().display(self) {
            Some(text) => write!(f, "{}({text})", self.reflect_type_path()),
            None => write!(f, "{}", self.reflect_type_path()),
        }
    }
}
