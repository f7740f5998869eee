use core::any::{Any, TypeId};
use core::fmt;
use std::sync::Arc;

use jm_utils::TypeIdMap;

// -----------------------------------------------------------------------------
// CustomAttributes

/// Attribute records attached to a class, member, parameter or variant.
///
/// Attributes are stored by their [`TypeId`], so there is at most one
/// attribute per type. Later insertions overwrite earlier ones.
///
/// ```
/// use jm_reflect::attrs::{Rename, Since};
/// use jm_reflect::info::CustomAttributes;
///
/// let attrs = CustomAttributes::new()
///     .with_attribute(Rename("years"))
///     .with_attribute(Since(2));
///
/// assert_eq!(attrs.get::<Rename>(), Some(&Rename("years")));
/// assert!(attrs.contains::<Since>());
/// assert!(!attrs.contains::<u8>());
/// ```
#[derive(Default, Clone)]
pub struct CustomAttributes {
    attributes: TypeIdMap<Arc<dyn Any + Send + Sync>>,
}

impl CustomAttributes {
    /// Shared empty table, returned when a member carries no attributes.
    pub(crate) const EMPTY: &'static Self = &Self::new();

    #[inline]
    pub const fn new() -> Self {
        Self {
            attributes: TypeIdMap::new(),
        }
    }

    /// Adds an attribute, replacing one of the same type.
    #[inline]
    pub fn with_attribute<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    #[inline]
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.attributes.insert(TypeId::of::<T>(), Arc::new(value));
    }

    #[inline]
    pub fn contains<T: Any>(&self) -> bool {
        self.attributes.contains(&TypeId::of::<T>())
    }

    #[inline]
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.attributes
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl fmt::Debug for CustomAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomAttributes")
            .field("len", &self.attributes.len())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Auxiliary macro

/// Implements `custom_attributes`, `get_attribute`, `has_attribute` and
/// `with_attribute` for a descriptor holding `Option<Arc<CustomAttributes>>`.
macro_rules! impl_custom_attributes_fn {
    ($field:ident) => {
        /// Returns the attribute table.
        #[inline]
        pub fn custom_attributes(&self) -> &$crate::info::CustomAttributes {
            match &self.$field {
                Some(attrs) => attrs,
                None => $crate::info::CustomAttributes::EMPTY,
            }
        }

        /// Returns the attribute of type `A`, if present.
        #[inline]
        pub fn get_attribute<A: ::core::any::Any>(&self) -> Option<&A> {
            self.custom_attributes().get::<A>()
        }

        /// Returns `true` if an attribute of type `A` is present.
        #[inline]
        pub fn has_attribute<A: ::core::any::Any>(&self) -> bool {
            self.custom_attributes().contains::<A>()
        }

        /// Replaces the attribute table.
        pub fn with_custom_attributes(mut self, attributes: $crate::info::CustomAttributes) -> Self {
            self.$field = if attributes.is_empty() {
                None
            } else {
                Some(::std::sync::Arc::new(attributes))
            };
            self
        }

        /// Adds one attribute, keeping the existing ones.
        pub fn with_attribute<A: ::core::any::Any + Send + Sync>(mut self, value: A) -> Self {
            let mut attrs = match self.$field.take() {
                Some(attrs) => ::std::sync::Arc::unwrap_or_clone(attrs),
                None => $crate::info::CustomAttributes::new(),
            };
            attrs.insert(value);
            self.$field = Some(::std::sync::Arc::new(attrs));
            self
        }
    };
}

pub(crate) use impl_custom_attributes_fn;
