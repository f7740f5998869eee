use std::sync::Arc;

use crate::Reflect;
use crate::attrs::Rename;
use crate::info::{CustomAttributes, Type, Typed, impl_custom_attributes_fn};

// -----------------------------------------------------------------------------
// VariantInfo

/// One unit variant of a reflected enum.
#[derive(Debug, Clone)]
pub struct VariantInfo {
    name: &'static str,
    custom_attributes: Option<Arc<CustomAttributes>>,
}

impl VariantInfo {
    #[inline]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            custom_attributes: None,
        }
    }

    /// Declared name of the variant.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Name used in documents: the [`Rename`] attribute, else the declared name.
    #[inline]
    pub fn serialized_name(&self) -> &'static str {
        self.get_attribute::<Rename>().map_or(self.name, |rename| rename.0)
    }

    impl_custom_attributes_fn!(custom_attributes);
}

// -----------------------------------------------------------------------------
// EnumInfo

/// Type info for enums made only of unit variants.
///
/// The variant list is indexed in declaration order. `index_of` maps a value
/// to its index and `from_index` builds the value for an index.
#[derive(Debug, Clone)]
pub struct EnumInfo {
    ty: Type,
    variants: Box<[VariantInfo]>,
    index_of: fn(&dyn Reflect) -> Option<usize>,
    from_index: fn(usize) -> Option<Box<dyn Reflect>>,
    custom_attributes: Option<Arc<CustomAttributes>>,
}

impl EnumInfo {
    pub fn new<T: Typed>(
        variants: impl IntoIterator<Item = VariantInfo>,
        index_of: fn(&dyn Reflect) -> Option<usize>,
        from_index: fn(usize) -> Option<Box<dyn Reflect>>,
    ) -> Self {
        Self {
            ty: Type::of::<T>(),
            variants: variants.into_iter().collect(),
            index_of,
            from_index,
            custom_attributes: None,
        }
    }

    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub fn variants(&self) -> &[VariantInfo] {
        &self.variants
    }

    #[inline]
    pub fn variant_at(&self, index: usize) -> Option<&VariantInfo> {
        self.variants.get(index)
    }

    /// Index of the variant held by `value`.
    #[inline]
    pub fn index_of(&self, value: &dyn Reflect) -> Option<usize> {
        (self.index_of)(value)
    }

    #[inline]
    pub fn from_index(&self, index: usize) -> Option<Box<dyn Reflect>> {
        (self.from_index)(index)
    }

    /// Finds a variant by its serialized name.
    pub fn index_by_name(&self, name: &str) -> Option<usize> {
        self.variants
            .iter()
            .position(|variant| variant.serialized_name() == name)
    }

    impl_custom_attributes_fn!(custom_attributes);
}
