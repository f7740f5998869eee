use crate::info::{Type, TypeInfo, Typed};
use crate::ops::MapOps;
use crate::{AccessError, Reflect};

/// Which map implementation a map target stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapKind {
    /// Hash map, iteration order unspecified.
    Plain,
    /// Ordered by natural key order.
    Sorted,
    /// Ordered by insertion.
    Ordered,
}

type EntryIterFn =
    for<'a> fn(&'a dyn Reflect) -> Box<dyn Iterator<Item = (&'a dyn Reflect, &'a dyn Reflect)> + 'a>;

/// Type info for key-value containers.
#[derive(Debug, Clone)]
pub struct MapInfo {
    ty: Type,
    kind: MapKind,
    key_ty: Type,
    key_info: fn() -> &'static TypeInfo,
    value_ty: Type,
    value_info: fn() -> &'static TypeInfo,
    len: fn(&dyn Reflect) -> usize,
    iter: EntryIterFn,
    from_entries: fn(Vec<(Box<dyn Reflect>, Box<dyn Reflect>)>) -> Result<Box<dyn Reflect>, AccessError>,
    extend: fn(&mut dyn Reflect, Box<dyn Reflect>) -> Result<(), AccessError>,
    default: fn() -> Box<dyn Reflect>,
}

impl MapInfo {
    pub fn new<M: MapOps>() -> Self {
        Self {
            ty: Type::of::<M>(),
            kind: M::KIND,
            key_ty: Type::of::<M::Key>(),
            key_info: <M::Key as Typed>::type_info,
            value_ty: Type::of::<M::Value>(),
            value_info: <M::Value as Typed>::type_info,
            len: |value| value.downcast_ref::<M>().map_or(0, M::map_len),
            iter: map_iter::<M>,
            from_entries: map_from_entries::<M>,
            extend: map_extend::<M>,
            default: || Box::new(M::default()),
        }
    }

    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub const fn kind(&self) -> MapKind {
        self.kind
    }

    #[inline]
    pub const fn key_ty(&self) -> &Type {
        &self.key_ty
    }

    #[inline]
    pub fn key_info(&self) -> &'static TypeInfo {
        (self.key_info)()
    }

    #[inline]
    pub const fn value_ty(&self) -> &Type {
        &self.value_ty
    }

    #[inline]
    pub fn value_info(&self) -> &'static TypeInfo {
        (self.value_info)()
    }

    #[inline]
    pub fn len(&self, value: &dyn Reflect) -> usize {
        (self.len)(value)
    }

    #[inline]
    pub fn iter<'a>(
        &self,
        value: &'a dyn Reflect,
    ) -> Box<dyn Iterator<Item = (&'a dyn Reflect, &'a dyn Reflect)> + 'a> {
        (self.iter)(value)
    }

    #[inline]
    pub fn from_entries(
        &self,
        entries: Vec<(Box<dyn Reflect>, Box<dyn Reflect>)>,
    ) -> Result<Box<dyn Reflect>, AccessError> {
        (self.from_entries)(entries)
    }

    /// Inserts every entry of `other`, a value of the same map type.
    #[inline]
    pub fn extend(&self, target: &mut dyn Reflect, other: Box<dyn Reflect>) -> Result<(), AccessError> {
        (self.extend)(target, other)
    }

    #[inline]
    pub fn default_value(&self) -> Box<dyn Reflect> {
        (self.default)()
    }
}

fn map_iter<M: MapOps>(value: &dyn Reflect) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
    match value.downcast_ref::<M>() {
        Some(map) => map.map_iter(),
        None => Box::new(core::iter::empty()),
    }
}

fn map_from_entries<M: MapOps>(
    entries: Vec<(Box<dyn Reflect>, Box<dyn Reflect>)>,
) -> Result<Box<dyn Reflect>, AccessError> {
    let entries = entries
        .into_iter()
        .map(|(key, value)| {
            let key = key
                .take::<M::Key>()
                .map_err(|key| AccessError::mismatch::<M::Key>(&*key))?;
            let value = value
                .take::<M::Value>()
                .map_err(|value| AccessError::mismatch::<M::Value>(&*value))?;
            Ok((key, value))
        })
        .collect::<Result<Vec<_>, AccessError>>()?;
    Ok(Box::new(M::map_from_entries(entries)))
}

fn map_extend<M: MapOps>(target: &mut dyn Reflect, other: Box<dyn Reflect>) -> Result<(), AccessError> {
    let found = target.reflect_type_path();
    let other = other
        .take::<M>()
        .map_err(|other| AccessError::mismatch::<M>(&*other))?;
    let Some(map) = target.downcast_mut::<M>() else {
        return Err(AccessError::Mismatch {
            expected: M::type_info().type_path(),
            found,
        });
    };
    for (key, value) in other.map_into_entries() {
        map.map_insert(key, value);
    }
    Ok(())
}
