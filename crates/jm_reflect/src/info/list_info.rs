use crate::info::{Type, TypeInfo, Typed};
use crate::ops::ListOps;
use crate::{AccessError, Reflect};

/// Which container a list target stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    /// A resizable list (`Vec`).
    List,
    /// A queue sized on construction (`VecDeque`).
    Queue,
    /// A hash-based set.
    Set,
    /// An ordered set.
    SortedSet,
    /// A fixed-size array with the given length.
    Array(usize),
}

type IterFn = for<'a> fn(&'a dyn Reflect) -> Box<dyn Iterator<Item = &'a dyn Reflect> + 'a>;

/// Type info for sequence containers.
#[derive(Debug, Clone)]
pub struct ListInfo {
    ty: Type,
    kind: ListKind,
    item_ty: Type,
    item_info: fn() -> &'static TypeInfo,
    len: fn(&dyn Reflect) -> usize,
    iter: IterFn,
    from_items: fn(Vec<Box<dyn Reflect>>) -> Result<Box<dyn Reflect>, AccessError>,
    extend: fn(&mut dyn Reflect, Box<dyn Reflect>) -> Result<(), AccessError>,
    default: fn() -> Option<Box<dyn Reflect>>,
}

impl ListInfo {
    pub fn new<L: ListOps>() -> Self {
        Self {
            ty: Type::of::<L>(),
            kind: L::KIND,
            item_ty: Type::of::<L::Item>(),
            item_info: <L::Item as Typed>::type_info,
            len: |value| value.downcast_ref::<L>().map_or(0, L::list_len),
            iter: list_iter::<L>,
            from_items: list_from_items::<L>,
            extend: list_extend::<L>,
            default: || L::list_default().map(|list| Box::new(list) as Box<dyn Reflect>),
        }
    }

    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub const fn kind(&self) -> ListKind {
        self.kind
    }

    #[inline]
    pub const fn item_ty(&self) -> &Type {
        &self.item_ty
    }

    #[inline]
    pub fn item_info(&self) -> &'static TypeInfo {
        (self.item_info)()
    }

    /// `true` for `Vec<u8>`, `[u8; N]` and friends: candidates for the
    /// binary strategy.
    #[inline]
    pub fn is_bytes(&self) -> bool {
        self.item_ty.is::<u8>() && matches!(self.kind, ListKind::List | ListKind::Array(_))
    }

    #[inline]
    pub fn len(&self, value: &dyn Reflect) -> usize {
        (self.len)(value)
    }

    #[inline]
    pub fn iter<'a>(&self, value: &'a dyn Reflect) -> Box<dyn Iterator<Item = &'a dyn Reflect> + 'a> {
        (self.iter)(value)
    }

    /// Builds the container from converted items.
    #[inline]
    pub fn from_items(&self, items: Vec<Box<dyn Reflect>>) -> Result<Box<dyn Reflect>, AccessError> {
        (self.from_items)(items)
    }

    /// Appends the items of `other`, a value of the same container type.
    #[inline]
    pub fn extend(&self, target: &mut dyn Reflect, other: Box<dyn Reflect>) -> Result<(), AccessError> {
        (self.extend)(target, other)
    }

    #[inline]
    pub fn default_value(&self) -> Option<Box<dyn Reflect>> {
        (self.default)()
    }
}

fn list_iter<L: ListOps>(value: &dyn Reflect) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
    match value.downcast_ref::<L>() {
        Some(list) => list.list_iter(),
        None => Box::new(core::iter::empty()),
    }
}

fn list_from_items<L: ListOps>(items: Vec<Box<dyn Reflect>>) -> Result<Box<dyn Reflect>, AccessError> {
    let items = items
        .into_iter()
        .map(|item| {
            item.take::<L::Item>()
                .map_err(|item| AccessError::mismatch::<L::Item>(&*item))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Box::new(L::list_from_items(items)?))
}

fn list_extend<L: ListOps>(target: &mut dyn Reflect, other: Box<dyn Reflect>) -> Result<(), AccessError> {
    let found = target.reflect_type_path();
    let other = other
        .take::<L>()
        .map_err(|other| AccessError::mismatch::<L>(&*other))?;
    match target.downcast_mut::<L>() {
        Some(list) => list.list_extend(other),
        None => Err(AccessError::Mismatch {
            expected: L::type_info().type_path(),
            found,
        }),
    }
}
