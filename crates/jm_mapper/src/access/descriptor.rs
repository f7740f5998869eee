use core::fmt;

use jm_reflect::info::{CustomAttributes, FieldInfo, MethodCall, MethodInfo, TypeInfo, ValueGetter};
use jm_reflect::{AccessError, Reflect};

use crate::MapperError;

static NO_ATTRIBUTES: CustomAttributes = CustomAttributes::new();

// -----------------------------------------------------------------------------
// ReadValue

/// A property value: borrowed from the owner or computed by a getter.
pub enum ReadValue<'a> {
    Borrowed(&'a dyn Reflect),
    Owned(Box<dyn Reflect>),
}

impl ReadValue<'_> {
    #[inline]
    pub fn as_reflect(&self) -> &dyn Reflect {
        match self {
            Self::Borrowed(value) => *value,
            Self::Owned(value) => &**value,
        }
    }
}

fn owner_mismatch(expected: &'static str, owner: &dyn Reflect) -> AccessError {
    AccessError::Mismatch {
        expected,
        found: owner.reflect_type_path(),
    }
}

// -----------------------------------------------------------------------------
// ReadMember

/// The member a reader goes through.
#[derive(Clone)]
pub enum ReadMember {
    Field(FieldInfo),
    Method(MethodInfo),
    /// A value computed outside the class members, used by the sealed-type
    /// mapping.
    Computed {
        info: fn() -> &'static TypeInfo,
        get: ValueGetter,
    },
}

impl ReadMember {
    /// Declared type of the value.
    pub fn value_info(&self) -> &'static TypeInfo {
        match self {
            Self::Field(field) => field.type_info(),
            Self::Method(method) => method.value_info(),
            Self::Computed { info, .. } => info(),
        }
    }

    pub fn custom_attributes(&self) -> &CustomAttributes {
        match self {
            Self::Field(field) => field.custom_attributes(),
            Self::Method(method) => method.custom_attributes(),
            Self::Computed { .. } => &NO_ATTRIBUTES,
        }
    }

    /// Name of the underlying member.
    pub fn member_name(&self) -> &'static str {
        match self {
            Self::Field(field) => field.name(),
            Self::Method(method) => method.name(),
            Self::Computed { .. } => "<computed>",
        }
    }

    pub fn read<'a>(&self, owner: &'a dyn Reflect) -> Result<ReadValue<'a>, MapperError> {
        let read = match self {
            Self::Field(field) => field
                .get(owner)
                .map(ReadValue::Borrowed)
                .ok_or_else(|| owner_mismatch(field.owner().path(), owner)),
            Self::Method(method) => match method.call() {
                MethodCall::Get(get) => get(owner).map(ReadValue::Owned),
                MethodCall::Borrow(get) => get(owner)
                    .map(ReadValue::Borrowed)
                    .ok_or_else(|| owner_mismatch(method.owner().path(), owner)),
                MethodCall::BorrowMut(_) | MethodCall::Set(_) => {
                    Err(AccessError::Unsupported("reading through a method that is not a getter"))
                }
            },
            Self::Computed { get, .. } => get(owner).map(ReadValue::Owned),
        };
        read.map_err(|err| MapperError::access(format_args!("reading `{}`", self.member_name()), err))
    }
}

impl fmt::Debug for ReadMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(field) => write!(f, "Field({})", field.name()),
            Self::Method(method) => write!(f, "Method({})", method.name()),
            Self::Computed { .. } => f.write_str("Computed"),
        }
    }
}

// -----------------------------------------------------------------------------
// WriteMember

/// The member a writer goes through.
#[derive(Clone)]
pub enum WriteMember {
    Field(FieldInfo),
    Setter(MethodInfo),
    /// A mutable collection accessor; the read value is merged into the
    /// existing collection.
    Merge(MethodInfo),
}

impl WriteMember {
    pub fn value_info(&self) -> &'static TypeInfo {
        match self {
            Self::Field(field) => field.type_info(),
            Self::Setter(method) | Self::Merge(method) => method.value_info(),
        }
    }

    pub fn custom_attributes(&self) -> &CustomAttributes {
        match self {
            Self::Field(field) => field.custom_attributes(),
            Self::Setter(method) | Self::Merge(method) => method.custom_attributes(),
        }
    }

    pub fn member_name(&self) -> &'static str {
        match self {
            Self::Field(field) => field.name(),
            Self::Setter(method) | Self::Merge(method) => method.name(),
        }
    }

    pub fn write(&self, owner: &mut dyn Reflect, value: Box<dyn Reflect>) -> Result<(), MapperError> {
        let written = match self {
            Self::Field(field) => field.set(owner, value),
            Self::Setter(method) => match method.call() {
                MethodCall::Set(set) => set(owner, value),
                _ => Err(AccessError::Unsupported("writing through a method that is not a setter")),
            },
            Self::Merge(method) => merge(method, owner, value),
        };
        written.map_err(|err| MapperError::access(format_args!("writing `{}`", self.member_name()), err))
    }
}

fn merge(method: &MethodInfo, owner: &mut dyn Reflect, value: Box<dyn Reflect>) -> Result<(), AccessError> {
    let MethodCall::BorrowMut(get_mut) = method.call() else {
        return Err(AccessError::Unsupported("merging needs a mutable accessor"));
    };
    let expected = method.owner().path();
    let found = owner.reflect_type_path();
    let target = get_mut(owner).ok_or(AccessError::Mismatch { expected, found })?;
    match method.value_info() {
        TypeInfo::List(list) => list.extend(target, value),
        TypeInfo::Map(map) => map.extend(target, value),
        _ => Err(AccessError::Unsupported("merging into a value that is not a collection")),
    }
}

impl fmt::Debug for WriteMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(field) => write!(f, "Field({})", field.name()),
            Self::Setter(method) => write!(f, "Setter({})", method.name()),
            Self::Merge(method) => write!(f, "Merge({})", method.name()),
        }
    }
}

// -----------------------------------------------------------------------------
// Reader / Writer

/// How a property is read: a primary member and, for merged strategies,
/// the secondary member whose converter is used when the primary has none.
#[derive(Debug, Clone)]
pub struct Reader {
    primary: ReadMember,
    fallback: Option<ReadMember>,
}

impl Reader {
    #[inline]
    pub fn new(primary: ReadMember) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    #[inline]
    pub fn with_fallback(mut self, fallback: ReadMember) -> Self {
        self.fallback = Some(fallback);
        self
    }

    #[inline]
    pub fn primary(&self) -> &ReadMember {
        &self.primary
    }

    #[inline]
    pub fn fallback(&self) -> Option<&ReadMember> {
        self.fallback.as_ref()
    }

    #[inline]
    pub fn read<'a>(&self, owner: &'a dyn Reflect) -> Result<ReadValue<'a>, MapperError> {
        self.primary.read(owner)
    }

    /// Attribute `A` from the primary member, else from the fallback.
    pub fn attribute<A: core::any::Any>(&self) -> Option<&A> {
        self.primary
            .custom_attributes()
            .get::<A>()
            .or_else(|| self.fallback.as_ref()?.custom_attributes().get::<A>())
    }
}

/// How a property is written. See [`Reader`].
#[derive(Debug, Clone)]
pub struct Writer {
    primary: WriteMember,
    fallback: Option<WriteMember>,
}

impl Writer {
    #[inline]
    pub fn new(primary: WriteMember) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    #[inline]
    pub fn with_fallback(mut self, fallback: WriteMember) -> Self {
        self.fallback = Some(fallback);
        self
    }

    #[inline]
    pub fn primary(&self) -> &WriteMember {
        &self.primary
    }

    #[inline]
    pub fn fallback(&self) -> Option<&WriteMember> {
        self.fallback.as_ref()
    }

    #[inline]
    pub fn write(&self, owner: &mut dyn Reflect, value: Box<dyn Reflect>) -> Result<(), MapperError> {
        self.primary.write(owner, value)
    }

    pub fn attribute<A: core::any::Any>(&self) -> Option<&A> {
        self.primary
            .custom_attributes()
            .get::<A>()
            .or_else(|| self.fallback.as_ref()?.custom_attributes().get::<A>())
    }
}

#[cfg(test)]
mod tests {
    use jm_reflect::Reflect;
    use jm_reflect::derive::Reflect;
    use jm_reflect::info::{MethodInfo, Typed};

    use super::{ReadMember, Reader, WriteMember, Writer};
    use crate::ErrorKind;

    #[derive(Reflect, Default)]
    struct Bag {
        items: Vec<u8>,
    }

    fn items_field() -> jm_reflect::info::FieldInfo {
        let class = Bag::type_info().as_class().unwrap();
        class.members().unwrap().fields()[0].clone()
    }

    #[test]
    fn field_reads_borrow_and_writes_replace() {
        let mut bag = Bag { items: vec![1] };
        let reader = Reader::new(ReadMember::Field(items_field()));
        let value = reader.read(&bag).unwrap();
        assert_eq!(value.as_reflect().downcast_ref::<Vec<u8>>(), Some(&vec![1]));

        let writer = Writer::new(WriteMember::Field(items_field()));
        writer.write(&mut bag, Box::new(vec![2_u8])).unwrap();
        assert_eq!(bag.items, [2]);

        let err = writer.write(&mut bag, Box::new(3_u8)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invocation);
    }

    #[test]
    fn merge_extends_the_existing_collection() {
        let mut bag = Bag { items: vec![1] };
        let method = MethodInfo::accessor_mut::<Bag, Vec<u8>>("getItems", |bag| &mut bag.items);
        let writer = Writer::new(WriteMember::Merge(method.clone()));
        writer.write(&mut bag, Box::new(vec![2_u8, 3])).unwrap();
        assert_eq!(bag.items, [1, 2, 3]);

        let err = ReadMember::Method(method).read(&bag as &dyn Reflect).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Invocation);
    }
}
