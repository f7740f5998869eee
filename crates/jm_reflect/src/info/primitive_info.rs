use crate::Reflect;
use crate::info::{Type, Typed};

/// The primitive shapes written as JSON scalars without an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
    String,
}

impl PrimitiveKind {
    #[inline]
    pub const fn is_integer(self) -> bool {
        !matches!(self, Self::Bool | Self::Char | Self::F32 | Self::F64 | Self::String)
    }

    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    #[inline]
    pub const fn is_number(self) -> bool {
        self.is_integer() || self.is_float()
    }
}

/// Type info for primitives and `String`.
#[derive(Debug, Clone)]
pub struct PrimitiveInfo {
    ty: Type,
    kind: PrimitiveKind,
    default: fn() -> Box<dyn Reflect>,
}

impl PrimitiveInfo {
    pub fn new<T: Typed + Default>(kind: PrimitiveKind) -> Self {
        Self {
            ty: Type::of::<T>(),
            kind,
            default: || Box::new(T::default()),
        }
    }

    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub const fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    #[inline]
    pub fn default_value(&self) -> Box<dyn Reflect> {
        (self.default)()
    }
}
