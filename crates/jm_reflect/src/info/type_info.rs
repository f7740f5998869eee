use core::any::TypeId;
use core::fmt;

use thiserror::Error;

use crate::Reflect;
use crate::info::{ClassInfo, DynamicInfo, EnumInfo, JsonInfo, ListInfo, MapInfo, OpaqueInfo};
use crate::info::{OptionInfo, PointerInfo, PrimitiveInfo, Type};

// -----------------------------------------------------------------------------
// ReflectKind

/// The tag of a [`TypeInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReflectKind {
    Primitive,
    Opaque,
    Enum,
    Option,
    Pointer,
    Dynamic,
    List,
    Map,
    Class,
    Json,
}

impl fmt::Display for ReflectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Primitive => "primitive",
            Self::Opaque => "opaque",
            Self::Enum => "enum",
            Self::Option => "option",
            Self::Pointer => "pointer",
            Self::Dynamic => "dynamic",
            Self::List => "list",
            Self::Map => "map",
            Self::Class => "class",
            Self::Json => "json",
        };
        f.write_str(name)
    }
}

/// Returned by the `as_*` casts of [`TypeInfo`] on a kind mismatch.
#[derive(Debug, Error)]
#[error("kind mismatch: expected {expected}, received {received}")]
pub struct ReflectKindError {
    pub expected: ReflectKind,
    pub received: ReflectKind,
}

// -----------------------------------------------------------------------------
// TypeInfo

/// Static description of a reflected type.
///
/// The variants are the only shapes the mapper distinguishes. A value's
/// `TypeInfo` is built once and then dispatched on directly.
#[derive(Debug)]
pub enum TypeInfo {
    Primitive(PrimitiveInfo),
    Opaque(OpaqueInfo),
    Enum(EnumInfo),
    Option(OptionInfo),
    Pointer(PointerInfo),
    Dynamic(DynamicInfo),
    List(ListInfo),
    Map(MapInfo),
    Class(ClassInfo),
    Json(JsonInfo),
}

macro_rules! impl_cast_fn {
    ($name:ident : $kind:ident => $info:ident) => {
        #[doc = concat!("Casts to [`", stringify!($info), "`].")]
        #[inline]
        pub fn $name(&self) -> Result<&$info, ReflectKindError> {
            match self {
                Self::$kind(info) => Ok(info),
                _ => Err(ReflectKindError {
                    expected: ReflectKind::$kind,
                    received: self.kind(),
                }),
            }
        }
    };
}

impl TypeInfo {
    pub fn ty(&self) -> &Type {
        match self {
            Self::Primitive(info) => info.ty(),
            Self::Opaque(info) => info.ty(),
            Self::Enum(info) => info.ty(),
            Self::Option(info) => info.ty(),
            Self::Pointer(info) => info.ty(),
            Self::Dynamic(info) => info.ty(),
            Self::List(info) => info.ty(),
            Self::Map(info) => info.ty(),
            Self::Class(info) => info.ty(),
            Self::Json(info) => info.ty(),
        }
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.ty().id()
    }

    #[inline]
    pub fn type_path(&self) -> &'static str {
        self.ty().path()
    }

    #[inline]
    pub fn is<T: core::any::Any>(&self) -> bool {
        self.ty().is::<T>()
    }

    pub fn kind(&self) -> ReflectKind {
        match self {
            Self::Primitive(_) => ReflectKind::Primitive,
            Self::Opaque(_) => ReflectKind::Opaque,
            Self::Enum(_) => ReflectKind::Enum,
            Self::Option(_) => ReflectKind::Option,
            Self::Pointer(_) => ReflectKind::Pointer,
            Self::Dynamic(_) => ReflectKind::Dynamic,
            Self::List(_) => ReflectKind::List,
            Self::Map(_) => ReflectKind::Map,
            Self::Class(_) => ReflectKind::Class,
            Self::Json(_) => ReflectKind::Json,
        }
    }

    /// A fresh default value, if the type has one.
    ///
    /// Classes use their no-argument constructor; enums and most opaque
    /// types have none.
    pub fn default_value(&self) -> Option<Box<dyn Reflect>> {
        match self {
            Self::Primitive(info) => Some(info.default_value()),
            Self::Opaque(info) => info.default_value(),
            Self::Enum(_) | Self::Dynamic(_) => None,
            Self::Option(info) => info.wrap(None).ok(),
            Self::Pointer(info) => {
                let inner = info.inner_info().default_value()?;
                info.wrap(inner).ok()
            }
            Self::List(info) => info.default_value(),
            Self::Map(info) => Some(info.default_value()),
            Self::Class(info) => info.instantiate_default(),
            Self::Json(_) => Some(Box::new(serde_json::Value::Null)),
        }
    }

    /// Renders an opaque value with its format function.
    pub fn display(&self, value: &dyn Reflect) -> Option<String> {
        match self {
            Self::Opaque(info) => info.display(value),
            _ => None,
        }
    }

    impl_cast_fn!(as_primitive: Primitive => PrimitiveInfo);
    impl_cast_fn!(as_opaque: Opaque => OpaqueInfo);
    impl_cast_fn!(as_enum: Enum => EnumInfo);
    impl_cast_fn!(as_option: Option => OptionInfo);
    impl_cast_fn!(as_list: List => ListInfo);
    impl_cast_fn!(as_map: Map => MapInfo);
    impl_cast_fn!(as_class: Class => ClassInfo);
}

#[cfg(test)]
mod tests {
    use super::{ReflectKind, TypeInfo};
    use crate::info::Typed;

    #[test]
    fn casts_report_kind_mismatch() {
        let info = <Vec<u8> as Typed>::type_info();
        assert_eq!(info.kind(), ReflectKind::List);
        assert!(info.as_list().is_ok());

        let err = info.as_class().unwrap_err();
        assert_eq!(err.expected, ReflectKind::Class);
        assert_eq!(err.received, ReflectKind::List);
    }

    #[test]
    fn default_values_follow_the_shape() {
        let value = <Option<String> as Typed>::type_info().default_value().unwrap();
        assert_eq!(value.take::<Option<String>>().ok(), Some(None));

        let value = <Vec<u32> as Typed>::type_info().default_value().unwrap();
        assert_eq!(value.take::<Vec<u32>>().ok(), Some(vec![]));

        assert!(matches!(<i64 as Typed>::type_info(), TypeInfo::Primitive(_)));
        assert!(<[u8; 4] as Typed>::type_info().default_value().is_none());
    }
}
