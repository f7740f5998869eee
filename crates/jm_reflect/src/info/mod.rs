//! Static descriptions of reflected types.
//!
//! - [`Typed`]: the entry point, `T::type_info()`.
//! - [`TypeInfo`]: a closed enum over every supported shape.
//! - [`ClassInfo`]: fields, methods, constructors and class attributes.

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod class_info;
mod enum_info;
mod list_info;
mod map_info;
mod member;
mod primitive_info;
mod scalar_info;
mod ty;
mod type_info;
mod typed;
mod wrapper_info;

// -----------------------------------------------------------------------------
// Exports

pub(crate) use attributes::impl_custom_attributes_fn;

pub use attributes::CustomAttributes;
pub use class_info::{ClassInfo, ClassInfoBuilder, ErrorInfo, Members};
pub use enum_info::{EnumInfo, VariantInfo};
pub use list_info::{ListInfo, ListKind};
pub use map_info::{MapInfo, MapKind};
pub use member::{AnyGetterInfo, AnySetterInfo, Args, ConstructorInfo, FieldInfo, ParamInfo};
pub use member::{MethodCall, MethodInfo, ParentInfo};
pub use member::{MutAccess, RefAccess, ValueGetter, ValueSetter, mut_access, ref_access};
pub use primitive_info::{PrimitiveInfo, PrimitiveKind};
pub use scalar_info::{JsonInfo, OpaqueInfo};
pub use ty::Type;
pub use type_info::{ReflectKind, ReflectKindError, TypeInfo};
pub use typed::Typed;
pub use wrapper_info::{DynamicInfo, OptionInfo, PointerInfo};
