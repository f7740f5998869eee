use crate::impls::NonGenericTypeInfoCell;
use crate::info::{PrimitiveInfo, PrimitiveKind, TypeInfo, Typed};

macro_rules! impl_primitive {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Typed for $ty {
                fn type_info() -> &'static TypeInfo {
                    static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
                    CELL.get_or_init(|| {
                        TypeInfo::Primitive(PrimitiveInfo::new::<$ty>(PrimitiveKind::$kind))
                    })
                }
            }
        )*
    };
}

impl_primitive! {
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    String => String,
}

#[cfg(test)]
mod tests {
    use crate::info::{PrimitiveKind, Typed};

    #[test]
    fn primitive_kinds() {
        let kind = |info: &crate::info::TypeInfo| info.as_primitive().unwrap().kind();
        assert_eq!(kind(u8::type_info()), PrimitiveKind::U8);
        assert_eq!(kind(String::type_info()), PrimitiveKind::String);
        assert!(kind(f32::type_info()).is_float());
        assert!(kind(i128::type_info()).is_integer());
        assert!(!kind(char::type_info()).is_number());
    }
}
