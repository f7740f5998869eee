use crate::Reflect;
use crate::impls::{GenericTypeInfoCell, NonGenericTypeInfoCell};
use crate::info::{DynamicInfo, JsonInfo, OptionInfo, PointerInfo, TypeInfo, Typed};

impl<T: Typed> Typed for Option<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| TypeInfo::Option(OptionInfo::new::<T>()))
    }
}

impl<T: Typed> Typed for Box<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| TypeInfo::Pointer(PointerInfo::new::<T>()))
    }
}

impl Typed for Box<dyn Reflect> {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Dynamic(DynamicInfo::new()))
    }
}

impl Typed for serde_json::Value {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Json(JsonInfo::new::<serde_json::Value>()))
    }
}

#[cfg(test)]
mod tests {
    use crate::Reflect;
    use crate::info::{ReflectKind, Typed};

    #[test]
    fn option_wraps_and_unwraps() {
        let info = <Option<u32>>::type_info().as_option().unwrap();
        assert!(info.some_info().is::<u32>());

        let value = Some(3_u32);
        let inner = info.get(&value).unwrap();
        assert_eq!(inner.downcast_ref::<u32>(), Some(&3));
        assert!(info.get(&None::<u32>).is_none());

        let rebuilt = info.wrap(Some(Box::new(9_u32))).unwrap();
        assert_eq!(rebuilt.take::<Option<u32>>().ok(), Some(Some(9)));
        assert!(info.wrap(Some(Box::new("x".to_string()))).is_err());
    }

    #[test]
    fn dynamic_slot_holds_any_value() {
        let slot: Box<dyn Reflect> = Box::new(String::from("hi"));
        assert_eq!(<Box<dyn Reflect>>::type_info().kind(), ReflectKind::Dynamic);
        // The box describes the slot, its content describes itself.
        assert_eq!((*slot).reflect_type_info().kind(), ReflectKind::Primitive);
    }
}
