//! The graph writer.
//!
//! [`ValueSer`] walks a value through its type info and drives any `serde`
//! serializer; the mapper pairs it with `serde_json`. Errors raised by
//! adapters or member access are stashed in the [`WriteContext`] so the
//! caller gets the original [`MapperError`] back instead of a flattened
//! `serde` message.

use core::cell::RefCell;
use core::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use bigdecimal::BigDecimal;
use jm_reflect::info::{ListInfo, MapInfo, PrimitiveKind, TypeInfo, Typed};
use jm_reflect::{AccessError, Reflect};
use num_bigint::BigInt;
use serde_core::ser::{self, SerializeMap, SerializeSeq};
use serde_core::{Serialize, Serializer};
use serde_json::{Number, Value};

use crate::adapter::MemberConverter;
use crate::mapping::ClassMapping;
use crate::{BinaryStrategy, Mapper, MapperError};

// -----------------------------------------------------------------------------
// WriteContext

/// State shared by every serializer of one document.
pub(crate) struct WriteContext<'a> {
    mapper: &'a Mapper,
    error: RefCell<Option<MapperError>>,
}

impl<'a> WriteContext<'a> {
    #[inline]
    pub fn new(mapper: &'a Mapper) -> Self {
        Self {
            mapper,
            error: RefCell::new(None),
        }
    }

    /// Keeps the first failure and hands `serde` a message for it.
    fn fail<E: ser::Error>(&self, err: MapperError) -> E {
        let message = err.to_string();
        let mut slot = self.error.borrow_mut();
        if slot.is_none() {
            *slot = Some(err);
        }
        E::custom(message)
    }

    /// Resolves the outcome of a write, preferring the stashed failure.
    pub fn finish<T>(self, result: Result<T, serde_json::Error>) -> Result<T, MapperError> {
        match result {
            Ok(value) => Ok(value),
            Err(err) => Err(self.error.into_inner().unwrap_or(MapperError::Json(err))),
        }
    }
}

fn mismatch(expected: &'static TypeInfo, found: &dyn Reflect) -> MapperError {
    MapperError::from(AccessError::Mismatch {
        expected: expected.type_path(),
        found: found.reflect_type_path(),
    })
}

/// `true` for `None`, JSON `null` and empty slots holding either.
pub(crate) fn is_null(value: &dyn Reflect) -> bool {
    match value.reflect_type_info() {
        TypeInfo::Option(option) => option.get(value).is_none(),
        TypeInfo::Pointer(pointer) => pointer.deref(value).is_some_and(is_null),
        TypeInfo::Dynamic(dynamic) => dynamic.deref(value).is_some_and(is_null),
        TypeInfo::Json(_) => value.downcast_ref::<Value>().is_some_and(Value::is_null),
        _ => false,
    }
}

fn is_empty_list(value: &dyn Reflect) -> bool {
    match value.reflect_type_info() {
        TypeInfo::List(list) => list.len(value) == 0,
        TypeInfo::Option(option) => option.get(value).is_some_and(is_empty_list),
        TypeInfo::Pointer(pointer) => pointer.deref(value).is_some_and(is_empty_list),
        TypeInfo::Json(_) => value
            .downcast_ref::<Value>()
            .and_then(Value::as_array)
            .is_some_and(Vec::is_empty),
        _ => false,
    }
}

// -----------------------------------------------------------------------------
// ValueSer

/// Serializes one reflected value.
///
/// Resolution order:
///
/// 1. the converter pinned on the property, when it handles the value;
/// 2. a registered object converter;
/// 3. the shape of the value: primitives and JSON values directly,
///    scalars through their text adapter, containers item by item and
///    classes through their [`ClassMapping`].
pub(crate) struct ValueSer<'a> {
    ctx: &'a WriteContext<'a>,
    value: &'a dyn Reflect,
    converter: Option<&'a MemberConverter>,
}

impl<'a> ValueSer<'a> {
    #[inline]
    pub fn new(ctx: &'a WriteContext<'a>, value: &'a dyn Reflect) -> Self {
        Self {
            ctx,
            value,
            converter: None,
        }
    }

    /// The same converter applies to nested items.
    #[inline]
    fn nested(&self, value: &'a dyn Reflect) -> Self {
        Self {
            ctx: self.ctx,
            value,
            converter: self.converter,
        }
    }

    fn primitive<S: Serializer>(&self, kind: PrimitiveKind, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.value;
        macro_rules! emit {
            ($ty:ty, $method:ident) => {
                emit!($ty, $method, |v: $ty| v)
            };
            ($ty:ty, $method:ident, $cast:expr) => {
                match value.downcast_ref::<$ty>() {
                    Some(v) => serializer.$method($cast(*v)),
                    None => Err(self.ctx.fail(mismatch(<$ty>::type_info(), value))),
                }
            };
        }

        match kind {
            PrimitiveKind::Bool => emit!(bool, serialize_bool),
            PrimitiveKind::Char => emit!(char, serialize_char),
            PrimitiveKind::I8 => emit!(i8, serialize_i8),
            PrimitiveKind::I16 => emit!(i16, serialize_i16),
            PrimitiveKind::I32 => emit!(i32, serialize_i32),
            PrimitiveKind::I64 => emit!(i64, serialize_i64),
            PrimitiveKind::I128 => emit!(i128, serialize_i128),
            PrimitiveKind::Isize => emit!(isize, serialize_i64, |v: isize| v as i64),
            PrimitiveKind::U8 => emit!(u8, serialize_u8),
            PrimitiveKind::U16 => emit!(u16, serialize_u16),
            PrimitiveKind::U32 => emit!(u32, serialize_u32),
            PrimitiveKind::U64 => emit!(u64, serialize_u64),
            PrimitiveKind::U128 => emit!(u128, serialize_u128),
            PrimitiveKind::Usize => emit!(usize, serialize_u64, |v: usize| v as u64),
            PrimitiveKind::F32 => emit!(f32, serialize_f32),
            PrimitiveKind::F64 => emit!(f64, serialize_f64),
            PrimitiveKind::String => match value.downcast_ref::<String>() {
                Some(text) => serializer.serialize_str(text),
                None => Err(self.ctx.fail(mismatch(String::type_info(), value))),
            },
        }
    }

    /// Opaque values and enums: big numbers as JSON numbers, everything
    /// else as the text of its adapter.
    fn scalar<S: Serializer>(&self, info: &'static TypeInfo, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.value;
        let number = value
            .downcast_ref::<BigDecimal>()
            .map(ToString::to_string)
            .or_else(|| value.downcast_ref::<BigInt>().map(ToString::to_string));
        if let Some(text) = number {
            return match Number::from_str(&text) {
                Ok(number) => number.serialize(serializer),
                Err(_) => serializer.serialize_str(&text),
            };
        }
        let adapter = self.ctx.mapper.registry().find_or_fallback(info);
        let text = adapter.to_text(value).map_err(|err| self.ctx.fail(err))?;
        serializer.serialize_str(&text)
    }

    fn list<S: Serializer>(&self, list: &ListInfo, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.value;
        if list.is_bytes() {
            let engine = match self.ctx.mapper.config().binary_strategy() {
                BinaryStrategy::Array => None,
                BinaryStrategy::Base64 => Some(&STANDARD),
                BinaryStrategy::Base64Url => Some(&URL_SAFE),
            };
            if let Some(engine) = engine {
                let bytes: Vec<u8> = list
                    .iter(value)
                    .filter_map(|byte| byte.downcast_ref::<u8>().copied())
                    .collect();
                return serializer.serialize_str(&engine.encode(bytes));
            }
        }

        let mut seq = serializer.serialize_seq(Some(list.len(value)))?;
        for item in list.iter(value) {
            seq.serialize_element(&self.nested(item))?;
        }
        seq.end()
    }

    fn map<S: Serializer>(&self, map: &MapInfo, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.value;
        let mut state = serializer.serialize_map(Some(map.len(value)))?;
        for (key, item) in map.iter(value) {
            let key = key_text(self.ctx, key, self.converter).map_err(|err| self.ctx.fail(err))?;
            state.serialize_entry(&key, &self.nested(item))?;
        }
        state.end()
    }
}

/// The member name written for a map key.
fn key_text(ctx: &WriteContext<'_>, key: &dyn Reflect, converter: Option<&MemberConverter>) -> Result<String, MapperError> {
    let info = key.reflect_type_info();
    match info {
        TypeInfo::Primitive(_) => match serde_json::to_value(ValueSer::new(ctx, key))? {
            Value::String(text) => Ok(text),
            other => Ok(other.to_string()),
        },
        _ => match converter {
            Some(MemberConverter::Text(adapter)) if adapter.type_info().type_id() == info.type_id() => {
                adapter.to_text(key)
            }
            _ => ctx.mapper.registry().find_or_fallback(info).to_text(key),
        },
    }
}

impl Serialize for ValueSer<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let ctx = self.ctx;
        let value = self.value;
        let info = value.reflect_type_info();

        if let Some(converter) = self.converter
            && converter.applies_to(info)
        {
            return match converter {
                MemberConverter::Text(adapter) => {
                    let text = adapter.to_text(value).map_err(|err| ctx.fail(err))?;
                    serializer.serialize_str(&text)
                }
                MemberConverter::Object(adapter) => {
                    let json = adapter.to_value(value, ctx.mapper).map_err(|err| ctx.fail(err))?;
                    json.serialize(serializer)
                }
            };
        }
        if let Some(adapter) = ctx.mapper.registry().find_object(info.type_id()) {
            let json = adapter.to_value(value, ctx.mapper).map_err(|err| ctx.fail(err))?;
            return json.serialize(serializer);
        }

        match info {
            TypeInfo::Primitive(primitive) => self.primitive(primitive.kind(), serializer),
            TypeInfo::Opaque(_) | TypeInfo::Enum(_) => self.scalar(info, serializer),
            TypeInfo::Option(option) => match option.get(value) {
                Some(inner) => serializer.serialize_some(&self.nested(inner)),
                None => serializer.serialize_none(),
            },
            TypeInfo::Pointer(pointer) => match pointer.deref(value) {
                Some(inner) => self.nested(inner).serialize(serializer),
                None => Err(ctx.fail(mismatch(info, value))),
            },
            TypeInfo::Dynamic(dynamic) => match dynamic.deref(value) {
                Some(inner) => self.nested(inner).serialize(serializer),
                None => Err(ctx.fail(mismatch(info, value))),
            },
            TypeInfo::Json(_) => match value.downcast_ref::<Value>() {
                Some(json) => json.serialize(serializer),
                None => Err(ctx.fail(mismatch(info, value))),
            },
            TypeInfo::List(list) => self.list(list, serializer),
            TypeInfo::Map(map) => self.map(map, serializer),
            TypeInfo::Class(_) => {
                if let Some(adapter) = ctx.mapper.registry().find(info) {
                    let text = adapter.to_text(value).map_err(|err| ctx.fail(err))?;
                    return serializer.serialize_str(&text);
                }
                let mapping = ctx.mapper.mapping(info).map_err(|err| ctx.fail(err))?;
                ClassSer {
                    ctx,
                    value,
                    mapping: &mapping,
                }
                .serialize(serializer)
            }
        }
    }
}

// -----------------------------------------------------------------------------
// ClassSer

/// Writes the properties of a class as a JSON object.
struct ClassSer<'a> {
    ctx: &'a WriteContext<'a>,
    value: &'a dyn Reflect,
    mapping: &'a ClassMapping,
}

impl Serialize for ClassSer<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let ctx = self.ctx;
        let config = ctx.mapper.config();
        let mut state = serializer.serialize_map(None)?;

        for property in self.mapping.readers() {
            if !config.includes_version(property.since()) {
                continue;
            }
            let read = property.reader().read(self.value).map_err(|err| ctx.fail(err))?;
            let item = read.as_reflect();
            if is_null(item) {
                if !config.skip_null() {
                    state.serialize_entry(property.name(), &Value::Null)?;
                }
                continue;
            }
            if config.skip_empty_array() && is_empty_list(item) {
                continue;
            }
            let item = ValueSer {
                ctx,
                value: item,
                converter: property.converter(),
            };
            state.serialize_entry(property.name(), &item)?;
        }

        if let Some(any) = self.mapping.any_getter()
            && let Some(extra) = any.get(self.value)
            && let TypeInfo::Map(map) = any.map_info()
        {
            for (key, item) in map.iter(extra) {
                if config.skip_null() && is_null(item) {
                    continue;
                }
                let key = key_text(ctx, key, None).map_err(|err| ctx.fail(err))?;
                state.serialize_entry(&key, &ValueSer::new(ctx, item))?;
            }
        }
        state.end()
    }
}

// -----------------------------------------------------------------------------
// Roots

/// A document root. A null root is written as an empty object.
pub(crate) struct RootSer<'a>(pub ValueSer<'a>);

impl Serialize for RootSer<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if is_null(self.0.value) {
            return serializer.serialize_map(Some(0))?.end();
        }
        self.0.serialize(serializer)
    }
}

/// A slice of values written as a JSON array.
pub(crate) struct SliceSer<'a, T> {
    ctx: &'a WriteContext<'a>,
    items: &'a [T],
}

impl<'a, T> SliceSer<'a, T> {
    #[inline]
    pub fn new(ctx: &'a WriteContext<'a>, items: &'a [T]) -> Self {
        Self { ctx, items }
    }
}

impl<T: Typed> Serialize for SliceSer<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.iter().map(|item| ValueSer::new(self.ctx, item)))
    }
}

/// Values pulled from an iterator while the array is written.
pub(crate) struct IterSer<'a, I> {
    ctx: &'a WriteContext<'a>,
    items: RefCell<Option<I>>,
}

impl<'a, I> IterSer<'a, I> {
    #[inline]
    pub fn new(ctx: &'a WriteContext<'a>, items: I) -> Self {
        Self {
            ctx,
            items: RefCell::new(Some(items)),
        }
    }
}

struct OwnedSer<'a, T> {
    ctx: &'a WriteContext<'a>,
    value: T,
}

impl<T: Typed> Serialize for OwnedSer<'_, T> {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ValueSer::new(self.ctx, &self.value).serialize(serializer)
    }
}

impl<I> Serialize for IterSer<'_, I>
where
    I: Iterator,
    I::Item: Typed,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Some(items) = self.items.borrow_mut().take() else {
            return Err(ser::Error::custom("the iterator was already written"));
        };
        serializer.collect_seq(items.map(|value| OwnedSer { ctx: self.ctx, value }))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use bigdecimal::BigDecimal;
    use indexmap::IndexMap;
    use jm_reflect::Reflect;
    use jm_reflect::derive::Reflect;
    use jm_reflect::impls::NonGenericTypeInfoCell;
    use jm_reflect::info::{ClassInfo, MethodInfo, TypeInfo, Typed};
    use serde_json::json;

    use super::{ValueSer, WriteContext, is_null};
    use crate::{BinaryStrategy, ErrorKind, MapperBuilder};

    #[derive(Reflect, Default)]
    #[reflect(default)]
    struct Profile {
        name: String,
        nickname: Option<String>,
        tags: Vec<String>,
        #[reflect(since = 2)]
        score: u32,
    }

    #[derive(Reflect, Default)]
    #[reflect(default)]
    struct Blob {
        data: Vec<u8>,
    }

    struct Broken;

    impl Typed for Broken {
        fn type_info() -> &'static TypeInfo {
            static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
            CELL.get_or_init(|| {
                TypeInfo::Class(
                    ClassInfo::builder::<Broken>()
                        .with_method(MethodInfo::try_getter("getValue", |_: &Broken| {
                            "x".parse::<u8>()
                        }))
                        .build(),
                )
            })
        }
    }

    fn profile() -> Profile {
        Profile {
            name: "ann".into(),
            nickname: None,
            tags: Vec::new(),
            score: 7,
        }
    }

    #[test]
    fn nulls_and_empty_arrays_follow_the_config() {
        let mapper = MapperBuilder::new().build();
        let json = mapper.to_value(&profile()).unwrap();
        assert_eq!(json, json!({ "name": "ann", "tags": [], "score": 7 }));

        let mapper = MapperBuilder::new().skip_null(false).skip_empty_array(true).build();
        let json = mapper.to_value(&profile()).unwrap();
        assert_eq!(json, json!({ "name": "ann", "nickname": null, "score": 7 }));
    }

    #[test]
    fn newer_properties_are_gated_by_version() {
        let mapper = MapperBuilder::new().version(1).build();
        let json = mapper.to_value(&profile()).unwrap();
        assert!(json.get("score").is_none());

        let mapper = MapperBuilder::new().version(2).build();
        assert_eq!(mapper.to_value(&profile()).unwrap()["score"], 7);
    }

    #[test]
    fn map_order_is_kept() {
        let mapper = MapperBuilder::new().build();
        let mut ordered = IndexMap::new();
        ordered.insert("z".to_owned(), 1_u8);
        ordered.insert("a".to_owned(), 2_u8);
        assert_eq!(mapper.write_to_string(&ordered).unwrap(), r#"{"z":1,"a":2}"#);

        let sorted: BTreeMap<u16, bool> = [(10, true), (2, false)].into_iter().collect();
        assert_eq!(mapper.write_to_string(&sorted).unwrap(), r#"{"2":false,"10":true}"#);

        let single: HashMap<char, i8> = [('k', -1)].into_iter().collect();
        assert_eq!(mapper.write_to_string(&single).unwrap(), r#"{"k":-1}"#);
    }

    #[test]
    fn bytes_follow_the_binary_strategy() {
        let blob = Blob { data: vec![0xfb, 0xff] };
        let base64 = MapperBuilder::new().build();
        assert_eq!(base64.write_to_string(&blob).unwrap(), r#"{"data":"+/8="}"#);

        let url = MapperBuilder::new().binary_strategy(BinaryStrategy::Base64Url).build();
        assert_eq!(url.write_to_string(&blob).unwrap(), r#"{"data":"-_8="}"#);

        let array = MapperBuilder::new().binary_strategy(BinaryStrategy::Array).build();
        assert_eq!(array.write_to_string(&blob).unwrap(), r#"{"data":[251,255]}"#);
    }

    #[test]
    fn big_numbers_stay_numbers() {
        let mapper = MapperBuilder::new().build();
        let amount: BigDecimal = "12345678901234567890.50".parse().unwrap();
        assert_eq!(mapper.write_to_string(&amount).unwrap(), "12345678901234567890.50");
        assert_eq!(mapper.write_to_string(&u128::MAX).unwrap(), u128::MAX.to_string());
    }

    #[test]
    fn failures_keep_their_kind() {
        let mapper = MapperBuilder::new().build();
        let err = mapper.write_to_string(&Broken).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invocation);
        assert!(err.to_string().contains("getValue"));
    }

    #[test]
    fn null_roots_are_empty_objects() {
        let mapper = MapperBuilder::new().build();
        assert_eq!(mapper.write_to_string(&None::<Profile>).unwrap(), "{}");

        let ctx = WriteContext::new(&mapper);
        let slot: Box<dyn Reflect> = Box::new(None::<u8>);
        assert!(is_null(&slot));
        let json = serde_json::to_value(ValueSer::new(&ctx, &slot));
        assert_eq!(ctx.finish(json).unwrap(), serde_json::Value::Null);
    }
}
