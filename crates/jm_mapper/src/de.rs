//! The graph reader.
//!
//! Documents are parsed into a [`serde_json::Value`] first and then
//! materialised against the type info of the target.

use core::str::FromStr;
use std::error::Error;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use indexmap::IndexMap;
use jm_reflect::Reflect;
use jm_reflect::info::{ListInfo, MapInfo, PrimitiveKind, TypeInfo};
use serde_json::{Map, Value};

use crate::adapter::MemberConverter;
use crate::{ConvertError, Mapper, MapperError};

/// A short description of a JSON value for error messages.
fn describe(json: &Value) -> &'static str {
    match json {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn shape(info: &TypeInfo, json: &Value) -> MapperError {
    MapperError::unsupported(format!("expected `{}`, found {}", info.type_path(), describe(json)))
}

fn conversion(info: &TypeInfo, text: String, err: impl Into<Box<dyn Error + Send + Sync>>) -> MapperError {
    MapperError::Conversion {
        type_path: info.type_path(),
        text,
        source: ConvertError::wrap(err),
    }
}

/// The text of a scalar JSON value.
fn scalar_text(info: &TypeInfo, json: &Value) -> Result<String, MapperError> {
    match json {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(shape(info, other)),
    }
}

fn parse<T>(info: &TypeInfo, json: &Value) -> Result<Box<dyn Reflect>, MapperError>
where
    T: FromStr + Reflect,
    T::Err: Error + Send + Sync + 'static,
{
    let text = match json {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_owned(),
        other => return Err(shape(info, other)),
    };
    match text.parse::<T>() {
        Ok(value) => Ok(Box::new(value)),
        Err(err) => Err(conversion(info, text, err)),
    }
}

fn primitive(kind: PrimitiveKind, info: &TypeInfo, json: &Value) -> Result<Box<dyn Reflect>, MapperError> {
    match kind {
        PrimitiveKind::Bool => match json {
            Value::Bool(flag) => Ok(Box::new(*flag)),
            Value::String(text) => match text.trim().parse::<bool>() {
                Ok(flag) => Ok(Box::new(flag)),
                Err(err) => Err(conversion(info, text.clone(), err)),
            },
            other => Err(shape(info, other)),
        },
        PrimitiveKind::Char => {
            let text = scalar_text(info, json)?;
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => Ok(Box::new(ch)),
                _ => Err(conversion(info, text, "expected exactly one character")),
            }
        }
        PrimitiveKind::I8 => parse::<i8>(info, json),
        PrimitiveKind::I16 => parse::<i16>(info, json),
        PrimitiveKind::I32 => parse::<i32>(info, json),
        PrimitiveKind::I64 => parse::<i64>(info, json),
        PrimitiveKind::I128 => parse::<i128>(info, json),
        PrimitiveKind::Isize => parse::<isize>(info, json),
        PrimitiveKind::U8 => parse::<u8>(info, json),
        PrimitiveKind::U16 => parse::<u16>(info, json),
        PrimitiveKind::U32 => parse::<u32>(info, json),
        PrimitiveKind::U64 => parse::<u64>(info, json),
        PrimitiveKind::U128 => parse::<u128>(info, json),
        PrimitiveKind::Usize => parse::<usize>(info, json),
        PrimitiveKind::F32 => parse::<f32>(info, json),
        PrimitiveKind::F64 => parse::<f64>(info, json),
        PrimitiveKind::String => Ok(Box::new(scalar_text(info, json)?)),
    }
}

/// The natural value of a JSON document in an untyped slot.
fn dynamic(json: &Value) -> Box<dyn Reflect> {
    match json {
        Value::Null => Box::new(Value::Null),
        Value::Bool(flag) => Box::new(*flag),
        Value::Number(number) => match (number.as_i64(), number.as_u64(), number.as_f64()) {
            (Some(int), _, _) => Box::new(int),
            (None, Some(uint), _) => Box::new(uint),
            (None, None, Some(float)) => Box::new(float),
            (None, None, None) => Box::new(json.clone()),
        },
        Value::String(text) => Box::new(text.clone()),
        Value::Array(items) => Box::new(items.iter().map(dynamic).collect::<Vec<Box<dyn Reflect>>>()),
        Value::Object(members) => Box::new(
            members
                .iter()
                .map(|(key, item)| (key.clone(), dynamic(item)))
                .collect::<IndexMap<String, Box<dyn Reflect>>>(),
        ),
    }
}

/// Whether `info` has a representation for JSON `null`.
fn accepts_null(info: &TypeInfo) -> bool {
    matches!(info, TypeInfo::Option(_) | TypeInfo::Dynamic(_) | TypeInfo::Json(_))
}

// -----------------------------------------------------------------------------
// ValueReader

/// Builds values of a described type from JSON.
pub(crate) struct ValueReader<'a> {
    mapper: &'a Mapper,
}

impl<'a> ValueReader<'a> {
    #[inline]
    pub fn new(mapper: &'a Mapper) -> Self {
        Self { mapper }
    }

    /// Reads `json` as a value of `info`.
    ///
    /// `converter` is the converter pinned on the property being read; it
    /// also applies to the items of wrappers and containers.
    pub fn read(
        &self,
        info: &'static TypeInfo,
        json: &Value,
        converter: Option<&MemberConverter>,
    ) -> Result<Box<dyn Reflect>, MapperError> {
        if let Some(converter) = converter
            && converter.applies_to(info)
        {
            return match converter {
                MemberConverter::Text(adapter) => adapter.from_text(&scalar_text(info, json)?),
                MemberConverter::Object(adapter) => adapter.from_value(json, self.mapper),
            };
        }
        let registry = self.mapper.registry();
        if let Some(adapter) = registry.find_object(info.type_id()) {
            return adapter.from_value(json, self.mapper);
        }
        if json.is_null() && !accepts_null(info) {
            return Err(shape(info, json));
        }

        match info {
            TypeInfo::Primitive(primitive_info) => primitive(primitive_info.kind(), info, json),
            TypeInfo::Opaque(_) | TypeInfo::Enum(_) => {
                let text = scalar_text(info, json)?;
                registry.find_or_fallback(info).from_text(&text)
            }
            TypeInfo::Option(option) => {
                let inner = match json {
                    Value::Null => None,
                    json => Some(self.read(option.some_info(), json, converter)?),
                };
                Ok(option.wrap(inner)?)
            }
            TypeInfo::Pointer(pointer) => Ok(pointer.wrap(self.read(pointer.inner_info(), json, converter)?)?),
            TypeInfo::Dynamic(slot) => Ok(slot.wrap(dynamic(json))),
            TypeInfo::Json(_) => Ok(Box::new(json.clone())),
            TypeInfo::List(list) => self.list(info, list, json, converter),
            TypeInfo::Map(map) => self.map(info, map, json, converter),
            TypeInfo::Class(_) => {
                if let Some(adapter) = registry.find(info) {
                    return adapter.from_text(&scalar_text(info, json)?);
                }
                match json {
                    Value::Object(members) => self.class(info, members),
                    other => Err(shape(info, other)),
                }
            }
        }
    }

    fn list(
        &self,
        info: &'static TypeInfo,
        list: &ListInfo,
        json: &Value,
        converter: Option<&MemberConverter>,
    ) -> Result<Box<dyn Reflect>, MapperError> {
        let items = match json {
            Value::String(text) if list.is_bytes() => {
                let bytes = STANDARD
                    .decode(text)
                    .or_else(|_| URL_SAFE.decode(text))
                    .map_err(|err| conversion(info, text.clone(), err))?;
                bytes
                    .into_iter()
                    .map(|byte| Box::new(byte) as Box<dyn Reflect>)
                    .collect()
            }
            Value::Array(values) => {
                let item_info = list.item_info();
                values
                    .iter()
                    .map(|item| self.read(item_info, item, converter))
                    .collect::<Result<Vec<_>, _>>()?
            }
            other => return Err(shape(info, other)),
        };
        list.from_items(items)
            .map_err(|err| MapperError::access(format_args!("building `{}`", info.type_path()), err))
    }

    fn map(
        &self,
        info: &'static TypeInfo,
        map: &MapInfo,
        json: &Value,
        converter: Option<&MemberConverter>,
    ) -> Result<Box<dyn Reflect>, MapperError> {
        let Value::Object(members) = json else {
            return Err(shape(info, json));
        };
        let (key_info, value_info) = (map.key_info(), map.value_info());
        let entries = members
            .iter()
            .map(|(key, item)| {
                let key = self.read(key_info, &Value::String(key.clone()), converter)?;
                Ok((key, self.read(value_info, item, converter)?))
            })
            .collect::<Result<Vec<_>, MapperError>>()?;
        map.from_entries(entries)
            .map_err(|err| MapperError::access(format_args!("building `{}`", info.type_path()), err))
    }

    /// Builds a class: constructor arguments first, then writers, then the
    /// any-setter for whatever is left.
    fn class(&self, info: &'static TypeInfo, members: &Map<String, Value>) -> Result<Box<dyn Reflect>, MapperError> {
        let mapping = self.mapper.mapping(info)?;
        let type_path = mapping.type_path();
        let Some(factory) = mapping.factory() else {
            return Err(MapperError::NotInstantiable(type_path));
        };

        let mut consumed: Vec<&str> = Vec::with_capacity(mapping.params().len());
        let mut args = Vec::with_capacity(mapping.params().len());
        for param in mapping.params() {
            let found = param.name().and_then(|name| Some((name, members.get(name)?)));
            match found {
                Some((name, json)) => {
                    consumed.push(name);
                    let arg = match json {
                        Value::Null if !accepts_null(param.value_info()) => None,
                        json => Some(self.read(param.value_info(), json, param.converter())?),
                    };
                    args.push(arg);
                }
                None => args.push(None),
            }
        }

        if mapping.writers().is_empty()
            && mapping.any_setter().is_none()
            && factory.is_no_args()
            && !members.is_empty()
        {
            return Err(MapperError::ReadOnly(type_path));
        }

        let mut object = factory.invoke(args)?;
        let fail_on_unknown = self.mapper.config().fail_on_unknown_properties();
        for (name, json) in members {
            if consumed.contains(&name.as_str()) {
                continue;
            }
            if let Some(property) = mapping.writer(name) {
                if json.is_null() {
                    continue;
                }
                let value = self.read(property.value_info(), json, property.converter())?;
                property.writer().write(&mut *object, value)?;
            } else if let Some(any) = mapping.any_setter() {
                let value = self.read(any.value_info(), json, None)?;
                any.set(&mut *object, name.clone(), value)
                    .map_err(|err| MapperError::access(format_args!("collecting `{type_path}.{name}`"), err))?;
            } else if fail_on_unknown {
                return Err(MapperError::unsupported(format!("unknown property `{name}` of `{type_path}`")));
            } else {
                log::trace!("skipping unknown property `{name}` of `{type_path}`");
            }
        }
        Ok(object)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::io;

    use indexmap::IndexMap;
    use jm_reflect::Reflect;
    use jm_reflect::derive::Reflect;
    use serde_json::{Value, json};

    use crate::{ErrorKind, MapperBuilder};

    #[derive(Reflect, Debug, Default, PartialEq)]
    #[reflect(default)]
    struct Person {
        name: String,
        age: u32,
        email: Option<String>,
        #[reflect(any)]
        extra: IndexMap<String, Value>,
    }

    #[derive(Reflect, Debug, PartialEq)]
    #[reflect(record)]
    struct Range {
        start: i64,
        #[reflect(rename = "until")]
        end: i64,
    }

    #[derive(Reflect, Debug, Default, PartialEq)]
    #[reflect(default)]
    struct Strict {
        id: u8,
    }

    #[derive(Reflect, Debug, PartialEq)]
    #[reflect(default)]
    struct Frozen {
        #[reflect(readonly)]
        id: u8,
    }

    impl Default for Frozen {
        fn default() -> Self {
            Self { id: 1 }
        }
    }

    #[derive(Reflect, Debug)]
    struct NoDefault {
        id: u8,
    }

    #[test]
    fn unknown_members_go_to_the_any_setter() {
        let mapper = MapperBuilder::new().build();
        let person: Person = mapper
            .read(r#"{"name":"ok","age":5,"email":null,"team":"core","level":3}"#)
            .unwrap();
        assert_eq!(person.name, "ok");
        assert_eq!(person.age, 5);
        assert_eq!(person.email, None);
        assert_eq!(person.extra["team"], json!("core"));
        assert_eq!(person.extra["level"], json!(3));

        let written = mapper.write_to_string(&person).unwrap();
        assert_eq!(written, r#"{"name":"ok","age":5,"team":"core","level":3}"#);
    }

    #[test]
    fn records_are_built_through_their_canonical_constructor() {
        let mapper = MapperBuilder::new().build();
        let range: Range = mapper.read(r#"{"until":9,"start":-2}"#).unwrap();
        assert_eq!(range, Range { start: -2, end: 9 });
        assert_eq!(mapper.write_to_string(&range).unwrap(), r#"{"start":-2,"until":9}"#);
    }

    #[test]
    fn unknown_properties_fail_when_asked() {
        let lenient = MapperBuilder::new().build();
        let value: Strict = lenient.read(r#"{"id":4,"other":true}"#).unwrap();
        assert_eq!(value.id, 4);

        let strict = MapperBuilder::new().fail_on_unknown_properties(true).build();
        let err = strict.read::<Strict>(r#"{"id":4,"other":true}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structure);
        assert!(err.to_string().contains("other"));
    }

    #[test]
    fn classes_without_a_way_in_are_rejected() {
        let mapper = MapperBuilder::new().build();
        let err = mapper.read::<NoDefault>(r#"{"id":1}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Mapping);
        assert!(err.to_string().contains("constructor"));
    }

    #[test]
    fn scalars_convert_or_fail_with_context() {
        let mapper = MapperBuilder::new().build();
        assert_eq!(mapper.read::<u8>("\"12\"").unwrap(), 12);
        assert_eq!(mapper.read::<char>("\"x\"").unwrap(), 'x');

        let err = mapper.read::<u8>("300").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
        assert!(err.to_string().contains("300"));

        let err = mapper.read::<Vec<u8>>("[1,null]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structure);
        assert_eq!(mapper.read::<Vec<Option<u8>>>("[1,null]").unwrap(), [Some(1), None]);
    }

    #[test]
    fn bytes_accept_both_base64_alphabets_and_arrays() {
        let mapper = MapperBuilder::new().build();
        assert_eq!(mapper.read::<Vec<u8>>("\"+/8=\"").unwrap(), [0xfb, 0xff]);
        assert_eq!(mapper.read::<Vec<u8>>("\"-_8=\"").unwrap(), [0xfb, 0xff]);
        assert_eq!(mapper.read::<Vec<u8>>("[1,2]").unwrap(), [1, 2]);
    }

    #[test]
    fn maps_parse_their_keys() {
        let mapper = MapperBuilder::new().build();
        let map: BTreeMap<u16, bool> = mapper.read(r#"{"10":true,"2":false}"#).unwrap();
        assert_eq!(map.into_iter().collect::<Vec<_>>(), [(2, false), (10, true)]);

        let err = mapper.read::<BTreeMap<u16, bool>>(r#"{"x":true}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
    }

    #[test]
    fn untyped_slots_take_natural_values() {
        let mapper = MapperBuilder::new().build();
        let slot: Box<dyn Reflect> = mapper.read(r#"{"a":[1,"b",true],"c":1.5}"#).unwrap();
        let members = (*slot).downcast_ref::<IndexMap<String, Box<dyn Reflect>>>().unwrap();
        let items = (*members["a"]).downcast_ref::<Vec<Box<dyn Reflect>>>().unwrap();
        assert_eq!((*items[0]).downcast_ref::<i64>(), Some(&1));
        assert_eq!((*items[1]).downcast_ref::<String>().map(String::as_str), Some("b"));
        assert_eq!((*members["c"]).downcast_ref::<f64>(), Some(&1.5));
    }

    #[test]
    fn read_only_classes_reject_content() {
        let mapper = MapperBuilder::new().access_mode(crate::AccessModeKind::Field).build();
        let err = mapper.read::<Frozen>(r#"{"id":3}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Mapping);
        assert_eq!(mapper.read::<Frozen>("{}").unwrap(), Frozen { id: 1 });
    }

    #[test]
    fn sealed_errors_round_trip_their_message() {
        let mapper = MapperBuilder::new().build();
        let err = io::Error::other("disk full");
        let json = mapper.to_value(&err).unwrap();
        assert_eq!(json, json!({ "message": "disk full", "stackTrace": [] }));

        let back: io::Error = mapper.from_value(&json).unwrap();
        assert_eq!(back.to_string(), "disk full");
    }
}
