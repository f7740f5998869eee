//! The per-class mapping cache.

use core::any::TypeId;
use core::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use jm_reflect::attrs::{IgnoreProperties, PropertyOrder, Rename, Since};
use jm_reflect::info::{AnyGetterInfo, AnySetterInfo, ClassInfo, CustomAttributes, TypeInfo};
use jm_utils::PublishMap;

use crate::access::{Factory, ReadMember, Reader, WriteMember, Writer, sealed_mapping};
use crate::adapter::{MemberConverter, UseConverter, UseObjectConverter};
use crate::{MapperConfig, MapperError};

/// Members of error types that are never mapped.
const ERROR_DENY_LIST: &[&str] = &["source", "backtrace", "cause"];

// -----------------------------------------------------------------------------
// Property descriptors

/// A readable property with its resolved metadata.
#[derive(Debug, Clone)]
pub struct PropertyReader {
    name: String,
    reader: Reader,
    converter: Option<MemberConverter>,
    since: Option<u32>,
}

impl PropertyReader {
    /// Serialized name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn reader(&self) -> &Reader {
        &self.reader
    }

    /// Declared type of the property.
    #[inline]
    pub fn value_info(&self) -> &'static TypeInfo {
        self.reader.primary().value_info()
    }

    /// Converter pinned by an attribute.
    #[inline]
    pub fn converter(&self) -> Option<&MemberConverter> {
        self.converter.as_ref()
    }

    /// Minimum version at which the property is written.
    #[inline]
    pub fn since(&self) -> Option<u32> {
        self.since
    }
}

/// A writable property with its resolved metadata.
#[derive(Debug, Clone)]
pub struct PropertyWriter {
    writer: Writer,
    converter: Option<MemberConverter>,
}

impl PropertyWriter {
    #[inline]
    pub fn writer(&self) -> &Writer {
        &self.writer
    }

    #[inline]
    pub fn value_info(&self) -> &'static TypeInfo {
        self.writer.primary().value_info()
    }

    #[inline]
    pub fn converter(&self) -> Option<&MemberConverter> {
        self.converter.as_ref()
    }
}

/// A factory argument bound to a property.
#[derive(Debug, Clone)]
pub struct ParamMapping {
    name: Option<String>,
    info: &'static TypeInfo,
    converter: Option<MemberConverter>,
}

impl ParamMapping {
    /// The property the argument is read from.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[inline]
    pub fn value_info(&self) -> &'static TypeInfo {
        self.info
    }

    #[inline]
    pub fn converter(&self) -> Option<&MemberConverter> {
        self.converter.as_ref()
    }
}

// -----------------------------------------------------------------------------
// ClassMapping

/// How one class is read and written. Immutable once built.
pub struct ClassMapping {
    class: &'static ClassInfo,
    readers: Vec<PropertyReader>,
    writers: IndexMap<String, PropertyWriter>,
    factory: Option<Factory>,
    params: Vec<ParamMapping>,
    sealed: bool,
}

/// The converter pinned on one member, object converters first.
fn pinned(attributes: &CustomAttributes) -> Option<MemberConverter> {
    if let Some(UseObjectConverter(adapter)) = attributes.get::<UseObjectConverter>() {
        return Some(MemberConverter::Object(adapter.clone()));
    }
    let UseConverter(adapter) = attributes.get::<UseConverter>()?;
    Some(MemberConverter::Text(adapter.clone()))
}

/// The primary member's converter; the fallback's only when the primary
/// pins none.
fn pinned_either(primary: &CustomAttributes, fallback: Option<&CustomAttributes>) -> Option<MemberConverter> {
    pinned(primary).or_else(|| pinned(fallback?))
}

/// Rejects map types whose keys cannot become JSON member names.
fn check_shape(info: &'static TypeInfo, owner: &str, property: &str) -> Result<(), MapperError> {
    match info {
        TypeInfo::Option(option) => check_shape(option.some_info(), owner, property),
        TypeInfo::Pointer(pointer) => check_shape(pointer.inner_info(), owner, property),
        TypeInfo::List(list) => check_shape(list.item_info(), owner, property),
        TypeInfo::Map(map) => match map.key_info() {
            TypeInfo::Primitive(_) | TypeInfo::Enum(_) | TypeInfo::Opaque(_) => {
                check_shape(map.value_info(), owner, property)
            }
            key => Err(MapperError::unsupported(format!(
                "`{owner}.{property}`: map keys of type `{}` cannot be written as member names",
                key.type_path()
            ))),
        },
        _ => Ok(()),
    }
}

impl ClassMapping {
    fn build(info: &'static TypeInfo, config: &MapperConfig) -> Result<Self, MapperError> {
        let TypeInfo::Class(class) = info else {
            return Err(MapperError::NoMapping(info.type_path()));
        };
        let access = config.access_mode();
        let found = access
            .find_readers(class)
            .and_then(|readers| Ok((readers, access.find_writers(class)?, access.find_factory(class)?)));

        let (mut readers, mut writers, factory, sealed) = match found {
            Ok((readers, writers, factory)) => (readers, writers, factory, false),
            Err(err) if err.is_denied() => match sealed_mapping(class) {
                Some((readers, writers, factory)) => {
                    log::warn!("members of `{}` are sealed; using the message mapping", class.type_path());
                    (readers, writers, factory, true)
                }
                None => return Err(err),
            },
            Err(err) => return Err(err),
        };

        if class.error_info().is_some() {
            for name in ERROR_DENY_LIST {
                readers.shift_remove(*name);
                writers.shift_remove(*name);
            }
        }
        if let Some(IgnoreProperties(names)) = class.get_attribute::<IgnoreProperties>() {
            for name in *names {
                readers.shift_remove(*name);
                writers.shift_remove(*name);
            }
        }

        let owner = class.type_path();
        let mut readers: Vec<PropertyReader> = readers
            .into_iter()
            .map(|(name, reader)| {
                check_shape(reader.primary().value_info(), owner, &name)?;
                Ok(PropertyReader {
                    converter: pinned_either(
                        reader.primary().custom_attributes(),
                        reader.fallback().map(ReadMember::custom_attributes),
                    ),
                    since: reader.attribute::<Since>().map(|since| since.0),
                    name,
                    reader,
                })
            })
            .collect::<Result<_, MapperError>>()?;

        if let Some(order) = config.attribute_order() {
            readers.sort_by(|a, b| order(&a.name, &b.name));
        }
        if let Some(PropertyOrder(first)) = class.get_attribute::<PropertyOrder>() {
            let mut front = Vec::with_capacity(first.len());
            for name in *first {
                if let Some(index) = readers.iter().position(|reader| reader.name == *name) {
                    front.push(readers.remove(index));
                }
            }
            front.append(&mut readers);
            readers = front;
        }

        let writers = writers
            .into_iter()
            .map(|(name, writer)| {
                check_shape(writer.primary().value_info(), owner, &name)?;
                let converter = pinned_either(
                    writer.primary().custom_attributes(),
                    writer.fallback().map(WriteMember::custom_attributes),
                );
                Ok((name, PropertyWriter { writer, converter }))
            })
            .collect::<Result<_, MapperError>>()?;

        let params = match &factory {
            Some(factory) => factory
                .params()
                .iter()
                .map(|param| {
                    let attributes = param.custom_attributes();
                    let name = attributes
                        .get::<Rename>()
                        .map(|rename| rename.0)
                        .or(param.name())
                        .map(str::to_owned);
                    ParamMapping {
                        name,
                        info: param.type_info(),
                        converter: pinned(attributes),
                    }
                })
                .collect(),
            None => Vec::new(),
        };

        Ok(Self {
            class,
            readers,
            writers,
            factory,
            params,
            sealed,
        })
    }

    #[inline]
    pub fn class(&self) -> &'static ClassInfo {
        self.class
    }

    #[inline]
    pub fn type_path(&self) -> &'static str {
        self.class.type_path()
    }

    /// Readable properties in output order.
    #[inline]
    pub fn readers(&self) -> &[PropertyReader] {
        &self.readers
    }

    #[inline]
    pub fn writers(&self) -> &IndexMap<String, PropertyWriter> {
        &self.writers
    }

    #[inline]
    pub fn writer(&self, name: &str) -> Option<&PropertyWriter> {
        self.writers.get(name)
    }

    #[inline]
    pub fn factory(&self) -> Option<&Factory> {
        self.factory.as_ref()
    }

    /// One entry per factory argument.
    #[inline]
    pub fn params(&self) -> &[ParamMapping] {
        &self.params
    }

    #[inline]
    pub fn any_getter(&self) -> Option<&AnyGetterInfo> {
        self.class.any_getter()
    }

    #[inline]
    pub fn any_setter(&self) -> Option<&AnySetterInfo> {
        self.class.any_setter()
    }

    /// `true` when the class denied member access and the message mapping
    /// is used instead.
    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }
}

impl fmt::Debug for ClassMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassMapping")
            .field("type_path", &self.type_path())
            .field("readers", &self.readers.iter().map(|r| r.name()).collect::<Vec<_>>())
            .field("writers", &self.writers.keys().collect::<Vec<_>>())
            .field("factory", &self.factory)
            .field("sealed", &self.sealed)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ClassMappings

/// Class mappings by type, built on first use.
///
/// Racing builders may build the same mapping twice; the first one
/// published is kept.
#[derive(Default)]
pub(crate) struct ClassMappings {
    mappings: PublishMap<TypeId, Arc<ClassMapping>>,
}

impl ClassMappings {
    pub fn find_or_create(
        &self,
        info: &'static TypeInfo,
        config: &MapperConfig,
    ) -> Result<Arc<ClassMapping>, MapperError> {
        self.mappings.get_or_try_build(info.type_id(), || {
            let mapping = ClassMapping::build(info, config)?;
            log::debug!(
                "built mapping for `{}` ({} readers, {} writers)",
                mapping.type_path(),
                mapping.readers.len(),
                mapping.writers.len()
            );
            Ok(Arc::new(mapping))
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }
}

impl fmt::Debug for ClassMappings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassMappings").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io;

    use jm_reflect::derive::Reflect;
    use jm_reflect::impls::NonGenericTypeInfoCell;
    use jm_reflect::info::{ClassInfo, FieldInfo, MethodInfo, TypeInfo, Typed};
    use serde_json::{Value, json};

    use crate::adapter::MemberConverter;
    use crate::{AccessModeKind, ConvertError, Converter, ErrorKind, Mapper, MapperBuilder, MapperError};
    use crate::{ObjectConverter, UseConverter, UseObjectConverter};

    #[derive(Reflect, Default)]
    #[reflect(default, order("id"), ignore("secret"))]
    struct Ticket {
        title: String,
        id: u32,
        secret: String,
        #[reflect(since = 3)]
        priority: u8,
    }

    #[derive(Reflect, Default)]
    struct Grid {
        cells: HashMap<Vec<u8>, u8>,
    }

    /// `5` as `"t5"`.
    struct Tagged;

    impl Converter<i32> for Tagged {
        fn write(&self, value: &i32) -> String {
            format!("t{value}")
        }

        fn read(&self, text: &str) -> Result<i32, ConvertError> {
            let digits = text.strip_prefix('t').ok_or_else(|| ConvertError::new("missing tag"))?;
            digits.parse().map_err(ConvertError::wrap)
        }
    }

    /// `5` as `{"value":5}`. Anything else reads as -999.
    struct Wrapped;

    impl ObjectConverter<i32> for Wrapped {
        fn write(&self, value: &i32, _: &Mapper) -> Result<Value, MapperError> {
            Ok(json!({ "value": value }))
        }

        fn read(&self, value: &Value, _: &Mapper) -> Result<i32, MapperError> {
            Ok(value["value"].as_i64().map_or(-999, |value| value as i32))
        }
    }

    #[derive(Reflect, Debug, Default, PartialEq)]
    #[reflect(default)]
    struct Pinned {
        #[reflect(@UseConverter::new::<i32, _>(Tagged))]
        text: i32,
        #[reflect(@UseObjectConverter::new::<i32, _>(Wrapped))]
        object: i32,
        plain: i32,
        #[reflect(@UseConverter::new::<i32, _>(Tagged))]
        maybe: Option<i32>,
        #[reflect(@UseConverter::new::<i32, _>(Tagged))]
        many: Vec<i32>,
    }

    #[derive(Reflect, Debug, PartialEq)]
    #[reflect(record)]
    struct Span {
        #[reflect(@UseConverter::new::<i32, _>(Tagged))]
        from: i32,
        #[reflect(@UseObjectConverter::new::<i32, _>(Wrapped))]
        to: i32,
    }

    /// `n` pins a text converter on the field and an object converter on
    /// its setter; `m` pins only the setter.
    #[derive(Default)]
    struct Split {
        n: i32,
        m: i32,
    }

    impl Typed for Split {
        fn type_info() -> &'static TypeInfo {
            static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
            CELL.get_or_init(|| {
                TypeInfo::Class(
                    ClassInfo::builder::<Split>()
                        .with_field(
                            FieldInfo::new("n", |s: &Split| &s.n, |s: &mut Split| &mut s.n)
                                .with_attribute(UseConverter::new::<i32, _>(Tagged)),
                        )
                        .field("m", |s| &s.m, |s| &mut s.m)
                        .with_method(
                            MethodInfo::setter("setN", |s: &mut Split, n: i32| s.n = n)
                                .with_attribute(UseObjectConverter::new::<i32, _>(Wrapped)),
                        )
                        .with_method(
                            MethodInfo::setter("setM", |s: &mut Split, m: i32| s.m = m)
                                .with_attribute(UseObjectConverter::new::<i32, _>(Wrapped)),
                        )
                        .default_constructor()
                        .build(),
                )
            })
        }
    }

    #[test]
    fn order_ignore_and_version_metadata() {
        let mapper = MapperBuilder::new().build();
        let mapping = mapper.class_mapping::<Ticket>().unwrap();
        let names: Vec<_> = mapping.readers().iter().map(|r| r.name()).collect();
        assert_eq!(names, ["id", "title", "priority"]);
        assert_eq!(mapping.readers()[2].since(), Some(3));
        assert!(mapping.writer("secret").is_none());
        assert!(mapping.factory().unwrap().is_no_args());

        let sorted = MapperBuilder::new().attribute_order(|a, b| a.cmp(b)).build();
        let mapping = sorted.class_mapping::<Ticket>().unwrap();
        let names: Vec<_> = mapping.readers().iter().map(|r| r.name()).collect();
        assert_eq!(names, ["id", "priority", "title"]);
    }

    #[test]
    fn mappings_are_built_once() {
        let mapper = MapperBuilder::new().build();
        let first = mapper.class_mapping::<Ticket>().unwrap();
        let second = mapper.class_mapping::<Ticket>().unwrap();
        assert!(std::sync::Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn unusable_shapes_are_rejected() {
        let mapper = MapperBuilder::new().access_mode(AccessModeKind::Field).build();
        let err = mapper.class_mapping::<Grid>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structure);

        let err = mapper.class_mapping::<u32>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Mapping);
    }

    #[test]
    fn sealed_errors_fall_back_to_messages() {
        let mapper = MapperBuilder::new().build();
        let mapping = mapper.class_mapping::<io::Error>().unwrap();
        assert!(mapping.is_sealed());
        let names: Vec<_> = mapping.readers().iter().map(|r| r.name()).collect();
        assert_eq!(names, ["message", "stackTrace"]);
        assert_eq!(mapping.params()[0].name(), Some("message"));
        assert_eq!(mapping.params()[0].value_info().type_path(), String::type_info().type_path());
        assert!(mapping.writers().is_empty());
    }

    #[test]
    fn member_converters_apply_to_their_property() {
        let mapper = MapperBuilder::new().build();
        let value = Pinned {
            text: 5,
            object: 6,
            plain: 7,
            maybe: Some(8),
            many: vec![1, 2],
        };
        let json = mapper.to_value(&value).unwrap();
        assert_eq!(
            json,
            json!({"text": "t5", "object": {"value": 6}, "plain": 7, "maybe": "t8", "many": ["t1", "t2"]})
        );
        assert_eq!(mapper.from_value::<Pinned>(&json).unwrap(), value);

        let empty: Pinned = mapper.read(r#"{"maybe":null,"many":[]}"#).unwrap();
        assert_eq!(empty, Pinned::default());

        let err = mapper.read::<Pinned>(r#"{"text":"5"}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
    }

    #[test]
    fn constructor_parameters_carry_member_converters() {
        let mapper = MapperBuilder::new().build();
        let mapping = mapper.class_mapping::<Span>().unwrap();
        assert!(matches!(mapping.params()[0].converter(), Some(MemberConverter::Text(_))));
        assert!(matches!(mapping.params()[1].converter(), Some(MemberConverter::Object(_))));

        let span: Span = mapper.read(r#"{"from":"t1","to":{"value":4}}"#).unwrap();
        assert_eq!(span, Span { from: 1, to: 4 });
        assert_eq!(mapper.write_to_string(&span).unwrap(), r#"{"from":"t1","to":{"value":4}}"#);
    }

    #[test]
    fn primary_member_converter_wins_over_the_fallback() {
        let mapper = MapperBuilder::new().build();
        let mapping = mapper.class_mapping::<Split>().unwrap();
        let n = mapping.writer("n").unwrap();
        assert!(n.writer().fallback().is_some());
        assert!(matches!(n.converter(), Some(MemberConverter::Text(_))));
        let m = mapping.writer("m").unwrap();
        assert!(matches!(m.converter(), Some(MemberConverter::Object(_))));

        let split: Split = mapper.read(r#"{"n":"t5","m":{"value":3}}"#).unwrap();
        assert_eq!((split.n, split.m), (5, 3));
        assert_eq!(mapper.write_to_string(&split).unwrap(), r#"{"n":"t5","m":3}"#);
    }
}
