use core::cmp::Ordering;
use core::fmt;
use std::sync::Arc;

use jm_reflect::info::Typed;

use crate::access::{AccessMode, FieldAccess, FieldAndMethodAccess, MethodAccess, RecordAccess};
use crate::adapter::{AdapterRegistry, Converter, ObjectConverter};
use crate::{AccessModeKind, AttributeOrder, BinaryStrategy, BufferStrategy, DateFormat, Encoding, Mapper, MapperConfig};

/// Default size of stream buffers, in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

type Registration = Box<dyn FnOnce(&mut AdapterRegistry) + Send>;

// -----------------------------------------------------------------------------
// MapperBuilder

/// Configures a [`Mapper`].
///
/// Every option is optional.
///
/// ```
/// use jm_mapper::{AccessModeKind, BinaryStrategy, MapperBuilder};
///
/// let mapper = MapperBuilder::new()
///     .access_mode(AccessModeKind::Field)
///     .binary_strategy(BinaryStrategy::Array)
///     .skip_null(false)
///     .version(2)
///     .build();
///
/// assert!(!mapper.config().skip_null());
/// assert_eq!(mapper.config().version(), Some(2));
/// assert_eq!(mapper.write_to_string(&vec![1_u8, 2]).unwrap(), "[1,2]");
/// ```
#[must_use]
pub struct MapperBuilder {
    access_mode: AccessModeKind,
    registrations: Vec<Registration>,
    version: Option<u32>,
    pretty: bool,
    skip_null: bool,
    skip_empty_array: bool,
    attribute_order: Option<AttributeOrder>,
    buffer_size: usize,
    buffer_strategy: BufferStrategy,
    encoding: Encoding,
    binary_strategy: BinaryStrategy,
    close: bool,
    use_constructors: bool,
    getter_as_writer: bool,
    date_format: DateFormat,
    fail_on_unknown_properties: bool,
}

impl MapperBuilder {
    pub fn new() -> Self {
        Self {
            access_mode: AccessModeKind::FieldAndMethod,
            registrations: Vec::new(),
            version: None,
            pretty: false,
            skip_null: true,
            skip_empty_array: false,
            attribute_order: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
            buffer_strategy: BufferStrategy::PerCall,
            encoding: Encoding::Utf8,
            binary_strategy: BinaryStrategy::Base64,
            close: false,
            use_constructors: false,
            getter_as_writer: false,
            date_format: DateFormat::Compact,
            fail_on_unknown_properties: false,
        }
    }

    /// How the properties of classes are discovered.
    #[inline]
    pub fn access_mode(mut self, access_mode: AccessModeKind) -> Self {
        self.access_mode = access_mode;
        self
    }

    /// Registers a text converter for `T`, replacing the built-in one.
    pub fn converter<T: Typed, C: Converter<T>>(mut self, converter: C) -> Self {
        self.registrations
            .push(Box::new(move |registry: &mut AdapterRegistry| registry.register::<T, C>(converter)));
        self
    }

    /// Registers a converter that writes `T` as any JSON value.
    ///
    /// It takes precedence over text converters and class mappings.
    pub fn object_converter<T: Typed, C: ObjectConverter<T>>(mut self, converter: C) -> Self {
        self.registrations
            .push(Box::new(move |registry: &mut AdapterRegistry| registry.register_object::<T, C>(converter)));
        self
    }

    /// Properties tagged with a later `since` are not written.
    #[inline]
    pub fn version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    #[inline]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    #[inline]
    pub fn skip_null(mut self, skip_null: bool) -> Self {
        self.skip_null = skip_null;
        self
    }

    #[inline]
    pub fn skip_empty_array(mut self, skip_empty_array: bool) -> Self {
        self.skip_empty_array = skip_empty_array;
        self
    }

    /// Sorts written properties by name instead of declaration order.
    #[inline]
    pub fn attribute_order(mut self, order: impl Fn(&str, &str) -> Ordering + Send + Sync + 'static) -> Self {
        self.attribute_order = Some(Arc::new(order));
        self
    }

    /// Capacity of stream buffers. Zero is raised to one.
    #[inline]
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    #[inline]
    pub fn buffer_strategy(mut self, buffer_strategy: BufferStrategy) -> Self {
        self.buffer_strategy = buffer_strategy;
        self
    }

    #[inline]
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    #[inline]
    pub fn binary_strategy(mut self, binary_strategy: BinaryStrategy) -> Self {
        self.binary_strategy = binary_strategy;
        self
    }

    /// Releases output streams once a document is written.
    #[inline]
    pub fn close(mut self, close: bool) -> Self {
        self.close = close;
        self
    }

    /// Prefers annotated constructors when instances are created.
    ///
    /// Ignored by [`AccessModeKind::Custom`].
    #[inline]
    pub fn use_constructors(mut self, use_constructors: bool) -> Self {
        self.use_constructors = use_constructors;
        self
    }

    /// Lets a mutable collection getter stand in for a missing setter.
    ///
    /// Ignored by [`AccessModeKind::Custom`].
    #[inline]
    pub fn getter_as_writer(mut self, getter_as_writer: bool) -> Self {
        self.getter_as_writer = getter_as_writer;
        self
    }

    #[inline]
    pub fn date_format(mut self, date_format: DateFormat) -> Self {
        self.date_format = date_format;
        self
    }

    /// Rejects JSON members that match no property and no any-setter.
    #[inline]
    pub fn fail_on_unknown_properties(mut self, fail: bool) -> Self {
        self.fail_on_unknown_properties = fail;
        self
    }

    fn build_access_mode(&self) -> Arc<dyn AccessMode> {
        let methods = MethodAccess::new()
            .getter_as_writer(self.getter_as_writer)
            .use_constructors(self.use_constructors);
        match &self.access_mode {
            AccessModeKind::Field => Arc::new(FieldAccess::new().use_constructors(self.use_constructors)),
            AccessModeKind::Method => Arc::new(methods),
            AccessModeKind::Record => Arc::new(RecordAccess::new().use_constructors(self.use_constructors)),
            AccessModeKind::FieldAndMethod => {
                Arc::new(FieldAndMethodAccess::new(methods).use_constructors(self.use_constructors))
            }
            AccessModeKind::Custom(custom) => custom.clone(),
        }
    }

    pub fn build(self) -> Mapper {
        let access_mode = self.build_access_mode();
        let mut registry = AdapterRegistry::new(self.date_format.clone());
        for register in self.registrations {
            register(&mut registry);
        }
        log::debug!("building mapper with {} user adapters", registry.len());

        let config = MapperConfig {
            access_mode,
            version: self.version,
            pretty: self.pretty,
            skip_null: self.skip_null,
            skip_empty_array: self.skip_empty_array,
            attribute_order: self.attribute_order,
            buffer_size: self.buffer_size,
            buffer_strategy: self.buffer_strategy,
            encoding: self.encoding,
            binary_strategy: self.binary_strategy,
            close: self.close,
            date_format: self.date_format,
            fail_on_unknown_properties: self.fail_on_unknown_properties,
        };
        Mapper::from_parts(config, registry)
    }
}

impl Default for MapperBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MapperBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperBuilder")
            .field("access_mode", &self.access_mode)
            .field("registrations", &self.registrations.len())
            .field("version", &self.version)
            .field("date_format", &self.date_format)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use jm_reflect::derive::Reflect;
    use serde_json::{Value, json};

    use crate::{ConvertError, Converter, ErrorKind, Mapper, MapperBuilder, MapperError, ObjectConverter};

    #[derive(Reflect, Debug, Default, PartialEq)]
    #[reflect(default)]
    struct Temperature {
        celsius: f64,
    }

    #[derive(Reflect, Debug, Default, PartialEq)]
    #[reflect(default)]
    struct Reading {
        place: String,
        temperature: Temperature,
        level: u8,
    }

    struct AsFahrenheit;

    impl ObjectConverter<Temperature> for AsFahrenheit {
        fn write(&self, value: &Temperature, _: &Mapper) -> Result<Value, MapperError> {
            Ok(json!({ "f": value.celsius * 9.0 / 5.0 + 32.0 }))
        }

        fn read(&self, value: &Value, _: &Mapper) -> Result<Temperature, MapperError> {
            let f = value["f"].as_f64().unwrap_or_default();
            Ok(Temperature {
                celsius: (f - 32.0) * 5.0 / 9.0,
            })
        }
    }

    struct Seconds;

    impl Converter<Duration> for Seconds {
        fn write(&self, value: &Duration) -> String {
            format!("{}s", value.as_secs())
        }

        fn read(&self, text: &str) -> Result<Duration, ConvertError> {
            let secs = text.strip_suffix('s').ok_or_else(|| ConvertError::new("missing unit"))?;
            secs.parse().map(Duration::from_secs).map_err(ConvertError::wrap)
        }
    }

    #[test]
    fn defaults() {
        let mapper = MapperBuilder::new().build();
        let config = mapper.config();
        assert_eq!(config.buffer_size(), super::DEFAULT_BUFFER_SIZE);
        assert!(config.skip_null());
        assert!(!config.skip_empty_array());
        assert!(!config.is_pretty());
        assert!(!config.close());
        assert!(config.version().is_none());
        assert!(config.includes_version(Some(99)));
    }

    #[test]
    fn user_converters_replace_class_mappings() {
        let mapper = MapperBuilder::new().object_converter::<Temperature, _>(AsFahrenheit).build();
        let reading = Reading {
            place: "lab".into(),
            temperature: Temperature { celsius: 100.0 },
            level: 2,
        };
        let json = mapper.to_value(&reading).unwrap();
        assert_eq!(json, json!({"place": "lab", "temperature": {"f": 212.0}, "level": 2}));
        assert_eq!(mapper.from_value::<Reading>(&json).unwrap(), reading);
    }

    #[test]
    fn text_converters_replace_built_in_adapters() {
        let mapper = MapperBuilder::new().converter::<Duration, _>(Seconds).build();
        let mut timeouts = BTreeMap::new();
        timeouts.insert(Duration::from_secs(90), Duration::from_secs(5));
        let json = mapper.write_to_string(&timeouts).unwrap();
        assert_eq!(json, r#"{"90s":"5s"}"#);
        assert_eq!(mapper.read::<BTreeMap<Duration, Duration>>(&json).unwrap(), timeouts);

        let err = mapper.read::<Duration>(r#""5m""#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);
    }
}
