use core::fmt;
use std::io::{Read, Write};
use std::sync::Arc;

use jm_reflect::info::{TypeInfo, Typed};
use jm_reflect::{AccessError, Reflect};
use serde_core::Serialize;
use serde_json::Value;

use crate::adapter::AdapterRegistry;
use crate::de::ValueReader;
use crate::io::{BufferPool, Output, OutputGuard, decode, read_all};
use crate::mapping::{ClassMapping, ClassMappings};
use crate::ser::{IterSer, RootSer, SliceSer, ValueSer, WriteContext};
use crate::{BufferStrategy, MapperBuilder, MapperConfig, MapperError};

// -----------------------------------------------------------------------------
// Mapper

struct MapperInner {
    config: MapperConfig,
    registry: AdapterRegistry,
    mappings: ClassMappings,
    pool: Arc<BufferPool>,
}

/// Converts values to JSON and back.
///
/// A mapper is cheap to clone; clones share the configuration and every
/// cache. It can be used from many threads at once.
///
/// ```
/// use jm_mapper::Mapper;
/// use jm_reflect::derive::Reflect;
///
/// #[derive(Reflect, Debug, Default, PartialEq)]
/// #[reflect(default)]
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// let mapper = Mapper::new();
/// let person = Person { name: "ok".into(), age: 5 };
/// let json = mapper.write_to_string(&person).unwrap();
/// assert_eq!(json, r#"{"name":"ok","age":5}"#);
/// assert_eq!(mapper.read::<Person>(&json).unwrap(), person);
/// ```
#[derive(Clone)]
pub struct Mapper {
    inner: Arc<MapperInner>,
}

impl Mapper {
    /// A mapper with the default configuration.
    #[inline]
    pub fn new() -> Self {
        MapperBuilder::new().build()
    }

    #[inline]
    pub fn builder() -> MapperBuilder {
        MapperBuilder::new()
    }

    pub(crate) fn from_parts(config: MapperConfig, registry: AdapterRegistry) -> Self {
        Self {
            inner: Arc::new(MapperInner {
                config,
                registry,
                mappings: ClassMappings::default(),
                pool: Arc::new(BufferPool::default()),
            }),
        }
    }

    #[inline]
    pub fn config(&self) -> &MapperConfig {
        &self.inner.config
    }

    #[inline]
    pub fn registry(&self) -> &AdapterRegistry {
        &self.inner.registry
    }

    #[inline]
    pub(crate) fn mapping(&self, info: &'static TypeInfo) -> Result<Arc<ClassMapping>, MapperError> {
        self.inner.mappings.find_or_create(info, &self.inner.config)
    }

    /// The mapping of `T`, built on first use.
    #[inline]
    pub fn class_mapping<T: Typed>(&self) -> Result<Arc<ClassMapping>, MapperError> {
        self.mapping(T::type_info())
    }

    /// The mapping of the class described by `info`.
    #[inline]
    pub fn class_mapping_of(&self, info: &'static TypeInfo) -> Result<Arc<ClassMapping>, MapperError> {
        self.mapping(info)
    }

    // -------------------------------------------------------------------------
    // Writing

    /// The JSON tree of `value`. `None` becomes `null`.
    pub fn to_value<T: Typed>(&self, value: &T) -> Result<Value, MapperError> {
        self.to_value_dyn(value)
    }

    pub fn to_value_dyn(&self, value: &dyn Reflect) -> Result<Value, MapperError> {
        let ctx = WriteContext::new(self);
        let result = serde_json::to_value(ValueSer::new(&ctx, value));
        ctx.finish(result)
    }

    /// The document of `value` as UTF-8 text, whatever the configured
    /// encoding.
    pub fn write_to_string<T: Typed>(&self, value: &T) -> Result<String, MapperError> {
        let ctx = WriteContext::new(self);
        let root = RootSer(ValueSer::new(&ctx, value));
        let result = if self.config().is_pretty() {
            serde_json::to_string_pretty(&root)
        } else {
            serde_json::to_string(&root)
        };
        drop(root);
        ctx.finish(result)
    }

    /// Writes the document of `value` to `writer`.
    pub fn write<T: Typed, W: Write>(&self, value: &T, writer: W) -> Result<(), MapperError> {
        self.write_dyn(value, T::type_info(), writer)
    }

    /// Writes a value whose static type is only known as `info`.
    ///
    /// `info` may describe the value itself or an untyped slot.
    pub fn write_dyn<W: Write>(&self, value: &dyn Reflect, info: &'static TypeInfo, writer: W) -> Result<(), MapperError> {
        let runtime = value.reflect_type_info();
        if !matches!(info, TypeInfo::Dynamic(_)) && runtime.type_id() != info.type_id() {
            return Err(MapperError::from(AccessError::Mismatch {
                expected: info.type_path(),
                found: runtime.type_path(),
            }));
        }
        let ctx = WriteContext::new(self);
        let result = self.emit(writer, &RootSer(ValueSer::new(&ctx, value)));
        ctx.finish(result)
    }

    /// Writes `values` as a top-level JSON array.
    pub fn write_array<T: Typed, W: Write>(&self, values: &[T], writer: W) -> Result<(), MapperError> {
        let ctx = WriteContext::new(self);
        let result = self.emit(writer, &SliceSer::new(&ctx, values));
        ctx.finish(result)
    }

    /// Writes the items of `values` as a top-level JSON array, pulling them
    /// one by one.
    pub fn write_iter<I, W>(&self, values: I, writer: W) -> Result<(), MapperError>
    where
        I: IntoIterator,
        I::Item: Typed,
        W: Write,
    {
        let ctx = WriteContext::new(self);
        let result = self.emit(writer, &IterSer::new(&ctx, values.into_iter()));
        ctx.finish(result)
    }

    /// Streams `body` through the configured buffering, encoding and flush
    /// policy.
    fn emit<W: Write>(&self, writer: W, body: &impl Serialize) -> Result<(), serde_json::Error> {
        let config = self.config();
        let output = Output::new(writer, config, &self.inner.pool);
        let mut guard = OutputGuard::new(output, config.close());
        if let Some(output) = guard.get() {
            if config.is_pretty() {
                serde_json::to_writer_pretty(output, body)?;
            } else {
                serde_json::to_writer(output, body)?;
            }
        }
        guard.finish().map_err(|err| match err {
            MapperError::Io(err) => serde_json::Error::io(err),
            other => serde_json::Error::io(std::io::Error::other(other.to_string())),
        })
    }

    // -------------------------------------------------------------------------
    // Reading

    /// Reads a `T` from JSON text.
    pub fn read<T: Typed>(&self, text: &str) -> Result<T, MapperError> {
        let json: Value = serde_json::from_str(text)?;
        self.from_value(&json)
    }

    /// Reads a `T` from bytes in the configured encoding, or in the one
    /// named by a byte order mark.
    pub fn read_slice<T: Typed>(&self, bytes: &[u8]) -> Result<T, MapperError> {
        let text = decode(bytes, self.config().encoding())?;
        self.read(&text)
    }

    /// Reads a `T` from a stream.
    pub fn read_from<T: Typed, R: Read>(&self, reader: R) -> Result<T, MapperError> {
        let bytes = read_all(reader, self.config(), &self.inner.pool)?;
        let result = self.read_slice(&bytes);
        if self.config().buffer_strategy() == BufferStrategy::Pooled {
            self.inner.pool.give(bytes);
        }
        result
    }

    /// Reads a value of the type described by `info`.
    pub fn read_dyn(&self, text: &str, info: &'static TypeInfo) -> Result<Box<dyn Reflect>, MapperError> {
        let json: Value = serde_json::from_str(text)?;
        self.from_value_dyn(&json, info)
    }

    /// Reads a top-level JSON array into the list type `C`.
    pub fn read_collection<C: Typed, R: Read>(&self, reader: R) -> Result<C, MapperError> {
        if !matches!(C::type_info(), TypeInfo::List(_)) {
            return Err(MapperError::unsupported(format!(
                "`{}` is not a collection type",
                C::type_info().type_path()
            )));
        }
        self.read_from(reader)
    }

    /// Reads a top-level JSON array.
    #[inline]
    pub fn read_array<T: Typed, R: Read>(&self, reader: R) -> Result<Vec<T>, MapperError> {
        self.read_collection::<Vec<T>, R>(reader)
    }

    /// Converts a JSON tree into a `T`.
    pub fn from_value<T: Typed>(&self, json: &Value) -> Result<T, MapperError> {
        let value = self.from_value_dyn(json, T::type_info())?;
        value
            .take::<T>()
            .map_err(|value| MapperError::from(AccessError::mismatch::<T>(&*value)))
    }

    #[inline]
    pub fn from_value_dyn(&self, json: &Value, info: &'static TypeInfo) -> Result<Box<dyn Reflect>, MapperError> {
        ValueReader::new(self).read(info, json, None)
    }
}

impl Default for Mapper {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("config", &self.inner.config)
            .field("registry", &self.inner.registry)
            .field("mappings", &self.inner.mappings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, VecDeque};
    use std::io::{self, Write};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{DateTime, TimeZone, Utc};
    use indexmap::IndexMap;
    use jm_reflect::derive::Reflect;
    use jm_reflect::info::Typed;
    use serde_json::json;

    use crate::{BufferStrategy, DateFormat, Encoding, ErrorKind, Mapper, MapperBuilder};

    #[derive(Reflect, Debug, Default, PartialEq)]
    #[reflect(default)]
    struct Person {
        name: String,
        age: u32,
    }

    #[derive(Reflect, Debug, Default, PartialEq)]
    #[reflect(default)]
    struct Event {
        at: Option<DateTime<Utc>>,
        labels: IndexMap<String, String>,
        sorted: BTreeMap<String, u8>,
    }

    #[derive(Reflect, Debug, Default)]
    struct Unmapped {
        id: u8,
    }

    /// Counts flushes and fails every write when asked to.
    struct CountingSink {
        flushes: Arc<AtomicUsize>,
        fail: bool,
    }

    impl Write for CountingSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail {
                return Err(io::Error::other("disk gone"));
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    /// Yields `n` spaces, then fails.
    struct Truncated(usize);

    impl io::Read for Truncated {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0 == 0 {
                return Err(io::Error::other("connection reset"));
            }
            let n = self.0.min(buf.len());
            buf[..n].fill(b' ');
            self.0 -= n;
            Ok(n)
        }
    }

    #[test]
    fn simple_classes_round_trip() {
        let mapper = Mapper::new();
        let person = Person {
            name: "ok".into(),
            age: 5,
        };
        let json = mapper.write_to_string(&person).unwrap();
        assert_eq!(json, r#"{"name":"ok","age":5}"#);
        assert_eq!(mapper.read::<Person>(&json).unwrap(), person);

        let mut out = Vec::new();
        mapper.write(&person, &mut out).unwrap();
        assert_eq!(mapper.read_slice::<Person>(&out).unwrap(), person);
    }

    #[test]
    fn dates_write_short_iso_and_read_compact() {
        let mapper = MapperBuilder::new().date_format(DateFormat::Iso8601Short).build();
        let instant = Utc.with_ymd_and_hms(2007, 12, 3, 10, 15, 30).unwrap();
        let event = Event {
            at: Some(instant),
            ..Default::default()
        };
        let json = mapper.to_value(&event).unwrap();
        assert_eq!(json["at"], "2007-12-03T10:15:30Z");

        let back: Event = mapper.read(r#"{"at":"20071203101530Z"}"#).unwrap();
        assert_eq!(back.at, Some(instant));
    }

    #[test]
    fn maps_keep_insertion_or_natural_order() {
        let mapper = Mapper::new();
        let event: Event = mapper
            .read(r#"{"labels":{"z":"1","a":"2"},"sorted":{"z":1,"a":2}}"#)
            .unwrap();
        assert_eq!(event.labels.keys().collect::<Vec<_>>(), ["z", "a"]);
        assert_eq!(event.sorted.keys().collect::<Vec<_>>(), ["a", "z"]);

        let json = mapper.write_to_string(&event).unwrap();
        assert_eq!(json, r#"{"labels":{"z":"1","a":"2"},"sorted":{"a":2,"z":1}}"#);
    }

    #[test]
    fn unknown_types_fail_loudly() {
        let mapper = Mapper::new();
        let err = mapper.read::<Unmapped>(r#"{"id":1}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Mapping);

        let err = mapper.read::<Person>("[1]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structure);

        let err = mapper.read_collection::<Person, _>(&b"[]"[..]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structure);
    }

    #[test]
    fn top_level_arrays() {
        let mapper = Mapper::new();
        let people = [Person::default(), Person { name: "b".into(), age: 1 }];
        let mut out = Vec::new();
        mapper.write_array(&people, &mut out).unwrap();
        assert_eq!(out, br#"[{"name":"","age":0},{"name":"b","age":1}]"#);

        let back = mapper.read_array::<Person, _>(out.as_slice()).unwrap();
        assert_eq!(back, people);

        let mut out = Vec::new();
        mapper.write_iter((1..=3).map(|n| n * 2_u8), &mut out).unwrap();
        let queue: VecDeque<u8> = mapper.read_collection(out.as_slice()).unwrap();
        assert_eq!(queue, [2, 4, 6]);
    }

    #[test]
    fn utf16_output_reads_back() {
        let mapper = MapperBuilder::new()
            .encoding(Encoding::Utf16Be)
            .buffer_strategy(BufferStrategy::Pooled)
            .buffer_size(16)
            .build();
        let person = Person {
            name: "\u{e9}t\u{e9}".into(),
            age: 30,
        };
        let mut out = Vec::new();
        mapper.write(&person, &mut out).unwrap();
        assert_eq!(&out[..4], [0, b'{', 0, b'"']);
        assert_eq!(mapper.read_from::<Person, _>(out.as_slice()).unwrap(), person);
    }

    #[test]
    fn streams_are_flushed_on_every_path() {
        let flushes = Arc::new(AtomicUsize::new(0));
        let mapper = MapperBuilder::new().close(true).build();

        let ok = CountingSink {
            flushes: flushes.clone(),
            fail: false,
        };
        mapper.write(&Person::default(), ok).unwrap();
        assert_eq!(flushes.load(Ordering::Relaxed), 1);

        let broken = CountingSink {
            flushes: flushes.clone(),
            fail: true,
        };
        let err = mapper.write(&"x".repeat(10_000), broken).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(flushes.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn pooled_read_buffers_survive_failed_reads() {
        let mapper = MapperBuilder::new().buffer_strategy(BufferStrategy::Pooled).build();
        let person = mapper.read_from::<Person, _>(&br#"{"age":1}"#[..]).unwrap();
        assert_eq!(person.age, 1);
        assert_eq!(mapper.inner.pool.len(), 1);

        let err = mapper.read_from::<Person, _>(Truncated(3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(mapper.inner.pool.len(), 1);
    }

    #[test]
    fn pretty_output_and_dynamic_writes() {
        let mapper = MapperBuilder::new().pretty(true).build();
        let text = mapper.write_to_string(&Person::default()).unwrap();
        assert!(text.contains("\n  \"name\""));

        let mut out = Vec::new();
        let err = mapper
            .write_dyn(&Person::default(), String::type_info(), &mut out)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invocation);

        let value = mapper.to_value(&json!({"raw": [1, 2]})).unwrap();
        assert_eq!(value, json!({"raw": [1, 2]}));
    }
}
