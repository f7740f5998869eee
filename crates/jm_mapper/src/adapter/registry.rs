use core::any::TypeId;
use core::fmt;
use std::sync::Arc;

use jm_reflect::info::{TypeInfo, Typed};
use jm_utils::{PublishMap, TypeIdMap};

use crate::DateFormat;
use crate::adapter::builtin::builtin_adapter;
use crate::adapter::{Adapter, AdapterKey, Converter, ConverterAdapter, EnumAdapter, FallbackAdapter};
use crate::adapter::{ObjectAdapter, ObjectConverter, ObjectConverterAdapter};

/// A resolved registry entry.
#[derive(Clone)]
pub enum AdapterSlot {
    Found(Arc<dyn Adapter>),
    /// The type is known to have no adapter.
    Absent,
}

/// Text adapters keyed by [`AdapterKey`], plus object adapters keyed by
/// value type.
///
/// User adapters are inserted when the mapper is built and always win.
/// Built-in and enum adapters are created on first lookup and published;
/// a type without any adapter is published as [`AdapterSlot::Absent`] so
/// later lookups return at once.
pub struct AdapterRegistry {
    slots: PublishMap<AdapterKey, AdapterSlot>,
    objects: TypeIdMap<Arc<dyn ObjectAdapter>>,
    date_format: DateFormat,
}

impl AdapterRegistry {
    pub fn new(date_format: DateFormat) -> Self {
        Self {
            slots: PublishMap::default(),
            objects: TypeIdMap::new(),
            date_format,
        }
    }

    /// Registers a user converter, replacing any previous one for `T`.
    pub fn register<T: Typed, C: Converter<T>>(&mut self, converter: C) {
        let adapter: Arc<dyn Adapter> = Arc::new(ConverterAdapter::<T, C>::new(converter));
        self.register_adapter(adapter);
    }

    pub fn register_adapter(&mut self, adapter: Arc<dyn Adapter>) {
        let key = AdapterKey::text_of(adapter.type_info().type_id());
        self.slots.insert(key, AdapterSlot::Found(adapter));
    }

    pub fn register_object<T: Typed, C: ObjectConverter<T>>(&mut self, converter: C) {
        let adapter: Arc<dyn ObjectAdapter> = Arc::new(ObjectConverterAdapter::<T, C>::new(converter));
        self.objects.insert(TypeId::of::<T>(), adapter);
    }

    /// The text adapter of the type described by `info`.
    pub fn find(&self, info: &'static TypeInfo) -> Option<Arc<dyn Adapter>> {
        let key = AdapterKey::text_of(info.type_id());
        if let Some(slot) = self.slots.get(&key) {
            return match slot {
                AdapterSlot::Found(adapter) => Some(adapter),
                AdapterSlot::Absent => {
                    log::trace!("no adapter for `{}` (cached)", info.type_path());
                    None
                }
            };
        }

        let slot = match self.derive(info) {
            Some(adapter) => {
                log::debug!("built adapter for `{}`", info.type_path());
                AdapterSlot::Found(adapter)
            }
            None => AdapterSlot::Absent,
        };
        match self.slots.publish(key, slot) {
            AdapterSlot::Found(adapter) => Some(adapter),
            AdapterSlot::Absent => None,
        }
    }

    /// Like [`find`](Self::find), falling back to a [`FallbackAdapter`].
    pub fn find_or_fallback(&self, info: &'static TypeInfo) -> Arc<dyn Adapter> {
        match self.find(info) {
            Some(adapter) => adapter,
            None => Arc::new(FallbackAdapter::new(info)),
        }
    }

    /// The user-registered object adapter of `type_id`.
    #[inline]
    pub fn find_object(&self, type_id: TypeId) -> Option<Arc<dyn ObjectAdapter>> {
        self.objects.get(&type_id).cloned()
    }

    /// Number of published text slots, absent ones included.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn derive(&self, info: &'static TypeInfo) -> Option<Arc<dyn Adapter>> {
        match info {
            TypeInfo::Enum(_) => EnumAdapter::new(info).map(|adapter| Arc::new(adapter) as Arc<dyn Adapter>),
            TypeInfo::Opaque(_) => builtin_adapter(info, &self.date_format),
            _ => None,
        }
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("slots", &self.slots.len())
            .field("objects", &self.objects.len())
            .field("date_format", &self.date_format)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{DateTime, TimeZone, Utc};
    use jm_reflect::Reflect;
    use jm_reflect::derive::Reflect;
    use jm_reflect::info::{TypeInfo, Typed};

    use super::AdapterRegistry;
    use crate::adapter::{Adapter, Converter};
    use crate::{ConvertError, DateFormat, MapperError};

    #[derive(Reflect)]
    struct Point {
        x: i32,
    }

    #[derive(Reflect, Debug, PartialEq)]
    enum Color {
        Red,
    }

    struct Epoch;

    impl Converter<DateTime<Utc>> for Epoch {
        fn write(&self, value: &DateTime<Utc>) -> String {
            value.timestamp().to_string()
        }

        fn read(&self, text: &str) -> Result<DateTime<Utc>, ConvertError> {
            let secs = text.parse().map_err(ConvertError::wrap)?;
            Utc.timestamp_opt(secs, 0)
                .single()
                .ok_or_else(|| ConvertError::new("out of range"))
        }
    }

    struct CountingAdapter {
        derived: Arc<AtomicUsize>,
    }

    impl Adapter for CountingAdapter {
        fn type_info(&self) -> &'static TypeInfo {
            Point::type_info()
        }

        fn to_text(&self, _value: &dyn Reflect) -> Result<String, MapperError> {
            self.derived.fetch_add(1, Ordering::Relaxed);
            Ok(String::new())
        }

        fn from_text(&self, _text: &str) -> Result<Box<dyn Reflect>, MapperError> {
            Ok(Box::new(Point { x: 0 }))
        }
    }

    #[test]
    fn user_converters_win_over_builtins() {
        let mut registry = AdapterRegistry::new(DateFormat::Iso8601Short);
        let instant = Utc.with_ymd_and_hms(2007, 12, 3, 10, 15, 30).unwrap();

        let builtin = registry.find(<DateTime<Utc>>::type_info()).unwrap();
        assert_eq!(builtin.to_text(&instant).unwrap(), "2007-12-03T10:15:30Z");

        registry.register::<DateTime<Utc>, _>(Epoch);
        let user = registry.find(<DateTime<Utc>>::type_info()).unwrap();
        assert_eq!(user.to_text(&instant).unwrap(), "1196676930");
    }

    #[test]
    fn absent_types_are_remembered() {
        let registry = AdapterRegistry::new(DateFormat::default());
        assert!(registry.find(Point::type_info()).is_none());
        assert_eq!(registry.len(), 1);
        assert!(registry.find(Point::type_info()).is_none());
        assert_eq!(registry.len(), 1);

        let fallback = registry.find_or_fallback(Point::type_info());
        assert!(fallback.from_text("x").is_err());
    }

    #[test]
    fn enums_and_registered_classes_resolve() {
        let mut registry = AdapterRegistry::new(DateFormat::default());
        let color = registry.find(Color::type_info()).unwrap();
        assert_eq!(color.to_text(&Color::Red).unwrap(), "Red");

        let derived = Arc::new(AtomicUsize::new(0));
        registry.register_adapter(Arc::new(CountingAdapter {
            derived: derived.clone(),
        }));
        let point = registry.find(Point::type_info()).unwrap();
        point.to_text(&Point { x: 1 }).unwrap();
        assert_eq!(derived.load(Ordering::Relaxed), 1);
    }
}
