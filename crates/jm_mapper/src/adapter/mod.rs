//! Scalar and object converters.
//!
//! - [`Converter`] turns a value into text and back. It is erased into an
//!   [`Adapter`] keyed by an [`AdapterKey`].
//! - [`ObjectConverter`] owns the whole JSON form of a value. It is erased
//!   into an [`ObjectAdapter`].
//!
//! A property can pin its converter with the [`UseConverter`] or
//! [`UseObjectConverter`] attribute.

// -----------------------------------------------------------------------------
// Modules

mod builtin;
mod cache;
mod date;
mod enums;
mod fallback;
mod registry;

// -----------------------------------------------------------------------------
// Exports

pub use cache::CachedConverter;
pub use date::{DateTimeConverter, DateTimeZone, SystemTimeConverter, parse_date_time};
pub use enums::EnumAdapter;
pub use fallback::FallbackAdapter;
pub use registry::{AdapterRegistry, AdapterSlot};

use core::any::TypeId;
use core::fmt;
use core::marker::PhantomData;
use std::sync::Arc;

use jm_reflect::info::{TypeInfo, Typed};
use jm_reflect::{AccessError, Reflect};
use serde_json::Value;

use crate::{ConvertError, Mapper, MapperError};

// -----------------------------------------------------------------------------
// Typed converters

/// Converts `T` to text and back.
///
/// ```
/// use jm_mapper::{ConvertError, Converter};
///
/// struct Celsius;
///
/// impl Converter<f64> for Celsius {
///     fn write(&self, value: &f64) -> String {
///         format!("{value}C")
///     }
///
///     fn read(&self, text: &str) -> Result<f64, ConvertError> {
///         let number = text.strip_suffix('C').ok_or_else(|| ConvertError::new("missing unit"))?;
///         number.parse().map_err(ConvertError::wrap)
///     }
/// }
///
/// assert_eq!(Celsius.read(&Celsius.write(&21.5)).unwrap(), 21.5);
/// ```
pub trait Converter<T>: Send + Sync + 'static {
    fn write(&self, value: &T) -> String;

    fn read(&self, text: &str) -> Result<T, ConvertError>;
}

/// Converts `T` to a JSON value and back, with access to the mapper for
/// nested values.
pub trait ObjectConverter<T>: Send + Sync + 'static {
    fn write(&self, value: &T, mapper: &Mapper) -> Result<Value, MapperError>;

    fn read(&self, value: &Value, mapper: &Mapper) -> Result<T, MapperError>;
}

// -----------------------------------------------------------------------------
// Erased adapters

/// Identifies a conversion: the value type and the type it converts to.
///
/// Text adapters use `to = TypeId::of::<String>()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AdapterKey {
    pub from: TypeId,
    pub to: TypeId,
}

impl AdapterKey {
    /// The key of the text adapter of `T`.
    #[inline]
    pub fn text<T: 'static>() -> Self {
        Self::text_of(TypeId::of::<T>())
    }

    #[inline]
    pub fn text_of(from: TypeId) -> Self {
        Self {
            from,
            to: TypeId::of::<String>(),
        }
    }
}

/// A type-erased [`Converter`].
pub trait Adapter: Send + Sync + 'static {
    /// The value type handled by this adapter.
    fn type_info(&self) -> &'static TypeInfo;

    fn to_text(&self, value: &dyn Reflect) -> Result<String, MapperError>;

    fn from_text(&self, text: &str) -> Result<Box<dyn Reflect>, MapperError>;
}

/// A type-erased [`ObjectConverter`].
pub trait ObjectAdapter: Send + Sync + 'static {
    fn type_info(&self) -> &'static TypeInfo;

    fn to_value(&self, value: &dyn Reflect, mapper: &Mapper) -> Result<Value, MapperError>;

    fn from_value(&self, value: &Value, mapper: &Mapper) -> Result<Box<dyn Reflect>, MapperError>;
}

/// Erases a [`Converter<T>`].
pub(crate) struct ConverterAdapter<T, C> {
    converter: C,
    _marker: PhantomData<fn() -> T>,
}

impl<T, C> ConverterAdapter<T, C> {
    #[inline]
    pub(crate) fn new(converter: C) -> Self {
        Self {
            converter,
            _marker: PhantomData,
        }
    }
}

impl<T: Typed, C: Converter<T>> Adapter for ConverterAdapter<T, C> {
    #[inline]
    fn type_info(&self) -> &'static TypeInfo {
        T::type_info()
    }

    fn to_text(&self, value: &dyn Reflect) -> Result<String, MapperError> {
        let value = value
            .downcast_ref::<T>()
            .ok_or_else(|| AccessError::mismatch::<T>(value))?;
        Ok(self.converter.write(value))
    }

    fn from_text(&self, text: &str) -> Result<Box<dyn Reflect>, MapperError> {
        match self.converter.read(text) {
            Ok(value) => Ok(Box::new(value)),
            Err(source) => Err(MapperError::Conversion {
                type_path: T::type_info().type_path(),
                text: text.to_owned(),
                source,
            }),
        }
    }
}

/// Erases an [`ObjectConverter<T>`].
pub(crate) struct ObjectConverterAdapter<T, C> {
    converter: C,
    _marker: PhantomData<fn() -> T>,
}

impl<T, C> ObjectConverterAdapter<T, C> {
    #[inline]
    pub(crate) fn new(converter: C) -> Self {
        Self {
            converter,
            _marker: PhantomData,
        }
    }
}

impl<T: Typed, C: ObjectConverter<T>> ObjectAdapter for ObjectConverterAdapter<T, C> {
    #[inline]
    fn type_info(&self) -> &'static TypeInfo {
        T::type_info()
    }

    fn to_value(&self, value: &dyn Reflect, mapper: &Mapper) -> Result<Value, MapperError> {
        let value = value
            .downcast_ref::<T>()
            .ok_or_else(|| AccessError::mismatch::<T>(value))?;
        self.converter.write(value, mapper)
    }

    fn from_value(&self, value: &Value, mapper: &Mapper) -> Result<Box<dyn Reflect>, MapperError> {
        Ok(Box::new(self.converter.read(value, mapper)?))
    }
}

// -----------------------------------------------------------------------------
// Member attributes

/// Pins the text converter of a property or constructor parameter.
///
/// ```
/// use jm_mapper::{ConvertError, Converter, Mapper, UseConverter};
/// use jm_reflect::derive::Reflect;
///
/// struct Hex;
///
/// impl Converter<u32> for Hex {
///     fn write(&self, value: &u32) -> String {
///         format!("{value:x}")
///     }
///
///     fn read(&self, text: &str) -> Result<u32, ConvertError> {
///         u32::from_str_radix(text, 16).map_err(ConvertError::wrap)
///     }
/// }
///
/// #[derive(Reflect, Default)]
/// #[reflect(default)]
/// struct Color {
///     #[reflect(@UseConverter::new::<u32, _>(Hex))]
///     rgb: u32,
/// }
///
/// let mapper = Mapper::new();
/// let json = mapper.write_to_string(&Color { rgb: 0xff8800 }).unwrap();
/// assert_eq!(json, r#"{"rgb":"ff8800"}"#);
/// assert_eq!(mapper.read::<Color>(&json).unwrap().rgb, 0xff8800);
/// ```
///
/// The converter also applies to the items of an `Option`, `Box`, list or
/// map value of the converted type.
#[derive(Clone)]
pub struct UseConverter(pub(crate) Arc<dyn Adapter>);

impl UseConverter {
    pub fn new<T: Typed, C: Converter<T>>(converter: C) -> Self {
        Self(Arc::new(ConverterAdapter::<T, C>::new(converter)))
    }
}

impl fmt::Debug for UseConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UseConverter({})", self.0.type_info().type_path())
    }
}

/// Pins the object converter of a property or constructor parameter.
#[derive(Clone)]
pub struct UseObjectConverter(pub(crate) Arc<dyn ObjectAdapter>);

impl UseObjectConverter {
    pub fn new<T: Typed, C: ObjectConverter<T>>(converter: C) -> Self {
        Self(Arc::new(ObjectConverterAdapter::<T, C>::new(converter)))
    }
}

impl fmt::Debug for UseObjectConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UseObjectConverter({})", self.0.type_info().type_path())
    }
}

/// The converter resolved for one property.
#[derive(Clone)]
pub enum MemberConverter {
    Text(Arc<dyn Adapter>),
    Object(Arc<dyn ObjectAdapter>),
}

impl MemberConverter {
    /// Whether the converter handles values described by `info`.
    #[inline]
    pub fn applies_to(&self, info: &TypeInfo) -> bool {
        let own = match self {
            Self::Text(adapter) => adapter.type_info(),
            Self::Object(adapter) => adapter.type_info(),
        };
        own.type_id() == info.type_id()
    }
}

impl fmt::Debug for MemberConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(adapter) => write!(f, "Text({})", adapter.type_info().type_path()),
            Self::Object(adapter) => write!(f, "Object({})", adapter.type_info().type_path()),
        }
    }
}
