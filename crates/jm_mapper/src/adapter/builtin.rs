//! The lazily installed built-in adapters.

use core::fmt::Display;
use core::marker::PhantomData;
use core::str::FromStr;
use std::error::Error;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use jm_reflect::info::{TypeInfo, Typed};
use num_bigint::BigInt;
use url::Url;
use uuid::Uuid;

use crate::adapter::date::{DurationConverter, NaiveDateConverter, NaiveDateTimeConverter};
use crate::adapter::date::{NaiveTimeConverter, OffsetConverter};
use crate::adapter::{Adapter, CachedConverter, Converter, ConverterAdapter};
use crate::adapter::{DateTimeConverter, SystemTimeConverter};
use crate::locale::{Locale, LocaleConverter};
use crate::{ConvertError, DateFormat};

/// Locales seen by one mapper are few; this bounds each cache direction.
const LOCALE_CACHE_CAPACITY: usize = 256;

/// Converter through `Display` and `FromStr`.
struct ParseConverter<T>(PhantomData<fn() -> T>);

impl<T> ParseConverter<T> {
    const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Converter<T> for ParseConverter<T>
where
    T: Display + FromStr + 'static,
    T::Err: Error + Send + Sync + 'static,
{
    fn write(&self, value: &T) -> String {
        value.to_string()
    }

    fn read(&self, text: &str) -> Result<T, ConvertError> {
        text.trim().parse().map_err(ConvertError::wrap)
    }
}

struct PathConverter;

impl Converter<PathBuf> for PathConverter {
    fn write(&self, value: &PathBuf) -> String {
        value.to_string_lossy().into_owned()
    }

    fn read(&self, text: &str) -> Result<PathBuf, ConvertError> {
        Ok(PathBuf::from(text))
    }
}

#[inline]
fn erase<T: Typed, C: Converter<T>>(converter: C) -> Option<Arc<dyn Adapter>> {
    Some(Arc::new(ConverterAdapter::<T, C>::new(converter)))
}

/// Builds the built-in adapter of the type described by `info`, if any.
pub(crate) fn builtin_adapter(info: &'static TypeInfo, date_format: &DateFormat) -> Option<Arc<dyn Adapter>> {
    let ty = info.ty();
    if ty.is::<DateTime<Utc>>() {
        erase::<DateTime<Utc>, _>(DateTimeConverter::<Utc>::new(date_format.clone()))
    } else if ty.is::<DateTime<FixedOffset>>() {
        erase::<DateTime<FixedOffset>, _>(DateTimeConverter::<FixedOffset>::new(date_format.clone()))
    } else if ty.is::<SystemTime>() {
        erase::<SystemTime, _>(SystemTimeConverter::new(date_format.clone()))
    } else if ty.is::<NaiveDateTime>() {
        erase::<NaiveDateTime, _>(NaiveDateTimeConverter)
    } else if ty.is::<NaiveDate>() {
        erase::<NaiveDate, _>(NaiveDateConverter)
    } else if ty.is::<NaiveTime>() {
        erase::<NaiveTime, _>(NaiveTimeConverter)
    } else if ty.is::<FixedOffset>() {
        erase::<FixedOffset, _>(OffsetConverter)
    } else if ty.is::<Duration>() {
        erase::<Duration, _>(DurationConverter)
    } else if ty.is::<Url>() {
        erase::<Url, _>(ParseConverter::<Url>::new())
    } else if ty.is::<Uuid>() {
        erase::<Uuid, _>(ParseConverter::<Uuid>::new())
    } else if ty.is::<IpAddr>() {
        erase::<IpAddr, _>(ParseConverter::<IpAddr>::new())
    } else if ty.is::<BigDecimal>() {
        erase::<BigDecimal, _>(ParseConverter::<BigDecimal>::new())
    } else if ty.is::<BigInt>() {
        erase::<BigInt, _>(ParseConverter::<BigInt>::new())
    } else if ty.is::<PathBuf>() {
        erase::<PathBuf, _>(PathConverter)
    } else if ty.is::<Locale>() {
        erase::<Locale, _>(CachedConverter::new(LocaleConverter, LOCALE_CACHE_CAPACITY))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use core::str::FromStr;
    use std::net::IpAddr;

    use bigdecimal::BigDecimal;
    use jm_reflect::Reflect;
    use jm_reflect::info::Typed;
    use num_bigint::BigInt;
    use url::Url;
    use uuid::Uuid;

    use super::builtin_adapter;
    use crate::{DateFormat, Locale};

    fn round_trip<T: Typed + PartialEq + core::fmt::Debug>(value: T) -> String {
        let adapter = builtin_adapter(T::type_info(), &DateFormat::default()).unwrap();
        let text = adapter.to_text(&value).unwrap();
        let back: Box<dyn Reflect> = adapter.from_text(&text).unwrap();
        assert_eq!(back.take::<T>().ok(), Some(value));
        text
    }

    #[test]
    fn scalar_adapters_are_idempotent() {
        assert_eq!(round_trip(BigDecimal::from_str("1.50").unwrap()), "1.50");
        assert_eq!(round_trip(BigDecimal::from_str("0").unwrap()), "0");
        round_trip(BigInt::from_str("-123456789012345678901234567890").unwrap());
        round_trip(Url::parse("https://example.com/a?b=c").unwrap());
        round_trip(Uuid::nil());
        round_trip("::1".parse::<IpAddr>().unwrap());
        assert_eq!(round_trip(Locale::new("en").with_country("GB")), "en-GB");
    }

    #[test]
    fn unknown_types_have_no_builtin() {
        assert!(builtin_adapter(String::type_info(), &DateFormat::default()).is_none());
    }
}
