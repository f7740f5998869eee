use core::fmt::Write;
use core::marker::PhantomData;
use std::time::{Duration, SystemTime};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, SecondsFormat};
use chrono::{TimeZone, Utc};

use crate::adapter::Converter;
use crate::{ConvertError, DateFormat};

// -----------------------------------------------------------------------------
// Formatting

fn format_date_time(value: &DateTime<FixedOffset>, format: &DateFormat) -> String {
    match format {
        DateFormat::Compact => value.format("%Y%m%d%H%M%S%z").to_string(),
        DateFormat::Iso8601 => value.to_rfc3339_opts(SecondsFormat::Millis, true),
        DateFormat::Iso8601Short => value.to_rfc3339_opts(SecondsFormat::Secs, true),
        DateFormat::Pattern(pattern) => {
            let mut out = String::new();
            if is_valid_pattern(pattern) && write!(out, "{}", value.format(pattern)).is_ok() {
                out
            } else {
                log::warn!("invalid date pattern {pattern:?}, writing RFC 3339");
                value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
            }
        }
    }
}

fn is_valid_pattern(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

// -----------------------------------------------------------------------------
// Tolerant parsing

/// Parses a date-time written in any of the supported forms.
///
/// The configured `pattern` is tried first, then RFC 3339, then a set of
/// fixed forms picked by the shape of the text:
///
/// - `2007-12-03T10:15:30`, with optional fraction and offset;
/// - `2007-12-03 10:15:30`, with optional fraction and offset;
/// - `20071203101530` and `20071203T101530`, with optional fraction and offset;
/// - `2007-12-03` and `20071203`, at midnight.
///
/// An offset is `Z`, `±HH:MM` or `±HHMM`; without one the time is UTC.
/// A pattern with no time part reads as midnight, one with no date part
/// as a time on 1970-01-01.
///
/// ```
/// use jm_mapper::adapter::parse_date_time;
///
/// let compact = parse_date_time("20071203101530Z", None).unwrap();
/// let iso = parse_date_time("2007-12-03T10:15:30Z", None).unwrap();
/// assert_eq!(compact, iso);
///
/// let shifted = parse_date_time("2007-12-03T11:15:30+01:00", None).unwrap();
/// assert_eq!(shifted, iso);
/// ```
pub fn parse_date_time(text: &str, pattern: Option<&str>) -> Result<DateTime<FixedOffset>, ConvertError> {
    let text = text.trim();

    if let Some(pattern) = pattern {
        if let Ok(value) = DateTime::parse_from_str(text, pattern) {
            return Ok(value);
        }
        if let Ok(value) = NaiveDateTime::parse_from_str(text, pattern) {
            return Ok(value.and_utc().fixed_offset());
        }
        // Patterns without a time part, or without a date part.
        if let Ok(date) = NaiveDate::parse_from_str(text, pattern) {
            return Ok(date.and_time(NaiveTime::MIN).and_utc().fixed_offset());
        }
        if let Ok(time) = NaiveTime::parse_from_str(text, pattern) {
            return Ok(NaiveDate::default().and_time(time).and_utc().fixed_offset());
        }
    }
    if let Ok(value) = DateTime::parse_from_rfc3339(text) {
        return Ok(value);
    }

    let (body, offset) = split_offset(text);
    let offset = offset.unwrap_or_else(utc);
    let local = parse_naive(body)
        .ok_or_else(|| ConvertError::new(format!("unrecognized date-time {text:?}")))?;
    offset
        .from_local_datetime(&local)
        .single()
        .ok_or_else(|| ConvertError::new(format!("ambiguous local time {text:?}")))
}

#[inline]
fn utc() -> FixedOffset {
    Utc.fix()
}

/// Splits a trailing `Z`, `±HH:MM` or `±HHMM`.
fn split_offset(text: &str) -> (&str, Option<FixedOffset>) {
    if let Some(body) = text.strip_suffix(['Z', 'z']) {
        return (body, Some(utc()));
    }
    for width in [6, 5] {
        let Some(split) = text.len().checked_sub(width) else {
            continue;
        };
        if !text.is_char_boundary(split) {
            continue;
        }
        let (body, tail) = text.split_at(split);
        if let Some(offset) = parse_offset(tail) {
            return (body, Some(offset));
        }
    }
    (text, None)
}

fn parse_offset(text: &str) -> Option<FixedOffset> {
    let bytes = text.as_bytes();
    let sign = match bytes.first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let digits = match bytes.len() {
        6 if bytes[3] == b':' => [bytes[1], bytes[2], bytes[4], bytes[5]],
        5 => [bytes[1], bytes[2], bytes[3], bytes[4]],
        _ => return None,
    };
    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let number = |a: u8, b: u8| i32::from(a - b'0') * 10 + i32::from(b - b'0');
    let hours = number(digits[0], digits[1]);
    let minutes = number(digits[2], digits[3]);
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn parse_naive(body: &str) -> Option<NaiveDateTime> {
    if body.contains('-') {
        let formats: &[&str] = if body.contains('T') {
            &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        } else if body.contains(' ') {
            &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        } else {
            return NaiveDate::parse_from_str(body, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0));
        };
        return formats
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(body, format).ok());
    }
    parse_compact(body)
}

/// `yyyyMMdd[T]HHmmss[.fff]` or `yyyyMMdd`.
fn parse_compact(body: &str) -> Option<NaiveDateTime> {
    let (main, fraction) = match body.split_once(['.', ',']) {
        Some((main, fraction)) => (main, Some(fraction)),
        None => (body, None),
    };
    let digits: String = match main.len() {
        15 if main.as_bytes()[8] == b'T' => main.chars().filter(|c| *c != 'T').collect(),
        14 | 8 => main.to_owned(),
        _ => return None,
    };
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let field = |range: core::ops::Range<usize>| digits[range].parse::<u32>().ok();
    let date = NaiveDate::from_ymd_opt(field(0..4)? as i32, field(4..6)?, field(6..8)?)?;
    if digits.len() == 8 {
        return fraction.is_none().then(|| date.and_hms_opt(0, 0, 0)).flatten();
    }
    let nanos = match fraction {
        Some(fraction) => parse_fraction(fraction)?,
        None => 0,
    };
    date.and_hms_nano_opt(field(8..10)?, field(10..12)?, field(12..14)?, nanos)
}

fn parse_fraction(fraction: &str) -> Option<u32> {
    if fraction.is_empty() || fraction.len() > 9 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u32 = fraction.parse().ok()?;
    Some(value * 10_u32.pow(9 - fraction.len() as u32))
}

// -----------------------------------------------------------------------------
// Zoned converters

/// Time zones a [`DateTimeConverter`] can produce.
pub trait DateTimeZone: TimeZone + Send + Sync + 'static {
    fn from_fixed(value: DateTime<FixedOffset>) -> DateTime<Self>;
}

impl DateTimeZone for Utc {
    #[inline]
    fn from_fixed(value: DateTime<FixedOffset>) -> DateTime<Self> {
        value.with_timezone(&Utc)
    }
}

impl DateTimeZone for FixedOffset {
    #[inline]
    fn from_fixed(value: DateTime<FixedOffset>) -> DateTime<Self> {
        value
    }
}

/// Date-time adapter: writes the configured [`DateFormat`], reads any
/// form accepted by [`parse_date_time`].
pub struct DateTimeConverter<Tz> {
    format: DateFormat,
    _marker: PhantomData<fn() -> Tz>,
}

impl<Tz> DateTimeConverter<Tz> {
    pub fn new(format: DateFormat) -> Self {
        Self {
            format,
            _marker: PhantomData,
        }
    }

    fn pattern(&self) -> Option<&str> {
        match &self.format {
            DateFormat::Pattern(pattern) => Some(pattern),
            _ => None,
        }
    }
}

impl<Tz: DateTimeZone> Converter<DateTime<Tz>> for DateTimeConverter<Tz> {
    fn write(&self, value: &DateTime<Tz>) -> String {
        format_date_time(&value.fixed_offset(), &self.format)
    }

    fn read(&self, text: &str) -> Result<DateTime<Tz>, ConvertError> {
        parse_date_time(text, self.pattern()).map(Tz::from_fixed)
    }
}

/// [`SystemTime`] through its UTC date-time.
pub struct SystemTimeConverter(DateTimeConverter<Utc>);

impl SystemTimeConverter {
    pub fn new(format: DateFormat) -> Self {
        Self(DateTimeConverter::new(format))
    }
}

impl Converter<SystemTime> for SystemTimeConverter {
    fn write(&self, value: &SystemTime) -> String {
        self.0.write(&DateTime::<Utc>::from(*value))
    }

    fn read(&self, text: &str) -> Result<SystemTime, ConvertError> {
        self.0.read(text).map(SystemTime::from)
    }
}

// -----------------------------------------------------------------------------
// Local converters

pub(crate) struct NaiveDateTimeConverter;

impl Converter<NaiveDateTime> for NaiveDateTimeConverter {
    fn write(&self, value: &NaiveDateTime) -> String {
        value.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
    }

    fn read(&self, text: &str) -> Result<NaiveDateTime, ConvertError> {
        let (body, _) = split_offset(text.trim());
        parse_naive(body).ok_or_else(|| ConvertError::new(format!("unrecognized date-time {text:?}")))
    }
}

pub(crate) struct NaiveDateConverter;

impl Converter<NaiveDate> for NaiveDateConverter {
    fn write(&self, value: &NaiveDate) -> String {
        value.format("%Y-%m-%d").to_string()
    }

    fn read(&self, text: &str) -> Result<NaiveDate, ConvertError> {
        let text = text.trim();
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .or_else(|| parse_compact(text).map(|value| value.date()))
            .ok_or_else(|| ConvertError::new(format!("unrecognized date {text:?}")))
    }
}

pub(crate) struct NaiveTimeConverter;

impl Converter<NaiveTime> for NaiveTimeConverter {
    fn write(&self, value: &NaiveTime) -> String {
        value.format("%H:%M:%S%.f").to_string()
    }

    fn read(&self, text: &str) -> Result<NaiveTime, ConvertError> {
        let text = text.trim();
        ["%H:%M:%S%.f", "%H:%M", "%H%M%S%.f"]
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(text, format).ok())
            .ok_or_else(|| ConvertError::new(format!("unrecognized time {text:?}")))
    }
}

pub(crate) struct OffsetConverter;

impl Converter<FixedOffset> for OffsetConverter {
    fn write(&self, value: &FixedOffset) -> String {
        if value.local_minus_utc() == 0 {
            "Z".to_owned()
        } else {
            value.to_string()
        }
    }

    fn read(&self, text: &str) -> Result<FixedOffset, ConvertError> {
        match split_offset(text.trim()) {
            ("", Some(offset)) => Ok(offset),
            _ => Err(ConvertError::new(format!("unrecognized offset {text:?}"))),
        }
    }
}

/// ISO-8601 `PTnS` durations, e.g. `PT1.5S`. Reading also accepts hours
/// and minutes (`PT1H2M3S`).
pub(crate) struct DurationConverter;

impl Converter<Duration> for DurationConverter {
    fn write(&self, value: &Duration) -> String {
        let nanos = value.subsec_nanos();
        if nanos == 0 {
            return format!("PT{}S", value.as_secs());
        }
        let fraction = format!("{nanos:09}");
        format!("PT{}.{}S", value.as_secs(), fraction.trim_end_matches('0'))
    }

    fn read(&self, text: &str) -> Result<Duration, ConvertError> {
        let invalid = || ConvertError::new(format!("unrecognized duration {text:?}"));
        let mut rest = text.trim().strip_prefix("PT").ok_or_else(invalid)?;
        if rest.is_empty() {
            return Err(invalid());
        }
        let mut total = Duration::ZERO;
        while !rest.is_empty() {
            let end = rest.find(['H', 'M', 'S']).ok_or_else(invalid)?;
            let (number, unit) = (&rest[..end], rest.as_bytes()[end]);
            rest = &rest[end + 1..];
            let scaled = |scale: u64| -> Result<Duration, ConvertError> {
                let count: u64 = number.parse().map_err(|_| invalid())?;
                count.checked_mul(scale).map(Duration::from_secs).ok_or_else(invalid)
            };
            let part = match unit {
                b'H' => scaled(3600)?,
                b'M' => scaled(60)?,
                _ => {
                    let (secs, fraction) = number.split_once('.').unwrap_or((number, ""));
                    let secs: u64 = secs.parse().map_err(|_| invalid())?;
                    let nanos = match fraction {
                        "" => 0,
                        fraction => parse_fraction(fraction).ok_or_else(invalid)?,
                    };
                    Duration::new(secs, nanos)
                }
            };
            total = total.checked_add(part).ok_or_else(invalid)?;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

    use super::{DateTimeConverter, DurationConverter, NaiveDateConverter, OffsetConverter};
    use super::{SystemTimeConverter, parse_date_time};
    use crate::DateFormat;
    use crate::adapter::Converter;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2007, 12, 3, 10, 15, 30).unwrap()
    }

    #[test]
    fn short_iso_writes_and_compact_reads_the_same_instant() {
        let converter = DateTimeConverter::<Utc>::new(DateFormat::Iso8601Short);
        assert_eq!(converter.write(&instant()), "2007-12-03T10:15:30Z");
        assert_eq!(converter.read("20071203101530Z").unwrap(), instant());
    }

    #[test]
    fn every_format_round_trips() {
        let formats = [
            DateFormat::Compact,
            DateFormat::Iso8601,
            DateFormat::Iso8601Short,
            DateFormat::Pattern("%d/%m/%Y %H:%M:%S %z".into()),
        ];
        for format in formats {
            let converter = DateTimeConverter::<Utc>::new(format.clone());
            let text = converter.write(&instant());
            assert_eq!(converter.read(&text).unwrap(), instant(), "{format:?} wrote {text}");
        }
        let compact = DateTimeConverter::<Utc>::new(DateFormat::Compact);
        assert_eq!(compact.write(&instant()), "20071203101530+0000");
    }

    #[test]
    fn patterns_without_a_time_part_read_back_at_midnight() {
        let converter = DateTimeConverter::<Utc>::new(DateFormat::Pattern("%d/%m/%Y".into()));
        let text = converter.write(&instant());
        assert_eq!(text, "03/12/2007");
        let midnight = Utc.with_ymd_and_hms(2007, 12, 3, 0, 0, 0).unwrap();
        assert_eq!(converter.read(&text).unwrap(), midnight);
        assert_eq!(converter.write(&midnight), text);

        let clock = DateTimeConverter::<Utc>::new(DateFormat::Pattern("%H.%M.%S".into()));
        assert_eq!(clock.write(&instant()), "10.15.30");
        let time = clock.read("10.15.30").unwrap();
        assert_eq!(time, Utc.with_ymd_and_hms(1970, 1, 1, 10, 15, 30).unwrap());
    }

    #[test]
    fn foreign_forms_are_accepted() {
        let expected = instant().fixed_offset();
        for text in [
            "2007-12-03T10:15:30.000Z",
            "2007-12-03T10:15:30",
            "2007-12-03 10:15:30Z",
            "2007-12-03T12:15:30+02:00",
            "20071203T101530Z",
            "20071203101530.000+0000",
            "20071203051530-0500",
        ] {
            assert_eq!(parse_date_time(text, None).unwrap(), expected, "{text}");
        }
        let midnight = parse_date_time("20071203", None).unwrap();
        assert_eq!(midnight.date_naive(), NaiveDate::from_ymd_opt(2007, 12, 3).unwrap());
        assert!(parse_date_time("yesterday", None).is_err());
        assert!(parse_date_time("20071303101530", None).is_err());
    }

    #[test]
    fn offsets_are_preserved_for_fixed_zones() {
        let converter = DateTimeConverter::<FixedOffset>::new(DateFormat::Iso8601Short);
        let value = converter.read("2007-12-03T10:15:30+01:00").unwrap();
        assert_eq!(value.offset().local_minus_utc(), 3600);
        assert_eq!(converter.write(&value), "2007-12-03T10:15:30+01:00");
    }

    #[test]
    fn epoch_system_time_round_trips() {
        let converter = SystemTimeConverter::new(DateFormat::Iso8601);
        let text = converter.write(&SystemTime::UNIX_EPOCH);
        assert_eq!(text, "1970-01-01T00:00:00.000Z");
        assert_eq!(converter.read(&text).unwrap(), SystemTime::UNIX_EPOCH);
    }

    #[test]
    fn durations_and_offsets() {
        let value = Duration::new(90, 500_000_000);
        assert_eq!(DurationConverter.write(&value), "PT90.5S");
        assert_eq!(DurationConverter.read("PT90.5S").unwrap(), value);
        assert_eq!(DurationConverter.read("PT1H1M").unwrap(), Duration::from_secs(3660));
        assert!(DurationConverter.read("P1D").is_err());
        assert!(DurationConverter.read("PT1H18446744073709551615S").is_err());
        assert!(DurationConverter.read("PT5124095576030432H").is_err());
        assert!(DurationConverter.read("PT307445734561825861M").is_err());

        let offset = OffsetConverter.read("+05:30").unwrap();
        assert_eq!(offset.local_minus_utc(), 19800);
        assert_eq!(OffsetConverter.write(&offset), "+05:30");
        assert_eq!(OffsetConverter.read("Z").unwrap().local_minus_utc(), 0);

        let date = NaiveDateConverter.read("20071203").unwrap();
        assert_eq!(NaiveDateConverter.write(&date), "2007-12-03");
    }
}
