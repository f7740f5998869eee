//! Immutable mapper settings.
//!
//! A [`MapperConfig`] is produced by [`MapperBuilder`](crate::MapperBuilder)
//! and shared by every clone of the [`Mapper`](crate::Mapper).

use core::cmp::Ordering;
use core::fmt;
use std::sync::Arc;

use crate::access::AccessMode;

// -----------------------------------------------------------------------------
// Options

/// How the mapper buffers output streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferStrategy {
    /// A fresh buffer per call.
    #[default]
    PerCall,
    /// Buffers are recycled through a bounded pool owned by the mapper.
    Pooled,
}

/// Character encoding of byte streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
}

/// JSON form of `Vec<u8>` and `[u8; N]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinaryStrategy {
    /// An array of numbers.
    Array,
    /// Standard base64 text.
    #[default]
    Base64,
    /// URL-safe base64 text.
    Base64Url,
}

/// Output format of date-time adapters. Input is always parsed tolerantly.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DateFormat {
    /// `yyyyMMddHHmmssZ`, e.g. `20071203101530+0000`.
    #[default]
    Compact,
    /// `2007-12-03T10:15:30.000Z`
    Iso8601,
    /// `2007-12-03T10:15:30Z`
    Iso8601Short,
    /// A strftime pattern as understood by `chrono`.
    Pattern(String),
}

/// Comparator on property names.
pub type AttributeOrder = Arc<dyn Fn(&str, &str) -> Ordering + Send + Sync>;

/// Which access strategy discovers the properties of a class.
#[derive(Clone, Default)]
pub enum AccessModeKind {
    /// Fields only.
    Field,
    /// Bean-style getters and setters; records through their accessors.
    Method,
    /// Every getter is a reader and the canonical constructor the only way in.
    Record,
    /// Fields and methods merged per property.
    #[default]
    FieldAndMethod,
    Custom(Arc<dyn AccessMode>),
}

impl fmt::Debug for AccessModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field => f.write_str("Field"),
            Self::Method => f.write_str("Method"),
            Self::Record => f.write_str("Record"),
            Self::FieldAndMethod => f.write_str("FieldAndMethod"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

// -----------------------------------------------------------------------------
// MapperConfig

/// Settings shared by every operation of a mapper.
#[derive(Clone)]
pub struct MapperConfig {
    pub(crate) access_mode: Arc<dyn AccessMode>,
    pub(crate) version: Option<u32>,
    pub(crate) pretty: bool,
    pub(crate) skip_null: bool,
    pub(crate) skip_empty_array: bool,
    pub(crate) attribute_order: Option<AttributeOrder>,
    pub(crate) buffer_size: usize,
    pub(crate) buffer_strategy: BufferStrategy,
    pub(crate) encoding: Encoding,
    pub(crate) binary_strategy: BinaryStrategy,
    pub(crate) close: bool,
    pub(crate) date_format: DateFormat,
    pub(crate) fail_on_unknown_properties: bool,
}

impl MapperConfig {
    #[inline]
    pub fn access_mode(&self) -> &dyn AccessMode {
        &*self.access_mode
    }

    /// API version used to gate properties tagged with `Since`.
    #[inline]
    pub fn version(&self) -> Option<u32> {
        self.version
    }

    #[inline]
    pub fn is_pretty(&self) -> bool {
        self.pretty
    }

    #[inline]
    pub fn skip_null(&self) -> bool {
        self.skip_null
    }

    #[inline]
    pub fn skip_empty_array(&self) -> bool {
        self.skip_empty_array
    }

    #[inline]
    pub fn attribute_order(&self) -> Option<&AttributeOrder> {
        self.attribute_order.as_ref()
    }

    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    #[inline]
    pub fn buffer_strategy(&self) -> BufferStrategy {
        self.buffer_strategy
    }

    #[inline]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    #[inline]
    pub fn binary_strategy(&self) -> BinaryStrategy {
        self.binary_strategy
    }

    /// Whether output streams are released once a document is written.
    #[inline]
    pub fn close(&self) -> bool {
        self.close
    }

    #[inline]
    pub fn date_format(&self) -> &DateFormat {
        &self.date_format
    }

    #[inline]
    pub fn fail_on_unknown_properties(&self) -> bool {
        self.fail_on_unknown_properties
    }

    /// Whether a property introduced in `since` is written at the
    /// configured version.
    pub fn includes_version(&self, since: Option<u32>) -> bool {
        match (self.version, since) {
            (Some(version), Some(since)) => version >= since,
            _ => true,
        }
    }
}

impl fmt::Debug for MapperConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapperConfig")
            .field("version", &self.version)
            .field("pretty", &self.pretty)
            .field("skip_null", &self.skip_null)
            .field("skip_empty_array", &self.skip_empty_array)
            .field("buffer_size", &self.buffer_size)
            .field("buffer_strategy", &self.buffer_strategy)
            .field("encoding", &self.encoding)
            .field("binary_strategy", &self.binary_strategy)
            .field("close", &self.close)
            .field("date_format", &self.date_format)
            .finish_non_exhaustive()
    }
}
