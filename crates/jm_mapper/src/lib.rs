#![doc = include_str!("../README.md")]

// -----------------------------------------------------------------------------
// Modules

mod builder;
mod config;
mod de;
mod error;
mod io;
mod locale;
mod mapper;
mod mapping;
mod ser;

pub mod access;
pub mod adapter;

// -----------------------------------------------------------------------------
// Top-level exports

pub use adapter::{Converter, ObjectConverter, UseConverter, UseObjectConverter};
pub use builder::{DEFAULT_BUFFER_SIZE, MapperBuilder};
pub use config::{AccessModeKind, AttributeOrder, BinaryStrategy, BufferStrategy, DateFormat, Encoding, MapperConfig};
pub use error::{ConvertError, ErrorKind, MapperError};
pub use locale::Locale;
pub use mapper::Mapper;
pub use mapping::{ClassMapping, ParamMapping, PropertyReader, PropertyWriter};
