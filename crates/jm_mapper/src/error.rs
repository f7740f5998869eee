use core::fmt;
use std::borrow::Cow;
use std::error::Error;
use std::io;

use jm_reflect::AccessError;
use thiserror::Error;

// -----------------------------------------------------------------------------
// ConvertError

/// A scalar text that an adapter could not parse.
#[derive(Debug)]
pub struct ConvertError {
    message: Cow<'static, str>,
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl ConvertError {
    #[inline]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps the error of an underlying parser.
    #[inline]
    pub fn wrap(err: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        let source = err.into();
        Self {
            message: Cow::Owned(source.to_string()),
            source: Some(source),
        }
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for ConvertError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_deref().map(|err| err as &(dyn Error + 'static))
    }
}

// -----------------------------------------------------------------------------
// MapperError

/// The single error type of the mapper.
///
/// Use [`kind`](Self::kind) to tell the failure families apart.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MapperError {
    #[error("no mapping for type `{0}`")]
    NoMapping(&'static str),
    #[error("no converter for `{type_path}`")]
    MissingConverter { type_path: &'static str },
    #[error("conflicting annotations on `{type_path}.{property}`: {detail}")]
    AmbiguousAnnotation {
        type_path: &'static str,
        property: String,
        detail: String,
    },
    #[error("`{0}` has no usable constructor")]
    NotInstantiable(&'static str),
    #[error("`{0}` has no writable property")]
    ReadOnly(&'static str),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("cannot convert {text:?} to `{type_path}`")]
    Conversion {
        type_path: &'static str,
        text: String,
        #[source]
        source: ConvertError,
    },
    #[error("{context}")]
    Access {
        context: String,
        #[source]
        source: AccessError,
    },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failure families of [`MapperError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A type, adapter or annotation could not be resolved.
    Mapping,
    /// User code or a member access failed.
    Invocation,
    /// The document does not have the shape of the target type.
    Structure,
    /// A scalar text could not be parsed.
    Conversion,
    Io,
}

impl MapperError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoMapping(_)
            | Self::MissingConverter { .. }
            | Self::AmbiguousAnnotation { .. }
            | Self::NotInstantiable(_)
            | Self::ReadOnly(_) => ErrorKind::Mapping,
            Self::Unsupported(_) => ErrorKind::Structure,
            Self::Conversion { .. } => ErrorKind::Conversion,
            Self::Access { .. } => ErrorKind::Invocation,
            Self::Json(err) => match err.classify() {
                serde_json::error::Category::Io => ErrorKind::Io,
                _ => ErrorKind::Structure,
            },
            Self::Io(_) => ErrorKind::Io,
        }
    }

    /// Wraps a reflective failure with what was being done.
    #[inline]
    pub fn access(context: impl fmt::Display, source: AccessError) -> Self {
        Self::Access {
            context: format!("{context}: {source}"),
            source,
        }
    }

    #[inline]
    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// `true` when member access was denied, the signal for the sealed-type
    /// fallback.
    pub(crate) fn is_denied(&self) -> bool {
        matches!(
            self,
            Self::Access {
                source: AccessError::Denied { .. },
                ..
            }
        )
    }
}

impl From<AccessError> for MapperError {
    fn from(source: AccessError) -> Self {
        Self::Access {
            context: source.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::{ConvertError, ErrorKind, MapperError};
    use jm_reflect::AccessError;

    #[test]
    fn kinds_follow_the_taxonomy() {
        assert_eq!(MapperError::NoMapping("x").kind(), ErrorKind::Mapping);
        assert_eq!(MapperError::unsupported("array").kind(), ErrorKind::Structure);
        let access: MapperError = AccessError::Unsupported("x").into();
        assert_eq!(access.kind(), ErrorKind::Invocation);
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(MapperError::from(json).kind(), ErrorKind::Structure);
    }

    #[test]
    fn causes_are_preserved() {
        let parse = "x".parse::<u32>().unwrap_err();
        let err = MapperError::Conversion {
            type_path: "u32",
            text: "x".into(),
            source: ConvertError::wrap(parse),
        };
        let convert = err.source().unwrap();
        assert!(convert.source().unwrap().is::<core::num::ParseIntError>());

        let err = MapperError::access("setter `age`", AccessError::invocation("boom"));
        assert!(err.to_string().contains("setter `age`"));
        assert!(err.source().unwrap().source().is_some());
    }
}
