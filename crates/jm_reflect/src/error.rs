use std::error::Error;

use thiserror::Error;

use crate::Reflect;
use crate::info::Typed;

/// Failure raised while reaching into a reflected value.
///
/// `Invocation` keeps the error returned by user code (a fallible getter,
/// setter or constructor) as its source.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AccessError {
    #[error("members of `{type_path}` are not accessible")]
    Denied { type_path: &'static str },
    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    Mismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("argument #{index} is missing and `{type_path}` has no default value")]
    MissingArgument {
        index: usize,
        type_path: &'static str,
    },
    #[error("expected {expected} items, found {found}")]
    Length { expected: usize, found: usize },
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    #[error("invocation failed: {0}")]
    Invocation(#[source] Box<dyn Error + Send + Sync>),
}

impl AccessError {
    /// A `Mismatch` between the expected `T` and the runtime type of `found`.
    #[inline]
    pub fn mismatch<T: Typed>(found: &dyn Reflect) -> Self {
        Self::Mismatch {
            expected: T::type_info().type_path(),
            found: found.reflect_type_path(),
        }
    }

    /// Wraps an error returned by user code.
    #[inline]
    pub fn invocation(err: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::Invocation(err.into())
    }
}
