//! The minimal mapping of error types whose members are sealed.

use std::error::Error;
use std::sync::Arc;

use indexmap::IndexMap;
use jm_reflect::info::{ClassInfo, ErrorInfo, Typed, ValueGetter};
use jm_reflect::{AccessError, Reflect};

use crate::access::{Factory, ReadMember, Reader, Writer};

/// Readers, writers and factory of a sealed class.
pub(crate) type SealedMapping = (IndexMap<String, Reader>, IndexMap<String, Writer>, Option<Factory>);

fn not_an_error(owner: &dyn Reflect) -> AccessError {
    AccessError::Mismatch {
        expected: "dyn Error",
        found: owner.reflect_type_path(),
    }
}

fn computed(info: ErrorInfo, render: fn(&(dyn Error + 'static)) -> Box<dyn Reflect>) -> ValueGetter {
    Arc::new(move |owner: &dyn Reflect| -> Result<Box<dyn Reflect>, AccessError> {
        info.view(owner).map(render).ok_or_else(|| not_an_error(owner))
    })
}

fn message(err: &(dyn Error + 'static)) -> Box<dyn Reflect> {
    Box::new(err.to_string())
}

fn stack_trace(err: &(dyn Error + 'static)) -> Box<dyn Reflect> {
    let mut trace = Vec::new();
    let mut cause = err.source();
    while let Some(err) = cause {
        trace.push(err.to_string());
        cause = err.source();
    }
    Box::new(trace)
}

/// `message` and `stackTrace` readers plus the from-message factory, or
/// `None` when the class is not an error type.
pub(crate) fn sealed_mapping(class: &ClassInfo) -> Option<SealedMapping> {
    let info = class.error_info()?;
    let mut readers = IndexMap::with_capacity(2);
    readers.insert(
        "message".to_owned(),
        Reader::new(ReadMember::Computed {
            info: String::type_info,
            get: computed(info.clone(), message),
        }),
    );
    readers.insert(
        "stackTrace".to_owned(),
        Reader::new(ReadMember::Computed {
            info: <Vec<String>>::type_info,
            get: computed(info.clone(), stack_trace),
        }),
    );
    let factory = Factory::from_message(class.type_path(), info.clone());
    Some((readers, IndexMap::new(), Some(factory)))
}

#[cfg(test)]
mod tests {
    use std::io;

    use jm_reflect::info::Typed;

    use super::sealed_mapping;
    use crate::ConvertError;

    #[test]
    fn io_errors_expose_message_and_causes() {
        let class = io::Error::type_info().as_class().unwrap();
        assert!(class.members().is_err());

        let (readers, writers, factory) = sealed_mapping(class).unwrap();
        assert!(writers.is_empty());

        let cause = "7x".parse::<u8>().unwrap_err();
        let err = io::Error::other(ConvertError::wrap(cause.clone()));
        let message = readers["message"].read(&err).unwrap();
        assert_eq!(message.as_reflect().downcast_ref::<String>(), Some(&cause.to_string()));

        let trace = readers["stackTrace"].read(&err).unwrap();
        let trace = trace.as_reflect().downcast_ref::<Vec<String>>().unwrap();
        assert_eq!(trace, &[cause.to_string()]);

        let rebuilt = factory
            .unwrap()
            .invoke(vec![Some(Box::new(String::from("again")))])
            .unwrap();
        let rebuilt = rebuilt.take::<io::Error>().ok().unwrap();
        assert_eq!(rebuilt.to_string(), "again");
    }
}
