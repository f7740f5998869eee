use std::error::Error;
use std::io;

use crate::Reflect;
use crate::impls::NonGenericTypeInfoCell;
use crate::info::{ClassInfo, TypeInfo, Typed};

// Runtime error types expose no members; only their message and cause
// chain are reachable through the error view.

impl Typed for io::Error {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Class(
                ClassInfo::builder::<io::Error>()
                    .sealed()
                    .error_view()
                    .from_message(io::Error::other)
                    .build(),
            )
        })
    }
}

impl Typed for Box<dyn Error + Send + Sync> {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Class(
                ClassInfo::builder::<Box<dyn Error + Send + Sync>>()
                    .sealed()
                    .error_view_with(view_boxed)
                    .from_message(Box::<dyn Error + Send + Sync>::from)
                    .build(),
            )
        })
    }
}

fn view_boxed(value: &dyn Reflect) -> Option<&(dyn Error + 'static)> {
    value
        .downcast_ref::<Box<dyn Error + Send + Sync>>()
        .map(|err| &**err as &(dyn Error + 'static))
}

#[cfg(test)]
mod tests {
    use std::io;

    use crate::AccessError;
    use crate::info::Typed;

    #[test]
    fn sealed_errors_deny_members_but_expose_messages() {
        let class = io::Error::type_info().as_class().unwrap();
        assert!(matches!(class.members(), Err(AccessError::Denied { .. })));

        let info = class.error_info().unwrap();
        let err = io::Error::other("disk full");
        assert_eq!(info.view(&err).unwrap().to_string(), "disk full");

        let rebuilt = info.from_message("boom".into()).unwrap();
        assert_eq!(rebuilt.take::<io::Error>().unwrap().to_string(), "boom");
    }
}
