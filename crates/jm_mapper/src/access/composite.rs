use indexmap::IndexMap;
use jm_reflect::info::ClassInfo;

use crate::MapperError;
use crate::access::factory::find_factory;
use crate::access::{AccessMode, Candidate, Candidates, Factory, MethodAccess, Reader, Writer};
use crate::access::{field, method};

/// Which side a merged property is read or written through when neither
/// side carries an annotation.
#[derive(Clone, Copy)]
enum Side {
    Field,
    Method,
}

/// Fields and bean accessors, merged per logical property.
///
/// For every property name found on either side:
///
/// - an `Ignore` on either side drops the property;
/// - a `Rename` on one side makes that side primary and names the property;
/// - otherwise the method is primary for reading and the field for writing.
///
/// When both sides exist the other one is kept as the descriptor's
/// fallback, which the mapping consults for converters.
///
/// ```
/// use jm_mapper::access::{AccessMode, FieldAndMethodAccess};
/// use jm_reflect::derive::Reflect;
/// use jm_reflect::info::Typed;
///
/// #[derive(Reflect)]
/// struct User {
///     name: String,
///     #[reflect(ignore)]
///     password: String,
/// }
///
/// let class = User::type_info().as_class().unwrap();
/// let readers = FieldAndMethodAccess::default().find_readers(class).unwrap();
/// assert_eq!(readers.keys().collect::<Vec<_>>(), ["name"]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldAndMethodAccess {
    methods: MethodAccess,
    use_constructors: bool,
}

impl FieldAndMethodAccess {
    #[inline]
    pub const fn new(methods: MethodAccess) -> Self {
        Self {
            methods,
            use_constructors: false,
        }
    }

    #[inline]
    pub const fn use_constructors(mut self, enabled: bool) -> Self {
        self.use_constructors = enabled;
        self.methods = self.methods.use_constructors(enabled);
        self
    }
}

/// Merges both candidate sets; `unannotated` picks the default side.
fn merge<M, D>(
    class: &ClassInfo,
    fields: Candidates<M>,
    mut methods: Candidates<M>,
    unannotated: Side,
    wrap: impl Fn(M) -> D,
    attach: impl Fn(D, M) -> D,
) -> Result<IndexMap<String, D>, MapperError> {
    let mut merged = IndexMap::with_capacity(fields.len() + methods.len());
    let pairs: Vec<(String, Option<Candidate<M>>, Option<Candidate<M>>)> = {
        let mut pairs: Vec<_> = fields
            .into_iter()
            .map(|(name, field)| {
                let method = methods.shift_remove(&name);
                (name, Some(field), method)
            })
            .collect();
        pairs.extend(methods.into_iter().map(|(name, method)| (name, None, Some(method))));
        pairs
    };

    for (name, field, method) in pairs {
        let ignored = field.as_ref().is_some_and(|c| c.ignored) || method.as_ref().is_some_and(|c| c.ignored);
        if ignored {
            continue;
        }
        let (field_rename, method_rename) = (
            field.as_ref().and_then(|c| c.rename),
            method.as_ref().and_then(|c| c.rename),
        );
        let side = match (field_rename, method_rename) {
            (Some(a), Some(b)) if a != b => {
                return Err(MapperError::AmbiguousAnnotation {
                    type_path: class.type_path(),
                    property: name,
                    detail: format!("field renamed to `{a}` but accessor renamed to `{b}`"),
                });
            }
            (Some(_), None) => Side::Field,
            (None, Some(_)) => Side::Method,
            _ => unannotated,
        };
        let key = field_rename.or(method_rename).map_or(name, str::to_owned);
        let descriptor = match (field, method) {
            (Some(field), Some(method)) => match side {
                Side::Field => attach(wrap(field.member), method.member),
                Side::Method => attach(wrap(method.member), field.member),
            },
            (Some(only), None) | (None, Some(only)) => wrap(only.member),
            (None, None) => continue,
        };
        merged.insert(key, descriptor);
    }
    Ok(merged)
}

impl AccessMode for FieldAndMethodAccess {
    fn find_readers(&self, class: &ClassInfo) -> Result<IndexMap<String, Reader>, MapperError> {
        let methods = if class.is_record() {
            method::record_candidates(class)?
        } else {
            method::read_candidates(class)?
        };
        merge(
            class,
            field::read_candidates(class)?,
            methods,
            Side::Method,
            Reader::new,
            Reader::with_fallback,
        )
    }

    fn find_writers(&self, class: &ClassInfo) -> Result<IndexMap<String, Writer>, MapperError> {
        if class.is_record() {
            return self.methods.find_writers(class);
        }
        merge(
            class,
            field::write_candidates(class)?,
            method::write_candidates(class, self.methods.is_getter_as_writer())?,
            Side::Field,
            Writer::new,
            Writer::with_fallback,
        )
    }

    fn find_factory(&self, class: &ClassInfo) -> Result<Option<Factory>, MapperError> {
        if class.is_record() {
            return self.methods.find_factory(class);
        }
        find_factory(class, self.use_constructors)
    }
}

#[cfg(test)]
mod tests {
    use jm_reflect::attrs::{Ignore, Rename};
    use jm_reflect::impls::NonGenericTypeInfoCell;
    use jm_reflect::info::{ClassInfo, FieldInfo, MethodInfo, TypeInfo, Typed};

    use super::FieldAndMethodAccess;
    use crate::access::{AccessMode, ReadMember, WriteMember};
    use crate::{ErrorKind, MapperError};

    /// One class covering the precedence matrix: `a` has only a field, `b`
    /// only accessors, `c` both without annotations and `d` both with a
    /// rename on the field.
    #[derive(Default)]
    struct Matrix {
        a: i32,
        b: i32,
        c: i32,
        d: i32,
    }

    impl Typed for Matrix {
        fn type_info() -> &'static TypeInfo {
            static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
            CELL.get_or_init(|| {
                TypeInfo::Class(
                    ClassInfo::builder::<Matrix>()
                        .field("a", |m| &m.a, |m| &mut m.a)
                        .field("c", |m| &m.c, |m| &mut m.c)
                        .with_field(
                            FieldInfo::new("d", |m: &Matrix| &m.d, |m: &mut Matrix| &mut m.d)
                                .with_attribute(Rename("delta")),
                        )
                        .getter("getB", |m| m.b)
                        .setter("setB", |m, b: i32| m.b = b)
                        .getter("getC", |m| m.c * 10)
                        .setter("setC", |m, c: i32| m.c = c * 10)
                        .getter("getD", |m| m.d * 10)
                        .setter("setD", |m, d: i32| m.d = d * 10)
                        .default_constructor()
                        .build(),
                )
            })
        }
    }

    #[derive(Default)]
    struct Conflict {
        e: i32,
    }

    impl Typed for Conflict {
        fn type_info() -> &'static TypeInfo {
            static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
            CELL.get_or_init(|| {
                TypeInfo::Class(
                    ClassInfo::builder::<Conflict>()
                        .with_field(
                            FieldInfo::new("e", |c: &Conflict| &c.e, |c: &mut Conflict| &mut c.e)
                                .with_attribute(Rename("x")),
                        )
                        .with_method(MethodInfo::getter("getE", |c: &Conflict| c.e).with_attribute(Rename("y")))
                        .with_method(MethodInfo::getter("getHidden", |c: &Conflict| c.e).with_attribute(Ignore))
                        .build(),
                )
            })
        }
    }

    fn class<T: Typed>() -> &'static ClassInfo {
        T::type_info().as_class().unwrap()
    }

    #[test]
    fn methods_win_reads_and_fields_win_writes() {
        let access = FieldAndMethodAccess::default();
        let readers = access.find_readers(class::<Matrix>()).unwrap();
        let names: Vec<_> = readers.keys().map(String::as_str).collect();
        assert_eq!(names, ["a", "c", "delta", "b"]);

        assert!(matches!(readers["a"].primary(), ReadMember::Field(_)));
        assert!(readers["a"].fallback().is_none());
        assert!(matches!(readers["b"].primary(), ReadMember::Method(_)));
        assert!(matches!(readers["c"].primary(), ReadMember::Method(_)));
        assert!(matches!(readers["c"].fallback(), Some(ReadMember::Field(_))));
        assert!(matches!(readers["delta"].primary(), ReadMember::Field(_)));

        let value = Matrix { a: 1, b: 2, c: 3, d: 4 };
        let read = |name: &str| {
            let value = readers[name].read(&value).unwrap();
            *value.as_reflect().downcast_ref::<i32>().unwrap()
        };
        assert_eq!((read("a"), read("b"), read("c"), read("delta")), (1, 2, 30, 4));

        let writers = access.find_writers(class::<Matrix>()).unwrap();
        assert!(matches!(writers["c"].primary(), WriteMember::Field(_)));
        assert!(matches!(writers["c"].fallback(), Some(WriteMember::Setter(_))));
        assert!(matches!(writers["b"].primary(), WriteMember::Setter(_)));

        let mut value = Matrix::default();
        writers["c"].write(&mut value, Box::new(5_i32)).unwrap();
        writers["delta"].write(&mut value, Box::new(6_i32)).unwrap();
        assert_eq!((value.c, value.d), (5, 6));
    }

    #[test]
    fn conflicting_renames_are_rejected() {
        let access = FieldAndMethodAccess::default();
        let err: MapperError = access.find_readers(class::<Conflict>()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Mapping);
        assert!(err.to_string().contains("`x`"));
    }
}
