use indexmap::IndexMap;
use jm_reflect::info::{ClassInfo, MethodCall, MethodInfo, TypeInfo};

use crate::MapperError;
use crate::access::factory::{find_factory, select_factory};
use crate::access::naming::{getter_property, setter_property};
use crate::access::{AccessMode, Candidate, Candidates, Factory, ReadMember, Reader, WriteMember, Writer};
use crate::access::{members, offer, resolve};

// -----------------------------------------------------------------------------
// MethodAccess

/// Bean-style accessors: `getName`/`isActive`/`setName` or their snake
/// case forms.
///
/// Record classes are handed to [`RecordAccess`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodAccess {
    getter_as_writer: bool,
    use_constructors: bool,
}

impl MethodAccess {
    #[inline]
    pub const fn new() -> Self {
        Self {
            getter_as_writer: false,
            use_constructors: false,
        }
    }

    /// Merges into collections returned by a mutable getter when the
    /// property has no setter.
    #[inline]
    pub const fn getter_as_writer(mut self, enabled: bool) -> Self {
        self.getter_as_writer = enabled;
        self
    }

    #[inline]
    pub const fn use_constructors(mut self, enabled: bool) -> Self {
        self.use_constructors = enabled;
        self
    }

    #[inline]
    pub const fn is_getter_as_writer(&self) -> bool {
        self.getter_as_writer
    }

    #[inline]
    fn records(&self) -> RecordAccess {
        RecordAccess::new().use_constructors(self.use_constructors)
    }
}

/// Methods of the class and of its parent chain, child first.
pub(crate) fn collect_methods(class: &ClassInfo) -> Result<Vec<MethodInfo>, MapperError> {
    let mut methods = members(class)?.methods().to_vec();
    if let Some(parent) = class.parent()
        && let TypeInfo::Class(inherited) = parent.type_info()
    {
        for method in collect_methods(inherited)? {
            if methods.iter().all(|own| own.name() != method.name()) {
                methods.push(method.through(parent));
            }
        }
    }
    Ok(methods)
}

pub(crate) fn read_candidates(class: &ClassInfo) -> Result<Candidates<ReadMember>, MapperError> {
    let mut candidates = Candidates::new();
    for method in collect_methods(class)? {
        if !method.is_getter() {
            continue;
        }
        let is_bool = method.value_ty().is::<bool>();
        if let Some(name) = getter_property(method.name(), is_bool) {
            let candidate = Candidate::new(ReadMember::Method(method.clone()), method.custom_attributes());
            offer(&mut candidates, name, candidate, false);
        }
    }
    Ok(candidates)
}

pub(crate) fn write_candidates(
    class: &ClassInfo,
    getter_as_writer: bool,
) -> Result<Candidates<WriteMember>, MapperError> {
    let methods = collect_methods(class)?;
    let mut candidates = Candidates::new();
    for method in methods.iter().filter(|method| method.is_setter()) {
        if let Some(name) = setter_property(method.name()) {
            let candidate = Candidate::new(WriteMember::Setter(method.clone()), method.custom_attributes());
            offer(&mut candidates, name, candidate, false);
        }
    }
    if getter_as_writer {
        for method in &methods {
            let MethodCall::BorrowMut(_) = method.call() else {
                continue;
            };
            if !matches!(method.value_info(), TypeInfo::List(_) | TypeInfo::Map(_)) {
                continue;
            }
            if let Some(name) = getter_property(method.name(), false) {
                let candidate = Candidate::new(WriteMember::Merge(method.clone()), method.custom_attributes());
                offer(&mut candidates, name, candidate, false);
            }
        }
    }
    Ok(candidates)
}

impl AccessMode for MethodAccess {
    fn find_readers(&self, class: &ClassInfo) -> Result<IndexMap<String, Reader>, MapperError> {
        if class.is_record() {
            return self.records().find_readers(class);
        }
        Ok(resolve(read_candidates(class)?, Reader::new))
    }

    fn find_writers(&self, class: &ClassInfo) -> Result<IndexMap<String, Writer>, MapperError> {
        if class.is_record() {
            return self.records().find_writers(class);
        }
        Ok(resolve(write_candidates(class, self.getter_as_writer)?, Writer::new))
    }

    fn find_factory(&self, class: &ClassInfo) -> Result<Option<Factory>, MapperError> {
        if class.is_record() {
            return self.records().find_factory(class);
        }
        find_factory(class, self.use_constructors)
    }
}

// -----------------------------------------------------------------------------
// RecordAccess

/// Records: every zero-argument accessor is a reader and the canonical
/// constructor is the only way in. Records have no writers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordAccess {
    use_constructors: bool,
}

impl RecordAccess {
    #[inline]
    pub const fn new() -> Self {
        Self {
            use_constructors: false,
        }
    }

    /// Used when a class without a canonical constructor is mapped.
    #[inline]
    pub const fn use_constructors(mut self, enabled: bool) -> Self {
        self.use_constructors = enabled;
        self
    }
}

pub(crate) fn record_candidates(class: &ClassInfo) -> Result<Candidates<ReadMember>, MapperError> {
    let mut candidates = Candidates::new();
    for method in members(class)?.methods().iter().filter(|method| method.is_getter()) {
        let candidate = Candidate::new(ReadMember::Method(method.clone()), method.custom_attributes());
        offer(&mut candidates, method.name().to_owned(), candidate, false);
    }
    Ok(candidates)
}

impl AccessMode for RecordAccess {
    fn find_readers(&self, class: &ClassInfo) -> Result<IndexMap<String, Reader>, MapperError> {
        Ok(resolve(record_candidates(class)?, Reader::new))
    }

    fn find_writers(&self, class: &ClassInfo) -> Result<IndexMap<String, Writer>, MapperError> {
        // Probe access so sealed classes fail the same way on both sides.
        members(class)?;
        Ok(IndexMap::new())
    }

    fn find_factory(&self, class: &ClassInfo) -> Result<Option<Factory>, MapperError> {
        let ctors = members(class)?.constructors();
        let owner = class.type_path();
        match ctors.iter().find(|ctor| ctor.is_canonical()) {
            Some(ctor) => Ok(Some(Factory::from_constructor(owner, ctor.clone()))),
            None => Ok(select_factory(owner, ctors, self.use_constructors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use jm_reflect::Reflect;
    use jm_reflect::derive::Reflect;
    use jm_reflect::impls::NonGenericTypeInfoCell;
    use jm_reflect::info::{ClassInfo, MethodInfo, TypeInfo, Typed};

    use super::{MethodAccess, RecordAccess};
    use crate::access::AccessMode;

    #[derive(Default)]
    struct Account {
        owner: String,
        active: bool,
        tags: Vec<String>,
    }

    impl Typed for Account {
        fn type_info() -> &'static TypeInfo {
            static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
            CELL.get_or_init(|| {
                TypeInfo::Class(
                    ClassInfo::builder::<Account>()
                        .getter("getOwner", |a| a.owner.clone())
                        .setter("setOwner", |a, owner: String| a.owner = owner)
                        .getter("isActive", |a| a.active)
                        .getter("isOwner", |a| a.owner.clone())
                        .accessor("get_tags", |a| &a.tags)
                        .with_method(MethodInfo::accessor_mut::<Account, Vec<String>>("get_tags", |a| {
                            &mut a.tags
                        }))
                        .default_constructor()
                        .build(),
                )
            })
        }
    }

    #[derive(Reflect, Debug, PartialEq)]
    #[reflect(record)]
    struct Point {
        x: i32,
        #[reflect(rename = "ordinate")]
        y: i32,
    }

    #[test]
    fn bean_accessors_pair_into_properties() {
        let class = Account::type_info().as_class().unwrap();
        let readers = MethodAccess::new().find_readers(class).unwrap();
        let names: Vec<_> = readers.keys().map(String::as_str).collect();
        assert_eq!(names, ["owner", "active", "tags"]);

        let writers = MethodAccess::new().find_writers(class).unwrap();
        assert_eq!(writers.len(), 1);

        let merging = MethodAccess::new().getter_as_writer(true);
        let writers = merging.find_writers(class).unwrap();
        let mut account = Account {
            tags: vec!["a".into()],
            ..Default::default()
        };
        let tags: Box<dyn Reflect> = Box::new(vec![String::from("b")]);
        writers["tags"].write(&mut account, tags).unwrap();
        assert_eq!(account.tags, ["a", "b"]);
    }

    #[test]
    fn records_use_accessors_and_the_canonical_constructor() {
        let class = Point::type_info().as_class().unwrap();
        let readers = MethodAccess::new().find_readers(class).unwrap();
        let names: Vec<_> = readers.keys().map(String::as_str).collect();
        assert_eq!(names, ["x", "ordinate"]);
        assert!(RecordAccess::new().find_writers(class).unwrap().is_empty());

        let factory = RecordAccess::new().find_factory(class).unwrap().unwrap();
        let values: Vec<Option<Box<dyn Reflect>>> = vec![Some(Box::new(1_i32)), Some(Box::new(2_i32))];
        let point = factory.invoke(values).unwrap();
        assert_eq!(point.take::<Point>().ok(), Some(Point { x: 1, y: 2 }));
    }
}
