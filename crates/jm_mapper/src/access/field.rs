use indexmap::IndexMap;
use jm_reflect::info::{ClassInfo, FieldInfo, TypeInfo};

use crate::MapperError;
use crate::access::factory::find_factory;
use crate::access::{AccessMode, Candidate, Candidates, Factory, ReadMember, Reader, WriteMember, Writer};
use crate::access::{members, offer, resolve};

/// Fields of the class and of its parent chain.
///
/// Parent fields come first; a field redeclared by the child keeps the
/// parent's position but reads the child's value. Synthetic fields are
/// skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldAccess {
    use_constructors: bool,
}

impl FieldAccess {
    #[inline]
    pub const fn new() -> Self {
        Self {
            use_constructors: false,
        }
    }

    /// Prefers annotated constructors over the no-arg one.
    #[inline]
    pub const fn use_constructors(mut self, enabled: bool) -> Self {
        self.use_constructors = enabled;
        self
    }
}

/// All non-synthetic fields reachable from `class`.
pub(crate) fn collect_fields(class: &ClassInfo) -> Result<Vec<FieldInfo>, MapperError> {
    let own = members(class)?;
    let mut fields: Vec<FieldInfo> = match class.parent() {
        Some(parent) => match parent.type_info() {
            TypeInfo::Class(inherited) => collect_fields(inherited)?
                .iter()
                .map(|field| field.through(parent))
                .collect(),
            _ => Vec::new(),
        },
        None => Vec::new(),
    };
    for field in own.fields().iter().filter(|field| !field.is_synthetic()) {
        match fields.iter().position(|known| known.name() == field.name()) {
            Some(index) => fields[index] = field.clone(),
            None => fields.push(field.clone()),
        }
    }
    Ok(fields)
}

pub(crate) fn read_candidates(class: &ClassInfo) -> Result<Candidates<ReadMember>, MapperError> {
    let mut candidates = Candidates::new();
    for field in collect_fields(class)? {
        let candidate = Candidate::new(ReadMember::Field(field.clone()), field.custom_attributes());
        offer(&mut candidates, field.name().to_owned(), candidate, true);
    }
    Ok(candidates)
}

pub(crate) fn write_candidates(class: &ClassInfo) -> Result<Candidates<WriteMember>, MapperError> {
    let mut candidates = Candidates::new();
    for field in collect_fields(class)? {
        if field.is_readonly() {
            continue;
        }
        let candidate = Candidate::new(WriteMember::Field(field.clone()), field.custom_attributes());
        offer(&mut candidates, field.name().to_owned(), candidate, true);
    }
    Ok(candidates)
}

impl AccessMode for FieldAccess {
    fn find_readers(&self, class: &ClassInfo) -> Result<IndexMap<String, Reader>, MapperError> {
        Ok(resolve(read_candidates(class)?, Reader::new))
    }

    fn find_writers(&self, class: &ClassInfo) -> Result<IndexMap<String, Writer>, MapperError> {
        Ok(resolve(write_candidates(class)?, Writer::new))
    }

    fn find_factory(&self, class: &ClassInfo) -> Result<Option<Factory>, MapperError> {
        find_factory(class, self.use_constructors)
    }
}

#[cfg(test)]
mod tests {
    use jm_reflect::derive::Reflect;
    use jm_reflect::info::Typed;

    use super::FieldAccess;
    use crate::access::AccessMode;

    #[derive(Reflect, Default)]
    #[reflect(default)]
    struct Base {
        id: u64,
        label: String,
    }

    #[derive(Reflect, Default)]
    #[reflect(default)]
    struct Derived {
        #[reflect(parent)]
        base: Base,
        #[reflect(rename = "title")]
        label: String,
        #[reflect(readonly)]
        created: u64,
        #[reflect(synthetic)]
        tracker: u8,
        #[reflect(ignore)]
        cache: Vec<u8>,
    }

    #[test]
    fn parents_come_first_and_are_shadowed() {
        let class = Derived::type_info().as_class().unwrap();
        let readers = FieldAccess::new().find_readers(class).unwrap();
        let names: Vec<_> = readers.keys().map(String::as_str).collect();
        assert_eq!(names, ["id", "title", "created"]);

        let value = Derived {
            base: Base { id: 7, label: "base".into() },
            label: "child".into(),
            ..Default::default()
        };
        let title = readers["title"].read(&value).unwrap();
        assert_eq!(title.as_reflect().downcast_ref::<String>().unwrap(), "child");
        let id = readers["id"].read(&value).unwrap();
        assert_eq!(id.as_reflect().downcast_ref::<u64>(), Some(&7));
    }

    #[test]
    fn readonly_fields_are_not_written() {
        let class = Derived::type_info().as_class().unwrap();
        let writers = FieldAccess::new().find_writers(class).unwrap();
        let names: Vec<_> = writers.keys().map(String::as_str).collect();
        assert_eq!(names, ["id", "title"]);

        let mut value = Derived::default();
        writers["id"].write(&mut value, Box::new(9_u64)).unwrap();
        assert_eq!(value.base.id, 9);

        let factory = FieldAccess::new().find_factory(class).unwrap().unwrap();
        assert!(factory.is_no_args());
    }
}
