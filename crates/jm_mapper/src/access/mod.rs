//! Access strategies: how the properties of a class are discovered, read
//! and written.
//!
//! An [`AccessMode`] turns a [`ClassInfo`] into ordered maps of
//! [`Reader`]s and [`Writer`]s plus an optional [`Factory`]. The built-in
//! strategies are:
//!
//! - [`FieldAccess`]: fields, walked through the parent chain.
//! - [`MethodAccess`]: bean-style getters and setters.
//! - [`RecordAccess`]: record accessors and the canonical constructor.
//! - [`FieldAndMethodAccess`]: both, merged per property.

// -----------------------------------------------------------------------------
// Modules

mod composite;
mod descriptor;
mod factory;
mod field;
mod method;
mod naming;
mod sealed;

// -----------------------------------------------------------------------------
// Exports

pub use composite::FieldAndMethodAccess;
pub use descriptor::{ReadMember, ReadValue, Reader, WriteMember, Writer};
pub use factory::{Factory, FactoryCall, FactoryParam};
pub use field::FieldAccess;
pub use method::{MethodAccess, RecordAccess};
pub use naming::{decapitalize, getter_property, setter_property};

pub(crate) use sealed::sealed_mapping;

use indexmap::IndexMap;
use jm_reflect::attrs::{Ignore, Rename};
use jm_reflect::info::{ClassInfo, CustomAttributes, Members};

use crate::MapperError;

// -----------------------------------------------------------------------------
// AccessMode

/// Discovers the properties of a class.
///
/// Implementations return [`MapperError::Access`] with an
/// [`AccessError::Denied`](jm_reflect::AccessError::Denied) source when the
/// class denies member access; the mapping cache then falls back to the
/// sealed-type mapping.
pub trait AccessMode: Send + Sync + 'static {
    /// Readable properties by serialized name, in declaration order.
    fn find_readers(&self, class: &ClassInfo) -> Result<IndexMap<String, Reader>, MapperError>;

    /// Writable properties by serialized name.
    fn find_writers(&self, class: &ClassInfo) -> Result<IndexMap<String, Writer>, MapperError>;

    /// The way instances are created, `None` for write-only classes.
    fn find_factory(&self, class: &ClassInfo) -> Result<Option<Factory>, MapperError>;
}

/// Probes member access, tagging a denial with the class.
pub(crate) fn members(class: &ClassInfo) -> Result<Members<'_>, MapperError> {
    class
        .members()
        .map_err(|err| MapperError::access(format_args!("members of `{}`", class.type_path()), err))
}

// -----------------------------------------------------------------------------
// Candidates

/// A member found by one strategy, keyed by its logical property name.
#[derive(Debug, Clone)]
pub(crate) struct Candidate<M> {
    pub member: M,
    pub rename: Option<&'static str>,
    pub ignored: bool,
}

impl<M> Candidate<M> {
    pub fn new(member: M, attributes: &CustomAttributes) -> Self {
        Self {
            member,
            rename: attributes.get::<Rename>().map(|rename| rename.0),
            ignored: attributes.contains::<Ignore>(),
        }
    }

    /// `true` when either annotation is present.
    #[inline]
    pub fn is_annotated(&self) -> bool {
        self.rename.is_some() || self.ignored
    }
}

pub(crate) type Candidates<M> = IndexMap<String, Candidate<M>>;

/// Adds `candidate` unless the name is taken, or replaces it in place when
/// `shadow` is set.
pub(crate) fn offer<M>(candidates: &mut Candidates<M>, name: String, candidate: Candidate<M>, shadow: bool) {
    match candidates.get_mut(&name) {
        Some(slot) if shadow => *slot = candidate,
        Some(_) => {}
        None => {
            candidates.insert(name, candidate);
        }
    }
}

/// Drops ignored candidates and keys the rest by their serialized name.
pub(crate) fn resolve<M, D>(candidates: Candidates<M>, wrap: impl Fn(M) -> D) -> IndexMap<String, D> {
    candidates
        .into_iter()
        .filter(|(_, candidate)| !candidate.ignored)
        .map(|(name, candidate)| {
            let name = candidate.rename.map_or(name, str::to_owned);
            (name, wrap(candidate.member))
        })
        .collect()
}
