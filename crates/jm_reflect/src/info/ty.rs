use core::any::{Any, TypeId};
use core::fmt;
use core::hash::{Hash, Hasher};

// -----------------------------------------------------------------------------
// Type

/// Identity of a reflected type: its [`TypeId`] plus readable names.
///
/// ```
/// use jm_reflect::info::Type;
///
/// let ty = Type::of::<Vec<String>>();
/// assert_eq!(ty.ident(), "Vec");
/// assert!(ty.is::<Vec<String>>());
/// ```
#[derive(Clone, Copy)]
pub struct Type {
    id: TypeId,
    path: &'static str,
    ident: &'static str,
}

impl Type {
    pub fn of<T: ?Sized + Any>() -> Self {
        let path = core::any::type_name::<T>();
        Self {
            id: TypeId::of::<T>(),
            path,
            ident: ident_of(path),
        }
    }

    #[inline]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Full path as reported by [`core::any::type_name`].
    #[inline]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    /// Last path segment without generic arguments.
    #[inline]
    pub const fn ident(&self) -> &'static str {
        self.ident
    }

    #[inline]
    pub fn is<T: ?Sized + Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

fn ident_of(path: &'static str) -> &'static str {
    let base = match path.find('<') {
        Some(index) => &path[..index],
        None => path,
    };
    match base.rfind("::") {
        Some(index) => &base[index + 2..],
        None => base,
    }
}

impl PartialEq for Type {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::ident_of;

    #[test]
    fn ident_strips_module_and_generics() {
        assert_eq!(ident_of("alloc::vec::Vec<alloc::string::String>"), "Vec");
        assert_eq!(ident_of("my_crate::model::Person"), "Person");
        assert_eq!(ident_of("u8"), "u8");
    }
}
