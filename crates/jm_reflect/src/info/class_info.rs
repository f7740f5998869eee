use core::fmt;
use core::marker::PhantomData;
use std::error::Error;
use std::sync::Arc;

use crate::attrs::Record;
use crate::info::{AnyGetterInfo, AnySetterInfo, ConstructorInfo, CustomAttributes, FieldInfo};
use crate::info::{MethodInfo, ParentInfo, Type, Typed, impl_custom_attributes_fn};
use crate::{AccessError, Reflect};

// -----------------------------------------------------------------------------
// ErrorInfo

type ErrorView = fn(&dyn Reflect) -> Option<&(dyn Error + 'static)>;

/// Error-type capabilities: a view as `dyn Error` and a way back from a
/// message.
#[derive(Clone)]
pub struct ErrorInfo {
    view: ErrorView,
    from_message: Option<Arc<dyn Fn(String) -> Box<dyn Reflect> + Send + Sync>>,
}

impl ErrorInfo {
    /// Views `value` as an error.
    #[inline]
    pub fn view<'a>(&self, value: &'a dyn Reflect) -> Option<&'a (dyn Error + 'static)> {
        (self.view)(value)
    }

    /// Rebuilds an error from its message, if the type supports it.
    #[inline]
    pub fn from_message(&self, message: String) -> Option<Box<dyn Reflect>> {
        self.from_message.as_ref().map(|f| f(message))
    }
}

fn view_error<T: Typed + Error>(value: &dyn Reflect) -> Option<&(dyn Error + 'static)> {
    value.downcast_ref::<T>().map(|err| err as &(dyn Error + 'static))
}

// -----------------------------------------------------------------------------
// Members

/// Borrowed view of the members of an accessible class.
#[derive(Clone, Copy)]
pub struct Members<'a> {
    fields: &'a [FieldInfo],
    methods: &'a [MethodInfo],
    constructors: &'a [ConstructorInfo],
}

impl<'a> Members<'a> {
    /// Fields in declaration order.
    #[inline]
    pub fn fields(&self) -> &'a [FieldInfo] {
        self.fields
    }

    #[inline]
    pub fn field(&self, name: &str) -> Option<&'a FieldInfo> {
        self.fields.iter().find(|field| field.name() == name)
    }

    #[inline]
    pub fn methods(&self) -> &'a [MethodInfo] {
        self.methods
    }

    #[inline]
    pub fn constructors(&self) -> &'a [ConstructorInfo] {
        self.constructors
    }
}

// -----------------------------------------------------------------------------
// ClassInfo

/// Type info for classes: named members with getters, setters and
/// constructors.
///
/// A *sealed* class denies member access: [`members`](Self::members)
/// returns [`AccessError::Denied`]. Only its [`ErrorInfo`] stays usable.
///
/// Build one with [`ClassInfo::builder`] or `#[derive(Reflect)]`.
#[derive(Clone)]
pub struct ClassInfo {
    ty: Type,
    parent: Option<ParentInfo>,
    fields: Box<[FieldInfo]>,
    methods: Box<[MethodInfo]>,
    constructors: Box<[ConstructorInfo]>,
    any_getter: Option<AnyGetterInfo>,
    any_setter: Option<AnySetterInfo>,
    error: Option<ErrorInfo>,
    sealed: bool,
    custom_attributes: Option<Arc<CustomAttributes>>,
}

impl ClassInfo {
    #[inline]
    pub fn builder<T: Typed>() -> ClassInfoBuilder<T> {
        ClassInfoBuilder {
            info: ClassInfo {
                ty: Type::of::<T>(),
                parent: None,
                fields: Box::new([]),
                methods: Box::new([]),
                constructors: Box::new([]),
                any_getter: None,
                any_setter: None,
                error: None,
                sealed: false,
                custom_attributes: None,
            },
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub const fn type_path(&self) -> &'static str {
        self.ty.path()
    }

    /// Probes member access.
    pub fn members(&self) -> Result<Members<'_>, AccessError> {
        if self.sealed {
            return Err(AccessError::Denied {
                type_path: self.ty.path(),
            });
        }
        Ok(Members {
            fields: &self.fields,
            methods: &self.methods,
            constructors: &self.constructors,
        })
    }

    #[inline]
    pub fn parent(&self) -> Option<&ParentInfo> {
        self.parent.as_ref()
    }

    #[inline]
    pub fn any_getter(&self) -> Option<&AnyGetterInfo> {
        self.any_getter.as_ref()
    }

    #[inline]
    pub fn any_setter(&self) -> Option<&AnySetterInfo> {
        self.any_setter.as_ref()
    }

    #[inline]
    pub fn error_info(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    #[inline]
    pub const fn is_sealed(&self) -> bool {
        self.sealed
    }

    #[inline]
    pub fn is_record(&self) -> bool {
        self.has_attribute::<Record>()
    }

    /// Builds an instance through the no-argument constructor.
    pub fn instantiate_default(&self) -> Option<Box<dyn Reflect>> {
        let members = self.members().ok()?;
        let ctor = members.constructors().iter().find(|c| c.is_no_args())?;
        ctor.invoke(Vec::new()).ok()
    }

    impl_custom_attributes_fn!(custom_attributes);
}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("ty", &self.ty)
            .field("parent", &self.parent)
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .field("constructors", &self.constructors)
            .field("sealed", &self.sealed)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ClassInfoBuilder

/// Builder for [`ClassInfo`], typed by the described class.
///
/// ```
/// use jm_reflect::attrs::Rename;
/// use jm_reflect::derive::Reflect;
/// use jm_reflect::info::{ClassInfo, FieldInfo, MethodInfo};
///
/// #[derive(Reflect, Default)]
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// let info = ClassInfo::builder::<Person>()
///     .field("name", |p| &p.name, |p| &mut p.name)
///     .with_field(FieldInfo::new("age", |p: &Person| &p.age, |p: &mut Person| &mut p.age)
///         .with_attribute(Rename("years")))
///     .getter("getLabel", |p: &Person| format!("{} ({})", p.name, p.age))
///     .default_constructor()
///     .build();
///
/// let members = info.members().unwrap();
/// assert_eq!(members.fields().len(), 2);
/// assert!(members.methods()[0].is_getter());
/// assert!(info.instantiate_default().is_some());
/// ```
pub struct ClassInfoBuilder<T> {
    info: ClassInfo,
    fields: Vec<FieldInfo>,
    methods: Vec<MethodInfo>,
    constructors: Vec<ConstructorInfo>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Typed> ClassInfoBuilder<T> {
    /// Adds a field reached through the given projections.
    pub fn field<F: Typed>(
        self,
        name: &'static str,
        get: impl for<'a> Fn(&'a T) -> &'a F + Send + Sync + 'static,
        get_mut: impl for<'a> Fn(&'a mut T) -> &'a mut F + Send + Sync + 'static,
    ) -> Self {
        self.with_field(FieldInfo::new::<T, F>(name, get, get_mut))
    }

    pub fn with_field(mut self, field: FieldInfo) -> Self {
        debug_assert_eq!(field.owner(), &self.info.ty);
        self.fields.push(field);
        self
    }

    /// Adds a getter computing an owned value.
    pub fn getter<R: Typed>(self, name: &'static str, f: impl Fn(&T) -> R + Send + Sync + 'static) -> Self {
        self.with_method(MethodInfo::getter::<T, R>(name, f))
    }

    /// Adds a getter returning a borrow.
    pub fn accessor<R: Typed>(
        self,
        name: &'static str,
        f: impl for<'a> Fn(&'a T) -> &'a R + Send + Sync + 'static,
    ) -> Self {
        self.with_method(MethodInfo::accessor::<T, R>(name, f))
    }

    pub fn setter<A: Typed>(self, name: &'static str, f: impl Fn(&mut T, A) + Send + Sync + 'static) -> Self {
        self.with_method(MethodInfo::setter::<T, A>(name, f))
    }

    pub fn with_method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    pub fn constructor(mut self, ctor: ConstructorInfo) -> Self {
        self.constructors.push(ctor);
        self
    }

    /// Adds a no-argument constructor calling [`Default::default`].
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor(ConstructorInfo::no_args::<T>(T::default))
    }

    /// Declares an embedded value whose members are inherited.
    pub fn parent<P: Typed>(
        mut self,
        name: &'static str,
        get: impl for<'a> Fn(&'a T) -> &'a P + Send + Sync + 'static,
        get_mut: impl for<'a> Fn(&'a mut T) -> &'a mut P + Send + Sync + 'static,
    ) -> Self {
        self.info.parent = Some(ParentInfo::new::<T, P>(name, get, get_mut));
        self
    }

    /// Exposes a string-keyed map as extra properties when writing.
    pub fn any_getter<M: Typed>(mut self, get: impl for<'a> Fn(&'a T) -> &'a M + Send + Sync + 'static) -> Self {
        self.info.any_getter = Some(AnyGetterInfo::new::<T, M>(get));
        self
    }

    /// Collects unknown properties when reading.
    pub fn any_setter<V: Typed>(mut self, f: impl Fn(&mut T, String, V) + Send + Sync + 'static) -> Self {
        self.info.any_setter = Some(AnySetterInfo::new::<T, V>(f));
        self
    }

    /// Marks the class as a record.
    pub fn record(self) -> Self {
        self.with_attribute(Record)
    }

    /// Denies member access.
    pub fn sealed(mut self) -> Self {
        self.info.sealed = true;
        self
    }

    /// Exposes values as `dyn Error`.
    pub fn error_view(self) -> Self
    where
        T: Error,
    {
        self.error_view_with(view_error::<T>)
    }

    /// Exposes values as `dyn Error` through a custom view.
    pub fn error_view_with(mut self, view: ErrorView) -> Self {
        let from_message = self.info.error.take().and_then(|info| info.from_message);
        self.info.error = Some(ErrorInfo { view, from_message });
        self
    }

    /// Rebuilds values from an error message.
    ///
    /// Call after [`error_view`](Self::error_view).
    pub fn from_message(mut self, f: impl Fn(String) -> T + Send + Sync + 'static) -> Self {
        let rebuild: Arc<dyn Fn(String) -> Box<dyn Reflect> + Send + Sync> =
            Arc::new(move |message: String| -> Box<dyn Reflect> { Box::new(f(message)) });
        match &mut self.info.error {
            Some(info) => info.from_message = Some(rebuild),
            None => {
                self.info.error = Some(ErrorInfo {
                    view: |_| None,
                    from_message: Some(rebuild),
                });
            }
        }
        self
    }

    pub fn with_attribute<A: core::any::Any + Send + Sync>(mut self, value: A) -> Self {
        self.info = self.info.with_attribute(value);
        self
    }

    pub fn with_custom_attributes(mut self, attributes: CustomAttributes) -> Self {
        self.info = self.info.with_custom_attributes(attributes);
        self
    }

    pub fn build(self) -> ClassInfo {
        ClassInfo {
            fields: self.fields.into_boxed_slice(),
            methods: self.methods.into_boxed_slice(),
            constructors: self.constructors.into_boxed_slice(),
            ..self.info
        }
    }
}
