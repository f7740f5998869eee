use core::fmt;
use std::error::Error;
use std::sync::Arc;

use crate::info::{CustomAttributes, Type, TypeInfo, Typed, impl_custom_attributes_fn};
use crate::{AccessError, Reflect};

// -----------------------------------------------------------------------------
// Erased accessors

/// Borrows a member out of its owner.
pub type RefAccess = Arc<dyn for<'a> Fn(&'a dyn Reflect) -> Option<&'a dyn Reflect> + Send + Sync>;

/// Mutably borrows a member out of its owner.
pub type MutAccess =
    Arc<dyn for<'a> Fn(&'a mut dyn Reflect) -> Option<&'a mut dyn Reflect> + Send + Sync>;

/// Computes an owned value from its owner.
pub type ValueGetter = Arc<dyn Fn(&dyn Reflect) -> Result<Box<dyn Reflect>, AccessError> + Send + Sync>;

/// Stores a value into its owner.
pub type ValueSetter =
    Arc<dyn Fn(&mut dyn Reflect, Box<dyn Reflect>) -> Result<(), AccessError> + Send + Sync>;

/// Erases a borrowing closure.
///
/// Going through this function pins the closure signature to the
/// higher-ranked form, which plain `Arc::new` does not infer.
#[inline]
pub fn ref_access<F>(f: F) -> RefAccess
where
    F: for<'a> Fn(&'a dyn Reflect) -> Option<&'a dyn Reflect> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Erases a mutably borrowing closure. See [`ref_access`].
#[inline]
pub fn mut_access<F>(f: F) -> MutAccess
where
    F: for<'a> Fn(&'a mut dyn Reflect) -> Option<&'a mut dyn Reflect> + Send + Sync + 'static,
{
    Arc::new(f)
}

fn typed_ref<T: Typed, F: Typed>(
    get: impl for<'a> Fn(&'a T) -> &'a F + Send + Sync + 'static,
) -> RefAccess {
    ref_access(move |owner| owner.downcast_ref::<T>().map(|owner| get(owner) as &dyn Reflect))
}

fn typed_mut<T: Typed, F: Typed>(
    get_mut: impl for<'a> Fn(&'a mut T) -> &'a mut F + Send + Sync + 'static,
) -> MutAccess {
    mut_access(move |owner| {
        owner
            .downcast_mut::<T>()
            .map(|owner| get_mut(owner) as &mut dyn Reflect)
    })
}

fn assign<F: Typed>(slot: &mut dyn Reflect, value: Box<dyn Reflect>) -> Result<(), AccessError> {
    let found = slot.reflect_type_path();
    let value = value
        .take::<F>()
        .map_err(|value| AccessError::mismatch::<F>(&*value))?;
    match slot.downcast_mut::<F>() {
        Some(slot) => {
            *slot = value;
            Ok(())
        }
        None => Err(AccessError::Mismatch {
            expected: F::type_info().type_path(),
            found,
        }),
    }
}

// -----------------------------------------------------------------------------
// FieldInfo

/// A named field reached through borrow projections.
#[derive(Clone)]
pub struct FieldInfo {
    name: &'static str,
    owner: Type,
    ty: Type,
    type_info: fn() -> &'static TypeInfo,
    get: RefAccess,
    get_mut: MutAccess,
    assign: fn(&mut dyn Reflect, Box<dyn Reflect>) -> Result<(), AccessError>,
    readonly: bool,
    synthetic: bool,
    custom_attributes: Option<Arc<CustomAttributes>>,
}

impl FieldInfo {
    /// Describes field `name` of `T`, of type `F`.
    ///
    /// ```
    /// use jm_reflect::derive::Reflect;
    /// use jm_reflect::info::FieldInfo;
    ///
    /// #[derive(Reflect)]
    /// struct User {
    ///     name: String,
    /// }
    ///
    /// let field = FieldInfo::new("name", |u: &User| &u.name, |u: &mut User| &mut u.name);
    /// let mut user = User { name: "ok".into() };
    ///
    /// let value = field.get(&user).unwrap();
    /// assert_eq!(value.downcast_ref::<String>().unwrap(), "ok");
    ///
    /// field.set(&mut user, Box::new(String::from("changed"))).unwrap();
    /// assert_eq!(user.name, "changed");
    /// ```
    pub fn new<T: Typed, F: Typed>(
        name: &'static str,
        get: impl for<'a> Fn(&'a T) -> &'a F + Send + Sync + 'static,
        get_mut: impl for<'a> Fn(&'a mut T) -> &'a mut F + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            owner: Type::of::<T>(),
            ty: Type::of::<F>(),
            type_info: F::type_info,
            get: typed_ref(get),
            get_mut: typed_mut(get_mut),
            assign: assign::<F>,
            readonly: false,
            synthetic: false,
            custom_attributes: None,
        }
    }

    /// Marks the field as not assignable.
    #[inline]
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Marks the field as injected by tooling rather than declared.
    #[inline]
    pub fn synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Class that declares the field.
    #[inline]
    pub const fn owner(&self) -> &Type {
        &self.owner
    }

    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub fn type_info(&self) -> &'static TypeInfo {
        (self.type_info)()
    }

    #[inline]
    pub const fn is_readonly(&self) -> bool {
        self.readonly
    }

    #[inline]
    pub const fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    #[inline]
    pub fn get<'a>(&self, owner: &'a dyn Reflect) -> Option<&'a dyn Reflect> {
        (self.get)(owner)
    }

    #[inline]
    pub fn get_mut<'a>(&self, owner: &'a mut dyn Reflect) -> Option<&'a mut dyn Reflect> {
        (self.get_mut)(owner)
    }

    /// Replaces the field value. Fails on readonly fields.
    pub fn set(&self, owner: &mut dyn Reflect, value: Box<dyn Reflect>) -> Result<(), AccessError> {
        if self.readonly {
            return Err(AccessError::Unsupported("assignment to a readonly field"));
        }
        let found = owner.reflect_type_path();
        match (self.get_mut)(owner) {
            Some(slot) => (self.assign)(slot, value),
            None => Err(AccessError::Mismatch {
                expected: self.owner.path(),
                found,
            }),
        }
    }

    /// Re-roots the field so it is reached through `parent` from the child.
    pub fn through(&self, parent: &ParentInfo) -> Self {
        let (outer, inner) = (parent.get.clone(), self.get.clone());
        let (outer_mut, inner_mut) = (parent.get_mut.clone(), self.get_mut.clone());
        Self {
            owner: parent.owner,
            get: ref_access(move |owner| outer(owner).and_then(|parent| inner(parent))),
            get_mut: mut_access(move |owner| outer_mut(owner).and_then(|parent| inner_mut(parent))),
            ..self.clone()
        }
    }

    impl_custom_attributes_fn!(custom_attributes);
}

impl fmt::Debug for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInfo")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("readonly", &self.readonly)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ParentInfo

/// Embedded parent value, treated as the superclass of its owner.
#[derive(Clone)]
pub struct ParentInfo {
    name: &'static str,
    owner: Type,
    ty: Type,
    type_info: fn() -> &'static TypeInfo,
    get: RefAccess,
    get_mut: MutAccess,
}

impl ParentInfo {
    pub fn new<T: Typed, P: Typed>(
        name: &'static str,
        get: impl for<'a> Fn(&'a T) -> &'a P + Send + Sync + 'static,
        get_mut: impl for<'a> Fn(&'a mut T) -> &'a mut P + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            owner: Type::of::<T>(),
            ty: Type::of::<P>(),
            type_info: P::type_info,
            get: typed_ref(get),
            get_mut: typed_mut(get_mut),
        }
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub fn type_info(&self) -> &'static TypeInfo {
        (self.type_info)()
    }

    /// Borrows the parent out of `owner`.
    #[inline]
    pub fn get<'a>(&self, owner: &'a dyn Reflect) -> Option<&'a dyn Reflect> {
        (self.get)(owner)
    }

    #[inline]
    pub fn get_mut<'a>(&self, owner: &'a mut dyn Reflect) -> Option<&'a mut dyn Reflect> {
        (self.get_mut)(owner)
    }

    /// Composes `self` after `outer`, for grandparents.
    pub fn through(&self, outer: &ParentInfo) -> Self {
        let (first, second) = (outer.get.clone(), self.get.clone());
        let (first_mut, second_mut) = (outer.get_mut.clone(), self.get_mut.clone());
        Self {
            owner: outer.owner,
            get: ref_access(move |owner| first(owner).and_then(|parent| second(parent))),
            get_mut: mut_access(move |owner| first_mut(owner).and_then(|parent| second_mut(parent))),
            ..self.clone()
        }
    }
}

impl fmt::Debug for ParentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentInfo")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// MethodInfo

/// How a method is invoked.
#[derive(Clone)]
pub enum MethodCall {
    /// Zero-argument method returning an owned value.
    Get(ValueGetter),
    /// Zero-argument method returning a borrow of the owner.
    Borrow(RefAccess),
    /// Zero-argument method returning a mutable borrow, used to merge into
    /// collections that have no setter.
    BorrowMut(MutAccess),
    /// One-argument method storing a value.
    Set(ValueSetter),
}

/// A named accessor method.
///
/// Names follow the owner's conventions (`getName`, `get_name`, `name`);
/// access strategies decide how names map to properties.
#[derive(Clone)]
pub struct MethodInfo {
    name: &'static str,
    owner: Type,
    value_ty: Type,
    value_info: fn() -> &'static TypeInfo,
    call: MethodCall,
    custom_attributes: Option<Arc<CustomAttributes>>,
}

impl MethodInfo {
    fn with_call<T: Typed, V: Typed>(name: &'static str, call: MethodCall) -> Self {
        Self {
            name,
            owner: Type::of::<T>(),
            value_ty: Type::of::<V>(),
            value_info: V::type_info,
            call,
            custom_attributes: None,
        }
    }

    /// A getter computing an owned `R`.
    pub fn getter<T: Typed, R: Typed>(
        name: &'static str,
        f: impl Fn(&T) -> R + Send + Sync + 'static,
    ) -> Self {
        Self::try_getter::<T, R, AccessError>(name, move |owner| Ok(f(owner)))
    }

    /// A getter that may fail; the error becomes the invocation cause.
    pub fn try_getter<T, R, E>(
        name: &'static str,
        f: impl Fn(&T) -> Result<R, E> + Send + Sync + 'static,
    ) -> Self
    where
        T: Typed,
        R: Typed,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let call: ValueGetter = Arc::new(move |owner: &dyn Reflect| -> Result<Box<dyn Reflect>, AccessError> {
            let owner = owner
                .downcast_ref::<T>()
                .ok_or_else(|| AccessError::mismatch::<T>(owner))?;
            match f(owner) {
                Ok(value) => Ok(Box::new(value) as Box<dyn Reflect>),
                Err(err) => Err(AccessError::invocation(err)),
            }
        });
        Self::with_call::<T, R>(name, MethodCall::Get(call))
    }

    /// A getter returning a borrow, such as a record component accessor.
    pub fn accessor<T: Typed, R: Typed>(
        name: &'static str,
        f: impl for<'a> Fn(&'a T) -> &'a R + Send + Sync + 'static,
    ) -> Self {
        Self::with_call::<T, R>(name, MethodCall::Borrow(typed_ref(f)))
    }

    /// A getter returning a mutable borrow of a collection.
    pub fn accessor_mut<T: Typed, R: Typed>(
        name: &'static str,
        f: impl for<'a> Fn(&'a mut T) -> &'a mut R + Send + Sync + 'static,
    ) -> Self {
        Self::with_call::<T, R>(name, MethodCall::BorrowMut(typed_mut(f)))
    }

    pub fn setter<T: Typed, A: Typed>(
        name: &'static str,
        f: impl Fn(&mut T, A) + Send + Sync + 'static,
    ) -> Self {
        Self::try_setter::<T, A, AccessError>(name, move |owner, value| {
            f(owner, value);
            Ok(())
        })
    }

    /// A setter that may fail; the error becomes the invocation cause.
    pub fn try_setter<T, A, E>(
        name: &'static str,
        f: impl Fn(&mut T, A) -> Result<(), E> + Send + Sync + 'static,
    ) -> Self
    where
        T: Typed,
        A: Typed,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let call: ValueSetter = Arc::new(move |owner: &mut dyn Reflect, value: Box<dyn Reflect>| -> Result<(), AccessError> {
            let value = value
                .take::<A>()
                .map_err(|value| AccessError::mismatch::<A>(&*value))?;
            let found = owner.reflect_type_path();
            let owner = owner.downcast_mut::<T>().ok_or(AccessError::Mismatch {
                expected: core::any::type_name::<T>(),
                found,
            })?;
            f(owner, value).map_err(AccessError::invocation)
        });
        Self::with_call::<T, A>(name, MethodCall::Set(call))
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub const fn owner(&self) -> &Type {
        &self.owner
    }

    /// Returned type for getters, parameter type for setters.
    #[inline]
    pub const fn value_ty(&self) -> &Type {
        &self.value_ty
    }

    #[inline]
    pub fn value_info(&self) -> &'static TypeInfo {
        (self.value_info)()
    }

    #[inline]
    pub const fn call(&self) -> &MethodCall {
        &self.call
    }

    /// `true` for zero-argument methods producing a value to read.
    #[inline]
    pub const fn is_getter(&self) -> bool {
        matches!(self.call, MethodCall::Get(_) | MethodCall::Borrow(_))
    }

    #[inline]
    pub const fn is_setter(&self) -> bool {
        matches!(self.call, MethodCall::Set(_))
    }

    #[inline]
    pub const fn param_count(&self) -> usize {
        match self.call {
            MethodCall::Set(_) => 1,
            _ => 0,
        }
    }

    /// Re-roots the method so it is invoked on `parent` from the child.
    pub fn through(&self, parent: &ParentInfo) -> Self {
        let expected = self.owner.path();
        let call = match &self.call {
            MethodCall::Get(inner) => {
                let (outer, inner) = (parent.get.clone(), inner.clone());
                let call: ValueGetter =
                    Arc::new(move |owner: &dyn Reflect| -> Result<Box<dyn Reflect>, AccessError> {
                        let found = owner.reflect_type_path();
                        let target = outer(owner).ok_or(AccessError::Mismatch { expected, found })?;
                        inner(target)
                    });
                MethodCall::Get(call)
            }
            MethodCall::Borrow(inner) => {
                let (outer, inner) = (parent.get.clone(), inner.clone());
                MethodCall::Borrow(ref_access(move |owner| outer(owner).and_then(|target| inner(target))))
            }
            MethodCall::BorrowMut(inner) => {
                let (outer, inner) = (parent.get_mut.clone(), inner.clone());
                MethodCall::BorrowMut(mut_access(move |owner| {
                    outer(owner).and_then(|target| inner(target))
                }))
            }
            MethodCall::Set(inner) => {
                let (outer, inner) = (parent.get_mut.clone(), inner.clone());
                let call: ValueSetter = Arc::new(
                    move |owner: &mut dyn Reflect, value: Box<dyn Reflect>| -> Result<(), AccessError> {
                        let found = owner.reflect_type_path();
                        let target = outer(owner).ok_or(AccessError::Mismatch { expected, found })?;
                        inner(target, value)
                    },
                );
                MethodCall::Set(call)
            }
        };
        Self {
            owner: parent.owner,
            call,
            ..self.clone()
        }
    }

    impl_custom_attributes_fn!(custom_attributes);
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("name", &self.name)
            .field("value_ty", &self.value_ty)
            .field("params", &self.param_count())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Constructors

/// One constructor parameter.
#[derive(Debug, Clone)]
pub struct ParamInfo {
    name: Option<&'static str>,
    ty: Type,
    type_info: fn() -> &'static TypeInfo,
    custom_attributes: Option<Arc<CustomAttributes>>,
}

impl ParamInfo {
    pub fn new<P: Typed>() -> Self {
        Self {
            name: None,
            ty: Type::of::<P>(),
            type_info: P::type_info,
            custom_attributes: None,
        }
    }

    /// Binds the parameter to the property of the same name.
    #[inline]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    #[inline]
    pub const fn name(&self) -> Option<&'static str> {
        self.name
    }

    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub fn type_info(&self) -> &'static TypeInfo {
        (self.type_info)()
    }

    impl_custom_attributes_fn!(custom_attributes);
}

/// Arguments handed to a constructor, one optional slot per parameter.
///
/// An empty slot means the property was absent; [`take`](Self::take) then
/// falls back to the parameter type's default value.
pub struct Args {
    values: Vec<Option<Box<dyn Reflect>>>,
}

impl Args {
    #[inline]
    pub fn new(values: Vec<Option<Box<dyn Reflect>>>) -> Self {
        Self { values }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Takes argument `index`, or the default of `P` when it is absent.
    pub fn take<P: Typed>(&mut self, index: usize) -> Result<P, AccessError> {
        let missing = || AccessError::MissingArgument {
            index,
            type_path: P::type_info().type_path(),
        };
        let value = match self.values.get_mut(index).and_then(Option::take) {
            Some(value) => value,
            None => P::type_info().default_value().ok_or_else(missing)?,
        };
        value
            .take::<P>()
            .map_err(|value| AccessError::mismatch::<P>(&*value))
    }
}

type ConstructFn = Arc<dyn Fn(&mut Args) -> Result<Box<dyn Reflect>, AccessError> + Send + Sync>;

/// A way to build an instance of a class.
#[derive(Clone)]
pub struct ConstructorInfo {
    owner: Type,
    params: Arc<[ParamInfo]>,
    call: ConstructFn,
    canonical: bool,
    custom_attributes: Option<Arc<CustomAttributes>>,
}

impl ConstructorInfo {
    /// A constructor without parameters.
    pub fn no_args<T: Typed>(f: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            owner: Type::of::<T>(),
            params: Arc::new([]),
            call: Arc::new(move |_: &mut Args| -> Result<Box<dyn Reflect>, AccessError> {
                Ok(Box::new(f()))
            }),
            canonical: false,
            custom_attributes: None,
        }
    }

    /// A constructor with parameters, read from [`Args`] by position.
    ///
    /// ```
    /// use jm_reflect::derive::Reflect;
    /// use jm_reflect::info::{ConstructorInfo, ParamInfo};
    ///
    /// #[derive(Reflect)]
    /// struct Person {
    ///     name: String,
    ///     age: u32,
    /// }
    ///
    /// let ctor = ConstructorInfo::new::<Person>(
    ///     [ParamInfo::new::<String>().named("name"), ParamInfo::new::<u32>().named("age")],
    ///     |args| Ok(Person { name: args.take(0)?, age: args.take(1)? }),
    /// );
    /// assert!(ctor.is_annotated());
    ///
    /// let built = ctor.invoke(vec![Some(Box::new(String::from("ok"))), None]).unwrap();
    /// let person = built.take::<Person>().ok().unwrap();
    /// assert_eq!((person.name.as_str(), person.age), ("ok", 0));
    /// ```
    pub fn new<T: Typed>(
        params: impl IntoIterator<Item = ParamInfo>,
        f: impl Fn(&mut Args) -> Result<T, AccessError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            owner: Type::of::<T>(),
            params: params.into_iter().collect(),
            call: Arc::new(move |args: &mut Args| -> Result<Box<dyn Reflect>, AccessError> {
                Ok(Box::new(f(args)?))
            }),
            canonical: false,
            custom_attributes: None,
        }
    }

    /// Marks the record canonical constructor.
    #[inline]
    pub fn canonical(mut self) -> Self {
        self.canonical = true;
        self
    }

    #[inline]
    pub const fn owner(&self) -> &Type {
        &self.owner
    }

    #[inline]
    pub fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    #[inline]
    pub fn is_no_args(&self) -> bool {
        self.params.is_empty()
    }

    #[inline]
    pub const fn is_canonical(&self) -> bool {
        self.canonical
    }

    /// `true` when every parameter is bound to a property name.
    #[inline]
    pub fn is_annotated(&self) -> bool {
        !self.params.is_empty() && self.params.iter().all(|param| param.name.is_some())
    }

    /// Calls the constructor. `values` must hold one slot per parameter.
    pub fn invoke(&self, values: Vec<Option<Box<dyn Reflect>>>) -> Result<Box<dyn Reflect>, AccessError> {
        if values.len() != self.params.len() {
            return Err(AccessError::Length {
                expected: self.params.len(),
                found: values.len(),
            });
        }
        (self.call)(&mut Args::new(values))
    }

    impl_custom_attributes_fn!(custom_attributes);
}

impl fmt::Debug for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInfo")
            .field("owner", &self.owner)
            .field("params", &self.params)
            .field("canonical", &self.canonical)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Any-getter / any-setter

/// Exposes a map of extra properties written after the mapped ones.
#[derive(Clone)]
pub struct AnyGetterInfo {
    map_info: fn() -> &'static TypeInfo,
    get: RefAccess,
}

impl AnyGetterInfo {
    pub fn new<T: Typed, M: Typed>(get: impl for<'a> Fn(&'a T) -> &'a M + Send + Sync + 'static) -> Self {
        Self {
            map_info: M::type_info,
            get: typed_ref(get),
        }
    }

    #[inline]
    pub fn map_info(&self) -> &'static TypeInfo {
        (self.map_info)()
    }

    #[inline]
    pub fn get<'a>(&self, owner: &'a dyn Reflect) -> Option<&'a dyn Reflect> {
        (self.get)(owner)
    }
}

type AnySetFn = Arc<dyn Fn(&mut dyn Reflect, String, Box<dyn Reflect>) -> Result<(), AccessError> + Send + Sync>;

/// Receives properties that no writer claims.
#[derive(Clone)]
pub struct AnySetterInfo {
    value_info: fn() -> &'static TypeInfo,
    set: AnySetFn,
}

impl AnySetterInfo {
    pub fn new<T: Typed, V: Typed>(f: impl Fn(&mut T, String, V) + Send + Sync + 'static) -> Self {
        Self {
            value_info: V::type_info,
            set: Arc::new(
                move |owner: &mut dyn Reflect, key: String, value: Box<dyn Reflect>| -> Result<(), AccessError> {
                    let value = value
                        .take::<V>()
                        .map_err(|value| AccessError::mismatch::<V>(&*value))?;
                    let found = owner.reflect_type_path();
                    let owner = owner.downcast_mut::<T>().ok_or(AccessError::Mismatch {
                        expected: core::any::type_name::<T>(),
                        found,
                    })?;
                    f(owner, key, value);
                    Ok(())
                },
            ),
        }
    }

    /// Type the unknown property values are converted to.
    #[inline]
    pub fn value_info(&self) -> &'static TypeInfo {
        (self.value_info)()
    }

    #[inline]
    pub fn set(&self, owner: &mut dyn Reflect, key: String, value: Box<dyn Reflect>) -> Result<(), AccessError> {
        (self.set)(owner, key, value)
    }
}
