use core::fmt;

use jm_reflect::Reflect;
use jm_reflect::info::{ClassInfo, ConstructorInfo, CustomAttributes, ErrorInfo, ParamInfo, TypeInfo, Typed};

use crate::MapperError;

static NO_ATTRIBUTES: CustomAttributes = CustomAttributes::new();

/// One argument of a [`Factory`].
#[derive(Debug, Clone)]
pub struct FactoryParam {
    name: Option<&'static str>,
    info: &'static TypeInfo,
    param: Option<ParamInfo>,
}

impl FactoryParam {
    /// The property bound to this argument, `None` for positional ones.
    #[inline]
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    #[inline]
    pub fn type_info(&self) -> &'static TypeInfo {
        self.info
    }

    pub fn custom_attributes(&self) -> &CustomAttributes {
        match &self.param {
            Some(param) => param.custom_attributes(),
            None => &NO_ATTRIBUTES,
        }
    }
}

/// The callable behind a [`Factory`].
#[derive(Clone)]
pub enum FactoryCall {
    Constructor(ConstructorInfo),
    /// Rebuilds an error type from its message.
    FromMessage(ErrorInfo),
}

impl fmt::Debug for FactoryCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constructor(ctor) => f.debug_tuple("Constructor").field(ctor).finish(),
            Self::FromMessage(_) => f.write_str("FromMessage"),
        }
    }
}

/// The chosen way to create instances of a class.
#[derive(Debug, Clone)]
pub struct Factory {
    owner: &'static str,
    params: Vec<FactoryParam>,
    call: FactoryCall,
}

impl Factory {
    pub fn from_constructor(owner: &'static str, ctor: ConstructorInfo) -> Self {
        let params = ctor
            .params()
            .iter()
            .map(|param| FactoryParam {
                name: param.name(),
                info: param.type_info(),
                param: Some(param.clone()),
            })
            .collect();
        Self {
            owner,
            params,
            call: FactoryCall::Constructor(ctor),
        }
    }

    pub fn from_message(owner: &'static str, info: ErrorInfo) -> Self {
        Self {
            owner,
            params: vec![FactoryParam {
                name: Some("message"),
                info: String::type_info(),
                param: None,
            }],
            call: FactoryCall::FromMessage(info),
        }
    }

    #[inline]
    pub fn params(&self) -> &[FactoryParam] {
        &self.params
    }

    #[inline]
    pub fn call(&self) -> &FactoryCall {
        &self.call
    }

    #[inline]
    pub fn is_no_args(&self) -> bool {
        self.params.is_empty()
    }

    /// Creates an instance from one slot per parameter; empty slots take
    /// the parameter type's default.
    pub fn invoke(&self, values: Vec<Option<Box<dyn Reflect>>>) -> Result<Box<dyn Reflect>, MapperError> {
        match &self.call {
            FactoryCall::Constructor(ctor) => ctor
                .invoke(values)
                .map_err(|err| MapperError::access(format_args!("constructing `{}`", self.owner), err)),
            FactoryCall::FromMessage(info) => {
                let message = values
                    .into_iter()
                    .next()
                    .flatten()
                    .and_then(|value| value.take::<String>().ok())
                    .unwrap_or_default();
                info.from_message(message)
                    .ok_or(MapperError::NotInstantiable(self.owner))
            }
        }
    }
}

/// Picks the factory among `ctors`.
///
/// With `use_constructors` off the no-arg constructor is preferred, then
/// the canonical one, then an annotated one. With it on the order is
/// reversed.
pub(crate) fn select_factory(
    owner: &'static str,
    ctors: &[ConstructorInfo],
    use_constructors: bool,
) -> Option<Factory> {
    let no_args = || ctors.iter().find(|ctor| ctor.is_no_args());
    let canonical = || ctors.iter().find(|ctor| ctor.is_canonical());
    let annotated = || ctors.iter().find(|ctor| ctor.is_annotated());
    let chosen = if use_constructors {
        annotated().or_else(canonical).or_else(no_args)
    } else {
        no_args().or_else(canonical).or_else(annotated)
    };
    chosen.map(|ctor| Factory::from_constructor(owner, ctor.clone()))
}

/// The factory of `class`: a constructor, else the from-message factory of
/// error types.
pub(crate) fn find_factory(class: &ClassInfo, use_constructors: bool) -> Result<Option<Factory>, MapperError> {
    let members = super::members(class)?;
    let owner = class.type_path();
    let factory = select_factory(owner, members.constructors(), use_constructors)
        .or_else(|| class.error_info().map(|info| Factory::from_message(owner, info.clone())));
    Ok(factory)
}

#[cfg(test)]
mod tests {
    use jm_reflect::Reflect;
    use jm_reflect::derive::Reflect;
    use jm_reflect::info::Typed;

    use super::select_factory;

    #[derive(Reflect, Default, Debug, PartialEq)]
    #[reflect(default, constructor)]
    struct Both {
        name: String,
        age: u32,
    }

    #[derive(Reflect)]
    struct Neither {
        name: String,
    }

    fn ctors<T: Typed>() -> Vec<jm_reflect::info::ConstructorInfo> {
        let class = T::type_info().as_class().unwrap();
        class.members().unwrap().constructors().to_vec()
    }

    #[test]
    fn preference_follows_the_constructor_switch() {
        let owner = Both::type_info().type_path();
        let off = select_factory(owner, &ctors::<Both>(), false).unwrap();
        assert!(off.is_no_args());

        let on = select_factory(owner, &ctors::<Both>(), true).unwrap();
        let names: Vec<_> = on.params().iter().map(|p| p.name()).collect();
        assert_eq!(names, [Some("name"), Some("age")]);

        let name: Box<dyn Reflect> = Box::new(String::from("ok"));
        let built = on.invoke(vec![Some(name), None]).unwrap();
        let expected = Both { name: "ok".into(), age: 0 };
        assert_eq!(built.take::<Both>().ok(), Some(expected));
    }

    #[test]
    fn classes_without_constructors_have_no_factory() {
        let owner = Neither::type_info().type_path();
        assert!(select_factory(owner, &ctors::<Neither>(), true).is_none());
    }
}
