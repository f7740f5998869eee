use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{DeriveInput, FieldsNamed, Ident, LitStr, Path, Type};

use crate::attributes::{FieldAttributes, TypeAttributes};

/// One named field with its parsed attributes.
struct ReflectField<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    name: LitStr,
    attrs: FieldAttributes,
}

impl ReflectField<'_> {
    /// Whether the field becomes a constructor parameter.
    fn is_param(&self) -> bool {
        !self.attrs.ignore && self.attrs.any.is_none()
    }
}

fn field_name(ident: &Ident) -> LitStr {
    let text = ident.to_string();
    let text = text.strip_prefix("r#").unwrap_or(&text);
    LitStr::new(text, ident.span())
}

pub(crate) fn impl_struct(
    input: &DeriveInput,
    named: &FieldsNamed,
    jm_reflect: &Path,
) -> syn::Result<TokenStream> {
    let type_attrs = TypeAttributes::parse(&input.attrs)?;

    let mut fields = Vec::with_capacity(named.named.len());
    for field in &named.named {
        let Some(ident) = &field.ident else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        fields.push(ReflectField {
            ident,
            ty: &field.ty,
            name: field_name(ident),
            attrs: FieldAttributes::parse(&field.attrs)?,
        });
    }

    let record = type_attrs.record.is_some();
    let mut members = Vec::new();
    let mut parent: Option<Span> = None;

    for field in &fields {
        let ReflectField { ident, ty, name, attrs } = field;

        if let Some(span) = attrs.parent {
            if parent.is_some() {
                return Err(syn::Error::new(span, "a class has at most one parent"));
            }
            if record || type_attrs.constructor.is_some() {
                return Err(syn::Error::new(
                    span,
                    "`parent` cannot be combined with `record` or `constructor`",
                ));
            }
            parent = Some(span);
            members.push(quote! {
                .parent::<#ty>(#name, |v: &Self| &v.#ident, |v: &mut Self| &mut v.#ident)
            });
            continue;
        }

        if attrs.any.is_some() {
            members.push(quote! {
                .any_getter::<#ty>(|v: &Self| &v.#ident)
                .any_setter(
                    |v: &mut Self,
                     key: ::std::string::String,
                     value: <#ty as #jm_reflect::ops::MapOps>::Value| {
                        #jm_reflect::ops::MapOps::map_insert(&mut v.#ident, key, value);
                    },
                )
            });
            continue;
        }

        let member_attrs = attrs.member_attributes(jm_reflect);
        let readonly = (attrs.readonly || record).then(|| quote!(.readonly()));
        let synthetic = attrs.synthetic.then(|| quote!(.synthetic()));

        members.push(quote! {
            .with_field(
                #jm_reflect::info::FieldInfo::new::<Self, #ty>(
                    #name,
                    |v: &Self| &v.#ident,
                    |v: &mut Self| &mut v.#ident,
                )
                #readonly
                #synthetic
                #member_attrs
            )
        });

        if record {
            members.push(quote! {
                .with_method(
                    #jm_reflect::info::MethodInfo::accessor::<Self, #ty>(#name, |v: &Self| &v.#ident)
                    #member_attrs
                )
            });
        }
    }

    let all_args = || {
        let params = fields.iter().filter(|f| f.is_param()).map(|field| {
            let ty = field.ty;
            let name = &field.name;
            let member_attrs = field.attrs.member_attributes(jm_reflect);
            quote! {
                #jm_reflect::info::ParamInfo::new::<#ty>().named(#name) #member_attrs
            }
        });
        let mut index = 0_usize;
        let inits: Vec<_> = fields.iter().map(|field| {
            let ident = field.ident;
            if field.is_param() {
                let ty = field.ty;
                let init = quote!(#ident: args.take::<#ty>(#index)?);
                index += 1;
                init
            } else {
                quote!(#ident: ::core::default::Default::default())
            }
        }).collect();
        quote! {
            #jm_reflect::info::ConstructorInfo::new::<Self>(
                [#(#params),*],
                |args: &mut #jm_reflect::info::Args| -> ::core::result::Result<Self, #jm_reflect::AccessError> {
                    ::core::result::Result::Ok(Self { #(#inits,)* })
                },
            )
        }
    };

    let mut class_attrs = Vec::new();
    if type_attrs.default.is_some() {
        class_attrs.push(quote!(.default_constructor()));
    }
    if record {
        let ctor = all_args();
        class_attrs.push(quote!(.constructor(#ctor.canonical()).record()));
    }
    if type_attrs.constructor.is_some() {
        let ctor = all_args();
        class_attrs.push(quote!(.constructor(#ctor)));
    }
    if !type_attrs.order.is_empty() {
        let order = &type_attrs.order;
        class_attrs.push(quote!(.with_attribute(#jm_reflect::attrs::PropertyOrder(&[#(#order),*]))));
    }
    if !type_attrs.ignore.is_empty() {
        let ignore = &type_attrs.ignore;
        class_attrs.push(quote!(.with_attribute(#jm_reflect::attrs::IgnoreProperties(&[#(#ignore),*]))));
    }
    class_attrs.push(type_attrs.custom_attributes.get_chain());

    let body = quote! {
        #jm_reflect::info::TypeInfo::Class(
            #jm_reflect::info::ClassInfo::builder::<Self>()
                #(#members)*
                #(#class_attrs)*
                .build()
        )
    };

    Ok(crate::impl_typed(input, jm_reflect, body))
}
