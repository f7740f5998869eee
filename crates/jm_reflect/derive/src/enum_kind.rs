use proc_macro2::TokenStream;
use quote::quote;
use syn::{DataEnum, DeriveInput, Fields, LitStr, Path};

use crate::attributes::{TypeAttributes, VariantAttributes};

/// Unit enums: the variant list plus index conversions in both directions.
pub(crate) fn impl_enum(input: &DeriveInput, data: &DataEnum, jm_reflect: &Path) -> syn::Result<TokenStream> {
    let type_attrs = TypeAttributes::parse(&input.attrs)?;
    if let Some(span) = type_attrs.record.or(type_attrs.constructor).or(type_attrs.default) {
        return Err(syn::Error::new(span, "this attribute only applies to structs"));
    }
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(&input.ident, "an enum needs at least one variant"));
    }

    let mut variants = Vec::with_capacity(data.variants.len());
    let mut to_index = Vec::with_capacity(data.variants.len());
    let mut from_index = Vec::with_capacity(data.variants.len());

    for (index, variant) in data.variants.iter().enumerate() {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(variant, "only unit variants can be reflected"));
        }
        let ident = &variant.ident;
        let name = LitStr::new(&ident.to_string(), ident.span());
        let attrs = VariantAttributes::parse(&variant.attrs)?.variant_attributes(jm_reflect);

        variants.push(quote! {
            #jm_reflect::info::VariantInfo::new(#name) #attrs
        });
        to_index.push(quote!(Self::#ident => #index));
        from_index.push(quote! {
            #index => ::core::option::Option::Some(
                ::std::boxed::Box::new(Self::#ident) as ::std::boxed::Box<dyn #jm_reflect::Reflect>
            )
        });
    }

    let enum_attrs = type_attrs.custom_attributes.get_expression_with(jm_reflect);

    let body = quote! {
        #jm_reflect::info::TypeInfo::Enum(
            #jm_reflect::info::EnumInfo::new::<Self>(
                [#(#variants),*],
                |value| {
                    let value = value.downcast_ref::<Self>()?;
                    ::core::option::Option::Some(match value {
                        #(#to_index,)*
                    })
                },
                |index| match index {
                    #(#from_index,)*
                    _ => ::core::option::Option::None,
                },
            )
            #enum_attrs
        )
    };

    Ok(crate::impl_typed(input, jm_reflect, body))
}
