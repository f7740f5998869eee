//! Parsing of `#[reflect(...)]` attributes.
//!
//! Every level accepts a comma separated list. `@expr` items attach an
//! arbitrary value to the custom attribute table of the item.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::ext::IdentExt;
use syn::parse::ParseStream;
use syn::punctuated::Punctuated;
use syn::{Attribute, Expr, Ident, LitInt, LitStr, Path, Token, parenthesized};

use crate::REFLECT_ATTRIBUTE_NAME;

// -----------------------------------------------------------------------------
// Custom attributes

/// A container for custom attribute expressions.
///
/// This corresponds to `jm_reflect::info::CustomAttributes`.
#[derive(Default)]
pub(crate) struct CustomAttributes {
    attributes: Vec<TokenStream>,
}

impl CustomAttributes {
    pub fn push(&mut self, value: TokenStream) {
        self.attributes.push(value);
    }

    /// Parse `@` attribute.
    ///
    /// Examples:
    /// - `#[reflect(@Foo)]`
    /// - `#[reflect(@Bar::baz("qux"))]`
    pub fn parse_inner_stream(&mut self, input: ParseStream) -> syn::Result<()> {
        input.parse::<Token![@]>()?;
        let expr: Expr = input.parse()?;
        self.push(quote!(#expr));
        Ok(())
    }

    /// If empty, returns an empty token stream.
    ///
    /// Otherwise, it will return content similar to this:
    ///
    /// ```ignore
    /// .with_custom_attributes(
    ///     _path_::info::CustomAttributes::new()
    ///         (.with_attribute( ... ))*
    /// )
    /// ```
    pub fn get_expression_with(&self, jm_reflect: &Path) -> TokenStream {
        if self.attributes.is_empty() {
            return TokenStream::new();
        }

        let with_attributes = self.attributes.iter().map(|value| {
            quote! {
                .with_attribute(#value)
            }
        });

        quote! {
            .with_custom_attributes(
                #jm_reflect::info::CustomAttributes::new()
                    #(#with_attributes)*
            )
        }
    }

    /// The raw `.with_attribute(..)` chain, for builders that only offer
    /// single insertions.
    pub fn get_chain(&self) -> TokenStream {
        let values = &self.attributes;
        quote! {
            #(.with_attribute(#values))*
        }
    }
}

// -----------------------------------------------------------------------------
// Parsing helpers

/// Runs `item` on every entry of every `#[reflect(...)]` attribute.
fn parse_reflect_attrs(
    attrs: &[Attribute],
    custom: &mut CustomAttributes,
    mut item: impl FnMut(&Ident, ParseStream) -> syn::Result<()>,
) -> syn::Result<()> {
    for attr in attrs {
        if !attr.path().is_ident(REFLECT_ATTRIBUTE_NAME) {
            continue;
        }
        attr.parse_args_with(|input: ParseStream| {
            while !input.is_empty() {
                if input.peek(Token![@]) {
                    custom.parse_inner_stream(input)?;
                } else {
                    let ident = input.call(Ident::parse_any)?;
                    item(&ident, input)?;
                }
                if input.is_empty() {
                    break;
                }
                input.parse::<Token![,]>()?;
            }
            Ok(())
        })?;
    }
    Ok(())
}

fn parse_string_value(input: ParseStream) -> syn::Result<LitStr> {
    input.parse::<Token![=]>()?;
    input.parse()
}

fn parse_string_list(input: ParseStream) -> syn::Result<Vec<LitStr>> {
    let content;
    parenthesized!(content in input);
    let list = Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?;
    Ok(list.into_iter().collect())
}

fn unknown(ident: &Ident) -> syn::Error {
    syn::Error::new(ident.span(), format!("unknown reflect attribute `{ident}`"))
}

// -----------------------------------------------------------------------------
// Type attributes

/// Attributes on a struct or enum.
#[derive(Default)]
pub(crate) struct TypeAttributes {
    /// `#[reflect(default)]`: no-args constructor from `Default`.
    pub default: Option<Span>,
    /// `#[reflect(record)]`: canonical constructor plus accessors.
    pub record: Option<Span>,
    /// `#[reflect(constructor)]`: annotated all-args constructor.
    pub constructor: Option<Span>,
    /// `#[reflect(order("a", "b"))]`
    pub order: Vec<LitStr>,
    /// `#[reflect(ignore("a", "b"))]`
    pub ignore: Vec<LitStr>,
    pub custom_attributes: CustomAttributes,
}

impl TypeAttributes {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        let mut custom = CustomAttributes::default();
        parse_reflect_attrs(attrs, &mut custom, |ident, input| {
            match ident.to_string().as_str() {
                "default" => this.default = Some(ident.span()),
                "record" => this.record = Some(ident.span()),
                "constructor" => this.constructor = Some(ident.span()),
                "order" => this.order.extend(parse_string_list(input)?),
                "ignore" => this.ignore.extend(parse_string_list(input)?),
                _ => return Err(unknown(ident)),
            }
            Ok(())
        })?;
        this.custom_attributes = custom;
        Ok(this)
    }
}

// -----------------------------------------------------------------------------
// Field attributes

/// Attributes on a named field.
#[derive(Default)]
pub(crate) struct FieldAttributes {
    pub rename: Option<LitStr>,
    pub ignore: bool,
    pub since: Option<LitInt>,
    pub readonly: bool,
    pub synthetic: bool,
    /// The field is the parent projection of the class.
    pub parent: Option<Span>,
    /// The field is a string-keyed map collecting extra properties.
    pub any: Option<Span>,
    pub custom_attributes: CustomAttributes,
}

impl FieldAttributes {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        let mut custom = CustomAttributes::default();
        parse_reflect_attrs(attrs, &mut custom, |ident, input| {
            match ident.to_string().as_str() {
                "rename" => this.rename = Some(parse_string_value(input)?),
                "ignore" => this.ignore = true,
                "since" => {
                    input.parse::<Token![=]>()?;
                    this.since = Some(input.parse()?);
                }
                "readonly" => this.readonly = true,
                "synthetic" => this.synthetic = true,
                "parent" => this.parent = Some(ident.span()),
                "any" => this.any = Some(ident.span()),
                _ => return Err(unknown(ident)),
            }
            Ok(())
        })?;
        this.custom_attributes = custom;
        Ok(this)
    }

    /// Attribute records shared by the field, its accessor and its
    /// constructor parameter.
    pub fn member_attributes(&self, jm_reflect: &Path) -> TokenStream {
        let mut custom = CustomAttributes::default();
        if let Some(rename) = &self.rename {
            custom.push(quote!(#jm_reflect::attrs::Rename(#rename)));
        }
        if self.ignore {
            custom.push(quote!(#jm_reflect::attrs::Ignore));
        }
        if let Some(since) = &self.since {
            custom.push(quote!(#jm_reflect::attrs::Since(#since)));
        }
        custom.attributes.extend(self.custom_attributes.attributes.iter().cloned());
        custom.get_expression_with(jm_reflect)
    }
}

// -----------------------------------------------------------------------------
// Variant attributes

/// Attributes on a unit enum variant.
#[derive(Default)]
pub(crate) struct VariantAttributes {
    pub rename: Option<LitStr>,
    pub custom_attributes: CustomAttributes,
}

impl VariantAttributes {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        let mut custom = CustomAttributes::default();
        parse_reflect_attrs(attrs, &mut custom, |ident, input| {
            match ident.to_string().as_str() {
                "rename" => this.rename = Some(parse_string_value(input)?),
                _ => return Err(unknown(ident)),
            }
            Ok(())
        })?;
        this.custom_attributes = custom;
        Ok(this)
    }

    pub fn variant_attributes(&self, jm_reflect: &Path) -> TokenStream {
        let mut custom = CustomAttributes::default();
        if let Some(rename) = &self.rename {
            custom.push(quote!(#jm_reflect::attrs::Rename(#rename)));
        }
        custom.attributes.extend(self.custom_attributes.attributes.iter().cloned());
        custom.get_expression_with(jm_reflect)
    }
}
