//! See the [`Reflect`] derive macro.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Path, parse_macro_input, parse_quote};

static REFLECT_ATTRIBUTE_NAME: &str = "reflect";

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod enum_kind;
mod path;
mod struct_kind;

// -----------------------------------------------------------------------------
// Macros

/// # Reflection Derivation
///
/// `#[derive(Reflect)]` implements `Typed`, and with it `Reflect`.
///
/// - Structs with named fields become a `ClassInfo`.
/// - Enums made of unit variants become an `EnumInfo`.
///
/// Generic types are supported; every type parameter must be `Typed`.
///
/// ## Field attributes
///
/// ```rust, ignore
/// #[derive(Reflect)]
/// struct Account {
///     #[reflect(rename = "login")]
///     user: String,
///     #[reflect(since = 2)]
///     email: Option<String>,
///     #[reflect(ignore)]
///     cache: Vec<u8>,
///     #[reflect(readonly)]
///     id: u64,
///     #[reflect(synthetic)]
///     generated: u32,
///     #[reflect(parent)]
///     base: Entity,
///     #[reflect(any)]
///     extra: IndexMap<String, Value>,
///     #[reflect(@Tag("pk"))]
///     key: String,
/// }
/// ```
///
/// - `rename`, `ignore` and `since` attach `Rename`, `Ignore` and `Since`.
/// - `readonly` and `synthetic` flag the field.
/// - `parent` makes the field the parent projection; its members are
///   inherited and shadowed by fields of the same name.
/// - `any` makes a string-keyed map the any-getter and any-setter.
/// - `@expr` attaches any value as a custom attribute.
///
/// ## Type attributes
///
/// ```rust, ignore
/// #[derive(Reflect, Default)]
/// #[reflect(default, order("id", "name"), ignore("secret"), @Tag("table"))]
/// struct Row { /* ... */ }
///
/// #[derive(Reflect)]
/// #[reflect(record)]
/// struct Point { x: i32, y: i32 }
/// ```
///
/// - `default` adds a no-args constructor calling `Default::default`.
/// - `record` marks a record: fields are readonly, an accessor is added per
///   field and the all-args constructor is canonical.
/// - `constructor` adds an all-args constructor whose parameters carry the
///   field names.
/// - `order(..)` and `ignore(..)` attach `PropertyOrder` and
///   `IgnoreProperties`.
///
/// Enum variants accept `rename` and `@expr`.
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let jm_reflect = path::jm_reflect();

    let result = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => struct_kind::impl_struct(&input, named, &jm_reflect),
            _ => Err(syn::Error::new_spanned(
                &input.ident,
                "only structs with named fields can be reflected",
            )),
        },
        Data::Enum(data) => enum_kind::impl_enum(&input, data, &jm_reflect),
        Data::Union(_) => Err(syn::Error::new_spanned(&input.ident, "unions cannot be reflected")),
    };

    match result {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

// -----------------------------------------------------------------------------
// Shared

/// Wraps `body`, an expression building the `TypeInfo`, into a `Typed` impl.
///
/// Non-generic types cache the info in a `NonGenericTypeInfoCell`, generic
/// ones in a `GenericTypeInfoCell`.
fn impl_typed(input: &DeriveInput, jm_reflect: &Path, body: TokenStream2) -> TokenStream2 {
    let ident = &input.ident;

    let mut generics = input.generics.clone();
    let type_params: Vec<_> = generics.type_params().map(|param| param.ident.clone()).collect();
    if !type_params.is_empty() {
        let where_clause = generics.make_where_clause();
        for param in &type_params {
            where_clause
                .predicates
                .push(parse_quote!(#param: #jm_reflect::info::Typed));
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let cell = if input.generics.params.is_empty() {
        quote! {
            static CELL: #jm_reflect::impls::NonGenericTypeInfoCell =
                #jm_reflect::impls::NonGenericTypeInfoCell::new();
            CELL.get_or_init(|| #body)
        }
    } else {
        quote! {
            static CELL: #jm_reflect::impls::GenericTypeInfoCell =
                #jm_reflect::impls::GenericTypeInfoCell::new();
            CELL.get_or_insert::<Self>(|| #body)
        }
    };

    quote! {
        impl #impl_generics #jm_reflect::info::Typed for #ident #ty_generics #where_clause {
            fn type_info() -> &'static #jm_reflect::info::TypeInfo {
                #cell
            }
        }
    }
}
