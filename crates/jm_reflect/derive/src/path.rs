//! The path under which generated code names `jm_reflect`.

/// Get the correct access path to the `jm_reflect` crate.
///
/// 1. For crates that depend on `jm_reflect`, `::jm_reflect` is returned.
/// 2. For crates that depend on `jm_core`, `::jm_core::reflect` is returned.
/// 3. Otherwise `::jm_reflect` is returned, which may be incorrect.
///
/// This reads the caller's manifest, so it is resolved once per derive and
/// passed around.
pub(crate) fn jm_reflect() -> syn::Path {
    jm_macro_utils::Manifest::shared(|manifest| manifest.get_crate_path("jm_reflect"))
}
