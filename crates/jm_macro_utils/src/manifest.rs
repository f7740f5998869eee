use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use proc_macro2::Span;
use toml_edit::{Document, Item, Table};

/// The caller's `Cargo.toml`, used to find how generated code can name
/// another crate of the workspace.
///
/// ```rust
/// # use jm_macro_utils::Manifest;
/// let p: syn::Path = Manifest::shared(|m| m.get_crate_path("jm_reflect"));
/// ```
///
/// # Resolution rules
///
/// 1. If the requested crate is listed in `dependencies`, return `::crate_name`.
/// 2. If the requested crate name begins with `jm_` and the caller depends on
///    `jm_core`, return `::jm_core::short_name` (`jm_reflect` -> `::jm_core::reflect`).
/// 3. Repeat step 1-2 in `dev-dependencies`.
/// 4. Otherwise, fall back to `::crate_name`.
///
/// A crate that names itself through generated code needs
/// `extern crate self as crate_name;` in its root.
#[derive(Debug)]
pub struct Manifest {
    pub manifest: Option<Document<Box<str>>>,
    pub modified_time: Option<SystemTime>,
}

const CORE_NAME: &str = "jm_core";
const PREFIX: &str = "jm_";

impl Manifest {
    fn manifest_path() -> Option<PathBuf> {
        let mut path = PathBuf::from(env::var_os("CARGO_MANIFEST_DIR")?);
        path.push("Cargo.toml");
        Some(path)
    }

    fn modified_time(path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
    }

    // An unreadable manifest behaves like one without dependencies.
    fn read(path: &Path) -> Option<Document<Box<str>>> {
        let text = std::fs::read_to_string(path).ok()?;
        Document::parse(text.into_boxed_str()).ok()
    }

    /// `::a::b::..` from plain segments.
    fn absolute(segments: &[&str]) -> syn::Path {
        syn::Path {
            leading_colon: Some(Default::default()),
            segments: segments
                .iter()
                .map(|segment| syn::PathSegment::from(syn::Ident::new(segment, Span::call_site())))
                .collect(),
        }
    }

    fn find_in_deps(deps: &Table, name: &str) -> Option<syn::Path> {
        if deps.contains_key(name) {
            return Some(Self::absolute(&[name]));
        }
        let module = name.strip_prefix(PREFIX)?;
        deps.contains_key(CORE_NAME)
            .then(|| Self::absolute(&[CORE_NAME, module]))
    }

    /// Returns the path under which `name` is visible to the caller.
    pub fn get_crate_path(&self, name: &str) -> syn::Path {
        let Some(manifest) = &self.manifest else {
            return Self::absolute(&[name]);
        };
        for section in ["dependencies", "dev-dependencies"] {
            if let Some(Item::Table(deps)) = manifest.get(section)
                && let Some(path) = Self::find_in_deps(deps, name)
            {
                return path;
            }
        }
        Self::absolute(&[name])
    }

    /// Runs `func` against the caller's manifest.
    ///
    /// Parsed manifests are cached per path and re-read only when the file
    /// changes. Call this once per macro invocation.
    pub fn shared<R>(func: impl FnOnce(&Self) -> R) -> R {
        static MANIFESTS: RwLock<BTreeMap<PathBuf, Manifest>> = RwLock::new(BTreeMap::new());

        let Some(path) = Self::manifest_path() else {
            return func(&Manifest {
                manifest: None,
                modified_time: None,
            });
        };
        let modified_time = Self::modified_time(&path);

        let manifests = MANIFESTS.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(manifest) = manifests.get(&path)
            && manifest.modified_time.is_some()
            && manifest.modified_time == modified_time
        {
            return func(manifest);
        }
        drop(manifests);

        let manifest = Manifest {
            manifest: Self::read(&path),
            modified_time,
        };
        let result = func(&manifest);

        MANIFESTS
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, manifest);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(text: &str) -> Manifest {
        Manifest {
            manifest: Some(Document::parse(Box::from(text)).unwrap()),
            modified_time: None,
        }
    }

    fn render(path: &syn::Path) -> String {
        path.segments
            .iter()
            .map(|s| s.ident.to_string())
            .collect::<Vec<_>>()
            .join("::")
    }

    #[test]
    fn direct_dependency_wins() {
        let m = manifest("[dependencies]\njm_reflect = \"0.1\"\njm_core = \"0.1\"\n");
        assert_eq!(render(&m.get_crate_path("jm_reflect")), "jm_reflect");
    }

    #[test]
    fn core_reexport_is_used() {
        let m = manifest("[dev-dependencies]\njm_core = { path = \"..\" }\n");
        let path = m.get_crate_path("jm_reflect");
        assert!(path.leading_colon.is_some());
        assert_eq!(render(&path), "jm_core::reflect");
    }

    #[test]
    fn unknown_crate_falls_back() {
        let m = manifest("[package]\nname = \"x\"\n");
        assert_eq!(render(&m.get_crate_path("jm_reflect")), "jm_reflect");
    }
}
