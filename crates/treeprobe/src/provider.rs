//! Grammar providers and the handles they produce.
//!
//! A provider is the zero-argument `tree_sitter_<name>` entry point a compiled
//! grammar exports. It is either linked into the current binary or looked up
//! in a shared library at runtime.
#![allow(unsafe_code)]

use std::fmt;
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};
use tree_sitter::Language;
use tree_sitter_language::LanguageFn;

use crate::error::LoadFailureReason;

/// Raw signature of a grammar entry point.
pub type RawLanguageFn = unsafe extern "C" fn() -> *const ();

/// Where a grammar's language pointer comes from.
#[derive(Clone)]
pub enum Provider {
    /// A grammar linked into the running binary. Build one with
    /// [`Provider::linked`].
    Static(RawLanguageFn),

    /// A grammar compiled into a shared library and resolved at runtime.
    Library {
        /// Path handed to the dynamic loader.
        path: PathBuf,
        /// Exported entry point, usually `tree_sitter_<name>`.
        symbol: String,
    },
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Static(_) => f.write_str("Static"),
            Provider::Library { path, symbol } => f
                .debug_struct("Library")
                .field("path", path)
                .field("symbol", symbol)
                .finish(),
        }
    }
}

impl Provider {
    /// Provider for a grammar linked into the binary, such as
    /// `tree_sitter_json::LANGUAGE`.
    #[must_use]
    pub fn linked(language_fn: LanguageFn) -> Self {
        Provider::Static(language_fn.into_raw())
    }

    /// Shared-library provider for `path` exporting `symbol`.
    #[must_use]
    pub fn library(path: impl Into<PathBuf>, symbol: impl Into<String>) -> Self {
        Provider::Library {
            path: path.into(),
            symbol: symbol.into(),
        }
    }

    /// Invokes the provider.
    ///
    /// # Errors
    ///
    /// Returns [`LoadFailureReason::OpenLibrary`] or
    /// [`LoadFailureReason::MissingSymbol`] when a shared-library provider
    /// cannot be resolved. A provider that runs but returns null still
    /// yields a handle; see [`GrammarHandle::is_null`].
    pub fn resolve(&self) -> Result<GrammarHandle, LoadFailureReason> {
        match self {
            Provider::Static(entry) => Ok(GrammarHandle::from_fn(*entry, None)),
            Provider::Library { path, symbol } => resolve_library(path, symbol),
        }
    }
}

fn resolve_library(path: &Path, symbol: &str) -> Result<GrammarHandle, LoadFailureReason> {
    tracing::debug!(path = %path.display(), symbol, "opening grammar library");

    // SAFETY: loading a grammar library runs its initializers. Grammar
    // libraries produced by `tree-sitter generate` have none beyond libc's.
    let library =
        unsafe { Library::new(path) }.map_err(|source| LoadFailureReason::OpenLibrary {
            path: path.to_path_buf(),
            source,
        })?;

    let raw: RawLanguageFn = {
        // SAFETY: tree-sitter entry points take no arguments and return a
        // `const TSLanguage *`, which matches `RawLanguageFn`.
        let entry: Symbol<RawLanguageFn> = unsafe { library.get(symbol.as_bytes()) }
            .map_err(|source| LoadFailureReason::MissingSymbol {
                symbol: symbol.to_string(),
                path: path.to_path_buf(),
                source,
            })?;
        *entry
    };

    Ok(GrammarHandle::from_fn(raw, Some(library)))
}

/// The result of invoking a provider.
///
/// Holds the raw language pointer together with whatever keeps it valid.
pub struct GrammarHandle {
    raw: *const (),
    entry: RawLanguageFn,
    library: Option<Library>,
}

impl GrammarHandle {
    fn from_fn(entry: RawLanguageFn, library: Option<Library>) -> Self {
        // SAFETY: grammar entry points are pure accessors returning a
        // pointer to static data.
        let raw = unsafe { entry() };
        Self {
            raw,
            entry,
            library,
        }
    }

    /// Whether the provider returned a null pointer.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.raw.is_null()
    }

    pub(crate) fn into_library(self) -> Option<Library> {
        self.library
    }
}

/// Builds the runtime's [`Language`] from a handle.
///
/// Returns `None` for a null handle.
#[must_use]
pub fn construct_language(handle: &GrammarHandle) -> Option<Language> {
    if handle.is_null() {
        return None;
    }
    // SAFETY: `entry` is a grammar entry point, and it is kept valid by the
    // library the handle owns (if any).
    let language_fn = unsafe { LanguageFn::from_raw(handle.entry) };
    Some(Language::new(language_fn))
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn null_language() -> *const () {
        std::ptr::null()
    }

    #[test]
    fn test_static_provider_resolves() {
        let handle = Provider::linked(tree_sitter_json::LANGUAGE).resolve().unwrap();
        assert!(!handle.is_null());
        assert!(construct_language(&handle).is_some());
    }

    #[test]
    fn test_null_provider_yields_no_language() {
        let provider = Provider::Static(null_language);
        let handle = provider.resolve().unwrap();
        assert!(handle.is_null());
        assert!(construct_language(&handle).is_none());
    }

    #[test]
    fn test_missing_library_is_reported() {
        let provider = Provider::library("/nonexistent/libtree-sitter-fig.so", "tree_sitter_fig");
        let err = provider.resolve().err().unwrap();
        assert!(matches!(err, LoadFailureReason::OpenLibrary { .. }));
    }

    #[test]
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    fn test_missing_symbol_is_reported() {
        let provider = Provider::library("libc.so.6", "tree_sitter_fig");
        let err = provider.resolve().err().unwrap();
        assert!(
            matches!(err, LoadFailureReason::MissingSymbol { ref symbol, .. } if symbol == "tree_sitter_fig")
        );
    }

    #[test]
    fn test_debug_hides_function_pointer() {
        assert_eq!(
            format!("{:?}", Provider::linked(tree_sitter_json::LANGUAGE)),
            "Static"
        );
    }
}
