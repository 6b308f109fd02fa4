//! Checks that a grammar loads into the tree-sitter runtime.
//!
//! [`verify_grammar_loads`] runs the whole check for one [`GrammarEntry`]:
//! invoke the provider, build a [`Language`], confirm the runtime can read
//! its ABI, and hand it to a [`Parser`]. [`verify_all`] does the same for every
//! entry of a [`Registry`], one thread per grammar.

use std::{panic, thread};

use libloading::Library;
use tree_sitter::{Language, Parser, LANGUAGE_VERSION, MIN_COMPATIBLE_LANGUAGE_VERSION};

use crate::error::{GrammarLoadFailure, LoadFailureReason};
use crate::provider::construct_language;
use crate::registry::{GrammarEntry, Registry};

/// A grammar that passed verification.
///
/// Owns the shared library its language points into, if any, so the
/// language stays valid for as long as this value lives.
pub struct LoadedGrammar {
    name: String,
    // Dropped before `library`.
    language: Language,
    abi_version: usize,
    library: Option<Library>,
}

impl LoadedGrammar {
    /// Registry name of the grammar.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The loaded language.
    #[must_use]
    pub fn language(&self) -> &Language {
        &self.language
    }

    /// ABI version the grammar was generated with.
    #[must_use]
    pub fn abi_version(&self) -> usize {
        self.abi_version
    }

    /// Whether the language came from a shared library.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        self.library.is_some()
    }
}

impl std::fmt::Debug for LoadedGrammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedGrammar")
            .field("name", &self.name)
            .field("abi_version", &self.abi_version)
            .field("dynamic", &self.is_dynamic())
            .finish_non_exhaustive()
    }
}

/// Verifies that `entry`'s grammar can be instantiated by the runtime.
///
/// # Errors
///
/// Returns [`GrammarLoadFailure`] (`Error loading <Name> grammar`) when the
/// provider cannot be resolved, returns null, targets an unsupported ABI, or
/// is refused by a parser. The cause is available as the error source.
pub fn verify_grammar_loads(entry: &GrammarEntry) -> Result<LoadedGrammar, GrammarLoadFailure> {
    tracing::debug!(grammar = entry.name(), provider = ?entry.provider(), "verifying grammar");
    load(entry).map_err(|reason| {
        tracing::debug!(grammar = entry.name(), %reason, "grammar failed to load");
        GrammarLoadFailure::new(entry.name(), entry.display_name(), reason)
    })
}

fn load(entry: &GrammarEntry) -> Result<LoadedGrammar, LoadFailureReason> {
    let handle = entry.provider().resolve()?;
    let language = construct_language(&handle).ok_or(LoadFailureReason::NullLanguage)?;

    let abi_version = language.abi_version();
    if !(MIN_COMPATIBLE_LANGUAGE_VERSION..=LANGUAGE_VERSION).contains(&abi_version) {
        return Err(LoadFailureReason::IncompatibleAbi {
            found: abi_version,
            min: MIN_COMPATIBLE_LANGUAGE_VERSION,
            max: LANGUAGE_VERSION,
        });
    }

    let mut parser = Parser::new();
    parser.set_language(&language)?;

    tracing::debug!(grammar = entry.name(), abi_version, "grammar loaded");
    Ok(LoadedGrammar {
        name: entry.name().to_string(),
        language,
        abi_version,
        library: handle.into_library(),
    })
}

/// The outcome of verifying one registry entry.
#[derive(Debug)]
pub struct Verification {
    /// Registry name of the grammar.
    pub grammar: String,
    /// The loaded grammar, or why it failed.
    pub result: Result<LoadedGrammar, GrammarLoadFailure>,
}

impl Verification {
    /// Whether the grammar loaded.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Verifies every grammar in `registry`, each on its own thread.
///
/// Results come back in registry order, and one grammar's failure never
/// changes another's result.
#[must_use]
pub fn verify_all(registry: &Registry) -> Vec<Verification> {
    thread::scope(|scope| {
        let workers: Vec<_> = registry
            .entries()
            .iter()
            .map(|entry| (entry, scope.spawn(move || verify_grammar_loads(entry))))
            .collect();

        workers
            .into_iter()
            .map(|(entry, worker)| Verification {
                grammar: entry.name().to_string(),
                result: worker
                    .join()
                    .unwrap_or_else(|payload| panic::resume_unwind(payload)),
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Provider;

    extern "C" fn null_language() -> *const () {
        std::ptr::null()
    }

    #[test]
    fn test_linked_grammar_verifies() {
        let entry = GrammarEntry::new("json", Provider::linked(tree_sitter_json::LANGUAGE));
        let loaded = verify_grammar_loads(&entry).unwrap();
        assert_eq!(loaded.name(), "json");
        assert!(!loaded.is_dynamic());
        assert!(loaded.abi_version() >= MIN_COMPATIBLE_LANGUAGE_VERSION);
        assert!(loaded.language().node_kind_count() > 0);
    }

    #[test]
    fn test_null_language_fails_with_grammar_message() {
        let entry = GrammarEntry::new("nyx", Provider::Static(null_language));
        let err = verify_grammar_loads(&entry).unwrap_err();
        assert_eq!(err.to_string(), "Error loading Nyx grammar");
        assert!(matches!(err.reason(), LoadFailureReason::NullLanguage));
    }
}
