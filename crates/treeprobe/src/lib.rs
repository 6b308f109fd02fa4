//! Load-checks compiled tree-sitter grammars.
//!
//! A grammar passes when its provider yields a non-null language that the
//! tree-sitter runtime can read and a parser accepts. Failures read
//! `Error loading <Name> grammar`, with the cause attached as the error source.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::multiple_crate_versions)]

/// Cross-checks a loaded language against its `grammar.json`.
pub mod conformance;

/// Error types for verification, registries, grammar files and samples.
pub mod error;

/// The `grammar.json` model.
///
/// Only what a conformance check needs to predict a language's node kinds
/// is modelled.
pub mod grammar;

/// Grammar providers and the handles they return.
///
/// This is the only module that touches raw pointers and the dynamic loader.
pub mod provider;

/// The table of grammars to verify, built in or read from JSON.
pub mod registry;

/// Parses source snippets with a loaded grammar.
pub mod sample;

/// The grammar load verifier.
pub mod verify;

pub use conformance::{check_conformance, ConformanceReport};
pub use error::{GrammarError, GrammarLoadFailure, LoadFailureReason, RegistryError, SampleError};
pub use grammar::{load_grammar, parse_grammar, Grammar, Rule};
pub use provider::{construct_language, GrammarHandle, Provider};
pub use registry::{GrammarEntry, Registry, KNOWN_GRAMMARS};
pub use sample::{parse_sample, parse_sample_file, SampleReport};
pub use verify::{verify_all, verify_grammar_loads, LoadedGrammar, Verification};

/// Generates one `#[test]` per grammar, each running
/// [`verify_grammar_loads`] on the given entry.
///
/// ```ignore
/// treeprobe::grammar_load_tests! {
///     can_load_json => GrammarEntry::new("json", Provider::linked(tree_sitter_json::LANGUAGE)),
/// }
/// ```
#[macro_export]
macro_rules! grammar_load_tests {
    ($($test:ident => $entry:expr),+ $(,)?) => {
        $(
            #[test]
            fn $test() {
                let entry: $crate::GrammarEntry = $entry;
                if let Err(err) = $crate::verify_grammar_loads(&entry) {
                    panic!("{}", err.detailed());
                }
            }
        )+
    };
}
