//! The `grammar.json` model used for conformance checks.
//!
//! `tree-sitter generate` writes `src/grammar.json` next to the parser it
//! produces. Only the parts needed to predict which node kinds a compiled
//! language must expose are modelled here; other keys are ignored.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::GrammarError;

mod rules;

pub use rules::{Rule, RuleType, RuleValue};

/// A parsed `grammar.json`.
///
/// See <https://tree-sitter.github.io/tree-sitter/assets/schemas/grammar.schema.json>
#[derive(Debug, Clone, Deserialize)]
pub struct Grammar {
    /// Grammar name, e.g. `"fig"`.
    pub name: String,

    /// Rule definitions keyed by rule name.
    pub rules: HashMap<String, Rule>,

    /// Tokens allowed anywhere, such as whitespace and comments.
    #[serde(default)]
    pub extras: Option<Vec<Rule>>,

    /// Tokens produced by the external scanner.
    #[serde(default)]
    pub externals: Option<Vec<Rule>>,

    /// Rules inlined at their use sites; they never become nodes.
    #[serde(default)]
    pub inline: Option<Vec<String>>,

    /// Declared LR conflicts.
    #[serde(default)]
    pub conflicts: Option<Vec<Vec<String>>>,

    /// Keyword extraction token.
    #[serde(default)]
    pub word: Option<String>,

    /// Hidden rules exposed as supertypes.
    #[serde(default)]
    pub supertypes: Option<Vec<String>>,
}

impl Grammar {
    /// Whether `rule_name` is listed under `inline`.
    #[must_use]
    pub fn is_inlined(&self, rule_name: &str) -> bool {
        self.inline
            .as_ref()
            .is_some_and(|names| names.iter().any(|n| n == rule_name))
    }

    /// Names of the symbols the external scanner defines.
    #[must_use]
    pub fn external_names(&self) -> Vec<&str> {
        self.externals
            .iter()
            .flatten()
            .filter_map(|rule| rule.symbol_name())
            .collect()
    }

    /// Rule names that become visible named nodes: not hidden (`_`-prefixed)
    /// and not inlined. Sorted for stable reporting.
    #[must_use]
    pub fn visible_rule_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .rules
            .keys()
            .map(String::as_str)
            .filter(|name| !name.starts_with('_') && !self.is_inlined(name))
            .collect();
        names.sort_unstable();
        names
    }
}

/// Parses a `grammar.json` document.
///
/// # Errors
///
/// Returns [`GrammarError::JsonParse`] for malformed input and
/// [`GrammarError::Validation`] when the grammar has no rules or references a
/// symbol it never defines.
pub fn parse_grammar(json: &str) -> Result<Grammar, GrammarError> {
    let grammar: Grammar =
        serde_json::from_str(json).map_err(|e| GrammarError::JsonParse(e.to_string()))?;
    check_symbols(&grammar)?;
    Ok(grammar)
}

/// Reads and parses a `grammar.json` file.
///
/// # Errors
///
/// Returns [`GrammarError::Read`] when the file cannot be read, otherwise the
/// errors of [`parse_grammar`].
pub fn load_grammar(path: &Path) -> Result<Grammar, GrammarError> {
    let json = std::fs::read_to_string(path).map_err(|source| GrammarError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_grammar(&json)
}

fn check_symbols(grammar: &Grammar) -> Result<(), GrammarError> {
    if grammar.rules.is_empty() {
        return Err(GrammarError::Validation(format!(
            "grammar '{}' has no rules",
            grammar.name
        )));
    }

    let mut defined: HashSet<&str> = grammar.rules.keys().map(String::as_str).collect();
    defined.extend(grammar.external_names());

    let mut rule_names: Vec<&String> = grammar.rules.keys().collect();
    rule_names.sort_unstable();
    for rule_name in rule_names {
        let mut referenced = Vec::new();
        grammar.rules[rule_name].collect_symbols(&mut referenced);
        if let Some(missing) = referenced.iter().find(|name| !defined.contains(*name)) {
            return Err(GrammarError::Validation(format!(
                "undefined symbol '{missing}' referenced in rule '{rule_name}'"
            )));
        }
    }
    Ok(())
}
