//! Cross-checks a loaded language against the grammar it was generated from.
//!
//! A compiled grammar should expose a node kind for every visible rule,
//! every string literal, every alias, and every visible external token of
//! its `grammar.json`. A kind that does not resolve usually means the shared
//! library was built from a stale or different grammar.

use std::collections::BTreeSet;

use tree_sitter::Language;

use crate::grammar::{Grammar, Rule};

/// Findings of [`check_conformance`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConformanceReport {
    /// `(grammar name, language name)` when the runtime reports a different
    /// name than `grammar.json`.
    pub name_mismatch: Option<(String, String)>,
    /// Visible rules and named aliases with no named node kind.
    pub missing_named: Vec<String>,
    /// Literals and anonymous aliases with no anonymous node kind.
    pub missing_anonymous: Vec<String>,
    /// Visible external tokens with no node kind.
    pub missing_externals: Vec<String>,
}

impl ConformanceReport {
    /// Whether nothing was found.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.name_mismatch.is_none()
            && self.missing_named.is_empty()
            && self.missing_anonymous.is_empty()
            && self.missing_externals.is_empty()
    }

    /// Total number of findings.
    #[must_use]
    pub fn finding_count(&self) -> usize {
        usize::from(self.name_mismatch.is_some())
            + self.missing_named.len()
            + self.missing_anonymous.len()
            + self.missing_externals.len()
    }
}

/// Compares `language` with `grammar` and reports the node kinds the
/// language lacks. Findings are also logged at `warn`.
#[must_use]
pub fn check_conformance(grammar: &Grammar, language: &Language) -> ConformanceReport {
    let mut report = ConformanceReport::default();

    if let Some(language_name) = language.name() {
        if language_name != grammar.name {
            tracing::warn!(
                grammar = %grammar.name,
                language = language_name,
                "language name differs from grammar.json"
            );
            report.name_mismatch = Some((grammar.name.clone(), language_name.to_string()));
        }
    }

    let mut named: BTreeSet<&str> = grammar.visible_rule_names().into_iter().collect();
    let mut anonymous = BTreeSet::new();
    for rule in grammar.rules.values() {
        collect_node_names(rule, &mut named, &mut anonymous);
    }

    report.missing_named = missing(language, &named, true);
    report.missing_anonymous = missing(language, &anonymous, false);

    let externals: BTreeSet<&str> = grammar
        .external_names()
        .into_iter()
        .filter(|name| !name.starts_with('_'))
        .collect();
    report.missing_externals = missing(language, &externals, true);

    for kind in &report.missing_named {
        tracing::warn!(
            grammar = %grammar.name,
            kind = %kind,
            "named node kind missing from language"
        );
    }
    for kind in &report.missing_anonymous {
        tracing::warn!(
            grammar = %grammar.name,
            kind = %kind,
            "anonymous node kind missing from language"
        );
    }
    for kind in &report.missing_externals {
        tracing::warn!(
            grammar = %grammar.name,
            kind = %kind,
            "external token missing from language"
        );
    }

    report
}

fn collect_node_names<'a>(
    rule: &'a Rule,
    named: &mut BTreeSet<&'a str>,
    anonymous: &mut BTreeSet<&'a str>,
) {
    if let Some((alias, is_named)) = rule.alias() {
        if is_named {
            named.insert(alias);
        } else {
            anonymous.insert(alias);
        }
    }

    if rule.is_token() {
        let mut literals = Vec::new();
        rule.collect_literals(&mut literals);
        anonymous.extend(literals);
        return;
    }

    if let Some(text) = rule.string_value() {
        anonymous.insert(text);
    }
    for child in rule.children() {
        collect_node_names(child, named, anonymous);
    }
}

fn missing(language: &Language, kinds: &BTreeSet<&str>, named: bool) -> Vec<String> {
    kinds
        .iter()
        .filter(|kind| language.id_for_node_kind(kind, named) == 0)
        .map(|kind| (*kind).to_string())
        .collect()
}
