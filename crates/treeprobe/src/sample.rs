//! Parses a source snippet with a loaded grammar.
//!
//! Loading proves the runtime accepts the language; parsing a sample also
//! exercises the lexer and any external scanner the grammar links in.

use std::path::Path;

use tree_sitter::{Node, Parser, Point};

use crate::error::SampleError;
use crate::verify::LoadedGrammar;

/// Outcome of parsing one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleReport {
    /// Kind of the root node, e.g. `source_file`.
    pub root_kind: String,
    /// Number of `ERROR` and `MISSING` nodes in the tree.
    pub error_count: usize,
    /// Start of the first error node, in document order.
    pub first_error: Option<Point>,
}

impl SampleReport {
    /// Whether the sample parsed without errors.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.error_count == 0
    }
}

/// Parses `source` with `grammar`'s language.
///
/// # Errors
///
/// Returns [`SampleError::Language`] if a parser refuses the language and
/// [`SampleError::NoTree`] if parsing yields no tree.
pub fn parse_sample(grammar: &LoadedGrammar, source: &str) -> Result<SampleReport, SampleError> {
    let mut parser = Parser::new();
    parser.set_language(grammar.language())?;
    let tree = parser.parse(source, None).ok_or(SampleError::NoTree)?;
    let root = tree.root_node();

    let mut report = SampleReport {
        root_kind: root.kind().to_string(),
        error_count: 0,
        first_error: None,
    };
    if root.has_error() {
        count_errors(root, &mut report);
    }
    tracing::debug!(
        grammar = grammar.name(),
        root = %report.root_kind,
        errors = report.error_count,
        "parsed sample"
    );
    Ok(report)
}

/// Reads `path` and parses it with [`parse_sample`].
///
/// # Errors
///
/// Returns [`SampleError::Read`] when the file cannot be read, otherwise the
/// errors of [`parse_sample`].
pub fn parse_sample_file(grammar: &LoadedGrammar, path: &Path) -> Result<SampleReport, SampleError> {
    let source = std::fs::read_to_string(path).map_err(|source| SampleError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_sample(grammar, &source)
}

fn count_errors(node: Node<'_>, report: &mut SampleReport) {
    if node.is_error() || node.is_missing() {
        report.error_count += 1;
        report.first_error.get_or_insert(node.start_position());
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() || child.is_missing() {
            count_errors(child, report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Provider;
    use crate::registry::GrammarEntry;
    use crate::verify::verify_grammar_loads;

    fn json() -> LoadedGrammar {
        let entry = GrammarEntry::new("json", Provider::linked(tree_sitter_json::LANGUAGE));
        verify_grammar_loads(&entry).unwrap()
    }

    #[test]
    fn test_valid_sample_is_clean() {
        let report = parse_sample(&json(), r#"{"fig": [1, 2], "nyx": null}"#).unwrap();
        assert_eq!(report.root_kind, "document");
        assert!(report.is_clean());
        assert_eq!(report.first_error, None);
    }

    #[test]
    fn test_broken_sample_reports_errors() {
        let report = parse_sample(&json(), "{\"fig\": [1, 2,,]\n").unwrap();
        assert!(!report.is_clean());
        assert!(report.error_count >= 1);
        assert!(report.first_error.is_some());
    }

    #[test]
    fn test_missing_sample_file() {
        let err = parse_sample_file(&json(), Path::new("/nonexistent/sample.json")).unwrap_err();
        assert!(matches!(err, SampleError::Read { .. }));
    }
}
