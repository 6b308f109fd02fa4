//! The table of grammars to verify.
//!
//! Each [`GrammarEntry`] pairs a grammar name with the [`Provider`] that
//! yields its language. A [`Registry`] is an ordered list of such entries
//! with unique names, either the built-in table ([`KNOWN_GRAMMARS`]) or one
//! read from a JSON registry file with [`facet_json`]:
//!
//! ```json
//! {
//!   "grammar_dir": "build",
//!   "grammars": [
//!     { "name": "fig", "grammar_json": "fig/src/grammar.json" },
//!     { "name": "nyx", "library": "libnyx.so", "symbol": "tree_sitter_nyx" }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use facet::Facet;

use crate::error::RegistryError;
use crate::provider::Provider;

/// Grammars shipped by this project, in verification order.
pub const KNOWN_GRAMMARS: &[&str] = &["fig", "nyx"];

/// A grammar name paired with its provider.
#[derive(Debug, Clone)]
pub struct GrammarEntry {
    name: String,
    display_name: String,
    provider: Provider,
    grammar_json: Option<PathBuf>,
    sample: Option<PathBuf>,
}

impl GrammarEntry {
    /// Creates an entry whose display name is derived from `name`.
    pub fn new(name: impl Into<String>, provider: Provider) -> Self {
        let name = name.into();
        Self {
            display_name: default_display_name(&name),
            name,
            provider,
            grammar_json: None,
            sample: None,
        }
    }

    /// Overrides the name used in failure messages.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Attaches the grammar's `grammar.json` for conformance checks.
    #[must_use]
    pub fn with_grammar_json(mut self, path: impl Into<PathBuf>) -> Self {
        self.grammar_json = Some(path.into());
        self
    }

    /// Attaches a source file to parse once the grammar loads.
    #[must_use]
    pub fn with_sample(mut self, path: impl Into<PathBuf>) -> Self {
        self.sample = Some(path.into());
        self
    }

    /// Registry name, e.g. `fig`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name used in messages, e.g. `Fig`.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Where the language comes from.
    #[must_use]
    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Path to the grammar's `grammar.json`, if configured.
    #[must_use]
    pub fn grammar_json(&self) -> Option<&Path> {
        self.grammar_json.as_deref()
    }

    /// Path to a sample source file, if configured.
    #[must_use]
    pub fn sample(&self) -> Option<&Path> {
        self.sample.as_deref()
    }
}

/// An ordered set of grammars with unique names.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: Vec<GrammarEntry>,
}

impl Registry {
    /// Builds a registry from explicit entries.
    ///
    /// # Errors
    ///
    /// Fails when `entries` is empty, a name is invalid, or a name repeats.
    pub fn new(entries: Vec<GrammarEntry>) -> Result<Self, RegistryError> {
        if entries.is_empty() {
            return Err(RegistryError::Empty);
        }
        let mut seen = HashSet::new();
        for entry in &entries {
            if !is_valid_name(entry.name()) {
                return Err(RegistryError::InvalidName(entry.name().to_string()));
            }
            if !seen.insert(entry.name()) {
                return Err(RegistryError::Duplicate(entry.name().to_string()));
            }
        }
        Ok(Self { entries })
    }

    /// The built-in table: every name in [`KNOWN_GRAMMARS`], loaded from
    /// `grammar_dir` under its conventional library and symbol names.
    #[must_use]
    pub fn known_grammars(grammar_dir: &Path) -> Self {
        let entries = KNOWN_GRAMMARS
            .iter()
            .map(|name| {
                GrammarEntry::new(
                    *name,
                    Provider::library(
                        default_library_path(grammar_dir, name),
                        default_symbol(name),
                    ),
                )
            })
            .collect();
        Self { entries }
    }

    /// Reads a JSON registry file. Relative paths inside it resolve against
    /// the file's directory.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or [`Registry::from_json`] fails.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let json = std::fs::read_to_string(path).map_err(|source| RegistryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_json(&json, base_dir)
    }

    /// Parses a JSON registry. `base_dir` anchors a relative `grammar_dir`;
    /// every other relative path is taken from `grammar_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::JsonParse`] for malformed input and the
    /// errors of [`Registry::new`] for an invalid table.
    pub fn from_json(json: &str, base_dir: &Path) -> Result<Self, RegistryError> {
        let file: RegistryFile =
            facet_json::from_str(json).map_err(|e| RegistryError::JsonParse(e.to_string()))?;

        let grammar_dir = match &file.grammar_dir {
            Some(dir) => base_dir.join(dir),
            None => base_dir.to_path_buf(),
        };

        let entries = file
            .grammars
            .into_iter()
            .map(|spec| spec.into_entry(&grammar_dir))
            .collect();
        Self::new(entries)
    }

    /// Keeps only the named grammars, in registry order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Unknown`] for a name not in the registry and
    /// [`RegistryError::Empty`] when `names` is empty.
    pub fn select<I, S>(&self, names: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wanted: Vec<S> = names.into_iter().collect();
        for name in &wanted {
            if self.get(name.as_ref()).is_none() {
                return Err(RegistryError::Unknown(name.as_ref().to_string()));
            }
        }
        let entries = self
            .entries
            .iter()
            .filter(|entry| wanted.iter().any(|w| w.as_ref() == entry.name()))
            .cloned()
            .collect();
        Self::new(entries)
    }

    /// Looks up an entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&GrammarEntry> {
        self.entries.iter().find(|entry| entry.name() == name)
    }

    /// All entries in order.
    #[must_use]
    pub fn entries(&self) -> &[GrammarEntry] {
        &self.entries
    }

    /// Number of grammars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false` for a registry built through the public constructors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// On-disk registry layout.
#[derive(Debug, Facet)]
struct RegistryFile {
    #[facet(default)]
    grammar_dir: Option<String>,

    grammars: Vec<GrammarSpec>,
}

/// One grammar in a registry file. Everything but `name` has a default.
#[derive(Debug, Facet)]
struct GrammarSpec {
    name: String,

    #[facet(default)]
    display_name: Option<String>,

    #[facet(default)]
    library: Option<String>,

    #[facet(default)]
    symbol: Option<String>,

    #[facet(default)]
    grammar_json: Option<String>,

    #[facet(default)]
    sample: Option<String>,
}

impl GrammarSpec {
    fn into_entry(self, grammar_dir: &Path) -> GrammarEntry {
        let library = match &self.library {
            Some(lib) => grammar_dir.join(lib),
            None => default_library_path(grammar_dir, &self.name),
        };
        let symbol = self
            .symbol
            .unwrap_or_else(|| default_symbol(&self.name));

        let mut entry = GrammarEntry::new(self.name, Provider::library(library, symbol));
        if let Some(display_name) = self.display_name {
            entry = entry.with_display_name(display_name);
        }
        if let Some(path) = self.grammar_json {
            entry = entry.with_grammar_json(grammar_dir.join(path));
        }
        if let Some(path) = self.sample {
            entry = entry.with_sample(grammar_dir.join(path));
        }
        entry
    }
}

/// The entry point a grammar named `name` exports: `tree_sitter_<name>`,
/// with `-` mapped to `_`.
#[must_use]
pub fn default_symbol(name: &str) -> String {
    format!("tree_sitter_{}", name.replace('-', "_"))
}

/// Platform library file for `tree-sitter-<name>` inside `dir`, e.g.
/// `dir/libtree-sitter-fig.so` on Linux.
#[must_use]
pub fn default_library_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(libloading::library_filename(format!("tree-sitter-{name}")))
}

/// `fig` becomes `Fig`.
#[must_use]
pub fn default_display_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library_parts(entry: &GrammarEntry) -> (PathBuf, String) {
        match entry.provider() {
            Provider::Library { path, symbol } => (path.clone(), symbol.clone()),
            Provider::Static(_) => panic!("expected a library provider"),
        }
    }

    #[test]
    fn test_known_grammars_table() {
        let registry = Registry::known_grammars(Path::new("build"));
        let names: Vec<_> = registry.entries().iter().map(GrammarEntry::name).collect();
        assert_eq!(names, ["fig", "nyx"]);

        let fig = registry.get("fig").unwrap();
        assert_eq!(fig.display_name(), "Fig");
        let (path, symbol) = library_parts(fig);
        assert_eq!(symbol, "tree_sitter_fig");
        assert_eq!(
            path,
            Path::new("build").join(libloading::library_filename("tree-sitter-fig"))
        );
    }

    #[test]
    fn test_parse_registry_file() {
        let json = r#"{
            "grammar_dir": "build",
            "grammars": [
                {
                    "name": "fig",
                    "grammar_json": "fig/grammar.json",
                    "sample": "fig/sample.fig"
                },
                {
                    "name": "nyx-lang",
                    "display_name": "Nyx",
                    "library": "custom.so",
                    "symbol": "nyx_entry"
                }
            ]
        }"#;

        let registry = Registry::from_json(json, Path::new("/repo")).unwrap();
        assert_eq!(registry.len(), 2);

        let fig = registry.get("fig").unwrap();
        assert_eq!(fig.grammar_json(), Some(Path::new("/repo/build/fig/grammar.json")));
        assert_eq!(fig.sample(), Some(Path::new("/repo/build/fig/sample.fig")));

        let nyx = registry.get("nyx-lang").unwrap();
        assert_eq!(nyx.display_name(), "Nyx");
        let (path, symbol) = library_parts(nyx);
        assert_eq!(path, Path::new("/repo/build/custom.so"));
        assert_eq!(symbol, "nyx_entry");
    }

    #[test]
    fn test_default_symbol_maps_dashes() {
        assert_eq!(default_symbol("c-sharp"), "tree_sitter_c_sharp");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let json = r#"{ "grammars": [ { "name": "fig" }, { "name": "fig" } ] }"#;
        let err = Registry::from_json(json, Path::new(".")).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(name) if name == "fig"));
    }

    #[test]
    fn test_invalid_name_rejected() {
        let json = r#"{ "grammars": [ { "name": "Fig Lang" } ] }"#;
        let err = Registry::from_json(json, Path::new(".")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidName(_)));
    }

    #[test]
    fn test_empty_registry_rejected() {
        let err = Registry::from_json(r#"{ "grammars": [] }"#, Path::new(".")).unwrap_err();
        assert!(matches!(err, RegistryError::Empty));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = Registry::from_json("{ nope", Path::new(".")).unwrap_err();
        assert!(matches!(err, RegistryError::JsonParse(_)));
    }

    #[test]
    fn test_select_keeps_registry_order() {
        let registry = Registry::known_grammars(Path::new("."));
        let picked = registry.select(["nyx"]).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked.entries()[0].name(), "nyx");

        let err = registry.select(["rust"]).unwrap_err();
        assert!(matches!(err, RegistryError::Unknown(name) if name == "rust"));
    }
}
