//! Error types shared across the crate.
//!
//! [`GrammarLoadFailure`] is the only error a verification can produce. Its
//! message names the grammar; the concrete cause hangs off it as the error
//! source so test output and logs can show both.

use std::path::PathBuf;

use thiserror::Error;

/// A grammar failed to load into the tree-sitter runtime.
///
/// The display form is exactly `Error loading <DisplayName> grammar`.
#[derive(Debug, Error)]
#[error("Error loading {display_name} grammar")]
pub struct GrammarLoadFailure {
    grammar: String,
    display_name: String,
    #[source]
    reason: LoadFailureReason,
}

impl GrammarLoadFailure {
    pub(crate) fn new(
        grammar: impl Into<String>,
        display_name: impl Into<String>,
        reason: LoadFailureReason,
    ) -> Self {
        Self {
            grammar: grammar.into(),
            display_name: display_name.into(),
            reason,
        }
    }

    /// Registry name of the grammar that failed.
    #[must_use]
    pub fn grammar(&self) -> &str {
        &self.grammar
    }

    /// Why the grammar failed to load.
    #[must_use]
    pub fn reason(&self) -> &LoadFailureReason {
        &self.reason
    }

    /// The message followed by every cause in the source chain, joined
    /// with `": "`.
    #[must_use]
    pub fn detailed(&self) -> String {
        let mut message = self.to_string();
        let mut cause: Option<&dyn std::error::Error> = Some(&self.reason);
        while let Some(err) = cause {
            message.push_str(": ");
            message.push_str(&err.to_string());
            cause = err.source();
        }
        message
    }
}

/// The concrete cause behind a [`GrammarLoadFailure`].
#[derive(Debug, Error)]
pub enum LoadFailureReason {
    /// The grammar's shared library could not be opened.
    #[error("could not open grammar library {}", .path.display())]
    OpenLibrary {
        /// Library path that was tried.
        path: PathBuf,
        /// Loader error.
        #[source]
        source: libloading::Error,
    },

    /// The library does not export the provider symbol.
    #[error("symbol `{symbol}` not found in {}", .path.display())]
    MissingSymbol {
        /// Provider symbol that was looked up.
        symbol: String,
        /// Library the lookup ran against.
        path: PathBuf,
        /// Loader error.
        #[source]
        source: libloading::Error,
    },

    /// The provider returned a null language pointer.
    #[error("provider returned a null language")]
    NullLanguage,

    /// The language was generated for an ABI the runtime cannot read.
    #[error("language ABI version {found} is outside the supported range {min}..={max}")]
    IncompatibleAbi {
        /// ABI version reported by the language.
        found: usize,
        /// Oldest ABI the runtime accepts.
        min: usize,
        /// Newest ABI the runtime accepts.
        max: usize,
    },

    /// A parser refused the language.
    #[error("parser rejected the language")]
    ParserRejected(#[from] tree_sitter::LanguageError),
}

/// Errors raised while building a [`Registry`](crate::registry::Registry).
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry file could not be read.
    #[error("could not read registry {}", .path.display())]
    Read {
        /// Registry file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The registry file is not valid JSON or does not match the schema.
    #[error("invalid registry JSON: {0}")]
    JsonParse(String),

    /// A grammar name is empty or contains characters other than `[a-z0-9_-]`.
    #[error("invalid grammar name `{0}`")]
    InvalidName(String),

    /// Two entries share a name.
    #[error("grammar `{0}` is registered more than once")]
    Duplicate(String),

    /// A selection named a grammar the registry does not know.
    #[error("unknown grammar `{0}`")]
    Unknown(String),

    /// The registry holds no grammars.
    #[error("registry contains no grammars")]
    Empty,
}

/// Errors raised while reading a `grammar.json` definition.
#[derive(Debug, Error)]
pub enum GrammarError {
    /// The grammar file could not be read.
    #[error("could not read grammar definition {}", .path.display())]
    Read {
        /// Grammar file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The input JSON was syntactically invalid or structurally mismatched.
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// The definition parsed but is not a usable grammar.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Errors raised while parsing a sample file.
#[derive(Debug, Error)]
pub enum SampleError {
    /// The sample file could not be read.
    #[error("could not read sample {}", .path.display())]
    Read {
        /// Sample file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The parser refused the language.
    #[error("parser rejected the language")]
    Language(#[from] tree_sitter::LanguageError),

    /// The parser produced no tree.
    #[error("parser produced no tree")]
    NoTree,
}
