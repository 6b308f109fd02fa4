//! `treeprobe`: verifies that compiled tree-sitter grammars load.
//!
//! Prints one line per grammar and exits with 0 when every grammar passes,
//! 1 when any fails, and 2 when the arguments or registry are unusable.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use facet::Facet;
use tracing_subscriber::EnvFilter;
use treeprobe::{
    check_conformance, load_grammar, parse_sample_file, verify_all, GrammarEntry, Registry,
    RegistryError, Verification,
};

/// Verify that compiled tree-sitter grammars load.
#[derive(Debug, Facet)]
struct Args {
    /// JSON registry file. Defaults to the built-in fig/nyx table.
    #[facet(named, short = 'r', default)]
    registry: Option<String>,

    /// Directory holding the built-in grammars' libraries.
    #[facet(named, short = 'd', default)]
    grammar_dir: Option<String>,

    /// Verify only this grammar.
    #[facet(named, short = 'g', default)]
    grammar: Option<String>,

    /// Print failures only.
    #[facet(named, short = 'q', default)]
    quiet: bool,
}

fn main() -> ExitCode {
    init_tracing();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let raw: Vec<&str> = raw.iter().map(String::as_str).collect();
    let args: Args = match facet_args::from_slice(&raw) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    let registry = match build_registry(&args) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };

    let mut all_passed = true;
    for (entry, verification) in registry.entries().iter().zip(verify_all(&registry)) {
        all_passed &= report(entry, &verification, args.quiet);
    }

    if all_passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_registry(args: &Args) -> Result<Registry, RegistryError> {
    let registry = match &args.registry {
        Some(path) => Registry::load(Path::new(path))?,
        None => {
            let dir = args
                .grammar_dir
                .as_deref()
                .map_or_else(|| PathBuf::from("."), PathBuf::from);
            Registry::known_grammars(&dir)
        }
    };
    match &args.grammar {
        Some(name) => registry.select([name]),
        None => Ok(registry),
    }
}

/// Prints the outcome for one grammar and returns whether it passed every
/// configured check.
fn report(entry: &GrammarEntry, verification: &Verification, quiet: bool) -> bool {
    let loaded = match &verification.result {
        Ok(loaded) => loaded,
        Err(err) => {
            println!("FAIL {}: {}", verification.grammar, err.detailed());
            return false;
        }
    };

    let mut passed = true;
    let mut notes = Vec::new();

    if let Some(path) = entry.grammar_json() {
        match load_grammar(path) {
            Ok(grammar) => {
                let conformance = check_conformance(&grammar, loaded.language());
                if conformance.is_clean() {
                    notes.push("grammar.json conforms".to_string());
                } else {
                    passed = false;
                    notes.push(format!(
                        "{} node kinds out of step with grammar.json",
                        conformance.finding_count()
                    ));
                }
            }
            Err(e) => {
                passed = false;
                notes.push(e.to_string());
            }
        }
    }

    if let Some(path) = entry.sample() {
        match parse_sample_file(loaded, path) {
            Ok(sample) if sample.is_clean() => {
                notes.push(format!("sample parsed as {}", sample.root_kind));
            }
            Ok(sample) => {
                passed = false;
                let at = sample
                    .first_error
                    .map(|p| format!(" (first at {}:{})", p.row + 1, p.column + 1))
                    .unwrap_or_default();
                notes.push(format!("sample has {} syntax errors{at}", sample.error_count));
            }
            Err(e) => {
                passed = false;
                notes.push(e.to_string());
            }
        }
    }

    let detail = if notes.is_empty() {
        String::new()
    } else {
        format!("; {}", notes.join("; "))
    };
    if !passed || !quiet {
        println!("{}", status_line(passed, loaded.name(), loaded.abi_version(), &detail));
    }
    passed
}

fn status_line(passed: bool, name: &str, abi_version: usize, detail: &str) -> String {
    if passed {
        format!("ok {name} (abi {abi_version}){detail}")
    } else {
        format!("FAIL {name}: loaded (abi {abi_version}){detail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_for_passing_grammar() {
        assert_eq!(status_line(true, "json", 14, ""), "ok json (abi 14)");
        assert_eq!(
            status_line(true, "fig", 15, "; grammar.json conforms"),
            "ok fig (abi 15); grammar.json conforms"
        );
    }

    #[test]
    fn test_status_line_for_failing_check() {
        assert_eq!(
            status_line(false, "nyx", 15, "; sample has 2 syntax errors"),
            "FAIL nyx: loaded (abi 15); sample has 2 syntax errors"
        );
    }
}
