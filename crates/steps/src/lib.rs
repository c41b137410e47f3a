//! Steps language core: the host-facing pipeline.
//!
//! ```text
//! Steps source → Lexer → Parser → ProgramRegistry → Evaluator → output
//! ```
//!
//! Hosts (CLI, REPL, editors) call [`tokenize`], [`parse`], [`check`] and
//! [`run`]. Nothing here touches the file system: sources arrive as text.

mod project;

pub use project::{file_kind, load, LoadError};
pub use steps_eval::{
    CapturedIo, EvalConfig, Evaluator, ExitCode, InputSource, Io, Outcome, OutputSink,
    ProgramRegistry, StdIo, Value,
};
pub use steps_lexer::LexResult;
pub use steps_parser::{print_program, ParseResult};
pub use steps_types::ast::{FileKind, Program};
pub use steps_types::{Diagnostics, ErrorCode, SourceFile, StepsError};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Tokenize one source file.
pub fn tokenize(source: &str, name: &str) -> LexResult {
    steps_lexer::tokenize(&SourceFile::new(name, source))
}

/// Lex and parse one source file as the given kind.
pub fn parse(source: &str, name: &str, kind: FileKind) -> ParseResult {
    steps_parser::parse_source(&SourceFile::new(name, source), kind)
}

// ══════════════════════════════════════════════════════════════════════════════
// Check
// ══════════════════════════════════════════════════════════════════════════════

/// Diagnostics for one file, shaped for editors and other tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// True when the file produced no errors.
    pub success: bool,
    pub file: String,
    pub kind: FileKind,
    /// Name from the file header, when the header could be read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub errors: Diagnostics,
    /// SHA-256 of the source text, hex-encoded.
    pub source_hash: String,
}

impl CheckResult {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Lex and parse one file, reporting every diagnostic without running it.
pub fn check(source: &str, name: &str, kind: FileKind) -> CheckResult {
    let result = parse(source, name, kind);
    CheckResult {
        success: !result.errors.has_errors(),
        file: name.to_string(),
        kind,
        name: result.program.as_ref().map(|p| p.name().to_string()),
        errors: result.errors,
        source_hash: source_hash(source),
    }
}

/// Hex-encoded SHA-256 digest of `source`.
pub fn source_hash(source: &str) -> String {
    Sha256::digest(source.as_bytes())
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

// ══════════════════════════════════════════════════════════════════════════════
// Run
// ══════════════════════════════════════════════════════════════════════════════

/// Run a validated program, handing the I/O back with the outcome.
pub fn run<I: Io>(registry: &ProgramRegistry, config: EvalConfig, io: I) -> (Outcome, I) {
    let mut evaluator = Evaluator::new(registry, config, io);
    let outcome = evaluator.run();
    (outcome, evaluator.into_io())
}

/// Load in-memory sources and run them with captured I/O.
///
/// `input` lines are served to `input` expressions in order.
pub fn run_sources<'a, F, L>(
    files: F,
    config: EvalConfig,
    input: L,
) -> Result<(Outcome, CapturedIo), LoadError>
where
    F: IntoIterator<Item = (&'a str, &'a str)>,
    L: IntoIterator,
    L::Item: Into<String>,
{
    let registry = load(files)?;
    Ok(run(&registry, config, CapturedIo::with_input(input)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_hash_is_sha256_hex() {
        assert_eq!(
            source_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(source_hash("building: a\n").len(), 64);
    }

    #[test]
    fn test_tokenize_reports_lex_errors() {
        let result = tokenize("building: a\n\tdisplay 1\n", "tabs.building");
        assert!(result.errors.has_errors());
    }
}
