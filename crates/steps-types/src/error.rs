use crate::span::{ContextLine, SourceFile};
use crate::Span;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Maximum number of errors stored per file before further ones are only counted.
pub const MAX_ERRORS: usize = 20;

/// Lines of source shown on each side of the offending line.
pub const CONTEXT_RADIUS: u32 = 2;

/// Error severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Error category, determined by error code range.
///
/// Categories follow the pipeline phase that detected the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Structure,
    Lexical,
    Syntax,
    Type,
    Runtime,
    Attempt,
}

/// Numeric error code (E001–E599).
///
/// Codes are part of the public contract: tooling matches on them,
/// never on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Structure errors (E001–E099) ──
    pub const MISSING_BUILDING: Self = Self(1);
    pub const MISSING_FLOOR: Self = Self(2);
    pub const STEP_FLOOR_MISMATCH: Self = Self(3);
    pub const FLOOR_STEP_MISSING: Self = Self(4);
    pub const DUPLICATE_STEP: Self = Self(5);

    // ── Lexer errors (E101–E199) ──
    pub const INVALID_CHARACTER: Self = Self(101);
    pub const BAD_INDENTATION: Self = Self(102);
    pub const TAB_CHARACTER: Self = Self(103);
    pub const UNTERMINATED_STRING: Self = Self(104);
    pub const INCONSISTENT_DEDENT: Self = Self(105);
    pub const UNTERMINATED_NOTE_BLOCK: Self = Self(106);

    // ── Parser errors (E201–E299) ──
    pub const EXPECTED_IDENTIFIER: Self = Self(201);
    pub const EXPECTED_COLON: Self = Self(202);
    pub const EXPECTED_NEWLINE: Self = Self(203);
    pub const EXPECTED_INDENT: Self = Self(204);
    pub const EXPECTED_EXPRESSION: Self = Self(205);
    pub const MISSING_DO: Self = Self(206);
    pub const UNEXPECTED_TOKEN: Self = Self(207);
    pub const WRONG_KEYWORD: Self = Self(208);
    pub const MISSING_BELONGS_TO: Self = Self(209);
    pub const CHAINED_COMPARISON: Self = Self(210);

    // ── Type errors (E301–E399) ──
    pub const FIXED_TYPE_MISMATCH: Self = Self(301);
    pub const INVALID_OPERAND_TYPES: Self = Self(302);
    pub const NOT_ITERABLE: Self = Self(303);
    pub const INVALID_COMPARISON: Self = Self(304);

    // ── Runtime errors (E401–E499) ──
    pub const UNDEFINED_VARIABLE: Self = Self(401);
    pub const UNDEFINED_STEP: Self = Self(402);
    pub const DIVISION_BY_ZERO: Self = Self(404);
    pub const INDEX_OUT_OF_BOUNDS: Self = Self(405);
    pub const KEY_NOT_FOUND: Self = Self(406);
    pub const HOST_FAILURE: Self = Self(407);
    pub const RECURSION_LIMIT: Self = Self(408);
    pub const WRONG_ARGUMENT_COUNT: Self = Self(409);
    pub const STATEMENT_LIMIT: Self = Self(410);
    pub const RISER_NOT_ACCESSIBLE: Self = Self(411);

    // ── Attempt-handling errors (E501–E599) ──
    pub const CONVERSION_FAILED: Self = Self(501);
    pub const INVALID_DECIMAL_PLACES: Self = Self(502);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            0..=99 => ErrorCategory::Structure,
            100..=199 => ErrorCategory::Lexical,
            200..=299 => ErrorCategory::Syntax,
            300..=399 => ErrorCategory::Type,
            400..=499 => ErrorCategory::Runtime,
            _ => ErrorCategory::Attempt,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:03}", self.0)
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        code.to_string()
    }
}

impl TryFrom<String> for ErrorCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value
            .strip_prefix('E')
            .and_then(|digits| digits.parse::<u16>().ok())
            .map(ErrorCode)
            .ok_or_else(|| format!("invalid error code '{value}'"))
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structure => write!(f, "structure"),
            Self::Lexical => write!(f, "lexical"),
            Self::Syntax => write!(f, "syntax"),
            Self::Type => write!(f, "type"),
            Self::Runtime => write!(f, "runtime"),
            Self::Attempt => write!(f, "attempt"),
        }
    }
}

/// A structured Steps diagnostic.
///
/// Hosts render these; the core never hands out pre-formatted text except
/// through [`StepsError::render`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{file}:{span}: {code} [{category}] {message}")]
pub struct StepsError {
    /// Source file name.
    pub file: String,
    /// Error code (e.g., E206).
    pub code: ErrorCode,
    /// Error severity.
    pub severity: Severity,
    /// Error category (derived from code).
    pub category: ErrorCategory,
    /// Plain-language error message.
    pub message: String,
    /// Actionable hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Source location.
    #[serde(flatten)]
    pub span: Span,
    /// Source lines surrounding the location.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context_lines: Vec<ContextLine>,
    /// Machine-readable details (requested index, list length, candidate keys, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, serde_json::Value>,
}

impl StepsError {
    /// Create a new error.
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            severity: Severity::Error,
            category: code.category(),
            message: message.into(),
            hint: None,
            span,
            context_lines: Vec::new(),
            data: BTreeMap::new(),
        }
    }

    /// Attach an actionable hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Attach a structured detail.
    pub fn with_data(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }

    /// Fill in the surrounding source lines from `source`.
    pub fn with_context(mut self, source: &SourceFile) -> Self {
        self.context_lines = source.context_lines(self.span.start_line, CONTEXT_RADIUS);
        self
    }

    /// Human-readable multi-line rendering.
    pub fn render(&self) -> String {
        let mut out = format!(
            "error[{}]: {}\n  --> {}:{}:{}\n",
            self.code, self.message, self.file, self.span.start_line, self.span.start_col
        );
        let width = self
            .context_lines
            .iter()
            .map(|l| l.number.to_string().len())
            .max()
            .unwrap_or(1);
        for line in &self.context_lines {
            out.push_str(&format!("{:>width$} | {}\n", line.number, line.text));
            if line.number == self.span.start_line {
                let pad = " ".repeat(self.span.start_col.saturating_sub(1) as usize);
                out.push_str(&format!("{:>width$} | {pad}^\n", ""));
            }
        }
        if let Some(hint) = &self.hint {
            out.push_str(&format!("hint: {hint}\n"));
        }
        out
    }
}

/// Collected diagnostics for one stage of one file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub errors: Vec<StepsError>,
    pub warnings: Vec<StepsError>,
    pub total_errors: usize,
    pub total_warnings: usize,
}

impl Diagnostics {
    /// Create an empty result (no errors).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Add an error, respecting the MAX_ERRORS limit.
    pub fn push_error(&mut self, error: StepsError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Add a warning.
    pub fn push_warning(&mut self, warning: StepsError) {
        self.warnings.push(warning);
        self.total_warnings += 1;
    }

    /// Fold another stage's diagnostics into this one.
    pub fn extend(&mut self, other: Diagnostics) {
        let unstored = other.total_errors.saturating_sub(other.errors.len());
        for error in other.errors {
            self.push_error(error);
        }
        self.total_errors += unstored;
        for warning in other.warnings {
            self.push_warning(warning);
        }
    }

    /// First recorded error, if any.
    pub fn first(&self) -> Option<&StepsError> {
        self.errors.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::MISSING_BUILDING.category(), ErrorCategory::Structure);
        assert_eq!(ErrorCode::TAB_CHARACTER.category(), ErrorCategory::Lexical);
        assert_eq!(ErrorCode::MISSING_DO.category(), ErrorCategory::Syntax);
        assert_eq!(ErrorCode::FIXED_TYPE_MISMATCH.category(), ErrorCategory::Type);
        assert_eq!(ErrorCode::STATEMENT_LIMIT.category(), ErrorCategory::Runtime);
        assert_eq!(ErrorCode::CONVERSION_FAILED.category(), ErrorCategory::Attempt);
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(format!("{}", ErrorCode::STEP_FLOOR_MISMATCH), "E003");
        assert_eq!(format!("{}", ErrorCode::MISSING_DO), "E206");
        assert_eq!(format!("{}", ErrorCode::RISER_NOT_ACCESSIBLE), "E411");
    }

    #[test]
    fn test_error_code_parses_back() {
        assert_eq!(ErrorCode::try_from("E405".to_string()), Ok(ErrorCode(405)));
        assert!(ErrorCode::try_from("405".to_string()).is_err());
    }

    #[test]
    fn test_steps_error_creation() {
        let err = StepsError::new(
            "main.building",
            ErrorCode::FIXED_TYPE_MISMATCH,
            "Cannot assign text to 'count'",
            Span::new(12, 5, 12, 22),
        );
        assert_eq!(err.code, ErrorCode::FIXED_TYPE_MISMATCH);
        assert_eq!(err.severity, Severity::Error);
        assert_eq!(err.category, ErrorCategory::Type);
        assert!(err.hint.is_none());
    }

    #[test]
    fn test_steps_error_display() {
        let err = StepsError::new(
            "main.building",
            ErrorCode::DIVISION_BY_ZERO,
            "Cannot divide by zero.",
            Span::new(4, 9, 4, 20),
        );
        assert_eq!(
            err.to_string(),
            "main.building:4:9: E404 [runtime] Cannot divide by zero."
        );
    }

    #[test]
    fn test_steps_error_json_serialization() {
        let err = StepsError::new(
            "main.building",
            ErrorCode::INDEX_OUT_OF_BOUNDS,
            "Index 10 is out of bounds",
            Span::new(3, 13, 3, 22),
        )
        .with_hint("Valid indices are 0 to 4.")
        .with_data("index", 10)
        .with_data("length", 5);

        let json = serde_json::to_string_pretty(&err).unwrap();
        assert!(json.contains("\"code\": \"E405\""));
        assert!(json.contains("\"hint\""));
        assert!(json.contains("\"line\": 3"));
        assert!(json.contains("\"column\": 13"));
        assert!(json.contains("\"end_column\""));
        assert!(!json.contains("context_lines"));

        let back: StepsError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
        assert_eq!(back.data["index"], serde_json::json!(10));
    }

    #[test]
    fn test_with_context_and_render() {
        let source = SourceFile::new(
            "main.building",
            "building: demo\n    set x to 1\n    display x / 0\n",
        );
        let err = StepsError::new(
            "main.building",
            ErrorCode::DIVISION_BY_ZERO,
            "Cannot divide by zero.",
            Span::new(3, 17, 3, 18),
        )
        .with_hint("Check the divisor first.")
        .with_context(&source);

        assert_eq!(err.context_lines.len(), 3);
        let rendered = err.render();
        assert!(rendered.starts_with("error[E404]: Cannot divide by zero."));
        assert!(rendered.contains("--> main.building:3:17"));
        assert!(rendered.contains("3 |     display x / 0"));
        assert!(rendered.contains("hint: Check the divisor first."));
    }

    #[test]
    fn test_diagnostics_max_limit() {
        let mut errs = Diagnostics::empty();
        for i in 0..25 {
            errs.push_error(StepsError::new(
                "main.building",
                ErrorCode::UNEXPECTED_TOKEN,
                format!("Error {i}"),
                Span::point(i as u32 + 1, 1),
            ));
        }
        assert_eq!(errs.errors.len(), 20);
        assert_eq!(errs.total_errors, 25);
        assert!(errs.has_errors());
    }

    #[test]
    fn test_diagnostics_extend_keeps_totals() {
        let mut a = Diagnostics::empty();
        let mut b = Diagnostics::empty();
        for i in 0..22 {
            b.push_error(StepsError::new(
                "x.step",
                ErrorCode::UNEXPECTED_TOKEN,
                format!("Error {i}"),
                Span::point(1, 1),
            ));
        }
        a.extend(b);
        assert_eq!(a.errors.len(), 20);
        assert_eq!(a.total_errors, 22);
    }

    #[test]
    fn test_diagnostics_empty() {
        let errs = Diagnostics::empty();
        assert!(!errs.has_errors());
        assert!(errs.first().is_none());
        assert_eq!(errs.total_warnings, 0);
    }

    #[test]
    fn test_error_determinism_100_iterations() {
        let make = || {
            StepsError::new(
                "main.building",
                ErrorCode::FIXED_TYPE_MISMATCH,
                "Type mismatch",
                Span::new(12, 5, 12, 22),
            )
            .with_data("declared", "number")
        };
        let first_json = serde_json::to_string(&make()).unwrap();
        for i in 0..100 {
            let json = serde_json::to_string(&make()).unwrap();
            assert_eq!(first_json, json, "Determinism failure at iteration {i}");
        }
    }
}
