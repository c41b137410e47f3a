//! Runtime error types for the Steps evaluator.

use steps_types::{ErrorCode, SourceFile, Span, StepsError};

/// A failed operation that has not yet been tied to a source location.
///
/// Value operations and the environment produce these; the evaluator
/// attaches the file and span of the expression or statement at fault.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    pub code: ErrorCode,
    pub message: String,
    pub hint: Option<String>,
    pub data: Vec<(String, serde_json::Value)>,
}

impl Fault {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            hint: None,
            data: Vec::new(),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_data(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.data.push((key.to_string(), value.into()));
        self
    }

    /// Turn the fault into a located diagnostic.
    pub fn locate(self, file: &SourceFile, span: Span) -> StepsError {
        let mut error = StepsError::new(&file.name, self.code, self.message, span).with_context(file);
        if let Some(hint) = self.hint {
            error = error.with_hint(hint);
        }
        for (key, value) in self.data {
            error = error.with_data(&key, value);
        }
        error
    }
}

/// Evaluation error: a runtime diagnostic, or the `exit` unwinding the program.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EvalError {
    /// A runtime error that an `attempt:` block may catch.
    #[error("{0}")]
    Runtime(Box<StepsError>),
    /// Resource exhaustion (statement ceiling, call depth). Never caught.
    #[error("{0}")]
    Fatal(Box<StepsError>),
    /// `exit` executed inside a called step, unwinding to the building.
    #[error("exit")]
    Exit,
}

impl EvalError {
    /// Wrap a diagnostic, classifying resource-limit codes as fatal.
    pub fn from_diagnostic(error: StepsError) -> Self {
        if is_fatal(error.code) {
            EvalError::Fatal(Box::new(error))
        } else {
            EvalError::Runtime(Box::new(error))
        }
    }

    /// The diagnostic carried by this error, if any.
    pub fn diagnostic(&self) -> Option<&StepsError> {
        match self {
            EvalError::Runtime(error) | EvalError::Fatal(error) => Some(error),
            EvalError::Exit => None,
        }
    }

    pub fn is_catchable(&self) -> bool {
        matches!(self, EvalError::Runtime(_))
    }
}

/// Codes an `attempt:` block must let through.
pub fn is_fatal(code: ErrorCode) -> bool {
    code == ErrorCode::STATEMENT_LIMIT || code == ErrorCode::RECURSION_LIMIT
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;
