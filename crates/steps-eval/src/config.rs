//! Evaluator limits and switches.

use serde::{Deserialize, Serialize};

/// Default ceiling on executed statements per run.
pub const DEFAULT_MAX_STATEMENTS: u64 = 10_000_000;

/// Default ceiling on nested step/riser calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 100;

/// Configuration for one [`Evaluator`](crate::Evaluator).
///
/// Hosts typically keep the defaults; tests lower the limits to make
/// runaway programs fail fast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Statements executed before the run aborts with E410.
    pub max_statements: u64,
    /// Nested calls allowed before E408.
    pub max_call_depth: usize,
    /// Record call entry/exit and caught failures in the evaluator trace.
    pub trace: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_statements: DEFAULT_MAX_STATEMENTS,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            trace: false,
        }
    }
}

impl EvalConfig {
    pub fn with_max_statements(mut self, max_statements: u64) -> Self {
        self.max_statements = max_statements;
        self
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}
