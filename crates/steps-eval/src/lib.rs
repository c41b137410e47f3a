//! Steps tree-walking evaluator.
//!
//! Runs a validated [`ProgramRegistry`] directly from the AST. Program output
//! and input go through the [`Io`] traits so hosts and tests can capture them.

pub mod config;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod io;
pub mod ops;
pub mod registry;
pub mod value;

pub use config::EvalConfig;
pub use error::{EvalError, EvalResult, Fault};
pub use evaluator::{ControlSignal, Evaluator, ExitCode, Outcome, PROBLEM_MESSAGE};
pub use io::{CapturedIo, InputSource, Io, OutputSink, StdIo};
pub use registry::{ProgramRegistry, RegistryBuilder, StepEntry};
pub use value::{Table, Value};
