//! Tree-walking evaluator for Steps programs.
//!
//! Executes the building body against a validated [`ProgramRegistry`].
//! Statements produce a [`ControlSignal`]; failures travel as [`EvalError`].
//! Every executed statement is counted against `EvalConfig::max_statements`.

use crate::config::EvalConfig;
use crate::env::{Environment, FrameKind};
use crate::error::{EvalError, EvalResult, Fault};
use crate::io::Io;
use crate::ops;
use crate::registry::ProgramRegistry;
use crate::value::{Table, Value};
use serde::Serialize;
use steps_types::ast::*;
use steps_types::{ErrorCode, SourceFile, Span, StepsError};

/// Name bound to the caught error's message inside `if unsuccessful:`.
pub const PROBLEM_MESSAGE: &str = "problem_message";

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlSignal {
    Normal,
    /// `return` unwinding to the nearest step or riser boundary.
    Return(Option<Value>),
    /// `exit` unwinding to the building.
    Exit,
}

/// How a whole run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitCode {
    /// The building body ran to its end.
    Completed,
    /// The program executed `exit`.
    Exited,
    /// An uncaught runtime error stopped the program.
    Failed,
}

impl ExitCode {
    /// Process exit status for this outcome.
    pub fn code(self) -> i32 {
        match self {
            ExitCode::Completed | ExitCode::Exited => 0,
            ExitCode::Failed => 1,
        }
    }
}

/// Result of [`Evaluator::execute`].
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub exit: ExitCode,
    pub error: Option<StepsError>,
    pub statements_executed: u64,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        self.exit != ExitCode::Failed
    }
}

/// A resolved call target.
struct Callee<'r> {
    kind: FrameKind,
    step: &'r StepDef,
    file: &'r SourceFile,
    params: &'r [Param],
    return_decl: Option<&'r ReturnDecl>,
    declarations: &'r [Declaration],
    body: &'r Block,
}

/// The Steps evaluator.
pub struct Evaluator<'r, I: Io> {
    registry: &'r ProgramRegistry,
    config: EvalConfig,
    io: I,
    env: Environment<'r>,
    statements: u64,
    trace: Vec<String>,
}

impl<'r, I: Io> Evaluator<'r, I> {
    pub fn new(registry: &'r ProgramRegistry, config: EvalConfig, io: I) -> Self {
        Self {
            registry,
            config,
            io,
            env: Environment::new(),
            statements: 0,
            trace: Vec::new(),
        }
    }

    /// Run the registry's building.
    pub fn run(&mut self) -> Outcome {
        let building = self.registry.building();
        self.execute(building)
    }

    /// Execute a building body. Counters, variables and the trace start fresh.
    pub fn execute(&mut self, building: &BuildingDef) -> Outcome {
        self.statements = 0;
        self.trace.clear();
        self.env
            .push_building(&building.name.name, self.registry.building_source());

        let (exit, error) = match self.exec_block(&building.body) {
            Ok(ControlSignal::Exit) | Err(EvalError::Exit) => (ExitCode::Exited, None),
            Ok(_) => (ExitCode::Completed, None),
            Err(EvalError::Runtime(error)) | Err(EvalError::Fatal(error)) => {
                (ExitCode::Failed, Some(*error))
            }
        };
        Outcome {
            exit,
            error,
            statements_executed: self.statements,
        }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn io(&self) -> &I {
        &self.io
    }

    pub fn io_mut(&mut self) -> &mut I {
        &mut self.io
    }

    pub fn into_io(self) -> I {
        self.io
    }

    /// Trace lines recorded during the last run (empty unless tracing is on).
    pub fn trace(&self) -> &[String] {
        &self.trace
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Bookkeeping
    // ══════════════════════════════════════════════════════════════════════════

    /// Count one executed statement. Errors once the ceiling is passed.
    fn tick(&mut self, span: Span) -> EvalResult<()> {
        self.statements += 1;
        if self.statements > self.config.max_statements {
            return Err(self.fail(
                Fault::new(
                    ErrorCode::STATEMENT_LIMIT,
                    format!(
                        "Maximum statement count exceeded ({}).",
                        self.config.max_statements
                    ),
                )
                .with_hint("Your program may be stuck in a loop. Check the loop condition.")
                .with_data("limit", self.config.max_statements),
                span,
            ));
        }
        Ok(())
    }

    fn current_file(&self) -> &'r SourceFile {
        self.env
            .file()
            .unwrap_or_else(|| self.registry.building_source())
    }

    /// Attach the current file and `span` to a fault.
    fn fail(&self, fault: Fault, span: Span) -> EvalError {
        EvalError::from_diagnostic(fault.locate(self.current_file(), span))
    }

    fn record(&mut self, line: impl FnOnce() -> String) {
        if self.config.trace {
            let indent = "  ".repeat(self.env.depth());
            self.trace.push(format!("{indent}{}", line()));
        }
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════════

    pub fn exec_block(&mut self, block: &Block) -> EvalResult<ControlSignal> {
        for stmt in &block.stmts {
            let signal = self.exec_stmt(stmt)?;
            if signal != ControlSignal::Normal {
                return Ok(signal);
            }
        }
        Ok(ControlSignal::Normal)
    }

    pub fn exec_stmt(&mut self, stmt: &Stmt) -> EvalResult<ControlSignal> {
        self.tick(stmt.span)?;
        match &stmt.kind {
            StmtKind::Display(expr) => {
                let value = self.eval_expr(expr)?;
                self.io.write_line(&value.to_string()).map_err(|e| {
                    self.fail(
                        Fault::new(ErrorCode::HOST_FAILURE, format!("Could not write output: {e}")),
                        stmt.span,
                    )
                })?;
                Ok(ControlSignal::Normal)
            }
            StmtKind::Set { target, value } => {
                let value = self.eval_expr(value)?;
                self.env
                    .bind(&target.name, value)
                    .map_err(|f| self.fail(f, stmt.span))?;
                Ok(ControlSignal::Normal)
            }
            StmtKind::SetIndex {
                target,
                index,
                value,
            } => {
                let key = self.eval_expr(index)?;
                let value = self.eval_expr(value)?;
                self.env
                    .resolve(&target.name)
                    .and_then(|list| ops::set_index(list, &key, value))
                    .map_err(|f| self.fail(f, stmt.span))?;
                Ok(ControlSignal::Normal)
            }
            StmtKind::Call(call) => {
                let result = self.call(&call.callee, &call.args, stmt.span)?;
                if let Some(target) = &call.result_target {
                    self.env
                        .bind(&target.name, result)
                        .map_err(|f| self.fail(f, target.span))?;
                }
                Ok(ControlSignal::Normal)
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => Some(self.eval_expr(expr)?),
                    None => None,
                };
                Ok(ControlSignal::Return(value))
            }
            StmtKind::Exit => Ok(ControlSignal::Exit),
            StmtKind::If(if_stmt) => self.exec_if(if_stmt),
            StmtKind::RepeatTimes { count, body } => self.exec_repeat_times(count, body),
            StmtKind::RepeatForEach {
                item,
                collection,
                body,
            } => self.exec_for_each(item, collection, body),
            StmtKind::RepeatWhile { condition, body } => {
                loop {
                    if !self.eval_expr(condition)?.is_truthy() {
                        return Ok(ControlSignal::Normal);
                    }
                    let signal = self.exec_block(body)?;
                    if signal != ControlSignal::Normal {
                        return Ok(signal);
                    }
                }
            }
            StmtKind::Attempt(attempt) => self.exec_attempt(attempt),
            StmtKind::AddToList { item, list } => {
                let item = self.eval_expr(item)?;
                self.env
                    .resolve(&list.name)
                    .and_then(|target| ops::add_to_list(target, item))
                    .map_err(|f| self.fail(f, stmt.span))?;
                Ok(ControlSignal::Normal)
            }
            StmtKind::RemoveFromList { item, list } => {
                let item = self.eval_expr(item)?;
                self.env
                    .resolve(&list.name)
                    .and_then(|target| ops::remove_from_list(target, &item))
                    .map_err(|f| self.fail(f, stmt.span))?;
                Ok(ControlSignal::Normal)
            }
            StmtKind::Note { .. } => Ok(ControlSignal::Normal),
        }
    }

    fn exec_if(&mut self, if_stmt: &IfStmt) -> EvalResult<ControlSignal> {
        for branch in &if_stmt.branches {
            if self.eval_expr(&branch.condition)?.is_truthy() {
                return self.exec_block(&branch.body);
            }
        }
        match &if_stmt.otherwise {
            Some(block) => self.exec_block(block),
            None => Ok(ControlSignal::Normal),
        }
    }

    fn exec_repeat_times(&mut self, count: &Expr, body: &Block) -> EvalResult<ControlSignal> {
        let times = match self.eval_expr(count)? {
            Value::Number(n) if n > 0.0 => n.trunc() as u64,
            Value::Number(_) => 0,
            other => {
                return Err(self.fail(
                    Fault::new(
                        ErrorCode::INVALID_OPERAND_TYPES,
                        format!(
                            "'repeat ... times' requires a number, got {}.",
                            other.type_name()
                        ),
                    )
                    .with_hint("The repeat count must be a number."),
                    count.span,
                ));
            }
        };
        for _ in 0..times {
            let signal = self.exec_block(body)?;
            if signal != ControlSignal::Normal {
                return Ok(signal);
            }
        }
        Ok(ControlSignal::Normal)
    }

    fn exec_for_each(
        &mut self,
        item: &Ident,
        collection: &Expr,
        body: &Block,
    ) -> EvalResult<ControlSignal> {
        // The collection is copied here; changes made by the body are not seen.
        let source = self.eval_expr(collection)?;
        let items: Vec<Value> = match &source {
            Value::List(items) => items.borrow().clone(),
            Value::Text(text) => text.chars().map(|c| Value::Text(c.to_string())).collect(),
            Value::Table(table) => table.borrow().keys().map(Value::from).collect(),
            other => {
                return Err(self.fail(
                    Fault::new(
                        ErrorCode::NOT_ITERABLE,
                        format!(
                            "Cannot iterate over a {}. 'repeat for each' needs a list, text or table.",
                            other.type_name()
                        ),
                    )
                    .with_hint("Example:\n    set numbers to [1, 2, 3]\n    repeat for each item in numbers"),
                    collection.span,
                ));
            }
        };
        for value in items {
            self.env
                .bind(&item.name, value)
                .map_err(|f| self.fail(f, item.span))?;
            let signal = self.exec_block(body)?;
            if signal != ControlSignal::Normal {
                return Ok(signal);
            }
        }
        Ok(ControlSignal::Normal)
    }

    /// `attempt:` / `if unsuccessful:` / `then continue:`.
    ///
    /// Only runtime errors from the body are caught. `then continue:` runs after
    /// the body or handler finishes, including when they return or exit; an
    /// error escaping the handler skips it.
    fn exec_attempt(&mut self, attempt: &AttemptStmt) -> EvalResult<ControlSignal> {
        let outcome = match self.exec_block(&attempt.body) {
            Err(EvalError::Runtime(error)) => {
                self.record(|| format!("attempt caught {}: {}", error.code, error.message));
                match &attempt.if_unsuccessful {
                    Some(handler) => {
                        let saved = self
                            .env
                            .shadow(PROBLEM_MESSAGE, Value::Text(error.message.clone()));
                        let result = self.exec_block(handler);
                        self.env.unshadow(PROBLEM_MESSAGE, saved);
                        result
                    }
                    None => Ok(ControlSignal::Normal),
                }
            }
            other => other,
        };

        let Some(continue_block) = &attempt.then_continue else {
            return outcome;
        };
        let pending = match outcome {
            Ok(signal) => signal,
            Err(EvalError::Exit) => ControlSignal::Exit,
            Err(error) => return Err(error),
        };
        let after = self.exec_block(continue_block)?;
        Ok(if after != ControlSignal::Normal { after } else { pending })
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Calls
    // ══════════════════════════════════════════════════════════════════════════

    /// Find the step or riser a call names, from the current frame's view.
    fn resolve_callee(&self, name: &str) -> Result<Callee<'r>, Fault> {
        if let Some(step) = self.env.current_step() {
            if let Some(riser) = step.riser(name) {
                return Ok(Callee {
                    kind: FrameKind::Riser,
                    step,
                    file: self.current_file(),
                    params: &riser.parameters,
                    return_decl: riser.return_decl.as_ref(),
                    declarations: &riser.declarations,
                    body: &riser.body,
                });
            }
        }

        let registry = self.registry;
        if let Some(entry) = registry.step(name) {
            return Ok(Callee {
                kind: FrameKind::Step,
                step: &entry.def,
                file: &entry.source,
                params: &entry.def.parameters,
                return_decl: entry.def.return_decl.as_ref(),
                declarations: &entry.def.declarations,
                body: &entry.def.body,
            });
        }

        if let Some(owner) = registry.riser_owner(name) {
            return Err(Fault::new(
                ErrorCode::RISER_NOT_ACCESSIBLE,
                format!("Riser '{name}' belongs to step '{owner}' and cannot be called from here."),
            )
            .with_hint(format!(
                "Risers are private helpers. Call '{name}' from inside '{owner}', or turn it into a step."
            ))
            .with_data("owner", owner));
        }

        let available: Vec<&str> = registry.step_names().collect();
        let suggestion = available
            .iter()
            .find(|candidate| {
                candidate.contains(name)
                    || name.contains(*candidate)
                    || candidate.chars().next() == name.chars().next()
            })
            .map(|candidate| format!("Did you mean '{candidate}'?\n\n"))
            .unwrap_or_default();
        let listing = if available.is_empty() {
            "(none)".to_string()
        } else {
            available.join(", ")
        };
        Err(Fault::new(
            ErrorCode::UNDEFINED_STEP,
            format!("Step '{name}' does not exist."),
        )
        .with_hint(format!("{suggestion}Available steps: {listing}"))
        .with_data("available_steps", available))
    }

    /// Call a step or riser and produce its result value.
    fn call(&mut self, callee: &Ident, args: &[Expr], span: Span) -> EvalResult<Value> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval_expr(arg)?);
        }

        let name = callee.name.as_str();
        let target = self.resolve_callee(name).map_err(|f| self.fail(f, span))?;

        if self.env.depth() >= self.config.max_call_depth {
            let stack = self.env.call_stack();
            return Err(self.fail(
                Fault::new(
                    ErrorCode::RECURSION_LIMIT,
                    format!("Maximum recursion depth exceeded when calling '{name}'."),
                )
                .with_hint(format!(
                    "Call stack: {stack} → {name}\nYour step is calling itself too many times. Check for infinite recursion."
                ))
                .with_data("depth", self.env.depth())
                .with_data("limit", self.config.max_call_depth),
                span,
            ));
        }

        self.record(|| {
            let shown: Vec<String> = values.iter().map(Value::to_string).collect();
            format!("enter {name}({})", shown.join(", "))
        });

        self.env
            .enter_call(target.kind, name, target.step, target.file, target.params, values)
            .map_err(|f| self.fail(f, span))?;
        self.env.declare(target.declarations);

        let result = match self.exec_block(target.body) {
            Ok(ControlSignal::Return(Some(value))) => Ok(value),
            Ok(ControlSignal::Return(None)) | Ok(ControlSignal::Normal) => {
                Ok(self.declared_result(target.return_decl))
            }
            Ok(ControlSignal::Exit) => Err(EvalError::Exit),
            Err(error) => Err(error),
        };
        self.env.leave_call();

        self.record(|| match &result {
            Ok(value) => format!("leave {name} = {value}"),
            Err(EvalError::Exit) => format!("leave {name} (exit)"),
            Err(_) => format!("leave {name} (error)"),
        });
        result
    }

    /// Value of the `returns:` variable, or nothing.
    fn declared_result(&self, return_decl: Option<&ReturnDecl>) -> Value {
        return_decl
            .and_then(|decl| self.env.resolve(&decl.name.name).ok())
            .cloned()
            .unwrap_or(Value::Nothing)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════════

    pub fn eval_expr(&mut self, expr: &Expr) -> EvalResult<Value> {
        match &expr.kind {
            ExprKind::NumberLit(n) => Ok(Value::Number(*n)),
            ExprKind::TextLit(s) => Ok(Value::Text(s.clone())),
            ExprKind::BoolLit(b) => Ok(Value::Boolean(*b)),
            ExprKind::NothingLit => Ok(Value::Nothing),
            ExprKind::ListLit(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item)?);
                }
                Ok(Value::list(values))
            }
            ExprKind::TableLit(entries) => {
                let mut table = Table::new();
                for entry in entries {
                    let key = self.eval_expr(&entry.key)?;
                    let value = self.eval_expr(&entry.value)?;
                    table.insert(key.to_key(), value);
                }
                Ok(Value::table(table))
            }
            ExprKind::Identifier(name) => self
                .env
                .resolve(name)
                .cloned()
                .map_err(|f| self.fail(f, expr.span)),
            ExprKind::Input => self.read_input(expr.span),
            ExprKind::Call { callee, args } => self.call(callee, args, expr.span),
            ExprKind::Binary { left, op, right } => self.eval_binary(left, *op, right, expr.span),
            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                ops::unary(*op, &value).map_err(|f| self.fail(f, expr.span))
            }
            ExprKind::CharacterAt { index, text } => {
                let index = self.eval_expr(index)?;
                let text = self.eval_expr(text)?;
                ops::character_at(&index, &text).map_err(|f| self.fail(f, expr.span))
            }
            ExprKind::Index { target, index } => {
                let target = self.eval_expr(target)?;
                let key = self.eval_expr(index)?;
                ops::index(&target, &key).map_err(|f| self.fail(f, expr.span))
            }
            ExprKind::Convert { expr: inner, target } => {
                let value = self.eval_expr(inner)?;
                ops::convert(&value, *target).map_err(|f| self.fail(f, expr.span))
            }
            ExprKind::FormatDecimal { expr: inner, places } => {
                let value = self.eval_expr(inner)?;
                let places = self.eval_expr(places)?;
                ops::format_decimal(&value, &places).map_err(|f| self.fail(f, expr.span))
            }
            ExprKind::TypeCheck {
                expr: inner,
                type_name,
            } => {
                let value = self.eval_expr(inner)?;
                Ok(Value::Boolean(value.is_type(*type_name)))
            }
            ExprKind::Paren(inner) => self.eval_expr(inner),
        }
    }

    fn eval_binary(&mut self, left: &Expr, op: BinOp, right: &Expr, span: Span) -> EvalResult<Value> {
        let lhs = self.eval_expr(left)?;
        match op {
            BinOp::And if !lhs.is_truthy() => return Ok(Value::Boolean(false)),
            BinOp::Or if lhs.is_truthy() => return Ok(Value::Boolean(true)),
            BinOp::And | BinOp::Or => {
                return Ok(Value::Boolean(self.eval_expr(right)?.is_truthy()));
            }
            _ => {}
        }
        let rhs = self.eval_expr(right)?;
        ops::binary(op, &lhs, &rhs).map_err(|mut fault| {
            if fault.code == ErrorCode::DIVISION_BY_ZERO {
                if let ExprKind::Identifier(name) = &right.kind {
                    fault.message = format!("{} The divisor '{name}' is zero.", fault.message);
                    fault = fault.with_data("divisor", name.as_str());
                }
            }
            self.fail(fault, span)
        })
    }

    fn read_input(&mut self, span: Span) -> EvalResult<Value> {
        match self.io.read_line() {
            Ok(Some(line)) => Ok(Value::Text(line)),
            Ok(None) => Err(self.fail(
                Fault::new(ErrorCode::HOST_FAILURE, "No more input is available.")
                    .with_hint("The program asked for input after the input stream ended."),
                span,
            )),
            Err(e) => Err(self.fail(
                Fault::new(ErrorCode::HOST_FAILURE, format!("Could not read input: {e}")),
                span,
            )),
        }
    }
}
