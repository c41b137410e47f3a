//! Call frames and variable bindings for the Steps evaluator.

use crate::error::Fault;
use crate::value::Value;
use std::collections::BTreeMap;
use steps_types::ast::{Declaration, Param, StepDef, TypeName};
use steps_types::{ErrorCode, SourceFile};

/// What kind of code a frame executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Building,
    Step,
    Riser,
}

impl FrameKind {
    fn label(self) -> &'static str {
        match self {
            FrameKind::Building => "Building",
            FrameKind::Step => "Step",
            FrameKind::Riser => "Riser",
        }
    }
}

/// A variable slot. Fixed declarations carry the type they are locked to.
#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    locked: Option<TypeName>,
}

impl Binding {
    fn free(value: Value) -> Self {
        Self { value, locked: None }
    }
}

/// A binding displaced by [`Environment::shadow`].
#[derive(Debug)]
pub struct Shadowed {
    previous: Option<Binding>,
}

/// One activation: the building body, a step call or a riser call.
#[derive(Debug)]
struct Frame<'r> {
    kind: FrameKind,
    name: String,
    /// The step whose risers are callable from here.
    step: Option<&'r StepDef>,
    file: &'r SourceFile,
    vars: BTreeMap<String, Binding>,
    /// For a riser frame, the index of its defining step's frame.
    chain: Option<usize>,
}

/// Stack of call frames.
///
/// Lookups search the current frame and, for a riser, the frame of the step
/// that defines it. Assignments always land in the current frame. Lists and
/// tables are shared handles, so in-place updates through a resolved value
/// are seen by every name bound to it.
#[derive(Debug, Default)]
pub struct Environment<'r> {
    frames: Vec<Frame<'r>>,
}

impl<'r> Environment<'r> {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Start the building's frame. Clears any previous run.
    pub fn push_building(&mut self, name: &str, file: &'r SourceFile) {
        self.frames.clear();
        self.frames.push(Frame {
            kind: FrameKind::Building,
            name: name.to_string(),
            step: None,
            file,
            vars: BTreeMap::new(),
            chain: None,
        });
    }

    /// Push a step or riser frame and bind its parameters.
    ///
    /// `step` is the step definition the callee belongs to: the step itself,
    /// or a riser's defining step. Arguments are deep-copied, so a callee
    /// never changes a caller's list or table.
    pub fn enter_call(
        &mut self,
        kind: FrameKind,
        name: &str,
        step: &'r StepDef,
        file: &'r SourceFile,
        params: &[Param],
        args: Vec<Value>,
    ) -> Result<(), Fault> {
        if params.len() != args.len() {
            let expected = if params.is_empty() {
                "(none)".to_string()
            } else {
                params
                    .iter()
                    .map(|p| p.name.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            return Err(Fault::new(
                ErrorCode::WRONG_ARGUMENT_COUNT,
                format!(
                    "{} '{name}' expects {} argument(s), got {}.",
                    kind.label(),
                    params.len(),
                    args.len()
                ),
            )
            .with_hint(format!("Expected parameters: {expected}"))
            .with_data("expected", params.len())
            .with_data("actual", args.len()));
        }

        let chain = match kind {
            FrameKind::Riser => self.frames.last().and_then(|caller| match caller.kind {
                FrameKind::Riser => caller.chain,
                _ => Some(self.frames.len() - 1),
            }),
            _ => None,
        };

        let vars = params
            .iter()
            .zip(args)
            .map(|(p, v)| (p.name.name.clone(), Binding::free(v.deep_copy())))
            .collect();

        self.frames.push(Frame {
            kind,
            name: name.to_string(),
            step: Some(step),
            file,
            vars,
            chain,
        });
        Ok(())
    }

    /// Pop the current call frame. The building frame is never popped.
    pub fn leave_call(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Number of active step/riser calls.
    pub fn depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    /// Bind `declare:` entries to their type defaults in the current frame.
    pub fn declare(&mut self, declarations: &[Declaration]) {
        if let Some(frame) = self.frames.last_mut() {
            for decl in declarations {
                frame.vars.insert(
                    decl.name.name.clone(),
                    Binding {
                        value: Value::default_for(decl.declared_type),
                        locked: decl.is_fixed.then_some(decl.declared_type),
                    },
                );
            }
        }
    }

    pub fn resolve(&self, name: &str) -> Result<&Value, Fault> {
        let Some(top) = self.frames.len().checked_sub(1) else {
            return Err(self.undefined(name));
        };
        for index in self.visible(top) {
            if let Some(binding) = self.frames[index].vars.get(name) {
                return Ok(&binding.value);
            }
        }
        Err(self.undefined(name))
    }

    /// Assign in the current frame, honouring a fixed declaration's type.
    pub fn bind(&mut self, name: &str, value: Value) -> Result<(), Fault> {
        let Some(frame) = self.frames.last_mut() else {
            return Ok(());
        };
        match frame.vars.get_mut(name) {
            Some(binding) => {
                if let Some(locked) = binding.locked {
                    if !value.is_type(locked) {
                        return Err(Fault::new(
                            ErrorCode::FIXED_TYPE_MISMATCH,
                            format!(
                                "Cannot assign {} to '{name}' - it was declared as '{locked} fixed'.",
                                value.type_name()
                            ),
                        )
                        .with_hint(format!(
                            "A fixed variable keeps its type. Assign a {locked} value, or remove 'fixed' from the declaration."
                        ))
                        .with_data("declared_type", locked.as_str())
                        .with_data("actual_type", value.type_name()));
                    }
                }
                binding.value = value;
            }
            None => {
                frame.vars.insert(name.to_string(), Binding::free(value));
            }
        }
        Ok(())
    }

    /// Bind `name` in the current frame for a limited stretch, ignoring any
    /// fixed lock. [`Environment::unshadow`] puts the previous binding back.
    pub fn shadow(&mut self, name: &str, value: Value) -> Shadowed {
        let previous = self
            .frames
            .last_mut()
            .and_then(|frame| frame.vars.insert(name.to_string(), Binding::free(value)));
        Shadowed { previous }
    }

    pub fn unshadow(&mut self, name: &str, saved: Shadowed) {
        if let Some(frame) = self.frames.last_mut() {
            match saved.previous {
                Some(binding) => {
                    frame.vars.insert(name.to_string(), binding);
                }
                None => {
                    frame.vars.remove(name);
                }
            }
        }
    }

    /// Call chain of step/riser names, outermost first: `a → b → c`.
    pub fn call_stack(&self) -> String {
        let names: Vec<&str> = self
            .frames
            .iter()
            .filter(|f| f.kind != FrameKind::Building)
            .map(|f| f.name.as_str())
            .collect();
        if names.is_empty() {
            "(at top level)".to_string()
        } else {
            names.join(" → ")
        }
    }

    /// Step whose risers are callable from the current frame.
    pub fn current_step(&self) -> Option<&'r StepDef> {
        self.frames.last().and_then(|f| f.step)
    }

    /// Source file of the code currently executing.
    pub fn file(&self) -> Option<&'r SourceFile> {
        self.frames.last().map(|f| f.file)
    }

    // ── Helpers ──

    fn visible(&self, top: usize) -> Vec<usize> {
        let mut indices = vec![top];
        if let Some(step_frame) = self.frames[top].chain {
            indices.push(step_frame);
        }
        indices
    }

    fn undefined(&self, name: &str) -> Fault {
        let similar = self.similar_names(name);
        let hint = match similar.first() {
            Some(candidate) => format!("Did you mean '{candidate}'?"),
            None => "Make sure to use 'set' to define variables before using them.".to_string(),
        };
        Fault::new(
            ErrorCode::UNDEFINED_VARIABLE,
            format!("Variable '{name}' has not been defined yet."),
        )
        .with_hint(hint)
        .with_data("name", name)
    }

    /// Names in scope that share a first letter with `name` or contain it.
    fn similar_names(&self, name: &str) -> Vec<String> {
        let Some(top) = self.frames.len().checked_sub(1) else {
            return Vec::new();
        };
        let wanted = name.to_lowercase();
        let first = wanted.chars().next();
        let mut found: Vec<String> = Vec::new();
        for index in self.visible(top) {
            for candidate in self.frames[index].vars.keys() {
                let lower = candidate.to_lowercase();
                let matches = lower.contains(&wanted)
                    || first.is_some_and(|c| lower.starts_with(c));
                if matches && !found.contains(candidate) {
                    found.push(candidate.clone());
                }
            }
        }
        found.truncate(3);
        found
    }
}
