//! AST node types for the Steps language.
//!
//! Every node carries a [`Span`] for error reporting.
//! Recursive expression variants are boxed to keep enum sizes reasonable.
//! Source order is preserved everywhere (no maps in the tree).

use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// Which grammar a source file is parsed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Building,
    Floor,
    Step,
}

impl FileKind {
    /// The header keyword that must open a file of this kind.
    pub fn header(self) -> &'static str {
        match self {
            FileKind::Building => "building:",
            FileKind::Floor => "floor:",
            FileKind::Step => "step:",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Building => f.write_str("building"),
            FileKind::Floor => f.write_str("floor"),
            FileKind::Step => f.write_str("step"),
        }
    }
}

/// The root of one parsed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Program {
    Building(BuildingDef),
    Floor(FloorDef),
    Step(StepDef),
}

impl Program {
    pub fn kind(&self) -> FileKind {
        match self {
            Program::Building(_) => FileKind::Building,
            Program::Floor(_) => FileKind::Floor,
            Program::Step(_) => FileKind::Step,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Program::Building(b) => &b.name.name,
            Program::Floor(f) => &f.name.name,
            Program::Step(s) => &s.name.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Program::Building(b) => b.span,
            Program::Floor(f) => f.span,
            Program::Step(s) => s.span,
        }
    }
}

/// `building: name` followed by the program's top-level statements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingDef {
    pub name: Ident,
    pub body: Block,
    pub span: Span,
}

/// `floor: name` followed by `step: name` lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorDef {
    pub name: Ident,
    pub step_names: Vec<Ident>,
    pub span: Span,
}

/// `step: name` with its header clauses, risers, declarations and `do:` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDef {
    pub name: Ident,
    pub belongs_to: Ident,
    pub parameters: Vec<Param>,
    pub return_decl: Option<ReturnDecl>,
    pub risers: Vec<RiserDef>,
    pub declarations: Vec<Declaration>,
    pub body: Block,
    pub span: Span,
}

impl StepDef {
    /// Look up a riser defined inside this step.
    pub fn riser(&self, name: &str) -> Option<&RiserDef> {
        self.risers.iter().find(|r| r.name.name == name)
    }
}

/// `riser: name`, a helper private to its defining step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiserDef {
    pub name: Ident,
    pub parameters: Vec<Param>,
    pub return_decl: Option<ReturnDecl>,
    pub declarations: Vec<Declaration>,
    pub body: Block,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Identifiers & Declarations
// ══════════════════════════════════════════════════════════════════════════════

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

/// The five declarable value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeName {
    Number,
    Text,
    Boolean,
    List,
    Table,
}

impl TypeName {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeName::Number => "number",
            TypeName::Text => "text",
            TypeName::Boolean => "boolean",
            TypeName::List => "list",
            TypeName::Table => "table",
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of `expects:`: `name` or `name as type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: Ident,
    pub type_ann: Option<TypeName>,
    pub span: Span,
}

/// `returns: name [as type]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnDecl {
    pub name: Ident,
    pub type_ann: Option<TypeName>,
    pub span: Span,
}

/// A `declare:` line: `name as type [fixed]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub name: Ident,
    pub declared_type: TypeName,
    pub is_fixed: bool,
    pub span: Span,
}

/// An indented statement block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>, span: Span) -> Self {
        Self { stmts, span }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

/// A statement node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    /// `display expr`
    Display(Expr),
    /// `set name to expr`
    Set { target: Ident, value: Expr },
    /// `set name[index] to expr`
    SetIndex {
        target: Ident,
        index: Expr,
        value: Expr,
    },
    /// `call name [with a, b] [storing result in x]`
    Call(CallStmt),
    /// `return [expr]`
    Return(Option<Expr>),
    /// `exit`
    Exit,
    /// `if` / `otherwise if` / `otherwise`
    If(IfStmt),
    /// `repeat N times`
    RepeatTimes { count: Expr, body: Block },
    /// `repeat for each item in collection`
    RepeatForEach {
        item: Ident,
        collection: Expr,
        body: Block,
    },
    /// `repeat while condition`
    RepeatWhile { condition: Expr, body: Block },
    /// `attempt:` / `if unsuccessful:` / `then continue:`
    Attempt(AttemptStmt),
    /// `add item to list`
    AddToList { item: Expr, list: Ident },
    /// `remove item from list`
    RemoveFromList { item: Expr, list: Ident },
    /// `note: ...` or `note block: ... end note`. Never executed.
    Note { text: String, is_block: bool },
}

/// `call callee [with args] [storing result in target]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallStmt {
    pub callee: Ident,
    pub args: Vec<Expr>,
    pub result_target: Option<Ident>,
}

/// An `if` chain: the first branch is the `if`, the rest are `otherwise if`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    pub branches: Vec<CondBranch>,
    pub otherwise: Option<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondBranch {
    pub condition: Expr,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptStmt {
    pub body: Block,
    pub if_unsuccessful: Option<Block>,
    pub then_continue: Option<Block>,
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// An expression node. Uses `Box` for recursive variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    // ── Literals ──
    /// `42`, `-3.5`
    NumberLit(f64),
    /// `"hello"`
    TextLit(String),
    /// `true` / `false`
    BoolLit(bool),
    /// `nothing`
    NothingLit,
    /// `[a, b, c]`
    ListLit(Vec<Expr>),
    /// `[key: value, ...]` or `[:]`
    TableLit(Vec<TableEntry>),

    // ── References ──
    Identifier(String),
    /// `input`: one line from the host's input stream.
    Input,
    /// `call name [with a, b]` used for its returned value.
    Call { callee: Ident, args: Vec<Expr> },

    // ── Operators ──
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// `character at index of text`
    CharacterAt {
        index: Box<Expr>,
        text: Box<Expr>,
    },

    // ── Postfix ──
    /// `target[index]`
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    /// `expr as number|text|boolean`
    Convert { expr: Box<Expr>, target: TypeName },
    /// `expr as decimal(places)`
    FormatDecimal {
        expr: Box<Expr>,
        places: Box<Expr>,
    },
    /// `expr is a number` etc.
    TypeCheck { expr: Box<Expr>, type_name: TypeName },

    /// `(expr)`
    Paren(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    pub key: Expr,
    pub value: Expr,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    // Logical
    Or,
    And,
    // Comparison
    Eq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    // Membership / text tests (comparison level)
    IsIn,
    Contains,
    StartsWith,
    EndsWith,
    // Additive
    Add,
    Sub,
    AddedTo,
    SplitBy,
    // Multiplicative
    Mul,
    Div,
    Mod,
}

impl BinOp {
    /// The operator as written in Steps source.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Or => "or",
            BinOp::And => "and",
            BinOp::Eq => "is equal to",
            BinOp::NotEq => "is not equal to",
            BinOp::Less => "is less than",
            BinOp::Greater => "is greater than",
            BinOp::LessEq => "is less than or equal to",
            BinOp::GreaterEq => "is greater than or equal to",
            BinOp::IsIn => "is in",
            BinOp::Contains => "contains",
            BinOp::StartsWith => "starts with",
            BinOp::EndsWith => "ends with",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::AddedTo => "added to",
            BinOp::SplitBy => "split by",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "modulo",
        }
    }

    /// Whether this operator sits on the (non-associative) comparison level.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Eq
                | BinOp::NotEq
                | BinOp::Less
                | BinOp::Greater
                | BinOp::LessEq
                | BinOp::GreaterEq
                | BinOp::IsIn
                | BinOp::Contains
                | BinOp::StartsWith
                | BinOp::EndsWith
        )
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `- x`
    Neg,
    /// `not x`
    Not,
    /// `length of x`
    LengthOf,
    /// `type of x`
    TypeOf,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "not",
            UnaryOp::LengthOf => "length of",
            UnaryOp::TypeOf => "type of",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Ident {
        Ident::new(name, Span::point(1, 1))
    }

    #[test]
    fn test_program_accessors() {
        let floor = Program::Floor(FloorDef {
            name: ident("math"),
            step_names: vec![ident("double")],
            span: Span::new(1, 1, 2, 18),
        });
        assert_eq!(floor.kind(), FileKind::Floor);
        assert_eq!(floor.name(), "math");
        assert_eq!(floor.span().end_line, 2);
    }

    #[test]
    fn test_step_riser_lookup() {
        let riser = RiserDef {
            name: ident("helper"),
            parameters: vec![],
            return_decl: None,
            declarations: vec![],
            body: Block::new(vec![], Span::point(3, 9)),
            span: Span::point(3, 5),
        };
        let step = StepDef {
            name: ident("main_step"),
            belongs_to: ident("core"),
            parameters: vec![],
            return_decl: None,
            risers: vec![riser],
            declarations: vec![],
            body: Block::new(vec![], Span::point(5, 9)),
            span: Span::point(1, 1),
        };
        assert!(step.riser("helper").is_some());
        assert!(step.riser("other").is_none());
    }

    #[test]
    fn test_comparison_operators() {
        assert!(BinOp::GreaterEq.is_comparison());
        assert!(BinOp::StartsWith.is_comparison());
        assert!(!BinOp::AddedTo.is_comparison());
        assert!(!BinOp::And.is_comparison());
    }

    #[test]
    fn test_type_name_json() {
        let json = serde_json::to_string(&TypeName::Boolean).unwrap();
        assert_eq!(json, "\"boolean\"");
        assert_eq!(FileKind::Step.header(), "step:");
    }
}
