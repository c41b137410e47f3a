//! Canonical source printer.
//!
//! Renders any [`Program`] back to Steps source with 4-space indentation.
//! Parsing the printed text yields the same AST apart from spans.

use steps_types::ast::*;

const INDENT: &str = "    ";

/// Render a program as canonical Steps source (always ends with a newline).
pub fn print_program(program: &Program) -> String {
    let mut printer = Printer::default();
    match program {
        Program::Building(building) => printer.building(building),
        Program::Floor(floor) => printer.floor(floor),
        Program::Step(step) => printer.step(step),
    }
    printer.out
}

/// Render a single expression.
pub fn print_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

#[derive(Default)]
struct Printer {
    out: String,
    depth: usize,
}

impl Printer {
    fn line(&mut self, text: &str) {
        if text.is_empty() {
            self.out.push('\n');
            return;
        }
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }

    // ── Definitions ──────────────────────────────────────────────────────────

    fn building(&mut self, building: &BuildingDef) {
        self.line(&format!("building: {}", building.name.name));
        self.nested(|p| p.stmts(&building.body));
    }

    fn floor(&mut self, floor: &FloorDef) {
        self.line(&format!("floor: {}", floor.name.name));
        self.nested(|p| {
            for step in &floor.step_names {
                p.line(&format!("step: {}", step.name));
            }
        });
    }

    fn step(&mut self, step: &StepDef) {
        self.line(&format!("step: {}", step.name.name));
        self.nested(|p| {
            p.line(&format!("belongs to: {}", step.belongs_to.name));
            p.signature(&step.parameters, step.return_decl.as_ref());
            for riser in &step.risers {
                p.riser(riser);
            }
            p.declarations(&step.declarations);
            p.line("do:");
            p.nested(|p| p.stmts(&step.body));
        });
    }

    fn riser(&mut self, riser: &RiserDef) {
        self.line(&format!("riser: {}", riser.name.name));
        self.nested(|p| {
            p.signature(&riser.parameters, riser.return_decl.as_ref());
            p.declarations(&riser.declarations);
            p.line("do:");
            p.nested(|p| p.stmts(&riser.body));
        });
    }

    fn signature(&mut self, params: &[Param], returns: Option<&ReturnDecl>) {
        if !params.is_empty() {
            let list: Vec<String> = params
                .iter()
                .map(|p| annotated(&p.name.name, p.type_ann))
                .collect();
            self.line(&format!("expects: {}", list.join(", ")));
        }
        if let Some(ret) = returns {
            self.line(&format!("returns: {}", annotated(&ret.name.name, ret.type_ann)));
        }
    }

    fn declarations(&mut self, declarations: &[Declaration]) {
        if declarations.is_empty() {
            return;
        }
        self.line("declare:");
        self.nested(|p| {
            for decl in declarations {
                let fixed = if decl.is_fixed { " fixed" } else { "" };
                p.line(&format!("{} as {}{fixed}", decl.name.name, decl.declared_type));
            }
        });
    }

    // ── Statements ───────────────────────────────────────────────────────────

    fn stmts(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.stmt(stmt);
        }
    }

    fn block(&mut self, header: &str, block: &Block) {
        self.line(header);
        self.nested(|p| p.stmts(block));
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::Display(expr) => self.line(&format!("display {}", print_expr(expr))),
            StmtKind::Set { target, value } => {
                self.line(&format!("set {} to {}", target.name, print_expr(value)))
            }
            StmtKind::SetIndex {
                target,
                index,
                value,
            } => self.line(&format!(
                "set {}[{}] to {}",
                target.name,
                print_expr(index),
                print_expr(value)
            )),
            StmtKind::Call(call) => {
                let mut text = call_text(&call.callee, &call.args);
                if let Some(target) = &call.result_target {
                    text.push_str(" storing result in ");
                    text.push_str(&target.name);
                }
                self.line(&text);
            }
            StmtKind::Return(Some(value)) => self.line(&format!("return {}", print_expr(value))),
            StmtKind::Return(None) => self.line("return"),
            StmtKind::Exit => self.line("exit"),
            StmtKind::If(if_stmt) => {
                for (i, branch) in if_stmt.branches.iter().enumerate() {
                    let keyword = if i == 0 { "if" } else { "otherwise if" };
                    let header = format!("{keyword} {}", print_expr(&branch.condition));
                    self.block(&header, &branch.body);
                }
                if let Some(otherwise) = &if_stmt.otherwise {
                    self.block("otherwise", otherwise);
                }
            }
            StmtKind::RepeatTimes { count, body } => {
                self.block(&format!("repeat {} times", print_expr(count)), body)
            }
            StmtKind::RepeatForEach {
                item,
                collection,
                body,
            } => self.block(
                &format!("repeat for each {} in {}", item.name, print_expr(collection)),
                body,
            ),
            StmtKind::RepeatWhile { condition, body } => {
                self.block(&format!("repeat while {}", print_expr(condition)), body)
            }
            StmtKind::Attempt(attempt) => {
                self.block("attempt:", &attempt.body);
                if let Some(handler) = &attempt.if_unsuccessful {
                    self.block("if unsuccessful:", handler);
                }
                if let Some(after) = &attempt.then_continue {
                    self.block("then continue:", after);
                }
            }
            StmtKind::AddToList { item, list } => {
                self.line(&format!("add {} to {}", print_expr(item), list.name))
            }
            StmtKind::RemoveFromList { item, list } => {
                self.line(&format!("remove {} from {}", print_expr(item), list.name))
            }
            StmtKind::Note { text, is_block: false } => {
                if text.is_empty() {
                    self.line("note:");
                } else {
                    self.line(&format!("note: {text}"));
                }
            }
            StmtKind::Note { text, is_block: true } => {
                self.line("note block:");
                self.nested(|p| {
                    if !text.is_empty() {
                        for line in text.split('\n') {
                            p.line(line);
                        }
                    }
                });
                self.line("end note");
            }
        }
    }
}

fn annotated(name: &str, type_ann: Option<TypeName>) -> String {
    match type_ann {
        Some(t) => format!("{name} as {t}"),
        None => name.to_string(),
    }
}

fn call_text(callee: &Ident, args: &[Expr]) -> String {
    if args.is_empty() {
        return format!("call {}", callee.name);
    }
    let args: Vec<String> = args.iter().map(print_expr).collect();
    format!("call {} with {}", callee.name, args.join(", "))
}

// ── Expressions ──────────────────────────────────────────────────────────────

fn write_expr(out: &mut String, expr: &Expr) {
    match &expr.kind {
        ExprKind::NumberLit(n) => out.push_str(&format_number(*n)),
        ExprKind::TextLit(s) => write_text_literal(out, s),
        ExprKind::BoolLit(true) => out.push_str("true"),
        ExprKind::BoolLit(false) => out.push_str("false"),
        ExprKind::NothingLit => out.push_str("nothing"),
        ExprKind::ListLit(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, item);
            }
            out.push(']');
        }
        ExprKind::TableLit(entries) if entries.is_empty() => out.push_str("[:]"),
        ExprKind::TableLit(entries) => {
            out.push('[');
            for (i, entry) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, &entry.key);
                out.push_str(": ");
                write_expr(out, &entry.value);
            }
            out.push(']');
        }
        ExprKind::Identifier(name) => out.push_str(name),
        ExprKind::Input => out.push_str("input"),
        ExprKind::Call { callee, args } => out.push_str(&call_text(callee, args)),
        ExprKind::Binary { left, op, right } => {
            write_expr(out, left);
            out.push(' ');
            out.push_str(op.as_str());
            out.push(' ');
            write_expr(out, right);
        }
        ExprKind::Unary { op, operand } => {
            out.push_str(op.as_str());
            out.push(' ');
            write_expr(out, operand);
        }
        ExprKind::CharacterAt { index, text } => {
            out.push_str("character at ");
            write_expr(out, index);
            out.push_str(" of ");
            write_expr(out, text);
        }
        ExprKind::Index { target, index } => {
            write_expr(out, target);
            out.push('[');
            write_expr(out, index);
            out.push(']');
        }
        ExprKind::Convert { expr, target } => {
            write_expr(out, expr);
            out.push_str(" as ");
            out.push_str(target.as_str());
        }
        ExprKind::FormatDecimal { expr, places } => {
            write_expr(out, expr);
            out.push_str(" as decimal(");
            write_expr(out, places);
            out.push(')');
        }
        ExprKind::TypeCheck { expr, type_name } => {
            write_expr(out, expr);
            out.push_str(" is a ");
            out.push_str(type_name.as_str());
        }
        ExprKind::Paren(inner) => {
            out.push('(');
            write_expr(out, inner);
            out.push(')');
        }
    }
}

/// Integral values print without a fractional part.
fn format_number(n: f64) -> String {
    format!("{n}")
}

fn write_text_literal(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            other => out.push(other),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use steps_types::Span;

    fn num(n: f64) -> Expr {
        Expr::new(ExprKind::NumberLit(n), Span::default())
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(print_expr(&num(3.0)), "3");
        assert_eq!(print_expr(&num(2.5)), "2.5");
        assert_eq!(print_expr(&num(-7.0)), "-7");
    }

    #[test]
    fn test_text_escapes() {
        let e = Expr::new(ExprKind::TextLit("a\"b\\c\n".into()), Span::default());
        assert_eq!(print_expr(&e), r#""a\"b\\c\n""#);
    }

    #[test]
    fn test_operator_spelling() {
        let e = Expr::new(
            ExprKind::Binary {
                left: Box::new(num(7.0)),
                op: BinOp::Mod,
                right: Box::new(num(2.0)),
            },
            Span::default(),
        );
        assert_eq!(print_expr(&e), "7 modulo 2");
    }

    #[test]
    fn test_empty_collections() {
        let list = Expr::new(ExprKind::ListLit(vec![]), Span::default());
        let table = Expr::new(ExprKind::TableLit(vec![]), Span::default());
        assert_eq!(print_expr(&list), "[]");
        assert_eq!(print_expr(&table), "[:]");
    }
}
