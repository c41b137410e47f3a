//! Statement parsing.

use crate::parser::Parser;
use steps_lexer::TokenKind;
use steps_types::ast::*;
use steps_types::{ErrorCode, Span};

/// Keywords from other languages and the Steps word to use instead.
const WRONG_KEYWORDS: &[(&str, &str)] = &[
    ("else", "otherwise"),
    ("elif", "otherwise if"),
    ("print", "display"),
    ("for", "repeat for each"),
    ("try", "attempt:"),
    ("let", "set"),
    ("var", "set"),
];

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Blocks
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse the indented block that follows a header line (`do:`, `if x`, ...).
    ///
    /// The line terminator is expected first. Returns `None` after reporting
    /// E203/E204; the caller does not need to skip anything.
    pub(crate) fn parse_block(&mut self, header: &str) -> Option<Block> {
        if self.expect_newline().is_none() {
            self.skip_line();
            return None;
        }
        let leading = self.take_leading_notes();
        let indent = self.expect_indent(header)?;
        Some(self.parse_statements_until_dedent(leading, indent))
    }

    /// Note lines directly under a header carry no indentation, so they
    /// arrive before the block's `Indent`.
    pub(crate) fn take_leading_notes(&mut self) -> Vec<Stmt> {
        let mut notes = Vec::new();
        while let Some(note) = self.parse_note() {
            notes.push(note);
        }
        notes
    }

    /// Parse statements until the `Dedent` closing the block (`Indent` consumed).
    pub(crate) fn parse_statements_until_dedent(&mut self, mut stmts: Vec<Stmt>, indent: Span) -> Block {
        while !self.at_block_end() {
            if self.too_many_errors() {
                break;
            }
            if self.peek_kind().is_structural() {
                // Section keyword inside a statement block: the block ended early.
                break;
            }
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize(),
            }
        }
        self.eat(&TokenKind::Dedent);
        let span = match (stmts.first(), stmts.last()) {
            (Some(first), Some(last)) => first.span.merge(last.span),
            _ => indent,
        };
        Block::new(stmts, span)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Dispatch
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse a single statement.
    pub(crate) fn parse_statement(&mut self) -> Option<Stmt> {
        match self.peek_kind().clone() {
            TokenKind::Display => self.parse_display(),
            TokenKind::Set => self.parse_set(),
            TokenKind::Call => self.parse_call_stmt(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Exit => {
                let span = self.advance();
                self.expect_newline()?;
                Some(Stmt::new(StmtKind::Exit, span))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::Repeat => self.parse_repeat(),
            TokenKind::Attempt => self.parse_attempt(),
            TokenKind::Add => self.parse_add_to_list(),
            TokenKind::Remove => self.parse_remove_from_list(),
            TokenKind::Note(_) | TokenKind::NoteBlock(_) => self.parse_note(),
            TokenKind::BareStructural(word) => {
                self.missing_colon(&word);
                None
            }
            TokenKind::While => {
                self.wrong_keyword("while", "repeat while");
                None
            }
            TokenKind::Identifier(word) => {
                match WRONG_KEYWORDS.iter().find(|(wrong, _)| *wrong == word) {
                    Some((wrong, right)) => self.wrong_keyword(wrong, right),
                    None => self.expected_statement(&TokenKind::Identifier(word.clone())),
                }
                None
            }
            TokenKind::Otherwise | TokenKind::OtherwiseIf => {
                let span = self.current_span();
                self.error_with_hint(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("'{}' without a matching 'if'.", self.peek_kind()),
                    span,
                    "'otherwise' must line up with the 'if' it belongs to.",
                );
                None
            }
            TokenKind::IfUnsuccessful | TokenKind::ThenContinue => {
                let span = self.current_span();
                self.error_with_hint(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("'{}' without a matching 'attempt:'.", self.peek_kind()),
                    span,
                    "Place it directly after the 'attempt:' block, at the same indentation.",
                );
                None
            }
            other => {
                self.expected_statement(&other);
                None
            }
        }
    }

    fn expected_statement(&mut self, found: &TokenKind) {
        let span = self.current_span();
        self.error_with_hint(
            ErrorCode::UNEXPECTED_TOKEN,
            format!("Expected a statement, found '{found}'."),
            span,
            "Statements start with display, set, call, if, repeat, attempt, add, remove, return or exit.",
        );
    }

    fn wrong_keyword(&mut self, wrong: &str, right: &str) {
        let span = self.current_span();
        self.error_with_hint(
            ErrorCode::WRONG_KEYWORD,
            format!("'{wrong}' is not a Steps keyword."),
            span,
            format!("Use '{right}' instead."),
        );
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Simple Statements
    // ══════════════════════════════════════════════════════════════════════════

    /// `display expr`
    fn parse_display(&mut self) -> Option<Stmt> {
        let start = self.advance();
        let expr = self.parse_expression()?;
        let span = start.merge(self.previous_span());
        self.expect_newline()?;
        Some(Stmt::new(StmtKind::Display(expr), span))
    }

    /// `set name to expr` or `set name[index] to expr`
    fn parse_set(&mut self) -> Option<Stmt> {
        let start = self.advance();
        let target = self.expect_identifier("a variable name after 'set'")?;
        let index = if self.eat(&TokenKind::LBracket) {
            let index = self.parse_expression()?;
            self.expect(&TokenKind::RBracket)?;
            Some(index)
        } else {
            None
        };
        self.expect(&TokenKind::To)?;
        let value = self.parse_expression()?;
        let span = start.merge(self.previous_span());
        self.expect_newline()?;
        let kind = match index {
            Some(index) => StmtKind::SetIndex {
                target,
                index,
                value,
            },
            None => StmtKind::Set { target, value },
        };
        Some(Stmt::new(kind, span))
    }

    /// `call name [with a, b] [storing result in var]`
    fn parse_call_stmt(&mut self) -> Option<Stmt> {
        let start = self.advance();
        let (callee, args) = self.parse_call_parts()?;
        let result_target = if self.eat(&TokenKind::StoringResultIn) {
            Some(self.expect_identifier("a variable name after 'storing result in'")?)
        } else {
            None
        };
        let span = start.merge(self.previous_span());
        self.expect_newline()?;
        Some(Stmt::new(
            StmtKind::Call(CallStmt {
                callee,
                args,
                result_target,
            }),
            span,
        ))
    }

    /// Callee name and optional `with` argument list (the `call` token is consumed).
    pub(crate) fn parse_call_parts(&mut self) -> Option<(Ident, Vec<Expr>)> {
        let callee = self.expect_identifier("a step or riser name after 'call'")?;
        let mut args = Vec::new();
        if self.eat(&TokenKind::With) {
            loop {
                if matches!(
                    self.peek_kind(),
                    TokenKind::StoringResultIn | TokenKind::Newline | TokenKind::Eof
                ) {
                    break;
                }
                args.push(self.parse_expression()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        Some((callee, args))
    }

    /// `return [expr]`
    fn parse_return(&mut self) -> Option<Stmt> {
        let start = self.advance();
        let value = if matches!(
            self.peek_kind(),
            TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent
        ) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let span = start.merge(self.previous_span());
        self.expect_newline()?;
        Some(Stmt::new(StmtKind::Return(value), span))
    }

    /// `add expr to list`
    fn parse_add_to_list(&mut self) -> Option<Stmt> {
        let start = self.advance();
        let item = self.parse_expression()?;
        self.expect(&TokenKind::To)?;
        let list = self.expect_identifier("a list name after 'to'")?;
        let span = start.merge(self.previous_span());
        self.expect_newline()?;
        Some(Stmt::new(StmtKind::AddToList { item, list }, span))
    }

    /// `remove expr from list`
    fn parse_remove_from_list(&mut self) -> Option<Stmt> {
        let start = self.advance();
        let item = self.parse_expression()?;
        self.expect(&TokenKind::From)?;
        let list = self.expect_identifier("a list name after 'from'")?;
        let span = start.merge(self.previous_span());
        self.expect_newline()?;
        Some(Stmt::new(StmtKind::RemoveFromList { item, list }, span))
    }

    /// `note: text` or a `note block:`; `None` if the current token is neither.
    fn parse_note(&mut self) -> Option<Stmt> {
        let (text, is_block) = match self.peek_kind() {
            TokenKind::Note(text) => (text.clone(), false),
            TokenKind::NoteBlock(text) => (text.clone(), true),
            _ => return None,
        };
        let span = self.advance();
        self.eat(&TokenKind::Newline);
        Some(Stmt::new(StmtKind::Note { text, is_block }, span))
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Compound Statements
    // ══════════════════════════════════════════════════════════════════════════

    /// `if cond` block {`otherwise if cond` block} [`otherwise` block]
    fn parse_if(&mut self) -> Option<Stmt> {
        let start = self.advance();
        let condition = self.parse_expression()?;
        let body = self.parse_block("if")?;
        let mut branches = vec![CondBranch {
            span: start.merge(body.span),
            condition,
            body,
        }];

        while self.check_exact(&TokenKind::OtherwiseIf) {
            let branch_start = self.advance();
            let condition = self.parse_expression()?;
            let body = self.parse_block("otherwise if")?;
            branches.push(CondBranch {
                span: branch_start.merge(body.span),
                condition,
                body,
            });
        }

        let otherwise = if self.eat(&TokenKind::Otherwise) {
            Some(self.parse_block("otherwise")?)
        } else {
            None
        };

        let end = otherwise
            .as_ref()
            .map(|b| b.span)
            .or_else(|| branches.last().map(|b| b.span))
            .unwrap_or(start);
        Some(Stmt::new(
            StmtKind::If(IfStmt {
                branches,
                otherwise,
            }),
            start.merge(end),
        ))
    }

    /// `repeat N times` | `repeat for each x in xs` | `repeat while cond`
    fn parse_repeat(&mut self) -> Option<Stmt> {
        let start = self.advance();

        if self.eat(&TokenKind::ForEach) {
            let item = self.expect_identifier("a loop variable name after 'for each'")?;
            self.expect(&TokenKind::In)?;
            let collection = self.parse_expression()?;
            let body = self.parse_block("repeat for each")?;
            let span = start.merge(body.span);
            return Some(Stmt::new(
                StmtKind::RepeatForEach {
                    item,
                    collection,
                    body,
                },
                span,
            ));
        }

        if self.eat(&TokenKind::While) {
            let condition = self.parse_expression()?;
            let body = self.parse_block("repeat while")?;
            let span = start.merge(body.span);
            return Some(Stmt::new(StmtKind::RepeatWhile { condition, body }, span));
        }

        let count = self.parse_expression()?;
        if !self.check_exact(&TokenKind::Times) {
            let span = self.current_span();
            self.error_with_hint(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("Expected 'times' after the repeat count, found '{}'.", self.peek_kind()),
                span,
                "Write 'repeat 3 times', 'repeat for each item in list' or 'repeat while condition'.",
            );
            return None;
        }
        self.advance();
        let body = self.parse_block("repeat")?;
        let span = start.merge(body.span);
        Some(Stmt::new(StmtKind::RepeatTimes { count, body }, span))
    }

    /// `attempt:` block [`if unsuccessful:` block] [`then continue:` block]
    fn parse_attempt(&mut self) -> Option<Stmt> {
        let start = self.advance();
        let body = self.parse_block("attempt:")?;
        let mut end = body.span;

        let if_unsuccessful = if self.eat(&TokenKind::IfUnsuccessful) {
            let block = self.parse_block("if unsuccessful:")?;
            end = block.span;
            Some(block)
        } else {
            None
        };
        let then_continue = if self.eat(&TokenKind::ThenContinue) {
            let block = self.parse_block("then continue:")?;
            end = block.span;
            Some(block)
        } else {
            None
        };

        Some(Stmt::new(
            StmtKind::Attempt(AttemptStmt {
                body,
                if_unsuccessful,
                then_continue,
            }),
            start.merge(end),
        ))
    }
}
