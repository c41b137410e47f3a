//! Expression parsing with full operator precedence.
//!
//! Precedence (loosest → tightest):
//! 8. `or`
//! 7. `and`
//! 6. `not`
//! 5. comparisons, membership and text tests, `is a <type>` (no chaining)
//! 4. `+`, `-`, `added to`, `split by`
//! 3. `*`, `/`, `modulo`, `%`
//! 2. unary `-`, `length of`, `type of`, `character at X of`
//! 1. postfix `[index]`, `as <type>`, `as decimal(N)`

use steps_lexer::TokenKind;
use steps_types::ast::*;
use steps_types::ErrorCode;

use crate::parser::Parser;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse an expression.
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        self.parse_or()
    }

    fn binary(left: Expr, op: BinOp, right: Expr) -> Expr {
        let span = left.span.merge(right.span);
        Expr::new(
            ExprKind::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            span,
        )
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// `OrExpr = AndExpr { "or" AndExpr }`
    fn parse_or(&mut self) -> Option<Expr> {
        let mut left = self.parse_and()?;
        while self.eat(&TokenKind::Or) {
            let right = self.parse_and()?;
            left = Self::binary(left, BinOp::Or, right);
        }
        Some(left)
    }

    /// `AndExpr = NotExpr { "and" NotExpr }`
    fn parse_and(&mut self) -> Option<Expr> {
        let mut left = self.parse_not()?;
        while self.eat(&TokenKind::And) {
            let right = self.parse_not()?;
            left = Self::binary(left, BinOp::And, right);
        }
        Some(left)
    }

    /// `NotExpr = "not" NotExpr | CompExpr`
    fn parse_not(&mut self) -> Option<Expr> {
        if self.check_exact(&TokenKind::Not) {
            let start = self.advance();
            let operand = self.parse_not()?;
            let span = start.merge(operand.span);
            return Some(Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_comparison()
    }

    /// `CompExpr = AddExpr [ CompOp AddExpr | TypeCheck ]`
    ///
    /// Comparisons do NOT chain: `a is less than b is less than c` is E210.
    fn parse_comparison(&mut self) -> Option<Expr> {
        let left = self.parse_additive()?;

        let expr = if let Some(op) = self.match_comparison_op() {
            self.advance();
            let right = self.parse_additive()?;
            Self::binary(left, op, right)
        } else if let Some(type_name) = self.match_type_check() {
            let end = self.advance();
            let span = left.span.merge(end);
            Expr::new(
                ExprKind::TypeCheck {
                    expr: Box::new(left),
                    type_name,
                },
                span,
            )
        } else {
            return Some(left);
        };

        if self.match_comparison_op().is_some() || self.match_type_check().is_some() {
            let span = self.current_span();
            self.error_with_hint(
                ErrorCode::CHAINED_COMPARISON,
                format!(
                    "Comparisons can't be chained: found '{}' after another comparison.",
                    self.peek_kind()
                ),
                span,
                "Split it with 'and': a is less than b and b is less than c",
            );
            return None;
        }
        Some(expr)
    }

    /// Check if current token is a comparison operator, return corresponding BinOp.
    fn match_comparison_op(&self) -> Option<BinOp> {
        match self.peek_kind() {
            TokenKind::IsEqualTo | TokenKind::Equals => Some(BinOp::Eq),
            TokenKind::IsNotEqualTo => Some(BinOp::NotEq),
            TokenKind::IsLessThan => Some(BinOp::Less),
            TokenKind::IsGreaterThan => Some(BinOp::Greater),
            TokenKind::IsLessThanOrEqualTo => Some(BinOp::LessEq),
            TokenKind::IsGreaterThanOrEqualTo => Some(BinOp::GreaterEq),
            TokenKind::IsIn => Some(BinOp::IsIn),
            TokenKind::Contains => Some(BinOp::Contains),
            TokenKind::StartsWith => Some(BinOp::StartsWith),
            TokenKind::EndsWith => Some(BinOp::EndsWith),
            _ => None,
        }
    }

    fn match_type_check(&self) -> Option<TypeName> {
        match self.peek_kind() {
            TokenKind::IsANumber => Some(TypeName::Number),
            TokenKind::IsAText => Some(TypeName::Text),
            TokenKind::IsABoolean => Some(TypeName::Boolean),
            TokenKind::IsAList => Some(TypeName::List),
            TokenKind::IsATable => Some(TypeName::Table),
            _ => None,
        }
    }

    /// `AddExpr = MulExpr { ("+" | "-" | "added to" | "split by") MulExpr }`
    fn parse_additive(&mut self) -> Option<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                TokenKind::AddedTo => BinOp::AddedTo,
                TokenKind::SplitBy => BinOp::SplitBy,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Self::binary(left, op, right);
        }
        Some(left)
    }

    /// `MulExpr = UnaryExpr { ("*" | "/" | "modulo" | "%") UnaryExpr }`
    fn parse_multiplicative(&mut self) -> Option<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Modulo | TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Self::binary(left, op, right);
        }
        Some(left)
    }

    /// `UnaryExpr = ("-" | "length of" | "type of") UnaryExpr
    ///            | "character at" Primary "of" UnaryExpr
    ///            | PostfixExpr`
    fn parse_unary(&mut self) -> Option<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::LengthOf => UnaryOp::LengthOf,
            TokenKind::TypeOf => UnaryOp::TypeOf,
            TokenKind::CharacterAt => return self.parse_character_at(),
            _ => return self.parse_postfix(),
        };
        let start = self.advance();
        let operand = self.parse_unary()?;
        let span = start.merge(operand.span);
        Some(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    fn parse_character_at(&mut self) -> Option<Expr> {
        let start = self.advance();
        let index = self.parse_primary()?;
        self.expect(&TokenKind::Of)?;
        let text = self.parse_unary()?;
        let span = start.merge(text.span);
        Some(Expr::new(
            ExprKind::CharacterAt {
                index: Box::new(index),
                text: Box::new(text),
            },
            span,
        ))
    }

    /// `PostfixExpr = Primary { "[" Expr "]" | "as" Type | "as" "decimal" "(" Expr ")" }`
    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(&TokenKind::LBracket) {
                let index = self.parse_expression()?;
                let end = self.expect(&TokenKind::RBracket)?;
                let span = expr.span.merge(end);
                expr = Expr::new(
                    ExprKind::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                );
            } else if self.eat(&TokenKind::As) {
                let is_decimal = matches!(self.peek_kind(), TokenKind::Identifier(name) if name == "decimal")
                    && matches!(self.look_ahead(1), TokenKind::LParen);
                if is_decimal {
                    self.advance(); // `decimal`
                    self.advance(); // `(`
                    let places = self.parse_expression()?;
                    let end = self.expect(&TokenKind::RParen)?;
                    let span = expr.span.merge(end);
                    expr = Expr::new(
                        ExprKind::FormatDecimal {
                            expr: Box::new(expr),
                            places: Box::new(places),
                        },
                        span,
                    );
                } else {
                    let target = self.parse_conversion_target()?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Convert {
                            expr: Box::new(expr),
                            target,
                        },
                        span,
                    );
                }
            } else {
                break;
            }
        }
        Some(expr)
    }

    fn parse_conversion_target(&mut self) -> Option<TypeName> {
        let target = match self.peek_kind() {
            TokenKind::KwNumber => TypeName::Number,
            TokenKind::KwText => TypeName::Text,
            TokenKind::KwBoolean => TypeName::Boolean,
            other => {
                let message = format!("Can't convert a value to '{other}'.");
                let span = self.current_span();
                self.error_with_hint(
                    ErrorCode::UNEXPECTED_TOKEN,
                    message,
                    span,
                    "Use 'as number', 'as text', 'as boolean' or 'as decimal(N)'.",
                );
                return None;
            }
        };
        self.advance();
        Some(target)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary Expressions
    // ══════════════════════════════════════════════════════════════════════════

    /// Literals, identifiers, `input`, `call`, parenthesized and bracketed forms.
    pub(crate) fn parse_primary(&mut self) -> Option<Expr> {
        let kind = match self.peek_kind().clone() {
            TokenKind::NumberLit(n) => ExprKind::NumberLit(n),
            TokenKind::TextLit(s) => ExprKind::TextLit(s),
            TokenKind::True => ExprKind::BoolLit(true),
            TokenKind::False => ExprKind::BoolLit(false),
            TokenKind::Nothing => ExprKind::NothingLit,
            TokenKind::Input => ExprKind::Input,
            TokenKind::Identifier(name) => ExprKind::Identifier(name),
            TokenKind::LBracket => return self.parse_list_or_table(),
            TokenKind::LParen => {
                let start = self.advance();
                let inner = self.parse_expression()?;
                let end = self.expect(&TokenKind::RParen)?;
                return Some(Expr::new(ExprKind::Paren(Box::new(inner)), start.merge(end)));
            }
            TokenKind::Call => {
                let start = self.advance();
                let (callee, args) = self.parse_call_parts()?;
                let span = start.merge(self.previous_span());
                return Some(Expr::new(ExprKind::Call { callee, args }, span));
            }
            other => {
                let span = self.current_span();
                self.error_with_hint(
                    ErrorCode::EXPECTED_EXPRESSION,
                    format!("Expected a value or expression, found '{other}'."),
                    span,
                    "Values are numbers, \"text\", true, false, nothing, lists, tables or variable names.",
                );
                return None;
            }
        };
        let span = self.advance();
        Some(Expr::new(kind, span))
    }

    /// `[]`, `[:]`, `[a, b, ...]` or `[key: value, ...]` (the `[` is current).
    fn parse_list_or_table(&mut self) -> Option<Expr> {
        let start = self.advance();

        if self.check_exact(&TokenKind::RBracket) {
            let end = self.advance();
            return Some(Expr::new(ExprKind::ListLit(Vec::new()), start.merge(end)));
        }
        if self.eat(&TokenKind::Colon) {
            let end = self.expect(&TokenKind::RBracket)?;
            return Some(Expr::new(ExprKind::TableLit(Vec::new()), start.merge(end)));
        }

        let first = self.parse_expression()?;

        if self.eat(&TokenKind::Colon) {
            let value = self.parse_expression()?;
            let mut entries = vec![TableEntry { key: first, value }];
            while self.eat(&TokenKind::Comma) {
                if self.check_exact(&TokenKind::RBracket) {
                    break;
                }
                let key = self.parse_expression()?;
                self.expect(&TokenKind::Colon)?;
                let value = self.parse_expression()?;
                entries.push(TableEntry { key, value });
            }
            let end = self.expect(&TokenKind::RBracket)?;
            return Some(Expr::new(ExprKind::TableLit(entries), start.merge(end)));
        }

        let mut elements = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check_exact(&TokenKind::RBracket) {
                break;
            }
            elements.push(self.parse_expression()?);
        }
        let end = self.expect(&TokenKind::RBracket)?;
        Some(Expr::new(ExprKind::ListLit(elements), start.merge(end)))
    }
}
