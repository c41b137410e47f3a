//! Core parser infrastructure: token cursor, error reporting, helpers.

use steps_lexer::{Token, TokenKind};
use steps_types::ast::{FileKind, Ident, Program, TypeName};
use steps_types::{Diagnostics, ErrorCode, SourceFile, Span, StepsError, MAX_ERRORS};

/// The Steps parser.
///
/// Consumes a token stream produced by the lexer and builds an AST.
/// Collects errors and recovers by synchronizing on line boundaries.
pub struct Parser<'src> {
    /// The token stream.
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    /// Source file for error context.
    source_file: &'src SourceFile,
    /// Collected errors.
    errors: Diagnostics,
}

/// Result of parsing.
///
/// `program` is present whenever the file header was recognized, even if
/// later sections reported errors; callers check `errors` before running it.
pub struct ParseResult {
    pub program: Option<Program>,
    pub errors: Diagnostics,
}

impl<'src> Parser<'src> {
    /// Create a new parser from a token stream and source file.
    pub fn new(tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        Self {
            tokens,
            pos: 0,
            source_file,
            errors: Diagnostics::empty(),
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).or_else(|| self.tokens.last())
    }

    /// Returns the kind of the current token.
    pub(crate) fn peek_kind(&self) -> &TokenKind {
        self.peek().map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    /// Advance the cursor by one and return the consumed token's span.
    pub(crate) fn advance(&mut self) -> Span {
        let span = self.current_span();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        span
    }

    /// Returns the previously consumed token's span.
    pub(crate) fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span)
            .unwrap_or_else(|| Span::point(1, 1))
    }

    fn previous_kind(&self) -> Option<&TokenKind> {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| &t.kind)
    }

    /// Returns the span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.peek().map(|t| t.span).unwrap_or_else(|| Span::point(1, 1))
    }

    /// Returns `true` if the current token is `Eof`.
    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    /// Returns `true` at the end of the enclosing block.
    pub(crate) fn at_block_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Dedent | TokenKind::Eof)
    }

    /// Check if the current token matches the given kind exactly.
    pub(crate) fn check_exact(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check_exact(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Look ahead by `n` tokens from current position.
    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    // ── Line Handling ─────────────────────────────────────────────────────────

    /// Skip blank-line tokens and comments (file headers, section lists).
    pub(crate) fn skip_trivia(&mut self) {
        while matches!(
            self.peek_kind(),
            TokenKind::Newline | TokenKind::Note(_) | TokenKind::NoteBlock(_)
        ) {
            self.advance();
        }
    }

    /// Expect the end of the current line. A trailing `note:` is allowed.
    pub(crate) fn expect_newline(&mut self) -> Option<()> {
        if matches!(self.peek_kind(), TokenKind::Note(_))
            && matches!(self.look_ahead(1), TokenKind::Newline)
        {
            self.advance();
        }
        if self.eat(&TokenKind::Newline) || self.at_end() {
            return Some(());
        }
        self.error_at_current(
            ErrorCode::EXPECTED_NEWLINE,
            format!("Expected the end of the line, found '{}'.", self.peek_kind()),
        );
        None
    }

    /// Expect the `Indent` that opens a block after a header line.
    pub(crate) fn expect_indent(&mut self, after: &str) -> Option<Span> {
        if self.check_exact(&TokenKind::Indent) {
            return Some(self.advance());
        }
        let span = self.current_span();
        self.error_with_hint(
            ErrorCode::EXPECTED_INDENT,
            format!("Expected an indented block after '{after}'."),
            span,
            "Indent the lines that belong to this block by 4 more spaces.",
        );
        None
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a specific token kind. Returns its span if matched, or emits an error.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Span> {
        if self.check_exact(expected) {
            Some(self.advance())
        } else {
            self.error_at_current(
                ErrorCode::UNEXPECTED_TOKEN,
                format!("Expected '{}', found '{}'.", expected, self.peek_kind()),
            );
            None
        }
    }

    /// Expect an identifier token. `what` describes the name for the message.
    pub(crate) fn expect_identifier(&mut self, what: &str) -> Option<Ident> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                let span = self.advance();
                Some(Ident::new(name, span))
            }
            other => {
                let hint = if other.is_keyword() {
                    format!("'{other}' is a reserved word and can't be used as a name.")
                } else {
                    "Names start with a letter or '_' and contain letters, digits and '_'."
                        .to_string()
                };
                let span = self.current_span();
                self.error_with_hint(
                    ErrorCode::EXPECTED_IDENTIFIER,
                    format!("Expected {what}, found '{other}'."),
                    span,
                    hint,
                );
                None
            }
        }
    }

    /// Expect one of the five type names.
    pub(crate) fn expect_type_name(&mut self) -> Option<TypeName> {
        let type_name = match self.peek_kind() {
            TokenKind::KwNumber => TypeName::Number,
            TokenKind::KwText => TypeName::Text,
            TokenKind::KwBoolean => TypeName::Boolean,
            TokenKind::KwList => TypeName::List,
            TokenKind::KwTable => TypeName::Table,
            other => {
                let message = format!("Expected a type name, found '{other}'.");
                let span = self.current_span();
                self.error_with_hint(
                    ErrorCode::UNEXPECTED_TOKEN,
                    message,
                    span,
                    "Types are: number, text, boolean, list, table.",
                );
                return None;
            }
        };
        self.advance();
        Some(type_name)
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    /// Report an error at the current token position.
    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(code, message, span);
    }

    /// Report an error at a specific span.
    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let error = StepsError::new(&self.source_file.name, code, message, span)
            .with_context(self.source_file);
        self.errors.push_error(error);
    }

    /// Report an error with an actionable hint.
    pub(crate) fn error_with_hint(
        &mut self,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        hint: impl Into<String>,
    ) {
        let error = StepsError::new(&self.source_file.name, code, message, span)
            .with_hint(hint)
            .with_context(self.source_file);
        self.errors.push_error(error);
    }

    /// Report a structural keyword written without its colon.
    pub(crate) fn missing_colon(&mut self, word: &str) {
        let span = self.current_span();
        self.error_with_hint(
            ErrorCode::EXPECTED_COLON,
            format!("'{word}' must be followed by a colon."),
            span,
            format!("Write '{word}:'."),
        );
    }

    /// Returns `true` if we've hit the error limit and should stop.
    pub(crate) fn too_many_errors(&self) -> bool {
        self.errors.total_errors >= MAX_ERRORS
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Skip tokens until the next line that starts a statement, the end of
    /// the enclosing block, or a structural keyword. Nested blocks opened by
    /// the broken line are skipped whole so `Indent`/`Dedent` stay balanced.
    pub(crate) fn synchronize(&mut self) {
        let mut depth = 0usize;
        while !self.at_end() {
            let at_line_start = matches!(
                self.previous_kind(),
                None | Some(TokenKind::Newline) | Some(TokenKind::Dedent)
            );
            let kind = self.peek_kind();
            if depth == 0 {
                if kind.is_structural() {
                    return;
                }
                if matches!(kind, TokenKind::Dedent) {
                    return;
                }
                if at_line_start && kind.starts_statement() {
                    return;
                }
            }
            match kind {
                TokenKind::Indent => depth += 1,
                TokenKind::Dedent => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.advance();
        }
    }

    /// Skip the rest of the current line, plus any block indented under it.
    pub(crate) fn skip_line(&mut self) {
        while !matches!(self.peek_kind(), TokenKind::Newline | TokenKind::Dedent | TokenKind::Eof) {
            self.advance();
        }
        self.eat(&TokenKind::Newline);
        if self.check_exact(&TokenKind::Indent) {
            let mut depth = 0usize;
            loop {
                match self.peek_kind() {
                    TokenKind::Indent => depth += 1,
                    TokenKind::Dedent => {
                        depth = depth.saturating_sub(1);
                        if depth == 0 {
                            self.advance();
                            return;
                        }
                    }
                    TokenKind::Eof => return,
                    _ => {}
                }
                self.advance();
            }
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token stream as a file of the given kind.
    pub fn parse(mut self, kind: FileKind) -> ParseResult {
        self.skip_trivia();
        let program = match kind {
            FileKind::Building => self.parse_building().map(Program::Building),
            FileKind::Floor => self.parse_floor().map(Program::Floor),
            FileKind::Step => self.parse_step().map(Program::Step),
        };
        if program.is_some() {
            self.skip_trivia();
            if !self.at_end() && !self.too_many_errors() {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!(
                        "Unexpected '{}' after the end of the {kind} definition.",
                        self.peek_kind()
                    ),
                );
            }
        }
        ParseResult {
            program,
            errors: self.errors,
        }
    }
}
