//! Core Steps lexer: converts source text to a token stream.
//!
//! Features:
//! - Significant indentation: exactly 4 spaces per level, `Indent`/`Dedent`
//!   tokens from an indentation stack seeded with `[0]`
//! - Multi-word keywords matched longest-first with a word-boundary check
//! - Structural keywords consume their trailing colon
//! - `note:` and `note block:` ... `end note` comments kept as tokens
//! - Fail-fast: the first lexical error stops the file

use steps_types::{Diagnostics, ErrorCode, SourceFile, Span, StepsError};

use crate::token::{
    Token, TokenKind, BARE_STRUCTURAL_PHRASES, COLON_KEYWORDS, MULTI_WORD_KEYWORDS,
};

/// Spaces per indentation level.
pub const INDENT_WIDTH: u32 = 4;

/// The text that closes a `note block:` comment.
const END_NOTE: &str = "end note";

/// The Steps lexer.
///
/// Converts source text into a vector of [`Token`]s. Lexing stops at the
/// first error; the tokens produced up to that point are kept.
pub struct Lexer<'src> {
    /// The full source text.
    source: &'src str,
    /// Source file for error reporting.
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based, in characters).
    col: u32,
    /// Known indentation widths; the bottom entry is always 0.
    indent_stack: Vec<u32>,
    /// Tokens produced so far.
    tokens: Vec<Token>,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    /// At most one lexical error.
    pub errors: Diagnostics,
}

type LexOutcome<T> = Result<T, StepsError>;

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source file.
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: &source_file.source,
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            indent_stack: vec![0],
            tokens: Vec::new(),
        }
    }

    /// Lex the entire source file into a token stream.
    pub fn lex(mut self) -> LexResult {
        let mut errors = Diagnostics::empty();
        if let Err(err) = self.scan_all() {
            errors.push_error(err);
        }

        // Ensure token stream always ends with Eof
        if self.tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let span = self.current_span();
            self.tokens.push(Token::new(TokenKind::Eof, span));
        }

        LexResult {
            tokens: self.tokens,
            errors,
        }
    }

    fn scan_all(&mut self) -> LexOutcome<()> {
        while !self.at_end() {
            self.scan_line()?;
        }

        // Close every block still open
        let span = self.current_span();
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push(TokenKind::Dedent, span);
        }
        self.push(TokenKind::Eof, span);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn rest(&self) -> &'src str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.rest().chars().nth(offset)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn advance_by(&mut self, chars: usize) {
        for _ in 0..chars {
            self.advance();
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// True at `\n`, `\r\n` or end of input.
    fn at_line_end(&self) -> bool {
        match self.peek() {
            None | Some('\n') => true,
            Some('\r') => matches!(self.peek_at(1), None | Some('\n')),
            _ => false,
        }
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(start_col),
        )
    }

    fn push(&mut self, kind: TokenKind, span: Span) {
        self.tokens.push(Token::new(kind, span));
    }

    fn error(&self, code: ErrorCode, message: impl Into<String>, span: Span, hint: &str) -> StepsError {
        StepsError::new(&self.source_file.name, code, message, span)
            .with_hint(hint)
            .with_context(self.source_file)
    }

    fn tab_error(&self) -> StepsError {
        self.error(
            ErrorCode::TAB_CHARACTER,
            "Found a tab character. Steps uses 4 spaces for indentation, not tabs.",
            self.current_span(),
            "Configure your editor to insert spaces instead of tabs.",
        )
    }

    /// Consume the line terminator (if any) and emit `Newline`.
    fn finish_line(&mut self) {
        let span = self.current_span();
        if self.peek() == Some('\r') {
            self.advance();
        }
        if self.peek() == Some('\n') {
            self.advance();
        }
        self.push(TokenKind::Newline, span);
    }

    // ─────────────────────────────────────────────────────────────
    // Lines & indentation
    // ─────────────────────────────────────────────────────────────

    /// Scan one physical line: indentation, tokens and the line terminator.
    fn scan_line(&mut self) -> LexOutcome<()> {
        let mut width = 0u32;
        while self.peek() == Some(' ') {
            self.advance();
            width += 1;
        }
        if self.peek() == Some('\t') {
            return Err(self.tab_error());
        }

        // Blank lines leave no trace
        if self.at_line_end() {
            if self.peek() == Some('\r') {
                self.advance();
            }
            self.advance();
            return Ok(());
        }

        // Comment-only lines do not touch the indentation stack
        if !self.at_comment() {
            self.apply_indentation(width)?;
        }

        while !self.at_line_end() {
            if self.scan_token()? {
                return Ok(());
            }
        }
        self.finish_line();
        Ok(())
    }

    fn at_comment(&self) -> bool {
        let rest = self.rest();
        match rest.strip_prefix("note") {
            Some(after) => {
                let after = after.trim_start_matches(' ');
                after.starts_with(':') || after.starts_with("block:")
            }
            None => false,
        }
    }

    fn apply_indentation(&mut self, width: u32) -> LexOutcome<()> {
        let line_span = Span::new(self.line, 1, self.line, width.max(1));
        if width % INDENT_WIDTH != 0 {
            return Err(self.error(
                ErrorCode::BAD_INDENTATION,
                format!(
                    "Indentation must use exactly 4 spaces per level. Found {width} spaces."
                ),
                line_span,
                "Use 4 spaces for each level of indentation.",
            ));
        }

        let top = self.indent_stack.last().copied().unwrap_or(0);
        if width > top {
            if width != top + INDENT_WIDTH {
                return Err(self.error(
                    ErrorCode::BAD_INDENTATION,
                    "Indentation increased by more than one level.",
                    line_span,
                    &format!("Expected {} spaces, found {width}.", top + INDENT_WIDTH),
                ));
            }
            self.indent_stack.push(width);
            self.push(TokenKind::Indent, Span::point(self.line, 1));
        } else if width < top {
            while self.indent_stack.last().is_some_and(|&level| width < level) {
                self.indent_stack.pop();
                self.push(TokenKind::Dedent, Span::point(self.line, 1));
            }
            if self.indent_stack.last().copied() != Some(width) {
                let levels = self
                    .indent_stack
                    .iter()
                    .map(|l| l.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(self.error(
                    ErrorCode::INCONSISTENT_DEDENT,
                    format!(
                        "This line's indentation ({width} spaces) doesn't match any previous level."
                    ),
                    line_span,
                    &format!("The current indentation levels are: {levels} spaces."),
                ));
            }
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────
    // Token scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan one token on the current line. Returns `true` when the scanner
    /// already consumed the rest of the line (note blocks).
    fn scan_token(&mut self) -> LexOutcome<bool> {
        let start_line = self.line;
        let start_col = self.col;
        let Some(ch) = self.peek() else {
            return Ok(false);
        };

        match ch {
            ' ' | '\r' => {
                self.advance();
            }
            '\t' => return Err(self.tab_error()),
            '"' => {
                let token = self.scan_text()?;
                self.tokens.push(token);
            }
            '0'..='9' => {
                let token = self.scan_number();
                self.tokens.push(token);
            }
            '-' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) && !self.after_operand() => {
                let token = self.scan_number();
                self.tokens.push(token);
            }
            c if c.is_ascii_alphabetic() || c == '_' => return self.scan_word(),
            '+' | '-' | '*' | '/' | '%' | ':' | ',' | '[' | ']' | '(' | ')' => {
                self.advance();
                let kind = match ch {
                    '+' => TokenKind::Plus,
                    '-' => TokenKind::Minus,
                    '*' => TokenKind::Star,
                    '/' => TokenKind::Slash,
                    '%' => TokenKind::Percent,
                    ':' => TokenKind::Colon,
                    ',' => TokenKind::Comma,
                    '[' => TokenKind::LBracket,
                    ']' => TokenKind::RBracket,
                    '(' => TokenKind::LParen,
                    _ => TokenKind::RParen,
                };
                let span = self.span_from(start_line, start_col);
                self.push(kind, span);
            }
            other => {
                return Err(self.error(
                    ErrorCode::INVALID_CHARACTER,
                    format!("Unexpected character '{other}'. Steps doesn't use this symbol."),
                    self.current_span(),
                    "Check for typos or unsupported characters.",
                ));
            }
        }
        Ok(false)
    }

    fn after_operand(&self) -> bool {
        self.tokens.last().is_some_and(|t| t.kind.ends_operand())
    }

    // ─────────────────────────────────────────────────────────────
    // Number literals
    // ─────────────────────────────────────────────────────────────

    fn scan_number(&mut self) -> Token {
        let start_line = self.line;
        let start_col = self.col;
        let start = self.pos;

        if self.peek() == Some('-') {
            self.advance();
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        // Check for decimal point
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // consume '.'
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let value: f64 = self.source[start..self.pos].parse().unwrap_or(0.0);
        Token::new(TokenKind::NumberLit(value), self.span_from(start_line, start_col))
    }

    // ─────────────────────────────────────────────────────────────
    // Text literals
    // ─────────────────────────────────────────────────────────────

    /// Scan a text literal starting at the opening `"`.
    fn scan_text(&mut self) -> LexOutcome<Token> {
        let start_line = self.line;
        let start_col = self.col;
        self.advance(); // opening quote
        let mut buf = String::new();

        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(self.error(
                        ErrorCode::UNTERMINATED_STRING,
                        "Text starting here was never closed.",
                        Span::point(start_line, start_col),
                        "Add a closing \" at the end of your text.",
                    ));
                }
                Some('"') => {
                    self.advance();
                    return Ok(Token::new(
                        TokenKind::TextLit(buf),
                        self.span_from(start_line, start_col),
                    ));
                }
                Some('\\') => {
                    let escape_span = self.current_span();
                    self.advance();
                    let escaped = match self.peek() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some(other) if other != '\n' => {
                            return Err(self.error(
                                ErrorCode::INVALID_CHARACTER,
                                format!("Unknown escape sequence: \\{other}"),
                                escape_span,
                                "Valid escapes are: \\n, \\t, \\\\, \\\"",
                            ));
                        }
                        // `\` right before the line end: report the unclosed text
                        _ => continue,
                    };
                    self.advance();
                    buf.push(escaped);
                }
                Some(ch) => {
                    self.advance();
                    buf.push(ch);
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Words: phrases, keywords, identifiers
    // ─────────────────────────────────────────────────────────────

    /// Whether `phrase` starts at the cursor and ends on a word boundary.
    fn matches_phrase(&self, phrase: &str) -> bool {
        let rest = self.rest();
        if !rest.starts_with(phrase) {
            return false;
        }
        let ends_in_letter = phrase.chars().last().is_some_and(|c| c.is_ascii_alphanumeric());
        let next = rest[phrase.len()..].chars().next();
        !(ends_in_letter && next.is_some_and(|c| c.is_ascii_alphanumeric() || c == '_'))
    }

    fn scan_word(&mut self) -> LexOutcome<bool> {
        let start_line = self.line;
        let start_col = self.col;

        // Multi-word keywords first, longest candidate first
        for &phrase in MULTI_WORD_KEYWORDS {
            if self.matches_phrase(phrase) {
                self.advance_by(phrase.chars().count());
                if phrase == "note block:" {
                    self.scan_note_block(start_line, start_col)?;
                    return Ok(true);
                }
                if let Some(kind) = TokenKind::from_phrase(phrase) {
                    let span = self.span_from(start_line, start_col);
                    self.push(kind, span);
                }
                return Ok(false);
            }
        }
        for &phrase in BARE_STRUCTURAL_PHRASES {
            if self.matches_phrase(phrase) {
                self.advance_by(phrase.chars().count());
                let span = self.span_from(start_line, start_col);
                self.push(TokenKind::BareStructural(phrase.to_string()), span);
                return Ok(false);
            }
        }

        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }
        let word = &self.source[start..self.pos];

        if COLON_KEYWORDS.contains(&word) {
            let spaces = self.rest().chars().take_while(|&c| c == ' ').count();
            if self.peek_at(spaces) == Some(':') {
                self.advance_by(spaces + 1);
                if word == "note" {
                    self.scan_note_line(start_line, start_col);
                    return Ok(false);
                }
                if let Some(kind) = TokenKind::from_colon_keyword(word) {
                    let span = self.span_from(start_line, start_col);
                    self.push(kind, span);
                }
                return Ok(false);
            }
            let span = self.span_from(start_line, start_col);
            self.push(TokenKind::BareStructural(word.to_string()), span);
            return Ok(false);
        }

        let kind = TokenKind::from_keyword(word)
            .unwrap_or_else(|| TokenKind::Identifier(word.to_string()));
        let span = self.span_from(start_line, start_col);
        self.push(kind, span);
        Ok(false)
    }

    // ─────────────────────────────────────────────────────────────
    // Comments
    // ─────────────────────────────────────────────────────────────

    /// `note:` consumed; the rest of the line is the comment.
    fn scan_note_line(&mut self, start_line: u32, start_col: u32) {
        let start = self.pos;
        while !self.at_line_end() {
            self.advance();
        }
        let text = self.source[start..self.pos].trim().to_string();
        let span = self.span_from(start_line, start_col);
        self.push(TokenKind::Note(text), span);
    }

    /// `note block:` consumed; collect lines until `end note`.
    fn scan_note_block(&mut self, start_line: u32, start_col: u32) -> LexOutcome<()> {
        let mut lines = Vec::new();

        let first = self.take_raw_line();
        if !first.trim().is_empty() {
            lines.push(first.trim().to_string());
        }

        loop {
            if self.at_end() {
                return Err(self.error(
                    ErrorCode::UNTERMINATED_NOTE_BLOCK,
                    "This note block was never closed.",
                    Span::point(start_line, start_col),
                    "Finish the block with a line containing 'end note'.",
                ));
            }
            let line = self.take_raw_line();
            if line.trim() == END_NOTE {
                break;
            }
            lines.push(line.trim().to_string());
        }

        let span = Span::new(start_line, start_col, self.line.saturating_sub(1).max(start_line), 1);
        self.push(TokenKind::NoteBlock(lines.join("\n")), span);
        self.push(TokenKind::Newline, span);
        Ok(())
    }

    /// Consume the rest of the current line including its terminator and
    /// return its text without the terminator.
    fn take_raw_line(&mut self) -> &'src str {
        let start = self.pos;
        while !self.at_line_end() {
            self.advance();
        }
        let text = &self.source[start..self.pos];
        if self.peek() == Some('\r') {
            self.advance();
        }
        if self.peek() == Some('\n') {
            self.advance();
        }
        text
    }
}

/// Tokenize one source file.
pub fn tokenize(source: &SourceFile) -> LexResult {
    Lexer::new(source).lex()
}
