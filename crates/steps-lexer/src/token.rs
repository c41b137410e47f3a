//! Token types for the Steps lexer.
//!
//! Defines [`TokenKind`] covering every lexeme in Steps and [`Token`],
//! which pairs a kind with a source [`Span`].

use steps_types::Span;
use std::fmt;

/// Every reserved single word in Steps.
///
/// These cannot be used as user-defined names. The lexer recognises each
/// one and emits a specific keyword token instead of [`TokenKind::Identifier`].
pub const ALL_KEYWORDS: &[&str] = &[
    // Structural (take a trailing colon)
    "building", "floor", "step", "riser", "expects", "returns", "declare", "do",
    "attempt", "note",
    // Control flow
    "if", "otherwise", "repeat", "times", "in", "while", "exit", "return",
    // Statements
    "display", "set", "to", "call", "with", "add", "remove", "from", "as", "fixed",
    "input",
    // Operators
    "equals", "contains", "of", "and", "or", "not", "modulo",
    // Literals
    "true", "false", "nothing",
    // Type names
    "number", "text", "boolean", "list", "table",
];

/// Multi-word keywords, longest first.
///
/// Several phrases are prefixes of longer ones (`is greater than` /
/// `is greater than or equal to`), so the lexer must try them in this order.
pub const MULTI_WORD_KEYWORDS: &[&str] = &[
    "is greater than or equal to",
    "is less than or equal to",
    "storing result in",
    "if unsuccessful:",
    "is not equal to",
    "is greater than",
    "then continue:",
    "is less than",
    "is a boolean",
    "character at",
    "otherwise if",
    "is a number",
    "is equal to",
    "note block:",
    "belongs to:",
    "starts with",
    "is a table",
    "is a list",
    "is a text",
    "ends with",
    "length of",
    "for each",
    "added to",
    "split by",
    "type of",
    "is in",
];

/// Single words that open a structural section and must be followed by `:`.
pub const COLON_KEYWORDS: &[&str] = &[
    "building", "floor", "step", "riser", "expects", "returns", "declare", "do",
    "attempt", "note",
];

/// Multi-word structural phrases recognised without their colon so the
/// parser can report the missing `:` precisely.
pub const BARE_STRUCTURAL_PHRASES: &[&str] = &[
    "if unsuccessful",
    "then continue",
    "note block",
    "belongs to",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

/// A single token produced by the Steps lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What kind of token this is.
    pub kind: TokenKind,
    /// Source location.
    pub span: Span,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns `true` if this token is a reserved keyword.
    pub fn is_keyword(&self) -> bool {
        self.kind.is_keyword()
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

/// Every token kind in the Steps language.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────

    /// Numeric literal (integer or decimal): `42`, `-3.14`
    NumberLit(f64),
    /// Text literal with escapes resolved: `"hello"`
    TextLit(String),
    /// `true`
    True,
    /// `false`
    False,
    /// `nothing`
    Nothing,

    // ── Identifiers ──────────────────────────────────────────

    /// User-defined identifier: `total`, `add_item`
    Identifier(String),

    // ── Structural Keywords (colon consumed) ─────────────────

    /// `building:`
    Building,
    /// `floor:`
    Floor,
    /// `step:`
    Step,
    /// `riser:`
    Riser,
    /// `belongs to:`
    BelongsTo,
    /// `expects:`
    Expects,
    /// `returns:`
    Returns,
    /// `declare:`
    Declare,
    /// `do:`
    Do,
    /// `attempt:`
    Attempt,
    /// `if unsuccessful:`
    IfUnsuccessful,
    /// `then continue:`
    ThenContinue,
    /// A structural keyword written without its colon (`do`, `belongs to`).
    BareStructural(String),

    // ── Comments ─────────────────────────────────────────────

    /// `note: ...`, carrying the trimmed rest of the line.
    Note(String),
    /// `note block:` ... `end note`, carrying the enclosed lines.
    NoteBlock(String),

    // ── Control Flow ─────────────────────────────────────────

    /// `if`
    If,
    /// `otherwise if`
    OtherwiseIf,
    /// `otherwise`
    Otherwise,
    /// `repeat`
    Repeat,
    /// `times`
    Times,
    /// `for each`
    ForEach,
    /// `in`
    In,
    /// `while`
    While,
    /// `exit`
    Exit,
    /// `return`
    Return,

    // ── Statement Keywords ───────────────────────────────────

    Display,
    Set,
    To,
    Call,
    With,
    /// `storing result in`
    StoringResultIn,
    Add,
    Remove,
    From,
    As,
    Fixed,
    Input,

    // ── Multi-word Operators ─────────────────────────────────

    IsEqualTo,
    IsNotEqualTo,
    IsLessThan,
    IsGreaterThan,
    IsLessThanOrEqualTo,
    IsGreaterThanOrEqualTo,
    IsIn,
    AddedTo,
    SplitBy,
    CharacterAt,
    LengthOf,
    StartsWith,
    EndsWith,
    TypeOf,
    IsANumber,
    IsAText,
    IsABoolean,
    IsAList,
    IsATable,

    // ── Single-word Operators ────────────────────────────────

    Equals,
    Contains,
    Of,
    And,
    Or,
    Not,
    Modulo,

    // ── Type-Name Keywords ───────────────────────────────────

    KwNumber,
    KwText,
    KwBoolean,
    KwList,
    KwTable,

    // ── Symbols ──────────────────────────────────────────────

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Colon,
    Comma,
    LBracket,
    RBracket,
    LParen,
    RParen,

    // ── Layout ───────────────────────────────────────────────

    /// Indentation grew by one level (BLOCK-OPEN).
    Indent,
    /// Indentation shrank by one level (BLOCK-CLOSE).
    Dedent,
    /// End of a logical line (LINE-END).
    Newline,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Map a single reserved word to its token. Structural words are not
    /// included: they only become keywords together with their colon.
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        Some(match s {
            "if" => TokenKind::If,
            "otherwise" => TokenKind::Otherwise,
            "repeat" => TokenKind::Repeat,
            "times" => TokenKind::Times,
            "in" => TokenKind::In,
            "while" => TokenKind::While,
            "exit" => TokenKind::Exit,
            "return" => TokenKind::Return,
            "display" => TokenKind::Display,
            "set" => TokenKind::Set,
            "to" => TokenKind::To,
            "call" => TokenKind::Call,
            "with" => TokenKind::With,
            "add" => TokenKind::Add,
            "remove" => TokenKind::Remove,
            "from" => TokenKind::From,
            "as" => TokenKind::As,
            "fixed" => TokenKind::Fixed,
            "input" => TokenKind::Input,
            "equals" => TokenKind::Equals,
            "contains" => TokenKind::Contains,
            "of" => TokenKind::Of,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "modulo" => TokenKind::Modulo,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "nothing" => TokenKind::Nothing,
            "number" => TokenKind::KwNumber,
            "text" => TokenKind::KwText,
            "boolean" => TokenKind::KwBoolean,
            "list" => TokenKind::KwList,
            "table" => TokenKind::KwTable,
            _ => return None,
        })
    }

    /// Map a structural word (already followed by `:`) to its token.
    pub fn from_colon_keyword(s: &str) -> Option<TokenKind> {
        Some(match s {
            "building" => TokenKind::Building,
            "floor" => TokenKind::Floor,
            "step" => TokenKind::Step,
            "riser" => TokenKind::Riser,
            "expects" => TokenKind::Expects,
            "returns" => TokenKind::Returns,
            "declare" => TokenKind::Declare,
            "do" => TokenKind::Do,
            "attempt" => TokenKind::Attempt,
            _ => return None,
        })
    }

    /// Map a multi-word phrase from [`MULTI_WORD_KEYWORDS`] to its token.
    /// `note block:` is handled by the lexer itself.
    pub fn from_phrase(s: &str) -> Option<TokenKind> {
        Some(match s {
            "is greater than or equal to" => TokenKind::IsGreaterThanOrEqualTo,
            "is less than or equal to" => TokenKind::IsLessThanOrEqualTo,
            "storing result in" => TokenKind::StoringResultIn,
            "if unsuccessful:" => TokenKind::IfUnsuccessful,
            "is not equal to" => TokenKind::IsNotEqualTo,
            "then continue:" => TokenKind::ThenContinue,
            "is greater than" => TokenKind::IsGreaterThan,
            "is less than" => TokenKind::IsLessThan,
            "is a boolean" => TokenKind::IsABoolean,
            "is a number" => TokenKind::IsANumber,
            "is a table" => TokenKind::IsATable,
            "is a list" => TokenKind::IsAList,
            "is a text" => TokenKind::IsAText,
            "is equal to" => TokenKind::IsEqualTo,
            "character at" => TokenKind::CharacterAt,
            "otherwise if" => TokenKind::OtherwiseIf,
            "belongs to:" => TokenKind::BelongsTo,
            "starts with" => TokenKind::StartsWith,
            "ends with" => TokenKind::EndsWith,
            "length of" => TokenKind::LengthOf,
            "type of" => TokenKind::TypeOf,
            "for each" => TokenKind::ForEach,
            "added to" => TokenKind::AddedTo,
            "split by" => TokenKind::SplitBy,
            "is in" => TokenKind::IsIn,
            _ => return None,
        })
    }

    /// Whether this token can be the last token of an operand. A `-`
    /// directly followed by a digit after such a token is subtraction,
    /// otherwise it starts a negative number literal.
    pub fn ends_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::NumberLit(_)
                | TokenKind::TextLit(_)
                | TokenKind::Identifier(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Nothing
                | TokenKind::Input
                | TokenKind::RBracket
                | TokenKind::RParen
        )
    }

    /// Whether this token opens a statement (used for parser recovery).
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Display
                | TokenKind::Set
                | TokenKind::Call
                | TokenKind::Return
                | TokenKind::Exit
                | TokenKind::If
                | TokenKind::Repeat
                | TokenKind::Attempt
                | TokenKind::Add
                | TokenKind::Remove
                | TokenKind::Note(_)
                | TokenKind::NoteBlock(_)
        )
    }

    /// Whether this token opens a file or step section.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            TokenKind::Building
                | TokenKind::Floor
                | TokenKind::Step
                | TokenKind::Riser
                | TokenKind::BelongsTo
                | TokenKind::Expects
                | TokenKind::Returns
                | TokenKind::Declare
                | TokenKind::Do
        )
    }

    pub fn is_keyword(&self) -> bool {
        !matches!(
            self,
            TokenKind::NumberLit(_)
                | TokenKind::TextLit(_)
                | TokenKind::Identifier(_)
                | TokenKind::Note(_)
                | TokenKind::NoteBlock(_)
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::Slash
                | TokenKind::Percent
                | TokenKind::Colon
                | TokenKind::Comma
                | TokenKind::LBracket
                | TokenKind::RBracket
                | TokenKind::LParen
                | TokenKind::RParen
                | TokenKind::Indent
                | TokenKind::Dedent
                | TokenKind::Newline
                | TokenKind::Eof
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Literals
            TokenKind::NumberLit(n) => write!(f, "{n}"),
            TokenKind::TextLit(s) => write!(f, "\"{s}\""),
            TokenKind::True => f.write_str("true"),
            TokenKind::False => f.write_str("false"),
            TokenKind::Nothing => f.write_str("nothing"),
            TokenKind::Identifier(s) => f.write_str(s),
            // Structural
            TokenKind::Building => f.write_str("building:"),
            TokenKind::Floor => f.write_str("floor:"),
            TokenKind::Step => f.write_str("step:"),
            TokenKind::Riser => f.write_str("riser:"),
            TokenKind::BelongsTo => f.write_str("belongs to:"),
            TokenKind::Expects => f.write_str("expects:"),
            TokenKind::Returns => f.write_str("returns:"),
            TokenKind::Declare => f.write_str("declare:"),
            TokenKind::Do => f.write_str("do:"),
            TokenKind::Attempt => f.write_str("attempt:"),
            TokenKind::IfUnsuccessful => f.write_str("if unsuccessful:"),
            TokenKind::ThenContinue => f.write_str("then continue:"),
            TokenKind::BareStructural(word) => f.write_str(word),
            // Comments
            TokenKind::Note(_) => f.write_str("note:"),
            TokenKind::NoteBlock(_) => f.write_str("note block:"),
            // Control flow
            TokenKind::If => f.write_str("if"),
            TokenKind::OtherwiseIf => f.write_str("otherwise if"),
            TokenKind::Otherwise => f.write_str("otherwise"),
            TokenKind::Repeat => f.write_str("repeat"),
            TokenKind::Times => f.write_str("times"),
            TokenKind::ForEach => f.write_str("for each"),
            TokenKind::In => f.write_str("in"),
            TokenKind::While => f.write_str("while"),
            TokenKind::Exit => f.write_str("exit"),
            TokenKind::Return => f.write_str("return"),
            // Statements
            TokenKind::Display => f.write_str("display"),
            TokenKind::Set => f.write_str("set"),
            TokenKind::To => f.write_str("to"),
            TokenKind::Call => f.write_str("call"),
            TokenKind::With => f.write_str("with"),
            TokenKind::StoringResultIn => f.write_str("storing result in"),
            TokenKind::Add => f.write_str("add"),
            TokenKind::Remove => f.write_str("remove"),
            TokenKind::From => f.write_str("from"),
            TokenKind::As => f.write_str("as"),
            TokenKind::Fixed => f.write_str("fixed"),
            TokenKind::Input => f.write_str("input"),
            // Multi-word operators
            TokenKind::IsEqualTo => f.write_str("is equal to"),
            TokenKind::IsNotEqualTo => f.write_str("is not equal to"),
            TokenKind::IsLessThan => f.write_str("is less than"),
            TokenKind::IsGreaterThan => f.write_str("is greater than"),
            TokenKind::IsLessThanOrEqualTo => f.write_str("is less than or equal to"),
            TokenKind::IsGreaterThanOrEqualTo => f.write_str("is greater than or equal to"),
            TokenKind::IsIn => f.write_str("is in"),
            TokenKind::AddedTo => f.write_str("added to"),
            TokenKind::SplitBy => f.write_str("split by"),
            TokenKind::CharacterAt => f.write_str("character at"),
            TokenKind::LengthOf => f.write_str("length of"),
            TokenKind::StartsWith => f.write_str("starts with"),
            TokenKind::EndsWith => f.write_str("ends with"),
            TokenKind::TypeOf => f.write_str("type of"),
            TokenKind::IsANumber => f.write_str("is a number"),
            TokenKind::IsAText => f.write_str("is a text"),
            TokenKind::IsABoolean => f.write_str("is a boolean"),
            TokenKind::IsAList => f.write_str("is a list"),
            TokenKind::IsATable => f.write_str("is a table"),
            // Single-word operators
            TokenKind::Equals => f.write_str("equals"),
            TokenKind::Contains => f.write_str("contains"),
            TokenKind::Of => f.write_str("of"),
            TokenKind::And => f.write_str("and"),
            TokenKind::Or => f.write_str("or"),
            TokenKind::Not => f.write_str("not"),
            TokenKind::Modulo => f.write_str("modulo"),
            // Types
            TokenKind::KwNumber => f.write_str("number"),
            TokenKind::KwText => f.write_str("text"),
            TokenKind::KwBoolean => f.write_str("boolean"),
            TokenKind::KwList => f.write_str("list"),
            TokenKind::KwTable => f.write_str("table"),
            // Symbols
            TokenKind::Plus => f.write_str("+"),
            TokenKind::Minus => f.write_str("-"),
            TokenKind::Star => f.write_str("*"),
            TokenKind::Slash => f.write_str("/"),
            TokenKind::Percent => f.write_str("%"),
            TokenKind::Colon => f.write_str(":"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::LBracket => f.write_str("["),
            TokenKind::RBracket => f.write_str("]"),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            // Layout
            TokenKind::Indent => f.write_str("indent"),
            TokenKind::Dedent => f.write_str("dedent"),
            TokenKind::Newline => f.write_str("newline"),
            TokenKind::Eof => f.write_str("end of file"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_keyword_recognises_all_plain_words() {
        for &kw in ALL_KEYWORDS {
            if COLON_KEYWORDS.contains(&kw) {
                assert!(
                    TokenKind::from_keyword(kw).is_none(),
                    "'{kw}' only becomes a keyword with its colon"
                );
            } else {
                assert!(
                    TokenKind::from_keyword(kw).is_some(),
                    "from_keyword should recognise '{kw}'"
                );
            }
        }
    }

    #[test]
    fn test_colon_keywords_map() {
        for &kw in COLON_KEYWORDS {
            if kw == "note" {
                continue;
            }
            assert!(TokenKind::from_colon_keyword(kw).is_some(), "missing '{kw}'");
        }
    }

    #[test]
    fn test_multi_word_sorted_longest_first() {
        for pair in MULTI_WORD_KEYWORDS.windows(2) {
            assert!(
                pair[0].len() >= pair[1].len(),
                "'{}' must come before '{}'",
                pair[1],
                pair[0]
            );
        }
    }

    #[test]
    fn test_every_phrase_maps_to_a_token() {
        for &phrase in MULTI_WORD_KEYWORDS {
            if phrase == "note block:" {
                continue;
            }
            assert!(TokenKind::from_phrase(phrase).is_some(), "missing '{phrase}'");
        }
    }

    #[test]
    fn test_phrase_display_round_trips() {
        for &phrase in MULTI_WORD_KEYWORDS {
            if let Some(kind) = TokenKind::from_phrase(phrase) {
                assert_eq!(kind.to_string(), phrase);
            }
        }
    }

    #[test]
    fn test_identifiers_are_not_keywords() {
        assert_eq!(TokenKind::from_keyword("total"), None);
        assert_eq!(TokenKind::from_keyword("Display"), None);
        assert!(!TokenKind::Identifier("x".into()).is_keyword());
        assert!(TokenKind::IsIn.is_keyword());
    }

    #[test]
    fn test_ends_operand() {
        assert!(TokenKind::Identifier("x".into()).ends_operand());
        assert!(TokenKind::RParen.ends_operand());
        assert!(!TokenKind::Display.ends_operand());
        assert!(!TokenKind::Minus.ends_operand());
    }
}
