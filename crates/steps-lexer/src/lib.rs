//! Steps lexer: converts source text into a token stream.

pub mod lexer;
pub mod token;

pub use lexer::{tokenize, LexResult, Lexer, INDENT_WIDTH};
pub use token::{Token, TokenKind, ALL_KEYWORDS, MULTI_WORD_KEYWORDS};
