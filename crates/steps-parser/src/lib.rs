//! Steps parser: converts a token stream into an AST.

mod parse_decl;
mod parse_expr;
mod parse_stmt;
mod parser;
pub mod pretty;

pub use parser::{ParseResult, Parser};
pub use pretty::print_program;

use steps_lexer::Token;
use steps_types::ast::FileKind;
use steps_types::SourceFile;

/// Parse a token stream as a file of the given kind.
pub fn parse(tokens: Vec<Token>, source: &SourceFile, kind: FileKind) -> ParseResult {
    Parser::new(tokens, source).parse(kind)
}

/// Lex and parse source text in one go.
///
/// A lexical error stops the pipeline: the result then carries that single
/// error and no program.
pub fn parse_source(source: &SourceFile, kind: FileKind) -> ParseResult {
    let lexed = steps_lexer::tokenize(source);
    if lexed.errors.has_errors() {
        return ParseResult {
            program: None,
            errors: lexed.errors,
        };
    }
    parse(lexed.tokens, source, kind)
}
