//! Carv parser: converts a token stream into an AST.

mod parse_decl;
mod parse_expr;
mod parse_stmt;
mod parse_type;
mod parser;

pub use parser::{ParseResult, Parser, MAX_NESTING_DEPTH};

use carv_lexer::Lexer;
use carv_types::{CompileErrors, SourceFile};

/// Lex and parse a source file in one step.
///
/// Lexer and parser errors are merged; the program contains every
/// statement that parsed.
pub fn parse_source(source_file: &SourceFile) -> ParseResult {
    let lexed = Lexer::new(source_file).lex();
    let mut parsed = Parser::new(lexed.tokens, source_file).parse();
    let mut errors = CompileErrors::empty();
    errors.extend(lexed.errors);
    errors.extend(parsed.errors);
    parsed.errors = errors;
    parsed
}
