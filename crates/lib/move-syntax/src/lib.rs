//! Lossless parser for Move source files.
//!
//! The pipeline is tokenize -> preparse -> parse_cst, the result is a
//! [`SyntaxTree`] that keeps every token of the input (trivia included) and
//! can be walked with [`SyntaxNode`] cursors.

pub mod cst_parser;
pub mod error;
pub mod green;
pub mod preparser;
pub mod token;
pub mod tokenizer;
pub mod tree;

pub use error::{ErrorDetail, ParserError, ReportableError};
pub use green::SyntaxKind;
pub use token::{Token, TokenKind};
pub use tree::{SyntaxNode, SyntaxTree};

/// Parse a whole source file. The tree is always produced; it must not be
/// trusted when the error list is non-empty.
pub fn parse_source(source: &str) -> (SyntaxTree, Vec<ParserError>) {
    let tokens = tokenizer::tokenize(source);
    let preparsed = preparser::preparse(&tokens);
    let (root, arena, errors) = cst_parser::parse_cst(source, &tokens, &preparsed);
    log::debug!(
        "parsed {} tokens into {} nodes ({} errors)",
        tokens.len(),
        arena.len(),
        errors.len()
    );
    (
        SyntaxTree::new(source, tokens, preparsed, arena, root),
        errors,
    )
}
