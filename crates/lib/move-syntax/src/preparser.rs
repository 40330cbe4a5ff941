/// Pre-parser for handling trivia (comments, whitespace, linebreaks)
/// Converts token sequence into index sequence with trivia maps
use crate::token::{Token, TokenKind};
use std::collections::HashMap;

/// Pre-parsed result with non-trivia token indices and trivia maps.
/// Positions (the keys of the maps) index into `token_indices`, the values
/// index into the original token array.
#[derive(Debug, Default)]
pub struct PreParsedTokens {
    /// Indices into the original token array for non-trivia tokens, `Eof` included
    pub token_indices: Vec<usize>,
    /// Map from position -> leading trivia token indices
    pub leading_trivia_map: HashMap<usize, Vec<usize>>,
    /// Map from position -> trailing trivia token indices
    pub trailing_trivia_map: HashMap<usize, Vec<usize>>,
}

impl PreParsedTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the non-trivia token at the given position
    pub fn get_token<'a>(&self, pos: usize, tokens: &'a [Token]) -> Option<&'a Token> {
        self.token_indices.get(pos).and_then(|&i| tokens.get(i))
    }

    /// Position of a raw token index in the non-trivia view
    pub fn position_of(&self, token_index: usize) -> Option<usize> {
        self.token_indices.binary_search(&token_index).ok()
    }

    /// Get leading trivia for a token
    pub fn get_leading_trivia<'a>(&self, pos: usize, tokens: &'a [Token]) -> Vec<&'a Token> {
        Self::collect(self.leading_trivia_map.get(&pos), tokens)
    }

    /// Get trailing trivia for a token
    pub fn get_trailing_trivia<'a>(&self, pos: usize, tokens: &'a [Token]) -> Vec<&'a Token> {
        Self::collect(self.trailing_trivia_map.get(&pos), tokens)
    }

    /// Comment token indices on the same line after the token at `pos`
    pub fn trailing_comments(&self, pos: usize, tokens: &[Token]) -> Vec<usize> {
        Self::comments_in(self.trailing_trivia_map.get(&pos), tokens)
    }

    /// Comment token indices on their own lines before the token at `pos`
    pub fn leading_comments(&self, pos: usize, tokens: &[Token]) -> Vec<usize> {
        Self::comments_in(self.leading_trivia_map.get(&pos), tokens)
    }

    fn collect<'a>(indices: Option<&Vec<usize>>, tokens: &'a [Token]) -> Vec<&'a Token> {
        indices
            .map(|indices| indices.iter().filter_map(|&i| tokens.get(i)).collect())
            .unwrap_or_default()
    }

    fn comments_in(indices: Option<&Vec<usize>>, tokens: &[Token]) -> Vec<usize> {
        indices
            .map(|indices| {
                indices
                    .iter()
                    .copied()
                    .filter(|&i| tokens.get(i).is_some_and(Token::is_comment))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Pre-parse tokens to separate trivia from syntax tokens
///
/// The strategy is:
/// - Whitespace and comments following a syntax token on the same line are
///   trailing trivia of that token
/// - Everything after the first linebreak is leading trivia of the next
///   syntax token
/// - Trivia before the very first syntax token is leading trivia of it
pub fn preparse(tokens: &[Token]) -> PreParsedTokens {
    let mut result = PreParsedTokens::new();
    let mut pending_trivia = Vec::new();
    let mut seen_linebreak = false;
    let mut last_pos: Option<usize> = None;

    for (i, token) in tokens.iter().enumerate() {
        if token.is_trivia() {
            if token.kind == TokenKind::LineBreak && !seen_linebreak {
                if let Some(last) = last_pos {
                    result
                        .trailing_trivia_map
                        .entry(last)
                        .or_default()
                        .append(&mut pending_trivia);
                }
                seen_linebreak = true;
            }
            pending_trivia.push(i);
            continue;
        }
        let pos = result.token_indices.len();
        if !pending_trivia.is_empty() {
            match last_pos {
                Some(last) if !seen_linebreak => {
                    result
                        .trailing_trivia_map
                        .entry(last)
                        .or_default()
                        .append(&mut pending_trivia);
                }
                _ => {
                    result
                        .leading_trivia_map
                        .entry(pos)
                        .or_default()
                        .append(&mut pending_trivia);
                }
            }
        }
        result.token_indices.push(i);
        last_pos = Some(pos);
        seen_linebreak = false;
    }

    // a stream without a trailing Eof keeps its dangling trivia as trailing
    if let Some(last) = last_pos.filter(|_| !pending_trivia.is_empty()) {
        result
            .trailing_trivia_map
            .entry(last)
            .or_default()
            .append(&mut pending_trivia);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    #[test]
    fn test_preparse_simple() {
        let source = "fun f() { 42 }";
        let tokens = tokenize(source);
        let preparsed = preparse(&tokens);

        // fun, f, (, ), {, 42, }, eof
        assert_eq!(preparsed.token_indices.len(), 8);
        assert_eq!(
            preparsed.get_token(1, &tokens).map(|t| t.text(source)),
            Some("f")
        );
    }

    #[test]
    fn test_trailing_and_leading_comments() {
        let source = "a; // trailing\n// leading\nb";
        let tokens = tokenize(source);
        let preparsed = preparse(&tokens);

        // a, ;, b, eof
        let trailing = preparsed.trailing_comments(1, &tokens);
        assert_eq!(trailing.len(), 1);
        assert_eq!(tokens[trailing[0]].text(source), "// trailing");

        let leading = preparsed.leading_comments(2, &tokens);
        assert_eq!(leading.len(), 1);
        assert_eq!(tokens[leading[0]].text(source), "// leading");
    }

    #[test]
    fn test_comments_before_first_token_are_leading() {
        let source = "// header\nmodule";
        let tokens = tokenize(source);
        let preparsed = preparse(&tokens);
        assert_eq!(preparsed.leading_comments(0, &tokens).len(), 1);
    }

    #[test]
    fn test_comment_at_end_of_file_leads_eof() {
        let source = "a\n// tail\n";
        let tokens = tokenize(source);
        let preparsed = preparse(&tokens);
        let eof_pos = preparsed.token_indices.len() - 1;
        assert_eq!(
            preparsed.get_token(eof_pos, &tokens).map(|t| t.kind),
            Some(TokenKind::Eof)
        );
        assert_eq!(preparsed.leading_comments(eof_pos, &tokens).len(), 1);
    }

    #[test]
    fn test_position_of() {
        let source = "a  b";
        let tokens = tokenize(source);
        let preparsed = preparse(&tokens);
        assert_eq!(preparsed.position_of(0), Some(0));
        assert_eq!(preparsed.position_of(1), None);
        assert_eq!(preparsed.position_of(2), Some(1));
    }
}
