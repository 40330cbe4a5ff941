/// Navigable view over a green tree.
///
/// `SyntaxTree` owns everything produced by parsing one file. Parent links
/// and positions inside the parent are kept in side tables so that sibling
/// lookup is O(1) while the children vectors stay the only owners of nodes.
use std::collections::HashMap;

use crate::green::{GreenNode, GreenNodeArena, GreenNodeId, SyntaxKind};
use crate::preparser::PreParsedTokens;
use crate::token::{Token, TokenKind};

#[derive(Debug)]
pub struct SyntaxTree {
    source: String,
    tokens: Vec<Token>,
    preparsed: PreParsedTokens,
    arena: GreenNodeArena,
    root: GreenNodeId,
    /// child -> (parent, index in parent's children)
    parents: HashMap<GreenNodeId, (GreenNodeId, usize)>,
    /// byte offset of the start of every line
    line_starts: Vec<usize>,
}

impl SyntaxTree {
    pub fn new(
        source: impl Into<String>,
        tokens: Vec<Token>,
        preparsed: PreParsedTokens,
        arena: GreenNodeArena,
        root: GreenNodeId,
    ) -> Self {
        let source = source.into();
        let mut parents = HashMap::with_capacity(arena.len());
        for (id, node) in arena.iter() {
            if let GreenNode::Internal { children, .. } = node {
                for (index, &child) in children.iter().enumerate() {
                    parents.insert(child, (id, index));
                }
            }
        }
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            tokens,
            preparsed,
            arena,
            root,
            parents,
            line_starts,
        }
    }

    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            tree: self,
            id: self.root,
        }
    }

    pub fn node(&self, id: GreenNodeId) -> SyntaxNode<'_> {
        SyntaxNode { tree: self, id }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn preparsed(&self) -> &PreParsedTokens {
        &self.preparsed
    }

    pub fn arena(&self) -> &GreenNodeArena {
        &self.arena
    }

    /// Zero-based line number of a byte offset
    pub fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        }
    }

    /// Render the tree as an indented outline, one node per line
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.root().dump_into(0, &mut out);
        out
    }
}

/// A cheap, copyable cursor into a `SyntaxTree`
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    tree: &'t SyntaxTree,
    id: GreenNodeId,
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for SyntaxNode<'_> {}

impl std::fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind() {
            Some(kind) => write!(f, "{kind}@{}", self.start_offset()),
            None => write!(f, "{:?}", self.text()),
        }
    }
}

impl<'t> SyntaxNode<'t> {
    pub fn id(&self) -> GreenNodeId {
        self.id
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    fn green(&self) -> &'t GreenNode {
        self.tree.arena.get(self.id)
    }

    /// Kind of an internal node, `None` for a token leaf
    pub fn kind(&self) -> Option<SyntaxKind> {
        self.green().kind()
    }

    pub fn is_token(&self) -> bool {
        matches!(self.green(), GreenNode::Token { .. })
    }

    /// Kind of the token for a token leaf
    pub fn token_kind(&self) -> Option<TokenKind> {
        match self.green() {
            GreenNode::Token { token_index } => Some(self.tree.tokens[*token_index].kind),
            GreenNode::Internal { .. } => None,
        }
    }

    /// Whether this is a token leaf of the given kind
    pub fn is_token_of(&self, kind: TokenKind) -> bool {
        self.token_kind() == Some(kind)
    }

    pub fn first_token(&self) -> Option<&'t Token> {
        let (first, _) = self.green().token_range()?;
        self.tree.tokens.get(first)
    }

    pub fn last_token(&self) -> Option<&'t Token> {
        let (_, last) = self.green().token_range()?;
        self.tree.tokens.get(last)
    }

    /// Raw token index range covered by this node
    pub fn token_range(&self) -> Option<(usize, usize)> {
        self.green().token_range()
    }

    pub fn start_offset(&self) -> usize {
        self.first_token().map(|t| t.start).unwrap_or(0)
    }

    pub fn end_offset(&self) -> usize {
        self.last_token().map(Token::end).unwrap_or(0)
    }

    pub fn start_line(&self) -> usize {
        self.tree.line_of(self.start_offset())
    }

    pub fn end_line(&self) -> usize {
        self.tree.line_of(self.end_offset().saturating_sub(1).max(self.start_offset()))
    }

    /// Raw source text spanned by this node, trivia inside included
    pub fn text(&self) -> &'t str {
        &self.tree.source[self.start_offset()..self.end_offset()]
    }

    /// Concatenated text of the tokens under this node, trivia dropped
    pub fn token_text(&self) -> String {
        match self.token_range() {
            Some((first, last)) => self.tree.tokens[first..=last]
                .iter()
                .filter(|t| !t.is_trivia())
                .map(|t| t.text(&self.tree.source))
                .collect(),
            None => String::new(),
        }
    }

    /// All children, tokens included, in source order
    pub fn children(&self) -> impl DoubleEndedIterator<Item = SyntaxNode<'t>> + use<'t> {
        let tree = self.tree;
        self.green()
            .children()
            .unwrap_or_default()
            .iter()
            .map(move |&id| SyntaxNode { tree, id })
    }

    pub fn child(&self, index: usize) -> Option<SyntaxNode<'t>> {
        let id = *self.green().children()?.get(index)?;
        Some(SyntaxNode {
            tree: self.tree,
            id,
        })
    }

    /// Formatting-significant children: the internal nodes. Raw tokens are
    /// only reachable as siblings.
    pub fn significant_children(&self) -> impl DoubleEndedIterator<Item = SyntaxNode<'t>> + use<'t> {
        self.children().filter(|c| !c.is_token())
    }

    pub fn significant_child_count(&self) -> usize {
        self.significant_children().count()
    }

    /// First token child of the given kind
    pub fn find_token(&self, kind: TokenKind) -> Option<SyntaxNode<'t>> {
        self.children().find(|c| c.is_token_of(kind))
    }

    pub fn parent(&self) -> Option<SyntaxNode<'t>> {
        let &(parent, _) = self.tree.parents.get(&self.id)?;
        Some(SyntaxNode {
            tree: self.tree,
            id: parent,
        })
    }

    pub fn prev_sibling(&self) -> Option<SyntaxNode<'t>> {
        let &(parent, index) = self.tree.parents.get(&self.id)?;
        let prev = index.checked_sub(1)?;
        self.tree.node(parent).child(prev)
    }

    pub fn next_sibling(&self) -> Option<SyntaxNode<'t>> {
        let &(parent, index) = self.tree.parents.get(&self.id)?;
        self.tree.node(parent).child(index + 1)
    }

    /// First node of the given kind in this subtree, depth first, self included
    pub fn find_descendant(&self, kind: SyntaxKind) -> Option<SyntaxNode<'t>> {
        if self.kind() == Some(kind) {
            return Some(*self);
        }
        self.significant_children()
            .find_map(|child| child.find_descendant(kind))
    }

    fn dump_into(&self, depth: usize, out: &mut String) {
        let pad = "  ".repeat(depth);
        match self.kind() {
            Some(kind) => {
                out.push_str(&format!("{pad}{kind}\n"));
                for child in self.children() {
                    child.dump_into(depth + 1, out);
                }
            }
            None => out.push_str(&format!("{pad}{:?}\n", self.text())),
        }
    }
}
