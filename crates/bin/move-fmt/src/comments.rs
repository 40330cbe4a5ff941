//! Assignment of source comments to the nodes they are printed with.
//!
//! Every comment token ends up in exactly one place:
//! - same-line comments after a statement or member (or the `;` closing it)
//!   are trailing comments of that item, likewise after an element of a
//!   delimited list (or the `,` following it),
//! - comments right before the `}` of a block or module body stay at the end
//!   of that body,
//! - any other comment is a leading comment of the outermost node starting
//!   at the first following token that starts a node,
//! - whatever is left is printed at the end of the file.
use std::collections::{HashMap, HashSet};

use move_syntax::green::GreenNodeId;
use move_syntax::{SyntaxKind, SyntaxNode, SyntaxTree, TokenKind};

#[derive(Debug, Default)]
pub struct CommentMap {
    leading: HashMap<GreenNodeId, Vec<usize>>,
    trailing: HashMap<GreenNodeId, Vec<usize>>,
    inner_end: HashMap<GreenNodeId, Vec<usize>>,
    end_of_file: Vec<usize>,
}

/// Containers whose significant children are printed one per line
pub fn is_sequence(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::SourceFile | SyntaxKind::ModuleBody | SyntaxKind::Block
    )
}

/// Items of a sequence container. A block label is not an item.
pub fn sequence_items<'a>(container: SyntaxNode<'a>) -> impl Iterator<Item = SyntaxNode<'a>> {
    container
        .significant_children()
        .filter(|c| c.kind() != Some(SyntaxKind::BlockIdentifier))
}

/// Containers printed as delimited, comma separated lists. A parenthesized
/// single binding prints without its list.
pub fn is_list(node: SyntaxNode<'_>) -> bool {
    use SyntaxKind::*;
    match node.kind() {
        Some(BindList) => node.significant_child_count() > 1,
        Some(kind) => matches!(
            kind,
            UseMemberList
                | TypeParameters
                | TypeArguments
                | NamedFields
                | PositionalFields
                | FunctionParameters
                | ArgList
                | ExpressionList
                | VectorExpression
                | TupleType
                | FunctionTypeParameters
                | Annotation
                | AnnotationList
                | BindNamedFields
                | BindPositionalFields
                | FieldInitializeList
                | LambdaBindings
        ),
        None => false,
    }
}

/// Raw token index of the last token of a list element, its separating `,`
/// included. `None` for a child printed ahead of the list, such as the name
/// of an annotation.
pub fn list_item_tail(item: SyntaxNode<'_>) -> Option<usize> {
    let next = item.next_sibling()?;
    match next.token_kind()? {
        TokenKind::Comma => next.token_range().map(|(_, last)| last),
        TokenKind::ParenEnd
        | TokenKind::BracketEnd
        | TokenKind::BlockEnd
        | TokenKind::Gt
        | TokenKind::Pipe => item.token_range().map(|(_, last)| last),
        _ => None,
    }
}

/// Raw token index of the last token belonging to a sequence item, its
/// terminating `;` included
pub fn item_tail(item: SyntaxNode<'_>) -> Option<usize> {
    match item.next_sibling() {
        Some(next) if next.is_token_of(TokenKind::SemiColon) => next.token_range().map(|(_, last)| last),
        _ => item.token_range().map(|(_, last)| last),
    }
}

impl CommentMap {
    pub fn build(tree: &SyntaxTree) -> Self {
        let tokens = tree.tokens();
        let preparsed = tree.preparsed();
        let mut map = CommentMap::default();

        // outermost node starting at each raw token, and the parent of each token leaf
        let mut starts: HashMap<usize, GreenNodeId> = HashMap::new();
        let mut token_parent: HashMap<usize, SyntaxNode<'_>> = HashMap::new();
        let mut claimed: HashSet<usize> = HashSet::new();
        // a node registers when its parent is visited, before its own children
        let mut stack = vec![tree.root()];
        while let Some(node) = stack.pop() {
            for child in node.children() {
                if child.is_token() {
                    if let Some((index, _)) = child.token_range() {
                        token_parent.insert(index, node);
                    }
                    continue;
                }
                if let Some((first, _)) = child.token_range() {
                    starts.entry(first).or_insert(child.id());
                }
                stack.push(child);
            }
            let tails: Vec<(SyntaxNode<'_>, Option<usize>)> = if node.kind().is_some_and(is_sequence) {
                sequence_items(node).map(|item| (item, item_tail(item))).collect()
            } else if is_list(node) {
                node.significant_children()
                    .map(|item| (item, list_item_tail(item)))
                    .collect()
            } else {
                Vec::new()
            };
            for (item, tail) in tails {
                let Some(pos) = tail.and_then(|t| preparsed.position_of(t)) else {
                    continue;
                };
                let comments = preparsed.trailing_comments(pos, tokens);
                if !comments.is_empty() {
                    claimed.extend(comments.iter().copied());
                    map.trailing.insert(item.id(), comments);
                }
            }
        }
        let mut pending: Vec<usize> = Vec::new();
        for pos in 0..preparsed.token_indices.len() {
            if pos > 0 {
                pending.extend(
                    preparsed
                        .trailing_comments(pos - 1, tokens)
                        .into_iter()
                        .filter(|c| !claimed.contains(c)),
                );
            }
            pending.extend(preparsed.leading_comments(pos, tokens));
            if pending.is_empty() {
                continue;
            }
            let index = preparsed.token_indices[pos];
            if let Some(&owner) = starts.get(&index) {
                map.leading.entry(owner).or_default().append(&mut pending);
                continue;
            }
            let closes_body = tokens[index].kind == TokenKind::BlockEnd
                && token_parent.get(&index).is_some_and(|parent| {
                    matches!(
                        parent.kind(),
                        Some(SyntaxKind::Block | SyntaxKind::ModuleBody)
                    )
                });
            if closes_body {
                if let Some(parent) = token_parent.get(&index) {
                    map.inner_end
                        .entry(parent.id())
                        .or_default()
                        .append(&mut pending);
                }
            }
        }
        if let Some(last) = preparsed.token_indices.len().checked_sub(1) {
            pending.extend(
                preparsed
                    .trailing_comments(last, tokens)
                    .into_iter()
                    .filter(|c| !claimed.contains(c)),
            );
        }
        map.end_of_file = pending;
        map
    }

    pub fn leading(&self, node: SyntaxNode<'_>) -> &[usize] {
        self.leading.get(&node.id()).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn trailing(&self, node: SyntaxNode<'_>) -> &[usize] {
        self.trailing.get(&node.id()).map(Vec::as_slice).unwrap_or_default()
    }

    /// Comments between the last item of a body and its closing brace
    pub fn inner_end(&self, node: SyntaxNode<'_>) -> &[usize] {
        self.inner_end.get(&node.id()).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn end_of_file(&self) -> &[usize] {
        &self.end_of_file
    }
}
