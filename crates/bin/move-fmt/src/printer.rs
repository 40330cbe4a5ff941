//! Dispatch from syntax kinds to print procedures.
use move_syntax::{SyntaxKind, SyntaxNode, SyntaxTree, TokenKind};
use thiserror::Error;

use crate::comments::CommentMap;
use crate::doc::{Doc, concat, hardline, text};
use crate::{common, items};

/// A print procedure turns one node into a document
pub type PrintFn = for<'a> fn(&Printer<'a>, SyntaxNode<'a>) -> Result<Doc, PrintError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrintError {
    #[error("no print procedure for `{kind}` at byte {offset}")]
    NoPrinter { kind: String, offset: usize },
    #[error("malformed `{kind}` at byte {offset}: {message}")]
    Precondition {
        kind: String,
        offset: usize,
        message: String,
    },
}

impl PrintError {
    pub fn malformed(node: SyntaxNode<'_>, message: impl Into<String>) -> Self {
        PrintError::Precondition {
            kind: describe(node),
            offset: node.start_offset(),
            message: message.into(),
        }
    }

    pub fn offset(&self) -> usize {
        match self {
            PrintError::NoPrinter { offset, .. } | PrintError::Precondition { offset, .. } => {
                *offset
            }
        }
    }
}

fn describe(node: SyntaxNode<'_>) -> String {
    match (node.kind(), node.token_kind()) {
        (Some(kind), _) => kind.to_string(),
        (None, Some(token)) => format!("token {token:?}"),
        (None, None) => "unknown".to_string(),
    }
}

/// Print procedure registered for a node kind
pub fn lookup(kind: SyntaxKind) -> Option<PrintFn> {
    common::lookup(kind).or_else(|| items::lookup(kind))
}

pub struct Printer<'a> {
    tree: &'a SyntaxTree,
    comments: CommentMap,
}

impl<'a> Printer<'a> {
    pub fn new(tree: &'a SyntaxTree) -> Self {
        Self {
            tree,
            comments: CommentMap::build(tree),
        }
    }

    pub fn tree(&self) -> &'a SyntaxTree {
        self.tree
    }

    pub fn comments(&self) -> &CommentMap {
        &self.comments
    }

    /// Print a node with the comments that lead it
    pub fn print(&self, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
        let procedure = node
            .kind()
            .and_then(lookup)
            .ok_or_else(|| PrintError::NoPrinter {
                kind: describe(node),
                offset: node.start_offset(),
            })?;
        log::trace!("print {} at {}", describe(node), node.start_offset());
        let doc = procedure(self, node)?;
        let leading = self.comments.leading(node);
        if leading.is_empty() {
            return Ok(doc);
        }
        let mut parts: Vec<Doc> = leading.iter().map(|&c| self.comment(c)).collect();
        parts.push(doc);
        Ok(concat(parts))
    }

    /// Print every significant child of `node`
    pub fn print_children(&self, node: SyntaxNode<'a>) -> Result<Vec<Doc>, PrintError> {
        node.significant_children().map(|c| self.print(c)).collect()
    }

    /// A comment token followed by what separates it from the next thing:
    /// a line comment needs a newline, a block comment a space
    pub fn comment(&self, token_index: usize) -> Doc {
        let token = &self.tree.tokens()[token_index];
        let body = text(token.text(self.tree.source()).trim_end());
        match token.kind {
            TokenKind::MultiLineComment => concat([body, text(" ")]),
            _ => concat([body, hardline()]),
        }
    }

    /// Comment text alone, for comments placed at the end of a line
    pub fn comment_text(&self, token_index: usize) -> Doc {
        let token = &self.tree.tokens()[token_index];
        text(token.text(self.tree.source()).trim_end())
    }
}
