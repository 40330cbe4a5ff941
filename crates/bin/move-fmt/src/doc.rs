//! Layout-independent document tree.
//!
//! Printers build a [`Doc`] and never look at the target width. The
//! renderer decides where the breakable lines actually break.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Doc {
    Nil,
    Text(String),
    Concat(Vec<Doc>),
    /// Lines directly inside a group break together. With `should_break`
    /// set they always break.
    Group { doc: Box<Doc>, should_break: bool },
    Indent(Box<Doc>),
    /// A space when flat, a newline when broken
    Line,
    /// Nothing when flat, a newline when broken
    SoftLine,
    /// Always a newline
    HardLine,
    IfBreak { broken: Box<Doc>, flat: Box<Doc> },
    Join { separator: Box<Doc>, docs: Vec<Doc> },
}

impl Doc {
    pub fn is_nil(&self) -> bool {
        matches!(self, Doc::Nil)
    }
}

pub fn nil() -> Doc {
    Doc::Nil
}

pub fn text(s: impl Into<String>) -> Doc {
    Doc::Text(s.into())
}

pub fn concat(docs: impl IntoIterator<Item = Doc>) -> Doc {
    Doc::Concat(docs.into_iter().filter(|d| !d.is_nil()).collect())
}

pub fn group(doc: Doc) -> Doc {
    group_breaking(doc, false)
}

pub fn group_breaking(doc: Doc, should_break: bool) -> Doc {
    Doc::Group {
        doc: Box::new(doc),
        should_break,
    }
}

pub fn indent(doc: Doc) -> Doc {
    Doc::Indent(Box::new(doc))
}

pub fn join(separator: Doc, docs: impl IntoIterator<Item = Doc>) -> Doc {
    Doc::Join {
        separator: Box::new(separator),
        docs: docs.into_iter().collect(),
    }
}

pub fn if_break(broken: Doc, flat: Doc) -> Doc {
    Doc::IfBreak {
        broken: Box::new(broken),
        flat: Box::new(flat),
    }
}

pub fn line() -> Doc {
    Doc::Line
}

pub fn softline() -> Doc {
    Doc::SoftLine
}

pub fn hardline() -> Doc {
    Doc::HardLine
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_drops_nil() {
        let doc = concat([text("a"), nil(), text("b")]);
        assert_eq!(doc, Doc::Concat(vec![text("a"), text("b")]));
    }

    #[test]
    fn test_structural_equality() {
        let make = || group(concat([text("("), indent(softline()), text(")")]));
        assert_eq!(make(), make());
        assert_ne!(make(), group_breaking(concat([text("("), indent(softline()), text(")")]), true));
    }
}
