//! Delimited, comma separated lists.
use itertools::Itertools;
use move_syntax::SyntaxNode;

use crate::doc::{Doc, concat, group_breaking, if_break, indent, join, line, nil, softline, text};
use crate::printer::{PrintError, Printer};

/// How a delimited list is laid out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    pub open: &'static str,
    pub close: &'static str,
    /// Pad the inside of the delimiters with a space when flat
    pub add_whitespace: bool,
    pub should_break: bool,
    /// Number of leading significant children that are not list elements
    pub skip: usize,
}

impl ListOptions {
    pub fn new(open: &'static str, close: &'static str) -> Self {
        Self {
            open,
            close,
            add_whitespace: false,
            should_break: false,
            skip: 0,
        }
    }

    pub fn padded(mut self) -> Self {
        self.add_whitespace = true;
        self
    }

    pub fn breaking(mut self, should_break: bool) -> Self {
        self.should_break = should_break;
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }
}

/// Lay out already printed elements. A trailing comma appears only when the
/// list is broken over several lines.
pub fn list(elements: Vec<Doc>, options: &ListOptions) -> Doc {
    if elements.is_empty() {
        return concat([text(options.open), text(options.close)]);
    }
    let edge = || {
        if options.add_whitespace {
            line()
        } else {
            softline()
        }
    };
    group_breaking(
        concat([
            text(options.open),
            indent(concat([
                edge(),
                join(concat([text(","), line()]), elements),
                if_break(text(","), nil()),
            ])),
            edge(),
            text(options.close),
        ]),
        options.should_break,
    )
}

/// Print the significant children of `node` as a list. An element with a
/// comment at the end of its line keeps it there, which breaks the list.
pub fn print_list<'a>(
    printer: &Printer<'a>,
    node: SyntaxNode<'a>,
    options: &ListOptions,
) -> Result<Doc, PrintError> {
    let children = node.significant_children().skip(options.skip).collect_vec();
    let elements = children
        .iter()
        .map(|&child| printer.print(child))
        .collect::<Result<Vec<_>, _>>()?;
    let commented = children
        .iter()
        .any(|&child| !printer.comments().trailing(child).is_empty());
    if !commented {
        return Ok(list(elements, options));
    }
    let elements = elements
        .into_iter()
        .zip(children)
        .map(|(element, child)| {
            let mut parts = vec![element, text(",")];
            for &comment in printer.comments().trailing(child) {
                parts.push(text(" "));
                parts.push(printer.comment_text(comment));
            }
            concat(parts)
        })
        .collect_vec();
    Ok(group_breaking(
        concat([
            text(options.open),
            indent(concat([line(), join(line(), elements)])),
            line(),
            text(options.close),
        ]),
        true,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FormatConfig;
    use crate::render::render;

    fn render_at(doc: &Doc, width: usize) -> String {
        render(doc, &FormatConfig { width, indent_size: 4 }).unwrap()
    }

    #[test]
    fn test_empty_list() {
        let doc = list(vec![], &ListOptions::new("{", "}").padded());
        assert_eq!(render_at(&doc, 80), "{}");
    }

    #[test]
    fn test_padded_flat() {
        let doc = list(
            vec![text("a"), text("b")],
            &ListOptions::new("{", "}").padded(),
        );
        assert_eq!(render_at(&doc, 80), "{ a, b }");
    }

    #[test]
    fn test_trailing_comma_only_when_broken() {
        let options = ListOptions::new("(", ")");
        let elements = || vec![text("first_argument"), text("second_argument")];
        assert_eq!(
            render_at(&list(elements(), &options), 80),
            "(first_argument, second_argument)"
        );
        assert_eq!(
            render_at(&list(elements(), &options), 20),
            "(\n    first_argument,\n    second_argument,\n)"
        );
    }

    #[test]
    fn test_should_break() {
        let doc = list(
            vec![text("a")],
            &ListOptions::new("{", "}").padded().breaking(true),
        );
        assert_eq!(render_at(&doc, 80), "{\n    a,\n}");
    }
}
