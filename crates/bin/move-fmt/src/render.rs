//! Lowering of [`Doc`] onto the `pretty` allocator and rendering to text.
use pretty::{Arena, DocAllocator, DocBuilder};

use crate::FormatConfig;
use crate::doc::Doc;

/// Render a document within the configured width. Trailing whitespace is
/// stripped from every line.
pub fn render(doc: &Doc, config: &FormatConfig) -> std::io::Result<String> {
    let arena = Arena::new();
    let built = lower(&arena, doc, config.indent_size as isize, false);
    let mut output = Vec::new();
    built.render(config.width, &mut output)?;
    let rendered = String::from_utf8_lossy(&output);
    let mut result = String::with_capacity(rendered.len());
    for (i, line) in rendered.split('\n').enumerate() {
        if i > 0 {
            result.push('\n');
        }
        result.push_str(line.trim_end());
    }
    Ok(result)
}

/// `forced` is set while lowering the direct contents of a group that must
/// break: its lines become hard lines and its conditional parts take the
/// broken branch.
fn lower<'a>(
    arena: &'a Arena<'a>,
    doc: &Doc,
    indent: isize,
    forced: bool,
) -> DocBuilder<'a, Arena<'a>> {
    match doc {
        Doc::Nil => arena.nil(),
        Doc::Text(s) => arena.text(s.clone()),
        Doc::Concat(docs) => arena.concat(docs.iter().map(|d| lower(arena, d, indent, forced))),
        Doc::Group { doc, should_break } => lower(arena, doc, indent, *should_break).group(),
        Doc::Indent(doc) => lower(arena, doc, indent, forced).nest(indent),
        Doc::Line if forced => arena.hardline(),
        Doc::Line => arena.line(),
        Doc::SoftLine if forced => arena.hardline(),
        Doc::SoftLine => arena.line_(),
        Doc::HardLine => arena.hardline(),
        Doc::IfBreak { broken, .. } if forced => lower(arena, broken, indent, forced),
        Doc::IfBreak { broken, flat } => {
            lower(arena, broken, indent, forced).flat_alt(lower(arena, flat, indent, forced))
        }
        Doc::Join { separator, docs } => {
            let mut parts = Vec::with_capacity(docs.len() * 2);
            for (i, d) in docs.iter().enumerate() {
                if i > 0 {
                    parts.push(lower(arena, separator, indent, forced));
                }
                parts.push(lower(arena, d, indent, forced));
            }
            arena.concat(parts)
        }
    }
}
