//! Print procedures for names, leaf literals, types and patterns.
//!
//! These are the small building blocks shared by declarations and
//! expressions. Each procedure checks the child shape it relies on and
//! reports a malformed node instead of guessing.
use move_syntax::{SyntaxKind, SyntaxNode, TokenKind};

use crate::doc::{Doc, concat, group, join, nil, text};
use crate::list::{ListOptions, print_list};
use crate::printer::{PrintError, PrintFn, Printer};

pub fn lookup(kind: SyntaxKind) -> Option<PrintFn> {
    use SyntaxKind::*;
    let procedure: PrintFn = match kind {
        PrimitiveType | Identifier | VariableIdentifier | FieldIdentifier | Ability
        | BinaryOperator | UnaryOperator | PathSeparator | NumLiteral | BoolLiteral
        | AddressLiteral | ByteStringLiteral | Modifier => print_leaf,
        Label => print_label,
        BlockIdentifier => print_block_identifier,
        ModuleAccess => print_concat,
        RefMarker => print_ref_marker,
        RefType => print_ref_type,
        TupleType => print_tuple_type,
        FunctionType => print_function_type,
        FunctionTypeParameters => print_function_type_parameters,
        Annotation => print_annotation,
        AnnotationItem => print_concat,
        AnnotationList => print_annotation_list,
        AnnotationExpr => print_annotation_expr,
        Alias => print_alias,
        BindList => print_bind_list,
        BindVar => print_bind_var,
        MutBindVar => print_mut_bind_var,
        AtBind => print_at_bind,
        BindUnpack => print_bind_unpack,
        BindFields => print_bind_fields,
        BindNamedFields | FieldInitializeList => print_brace_fields,
        BindPositionalFields => print_paren_fields,
        BindField => print_bind_field,
        MutBindField => print_mut_bind_field,
        ExpField => print_exp_field,
        LambdaBindings => print_lambda_bindings,
        LambdaBinding => print_lambda_binding,
        _ => return None,
    };
    Some(procedure)
}

/// Whether the author already laid the node out over several lines: its
/// first significant child does not start on the line the node starts on
pub fn should_force_break(node: SyntaxNode<'_>) -> bool {
    node.significant_children()
        .next()
        .is_some_and(|first| first.start_line() != node.start_line())
}

/// Significant children, failing unless their count is within `range`
pub(crate) fn expect_children<'a>(
    node: SyntaxNode<'a>,
    range: std::ops::RangeInclusive<usize>,
) -> Result<Vec<SyntaxNode<'a>>, PrintError> {
    let children: Vec<_> = node.significant_children().collect();
    if range.contains(&children.len()) {
        Ok(children)
    } else {
        Err(PrintError::malformed(
            node,
            format!(
                "expected {}..={} children, found {}",
                range.start(),
                range.end(),
                children.len()
            ),
        ))
    }
}

fn prev_is(node: SyntaxNode<'_>, kind: TokenKind) -> bool {
    node.prev_sibling().is_some_and(|s| s.is_token_of(kind))
}

fn next_is(node: SyntaxNode<'_>, kind: TokenKind) -> bool {
    node.next_sibling().is_some_and(|s| s.is_token_of(kind))
}

fn print_leaf<'a>(_: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    Ok(text(node.token_text()))
}

fn print_concat<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    Ok(concat(printer.print_children(node)?))
}

/// `'a`, followed by `:` where the label declares a block
fn print_label<'a>(_: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let label = text(node.token_text());
    if next_is(node, TokenKind::Colon) {
        Ok(concat([label, text(":")]))
    } else {
        Ok(label)
    }
}

fn print_block_identifier<'a>(
    printer: &Printer<'a>,
    node: SyntaxNode<'a>,
) -> Result<Doc, PrintError> {
    let children = expect_children(node, 1..=1)?;
    printer.print(children[0])
}

fn print_ref_marker<'a>(_: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    if node.find_token(TokenKind::Mut).is_some() {
        Ok(text("&mut "))
    } else {
        Ok(text("&"))
    }
}

fn print_ref_type<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let children = expect_children(node, 2..=2)?;
    Ok(group(print_marked(printer, children[0], children[1])?))
}

/// A reference marker and its operand. `& &x` keeps its space, `&&x` would
/// read back as a single `&&` token.
pub(crate) fn print_marked<'a>(
    printer: &Printer<'a>,
    marker: SyntaxNode<'a>,
    operand: SyntaxNode<'a>,
) -> Result<Doc, PrintError> {
    let plain = marker.find_token(TokenKind::Mut).is_none();
    let nested = operand.first_token().map(|t| t.kind) == Some(TokenKind::Amp);
    let gap = if plain && nested { text(" ") } else { nil() };
    Ok(concat([printer.print(marker)?, gap, printer.print(operand)?]))
}

fn print_tuple_type<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    print_list(printer, node, &ListOptions::new("(", ")"))
}

fn print_function_type<'a>(
    printer: &Printer<'a>,
    node: SyntaxNode<'a>,
) -> Result<Doc, PrintError> {
    let children = expect_children(node, 0..=2)?;
    match children[..] {
        [] => Ok(text("||")),
        [only] => printer.print(only),
        [params, ret] => Ok(join(
            text(" -> "),
            [printer.print(params)?, printer.print(ret)?],
        )),
        _ => Err(PrintError::malformed(node, "too many parts")),
    }
}

fn print_function_type_parameters<'a>(
    printer: &Printer<'a>,
    node: SyntaxNode<'a>,
) -> Result<Doc, PrintError> {
    print_list(printer, node, &ListOptions::new("|", "|"))
}

/// `#[test, expected_failure(abort_code = 1)]`
fn print_annotation<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    Ok(concat([
        text("#"),
        print_list(printer, node, &ListOptions::new("[", "]"))?,
    ]))
}

fn print_annotation_list<'a>(
    printer: &Printer<'a>,
    node: SyntaxNode<'a>,
) -> Result<Doc, PrintError> {
    let name = node
        .significant_children()
        .next()
        .ok_or_else(|| PrintError::malformed(node, "missing annotation name"))?;
    Ok(concat([
        printer.print(name)?,
        print_list(printer, node, &ListOptions::new("(", ")").skip(1))?,
    ]))
}

fn print_annotation_expr<'a>(
    printer: &Printer<'a>,
    node: SyntaxNode<'a>,
) -> Result<Doc, PrintError> {
    let parts = expect_children(node, 2..=2)?
        .into_iter()
        .map(|child| {
            let doc = printer.print(child)?;
            if child.kind() == Some(SyntaxKind::ModuleAccess) && prev_is(child, TokenKind::DoubleColon)
            {
                Ok(concat([text("::"), doc]))
            } else {
                Ok(doc)
            }
        })
        .collect::<Result<Vec<_>, PrintError>>()?;
    Ok(join(text(" = "), parts))
}

fn print_alias<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let children = expect_children(node, 1..=1)?;
    Ok(concat([text("as "), printer.print(children[0])?]))
}

/// A single binding prints bare, several as a tuple
fn print_bind_list<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let children: Vec<_> = node.significant_children().collect();
    match children[..] {
        [only] => printer.print(only),
        _ => print_list(printer, node, &ListOptions::new("(", ")")),
    }
}

fn print_bind_var<'a>(_: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let name = text(node.token_text());
    if prev_is(node, TokenKind::Mut) {
        Ok(concat([text("mut "), name]))
    } else {
        Ok(name)
    }
}

/// The `mut` keyword is printed by the inner variable
fn print_mut_bind_var<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let children = expect_children(node, 1..=1)?;
    printer.print(children[0])
}

fn print_at_bind<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let children = expect_children(node, 2..=2)?;
    Ok(join(
        text(" @ "),
        [printer.print(children[0])?, printer.print(children[1])?],
    ))
}

/// `S { a, b }` keeps a space before the braces, `S(a, b)` does not
fn print_bind_unpack<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let mut parts = Vec::new();
    for child in expect_children(node, 1..=2)? {
        let named = child.kind() == Some(SyntaxKind::BindFields)
            && child
                .significant_children()
                .next()
                .is_some_and(|f| f.kind() == Some(SyntaxKind::BindNamedFields));
        if named {
            parts.push(text(" "));
        }
        parts.push(printer.print(child)?);
    }
    Ok(concat(parts))
}

fn print_bind_fields<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let children = expect_children(node, 1..=1)?;
    printer.print(children[0])
}

fn print_brace_fields<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let options = ListOptions::new("{", "}")
        .padded()
        .breaking(should_force_break(node));
    print_list(printer, node, &options)
}

fn print_paren_fields<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let options = ListOptions::new("(", ")").breaking(should_force_break(node));
    print_list(printer, node, &options)
}

/// `field`, `field: pattern`, `field: mut x`, `mut x` or `..`
fn print_bind_field<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let children = expect_children(node, 0..=2)?;
    if children.is_empty() {
        return if node.find_token(TokenKind::DoubleDot).is_some() {
            Ok(text(".."))
        } else {
            Err(PrintError::malformed(node, "empty field pattern"))
        };
    }
    let last = children.len() - 1;
    let parts = children
        .into_iter()
        .enumerate()
        .map(|(i, child)| {
            let doc = printer.print(child)?;
            if i == last && prev_is(child, TokenKind::Mut) {
                Ok(concat([text("mut "), doc]))
            } else {
                Ok(doc)
            }
        })
        .collect::<Result<Vec<_>, PrintError>>()?;
    Ok(join(text(": "), parts))
}

fn print_mut_bind_field<'a>(
    printer: &Printer<'a>,
    node: SyntaxNode<'a>,
) -> Result<Doc, PrintError> {
    let children = expect_children(node, 1..=1)?;
    Ok(concat([text("mut "), printer.print(children[0])?]))
}

/// `field` shorthand or `field: expr`
fn print_exp_field<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let parts = expect_children(node, 1..=2)?
        .into_iter()
        .map(|child| printer.print(child))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(join(text(": "), parts))
}

fn print_lambda_bindings<'a>(
    printer: &Printer<'a>,
    node: SyntaxNode<'a>,
) -> Result<Doc, PrintError> {
    Ok(group(print_list(printer, node, &ListOptions::new("|", "|"))?))
}

fn print_lambda_binding<'a>(
    printer: &Printer<'a>,
    node: SyntaxNode<'a>,
) -> Result<Doc, PrintError> {
    let parts = expect_children(node, 1..=2)?
        .into_iter()
        .map(|child| printer.print(child))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(join(text(": "), parts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FormatConfig;
    use crate::render::render;
    use move_syntax::{SyntaxTree, parse_source};

    fn parse(body: &str) -> SyntaxTree {
        let source = format!("module 0x1::m {{ fun f() {{ {body} }} }}");
        let (tree, errors) = parse_source(&source);
        assert!(errors.is_empty(), "{errors:?}");
        tree
    }

    fn print_first(tree: &SyntaxTree, kind: SyntaxKind) -> String {
        let config = FormatConfig::default();
        let printer = Printer::new(tree);
        let node = tree.root().find_descendant(kind).unwrap();
        render(&printer.print(node).unwrap(), &config).unwrap()
    }

    #[test]
    fn test_mut_bind_var() {
        let tree = parse("let mut x = 1;");
        assert_eq!(print_first(&tree, SyntaxKind::BindList), "mut x");
    }

    #[test]
    fn test_bind_field_mut_value() {
        let tree = parse("let S { a: mut b, mut c, .. } = s;");
        assert_eq!(
            print_first(&tree, SyntaxKind::BindUnpack),
            "S { a: mut b, mut c, .. }"
        );
    }

    #[test]
    fn test_positional_unpack_has_no_space() {
        let tree = parse("let S(mut a, b) = s;");
        assert_eq!(print_first(&tree, SyntaxKind::BindUnpack), "S(mut a, b)");
    }

    #[test]
    fn test_bind_tuple() {
        let tree = parse("let (a,b) = p;");
        assert_eq!(print_first(&tree, SyntaxKind::BindList), "(a, b)");
    }

    #[test]
    fn test_at_bind() {
        let tree = parse("let x @ S { a } = s;");
        assert_eq!(print_first(&tree, SyntaxKind::AtBind), "x @ S { a }");
    }

    #[test]
    fn test_ref_types() {
        let (tree, errors) = parse_source("module 0x1::m { fun f(a: &mut T, b: &u64) {} }");
        assert!(errors.is_empty());
        assert_eq!(print_first(&tree, SyntaxKind::RefType), "&mut T");
    }

    #[test]
    fn test_nested_ref_type_keeps_space() {
        let (tree, errors) = parse_source("module 0x1::m { fun f(a: & &u64) {} }");
        assert!(errors.is_empty());
        assert_eq!(print_first(&tree, SyntaxKind::RefType), "& &u64");
        let (tree, errors) = parse_source("module 0x1::m { fun f(a: &mut &u64) {} }");
        assert!(errors.is_empty());
        assert_eq!(print_first(&tree, SyntaxKind::RefType), "&mut &u64");
    }

    #[test]
    fn test_tuple_type_trailing_comma() {
        let (tree, errors) = parse_source("module 0x1::m { fun f(): (u64, bool) { (1, true) } }");
        assert!(errors.is_empty());
        let config = FormatConfig::default();
        let printer = Printer::new(&tree);
        let tuple = tree.root().find_descendant(SyntaxKind::TupleType).unwrap();
        let doc = printer.print(tuple).unwrap();
        assert_eq!(render(&doc, &config).unwrap(), "(u64, bool)");
        let narrow = FormatConfig {
            width: 5,
            ..FormatConfig::default()
        };
        assert_eq!(render(&doc, &narrow).unwrap(), "(\n    u64,\n    bool,\n)");
    }

    #[test]
    fn test_function_types() {
        let (tree, errors) =
            parse_source("module 0x1::m { fun f(a: ||, b: |u64, bool| -> u8, c: || -> u8) {} }");
        assert!(errors.is_empty());
        let config = FormatConfig::default();
        let printer = Printer::new(&tree);
        let printed: Vec<String> = tree
            .root()
            .find_descendant(SyntaxKind::FunctionParameters)
            .unwrap()
            .significant_children()
            .map(|p| {
                let ty = p.significant_children().last().unwrap();
                render(&printer.print(ty).unwrap(), &config).unwrap()
            })
            .collect();
        assert_eq!(printed, vec!["||", "|u64, bool| -> u8", "|| -> u8"]);
    }

    #[test]
    fn test_annotation_expr_keeps_leading_path_separator() {
        let (tree, errors) =
            parse_source("module 0x1::m { #[expected_failure(abort_code=::std::errors::E)] fun f() {} }");
        assert!(errors.is_empty());
        assert_eq!(
            print_first(&tree, SyntaxKind::Annotation),
            "#[expected_failure(abort_code = ::std::errors::E)]"
        );
    }

    #[test]
    fn test_should_force_break() {
        let tree = parse("let S {\n a,\n b } = s; let T { c } = t;");
        let config = FormatConfig::default();
        let printer = Printer::new(&tree);
        let fields: Vec<_> = tree
            .root()
            .find_descendant(SyntaxKind::Block)
            .unwrap()
            .significant_children()
            .filter_map(|stmt| stmt.find_descendant(SyntaxKind::BindNamedFields))
            .collect();
        assert!(should_force_break(fields[0]));
        assert!(!should_force_break(fields[1]));
        let doc = printer.print(fields[0]).unwrap();
        assert_eq!(render(&doc, &config).unwrap(), "{\n    a,\n    b,\n}");
    }

    #[test]
    fn test_malformed_node_is_reported() {
        let tree = parse("let x = 1;");
        let printer = Printer::new(&tree);
        let bind_list = tree.root().find_descendant(SyntaxKind::BindList).unwrap();
        let err = print_at_bind(&printer, bind_list).unwrap_err();
        assert!(matches!(err, PrintError::Precondition { .. }));
    }
}
