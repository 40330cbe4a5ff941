//! Print procedures for modules, members, statements and expressions.
use itertools::Itertools;
use move_syntax::{SyntaxKind, SyntaxNode, TokenKind};

use crate::comments::{item_tail, sequence_items};
use crate::common::{expect_children, print_marked, should_force_break};
use crate::doc::{Doc, concat, group, group_breaking, hardline, indent, join, line, text};
use crate::list::{ListOptions, print_list};
use crate::printer::{PrintError, PrintFn, Printer};

pub fn lookup(kind: SyntaxKind) -> Option<PrintFn> {
    use SyntaxKind::*;
    let procedure: PrintFn = match kind {
        SourceFile => print_source_file,
        ModuleDefinition => print_module_definition,
        ModuleBody => print_module_body,
        UseDeclaration => print_use_declaration,
        UseMemberList => print_use_member_list,
        UseMember => print_use_member,
        ConstantDeclaration => print_constant,
        StructDefinition => print_struct,
        TypeParameters | TypeArguments => print_angle_list,
        TypeParameter => print_type_parameter,
        AbilityDecls => print_ability_decls,
        NamedFields => print_named_fields,
        PositionalFields | FunctionParameters | ArgList | ExpressionList => print_paren_list,
        FieldAnnotation | FunctionParameter => print_typed_name,
        FunctionDefinition => print_function,
        RetType => print_ret_type,
        ApplyType | NameExpression | CallExpression | MacroCallExpression => print_adjacent,
        Block => print_block,
        LetStatement => print_let,
        AssignExpression => print_assign,
        BinaryExpression => print_binary,
        UnaryExpression => print_unary,
        BorrowExpression => print_borrow,
        CastExpression => print_cast,
        DotExpression => print_dot,
        IndexExpression => print_index,
        PackExpression => print_pack,
        VectorExpression => print_vector,
        LambdaExpression => print_lambda,
        IfExpression => print_if,
        WhileExpression => print_while,
        LoopExpression => print_loop,
        BreakExpression | ContinueExpression | ReturnExpression | AbortExpression => {
            print_keyword_operands
        }
        ParenExpression => print_paren,
        UnitExpression => print_unit,
        _ => return None,
    };
    Some(procedure)
}

// ----------------------------------------------------------------------
// sequences
// ----------------------------------------------------------------------

/// Items one per line. Blank lines between items survive (collapsed to one)
/// unless `blank_between` asks for one everywhere.
fn print_sequence<'a>(
    printer: &Printer<'a>,
    items: &[SyntaxNode<'a>],
    blank_between: bool,
) -> Result<Doc, PrintError> {
    let tree = printer.tree();
    let tokens = tree.tokens();
    let mut parts = Vec::new();
    let mut prev_end: Option<usize> = None;
    for &item in items {
        if let Some(end) = prev_end {
            parts.push(hardline());
            let start = printer
                .comments()
                .leading(item)
                .first()
                .map(|&c| tokens[c].start)
                .unwrap_or_else(|| item.start_offset());
            let blank = tree
                .source()
                .get(end..start)
                .is_some_and(|gap| gap.matches('\n').count() > 1);
            if blank_between || blank {
                parts.push(hardline());
            }
        }
        parts.push(printer.print(item)?);
        if item
            .next_sibling()
            .is_some_and(|s| s.is_token_of(TokenKind::SemiColon))
        {
            parts.push(text(";"));
        }
        for &comment in printer.comments().trailing(item) {
            parts.push(text(" "));
            parts.push(printer.comment_text(comment));
        }
        prev_end = item_tail(item).map(|t| tokens[t].end());
    }
    Ok(concat(parts))
}

/// Comments left between the last item and the closing brace, each on
/// its own line
fn print_end_comments<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>, after_items: bool) -> Doc {
    let comments = printer.comments().inner_end(node);
    concat(comments.iter().enumerate().map(|(i, &c)| {
        if i > 0 || after_items {
            concat([hardline(), printer.comment_text(c)])
        } else {
            printer.comment_text(c)
        }
    }))
}

fn has_trailing_comments(printer: &Printer<'_>, items: &[SyntaxNode<'_>]) -> bool {
    items
        .iter()
        .any(|&item| !printer.comments().trailing(item).is_empty())
}

// ----------------------------------------------------------------------
// modules and members
// ----------------------------------------------------------------------

fn print_source_file<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let modules = node.significant_children().collect_vec();
    let mut parts = vec![print_sequence(printer, &modules, true)?];
    let comments = printer.comments().end_of_file();
    if !comments.is_empty() {
        if !modules.is_empty() {
            parts.extend([hardline(), hardline()]);
        }
        parts.push(join(
            hardline(),
            comments.iter().map(|&c| printer.comment_text(c)),
        ));
    }
    Ok(concat(parts))
}

/// Annotations on their own lines, then the modifiers, each followed by a
/// space. Returns the remaining significant children.
fn print_member_header<'a>(
    printer: &Printer<'a>,
    node: SyntaxNode<'a>,
) -> Result<(Vec<Doc>, Vec<SyntaxNode<'a>>), PrintError> {
    let mut header = Vec::new();
    let mut rest = Vec::new();
    for child in node.significant_children() {
        match child.kind() {
            Some(SyntaxKind::Annotation) => {
                header.push(printer.print(child)?);
                header.push(hardline());
            }
            Some(SyntaxKind::Modifier) => {
                header.push(printer.print(child)?);
                header.push(text(" "));
            }
            _ => rest.push(child),
        }
    }
    Ok((header, rest))
}

fn print_module_definition<'a>(
    printer: &Printer<'a>,
    node: SyntaxNode<'a>,
) -> Result<Doc, PrintError> {
    let (mut parts, rest) = print_member_header(printer, node)?;
    let [name, body] = rest[..] else {
        return Err(PrintError::malformed(node, "expected a name and a body"));
    };
    parts.push(text("module "));
    parts.push(printer.print(name)?);
    if body.find_token(TokenKind::BlockBegin).is_some() {
        parts.push(text(" "));
    }
    parts.push(printer.print(body)?);
    Ok(concat(parts))
}

/// `{ members }` indented, or `;` followed by the members of the rest of
/// the file at the top level
fn print_module_body<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let members = sequence_items(node).collect_vec();
    let members_doc = print_sequence(printer, &members, false)?;
    let end_comments = print_end_comments(printer, node, !members.is_empty());
    if node.find_token(TokenKind::BlockBegin).is_none() {
        if members.is_empty() {
            return Ok(text(";"));
        }
        return Ok(concat([text(";"), hardline(), hardline(), members_doc, end_comments]));
    }
    if members.is_empty() && printer.comments().inner_end(node).is_empty() {
        return Ok(text("{}"));
    }
    Ok(concat([
        text("{"),
        indent(concat([hardline(), members_doc, end_comments])),
        hardline(),
        text("}"),
    ]))
}

fn print_semicolon_if_present(node: SyntaxNode<'_>, parts: &mut Vec<Doc>) {
    if node.find_token(TokenKind::SemiColon).is_some() {
        parts.push(text(";"));
    }
}

/// `use a::b;`, `use a::b as c;`, `use a::{b, c};`
fn print_use_declaration<'a>(
    printer: &Printer<'a>,
    node: SyntaxNode<'a>,
) -> Result<Doc, PrintError> {
    let (mut parts, rest) = print_member_header(printer, node)?;
    parts.push(text("use "));
    parts.push(print_use_path(printer, node, &rest)?);
    print_semicolon_if_present(node, &mut parts);
    Ok(concat(parts))
}

fn print_use_path<'a>(
    printer: &Printer<'a>,
    node: SyntaxNode<'a>,
    children: &[SyntaxNode<'a>],
) -> Result<Doc, PrintError> {
    let mut parts = Vec::new();
    for &child in children {
        match child.kind() {
            Some(SyntaxKind::ModuleAccess) => parts.push(printer.print(child)?),
            Some(SyntaxKind::UseMemberList) => {
                parts.push(text("::"));
                parts.push(printer.print(child)?);
            }
            Some(SyntaxKind::Alias) => {
                parts.push(text(" "));
                parts.push(printer.print(child)?);
            }
            _ => return Err(PrintError::malformed(node, "unexpected part of a use path")),
        }
    }
    Ok(concat(parts))
}

fn print_use_member_list<'a>(
    printer: &Printer<'a>,
    node: SyntaxNode<'a>,
) -> Result<Doc, PrintError> {
    print_list(printer, node, &ListOptions::new("{", "}"))
}

fn print_use_member<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let children = expect_children(node, 1..=2)?;
    print_use_path(printer, node, &children)
}

/// `const NAME: T = expr;`
fn print_constant<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let (mut parts, rest) = print_member_header(printer, node)?;
    let [name, ty, value] = rest[..] else {
        return Err(PrintError::malformed(node, "expected a name, a type and a value"));
    };
    parts.extend([
        text("const "),
        printer.print(name)?,
        text(": "),
        printer.print(ty)?,
        text(" = "),
        printer.print(value)?,
    ]);
    print_semicolon_if_present(node, &mut parts);
    Ok(concat(parts))
}

fn print_struct<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let (mut parts, rest) = print_member_header(printer, node)?;
    parts.push(text("struct "));
    for child in rest {
        match child.kind() {
            Some(SyntaxKind::AbilityDecls | SyntaxKind::NamedFields) => {
                parts.push(text(" "));
                parts.push(printer.print(child)?);
            }
            _ => parts.push(printer.print(child)?),
        }
    }
    print_semicolon_if_present(node, &mut parts);
    Ok(concat(parts))
}

fn print_angle_list<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    print_list(printer, node, &ListOptions::new("<", ">"))
}

fn print_paren_list<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    print_list(printer, node, &ListOptions::new("(", ")"))
}

/// `phantom T: copy + drop`
fn print_type_parameter<'a>(
    printer: &Printer<'a>,
    node: SyntaxNode<'a>,
) -> Result<Doc, PrintError> {
    let mut parts = Vec::new();
    if let Some(phantom) = node.children().next().filter(|c| c.is_token()) {
        parts.push(text(phantom.token_text()));
        parts.push(text(" "));
    }
    let mut children = node.significant_children();
    let name = children
        .next()
        .ok_or_else(|| PrintError::malformed(node, "missing type parameter name"))?;
    parts.push(printer.print(name)?);
    let abilities = children
        .map(|ability| printer.print(ability))
        .collect::<Result<Vec<_>, _>>()?;
    if !abilities.is_empty() {
        parts.push(text(": "));
        parts.push(join(text(" + "), abilities));
    }
    Ok(concat(parts))
}

fn print_ability_decls<'a>(
    printer: &Printer<'a>,
    node: SyntaxNode<'a>,
) -> Result<Doc, PrintError> {
    Ok(concat([
        text("has "),
        join(text(", "), printer.print_children(node)?),
    ]))
}

fn print_named_fields<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let options = ListOptions::new("{", "}")
        .padded()
        .breaking(should_force_break(node));
    print_list(printer, node, &options)
}

/// `name: T`, with `mut` kept in front of a function parameter
fn print_typed_name<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let children = expect_children(node, 2..=2)?;
    let mut parts = Vec::new();
    if node.find_token(TokenKind::Mut).is_some() {
        parts.push(text("mut "));
    }
    parts.extend([
        printer.print(children[0])?,
        text(": "),
        printer.print(children[1])?,
    ]);
    Ok(concat(parts))
}

fn print_function<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let (mut parts, rest) = print_member_header(printer, node)?;
    parts.push(text("fun "));
    for child in rest {
        if child.kind() == Some(SyntaxKind::Block) {
            parts.push(text(" "));
        }
        parts.push(printer.print(child)?);
    }
    print_semicolon_if_present(node, &mut parts);
    Ok(concat(parts))
}

fn print_ret_type<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let children = expect_children(node, 1..=1)?;
    Ok(concat([text(": "), printer.print(children[0])?]))
}

// ----------------------------------------------------------------------
// blocks and statements
// ----------------------------------------------------------------------

/// Whether a branch starts with a brace, so that it can stay on the line of
/// its keyword
fn is_block_headed(node: SyntaxNode<'_>) -> bool {
    node.kind() == Some(SyntaxKind::Block)
        || node
            .first_token()
            .is_some_and(|t| t.kind == TokenKind::BlockBegin)
}

fn print_block<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let mut parts = Vec::new();
    if let Some(label) = node
        .significant_children()
        .find(|c| c.kind() == Some(SyntaxKind::BlockIdentifier))
    {
        parts.push(printer.print(label)?);
        parts.push(text(" "));
    }
    let items = sequence_items(node).collect_vec();
    let has_end_comments = !printer.comments().inner_end(node).is_empty();
    if items.is_empty() && !has_end_comments {
        parts.push(text("{}"));
        return Ok(concat(parts));
    }
    let opened_on_own_line = match (node.find_token(TokenKind::BlockBegin), items.first()) {
        (Some(open), Some(first)) => open.start_line() != first.start_line(),
        _ => false,
    };
    let force = items.len() > 1
        || has_end_comments
        || opened_on_own_line
        || has_trailing_comments(printer, &items);
    let body = concat([
        print_sequence(printer, &items, false)?,
        print_end_comments(printer, node, !items.is_empty()),
    ]);
    parts.push(group_breaking(
        concat([
            text("{"),
            indent(concat([line(), body])),
            line(),
            text("}"),
        ]),
        force,
    ));
    Ok(concat(parts))
}

/// `let pattern: T = expr`
fn print_let<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let mut parts = vec![text("let ")];
    for child in node.significant_children() {
        let prev = child.prev_sibling().and_then(|s| s.token_kind());
        match prev {
            Some(TokenKind::Colon) => parts.push(text(": ")),
            Some(TokenKind::Assign) => parts.push(text(" = ")),
            _ => {}
        }
        parts.push(printer.print(child)?);
    }
    Ok(concat(parts))
}

fn print_assign<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let children = expect_children(node, 2..=2)?;
    Ok(concat([
        printer.print(children[0])?,
        text(" = "),
        printer.print(children[1])?,
    ]))
}

// ----------------------------------------------------------------------
// expressions
// ----------------------------------------------------------------------

/// Children printed next to each other: paths with type arguments, calls,
/// borrows
fn print_adjacent<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    Ok(concat(printer.print_children(node)?))
}

fn print_borrow<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let children = expect_children(node, 2..=2)?;
    print_marked(printer, children[0], children[1])
}

/// The right operand moves to an indented line when the expression is too
/// wide
fn print_binary<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let children = expect_children(node, 3..=3)?;
    Ok(group(concat([
        printer.print(children[0])?,
        text(" "),
        printer.print(children[1])?,
        indent(concat([line(), printer.print(children[2])?])),
    ])))
}

/// `!x`, `*x`, `move x`
fn print_unary<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let children = expect_children(node, 2..=2)?;
    let operator = children[0].token_text();
    let mut parts = vec![printer.print(children[0])?];
    if operator.chars().all(char::is_alphabetic) {
        parts.push(text(" "));
    }
    parts.push(printer.print(children[1])?);
    Ok(concat(parts))
}

fn print_cast<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let children = expect_children(node, 2..=2)?;
    Ok(concat([
        printer.print(children[0])?,
        text(" as "),
        printer.print(children[1])?,
    ]))
}

/// `e.field`, `e.method<T>`
fn print_dot<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let children = expect_children(node, 2..=3)?;
    let mut parts = vec![printer.print(children[0])?, text(".")];
    for &child in &children[1..] {
        parts.push(printer.print(child)?);
    }
    Ok(concat(parts))
}

fn print_index<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let children = expect_children(node, 2..=2)?;
    Ok(concat([
        printer.print(children[0])?,
        text("["),
        printer.print(children[1])?,
        text("]"),
    ]))
}

/// `Name { fields }`
fn print_pack<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let children = expect_children(node, 2..=2)?;
    Ok(concat([
        printer.print(children[0])?,
        text(" "),
        printer.print(children[1])?,
    ]))
}

/// `vector[..]`, `vector<T>[..]`
fn print_vector<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let mut parts = vec![text("vector")];
    let type_args = node
        .significant_children()
        .next()
        .filter(|c| c.kind() == Some(SyntaxKind::TypeArguments));
    if let Some(type_args) = type_args {
        parts.push(printer.print(type_args)?);
    }
    let options = ListOptions::new("[", "]").skip(usize::from(type_args.is_some()));
    parts.push(print_list(printer, node, &options)?);
    Ok(concat(parts))
}

/// `|x, y| body`, `|x| -> T body`
fn print_lambda<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let children = expect_children(node, 2..=3)?;
    let mut parts = vec![printer.print(children[0])?];
    if let [_, ret, _] = children[..] {
        parts.push(text(" -> "));
        parts.push(printer.print(ret)?);
    }
    parts.push(text(" "));
    parts.push(printer.print(children[children.len() - 1])?);
    Ok(group(concat(parts)))
}

/// A block-headed branch stays on the keyword's line, any other branch
/// goes to an indented line when the whole expression does not fit
fn print_branch<'a>(printer: &Printer<'a>, branch: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let doc = printer.print(branch)?;
    if is_block_headed(branch) {
        Ok(concat([text(" "), doc]))
    } else {
        Ok(indent(concat([line(), doc])))
    }
}

fn print_if<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let children = expect_children(node, 2..=3)?;
    let then_branch = children[1];
    let mut parts = vec![
        text("if ("),
        printer.print(children[0])?,
        text(")"),
        print_branch(printer, then_branch)?,
    ];
    if let Some(&else_branch) = children.get(2) {
        if is_block_headed(then_branch) {
            parts.push(text(" else"));
        } else {
            parts.push(line());
            parts.push(text("else"));
        }
        if else_branch.kind() == Some(SyntaxKind::IfExpression) {
            parts.push(text(" "));
            parts.push(printer.print(else_branch)?);
        } else {
            parts.push(print_branch(printer, else_branch)?);
        }
    }
    Ok(group(concat(parts)))
}

/// Optional block label followed by a space
fn print_loop_label<'a>(
    printer: &Printer<'a>,
    children: &mut Vec<SyntaxNode<'a>>,
) -> Result<Vec<Doc>, PrintError> {
    if children
        .first()
        .is_some_and(|c| c.kind() == Some(SyntaxKind::BlockIdentifier))
    {
        let label = children.remove(0);
        return Ok(vec![printer.print(label)?, text(" ")]);
    }
    Ok(vec![])
}

fn print_while<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let mut children = expect_children(node, 2..=3)?;
    let mut parts = print_loop_label(printer, &mut children)?;
    let [condition, body] = children[..] else {
        return Err(PrintError::malformed(node, "expected a condition and a body"));
    };
    parts.extend([
        text("while ("),
        printer.print(condition)?,
        text(")"),
        print_branch(printer, body)?,
    ]);
    Ok(group(concat(parts)))
}

fn print_loop<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let mut children = expect_children(node, 1..=2)?;
    let mut parts = print_loop_label(printer, &mut children)?;
    let [body] = children[..] else {
        return Err(PrintError::malformed(node, "expected a body"));
    };
    parts.extend([text("loop"), print_branch(printer, body)?]);
    Ok(group(concat(parts)))
}

/// `break 'a v`, `continue`, `return e`, `abort code`
fn print_keyword_operands<'a>(
    printer: &Printer<'a>,
    node: SyntaxNode<'a>,
) -> Result<Doc, PrintError> {
    let keyword = node
        .children()
        .next()
        .filter(|c| c.is_token())
        .ok_or_else(|| PrintError::malformed(node, "missing keyword"))?;
    let mut parts = vec![text(keyword.token_text())];
    for child in node.significant_children() {
        parts.push(text(" "));
        parts.push(printer.print(child)?);
    }
    Ok(concat(parts))
}

/// Parentheses are kept as written
fn print_paren<'a>(printer: &Printer<'a>, node: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    let children = expect_children(node, 1..=1)?;
    Ok(concat([text("("), printer.print(children[0])?, text(")")]))
}

fn print_unit<'a>(_: &Printer<'a>, _: SyntaxNode<'a>) -> Result<Doc, PrintError> {
    Ok(text("()"))
}
