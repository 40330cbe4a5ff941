//! Integration tests for the CST parser
//!
//! Tests are organized by feature area:
//! - Modules and members
//! - Types
//! - Expressions and associativity
//! - Bindings
//! - Error recovery

use move_syntax::{SyntaxKind, SyntaxNode, SyntaxTree, TokenKind, parse_source};

fn parse_ok(source: &str) -> SyntaxTree {
    let (tree, errors) = parse_source(source);
    assert!(
        errors.is_empty(),
        "Expected no errors, got: {}\n{}",
        errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; "),
        tree.dump()
    );
    tree
}

/// Wrap statements into a function of a module
fn in_function(body: &str) -> String {
    format!("module 0x1::m {{ fun f() {{ {body} }} }}")
}

fn kinds<'t>(node: SyntaxNode<'t>) -> Vec<SyntaxKind> {
    node.significant_children().filter_map(|c| c.kind()).collect()
}

fn find<'t>(tree: &'t SyntaxTree, kind: SyntaxKind) -> SyntaxNode<'t> {
    tree.root()
        .find_descendant(kind)
        .unwrap_or_else(|| panic!("no {kind} in\n{}", tree.dump()))
}

// ---------------------------------------------------------------------------
// Modules and members
// ---------------------------------------------------------------------------

#[test]
fn test_parse_module() {
    let tree = parse_ok("module 0x1::m { }");
    let root = tree.root();
    assert_eq!(root.kind(), Some(SyntaxKind::SourceFile));
    let module = root.child(0).unwrap();
    assert_eq!(
        kinds(module),
        vec![SyntaxKind::ModuleAccess, SyntaxKind::ModuleBody]
    );
}

#[test]
fn test_parse_module_label_form() {
    let tree = parse_ok("module a::b;\n\nconst X: u64 = 1;\n");
    let body = find(&tree, SyntaxKind::ModuleBody);
    assert_eq!(kinds(body), vec![SyntaxKind::ConstantDeclaration]);
}

#[test]
fn test_parse_use_member_list() {
    let tree = parse_ok("module 0x1::m { use sui::coin::{Self, Coin as C}; }");
    let list = find(&tree, SyntaxKind::UseMemberList);
    assert_eq!(
        kinds(list),
        vec![SyntaxKind::UseMember, SyntaxKind::UseMember]
    );
    let alias = find(&tree, SyntaxKind::Alias);
    assert_eq!(alias.text(), "as C");
}

#[test]
fn test_parse_struct_definition() {
    let tree = parse_ok(
        "module 0x1::m { public struct Coin<phantom T> has key, store { id: UID, value: u64 } }",
    );
    let def = find(&tree, SyntaxKind::StructDefinition);
    assert_eq!(
        kinds(def),
        vec![
            SyntaxKind::Modifier,
            SyntaxKind::Identifier,
            SyntaxKind::TypeParameters,
            SyntaxKind::AbilityDecls,
            SyntaxKind::NamedFields,
        ]
    );
    let abilities = find(&tree, SyntaxKind::AbilityDecls);
    assert_eq!(abilities.significant_child_count(), 2);
}

#[test]
fn test_parse_positional_struct() {
    let tree = parse_ok("module 0x1::m { public struct P(u64, bool) has copy, drop; }");
    let def = find(&tree, SyntaxKind::StructDefinition);
    assert_eq!(
        kinds(def),
        vec![
            SyntaxKind::Modifier,
            SyntaxKind::Identifier,
            SyntaxKind::PositionalFields,
            SyntaxKind::AbilityDecls,
        ]
    );
}

#[test]
fn test_parse_function_signature() {
    let tree = parse_ok(
        "module 0x1::m { public(package) entry fun f<T: copy + drop>(mut x: u64, y: &T): bool { true } }",
    );
    let def = find(&tree, SyntaxKind::FunctionDefinition);
    assert_eq!(
        kinds(def),
        vec![
            SyntaxKind::Modifier,
            SyntaxKind::Modifier,
            SyntaxKind::Identifier,
            SyntaxKind::TypeParameters,
            SyntaxKind::FunctionParameters,
            SyntaxKind::RetType,
            SyntaxKind::Block,
        ]
    );
    let param = find(&tree, SyntaxKind::FunctionParameter);
    assert!(param.child(0).unwrap().is_token_of(TokenKind::Mut));
}

#[test]
fn test_parse_annotation_with_leading_separator() {
    let tree = parse_ok(
        "module 0x1::m { #[test, expected_failure(abort_code = ::sui::coin::EZero)] fun t() {} }",
    );
    let annotation = find(&tree, SyntaxKind::Annotation);
    assert_eq!(annotation.significant_child_count(), 2);
    let expr = find(&tree, SyntaxKind::AnnotationExpr);
    let access = expr
        .significant_children()
        .find(|c| c.kind() == Some(SyntaxKind::ModuleAccess))
        .unwrap();
    assert!(access.prev_sibling().unwrap().is_token_of(TokenKind::DoubleColon));
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[test]
fn test_parse_nested_generic_type() {
    let tree = parse_ok(&in_function("let v: vector<vector<u8>> = x;"));
    let outer = find(&tree, SyntaxKind::ApplyType);
    assert_eq!(outer.text(), "vector<vector<u8>>");
    let args = outer.child(1).unwrap();
    assert_eq!(args.kind(), Some(SyntaxKind::TypeArguments));
}

#[test]
fn test_parse_function_types() {
    let tree = parse_ok("module 0x1::m { fun f(a: ||, b: || -> u64, c: |u64, bool| -> u8) {} }");
    let params = find(&tree, SyntaxKind::FunctionParameters);
    let counts: Vec<_> = params
        .significant_children()
        .map(|p| {
            p.find_descendant(SyntaxKind::FunctionType)
                .unwrap()
                .significant_child_count()
        })
        .collect();
    assert_eq!(counts, vec![0, 2, 2]);
}

#[test]
fn test_parse_mut_ref_type() {
    let tree = parse_ok("module 0x1::m { fun f(x: &mut T) {} }");
    let marker = find(&tree, SyntaxKind::RefMarker);
    assert_eq!(marker.token_text(), "&mut");
}

// ---------------------------------------------------------------------------
// Expressions and associativity
// ---------------------------------------------------------------------------

#[test]
fn test_postfix_after_block_branch_attaches_to_block() {
    let tree = parse_ok(&in_function("if (c) { a } else { b }.f"));
    let if_expr = find(&tree, SyntaxKind::IfExpression);
    assert_eq!(
        kinds(if_expr),
        vec![
            SyntaxKind::NameExpression,
            SyntaxKind::Block,
            SyntaxKind::DotExpression,
        ]
    );
    let dot = if_expr.child(if_expr.children().count() - 1).unwrap();
    assert_eq!(
        dot.significant_children().next().and_then(|c| c.kind()),
        Some(SyntaxKind::Block)
    );
}

#[test]
fn test_non_block_else_extends_right() {
    let tree = parse_ok(&in_function("if (c) a else b.f"));
    let if_expr = find(&tree, SyntaxKind::IfExpression);
    assert_eq!(
        kinds(if_expr),
        vec![
            SyntaxKind::NameExpression,
            SyntaxKind::NameExpression,
            SyntaxKind::DotExpression,
        ]
    );
}

#[test]
fn test_parenthesized_if_is_kept() {
    let tree = parse_ok(&in_function("(if (c) a else b).f"));
    let dot = find(&tree, SyntaxKind::DotExpression);
    assert_eq!(
        dot.significant_children().next().and_then(|c| c.kind()),
        Some(SyntaxKind::ParenExpression)
    );
}

#[test]
fn test_block_statement_ends_at_brace() {
    let tree = parse_ok(&in_function("if (c) { a } else { b } *x = 1;"));
    let block = find(&tree, SyntaxKind::Block);
    assert_eq!(
        kinds(block),
        vec![SyntaxKind::IfExpression, SyntaxKind::AssignExpression]
    );
}

#[test]
fn test_shift_and_comparison() {
    let tree = parse_ok(&in_function("let x = a >> 2; let y = a < b;"));
    let ops: Vec<_> = find(&tree, SyntaxKind::Block)
        .significant_children()
        .map(|s| s.find_descendant(SyntaxKind::BinaryOperator).unwrap().token_text())
        .collect();
    assert_eq!(ops, vec![">>", "<"]);
}

#[test]
fn test_generic_call() {
    let tree = parse_ok(&in_function("f<u64>(x)"));
    let call = find(&tree, SyntaxKind::CallExpression);
    assert_eq!(
        kinds(call),
        vec![SyntaxKind::NameExpression, SyntaxKind::ArgList]
    );
    assert!(call.find_descendant(SyntaxKind::TypeArguments).is_some());
}

#[test]
fn test_pack_and_macro() {
    let tree = parse_ok(&in_function("assert!(x == 1, 0); S { a, b: 1 }"));
    assert!(tree.root().find_descendant(SyntaxKind::MacroCallExpression).is_some());
    let list = find(&tree, SyntaxKind::FieldInitializeList);
    let fields: Vec<_> = list
        .significant_children()
        .map(|f| f.significant_child_count())
        .collect();
    assert_eq!(fields, vec![1, 2]);
}

#[test]
fn test_labeled_loop() {
    let tree = parse_ok(&in_function("'outer: loop { break 'outer }"));
    let looped = find(&tree, SyntaxKind::LoopExpression);
    let ident = looped.child(0).unwrap();
    assert_eq!(ident.kind(), Some(SyntaxKind::BlockIdentifier));
    let label = ident.child(0).unwrap();
    assert!(label.next_sibling().unwrap().is_token_of(TokenKind::Colon));
    let brk = find(&tree, SyntaxKind::BreakExpression);
    assert_eq!(kinds(brk), vec![SyntaxKind::Label]);
}

#[test]
fn test_lambda() {
    let tree = parse_ok(&in_function("let f = |x, mut y: u64| x + y;"));
    let bindings = find(&tree, SyntaxKind::LambdaBindings);
    assert_eq!(
        kinds(bindings),
        vec![SyntaxKind::LambdaBinding, SyntaxKind::LambdaBinding]
    );
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

#[test]
fn test_named_field_patterns() {
    let tree = parse_ok(&in_function("let S { f, g: mut h, mut k, .. } = x;"));
    let fields = find(&tree, SyntaxKind::BindNamedFields);
    assert_eq!(
        kinds(fields),
        vec![
            SyntaxKind::BindField,
            SyntaxKind::BindField,
            SyntaxKind::MutBindField,
            SyntaxKind::BindField,
        ]
    );
    let g = fields.significant_children().nth(1).unwrap();
    let value = g.significant_children().nth(1).unwrap();
    assert_eq!(value.kind(), Some(SyntaxKind::VariableIdentifier));
    assert!(value.prev_sibling().unwrap().is_token_of(TokenKind::Mut));
}

#[test]
fn test_positional_field_patterns() {
    let tree = parse_ok(&in_function("let P(a, mut b) = p;"));
    let fields = find(&tree, SyntaxKind::BindPositionalFields);
    let second = fields.significant_children().nth(1).unwrap();
    assert!(second.child(0).unwrap().is_token_of(TokenKind::Mut));
    assert_eq!(kinds(second), vec![SyntaxKind::VariableIdentifier]);
}

#[test]
fn test_bind_list_tuple() {
    let tree = parse_ok(&in_function("let (a, mut b) = (1, 2);"));
    let list = find(&tree, SyntaxKind::BindList);
    assert_eq!(
        kinds(list),
        vec![SyntaxKind::BindVar, SyntaxKind::MutBindVar]
    );
    assert!(tree.root().find_descendant(SyntaxKind::ExpressionList).is_some());
}

// ---------------------------------------------------------------------------
// Error recovery
// ---------------------------------------------------------------------------

#[test]
fn test_error_missing_brace() {
    let (_tree, errors) = parse_source("module 0x1::m { fun f() { 42 }");
    assert!(!errors.is_empty(), "Expected parse errors, got none");
}

#[test]
fn test_error_garbage_recovers() {
    let (tree, errors) = parse_source("module 0x1::m { fun f() { let $ = 1; } }");
    assert!(!errors.is_empty());
    assert!(tree.root().find_descendant(SyntaxKind::FunctionDefinition).is_some());
}
