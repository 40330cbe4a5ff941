// `>|` generates additional line break at the end of the file, so remove it manually
//run cargo run -- tests/dirty.move --width 100 >| tests/pretty_100.move
//run cargo run -- tests/dirty.move --width 60 >| tests/pretty_60.move
mod main {

    use move_fmt::{FormatConfig, FormatError, format_source};
    use move_syntax::{SyntaxKind, parse_source};

    fn config(width: usize) -> FormatConfig {
        FormatConfig {
            width,
            ..FormatConfig::default()
        }
    }

    fn format(src: &str) -> String {
        format_source(src, &FormatConfig::default()).expect("failed to pretty print")
    }

    /// Formatting an already formatted file must not change it
    fn assert_stable(src: &str, config: &FormatConfig) -> String {
        let res = format_source(src, config).expect("failed to pretty print");
        let res2 = format_source(&res, config);
        assert!(res2.is_ok()); // formatted document does not contain syntax error
        assert_eq!(res, res2.unwrap()); // pretty printed document is identical
        res
    }

    #[test]
    fn basic_100() {
        let src = include_str!("dirty.move").replace("\r\n", "\n");
        let ans = include_str!("pretty_100.move").replace("\r\n", "\n");
        let res = assert_stable(&src, &config(100));
        assert_eq!(res, ans);
    }

    #[test]
    fn basic_60() {
        let src = include_str!("dirty.move").replace("\r\n", "\n");
        let ans = include_str!("pretty_60.move").replace("\r\n", "\n");
        let res = assert_stable(&src, &config(60));
        assert_eq!(res, ans);
    }

    #[test]
    fn formatted_files_are_fixed_points() {
        for (ans, width) in [
            (include_str!("pretty_100.move"), 100),
            (include_str!("pretty_60.move"), 60),
        ] {
            let ans = ans.replace("\r\n", "\n");
            assert_eq!(format_source(&ans, &config(width)).unwrap(), ans);
        }
    }

    #[test]
    fn branches_keep_their_extent() {
        let src = "module 0x1::m { fun f() { let x = if (c) a else b + 1; let y = if (c) { a } else { b }.len(); } }";
        let res = assert_stable(src, &FormatConfig::default());
        assert_eq!(
            res,
            "module 0x1::m {\n    fun f() {\n        let x = if (c) a else b + 1;\n        let y = if (c) { a } else { b }.len();\n    }\n}\n"
        );
        let (tree, errors) = parse_source(&res);
        assert!(errors.is_empty());
        let if_expr = tree
            .root()
            .find_descendant(SyntaxKind::IfExpression)
            .unwrap();
        let else_branch = if_expr.significant_children().nth(2).unwrap();
        assert_eq!(else_branch.kind(), Some(SyntaxKind::BinaryExpression));
    }

    #[test]
    fn parentheses_are_kept() {
        let src = "module 0x1::m { fun f(): u64 { (a + b) * c } fun g(): u64 { (if (c) a else b).f } }";
        assert_eq!(
            format(src),
            "module 0x1::m {\n    fun f(): u64 { (a + b) * c }\n    fun g(): u64 { (if (c) a else b).f }\n}\n"
        );
    }

    #[test]
    fn trailing_comma_only_when_broken() {
        let src = "module 0x1::m { fun f() { call_something(first_argument, second_argument); } }";
        assert_eq!(
            assert_stable(src, &config(40)),
            "module 0x1::m {\n    fun f() {\n        call_something(\n            first_argument,\n            second_argument,\n        );\n    }\n}\n"
        );
        assert_eq!(
            format(src),
            "module 0x1::m {\n    fun f() { call_something(first_argument, second_argument); }\n}\n"
        );
    }

    #[test]
    fn mut_is_printed_once() {
        let src = "module 0x1::m { fun f(mut p: u64) { let mut x = 1; let (mut a, b) = p; let S { mut c, d: mut e } = s; } }";
        assert_eq!(
            format(src),
            "module 0x1::m {\n    fun f(mut p: u64) {\n        let mut x = 1;\n        let (mut a, b) = p;\n        let S { mut c, d: mut e } = s;\n    }\n}\n"
        );
    }

    #[test]
    fn authored_multiline_stays_multiline() {
        let src = "module 0x1::m { struct S {\n a: u64 } fun f() { a } }";
        assert_eq!(
            format(src),
            "module 0x1::m {\n    struct S {\n        a: u64,\n    }\n    fun f() { a }\n}\n"
        );
    }

    #[test]
    fn function_types() {
        let src = "module 0x1::m { fun f(g: ||, h: || -> u64, k: |u8| -> bool) {} }";
        assert_eq!(
            format(src),
            "module 0x1::m {\n    fun f(g: ||, h: || -> u64, k: |u8| -> bool) {}\n}\n"
        );
    }

    #[test]
    fn references() {
        let src = "module 0x1::m { fun f(a: &mut T, b: &T): &u64 { &a.x } }";
        assert_eq!(
            format(src),
            "module 0x1::m {\n    fun f(a: &mut T, b: &T): &u64 { &a.x }\n}\n"
        );
    }

    #[test]
    fn nested_borrows_stay_apart() {
        let src = "module 0x1::m { fun f() { let x = & &y; let z = &mut &y; } }";
        assert_eq!(
            assert_stable(src, &FormatConfig::default()),
            "module 0x1::m {\n    fun f() {\n        let x = & &y;\n        let z = &mut &y;\n    }\n}\n"
        );
    }

    #[test]
    fn pack_expression() {
        let src = "module 0x1::m { fun f(): S { S {field1,field2} } }";
        assert_eq!(
            format(src),
            "module 0x1::m {\n    fun f(): S { S { field1, field2 } }\n}\n"
        );
    }

    #[test]
    fn comments_are_kept() {
        let src = "module 0x1::m {\n    // leading\n    fun f() {\n        a(); // trailing\n        // end\n    }\n}\n\n// bye\n";
        assert_eq!(assert_stable(src, &FormatConfig::default()), src);
    }

    #[test]
    fn list_element_comments_stay_on_their_line() {
        let src = "module 0x1::m {\n    struct S {\n        a: u64, // balance\n        b: u64,\n    }\n}\n";
        assert_eq!(assert_stable(src, &FormatConfig::default()), src);
        let src = "module 0x1::m { fun f() { g(a, // first\n b); } }";
        assert_eq!(
            assert_stable(src, &FormatConfig::default()),
            "module 0x1::m {\n    fun f() {\n        g(\n            a, // first\n            b,\n        );\n    }\n}\n"
        );
    }

    #[test]
    fn label_module_form() {
        let src = "module 0x1::m;\nfun f() {}\n\nfun g() {}\n";
        assert_eq!(format(src), "module 0x1::m;\n\nfun f() {}\n\nfun g() {}\n");
    }

    /// Node kinds of a parsed source as an indented outline, tokens left out
    fn outline(src: &str) -> String {
        let (tree, errors) = parse_source(src);
        assert!(errors.is_empty(), "{errors:?}");
        tree.dump()
            .lines()
            .filter(|l| !l.trim_start().starts_with('"'))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn output_has_the_same_tree() {
        let fixture = include_str!("dirty.move").replace("\r\n", "\n");
        let snippets = [
            fixture.as_str(),
            "module 0x1::m { fun f() { let x = & &y; let z = &mut &y; let w = &mut v.f; } }",
            "module 0x1::m { fun f(a: & &u64, b: &mut vector<u8>): &u64 { a } }",
            "module 0x1::m { fun f(): u64 { (x as u64) + (y as u64) * 2 } }",
            "module 0x1::m { fun f() { let x = if (c) a else b + 1; let y = if (c) { a } else { b }.len(); } }",
            "module 0x1::m { fun f(): u64 { (if (c) a else b).f } }",
            "module 0x1::m { fun f() { let (mut a, b) = p; let S { c, d: mut e } = s; let T(x, y) = t; let x @ S { a } = s; } }",
            "module 0x1::m { struct S {\n a: u64, // balance\n b: u64 } }",
        ];
        for src in snippets {
            for width in [100, 60, 20] {
                let res = format_source(src, &config(width)).expect("failed to pretty print");
                assert_eq!(outline(src), outline(&res), "{res}");
            }
        }
    }

    #[test]
    fn syntax_errors_are_refused() {
        let res = format_source("module 0x1::m { fun f( }", &FormatConfig::default());
        match res {
            Err(FormatError::Parse(errors)) => assert!(!errors.is_empty()),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn concurrent_formatting() {
        let src = include_str!("dirty.move").replace("\r\n", "\n");
        let expected = [
            (100, include_str!("pretty_100.move").replace("\r\n", "\n")),
            (60, include_str!("pretty_60.move").replace("\r\n", "\n")),
        ];
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let (width, ans) = &expected[i % 2];
                    let src = &src;
                    scope.spawn(move || {
                        assert_eq!(&format_source(src, &config(*width)).unwrap(), ans);
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
        });
    }
}
