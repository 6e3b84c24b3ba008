// パス: tests/lexer_parser.rs
// 役割: 字句解析と構文解析の基本〜境界テストを一本化
// 意図: 入力の分割規則と構文エラーの分類が回帰しないようにする
// 関連ファイル: src/lexer.rs, src/parser/mod.rs, tests/test_support.rs
#[path = "test_support.rs"]
mod support;

use ilang::ast::{Ast, BinOp, Expr};
use ilang::errors::SyntaxError;
use ilang::lexer::TokenKind;
use ilang::parser;
use ilang::typesys::{TypeDescriptor, TypeDirectory};
use support::{kinds_and_texts, lex_ok, parse_expr, syntax_error_code};

#[test]
/// 代表的な字句パターンをテーブル駆動で検証する。
fn lexer_happy_paths() {
    struct Case<'a> {
        src: &'a str,
        expect: &'a [(TokenKind, &'a str)],
        note: &'a str,
    }
    use TokenKind::*;

    let cases = [
        Case {
            src: "1 + 2",
            expect: &[(Int, "1"), (Space, " "), (Op, "+"), (Space, " "), (Int, "2")],
            note: "sum",
        },
        Case {
            src: "[x,y]",
            expect: &[
                (ListOpen, "["),
                (Id, "x"),
                (Op, ","),
                (Id, "y"),
                (ListClose, "]"),
            ],
            note: "list",
        },
        Case {
            src: "f(\"é\")",
            expect: &[
                (Id, "f"),
                (GroupOpen, "("),
                (Str, "\"é\""),
                (GroupClose, ")"),
            ],
            note: "call with multibyte string",
        },
        Case {
            src: "a!=b;c",
            expect: &[(Id, "a"), (Op, "!="), (Id, "b"), (Op, ";"), (Id, "c")],
            note: "two-char operator and separator",
        },
        Case {
            src: "0.25e+3\n",
            expect: &[(Real, "0.25e+3"), (NewLine, "\n")],
            note: "real with signed exponent",
        },
    ];

    for case in cases {
        assert_eq!(kinds_and_texts(case.src), case.expect, "{}", case.note);
    }
}

#[test]
/// 空入力は Eof だけになることを確認する。
fn empty_input_is_only_eof() {
    let toks = lex_ok("");
    assert_eq!(toks.len(), 1);
    assert_eq!(toks[0].kind, TokenKind::Eof);
    assert_eq!(toks[0].text, "");
}

#[test]
/// 構文エラーのコードをテーブル駆動で検証する。
fn syntax_error_codes() {
    let cases = [
        ("1 +* 2", "PAR001"),
        ("(1", "PAR001"),
        ("1 == 2 == 3", "PAR030"),
        ("Int -> 3", "PAR021"),
        ("\"abc", "LEX003"),
        ("#", "LEX090"),
        ("1 2", "PAR090"),
    ];
    for (src, code) in cases {
        assert_eq!(syntax_error_code(src), code, "{src}");
    }
    // 束縛は文としてのみ解析される。
    let err = parser::parse("Int = 3", &TypeDirectory::prelude(), Ast::new()).unwrap_err();
    assert!(matches!(err, SyntaxError::Parse(ref e) if e.0.code == "PAR020"));
}

#[test]
/// 比較・加算・乗算・べき乗の優先順位を確認する。
fn precedence_ladder() {
    let Expr::BinOp { op, left, right } = parse_expr("1 + 2 * 3 ^ 2 < 20") else {
        panic!("expected comparison");
    };
    assert_eq!(op, BinOp::Lt);
    assert_eq!(*right, Expr::Int(20));
    let Expr::BinOp { op, right, .. } = *left else {
        panic!("expected addition");
    };
    assert_eq!(op, BinOp::Add);
    assert!(matches!(*right, Expr::BinOp { op: BinOp::Mul, .. }));
}

#[test]
/// べき乗は右結合になることを検証する。
fn power_is_right_associative() {
    let Expr::BinOp { op, left, right } = parse_expr("2 ^ 3 ^ 2") else {
        panic!("expected power");
    };
    assert_eq!(op, BinOp::Pow);
    assert_eq!(*left, Expr::Int(2));
    assert!(matches!(*right, Expr::BinOp { op: BinOp::Pow, .. }));
}

#[test]
/// 型ディレクトリに登録した名前が型参照として解析されるか確認する。
fn registered_types_parse_as_type_refs() {
    let types = TypeDirectory::prelude().register(TypeDescriptor::named("Point"));
    assert_eq!(
        parser::parse_expr("Point", &types).unwrap(),
        Expr::TypeRef("Point".into())
    );
    assert_eq!(
        parser::parse_expr("Point", &TypeDirectory::prelude()).unwrap(),
        Expr::Var("Point".into())
    );
}

#[test]
/// 行をまたいだ入力が蓄積された構文木へ追記されることを検証する。
fn incremental_parse_accumulates() {
    let types = TypeDirectory::prelude();
    let tree = parser::parse("x = 1", &types, Ast::new()).unwrap();
    assert_eq!(tree.root.len(), 1);

    let tree = parser::parse("f = a ->", &types, tree).unwrap();
    assert!(tree.is_pending());
    assert_eq!(tree.root.len(), 1);

    let tree = parser::parse("a * 2; f(x)", &types, tree).unwrap();
    assert!(!tree.is_pending());
    let added = tree.added_since(1);
    assert_eq!(added.len(), 2);
    assert!(matches!(&*added[0], Expr::Bind { name, .. } if name == "f"));
}

#[test]
/// 空行や区切りだけの行では式が追加されないことを確認する。
fn blank_and_separator_lines_add_nothing() {
    let types = TypeDirectory::prelude();
    let tree = parser::parse("", &types, Ast::new()).unwrap();
    let tree = parser::parse("  ;; ", &types, tree).unwrap();
    assert!(tree.root.is_empty());
    assert!(!tree.is_pending());
}
