// パス: src/parser/mod.rs
// 役割: トークン列から AST を生成する再帰下降パーサのエントリポイント
// 意図: 行単位の入力をセッションの構文木へ逐次追加できるようにする
// 関連ファイル: src/parser/expr.rs, src/ast.rs, src/lexer.rs
//! 構文解析モジュール
//!
//! - `;` または改行で区切られたトップレベル文を解析する。
//! - 演算子の結合規則・優先順位は `cmp > add > mul > unary > pow > call` の順でハンドコードする。
//! - 括弧が閉じていない、または二項演算子で終わる入力は未完結として
//!   `Ast::pending` に保留し、次の行と連結してから解析する。

use std::rc::Rc;

use crate::ast::{Ast, BinOp, Expr};
use crate::errors::{ParseError, SyntaxError};
use crate::lexer::{tokenize, Token, TokenKind};
use crate::typesys::TypeDirectory;

mod expr;

pub struct Parser<'s, 't> {
    src: &'s str,
    ts: Vec<Token<'s>>,
    i: usize,
    types: &'t TypeDirectory,
    depth: usize,
}

/// 括弧・ラムダ本体・単項演算子を入れ子にできる深さの上限。
pub const MAX_NESTING: usize = 1_000;

#[derive(Clone, Copy)]
pub(super) enum Assoc {
    Left,
    Non,
}

pub(super) struct InfixSpec {
    pub ops: &'static [&'static str],
    pub assoc: Assoc,
}

impl InfixSpec {
    pub(super) fn lookup(&self, tok: &Token<'_>) -> Option<BinOp> {
        if tok.kind != TokenKind::Op || !self.ops.contains(&tok.text) {
            return None;
        }
        BinOp::from_symbol(tok.text)
    }
}

pub(super) const INFIX_LEVELS: &[InfixSpec] = &[
    InfixSpec {
        ops: &["==", "!=", "<", "<=", ">", ">="],
        assoc: Assoc::Non,
    },
    InfixSpec {
        ops: &["+", "-"],
        assoc: Assoc::Left,
    },
    InfixSpec {
        ops: &["*", "/", "%"],
        assoc: Assoc::Left,
    },
];

impl<'s, 't> Parser<'s, 't> {
    /// トークン列から新しいパーサインスタンスを構築する。
    ///
    /// 空白は捨てる。改行も括弧の内側と、`;` 以外の演算子の直後では
    /// 継続とみなして捨てる。それ以外の改行は文の区切りとして残す。
    pub fn new(src: &'s str, tokens: Vec<Token<'s>>, types: &'t TypeDirectory) -> Self {
        let mut depth = 0i32;
        let mut ts: Vec<Token<'s>> = Vec::with_capacity(tokens.len());
        for t in tokens {
            match t.kind {
                _ if t.is_trivia() => continue,
                TokenKind::ListOpen | TokenKind::GroupOpen => depth += 1,
                TokenKind::ListClose | TokenKind::GroupClose => depth -= 1,
                TokenKind::NewLine => {
                    let continues =
                        matches!(ts.last(), Some(p) if p.kind == TokenKind::Op && p.text != ";");
                    if depth > 0 || continues {
                        continue;
                    }
                }
                _ => {}
            }
            ts.push(t);
        }
        Self {
            src,
            ts,
            i: 0,
            types,
            depth: 0,
        }
    }

    pub(super) fn peek(&self) -> Token<'s> {
        // 末尾は必ず Eof なので範囲外は Eof を返し続ける。
        self.ts
            .get(self.i)
            .or_else(|| self.ts.last())
            .copied()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, "", self.src.len()))
    }

    pub(super) fn peek_at(&self, offset: usize) -> Option<Token<'s>> {
        self.ts.get(self.i + offset).copied()
    }

    pub(super) fn pop_any(&mut self) -> Token<'s> {
        let t = self.peek();
        if self.i < self.ts.len() {
            self.i += 1;
        }
        t
    }

    pub(super) fn pop(&mut self, kind: TokenKind, what: &str) -> Result<Token<'s>, ParseError> {
        let t = self.peek();
        if t.kind != kind {
            return Err(self.unexpected(&t, what));
        }
        self.i += 1;
        Ok(t)
    }

    pub(super) fn accept(&mut self, kind: TokenKind) -> Option<Token<'s>> {
        if self.peek().kind == kind {
            Some(self.pop_any())
        } else {
            None
        }
    }

    pub(super) fn accept_op(&mut self, sym: &str) -> Option<Token<'s>> {
        let t = self.peek();
        if t.kind == TokenKind::Op && t.text == sym {
            Some(self.pop_any())
        } else {
            None
        }
    }

    pub(super) fn is_type_name(&self, name: &str) -> bool {
        self.types.contains(name)
    }

    pub(super) fn error(&self, code: &'static str, msg: impl Into<String>, pos: usize) -> ParseError {
        ParseError::at(code, msg, self.src, pos)
    }

    pub(super) fn unexpected(&self, t: &Token<'_>, what: &str) -> ParseError {
        let found = match t.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::NewLine => "line break".to_string(),
            _ => format!("{:?}", t.text),
        };
        self.error("PAR001", format!("expected {} but found {}", what, found), t.pos)
    }

    fn is_separator(t: &Token<'_>) -> bool {
        t.kind == TokenKind::NewLine || (t.kind == TokenKind::Op && t.text == ";")
    }

    /// トップレベル文の並びを解析する。
    pub fn parse_program(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut stmts = Vec::new();
        loop {
            while Self::is_separator(&self.peek()) {
                self.pop_any();
            }
            if self.peek().kind == TokenKind::Eof {
                break;
            }
            stmts.push(self.parse_stmt()?);
            let t = self.peek();
            if !Self::is_separator(&t) && t.kind != TokenKind::Eof {
                return Err(self.unexpected(&t, "';' or end of line"));
            }
        }
        Ok(stmts)
    }
}

/// 入力が次の行へ続くべきかを判定する。
///
/// 開き括弧が残っている場合と、`;` 以外の演算子で終わっている場合に真となる。
pub(crate) fn is_incomplete(tokens: &[Token<'_>]) -> bool {
    let mut depth = 0i32;
    for t in tokens {
        match t.kind {
            TokenKind::ListOpen | TokenKind::GroupOpen => depth += 1,
            TokenKind::ListClose | TokenKind::GroupClose => depth -= 1,
            _ => {}
        }
    }
    if depth > 0 {
        return true;
    }
    let last = tokens.iter().rev().find(|t| {
        !matches!(
            t.kind,
            TokenKind::Space | TokenKind::NewLine | TokenKind::Eof
        )
    });
    matches!(last, Some(t) if t.kind == TokenKind::Op && t.text != ";")
}

/// 文字列リテラル（引用符込み）をエスケープ解除した値へ変換する。
pub(super) fn decode_string(quoted: &str) -> Result<String, &'static str> {
    if quoted.len() < 2 || !quoted.starts_with('"') || !quoted.ends_with('"') {
        return Err("malformed string literal");
    }
    let s = &quoted[1..quoted.len() - 1];
    let mut out = String::new();
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            let Some(e) = chars.next() else {
                return Err("trailing backslash in string literal");
            };
            match e {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                '0' => out.push('\0'),
                _ => out.push(e),
            }
        } else {
            out.push(ch);
        }
    }
    Ok(out)
}

/// 行入力を既存の構文木へ追加する。
///
/// 未完結な入力は `pending` に保留され、新しい式は追加されない。
/// 呼び出し側は呼び出し前の `root.len()` を覚えておき、
/// `Ast::added_since` で今回追加された式を取り出す。
pub fn parse(text: &str, types: &TypeDirectory, tree: Ast) -> Result<Ast, SyntaxError> {
    let mut tree = tree;
    let src = if tree.is_pending() {
        format!("{}\n{}", tree.pending, text)
    } else {
        text.to_string()
    };
    let tokens = tokenize(&src)?;
    if is_incomplete(&tokens) {
        tree.pending = src;
        return Ok(tree);
    }
    let stmts = Parser::new(&src, tokens, types).parse_program()?;
    tree.pending.clear();
    tree.root.extend(stmts.into_iter().map(Rc::new));
    Ok(tree)
}

/// 単一の式を解析する（テストや補助用途）。
pub fn parse_expr(src: &str, types: &TypeDirectory) -> Result<Expr, SyntaxError> {
    let tokens = tokenize(src)?;
    let mut p = Parser::new(src, tokens, types);
    let e = p.parse_expr()?;
    let t = p.peek();
    if t.kind != TokenKind::Eof {
        return Err(p.error("PAR090", "unexpected trailing input", t.pos).into());
    }
    Ok(e)
}
