//! 抽象構文木（AST）
//!
//! 目的:
//! - 構文解析結果を評価器へ渡す中立的な表現に落とし込む。
//!
//! 設計ノート:
//! - `Ast` はセッション全体で蓄積される。行をまたいで継続中の入力は
//!   `pending` に保持し、完結した時点でまとめて解析する。
//! - トップレベル式は `Rc` で共有し、`Ast` の複製を安価に保つ。

use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Unit,
    Int(i64),
    Real(f64),
    Str(String),
    Var(String),
    TypeRef(String),
    List(Vec<Expr>),
    Lambda {
        param: String,
        body: Rc<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    BinOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Bind {
        name: String,
        value: Box<Expr>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    /// 演算子の字面から `BinOp` を引く。
    pub fn from_symbol(sym: &str) -> Option<Self> {
        Some(match sym {
            "+" => BinOp::Add,
            "-" => BinOp::Sub,
            "*" => BinOp::Mul,
            "/" => BinOp::Div,
            "%" => BinOp::Rem,
            "^" => BinOp::Pow,
            "==" => BinOp::Eq,
            "!=" => BinOp::Ne,
            "<" => BinOp::Lt,
            "<=" => BinOp::Le,
            ">" => BinOp::Gt,
            ">=" => BinOp::Ge,
            _ => return None,
        })
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Pow => "^",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
        }
    }
}

/// セッションを通して蓄積される構文木。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ast {
    /// 解析済みのトップレベル式（追記のみ）。
    pub root: Vec<Rc<Expr>>,
    /// 継続待ちの未完結な入力。
    pub pending: String,
}

impl Ast {
    pub fn new() -> Self {
        Self::default()
    }

    /// 前の行の続きを待っているかどうか。
    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// `since` 番目以降に追加されたトップレベル式。
    pub fn added_since(&self, since: usize) -> &[Rc<Expr>] {
        self.root.get(since..).unwrap_or(&[])
    }
}
