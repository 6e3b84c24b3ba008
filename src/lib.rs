// パス: src/lib.rs
// 役割: クレートルート。各モジュールの配線と再公開
// 意図: 字句解析から表示層までの公開 API を最小限にまとめる
// 関連ファイル: src/highlight/mod.rs, src/repl/mod.rs, src/parser/mod.rs
//! ilang ルートモジュール
//!
//! 目的:
//! - 小さな式言語の対話シェルを提供する。入力中はトークン単位で色付けし、
//!   評価結果も同じ写像で色付けしてエコー表示する。
//!
//! 方針:
//! - コメント/ドキュメントは日本語、識別子は英語。
//! - 構文木・評価環境・型ディレクトリは値として受け渡し、共有の可変状態を持たない。
//! - 表示層（`highlight`）は字句解析の失敗を外へ伝播させない。

pub mod ast;
pub mod errors;
pub mod evaluator;
pub mod highlight;
pub mod lexer;
pub mod parser;
pub mod repl;
mod stack;
pub mod typesys;

pub use crate::errors::{EvalError, LexerError, ParseError, ReplError, SyntaxError};
pub use crate::lexer::{tokenize, Token, TokenKind};
pub use crate::parser::{parse, parse_expr};
