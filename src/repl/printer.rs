// パス: src/repl/printer.rs
// 役割: 起動バナーとエラー表示のヘルパ
// 意図: 対話時のメッセージ形式を一箇所にまとめる
// 関連ファイル: src/repl/cmd.rs, src/errors.rs
//! REPL で用いるバナーとエラー出力を集約したモジュール。

use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

use crate::errors::ReplError;

/// 起動時に表示するバナーを書き出す。
pub(crate) fn render_banner<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "ilang REPL {} :: exit または quit で終了",
        env!("CARGO_PKG_VERSION")
    )
}

/// タグ付きのエラーメッセージを書き出す。`color` が真なら赤で表示する。
///
/// 字句エラーは先に入力行とキャレット行を色なしで出し、その下にタグ付きの 1 行を出す。
pub(crate) fn report_error<W: Write>(out: &mut W, err: &ReplError, color: bool) -> io::Result<()> {
    let message = match err {
        ReplError::Lexer(e) => {
            if let Some(marker) = e.0.marker() {
                writeln!(out, "{}", marker)?;
            }
            format!("Lexer Error: {}", e.0.headline())
        }
        other => other.to_string(),
    };
    if color {
        queue!(
            out,
            SetForegroundColor(Color::Red),
            Print(message),
            ResetColor,
            Print("\n")
        )?;
    } else {
        writeln!(out, "{}", message)?;
    }
    out.flush()
}
