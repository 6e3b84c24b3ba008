//! 評価結果のエコー表示
//!
//! 目的:
//! - 評価結果を表す文字列（型名や値の表示文字列）を再分類し、色付きで書き出す。
//!
//! 仕様要点:
//! - 文字列リテラルは中身と、合成した開き・閉じ引用符の 3 区間に分けて出力する。
//! - 改行トークンは改行として出力し、末尾には常に改行を 1 つ付ける。
//! - 分類に失敗した場合は色を付けずに生の文字列を出力する。
//!
//! 設計ノート:
//! - 出力の組み立て（`layout`）と端末への書き込み（`render`）を分け、
//!   前者だけで表示内容をテストできるようにしている。

use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{Print, ResetColor, SetForegroundColor};

use crate::lexer::TokenKind;
use crate::typesys::TypeDirectory;

use super::classify::{classify, Classification};
use super::style::{style_for, Palette, Style};

const QUOTE: &str = "\"";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text { style: Style, text: &'a str },
    LineBreak,
}

/// エコー表示の組み立て結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Echo<'a> {
    Styled(Vec<Segment<'a>>),
    /// 分類できなかった入力。そのまま出力する。
    Raw(&'a str),
}

impl Echo<'_> {
    /// 改行を除いて出力される文字数。
    pub fn glyph_count(&self) -> usize {
        match self {
            Echo::Styled(segments) => segments
                .iter()
                .map(|s| match s {
                    Segment::Text { text, .. } => text.chars().count(),
                    Segment::LineBreak => 0,
                })
                .sum(),
            Echo::Raw(text) => text.chars().count(),
        }
    }
}

/// `text` をエコー用の区間列へ変換する。
pub fn layout<'a>(text: &'a str, types: &TypeDirectory, palette: &Palette) -> Echo<'a> {
    let tokens = match classify(text) {
        Classification::Tokens(tokens) => tokens,
        Classification::Fallback(_) => return Echo::Raw(text),
    };
    let mut segments = Vec::with_capacity(tokens.len() + 1);
    for token in &tokens {
        let style = style_for(token, types, palette);
        match token.kind {
            TokenKind::Str => {
                segments.push(Segment::Text { style, text: QUOTE });
                segments.push(Segment::Text {
                    style,
                    text: token.content(),
                });
                segments.push(Segment::Text { style, text: QUOTE });
            }
            TokenKind::NewLine => segments.push(Segment::LineBreak),
            TokenKind::Eof | TokenKind::Empty => {}
            _ => segments.push(Segment::Text {
                style,
                text: token.text,
            }),
        }
    }
    segments.push(Segment::LineBreak);
    Echo::Styled(segments)
}

/// `text` を色付きで `out` へ書き出す。`color` が偽なら色指定を省く。
pub fn render<W: Write>(
    out: &mut W,
    text: &str,
    types: &TypeDirectory,
    palette: &Palette,
    color: bool,
) -> io::Result<()> {
    let segments = match layout(text, types, palette) {
        Echo::Styled(segments) => segments,
        Echo::Raw(raw) => {
            writeln!(out, "{}", raw)?;
            return out.flush();
        }
    };
    for segment in segments {
        match segment {
            Segment::Text { text, .. } if text.is_empty() => {}
            Segment::Text { style, text } if color => {
                queue!(out, SetForegroundColor(style.color), Print(text))?;
            }
            Segment::Text { text, .. } => out.write_all(text.as_bytes())?,
            Segment::LineBreak => {
                if color {
                    queue!(out, ResetColor)?;
                }
                out.write_all(b"\n")?;
            }
        }
    }
    out.flush()
}
