//! トークンからスタイルへの写像とパレット
//!
//! 目的:
//! - トークンの種類（と識別子が型名かどうか）だけで決まる純粋な写像を提供する。
//! - 同じタグでも表示の文脈ごとに色を変えられるよう、パレットを 2 つ用意する。
//!   - `Palette::EDIT`: 入力中のハイライト用
//!   - `Palette::ECHO`: 評価結果のエコー表示用
//!
//! 設計ノート:
//! - `tag_for` はワイルドカードを使わずに全分類を列挙する。分類が増えたら
//!   コンパイルエラーで気付けるようにするため。

use crossterm::style::Color;

use crate::lexer::{Token, TokenKind};
use crate::typesys::TypeDirectory;

/// 意味的なスタイルの分類。具体的な色はパレットが決める。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleTag {
    Default,
    Punctuation,
    Identifier,
    TypeName,
    Number,
    StringLiteral,
    Operator,
}

impl StyleTag {
    pub const ALL: [StyleTag; 7] = [
        StyleTag::Default,
        StyleTag::Punctuation,
        StyleTag::Identifier,
        StyleTag::TypeName,
        StyleTag::Number,
        StyleTag::StringLiteral,
        StyleTag::Operator,
    ];

    /// パレット設定ファイルで使うキー名。
    pub fn key(self) -> &'static str {
        match self {
            StyleTag::Default => "default",
            StyleTag::Punctuation => "punctuation",
            StyleTag::Identifier => "identifier",
            StyleTag::TypeName => "type_name",
            StyleTag::Number => "number",
            StyleTag::StringLiteral => "string",
            StyleTag::Operator => "operator",
        }
    }
}

/// タグとパレットで解決された具体的な色の組。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub tag: StyleTag,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub default: Color,
    pub punctuation: Color,
    pub identifier: Color,
    pub type_name: Color,
    pub number: Color,
    pub string: Color,
    pub operator: Color,
}

const WHITE: Color = Color::Rgb {
    r: 0xff,
    g: 0xff,
    b: 0xff,
};

impl Palette {
    /// 入力中のハイライト。記号と演算子は端末の標準白（灰色寄り）で区別する。
    pub const EDIT: Palette = Palette {
        default: Color::Reset,
        punctuation: Color::Grey,
        identifier: Color::Cyan,
        type_name: Color::Red,
        number: Color::Green,
        string: Color::Magenta,
        operator: Color::Grey,
    };

    /// 評価結果のエコー。記号・演算子・通常の識別子はすべて白で表示する。
    pub const ECHO: Palette = Palette {
        default: WHITE,
        punctuation: WHITE,
        identifier: WHITE,
        type_name: Color::Rgb {
            r: 0xff,
            g: 0x8c,
            b: 0x00,
        },
        number: Color::Rgb {
            r: 0x90,
            g: 0xee,
            b: 0x90,
        },
        string: Color::Rgb {
            r: 0xff,
            g: 0x00,
            b: 0xff,
        },
        operator: WHITE,
    };

    pub fn color(&self, tag: StyleTag) -> Color {
        match tag {
            StyleTag::Default => self.default,
            StyleTag::Punctuation => self.punctuation,
            StyleTag::Identifier => self.identifier,
            StyleTag::TypeName => self.type_name,
            StyleTag::Number => self.number,
            StyleTag::StringLiteral => self.string,
            StyleTag::Operator => self.operator,
        }
    }

    pub fn set_color(&mut self, tag: StyleTag, color: Color) {
        let slot = match tag {
            StyleTag::Default => &mut self.default,
            StyleTag::Punctuation => &mut self.punctuation,
            StyleTag::Identifier => &mut self.identifier,
            StyleTag::TypeName => &mut self.type_name,
            StyleTag::Number => &mut self.number,
            StyleTag::StringLiteral => &mut self.string,
            StyleTag::Operator => &mut self.operator,
        };
        *slot = color;
    }

    pub fn style(&self, tag: StyleTag) -> Style {
        Style {
            tag,
            color: self.color(tag),
        }
    }
}

/// トークンの意味的なスタイルタグを求める。
///
/// 識別子だけは型ディレクトリを参照し、既知の型名なら `TypeName` になる。
pub fn tag_for(token: &Token<'_>, types: &TypeDirectory) -> StyleTag {
    match token.kind {
        TokenKind::ListOpen
        | TokenKind::ListClose
        | TokenKind::GroupOpen
        | TokenKind::GroupClose => StyleTag::Punctuation,
        TokenKind::Space
        | TokenKind::NewLine
        | TokenKind::Eof
        | TokenKind::Empty
        | TokenKind::Unclassified => StyleTag::Default,
        TokenKind::Id => {
            if types.contains(token.text) {
                StyleTag::TypeName
            } else {
                StyleTag::Identifier
            }
        }
        TokenKind::Int | TokenKind::Real => StyleTag::Number,
        TokenKind::Str => StyleTag::StringLiteral,
        TokenKind::Op => StyleTag::Operator,
    }
}

/// トークンをパレットで色付けしたスタイルを返す。
pub fn style_for(token: &Token<'_>, types: &TypeDirectory, palette: &Palette) -> Style {
    palette.style(tag_for(token, types))
}
