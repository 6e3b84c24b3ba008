//! 入力中のハイライト
//!
//! 編集バッファ全体をキー入力のたびに先頭から分類し直し、文字ごとのスタイル列を返す。
//! 出力の長さは常にバッファの文字数（バイト数ではない）に一致する。

use crate::typesys::TypeDirectory;

use super::classify::classify;
use super::style::{style_for, Palette, Style};

/// `buffer` の各文字に対応するスタイルを返す。
///
/// 字句解析に失敗した場合もフォールバックトークンが全体を覆うため、
/// 長さの保証は崩れない（全要素が既定スタイルになる）。
pub fn highlight(buffer: &str, types: &TypeDirectory, palette: &Palette) -> Vec<Style> {
    let classified = classify(buffer);
    let mut out = Vec::with_capacity(buffer.len());
    for token in classified.tokens() {
        let style = style_for(token, types, palette);
        out.extend(token.text.chars().map(|_| style));
    }
    out
}

/// 型ディレクトリとパレットを束ねたハイライタ。行エディタのコールバックとして使う。
#[derive(Debug, Clone, Copy)]
pub struct LiveHighlighter<'a> {
    pub types: &'a TypeDirectory,
    pub palette: &'a Palette,
}

impl<'a> LiveHighlighter<'a> {
    pub fn new(types: &'a TypeDirectory, palette: &'a Palette) -> Self {
        Self { types, palette }
    }

    pub fn highlight(&self, buffer: &str) -> Vec<Style> {
        highlight(buffer, self.types, self.palette)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::style::StyleTag;
    use crate::typesys::TypeDescriptor;

    fn tags(buffer: &str, types: &TypeDirectory) -> Vec<StyleTag> {
        highlight(buffer, types, &Palette::EDIT)
            .into_iter()
            .map(|s| s.tag)
            .collect()
    }

    #[test]
    /// `1 + 2` が 5 文字分のスタイルに展開されることを確認する。
    fn sum_expression_styles_each_char() {
        let types = TypeDirectory::prelude();
        assert_eq!(
            tags("1 + 2", &types),
            vec![
                StyleTag::Number,
                StyleTag::Default,
                StyleTag::Operator,
                StyleTag::Default,
                StyleTag::Number,
            ]
        );
    }

    #[test]
    /// 空の入力では空のスタイル列を返すことを確認する。
    fn empty_buffer_yields_nothing() {
        assert!(highlight("", &TypeDirectory::prelude(), &Palette::EDIT).is_empty());
    }

    #[test]
    /// 多バイト文字を含む入力で文字数ぶんのスタイルが返るか検証する。
    fn multibyte_chars_get_one_slot_each() {
        let types = TypeDirectory::prelude();
        let buffer = "名前 = \"héllo\"";
        let styles = highlight(buffer, &types, &Palette::EDIT);
        assert_eq!(styles.len(), buffer.chars().count());
        assert_eq!(styles[0].tag, StyleTag::Identifier);
        assert!(styles[5..].iter().all(|s| s.tag == StyleTag::StringLiteral));
    }

    #[test]
    /// 入力途中の不正な文字列でも全体が既定スタイルで覆われることを確認する。
    fn unterminated_string_falls_back_to_default() {
        let types = TypeDirectory::prelude();
        let buffer = "x = \"abc";
        let t = tags(buffer, &types);
        assert_eq!(t.len(), buffer.chars().count());
        assert!(t.iter().all(|tag| *tag == StyleTag::Default));
    }

    #[test]
    /// 型名と通常の識別子が区別されることを確認する。
    fn type_names_are_distinguished() {
        let types = TypeDirectory::prelude().register(TypeDescriptor::named("Point"));
        let t = tags("Point(p)", &types);
        assert!(t[..5].iter().all(|tag| *tag == StyleTag::TypeName));
        assert_eq!(t[5], StyleTag::Punctuation);
        assert_eq!(t[6], StyleTag::Identifier);
    }

    #[test]
    /// 改行を含むバッファでも文字数と一致するか確認する。
    fn newline_keeps_alignment() {
        let types = TypeDirectory::prelude();
        let h = LiveHighlighter::new(&types, &Palette::EDIT);
        let styles = h.highlight("(1 +\n2)");
        assert_eq!(styles.len(), 7);
        assert_eq!(styles[4].tag, StyleTag::Default);
    }
}
