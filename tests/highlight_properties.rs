// パス: tests/highlight_properties.rs
// 役割: 表示層の性質（長さ・決定性・型名判定・フォールバック）をランダム入力で検証
// 意図: 入力途中の任意の文字列に対してもハイライトが崩れないことを保証する
// 関連ファイル: src/highlight/live.rs, src/highlight/style.rs, src/highlight/classify.rs
#[path = "test_support.rs"]
mod support;

use ilang::highlight::{classify, highlight, layout, style_for, tag_for, Palette, StyleTag};
use ilang::lexer::{tokenize, Token, TokenKind};
use ilang::typesys::{TypeDescriptor, TypeDirectory};
use proptest::prelude::*;
use support::live_tags;

/// 式言語らしい断片を連結した入力（途中で切れた文字列なども含む）。
fn buffer_strategy() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        "[a-zA-Z_][a-zA-Z0-9_]{0,6}",
        "[0-9]{1,4}(\\.[0-9]{1,3})?",
        Just("\"".to_string()),
        "\"[a-zé名 ]{0,5}\"",
        "[ \t\n]{1,3}",
        prop::sample::select(vec!["+", "-", "->", "==", "(", ")", "[", "]", ",", ";", "^", "$"])
            .prop_map(str::to_string),
        "[λ名前é]{1,3}",
    ];
    prop::collection::vec(piece, 0..12).prop_map(|parts| parts.concat())
}

fn ident_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,8}"
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    /// スタイル列の長さが常に文字数と一致することを確認する。
    #[test]
    fn highlight_len_matches_char_count(buffer in buffer_strategy()) {
        let types = TypeDirectory::prelude();
        for palette in [Palette::EDIT, Palette::ECHO] {
            let styles = highlight(&buffer, &types, &palette);
            prop_assert_eq!(styles.len(), buffer.chars().count());
        }
    }

    /// 任意の Unicode 文字列でも長さの性質が保たれることを確認する。
    #[test]
    fn highlight_len_holds_for_arbitrary_text(buffer in "\\PC{0,40}") {
        let styles = highlight(&buffer, &TypeDirectory::prelude(), &Palette::EDIT);
        prop_assert_eq!(styles.len(), buffer.chars().count());
    }

    /// 字句解析に失敗する入力は全体が既定スタイルになることを検証する。
    #[test]
    fn failed_classification_is_uniform_default(buffer in buffer_strategy()) {
        prop_assume!(tokenize(&buffer).is_err());
        prop_assert!(classify(&buffer).is_fallback());
        let tags = live_tags(&buffer, &TypeDirectory::prelude());
        prop_assert_eq!(tags.len(), buffer.chars().count());
        prop_assert!(tags.iter().all(|t| *t == StyleTag::Default));
    }

    /// 識別子のタグは型ディレクトリへの登録有無だけで切り替わることを確認する。
    #[test]
    fn identifier_tag_flips_with_membership(name in ident_strategy()) {
        let token = Token::new(TokenKind::Id, &name, 0);
        let base = TypeDirectory::prelude();
        let registered = base.clone().register(TypeDescriptor::named(name.clone()));

        let before = tag_for(&token, &base);
        let after = tag_for(&token, &registered);
        prop_assert_eq!(before == StyleTag::TypeName, base.lookup(&name).is_some());
        prop_assert_eq!(after, StyleTag::TypeName);
    }

    /// 同じ引数に対するスタイル写像が決定的であることを確認する。
    #[test]
    fn style_mapping_is_deterministic(buffer in buffer_strategy()) {
        let types = TypeDirectory::prelude();
        prop_assert_eq!(
            highlight(&buffer, &types, &Palette::EDIT),
            highlight(&buffer, &types, &Palette::EDIT)
        );
        if let Ok(tokens) = tokenize(&buffer) {
            for t in &tokens {
                prop_assert_eq!(
                    style_for(t, &types, &Palette::EDIT).tag,
                    style_for(t, &types, &Palette::ECHO).tag
                );
            }
        }
    }

    /// 文字列のエコー表示が中身より 2 文字多いことを検証する。
    #[test]
    fn echoed_string_adds_two_quotes(inner in "[a-z0-9 éλ]{0,12}") {
        let types = TypeDirectory::prelude();
        let quoted = format!("\"{}\"", inner);
        let echo = layout(&quoted, &types, &Palette::ECHO);
        let live = highlight(&inner, &types, &Palette::ECHO);
        prop_assert_eq!(live.len(), inner.chars().count());
        prop_assert_eq!(echo.glyph_count(), live.len() + 2);
    }
}

#[test]
/// すべてのトークン分類が両パレットで定義されたタグへ写ることを確認する。
fn style_mapping_is_total() {
    let types = TypeDirectory::prelude();
    for kind in TokenKind::ALL {
        let token = Token::new(kind, "t", 0);
        for palette in [Palette::EDIT, Palette::ECHO] {
            let style = style_for(&token, &types, &palette);
            assert!(StyleTag::ALL.contains(&style.tag), "{kind:?}");
            assert_eq!(style.color, palette.color(style.tag));
        }
    }
}
