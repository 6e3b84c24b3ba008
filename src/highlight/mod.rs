// パス: src/highlight/mod.rs
// 役割: トークン分類とスタイル割り当てによる表示層のファサード
// 意図: 入力中のハイライトと評価結果のエコー表示で同じ写像を共有する
// 関連ファイル: src/highlight/style.rs, src/highlight/live.rs, src/highlight/echo.rs
//! 表示層モジュール
//!
//! - `classify`: 字句解析器を包み、失敗時は入力全体を 1 つの未分類トークンにする
//! - `style`: トークン → スタイルタグの純粋な写像と 2 種類のパレット
//! - `live`: 編集中バッファの文字ごとのスタイル配列
//! - `echo`: 評価結果の文字列を色付きで端末へ書き出す

pub mod classify;
pub mod echo;
pub mod live;
pub mod style;

pub use classify::{classify, classify_with, Classification};
pub use echo::{layout, render, Echo, Segment};
pub use live::{highlight, LiveHighlighter};
pub use style::{style_for, tag_for, Palette, Style, StyleTag};
