// パス: src/repl/mod.rs
// 役割: REPL モジュールのファサードと再公開
// 意図: 対話環境の入口だけを公開し、内部の構成を隠す
// 関連ファイル: src/repl/cmd.rs, src/repl/config.rs, src/bin/ilang.rs
//! 対話環境を構成するモジュール群をまとめたファサード。
//!
//! - `cmd`: セッションの状態遷移とメインループ
//! - `config`: コマンドライン引数とパレット設定
//! - `line_editor`: 端末の行編集
//! - `printer`: バナーとエラー表示

pub mod cmd;
pub mod config;
pub mod line_editor;
mod printer;

pub use cmd::{run_repl, run_repl_with, EchoResult, ReplLineSource, Session, SessionState, Step};
pub use config::{Cli, ColorChoice, ConfigError, ReplConfig};
pub use line_editor::{EditorHelper, LineEditor, ReadResult};
