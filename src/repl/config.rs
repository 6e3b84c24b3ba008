// パス: src/repl/config.rs
// 役割: コマンドライン引数とパレット設定ファイルの読み込み
// 意図: 表示まわりの設定を REPL 本体から切り離して検証できるようにする
// 関連ファイル: src/bin/ilang.rs, src/highlight/style.rs
//! REPL の設定。
//!
//! - `Cli`: `clap` で解析するコマンドライン引数（バイナリからのみ使う）
//! - `ReplConfig`: 解決済みの設定。パレット 2 種、色の有無、失敗時の方針を持つ
//! - パレット設定ファイルは JSON。未指定のキーは既定パレットの値を保つ。
//!
//! ```json
//! { "edit": { "number": "yellow" }, "echo": { "type_name": "#ffa500" } }
//! ```

use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use crossterm::style::Color;
use serde::Deserialize;
use thiserror::Error;

use crate::highlight::{Palette, StyleTag};

#[derive(Debug, Parser)]
#[command(name = "ilang", version, about = "Interactive shell for a small expression language")]
pub struct Cli {
    /// 色付けの方針
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// パレットを上書きする JSON ファイル
    #[arg(long, value_name = "FILE")]
    pub palette: Option<PathBuf>,

    /// 構文・評価エラーで対話を終了する
    #[arg(long)]
    pub fail_fast: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// `Auto` は標準出力が端末かどうかで決める。
    pub fn resolve(self) -> bool {
        match self {
            ColorChoice::Auto => io::stdout().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read palette file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid palette file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown colour {0:?} (expected a colour name or #rrggbb)")]
    Color(String),
}

/// 解決済みの REPL 設定。既定値では色を付けない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplConfig {
    pub edit_palette: Palette,
    pub echo_palette: Palette,
    pub color: bool,
    pub fail_fast: bool,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            edit_palette: Palette::EDIT,
            echo_palette: Palette::ECHO,
            color: false,
            fail_fast: false,
        }
    }
}

impl ReplConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = Self {
            color: cli.color.resolve(),
            fail_fast: cli.fail_fast,
            ..Self::default()
        };
        if let Some(path) = &cli.palette {
            config = config.with_palette_file(path)?;
        }
        Ok(config)
    }

    pub fn with_palette_file(self, path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.with_palette_json(&text)
    }

    /// JSON で指定された色を既存のパレットへ上書きする。
    pub fn with_palette_json(mut self, text: &str) -> Result<Self, ConfigError> {
        let file: PaletteFile = serde_json::from_str(text)?;
        file.edit.apply(&mut self.edit_palette)?;
        file.echo.apply(&mut self.echo_palette)?;
        Ok(self)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PaletteFile {
    #[serde(default)]
    edit: PaletteOverrides,
    #[serde(default)]
    echo: PaletteOverrides,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PaletteOverrides {
    default: Option<String>,
    punctuation: Option<String>,
    identifier: Option<String>,
    type_name: Option<String>,
    number: Option<String>,
    string: Option<String>,
    operator: Option<String>,
}

impl PaletteOverrides {
    fn get(&self, tag: StyleTag) -> Option<&str> {
        let slot = match tag {
            StyleTag::Default => &self.default,
            StyleTag::Punctuation => &self.punctuation,
            StyleTag::Identifier => &self.identifier,
            StyleTag::TypeName => &self.type_name,
            StyleTag::Number => &self.number,
            StyleTag::StringLiteral => &self.string,
            StyleTag::Operator => &self.operator,
        };
        slot.as_deref()
    }

    fn apply(&self, palette: &mut Palette) -> Result<(), ConfigError> {
        for tag in StyleTag::ALL {
            if let Some(name) = self.get(tag) {
                palette.set_color(tag, parse_color(name)?);
            }
        }
        Ok(())
    }
}

/// 色名（`dark_yellow` など）または `#rrggbb` を解釈する。
pub fn parse_color(text: &str) -> Result<Color, ConfigError> {
    let bad = || ConfigError::Color(text.to_string());
    let name = text.trim().to_ascii_lowercase();
    if let Some(hex) = name.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(bad());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad());
        return Ok(Color::Rgb {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        });
    }
    Ok(match name.as_str() {
        "reset" => Color::Reset,
        "black" => Color::Black,
        "dark_grey" | "dark_gray" => Color::DarkGrey,
        "red" => Color::Red,
        "dark_red" => Color::DarkRed,
        "green" => Color::Green,
        "dark_green" => Color::DarkGreen,
        "yellow" => Color::Yellow,
        "dark_yellow" => Color::DarkYellow,
        "blue" => Color::Blue,
        "dark_blue" => Color::DarkBlue,
        "magenta" => Color::Magenta,
        "dark_magenta" => Color::DarkMagenta,
        "cyan" => Color::Cyan,
        "dark_cyan" => Color::DarkCyan,
        "white" => Color::White,
        "grey" | "gray" => Color::Grey,
        _ => return Err(bad()),
    })
}
