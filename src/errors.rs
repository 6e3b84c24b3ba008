//! エラー型の定義（共通フォーマット: \[CODE\] メッセージ @col=N / @pos=N）。
//!
//! 字句解析・構文解析・評価の各段階ごとに別の型を持ち、REPL ループでは
//! `ReplError` にまとめてタグ付きで表示する。

use std::fmt::{self, Display, Formatter};
use std::io;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub msg: String,
    pub pos: Option<usize>,      // バイトオフセット（任意）
    pub col: Option<usize>,      // 1-origin の文字単位の桁（任意）
    pub snippet: Option<String>, // エラー行のスニペット（任意）
}

impl ErrorInfo {
    pub fn new(code: &'static str, msg: impl Into<String>, pos: Option<usize>) -> Self {
        Self {
            code,
            msg: msg.into(),
            pos,
            col: None,
            snippet: None,
        }
    }

    /// `src` 上のバイト位置から桁とスニペットを補完した情報を構築する。
    pub fn located(code: &'static str, msg: impl Into<String>, src: &str, pos: usize) -> Self {
        let pos = pos.min(src.len());
        let line_start = src[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let line_end = src[pos..].find('\n').map(|i| pos + i).unwrap_or(src.len());
        let col = src[line_start..pos].chars().count() + 1;
        Self {
            code,
            msg: msg.into(),
            pos: Some(pos),
            col: Some(col),
            snippet: Some(src[line_start..line_end].to_string()),
        }
    }
}

impl ErrorInfo {
    /// スニペットを除いた 1 行目（`[CODE] メッセージ @col=N`）。
    pub fn headline(&self) -> String {
        match (self.col, self.pos) {
            (Some(c), _) => format!("[{}] {} @col={}", self.code, self.msg, c),
            (None, Some(p)) => format!("[{}] {} @pos={}", self.code, self.msg, p),
            _ => format!("[{}] {}", self.code, self.msg),
        }
    }

    /// エラー行のスニペットと、その桁を指すキャレット行。
    pub fn marker(&self) -> Option<String> {
        let (s, c) = (self.snippet.as_ref()?, self.col?);
        Some(format!("{}\n{}^", s, " ".repeat(c.saturating_sub(1))))
    }
}

impl Display for ErrorInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.headline())?;
        if let Some(marker) = self.marker() {
            write!(f, "\n{}", marker)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct LexerError(pub ErrorInfo);

impl LexerError {
    pub fn at(code: &'static str, msg: impl Into<String>, src: &str, pos: usize) -> Self {
        Self(ErrorInfo::located(code, msg, src, pos))
    }

    /// エラー位置の桁（1-origin）。
    pub fn col(&self) -> Option<usize> {
        self.0.col
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ParseError(pub ErrorInfo);

impl ParseError {
    pub fn new(code: &'static str, msg: impl Into<String>, pos: Option<usize>) -> Self {
        Self(ErrorInfo::new(code, msg, pos))
    }

    pub fn at(code: &'static str, msg: impl Into<String>, src: &str, pos: usize) -> Self {
        Self(ErrorInfo::located(code, msg, src, pos))
    }
}

/// `parse` が返す失敗。字句段階と構文段階を区別したまま運ぶ。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexerError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EvalError(pub ErrorInfo);

impl EvalError {
    pub fn new(code: &'static str, msg: impl Into<String>) -> Self {
        Self(ErrorInfo::new(code, msg, None))
    }
}

/// REPL の 1 行処理で発生しうる失敗をまとめた列挙体。
#[derive(Debug, Error)]
pub enum ReplError {
    #[error("Lexer Error: {0}")]
    Lexer(#[from] LexerError),
    #[error("Parser Error: {0}")]
    Parser(#[from] ParseError),
    #[error("Evaluation Error: {0}")]
    Evaluation(#[from] EvalError),
    #[error("I/O Error: {0}")]
    Io(#[from] io::Error),
}

impl From<SyntaxError> for ReplError {
    fn from(err: SyntaxError) -> Self {
        match err {
            SyntaxError::Lex(e) => ReplError::Lexer(e),
            SyntaxError::Parse(e) => ReplError::Parser(e),
        }
    }
}

impl ReplError {
    /// 表示用のタグ（`Lexer` / `Parser` / `Evaluation` / `I/O`）。
    pub fn tag(&self) -> &'static str {
        match self {
            ReplError::Lexer(_) => "Lexer",
            ReplError::Parser(_) => "Parser",
            ReplError::Evaluation(_) => "Evaluation",
            ReplError::Io(_) => "I/O",
        }
    }
}
