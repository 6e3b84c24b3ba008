//! 字句解析器を包むトークン分類器。
//!
//! 表示層は入力途中の不完全な文字列も扱うため、分類の失敗を呼び出し側へ
//! 伝播させない。失敗時は入力全体を覆う `Unclassified` トークン 1 つを返し、
//! 呼び出し側はそれを既定スタイルで塗るだけでよい。

use tracing::trace;

use crate::errors::LexerError;
use crate::lexer::{tokenize, Token, TokenKind};

/// 分類結果。成功時のトークン列と、失敗時の代替トークンを型で区別する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification<'a> {
    Tokens(Vec<Token<'a>>),
    Fallback(Token<'a>),
}

impl<'a> Classification<'a> {
    /// どちらの場合でも走査できるトークン列を返す。
    pub fn tokens(&self) -> &[Token<'a>] {
        match self {
            Classification::Tokens(tokens) => tokens,
            Classification::Fallback(token) => std::slice::from_ref(token),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Classification::Fallback(_))
    }
}

/// 既定の字句解析器で `text` を分類する。
pub fn classify(text: &str) -> Classification<'_> {
    classify_with(text, tokenize)
}

/// 任意の字句解析関数で `text` を分類する。失敗は代替トークンへ変換される。
pub fn classify_with<'a, F>(text: &'a str, lex: F) -> Classification<'a>
where
    F: FnOnce(&'a str) -> Result<Vec<Token<'a>>, LexerError>,
{
    match lex(text) {
        Ok(tokens) => Classification::Tokens(tokens),
        Err(err) => {
            trace!(error = %err, "classification fell back to a single unclassified token");
            Classification::Fallback(Token::new(TokenKind::Unclassified, text, 0))
        }
    }
}
