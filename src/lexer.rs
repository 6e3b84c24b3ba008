// パス: src/lexer.rs
// 役割: UTF-8 対応の字句解析器とトークン定義を提供する
// 意図: 構文解析とハイライトの双方が同じトークン列を共有できるようにする
// 関連ファイル: src/parser/mod.rs, src/highlight/classify.rs, src/errors.rs
//! 字句解析モジュール
//!
//! - 空白・改行も含めて入力を欠落なくトークンへ分割する（可逆）。
//!   全トークンの `text` を連結すると入力と一致するため、ハイライトは
//!   トークンを順に展開するだけで文字数と一致する配列を得られる。
//! - トークンは入力文字列を借用し、バイト位置 `pos` を保持する。
//! - 正規表現ライブラリを使わず、標準ライブラリのみで実装する。

use crate::errors::LexerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// 生成されたトークン。`text` は入力の該当区間をそのまま指す。
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// 字句解析で識別されるトークンの分類（閉じた列挙）。
pub enum TokenKind {
    ListOpen,
    ListClose,
    GroupOpen,
    GroupClose,
    Space,
    NewLine,
    Id,
    Int,
    Real,
    Str,
    Op,
    Eof,
    // 番兵。字句解析器自身は生成しない。
    Empty,
    // 分類に失敗した入力全体を包むトークン（classify のフォールバック専用）。
    Unclassified,
}

impl TokenKind {
    /// すべての分類を列挙する。網羅性を確かめるテストで使う。
    pub const ALL: [TokenKind; 14] = [
        TokenKind::ListOpen,
        TokenKind::ListClose,
        TokenKind::GroupOpen,
        TokenKind::GroupClose,
        TokenKind::Space,
        TokenKind::NewLine,
        TokenKind::Id,
        TokenKind::Int,
        TokenKind::Real,
        TokenKind::Str,
        TokenKind::Op,
        TokenKind::Eof,
        TokenKind::Empty,
        TokenKind::Unclassified,
    ];
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str, pos: usize) -> Self {
        Self { kind, text, pos }
    }

    /// 文字列リテラルの場合は両端の引用符を除いた中身を返す。
    /// それ以外のトークンでは `text` をそのまま返す。
    pub fn content(&self) -> &'a str {
        if self.kind == TokenKind::Str && self.text.len() >= 2 {
            &self.text[1..self.text.len() - 1]
        } else {
            self.text
        }
    }

    /// 構文上意味を持たない空白系トークンかどうか。
    pub fn is_trivia(&self) -> bool {
        self.kind == TokenKind::Space
    }
}

/// 2 文字演算子。1 文字演算子より先に照合する（最長一致）。
const MULTI_CHAR_OPS: &[&str] = &["->", "=>", "==", "!=", "<=", ">="];

/// 1 文字演算子。
const SINGLE_CHAR_OPS: &[char] = &[
    '+', '-', '*', '/', '%', '^', '=', '<', '>', '!', ',', ';', ':', '.',
];

/// 横方向の空白かどうかを判定するユーティリティ（改行は別トークン）。
fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r')
}
/// 10 進数字かどうかを判定するユーティリティ。
fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}
/// 識別子の先頭に使用可能な文字かどうかを判定する。
fn is_letter(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}
/// 識別子の後続として許容される文字か判定する。
fn is_ident_rest(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

struct Lexer<'a> {
    src: &'a str,
    cursor: usize,
    len: usize,
    tokens: Vec<Token<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            cursor: 0,
            len: src.len(),
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token<'a>>, LexerError> {
        while let Some(ch) = self.peek_char() {
            self.lex_token(ch)?;
        }
        self.tokens.push(Token::new(TokenKind::Eof, "", self.len));
        Ok(self.tokens)
    }

    fn lex_token(&mut self, ch: char) -> Result<(), LexerError> {
        let start = self.cursor;
        if is_space(ch) {
            self.advance_while(is_space);
            self.push(TokenKind::Space, start);
            return Ok(());
        }
        if ch == '\n' {
            self.advance_char();
            self.push(TokenKind::NewLine, start);
            return Ok(());
        }
        if let Some(kind) = bracket_kind(ch) {
            self.advance_char();
            self.push(kind, start);
            return Ok(());
        }
        if ch == '"' {
            return self.lex_string_literal();
        }
        if is_digit(ch) {
            self.lex_number();
            return Ok(());
        }
        if is_letter(ch) {
            self.advance_while(is_ident_rest);
            self.push(TokenKind::Id, start);
            return Ok(());
        }
        if self.try_operator(ch) {
            return Ok(());
        }
        Err(self.err("LEX090", format!("unexpected character {:?}", ch), start))
    }

    fn try_operator(&mut self, first: char) -> bool {
        let start = self.cursor;
        if let Some(op) = MULTI_CHAR_OPS.iter().find(|op| self.starts_with(op)) {
            self.cursor += op.len();
            self.push(TokenKind::Op, start);
            return true;
        }
        if SINGLE_CHAR_OPS.contains(&first) {
            self.advance_char();
            self.push(TokenKind::Op, start);
            return true;
        }
        false
    }

    fn lex_string_literal(&mut self) -> Result<(), LexerError> {
        let start = self.cursor;
        self.advance_char(); // 開始ダブルクォート
        let mut escaped = false;
        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    return Err(self.err("LEX003", "unterminated string literal", start));
                }
                Some(ch) => {
                    self.advance_char();
                    if escaped {
                        escaped = false;
                    } else if ch == '\\' {
                        escaped = true;
                    } else if ch == '"' {
                        break;
                    }
                }
            }
        }
        self.push(TokenKind::Str, start);
        Ok(())
    }

    fn lex_number(&mut self) {
        let start = self.cursor;
        self.advance_while(is_digit);

        let mut is_real = false;
        if self.peek_char() == Some('.') && self.peek_second_char().is_some_and(is_digit) {
            is_real = true;
            self.advance_char(); // '.'
            self.advance_while(is_digit);
        }

        if let Some('e') | Some('E') = self.peek_char() {
            let mut idx = self.cursor + 1;
            if let Some('+') | Some('-') = self.char_at(idx) {
                idx += 1;
            }
            let digits = self.src[idx..].chars().take_while(|c| is_digit(*c)).count();
            if digits > 0 {
                is_real = true;
                self.cursor = idx + digits;
            }
        }

        let kind = if is_real {
            TokenKind::Real
        } else {
            TokenKind::Int
        };
        self.push(kind, start);
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens
            .push(Token::new(kind, &self.src[start..self.cursor], start));
    }

    fn peek_char(&self) -> Option<char> {
        self.char_at(self.cursor)
    }

    fn peek_second_char(&self) -> Option<char> {
        let mut iter = self.src[self.cursor..].chars();
        iter.next()?;
        iter.next()
    }

    fn char_at(&self, idx: usize) -> Option<char> {
        if idx >= self.len {
            None
        } else {
            self.src[idx..].chars().next()
        }
    }

    fn advance_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.cursor += ch.len_utf8();
        Some(ch)
    }

    fn advance_while(&mut self, pred: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek_char() {
            if !pred(ch) {
                break;
            }
            self.cursor += ch.len_utf8();
        }
    }

    fn starts_with(&self, pattern: &str) -> bool {
        self.src[self.cursor..].starts_with(pattern)
    }

    fn err(&self, code: &'static str, message: impl Into<String>, pos: usize) -> LexerError {
        LexerError::at(code, message, self.src, pos)
    }
}

fn bracket_kind(ch: char) -> Option<TokenKind> {
    match ch {
        '[' => Some(TokenKind::ListOpen),
        ']' => Some(TokenKind::ListClose),
        '(' => Some(TokenKind::GroupOpen),
        ')' => Some(TokenKind::GroupClose),
        _ => None,
    }
}

/// 入力全体をトークン列へ変換する。末尾には必ず `Eof` が付く。
pub fn tokenize(src: &str) -> Result<Vec<Token<'_>>, LexerError> {
    Lexer::new(src).run()
}
