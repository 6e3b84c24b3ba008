// パス: src/repl/line_editor.rs
// 役割: 履歴・カーソル移動・ハイライトに対応した端末ラインエディタ
// 意図: キー入力ごとに行を再描画し、文字単位のスタイルで色付けする
// 関連ファイル: src/repl/cmd.rs, src/highlight/live.rs
use std::io::{self, IsTerminal, Write};

use crossterm::cursor::MoveToColumn;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::queue;
use crossterm::style::{Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::highlight::Style;

/// 行入力が返す 3 種類の結果を表す列挙体。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadResult {
    Line(String),
    Eof,
    Interrupted,
}

/// 編集中のバッファに対して呼ばれるコールバック群。
pub trait EditorHelper {
    /// バッファの各文字に対応するスタイル。長さは文字数と一致させる。
    fn highlight(&self, buffer: &str) -> Vec<Style>;
    /// カーソル位置に挿入できる補完候補。
    fn complete(&self, buffer: &str, cursor: usize) -> Vec<String>;
}

/// 履歴付きの行編集を提供する簡易ラインエディタ。
pub struct LineEditor {
    history: History,
    color: bool,
}

impl LineEditor {
    pub fn new(color: bool) -> Self {
        Self {
            history: History::new(DEFAULT_HISTORY_SIZE),
            color,
        }
    }

    /// プロンプトを出力し、1 行分の入力または制御シグナルを取得する。
    ///
    /// 標準入力が端末でない場合は、色付けも行編集もしない単純な読み取りになる。
    pub fn read_line(&mut self, prompt: &str, helper: &dyn EditorHelper) -> io::Result<ReadResult> {
        if io::stdin().is_terminal() {
            self.read_line_raw(prompt, helper)
        } else {
            self.read_line_fallback(prompt)
        }
    }

    /// 入力文字列を履歴へ追加し、重複や空行を除外する。
    pub fn add_history(&mut self, entry: &str) {
        self.history.add(entry);
    }

    fn read_line_fallback(&mut self, prompt: &str) -> io::Result<ReadResult> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;
        let mut line = String::new();
        let bytes = io::stdin().read_line(&mut line)?;
        if bytes == 0 {
            return Ok(ReadResult::Eof);
        }
        if line.ends_with('\n') {
            line.pop();
        }
        if line.ends_with('\r') {
            line.pop();
        }
        Ok(ReadResult::Line(line))
    }

    /// 端末を Raw モードに切り替えて対話入力を処理する。
    fn read_line_raw(&mut self, prompt: &str, helper: &dyn EditorHelper) -> io::Result<ReadResult> {
        let _raw = RawMode::enable()?;
        let mut stdout = io::stdout();
        let mut session = EditorSession::new(&self.history);
        let redraw = |out: &mut io::Stdout, session: &EditorSession<'_>| {
            let styles = if self.color {
                helper.highlight(&session.text())
            } else {
                Vec::new()
            };
            refresh_line(out, prompt, session.buffer(), session.cursor(), &styles)
        };
        redraw(&mut stdout, &session)?;

        loop {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind == KeyEventKind::Release {
                continue;
            }
            let changed = match interpret_key(&key) {
                EditAction::Submit => {
                    write!(stdout, "\r\n")?;
                    stdout.flush()?;
                    return Ok(ReadResult::Line(session.into_string()));
                }
                EditAction::Interrupt => {
                    write!(stdout, "^C\r\n")?;
                    stdout.flush()?;
                    return Ok(ReadResult::Interrupted);
                }
                EditAction::Eof => {
                    if session.is_empty() {
                        write!(stdout, "\r\n")?;
                        stdout.flush()?;
                        return Ok(ReadResult::Eof);
                    }
                    false
                }
                EditAction::DeleteLeft => session.delete_left(),
                EditAction::DeleteRight => session.delete_right(),
                EditAction::MoveLeft => session.move_left(),
                EditAction::MoveRight => session.move_right(),
                EditAction::MoveHome => session.move_home(),
                EditAction::MoveEnd => session.move_end(),
                EditAction::HistoryPrev => session.history_prev(),
                EditAction::HistoryNext => session.history_next(),
                EditAction::Complete => {
                    let candidates = helper.complete(&session.text(), session.cursor());
                    match candidates.as_slice() {
                        [only] => {
                            session.insert_str(only);
                            true
                        }
                        _ => false,
                    }
                }
                EditAction::InsertChar(ch) => {
                    session.insert_char(ch);
                    true
                }
                EditAction::Ignore => false,
            };
            if changed {
                redraw(&mut stdout, &session)?;
            }
        }
    }
}

impl Default for LineEditor {
    fn default() -> Self {
        Self::new(false)
    }
}

/// キーイベントを内部の編集操作へ写像する。
fn interpret_key(key: &KeyEvent) -> EditAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => EditAction::Submit,
        KeyCode::Char('c') if ctrl => EditAction::Interrupt,
        KeyCode::Char('d') if ctrl => EditAction::Eof,
        KeyCode::Char('a') if ctrl => EditAction::MoveHome,
        KeyCode::Char('e') if ctrl => EditAction::MoveEnd,
        KeyCode::Backspace => EditAction::DeleteLeft,
        KeyCode::Delete => EditAction::DeleteRight,
        KeyCode::Left => EditAction::MoveLeft,
        KeyCode::Right => EditAction::MoveRight,
        KeyCode::Home => EditAction::MoveHome,
        KeyCode::End => EditAction::MoveEnd,
        KeyCode::Up => EditAction::HistoryPrev,
        KeyCode::Down => EditAction::HistoryNext,
        KeyCode::Tab => EditAction::Complete,
        KeyCode::Char(ch) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
            if ch.is_control() {
                EditAction::Ignore
            } else {
                EditAction::InsertChar(ch)
            }
        }
        _ => EditAction::Ignore,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditAction {
    Submit,
    Interrupt,
    Eof,
    DeleteLeft,
    DeleteRight,
    MoveLeft,
    MoveRight,
    MoveHome,
    MoveEnd,
    HistoryPrev,
    HistoryNext,
    Complete,
    InsertChar(char),
    Ignore,
}

/// 1 行分の編集状態。バッファは文字単位で保持し、カーソルも文字位置で数える。
struct EditorSession<'a> {
    buffer: Vec<char>,
    cursor: usize,
    history_index: usize,
    saved_current: Option<Vec<char>>,
    history: &'a History,
}

impl<'a> EditorSession<'a> {
    fn new(history: &'a History) -> Self {
        Self {
            buffer: Vec::new(),
            cursor: 0,
            history_index: history.len(),
            saved_current: None,
            history,
        }
    }

    fn buffer(&self) -> &[char] {
        &self.buffer
    }

    fn text(&self) -> String {
        self.buffer.iter().collect()
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn insert_char(&mut self, ch: char) {
        self.buffer.insert(self.cursor, ch);
        self.cursor += 1;
        self.reset_history_cursor();
    }

    fn insert_str(&mut self, s: &str) {
        for ch in s.chars() {
            self.insert_char(ch);
        }
    }

    fn delete_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.buffer.remove(self.cursor);
        self.reset_history_cursor();
        true
    }

    fn delete_right(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        self.buffer.remove(self.cursor);
        self.reset_history_cursor();
        true
    }

    fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    fn move_right(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    fn move_home(&mut self) -> bool {
        let moved = self.cursor != 0;
        self.cursor = 0;
        moved
    }

    fn move_end(&mut self) -> bool {
        let moved = self.cursor != self.buffer.len();
        self.cursor = self.buffer.len();
        moved
    }

    fn history_prev(&mut self) -> bool {
        if self.history_index == 0 {
            return false;
        }
        if self.history_index == self.history.len() {
            self.saved_current = Some(self.buffer.clone());
        }
        self.history_index -= 1;
        if let Some(entry) = self.history.get(self.history_index) {
            self.buffer = entry.chars().collect();
            self.cursor = self.buffer.len();
            return true;
        }
        false
    }

    fn history_next(&mut self) -> bool {
        if self.history_index >= self.history.len() {
            return false;
        }
        self.history_index += 1;
        if self.history_index == self.history.len() {
            self.buffer = self.saved_current.take().unwrap_or_default();
        } else if let Some(entry) = self.history.get(self.history_index) {
            self.buffer = entry.chars().collect();
        }
        self.cursor = self.buffer.len();
        true
    }

    fn into_string(self) -> String {
        self.buffer.into_iter().collect()
    }

    fn reset_history_cursor(&mut self) {
        self.history_index = self.history.len();
        self.saved_current = None;
    }
}

/// バッファとカーソル位置に合わせて行全体を再描画する。
///
/// `styles` が空の場合は色を付けない。
fn refresh_line<W: Write>(
    writer: &mut W,
    prompt: &str,
    buffer: &[char],
    cursor: usize,
    styles: &[Style],
) -> io::Result<()> {
    queue!(writer, MoveToColumn(0), Print(prompt))?;
    if styles.is_empty() {
        let rendered: String = buffer.iter().collect();
        queue!(writer, Print(rendered))?;
    } else {
        for (idx, ch) in buffer.iter().enumerate() {
            match styles.get(idx) {
                Some(style) => queue!(writer, SetForegroundColor(style.color), Print(ch))?,
                None => queue!(writer, ResetColor, Print(ch))?,
            }
        }
        queue!(writer, ResetColor)?;
    }
    let target = prompt.width() + display_width(&buffer[..cursor.min(buffer.len())]);
    let column = u16::try_from(target).unwrap_or(u16::MAX);
    queue!(writer, Clear(ClearType::UntilNewLine), MoveToColumn(column))?;
    writer.flush()
}

/// 端末上の表示幅。全角文字は 2 桁、制御文字は 0 桁として数える。
fn display_width(chars: &[char]) -> usize {
    chars.iter().map(|ch| ch.width().unwrap_or(0)).sum()
}

const DEFAULT_HISTORY_SIZE: usize = 1000;

/// セッション中だけ保持する入力履歴。
struct History {
    entries: Vec<String>,
    max_entries: usize,
}

impl History {
    fn new(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
        }
    }

    /// 新しい入力を追加し、空行と直前の重複をスキップする。
    fn add(&mut self, entry: &str) {
        let trimmed = entry.trim();
        if trimmed.is_empty() {
            return;
        }
        if self.entries.last().map(|s| s.as_str()) == Some(trimmed) {
            return;
        }
        if self.entries.len() == self.max_entries {
            self.entries.remove(0);
        }
        self.entries.push(trimmed.to_string());
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn get(&self, idx: usize) -> Option<&str> {
        self.entries.get(idx).map(|s| s.as_str())
    }
}

/// Raw モードへの切り替えと復帰を担う RAII ガード。
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::{Palette, StyleTag};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn history_of(entries: &[&str]) -> History {
        History {
            entries: entries.iter().map(|s| s.to_string()).collect(),
            max_entries: 10,
        }
    }

    #[test]
    /// 同じ入力が連続しても履歴に重複登録されないことを確かめる。
    fn history_add_deduplicates() {
        let mut history = History::new(5);
        history.add("foo");
        history.add("foo");
        history.add("bar");
        assert_eq!(history.entries, vec!["foo", "bar"]);
    }

    #[test]
    /// 空行や末尾空白が履歴から取り除かれることを検証する。
    fn history_add_skips_empty_and_trims() {
        let mut history = History::new(3);
        history.add("   ");
        history.add(" foo ");
        history.add("foo");
        history.add("bar");
        assert_eq!(history.entries, vec!["foo", "bar"]);
    }

    #[test]
    /// 上限を超えた履歴が先頭から削除されることを確認する。
    fn history_respects_max_entries() {
        let mut history = History {
            entries: vec!["0".into(), "1".into(), "2".into()],
            max_entries: 3,
        };
        history.add("3");
        assert_eq!(history.entries, vec!["1", "2", "3"]);
    }

    #[test]
    /// 代表的なキーが編集操作へ変換されることを確認する。
    fn interpret_key_maps_editing_keys() {
        let none = KeyModifiers::NONE;
        assert_eq!(interpret_key(&key(KeyCode::Enter, none)), EditAction::Submit);
        assert_eq!(
            interpret_key(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            EditAction::Interrupt
        );
        assert_eq!(
            interpret_key(&key(KeyCode::Char('d'), KeyModifiers::CONTROL)),
            EditAction::Eof
        );
        assert_eq!(interpret_key(&key(KeyCode::Tab, none)), EditAction::Complete);
        assert_eq!(interpret_key(&key(KeyCode::Delete, none)), EditAction::DeleteRight);
        assert_eq!(interpret_key(&key(KeyCode::Home, none)), EditAction::MoveHome);
        assert_eq!(
            interpret_key(&key(KeyCode::Char('λ'), KeyModifiers::SHIFT)),
            EditAction::InsertChar('λ')
        );
        assert_eq!(
            interpret_key(&key(KeyCode::Char('x'), KeyModifiers::ALT)),
            EditAction::Ignore
        );
        assert_eq!(interpret_key(&key(KeyCode::F(1), none)), EditAction::Ignore);
    }

    #[test]
    /// 矢印キーによる履歴の往復で編集中の入力が復元されるかを検証する。
    fn history_navigation_restores_current_input() {
        let history = history_of(&["first", "second"]);
        let mut session = EditorSession::new(&history);
        session.insert_str("tmp");

        assert!(session.history_prev());
        assert_eq!(session.text(), "second");
        assert!(session.history_next());
        assert_eq!(session.text(), "tmp");
        assert!(session.move_left());
        assert_eq!(session.cursor(), 2);
    }

    #[test]
    /// カーソル境界や履歴遷移の失敗分岐を含めてセッション操作を網羅する。
    fn editor_session_covers_boundary_branches() {
        let history = history_of(&["first", "second"]);
        let mut session = EditorSession::new(&history);
        assert!(session.is_empty());
        assert!(!session.delete_left());
        assert!(!session.delete_right());
        assert!(!session.move_left());
        assert!(!session.move_home());

        session.insert_char('a');
        session.insert_char('b');
        assert!(session.move_home());
        assert!(session.delete_right());
        assert_eq!(session.text(), "b");
        assert!(session.move_end());
        assert!(!session.move_right());
        assert!(session.delete_left());
        assert!(session.is_empty());

        assert!(session.history_prev());
        assert!(session.history_prev());
        assert!(!session.history_prev());
        assert!(session.history_next());
        assert!(session.history_next());
        assert!(!session.history_next());

        session.insert_char('z');
        assert!(!session.history_next());
    }

    #[test]
    /// 再描画で本文とカーソル位置の制御シーケンスが出力されることを確認する。
    fn refresh_line_repositions_cursor() {
        let mut out: Vec<u8> = Vec::new();
        refresh_line(&mut out, ":: ", &['a', 'b', 'c'], 1, &[]).unwrap();
        let output = String::from_utf8(out).unwrap();
        assert!(output.contains(":: abc"));
        assert!(output.contains("\x1b[K"));
        // 列番号は 1 始まりで出力される。
        assert!(output.ends_with("\x1b[5G"));
    }

    #[test]
    /// 全角文字の後ろではカーソル列が表示幅で進むことを確認する。
    fn refresh_line_counts_wide_chars_by_display_width() {
        let render = |cursor: usize| {
            let mut out: Vec<u8> = Vec::new();
            refresh_line(&mut out, "> ", &['名', '前', 'x'], cursor, &[]).unwrap();
            String::from_utf8(out).unwrap()
        };
        assert!(render(0).ends_with("\x1b[3G"));
        assert!(render(1).ends_with("\x1b[5G"));
        assert!(render(3).ends_with("\x1b[8G"));
        assert_eq!(display_width(&['é', 'a']), 2);
    }

    #[test]
    /// スタイルを渡すと文字ごとに色指定が挿入されることを検証する。
    fn refresh_line_colors_each_char() {
        let style = Palette::EDIT.style(StyleTag::Number);
        let mut out: Vec<u8> = Vec::new();
        refresh_line(&mut out, "> ", &['1', '2'], 2, &[style, style]).unwrap();
        let output = String::from_utf8(out).unwrap();
        assert!(!output.contains("12"));
        assert!(output.contains('1') && output.contains('2'));
        assert!(output.contains("\x1b[0m"));
    }
}
