// パス: src/repl/cmd.rs
// 役割: 対話ループと 1 行ごとの解析・評価・エコー表示の調停
// 意図: 構文木と評価環境を値として受け渡しながらセッションを進める
// 関連ファイル: src/parser/mod.rs, src/evaluator.rs, src/highlight/echo.rs
//! 対話セッションの状態遷移を担当するモジュール。
//!
//! 状態は `AwaitingInput` → `Processing` → (`AwaitingInput` | `Terminated`)。
//! - `exit` / `quit` だけの行は解析せずに即座に終了する。
//! - 1 行から得られた新しいトップレベル式を順に評価し、環境を次の式へ引き継ぐ。
//! - 行の評価が途中で失敗した場合、環境と結果履歴は行の前の状態に戻る。
//!   構文木は解析に成功した時点で確定する。

use std::io::{self, Write};

use tracing::debug;

use crate::ast::Ast;
use crate::errors::{EvalError, ReplError};
use crate::evaluator::{
    bind_name, evaluate, initial_env, register_builtin_callable, to_display_string, Effects, Env,
    Value,
};
use crate::highlight::{render, LiveHighlighter, Palette, Style};
use crate::parser::parse;
use crate::typesys::{resolve_type, TypeDirectory};

use super::config::ReplConfig;
use super::line_editor::{EditorHelper, LineEditor, ReadResult};
use super::printer::{render_banner, report_error};

pub const PROMPT: &str = "> ";
pub const CONTINUATION_PROMPT: &str = ".. ";
pub const EXIT_KEYWORDS: [&str; 2] = ["exit", "quit"];
/// 値の行の先頭に付ける結果マーカー。
pub const RESULT_MARKER: &str = "  => ";
/// 直前の結果を参照する名前。
pub const LAST_RESULT_NAME: &str = "it";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingInput,
    Processing,
    Terminated,
}

/// 1 行の処理で表示すべき内容。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoResult {
    pub type_line: String,
    pub value_line: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue(Option<EchoResult>),
    Terminated,
}

/// セッション全体で持ち回る状態。
pub struct Session {
    env: Env,
    ast: Ast,
    results: Vec<Value>,
    state: SessionState,
}

impl Session {
    /// 組み込みの `exit` と `version` を登録した新しいセッション。
    pub fn new() -> Self {
        let (_, env) = register_builtin_callable("exit", 0, builtin_exit, initial_env());
        let version = Value::Str(env!("CARGO_PKG_VERSION").to_string());
        let (_, env) = bind_name("version", version, env);
        Self {
            env,
            ast: Ast::new(),
            results: Vec::new(),
            state: SessionState::AwaitingInput,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_terminated(&self) -> bool {
        self.state == SessionState::Terminated
    }

    /// 前の行の続きを待っているかどうか。
    pub fn is_pending(&self) -> bool {
        self.ast.is_pending()
    }

    pub fn types(&self) -> &TypeDirectory {
        self.env.types()
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn results(&self) -> &[Value] {
        &self.results
    }

    /// 継続中の入力を捨てる（Ctrl-C）。
    pub fn discard_pending(&mut self) {
        self.ast.pending.clear();
    }

    /// 1 行を処理する。
    ///
    /// エラー時もセッションは `AwaitingInput` に戻り、続けて入力を受け付けられる。
    pub fn submit(&mut self, line: &str) -> Result<Step, ReplError> {
        if self.is_terminated() {
            return Ok(Step::Terminated);
        }
        debug!(line, pending = self.ast.is_pending(), "submitted line");
        self.state = SessionState::Processing;
        let step = self.process(line);
        if self.state == SessionState::Processing {
            self.state = SessionState::AwaitingInput;
        }
        step
    }

    fn process(&mut self, line: &str) -> Result<Step, ReplError> {
        if EXIT_KEYWORDS.contains(&line.trim()) {
            debug!("exit keyword");
            self.state = SessionState::Terminated;
            return Ok(Step::Terminated);
        }

        let before = self.ast.root.len();
        self.ast = match parse(line, self.env.types(), self.ast.clone()) {
            Ok(ast) => ast,
            Err(err) => {
                self.ast.pending.clear();
                return Err(err.into());
            }
        };

        let mut env = self.env.clone();
        let mut produced = Vec::new();
        for (index, expr) in self.ast.added_since(before).iter().enumerate() {
            debug!(index, "evaluating top-level expression");
            let (value, next) = evaluate(expr, env)?;
            env = next.bind(LAST_RESULT_NAME, value.clone());
            produced.push(value);
            if env.is_halted() {
                break;
            }
        }
        self.env = env;
        let added = produced.len();
        self.results.extend(produced);

        if self.env.is_halted() {
            debug!("exit requested by evaluation");
            self.state = SessionState::Terminated;
            return Ok(Step::Terminated);
        }
        if added == 0 {
            return Ok(Step::Continue(None));
        }
        Ok(Step::Continue(self.echo_last()))
    }

    /// 結果履歴の最後の値を型の行と値の行へ整形する。履歴が空なら何もしない。
    fn echo_last(&self) -> Option<EchoResult> {
        let last = self.results.last()?;
        Some(EchoResult {
            type_line: resolve_type(last, self.env.types()).to_string(),
            value_line: format!("{}{}", RESULT_MARKER, to_display_string(last)),
        })
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_exit(_args: Vec<Value>, fx: &mut Effects) -> Result<Value, EvalError> {
    fx.halt_requested = true;
    Ok(Value::Unit)
}

/// 入力中のハイライトと（空の）補完候補を行エディタへ提供する。
pub struct ReplHelper<'a> {
    highlighter: LiveHighlighter<'a>,
}

impl<'a> ReplHelper<'a> {
    pub fn new(types: &'a TypeDirectory, palette: &'a Palette) -> Self {
        Self {
            highlighter: LiveHighlighter::new(types, palette),
        }
    }
}

impl EditorHelper for ReplHelper<'_> {
    fn highlight(&self, buffer: &str) -> Vec<Style> {
        self.highlighter.highlight(buffer)
    }

    fn complete(&self, _buffer: &str, _cursor: usize) -> Vec<String> {
        Vec::new()
    }
}

/// 行入力の供給元。テストでは台本どおりに行を返す実装へ差し替える。
pub trait ReplLineSource {
    fn read_line(&mut self, prompt: &str, helper: &dyn EditorHelper) -> io::Result<ReadResult>;
    fn add_history(&mut self, entry: &str);
}

impl ReplLineSource for LineEditor {
    fn read_line(&mut self, prompt: &str, helper: &dyn EditorHelper) -> io::Result<ReadResult> {
        LineEditor::read_line(self, prompt, helper)
    }

    fn add_history(&mut self, entry: &str) {
        LineEditor::add_history(self, entry);
    }
}

/// 端末上で対話セッションを開始する。
pub fn run_repl(config: &ReplConfig) -> Result<(), ReplError> {
    let mut editor = LineEditor::new(config.color);
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    run_repl_with(&mut editor, config, &mut stdout, &mut stderr)
}

/// 任意の入力元と出力先で対話ループを回す。
///
/// `fail_fast` が偽なら行ごとのエラーを `err` へ報告して続行する。
/// 真ならエラーをそのまま返してループを抜ける。
pub fn run_repl_with<S, W, E>(
    editor: &mut S,
    config: &ReplConfig,
    out: &mut W,
    err: &mut E,
) -> Result<(), ReplError>
where
    S: ReplLineSource,
    W: Write,
    E: Write,
{
    render_banner(out)?;
    let mut session = Session::new();

    while !session.is_terminated() {
        let prompt = if session.is_pending() {
            CONTINUATION_PROMPT
        } else {
            PROMPT
        };
        let read = {
            let helper = ReplHelper::new(session.types(), &config.edit_palette);
            editor.read_line(prompt, &helper)?
        };
        let line = match read {
            ReadResult::Line(line) => line,
            ReadResult::Interrupted => {
                session.discard_pending();
                continue;
            }
            ReadResult::Eof => {
                writeln!(out)?;
                break;
            }
        };
        editor.add_history(&line);

        match session.submit(&line) {
            Ok(Step::Continue(Some(echo))) => {
                let types = session.types();
                render(out, &echo.type_line, types, &config.echo_palette, config.color)?;
                render(out, &echo.value_line, types, &config.echo_palette, config.color)?;
            }
            Ok(Step::Continue(None)) => {}
            Ok(Step::Terminated) => break,
            Err(e) if config.fail_fast => return Err(e),
            Err(e) => report_error(err, &e, config.color)?,
        }
    }
    Ok(())
}
