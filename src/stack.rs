// パス: src/stack.rs
// 役割: 深い再帰（入れ子の括弧・自己適用）でネイティブスタックを使い切らないための補助
// 意図: 構文解析と評価の再帰入口をこの関数で包み、スタック不足ならその場で拡張する
// 関連ファイル: src/parser/expr.rs, src/evaluator.rs

/// 残りスタックが 256KB を切っていれば 2MB 拡張してから `f` を実行する。
pub(crate) fn ensure_sufficient_stack<R, F: FnOnce() -> R>(f: F) -> R {
    stacker::maybe_grow(256 * 1024, 2 * 1024 * 1024, f)
}
