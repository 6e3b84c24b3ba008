// パス: src/bin/ilang.rs
// 役割: 対話シェルを起動する実行ファイルのエントリポイント
// 意図: 引数解析とログ初期化を済ませてから REPL へ制御を渡す
// 関連ファイル: src/repl/mod.rs, src/repl/config.rs, src/lib.rs
use std::process::ExitCode;

use clap::Parser;
use ilang::repl::{run_repl, Cli, ReplConfig};

/// `RUST_LOG` が設定されている場合だけ、標準エラーへログを出す。
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        let filter = EnvFilter::from_default_env();
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(filter)
            .init();
    }
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let config = match ReplConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("ilang: {}", err);
            return ExitCode::FAILURE;
        }
    };
    match run_repl(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}
