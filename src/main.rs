//! APKリネーマー - メインエントリポイント

use anyhow::Result;
use apk_renamer::cli::{self, Cli};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> Result<ExitCode> {
    // 環境変数の読み込み
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // ロギング初期化（標準出力は結果用なので stderr へ）
    init_logging(cli.verbose);

    let renamer = match cli.config() {
        Ok(config) => config.renamer(),
        Err(e) => {
            eprintln!("設定の読み込みに失敗しました: {e:#}");
            return Ok(ExitCode::from(cli::EXIT_FAILED));
        }
    };

    match &cli.path {
        Some(path) => Ok(cli::run(&cli, path, &renamer)),
        None => {
            // GUIアプリケーション起動
            apk_renamer::gui::run(renamer)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "warn,apk_renamer=debug"
    } else {
        "warn,apk_renamer=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}
