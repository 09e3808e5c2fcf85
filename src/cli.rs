//! コマンドライン - 引数の定義と単一ファイルの処理

use crate::config::Config;
use crate::error::FailureKind;
use crate::rename::{ConflictPolicy, RenameOutcome, Renamer, Severity, validate_input};
use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// 成功またはリネーム不要
pub const EXIT_OK: u8 = 0;
/// 入力ファイルが存在しない・拡張子が違う
pub const EXIT_INVALID_INPUT: u8 = 1;
/// aapt・リネーム・設定読み込みの失敗
pub const EXIT_FAILED: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "apk_renamer", version)]
#[command(about = "APKファイルを アプリ名_バージョン名.apk にリネーム（引数なしでGUIを起動）")]
pub struct Cli {
    /// リネームするAPKファイル
    pub path: Option<PathBuf>,

    /// 設定ファイル（既定: ~/.config/apk-renamer/config.toml）
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// aapt のパス
    #[arg(long, value_name = "PATH")]
    pub aapt: Option<PathBuf>,

    /// aapt のタイムアウト秒数（0 で無制限）
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// 同名ファイルが既にある場合の扱い
    #[arg(long, value_enum, value_name = "POLICY")]
    pub on_conflict: Option<ConflictPolicy>,

    /// 結果をJSONで出力
    #[arg(short, long)]
    pub json: bool,

    /// 結果をダイアログでも表示（右クリックメニュー等からの起動用）
    #[arg(long)]
    pub dialog: bool,

    /// 詳細ログを出力
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// 設定ファイル < 環境変数 < コマンドライン引数 の順で統合
    pub fn config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        config.apply_env()?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut Config) {
        if let Some(aapt) = &self.aapt {
            config.aapt = Some(aapt.clone());
        }
        if let Some(secs) = self.timeout {
            config.timeout_secs = Some(secs);
        }
        if let Some(policy) = self.on_conflict {
            config.on_conflict = policy;
        }
    }
}

/// 1ファイルを処理して結果を出力
pub fn run(cli: &Cli, path: &Path, renamer: &Renamer) -> ExitCode {
    let outcome = match validate_input(path) {
        Ok(()) => renamer.rename_package(path),
        Err(err) => RenameOutcome::rejected(path, &err),
    };

    print_outcome(&outcome, cli.json);
    if cli.dialog {
        show_dialog(&outcome);
    }

    ExitCode::from(exit_code(&outcome))
}

pub fn exit_code(outcome: &RenameOutcome) -> u8 {
    match outcome {
        RenameOutcome::Failed {
            kind: FailureKind::InvalidInput,
            ..
        } => EXIT_INVALID_INPUT,
        RenameOutcome::Failed { .. } => EXIT_FAILED,
        _ => EXIT_OK,
    }
}

fn print_outcome(outcome: &RenameOutcome, json: bool) {
    if json {
        match serde_json::to_string_pretty(outcome) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("JSON出力に失敗: {e}"),
        }
        return;
    }

    if outcome.is_failed() {
        eprintln!("{}", outcome.message());
    } else {
        println!("{}", outcome.message());
    }
}

fn show_dialog(outcome: &RenameOutcome) {
    let (title, level) = match outcome.severity() {
        Severity::Success => ("完了", rfd::MessageLevel::Info),
        Severity::Info => ("情報", rfd::MessageLevel::Info),
        Severity::Warning => ("無効なファイル", rfd::MessageLevel::Warning),
        Severity::Error => ("エラー", rfd::MessageLevel::Error),
    };

    let _ = rfd::MessageDialog::new()
        .set_title(title)
        .set_description(outcome.message())
        .set_level(level)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}
