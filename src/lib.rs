//! APKリネーマー - aapt を使用したAPK自動リネームツール
//!
//! # 機能
//! - `aapt dump badging` の出力からアプリ名とバージョン名を抽出
//! - `アプリ名_バージョン名.apk` へのリネーム（既に正しい名前なら何もしない）
//! - コマンドライン引数またはドラッグ＆ドロップ対応GUIから実行

pub mod aapt;
pub mod cli;
pub mod config;
pub mod error;
pub mod gui;
pub mod parser;
pub mod rename;

pub use aapt::Extractor;
pub use error::{ExtractionError, FailureKind, RenameError};
pub use parser::PackageMetadata;
pub use rename::{ConflictPolicy, RenameOutcome, Renamer, rename_package};
