//! エラー定義

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// メタデータ抽出エラー
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error(
        "aaptが見つかりません ({program})。Android SDK Build-Tools をインストールし、aapt を PATH に追加してください"
    )]
    ToolNotFound { program: String },

    #[error("aaptがエラー終了しました (終了コード: {}): {stderr}", exit_code_label(.exit_code))]
    ToolExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("aaptが {timeout_secs} 秒以内に終了しませんでした")]
    ToolTimedOut { timeout_secs: u64 },

    #[error("APK解析中に予期しないエラーが発生しました: {message}")]
    UnexpectedFailure { message: String },
}

fn exit_code_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "シグナル".to_string(), |c| c.to_string())
}

/// リネーム処理エラー
#[derive(Debug, Error)]
pub enum RenameError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("リネームに失敗: {} -> {}: {source}", .from.display(), .to.display())]
    Filesystem {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("同名のファイルが既に存在します: {}", .path.display())]
    DestinationExists { path: PathBuf },

    #[error("無効なファイル: {message}")]
    InvalidInput { message: String },
}

impl RenameError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RenameError::Extraction(e) => match e {
                ExtractionError::ToolNotFound { .. } => FailureKind::ToolNotFound,
                ExtractionError::ToolExecutionFailed { .. } => FailureKind::ToolExecutionFailed,
                ExtractionError::ToolTimedOut { .. } => FailureKind::ToolTimedOut,
                ExtractionError::UnexpectedFailure { .. } => FailureKind::UnexpectedFailure,
            },
            RenameError::Filesystem { .. } => FailureKind::FilesystemError,
            RenameError::DestinationExists { .. } => FailureKind::DestinationExists,
            RenameError::InvalidInput { .. } => FailureKind::InvalidInput,
        }
    }
}

/// 失敗の種類（出力用のフラットなタグ）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ToolNotFound,
    ToolExecutionFailed,
    ToolTimedOut,
    FilesystemError,
    DestinationExists,
    InvalidInput,
    UnexpectedFailure,
}
