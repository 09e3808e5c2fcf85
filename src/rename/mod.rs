//! リネームモジュール - APKを `アプリ名_バージョン名.apk` にリネーム

use crate::aapt::Extractor;
use crate::error::{FailureKind, RenameError};
use crate::parser::{APK_EXTENSION, PackageMetadata};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// 同名ファイルが既に存在する場合の扱い
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// 何もせず失敗として報告（既定）
    #[default]
    Fail,
    /// `_1`, `_2` ... を付けて空いている名前を使う
    Suffix,
    /// 既存ファイルを上書き
    Overwrite,
}

/// 処理結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenameOutcome {
    Renamed {
        old_name: String,
        new_name: String,
        new_path: PathBuf,
        metadata: PackageMetadata,
    },
    AlreadyCorrect {
        file_name: String,
        metadata: PackageMetadata,
    },
    Failed {
        file_name: String,
        kind: FailureKind,
        reason: String,
    },
}

/// 通知の重要度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl RenameOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, RenameOutcome::Failed { .. })
    }

    /// 入力ミスは警告、それ以外の失敗はエラー
    pub fn severity(&self) -> Severity {
        match self {
            RenameOutcome::Renamed { .. } => Severity::Success,
            RenameOutcome::AlreadyCorrect { .. } => Severity::Info,
            RenameOutcome::Failed {
                kind: FailureKind::InvalidInput,
                ..
            } => Severity::Warning,
            RenameOutcome::Failed { .. } => Severity::Error,
        }
    }

    /// 呼び出し側の入力チェックで弾かれた場合の結果
    pub fn rejected(path: &Path, err: &RenameError) -> Self {
        RenameOutcome::Failed {
            file_name: display_name(path),
            kind: err.kind(),
            reason: err.to_string(),
        }
    }

    /// ユーザー向けメッセージ
    pub fn message(&self) -> String {
        match self {
            RenameOutcome::Renamed {
                old_name, new_name, ..
            } => format!("リネームしました:\n'{old_name}'\n→\n'{new_name}'"),
            RenameOutcome::AlreadyCorrect { file_name, .. } => {
                format!("ファイル名は既に正しい形式です:\n'{file_name}'")
            }
            RenameOutcome::Failed {
                file_name, reason, ..
            } => format!("'{file_name}' のリネームに失敗しました:\n{reason}"),
        }
    }
}

/// リネーム処理
#[derive(Debug, Clone, Default)]
pub struct Renamer {
    extractor: Extractor,
    on_conflict: ConflictPolicy,
}

enum Target {
    /// この名前で空いている
    Free { name: String, path: PathBuf },
    /// 候補が元のファイル自身
    Source,
}

impl Renamer {
    pub fn new(extractor: Extractor, on_conflict: ConflictPolicy) -> Self {
        Self {
            extractor,
            on_conflict,
        }
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn on_conflict(&self) -> ConflictPolicy {
        self.on_conflict
    }

    /// APKをリネーム
    ///
    /// エラーはすべて `RenameOutcome::Failed` に変換される。
    pub fn rename_package(&self, path: impl AsRef<Path>) -> RenameOutcome {
        let path = path.as_ref();
        match self.try_rename(path) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(apk = %path.display(), error = %err, "リネーム失敗");
                RenameOutcome::rejected(path, &err)
            }
        }
    }

    fn try_rename(&self, path: &Path) -> Result<RenameOutcome, RenameError> {
        let old_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| RenameError::InvalidInput {
                message: format!("ファイル名がありません: {}", path.display()),
            })?;

        debug!(apk = %path.display(), "メタデータ抽出");
        let metadata = self.extractor.extract(path)?;
        if metadata.uses_placeholder() {
            warn!(apk = %path.display(), ?metadata, "アプリ名またはバージョン名が見つかりません");
        }

        let directory = path.parent().unwrap_or(Path::new(""));
        let new_name = metadata.file_name();

        debug!(from = %old_name, to = %new_name, "ファイル名比較");
        if same_location(path, &directory.join(&new_name)) {
            info!(file = %old_name, "ファイル名は既に正しい形式");
            return Ok(RenameOutcome::AlreadyCorrect {
                file_name: old_name,
                metadata,
            });
        }

        let (new_name, new_path) = match self.resolve_target(path, directory, new_name)? {
            Target::Free { name, path } => (name, path),
            Target::Source => {
                info!(file = %old_name, "ファイル名は既に正しい形式（連番付き）");
                return Ok(RenameOutcome::AlreadyCorrect {
                    file_name: old_name,
                    metadata,
                });
            }
        };

        debug!(to = %new_path.display(), "リネーム実行");
        fs::rename(path, &new_path).map_err(|source| RenameError::Filesystem {
            from: path.to_path_buf(),
            to: new_path.clone(),
            source,
        })?;

        // rename(2) は同じファイルへの別名同士だと何もせず成功を返す
        if listed_in_directory(path) && !is_alias(path, &new_path) {
            return Err(RenameError::DestinationExists { path: new_path });
        }

        info!(from = %old_name, to = %new_name, "リネーム完了");
        Ok(RenameOutcome::Renamed {
            old_name,
            new_name,
            new_path,
            metadata,
        })
    }

    /// 同名ファイルがある場合はポリシーに従って移動先を決める
    fn resolve_target(
        &self,
        source: &Path,
        directory: &Path,
        name: String,
    ) -> Result<Target, RenameError> {
        let path = directory.join(&name);
        if !occupied_by_other(source, &path) {
            return Ok(Target::Free { name, path });
        }

        match self.on_conflict {
            ConflictPolicy::Fail => Err(RenameError::DestinationExists { path }),
            // ハードリンクは上書きしても元の名前が残る
            ConflictPolicy::Overwrite if is_same_file(source, &path) => {
                Err(RenameError::DestinationExists { path })
            }
            ConflictPolicy::Overwrite => {
                warn!(path = %path.display(), "既存ファイルを上書き");
                Ok(Target::Free { name, path })
            }
            ConflictPolicy::Suffix => Ok(numbered_target(source, directory, &name)),
        }
    }
}

/// 既定の設定（PATH上の aapt、衝突時は失敗）でリネーム
pub fn rename_package(path: impl AsRef<Path>) -> RenameOutcome {
    Renamer::default().rename_package(path)
}

/// 連番付きで空いているファイル名を探す
fn numbered_target(source: &Path, directory: &Path, name: &str) -> Target {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);

    let mut counter = 1u64;
    loop {
        let candidate = format!("{stem}_{counter}.{APK_EXTENSION}");
        let path = directory.join(&candidate);
        if same_location(source, &path) || is_alias(source, &path) {
            return Target::Source;
        }
        if path.symlink_metadata().is_err() {
            return Target::Free {
                name: candidate,
                path,
            };
        }
        counter += 1;
    }
}

/// 別のファイル（または同じファイルへの別のリンク）が `candidate` に存在するか
fn occupied_by_other(source: &Path, candidate: &Path) -> bool {
    candidate.symlink_metadata().is_ok() && !is_alias(source, candidate)
}

/// `candidate` が `source` と同じディレクトリエントリの別表記か
///
/// 大文字小文字を区別しないファイルシステムでは `App.APK` と `App.apk` が
/// 同じエントリを指す。ハードリンクは別のエントリとして一覧に現れるので除外する。
fn is_alias(source: &Path, candidate: &Path) -> bool {
    is_same_file(source, candidate) && !listed_in_directory(candidate)
}

/// 親ディレクトリにこの名前（バイト単位で一致）のエントリがあるか
fn listed_in_directory(path: &Path) -> bool {
    let Some(name) = path.file_name() else {
        return false;
    };
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::read_dir(parent)
        .map(|entries| entries.flatten().any(|entry| entry.file_name() == name))
        .unwrap_or(false)
}

#[cfg(unix)]
fn is_same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (fs::metadata(a), fs::metadata(b)) {
        (Ok(x), Ok(y)) => x.dev() == y.dev() && x.ino() == y.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(x), Ok(y)) => x == y,
        _ => false,
    }
}

fn same_location(a: &Path, b: &Path) -> bool {
    normalize(a) == normalize(b)
}

/// `.` と `..` を字句的に解決したパス（ファイルシステムには触れない）
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// 名前が `.apk` で終わるか（大文字小文字を区別しない）
pub fn has_apk_extension(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .is_some_and(|n| n.ends_with(&format!(".{APK_EXTENSION}")))
}

/// 呼び出し側で行う入力チェック（拡張子と存在確認）
pub fn validate_input(path: &Path) -> Result<(), RenameError> {
    if !has_apk_extension(path) {
        return Err(RenameError::InvalidInput {
            message: format!("APKファイル (.apk) を指定してください: {}", path.display()),
        });
    }
    if !path.is_file() {
        return Err(RenameError::InvalidInput {
            message: format!("ファイルが存在しません: {}", path.display()),
        });
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
