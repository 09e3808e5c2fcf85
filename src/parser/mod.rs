//! テキスト解析モジュール - `aapt dump badging` 出力からAPK情報を抽出

mod label;
mod package;
mod version;

use serde::Serialize;

/// アプリ名が見つからない場合の代替値
pub const UNKNOWN_APP: &str = "UnknownApp";
/// バージョン名が見つからない場合の代替値
pub const UNKNOWN_VERSION: &str = "UnknownVersion";
/// リネーム後の拡張子（常に小文字）
pub const APK_EXTENSION: &str = "apk";

/// APKから抽出された情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageMetadata {
    /// アプリ名（ファイル名用にサニタイズ済み）
    pub application_label: String,
    /// バージョン名 (versionName)
    pub version_identifier: String,
    /// パッケージ名（表示用）
    pub package_name: Option<String>,
    /// バージョンコード（表示用）
    pub version_code: Option<String>,
}

impl PackageMetadata {
    /// aaptのレポートを解析
    ///
    /// 見つからない項目は代替値になる。解析自体は失敗しない。
    pub fn parse(report: &str) -> Self {
        let application_label = label::extract_label(report)
            .map(|l| sanitize_label(&l))
            .unwrap_or_else(|| UNKNOWN_APP.to_string());
        let version_identifier = version::extract_version_name(report)
            .map(|v| sanitize_version(&v))
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string());

        Self {
            application_label,
            version_identifier,
            package_name: package::extract_package_name(report),
            version_code: version::extract_version_code(report),
        }
    }

    /// 新しいファイル名を生成
    /// フォーマット: [アプリ名]_[バージョン名].apk
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}.{}",
            self.application_label, self.version_identifier, APK_EXTENSION
        )
    }

    /// どちらかの項目が代替値かどうか
    pub fn uses_placeholder(&self) -> bool {
        self.application_label == UNKNOWN_APP || self.version_identifier == UNKNOWN_VERSION
    }
}

/// アプリ名の空白とパス区切り文字をアンダースコアに置換
pub fn sanitize_label(label: &str) -> String {
    label.replace([' ', '/', '\\'], "_")
}

/// バージョン名のパス区切り文字をアンダースコアに置換
fn sanitize_version(version: &str) -> String {
    version.replace(['/', '\\'], "_")
}
